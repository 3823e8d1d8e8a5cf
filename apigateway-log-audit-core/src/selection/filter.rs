//! Include/exclude scoping of listed APIs and their stages.

use std::collections::{BTreeMap, BTreeSet};

use super::Selection;
use crate::types::ActionMode;

/// Per-API outcome of applying a [`Selection`] under an [`ActionMode`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScopeDecision {
    /// Every stage of the API is a candidate.
    AllStages,
    /// The API carries stage selectors; each stage is filtered against them.
    Stages(BTreeSet<String>),
    OutOfScope,
}

impl ScopeDecision {
    pub fn is_in_scope(&self) -> bool {
        !matches!(self, Self::OutOfScope)
    }

    /// A listed stage is kept in include mode and dropped in exclude mode;
    /// an unlisted one the other way round.
    pub fn keeps_stage(&self, stage_name: &str, mode: ActionMode) -> bool {
        match self {
            Self::AllStages => true,
            Self::Stages(stages) if stages.is_empty() => true,
            Self::Stages(stages) => stages.contains(stage_name) != mode.is_exclude(),
            Self::OutOfScope => false,
        }
    }
}

impl Selection {
    /// APIs with stage selectors are always at least partially in scope.
    /// Otherwise membership in the whole-API set includes under
    /// [`ActionMode::Include`] and excludes under [`ActionMode::Exclude`].
    pub fn decide(&self, api_id: &str, mode: ActionMode) -> ScopeDecision {
        if let Some(stages) = self.stages_for(api_id) {
            ScopeDecision::Stages(stages.clone())
        } else if self.is_whole_api(api_id) != mode.is_exclude() {
            ScopeDecision::AllStages
        } else {
            ScopeDecision::OutOfScope
        }
    }
}

/// Map every listed API id to its decision, dropping the out-of-scope ones.
pub fn scope_apis<I, S>(api_ids: I, selection: &Selection, mode: ActionMode) -> BTreeMap<String, ScopeDecision>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    api_ids
        .into_iter()
        .filter_map(|api_id| {
            let api_id = api_id.as_ref();
            let decision = selection.decide(api_id, mode);
            decision
                .is_in_scope()
                .then(|| (api_id.to_string(), decision))
        })
        .collect()
}
