//! Parsing of `apiId` / `apiId/stageName` selector entries.

use log::trace;
use std::collections::{BTreeMap, BTreeSet};

use crate::diagnostics::{DiagnosticsCollector, Summary};
use crate::types::{ActionMode, Diagnostic};

/// Parsed selector list.
///
/// An API id lives either in the whole-API set or in the per-stage map, never
/// in both: a whole-API selection always supersedes stage selections for the
/// same id, regardless of the order the entries were given in.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    all_stages: BTreeSet<String>,
    partial_stages: BTreeMap<String, BTreeSet<String>>,
}

impl Selection {
    /// Parse raw selector entries. Malformed entries are reported as
    /// [`Summary::WrongSyntax`] and contribute nothing.
    pub fn parse<S: AsRef<str>>(entries: &[S], diagnostics: &mut DiagnosticsCollector) -> Self {
        let mut selection = Self::default();
        for entry in entries {
            let entry = entry.as_ref();
            if !selection.insert(entry) {
                diagnostics.add_error(&Summary::WrongSyntax, entry);
            }
        }
        selection
    }

    /// Insert one entry; returns `false` if it has more than one `/`.
    pub fn insert(&mut self, entry: &str) -> bool {
        let parts: Vec<&str> = entry.split('/').collect();
        match parts.as_slice() {
            [api_id] => {
                self.select_api(api_id);
                true
            }
            [api_id, stage_name] => {
                self.select_stage(api_id, stage_name);
                true
            }
            _ => {
                trace!("Rejecting selector entry '{}'", entry);
                false
            }
        }
    }

    pub fn select_api(&mut self, api_id: &str) {
        self.partial_stages.remove(api_id);
        self.all_stages.insert(api_id.to_string());
    }

    /// Repeated stage names collapse into one entry.
    pub fn select_stage(&mut self, api_id: &str, stage_name: &str) {
        if self.all_stages.contains(api_id) {
            return;
        }
        self.partial_stages
            .entry(api_id.to_string())
            .or_default()
            .insert(stage_name.to_string());
    }

    pub fn is_whole_api(&self, api_id: &str) -> bool {
        self.all_stages.contains(api_id)
    }

    pub fn stages_for(&self, api_id: &str) -> Option<&BTreeSet<String>> {
        self.partial_stages.get(api_id)
    }

    pub fn is_empty(&self) -> bool {
        self.all_stages.is_empty() && self.partial_stages.is_empty()
    }
}

/// An include-mode scope with an empty selector list would never select
/// anything, which is a configuration error for the whole run.
pub fn check_selector_list<S: AsRef<str>>(
    entries: &[S],
    mode: ActionMode,
) -> Result<(), Diagnostic> {
    if mode == ActionMode::Include && entries.is_empty() {
        return Err(Diagnostic::error(
            "api_list cannot be empty when action is include.",
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Severity;
    use proptest::prelude::*;

    fn parse(entries: &[&str]) -> (Selection, Vec<Diagnostic>) {
        let mut diagnostics = DiagnosticsCollector::default();
        let selection = Selection::parse(entries, &mut diagnostics);
        (selection, diagnostics.finish())
    }

    #[test]
    fn test_whole_and_partial_entries() {
        let (selection, diagnostics) = parse(&["a1", "a2/prod", "a2/dev"]);
        assert!(diagnostics.is_empty());
        assert!(selection.is_whole_api("a1"));
        assert!(!selection.is_whole_api("a2"));
        let stages = selection.stages_for("a2").expect("a2 has stage entries");
        assert_eq!(stages.len(), 2);
        assert!(stages.contains("prod") && stages.contains("dev"));
    }

    #[test]
    fn test_whole_api_after_partial_removes_partial() {
        let (selection, _) = parse(&["a1/prod", "a1"]);
        assert!(selection.is_whole_api("a1"));
        assert!(selection.stages_for("a1").is_none());
    }

    #[test]
    fn test_partial_after_whole_api_is_ignored() {
        let (selection, _) = parse(&["a1", "a1/prod"]);
        assert!(selection.is_whole_api("a1"));
        assert!(selection.stages_for("a1").is_none());
    }

    #[test]
    fn test_duplicate_stage_names_collapse() {
        let (selection, _) = parse(&["a1/prod", "a1/prod"]);
        assert_eq!(selection.stages_for("a1").map(|s| s.len()), Some(1));
    }

    #[test]
    fn test_too_many_segments_is_syntax_error() {
        let (selection, diagnostics) = parse(&["a1/prod/extra", "a2"]);
        assert!(selection.stages_for("a1").is_none());
        assert!(!selection.is_whole_api("a1"));
        assert!(selection.is_whole_api("a2"));
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].severity, Severity::Error);
        assert_eq!(
            diagnostics[0].message,
            "api gateway syntax is wrong for [a1/prod/extra]"
        );
    }

    #[test]
    fn test_empty_include_list_is_configuration_error() {
        let empty: [&str; 0] = [];
        let err = check_selector_list(&empty, ActionMode::Include).unwrap_err();
        assert_eq!(
            err.message,
            "api_list cannot be empty when action is include."
        );
        assert!(check_selector_list(&empty, ActionMode::Exclude).is_ok());
        assert!(check_selector_list(&["a1"], ActionMode::Include).is_ok());
    }

    proptest! {
        #[test]
        fn prop_two_or_more_slashes_never_select(
            api in "[a-z0-9]{1,8}",
            stage in "[a-z0-9]{1,8}",
            rest in "[a-z0-9/]{0,8}",
        ) {
            let entry = format!("{}/{}/{}", api, stage, rest);
            let (selection, diagnostics) = parse(&[entry.as_str()]);
            prop_assert!(selection.is_empty());
            prop_assert_eq!(diagnostics.len(), 1);
            prop_assert!(diagnostics[0].message.contains(&entry));
        }

        #[test]
        fn prop_whole_api_always_wins(
            api in "[a-z0-9]{1,8}",
            stage in "[a-z0-9]{1,8}",
            whole_first in any::<bool>(),
        ) {
            let partial = format!("{}/{}", api, stage);
            let entries = if whole_first {
                vec![api.clone(), partial]
            } else {
                vec![partial, api.clone()]
            };
            let mut diagnostics = DiagnosticsCollector::default();
            let selection = Selection::parse(&entries, &mut diagnostics);
            prop_assert!(selection.is_whole_api(&api));
            prop_assert!(selection.stages_for(&api).is_none());
        }
    }
}
