//! Diagnostics collection and consolidation.
//!
//! Findings come in two shapes: immediate diagnostics (one-off failures such as
//! an SDK call error) that are reported verbatim, and categorized findings that
//! are keyed by a [`Summary`] and accumulate the identifiers they affect. At
//! report time each category collapses into a single
//! `"<summary> for [<id1>, <id2>, ...]"` entry.

use log::debug;
use std::collections::BTreeMap;

use crate::types::{Diagnostic, Severity};

/// Fixed message templates for categorized findings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Summary {
    WrongSyntax,
    FullRequestAndResponseLogNotEnabled,
    ExecutionLogErrorOnly,
    ExecutionLogNotEnabled,
    AccessLogNotEnabledRest,
    AccessLogNotEnabledHttp,
    AccessLogFormatNotJson,
    AccessLogDestinationNotLogGroup,
    AccessLogFormatMissingRequiredValues(Vec<String>),
    AccessLogFormatKeyMismatch { log_group_name: String },
}

impl Summary {
    pub fn message(&self) -> String {
        match self {
            Self::WrongSyntax => "api gateway syntax is wrong".to_string(),
            Self::FullRequestAndResponseLogNotEnabled => {
                "Full Request and Response Logs not enabled".to_string()
            }
            Self::ExecutionLogErrorOnly => "Execution Logs set to Errors Only".to_string(),
            Self::ExecutionLogNotEnabled => "Execution Logs not enabled".to_string(),
            Self::AccessLogNotEnabledRest => "REST API Access Logs not enabled".to_string(),
            Self::AccessLogNotEnabledHttp => "HTTP API Access Logs not enabled".to_string(),
            Self::AccessLogFormatNotJson => "Access Log Format is not JSON parsable".to_string(),
            Self::AccessLogDestinationNotLogGroup => {
                "Access Log destination is not a CloudWatch log group".to_string()
            }
            Self::AccessLogFormatMissingRequiredValues(values) => format!(
                "Access Log Format is missing required values {}",
                bracketed(values)
            ),
            Self::AccessLogFormatKeyMismatch { log_group_name } => format!(
                "Access Log Format keys differ between stages writing to log group {}",
                log_group_name
            ),
        }
    }
}

/// Run-scoped accumulator for every finding of an audit.
///
/// Warnings and errors live in separate maps so a warning and an error with the
/// same wording never merge.
#[derive(Debug, Default)]
pub struct DiagnosticsCollector {
    immediate: Vec<Diagnostic>,
    warnings: BTreeMap<String, Vec<String>>,
    errors: BTreeMap<String, Vec<String>>,
}

impl DiagnosticsCollector {
    /// Record a diagnostic that is reported as-is.
    pub fn add(&mut self, diagnostic: Diagnostic) {
        debug!("{:?}: {}", diagnostic.severity, diagnostic.message);
        self.immediate.push(diagnostic);
    }

    pub fn add_error(&mut self, summary: &Summary, identifier: impl Into<String>) {
        Self::record(&mut self.errors, summary, identifier.into());
    }

    pub fn add_warning(&mut self, summary: &Summary, identifier: impl Into<String>) {
        Self::record(&mut self.warnings, summary, identifier.into());
    }

    fn record(target: &mut BTreeMap<String, Vec<String>>, summary: &Summary, identifier: String) {
        let identifiers = target.entry(summary.message()).or_default();
        // first-seen order, no repeats
        if !identifiers.contains(&identifier) {
            identifiers.push(identifier);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.immediate.is_empty() && self.warnings.is_empty() && self.errors.is_empty()
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
            || self
                .immediate
                .iter()
                .any(|d| d.severity == Severity::Error)
    }

    /// Consolidate into the final report: immediate entries first, then one
    /// entry per warning category, then one entry per error category.
    pub fn finish(self) -> Vec<Diagnostic> {
        let mut diagnostics = self.immediate;
        for (summary, identifiers) in self.warnings {
            diagnostics.push(Diagnostic::warning(consolidate(&summary, &identifiers)));
        }
        for (summary, identifiers) in self.errors {
            diagnostics.push(Diagnostic::error(consolidate(&summary, &identifiers)));
        }
        diagnostics
    }
}

fn consolidate(summary: &str, identifiers: &[String]) -> String {
    format!("{} for {}", summary, bracketed(identifiers))
}

pub(crate) fn bracketed(values: &[String]) -> String {
    format!("[{}]", values.join(", "))
}
