//! Shared domain types for the audit run and its report.

use serde::{Deserialize, Serialize};
use std::fmt;

/// API Gateway product family. REST APIs (v1) support execution logs,
/// HTTP APIs (v2) only support access logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ApiFamily {
    Rest,
    Http,
}

impl ApiFamily {
    pub const ALL: [ApiFamily; 2] = [ApiFamily::Rest, ApiFamily::Http];

    pub fn supports_execution_logs(self) -> bool {
        matches!(self, Self::Rest)
    }
}

impl fmt::Display for ApiFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Rest => f.write_str("REST"),
            Self::Http => f.write_str("HTTP"),
        }
    }
}

/// Whether a selector list names what to keep or what to drop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionMode {
    #[default]
    Include,
    Exclude,
}

impl ActionMode {
    pub fn is_exclude(self) -> bool {
        matches!(self, Self::Exclude)
    }
}

/// Catch-all (`*/*`) method settings of a REST stage.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionLogSettings {
    pub logging_level: Option<String>,
    pub data_trace_enabled: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessLogSettings {
    pub destination_arn: Option<String>,
    pub format: Option<String>,
}

/// One deployed stage, as reported by a [`crate::StageLister`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageDescriptor {
    pub stage_name: String,
    pub execution_log: Option<ExecutionLogSettings>,
    pub access_log: Option<AccessLogSettings>,
}

impl StageDescriptor {
    pub fn new(stage_name: impl Into<String>) -> Self {
        Self {
            stage_name: stage_name.into(),
            execution_log: None,
            access_log: None,
        }
    }

    #[must_use]
    pub fn with_execution_log(mut self, level: impl Into<String>, data_trace_enabled: bool) -> Self {
        self.execution_log = Some(ExecutionLogSettings {
            logging_level: Some(level.into()),
            data_trace_enabled,
        });
        self
    }

    #[must_use]
    pub fn with_access_log(
        mut self,
        destination_arn: impl Into<String>,
        format: impl Into<String>,
    ) -> Self {
        self.access_log = Some(AccessLogSettings {
            destination_arn: Some(destination_arn.into()),
            format: Some(format.into()),
        });
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Severity {
    Error,
    Warning,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub message: String,
}

impl Diagnostic {
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            message: message.into(),
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            message: message.into(),
        }
    }
}

/// Outcome of one audit run: the accepted log groups plus every finding.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditReport {
    pub log_group_names: Vec<String>,
    pub diagnostics: Vec<Diagnostic>,
}

impl AuditReport {
    pub fn has_errors(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|d| d.severity == Severity::Error)
    }

    pub fn errors(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == Severity::Error)
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == Severity::Warning)
    }
}
