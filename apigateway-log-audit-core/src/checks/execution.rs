//! Execution log validation for REST API stages.

use log::debug;

use super::names::{execution_log_group_name, stage_id};
use crate::diagnostics::{DiagnosticsCollector, Summary};
use crate::types::{ExecutionLogSettings, StageDescriptor};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionLogStatus {
    /// `INFO` level with data tracing: full request and response logs.
    Compliant,
    RequestResponseNotLogged,
    ErrorsOnly,
    NotEnabled,
}

impl ExecutionLogStatus {
    pub fn classify(settings: &ExecutionLogSettings) -> Self {
        match settings.logging_level.as_deref() {
            Some("INFO") if settings.data_trace_enabled => Self::Compliant,
            Some("INFO") => Self::RequestResponseNotLogged,
            Some("ERROR") => Self::ErrorsOnly,
            _ => Self::NotEnabled,
        }
    }

    fn summary(self) -> Option<Summary> {
        match self {
            Self::Compliant => None,
            Self::RequestResponseNotLogged => Some(Summary::FullRequestAndResponseLogNotEnabled),
            Self::ErrorsOnly => Some(Summary::ExecutionLogErrorOnly),
            Self::NotEnabled => Some(Summary::ExecutionLogNotEnabled),
        }
    }
}

/// Check the stage's catch-all method settings.
///
/// Stages without `*/*` settings are skipped silently: execution logging is
/// optional. Returns the execution log group name when compliant.
pub fn check_execution_logs(
    api_id: &str,
    stage: &StageDescriptor,
    diagnostics: &mut DiagnosticsCollector,
) -> Option<String> {
    let settings = stage.execution_log.as_ref()?;
    let status = ExecutionLogStatus::classify(settings);
    debug!("{}/{} execution logs: {:?}", api_id, stage.stage_name, status);

    match status.summary() {
        None => Some(execution_log_group_name(api_id, &stage.stage_name)),
        Some(summary) => {
            diagnostics.add_error(&summary, stage_id(api_id, &stage.stage_name));
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(level: Option<&str>, data_trace_enabled: bool) -> ExecutionLogSettings {
        ExecutionLogSettings {
            logging_level: level.map(str::to_string),
            data_trace_enabled,
        }
    }

    #[test]
    fn test_classification_is_exhaustive() {
        use ExecutionLogStatus::{Compliant, ErrorsOnly, NotEnabled, RequestResponseNotLogged};
        let cases = [
            (Some("INFO"), true, Compliant),
            (Some("INFO"), false, RequestResponseNotLogged),
            (Some("ERROR"), true, ErrorsOnly),
            (Some("ERROR"), false, ErrorsOnly),
            (Some("OFF"), true, NotEnabled),
            (None, false, NotEnabled),
        ];
        for (level, trace, expected) in cases {
            assert_eq!(
                ExecutionLogStatus::classify(&settings(level, trace)),
                expected,
                "level {level:?}, data trace {trace}"
            );
        }
    }

    #[test]
    fn test_compliant_stage_yields_execution_log_group() {
        let mut diagnostics = DiagnosticsCollector::default();
        let stage = StageDescriptor::new("prod").with_execution_log("INFO", true);
        assert_eq!(
            check_execution_logs("a1", &stage, &mut diagnostics),
            Some("API-Gateway-Execution-Logs_a1/prod".to_string())
        );
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn test_errors_only_stage_is_reported() {
        let mut diagnostics = DiagnosticsCollector::default();
        let stage = StageDescriptor::new("prod").with_execution_log("ERROR", false);
        assert_eq!(check_execution_logs("a1", &stage, &mut diagnostics), None);
        assert_eq!(
            diagnostics.finish()[0].message,
            "Execution Logs set to Errors Only for [a1/prod]"
        );
    }

    #[test]
    fn test_stage_without_method_settings_is_silent() {
        let mut diagnostics = DiagnosticsCollector::default();
        let stage = StageDescriptor::new("prod");
        assert_eq!(check_execution_logs("a1", &stage, &mut diagnostics), None);
        assert!(diagnostics.is_empty());
    }
}
