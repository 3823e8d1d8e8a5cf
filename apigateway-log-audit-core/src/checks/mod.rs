//! Per-stage logging checks.
//!
//! REST stages go through the execution log check and the access log check;
//! HTTP stages only have access logs. Both checks feed the same
//! [`DiagnosticsCollector`] and the same run-scoped [`LogGroupFieldMaps`].

pub mod access;
pub mod execution;
pub mod format;
pub mod names;

use crate::diagnostics::DiagnosticsCollector;
use crate::types::{ApiFamily, StageDescriptor};
use format::{FormatVerifier, LogGroupFieldMaps};

/// Runs every applicable check on in-scope stages and owns the cross-stage
/// field maps for the duration of one audit run.
#[derive(Debug, Default)]
pub struct StageChecker {
    verifier: FormatVerifier,
    field_maps: LogGroupFieldMaps,
    ignore_access_log_settings: bool,
}

impl StageChecker {
    pub fn new(verifier: FormatVerifier, ignore_access_log_settings: bool) -> Self {
        Self {
            verifier,
            field_maps: LogGroupFieldMaps::default(),
            ignore_access_log_settings,
        }
    }

    pub fn ignores_access_logs(&self) -> bool {
        self.ignore_access_log_settings
    }

    /// Check one stage and return the log group names it contributes.
    pub fn check_stage(
        &mut self,
        family: ApiFamily,
        api_id: &str,
        stage: &StageDescriptor,
        diagnostics: &mut DiagnosticsCollector,
    ) -> Vec<String> {
        let mut accepted = Vec::new();
        if family.supports_execution_logs() {
            accepted.extend(execution::check_execution_logs(api_id, stage, diagnostics));
        }
        if !self.ignore_access_log_settings {
            accepted.extend(access::check_access_logs(
                family,
                api_id,
                stage,
                &self.verifier,
                &mut self.field_maps,
                diagnostics,
            ));
        }
        accepted
    }
}
