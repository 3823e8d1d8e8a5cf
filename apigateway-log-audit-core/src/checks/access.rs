//! Access log validation for REST and HTTP stages.

use log::debug;

use super::format::{FormatVerifier, LogGroupFieldMaps};
use super::names::{log_group_name_from_arn, stage_id};
use crate::diagnostics::{DiagnosticsCollector, Summary};
use crate::types::{ApiFamily, StageDescriptor};

/// Check the stage's access log destination and format. Returns the
/// destination log group name only if the format verifies.
pub fn check_access_logs(
    family: ApiFamily,
    api_id: &str,
    stage: &StageDescriptor,
    verifier: &FormatVerifier,
    field_maps: &mut LogGroupFieldMaps,
    diagnostics: &mut DiagnosticsCollector,
) -> Option<String> {
    let id = stage_id(api_id, &stage.stage_name);
    let destination = stage
        .access_log
        .as_ref()
        .and_then(|settings| settings.destination_arn.as_deref());

    let Some(destination) = destination else {
        let summary = match family {
            ApiFamily::Rest => Summary::AccessLogNotEnabledRest,
            ApiFamily::Http => Summary::AccessLogNotEnabledHttp,
        };
        diagnostics.add_error(&summary, id);
        return None;
    };

    let Some(log_group_name) = log_group_name_from_arn(destination) else {
        debug!("{}: unsupported access log destination {}", id, destination);
        diagnostics.add_error(&Summary::AccessLogDestinationNotLogGroup, id);
        return None;
    };

    let format = stage
        .access_log
        .as_ref()
        .and_then(|settings| settings.format.as_deref())
        .unwrap_or_default();

    verifier
        .verify(format, &id, &log_group_name, field_maps, diagnostics)
        .then_some(log_group_name)
}
