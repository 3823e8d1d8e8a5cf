//! Log group naming conventions.

/// CloudWatch log group API Gateway writes REST execution logs to.
pub fn execution_log_group_name(api_id: &str, stage_name: &str) -> String {
    format!("API-Gateway-Execution-Logs_{}/{}", api_id, stage_name)
}

/// Extract the log group name from an access log destination ARN
/// (`arn:aws:logs:REGION:ACCOUNT_ID:log-group:LOG_GROUP_NAME`).
///
/// Everything after the sixth colon-delimited segment is the name; a trailing
/// `:*` stream wildcard is dropped. Destinations that are not log groups
/// (e.g. Firehose delivery streams) yield `None`.
pub fn log_group_name_from_arn(arn: &str) -> Option<String> {
    let segments: Vec<&str> = arn.split(':').collect();
    if segments.len() < 7 || segments[5] != "log-group" {
        return None;
    }
    let name = segments[6..].join(":");
    let name = name.strip_suffix(":*").unwrap_or(&name);
    (!name.is_empty()).then(|| name.to_string())
}

/// `apiId/stageName`, the identifier stage findings are reported under.
pub fn stage_id(api_id: &str, stage_name: &str) -> String {
    format!("{}/{}", api_id, stage_name)
}
