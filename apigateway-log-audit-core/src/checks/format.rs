//! Access log format verification.
//!
//! Access log formats are meant to be JSON objects whose values are
//! `$context.*` variables, but stages are often configured with unquoted
//! variables or without the enclosing braces. Verification repairs the text,
//! parses it, flattens nested objects into dotted key paths and checks that
//! every required `$context` variable is logged. Accepted formats are also
//! compared against earlier stages writing to the same log group.

use log::{debug, trace};
use regex::Regex;
use serde_json::{Map, Value};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::OnceLock;
use thiserror::Error;

use crate::diagnostics::{DiagnosticsCollector, Summary};

/// `$context` variables every access log format must contain by default.
pub const DEFAULT_REQUIRED_FIELDS: [&str; 4] = [
    "$context.httpMethod",
    "$context.domainName",
    "$context.status",
    "$context.path",
];

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FormatError {
    #[error("Access log format is not a JSON object: {0}")]
    NotJson(String),
}

/// Ordered, duplicate-free vocabulary of required `$context` variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequiredFields(Vec<String>);

impl Default for RequiredFields {
    fn default() -> Self {
        Self::new(DEFAULT_REQUIRED_FIELDS)
    }
}

impl RequiredFields {
    pub fn new<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut required = Self(Vec::new());
        required.extend(fields);
        required
    }

    pub fn extend<I, S>(&mut self, fields: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for field in fields {
            let field = field.into();
            if !self.0.contains(&field) {
                self.0.push(field);
            }
        }
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }
}

/// Run-scoped record of which key path each `$context` variable was logged
/// under, per log group. Entries are only ever added, never replaced.
#[derive(Debug, Default)]
pub struct LogGroupFieldMaps {
    maps: HashMap<String, BTreeMap<String, String>>,
}

impl LogGroupFieldMaps {
    /// Merge one stage's value-to-key mapping into the log group's record and
    /// return the values whose key differs from the one recorded earlier.
    pub fn record(
        &mut self,
        log_group_name: &str,
        keys_by_value: BTreeMap<String, String>,
    ) -> Vec<String> {
        let Some(stored) = self.maps.get_mut(log_group_name) else {
            self.maps.insert(log_group_name.to_string(), keys_by_value);
            return Vec::new();
        };

        let mut mismatched = Vec::new();
        for (value, key) in keys_by_value {
            match stored.get(&value) {
                Some(stored_key) if *stored_key != key => {
                    debug!(
                        "Log group {}: {} logged as '{}' but previously as '{}'",
                        log_group_name, value, key, stored_key
                    );
                    mismatched.push(value);
                }
                Some(_) => {}
                None => {
                    stored.insert(value, key);
                }
            }
        }
        mismatched
    }

    pub fn key_for(&self, log_group_name: &str, value: &str) -> Option<&str> {
        self.maps
            .get(log_group_name)
            .and_then(|stored| stored.get(value))
            .map(String::as_str)
    }
}

/// Result of parsing and flattening one access log format.
#[derive(Debug, Clone, PartialEq)]
pub struct FormatAnalysis {
    /// The text that parsed, after quote repair and optional brace wrapping.
    pub repaired: String,
    /// Leaf values keyed by their dotted key path.
    pub fields: BTreeMap<String, Value>,
    /// Required variables not present among the leaf values.
    pub missing: Vec<String>,
}

impl FormatAnalysis {
    /// Reverse mapping from string leaf value to the key path it was found at.
    /// A value logged under several keys maps to the key path that sorts last.
    pub fn keys_by_value(&self) -> BTreeMap<String, String> {
        self.fields
            .iter()
            .filter_map(|(key, value)| value.as_str().map(|v| (v.to_string(), key.clone())))
            .collect()
    }
}

#[derive(Debug, Clone, Default)]
pub struct FormatVerifier {
    required: RequiredFields,
}

impl FormatVerifier {
    pub fn new(required: RequiredFields) -> Self {
        Self { required }
    }

    pub fn required(&self) -> &RequiredFields {
        &self.required
    }

    /// Repair, parse, flatten and compare against the required variables.
    pub fn analyze(&self, format: &str) -> Result<FormatAnalysis, FormatError> {
        let (repaired, parsed) = parse_format(format)?;
        let fields = flatten(&parsed);

        let present: BTreeSet<&str> = fields.values().filter_map(Value::as_str).collect();
        let missing = self
            .required
            .as_slice()
            .iter()
            .filter(|field| !present.contains(field.as_str()))
            .cloned()
            .collect();

        Ok(FormatAnalysis {
            repaired,
            fields,
            missing,
        })
    }

    /// Verify one stage's format. Returns `true` when the stage's log group may
    /// be accepted; key path mismatches against earlier stages only warn.
    pub fn verify(
        &self,
        format: &str,
        stage_id: &str,
        log_group_name: &str,
        field_maps: &mut LogGroupFieldMaps,
        diagnostics: &mut DiagnosticsCollector,
    ) -> bool {
        let analysis = match self.analyze(format) {
            Ok(analysis) => analysis,
            Err(err) => {
                debug!("{}: {}", stage_id, err);
                diagnostics.add_error(&Summary::AccessLogFormatNotJson, stage_id);
                return false;
            }
        };

        if !analysis.missing.is_empty() {
            diagnostics.add_error(
                &Summary::AccessLogFormatMissingRequiredValues(analysis.missing),
                stage_id,
            );
            return false;
        }

        let mismatch = Summary::AccessLogFormatKeyMismatch {
            log_group_name: log_group_name.to_string(),
        };
        for value in field_maps.record(log_group_name, analysis.keys_by_value()) {
            diagnostics.add_warning(&mismatch, value);
        }
        true
    }
}

fn context_value_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r":\s*(\$context[.\w]*)").expect("valid regex"))
}

fn bare_key_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(^|[{,])(\s*)([A-Za-z_][\w.\-]*)(\s*):").expect("valid regex")
    })
}

/// Quote unquoted `$context` values. Applying it to its own output changes
/// nothing.
pub fn quote_context_values(format: &str) -> String {
    context_value_pattern()
        .replace_all(format, r#":"${1}""#)
        .into_owned()
}

/// Quote bare object keys such as `key1:` in `key1:"$context.path"`.
///
/// Works on raw text, so it also matches inside string values. Only applied
/// to formats that failed to parse without it.
pub fn quote_bare_keys(format: &str) -> String {
    bare_key_pattern()
        .replace_all(format, r#"${1}${2}"${3}"${4}:"#)
        .into_owned()
}

/// Parse a format as a JSON object. Unquoted `$context` values are quoted
/// first; the text is tried as is, then wrapped in braces. Bare keys are
/// quoted only when both attempts fail. Returns the text that parsed along
/// with the object.
pub fn parse_format(format: &str) -> Result<(String, Map<String, Value>), FormatError> {
    let quoted = quote_context_values(format.trim());
    match parse_object(&quoted) {
        Ok(parsed) => Ok(parsed),
        Err(err) => {
            let keyed = quote_bare_keys(&quoted);
            if keyed != quoted {
                trace!("Format is not a JSON object ({}), retrying with quoted keys", err);
                if let Ok(parsed) = parse_object(&keyed) {
                    return Ok(parsed);
                }
            }
            Err(FormatError::NotJson(err.to_string()))
        }
    }
}

/// Try `text` as a JSON object, then `text` wrapped in braces. The error is
/// the one from the wrapped attempt.
fn parse_object(text: &str) -> Result<(String, Map<String, Value>), serde_json::Error> {
    serde_json::from_str::<Map<String, Value>>(text)
        .map(|parsed| (text.to_string(), parsed))
        .or_else(|first| {
            trace!("Format is not a JSON object ({}), retrying with braces", first);
            let wrapped = format!("{{{}}}", text);
            serde_json::from_str::<Map<String, Value>>(&wrapped).map(|parsed| (wrapped, parsed))
        })
}

/// Collapse nested objects into one level keyed by dot-joined paths. Arrays and
/// non-string scalars are kept as leaf values.
pub fn flatten(map: &Map<String, Value>) -> BTreeMap<String, Value> {
    let mut flattened = BTreeMap::new();
    for (key, value) in map {
        match value {
            Value::Object(child) => {
                for (child_key, child_value) in flatten(child) {
                    flattened.insert(format!("{}.{}", key, child_key), child_value);
                }
            }
            _ => {
                flattened.insert(key.clone(), value.clone());
            }
        }
    }
    flattened
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Severity;
    use proptest::prelude::*;
    use serde_json::json;

    const COMPLETE: &str = r#"{"method":"$context.httpMethod","domain":"$context.domainName","status":"$context.status","path":"$context.path"}"#;

    fn object(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            other => panic!("expected object, got {other}"),
        }
    }

    #[test]
    fn test_quote_context_values() {
        assert_eq!(
            quote_context_values(r#"{"path": $context.path, "status":$context.status}"#),
            r#"{"path":"$context.path", "status":"$context.status"}"#
        );
    }

    #[test]
    fn test_quoting_leaves_quoted_json_alone() {
        assert_eq!(quote_context_values(COMPLETE), COMPLETE);
        assert_eq!(quote_bare_keys(COMPLETE), COMPLETE);
    }

    #[test]
    fn test_key_like_text_inside_string_value_is_kept() {
        let format = r#"{"note":"a,b:c","method":"$context.httpMethod","domain":"$context.domainName","status":"$context.status","path":"$context.path"}"#;
        let analysis = FormatVerifier::default()
            .analyze(format)
            .expect("valid JSON should parse");
        assert_eq!(analysis.repaired, format);
        assert_eq!(analysis.fields["note"], json!("a,b:c"));
        assert!(analysis.missing.is_empty());

        let (repaired, _) =
            parse_format(r#""note":"{x: y}", "path":"$context.path""#).expect("should parse");
        assert_eq!(repaired, r#"{"note":"{x: y}", "path":"$context.path"}"#);
    }

    #[test]
    fn test_bare_keys_with_quoted_values_parse() {
        let (repaired, parsed) =
            parse_format(r#"{method:"$context.httpMethod", path:$context.path}"#)
                .expect("should parse");
        assert_eq!(
            repaired,
            r#"{"method":"$context.httpMethod", "path":"$context.path"}"#
        );
        assert_eq!(parsed.len(), 2);
    }

    #[test]
    fn test_duplicate_value_maps_to_last_sorted_key() {
        let analysis = FormatVerifier::default()
            .analyze(r#"{"b":"$context.path","a":"$context.path"}"#)
            .expect("should parse");
        assert_eq!(
            analysis.keys_by_value().get("$context.path").map(String::as_str),
            Some("b")
        );
    }

    #[test]
    fn test_braceless_unquoted_format_parses() {
        let (repaired, parsed) =
            parse_format("key1:$context.path, key2:$context.status").expect("should parse");
        assert_eq!(repaired, r#"{"key1":"$context.path", "key2":"$context.status"}"#);
        assert_eq!(
            flatten(&parsed),
            BTreeMap::from([
                ("key1".to_string(), json!("$context.path")),
                ("key2".to_string(), json!("$context.status")),
            ])
        );
    }

    #[test]
    fn test_braceless_quoted_format_parses() {
        let (_, parsed) = parse_format(r#""a": "$context.path", "b": "$context.status""#)
            .expect("should parse");
        assert_eq!(parsed.len(), 2);
    }

    #[test]
    fn test_common_log_format_is_not_json() {
        let clf = r#"$context.identity.sourceIp - - [$context.requestTime] "$context.httpMethod $context.path" $context.status"#;
        assert!(matches!(parse_format(clf), Err(FormatError::NotJson(_))));
    }

    #[test]
    fn test_flatten_empty_map() {
        assert!(flatten(&Map::new()).is_empty());
    }

    #[test]
    fn test_flatten_flat_map_passes_scalars_through() {
        let input = object(json!({
            "stringKey": "stringValue",
            "numericKey": 1234,
            "booleanKey": true,
            "floatingKey": 123.4,
        }));
        let flattened = flatten(&input);
        assert_eq!(flattened.len(), 4);
        assert_eq!(flattened["numericKey"], json!(1234));
        assert_eq!(flattened["booleanKey"], json!(true));
        assert_eq!(flattened["floatingKey"], json!(123.4));
    }

    #[test]
    fn test_flatten_nested_map() {
        let input = object(json!({
            "string.Key": "string.Value",
            "nestedKey": {
                "level1.a": {
                    "numericKey": 1234,
                    "booleanKey": true,
                },
                "stringKey": "StringValue",
            },
            "list": ["$context.path"],
        }));
        assert_eq!(
            flatten(&input),
            BTreeMap::from([
                ("string.Key".to_string(), json!("string.Value")),
                ("nestedKey.level1.a.numericKey".to_string(), json!(1234)),
                ("nestedKey.level1.a.booleanKey".to_string(), json!(true)),
                ("nestedKey.stringKey".to_string(), json!("StringValue")),
                ("list".to_string(), json!(["$context.path"])),
            ])
        );
    }

    #[test]
    fn test_missing_single_field_lists_only_that_field() {
        let verifier = FormatVerifier::default();
        let analysis = verifier
            .analyze(r#"{"method":"$context.httpMethod","domain":"$context.domainName","path":"$context.path"}"#)
            .expect("should parse");
        assert_eq!(analysis.missing, vec!["$context.status".to_string()]);
    }

    #[test]
    fn test_extended_vocabulary() {
        let mut required = RequiredFields::default();
        required.extend(["$context.requestId", "$context.status"]);
        assert_eq!(required.as_slice().len(), 5);

        let verifier = FormatVerifier::new(required);
        let analysis = verifier.analyze(COMPLETE).expect("should parse");
        assert_eq!(analysis.missing, vec!["$context.requestId".to_string()]);
    }

    #[test]
    fn test_verify_reports_missing_values() {
        let verifier = FormatVerifier::default();
        let mut maps = LogGroupFieldMaps::default();
        let mut diagnostics = DiagnosticsCollector::default();

        let accepted = verifier.verify(
            r#"{"path":"$context.path"}"#,
            "a1/prod",
            "access-logs",
            &mut maps,
            &mut diagnostics,
        );

        assert!(!accepted);
        assert!(maps.key_for("access-logs", "$context.path").is_none());
        let diagnostics = diagnostics.finish();
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(
            diagnostics[0].message,
            "Access Log Format is missing required values [$context.httpMethod, $context.domainName, $context.status] for [a1/prod]"
        );
    }

    #[test]
    fn test_verify_reports_unparsable_format() {
        let verifier = FormatVerifier::default();
        let mut diagnostics = DiagnosticsCollector::default();
        let accepted = verifier.verify(
            "not json at all",
            "a1/prod",
            "access-logs",
            &mut LogGroupFieldMaps::default(),
            &mut diagnostics,
        );
        assert!(!accepted);
        assert_eq!(
            diagnostics.finish()[0].message,
            "Access Log Format is not JSON parsable for [a1/prod]"
        );
    }

    #[test]
    fn test_key_mismatch_across_stages_warns_once() {
        let verifier = FormatVerifier::default();
        let mut maps = LogGroupFieldMaps::default();
        let mut diagnostics = DiagnosticsCollector::default();

        let stage_a = r#"{"method":"$context.httpMethod","domain":"$context.domainName","s":"$context.status","path":"$context.path"}"#;
        let stage_b = r#"{"method":"$context.httpMethod","domain":"$context.domainName","status":"$context.status","path":"$context.path"}"#;

        assert!(verifier.verify(stage_a, "a1/prod", "shared", &mut maps, &mut diagnostics));
        assert!(verifier.verify(stage_b, "a2/prod", "shared", &mut maps, &mut diagnostics));
        assert_eq!(maps.key_for("shared", "$context.status"), Some("s"));

        let diagnostics = diagnostics.finish();
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].severity, Severity::Warning);
        assert!(diagnostics[0].message.contains("log group shared"));
        assert!(diagnostics[0].message.ends_with("for [$context.status]"));
    }

    #[test]
    fn test_new_values_are_appended_to_existing_log_group() {
        let mut maps = LogGroupFieldMaps::default();
        maps.record(
            "lg",
            BTreeMap::from([("$context.path".to_string(), "path".to_string())]),
        );
        let mismatched = maps.record(
            "lg",
            BTreeMap::from([
                ("$context.path".to_string(), "path".to_string()),
                ("$context.requestId".to_string(), "id".to_string()),
            ]),
        );
        assert!(mismatched.is_empty());
        assert_eq!(maps.key_for("lg", "$context.requestId"), Some("id"));
    }

    fn nest(depth: usize, leaf: Value) -> Value {
        (0..depth).fold(leaf, |inner, level| {
            let mut wrapper = Map::new();
            wrapper.insert(format!("level{level}"), inner);
            Value::Object(wrapper)
        })
    }

    proptest! {
        #[test]
        fn prop_quoting_is_idempotent(format in r#"[a-z0-9 :,{}"$.]{0,40}"#) {
            let values = quote_context_values(&format);
            prop_assert_eq!(quote_context_values(&values), values.clone());
            let keys = quote_bare_keys(&values);
            prop_assert_eq!(quote_bare_keys(&keys), keys);
        }

        #[test]
        fn prop_valid_json_object_parses_unchanged(note in r#"[a-z ,:{}]{0,20}"#) {
            let mut map = Map::new();
            map.insert("note".to_string(), Value::String(note));
            map.insert("path".to_string(), json!("$context.path"));
            let format = Value::Object(map).to_string();
            let (repaired, _) = parse_format(&format).expect("valid JSON should parse");
            prop_assert_eq!(repaired, format);
        }

        #[test]
        fn prop_complete_format_verifies_at_any_depth(depth in 0usize..6) {
            let leaf = json!({
                "method": "$context.httpMethod",
                "domain": "$context.domainName",
                "status": "$context.status",
                "path": "$context.path",
            });
            let format = nest(depth, leaf).to_string();
            let verifier = FormatVerifier::default();
            let analysis = verifier.analyze(&format).expect("should parse");
            prop_assert!(analysis.missing.is_empty());

            let leaves: BTreeSet<String> = analysis
                .fields
                .values()
                .filter_map(|v| v.as_str().map(str::to_string))
                .collect();
            let expected: BTreeSet<String> =
                DEFAULT_REQUIRED_FIELDS.iter().map(|f| f.to_string()).collect();
            prop_assert_eq!(leaves, expected);
            for key in analysis.fields.keys() {
                prop_assert_eq!(key.split('.').count(), depth + 1);
            }
        }
    }
}
