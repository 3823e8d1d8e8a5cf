//! Audit configuration, loaded from TOML or JSON.
//!
//! ```toml
//! ignore_access_log_settings = false
//! additional_required_fields = ["$context.requestId"]
//!
//! [[accounts]]
//! region = "us-east-1"
//! api_list = ["a1b2c3", "d4e5f6/prod"]
//! action = "include"
//! cross_account_role_arn = "arn:aws:iam::123456789012:role/ApiGatewayAudit"
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::checks::format::{FormatVerifier, RequiredFields};
use crate::error::{AuditError, AuditResult};
use crate::types::ActionMode;

/// One account/region whose API Gateway deployments are audited.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AccountScope {
    pub region: String,
    /// `apiId` or `apiId/stageName` selectors.
    #[serde(default)]
    pub api_list: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<ActionMode>,
    /// Shorthand for `action = "exclude"`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exclude: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cross_account_role_arn: Option<String>,
}

impl AccountScope {
    pub fn new(region: impl Into<String>, api_list: Vec<String>, mode: ActionMode) -> Self {
        Self {
            region: region.into(),
            api_list,
            action: Some(mode),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_role_arn(mut self, role_arn: impl Into<String>) -> Self {
        self.cross_account_role_arn = Some(role_arn.into());
        self
    }

    pub fn mode(&self) -> ActionMode {
        match (self.action, self.exclude) {
            (Some(action), _) => action,
            (None, Some(true)) => ActionMode::Exclude,
            (None, _) => ActionMode::Include,
        }
    }

    /// Cross-account role to assume, with an empty string meaning none.
    pub fn role_arn(&self) -> Option<&str> {
        self.cross_account_role_arn
            .as_deref()
            .filter(|arn| !arn.is_empty())
    }

    fn validate(&self, index: usize) -> AuditResult<()> {
        if self.region.trim().is_empty() {
            return Err(AuditError::invalid_config(format!(
                "accounts[{index}]: region must not be empty"
            )));
        }
        if let (Some(action), Some(exclude)) = (self.action, self.exclude) {
            if action.is_exclude() != exclude {
                return Err(AuditError::invalid_config(format!(
                    "accounts[{index}]: action '{:?}' contradicts exclude = {exclude}",
                    action
                )));
            }
        }
        if let Some(role_arn) = self.role_arn() {
            validate_role_arn(role_arn)
                .map_err(|msg| AuditError::invalid_config(format!("accounts[{index}]: {msg}")))?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AuditConfig {
    /// Skip access log checks; HTTP APIs are then not audited at all.
    #[serde(default)]
    pub ignore_access_log_settings: bool,
    /// Shared config profile for the base credentials.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile: Option<String>,
    /// Role assumed with the base credentials before any scope is audited.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assume_role_arn: Option<String>,
    /// Replaces the default required `$context` variables.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required_access_log_fields: Option<Vec<String>>,
    /// Required in addition to the default (or replaced) variables.
    #[serde(default)]
    pub additional_required_fields: Vec<String>,
    pub accounts: Vec<AccountScope>,
}

impl AuditConfig {
    /// Load and validate a config file; the format follows the extension.
    pub fn from_path(path: impl AsRef<Path>) -> AuditResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| AuditError::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => Self::from_toml_str(&content),
            Some("json") => Self::from_json_str(&content),
            _ => Err(AuditError::UnsupportedConfigFormat(path.to_path_buf())),
        }
    }

    pub fn from_toml_str(content: &str) -> AuditResult<Self> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_str(content: &str) -> AuditResult<Self> {
        let config: Self = serde_json::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Structural validation. An include scope with an empty `api_list` is
    /// accepted here and reported by the audit run itself.
    pub fn validate(&self) -> AuditResult<()> {
        if self.accounts.is_empty() {
            return Err(AuditError::invalid_config(
                "at least one account must be configured",
            ));
        }
        if let Some(role_arn) = self.assume_role_arn.as_deref() {
            validate_role_arn(role_arn).map_err(AuditError::invalid_config)?;
        }
        if let Some(fields) = &self.required_access_log_fields {
            if fields.is_empty() {
                return Err(AuditError::invalid_config(
                    "required_access_log_fields must not be empty when set",
                ));
            }
        }
        for (index, scope) in self.accounts.iter().enumerate() {
            scope.validate(index)?;
        }
        Ok(())
    }

    pub fn required_fields(&self) -> RequiredFields {
        let mut required = match &self.required_access_log_fields {
            Some(fields) => RequiredFields::new(fields.iter().cloned()),
            None => RequiredFields::default(),
        };
        required.extend(self.additional_required_fields.iter().cloned());
        required
    }

    pub fn format_verifier(&self) -> FormatVerifier {
        FormatVerifier::new(self.required_fields())
    }
}

fn validate_role_arn(role_arn: &str) -> Result<(), String> {
    if role_arn.starts_with("arn:") && role_arn.split(':').count() >= 6 {
        Ok(())
    } else {
        Err(format!("'{role_arn}' is not a valid role ARN"))
    }
}
