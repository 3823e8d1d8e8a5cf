//! This crate provides the core business logic for the API Gateway log audit:
//! - Selector parsing and include/exclude stage filtering
//! - Execution log and access log validation per stage
//! - Access log format repair, flattening and cross-stage consistency tracking
//! - Diagnostics consolidation and log group result assembly
//!

pub mod aws;
pub mod checks;
pub mod commands;
mod config;
mod diagnostics;
mod error;
mod results;
pub mod selection;
mod types;

#[cfg(any(test, feature = "integ-test"))]
pub mod test_utils;

// Re-exports for a small, focused public API
pub use aws::{AwsError, AwsListerFactory, AwsResult, AwsStageLister, ListerFactory, StageLister};
pub use checks::format::{FormatVerifier, LogGroupFieldMaps, RequiredFields};
pub use checks::StageChecker;
pub use commands::AuditService;
pub use config::{AccountScope, AuditConfig};
pub use diagnostics::{DiagnosticsCollector, Summary};
pub use error::{AuditError, AuditResult};
pub use results::assemble_log_group_names;
pub use selection::{ScopeDecision, Selection};
pub use types::{
    AccessLogSettings, ActionMode, ApiFamily, AuditReport, Diagnostic, ExecutionLogSettings,
    Severity, StageDescriptor,
};
