//! Audit Service Layer
//!
//! The service owns the [`ListerFactory`] used to reach each account/region
//! scope, and exposes the audit run to the adapters (CLI, tests).

use crate::aws::{AwsListerFactory, ListerFactory};
use crate::config::AuditConfig;

/// Main service struct that holds the lister factory and runs audits
pub struct AuditService {
    pub(crate) factory: Box<dyn ListerFactory>,
}

impl AuditService {
    /// Create a service backed by the AWS SDK, using the default credential
    /// provider chain plus the profile and role settings of `config`.
    pub fn new(config: &AuditConfig) -> Self {
        Self::with_factory(AwsListerFactory::from_config(config))
    }

    pub fn with_factory(factory: impl ListerFactory + 'static) -> Self {
        Self {
            factory: Box::new(factory),
        }
    }

    // run() method implementation is in audit.rs
}
