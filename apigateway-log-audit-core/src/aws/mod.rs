//! AWS SDK integration: the stage listing capability consumed by the audit
//! run, its API Gateway backed implementation, and per-scope credentials.

mod factory;
mod lister;

pub use factory::AwsListerFactory;
pub use lister::AwsStageLister;

use async_trait::async_trait;
use thiserror::Error;

use crate::config::AccountScope;
use crate::types::{ApiFamily, StageDescriptor};

#[derive(Error, Debug)]
pub enum AwsError {
    #[error("AWS configuration error: {0}")]
    ConfigError(String),
    #[error("Error while invoking {operation} sdk call: {message}")]
    ApiGatewayError {
        operation: &'static str,
        message: String,
    },
}

impl AwsError {
    pub fn api_gateway(operation: &'static str, message: impl Into<String>) -> Self {
        Self::ApiGatewayError {
            operation,
            message: message.into(),
        }
    }
}

pub type AwsResult<T> = Result<T, AwsError>;

/// SDK operation used to list the APIs of a family.
pub fn list_apis_operation(family: ApiFamily) -> &'static str {
    match family {
        ApiFamily::Rest => "GetRestApis",
        ApiFamily::Http => "GetApis",
    }
}

pub const LIST_STAGES_OPERATION: &str = "GetStages";

/// Read-only view of the APIs and stages deployed in one account and region.
#[async_trait]
pub trait StageLister: Send + Sync {
    /// List API ids, one entry per page. A failed page does not end the
    /// listing for the pages that were already retrieved.
    async fn list_apis(&self, family: ApiFamily) -> Vec<AwsResult<Vec<String>>>;

    async fn list_stages(&self, family: ApiFamily, api_id: &str) -> AwsResult<Vec<StageDescriptor>>;
}

/// Builds the [`StageLister`] used for one account/region scope.
#[async_trait]
pub trait ListerFactory: Send + Sync {
    async fn lister_for(&self, scope: &AccountScope) -> AwsResult<Box<dyn StageLister>>;
}
