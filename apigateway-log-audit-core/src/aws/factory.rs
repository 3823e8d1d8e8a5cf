//! Per-scope AWS configuration: region, shared-config profile and optional
//! role assumption for the base credentials and for cross-account scopes.

use async_trait::async_trait;
use aws_config::sts::AssumeRoleProvider;
use aws_config::{BehaviorVersion, Region, SdkConfig};
use log::info;

use super::{AwsError, AwsResult, ListerFactory, StageLister};
use crate::aws::AwsStageLister;
use crate::config::{AccountScope, AuditConfig};

const SESSION_NAME: &str = "apigateway-log-audit";

/// Builds [`AwsStageLister`]s from the default credential provider chain.
#[derive(Debug, Clone, Default)]
pub struct AwsListerFactory {
    profile: Option<String>,
    assume_role_arn: Option<String>,
}

impl AwsListerFactory {
    pub fn new(profile: Option<String>, assume_role_arn: Option<String>) -> Self {
        Self {
            profile,
            assume_role_arn,
        }
    }

    pub fn from_config(config: &AuditConfig) -> Self {
        Self::new(config.profile.clone(), config.assume_role_arn.clone())
    }

    async fn load(&self, region: Region) -> SdkConfig {
        let mut loader = aws_config::defaults(BehaviorVersion::latest()).region(region.clone());
        if let Some(profile) = &self.profile {
            loader = loader.profile_name(profile);
        }
        let config = loader.load().await;
        match &self.assume_role_arn {
            Some(role_arn) => assume_role(&config, role_arn, region).await,
            None => config,
        }
    }
}

/// Credentials are resolved lazily: a role that cannot be assumed surfaces as
/// a failure of the first API Gateway call made with this configuration.
async fn assume_role(base: &SdkConfig, role_arn: &str, region: Region) -> SdkConfig {
    info!("Assuming role {} in {}", role_arn, region);
    let provider = AssumeRoleProvider::builder(role_arn)
        .session_name(SESSION_NAME)
        .region(region.clone())
        .configure(base)
        .build()
        .await;
    aws_config::defaults(BehaviorVersion::latest())
        .region(region)
        .credentials_provider(provider)
        .load()
        .await
}

#[async_trait]
impl ListerFactory for AwsListerFactory {
    async fn lister_for(&self, scope: &AccountScope) -> AwsResult<Box<dyn StageLister>> {
        if scope.region.trim().is_empty() {
            return Err(AwsError::ConfigError(
                "account scope has no region".to_string(),
            ));
        }
        let region = Region::new(scope.region.clone());
        let base = self.load(region.clone()).await;
        let config = match scope.role_arn() {
            Some(role_arn) => assume_role(&base, role_arn, region).await,
            None => base,
        };
        Ok(Box::new(AwsStageLister::new(&config)))
    }
}
