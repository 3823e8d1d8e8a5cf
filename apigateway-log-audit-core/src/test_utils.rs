//! In-memory stage listing fixtures for exercising audit runs without AWS.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::aws::{
    list_apis_operation, AwsError, AwsResult, ListerFactory, StageLister, LIST_STAGES_OPERATION,
};
use crate::config::AccountScope;
use crate::types::{ApiFamily, StageDescriptor};

/// Access log destination used by the fixtures.
pub fn log_group_arn(name: &str) -> String {
    format!("arn:aws:logs:us-east-1:123456789012:log-group:{name}")
}

/// Format containing every default required `$context` variable.
pub const COMPLIANT_FORMAT: &str = r#"{"requestId":"$context.requestId","httpMethod":"$context.httpMethod","domainName":"$context.domainName","status":"$context.status","path":"$context.path"}"#;

/// Serves fixed API pages and stages, and records every call made to it.
#[derive(Debug, Clone, Default)]
pub struct StaticStageLister {
    pages: HashMap<ApiFamily, Vec<Result<Vec<String>, String>>>,
    stages: HashMap<(ApiFamily, String), Result<Vec<StageDescriptor>, String>>,
    calls: Arc<Mutex<Vec<String>>>,
}

impl StaticStageLister {
    /// Add an API with its stages to the family's last page.
    #[must_use]
    pub fn with_api(mut self, family: ApiFamily, api_id: &str, stages: Vec<StageDescriptor>) -> Self {
        let pages = self.pages.entry(family).or_default();
        match pages.iter_mut().rev().find_map(|page| page.as_mut().ok()) {
            Some(page) => page.push(api_id.to_string()),
            None => pages.push(Ok(vec![api_id.to_string()])),
        }
        self.stages.insert((family, api_id.to_string()), Ok(stages));
        self
    }

    /// Start a new, empty page for the family.
    #[must_use]
    pub fn with_new_page(mut self, family: ApiFamily) -> Self {
        self.pages.entry(family).or_default().push(Ok(Vec::new()));
        self
    }

    #[must_use]
    pub fn with_failed_page(mut self, family: ApiFamily, message: &str) -> Self {
        self.pages
            .entry(family)
            .or_default()
            .push(Err(message.to_string()));
        self
    }

    #[must_use]
    pub fn with_failed_stages(mut self, family: ApiFamily, api_id: &str, message: &str) -> Self {
        let pages = self.pages.entry(family).or_default();
        if pages.is_empty() {
            pages.push(Ok(Vec::new()));
        }
        if let Some(Ok(page)) = pages.last_mut() {
            page.push(api_id.to_string());
        }
        self.stages
            .insert((family, api_id.to_string()), Err(message.to_string()));
        self
    }

    /// Calls made so far, as `"<operation> <family> [api id]"`.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().map(|calls| calls.clone()).unwrap_or_default()
    }

    fn record(&self, call: String) {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(call);
        }
    }
}

#[async_trait]
impl StageLister for StaticStageLister {
    async fn list_apis(&self, family: ApiFamily) -> Vec<AwsResult<Vec<String>>> {
        let operation = list_apis_operation(family);
        self.record(format!("{operation} {family}"));
        self.pages
            .get(&family)
            .map(|pages| {
                pages
                    .iter()
                    .map(|page| {
                        page.clone()
                            .map_err(|message| AwsError::api_gateway(operation, message))
                    })
                    .collect()
            })
            .unwrap_or_else(|| vec![Ok(Vec::new())])
    }

    async fn list_stages(&self, family: ApiFamily, api_id: &str) -> AwsResult<Vec<StageDescriptor>> {
        self.record(format!("{LIST_STAGES_OPERATION} {family} {api_id}"));
        match self.stages.get(&(family, api_id.to_string())) {
            Some(Ok(stages)) => Ok(stages.clone()),
            Some(Err(message)) => Err(AwsError::api_gateway(LIST_STAGES_OPERATION, message.clone())),
            None => Ok(Vec::new()),
        }
    }
}

/// Hands out a [`StaticStageLister`] per region; unknown regions fail.
#[derive(Debug, Clone, Default)]
pub struct StaticListerFactory {
    listers: HashMap<String, StaticStageLister>,
}

impl StaticListerFactory {
    #[must_use]
    pub fn with_region(mut self, region: &str, lister: StaticStageLister) -> Self {
        self.listers.insert(region.to_string(), lister);
        self
    }
}

#[async_trait]
impl ListerFactory for StaticListerFactory {
    async fn lister_for(&self, scope: &AccountScope) -> AwsResult<Box<dyn StageLister>> {
        self.listers
            .get(&scope.region)
            .cloned()
            .map(|lister| Box::new(lister) as Box<dyn StageLister>)
            .ok_or_else(|| {
                AwsError::ConfigError(format!("no credentials for region {}", scope.region))
            })
    }
}
