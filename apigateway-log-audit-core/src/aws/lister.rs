//! API Gateway (REST, v1) and API Gateway v2 (HTTP) backed stage listing.

use async_trait::async_trait;
use aws_config::SdkConfig;
use aws_sdk_apigateway::error::DisplayErrorContext;
use aws_sdk_apigateway::Client as RestClient;
use aws_sdk_apigatewayv2::Client as HttpClient;
use log::{debug, trace};

use super::{list_apis_operation, AwsError, AwsResult, StageLister, LIST_STAGES_OPERATION};
use crate::types::{AccessLogSettings, ApiFamily, ExecutionLogSettings, StageDescriptor};

/// Method settings key covering every resource and method of a REST stage.
const CATCH_ALL_METHOD: &str = "*/*";

pub struct AwsStageLister {
    rest_client: RestClient,
    http_client: HttpClient,
}

impl AwsStageLister {
    pub fn new(config: &SdkConfig) -> Self {
        Self {
            rest_client: RestClient::new(config),
            http_client: HttpClient::new(config),
        }
    }

    async fn list_rest_apis(&self) -> Vec<AwsResult<Vec<String>>> {
        let operation = list_apis_operation(ApiFamily::Rest);
        let mut pages: Vec<AwsResult<Vec<String>>> = Vec::new();
        let mut paginator = self.rest_client.get_rest_apis().into_paginator().send();
        while let Some(page) = paginator.next().await {
            let page = page
                .map(|output| {
                    output
                        .items()
                        .iter()
                        .filter_map(|api| api.id().map(str::to_string))
                        .collect()
                })
                .map_err(|e| AwsError::api_gateway(operation, DisplayErrorContext(&e).to_string()));
            pages.push(page);
        }
        pages
    }

    async fn list_http_apis(&self) -> Vec<AwsResult<Vec<String>>> {
        let operation = list_apis_operation(ApiFamily::Http);
        let mut pages: Vec<AwsResult<Vec<String>>> = Vec::new();
        let mut next_token: Option<String> = None;
        loop {
            let result = self
                .http_client
                .get_apis()
                .set_next_token(next_token.take())
                .send()
                .await;
            match result {
                Ok(output) => {
                    pages.push(Ok(output
                        .items()
                        .iter()
                        .filter_map(|api| api.api_id().map(str::to_string))
                        .collect()));
                    next_token = output.next_token().map(str::to_string);
                    if next_token.is_none() {
                        break;
                    }
                }
                Err(e) => {
                    pages.push(Err(AwsError::api_gateway(
                        operation,
                        DisplayErrorContext(&e).to_string(),
                    )));
                    break;
                }
            }
        }
        pages
    }

    async fn list_rest_stages(&self, api_id: &str) -> AwsResult<Vec<StageDescriptor>> {
        let output = self
            .rest_client
            .get_stages()
            .rest_api_id(api_id)
            .send()
            .await
            .map_err(|e| {
                AwsError::api_gateway(LIST_STAGES_OPERATION, DisplayErrorContext(&e).to_string())
            })?;
        Ok(output.item().iter().filter_map(rest_stage).collect())
    }

    async fn list_http_stages(&self, api_id: &str) -> AwsResult<Vec<StageDescriptor>> {
        let mut stages = Vec::new();
        let mut next_token: Option<String> = None;
        loop {
            let output = self
                .http_client
                .get_stages()
                .api_id(api_id)
                .set_next_token(next_token.take())
                .send()
                .await
                .map_err(|e| {
                    AwsError::api_gateway(
                        LIST_STAGES_OPERATION,
                        DisplayErrorContext(&e).to_string(),
                    )
                })?;
            stages.extend(output.items().iter().filter_map(http_stage));
            next_token = output.next_token().map(str::to_string);
            if next_token.is_none() {
                return Ok(stages);
            }
        }
    }
}

#[async_trait]
impl StageLister for AwsStageLister {
    async fn list_apis(&self, family: ApiFamily) -> Vec<AwsResult<Vec<String>>> {
        trace!("Listing {} APIs", family);
        match family {
            ApiFamily::Rest => self.list_rest_apis().await,
            ApiFamily::Http => self.list_http_apis().await,
        }
    }

    async fn list_stages(&self, family: ApiFamily, api_id: &str) -> AwsResult<Vec<StageDescriptor>> {
        let stages = match family {
            ApiFamily::Rest => self.list_rest_stages(api_id).await?,
            ApiFamily::Http => self.list_http_stages(api_id).await?,
        };
        debug!("{} API {} has {} stages", family, api_id, stages.len());
        Ok(stages)
    }
}

fn rest_stage(stage: &aws_sdk_apigateway::types::Stage) -> Option<StageDescriptor> {
    let execution_log = stage
        .method_settings()
        .and_then(|settings| settings.get(CATCH_ALL_METHOD))
        .map(|setting| ExecutionLogSettings {
            logging_level: setting.logging_level().map(str::to_string),
            data_trace_enabled: setting.data_trace_enabled(),
        });
    let access_log = stage
        .access_log_settings()
        .map(|settings| AccessLogSettings {
            destination_arn: settings.destination_arn().map(str::to_string),
            format: settings.format().map(str::to_string),
        });
    Some(StageDescriptor {
        stage_name: stage.stage_name()?.to_string(),
        execution_log,
        access_log,
    })
}

fn http_stage(stage: &aws_sdk_apigatewayv2::types::Stage) -> Option<StageDescriptor> {
    let access_log = stage
        .access_log_settings()
        .map(|settings| AccessLogSettings {
            destination_arn: settings.destination_arn().map(str::to_string),
            format: settings.format().map(str::to_string),
        });
    // Modelled as required in v2, so the accessor may not be optional.
    let stage_name = Option::<&str>::from(stage.stage_name())?;
    Some(StageDescriptor {
        stage_name: stage_name.to_string(),
        execution_log: None,
        access_log,
    })
}
