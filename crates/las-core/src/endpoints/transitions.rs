use super::{Attributes, Page, Sort};
use crate::http::RequestBuilder;
use crate::{Client, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::Value;

/// Parameters of [`Client::create_transition`]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CreateTransition {
    /// `docker` or `manual`
    pub transition_type: String,
    pub input_json_schema: Option<Value>,
    pub output_json_schema: Option<Value>,
    pub parameters: Option<Value>,
    pub attributes: Option<Attributes>,
}

impl CreateTransition {
    pub fn new(transition_type: impl Into<String>) -> Self {
        Self {
            transition_type: transition_type.into(),
            ..Default::default()
        }
    }
}

/// Parameters of [`Client::update_transition`]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UpdateTransition {
    pub input_json_schema: Option<Value>,
    pub output_json_schema: Option<Value>,
    pub assets: Option<Value>,
    pub environment: Option<Value>,
    pub environment_secrets: Option<Vec<String>>,
    pub attributes: Option<Attributes>,
}

/// Filters of execution listings
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecutionQuery {
    /// Sent as one `status` entry per value
    pub statuses: Vec<String>,
    /// Sent as one `executionId` entry per value; ignored for workflows
    pub execution_ids: Vec<String>,
    pub page: Page,
    pub sort: Sort,
}

impl ExecutionQuery {
    pub fn status(status: impl Into<String>) -> Self {
        Self {
            statuses: vec![status.into()],
            ..Default::default()
        }
    }
}

/// Parameters of [`Client::update_transition_execution`]
#[derive(Debug, Clone, PartialEq)]
pub struct UpdateTransitionExecution {
    /// `succeeded`, `failed`, `retry` or `rejected`
    pub status: String,
    pub output: Option<Value>,
    pub error: Option<Value>,
    pub start_time: Option<DateTime<Utc>>,
}

impl UpdateTransitionExecution {
    pub fn new(status: impl Into<String>) -> Self {
        Self {
            status: status.into(),
            output: None,
            error: None,
            start_time: None,
        }
    }
}

impl Client {
    pub async fn create_transition(&self, params: CreateTransition) -> Result<Value> {
        let request = RequestBuilder::post("/transitions")
            .field("transitionType", params.transition_type)
            .field_opt("inputJsonSchema", params.input_json_schema)
            .field_opt("outputJsonSchema", params.output_json_schema)
            .field_opt("parameters", params.parameters)
            .attributes(params.attributes);
        self.execute(request).await
    }

    pub async fn list_transitions(&self, transition_type: Option<&str>, page: &Page) -> Result<Value> {
        let request = RequestBuilder::get("/transitions").query_opt("transitionType", transition_type);
        self.execute(page.apply(request)).await
    }

    pub async fn get_transition(&self, transition_id: &str) -> Result<Value> {
        self.execute(RequestBuilder::get(format!("/transitions/{}", transition_id)))
            .await
    }

    pub async fn update_transition(
        &self,
        transition_id: &str,
        params: UpdateTransition,
    ) -> Result<Value> {
        let request = RequestBuilder::patch(format!("/transitions/{}", transition_id))
            .field_opt("inputJsonSchema", params.input_json_schema)
            .field_opt("outputJsonSchema", params.output_json_schema)
            .field_opt("assets", params.assets)
            .field_opt("environment", params.environment)
            .field_opt("environmentSecrets", params.environment_secrets)
            .attributes(params.attributes);
        self.execute(request).await
    }

    pub async fn delete_transition(&self, transition_id: &str) -> Result<Value> {
        self.execute(RequestBuilder::delete(format!("/transitions/{}", transition_id)))
            .await
    }

    /// Start a manual execution of a transition
    pub async fn execute_transition(&self, transition_id: &str) -> Result<Value> {
        self.execute(RequestBuilder::post(format!(
            "/transitions/{}/executions",
            transition_id
        )))
        .await
    }

    pub async fn list_transition_executions(
        &self,
        transition_id: &str,
        query: &ExecutionQuery,
    ) -> Result<Value> {
        let request = RequestBuilder::get(format!("/transitions/{}/executions", transition_id))
            .query_list("status", &query.statuses)
            .query_list("executionId", &query.execution_ids);
        let request = query.sort.apply(query.page.apply(request));
        self.execute(request).await
    }

    pub async fn get_transition_execution(
        &self,
        transition_id: &str,
        execution_id: &str,
    ) -> Result<Value> {
        self.execute(RequestBuilder::get(format!(
            "/transitions/{}/executions/{}",
            transition_id, execution_id
        )))
        .await
    }

    /// Report the result of a transition execution
    pub async fn update_transition_execution(
        &self,
        transition_id: &str,
        execution_id: &str,
        params: UpdateTransitionExecution,
    ) -> Result<Value> {
        let request = RequestBuilder::patch(format!(
            "/transitions/{}/executions/{}",
            transition_id, execution_id
        ))
        .field("status", params.status)
        .field_opt("output", params.output)
        .field_opt("error", params.error)
        .field_opt(
            "startTime",
            params
                .start_time
                .map(|t| t.to_rfc3339_opts(SecondsFormat::Millis, false)),
        );
        self.execute(request).await
    }

    /// Keep a running transition execution alive
    pub async fn send_heartbeat(&self, transition_id: &str, execution_id: &str) -> Result<Value> {
        self.execute(RequestBuilder::post(format!(
            "/transitions/{}/executions/{}/heartbeats",
            transition_id, execution_id
        )))
        .await
    }
}
