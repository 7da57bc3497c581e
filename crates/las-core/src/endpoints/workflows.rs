use super::{Attributes, ExecutionQuery, Page};
use crate::http::RequestBuilder;
use crate::{Client, Result};
use serde_json::Value;

/// Parameters of [`Client::create_workflow`]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CreateWorkflow {
    pub specification: Value,
    pub error_config: Option<Value>,
    pub completed_config: Option<Value>,
    pub attributes: Option<Attributes>,
}

impl CreateWorkflow {
    pub fn new(specification: Value) -> Self {
        Self {
            specification,
            ..Default::default()
        }
    }
}

/// Parameters of [`Client::update_workflow`]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UpdateWorkflow {
    pub error_config: Option<Value>,
    pub completed_config: Option<Value>,
    pub attributes: Option<Attributes>,
}

impl Client {
    pub async fn create_workflow(&self, params: CreateWorkflow) -> Result<Value> {
        let request = RequestBuilder::post("/workflows")
            .field("specification", params.specification)
            .field_opt("errorConfig", params.error_config)
            .field_opt("completedConfig", params.completed_config)
            .attributes(params.attributes);
        self.execute(request).await
    }

    pub async fn list_workflows(&self, page: &Page) -> Result<Value> {
        self.execute(page.apply(RequestBuilder::get("/workflows")))
            .await
    }

    pub async fn get_workflow(&self, workflow_id: &str) -> Result<Value> {
        self.execute(RequestBuilder::get(format!("/workflows/{}", workflow_id)))
            .await
    }

    pub async fn update_workflow(&self, workflow_id: &str, params: UpdateWorkflow) -> Result<Value> {
        let request = RequestBuilder::patch(format!("/workflows/{}", workflow_id))
            .field_opt("errorConfig", params.error_config)
            .field_opt("completedConfig", params.completed_config)
            .attributes(params.attributes);
        self.execute(request).await
    }

    pub async fn delete_workflow(&self, workflow_id: &str) -> Result<Value> {
        self.execute(RequestBuilder::delete(format!("/workflows/{}", workflow_id)))
            .await
    }

    /// Start a workflow execution with `input` as its payload
    pub async fn execute_workflow(&self, workflow_id: &str, input: Value) -> Result<Value> {
        let request = RequestBuilder::post(format!("/workflows/{}/executions", workflow_id))
            .field("input", input);
        self.execute(request).await
    }

    pub async fn list_workflow_executions(
        &self,
        workflow_id: &str,
        query: &ExecutionQuery,
    ) -> Result<Value> {
        let request = RequestBuilder::get(format!("/workflows/{}/executions", workflow_id))
            .query_list("status", &query.statuses);
        let request = query.sort.apply(query.page.apply(request));
        self.execute(request).await
    }

    pub async fn get_workflow_execution(&self, workflow_id: &str, execution_id: &str) -> Result<Value> {
        self.execute(RequestBuilder::get(format!(
            "/workflows/{}/executions/{}",
            workflow_id, execution_id
        )))
        .await
    }

    /// Move a workflow execution on to another transition
    pub async fn update_workflow_execution(
        &self,
        workflow_id: &str,
        execution_id: &str,
        next_transition_id: &str,
    ) -> Result<Value> {
        let request = RequestBuilder::patch(format!(
            "/workflows/{}/executions/{}",
            workflow_id, execution_id
        ))
        .field("nextTransitionId", next_transition_id);
        self.execute(request).await
    }

    pub async fn delete_workflow_execution(
        &self,
        workflow_id: &str,
        execution_id: &str,
    ) -> Result<Value> {
        self.execute(RequestBuilder::delete(format!(
            "/workflows/{}/executions/{}",
            workflow_id, execution_id
        )))
        .await
    }
}
