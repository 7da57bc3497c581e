use super::Page;
use crate::http::RequestBuilder;
use crate::{Client, Result};
use serde_json::Value;

/// Filters of [`Client::list_logs`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LogFilter {
    pub transition_id: Option<String>,
    pub transition_execution_id: Option<String>,
    pub workflow_id: Option<String>,
    pub workflow_execution_id: Option<String>,
}

impl Client {
    pub async fn list_logs(&self, filter: &LogFilter, page: &Page) -> Result<Value> {
        let request = RequestBuilder::get("/logs")
            .query_opt("transitionId", filter.transition_id.as_deref())
            .query_opt("transitionExecutionId", filter.transition_execution_id.as_deref())
            .query_opt("workflowId", filter.workflow_id.as_deref())
            .query_opt("workflowExecutionId", filter.workflow_execution_id.as_deref());
        self.execute(page.apply(request)).await
    }
}
