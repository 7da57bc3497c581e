use super::Page;
use crate::http::RequestBuilder;
use crate::{Client, Result};
use serde_json::Value;

impl Client {
    pub async fn list_models(&self, page: &Page) -> Result<Value> {
        self.execute(page.apply(RequestBuilder::get("/models"))).await
    }
}
