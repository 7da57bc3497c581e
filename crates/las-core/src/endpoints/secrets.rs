use super::{Attributes, Page};
use crate::http::RequestBuilder;
use crate::{Client, Result};
use serde_json::{Map, Value};

impl Client {
    /// Store a secret; `data` holds the secret key/value pairs
    pub async fn create_secret(
        &self,
        data: Map<String, Value>,
        attributes: Option<Attributes>,
    ) -> Result<Value> {
        let request = RequestBuilder::post("/secrets")
            .field("data", data)
            .attributes(attributes);
        self.execute(request).await
    }

    pub async fn list_secrets(&self, page: &Page) -> Result<Value> {
        self.execute(page.apply(RequestBuilder::get("/secrets"))).await
    }

    pub async fn update_secret(
        &self,
        secret_id: &str,
        data: Option<Map<String, Value>>,
        attributes: Option<Attributes>,
    ) -> Result<Value> {
        let request = RequestBuilder::patch(format!("/secrets/{}", secret_id))
            .field_opt("data", data)
            .attributes(attributes);
        self.execute(request).await
    }

    pub async fn delete_secret(&self, secret_id: &str) -> Result<Value> {
        self.execute(RequestBuilder::delete(format!("/secrets/{}", secret_id)))
            .await
    }
}
