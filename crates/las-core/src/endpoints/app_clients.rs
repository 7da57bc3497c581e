use super::{Attributes, Page};
use crate::http::RequestBuilder;
use crate::{Client, Result};
use serde_json::Value;

impl Client {
    /// Create an app client
    pub async fn create_app_client(
        &self,
        generate_secret: bool,
        logout_urls: Option<Vec<String>>,
        callback_urls: Option<Vec<String>>,
        attributes: Option<Attributes>,
    ) -> Result<Value> {
        let request = RequestBuilder::post("/appClients")
            .field("generateSecret", generate_secret)
            .field_opt("logoutUrls", logout_urls)
            .field_opt("callbackUrls", callback_urls)
            .attributes(attributes);
        self.execute(request).await
    }

    pub async fn list_app_clients(&self, page: &Page) -> Result<Value> {
        self.execute(page.apply(RequestBuilder::get("/appClients")))
            .await
    }

    pub async fn delete_app_client(&self, app_client_id: &str) -> Result<Value> {
        self.execute(RequestBuilder::delete(format!("/appClients/{}", app_client_id)))
            .await
    }
}
