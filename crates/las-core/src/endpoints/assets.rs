use super::{encode_content, Attributes, Page};
use crate::http::RequestBuilder;
use crate::{Client, Result};
use serde_json::Value;

impl Client {
    /// Upload an asset; `content` is sent base64 encoded
    pub async fn create_asset(&self, content: &[u8], attributes: Option<Attributes>) -> Result<Value> {
        let request = RequestBuilder::post("/assets")
            .field("content", encode_content(content))
            .attributes(attributes);
        self.execute(request).await
    }

    pub async fn list_assets(&self, page: &Page) -> Result<Value> {
        self.execute(page.apply(RequestBuilder::get("/assets"))).await
    }

    pub async fn get_asset(&self, asset_id: &str) -> Result<Value> {
        self.execute(RequestBuilder::get(format!("/assets/{}", asset_id)))
            .await
    }

    pub async fn update_asset(
        &self,
        asset_id: &str,
        content: Option<&[u8]>,
        attributes: Option<Attributes>,
    ) -> Result<Value> {
        let request = RequestBuilder::patch(format!("/assets/{}", asset_id))
            .field_opt("content", content.map(encode_content))
            .attributes(attributes);
        self.execute(request).await
    }

    pub async fn delete_asset(&self, asset_id: &str) -> Result<Value> {
        self.execute(RequestBuilder::delete(format!("/assets/{}", asset_id)))
            .await
    }
}
