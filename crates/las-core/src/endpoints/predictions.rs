use super::Page;
use crate::http::RequestBuilder;
use crate::{Client, Result};
use serde_json::Value;

/// Parameters of [`Client::create_prediction`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CreatePrediction {
    pub document_id: String,
    pub model_id: String,
    pub max_pages: Option<u32>,
    pub auto_rotate: Option<bool>,
    /// `LOW` or `HIGH`
    pub image_quality: Option<String>,
}

impl CreatePrediction {
    pub fn new(document_id: impl Into<String>, model_id: impl Into<String>) -> Self {
        Self {
            document_id: document_id.into(),
            model_id: model_id.into(),
            ..Default::default()
        }
    }
}

impl Client {
    /// Run a model on a document
    pub async fn create_prediction(&self, params: CreatePrediction) -> Result<Value> {
        let request = RequestBuilder::post("/predictions")
            .field("documentId", params.document_id)
            .field("modelId", params.model_id)
            .field_opt("maxPages", params.max_pages)
            .field_opt("autoRotate", params.auto_rotate)
            .field_opt("imageQuality", params.image_quality);
        self.execute(request).await
    }

    pub async fn list_predictions(&self, page: &Page) -> Result<Value> {
        self.execute(page.apply(RequestBuilder::get("/predictions")))
            .await
    }
}
