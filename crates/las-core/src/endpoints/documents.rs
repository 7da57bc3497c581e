use super::{encode_content, Page};
use crate::http::RequestBuilder;
use crate::{Client, Result};
use serde_json::Value;

/// Parameters of [`Client::create_document`]
#[derive(Debug, Clone, PartialEq)]
pub struct CreateDocument {
    pub content: Vec<u8>,
    pub content_type: String,
    pub consent_id: Option<String>,
    pub batch_id: Option<String>,
    /// List of `{"label": ..., "value": ...}` objects
    pub ground_truth: Option<Value>,
}

impl CreateDocument {
    pub fn new(content: impl Into<Vec<u8>>, content_type: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            content_type: content_type.into(),
            consent_id: None,
            batch_id: None,
            ground_truth: None,
        }
    }

    pub fn consent_id(mut self, consent_id: impl Into<String>) -> Self {
        self.consent_id = Some(consent_id.into());
        self
    }

    pub fn batch_id(mut self, batch_id: impl Into<String>) -> Self {
        self.batch_id = Some(batch_id.into());
        self
    }

    pub fn ground_truth(mut self, ground_truth: Value) -> Self {
        self.ground_truth = Some(ground_truth);
        self
    }
}

/// Filters shared by document listing and bulk deletion
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocumentFilter {
    pub batch_id: Option<String>,
    pub consent_id: Option<String>,
}

impl DocumentFilter {
    pub fn batch(batch_id: impl Into<String>) -> Self {
        Self {
            batch_id: Some(batch_id.into()),
            consent_id: None,
        }
    }

    fn apply(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .query_opt("batchId", non_empty(&self.batch_id))
            .query_opt("consentId", non_empty(&self.consent_id))
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

impl Client {
    /// Upload a document; `content` is sent base64 encoded
    pub async fn create_document(&self, params: CreateDocument) -> Result<Value> {
        let request = RequestBuilder::post("/documents")
            .field("content", encode_content(&params.content))
            .field("contentType", params.content_type)
            .field_opt("consentId", params.consent_id)
            .field_opt("batchId", params.batch_id.filter(|id| !id.is_empty()))
            .field_opt("groundTruth", params.ground_truth);
        self.execute(request).await
    }

    pub async fn list_documents(&self, filter: &DocumentFilter, page: &Page) -> Result<Value> {
        let request = page.apply(filter.apply(RequestBuilder::get("/documents")));
        self.execute(request).await
    }

    pub async fn get_document(&self, document_id: &str) -> Result<Value> {
        self.execute(RequestBuilder::get(format!("/documents/{}", document_id)))
            .await
    }

    /// Replace the ground truth of a document
    pub async fn update_document(&self, document_id: &str, ground_truth: Value) -> Result<Value> {
        let request = RequestBuilder::patch(format!("/documents/{}", document_id))
            .field("groundTruth", ground_truth);
        self.execute(request).await
    }

    /// Delete one page of documents matching `filter`
    ///
    /// The response carries a `nextToken` while more documents remain.
    pub async fn delete_documents(&self, filter: &DocumentFilter, page: &Page) -> Result<Value> {
        let request = page.apply(filter.apply(RequestBuilder::delete("/documents")));
        self.execute(request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::endpoints::testing::{client, pairs, RecordingTransport};
    use reqwest::Method;
    use serde_json::json;

    #[tokio::test]
    async fn test_create_document_body() {
        let transport = RecordingTransport::scripted(vec![]);
        let params = CreateDocument::new(b"img".to_vec(), "image/jpeg")
            .consent_id("c1")
            .batch_id("")
            .ground_truth(json!([{"label": "total", "value": "42"}]));

        client(transport.clone()).create_document(params).await.unwrap();

        let sent = transport.last();
        assert_eq!(sent.method, Method::POST);
        assert_eq!(sent.path, "/v1/documents");
        assert_eq!(
            sent.body.unwrap(),
            json!({
                "content": "aW1n",
                "contentType": "image/jpeg",
                "consentId": "c1",
                "groundTruth": [{"label": "total", "value": "42"}]
            })
        );
    }

    #[tokio::test]
    async fn test_list_documents_filters() {
        let transport = RecordingTransport::scripted(vec![]);
        let filter = DocumentFilter {
            batch_id: Some("b1".to_string()),
            consent_id: Some(String::new()),
        };

        client(transport.clone())
            .list_documents(&filter, &Page::first(10))
            .await
            .unwrap();

        assert_eq!(
            transport.last().query,
            pairs(&[("batchId", "b1"), ("maxResults", "10")])
        );
    }

    #[tokio::test]
    async fn test_delete_documents_has_no_body() {
        let transport = RecordingTransport::scripted(vec![]);
        client(transport.clone())
            .delete_documents(&DocumentFilter::batch("b1"), &Page::default())
            .await
            .unwrap();

        let sent = transport.last();
        assert_eq!(sent.method, Method::DELETE);
        assert_eq!(sent.path, "/v1/documents");
        assert!(sent.body.is_none());
        assert_eq!(sent.query, pairs(&[("batchId", "b1")]));
    }
}
