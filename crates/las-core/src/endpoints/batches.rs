use super::{DocumentFilter, Page};
use crate::http::RequestBuilder;
use crate::{Client, Result};
use serde_json::Value;
use std::collections::HashSet;
use tracing::warn;

/// Most document pages deleted before the batch itself
const MAX_DELETE_PAGES: usize = 1000;

impl Client {
    pub async fn create_batch(&self, name: Option<&str>, description: Option<&str>) -> Result<Value> {
        let request = RequestBuilder::post("/batches")
            .field_opt("name", name)
            .field_opt("description", description);
        self.execute(request).await
    }

    /// Delete a batch, optionally deleting all of its documents first
    pub async fn delete_batch(&self, batch_id: &str, delete_documents: bool) -> Result<Value> {
        if delete_documents {
            let filter = DocumentFilter::batch(batch_id);
            let mut page = Page::default();
            let mut seen = HashSet::new();
            for _ in 0..MAX_DELETE_PAGES {
                let response = self.delete_documents(&filter, &page).await?;
                let Some(token) = response.get("nextToken").and_then(Value::as_str) else {
                    break;
                };
                if !seen.insert(token.to_string()) {
                    warn!(batch_id, next_token = token, "Document pages repeat, stop paging");
                    break;
                }
                page.next_token = Some(token.to_string());
            }
        }

        self.execute(RequestBuilder::delete(format!("/batches/{}", batch_id)))
            .await
    }
}

#[cfg(test)]
mod tests {
    use crate::endpoints::testing::{client, pairs, RecordingTransport};
    use crate::http::RawResponse;
    use reqwest::Method;
    use serde_json::json;

    #[tokio::test]
    async fn test_create_batch() {
        let transport = RecordingTransport::scripted(vec![]);
        client(transport.clone())
            .create_batch(Some("invoices"), None)
            .await
            .unwrap();
        assert_eq!(transport.last().body.unwrap(), json!({"name": "invoices"}));
    }

    #[tokio::test]
    async fn test_delete_batch_pages_through_documents() {
        let transport = RecordingTransport::scripted(vec![
            RawResponse::new(200, r#"{"documents": [], "nextToken": "t1"}"#),
            RawResponse::new(200, r#"{"documents": [], "nextToken": null}"#),
            RawResponse::new(200, r#"{"batchId": "b1"}"#),
        ]);

        let value = client(transport.clone())
            .delete_batch("b1", true)
            .await
            .unwrap();
        assert_eq!(value["batchId"], "b1");

        let sent = transport.all();
        assert_eq!(sent.len(), 3);
        assert_eq!(sent[0].path, "/v1/documents");
        assert_eq!(sent[0].query, pairs(&[("batchId", "b1")]));
        assert_eq!(sent[1].query, pairs(&[("batchId", "b1"), ("nextToken", "t1")]));
        assert_eq!(sent[2].method, Method::DELETE);
        assert_eq!(sent[2].path, "/v1/batches/b1");
    }

    #[tokio::test]
    async fn test_delete_batch_stops_on_repeated_token() {
        let transport = RecordingTransport::scripted(vec![
            RawResponse::new(200, r#"{"documents": [], "nextToken": "t1"}"#),
            RawResponse::new(200, r#"{"documents": [], "nextToken": "t2"}"#),
            RawResponse::new(200, r#"{"documents": [], "nextToken": "t1"}"#),
            RawResponse::new(200, r#"{"batchId": "b1"}"#),
        ]);

        let value = client(transport.clone())
            .delete_batch("b1", true)
            .await
            .unwrap();
        assert_eq!(value["batchId"], "b1");

        let sent = transport.all();
        assert_eq!(sent.len(), 4);
        assert_eq!(sent[2].query, pairs(&[("batchId", "b1"), ("nextToken", "t2")]));
        assert_eq!(sent[3].method, Method::DELETE);
        assert_eq!(sent[3].path, "/v1/batches/b1");
    }

    #[tokio::test]
    async fn test_delete_batch_only() {
        let transport = RecordingTransport::scripted(vec![]);
        client(transport.clone()).delete_batch("b1", false).await.unwrap();
        assert_eq!(transport.all().len(), 1);
    }
}
