//! Request assembly for API endpoints
//!
//! Endpoint methods describe a call as method, path, body and query; the
//! builder turns that into a [`PreparedRequest`] with an encoded body. Auth
//! headers are not part of a prepared request, they are produced per attempt.

use crate::serializer::Serializer;
use crate::{Error, Result};
use reqwest::{Method, Url};
use serde_json::{Map, Value};
use std::fmt::Display;

/// Builder for a single API call
#[derive(Debug, Clone)]
pub struct RequestBuilder {
    method: Method,
    path: String,
    body: Option<Value>,
    query: Vec<(String, String)>,
}

impl RequestBuilder {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            body: None,
            query: Vec::new(),
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn patch(path: impl Into<String>) -> Self {
        Self::new(Method::PATCH, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    /// Replace the request body
    pub fn body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Set one field of an object body
    ///
    /// Has no effect when the body was set to a non-object value.
    pub fn field(mut self, key: &str, value: impl Into<Value>) -> Self {
        if let Value::Object(map) = self.body.get_or_insert_with(|| Value::Object(Map::new())) {
            map.insert(key.to_string(), value.into());
        }
        self
    }

    /// Set a field only when a value is given
    pub fn field_opt<V: Into<Value>>(self, key: &str, value: Option<V>) -> Self {
        match value {
            Some(value) => self.field(key, value),
            None => self,
        }
    }

    /// Merge extra attributes into an object body; explicit fields win
    pub fn attributes(mut self, attributes: Option<Map<String, Value>>) -> Self {
        let Some(attributes) = attributes else {
            return self;
        };
        for (key, value) in attributes {
            if let Value::Object(map) =
                self.body.get_or_insert_with(|| Value::Object(Map::new()))
            {
                map.entry(key).or_insert(value);
            }
        }
        self
    }

    /// Add a query parameter
    pub fn query(mut self, key: &str, value: impl Display) -> Self {
        self.query.push((key.to_string(), value.to_string()));
        self
    }

    /// Add a query parameter only when a value is given
    pub fn query_opt<V: Display>(self, key: &str, value: Option<V>) -> Self {
        match value {
            Some(value) => self.query(key, value),
            None => self,
        }
    }

    /// Add one query entry per value under the same key
    pub fn query_list<V: Display>(mut self, key: &str, values: &[V]) -> Self {
        for value in values {
            self.query.push((key.to_string(), value.to_string()));
        }
        self
    }

    /// Encode the body and freeze the request
    ///
    /// GET and DELETE never carry a body. Other methods send `{}` when no
    /// body was given.
    pub fn build(self, serializer: &dyn Serializer) -> Result<PreparedRequest> {
        let body = if self.method == Method::GET || self.method == Method::DELETE {
            Vec::new()
        } else {
            let value = self.body.unwrap_or_else(|| Value::Object(Map::new()));
            serializer.encode(&value)?
        };

        Ok(PreparedRequest {
            method: self.method,
            path: self.path,
            body,
            query: self.query,
        })
    }
}

/// A request ready to be signed and sent
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedRequest {
    pub method: Method,
    /// Path relative to the API endpoint, starting with `/`
    pub path: String,
    pub body: Vec<u8>,
    /// Query entries in insertion order; keys may repeat
    pub query: Vec<(String, String)>,
}

impl PreparedRequest {
    /// Absolute URL under `api_endpoint`
    pub fn url(&self, api_endpoint: &str) -> Result<Url> {
        let joined = format!(
            "{}/{}",
            api_endpoint.trim_end_matches('/'),
            self.path.trim_start_matches('/')
        );
        let mut url = Url::parse(&joined).map_err(|e| Error::Configuration {
            message: format!("Invalid request URL: {}", joined),
            source: Some(e.into()),
        })?;

        if !self.query.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in &self.query {
                pairs.append_pair(key, value);
            }
        }
        Ok(url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::serializer::JsonSerializer;
    use serde_json::json;

    #[test]
    fn test_get_has_no_body() {
        let request = RequestBuilder::get("/assets")
            .query("maxResults", 3)
            .query("nextToken", "foo")
            .build(&JsonSerializer)
            .unwrap();

        assert_eq!(request.method, Method::GET);
        assert!(request.body.is_empty());
        assert_eq!(
            request.query,
            vec![
                ("maxResults".to_string(), "3".to_string()),
                ("nextToken".to_string(), "foo".to_string())
            ]
        );
    }

    #[test]
    fn test_post_defaults_to_empty_object() {
        let request = RequestBuilder::post("/transitions/t1/executions/e1/heartbeats")
            .build(&JsonSerializer)
            .unwrap();
        assert_eq!(request.body, b"{}");
    }

    #[test]
    fn test_fields_and_attributes() {
        let mut attributes = Map::new();
        attributes.insert("name".to_string(), json!("ignored"));
        attributes.insert("description".to_string(), json!("extra"));

        let request = RequestBuilder::patch("/assets/a1")
            .field("name", "kept")
            .field_opt::<String>("content", None)
            .attributes(Some(attributes))
            .build(&JsonSerializer)
            .unwrap();

        let body: Value = serde_json::from_slice(&request.body).unwrap();
        assert_eq!(body, json!({"name": "kept", "description": "extra"}));
    }

    #[test]
    fn test_query_list_repeats_key() {
        let request = RequestBuilder::get("/predictions")
            .query_list("modelId", &["m1", "m2"])
            .query_opt::<u32>("maxResults", None)
            .build(&JsonSerializer)
            .unwrap();

        let url = request.url("https://api.lucidtech.ai/v1").unwrap();
        assert_eq!(
            url.as_str(),
            "https://api.lucidtech.ai/v1/predictions?modelId=m1&modelId=m2"
        );
    }

    #[test]
    fn test_url_keeps_stage_prefix() {
        let request = RequestBuilder::delete("/documents/d1")
            .build(&JsonSerializer)
            .unwrap();
        let url = request.url("https://api.lucidtech.ai/v1/").unwrap();
        assert_eq!(url.path(), "/v1/documents/d1");
        assert!(url.query().is_none());
    }

    #[test]
    fn test_invalid_endpoint() {
        let request = RequestBuilder::get("/x").build(&JsonSerializer).unwrap();
        assert!(matches!(
            request.url("not a url"),
            Err(Error::Configuration { .. })
        ));
    }
}
