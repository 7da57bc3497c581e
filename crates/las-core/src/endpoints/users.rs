use super::{Attributes, Page};
use crate::http::RequestBuilder;
use crate::{Client, Result};
use serde_json::Value;

impl Client {
    pub async fn create_user(&self, email: &str, attributes: Option<Attributes>) -> Result<Value> {
        let request = RequestBuilder::post("/users")
            .field("email", email)
            .attributes(attributes);
        self.execute(request).await
    }

    pub async fn list_users(&self, page: &Page) -> Result<Value> {
        self.execute(page.apply(RequestBuilder::get("/users"))).await
    }

    pub async fn get_user(&self, user_id: &str) -> Result<Value> {
        self.execute(RequestBuilder::get(format!("/users/{}", user_id)))
            .await
    }

    pub async fn update_user(&self, user_id: &str, attributes: Attributes) -> Result<Value> {
        let request =
            RequestBuilder::patch(format!("/users/{}", user_id)).attributes(Some(attributes));
        self.execute(request).await
    }

    pub async fn delete_user(&self, user_id: &str) -> Result<Value> {
        self.execute(RequestBuilder::delete(format!("/users/{}", user_id)))
            .await
    }
}
