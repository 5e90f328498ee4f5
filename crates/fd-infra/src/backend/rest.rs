//! REST adapter for the hosted backend.
//!
//! Speaks the PostgREST dialect exposed by the hosted platform:
//!
//! - tables: `/rest/v1/<table>?<column>=<op>.<value>`
//! - procedures: `POST /rest/v1/rpc/<name>`
//! - serverless functions: `POST /functions/v1/<name>`
//!
//! Every request carries the project API key; the bearer token is the signed
//! in user's access token when one is set, the API key otherwise. Failed
//! calls are returned as-is, there are no retries.

use std::sync::RwLock;

use async_trait::async_trait;
use fd_core::ports::{BackendError, BackendPort, Filter};
use reqwest::{Client, Method, RequestBuilder};
use serde_json::Value;
use tracing::debug;

pub struct RestBackend {
    client: Client,
    base_url: String,
    api_key: String,
    access_token: RwLock<Option<String>>,
}

impl RestBackend {
    pub fn new(base_url: &str, api_key: &str) -> Result<Self, BackendError> {
        let base_url = base_url.trim().trim_end_matches('/');
        if base_url.is_empty() {
            return Err(BackendError::NotConfigured(
                "backend url is empty".to_string(),
            ));
        }
        let client = Client::builder()
            .build()
            .map_err(|e| BackendError::Transport(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.to_string(),
            api_key: api_key.to_string(),
            access_token: RwLock::new(None),
        })
    }

    /// Set or clear the signed in user's access token.
    pub fn set_access_token(&self, token: Option<String>) {
        *self.access_token.write().unwrap_or_else(|e| e.into_inner()) = token;
    }

    fn bearer(&self) -> String {
        self.access_token
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
            .unwrap_or_else(|| self.api_key.clone())
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.client
            .request(method, format!("{}{}", self.base_url, path))
            .header("apikey", &self.api_key)
            .bearer_auth(self.bearer())
    }

    fn filter_query(filters: &[Filter]) -> Vec<(String, String)> {
        filters
            .iter()
            .map(|f| (f.column.clone(), format!("{}.{}", f.op.as_str(), f.value)))
            .collect()
    }

    async fn send(&self, request: RequestBuilder) -> Result<Value, BackendError> {
        let response = request
            .send()
            .await
            .map_err(|e| BackendError::Transport(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| BackendError::Transport(e.to_string()))?;

        if !status.is_success() {
            return Err(BackendError::Status {
                code: status.as_u16(),
                body,
            });
        }

        if body.trim().is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_str(&body).map_err(|e| BackendError::Decode(e.to_string()))
    }

    fn into_rows(value: Value) -> Result<Vec<Value>, BackendError> {
        match value {
            Value::Array(rows) => Ok(rows),
            Value::Null => Ok(Vec::new()),
            Value::Object(_) => Ok(vec![value]),
            other => Err(BackendError::Decode(format!(
                "expected rows, got {other}"
            ))),
        }
    }
}

#[async_trait]
impl BackendPort for RestBackend {
    async fn select(&self, table: &str, filters: &[Filter]) -> Result<Vec<Value>, BackendError> {
        debug!(table, filters = filters.len(), "backend select");
        let request = self
            .request(Method::GET, &format!("/rest/v1/{table}"))
            .query(&[("select", "*")])
            .query(&Self::filter_query(filters));
        Self::into_rows(self.send(request).await?)
    }

    async fn insert(&self, table: &str, rows: Value) -> Result<Vec<Value>, BackendError> {
        debug!(table, "backend insert");
        let request = self
            .request(Method::POST, &format!("/rest/v1/{table}"))
            .header("Prefer", "return=representation")
            .json(&rows);
        Self::into_rows(self.send(request).await?)
    }

    async fn update(
        &self,
        table: &str,
        filters: &[Filter],
        patch: Value,
    ) -> Result<Vec<Value>, BackendError> {
        debug!(table, filters = filters.len(), "backend update");
        let request = self
            .request(Method::PATCH, &format!("/rest/v1/{table}"))
            .query(&Self::filter_query(filters))
            .header("Prefer", "return=representation")
            .json(&patch);
        Self::into_rows(self.send(request).await?)
    }

    async fn delete(&self, table: &str, filters: &[Filter]) -> Result<(), BackendError> {
        debug!(table, filters = filters.len(), "backend delete");
        let request = self
            .request(Method::DELETE, &format!("/rest/v1/{table}"))
            .query(&Self::filter_query(filters));
        self.send(request).await.map(|_| ())
    }

    async fn rpc(&self, name: &str, args: Value) -> Result<Value, BackendError> {
        debug!(name, "backend rpc");
        let request = self
            .request(Method::POST, &format!("/rest/v1/rpc/{name}"))
            .json(&args);
        self.send(request).await
    }

    async fn invoke(&self, function: &str, payload: Value) -> Result<Value, BackendError> {
        debug!(function, "backend function invoke");
        let request = self
            .request(Method::POST, &format!("/functions/v1/{function}"))
            .json(&payload);
        self.send(request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fd_core::ports::FilterOp;
    use mockito::Matcher;
    use serde_json::json;

    #[test]
    fn empty_url_is_not_configured() {
        assert!(matches!(
            RestBackend::new("  ", "key"),
            Err(BackendError::NotConfigured(_))
        ));
    }

    #[tokio::test]
    async fn select_sends_filters_and_api_key() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/rest/v1/alerts")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("select".into(), "*".into()),
                Matcher::UrlEncoded("client_id".into(), "eq.7".into()),
                Matcher::UrlEncoded("priority".into(), "neq.baixa".into()),
            ]))
            .match_header("apikey", "anon")
            .match_header("authorization", "Bearer anon")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"[{"id":"1"},{"id":"2"}]"#)
            .create_async()
            .await;

        let backend = RestBackend::new(&format!("{}/", server.url()), "anon").unwrap();
        let rows = backend
            .select(
                "alerts",
                &[
                    Filter::eq("client_id", "7"),
                    Filter::new("priority", FilterOp::Neq, "baixa"),
                ],
            )
            .await
            .unwrap();

        assert_eq!(rows.len(), 2);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn access_token_replaces_api_key_as_bearer() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/rest/v1/rpc/check_payment_alerts")
            .match_header("apikey", "anon")
            .match_header("authorization", "Bearer user-jwt")
            .match_body(Matcher::Json(json!({ "client_id": "7" })))
            .with_status(200)
            .with_body("[]")
            .create_async()
            .await;

        let backend = RestBackend::new(&server.url(), "anon").unwrap();
        backend.set_access_token(Some("user-jwt".to_string()));
        let value = backend
            .rpc("check_payment_alerts", json!({ "client_id": "7" }))
            .await
            .unwrap();

        assert_eq!(value, json!([]));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn error_status_is_returned_with_body() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/functions/v1/classify-document")
            .with_status(500)
            .with_body("boom")
            .create_async()
            .await;

        let backend = RestBackend::new(&server.url(), "anon").unwrap();
        let err = backend
            .invoke("classify-document", json!({ "document_id": "d1" }))
            .await
            .unwrap_err();

        match err {
            BackendError::Status { code, body } => {
                assert_eq!(code, 500);
                assert_eq!(body, "boom");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn insert_wraps_single_object_response() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/rest/v1/invitations")
            .match_header("prefer", "return=representation")
            .with_status(201)
            .with_body(r#"{"id":"inv-1"}"#)
            .create_async()
            .await;

        let backend = RestBackend::new(&server.url(), "anon").unwrap();
        let rows = backend
            .insert("invitations", json!({ "email": "ana@example.com" }))
            .await
            .unwrap();
        assert_eq!(rows, vec![json!({ "id": "inv-1" })]);
    }

    #[tokio::test]
    async fn delete_accepts_empty_body() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("DELETE", "/rest/v1/alerts")
            .match_query(Matcher::UrlEncoded("id".into(), "eq.a-1".into()))
            .with_status(204)
            .create_async()
            .await;

        let backend = RestBackend::new(&server.url(), "anon").unwrap();
        backend
            .delete("alerts", &[Filter::eq("id", "a-1")])
            .await
            .unwrap();
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn invalid_json_is_a_decode_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/rest/v1/alerts")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body("<html>")
            .create_async()
            .await;

        let backend = RestBackend::new(&server.url(), "anon").unwrap();
        assert!(matches!(
            backend.select("alerts", &[]).await,
            Err(BackendError::Decode(_))
        ));
    }
}
