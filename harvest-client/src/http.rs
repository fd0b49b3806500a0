//! HTTP client for the marketplace REST API

use std::time::Duration;

use reqwest::{Client, Method, RequestBuilder, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::session::SessionContext;
use crate::{ClientConfig, ClientError, ClientResult};

/// HTTP client carrying the session's bearer token
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
    base_url: String,
    session: SessionContext,
}

impl HttpClient {
    /// Create a new HTTP client from configuration
    pub fn new(config: &ClientConfig, session: SessionContext) -> ClientResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout))
            .build()
            .map_err(|e| ClientError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            session,
        })
    }

    pub fn session(&self) -> &SessionContext {
        &self.session
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Request builder with the session token attached
    pub(crate) fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let builder = self.client.request(method, self.url(path));
        match self.session.token() {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    /// Request builder with an explicit token (used before a session exists)
    pub(crate) fn request_with_token(&self, method: Method, path: &str, token: &str) -> RequestBuilder {
        self.client.request(method, self.url(path)).bearer_auth(token)
    }

    /// Make a GET request
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> ClientResult<T> {
        self.execute(self.request(Method::GET, path)).await
    }

    /// Make a GET request with URL query parameters
    pub async fn get_query<T: DeserializeOwned, Q: Serialize + ?Sized>(
        &self,
        path: &str,
        query: &Q,
    ) -> ClientResult<T> {
        self.execute(self.request(Method::GET, path).query(query)).await
    }

    /// Make a POST request with JSON body
    pub async fn post<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> ClientResult<T> {
        self.execute(self.request(Method::POST, path).json(body)).await
    }

    /// Make a POST request without body
    pub async fn post_empty<T: DeserializeOwned>(&self, path: &str) -> ClientResult<T> {
        self.execute(self.request(Method::POST, path)).await
    }

    /// Make a PUT request with JSON body
    pub async fn put<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> ClientResult<T> {
        self.execute(self.request(Method::PUT, path).json(body)).await
    }

    /// Make a PUT request without body
    pub async fn put_empty<T: DeserializeOwned>(&self, path: &str) -> ClientResult<T> {
        self.execute(self.request(Method::PUT, path)).await
    }

    /// Make a DELETE request
    pub async fn delete<T: DeserializeOwned>(&self, path: &str) -> ClientResult<T> {
        self.execute(self.request(Method::DELETE, path)).await
    }

    /// Send a prepared request and decode the JSON body
    pub(crate) async fn execute<T: DeserializeOwned>(&self, request: RequestBuilder) -> ClientResult<T> {
        let response = request.send().await?;
        tracing::debug!(
            url = %response.url(),
            status = response.status().as_u16(),
            "HTTP response"
        );
        self.handle_response(response).await
    }

    /// Handle the HTTP response
    async fn handle_response<T: DeserializeOwned>(&self, response: reqwest::Response) -> ClientResult<T> {
        let status = response.status();

        if !status.is_success() {
            let text = response.text().await?;
            let detail = error_detail(&text);
            return match status {
                StatusCode::UNAUTHORIZED => {
                    tracing::warn!("Request rejected as unauthenticated, clearing session");
                    self.session.clear();
                    Err(ClientError::Unauthorized)
                }
                StatusCode::FORBIDDEN => Err(ClientError::Forbidden(detail)),
                StatusCode::NOT_FOUND => Err(ClientError::NotFound(detail)),
                StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => {
                    Err(ClientError::Validation(detail))
                }
                _ => Err(ClientError::Internal(detail)),
            };
        }

        let bytes = response.bytes().await?;
        serde_json::from_slice(&bytes).map_err(|e| {
            ClientError::InvalidResponse(format!("Unexpected response body: {}", e))
        })
    }
}

/// Human-readable message from an error body
///
/// The service answers `{"detail": "..."}`; request validation failures carry
/// a list of `{ "msg": ... }` objects instead.
fn error_detail(body: &str) -> String {
    let Ok(value) = serde_json::from_str::<Value>(body) else {
        return body.to_string();
    };
    match value.get("detail") {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| {
                item.get("msg")
                    .and_then(Value::as_str)
                    .map(str::to_string)
                    .unwrap_or_else(|| item.to_string())
            })
            .collect::<Vec<_>>()
            .join("; "),
        Some(other) => other.to_string(),
        None => body.to_string(),
    }
}
