//! The HTTP layer: one `reqwest::Client`, the backend base URL, and the
//! status-code rules every endpoint shares.
//!
//! Every request gets the same default headers (JSON content type and the
//! header that skips the ngrok browser warning page). There is no timeout
//! and no retry: a hung request stays pending until the backend answers.

use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderValue};
use reqwest::{Method, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use godfather_protocol::{LoginRequest, LoginResponse};

use crate::{ApiConfig, ApiError, AuthBackend};

/// Tunnelled deployments serve an HTML interstitial unless this is set.
const NGROK_SKIP_WARNING: &str = "ngrok-skip-browser-warning";

// ---------------------------------------------------------------------------
// ApiRequest
// ---------------------------------------------------------------------------

/// A request description, built by the endpoint methods and executed by
/// [`HttpClient::send`].
#[derive(Debug, Clone)]
pub(crate) struct ApiRequest {
    method: Method,
    path: String,
    query: Vec<(&'static str, String)>,
    body: Option<Value>,
}

impl ApiRequest {
    pub(crate) fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: None,
        }
    }

    pub(crate) fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub(crate) fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    pub(crate) fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    /// Adds a query parameter.
    pub(crate) fn query(mut self, key: &'static str, value: impl ToString) -> Self {
        self.query.push((key, value.to_string()));
        self
    }

    /// Adds a query parameter only when `value` is `Some`.
    pub(crate) fn query_opt<V: ToString>(self, key: &'static str, value: Option<V>) -> Self {
        match value {
            Some(v) => self.query(key, v),
            None => self,
        }
    }

    /// Sets a JSON body.
    pub(crate) fn json<B: Serialize>(mut self, body: &B) -> Result<Self, ApiError> {
        self.body = Some(serde_json::to_value(body).map_err(ApiError::Encode)?);
        Ok(self)
    }
}

// ---------------------------------------------------------------------------
// HttpClient
// ---------------------------------------------------------------------------

/// A thin wrapper around `reqwest::Client` bound to one backend.
///
/// Cloning is cheap: `reqwest::Client` is reference-counted inside, so the
/// session controller and [`GameApi`](crate::GameApi) share one connection
/// pool.
#[derive(Debug, Clone)]
pub struct HttpClient {
    base_url: String,
    inner: reqwest::Client,
}

impl HttpClient {
    /// Builds a client for the configured backend.
    ///
    /// # Errors
    /// Returns [`ApiError::InvalidUrl`] if the base URL doesn't parse, and
    /// [`ApiError::Transport`] if the TLS backend fails to initialise.
    pub fn new(config: &ApiConfig) -> Result<Self, ApiError> {
        reqwest::Url::parse(&config.base_url)
            .map_err(|_| ApiError::InvalidUrl(config.base_url.clone()))?;

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(NGROK_SKIP_WARNING, HeaderValue::from_static("true"));

        let inner = reqwest::Client::builder()
            .default_headers(headers)
            .build()
            .map_err(ApiError::Transport)?;

        Ok(Self {
            base_url: config.base_url.clone(),
            inner,
        })
    }

    /// The backend base URL this client talks to.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// `GET /auth/verify`: asks the backend whether a token is still valid.
    pub async fn verify_token(&self, token: &str) -> Result<Value, ApiError> {
        self.send(ApiRequest::get("/auth/verify").query("token", token), None)
            .await
    }

    /// Executes a request and decodes the JSON response.
    ///
    /// Status handling is the same for every endpoint:
    /// - `401` → [`ApiError::Unauthorized`] with the backend's `detail`
    /// - other non-2xx → [`ApiError::Status`] with the backend's `detail`
    /// - 2xx → the body decoded as `T` (an empty body decodes as `null`)
    pub(crate) async fn send<T: DeserializeOwned>(
        &self,
        request: ApiRequest,
        bearer: Option<&str>,
    ) -> Result<T, ApiError> {
        let raw = format!("{}{}", self.base_url, request.path);
        let url = reqwest::Url::parse(&raw).map_err(|_| ApiError::InvalidUrl(raw))?;

        let mut builder = self.inner.request(request.method.clone(), url);
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(token) = bearer {
            builder = builder.bearer_auth(token);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await.map_err(|e| {
            tracing::debug!(
                method = %request.method,
                path = %request.path,
                error = %e,
                "request failed before a response"
            );
            ApiError::Transport(e)
        })?;

        let status = response.status();
        tracing::debug!(
            method = %request.method,
            path = %request.path,
            status = status.as_u16(),
            authenticated = bearer.is_some(),
            "backend responded"
        );

        let body = response.bytes().await.map_err(ApiError::Transport)?;

        if status == StatusCode::UNAUTHORIZED {
            return Err(ApiError::Unauthorized {
                detail: extract_detail(&body),
            });
        }
        if !status.is_success() {
            return Err(ApiError::Status {
                status: status.as_u16(),
                detail: extract_detail(&body),
            });
        }

        decode_body(&body)
    }
}

impl AuthBackend for HttpClient {
    async fn login(&self, request: &LoginRequest) -> Result<LoginResponse, ApiError> {
        tracing::debug!(email = %request.email, role = %request.role, "calling login endpoint");
        self.send(ApiRequest::post("/auth/login").json(request)?, None)
            .await
    }
}

/// Pulls the `detail` field out of an error body.
///
/// Validation errors carry a structured `detail` (a list); those are kept
/// as their JSON text.
fn extract_detail(body: &[u8]) -> Option<String> {
    let value: Value = serde_json::from_slice(body).ok()?;
    match value.get("detail")? {
        Value::String(s) => Some(s.clone()),
        Value::Null => None,
        other => Some(other.to_string()),
    }
}

fn decode_body<T: DeserializeOwned>(body: &[u8]) -> Result<T, ApiError> {
    let body: &[u8] = if body.iter().all(u8::is_ascii_whitespace) {
        b"null"
    } else {
        body
    };
    serde_json::from_slice(body).map_err(ApiError::Decode)
}
