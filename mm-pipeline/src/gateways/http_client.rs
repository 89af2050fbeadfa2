//! Shared HTTP plumbing for the hosted gateway functions
//!
//! Every gateway is a JSON POST to `<base_url>/<function>` that answers with
//! either a payload or `{ "error": "..." }`. Status and transport failures
//! are mapped to [`GatewayError`] here so the adapters only deal with
//! payload shapes.

use std::time::Duration;

use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use super::{GatewayError, GatewayResult};

const USER_AGENT: &str = concat!("mathmentor/", env!("CARGO_PKG_VERSION"));

/// Connection settings shared by all gateway adapters
#[derive(Clone)]
pub struct GatewayHttp {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl GatewayHttp {
    pub fn new(base_url: impl Into<String>, api_key: Option<String>, timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn endpoint(&self, function: &str) -> String {
        format!("{}/{}", self.base_url, function)
    }

    /// POST `body` to a gateway function and decode the payload as `T`
    pub async fn invoke<B, T>(&self, function: &str, body: &B) -> GatewayResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let value = self.invoke_raw(function, body).await?;
        serde_json::from_value(value)
            .map_err(|e| GatewayError::MalformedResponse(format!("{}: {}", function, e)))
    }

    /// POST `body` and return the JSON payload, with failures normalized
    pub async fn invoke_raw<B>(&self, function: &str, body: &B) -> GatewayResult<Value>
    where
        B: Serialize + ?Sized,
    {
        let url = self.endpoint(function);
        tracing::debug!(function = function, url = %url, "Invoking gateway function");

        let mut request = self.client.post(&url).json(body);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key).header("apikey", key);
        }

        let response = request.send().await.map_err(map_transport_error)?;
        let status = response.status();

        match status {
            StatusCode::TOO_MANY_REQUESTS => return Err(GatewayError::RateLimited),
            StatusCode::PAYMENT_REQUIRED => return Err(GatewayError::QuotaExhausted),
            _ => {}
        }

        let text = response.text().await.map_err(map_transport_error)?;

        if !status.is_success() {
            return Err(GatewayError::Upstream {
                status: Some(status.as_u16()),
                message: error_message(&text).unwrap_or_default(),
            });
        }

        let value: Value = serde_json::from_str(&text)
            .map_err(|e| GatewayError::MalformedResponse(format!("{}: {}", function, e)))?;

        if let Some(message) = value.get("error").and_then(error_field) {
            return Err(GatewayError::Upstream {
                status: Some(status.as_u16()),
                message,
            });
        }

        Ok(value)
    }
}

fn map_transport_error(e: reqwest::Error) -> GatewayError {
    if e.is_decode() {
        GatewayError::MalformedResponse(e.to_string())
    } else {
        GatewayError::Unreachable(e.to_string())
    }
}

/// Error text from a non-2xx body (`{ "error": ... }` or plain text)
fn error_message(body: &str) -> Option<String> {
    match serde_json::from_str::<Value>(body) {
        Ok(value) => value.get("error").and_then(error_field),
        Err(_) => {
            let trimmed = body.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
    }
}

/// `error` may be a string or an object carrying `message`
fn error_field(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Object(map) => map
            .get("message")
            .and_then(Value::as_str)
            .map(str::to_string),
        Value::Null | Value::Bool(false) => None,
        Value::String(_) => None,
        other => Some(other.to_string()),
    }
}
