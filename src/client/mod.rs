use async_trait::async_trait;
use reqwest::Method;
use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;

use crate::error::{ProviderError, protocol_error};

pub mod http;

pub use http::HttpTransport;

/// Authenticated request/response capability against the remote API.
///
/// `path` is relative to the configured API root (for example
/// `/projects/1/experiments`). A success response with an empty body yields
/// `Value::Null`.
#[async_trait]
pub trait ApiTransport: Send + Sync {
    async fn call(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> Result<Value, ProviderError>;
}

pub async fn call_json<B, R>(
    transport: &dyn ApiTransport,
    method: Method,
    path: &str,
    body: Option<&B>,
) -> Result<R, ProviderError>
where
    B: Serialize + ?Sized,
    R: DeserializeOwned,
{
    let body = body
        .map(serde_json::to_value)
        .transpose()
        .map_err(|err| protocol_error(format!("failed to encode request body: {err}")))?;

    let response = transport.call(method, path, body).await?;
    serde_json::from_value(response)
        .map_err(|err| protocol_error(format!("failed to decode response from {path}: {err}")))
}
