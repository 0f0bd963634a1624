use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Method, header};
use serde_json::Value;

use crate::{
    client::ApiTransport,
    error::{ProviderError, configuration_error, protocol_error, remote_error},
};

const API_PREFIX: &str = "/api";
const MAX_ERROR_BODY_CHARS: usize = 240;

/// Bearer-token transport over reqwest. Built once per provider and shared by
/// every resource instance.
#[derive(Clone)]
pub struct HttpTransport {
    client: Client,
    base_url: String,
    token: String,
}

impl HttpTransport {
    pub fn new(host: &str, token: impl Into<String>) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .pool_idle_timeout(Duration::from_secs(30))
            .build()
            .map_err(|err| configuration_error(format!("failed to build http client: {err}")))?;

        Ok(Self {
            client,
            base_url: normalize_base_url(host),
            token: token.into(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl ApiTransport for HttpTransport {
    async fn call(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> Result<Value, ProviderError> {
        let url = format!("{}{}", self.base_url, path);
        tracing::debug!(target: "client", method = %method, url = %url, "api_request");

        let mut req_builder = self
            .client
            .request(method.clone(), &url)
            .header(header::AUTHORIZATION, format!("Bearer {}", self.token))
            .header(header::ACCEPT, "application/json");

        if let Some(body) = body {
            req_builder = req_builder.json(&body);
        }

        let response = req_builder
            .send()
            .await
            .map_err(|err| remote_error(format!("{method} {path} request failed: {err}")))?;

        let status = response.status();
        let text = response.text().await.map_err(|err| {
            remote_error(format!("{method} {path} response could not be read: {err}"))
                .with_status(status.as_u16())
        })?;

        if !status.is_success() {
            tracing::warn!(
                target: "client",
                method = %method,
                url = %url,
                status = status.as_u16(),
                "api_request_failed"
            );
            return Err(map_http_error(status.as_u16(), &text));
        }

        if text.trim().is_empty() {
            return Ok(Value::Null);
        }

        serde_json::from_str(&text)
            .map_err(|err| protocol_error(format!("{method} {path} returned invalid json: {err}")))
    }
}

pub fn map_http_error(status: u16, body: &str) -> ProviderError {
    let normalized_body = body.trim().chars().take(MAX_ERROR_BODY_CHARS).collect::<String>();

    let message = if normalized_body.is_empty() {
        format!("status {status}")
    } else {
        format!("status {status}: {normalized_body}")
    };

    remote_error(message).with_status(status)
}

fn normalize_base_url(host: &str) -> String {
    let host = host.trim().trim_end_matches('/');
    if host.contains("://") {
        format!("{host}{API_PREFIX}")
    } else {
        format!("https://{host}{API_PREFIX}")
    }
}
