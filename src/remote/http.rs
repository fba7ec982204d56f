//! HTTP transport for the remote execution endpoint
//!
//! Posts `{tool, command, parameters}` as JSON to `<server_url>/execute`.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;

use crate::error::{Result, ToolregError};

use super::transport::{ExecuteTransport, TransportError};
use super::types::ExecuteRequest;

/// Path appended to the server URL
const EXECUTE_PATH: &str = "/execute";

/// Longest error body echoed back in a failure message
const MAX_ERROR_BODY: usize = 512;

/// reqwest-backed `ExecuteTransport`
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    execute_url: String,
}

impl HttpTransport {
    /// Create a transport for the endpoint at `server_url`
    pub fn new(server_url: impl AsRef<str>) -> Result<Self> {
        let client = Client::builder()
            .build()
            .map_err(|e| ToolregError::Transport(format!("Failed to create HTTP client: {}", e)))?;
        Ok(Self::with_client(client, server_url))
    }

    /// Create a transport around an existing client
    pub fn with_client(client: Client, server_url: impl AsRef<str>) -> Self {
        let base = server_url.as_ref().trim_end_matches('/');
        Self {
            client,
            execute_url: format!("{}{}", base, EXECUTE_PATH),
        }
    }

    /// Full URL requests are posted to
    pub fn execute_url(&self) -> &str {
        &self.execute_url
    }
}

#[async_trait]
impl ExecuteTransport for HttpTransport {
    async fn execute(&self, request: &ExecuteRequest, timeout: Duration) -> std::result::Result<Value, TransportError> {
        log::debug!("POST {} ({}.{})", self.execute_url, request.tool, request.command);

        let response = self
            .client
            .post(&self.execute_url)
            .timeout(timeout)
            .json(request)
            .send()
            .await
            .map_err(|e| classify(e, timeout))?;

        let status = response.status();
        if !status.is_success() {
            let mut body = response.text().await.unwrap_or_default();
            if body.len() > MAX_ERROR_BODY {
                let mut cut = MAX_ERROR_BODY;
                while !body.is_char_boundary(cut) {
                    cut -= 1;
                }
                body.truncate(cut);
                body.push_str("...");
            }
            return Err(TransportError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let bytes = response.bytes().await.map_err(|e| classify(e, timeout))?;
        serde_json::from_slice(&bytes).map_err(|e| TransportError::InvalidBody(e.to_string()))
    }
}

fn classify(err: reqwest::Error, timeout: Duration) -> TransportError {
    if err.is_timeout() {
        TransportError::Timeout(timeout)
    } else {
        TransportError::Network(err.to_string())
    }
}
