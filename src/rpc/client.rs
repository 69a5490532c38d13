use std::time::Duration;

use reqwest::{Client, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use super::dto::{JsonRpcRequest, JsonRpcResponse};

/// JSON-RPC 2.0 client over HTTP shared by the node and signer clients.
#[derive(Clone, Debug)]
pub struct JsonRpcClient {
    inner: Client,
    url: Url,
    auth_token: Option<String>,
}

impl JsonRpcClient {
    /// Parses `endpoint` and builds a client whose requests time out after
    /// `timeout`.
    pub fn from_endpoint(
        endpoint: &str,
        auth_token: Option<String>,
        timeout: Duration,
    ) -> Result<Self, RpcClientError> {
        let url =
            Url::parse(endpoint).map_err(|err| RpcClientError::InvalidEndpoint(err.to_string()))?;
        Self::from_url(url, auth_token, timeout)
    }

    /// Builds a client for an already parsed URL. `auth_token` is sent as a
    /// bearer token on every request.
    pub fn from_url(
        url: Url,
        auth_token: Option<String>,
        timeout: Duration,
    ) -> Result<Self, RpcClientError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            inner: client,
            url,
            auth_token,
        })
    }

    /// Endpoint all requests are posted to.
    pub fn endpoint(&self) -> &Url {
        &self.url
    }

    /// Issues a raw call returning the untyped `result` payload.
    pub async fn request<P: Serialize>(
        &self,
        method: &str,
        params: Option<P>,
    ) -> Result<Value, RpcClientError> {
        let payload = JsonRpcRequest::new(
            method,
            params
                .map(serde_json::to_value)
                .transpose()
                .map_err(RpcClientError::from)?,
        );
        debug!(endpoint = %self.url, method, "json-rpc request");

        let mut request = self.inner.post(self.url.clone()).json(&payload);
        if let Some(token) = &self.auth_token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        if !response.status().is_success() {
            return Err(RpcClientError::HttpStatus(response.status()));
        }

        let response: JsonRpcResponse = response.json().await?;
        if let Some(error) = response.error {
            return Err(RpcClientError::Rpc {
                code: error.code,
                message: error.message,
                data: error.data,
            });
        }

        response.result.ok_or(RpcClientError::EmptyResponse)
    }

    /// Issues a call and decodes the `result` payload into `R`.
    pub async fn call<P, R>(&self, method: &str, params: Option<P>) -> Result<R, RpcClientError>
    where
        P: Serialize,
        R: DeserializeOwned,
    {
        let value = self.request(method, params).await?;
        Ok(serde_json::from_value(value)?)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RpcClientError {
    #[error("invalid RPC endpoint: {0}")]
    InvalidEndpoint(String),
    #[error("RPC JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("RPC transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("RPC transport error: HTTP status {0}")]
    HttpStatus(StatusCode),
    #[error("RPC returned an empty response")]
    EmptyResponse,
    #[error("RPC error [{code}]: {message}")]
    Rpc {
        code: i32,
        message: String,
        data: Option<Value>,
    },
}

impl RpcClientError {
    /// True when nothing is listening at the endpoint.
    pub fn is_unreachable(&self) -> bool {
        matches!(self, RpcClientError::Transport(err) if err.is_connect())
    }
}
