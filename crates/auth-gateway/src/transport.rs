//! Transport seam between the gateway and the network.

use crate::{ApiRequest, ApiResponse, AuthResult};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::debug;

/// Sends one request and returns whatever response came back.
///
/// Implementations return `Ok` for every HTTP status; only a failure to get
/// a response at all is an `Err`. Status handling belongs to the gateway.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn dispatch(&self, request: ApiRequest) -> AuthResult<ApiResponse>;
}

/// `reqwest`-backed transport.
#[derive(Clone)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    /// Create a transport whose requests time out after `timeout`.
    pub fn new(timeout: Duration) -> AuthResult<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn dispatch(&self, request: ApiRequest) -> AuthResult<ApiResponse> {
        debug!(method = %request.method, url = %request.url, "Dispatching request");

        let mut builder = self
            .client
            .request(request.method, &request.url)
            .headers(request.headers);
        if let Some(body) = request.body.as_ref() {
            builder = builder.json(body);
        }

        let response = builder.send().await?;
        let status = response.status();
        let headers = response.headers().clone();
        let body = response.bytes().await?.to_vec();

        debug!(status = %status, bytes = body.len(), "Response received");

        Ok(ApiResponse {
            status,
            headers,
            body,
        })
    }
}
