//! Network boundary for the offline controller.

use async_trait::async_trait;
use color_eyre::{eyre::eyre, Result};

use super::request::FetchRequest;
use super::response::CachedResponse;

/// The controller's view of the network.
///
/// Mirrors the host fetch primitive: only transport failure is an error.
/// Responses with error status codes resolve normally and are cached like
/// any other.
#[async_trait]
pub trait Fetcher: Send + Sync {
  async fn fetch(&self, request: &FetchRequest) -> Result<CachedResponse>;
}

/// Production fetcher backed by `reqwest`.
pub struct HttpFetcher {
  client: reqwest::Client,
}

impl HttpFetcher {
  pub fn new() -> Result<Self> {
    let client = reqwest::Client::builder()
      .user_agent(concat!("ecofridge/", env!("CARGO_PKG_VERSION")))
      .build()
      .map_err(|e| eyre!("Failed to build HTTP client: {}", e))?;

    Ok(Self { client })
  }
}

#[async_trait]
impl Fetcher for HttpFetcher {
  async fn fetch(&self, request: &FetchRequest) -> Result<CachedResponse> {
    let method = reqwest::Method::from_bytes(request.method.as_str().as_bytes())
      .map_err(|e| eyre!("Invalid method {}: {}", request.method, e))?;

    let response = self
      .client
      .request(method, request.url.clone())
      .send()
      .await
      .map_err(|e| eyre!("Network fetch failed for {}: {}", request.url, e))?;

    CachedResponse::from_http(response).await
  }
}
