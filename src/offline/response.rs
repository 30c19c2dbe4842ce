//! Stored response representation.

use color_eyre::{eyre::eyre, Result};
use serde::{Deserialize, Serialize};

/// A response as held in the cache and returned to intercepted callers.
///
/// Unlike a live network response, whose body can be read once, this is a
/// plain value with an owned body. Storing a response always stores a
/// `clone()`, so the live consumer and the cache each get an independent
/// copy instead of fighting over a drained stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachedResponse {
  pub status: u16,
  pub headers: Vec<(String, String)>,
  pub body: Vec<u8>,
}

impl CachedResponse {
  pub fn new(status: u16, headers: Vec<(String, String)>, body: Vec<u8>) -> Self {
    Self {
      status,
      headers,
      body,
    }
  }

  /// Drain a live `reqwest` response into an owned value.
  pub async fn from_http(response: reqwest::Response) -> Result<Self> {
    let status = response.status().as_u16();
    let headers = response
      .headers()
      .iter()
      .filter_map(|(name, value)| {
        value
          .to_str()
          .ok()
          .map(|v| (name.as_str().to_string(), v.to_string()))
      })
      .collect();
    let body = response
      .bytes()
      .await
      .map_err(|e| eyre!("Failed to read response body: {}", e))?
      .to_vec();

    Ok(Self {
      status,
      headers,
      body,
    })
  }

  /// First header value with the given name, compared case-insensitively.
  pub fn header(&self, name: &str) -> Option<&str> {
    self
      .headers
      .iter()
      .find(|(n, _)| n.eq_ignore_ascii_case(name))
      .map(|(_, v)| v.as_str())
  }

  pub fn body_text(&self) -> String {
    String::from_utf8_lossy(&self.body).into_owned()
  }
}
