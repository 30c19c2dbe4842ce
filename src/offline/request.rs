//! Request descriptors for the fetch-intercept boundary.

use std::fmt;

use serde::{Deserialize, Serialize};
use url::Url;

/// HTTP method of an intercepted request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RequestMethod {
  Get,
  Head,
  Options,
  Post,
  Put,
  Patch,
  Delete,
}

impl RequestMethod {
  /// Whether the method is safe (no side effects on the origin).
  ///
  /// Only safe requests are observed by the offline controller; everything
  /// else passes straight through to the network.
  pub fn is_read_only(&self) -> bool {
    matches!(self, Self::Get | Self::Head | Self::Options)
  }

  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Get => "GET",
      Self::Head => "HEAD",
      Self::Options => "OPTIONS",
      Self::Post => "POST",
      Self::Put => "PUT",
      Self::Patch => "PATCH",
      Self::Delete => "DELETE",
    }
  }
}

impl fmt::Display for RequestMethod {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

/// How the request was issued by the application shell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RequestMode {
  /// Top-level page load.
  Navigate,
  /// Everything else (subresources, programmatic fetches).
  #[default]
  NoNavigate,
}

/// A request as seen at the fetch-intercept boundary: method, absolute URL
/// and navigation-mode flag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
  pub method: RequestMethod,
  pub url: Url,
  pub mode: RequestMode,
}

impl FetchRequest {
  pub fn new(method: RequestMethod, url: Url, mode: RequestMode) -> Self {
    Self { method, url, mode }
  }

  /// A plain GET subresource request.
  pub fn get(url: Url) -> Self {
    Self::new(RequestMethod::Get, url, RequestMode::NoNavigate)
  }

  /// A top-level navigation request.
  pub fn navigate(url: Url) -> Self {
    Self::new(RequestMethod::Get, url, RequestMode::Navigate)
  }

  pub fn is_navigation(&self) -> bool {
    self.mode == RequestMode::Navigate
  }

  /// Normalized request identity used as the cache-entry key.
  ///
  /// Method plus serialized URL; two requests with the same identity share
  /// one cache entry regardless of mode.
  pub fn cache_key(&self) -> String {
    format!("{} {}", self.method, self.url)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn url(s: &str) -> Url {
    Url::parse(s).expect("test url")
  }

  #[test]
  fn test_read_only_methods() {
    assert!(RequestMethod::Get.is_read_only());
    assert!(RequestMethod::Head.is_read_only());
    assert!(!RequestMethod::Post.is_read_only());
    assert!(!RequestMethod::Delete.is_read_only());
  }

  #[test]
  fn test_cache_key_includes_method_and_url() {
    let req = FetchRequest::get(url("https://fridge.example.com/icons/icon-192x192.png"));
    assert_eq!(
      req.cache_key(),
      "GET https://fridge.example.com/icons/icon-192x192.png"
    );
  }

  #[test]
  fn test_cache_key_ignores_mode() {
    let a = FetchRequest::get(url("https://fridge.example.com/"));
    let b = FetchRequest::navigate(url("https://fridge.example.com/"));
    assert_eq!(a.cache_key(), b.cache_key());
  }
}
