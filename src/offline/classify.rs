//! Request classification and the caching strategy each class maps to.
//!
//! Classification is a single total function evaluated once per request, so
//! the priority order stays auditable instead of being scattered across
//! handlers. Every request maps to exactly one class.

use super::request::FetchRequest;

/// Path prefix of API routes. These are never intercepted; the client-side
/// query layer owns their caching.
pub const API_PREFIX: &str = "/api/";

/// Path prefixes of build-output static assets.
pub const STATIC_PREFIXES: &[&str] = &["/_next/static/", "/icons/"];

/// Filename suffixes treated as static assets.
pub const STATIC_SUFFIXES: &[&str] = &[".css", ".js"];

/// App-shell assets fetched and stored during install. The list is fixed;
/// install is all-or-nothing over it.
pub const PRECACHE_PATHS: &[&str] = &[
  "/",
  "/manifest.json",
  "/icons/icon-192x192.png",
  "/icons/icon-512x512.png",
  "/offline.html",
];

/// Document served when a navigation fails and nothing is cached for it.
pub const OFFLINE_FALLBACK_PATH: &str = "/offline.html";

/// The class a request falls into. Determined by static rules over method
/// and URL shape; stateless and total.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestClass {
  /// `/api/` routes; passed to the network untouched.
  ApiPassthrough,
  /// Top-level page loads.
  Navigation,
  /// Content-hashed build output, icons, stylesheets, scripts.
  StaticAsset,
  /// App-shell manifest entries not already caught by an earlier rule.
  PrecacheAsset,
  /// Fonts and other third-party subresources.
  External,
}

/// How a class of request is answered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
  /// Not intercepted; the request goes straight to the network and no
  /// response is ever cached.
  NetworkOnly,
  /// Live response preferred, stored on success; cache then offline
  /// fallback on network failure.
  NetworkFirst,
  /// Cached response returned without touching the network; fetched and
  /// stored on a miss.
  CacheFirst,
  /// Cached response returned immediately while a detached fetch refreshes
  /// the entry for next time.
  StaleWhileRevalidate,
}

impl RequestClass {
  pub fn strategy(&self) -> Strategy {
    match self {
      Self::ApiPassthrough => Strategy::NetworkOnly,
      Self::Navigation => Strategy::NetworkFirst,
      Self::StaticAsset => Strategy::CacheFirst,
      Self::PrecacheAsset | Self::External => Strategy::StaleWhileRevalidate,
    }
  }
}

/// Classify a request. First matching rule wins:
///
/// 1. API prefix
/// 2. navigation mode
/// 3. static-asset path patterns
/// 4. precache manifest entries
/// 5. everything else is external
pub fn classify(request: &FetchRequest) -> RequestClass {
  let path = request.url.path();

  if path.starts_with(API_PREFIX) {
    return RequestClass::ApiPassthrough;
  }

  if request.is_navigation() {
    return RequestClass::Navigation;
  }

  if STATIC_PREFIXES.iter().any(|p| path.starts_with(p))
    || STATIC_SUFFIXES.iter().any(|s| path.ends_with(s))
  {
    return RequestClass::StaticAsset;
  }

  if PRECACHE_PATHS.contains(&path) {
    return RequestClass::PrecacheAsset;
  }

  RequestClass::External
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::offline::request::{FetchRequest, RequestMethod, RequestMode};
  use url::Url;

  fn get(path: &str) -> FetchRequest {
    let url = Url::parse("https://fridge.example.com")
      .and_then(|u| u.join(path))
      .expect("test url");
    FetchRequest::get(url)
  }

  fn navigate(path: &str) -> FetchRequest {
    let mut req = get(path);
    req.mode = RequestMode::Navigate;
    req
  }

  #[test]
  fn test_api_routes_are_passthrough() {
    assert_eq!(classify(&get("/api/items")), RequestClass::ApiPassthrough);
    assert_eq!(
      classify(&get("/api/ai/command")),
      RequestClass::ApiPassthrough
    );
  }

  #[test]
  fn test_api_prefix_wins_over_navigation_mode() {
    assert_eq!(
      classify(&navigate("/api/items")),
      RequestClass::ApiPassthrough
    );
  }

  #[test]
  fn test_navigations() {
    assert_eq!(classify(&navigate("/")), RequestClass::Navigation);
    assert_eq!(classify(&navigate("/settings")), RequestClass::Navigation);
  }

  #[test]
  fn test_navigation_mode_wins_over_static_suffix() {
    assert_eq!(classify(&navigate("/app.js")), RequestClass::Navigation);
  }

  #[test]
  fn test_static_assets() {
    assert_eq!(
      classify(&get("/_next/static/chunks/main-abc123.js")),
      RequestClass::StaticAsset
    );
    assert_eq!(
      classify(&get("/icons/icon-192x192.png")),
      RequestClass::StaticAsset
    );
    assert_eq!(classify(&get("/styles/app.css")), RequestClass::StaticAsset);
    assert_eq!(classify(&get("/vendor/chart.js")), RequestClass::StaticAsset);
  }

  #[test]
  fn test_precache_entries_not_caught_earlier() {
    assert_eq!(classify(&get("/")), RequestClass::PrecacheAsset);
    assert_eq!(classify(&get("/manifest.json")), RequestClass::PrecacheAsset);
    assert_eq!(classify(&get("/offline.html")), RequestClass::PrecacheAsset);
  }

  #[test]
  fn test_everything_else_is_external() {
    assert_eq!(
      classify(&get("/fonts/pretendard.woff2")),
      RequestClass::External
    );
    let cross_origin = FetchRequest::get(
      Url::parse("https://fonts.example.net/css2?family=Pretendard").expect("test url"),
    );
    assert_eq!(classify(&cross_origin), RequestClass::External);
  }

  #[test]
  fn test_classification_is_deterministic() {
    let req = get("/fonts/pretendard.woff2");
    assert_eq!(classify(&req), classify(&req));
  }

  #[test]
  fn test_classification_is_total_over_methods_and_modes() {
    // Class depends on URL shape and mode only; any method gets a class.
    for method in [
      RequestMethod::Get,
      RequestMethod::Post,
      RequestMethod::Delete,
    ] {
      let mut req = get("/api/items");
      req.method = method;
      assert_eq!(classify(&req), RequestClass::ApiPassthrough);
    }
  }

  #[test]
  fn test_strategy_mapping() {
    assert_eq!(
      RequestClass::ApiPassthrough.strategy(),
      Strategy::NetworkOnly
    );
    assert_eq!(RequestClass::Navigation.strategy(), Strategy::NetworkFirst);
    assert_eq!(RequestClass::StaticAsset.strategy(), Strategy::CacheFirst);
    assert_eq!(
      RequestClass::PrecacheAsset.strategy(),
      Strategy::StaleWhileRevalidate
    );
    assert_eq!(
      RequestClass::External.strategy(),
      Strategy::StaleWhileRevalidate
    );
  }
}
