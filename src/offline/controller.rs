//! Offline cache controller: lifecycle, interception and caching strategies.

use std::sync::{Arc, Mutex};

use color_eyre::{eyre::eyre, Result};
use sha2::{Digest, Sha256};
use tracing::{debug, info, warn};
use url::Url;

use super::classify::{classify, Strategy, OFFLINE_FALLBACK_PATH, PRECACHE_PATHS};
use super::net::Fetcher;
use super::request::FetchRequest;
use super::response::CachedResponse;
use super::store::CacheStore;

/// Shell document re-fetched by the periodic update check.
const UPDATE_PROBE_PATH: &str = "/manifest.json";

/// Lifecycle of a controller generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecyclePhase {
  /// Precaching the app shell; nothing is intercepted yet.
  Installing,
  /// Install finished, activation not yet run.
  WaitingToActivate,
  /// Old generations purged; interception is live.
  Active,
}

/// Outcome of intercepting a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchDecision {
  /// The request is not the controller's business; the shell sends it to
  /// the network untouched.
  NotHandled,
  /// Serve this response to the caller.
  Respond(CachedResponse),
}

/// Keeps the application shell usable with degraded or no connectivity.
///
/// Install precaches a fixed list of shell assets under the current version
/// tag, activation deletes every other generation, and intercepted
/// read-only requests are answered per-class: API routes pass through,
/// navigations are network-first with an offline fallback, static assets
/// are cache-first, and everything else is stale-while-revalidate.
pub struct OfflineController {
  version: String,
  origin: Url,
  store: Arc<dyn CacheStore>,
  fetcher: Arc<dyn Fetcher>,
  phase: Mutex<LifecyclePhase>,
  shell_hash: Mutex<Option<String>>,
}

impl OfflineController {
  pub fn new(
    version: impl Into<String>,
    origin: Url,
    store: Arc<dyn CacheStore>,
    fetcher: Arc<dyn Fetcher>,
  ) -> Self {
    Self {
      version: version.into(),
      origin,
      store,
      fetcher,
      phase: Mutex::new(LifecyclePhase::Installing),
      shell_hash: Mutex::new(None),
    }
  }

  pub fn version(&self) -> &str {
    &self.version
  }

  pub fn phase(&self) -> LifecyclePhase {
    self
      .phase
      .lock()
      .map(|p| *p)
      .unwrap_or(LifecyclePhase::Installing)
  }

  /// Content hash of the shell manifest as of install or the latest update
  /// check. `None` before install completes.
  pub fn shell_version_hash(&self) -> Option<String> {
    self.shell_hash.lock().ok().and_then(|h| h.clone())
  }

  /// Precache the app shell under the current version tag.
  ///
  /// All-or-nothing: every asset must fetch and store, otherwise the
  /// install fails and any previous generation keeps serving.
  pub async fn install(&self) -> Result<()> {
    info!(version = %self.version, "installing app shell");

    let requests: Vec<FetchRequest> = PRECACHE_PATHS
      .iter()
      .map(|path| self.shell_request(path))
      .collect::<Result<_>>()?;

    let fetched = futures::future::try_join_all(requests.iter().map(|request| async move {
      let response = self.fetcher.fetch(request).await?;
      Ok::<_, color_eyre::Report>((request, response))
    }))
    .await?;

    for (request, response) in &fetched {
      self
        .store
        .put(&self.version, &request.cache_key(), response)?;
    }

    if let Some((_, manifest)) = fetched
      .iter()
      .find(|(request, _)| request.url.path() == UPDATE_PROBE_PATH)
    {
      self.record_shell_hash(content_hash(&manifest.body))?;
    }

    self.set_phase(LifecyclePhase::WaitingToActivate)?;
    Ok(())
  }

  /// Purge every generation except the current one, then start
  /// intercepting. Requests arriving before this completes pass through.
  pub async fn activate(&self) -> Result<()> {
    for name in self.store.list_generations()? {
      if name != self.version {
        info!(generation = %name, "deleting stale cache generation");
        self.store.delete_generation(&name)?;
      }
    }

    self.set_phase(LifecyclePhase::Active)?;
    info!(version = %self.version, "offline controller active");
    Ok(())
  }

  /// Intercept one request and decide how to answer it.
  ///
  /// Only network failure can surface as an error, and only on the paths
  /// where no fallback exists; cache-store trouble is logged and treated
  /// as a miss.
  pub async fn handle_fetch(&self, request: &FetchRequest) -> Result<FetchDecision> {
    if self.phase() != LifecyclePhase::Active {
      return Ok(FetchDecision::NotHandled);
    }

    if !request.method.is_read_only() {
      return Ok(FetchDecision::NotHandled);
    }

    match classify(request).strategy() {
      Strategy::NetworkOnly => Ok(FetchDecision::NotHandled),
      Strategy::NetworkFirst => self.network_first(request).await.map(FetchDecision::Respond),
      Strategy::CacheFirst => self.cache_first(request).await.map(FetchDecision::Respond),
      Strategy::StaleWhileRevalidate => self
        .stale_while_revalidate(request)
        .await
        .map(FetchDecision::Respond),
    }
  }

  /// Ask the shell origin whether a newer shell exists. Failures are
  /// swallowed; callers consume no return value.
  pub async fn check_for_update(&self) {
    if let Err(err) = self.probe_shell_version().await {
      debug!("shell update check failed: {}", err);
    }
  }

  async fn probe_shell_version(&self) -> Result<()> {
    let request = self.shell_request(UPDATE_PROBE_PATH)?;
    let response = self.fetcher.fetch(&request).await?;
    let hash = content_hash(&response.body);

    let mut current = self
      .shell_hash
      .lock()
      .map_err(|e| eyre!("Lock poisoned: {}", e))?;
    if let Some(known) = current.as_deref() {
      if known != hash {
        info!(version = %self.version, "new app shell version available");
      }
    }
    *current = Some(hash);
    Ok(())
  }

  /// Prefer the live response, fall back to the cache, then to the offline
  /// document precached at install.
  async fn network_first(&self, request: &FetchRequest) -> Result<CachedResponse> {
    match self.fetcher.fetch(request).await {
      Ok(response) => {
        self.store_copy(request, &response);
        Ok(response)
      }
      Err(err) => {
        debug!(url = %request.url, "navigation fetch failed, falling back to cache");
        if let Some(cached) = self.lookup(request) {
          return Ok(cached);
        }
        if let Some(offline) = self.offline_fallback() {
          return Ok(offline);
        }
        Err(err)
      }
    }
  }

  /// Serve the cache without touching the network; fetch and store on a
  /// miss.
  async fn cache_first(&self, request: &FetchRequest) -> Result<CachedResponse> {
    if let Some(cached) = self.lookup(request) {
      return Ok(cached);
    }

    let response = self.fetcher.fetch(request).await?;
    self.store_copy(request, &response);
    Ok(response)
  }

  /// Serve the cache immediately while a detached fetch refreshes the
  /// entry; block on the network only when nothing is cached.
  async fn stale_while_revalidate(&self, request: &FetchRequest) -> Result<CachedResponse> {
    let cached = self.lookup(request);
    let refresh = self.spawn_refresh(request.clone());

    if let Some(hit) = cached {
      // The refresh task keeps running detached; its result is dropped.
      return Ok(hit);
    }

    match refresh.await {
      Ok(result) => result,
      Err(err) => Err(eyre!("revalidation task failed: {}", err)),
    }
  }

  fn spawn_refresh(
    &self,
    request: FetchRequest,
  ) -> tokio::task::JoinHandle<Result<CachedResponse>> {
    let fetcher = Arc::clone(&self.fetcher);
    let store = Arc::clone(&self.store);
    let version = self.version.clone();

    tokio::spawn(async move {
      let response = fetcher.fetch(&request).await?;
      let copy = response.clone();
      if let Err(err) = store.put(&version, &request.cache_key(), &copy) {
        debug!(key = %request.cache_key(), "cache refresh write failed: {}", err);
      }
      Ok(response)
    })
  }

  /// Store a copy of a response under the request key. Write failures are
  /// logged and never affect what the caller receives.
  fn store_copy(&self, request: &FetchRequest, response: &CachedResponse) {
    let copy = response.clone();
    if let Err(err) = self.store.put(&self.version, &request.cache_key(), &copy) {
      warn!(key = %request.cache_key(), "cache write failed: {}", err);
    }
  }

  /// Exact-key lookup in the current generation; store errors count as a
  /// miss.
  fn lookup(&self, request: &FetchRequest) -> Option<CachedResponse> {
    match self.store.get(&self.version, &request.cache_key()) {
      Ok(entry) => entry,
      Err(err) => {
        warn!(key = %request.cache_key(), "cache lookup failed: {}", err);
        None
      }
    }
  }

  fn offline_fallback(&self) -> Option<CachedResponse> {
    let request = self.shell_request(OFFLINE_FALLBACK_PATH).ok()?;
    self.lookup(&request)
  }

  fn shell_request(&self, path: &str) -> Result<FetchRequest> {
    let url = self
      .origin
      .join(path)
      .map_err(|e| eyre!("Invalid shell path {}: {}", path, e))?;
    Ok(FetchRequest::get(url))
  }

  fn record_shell_hash(&self, hash: String) -> Result<()> {
    *self
      .shell_hash
      .lock()
      .map_err(|e| eyre!("Lock poisoned: {}", e))? = Some(hash);
    Ok(())
  }

  fn set_phase(&self, phase: LifecyclePhase) -> Result<()> {
    *self
      .phase
      .lock()
      .map_err(|e| eyre!("Lock poisoned: {}", e))? = phase;
    Ok(())
  }
}

fn content_hash(bytes: &[u8]) -> String {
  let mut hasher = Sha256::new();
  hasher.update(bytes);
  hex::encode(hasher.finalize())
}
