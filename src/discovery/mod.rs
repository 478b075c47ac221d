//! Component B — the background discovery loop.
//!
//! Periodically refreshes the [`LiveNodes`](crate::registry::LiveNodes) registry by
//! polling a live node's "local nodes" endpoint, choosing a [`RoutingScope`] with
//! fallback, and backing off on failure. Runs on a single cancelable background
//! task; only this loop ever mutates the registry.

pub mod scope;

pub use scope::RoutingScope;

use crate::endpoint::{Endpoint, Scheme};
use crate::registry::LiveNodes;
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, Notify};
use tokio::time::Instant;

/// Configuration for the discovery loop.
#[derive(Debug, Clone)]
pub struct DiscoveryConfig {
    pub scheme: Scheme,
    pub port: u16,
    pub scope: RoutingScope,
    pub active_refresh_interval: Duration,
    pub idle_refresh_interval: Duration,
    /// Path of the "local nodes" discovery endpoint, e.g. `/localnodes`.
    pub discovery_path: String,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            scheme: Scheme::Http,
            port: 8000,
            scope: RoutingScope::cluster(),
            active_refresh_interval: Duration::from_secs(10),
            idle_refresh_interval: Duration::from_secs(60),
            discovery_path: "/localnodes".to_string(),
        }
    }
}

/// Shared handle used by other components to signal request activity (switching
/// the loop to the faster cadence) or to force an immediate refresh after a
/// request observed a routing failure.
#[derive(Clone)]
pub struct ActivitySignal {
    last_activity_ms: Arc<AtomicI64>,
    wake: Arc<Notify>,
    started_at: Instant,
}

impl ActivitySignal {
    fn new() -> Self {
        Self {
            last_activity_ms: Arc::new(AtomicI64::new(i64::MIN)),
            wake: Arc::new(Notify::new()),
            started_at: Instant::now(),
        }
    }

    /// Called whenever a request is routed; keeps the loop on the active cadence.
    pub fn mark_active(&self) {
        let now = self.started_at.elapsed().as_millis() as i64;
        self.last_activity_ms.store(now, Ordering::Relaxed);
    }

    /// Called when a request fails to route; triggers an immediate refresh.
    pub fn request_refresh(&self) {
        self.mark_active();
        self.wake.notify_one();
    }

    fn is_active(&self, window: Duration) -> bool {
        let last = self.last_activity_ms.load(Ordering::Relaxed);
        if last == i64::MIN {
            return false;
        }
        let now = self.started_at.elapsed().as_millis() as i64;
        (now - last) <= window.as_millis() as i64
    }
}

impl Default for ActivitySignal {
    fn default() -> Self {
        Self::new()
    }
}

/// The background discovery loop. Dropping this value does not stop the task —
/// call [`DiscoveryLoop::shutdown`] to cancel it deterministically.
pub struct DiscoveryLoop {
    shutdown_tx: watch::Sender<bool>,
    handle: tokio::task::JoinHandle<()>,
}

impl DiscoveryLoop {
    /// Spawns the background task. `http` is a plain, unwrapped HTTP client used
    /// only for polling the discovery endpoint (never the request path's wrapping
    /// transport, which would create a cyclic registry → loop → transport → loop
    /// reference).
    pub fn spawn(
        registry: LiveNodes,
        http: reqwest::Client,
        config: DiscoveryConfig,
        activity: ActivitySignal,
    ) -> Self {
        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);
        let scope_supported = Arc::new(AtomicBool::new(true));

        let handle = tokio::spawn(async move {
            tracing::info!("discovery loop starting");

            loop {
                let poll_result =
                    poll_once(&registry, &http, &config, scope_supported.as_ref()).await;

                let next_interval = match poll_result {
                    Ok(()) => {
                        if activity.is_active(config.active_refresh_interval) {
                            config.active_refresh_interval
                        } else {
                            config.idle_refresh_interval
                        }
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "discovery poll failed on all known nodes, backing off");
                        config.idle_refresh_interval
                    }
                };

                tokio::select! {
                    _ = tokio::time::sleep(next_interval) => {}
                    _ = activity.wake.notified() => {}
                    _ = shutdown_rx.changed() => {
                        if *shutdown_rx.borrow() {
                            break;
                        }
                    }
                }

                if *shutdown_rx.borrow() {
                    break;
                }
            }

            tracing::info!("discovery loop stopped");
        });

        Self { shutdown_tx, handle }
    }

    /// Signals the loop to stop and waits for it to exit.
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(true);
        let _ = self.handle.await;
    }
}

#[derive(Debug, thiserror::Error)]
enum PollError {
    #[error("no live node responded to the discovery request")]
    AllNodesUnreachable,
}

/// Runs one discovery cycle: walks the scope's fallback chain (or just the
/// cluster query, if scope filtering was already found unsupported), trying each
/// currently-known node in turn, and replaces the registry with the first
/// non-empty result.
async fn poll_once(
    registry: &LiveNodes,
    http: &reqwest::Client,
    config: &DiscoveryConfig,
    scope_supported: &AtomicBool,
) -> Result<(), PollError> {
    let candidates: Vec<&RoutingScope> = if scope_supported.load(Ordering::Acquire) {
        config.scope.chain()
    } else {
        vec![]
    };

    for scope in candidates {
        match try_scope(registry, http, config, scope).await {
            ScopeOutcome::Populated => return Ok(()),
            ScopeOutcome::Empty => continue,
            ScopeOutcome::Unsupported => {
                scope_supported.store(false, Ordering::Release);
                break;
            }
            ScopeOutcome::AllNodesUnreachable => return Err(PollError::AllNodesUnreachable),
        }
    }

    // Either scope filtering is unsupported, or every scope in the chain came
    // back empty: fall back to the unfiltered cluster listing.
    match try_scope(registry, http, config, &RoutingScope::cluster()).await {
        ScopeOutcome::Populated => Ok(()),
        ScopeOutcome::AllNodesUnreachable => Err(PollError::AllNodesUnreachable),
        ScopeOutcome::Empty | ScopeOutcome::Unsupported => Ok(()),
    }
}

enum ScopeOutcome {
    Populated,
    Empty,
    Unsupported,
    AllNodesUnreachable,
}

async fn try_scope(
    registry: &LiveNodes,
    http: &reqwest::Client,
    config: &DiscoveryConfig,
    scope: &RoutingScope,
) -> ScopeOutcome {
    let targets = registry.live_nodes();
    if targets.is_empty() {
        return ScopeOutcome::AllNodesUnreachable;
    }

    for target in &targets {
        match query_node(http, target, config, scope).await {
            Ok(hosts) if hosts.is_empty() => return ScopeOutcome::Empty,
            Ok(hosts) => {
                let endpoints: Vec<Endpoint> = hosts
                    .into_iter()
                    .map(|host| Endpoint::new(config.scheme, host, config.port))
                    .collect();
                registry.replace(endpoints);
                return ScopeOutcome::Populated;
            }
            Err(QueryError::Unsupported) => return ScopeOutcome::Unsupported,
            Err(QueryError::Transport) => continue,
        }
    }

    ScopeOutcome::AllNodesUnreachable
}

enum QueryError {
    /// The server responded but indicated scope filtering is not a feature it
    /// supports at all (as opposed to "this particular scope matched nothing").
    Unsupported,
    Transport,
}

async fn query_node(
    http: &reqwest::Client,
    target: &Endpoint,
    config: &DiscoveryConfig,
    scope: &RoutingScope,
) -> Result<Vec<String>, QueryError> {
    let query = scope.query_string();
    let url = if query.is_empty() {
        format!("{}{}", target, config.discovery_path)
    } else {
        format!("{}{}?{}", target, config.discovery_path, query)
    };

    let response = http.get(&url).send().await.map_err(|_| QueryError::Transport)?;

    if response.status() == http::StatusCode::NOT_IMPLEMENTED
        || response.status() == http::StatusCode::BAD_REQUEST
    {
        return Err(QueryError::Unsupported);
    }
    if !response.status().is_success() {
        return Err(QueryError::Transport);
    }

    response
        .json::<Vec<String>>()
        .await
        .map_err(|_| QueryError::Transport)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn activity_signal_reports_inactive_with_no_traffic() {
        let signal = ActivitySignal::new();
        assert!(!signal.is_active(Duration::from_secs(10)));
    }

    #[test]
    fn activity_signal_reports_active_right_after_mark() {
        let signal = ActivitySignal::new();
        signal.mark_active();
        assert!(signal.is_active(Duration::from_secs(10)));
    }
}
