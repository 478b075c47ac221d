//! Component A — the live-node registry (`LiveNodes`).
//!
//! Owns the current set of reachable endpoints and serves round-robin selection
//! and lazy, non-repeating query plans to every other component. Only the discovery
//! loop (component B) ever calls [`LiveNodes::replace`]; everyone else only reads.

mod plan;

pub use plan::QueryPlan;

use crate::endpoint::Endpoint;
use parking_lot::RwLock;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

struct Inner {
    nodes: RwLock<Vec<Endpoint>>,
    seeds: Vec<Endpoint>,
    cursor: AtomicUsize,
    discovered: std::sync::atomic::AtomicBool,
}

/// The live-node registry. Cheap to clone — all clones share the same state.
#[derive(Clone)]
pub struct LiveNodes {
    inner: Arc<Inner>,
}

impl LiveNodes {
    /// Creates a registry seeded with the bootstrap node list. Before the discovery
    /// loop completes its first successful poll, [`next_endpoint`](Self::next_endpoint)
    /// and [`live_nodes`](Self::live_nodes) serve from this seed list.
    pub fn new(seeds: Vec<Endpoint>) -> Self {
        Self {
            inner: Arc::new(Inner {
                nodes: RwLock::new(Vec::new()),
                seeds,
                cursor: AtomicUsize::new(0),
                discovered: std::sync::atomic::AtomicBool::new(false),
            }),
        }
    }

    /// Returns the next endpoint in round-robin order. Thread-safe and lock-free on
    /// the read path (the only lock taken is the brief read-guard over the node
    /// vector; no writer is ever blocked behind a caller of this method).
    pub fn next_endpoint(&self) -> Option<Endpoint> {
        let nodes = self.inner.nodes.read();
        let source: &[Endpoint] = if self.inner.discovered.load(Ordering::Acquire) && !nodes.is_empty() {
            &nodes
        } else {
            &self.inner.seeds
        };
        if source.is_empty() {
            return None;
        }
        let idx = self.inner.cursor.fetch_add(1, Ordering::Relaxed) % source.len();
        Some(source[idx].clone())
    }

    /// A lazy round-robin query plan. See [`QueryPlan`].
    pub fn new_query_plan(&self) -> QueryPlan {
        QueryPlan::round_robin(self.clone())
    }

    /// A deterministic, seeded pseudo-random permutation of the current node list.
    /// See [`QueryPlan`] and the key-affinity engine for the seeding contract.
    pub fn new_seeded_query_plan(&self, seed: i64) -> QueryPlan {
        QueryPlan::seeded(self.live_nodes(), seed)
    }

    /// A read-only snapshot of the currently live nodes (or the seed list, before
    /// discovery has completed).
    pub fn live_nodes(&self) -> Vec<Endpoint> {
        let nodes = self.inner.nodes.read();
        if self.inner.discovered.load(Ordering::Acquire) && !nodes.is_empty() {
            nodes.clone()
        } else {
            self.inner.seeds.clone()
        }
    }

    /// Atomically replaces the live node list. A no-op if the new set is
    /// order-independently identical to the current one (avoids needless writer
    /// contention and query-plan churn when a poll returns the same membership).
    pub fn replace(&self, mut new_list: Vec<Endpoint>) {
        new_list.sort_by(|a, b| (a.host.as_str(), a.port).cmp(&(b.host.as_str(), b.port)));

        let mut nodes = self.inner.nodes.write();
        let mut current = nodes.clone();
        current.sort_by(|a, b| (a.host.as_str(), a.port).cmp(&(b.host.as_str(), b.port)));
        if current == new_list {
            return;
        }
        *nodes = new_list;
        self.inner.discovered.store(true, Ordering::Release);
    }

    /// Whether discovery has ever populated the registry from a live poll.
    pub fn has_discovered(&self) -> bool {
        self.inner.discovered.load(Ordering::Acquire)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::endpoint::Scheme;

    fn ep(port: u16) -> Endpoint {
        Endpoint::new(Scheme::Http, "127.0.0.1", port)
    }

    #[test]
    fn falls_back_to_seeds_before_discovery() {
        let registry = LiveNodes::new(vec![ep(8000), ep(8001)]);
        assert_eq!(registry.live_nodes(), vec![ep(8000), ep(8001)]);
        assert!(registry.next_endpoint().is_some());
    }

    #[test]
    fn next_endpoint_round_robins_and_wraps() {
        let registry = LiveNodes::new(vec![ep(8000), ep(8001)]);
        let a = registry.next_endpoint().unwrap();
        let b = registry.next_endpoint().unwrap();
        let c = registry.next_endpoint().unwrap();
        assert_ne!(a, b);
        assert_eq!(a, c);
    }

    #[test]
    fn replace_is_a_no_op_for_an_identical_set() {
        let registry = LiveNodes::new(vec![ep(8000)]);
        registry.replace(vec![ep(8001), ep(8002)]);
        assert!(registry.has_discovered());
        // Same set, different order: must not reset round-robin progress by
        // triggering a spurious replace.
        registry.next_endpoint();
        let before = registry.live_nodes();
        registry.replace(vec![ep(8002), ep(8001)]);
        assert_eq!(registry.live_nodes(), before);
    }

    #[test]
    fn replace_updates_and_flips_discovered() {
        let registry = LiveNodes::new(vec![ep(9999)]);
        assert!(!registry.has_discovered());
        registry.replace(vec![ep(8000), ep(8001), ep(8002)]);
        assert!(registry.has_discovered());
        assert_eq!(registry.live_nodes().len(), 3);
    }

    #[test]
    fn empty_registry_and_empty_seeds_yields_none() {
        let registry = LiveNodes::new(vec![]);
        assert_eq!(registry.next_endpoint(), None);
    }
}
