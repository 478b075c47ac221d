//! Component D — the key-affinity engine.
//!
//! Decides whether a write operation warrants key-based routing, extracts and
//! hashes the partition-key value, and produces a deterministic seeded
//! [`QueryPlan`](crate::registry::QueryPlan) that all clients in any language agree
//! on for the same key.

pub mod hash;
pub mod prng;
pub mod qualify;
pub mod request;
pub mod table_keys;

pub use qualify::AffinityMode;
pub use request::{AttributeUpdate, AttributeUpdateAction, DynamoRequest, OperationKind, ReturnValues};
pub use table_keys::TableKeyInfo;

use crate::registry::{LiveNodes, QueryPlan};
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

/// Discovers a table's partition-key attribute name, out-of-band from the request
/// path. The actual `DescribeTable` wire call is out of scope for this crate;
/// callers provide an implementation that issues it against a live endpoint.
#[async_trait]
pub trait PartitionKeyDiscovery: Send + Sync {
    async fn describe_partition_key(&self, table_name: &str) -> crate::error::Result<String>;
}

/// The key-affinity engine (component D).
#[derive(Clone)]
pub struct KeyAffinityEngine {
    mode: AffinityMode,
    registry: LiveNodes,
    table_keys: TableKeyInfo,
    discovery: Arc<dyn PartitionKeyDiscovery>,
}

impl KeyAffinityEngine {
    pub fn new(
        mode: AffinityMode,
        registry: LiveNodes,
        table_keys: TableKeyInfo,
        discovery: Arc<dyn PartitionKeyDiscovery>,
    ) -> Self {
        Self {
            mode,
            registry,
            table_keys,
            discovery,
        }
    }

    /// Produces the query plan this request should be routed with: a seeded,
    /// key-derived plan if the request qualifies and the partition-key name is
    /// already known, or a basic round-robin plan otherwise (falling back
    /// silently, and kicking off an asynchronous `DescribeTable` if the table's
    /// key name is unknown).
    pub fn plan_for(&self, request: &DynamoRequest) -> QueryPlan {
        if !qualify::qualifies(self.mode, request) {
            return self.registry.new_query_plan();
        }

        let Some(pk_name) = self.table_keys.get(&request.table_name) else {
            self.trigger_discovery(request.table_name.clone());
            return self.registry.new_query_plan();
        };

        let Some(value) = request.key_source().get(&pk_name) else {
            tracing::warn!(
                table = %request.table_name,
                pk_name = %pk_name,
                "qualifying write is missing its partition-key attribute; falling back to round-robin"
            );
            return self.registry.new_query_plan();
        };

        let Some(bytes) = canonical_bytes(value) else {
            tracing::warn!(
                table = %request.table_name,
                "partition-key attribute has no recognized S/N/B tag; falling back to round-robin"
            );
            return self.registry.new_query_plan();
        };

        let h1 = hash::hash(&bytes);
        self.registry.new_seeded_query_plan(h1 as i64)
    }

    /// A plain round-robin plan over the same registry this engine routes
    /// qualifying writes against, for callers (the key-affinity routing
    /// interceptor) that need a fallback plan for non-qualifying requests.
    pub fn round_robin_plan(&self) -> QueryPlan {
        self.registry.new_query_plan()
    }

    fn trigger_discovery(&self, table_name: String) {
        if !self.table_keys.try_start_discovery(&table_name) {
            return;
        }
        let discovery = Arc::clone(&self.discovery);
        let table_keys = self.table_keys.clone();
        tokio::spawn(async move {
            match discovery.describe_partition_key(&table_name).await {
                Ok(attribute) => {
                    tracing::debug!(table = %table_name, pk_name = %attribute, "discovered partition key name");
                    table_keys.insert(table_name, attribute);
                }
                Err(e) => {
                    tracing::warn!(table = %table_name, error = %e, "DescribeTable failed; will retry on next qualifying write");
                    table_keys.abandon_discovery(&table_name);
                }
            }
        });
    }
}

/// The canonical byte sequence for a tagged DynamoDB attribute value, for hashing.
///
/// `S`: UTF-8 bytes of the string. `N`: UTF-8 bytes of the numeric string exactly
/// as presented (no re-encoding). `B`: the raw bytes, base64-decoded from the JSON
/// wire representation.
fn canonical_bytes(value: &Value) -> Option<Vec<u8>> {
    let obj = value.as_object()?;
    if let Some(s) = obj.get("S").and_then(Value::as_str) {
        return Some(s.as_bytes().to_vec());
    }
    if let Some(n) = obj.get("N").and_then(Value::as_str) {
        return Some(n.as_bytes().to_vec());
    }
    if let Some(b) = obj.get("B").and_then(Value::as_str) {
        use base64::Engine;
        return base64::engine::general_purpose::STANDARD.decode(b).ok();
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::endpoint::{Endpoint, Scheme};
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct StaticDiscovery {
        calls: AtomicUsize,
        answer: String,
    }

    #[async_trait]
    impl PartitionKeyDiscovery for StaticDiscovery {
        async fn describe_partition_key(&self, _table_name: &str) -> crate::error::Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.answer.clone())
        }
    }

    fn node_list(n: u16) -> Vec<Endpoint> {
        (0..n).map(|i| Endpoint::new(Scheme::Http, "127.0.0.1", 8000 + i)).collect()
    }

    fn put_item(table: &str, pk_value: &str) -> DynamoRequest {
        let mut attributes = HashMap::new();
        attributes.insert("pk".to_string(), serde_json::json!({"S": pk_value}));
        DynamoRequest {
            operation: OperationKind::PutItem,
            table_name: table.to_string(),
            attributes,
            condition_expression: None,
            expected: HashMap::new(),
            return_values: ReturnValues::None,
            update_expression: None,
            attribute_updates: HashMap::new(),
        }
    }

    #[test]
    fn canonical_bytes_reads_each_tag() {
        assert_eq!(canonical_bytes(&serde_json::json!({"S": "abc"})), Some(b"abc".to_vec()));
        assert_eq!(canonical_bytes(&serde_json::json!({"N": "123"})), Some(b"123".to_vec()));
        assert_eq!(
            canonical_bytes(&serde_json::json!({"B": "aGVsbG8="})),
            Some(b"hello".to_vec())
        );
    }

    #[tokio::test]
    async fn same_key_value_routes_to_the_same_node_five_times() {
        let registry = LiveNodes::new(node_list(5));
        registry.replace(node_list(5));
        let engine = KeyAffinityEngine::new(
            AffinityMode::AnyWrite,
            registry,
            TableKeyInfo::new([("orders".to_string(), "pk".to_string())]),
            Arc::new(StaticDiscovery {
                calls: AtomicUsize::new(0),
                answer: "pk".to_string(),
            }),
        );

        let request = put_item("orders", "test-pk-value-123");
        let mut destinations = std::collections::HashSet::new();
        for _ in 0..5 {
            let mut plan = engine.plan_for(&request);
            destinations.insert(plan.next().unwrap());
        }
        assert_eq!(destinations.len(), 1);
    }

    #[tokio::test]
    async fn missing_pk_name_falls_back_and_triggers_one_discovery() {
        let registry = LiveNodes::new(node_list(3));
        registry.replace(node_list(3));
        let discovery = Arc::new(StaticDiscovery {
            calls: AtomicUsize::new(0),
            answer: "pk".to_string(),
        });
        let engine = KeyAffinityEngine::new(
            AffinityMode::AnyWrite,
            registry,
            TableKeyInfo::new([]),
            discovery.clone(),
        );

        let request = put_item("orders", "value");
        let plan = engine.plan_for(&request);
        // Falls back to round-robin (a full-length plan), not an error.
        assert_eq!(plan.count(), 3);

        // Give the spawned discovery task a chance to run.
        tokio::task::yield_now().await;
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        assert_eq!(discovery.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn non_qualifying_operation_uses_round_robin() {
        let registry = LiveNodes::new(node_list(3));
        registry.replace(node_list(3));
        let engine = KeyAffinityEngine::new(
            AffinityMode::Rmw,
            registry,
            TableKeyInfo::new([("orders".to_string(), "pk".to_string())]),
            Arc::new(StaticDiscovery {
                calls: AtomicUsize::new(0),
                answer: "pk".to_string(),
            }),
        );

        let request = put_item("orders", "value"); // no condition: does not qualify under RMW
        let plan = engine.plan_for(&request);
        assert_eq!(plan.count(), 3);
    }
}
