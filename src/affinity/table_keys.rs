//! `TableKeyInfo`: the `tableName -> partitionKeyAttributeName` cache, plus the
//! parallel per-table discovery-status map that guarantees at most one in-flight
//! `DescribeTable` per table.

use dashmap::DashMap;
use std::sync::Arc;

/// Lifecycle state of an asynchronous partition-key-name discovery for one table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DiscoveryStatus {
    Inflight,
    Done,
}

/// The partition-key-name cache. Entries are inserted at construction (from
/// user-supplied `preconfiguredPkInfo`) or populated on first qualifying write per
/// table; they are never removed for the lifetime of the process.
#[derive(Clone)]
pub struct TableKeyInfo {
    names: Arc<DashMap<String, String>>,
    status: Arc<DashMap<String, DiscoveryStatus>>,
}

impl TableKeyInfo {
    pub fn new(preconfigured: impl IntoIterator<Item = (String, String)>) -> Self {
        let names = DashMap::new();
        for (table, attribute) in preconfigured {
            names.insert(table, attribute);
        }
        Self {
            names: Arc::new(names),
            status: Arc::new(DashMap::new()),
        }
    }

    /// The partition-key attribute name for `table`, if known.
    pub fn get(&self, table: &str) -> Option<String> {
        self.names.get(table).map(|entry| entry.value().clone())
    }

    /// Records the result of a completed `DescribeTable` discovery.
    pub fn insert(&self, table: impl Into<String>, attribute: impl Into<String>) {
        let table = table.into();
        self.names.insert(table.clone(), attribute.into());
        self.status.insert(table, DiscoveryStatus::Done);
    }

    /// Attempts to claim the right to run `DescribeTable` for `table`. Returns
    /// `true` at most once per table until the process exits or the discovery is
    /// explicitly reset — enforcing "at most one in-flight discovery per table".
    pub fn try_start_discovery(&self, table: &str) -> bool {
        match self.status.entry(table.to_string()) {
            dashmap::mapref::entry::Entry::Occupied(_) => false,
            dashmap::mapref::entry::Entry::Vacant(slot) => {
                slot.insert(DiscoveryStatus::Inflight);
                true
            }
        }
    }

    /// Clears the in-flight marker without recording a result, so a failed
    /// `DescribeTable` can be retried by a later request.
    pub fn abandon_discovery(&self, table: &str) {
        if let Some(status) = self.status.get(table) {
            if *status.value() == DiscoveryStatus::Inflight {
                drop(status);
                self.status.remove(table);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preconfigured_entries_are_visible_immediately() {
        let cache = TableKeyInfo::new([("orders".to_string(), "order_id".to_string())]);
        assert_eq!(cache.get("orders"), Some("order_id".to_string()));
        assert_eq!(cache.get("unknown"), None);
    }

    #[test]
    fn insert_populates_and_marks_done() {
        let cache = TableKeyInfo::new([]);
        assert_eq!(cache.get("orders"), None);
        cache.insert("orders", "order_id");
        assert_eq!(cache.get("orders"), Some("order_id".to_string()));
    }

    #[test]
    fn only_one_discovery_may_be_in_flight_per_table() {
        let cache = TableKeyInfo::new([]);
        assert!(cache.try_start_discovery("orders"));
        assert!(!cache.try_start_discovery("orders"));
        // A different table is independent.
        assert!(cache.try_start_discovery("customers"));
    }

    #[test]
    fn abandon_allows_a_future_retry() {
        let cache = TableKeyInfo::new([]);
        assert!(cache.try_start_discovery("orders"));
        cache.abandon_discovery("orders");
        assert!(cache.try_start_discovery("orders"));
    }

    #[test]
    fn completed_discovery_is_not_abandoned_by_a_stray_call() {
        let cache = TableKeyInfo::new([]);
        cache.insert("orders", "order_id");
        cache.abandon_discovery("orders");
        assert_eq!(cache.get("orders"), Some("order_id".to_string()));
    }
}
