//! The request-shape descriptor: enough structure from a decoded DynamoDB
//! operation for the key-affinity engine to decide whether it qualifies for
//! key-based routing and, if so, to extract the partition-key value.
//!
//! The actual wire codec is out of scope for this crate (see spec §1); callers
//! decode the operation themselves and hand the engine this descriptor.

use serde_json::Value;
use std::collections::HashMap;

/// The DynamoDB operation kind, as recognized by the key-affinity engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationKind {
    PutItem,
    UpdateItem,
    DeleteItem,
    GetItem,
    Query,
    Scan,
    BatchGetItem,
    BatchWriteItem,
}

impl OperationKind {
    pub fn is_read(&self) -> bool {
        matches!(
            self,
            OperationKind::GetItem
                | OperationKind::Query
                | OperationKind::Scan
                | OperationKind::BatchGetItem
        )
    }

    pub fn is_single_item_write(&self) -> bool {
        matches!(
            self,
            OperationKind::PutItem | OperationKind::UpdateItem | OperationKind::DeleteItem
        )
    }

    pub fn is_batch_write(&self) -> bool {
        matches!(self, OperationKind::BatchWriteItem)
    }
}

/// The legacy per-attribute conditional-update action, as carried in
/// `AttributeUpdates`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttributeUpdateAction {
    Put,
    Add,
    Delete,
}

/// One entry of the legacy `AttributeUpdates` map.
#[derive(Debug, Clone)]
pub struct AttributeUpdate {
    pub action: AttributeUpdateAction,
    /// Whether a value was attached to this update (distinguishes a plain
    /// `DELETE` from a set-element-removal `DELETE` with a value).
    pub has_value: bool,
}

/// The subset of `ReturnValues` the engine's RMW predicate cares about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReturnValues {
    None,
    AllOld,
    UpdatedOld,
    AllNew,
    UpdatedNew,
}

/// A decoded DynamoDB write/read operation, structured enough for the
/// key-affinity engine's qualification and extraction logic.
#[derive(Debug, Clone)]
pub struct DynamoRequest {
    pub operation: OperationKind,
    pub table_name: String,
    /// `Item` (PutItem) or `Key` (UpdateItem/DeleteItem): a map of attribute name
    /// to its tagged DynamoDB attribute value (`{"S": "..."}`, `{"N": "..."}`,
    /// `{"B": "..."}`, etc., as a raw `serde_json::Value` for the tag/value pair).
    pub attributes: HashMap<String, Value>,
    pub condition_expression: Option<String>,
    pub expected: HashMap<String, Value>,
    pub return_values: ReturnValues,
    pub update_expression: Option<String>,
    pub attribute_updates: HashMap<String, AttributeUpdate>,
}

impl DynamoRequest {
    /// The map the partition-key value should be read from: `Item` for
    /// `PutItem`, `Key` for `UpdateItem`/`DeleteItem`.
    pub fn key_source(&self) -> &HashMap<String, Value> {
        &self.attributes
    }
}
