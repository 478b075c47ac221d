//! The §4.4.1 qualification predicate: decides whether an operation warrants
//! key-based routing under a given [`AffinityMode`].

use super::request::{AttributeUpdateAction, DynamoRequest, OperationKind, ReturnValues};

/// Key-affinity policy, parameterizing the qualification predicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AffinityMode {
    /// Key routing is disabled; every request goes through basic round-robin.
    None,
    /// Only read-modify-write operations qualify.
    Rmw,
    /// Every single-item write qualifies, unconditionally.
    AnyWrite,
}

/// Returns whether `request` qualifies for key-based routing under `mode`.
pub fn qualifies(mode: AffinityMode, request: &DynamoRequest) -> bool {
    if mode == AffinityMode::None {
        return false;
    }
    if request.operation.is_read() {
        return false;
    }
    if request.operation.is_batch_write() {
        return false;
    }
    if !request.operation.is_single_item_write() {
        return false;
    }

    match mode {
        AffinityMode::None => false,
        AffinityMode::AnyWrite => true,
        AffinityMode::Rmw => is_read_modify_write(request),
    }
}

fn is_read_modify_write(request: &DynamoRequest) -> bool {
    if request.condition_expression.is_some() {
        return true;
    }
    if !request.expected.is_empty() {
        return true;
    }
    if matches!(
        request.return_values,
        ReturnValues::AllOld | ReturnValues::UpdatedOld | ReturnValues::AllNew
    ) {
        return true;
    }

    if request.operation == OperationKind::UpdateItem {
        if request.update_expression.is_some() {
            return true;
        }
        for update in request.attribute_updates.values() {
            match update.action {
                AttributeUpdateAction::Add => return true,
                AttributeUpdateAction::Delete if update.has_value => return true,
                _ => {}
            }
        }
    }

    false
}
