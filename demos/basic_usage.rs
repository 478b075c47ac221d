// Demonstrates constructing a router client and sending a PutItem-shaped
// request through the full outbound pipeline.

use partition_router::affinity::{AffinityMode, DynamoRequest, OperationKind, ReturnValues};
use partition_router::config::KeyRouteAffinityConfig;
use partition_router::routing::OutboundRequest;
use partition_router::{Result, RouterClient, RouterConfig};
use std::collections::HashMap;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_target(false)
        .with_thread_ids(true)
        .with_level(true)
        .init();

    let mut preconfigured_pk_info = HashMap::new();
    preconfigured_pk_info.insert("orders".to_string(), "order_id".to_string());

    let config = RouterConfig {
        seed_hosts: vec!["127.0.0.1".to_string()],
        port: 8000,
        key_route_affinity: KeyRouteAffinityConfig {
            mode: AffinityMode::AnyWrite,
            preconfigured_pk_info,
        },
        ..Default::default()
    };

    let client = RouterClient::connect(config, None).await?;

    let mut attributes = HashMap::new();
    attributes.insert("order_id".to_string(), serde_json::json!({"S": "order-42"}));
    attributes.insert("total".to_string(), serde_json::json!({"N": "19.99"}));

    let operation = DynamoRequest {
        operation: OperationKind::PutItem,
        table_name: "orders".to_string(),
        attributes,
        condition_expression: None,
        expected: HashMap::new(),
        return_values: ReturnValues::None,
        update_expression: None,
        attribute_updates: HashMap::new(),
    };

    let request = OutboundRequest::new("http://seed:8000/".parse().unwrap()).with_operation(operation);

    match client.send(request).await {
        Ok(response) => tracing::info!(status = %response.status(), "PutItem routed"),
        Err(e) => tracing::warn!(error = %e, "PutItem failed (expected if no cluster is running)"),
    }

    Ok(())
}
