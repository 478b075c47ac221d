//! The top-level client: wires the live-node registry (A), the discovery loop
//! (B), the routing interceptor (C), the key-affinity engine (D), and the
//! wire-level transforms (E) into the documented outbound pipeline —
//! routing, then GZIP, then (a caller-supplied signing step, out of scope
//! here), then the header-whitelisted transport.

use crate::affinity::{KeyAffinityEngine, PartitionKeyDiscovery, TableKeyInfo};
use crate::config::RouterConfig;
use crate::discovery::{ActivitySignal, DiscoveryConfig, DiscoveryLoop};
use crate::endpoint::Endpoint;
use crate::error::{Result, RouterError};
use crate::registry::LiveNodes;
use crate::routing::{BasicRouter, KeyAffinityRouter, OutboundRequest, RequestTransform, RoutingInterceptor};
use crate::transforms::GzipCompressor;
use crate::transport::HttpTransport;
use async_trait::async_trait;
use std::sync::Arc;

/// Default [`PartitionKeyDiscovery`] for callers that never configure one. Key
/// affinity still works for tables whose partition key was supplied via
/// `preconfigured_pk_info`; any other table simply falls back to round-robin
/// forever, since there's nowhere to send `DescribeTable`.
struct NoPartitionKeyDiscovery;

#[async_trait]
impl PartitionKeyDiscovery for NoPartitionKeyDiscovery {
    async fn describe_partition_key(&self, table_name: &str) -> Result<String> {
        Err(RouterError::Configuration(format!(
            "no PartitionKeyDiscovery configured; cannot resolve partition key for table {table_name}"
        )))
    }
}

/// A fully assembled router client. Construct with [`RouterClient::connect`].
pub struct RouterClient {
    registry: LiveNodes,
    activity: ActivitySignal,
    discovery_loop: Option<DiscoveryLoop>,
    interceptor: RoutingInterceptor,
    compressor: GzipCompressor,
    transport: HttpTransport,
}

impl RouterClient {
    /// Validates `config`, seeds the node registry, starts the background
    /// discovery loop, and assembles the outbound pipeline. `discovery` is used
    /// only when `config.key_route_affinity.mode` is not [`crate::affinity::AffinityMode::None`]
    /// and a qualifying write targets a table whose partition key isn't already
    /// known from `preconfigured_pk_info`.
    pub async fn connect(
        config: RouterConfig,
        discovery: Option<Arc<dyn PartitionKeyDiscovery>>,
    ) -> Result<Self> {
        let whitelist = config.validate()?;

        let seeds: Vec<Endpoint> = config
            .seed_hosts
            .iter()
            .map(|host| Endpoint::new(config.scheme, host.clone(), config.port))
            .collect();
        let registry = LiveNodes::new(seeds);
        let activity = ActivitySignal::default();

        let http = build_reqwest_client(&config)?;

        let discovery_config = DiscoveryConfig {
            scheme: config.scheme,
            port: config.port,
            scope: config.routing_scope.clone(),
            active_refresh_interval: config.active_refresh_interval,
            idle_refresh_interval: config.idle_refresh_interval,
            ..DiscoveryConfig::default()
        };
        let discovery_loop = DiscoveryLoop::spawn(
            registry.clone(),
            http.clone(),
            discovery_config,
            activity.clone(),
        );

        let interceptor = if matches!(config.key_route_affinity.mode, crate::affinity::AffinityMode::None) {
            RoutingInterceptor::Basic(BasicRouter::new(registry.clone(), activity.clone()))
        } else {
            let table_keys = TableKeyInfo::new(
                config
                    .key_route_affinity
                    .preconfigured_pk_info
                    .iter()
                    .map(|(k, v)| (k.clone(), v.clone())),
            );
            let pk_discovery = discovery.unwrap_or_else(|| Arc::new(NoPartitionKeyDiscovery));
            let engine = KeyAffinityEngine::new(
                config.key_route_affinity.mode,
                registry.clone(),
                table_keys,
                pk_discovery,
            );
            RoutingInterceptor::KeyAffinity(KeyAffinityRouter::new(engine, activity.clone()))
        };

        let compressor = GzipCompressor::new(config.compression_algorithm, config.min_compression_size_bytes);
        let transport = HttpTransport::new(http, whitelist);

        Ok(Self {
            registry,
            activity,
            discovery_loop: Some(discovery_loop),
            interceptor,
            compressor,
            transport,
        })
    }

    /// Runs `request` through the full pipeline — routing, then GZIP — and
    /// sends it. Signing, if the caller's SDK layer needs it, must run between
    /// [`Self::route_and_compress`] and a direct call to the transport; most
    /// callers should use this method instead, which assumes no signing step.
    pub async fn send(&self, request: OutboundRequest) -> Result<reqwest::Response> {
        let request = self.route_and_compress(request)?;
        self.transport.send(request).await
    }

    /// Runs the routing and compression transforms only, leaving the result
    /// ready for a caller-supplied signing step before handing it to
    /// [`crate::transport::HttpTransport`] directly.
    pub fn route_and_compress(&self, request: OutboundRequest) -> Result<OutboundRequest> {
        let request = self.interceptor.apply(request)?;
        self.compressor.apply(request)
    }

    /// The live-node registry, for callers that want to observe cluster
    /// membership directly (metrics, health checks).
    pub fn registry(&self) -> &LiveNodes {
        &self.registry
    }

    /// The shared activity signal, exposed so an outer SDK's own request path
    /// (one that doesn't go through [`Self::send`]) can still report
    /// success/failure to keep discovery cadence accurate.
    pub fn activity(&self) -> &ActivitySignal {
        &self.activity
    }

    /// Stops the background discovery loop. Safe to call more than once; a
    /// client with no discovery loop (already shut down) is a no-op.
    pub async fn shutdown(&mut self) {
        if let Some(loop_handle) = self.discovery_loop.take() {
            loop_handle.shutdown().await;
        }
    }
}

fn build_reqwest_client(config: &RouterConfig) -> Result<reqwest::Client> {
    let mut builder = reqwest::Client::builder()
        .pool_max_idle_per_host(config.max_connections)
        .pool_idle_timeout(config.connection_max_idle_time);

    if config.tls.trust_all {
        builder = builder.danger_accept_invalid_certs(true);
    }
    if !config.tls.trust_system_cas {
        builder = builder.tls_built_in_root_certs(false);
    }
    for ca_path in &config.tls.custom_cas {
        let pem = std::fs::read(ca_path)?;
        let cert = reqwest::Certificate::from_pem(&pem)
            .map_err(|e| RouterError::Configuration(format!("invalid custom CA at {}: {e}", ca_path.display())))?;
        builder = builder.add_root_certificate(cert);
    }

    builder
        .build()
        .map_err(|e| RouterError::Configuration(format!("failed to build HTTP client: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::affinity::AffinityMode;

    fn base_config() -> RouterConfig {
        RouterConfig {
            seed_hosts: vec!["127.0.0.1".to_string()],
            port: 8000,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn connects_and_shuts_down_cleanly() {
        let mut client = RouterClient::connect(base_config(), None).await.unwrap();
        assert_eq!(client.registry().live_nodes().len(), 1);
        client.shutdown().await;
    }

    #[tokio::test]
    async fn key_affinity_mode_uses_the_affinity_interceptor() {
        let mut config = base_config();
        config.key_route_affinity.mode = AffinityMode::AnyWrite;
        let mut client = RouterClient::connect(config, None).await.unwrap();
        assert!(matches!(client.interceptor, RoutingInterceptor::KeyAffinity(_)));
        client.shutdown().await;
    }

    #[tokio::test]
    async fn rejects_invalid_configuration_before_spawning_anything() {
        let config = RouterConfig::default(); // no seed hosts
        let result = RouterClient::connect(config, None).await;
        assert!(result.is_err());
    }
}
