//! `RouterConfig`: the configuration surface from the design's external
//! interfaces, validated synchronously at construction (§7 "Configuration error").

use crate::affinity::AffinityMode;
use crate::discovery::RoutingScope;
use crate::endpoint::Scheme;
use crate::error::{Result, RouterError};
use crate::transforms::{CompressionAlgorithm, HeaderWhitelist};
use std::collections::HashMap;
use std::time::Duration;

/// TLS session-cache tuning, passed through to the underlying TLS stack.
#[derive(Debug, Clone)]
pub struct TlsSessionCacheConfig {
    pub enabled: bool,
    pub size: usize,
    pub timeout: Duration,
}

impl Default for TlsSessionCacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            size: 256,
            timeout: Duration::from_secs(300),
        }
    }
}

/// TLS configuration, passed through verbatim to the HTTP transport's TLS
/// primitives. This crate never implements TLS itself (see crate root docs).
#[derive(Debug, Clone, Default)]
pub struct TlsConfig {
    pub trust_all: bool,
    pub trust_system_cas: bool,
    pub custom_cas: Vec<std::path::PathBuf>,
    pub verify_hostname: bool,
    pub session_cache: TlsSessionCacheConfig,
}

/// Key-route affinity configuration.
#[derive(Debug, Clone)]
pub struct KeyRouteAffinityConfig {
    pub mode: AffinityMode,
    pub preconfigured_pk_info: HashMap<String, String>,
}

impl Default for KeyRouteAffinityConfig {
    fn default() -> Self {
        Self {
            mode: AffinityMode::None,
            preconfigured_pk_info: HashMap::new(),
        }
    }
}

/// The full configuration surface for a router client.
#[derive(Debug, Clone)]
pub struct RouterConfig {
    pub seed_hosts: Vec<String>,
    pub scheme: Scheme,
    pub port: u16,

    pub routing_scope: RoutingScope,
    pub active_refresh_interval: Duration,
    pub idle_refresh_interval: Duration,

    pub compression_algorithm: CompressionAlgorithm,
    pub min_compression_size_bytes: usize,

    pub optimize_headers: bool,
    pub headers_whitelist: Option<Vec<String>>,

    pub authentication_enabled: bool,

    pub key_route_affinity: KeyRouteAffinityConfig,

    pub max_connections: usize,
    pub connection_max_idle_time: Duration,
    pub connection_time_to_live: Duration,

    pub tls: TlsConfig,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            seed_hosts: Vec::new(),
            scheme: Scheme::Http,
            port: 8000,
            routing_scope: RoutingScope::cluster(),
            active_refresh_interval: Duration::from_secs(10),
            idle_refresh_interval: Duration::from_secs(60),
            compression_algorithm: CompressionAlgorithm::Gzip,
            min_compression_size_bytes: crate::transforms::gzip::DEFAULT_MIN_COMPRESSION_SIZE_BYTES,
            optimize_headers: true,
            headers_whitelist: None,
            authentication_enabled: true,
            key_route_affinity: KeyRouteAffinityConfig::default(),
            max_connections: 64,
            connection_max_idle_time: Duration::from_secs(60),
            connection_time_to_live: Duration::from_secs(3600),
            tls: TlsConfig::default(),
        }
    }
}

impl RouterConfig {
    /// Validates the configuration and resolves the effective header whitelist.
    /// Returns a [`RouterError::Configuration`] synchronously — never at request
    /// time — when validation fails.
    pub fn validate(&self) -> Result<HeaderWhitelist> {
        if self.seed_hosts.is_empty() {
            return Err(RouterError::Configuration(
                "at least one seed host is required".to_string(),
            ));
        }

        let compression_enabled = matches!(self.compression_algorithm, CompressionAlgorithm::Gzip);

        let whitelist = if self.optimize_headers {
            match &self.headers_whitelist {
                Some(names) => HeaderWhitelist::custom(
                    names.iter().cloned(),
                    compression_enabled,
                    self.authentication_enabled,
                )?,
                None => HeaderWhitelist::default_for(compression_enabled, self.authentication_enabled),
            }
        } else {
            // Header optimization disabled: the whitelist still exists (the
            // transport needs one to build the `reqwest::Request`), but it is
            // as permissive as the required set allows, never narrower.
            HeaderWhitelist::default_for(compression_enabled, self.authentication_enabled)
        };

        self.validate_scope_chain()?;

        Ok(whitelist)
    }

    fn validate_scope_chain(&self) -> Result<()> {
        // The scope chain is required to be finite (spec §3 invariant); a
        // well-formed `RoutingScope` always terminates at `Cluster`, which has no
        // fallback, so this can only fail if a caller somehow builds a cyclic
        // chain by hand. `chain()` would loop forever in that case, so bound the
        // walk defensively rather than trusting the invariant blindly here.
        let mut steps = 0usize;
        let mut current = &self.routing_scope;
        loop {
            steps += 1;
            if steps > 64 {
                return Err(RouterError::Configuration(
                    "routing scope fallback chain is unreasonably deep or cyclic".to_string(),
                ));
            }
            match current.fallback() {
                Some(next) => current = next,
                None => return Ok(()),
            }
        }
    }
}
