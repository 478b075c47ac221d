//! Component C — the routing interceptor.
//!
//! On every outbound request, determines the target endpoint via the node
//! registry (optionally via the key-affinity engine) and rewrites the request's
//! destination. Modeled as an explicit interceptor/middleware step: a function
//! `(request) -> request` with a documented position in the transform chain (see
//! [`crate::client`]), rather than the thread-local signaling the reference design
//! uses to pass a hashed seed between components.

use crate::affinity::{DynamoRequest, KeyAffinityEngine};
use crate::discovery::ActivitySignal;
use crate::endpoint::Endpoint;
use crate::error::{Result, RouterError};
use crate::registry::LiveNodes;

/// A request as it travels through the outbound transform chain: just enough of
/// an HTTP request (and, optionally, the decoded operation it carries) for the
/// transforms in this crate to act on. The actual DynamoDB wire codec and SigV4
/// signing are out of scope (see crate root docs); a real SDK integration would
/// carry its own request type through an equivalent hook instead.
pub struct OutboundRequest {
    pub url: http::Uri,
    pub headers: http::HeaderMap,
    pub body: Option<Vec<u8>>,
    /// Present when the caller has already decoded the operation; required for
    /// the key-affinity variant to do anything other than round-robin.
    pub operation: Option<DynamoRequest>,
}

impl OutboundRequest {
    pub fn new(url: http::Uri) -> Self {
        Self {
            url,
            headers: http::HeaderMap::new(),
            body: None,
            operation: None,
        }
    }

    pub fn with_operation(mut self, operation: DynamoRequest) -> Self {
        self.operation = Some(operation);
        self
    }

    pub fn with_body(mut self, body: Vec<u8>) -> Self {
        self.body = Some(body);
        self
    }
}

/// A single step in the outbound request pipeline. Implementations must be safe
/// to call more than once per logical call (the pipeline may run again on retry)
/// and must never block indefinitely.
pub trait RequestTransform: Send + Sync {
    fn apply(&self, request: OutboundRequest) -> Result<OutboundRequest>;
}

fn rewrite_destination(mut request: OutboundRequest, endpoint: &Endpoint) -> Result<OutboundRequest> {
    endpoint
        .rewrite(&mut request.url)
        .map_err(|e| RouterError::Configuration(format!("invalid rewritten URL: {e}")))?;
    Ok(request)
}

/// Basic round-robin routing interceptor.
pub struct BasicRouter {
    registry: LiveNodes,
    activity: ActivitySignal,
}

impl BasicRouter {
    pub fn new(registry: LiveNodes, activity: ActivitySignal) -> Self {
        Self { registry, activity }
    }
}

impl RequestTransform for BasicRouter {
    fn apply(&self, request: OutboundRequest) -> Result<OutboundRequest> {
        let mut plan = self.registry.new_query_plan();
        match plan.next() {
            Some(endpoint) => {
                self.activity.mark_active();
                rewrite_destination(request, &endpoint)
            }
            None => {
                self.activity.request_refresh();
                Err(RouterError::Routing)
            }
        }
    }
}

/// Key-affinity routing interceptor: delegates to the engine to decide between a
/// seeded, key-derived plan and a plain round-robin fallback.
pub struct KeyAffinityRouter {
    engine: KeyAffinityEngine,
    activity: ActivitySignal,
}

impl KeyAffinityRouter {
    pub fn new(engine: KeyAffinityEngine, activity: ActivitySignal) -> Self {
        Self { engine, activity }
    }
}

impl RequestTransform for KeyAffinityRouter {
    fn apply(&self, request: OutboundRequest) -> Result<OutboundRequest> {
        let mut plan = match &request.operation {
            Some(operation) => self.engine.plan_for(operation),
            None => self.engine.round_robin_plan(),
        };

        match plan.next() {
            Some(endpoint) => {
                self.activity.mark_active();
                rewrite_destination(request, &endpoint)
            }
            None => {
                self.activity.request_refresh();
                Err(RouterError::Routing)
            }
        }
    }
}

/// Either routing flavor, plugged into the same pipeline slot.
pub enum RoutingInterceptor {
    Basic(BasicRouter),
    KeyAffinity(KeyAffinityRouter),
}

impl RequestTransform for RoutingInterceptor {
    fn apply(&self, request: OutboundRequest) -> Result<OutboundRequest> {
        match self {
            RoutingInterceptor::Basic(r) => r.apply(request),
            RoutingInterceptor::KeyAffinity(r) => r.apply(request),
        }
    }
}
