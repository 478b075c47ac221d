//! `RoutingScope`: a recursive scope chain with fallback, as consumed by the
//! discovery loop (component B).

/// Which nodes are acceptable to route to, with an optional fallback scope to try
/// if this one matches no nodes (or the server rejects it as unsupported).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoutingScope {
    /// All cluster nodes. Terminal: no filtering query, no fallback.
    Cluster,
    /// Nodes in a given datacenter, with an optional fallback scope.
    Datacenter {
        dc: String,
        fallback: Option<Box<RoutingScope>>,
    },
    /// Nodes in a given datacenter and rack, with an optional fallback scope.
    Rack {
        dc: String,
        rack: String,
        fallback: Option<Box<RoutingScope>>,
    },
}

impl RoutingScope {
    pub fn cluster() -> Self {
        RoutingScope::Cluster
    }

    pub fn datacenter(dc: impl Into<String>) -> Self {
        RoutingScope::Datacenter {
            dc: dc.into(),
            fallback: None,
        }
    }

    pub fn rack(dc: impl Into<String>, rack: impl Into<String>) -> Self {
        RoutingScope::Rack {
            dc: dc.into(),
            rack: rack.into(),
            fallback: None,
        }
    }

    /// Attaches a fallback scope to try if this scope's discovery query returns no
    /// nodes, or the server rejects scope filtering entirely.
    pub fn with_fallback(self, fallback: RoutingScope) -> Self {
        match self {
            RoutingScope::Cluster => RoutingScope::Cluster,
            RoutingScope::Datacenter { dc, .. } => RoutingScope::Datacenter {
                dc,
                fallback: Some(Box::new(fallback)),
            },
            RoutingScope::Rack { dc, rack, .. } => RoutingScope::Rack {
                dc,
                rack,
                fallback: Some(Box::new(fallback)),
            },
        }
    }

    /// The query string used verbatim when polling the discovery endpoint: ``
    /// (cluster), `dc=X`, or `dc=X&rack=Y`.
    pub fn query_string(&self) -> String {
        match self {
            RoutingScope::Cluster => String::new(),
            RoutingScope::Datacenter { dc, .. } => format!("dc={dc}"),
            RoutingScope::Rack { dc, rack, .. } => format!("dc={dc}&rack={rack}"),
        }
    }

    /// The next scope to try if this one produced no nodes, if any.
    pub fn fallback(&self) -> Option<&RoutingScope> {
        match self {
            RoutingScope::Cluster => None,
            RoutingScope::Datacenter { fallback, .. } => fallback.as_deref(),
            RoutingScope::Rack { fallback, .. } => fallback.as_deref(),
        }
    }

    /// Walks the fallback chain, starting at `self`, as a flat vec (chain is
    /// always finite — see the type's doc comment — so this always terminates).
    pub fn chain(&self) -> Vec<&RoutingScope> {
        let mut out = vec![self];
        let mut current = self;
        while let Some(next) = current.fallback() {
            out.push(next);
            current = next;
        }
        out
    }
}
