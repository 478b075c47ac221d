//! The `Endpoint` identity type and URL rewriting.

use std::fmt;

/// URL scheme a node's HTTP(S) API is reachable on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scheme {
    Http,
    Https,
}

impl Scheme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Scheme::Http => "http",
            Scheme::Https => "https",
        }
    }
}

impl fmt::Display for Scheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A cluster node's network identity: `(scheme, host, port)`.
///
/// Identity is the full triple; two endpoints are equal iff all three fields match.
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct Endpoint {
    pub scheme: Scheme,
    pub host: String,
    pub port: u16,
}

impl Endpoint {
    pub fn new(scheme: Scheme, host: impl Into<String>, port: u16) -> Self {
        Self {
            scheme,
            host: host.into(),
            port,
        }
    }

    /// Rewrite `url`'s scheme/host/port to this endpoint, preserving path and query.
    pub fn rewrite(&self, url: &mut http::Uri) -> Result<(), http::uri::InvalidUri> {
        let path_and_query = url
            .path_and_query()
            .map(|pq| pq.as_str().to_string())
            .unwrap_or_else(|| "/".to_string());

        let rewritten = http::Uri::builder()
            .scheme(self.scheme.as_str())
            .authority(format!("{}:{}", self.host, self.port))
            .path_and_query(path_and_query)
            .build()?;

        *url = rewritten;
        Ok(())
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}://{}:{}", self.scheme, self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equality_is_the_full_triple() {
        let a = Endpoint::new(Scheme::Http, "10.0.0.1", 8000);
        let b = Endpoint::new(Scheme::Http, "10.0.0.1", 8000);
        let c = Endpoint::new(Scheme::Http, "10.0.0.1", 8001);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn rewrite_preserves_path_and_query() {
        let endpoint = Endpoint::new(Scheme::Https, "node7.cluster.local", 9042);
        let mut uri: http::Uri = "http://seed:8000/path?x=1".parse().unwrap();
        endpoint.rewrite(&mut uri).unwrap();
        assert_eq!(uri.scheme_str(), Some("https"));
        assert_eq!(uri.host(), Some("node7.cluster.local"));
        assert_eq!(uri.port_u16(), Some(9042));
        assert_eq!(uri.path_and_query().unwrap().as_str(), "/path?x=1");
    }

    #[test]
    fn display_matches_url_form() {
        let endpoint = Endpoint::new(Scheme::Http, "127.0.0.1", 8000);
        assert_eq!(endpoint.to_string(), "http://127.0.0.1:8000");
    }
}
