//! The header whitelist: the set of headers the wrapping HTTP transport lets
//! through to the wire, enforced case-insensitively just before a request is
//! sent (see [`crate::transport::HttpTransport`]).

use crate::error::{Result, RouterError};
use std::collections::BTreeSet;

/// Headers every configuration must retain, regardless of compression/auth.
pub const BASE_REQUIRED_HEADERS: &[&str] = &["host", "x-amz-target", "content-type", "content-length", "accept-encoding"];

fn lower(name: &str) -> String {
    name.to_ascii_lowercase()
}

/// A validated, case-insensitive set of header names allowed onto the wire.
#[derive(Debug, Clone)]
pub struct HeaderWhitelist {
    allowed: BTreeSet<String>,
}

impl HeaderWhitelist {
    /// Builds the whitelist the required-header set implies for the given
    /// feature flags (compression, authentication): the base set, plus
    /// `Content-Encoding` when compression is enabled and `Authorization`/
    /// `X-Amz-Date` when authentication is enabled.
    pub fn default_for(compression_enabled: bool, authentication_enabled: bool) -> Self {
        let mut names: BTreeSet<String> = BASE_REQUIRED_HEADERS.iter().map(|s| lower(s)).collect();
        if compression_enabled {
            names.insert("content-encoding".to_string());
        }
        if authentication_enabled {
            names.insert("authorization".to_string());
            names.insert("x-amz-date".to_string());
        }
        Self { allowed: names }
    }

    /// Validates a user-supplied whitelist against the required set implied by
    /// the given feature flags, rejecting it unless it is a superset.
    pub fn custom(
        names: impl IntoIterator<Item = String>,
        compression_enabled: bool,
        authentication_enabled: bool,
    ) -> Result<Self> {
        let required = Self::default_for(compression_enabled, authentication_enabled);
        let supplied: BTreeSet<String> = names.into_iter().map(|s| lower(&s)).collect();

        let missing: Vec<&String> = required.allowed.difference(&supplied).collect();
        if !missing.is_empty() {
            return Err(RouterError::Configuration(format!(
                "custom headers whitelist is missing required headers: {:?}",
                missing
            )));
        }

        Ok(Self { allowed: supplied })
    }

    pub fn allows(&self, name: &str) -> bool {
        self.allowed.contains(&lower(name))
    }

    /// Drops every header from `headers` whose name is not in this whitelist,
    /// preserving the relative order and all values of the headers that remain.
    pub fn filter(&self, headers: &http::HeaderMap) -> http::HeaderMap {
        let mut filtered = http::HeaderMap::with_capacity(headers.len());
        for (name, value) in headers.iter() {
            if self.allows(name.as_str()) {
                filtered.append(name.clone(), value.clone());
            }
        }
        filtered
    }
}
