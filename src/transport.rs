//! The wrapping HTTP transport placed between the SDK and the underlying HTTP
//! client. Enforces the final header whitelist on the wire — the last step in
//! the pipeline, after routing, compression, and signing have all run.

use crate::error::{Result, RouterError};
use crate::routing::OutboundRequest;
use crate::transforms::HeaderWhitelist;

/// Wraps a [`reqwest::Client`] and filters every outgoing request's headers down
/// to the configured whitelist immediately before the bytes hit the socket.
pub struct HttpTransport {
    client: reqwest::Client,
    whitelist: HeaderWhitelist,
}

impl HttpTransport {
    pub fn new(client: reqwest::Client, whitelist: HeaderWhitelist) -> Self {
        Self { client, whitelist }
    }

    /// Sends `request`, applying the header whitelist as the very last step.
    pub async fn send(&self, request: OutboundRequest) -> Result<reqwest::Response> {
        let filtered_headers = self.whitelist.filter(&request.headers);

        let method = reqwest::Method::POST;
        let mut builder = self.client.request(method, request.url.to_string());
        builder = builder.headers(filtered_headers);
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        builder.send().await.map_err(RouterError::Transport)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::{HeaderMap, HeaderName, HeaderValue};

    #[test]
    fn transport_filters_before_constructing_the_wire_request() {
        let whitelist = HeaderWhitelist::default_for(false, false);
        let mut headers = HeaderMap::new();
        headers.insert(HeaderName::from_static("host"), HeaderValue::from_static("node1"));
        headers.insert(HeaderName::from_static("user-agent"), HeaderValue::from_static("aws-sdk"));

        let filtered = whitelist.filter(&headers);
        assert!(filtered.get("host").is_some());
        assert!(filtered.get("user-agent").is_none());
    }
}
