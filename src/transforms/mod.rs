//! Component E — wire-level transforms: GZIP body compression (a request
//! transform, upstream of signing) and the header whitelist (enforced by the
//! wrapping HTTP transport, downstream of signing — see [`crate::transport`]).

pub mod gzip;
pub mod headers;

pub use gzip::{CompressionAlgorithm, GzipCompressor};
pub use headers::HeaderWhitelist;
