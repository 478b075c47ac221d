//! GZIP body compression, applied after routing and before signing.

use crate::error::{Result, RouterError};
use crate::routing::OutboundRequest;
use crate::routing::RequestTransform;
use flate2::write::GzEncoder;
use flate2::Compression;
use std::io::Write;

pub const DEFAULT_MIN_COMPRESSION_SIZE_BYTES: usize = 1024;

/// Whether compression is enabled, and at what body-size threshold.
#[derive(Debug, Clone, Copy)]
pub enum CompressionAlgorithm {
    None,
    Gzip,
}

/// Compresses the outgoing body with GZIP when it is at least
/// `min_size_bytes` long, setting `Content-Encoding: gzip`. Leaves the request
/// untouched when compression is disabled, the body is absent, or it is shorter
/// than the threshold. Sits upstream of signing so that signing observes the
/// final, possibly-compressed body.
pub struct GzipCompressor {
    algorithm: CompressionAlgorithm,
    min_size_bytes: usize,
}

impl GzipCompressor {
    pub fn new(algorithm: CompressionAlgorithm, min_size_bytes: usize) -> Self {
        Self {
            algorithm,
            min_size_bytes,
        }
    }
}

impl Default for GzipCompressor {
    fn default() -> Self {
        Self::new(CompressionAlgorithm::Gzip, DEFAULT_MIN_COMPRESSION_SIZE_BYTES)
    }
}

impl RequestTransform for GzipCompressor {
    fn apply(&self, mut request: OutboundRequest) -> Result<OutboundRequest> {
        let should_compress = matches!(self.algorithm, CompressionAlgorithm::Gzip)
            && request
                .body
                .as_ref()
                .is_some_and(|b| b.len() >= self.min_size_bytes);

        if !should_compress {
            return Ok(request);
        }

        let body = request.body.take().expect("checked above");
        let compressed = gzip_compress(&body)?;
        request.body = Some(compressed);
        request.headers.insert(
            http::header::CONTENT_ENCODING,
            http::HeaderValue::from_static("gzip"),
        );
        Ok(request)
    }
}

fn gzip_compress(data: &[u8]) -> Result<Vec<u8>> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder
        .write_all(data)
        .map_err(|e| RouterError::Compression(e.to_string()))?;
    encoder
        .finish()
        .map_err(|e| RouterError::Compression(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::read::GzDecoder;
    use std::io::Read;

    fn gunzip(data: &[u8]) -> Vec<u8> {
        let mut decoder = GzDecoder::new(data);
        let mut out = Vec::new();
        decoder.read_to_end(&mut out).unwrap();
        out
    }

    fn request_with_body(body: Vec<u8>) -> OutboundRequest {
        let mut req = OutboundRequest::new("http://node1:8000/".parse().unwrap());
        req.body = Some(body);
        req
    }

    #[test]
    fn body_above_threshold_is_compressed_and_round_trips() {
        let body = vec![b'x'; 2048];
        let compressor = GzipCompressor::new(CompressionAlgorithm::Gzip, 1024);
        let result = compressor.apply(request_with_body(body.clone())).unwrap();
        assert_eq!(
            result.headers.get(http::header::CONTENT_ENCODING).unwrap(),
            "gzip"
        );
        assert_eq!(gunzip(result.body.as_ref().unwrap()), body);
    }

    #[test]
    fn body_below_threshold_is_untouched() {
        let body = vec![b'x'; 10];
        let compressor = GzipCompressor::new(CompressionAlgorithm::Gzip, 1024);
        let result = compressor.apply(request_with_body(body.clone())).unwrap();
        assert!(result.headers.get(http::header::CONTENT_ENCODING).is_none());
        assert_eq!(result.body.as_ref().unwrap(), &body);
    }

    #[test]
    fn disabled_algorithm_never_compresses() {
        let body = vec![b'x'; 4096];
        let compressor = GzipCompressor::new(CompressionAlgorithm::None, 1024);
        let result = compressor.apply(request_with_body(body.clone())).unwrap();
        assert!(result.headers.get(http::header::CONTENT_ENCODING).is_none());
        assert_eq!(result.body.as_ref().unwrap(), &body);
    }

    #[test]
    fn absent_body_is_a_no_op() {
        let compressor = GzipCompressor::default();
        let req = OutboundRequest::new("http://node1:8000/".parse().unwrap());
        let result = compressor.apply(req).unwrap();
        assert!(result.body.is_none());
    }
}
