//! Request exchange wrapper
//!
//! Wraps one request/response pair and enforces the "status decided at most
//! once" rule. The first call to `begin_response` locks in the status and
//! content type; later calls ignore their arguments and return the same body
//! sink. Converting an exchange that never began a response produces a 404
//! with an empty body, so every request terminates with a well-formed
//! response even when a handler writes nothing.

use http_body_util::Full;
use hyper::body::Bytes;
use hyper::{Response, StatusCode};

use crate::http;

/// Content type for synthesized listing pages
pub const CONTENT_TYPE_HTML: &str = "text/html; charset=utf-8";

/// Content type for raw archive entry bytes
pub const CONTENT_TYPE_BINARY: &str = "application/octet-stream";

/// Buffered response being assembled for one request
pub struct Exchange {
    status: Option<(StatusCode, &'static str)>,
    body: Vec<u8>,
}

impl Exchange {
    pub const fn new() -> Self {
        Self {
            status: None,
            body: Vec::new(),
        }
    }

    /// Lock in status and content type, returning the body sink.
    ///
    /// Only the first call decides the status; subsequent calls return the
    /// same sink and their arguments are ignored.
    pub fn begin_response(
        &mut self,
        status: StatusCode,
        content_type: &'static str,
    ) -> &mut Vec<u8> {
        if self.status.is_none() {
            self.status = Some((status, content_type));
        }
        &mut self.body
    }

    /// Status and body size this exchange will produce, for access logging
    pub fn outcome(&self) -> (StatusCode, usize) {
        match self.status {
            Some((status, _)) => (status, self.body.len()),
            None => (StatusCode::NOT_FOUND, 0),
        }
    }

    /// Finish the exchange, defaulting to an empty 404 if no response began
    pub fn into_response(self) -> Response<Full<Bytes>> {
        match self.status {
            Some((status, content_type)) => {
                http::build_body_response(status, content_type, self.body)
            }
            None => http::build_404_response(),
        }
    }
}

impl Default for Exchange {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_to_404_when_untouched() {
        let exchange = Exchange::new();
        assert_eq!(exchange.outcome(), (StatusCode::NOT_FOUND, 0));
        let response = exchange.into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_status_is_write_once() {
        let mut exchange = Exchange::new();
        exchange
            .begin_response(StatusCode::OK, CONTENT_TYPE_HTML)
            .extend_from_slice(b"hello");
        // Second call must not change the status but still hand back the sink
        exchange
            .begin_response(StatusCode::INTERNAL_SERVER_ERROR, CONTENT_TYPE_BINARY)
            .extend_from_slice(b" world");

        assert_eq!(exchange.outcome(), (StatusCode::OK, 11));
        let response = exchange.into_response();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get("Content-Type").unwrap(),
            CONTENT_TYPE_HTML
        );
    }

    #[test]
    fn test_body_accumulates_across_calls() {
        let mut exchange = Exchange::new();
        exchange
            .begin_response(StatusCode::OK, CONTENT_TYPE_BINARY)
            .extend_from_slice(b"abc");
        exchange
            .begin_response(StatusCode::OK, CONTENT_TYPE_BINARY)
            .extend_from_slice(b"def");
        assert_eq!(exchange.outcome(), (StatusCode::OK, 6));
    }
}
