//! Root index handler
//!
//! Serves the server's own root path with an HTML index of the currently
//! mounted archives.

use std::sync::Arc;

use http_body_util::Full;
use hyper::body::Bytes;
use hyper::{Response, StatusCode};

use crate::archive::listing;
use crate::config::AppState;
use crate::handler::exchange::{Exchange, CONTENT_TYPE_HTML};

/// Render the index of mount names, each linking to `name/`
pub async fn serve_index(state: &Arc<AppState>) -> Response<Full<Bytes>> {
    let mounts = state.registry.list().await;
    let page = listing::render_root_index(&mounts);

    let mut exchange = Exchange::new();
    exchange
        .begin_response(StatusCode::OK, CONTENT_TYPE_HTML)
        .extend_from_slice(page.as_bytes());
    exchange.into_response()
}
