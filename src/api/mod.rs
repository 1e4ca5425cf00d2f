// API module entry
// Mount management API served on a separate port: add/remove/list mounts
// and start/stop the archive listener, driving a live server without a
// restart.

mod handlers;
mod response;
mod types;

use http_body_util::Full;
use hyper::body::Bytes;
use hyper::{Method, Request, Response};
use std::convert::Infallible;
use std::sync::Arc;

use crate::config::AppState;
use crate::logger;

pub use response::not_found;

/// API route handler
///
/// Dispatches to handler functions based on request path and method
pub async fn handle_api_request(
    req: Request<hyper::body::Incoming>,
    state: Arc<AppState>,
) -> Result<Response<Full<Bytes>>, Infallible> {
    let path = req.uri().path().to_string();
    let method = req.method().clone();

    match (method, path.as_str()) {
        (Method::GET, "/v1/mounts") => handlers::handle_list_mounts(state).await,
        (Method::POST, "/v1/mounts") => handlers::handle_add_mount(req, state).await,
        (Method::DELETE, p) => match p.strip_prefix("/v1/mounts/") {
            Some(name) if !name.is_empty() => handlers::handle_remove_mount(state, name).await,
            _ => {
                logger::log_api_request("DELETE", &path, 404);
                Ok(not_found())
            }
        },
        (Method::POST, "/v1/server/start") => handlers::handle_server_start(req, state).await,
        (Method::POST, "/v1/server/stop") => handlers::handle_server_stop(state).await,
        (Method::GET, "/v1/status") => handlers::handle_status(state).await,
        // Unknown route
        (method, _) => {
            logger::log_api_request(method.as_str(), &path, 404);
            Ok(not_found())
        }
    }
}
