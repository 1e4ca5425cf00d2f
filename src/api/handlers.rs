// Mount management handlers module

use http_body_util::{BodyExt, Full};
use hyper::body::Bytes;
use hyper::{Request, Response, StatusCode};
use serde::de::DeserializeOwned;
use std::convert::Infallible;
use std::sync::Arc;

use super::response::{bad_request, conflict_response, internal_error, json_response};
use super::types::{AckResponse, AddMountRequest, MountInfo, MountsResponse, StartRequest, StatusResponse};
use crate::config::{self, AppState};
use crate::logger;

/// Read and deserialize a JSON request body; an empty body yields the default
async fn read_json_body<T: DeserializeOwned + Default>(
    req: Request<hyper::body::Incoming>,
) -> Result<T, String> {
    let body = req
        .collect()
        .await
        .map_err(|e| format!("Failed to read request body: {e}"))?
        .to_bytes();

    if body.is_empty() {
        return Ok(T::default());
    }
    serde_json::from_slice(&body).map_err(|e| format!("Invalid JSON body: {e}"))
}

/// GET /v1/mounts - list mounted archives
pub async fn handle_list_mounts(state: Arc<AppState>) -> Result<Response<Full<Bytes>>, Infallible> {
    let mounts = state
        .registry
        .snapshot()
        .await
        .into_iter()
        .map(|(name, path)| MountInfo {
            name,
            path: path.display().to_string(),
        })
        .collect();

    logger::log_api_request("GET", "/v1/mounts", 200);
    json_response(StatusCode::OK, &MountsResponse { mounts })
}

/// POST /v1/mounts - mount an archive
pub async fn handle_add_mount(
    req: Request<hyper::body::Incoming>,
    state: Arc<AppState>,
) -> Result<Response<Full<Bytes>>, Infallible> {
    let body = req
        .collect()
        .await
        .map(http_body_util::Collected::to_bytes);
    let Ok(body) = body else {
        return Ok(bad_request("Failed to read request body"));
    };
    let add_req: AddMountRequest = match serde_json::from_slice(&body) {
        Ok(r) => r,
        Err(e) => return Ok(bad_request(&format!("Invalid JSON body: {e}"))),
    };

    if !config::is_valid_mount_name(&add_req.name) {
        logger::log_api_request("POST", "/v1/mounts", 400);
        return Ok(bad_request(&format!(
            "Invalid mount name '{}': must be a non-empty single path segment",
            add_req.name
        )));
    }

    match state.registry.add(&add_req.name, &add_req.path).await {
        Ok(true) => {
            logger::log_api_request("POST", "/v1/mounts", 201);
            json_response(StatusCode::CREATED, &AckResponse::ok())
        }
        Ok(false) => {
            logger::log_api_request("POST", "/v1/mounts", 409);
            Ok(conflict_response(&format!(
                "Mount '{}' already exists",
                add_req.name
            )))
        }
        Err(e) => {
            logger::log_api_request("POST", "/v1/mounts", 400);
            Ok(bad_request(&e.to_string()))
        }
    }
}

/// DELETE /v1/mounts/{name} - unmount an archive (idempotent)
pub async fn handle_remove_mount(
    state: Arc<AppState>,
    name: &str,
) -> Result<Response<Full<Bytes>>, Infallible> {
    state.registry.remove(name).await;
    logger::log_api_request("DELETE", &format!("/v1/mounts/{name}"), 200);
    json_response(StatusCode::OK, &AckResponse::ok())
}

/// POST /v1/server/start - start the archive listener
pub async fn handle_server_start(
    req: Request<hyper::body::Incoming>,
    state: Arc<AppState>,
) -> Result<Response<Full<Bytes>>, Infallible> {
    let start_req: StartRequest = match read_json_body(req).await {
        Ok(r) => r,
        Err(e) => return Ok(bad_request(&e)),
    };

    let port = start_req.port.unwrap_or(state.config.server.port);
    let host = state.config.server.host.clone();

    match state.server.start(&state, &host, port).await {
        Ok(()) => {
            logger::log_api_request("POST", "/v1/server/start", 200);
            handle_status(state).await
        }
        Err(e) => {
            logger::log_api_request("POST", "/v1/server/start", 500);
            Ok(internal_error(&e.to_string()))
        }
    }
}

/// POST /v1/server/stop - stop the archive listener (idempotent)
pub async fn handle_server_stop(state: Arc<AppState>) -> Result<Response<Full<Bytes>>, Infallible> {
    state.server.stop().await;
    logger::log_api_request("POST", "/v1/server/stop", 200);
    json_response(StatusCode::OK, &AckResponse::ok())
}

/// GET /v1/status - server status snapshot
pub async fn handle_status(state: Arc<AppState>) -> Result<Response<Full<Bytes>>, Infallible> {
    let address = state.server.running_addr().await;
    let status = StatusResponse {
        running: address.is_some(),
        address: address.map(|a| a.to_string()),
        mounts: state.registry.len().await,
    };
    json_response(StatusCode::OK, &status)
}
