// API type definitions module
// Request/response types for the mount management API

use serde::{Deserialize, Serialize};

/// Request body for mounting an archive
#[derive(Debug, Deserialize)]
pub struct AddMountRequest {
    /// Mount name, becomes the URL path prefix
    pub name: String,
    /// Filesystem path of the zip archive
    pub path: String,
}

/// Request body for starting the archive listener
#[derive(Debug, Default, Deserialize)]
pub struct StartRequest {
    /// Port to listen on; defaults to the configured port
    #[serde(default)]
    pub port: Option<u16>,
}

/// One mounted archive
#[derive(Debug, Serialize)]
pub struct MountInfo {
    pub name: String,
    pub path: String,
}

/// Snapshot of all mounted archives
#[derive(Debug, Serialize)]
pub struct MountsResponse {
    pub mounts: Vec<MountInfo>,
}

/// Server status snapshot
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub running: bool,
    /// Bound address when running
    pub address: Option<String>,
    pub mounts: usize,
}

/// Generic acknowledgement
#[derive(Debug, Serialize)]
pub struct AckResponse {
    pub status: &'static str,
}

impl AckResponse {
    pub const fn ok() -> Self {
        Self { status: "ok" }
    }
}
