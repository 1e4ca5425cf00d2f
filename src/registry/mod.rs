//! Mount registry module
//!
//! The live route table: a name-to-handler map that request dispatch reads
//! on every request while mounts are added and removed concurrently. One
//! lock guards the map; it is never held across archive or socket I/O.
//! Dispatch clones the handler's `Arc`, so a mount removed mid-request
//! stays alive until its last in-flight request finishes, while new
//! requests to its prefix already see an unmatched route.

use std::path::Path;
use std::sync::Arc;

use tokio::sync::RwLock;

use crate::archive::{ArchiveHandler, ArchiveOpenError};
use crate::logger;

/// A named binding between a URL prefix and one open archive
struct Mount {
    name: String,
    handler: Arc<ArchiveHandler>,
}

/// Thread-safe registry of mounted archives
pub struct MountRegistry {
    // Insertion order is preserved so the root index is deterministic
    mounts: RwLock<Vec<Mount>>,
}

impl MountRegistry {
    pub const fn new() -> Self {
        Self {
            mounts: RwLock::const_new(Vec::new()),
        }
    }

    /// Mount `path` as `name`.
    ///
    /// Returns `Ok(false)` without side effects when the name is already
    /// mounted; the existing handler keeps serving. Opening happens off the
    /// lock on the blocking pool, so a slow archive open never stalls
    /// dispatch or other registry calls.
    pub async fn add(&self, name: &str, path: &str) -> Result<bool, ArchiveOpenError> {
        {
            let mounts = self.mounts.read().await;
            if mounts.iter().any(|m| m.name == name) {
                return Ok(false);
            }
        }

        let archive_path = Path::new(path).to_path_buf();
        let handler = tokio::task::spawn_blocking(move || ArchiveHandler::open(&archive_path))
            .await
            .map_err(|e| ArchiveOpenError::Io(std::io::Error::other(e)))??;

        let mut mounts = self.mounts.write().await;
        // Re-check: another caller may have won the name while we opened
        if mounts.iter().any(|m| m.name == name) {
            return Ok(false);
        }
        mounts.push(Mount {
            name: name.to_string(),
            handler: Arc::new(handler),
        });
        logger::log_mount_added(name, path);
        Ok(true)
    }

    /// Unmount `name`; a no-op if it is not mounted.
    ///
    /// The mount leaves the table before its handler reference is dropped,
    /// so no new request can reach a handler mid-teardown. The archive file
    /// closes when the last in-flight request releases its clone.
    pub async fn remove(&self, name: &str) {
        let removed = {
            let mut mounts = self.mounts.write().await;
            mounts
                .iter()
                .position(|m| m.name == name)
                .map(|index| mounts.remove(index))
        };
        if let Some(mount) = removed {
            logger::log_mount_removed(&mount.name);
            drop(mount);
        }
    }

    /// Snapshot of mounted names in insertion order
    pub async fn list(&self) -> Vec<String> {
        self.mounts
            .read()
            .await
            .iter()
            .map(|m| m.name.clone())
            .collect()
    }

    /// Snapshot of mounted names and their archive paths, insertion order
    pub async fn snapshot(&self) -> Vec<(String, std::path::PathBuf)> {
        self.mounts
            .read()
            .await
            .iter()
            .map(|m| (m.name.clone(), m.handler.path().to_path_buf()))
            .collect()
    }

    /// Number of mounted archives
    pub async fn len(&self) -> usize {
        self.mounts.read().await.len()
    }

    /// Resolve a mount name to its handler for request dispatch
    pub async fn lookup(&self, name: &str) -> Option<Arc<ArchiveHandler>> {
        self.mounts
            .read()
            .await
            .iter()
            .find(|m| m.name == name)
            .map(|m| Arc::clone(&m.handler))
    }
}

impl Default for MountRegistry {
    fn default() -> Self {
        Self::new()
    }
}
