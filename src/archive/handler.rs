//! Archive handler module
//!
//! One handler owns one open zip archive for its whole lifetime. Entry
//! metadata is snapshotted when the archive is opened; content is
//! decompressed on demand per request. The underlying `ZipArchive` needs
//! exclusive access while decompressing, so content reads serialize on a
//! per-archive mutex. No registry-wide lock is ever held here.

use std::collections::BTreeSet;
use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use hyper::StatusCode;
use zip::result::ZipError;
use zip::ZipArchive;

use super::listing;
use crate::handler::exchange::{Exchange, CONTENT_TYPE_BINARY, CONTENT_TYPE_HTML};

/// Failure to open a file as a zip archive
#[derive(Debug)]
pub enum ArchiveOpenError {
    /// The file could not be opened or read
    Io(io::Error),
    /// The file is not a valid zip archive
    Invalid(ZipError),
}

impl std::fmt::Display for ArchiveOpenError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(e) => write!(f, "cannot open archive: {e}"),
            Self::Invalid(e) => write!(f, "not a valid zip archive: {e}"),
        }
    }
}

impl std::error::Error for ArchiveOpenError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            Self::Invalid(e) => Some(e),
        }
    }
}

impl From<io::Error> for ArchiveOpenError {
    fn from(e: io::Error) -> Self {
        Self::Io(e)
    }
}

impl From<ZipError> for ArchiveOpenError {
    fn from(e: ZipError) -> Self {
        Self::Invalid(e)
    }
}

/// Immutable snapshot of one record in the archive's table of contents
#[derive(Debug, Clone)]
pub struct EntryMeta {
    /// Entry name as stored: forward-slash separated, no leading slash
    pub name: String,
    /// Directory entries carry a trailing slash in the archive
    pub is_dir: bool,
}

/// Read-only handler for one open zip archive
pub struct ArchiveHandler {
    path: PathBuf,
    entries: Vec<EntryMeta>,
    archive: Mutex<ZipArchive<File>>,
}

impl ArchiveHandler {
    /// Open `path` as a zip archive and snapshot its table of contents
    pub fn open(path: &Path) -> Result<Self, ArchiveOpenError> {
        let file = File::open(path).map_err(ArchiveOpenError::Io)?;
        let mut archive = ZipArchive::new(file)?;

        let mut entries = Vec::with_capacity(archive.len());
        for index in 0..archive.len() {
            // Raw access reads metadata without touching compressed content
            let entry = archive.by_index_raw(index)?;
            entries.push(EntryMeta {
                name: entry.name().to_string(),
                is_dir: entry.is_dir(),
            });
        }

        Ok(Self {
            path: path.to_path_buf(),
            entries,
            archive: Mutex::new(archive),
        })
    }

    /// Filesystem path this handler was opened from
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Iterate the stored entry names
    pub fn entry_names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.name.as_str())
    }

    /// Look up an entry by exact name.
    ///
    /// Falls back to the `name/` directory form when the exact name misses,
    /// so a directory can be found without its trailing slash. No other
    /// normalization is applied: `..`, `.`, and repeated slashes match only
    /// if stored literally.
    pub fn find_entry(&self, name: &str) -> Option<&EntryMeta> {
        self.entries
            .iter()
            .find(|e| e.name == name)
            .or_else(|| {
                self.entries
                    .iter()
                    .find(|e| e.is_dir && e.name.len() == name.len() + 1 && e.name.starts_with(name))
            })
    }

    /// Decompress one entry's content in full.
    ///
    /// Each call is an independent read; concurrent requests never share a
    /// content stream.
    pub fn read_entry(&self, name: &str) -> io::Result<Vec<u8>> {
        let mut archive = self
            .archive
            .lock()
            .map_err(|_| io::Error::other("archive lock poisoned"))?;
        let mut entry = archive.by_name(name).map_err(io::Error::other)?;
        let mut content = Vec::with_capacity(usize::try_from(entry.size()).unwrap_or(0));
        entry.read_to_end(&mut content)?;
        Ok(content)
    }

    /// Immediate children of a directory prefix within this archive
    pub fn list_children(&self, dir: &str) -> BTreeSet<String> {
        listing::child_names(self.entry_names(), dir)
    }

    /// Resolve a sub-path (the request path with the mount prefix stripped)
    /// into either a listing page or raw entry content.
    ///
    /// A lookup miss writes nothing, leaving the exchange to default to 404.
    /// This call blocks on decompression and must not run on the async
    /// executor directly.
    pub fn resolve(&self, path: &str, exchange: &mut Exchange) -> io::Result<()> {
        if path.is_empty() || path.ends_with('/') {
            self.write_listing(path, exchange);
            return Ok(());
        }

        match self.find_entry(path) {
            None => Ok(()),
            Some(entry) if entry.is_dir => {
                // A directory found by exact lookup lists like a trailing
                // slash request for the same path
                self.write_listing(path, exchange);
                Ok(())
            }
            Some(entry) => {
                let name = entry.name.clone();
                let content = self.read_entry(&name)?;
                exchange
                    .begin_response(StatusCode::OK, CONTENT_TYPE_BINARY)
                    .extend_from_slice(&content);
                Ok(())
            }
        }
    }

    fn write_listing(&self, dir: &str, exchange: &mut Exchange) {
        let page = listing::render_listing(&self.list_children(dir));
        exchange
            .begin_response(StatusCode::OK, CONTENT_TYPE_HTML)
            .extend_from_slice(page.as_bytes());
    }
}

impl std::fmt::Debug for ArchiveHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArchiveHandler")
            .field("path", &self.path)
            .field("entries", &self.entries.len())
            .finish_non_exhaustive()
    }
}
