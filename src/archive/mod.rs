//! Archive access module
//!
//! Read-only access to zip archives: opening, entry lookup, content reads,
//! and on-demand directory listing synthesis.

pub mod handler;
pub mod listing;

pub use handler::{ArchiveHandler, ArchiveOpenError, EntryMeta};
