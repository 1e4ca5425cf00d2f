//! Request handler module
//!
//! Method/path guarding, mount dispatch, and the per-request exchange
//! wrapper for the archive listener.

pub mod exchange;
pub mod root;
pub mod router;

// Re-export main entry point
pub use router::handle_request;
