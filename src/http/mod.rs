//! HTTP protocol layer module
//!
//! Provides HTTP response building primitives, decoupled from archive logic.

pub mod response;

// Re-export commonly used builders
pub use response::{build_404_response, build_405_response, build_body_response};
