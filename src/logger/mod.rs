//! Logger module
//!
//! Logging utilities for the archive server:
//! - Server lifecycle logging
//! - Access logging
//! - Mount add/remove events
//! - Error and warning logging with optional file targets

mod format;
pub mod writer;

pub use format::AccessLogEntry;

use crate::config::Config;
use std::net::SocketAddr;

/// Initialize the logger with configuration
///
/// Should be called once at application startup.
pub fn init(config: &Config) -> std::io::Result<()> {
    writer::init(
        config.logging.access_log_file.as_deref(),
        config.logging.error_log_file.as_deref(),
    )
}

/// Write to info/access log
fn write_info(message: &str) {
    match writer::get() {
        Some(w) => w.write_info(message),
        None => println!("{message}"),
    }
}

/// Write to error log
fn write_error(message: &str) {
    match writer::get() {
        Some(w) => w.write_error(message),
        None => eprintln!("{message}"),
    }
}

pub fn log_server_start(addr: &SocketAddr) {
    write_info("======================================");
    write_info("Archive server started");
    write_info(&format!("Listening on: http://{addr}"));
    write_info("======================================");
}

pub fn log_server_stop(addr: &SocketAddr) {
    write_info(&format!("Archive server on {addr} stopped"));
}

pub fn log_connection_accepted(peer_addr: &SocketAddr) {
    write_info(&format!("[Connection] Accepted from: {peer_addr}"));
}

pub fn log_connection_error(err: &impl std::fmt::Debug) {
    write_error(&format!("[ERROR] Failed to serve connection: {err:?}"));
}

pub fn log_error(message: &str) {
    write_error(&format!("[ERROR] {message}"));
}

pub fn log_api_error(message: &str) {
    write_error(&format!("[API ERROR] {message}"));
}

pub fn log_warning(message: &str) {
    write_error(&format!("[WARN] {message}"));
}

/// Log a request whose resolution failed with an I/O error.
/// The request is abandoned; the listener keeps running.
pub fn log_request_error(path: &str, err: &std::io::Error) {
    write_error(&format!("[ERROR] Error processing request {path}: {err}"));
}

/// Log formatted access log entry
pub fn log_access(entry: &AccessLogEntry) {
    write_info(&entry.format());
}

pub fn log_api_request(method: &str, path: &str, status: u16) {
    write_info(&format!("[API] {method} {path} - {status}"));
}

pub fn log_mount_added(name: &str, path: &str) {
    write_info(&format!("[Mount] Added '{name}' -> {path}"));
}

pub fn log_mount_removed(name: &str) {
    write_info(&format!("[Mount] Removed '{name}'"));
}

pub fn log_bind_failed(addr: &SocketAddr, err: &std::io::Error) {
    log_error(&format!("Failed to bind {addr}: {err}"));
}
