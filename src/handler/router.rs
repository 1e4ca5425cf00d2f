//! Request routing dispatch module
//!
//! Entry point for archive requests: method/path guard, mount prefix
//! parsing, and dispatch to the root index or an archive handler.

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;

use http_body_util::Full;
use hyper::body::Bytes;
use hyper::{Method, Request, Response};

use crate::config::AppState;
use crate::handler::exchange::Exchange;
use crate::handler::root;
use crate::http;
use crate::logger;

/// Main entry point for archive listener requests
pub async fn handle_request(
    req: Request<hyper::body::Incoming>,
    state: Arc<AppState>,
    peer_addr: SocketAddr,
) -> Result<Response<Full<Bytes>>, Infallible> {
    let method = req.method().clone();
    let path = req.uri().path().to_string();

    let response = dispatch(&method, &path, &state).await;

    if state
        .cached_access_log
        .load(std::sync::atomic::Ordering::Relaxed)
    {
        let mut entry = logger::AccessLogEntry::new(
            peer_addr.ip().to_string(),
            method.to_string(),
            path,
        );
        entry.status = response.status().as_u16();
        entry.body_bytes = response
            .headers()
            .get("Content-Length")
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.parse().ok())
            .unwrap_or(0);
        logger::log_access(&entry);
    }

    Ok(response)
}

/// Guard and route one request.
///
/// Only GET requests with an absolute path reach resolution; everything
/// else is answered 405 with an empty body. Resolution errors are logged
/// here and converted into whatever response the exchange has accumulated;
/// they never propagate to the connection task.
pub async fn dispatch(method: &Method, path: &str, state: &Arc<AppState>) -> Response<Full<Bytes>> {
    if *method != Method::GET || !path.starts_with('/') {
        logger::log_warning(&format!("Invalid request, method: {method}, path: {path}"));
        return http::build_405_response();
    }

    if path == "/" {
        return root::serve_index(state).await;
    }

    // The first path segment names the mount; the remainder (possibly
    // empty) is resolved inside the archive
    let rest = &path[1..];
    let (mount_name, sub_path) = match rest.find('/') {
        Some(slash) => (&rest[..slash], &rest[slash + 1..]),
        None => (rest, ""),
    };

    let Some(archive) = state.registry.lookup(mount_name).await else {
        // Unregistered prefix: same unmatched-route 404 the exchange
        // default produces
        return http::build_404_response();
    };

    // Decompression blocks; run it on the blocking pool with the registry
    // lock already released
    let sub_path = sub_path.to_string();
    let request_path = path.to_string();
    let resolved = tokio::task::spawn_blocking(move || {
        let mut exchange = Exchange::new();
        let result = archive.resolve(&sub_path, &mut exchange);
        (exchange, result)
    })
    .await;

    match resolved {
        Ok((exchange, Ok(()))) => exchange.into_response(),
        Ok((exchange, Err(e))) => {
            // The request is abandoned with whatever was accumulated; a
            // partial response is acceptable and the listener keeps running
            logger::log_request_error(&request_path, &e);
            exchange.into_response()
        }
        Err(e) => {
            logger::log_error(&format!("Resolution task failed for {request_path}: {e}"));
            http::build_404_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Config, LoggingConfig, PerformanceConfig, ServerConfig};
    use http_body_util::BodyExt;
    use hyper::StatusCode;
    use std::fs::File;
    use std::io::Write;
    use std::path::Path;
    use zip::write::SimpleFileOptions;
    use zip::ZipWriter;

    fn test_config() -> Config {
        Config {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 0,
                api_host: "127.0.0.1".to_string(),
                api_port: 0,
                workers: None,
                autostart: false,
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                access_log: false,
                access_log_file: None,
                error_log_file: None,
            },
            performance: PerformanceConfig {
                keep_alive_timeout: 0,
                read_timeout: 5,
                write_timeout: 5,
                max_connections: None,
            },
            mounts: Vec::new(),
        }
    }

    fn write_archive(dir: &Path) -> String {
        let path = dir.join("demo.zip");
        let mut writer = ZipWriter::new(File::create(&path).unwrap());
        let options = SimpleFileOptions::default();
        writer.start_file("hello.txt", options).unwrap();
        writer.write_all(b"hi there").unwrap();
        writer.start_file("sub/nested.txt", options).unwrap();
        writer.write_all(b"deep").unwrap();
        writer.finish().unwrap();
        path.to_str().unwrap().to_string()
    }

    async fn state_with_mount(dir: &Path) -> Arc<AppState> {
        let state = Arc::new(AppState::new(test_config()));
        state
            .registry
            .add("demo", &write_archive(dir))
            .await
            .unwrap();
        state
    }

    async fn body_of(response: Response<Full<Bytes>>) -> Vec<u8> {
        response
            .into_body()
            .collect()
            .await
            .unwrap()
            .to_bytes()
            .to_vec()
    }

    #[tokio::test]
    async fn test_non_get_is_405_with_empty_body() {
        let dir = tempfile::tempdir().unwrap();
        let state = state_with_mount(dir.path()).await;

        let response = dispatch(&Method::POST, "/demo/hello.txt", &state).await;
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert!(body_of(response).await.is_empty());

        let response = dispatch(&Method::DELETE, "/", &state).await;
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    }

    #[tokio::test]
    async fn test_file_content_is_byte_exact() {
        let dir = tempfile::tempdir().unwrap();
        let state = state_with_mount(dir.path()).await;

        let response = dispatch(&Method::GET, "/demo/hello.txt", &state).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_of(response).await, b"hi there");

        let response = dispatch(&Method::GET, "/demo/sub/nested.txt", &state).await;
        assert_eq!(body_of(response).await, b"deep");
    }

    #[tokio::test]
    async fn test_mount_prefix_without_slash_lists_archive_root() {
        let dir = tempfile::tempdir().unwrap();
        let state = state_with_mount(dir.path()).await;

        for path in ["/demo", "/demo/"] {
            let response = dispatch(&Method::GET, path, &state).await;
            assert_eq!(response.status(), StatusCode::OK);
            let body = String::from_utf8(body_of(response).await).unwrap();
            assert!(body.contains("hello.txt"), "listing for {path}");
            assert!(body.contains("sub/"), "listing for {path}");
        }
    }

    #[tokio::test]
    async fn test_missing_entry_is_404_with_empty_body() {
        let dir = tempfile::tempdir().unwrap();
        let state = state_with_mount(dir.path()).await;

        let response = dispatch(&Method::GET, "/demo/absent.txt", &state).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert!(body_of(response).await.is_empty());
    }

    #[tokio::test]
    async fn test_unknown_mount_is_404() {
        let dir = tempfile::tempdir().unwrap();
        let state = state_with_mount(dir.path()).await;

        let response = dispatch(&Method::GET, "/other/file.txt", &state).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_removed_mount_routes_like_unknown() {
        let dir = tempfile::tempdir().unwrap();
        let state = state_with_mount(dir.path()).await;

        state.registry.remove("demo").await;
        let response = dispatch(&Method::GET, "/demo/hello.txt", &state).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert!(body_of(response).await.is_empty());
    }

    #[tokio::test]
    async fn test_root_index_lists_mounts() {
        let dir = tempfile::tempdir().unwrap();
        let state = state_with_mount(dir.path()).await;

        let response = dispatch(&Method::GET, "/", &state).await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = String::from_utf8(body_of(response).await).unwrap();
        assert!(body.contains("<a href='demo/'>demo</a>"));
    }

    #[tokio::test]
    async fn test_root_index_placeholder_when_empty() {
        let state = Arc::new(AppState::new(test_config()));
        let response = dispatch(&Method::GET, "/", &state).await;
        let body = String::from_utf8(body_of(response).await).unwrap();
        assert!(body.contains("No archives mounted"));
    }
}
