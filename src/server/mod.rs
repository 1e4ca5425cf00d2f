// Server module entry
// Listener lifecycle (start/stop), accept loop, and connection handling

pub mod connection;
pub mod listener;
pub mod signal;

pub use listener::create_reusable_listener;

use std::io;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;
use tokio::sync::{Mutex, Notify};
use tokio::task::JoinHandle;

use crate::config::AppState;
use crate::logger;

/// Grace period for in-flight requests when stopping the listener
const STOP_GRACE: Duration = Duration::from_secs(2);

/// Failure to bring the archive listener up
#[derive(Debug)]
pub enum BindError {
    /// Host/port did not form a valid socket address
    InvalidAddress(String),
    /// The socket could not be bound
    Bind { addr: SocketAddr, source: io::Error },
}

impl std::fmt::Display for BindError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidAddress(addr) => write!(f, "invalid listen address '{addr}'"),
            Self::Bind { addr, source } => write!(f, "cannot bind {addr}: {source}"),
        }
    }
}

impl std::error::Error for BindError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::InvalidAddress(_) => None,
            Self::Bind { source, .. } => Some(source),
        }
    }
}

/// A running listener: its accept task plus the knobs to tear it down
struct ListenerHandle {
    addr: SocketAddr,
    shutdown: Arc<Notify>,
    active: Arc<AtomicUsize>,
    task: JoinHandle<()>,
}

/// Lifecycle control for the archive listener.
///
/// Two states: stopped (no listener) and running. `start` is idempotent and
/// leaves the state stopped when binding fails; `stop` tears the listener
/// down with a bounded grace period and is a no-op when already stopped.
pub struct ServerControl {
    handle: Mutex<Option<ListenerHandle>>,
}

impl ServerControl {
    pub const fn new() -> Self {
        Self {
            handle: Mutex::const_new(None),
        }
    }

    /// Bind and start accepting on `host:port`. A no-op when already running.
    pub async fn start(
        &self,
        state: &Arc<AppState>,
        host: &str,
        port: u16,
    ) -> Result<(), BindError> {
        let mut guard = self.handle.lock().await;
        if let Some(handle) = guard.as_ref() {
            logger::log_warning(&format!("Server already running on {}", handle.addr));
            return Ok(());
        }

        let addr: SocketAddr = format!("{host}:{port}")
            .parse()
            .map_err(|_| BindError::InvalidAddress(format!("{host}:{port}")))?;

        let tcp_listener = create_reusable_listener(addr).map_err(|source| {
            logger::log_bind_failed(&addr, &source);
            BindError::Bind { addr, source }
        })?;
        // With port 0 the kernel picks the port; report the real one
        let addr = tcp_listener.local_addr().unwrap_or(addr);

        let shutdown = Arc::new(Notify::new());
        let active = Arc::new(AtomicUsize::new(0));
        let task = tokio::spawn(run_accept_loop(
            tcp_listener,
            Arc::clone(state),
            Arc::clone(&active),
            Arc::clone(&shutdown),
            false,
        ));

        *guard = Some(ListenerHandle {
            addr,
            shutdown,
            active,
            task,
        });
        logger::log_server_start(&addr);
        Ok(())
    }

    /// Stop accepting and wait up to the grace period for in-flight
    /// requests. A no-op when already stopped.
    pub async fn stop(&self) {
        let Some(handle) = self.handle.lock().await.take() else {
            return;
        };

        handle.shutdown.notify_one();
        if handle.task.await.is_err() {
            logger::log_error("Accept loop ended abnormally during stop");
        }

        // Listener is closed; give in-flight requests a bounded grace period
        let deadline = tokio::time::Instant::now() + STOP_GRACE;
        while handle.active.load(Ordering::SeqCst) > 0 && tokio::time::Instant::now() < deadline {
            tokio::time::sleep(Duration::from_millis(50)).await;
        }

        let remaining = handle.active.load(Ordering::SeqCst);
        if remaining > 0 {
            logger::log_warning(&format!(
                "Stopped with {remaining} connection(s) still in flight"
            ));
        }
        logger::log_server_stop(&handle.addr);
    }

    /// Address of the running listener, or `None` when stopped
    pub async fn running_addr(&self) -> Option<SocketAddr> {
        self.handle.lock().await.as_ref().map(|h| h.addr)
    }
}

impl Default for ServerControl {
    fn default() -> Self {
        Self::new()
    }
}

/// Accept connections until the shutdown signal fires.
///
/// Used for both the archive listener and the management API listener; the
/// flag selects which service handles the requests.
pub async fn run_accept_loop(
    tcp_listener: TcpListener,
    state: Arc<AppState>,
    active: Arc<AtomicUsize>,
    shutdown: Arc<Notify>,
    is_api_server: bool,
) {
    loop {
        tokio::select! {
            accept_result = tcp_listener.accept() => {
                match accept_result {
                    Ok((stream, peer_addr)) => {
                        connection::accept_connection(
                            stream,
                            peer_addr,
                            &state,
                            &active,
                            !is_api_server,
                            is_api_server,
                        );
                    }
                    Err(e) => {
                        if is_api_server {
                            logger::log_api_error(&format!("Failed to accept connection: {e}"));
                        } else {
                            logger::log_error(&format!("Failed to accept connection: {e}"));
                        }
                    }
                }
            }

            () = shutdown.notified() => {
                break;
            }
        }
    }
    // Dropping the listener closes the accept socket; in-flight connection
    // tasks keep running until they finish or time out
    drop(tcp_listener);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Config, LoggingConfig, PerformanceConfig, ServerConfig};
    use std::fs::File;
    use std::io::Write as _;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
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
                autostart: true,
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

    async fn http_get(addr: SocketAddr, path: &str) -> (String, Vec<u8>) {
        let mut stream = tokio::net::TcpStream::connect(addr).await.unwrap();
        let request = format!("GET {path} HTTP/1.1\r\nHost: test\r\nConnection: close\r\n\r\n");
        stream.write_all(request.as_bytes()).await.unwrap();

        let mut raw = Vec::new();
        stream.read_to_end(&mut raw).await.unwrap();
        let split = raw
            .windows(4)
            .position(|w| w == b"\r\n\r\n")
            .expect("no header/body separator");
        let head = String::from_utf8_lossy(&raw[..split]).to_string();
        let body = raw[split + 4..].to_vec();
        (head, body)
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_start_is_idempotent_and_stop_releases_state() {
        let state = Arc::new(AppState::new(test_config()));

        state.server.start(&state, "127.0.0.1", 0).await.unwrap();
        let addr = state.server.running_addr().await.unwrap();

        // Second start is a no-op against the same listener
        state.server.start(&state, "127.0.0.1", 0).await.unwrap();
        assert_eq!(state.server.running_addr().await, Some(addr));

        state.server.stop().await;
        assert!(state.server.running_addr().await.is_none());

        // Stop again is a no-op; start works again afterwards
        state.server.stop().await;
        state.server.start(&state, "127.0.0.1", 0).await.unwrap();
        assert!(state.server.running_addr().await.is_some());
        state.server.stop().await;
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_invalid_host_fails_without_state_change() {
        let state = Arc::new(AppState::new(test_config()));
        let result = state.server.start(&state, "not a host", 8080).await;
        assert!(matches!(result, Err(BindError::InvalidAddress(_))));
        assert!(state.server.running_addr().await.is_none());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_serves_archive_over_loopback() {
        let dir = tempfile::tempdir().unwrap();
        let zip_path = dir.path().join("demo.zip");
        let mut writer = ZipWriter::new(File::create(&zip_path).unwrap());
        writer
            .start_file("hello.txt", SimpleFileOptions::default())
            .unwrap();
        writer.write_all(b"hello over http").unwrap();
        writer.finish().unwrap();

        let state = Arc::new(AppState::new(test_config()));
        state
            .registry
            .add("demo", zip_path.to_str().unwrap())
            .await
            .unwrap();
        state.server.start(&state, "127.0.0.1", 0).await.unwrap();
        let addr = state.server.running_addr().await.unwrap();

        // File content is byte-exact
        let (head, body) = http_get(addr, "/demo/hello.txt").await;
        assert!(head.starts_with("HTTP/1.1 200"));
        assert_eq!(body, b"hello over http");

        // Root index links the mount
        let (head, body) = http_get(addr, "/").await;
        assert!(head.starts_with("HTTP/1.1 200"));
        assert!(String::from_utf8_lossy(&body).contains("<a href='demo/'>demo</a>"));

        // Unknown mount prefix falls through to 404 with empty body
        let (head, body) = http_get(addr, "/gone/file.txt").await;
        assert!(head.starts_with("HTTP/1.1 404"));
        assert!(body.is_empty());

        state.server.stop().await;
    }
}
