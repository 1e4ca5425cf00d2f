use std::sync::atomic::AtomicUsize;
use std::sync::Arc;

use tokio::sync::Notify;

mod api;
mod archive;
mod config;
mod handler;
mod http;
mod logger;
mod registry;
mod server;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cfg = config::Config::load()?;
    logger::init(&cfg)?;

    let mut runtime_builder = tokio::runtime::Builder::new_multi_thread();
    runtime_builder.enable_all();

    if let Some(workers) = cfg.server.workers {
        runtime_builder.worker_threads(workers);
        println!("[CONFIG] Using {workers} worker threads");
    }

    let runtime = runtime_builder.build()?;
    runtime.block_on(async_main(cfg))
}

async fn async_main(cfg: config::Config) -> Result<(), Box<dyn std::error::Error>> {
    // Validate both addresses before anything is spawned
    let app_addr = cfg.get_socket_addr()?;
    let api_addr = cfg.get_api_socket_addr()?;
    println!("[CONFIG] Archive server: {app_addr}");
    println!("[CONFIG] Management API: {api_addr}");

    let state = Arc::new(config::AppState::new(cfg));

    // Mount archives listed in configuration; a broken archive is reported
    // and skipped, it never blocks startup
    for mount in state.config.mounts.clone() {
        if !config::is_valid_mount_name(&mount.name) {
            logger::log_warning(&format!(
                "Skipping configured mount with invalid name '{}'",
                mount.name
            ));
            continue;
        }
        match state.registry.add(&mount.name, &mount.path).await {
            Ok(true) => {}
            Ok(false) => logger::log_warning(&format!(
                "Duplicate mount '{}' in configuration ignored",
                mount.name
            )),
            Err(e) => logger::log_error(&format!("Cannot mount '{}': {e}", mount.name)),
        }
    }

    // Management API listener, always on
    let api_listener = server::create_reusable_listener(api_addr)?;
    let api_shutdown = Arc::new(Notify::new());
    let api_connections = Arc::new(AtomicUsize::new(0));
    tokio::spawn(server::run_accept_loop(
        api_listener,
        Arc::clone(&state),
        api_connections,
        Arc::clone(&api_shutdown),
        true,
    ));

    println!("[API] Management API running on: http://{api_addr}");
    println!("  - GET    http://{api_addr}/v1/mounts        (list mounts)");
    println!("  - POST   http://{api_addr}/v1/mounts        (add mount)");
    println!("  - DELETE http://{api_addr}/v1/mounts/NAME   (remove mount)");
    println!("  - POST   http://{api_addr}/v1/server/start  (start archive listener)");
    println!("  - POST   http://{api_addr}/v1/server/stop   (stop archive listener)");
    println!("  - GET    http://{api_addr}/v1/status        (server status)");

    // Archive listener, unless the operator wants to start it via the API
    if state.config.server.autostart {
        let host = state.config.server.host.clone();
        let port = state.config.server.port;
        state.server.start(&state, &host, port).await?;
    } else {
        println!("[INFO] Autostart disabled; start the archive listener via the API");
    }

    server::signal::wait_for_shutdown().await;

    state.server.stop().await;
    api_shutdown.notify_one();
    Ok(())
}
