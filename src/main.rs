use std::net::SocketAddr;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use axum::Router;
use clap::Parser;

use jukebox::auth::{hash_password, Auth};
use jukebox::enrich::Enricher;
use jukebox::http::{self, library::LibraryProxy, state::AppState};
use jukebox::identity::{resolve_host_address, HostAddress};
use jukebox::queue::{QueueController, QueueStore};
use jukebox::{cli, config};

/// Set to true once the first Ctrl+C is received. Second Ctrl+C force-exits.
static SHUTTING_DOWN: AtomicBool = AtomicBool::new(false);

/// Wait for the first Ctrl+C (graceful shutdown).
/// On second Ctrl+C (during shutdown wait), force-exits immediately.
async fn wait_for_shutdown() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to install Ctrl+C handler: {}", e);
        std::future::pending::<()>().await;
    }
    if SHUTTING_DOWN.swap(true, Ordering::SeqCst) {
        eprintln!("\njukebox: forced exit");
        std::process::exit(1);
    }
}

fn get_hostname() -> String {
    hostname::get()
        .ok()
        .and_then(|os| os.into_string().ok())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "localhost".to_string())
}

fn fail(message: impl std::fmt::Display) -> ! {
    eprintln!("error: {message}");
    std::process::exit(1);
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"))
        )
        .init();

    let args = cli::Args::parse();

    if let Some(password) = args.hash_password.as_deref() {
        match hash_password(password) {
            Ok(hash) => {
                println!("{hash}");
                return;
            }
            Err(e) => fail(format!("failed to hash password: {e}")),
        }
    }

    // A config file that exists but cannot be loaded is fatal.
    let file_config = match config::find_config_file(args.config.as_deref()) {
        Some(path) => match config::load_config(&path) {
            Ok(cfg) => {
                tracing::debug!("Loaded config from {}", path.display());
                Some(cfg)
            }
            Err(e) => fail(format!("{} ({})", e, path.display())),
        },
        None => None,
    };

    let config = config::Config::resolve(file_config, &args).unwrap_or_else(|e| fail(e));

    let host = resolve_host_address(&config.host_ip).await;

    let enricher = Enricher::online(config.enrichment_timeout)
        .unwrap_or_else(|e| fail(format!("failed to build HTTP client: {e}")));

    let auth = match config.credentials.clone() {
        Some(credentials) => {
            tracing::info!("Login authentication enabled");
            Auth::required(credentials, config.secure_cookie)
        }
        None => {
            tracing::info!("Login authentication disabled (open access)");
            Auth::open()
        }
    };

    let library = config.library_url.as_deref().map(|url| {
        LibraryProxy::with_default_client(url)
            .unwrap_or_else(|e| fail(format!("failed to build library client: {e}")))
    });

    if config.trust_proxy {
        tracing::warn!("Trust proxy enabled: caller addresses come from X-Forwarded-For");
    }

    let public_dir = if config.public_dir.is_dir() {
        tracing::info!("Serving static files from {}", config.public_dir.display());
        Some(config.public_dir.clone())
    } else {
        tracing::warn!(
            "Public directory {} not found, serving the API only",
            config.public_dir.display()
        );
        None
    };

    let state = AppState {
        queue: QueueController::new(Arc::new(QueueStore::new()), host.clone()),
        enricher: Arc::new(enricher),
        auth: Arc::new(auth),
        trust_proxy: config.trust_proxy,
        library,
        public_dir,
    };
    let app = http::build_router(state);

    log_banner(&config, &host);

    if config.localhost {
        run_localhost(config.port, app).await;
    } else {
        run_dual_stack(config.port, app).await;
    }
}

fn log_banner(config: &config::Config, host: &HostAddress) {
    let shown = match host {
        HostAddress::Ip(ip) if ip.to_string() != config.host_ip => {
            format!("{} ({})", config.host_ip, ip)
        }
        _ => config.host_ip.clone(),
    };
    tracing::info!("Jukebox running at http://localhost:{}", config.port);
    tracing::info!("Host (player) locked to: {}", shown);
    if !config.localhost {
        tracing::info!("LAN access: http://{}.local:{}", get_hostname(), config.port);
    }
}

/// Serve `app` until the first Ctrl+C, then drain in-flight requests.
async fn serve(listener: tokio::net::TcpListener, app: Router, mut shutdown_rx: tokio::sync::broadcast::Receiver<()>) {
    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
        .with_graceful_shutdown(async move { let _ = shutdown_rx.recv().await; })
        .await
        .unwrap_or_else(|e| tracing::error!("HTTP server error: {}", e));
}

/// Run a localhost-only HTTP server and wait for graceful shutdown.
async fn run_localhost(port: u16, app: Router) {
    let addr = format!("127.0.0.1:{}", port);
    tracing::info!("Listening on http://{} (localhost only)", addr);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .unwrap_or_else(|e| fail(format!("failed to bind {}: {}", addr, e)));

    let (shutdown_tx, _) = tokio::sync::broadcast::channel::<()>(4);
    let server = tokio::spawn(serve(listener, app, shutdown_tx.subscribe()));

    wait_for_shutdown().await;
    tracing::info!("Shutting down…");
    let _ = shutdown_tx.send(());
    let _ = tokio::time::timeout(std::time::Duration::from_secs(5), server).await;
    tracing::info!("Goodbye.");
}

/// Run dual-stack (IPv4 + IPv6) HTTP servers and wait for graceful shutdown.
async fn run_dual_stack(port: u16, app: Router) {
    // Separate IPv4 (0.0.0.0) and IPv6 (:::) sockets. IPV6_V6ONLY=true keeps the
    // IPv6 socket from claiming the IPv4 port on Linux, where it defaults to false.
    let ipv4_addr = format!("0.0.0.0:{}", port);
    tracing::info!("Listening on port {} (IPv4 + IPv6)", port);

    let ipv4_listener = tokio::net::TcpListener::bind(&ipv4_addr)
        .await
        .unwrap_or_else(|e| fail(format!("failed to bind IPv4 {}: {}", ipv4_addr, e)));

    let (shutdown_tx, _) = tokio::sync::broadcast::channel::<()>(4);
    let mut servers = vec![tokio::spawn(serve(ipv4_listener, app.clone(), shutdown_tx.subscribe()))];

    // IPv6 is best-effort.
    match bind_ipv6(port) {
        Ok(listener) => servers.push(tokio::spawn(serve(listener, app, shutdown_tx.subscribe()))),
        Err(e) => tracing::warn!("IPv6 listener unavailable on :::{}: {}; IPv4 only", port, e),
    }

    wait_for_shutdown().await;
    tracing::info!("Shutting down…");
    let _ = shutdown_tx.send(());
    for server in servers {
        let _ = tokio::time::timeout(std::time::Duration::from_secs(5), server).await;
    }
    tracing::info!("Goodbye.");
}

fn bind_ipv6(port: u16) -> std::io::Result<tokio::net::TcpListener> {
    let addr = SocketAddr::from((std::net::Ipv6Addr::UNSPECIFIED, port));
    let socket = socket2::Socket::new(
        socket2::Domain::IPV6,
        socket2::Type::STREAM,
        Some(socket2::Protocol::TCP),
    )?;
    if let Err(e) = socket.set_only_v6(true) {
        tracing::warn!("Could not set IPV6_V6ONLY: {} -- dual-bind may fail on Linux", e);
    }
    socket.set_reuse_address(true)?;
    socket.set_nonblocking(true)?;
    socket.bind(&addr.into())?;
    socket.listen(1024)?;
    let std_listener: std::net::TcpListener = socket.into();
    tokio::net::TcpListener::from_std(std_listener)
}
