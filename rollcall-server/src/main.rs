use anyhow::Context;
use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

// ri-utilizziamo le funzioni e strutture definite in lib.rs
use rollcall_server::{
    config::{Config, Entrypoint, Overrides},
    db::Database,
    routes, AppState,
};

/// Server degli utenti autorizzati: API JSON e front-end statico.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Modalità sviluppo: carica `.env` se presente e ascolta sulla 3000 di default
    #[arg(long)]
    dev: bool,

    /// Porta HTTP (sovrascrive PORT)
    #[arg(short, long)]
    port: Option<u16>,

    /// Cartella con la build del front-end (sovrascrive STATIC_DIR)
    #[arg(long)]
    static_dir: Option<PathBuf>,

    /// Cartella con gli asset pubblici (sovrascrive PUBLIC_DIR)
    #[arg(long)]
    public_dir: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // il .env va caricato prima di leggere RUST_LOG e la configurazione
    let dotenv = args.dev.then(dotenvy::dotenv);
    init_tracing();
    match dotenv {
        Some(Ok(path)) => info!("loaded environment from {}", path.display()),
        Some(Err(e)) => warn!("no .env loaded: {e}"),
        None => {}
    }

    let entry = if args.dev { Entrypoint::Dev } else { Entrypoint::Server };
    let overrides = Overrides {
        port: args.port,
        static_dir: args.static_dir,
        public_dir: args.public_dir,
    };
    let config = Config::load(entry, &overrides).context("load configuration")?;
    info!(profile = ?config.profile, "configuration: {:?}", config);

    // Connetti al database: senza connessione il server non parte
    let db = Database::connect_with_retry(&config.db.url(), &config.db.connect_opts())
        .await
        .context("connect to database")?;

    // Crea lo stato dell'applicazione condiviso
    let state = Arc::new(AppState::new(db));
    let app = routes::router(state, &config.assets);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("bind tcp listener")?;
    info!("running on port {}", config.port);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server shutdown")?;

    info!("server stopped");
    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,tower_http=debug"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("failed to install Ctrl+C handler: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut term) => {
                term.recv().await;
            }
            Err(e) => {
                warn!("failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("received Ctrl+C, shutting down"),
        _ = terminate => info!("received terminate signal, shutting down"),
    }
}
