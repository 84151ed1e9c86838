use anyhow::Result;
use clap::Parser;
use std::sync::Arc;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use tarang_server::catalog::{CatalogClient, DEFAULT_BASE_URL};
use tarang_server::library::SqliteLibraryStore;
use tarang_server::server::{run_server, ServerConfig, ServerState};
use tarang_server::user::SqliteUserStore;

#[derive(Parser, Debug)]
#[command(version, about)]
struct CliArgs {
    /// Path of the library database file.
    #[arg(long, default_value = "library.db")]
    library_db: String,

    /// Path of the users database file.
    #[arg(long, default_value = "users.db")]
    user_db: String,

    #[arg(long, default_value_t = 3001)]
    port: u16,

    /// Base url of the upstream catalog provider.
    #[arg(long, default_value = DEFAULT_BASE_URL)]
    catalog_url: String,

    /// Timeout for catalog provider requests, in seconds.
    #[arg(long, default_value_t = 10)]
    catalog_timeout_sec: u64,

    /// Directory served under /static. Disabled when not set.
    #[arg(long)]
    static_dir: Option<String>,

    /// Log every request and its response status.
    #[arg(long)]
    log_requests: bool,
}

fn init_logging() {
    let filter = std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
    tracing_subscriber::registry()
        .with(EnvFilter::new(filter))
        .with(tracing_subscriber::fmt::layer())
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    init_logging();
    let args = CliArgs::parse();

    let library = Arc::new(SqliteLibraryStore::new(&args.library_db)?);
    let user_store = Arc::new(SqliteUserStore::new(&args.user_db)?);
    let catalog = Arc::new(CatalogClient::new(
        args.catalog_url,
        args.catalog_timeout_sec,
    ));
    let config = ServerConfig {
        port: args.port,
        log_requests: args.log_requests,
        static_dir_path: args.static_dir,
    };

    run_server(ServerState::new(config, library, user_store, catalog)).await
}
