use std::fs;
use std::sync::Arc;

use anyhow::bail;
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use auditdesk::config::ServerConfig;
use auditdesk::server::{AppState, create_router};
use auditdesk::store::{SqliteStore, Store};

#[derive(Parser)]
#[command(name = "auditdesk")]
#[command(about = "An audit findings tracker", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the database
    Init {
        /// Data directory for the database
        #[arg(long, default_value = "./data")]
        data_dir: String,
    },

    /// Start the server
    Serve {
        /// Host to bind to
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// Port to bind to
        #[arg(long, short, default_value = "8080")]
        port: u16,

        /// Data directory for the database
        #[arg(long, default_value = "./data")]
        data_dir: String,

        /// Public base URL for external access (e.g., "https://audit.example.com").
        /// Used when building fill-in links for external parties.
        #[arg(long)]
        public_base_url: Option<String>,
    },
}

fn run_init(data_dir: String) -> anyhow::Result<()> {
    let data_path: std::path::PathBuf = data_dir.into();
    fs::create_dir_all(&data_path)?;

    let db_path = data_path.join("auditdesk.db");
    let store = SqliteStore::new(&db_path)?;
    store.initialize()?;

    println!("Database initialized at {}", db_path.display());
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("auditdesk=info".parse()?))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Init { data_dir } => {
            run_init(data_dir)?;
        }
        Commands::Serve {
            host,
            port,
            data_dir,
            public_base_url,
        } => {
            let config = ServerConfig {
                host,
                port,
                data_dir: data_dir.into(),
                public_base_url,
            };

            if !config.db_path().exists() {
                bail!("Server not initialized. Run 'auditdesk init' first to create the database.");
            }

            let store = SqliteStore::new(config.db_path())?;
            store.initialize()?;

            let state = Arc::new(AppState {
                store: Arc::new(store),
                public_base_url: config.public_base_url.clone(),
            });

            let app = create_router(state);
            let addr = config.socket_addr()?;

            info!("Starting server on {}", addr);

            let listener = tokio::net::TcpListener::bind(addr).await?;
            axum::serve(listener, app).await?;
        }
    }

    Ok(())
}
