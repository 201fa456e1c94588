use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use sports_catalog::api::{router, ApiState};
use sports_catalog::catalog::Catalog;
use sports_catalog::config::Config;
use sports_catalog::db;
use sports_catalog::error::Result;

#[tokio::main]
async fn main() {
    let cfg = match Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Config error: {e}");
            std::process::exit(1);
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&cfg.log_level))
        .init();

    if let Err(e) = run(cfg).await {
        error!("Fatal error: {e}");
        std::process::exit(1);
    }
}

async fn run(cfg: Config) -> Result<()> {
    // --- Database setup ---
    let pool = db::connect(&cfg.db_path, cfg.db_max_connections).await?;

    // --- HTTP API server ---
    let catalog = Catalog::new(pool, cfg.catalog());
    if cfg.slug_unique_on_update {
        info!("Slug uniqueness is enforced on rename");
    }
    let app = router(ApiState { catalog });
    let bind_addr = format!("0.0.0.0:{}", cfg.api_port);
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    info!("HTTP API listening on {bind_addr}");

    axum::serve(listener, app).await?;

    Ok(())
}
