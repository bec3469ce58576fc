use database::DbRepository;
use engine::RiskService;
use std::net::SocketAddr;
use std::sync::Arc;

// Entry point for `cargo run -p web-server`: serves the query API alone,
// without the daily updater.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = configuration::load_config()?;
    let _guard = configuration::init_tracing(&config.logging)?;

    let pool = database::connect().await?;
    database::run_migrations(&pool).await?;
    let service = RiskService::new(Arc::new(DbRepository::new(pool)));

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    web_server::run_server(addr, service).await
}
