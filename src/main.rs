use job_agent::api::{create_router, queue, AppState};
use job_agent::infrastructure::{init_tracing, AppConfig, Services};
use std::net::SocketAddr;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = AppConfig::from_env()?;
    init_tracing("api=debug,job_agent=debug,tower_http=debug", config.config.log.format);

    let redis_pool = queue::create_pool(&config.config.redis_url)?;
    info!("Redis pool initialized");

    let services = Services::build(&config).await?;
    let seeded = services.seed(&config.config.rag.seed_paths).await?;
    info!(seeded, "retrieval ready");

    let addr = SocketAddr::new(
        config.config.server.host.parse()?,
        config.config.server.port,
    );
    let state = AppState::new(redis_pool, config).with_services(&services);
    info!(inline = state.index_inline, "document indexing");
    let app = create_router(state);

    info!("API server listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
