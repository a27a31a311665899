use dotenvy::dotenv;
use log::info;
use std::sync::Arc;
use tower_http::cors::CorsLayer;

use practiceserver::config::AppConfig;
use practiceserver::directory::StaticDirectory;
use practiceserver::incidents::service::IncidentService;
use practiceserver::incidents::store::MemoryStore;
use practiceserver::incidents;
use practiceserver::shared::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    let config = AppConfig::load()?;
    let directory = Arc::new(StaticDirectory::from_users(&config.directory_users));
    let service = Arc::new(IncidentService::new(
        Box::new(MemoryStore::new()),
        directory,
        config.incidents.clone(),
    ));
    let state = Arc::new(AppState::new(config, service));

    let app = incidents::configure_incidents_routes()
        .layer(CorsLayer::permissive())
        .with_state(state.clone());

    let addr = format!(
        "{}:{}",
        state.config.server.host, state.config.server.port
    );
    info!("Incident service listening on {addr}");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
