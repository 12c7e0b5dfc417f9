use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;
use article_rewriter::{
    config::Config,
    api::routes::create_router,
    AppState,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // Load configuration
    let config = Config::load()?;
    let server_addr = config.server_addr;
    if config.rewrite.api_key.is_none() {
        tracing::warn!(
            "{} is not set; rewrite requests will fail until it is configured",
            config.rewrite.backend.api_key_var()
        );
    }

    // Create application state
    let app_state = AppState::from_config(&config)?;

    // Build the router with routes
    let app = create_router(app_state);

    // Create the listener
    let listener = TcpListener::bind(server_addr).await?;

    tracing::info!(
        %server_addr,
        backend = config.rewrite.backend.name(),
        model = %config.rewrite.model,
        "listening"
    );
    axum::serve(listener, app).await?;

    Ok(())
}
