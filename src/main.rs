use findyourplace::{
    clients::{build_http_client, build_search_service},
    config::Config,
    routes::{router, AppState},
};
use tracing::info;

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;
    // initialize tracing
    tracing_subscriber::fmt::init();

    let config = Config::from_env()?;
    info!(
        mirrors = config.overpass_urls.len(),
        email_discovery = config.enable_website_email_discovery,
        "loaded configuration"
    );
    let client = build_http_client(&config)?;
    let app = router(AppState::new(build_search_service(&config, client)));

    info!("Running on {}", config.bind_addr);

    axum::Server::bind(&config.bind_addr)
        .serve(app.into_make_service())
        .await?;

    Ok(())
}
