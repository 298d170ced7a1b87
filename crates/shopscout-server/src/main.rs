mod api;
mod middleware;

use std::sync::Arc;
use std::time::Duration;

use tracing_subscriber::EnvFilter;

use shopscout_crawler::{
    BrowserPool, HtmlDumpObserver, NoopObserver, PageObserver, Recommender, SiteCrawler,
};
use shopscout_llm::{ConversationGate, LlmClient};

use crate::api::{build_app, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = shopscout_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    tracing::info!(env = %config.env, "starting shopscout server");

    let sites = shopscout_core::load_sites_or_default(&config.sites_path)?;

    let observer: Arc<dyn PageObserver> = match &config.debug_dump_dir {
        Some(dir) => Arc::new(HtmlDumpObserver::new(dir.clone())),
        None => Arc::new(NoopObserver),
    };

    let llm = Arc::new(LlmClient::new(
        &config.llm_api_base,
        config.llm_api_key.as_deref(),
        &config.llm_model,
        config.llm_timeout_secs,
    )?);

    let browser = BrowserPool::new(&config.user_agent);
    let crawler = SiteCrawler::new(
        browser.clone(),
        Some(Arc::clone(&llm)),
        observer,
        config.max_concurrent_sites,
        Duration::from_secs(config.page_timeout_secs),
        config.max_items_per_site,
    );
    let recommender = Arc::new(Recommender::new(sites.sites, crawler));

    let state = AppState {
        recommender,
        llm: Some(llm),
        gate: ConversationGate::new(),
    };
    let app = build_app(state);

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    tracing::info!(addr = %config.bind_addr, "listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    browser.shutdown().await;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to listen for ctrl-c");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("received shutdown signal, starting graceful shutdown");
}
