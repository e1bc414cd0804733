use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use radio_api::background::room_ticker;
use radio_api::config::ServerConfig;
use radio_api::engine::coordinator::MEDIA_FETCH_TIMEOUT;
use radio_api::router::build_app_router;
use radio_api::state::{AppState, Services};
use radio_db::pocketbase::PocketBase;
use radio_db::RecordStore;
use radio_suno::api::{MusicGenerator, SunoApi};
use radio_suno::gateway::{GatewayApi, PromptEnhancer};
use radio_suno::media::{HttpMediaFetcher, MediaFetcher};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "radio_api=debug,radio_db=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let config = ServerConfig::from_env();
    tracing::info!(host = %config.host, port = %config.port, "Loaded server configuration");

    // --- BaaS ---
    let store: Arc<dyn RecordStore> = Arc::new(
        PocketBase::new(&config.baas_url, Duration::from_secs(config.baas_timeout_secs))
            .expect("Failed to build BaaS client"),
    );
    match radio_db::health_check(store.as_ref()).await {
        Ok(()) => tracing::info!(url = %config.baas_url, "BaaS health check passed"),
        Err(e) => tracing::warn!(url = %config.baas_url, error = %e, "BaaS health check failed"),
    }

    // --- External services ---
    let services = build_services(&config);
    if services.generator.is_none() {
        tracing::warn!("SUNO_API_KEY not set, generation endpoints will answer 503");
    }
    if services.enhancer.is_none() {
        tracing::warn!("AI_GATEWAY_API_KEY not set, prompt enhancement disabled");
    }

    // --- App state ---
    let state = AppState::new(config.clone(), store, services);

    // --- Room ticker ---
    let ticker_cancel = CancellationToken::new();
    let ticker_handle = config.room_advance_interval_secs.map(|secs| {
        tokio::spawn(room_ticker::run(
            Arc::clone(&state.advancer),
            Duration::from_secs(secs),
            ticker_cancel.clone(),
        ))
    });

    // --- Router ---
    let app = build_app_router(state, &config);

    // --- Start server ---
    let addr = SocketAddr::new(
        config.host.parse().expect("Invalid HOST address"),
        config.port,
    );
    tracing::info!(%addr, callback_url = %config.callback_url(), "Starting server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");

    // --- Post-shutdown cleanup ---
    tracing::info!("Server stopped accepting connections, cleaning up");

    ticker_cancel.cancel();
    if let Some(handle) = ticker_handle {
        let _ = tokio::time::timeout(Duration::from_secs(5), handle).await;
        tracing::info!("Room ticker stopped");
    }

    tracing::info!("Graceful shutdown complete");
}

/// Build the generation, enhancement and media clients the configuration
/// enables.
fn build_services(config: &ServerConfig) -> Services {
    let generator = config.suno_api_key.as_deref().map(|key| {
        Arc::new(
            SunoApi::new(
                &config.suno_base_url,
                key,
                Duration::from_secs(config.suno_timeout_secs),
            )
            .expect("Failed to build generation API client"),
        ) as Arc<dyn MusicGenerator>
    });

    let enhancer = config.gateway_api_key.as_deref().map(|key| {
        Arc::new(
            GatewayApi::new(
                &config.gateway_base_url,
                key,
                &config.gateway_model,
                Duration::from_secs(config.gateway_timeout_secs),
            )
            .expect("Failed to build AI gateway client"),
        ) as Arc<dyn PromptEnhancer>
    });

    let media = config.store_media.then(|| {
        Arc::new(
            HttpMediaFetcher::new(MEDIA_FETCH_TIMEOUT)
                .expect("Failed to build media client"),
        ) as Arc<dyn MediaFetcher>
    });

    Services {
        generator,
        enhancer,
        media,
    }
}

/// Wait for a termination signal to initiate graceful shutdown.
///
/// Handles both SIGINT (Ctrl-C) and SIGTERM (on Unix).
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
