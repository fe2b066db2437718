/*
 * Responsibility
 * - tracing / panic hook setup
 * - Config → allow-list (+ Valkey refresher) → gate → Router
 * - Router-level middleware (CORS / HTTP limits), axum::serve()
 */
use std::{panic, process, sync::Arc};

use axum::{Router, routing::get};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::api::{self, v1::handlers::health::health};
use crate::config::Config;
use crate::error::AppError;
use crate::middleware::{self, request_gate::RequestGate};
use crate::services::cache::ValkeyClient;
use crate::services::service_ids::{InMemoryServiceIdCache, ServiceIdRefresher};
use crate::services::token::{TokenCodec, TokenPolicy};
use crate::state::AppState;

fn init_tracing() {
    // RUST_LOG wins when set, e.g. RUST_LOG=info,service_gate=debug,tower_http=debug
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,tower_http=info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn init_panic_hook(abort_on_panic: bool) {
    let default_hook = panic::take_hook();

    panic::set_hook(Box::new(move |info| {
        // stderr may be hidden depending on how the process is launched
        tracing::error!(?info, "panic");

        // development: crash loudly; production: default hook, keep serving
        if abort_on_panic {
            process::abort();
        } else {
            default_hook(info);
        }
    }))
}

pub async fn run() -> Result<(), AppError> {
    init_tracing();
    let config = Config::from_env()?;

    init_panic_hook(!config.app_env.is_production());

    tracing::info!(
        "starting service gate in {:?} mode on {}",
        config.app_env,
        config.addr
    );

    let state = build_state(&config).await?;
    let app = build_router(state, &config);

    let listener = tokio::net::TcpListener::bind(config.addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("service gate stopped");
    Ok(())
}

pub async fn build_state(config: &Config) -> Result<AppState, AppError> {
    let service_ids = Arc::new(InMemoryServiceIdCache::new(
        config.service_ids.iter().cloned(),
    ));

    if let Some(url) = config.valkey_url.as_deref() {
        // Connection problems at startup are fatal; later refresh failures are not.
        let client = ValkeyClient::new(url).await?;
        let refresher = ServiceIdRefresher::new(
            Arc::clone(&service_ids),
            client,
            config.service_ids_key.clone(),
            config.service_ids.iter().cloned(),
        );

        match refresher.refresh_once().await {
            Ok(count) => tracing::info!(
                key = %config.service_ids_key,
                count,
                "service id allow-list loaded"
            ),
            Err(err) => tracing::warn!(
                error = %err,
                key = %config.service_ids_key,
                "initial service id load failed; serving static SERVICE_IDS only"
            ),
        }

        refresher.spawn(config.service_ids_refresh);
    } else {
        tracing::info!("VALKEY_URL not set; allow-list comes from SERVICE_IDS only");
    }

    if service_ids.is_empty() {
        tracing::warn!("service id allow-list is empty; every gated request will be rejected");
    }

    let codec = TokenCodec::new(TokenPolicy {
        max_skew_millis: config.token_max_skew_millis,
    });
    let gate = RequestGate::new(codec, service_ids.clone());

    Ok(AppState::new(Arc::new(gate), service_ids))
}

pub fn build_router(state: AppState, config: &Config) -> Router {
    let v1 = middleware::request_gate::apply(api::v1::routes(), state.clone());

    let router = Router::new()
        .route("/health", get(health))
        .nest("/api/v1", v1)
        .with_state(state);

    let router = middleware::cors::apply(router, config);
    middleware::http::apply(router, config.http)
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown signal received");
}
