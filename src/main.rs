use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use axum::error_handling::HandleErrorLayer;
use axum::http::StatusCode;
use axum::middleware::{from_fn, from_fn_with_state};
use dotenv::dotenv;
use tokio::sync::watch;
use tower::{BoxError, ServiceBuilder};
use tracing::{debug, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use pizzas_ecos::config::Config;
use pizzas_ecos::database::Database;
use pizzas_ecos::middleware::{auth_gate, cors, ddos_gate, logging, rate_limit_gate, recovery};
use pizzas_ecos::ratelimit::RateLimiter;
use pizzas_ecos::routing::{dispatch, setup_routes};
use pizzas_ecos::security::DdosDetector;
use pizzas_ecos::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::init();

    let db = Database::connect(&config.database_url)
        .await
        .context("no se pudo conectar a MySQL")?;

    let router = Arc::new(setup_routes().build());
    for (method, pattern, name) in router.routes() {
        debug!(%method, pattern, name, "ruta registrada");
    }

    let rate_limiter = Arc::new(RateLimiter::new(config.requests_per_second));
    let ddos = Arc::new(DdosDetector::new(
        config.ddos_max_requests,
        Duration::from_secs(config.ddos_window_secs),
    ));

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let rate_limit_task = Arc::clone(&rate_limiter).spawn_cleanup(shutdown_rx.clone());
    let ddos_task = Arc::clone(&ddos).spawn_cleanup(shutdown_rx);

    let port = config.port;
    let state = AppState {
        env: Arc::new(config),
        db,
        router,
        rate_limiter,
        ddos,
    };

    // Onion order, outermost first: the timeout is outer server
    // configuration; recovery wraps everything below it so a panic in any
    // inner layer or handler becomes a 500; auth sits innermost so denied
    // requests still reach the request log.
    let app = axum::Router::new()
        .fallback(dispatch)
        .layer(
            ServiceBuilder::new()
                .layer(HandleErrorLayer::new(|_: BoxError| async {
                    StatusCode::REQUEST_TIMEOUT
                }))
                .timeout(Duration::from_secs(30))
                .layer(from_fn(recovery))
                .layer(from_fn(cors))
                .layer(from_fn_with_state(state.clone(), ddos_gate))
                .layer(from_fn_with_state(state.clone(), rate_limit_gate))
                .layer(from_fn(logging))
                .layer(from_fn_with_state(state.clone(), auth_gate)),
        )
        .with_state(state);

    let addr = format!("0.0.0.0:{port}");
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("no se pudo escuchar en {addr}"))?;
    info!(%addr, "servidor escuchando");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    // Teardown determinista de las tareas de evicción.
    shutdown_tx.send(true).ok();
    let _ = tokio::join!(rate_limit_task, ddos_task);

    Ok(())
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    info!("señal de apagado recibida");
}
