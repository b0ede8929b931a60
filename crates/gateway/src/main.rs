//! Citegraph API Gateway
//!
//! HTTP entry point for the OpenAlex-backed citation cache.
//! Handles:
//! - Search, paper detail and citation graph endpoints
//! - Author profiles
//! - Reading library (collections, saved papers, export)
//! - Inbound rate limiting
//! - Observability (logging, metrics, request ids)

mod handlers;
mod middleware;


use axum::{
    error_handling::HandleErrorLayer,
    response::{IntoResponse, Response},
    routing::{get, post, put},
    BoxError, Router,
};
use citegraph_common::{
    config::AppConfig,
    db::{self, DbPool, Repository},
    errors::AppError,
    graph::GraphBuilder,
    library::LibraryService,
    metrics,
    openalex::{OpenAlexClient, WorkSource},
    search::SearchService,
    PaperCache,
};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder};
use std::future::IntoFuture;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::{signal, sync::oneshot};
use tower::{timeout::TimeoutLayer, ServiceBuilder};
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub db: DbPool,
    pub upstream: Arc<dyn WorkSource>,
}

impl AppState {
    pub fn repository(&self) -> Repository {
        Repository::new(self.db.clone())
    }

    pub fn cache(&self) -> PaperCache {
        PaperCache::new(self.repository(), self.upstream.clone(), self.config.cache.ttl())
    }

    pub fn graph(&self) -> GraphBuilder {
        GraphBuilder::new(self.cache(), self.config.openalex.neighbor_limit)
    }

    pub fn search(&self) -> SearchService {
        SearchService::new(self.cache(), &self.config.openalex)
    }

    pub fn library(&self) -> LibraryService {
        LibraryService::new(self.repository())
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Load configuration, from a single file when APP_CONFIG_FILE is set
    let config = match std::env::var("APP_CONFIG_FILE") {
        Ok(path) => AppConfig::from_file(&path),
        Err(_) => AppConfig::load(),
    }
    .map_err(|e| {
        eprintln!("Failed to load configuration: {}", e);
        e
    })?;

    init_tracing(&config);

    info!("Starting Citegraph API Gateway v{}", citegraph_common::VERSION);

    let config = Arc::new(config);

    // Initialize metrics
    if config.observability.metrics_port != 0 {
        install_metrics_exporter(config.observability.metrics_port)?;
    }
    metrics::register_metrics();

    // Initialize database connection and schema
    info!("Connecting to database...");
    let db = DbPool::new(&config.database).await?;
    db::migrate(db.write()).await?;

    let upstream: Arc<dyn WorkSource> = Arc::new(OpenAlexClient::new(&config.openalex)?);

    let state = AppState {
        config: config.clone(),
        db,
        upstream,
    };

    let app = create_router(state);

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    // Open connections get shutdown_timeout to drain once a signal arrives
    let (draining_tx, draining_rx) = oneshot::channel::<()>();
    let server = axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown_signal().await;
            let _ = draining_tx.send(());
        })
        .into_future();

    let shutdown_timeout = config.shutdown_timeout();
    let drain_deadline = async move {
        if draining_rx.await.is_ok() {
            tokio::time::sleep(shutdown_timeout).await;
        } else {
            std::future::pending::<()>().await;
        }
    };

    tokio::select! {
        result = server => result?,
        _ = drain_deadline => warn!(
            timeout_secs = shutdown_timeout.as_secs(),
            "Graceful shutdown timed out, closing remaining connections"
        ),
    }

    info!("Server shutdown complete");
    Ok(())
}

fn init_tracing(config: &AppConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.observability.log_level));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);

    if config.observability.json_logging {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn install_metrics_exporter(port: u16) -> Result<(), Box<dyn std::error::Error>> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));

    PrometheusBuilder::new()
        .with_http_listener(addr)
        .set_buckets_for_metric(
            Matcher::Suffix("request_duration_seconds".to_string()),
            metrics::LATENCY_BUCKETS,
        )?
        .set_buckets_for_metric(
            Matcher::Suffix("upstream_duration_seconds".to_string()),
            metrics::UPSTREAM_BUCKETS,
        )?
        .install()?;

    info!(port, "Prometheus exporter listening");
    Ok(())
}

/// Create the main application router
pub fn create_router(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Request ID propagation
    let request_id = SetRequestIdLayer::x_request_id(MakeRequestUuid);
    let propagate_id = PropagateRequestIdLayer::x_request_id();

    let api_routes = Router::new()
        // Search
        .route("/search", get(handlers::search::search))
        .route("/search/suggestions", get(handlers::search::suggestions))
        .route("/search/filters", get(handlers::search::filters))

        // Papers and citation graph
        .route("/papers/batch", post(handlers::papers::batch))
        .route("/papers/{id}", get(handlers::papers::get_paper))
        .route("/papers/{id}/citations", get(handlers::papers::get_citations))
        .route("/papers/{id}/graph", get(handlers::papers::get_graph))
        .route("/papers/{id}/expand", post(handlers::papers::expand))

        // Authors
        .route("/authors/{id}", get(handlers::authors::get_author))

        // Reading library
        .route(
            "/library/collections",
            get(handlers::library::list_collections).post(handlers::library::create_collection),
        )
        .route(
            "/library/collections/{id}",
            axum::routing::delete(handlers::library::delete_collection),
        )
        .route("/library/collections/{id}/papers", get(handlers::library::collection_papers))
        .route("/library/collections/{id}/export", get(handlers::library::export_collection))
        .route("/library/saved-papers", post(handlers::library::save_paper))
        .route(
            "/library/saved-papers/{id}",
            put(handlers::library::update_saved_paper).delete(handlers::library::delete_saved_paper),
        );

    let request_timeout = state.config.request_timeout();

    let mut app = Router::new()
        .route("/", get(handlers::health::index))
        .route("/health", get(handlers::health::health))
        .route("/ready", get(handlers::health::ready))
        .nest("/api", api_routes)
        .route_layer(axum::middleware::from_fn(middleware::metrics::track_requests));

    if state.config.rate_limit.enabled {
        let limiter = middleware::rate_limit::create_rate_limiter(
            state.config.rate_limit.requests_per_second,
            state.config.rate_limit.burst,
        );
        app = app.layer(axum::middleware::from_fn_with_state(
            limiter,
            middleware::rate_limit::rate_limit_middleware,
        ));
    } else {
        warn!("Inbound rate limiting disabled");
    }

    let timeout = ServiceBuilder::new()
        .layer(HandleErrorLayer::new(move |err: BoxError| async move {
            handle_timeout_error(err, request_timeout)
        }))
        .layer(TimeoutLayer::new(request_timeout));

    app.layer(timeout)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(propagate_id)
        .layer(request_id)
        .with_state(state)
}

/// Render a request that outlived `server.request_timeout_secs`
fn handle_timeout_error(err: BoxError, timeout: Duration) -> Response {
    if err.is::<tower::timeout::error::Elapsed>() {
        AppError::Timeout { seconds: timeout.as_secs() }.into_response()
    } else {
        AppError::Internal { message: err.to_string() }.into_response()
    }
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, starting shutdown..."),
        _ = terminate => info!("Received SIGTERM, starting shutdown..."),
    }
}
