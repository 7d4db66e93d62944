//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum router: status endpoints, admin endpoints, upstream fallback
//! - Wire up middleware (trace, request ID, CORS, timeout, admission)
//! - Own the eviction sweeper for the lifetime of the server
//! - Serve with graceful shutdown

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    http::{header, uri::InvalidUri, HeaderName, HeaderValue, StatusCode},
    middleware,
    routing::get,
    Router,
};
use tokio::net::TcpListener;
use tower_http::{
    cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer},
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::admin;
use crate::config::{CorsConfig, GateConfig};
use crate::http::request::MakeRequestUuidV4;
use crate::http::status;
use crate::http::upstream::{forward_handler, UpstreamClient};
use crate::lifecycle::Shutdown;
use crate::limiter::{EvictionSweeper, SlidingWindowLimiter};
use crate::routing::GatedRoute;
use crate::security::rate_limit::{
    admission_middleware, AdmissionState, X_RATELIMIT_LIMIT, X_RATELIMIT_REMAINING,
    X_RATELIMIT_RESET, X_RATELIMIT_WINDOW,
};

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub limiter: Arc<SlidingWindowLimiter>,
    pub upstream: UpstreamClient,
    pub config: Arc<GateConfig>,
}

/// HTTP server for the scan gate.
pub struct HttpServer {
    router: Router,
    config: GateConfig,
    limiter: Arc<SlidingWindowLimiter>,
}

impl HttpServer {
    /// Create a server with a wall-clock limiter built from `config`.
    pub fn new(config: GateConfig) -> Result<Self, InvalidUri> {
        let limiter = Arc::new(SlidingWindowLimiter::from_config(&config.rate_limit));
        Self::with_limiter(config, limiter)
    }

    /// Create a server around an existing limiter (e.g. one on a manual clock).
    pub fn with_limiter(
        config: GateConfig,
        limiter: Arc<SlidingWindowLimiter>,
    ) -> Result<Self, InvalidUri> {
        let upstream = UpstreamClient::new(&config.upstream.address)?;

        let state = AppState {
            limiter: Arc::clone(&limiter),
            upstream,
            config: Arc::new(config.clone()),
        };

        let router = Self::build_router(&config, state);
        Ok(Self {
            router,
            config,
            limiter,
        })
    }

    /// Build the Axum router with all middleware layers.
    ///
    /// Admission wraps the timeout so a timed-out admitted scan still
    /// carries its quota headers.
    fn build_router(config: &GateConfig, state: AppState) -> Router {
        let admission = AdmissionState {
            limiter: Arc::clone(&state.limiter),
            route: GatedRoute::from_config(&config.rate_limit),
        };

        let mut router = Router::new()
            .route("/api/ratelimit", get(status::rate_limit_status))
            .route("/api/health", get(status::health));

        if config.admin.enabled {
            router = router.merge(admin::setup_admin_router(state.clone()));
        }

        router
            .fallback(forward_handler)
            .with_state(state)
            .layer(TimeoutLayer::with_status_code(
                StatusCode::REQUEST_TIMEOUT,
                Duration::from_secs(config.timeouts.request_secs),
            ))
            .layer(middleware::from_fn_with_state(admission, admission_middleware))
            .layer(cors_layer(&config.cors))
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuidV4))
            .layer(TraceLayer::new_for_http())
    }

    /// The fully layered router, for driving the gate without a socket.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    pub fn limiter(&self) -> Arc<SlidingWindowLimiter> {
        Arc::clone(&self.limiter)
    }

    /// Serve on `listener` until `shutdown` fires, then stop the sweeper and return.
    pub async fn run(self, listener: TcpListener, shutdown: Shutdown) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            max_requests = self.limiter.max_requests(),
            window_minutes = self.limiter.window_minutes(),
            gated = %format!("{} {}", self.config.rate_limit.gated_method, self.config.rate_limit.gated_path),
            upstream = %self.config.upstream.address,
            "HTTP server starting"
        );

        let sweeper = EvictionSweeper::from_config(&self.limiter, &self.config.rate_limit);
        let sweeper_task = tokio::spawn(sweeper.run(shutdown.subscribe()));

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();
        let mut server_shutdown = shutdown.subscribe();
        let served = axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = server_shutdown.recv().await;
            })
            .await;

        // Serving can end on an I/O error too; make sure the sweeper still stops.
        shutdown.trigger();
        if let Err(e) = sweeper_task.await {
            tracing::error!(error = %e, "Eviction sweeper task failed");
        }

        served?;
        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Credentialed CORS for the configured origins, exposing the quota headers.
fn cors_layer(config: &CorsConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .allowed_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    let exposed: [HeaderName; 5] = [
        X_RATELIMIT_LIMIT,
        X_RATELIMIT_REMAINING,
        X_RATELIMIT_RESET,
        X_RATELIMIT_WINDOW,
        header::RETRY_AFTER,
    ];

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request())
        .allow_credentials(true)
        .expose_headers(exposed)
}
