//! Gateway server setup
//!
//! Provides the router, middleware and startup for the presence gateway.

mod handler;
mod state;

pub use handler::{health_check, presence_handler, socket_handler, ConnectParams};
pub use state::GatewayState;

use crate::connection::ConnectionManager;
use axum::{
    body::Body,
    http::{header, HeaderValue, Method, Request},
    routing::get,
    Router,
};
use estate_common::{AppConfig, AppError, CorsConfig, JwtService};
use estate_core::{EventRelay, InMemoryPresenceRegistry, LifecycleHandler, TokenVerifier};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::{DefaultOnResponse, TraceLayer},
};
use tracing::{Level, Span};

/// Create the gateway router
pub fn create_router() -> Router<GatewayState> {
    Router::new()
        .route("/socket", get(socket_handler))
        .route("/presence", get(presence_handler))
        .route("/health", get(health_check))
}

/// Build the complete application
pub fn create_app(state: GatewayState) -> Router {
    let cors = create_cors_layer(&state.config().cors, state.config().app.env.is_production());

    create_router()
        .layer(cors)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(request_span)
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .with_state(state)
}

/// Request span carrying the path only.
///
/// The query string is left out: browser clients pass their token there.
fn request_span(request: &Request<Body>) -> Span {
    tracing::info_span!(
        "http_request",
        method = %request.method(),
        path = %request.uri().path(),
    )
}

/// Wire registry, relay and lifecycle handler around the given verifier
pub fn create_gateway_state_with_verifier(
    config: AppConfig,
    verifier: Arc<dyn TokenVerifier>,
) -> GatewayState {
    let connection_manager = ConnectionManager::new_shared();
    let registry = Arc::new(InMemoryPresenceRegistry::new(
        config.presence.registration_policy,
    ));
    tracing::info!(
        policy = %registry.policy(),
        strict_identity = config.presence.strict_identity,
        "Presence registry created"
    );

    let relay = EventRelay::new(registry, connection_manager.clone());
    let lifecycle = LifecycleHandler::new(relay, config.presence.lifecycle_config());

    GatewayState::new(connection_manager, lifecycle, verifier, config)
}

/// Initialize all dependencies and create `GatewayState`
pub fn create_gateway_state(config: AppConfig) -> GatewayState {
    let jwt_service = Arc::new(JwtService::new(
        &config.jwt.secret,
        config.jwt.access_token_expiry,
    ));

    create_gateway_state_with_verifier(config, jwt_service)
}

/// Create CORS layer from configuration
///
/// Outside production an empty origin list means any origin is allowed.
fn create_cors_layer(config: &CorsConfig, is_production: bool) -> CorsLayer {
    let base_layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::OPTIONS])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE, header::ACCEPT]);

    if !is_production && config.allowed_origins.is_empty() {
        tracing::warn!(
            "CORS: Allowing any origin (development mode). \
             Configure CORS_ALLOWED_ORIGINS for production."
        );
        return base_layer.allow_origin(Any);
    }

    if config.allowed_origins.is_empty() {
        tracing::warn!(
            "CORS: No allowed origins configured in production mode. \
             Requests from browsers will be blocked."
        );
    }

    let origins: Vec<HeaderValue> = config
        .allowed_origins
        .iter()
        .filter_map(|origin| {
            origin.parse::<HeaderValue>().ok().or_else(|| {
                tracing::warn!("Invalid CORS origin: {}", origin);
                None
            })
        })
        .collect();

    tracing::info!("CORS: Allowing {} configured origins", origins.len());
    base_layer.allow_origin(AllowOrigin::list(origins))
}

/// Serve the application on an already bound listener
pub async fn serve(listener: TcpListener, app: Router) -> Result<(), AppError> {
    axum::serve(listener, app)
        .await
        .map_err(|e| AppError::Server(e.to_string()))
}

/// Run the gateway server
pub async fn run_server(app: Router, addr: &str) -> Result<(), AppError> {
    tracing::info!("Starting Gateway server on {}", addr);

    let listener = TcpListener::bind(addr)
        .await
        .map_err(|e| AppError::Server(format!("Failed to bind to {addr}: {e}")))?;

    tracing::info!("Gateway listening on ws://{}/socket", addr);

    serve(listener, app).await
}

/// Run the complete gateway server with configuration
pub async fn run(config: AppConfig) -> Result<(), AppError> {
    let addr = config.gateway.address();

    let state = create_gateway_state(config);
    let app = create_app(state);

    run_server(app, &addr).await
}
