//! HTTP API for Reef.
//!
//! Provides an [`ApiServer`] exposing the engine over axum:
//!
//! - `GET /health`: liveness check (no auth)
//! - `PUT /objects/{*key}`: encode the body, store its shards, return the
//!   manifest as JSON
//! - `POST /objects/decode`: take a manifest as JSON, return the payload
//!
//! ## Authentication
//!
//! Object routes require `Authorization: Bearer <accessKeyId>:<signature>:<policy>`
//! (see [`reef_auth::token`]). Every verification failure is answered with
//! the same 403 "access denied"; the reason is only logged.

mod error;
mod handlers;


use std::sync::Arc;

use axum::Router;
use axum::extract::{DefaultBodyLimit, Request, State};
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::routing::{get, post, put};
use reef_auth::TokenVerifier;
use reef_engine::ReefEngine;
use tracing::warn;

pub use error::ApiError;

/// Default request body limit: 256 MiB.
pub const DEFAULT_BODY_LIMIT: usize = 256 * 1024 * 1024;

/// Shared application state for all handlers.
#[derive(Clone)]
pub(crate) struct AppState {
    /// The storage engine.
    pub engine: Arc<dyn ReefEngine>,
    /// Access token verifier.
    pub verifier: TokenVerifier,
}

/// Authentication middleware for object routes.
///
/// On success the [`Principal`](reef_auth::Principal) is attached to the
/// request extensions.
async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let Some(token) = request
        .headers()
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
    else {
        warn!("request without bearer token");
        return Err(ApiError::AccessDenied);
    };

    match state.verifier.verify_now(token.trim()).await {
        Ok(principal) => {
            request.extensions_mut().insert(principal);
            Ok(next.run(request).await)
        }
        Err(e) => {
            warn!(reason = %e, "unauthorized request");
            Err(ApiError::AccessDenied)
        }
    }
}

/// Configuration for creating an [`ApiServer`].
pub struct ApiServerConfig {
    /// The engine to serve.
    pub engine: Arc<dyn ReefEngine>,
    /// Verifier for bearer tokens.
    pub verifier: TokenVerifier,
    /// Maximum accepted request body, in bytes.
    pub body_limit: usize,
}

impl ApiServerConfig {
    /// A configuration with the default body limit.
    pub fn new(engine: Arc<dyn ReefEngine>, verifier: TokenVerifier) -> Self {
        Self {
            engine,
            verifier,
            body_limit: DEFAULT_BODY_LIMIT,
        }
    }
}

/// HTTP server backed by a [`ReefEngine`].
pub struct ApiServer {
    router: Router,
}

impl ApiServer {
    /// Create a new server with the given configuration.
    pub fn new(config: ApiServerConfig) -> Self {
        let state = AppState {
            engine: config.engine,
            verifier: config.verifier,
        };
        let router = Self::build_router(state, config.body_limit);
        Self { router }
    }

    fn build_router(state: AppState, body_limit: usize) -> Router {
        // `/objects/decode` is registered before the wildcard, and axum
        // prefers the static segment.
        let object_routes = Router::new()
            .route("/objects/decode", post(handlers::decode_object_handler))
            .route("/objects/{*key}", put(handlers::put_object_handler))
            .route_layer(middleware::from_fn_with_state(
                state.clone(),
                auth_middleware,
            ));

        Router::new()
            .merge(object_routes)
            .route("/health", get(handlers::health))
            .layer(DefaultBodyLimit::max(body_limit))
            .with_state(state)
    }

    /// Return the inner [`Router`] (useful for testing with `tower::ServiceExt`).
    pub fn into_router(self) -> Router {
        self.router
    }

    /// Serve the API on the given TCP address.
    pub async fn serve(self, addr: &str) -> Result<(), std::io::Error> {
        let listener = tokio::net::TcpListener::bind(addr).await?;
        tracing::info!(addr, "reef API listening");
        axum::serve(listener, self.router).await
    }

    /// Serve the API with graceful shutdown triggered by the given future.
    ///
    /// When `shutdown` completes, the server stops accepting new connections
    /// and waits for in-flight requests to finish.
    pub async fn serve_with_shutdown(
        self,
        addr: &str,
        shutdown: impl std::future::Future<Output = ()> + Send + 'static,
    ) -> Result<(), std::io::Error> {
        let listener = tokio::net::TcpListener::bind(addr).await?;
        tracing::info!(addr, "reef API listening");
        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown)
            .await
    }
}
