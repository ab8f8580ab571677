use axum::http::HeaderValue;
use axum::response::{IntoResponse, Response};
use axum::{
    middleware,
    routing::{get, patch, put},
    serve, Json, Router,
};
use bookstore_types::api::STATUS_ERROR;
use bookstore_types::ports::identity::IdentityProvider;
use bookstore_types::ports::Store;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use super::handlers;
use crate::application::Services;
use crate::config::Config;
use crate::errors::{ErrorBody, ErrorDetail};

#[derive(Clone, Debug)]
pub struct HttpServerConfig {
    pub port: String,
    /// Adds the underlying cause to 5xx bodies.
    pub development: bool,
    pub cors_origin: Option<String>,
}

impl HttpServerConfig {
    pub fn new(port: impl Into<String>) -> Self {
        Self {
            port: port.into(),
            development: false,
            cors_origin: None,
        }
    }
}

impl From<&Config> for HttpServerConfig {
    fn from(config: &Config) -> Self {
        Self {
            port: config.server_port.clone(),
            development: config.is_development(),
            cors_origin: config.cors_origin.clone(),
        }
    }
}

/// Shared by every handler.
pub struct AppState<S: Store> {
    pub services: Arc<Services<S>>,
    pub identity: Arc<dyn IdentityProvider>,
}

impl<S: Store> Clone for AppState<S> {
    fn clone(&self) -> Self {
        Self {
            services: self.services.clone(),
            identity: self.identity.clone(),
        }
    }
}

pub struct HttpServer<S: Store> {
    state: AppState<S>,
    cors: CorsLayer,
    pub config: HttpServerConfig,
}

impl<S: Store> HttpServer<S> {
    pub async fn new(
        services: Services<S>,
        identity: Arc<dyn IdentityProvider>,
        config: HttpServerConfig,
    ) -> anyhow::Result<Self> {
        let cors = match &config.cors_origin {
            Some(origin) => CorsLayer::new()
                .allow_origin(origin.parse::<HeaderValue>().map_err(|e| {
                    anyhow::anyhow!("CORS_ORIGIN is not a valid header value: {e}")
                })?)
                .allow_methods(Any)
                .allow_headers(Any),
            None => CorsLayer::permissive(),
        };
        Ok(Self {
            state: AppState {
                services: Arc::new(services),
                identity,
            },
            cors,
            config,
        })
    }

    /// The full application router, with every API route under both
    /// `/api` and `/api/v1`.
    pub fn router(&self) -> Router {
        let trace_layer = TraceLayer::new_for_http()
            .make_span_with(|request: &axum::extract::Request<_>| {
                let uri = request.uri().to_string();
                let request_id = Uuid::new_v4();
                tracing::info_span!(
                    "http_request",
                    %request_id,
                    method = %request.method(),
                    uri
                )
            })
            .on_request(
                |request: &axum::extract::Request<_>, span: &tracing::Span| {
                    tracing::info!(
                        parent: span,
                        method = %request.method(),
                        uri = %request.uri(),
                        "request"
                    );
                },
            )
            .on_response(
                |response: &axum::response::Response, latency: Duration, span: &tracing::Span| {
                    tracing::info!(
                        parent: span,
                        status = %response.status(),
                        latency_ms = %latency.as_millis(),
                        "response"
                    );
                },
            );

        let api = api_routes::<S>();
        let mut app = Router::new()
            .route("/health", get(handlers::health))
            .nest("/api", api.clone())
            .nest("/api/v1", api)
            .fallback(handlers::not_found)
            .with_state(self.state.clone());
        if self.config.development {
            app = app.layer(middleware::map_response(expose_error_detail));
        }
        app.layer(self.cors.clone()).layer(trace_layer)
    }

    pub async fn run(self) -> anyhow::Result<()> {
        let app = self.router();
        let addr: SocketAddr = format!("0.0.0.0:{}", self.config.port).parse()?;
        tracing::info!(development = self.config.development, "starting server on {}", addr);
        let listener = tokio::net::TcpListener::bind(addr).await?;
        serve(listener, app.into_make_service())
            .with_graceful_shutdown(shutdown_signal())
            .await?;
        Ok(())
    }
}

fn api_routes<S: Store>() -> Router<AppState<S>> {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/books", get(handlers::list_books::<S>))
        .route(
            "/books/{id}",
            get(handlers::get_book::<S>).put(handlers::upsert_book::<S>),
        )
        .route(
            "/books/{id}/reviews",
            get(handlers::list_reviews::<S>).post(handlers::create_review::<S>),
        )
        .route(
            "/books/{id}/reviews/{review_id}",
            patch(handlers::update_review::<S>).delete(handlers::delete_review::<S>),
        )
        .route(
            "/cart",
            get(handlers::get_cart::<S>)
                .post(handlers::add_to_cart::<S>)
                .delete(handlers::clear_cart::<S>),
        )
        .route(
            "/cart/{line_id}",
            put(handlers::update_cart_item::<S>).delete(handlers::remove_cart_item::<S>),
        )
        .route(
            "/orders",
            get(handlers::list_orders::<S>).post(handlers::create_order::<S>),
        )
        .route(
            "/orders/{id}",
            get(handlers::get_order::<S>).put(handlers::update_order::<S>),
        )
        .route("/admin/orders", get(handlers::list_all_orders::<S>))
}

async fn expose_error_detail(response: Response) -> Response {
    let Some(detail) = response.extensions().get::<ErrorDetail>().cloned() else {
        return response;
    };
    let body = ErrorBody {
        status: STATUS_ERROR,
        message: detail.message,
        detail: Some(detail.detail),
    };
    (response.status(), Json(body)).into_response()
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("shutdown signal received, draining connections");
}
