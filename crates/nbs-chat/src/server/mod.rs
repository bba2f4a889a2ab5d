//! HTTP server for NBS Chat

pub mod doc;
pub mod routes;
pub mod state;

use axum::{extract::State, http::StatusCode, routing::get, Router};
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::config::ChatConfig;
use crate::error::{Error, Result};
use doc::{ApiDoc, OPENAPI_PATH, SWAGGER_PATH};
use state::AppState;

/// Chat HTTP server
pub struct ChatServer {
    config: ChatConfig,
    state: AppState,
}

impl ChatServer {
    /// Create a server, loading the index and connecting the providers
    pub async fn new(config: ChatConfig) -> Result<Self> {
        let state = AppState::new(config.clone()).await?;
        Ok(Self { config, state })
    }

    /// Create a server around prepared state
    pub fn with_state(state: AppState) -> Self {
        Self {
            config: state.config().clone(),
            state,
        }
    }

    /// Bind the configured address; host names such as `localhost` are resolved
    pub async fn bind(&self) -> Result<tokio::net::TcpListener> {
        let address = self.address();
        tokio::net::TcpListener::bind(&address)
            .await
            .map_err(|e| Error::Config(format!("Failed to bind {}: {}", address, e)))
    }

    /// Start the server
    pub async fn start(self) -> Result<()> {
        let listener = self.bind().await?;
        let addr = listener.local_addr()?;

        tracing::info!("Starting NBS Chat on http://{}", addr);
        if self.config.server.enable_swagger {
            tracing::info!("API documentation: http://{}{}", addr, SWAGGER_PATH);
        }

        axum::serve(listener, router(self.state))
            .await
            .map_err(|e| Error::Internal(format!("Server error: {}", e)))?;

        Ok(())
    }

    /// Get the server address
    pub fn address(&self) -> String {
        self.config.address()
    }
}

/// Build the router with all routes and middleware
pub fn router(state: AppState) -> Router {
    let server = &state.config().server;

    let mut app = Router::new()
        .route("/health", get(health_check))
        .route("/ready", get(readiness))
        .merge(routes::chat_routes());

    if server.enable_swagger {
        app = app.merge(SwaggerUi::new(SWAGGER_PATH).url(OPENAPI_PATH, ApiDoc::openapi()));
    }

    let mut app = app
        .with_state(state.clone())
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new());

    if server.enable_cors {
        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);
        app = app.layer(cors);
    }

    app
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "OK"
}

/// Readiness check endpoint
async fn readiness(State(state): State<AppState>) -> StatusCode {
    if state.is_ready() {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    }
}
