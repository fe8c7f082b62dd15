//! Intake server for the shop website's forms.
//!
//! Accepts contact and event booking submissions as JSON and answers with a
//! [`crate::dispatch::DispatchResult`] in every case.

mod handlers;
mod routes;

pub use handlers::{source_id, status_for};
pub use routes::{create_router, MAX_BODY_BYTES};

use std::net::SocketAddr;
use std::sync::Arc;

use crate::config::{Environment, Settings};
use crate::dispatch::Dispatcher;

/// Shared state for the web server.
#[derive(Clone)]
pub struct AppState {
    pub dispatcher: Arc<Dispatcher>,
    pub environment: Environment,
    pub cors_origins: Arc<Vec<String>>,
    pub trust_proxy_headers: bool,
}

impl AppState {
    pub fn new(settings: &Settings) -> anyhow::Result<Self> {
        Ok(Self::with_dispatcher(
            settings,
            Dispatcher::from_settings(settings)?,
        ))
    }

    pub fn with_dispatcher(settings: &Settings, dispatcher: Dispatcher) -> Self {
        Self {
            dispatcher: Arc::new(dispatcher),
            environment: settings.environment,
            cors_origins: Arc::new(settings.cors_origins.clone()),
            trust_proxy_headers: settings.trust_proxy_headers,
        }
    }
}

/// Start the web server.
pub async fn serve(settings: &Settings, host: &str, port: u16) -> anyhow::Result<()> {
    let state = AppState::new(settings)?;
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind((host, port)).await?;
    tracing::info!("Starting server at http://{}", listener.local_addr()?);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
