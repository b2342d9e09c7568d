//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Build the gateway controller from the loaded configuration
//! - Nest its routes at the mount route
//! - Wire up middleware (tracing, request ID, optional timeout)
//! - Serve with peer addresses available to the pipeline
//! - Stop accepting on shutdown and drain in-flight requests

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::config::schema::GatewayAppConfig;
use crate::error::ConfigurationError;
use crate::gateway::controller::GatewayController;
use crate::gateway::routes::trim_slashes;
use crate::http::request::request_id_layers;
use crate::routing::registrar::axum_path;

/// HTTP server for the gateway.
pub struct HttpServer {
    router: Router,
    config: GatewayAppConfig,
    controller: Arc<GatewayController>,
}

impl HttpServer {
    /// Build the controller from `config` and the server around it.
    pub fn new(config: GatewayAppConfig) -> Result<Self, ConfigurationError> {
        let controller = GatewayController::from_source(
            &config,
            &config.gateway.setting,
            config.gateway.mount.clone(),
            &config.gateway.options,
        )?
        .with_body_limit(config.listener.max_body_bytes);

        Self::with_controller(config, controller)
    }

    /// Serve an already built controller.
    pub fn with_controller(
        config: GatewayAppConfig,
        controller: GatewayController,
    ) -> Result<Self, ConfigurationError> {
        let router = Self::build_router(&config, &controller)?;
        Ok(Self {
            router,
            config,
            controller: Arc::new(controller),
        })
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(
        config: &GatewayAppConfig,
        controller: &GatewayController,
    ) -> Result<Router, ConfigurationError> {
        let gateway: Router = controller.add_routes(Router::new())?;

        let mount = trim_slashes(controller.mount_route());
        let app = if mount.is_empty() {
            gateway
        } else {
            Router::new().nest(&axum_path(&format!("/{mount}")), gateway)
        };

        let (set_request_id, propagate_request_id) = request_id_layers();
        let app = app
            .layer(propagate_request_id)
            .layer(TraceLayer::new_for_http())
            .layer(set_request_id);

        Ok(match config.timeouts.request_secs {
            Some(secs) => app.layer(TimeoutLayer::new(Duration::from_secs(secs))),
            None => app,
        })
    }

    /// The assembled router, for in-process use.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    pub fn controller(&self) -> &GatewayController {
        &self.controller
    }

    pub fn config(&self) -> &GatewayAppConfig {
        &self.config
    }

    /// Run the server until `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            mount = %self.controller.mount_route(),
            routes = self.controller.routes().len(),
            "HTTP server starting"
        );

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}
