mod handlers;
mod router;

use anyhow::{Context, Result};
use async_trait::async_trait;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::oneshot;
use tracing::{error, info};

use crate::core::gateway::MessageGateway;
use crate::core::lifecycle::LifecycleComponent;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) gateway: Arc<MessageGateway>,
    pub(crate) api_port: u16,
}

/// The HTTP gateway. Binds on start and serves until shutdown.
pub struct ApiServer {
    gateway: Arc<MessageGateway>,
    api_host: String,
    api_port: u16,
    bound: Option<SocketAddr>,
    shutdown_tx: Option<oneshot::Sender<()>>,
    server: Option<tokio::task::JoinHandle<()>>,
}

impl ApiServer {
    pub fn new(gateway: Arc<MessageGateway>, api_host: String, api_port: u16) -> Self {
        Self {
            gateway,
            api_host,
            api_port,
            bound: None,
            shutdown_tx: None,
            server: None,
        }
    }

    /// Address actually bound, available once started.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.bound
    }
}

#[async_trait]
impl LifecycleComponent for ApiServer {
    async fn on_init(&mut self) -> Result<()> {
        info!("API Server Interface initializing...");
        Ok(())
    }

    async fn on_start(&mut self) -> Result<()> {
        let addr = format!("{}:{}", self.api_host, self.api_port);
        let listener = tokio::net::TcpListener::bind(&addr)
            .await
            .with_context(|| format!("binding API server to {}", addr))?;
        let local = listener.local_addr()?;

        let state = AppState {
            gateway: self.gateway.clone(),
            api_port: local.port(),
        };
        let app = router::build_api_router(state);
        let (tx, rx) = oneshot::channel::<()>();

        self.server = Some(tokio::spawn(async move {
            info!("API Server running at http://{local}");
            let serve = axum::serve(listener, app).with_graceful_shutdown(async {
                let _ = rx.await;
            });
            if let Err(e) = serve.await {
                error!("API Server crashed: {}", e);
            }
        }));
        self.shutdown_tx = Some(tx);
        self.bound = Some(local);
        Ok(())
    }

    async fn on_shutdown(&mut self) -> Result<()> {
        info!("API Server Interface shutting down...");
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.server.take() {
            let _ = handle.await;
        }
        Ok(())
    }
}
