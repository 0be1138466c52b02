use anyhow::Result;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::core::config::AppConfig;
use crate::core::lifecycle::LifecycleManager;
use crate::core::terminal::{GuideSection, print_link};
use crate::interfaces::web::ApiServer;

use super::bootstrap::build_gateway;

pub async fn run_serve(config: &AppConfig, api_host: String, api_port: u16) -> Result<()> {
    let gateway = Arc::new(build_gateway(config).await?);

    let server = Arc::new(Mutex::new(ApiServer::new(gateway, api_host.clone(), api_port)));
    let mut lifecycle = LifecycleManager::new();
    lifecycle.attach(server.clone());
    lifecycle.start().await?;

    let base = match server.lock().await.local_addr() {
        Some(addr) => format!("http://{}", addr),
        None => format!("http://{}:{}", api_host, api_port),
    };
    GuideSection::new("briefly gateway")
        .status("Send", &format!("POST {}/send-message/?message=...", base))
        .status("History", &format!("GET {}/conversation-history/?thread_id=...", base))
        .blank()
        .text("Press Ctrl+C to stop.")
        .print();
    print_link("Gateway", &base);
    println!();

    tokio::signal::ctrl_c().await?;
    lifecycle.shutdown().await?;
    Ok(())
}
