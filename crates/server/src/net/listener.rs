use std::sync::Arc;

use classic_engine::world::VoxelGrid;
use tokio::net::TcpListener;

use super::ServerInfo;
use crate::metrics::Metrics;

/// Start the TCP listener and accept classic client connections.
///
/// Every connection runs on its own task with its own level stream.
pub async fn run(
    level: Arc<VoxelGrid>,
    info: Arc<ServerInfo>,
    metrics: Arc<Metrics>,
    bind_addr: &str,
) -> anyhow::Result<()> {
    let listener = TcpListener::bind(bind_addr).await?;
    tracing::info!("Listening on {}", listener.local_addr()?);

    loop {
        let (stream, addr) = listener.accept().await?;
        tracing::info!("Connection from {}", addr);

        let level = Arc::clone(&level);
        let info = Arc::clone(&info);
        let metrics = Arc::clone(&metrics);
        tokio::spawn(async move {
            metrics.client_connected();
            let result =
                super::connection::handle(stream, level, info, Arc::clone(&metrics)).await;
            if let Err(e) = result {
                tracing::warn!("Connection from {} closed: {:#}", addr, e);
            }
            metrics.client_disconnected();
        });
    }
}
