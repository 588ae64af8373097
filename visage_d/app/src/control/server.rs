use axum::Router;
use common::ControlConfig;
use log::info;
use tokio::net::TcpListener;

pub struct ControlServer;

impl ControlServer {
    pub async fn start(config: &ControlConfig, app_router: Router) -> anyhow::Result<()> {
        // Port 0 picks a free port
        let listener = TcpListener::bind((config.bind_address.as_str(), config.port)).await?;
        let local_addr = listener.local_addr()?;

        info!("Control surface listening on http://{}", local_addr);

        axum::serve(listener, app_router).await?;

        Ok(())
    }
}
