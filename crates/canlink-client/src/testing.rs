//! In-process canlink server for integration tests
//!
//! ```ignore
//! use canlink_api::{create_router, AppState};
//! use canlink_client::testing::TestServer;
//!
//! let server = TestServer::start(create_router(AppState::new(registry))).await?;
//! let session = server.client().connect("can0").await?;
//! ```

use std::net::SocketAddr;
use std::time::Duration;

use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use crate::{CanLinkClient, CanLinkClientError, Result};

const READY_TIMEOUT: Duration = Duration::from_secs(2);

/// Router served on an ephemeral loopback port
///
/// The server stops when [`shutdown`](Self::shutdown) is awaited or the value
/// is dropped. Open SSE responses are not waited for on drop.
pub struct TestServer {
    addr: SocketAddr,
    client: CanLinkClient,
    stop: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
}

impl TestServer {
    pub async fn start(router: axum::Router) -> Result<Self> {
        Self::start_with_timeout(router, Duration::from_secs(5), Duration::from_secs(2)).await
    }

    /// Start with custom client request and connect timeouts
    pub async fn start_with_timeout(
        router: axum::Router,
        timeout: Duration,
        connect_timeout: Duration,
    ) -> Result<Self> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let (stop, stopped) = oneshot::channel::<()>();

        let task = tokio::spawn(async move {
            let shutdown = async {
                let _ = stopped.await;
            };
            if let Err(e) = axum::serve(listener, router)
                .with_graceful_shutdown(shutdown)
                .await
            {
                tracing::warn!(%addr, error = %e, "Test server stopped with error");
            }
        });

        let base_url = format!("http://{}", addr);
        let client = CanLinkClient::with_config(&base_url, timeout, connect_timeout)?;
        let server = Self {
            addr,
            client,
            stop: Some(stop),
            task: Some(task),
        };
        server.wait_ready().await?;
        Ok(server)
    }

    async fn wait_ready(&self) -> Result<()> {
        let deadline = tokio::time::Instant::now() + READY_TIMEOUT;
        loop {
            match self.client.health().await {
                Ok(_) => return Ok(()),
                Err(_) if tokio::time::Instant::now() < deadline => {
                    tokio::time::sleep(Duration::from_millis(10)).await;
                }
                Err(_) => return Err(CanLinkClientError::Timeout),
            }
        }
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Client pointed at this server
    pub fn client(&self) -> &CanLinkClient {
        &self.client
    }

    /// Stop accepting connections and wait for the server task
    pub async fn shutdown(mut self) {
        if let Some(stop) = self.stop.take() {
            let _ = stop.send(());
        }
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        if let Some(stop) = self.stop.take() {
            let _ = stop.send(());
        }
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}
