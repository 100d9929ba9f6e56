use std::net::SocketAddr;
use std::sync::Arc;

use gitea_provisioner::config::ProvisionerConfig;
use gitea_provisioner::host::MemoryHost;
use gitea_provisioner::provisioner::Provisioner;
use gitea_provisioner::server::{AppState, create_router};
use tokio::task::JoinHandle;

pub const USERNAME_PREFIX: &str = "user-";

/// Provisioner router served on an ephemeral port, backed by a [`MemoryHost`]
/// the test can inspect.
pub struct TestServer {
    pub base_url: String,
    pub host: MemoryHost,
    server_task: Option<JoinHandle<()>>,
}

impl TestServer {
    pub async fn start() -> Self {
        Self::start_with(ProvisionerConfig {
            username_prefix: USERNAME_PREFIX.to_string(),
            ..ProvisionerConfig::default()
        })
        .await
    }

    pub async fn start_with(config: ProvisionerConfig) -> Self {
        let host = MemoryHost::new();
        let shared = Arc::new(host.clone());
        let provisioner = Provisioner::new(shared.clone(), shared, config);
        let app = create_router(Arc::new(AppState::new(Arc::new(provisioner))));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind");
        let addr: SocketAddr = listener.local_addr().expect("local addr");

        let server_task = tokio::spawn(async move {
            axum::serve(listener, app).await.expect("serve");
        });

        let base_url = format!("http://{addr}");
        Self::wait_for_ready(&base_url).await;

        Self {
            base_url,
            host,
            server_task: Some(server_task),
        }
    }

    async fn wait_for_ready(base_url: &str) {
        let client = reqwest::Client::new();
        for _ in 0..50 {
            if client
                .get(format!("{}/health", base_url))
                .send()
                .await
                .is_ok()
            {
                return;
            }
            tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        }
        panic!("Server did not become ready");
    }

    pub fn repository_url(&self) -> String {
        format!("{}/repository", self.base_url)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        if let Some(task) = self.server_task.take() {
            task.abort();
        }
    }
}
