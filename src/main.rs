use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use gitea_provisioner::config::{
    DEFAULT_USER_EMAIL_DOMAIN, GiteaConfig, ProvisionerConfig, ServerConfig,
};
use gitea_provisioner::provisioner::Provisioner;
use gitea_provisioner::server::{AppState, create_router};

#[derive(Parser)]
#[command(name = "gitea-provisioner")]
#[command(about = "Provisions Gitea repositories for delivery-pipeline projects", long_about = None)]
struct Cli {
    /// Host to bind to
    #[arg(long, env = "RCV_HOST", default_value = "0.0.0.0")]
    host: String,

    /// Port to bind to
    #[arg(long, short, env = "RCV_PORT", default_value = "8080")]
    port: u16,

    /// URL of the Gitea server (e.g., "http://gitea-http:3000")
    #[arg(long, env = "GITEA_ENDPOINT")]
    gitea_endpoint: String,

    /// Name of the Gitea admin account
    #[arg(long, env = "GITEA_USER")]
    gitea_user: String,

    /// Password of the Gitea admin account
    #[arg(long, env = "GITEA_PASSWORD", hide_env_values = true)]
    gitea_password: String,

    /// Prefix for created user names
    #[arg(long, env = "USERNAME_PREFIX", default_value = "")]
    username_prefix: String,

    /// E-mail domain for created users
    #[arg(long, env = "USER_EMAIL_DOMAIN", default_value = DEFAULT_USER_EMAIL_DOMAIN)]
    user_email_domain: String,

    /// Prefix for created repository names
    #[arg(long, env = "PROJECT_PREFIX", default_value = "")]
    project_prefix: String,

    /// Prefix for created access token names
    #[arg(long, env = "TOKEN_PREFIX", default_value = "")]
    token_prefix: String,

    /// Timeout for each request to Gitea, in seconds
    #[arg(long, env = "GITEA_TIMEOUT_SECS", default_value = "30")]
    request_timeout_secs: u64,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive("gitea_provisioner=info".parse()?),
        )
        .init();

    let cli = Cli::parse();

    let server = ServerConfig {
        host: cli.host,
        port: cli.port,
    };

    let mut gitea = GiteaConfig::new(cli.gitea_endpoint, cli.gitea_user, cli.gitea_password);
    gitea.request_timeout = Duration::from_secs(cli.request_timeout_secs);

    let naming = ProvisionerConfig {
        username_prefix: cli.username_prefix,
        user_email_domain: cli.user_email_domain,
        project_prefix: cli.project_prefix,
        token_prefix: cli.token_prefix,
    };

    let provisioner = Provisioner::gitea(&gitea, naming)?;
    info!("Using Gitea endpoint {}", gitea.endpoint);

    let state = Arc::new(AppState::new(Arc::new(provisioner)));
    let app = create_router(state);
    let addr = server.socket_addr()?;

    info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
