mod provisioner;
mod server;

pub use provisioner::{
    DEFAULT_NAMESPACE, DEFAULT_USER_EMAIL_DOMAIN, GiteaConfig, ProvisionerConfig,
};
pub use server::ServerConfig;
