use crate::config::{DEFAULT_NAMESPACE, ProvisionerConfig};

/// Derives host-side names from caller-supplied namespaces and projects.
#[derive(Debug, Clone)]
pub struct Naming {
    config: ProvisionerConfig,
}

impl Naming {
    #[must_use]
    pub fn new(config: ProvisionerConfig) -> Self {
        Self {
            config: config.normalized(),
        }
    }

    /// Account name for a namespace. An empty namespace maps to
    /// [`DEFAULT_NAMESPACE`] so an unset prefix never yields an empty login.
    #[must_use]
    pub fn username(&self, namespace: &str) -> String {
        let namespace = if namespace.is_empty() {
            DEFAULT_NAMESPACE
        } else {
            namespace
        };
        format!("{}{namespace}", self.config.username_prefix)
    }

    #[must_use]
    pub fn repository_name(&self, project: &str) -> String {
        format!("{}{project}", self.config.project_prefix)
    }

    #[must_use]
    pub fn token_name(&self, project: &str) -> String {
        format!("{}{project}", self.config.token_prefix)
    }

    #[must_use]
    pub fn email(&self, username: &str) -> String {
        format!("{username}@{}", self.config.user_email_domain)
    }
}
