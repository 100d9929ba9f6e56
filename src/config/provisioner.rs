use std::fmt;
use std::time::Duration;

use reqwest::Url;

use crate::error::{Error, Result};

/// Namespace used when a request does not name one.
pub const DEFAULT_NAMESPACE: &str = "keptn";

/// Gitea refuses accounts without an e-mail address, so one is always derived.
pub const DEFAULT_USER_EMAIL_DOMAIN: &str = "keptn-gitea-auto-provisioner.local";

const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Naming rules applied to every resource created on the host.
#[derive(Debug, Clone)]
pub struct ProvisionerConfig {
    pub username_prefix: String,
    pub user_email_domain: String,
    pub project_prefix: String,
    pub token_prefix: String,
}

impl ProvisionerConfig {
    /// Replaces an empty e-mail domain with [`DEFAULT_USER_EMAIL_DOMAIN`].
    #[must_use]
    pub fn normalized(mut self) -> Self {
        if self.user_email_domain.trim().is_empty() {
            self.user_email_domain = DEFAULT_USER_EMAIL_DOMAIN.to_string();
        }
        self
    }
}

impl Default for ProvisionerConfig {
    fn default() -> Self {
        Self {
            username_prefix: String::new(),
            user_email_domain: DEFAULT_USER_EMAIL_DOMAIN.to_string(),
            project_prefix: String::new(),
            token_prefix: String::new(),
        }
    }
}

/// Connection details for the Gitea admin account.
#[derive(Clone)]
pub struct GiteaConfig {
    pub endpoint: String,
    pub admin_user: String,
    pub admin_password: String,
    pub request_timeout: Duration,
}

impl GiteaConfig {
    pub fn new(
        endpoint: impl Into<String>,
        admin_user: impl Into<String>,
        admin_password: impl Into<String>,
    ) -> Self {
        Self {
            endpoint: endpoint.into(),
            admin_user: admin_user.into(),
            admin_password: admin_password.into(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    /// Parses the endpoint into the base URL of the Gitea REST API.
    pub fn api_base(&self) -> Result<Url> {
        let endpoint = Url::parse(self.endpoint.trim())
            .map_err(|e| Error::Config(format!("invalid Gitea endpoint {:?}: {e}", self.endpoint)))?;

        if !matches!(endpoint.scheme(), "http" | "https") {
            return Err(Error::Config(format!(
                "Gitea endpoint must use http or https, got {}",
                endpoint.scheme()
            )));
        }
        if self.admin_user.is_empty() {
            return Err(Error::Config("Gitea admin user cannot be empty".to_string()));
        }

        let base = format!("{}/api/v1/", endpoint.as_str().trim_end_matches('/'));
        Url::parse(&base).map_err(|e| Error::Config(format!("invalid Gitea endpoint: {e}")))
    }
}

impl fmt::Debug for GiteaConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GiteaConfig")
            .field("endpoint", &self.endpoint)
            .field("admin_user", &self.admin_user)
            .field("admin_password", &"<redacted>")
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}
