//! The repository host the provisioner drives.
//!
//! [`RepositoryHost`] is the set of calls the engine needs from a Gitea-like
//! server. Calls made on behalf of a provisioned account go through an
//! [`Impersonator`], which hands out a second handle acting as that account
//! while still authenticated as the administrator.

pub mod gitea;
pub mod memory;

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use gitea::GiteaHost;
pub use memory::MemoryHost;

#[derive(Debug, Error)]
pub enum HostError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("invalid url: {0}")]
    Url(String),

    #[error("unable to decode response body: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("host unavailable: {0}")]
    Unavailable(String),
}

pub type HostResult<T> = std::result::Result<T, HostError>;

/// Outcome of a host call that reached the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply<T> {
    /// The endpoint answered with its expected success status.
    Success(T),
    NotFound,
    Conflict,
    /// Any other status; kept for logging only.
    Unexpected(u16),
}

impl<T> Reply<T> {
    /// HTTP status equivalent, for log lines.
    #[must_use]
    pub fn status_code(&self) -> u16 {
        match self {
            Reply::Success(_) => 200,
            Reply::NotFound => 404,
            Reply::Conflict => 409,
            Reply::Unexpected(status) => *status,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HostUser {
    #[serde(default)]
    pub id: i64,
    pub login: String,
    #[serde(default)]
    pub email: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct RepositoryOwner {
    #[serde(default)]
    pub login: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HostRepository {
    pub name: String,
    #[serde(default)]
    pub clone_url: String,
    #[serde(default)]
    pub private: bool,
    #[serde(default)]
    pub owner: RepositoryOwner,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HostAccessToken {
    #[serde(default)]
    pub id: i64,
    pub name: String,
    /// Gitea returns the token secret in this field, once.
    #[serde(default)]
    pub sha1: String,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct CreateUserOption {
    pub login_name: String,
    pub username: String,
    pub full_name: String,
    pub email: String,
    pub password: String,
    pub must_change_password: bool,
    pub send_notify: bool,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct CreateRepoOption {
    pub name: String,
    pub description: String,
    pub private: bool,
    pub auto_init: bool,
    pub template: bool,
    pub default_branch: String,
    pub trust_model: String,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct CreateAccessTokenOption {
    pub name: String,
    pub scopes: Vec<String>,
}

/// Calls the provisioner issues against the host.
///
/// Admin-scoped handles serve the account and repository calls; handles
/// returned by an [`Impersonator`] serve the token and listing calls, which
/// act on the impersonated account.
#[async_trait]
pub trait RepositoryHost: Send + Sync {
    async fn get_user(&self, username: &str) -> HostResult<Reply<HostUser>>;

    async fn create_user(&self, opt: &CreateUserOption) -> HostResult<Reply<HostUser>>;

    async fn delete_user(&self, username: &str) -> HostResult<Reply<()>>;

    async fn create_repository(
        &self,
        owner: &str,
        opt: &CreateRepoOption,
    ) -> HostResult<Reply<HostRepository>>;

    async fn delete_repository(&self, owner: &str, name: &str) -> HostResult<Reply<()>>;

    async fn create_access_token(
        &self,
        opt: &CreateAccessTokenOption,
    ) -> HostResult<Reply<HostAccessToken>>;

    async fn delete_access_token(&self, name: &str) -> HostResult<Reply<()>>;

    /// Repositories visible to the account this handle acts as.
    async fn list_my_repositories(&self) -> HostResult<Reply<Vec<HostRepository>>>;
}

/// Builds host handles that act as a given account.
pub trait Impersonator: Send + Sync {
    fn impersonate(&self, username: &str) -> HostResult<Arc<dyn RepositoryHost>>;
}

impl<F> Impersonator for F
where
    F: Fn(&str) -> HostResult<Arc<dyn RepositoryHost>> + Send + Sync,
{
    fn impersonate(&self, username: &str) -> HostResult<Arc<dyn RepositoryHost>> {
        self(username)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reply_status_code() {
        assert_eq!(Reply::Success(()).status_code(), 200);
        assert_eq!(Reply::<()>::NotFound.status_code(), 404);
        assert_eq!(Reply::<()>::Conflict.status_code(), 409);
        assert_eq!(Reply::<()>::Unexpected(503).status_code(), 503);
    }

    #[test]
    fn test_repository_decodes_gitea_payload() {
        let repo: HostRepository = serde_json::from_str(
            r#"{"id":3,"name":"demo","clone_url":"http://gitea/team-a/demo.git","private":true,"owner":{"id":1,"login":"team-a"}}"#,
        )
        .unwrap();
        assert_eq!(repo.owner.login, "team-a");
        assert_eq!(repo.clone_url, "http://gitea/team-a/demo.git");
    }
}
