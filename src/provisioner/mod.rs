//! Creates and tears down the account, repository and access token backing a
//! pipeline project.
//!
//! Every step is a single host call and nothing is recorded locally: the host
//! is queried again on each request. A failure part-way through provisioning
//! leaves the already-created account and repository in place; callers are
//! expected to retry the whole request.

mod naming;
mod password;
mod validation;

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, warn};

pub use naming::Naming;
pub use password::{DEFAULT_PASSWORD_LENGTH, generate_password};
pub use validation::{validate_namespace, validate_project, validate_repository_name};

use crate::config::{GiteaConfig, ProvisionerConfig};
use crate::error::{Error, Result};
use crate::host::{
    CreateAccessTokenOption, CreateRepoOption, CreateUserOption, GiteaHost, Impersonator, Reply,
    RepositoryHost,
};

/// Branch name the delivery pipeline expects in an empty repository.
pub const DEFAULT_BRANCH: &str = "master";

/// Scopes granting the token full read/write access for its account.
pub const TOKEN_SCOPES: [&str; 2] = ["write:repository", "write:user"];

/// Result of a successful provisioning run. Never stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Provisioned {
    pub git_remote_url: String,
    pub git_token: String,
    pub git_user: String,
}

/// The operations the HTTP layer needs from the engine.
#[async_trait]
pub trait GitProvisioner: Send + Sync {
    /// Ensures account, repository and token exist for the pair.
    async fn provision_repository(&self, namespace: &str, project: &str) -> Result<Provisioned>;

    /// Removes the repository and its token, then the account if it owns
    /// nothing else.
    async fn delete_repository(&self, namespace: &str, project: &str) -> Result<()>;
}

pub struct Provisioner {
    host: Arc<dyn RepositoryHost>,
    impersonator: Arc<dyn Impersonator>,
    naming: Naming,
}

impl Provisioner {
    pub fn new(
        host: Arc<dyn RepositoryHost>,
        impersonator: Arc<dyn Impersonator>,
        config: ProvisionerConfig,
    ) -> Self {
        Self {
            host,
            impersonator,
            naming: Naming::new(config),
        }
    }

    /// Provisioner talking to a Gitea server as its admin account.
    pub fn gitea(gitea: &GiteaConfig, config: ProvisionerConfig) -> Result<Self> {
        let host = Arc::new(GiteaHost::new(gitea)?);
        Ok(Self::new(host.clone(), host, config))
    }

    fn validate_request(&self, namespace: &str, project: &str) -> Result<()> {
        validate_project(project)?;
        validate_namespace(namespace)?;
        validate_repository_name(&self.naming.repository_name(project))
    }

    fn impersonate(&self, username: &str) -> Result<Arc<dyn RepositoryHost>> {
        self.impersonator
            .impersonate(username)
            .map_err(|e| Error::transport(format!("act as user {username}"), e))
    }

    /// Ensures the namespace's account exists and returns its name.
    pub async fn create_user(&self, namespace: &str) -> Result<String> {
        validate_namespace(namespace)?;
        let username = self.naming.username(namespace);

        let lookup = self
            .host
            .get_user(&username)
            .await
            .map_err(|e| Error::transport(format!("get user info for user {username}"), e))?;

        match lookup {
            Reply::Success(_) => return Ok(username),
            Reply::NotFound => {}
            other => {
                return Err(Error::upstream(
                    format!("get user info for user {username}"),
                    other.status_code(),
                ));
            }
        }

        info!(%username, "Creating user");

        let opt = CreateUserOption {
            login_name: username.clone(),
            username: username.clone(),
            full_name: username.clone(),
            email: self.naming.email(&username),
            password: generate_password(DEFAULT_PASSWORD_LENGTH),
            must_change_password: false,
            send_notify: false,
        };

        match self
            .host
            .create_user(&opt)
            .await
            .map_err(|e| Error::transport(format!("create user {username}"), e))?
        {
            Reply::Success(_) => Ok(username),
            other => Err(Error::upstream(
                format!("create user {username}"),
                other.status_code(),
            )),
        }
    }

    /// Creates the private, empty repository and returns its clone URL.
    pub async fn create_repository(&self, namespace: &str, project: &str) -> Result<String> {
        self.validate_request(namespace, project)?;

        let owner = self.naming.username(namespace);
        let name = self.naming.repository_name(project);
        let opt = CreateRepoOption {
            description: format!(
                "Repository was automatically provisioned by gitea-provisioner for project {name}"
            ),
            name: name.clone(),
            private: true,
            auto_init: false,
            template: false,
            default_branch: DEFAULT_BRANCH.to_string(),
            trust_model: "default".to_string(),
        };

        info!(%owner, repository = %name, "Creating repository");

        let operation = || format!("create repository {name} for namespace {namespace:?}");
        match self
            .host
            .create_repository(&owner, &opt)
            .await
            .map_err(|e| Error::transport(operation(), e))?
        {
            Reply::Success(repository) => Ok(repository.clone_url),
            Reply::Conflict => Err(Error::RepositoryAlreadyExists),
            other => Err(Error::upstream(operation(), other.status_code())),
        }
    }

    /// Creates the project's access token on behalf of the namespace account.
    pub async fn create_token(&self, namespace: &str, project: &str) -> Result<String> {
        self.validate_request(namespace, project)?;

        let username = self.naming.username(namespace);
        let name = self.naming.token_name(project);
        let sudo = self.impersonate(&username)?;

        let opt = CreateAccessTokenOption {
            name: name.clone(),
            scopes: TOKEN_SCOPES.iter().map(|s| s.to_string()).collect(),
        };

        info!(%username, token = %name, "Creating access token");

        match sudo
            .create_access_token(&opt)
            .await
            .map_err(|e| Error::transport(format!("create access token {name}"), e))?
        {
            Reply::Success(token) => Ok(token.sha1),
            other => Err(Error::upstream(
                format!("create access token {name}"),
                other.status_code(),
            )),
        }
    }

    /// Deletes the account once it no longer owns any repository. Failures
    /// are logged only: the repository and token are already gone.
    ///
    /// Not coordinated with concurrent provisioning in the same namespace; a
    /// repository created between the listing and the delete makes the host
    /// refuse the delete or lose the account.
    async fn remove_account_if_unused(&self, sudo: &dyn RepositoryHost, username: &str) {
        let repositories = match sudo.list_my_repositories().await {
            Ok(Reply::Success(repositories)) => repositories,
            Ok(other) => {
                warn!(%username, status = other.status_code(), "Unable to list repositories of user");
                return;
            }
            Err(e) => {
                warn!(%username, error = %e, "Unable to list repositories of user");
                return;
            }
        };

        let owned = repositories
            .iter()
            .filter(|repo| repo.owner.login == username)
            .count();
        if owned > 0 {
            return;
        }

        info!(%username, "Deleting user without repositories");

        match self.host.delete_user(username).await {
            Ok(Reply::Success(()) | Reply::NotFound) => {}
            Ok(other) => {
                warn!(%username, status = other.status_code(), "Unable to delete user");
            }
            Err(e) => warn!(%username, error = %e, "Unable to delete user"),
        }
    }
}

#[async_trait]
impl GitProvisioner for Provisioner {
    async fn provision_repository(&self, namespace: &str, project: &str) -> Result<Provisioned> {
        self.validate_request(namespace, project)?;

        let git_user = self.create_user(namespace).await?;
        let git_remote_url = self.create_repository(namespace, project).await?;
        let git_token = self.create_token(namespace, project).await?;

        Ok(Provisioned {
            git_remote_url,
            git_token,
            git_user,
        })
    }

    async fn delete_repository(&self, namespace: &str, project: &str) -> Result<()> {
        self.validate_request(namespace, project)?;

        let username = self.naming.username(namespace);
        let repository = self.naming.repository_name(project);
        let token = self.naming.token_name(project);

        info!(%username, %repository, "Deleting repository");

        match self
            .host
            .delete_repository(&username, &repository)
            .await
            .map_err(|e| Error::transport(format!("delete repository {repository}"), e))?
        {
            Reply::Success(()) => {}
            Reply::NotFound => return Err(Error::RepositoryDoesNotExist),
            other => {
                return Err(Error::upstream(
                    format!("delete repository {repository}"),
                    other.status_code(),
                ));
            }
        }

        let sudo = self.impersonate(&username)?;
        match sudo
            .delete_access_token(&token)
            .await
            .map_err(|e| Error::transport(format!("delete access token {token}"), e))?
        {
            Reply::Success(()) => {}
            Reply::NotFound => warn!(%username, %token, "Access token was already deleted"),
            other => {
                return Err(Error::upstream(
                    format!("delete access token {token}"),
                    other.status_code(),
                ));
            }
        }

        self.remove_account_if_unused(sudo.as_ref(), &username).await;
        Ok(())
    }
}
