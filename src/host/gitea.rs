use std::sync::Arc;

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode, Url};
use serde::de::DeserializeOwned;

use super::{
    CreateAccessTokenOption, CreateRepoOption, CreateUserOption, HostAccessToken, HostError,
    HostRepository, HostResult, HostUser, Impersonator, Reply, RepositoryHost,
};
use crate::config::GiteaConfig;
use crate::error::{Error, Result};

/// Header Gitea reads to run an admin request as another account.
const SUDO_HEADER: &str = "Sudo";

/// Gitea REST adapter. Authenticates as the admin; when `sudo` is set every
/// request is executed as that account.
#[derive(Clone)]
pub struct GiteaHost {
    client: Client,
    api_base: Url,
    admin_user: String,
    admin_password: String,
    sudo: Option<String>,
}

impl GiteaHost {
    pub fn new(config: &GiteaConfig) -> Result<Self> {
        let api_base = config.api_base()?;
        let client = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| Error::Config(format!("unable to build http client: {e}")))?;

        Ok(Self {
            client,
            api_base,
            admin_user: config.admin_user.clone(),
            admin_password: config.admin_password.clone(),
            sudo: None,
        })
    }

    /// Returns a copy of this handle that acts as `username`.
    #[must_use]
    pub fn acting_as(&self, username: &str) -> Self {
        Self {
            sudo: Some(username.to_string()),
            ..self.clone()
        }
    }

    #[must_use]
    pub fn api_base(&self) -> &Url {
        &self.api_base
    }

    /// The account requests are attributed to.
    fn effective_user(&self) -> &str {
        self.sudo.as_deref().unwrap_or(&self.admin_user)
    }

    fn url(&self, path: &str) -> HostResult<Url> {
        self.api_base
            .join(path)
            .map_err(|e| HostError::Url(format!("{path}: {e}")))
    }

    fn request(&self, method: Method, path: &str) -> HostResult<RequestBuilder> {
        let mut builder = self
            .client
            .request(method, self.url(path)?)
            .basic_auth(&self.admin_user, Some(&self.admin_password));
        if let Some(sudo) = &self.sudo {
            builder = builder.header(SUDO_HEADER, sudo);
        }
        Ok(builder)
    }
}

fn segment(value: &str) -> String {
    urlencoding::encode(value).into_owned()
}

fn classify(status: StatusCode, expected: StatusCode) -> Reply<()> {
    if status == expected {
        return Reply::Success(());
    }
    match status {
        StatusCode::NOT_FOUND => Reply::NotFound,
        StatusCode::CONFLICT => Reply::Conflict,
        other => Reply::Unexpected(other.as_u16()),
    }
}

async fn expect_json<T: DeserializeOwned>(
    response: Response,
    expected: StatusCode,
) -> HostResult<Reply<T>> {
    match classify(response.status(), expected) {
        Reply::Success(()) => {
            let bytes = response.bytes().await?;
            Ok(Reply::Success(serde_json::from_slice(&bytes)?))
        }
        Reply::NotFound => Ok(Reply::NotFound),
        Reply::Conflict => Ok(Reply::Conflict),
        Reply::Unexpected(status) => Ok(Reply::Unexpected(status)),
    }
}

#[async_trait]
impl RepositoryHost for GiteaHost {
    async fn get_user(&self, username: &str) -> HostResult<Reply<HostUser>> {
        let response = self
            .request(Method::GET, &format!("users/{}", segment(username)))?
            .send()
            .await?;
        expect_json(response, StatusCode::OK).await
    }

    async fn create_user(&self, opt: &CreateUserOption) -> HostResult<Reply<HostUser>> {
        let response = self
            .request(Method::POST, "admin/users")?
            .json(opt)
            .send()
            .await?;
        expect_json(response, StatusCode::CREATED).await
    }

    async fn delete_user(&self, username: &str) -> HostResult<Reply<()>> {
        let response = self
            .request(Method::DELETE, &format!("admin/users/{}", segment(username)))?
            .send()
            .await?;
        Ok(classify(response.status(), StatusCode::NO_CONTENT))
    }

    async fn create_repository(
        &self,
        owner: &str,
        opt: &CreateRepoOption,
    ) -> HostResult<Reply<HostRepository>> {
        let response = self
            .request(Method::POST, &format!("admin/users/{}/repos", segment(owner)))?
            .json(opt)
            .send()
            .await?;
        expect_json(response, StatusCode::CREATED).await
    }

    async fn delete_repository(&self, owner: &str, name: &str) -> HostResult<Reply<()>> {
        let response = self
            .request(
                Method::DELETE,
                &format!("repos/{}/{}", segment(owner), segment(name)),
            )?
            .send()
            .await?;
        Ok(classify(response.status(), StatusCode::NO_CONTENT))
    }

    async fn create_access_token(
        &self,
        opt: &CreateAccessTokenOption,
    ) -> HostResult<Reply<HostAccessToken>> {
        let path = format!("users/{}/tokens", segment(self.effective_user()));
        let response = self.request(Method::POST, &path)?.json(opt).send().await?;
        expect_json(response, StatusCode::CREATED).await
    }

    async fn delete_access_token(&self, name: &str) -> HostResult<Reply<()>> {
        let path = format!(
            "users/{}/tokens/{}",
            segment(self.effective_user()),
            segment(name)
        );
        let response = self.request(Method::DELETE, &path)?.send().await?;
        Ok(classify(response.status(), StatusCode::NO_CONTENT))
    }

    async fn list_my_repositories(&self) -> HostResult<Reply<Vec<HostRepository>>> {
        let response = self.request(Method::GET, "user/repos")?.send().await?;
        expect_json(response, StatusCode::OK).await
    }
}

impl Impersonator for GiteaHost {
    fn impersonate(&self, username: &str) -> HostResult<Arc<dyn RepositoryHost>> {
        Ok(Arc::new(self.acting_as(username)))
    }
}
