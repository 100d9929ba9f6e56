use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use rand::Rng;

use super::{
    CreateAccessTokenOption, CreateRepoOption, CreateUserOption, HostAccessToken, HostError,
    HostRepository, HostResult, HostUser, Impersonator, Reply, RepositoryHost, RepositoryOwner,
};

const ADMIN_USER: &str = "admin";
const CLONE_BASE_URL: &str = "http://memory.host";
const UNPROCESSABLE: u16 = 422;

#[derive(Default)]
struct State {
    users: BTreeMap<String, HostUser>,
    repositories: BTreeMap<(String, String), HostRepository>,
    tokens: BTreeMap<(String, String), HostAccessToken>,
    calls: HashMap<&'static str, usize>,
    unavailable: bool,
    next_id: i64,
}

impl State {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }
}

/// Host that keeps accounts, repositories and tokens in memory, following
/// Gitea's status semantics. Handles created with [`MemoryHost::acting_as`]
/// share state with the handle they came from.
#[derive(Clone, Default)]
pub struct MemoryHost {
    state: Arc<Mutex<State>>,
    sudo: Option<String>,
}

impl MemoryHost {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn acting_as(&self, username: &str) -> Self {
        Self {
            state: Arc::clone(&self.state),
            sudo: Some(username.to_string()),
        }
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn effective_user(&self) -> String {
        self.sudo.clone().unwrap_or_else(|| ADMIN_USER.to_string())
    }

    /// Records the call and fails it if the host was made unavailable.
    fn enter(&self, op: &'static str) -> HostResult<MutexGuard<'_, State>> {
        let mut state = self.state();
        *state.calls.entry(op).or_default() += 1;
        if state.unavailable {
            return Err(HostError::Unavailable(format!("{op} refused")));
        }
        Ok(state)
    }

    /// Makes every following call fail with a transport-style error.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.state().unavailable = unavailable;
    }

    /// Number of times `op` (a [`RepositoryHost`] method name) was invoked.
    #[must_use]
    pub fn call_count(&self, op: &str) -> usize {
        self.state().calls.get(op).copied().unwrap_or(0)
    }

    #[must_use]
    pub fn user(&self, username: &str) -> Option<HostUser> {
        self.state().users.get(username).cloned()
    }

    #[must_use]
    pub fn has_user(&self, username: &str) -> bool {
        self.state().users.contains_key(username)
    }

    /// The stored repository, as the host would report it.
    #[must_use]
    pub fn repository(&self, owner: &str, name: &str) -> Option<HostRepository> {
        self.state()
            .repositories
            .get(&(owner.to_string(), name.to_string()))
            .cloned()
    }

    #[must_use]
    pub fn has_repository(&self, owner: &str, name: &str) -> bool {
        self.repository(owner, name).is_some()
    }

    #[must_use]
    pub fn has_token(&self, username: &str, name: &str) -> bool {
        self.state()
            .tokens
            .contains_key(&(username.to_string(), name.to_string()))
    }

    /// Inserts an account directly, bypassing call accounting.
    pub fn insert_user(&self, username: &str) {
        let mut state = self.state();
        let id = state.next_id();
        state.users.insert(
            username.to_string(),
            HostUser {
                id,
                login: username.to_string(),
                email: String::new(),
            },
        );
    }
}

fn generate_token_secret() -> String {
    let mut rng = rand::thread_rng();
    (0..40)
        .map(|_| char::from_digit(rng.gen_range(0..16), 16).unwrap_or('0'))
        .collect()
}

#[async_trait]
impl RepositoryHost for MemoryHost {
    async fn get_user(&self, username: &str) -> HostResult<Reply<HostUser>> {
        let state = self.enter("get_user")?;
        Ok(match state.users.get(username) {
            Some(user) => Reply::Success(user.clone()),
            None => Reply::NotFound,
        })
    }

    async fn create_user(&self, opt: &CreateUserOption) -> HostResult<Reply<HostUser>> {
        let mut state = self.enter("create_user")?;
        if opt.username.is_empty() || state.users.contains_key(&opt.username) {
            return Ok(Reply::Unexpected(UNPROCESSABLE));
        }

        let user = HostUser {
            id: state.next_id(),
            login: opt.username.clone(),
            email: opt.email.clone(),
        };
        state.users.insert(opt.username.clone(), user.clone());
        Ok(Reply::Success(user))
    }

    async fn delete_user(&self, username: &str) -> HostResult<Reply<()>> {
        let mut state = self.enter("delete_user")?;
        if !state.users.contains_key(username) {
            return Ok(Reply::NotFound);
        }
        if state.repositories.keys().any(|(owner, _)| owner == username) {
            return Ok(Reply::Unexpected(UNPROCESSABLE));
        }

        state.users.remove(username);
        state.tokens.retain(|(owner, _), _| owner != username);
        Ok(Reply::Success(()))
    }

    async fn create_repository(
        &self,
        owner: &str,
        opt: &CreateRepoOption,
    ) -> HostResult<Reply<HostRepository>> {
        let mut state = self.enter("create_repository")?;
        if !state.users.contains_key(owner) {
            return Ok(Reply::NotFound);
        }
        let key = (owner.to_string(), opt.name.clone());
        if state.repositories.contains_key(&key) {
            return Ok(Reply::Conflict);
        }

        let repository = HostRepository {
            name: opt.name.clone(),
            clone_url: format!("{CLONE_BASE_URL}/{owner}/{}.git", opt.name),
            private: opt.private,
            owner: RepositoryOwner {
                login: owner.to_string(),
            },
        };
        state.repositories.insert(key, repository.clone());
        Ok(Reply::Success(repository))
    }

    async fn delete_repository(&self, owner: &str, name: &str) -> HostResult<Reply<()>> {
        let mut state = self.enter("delete_repository")?;
        Ok(
            match state
                .repositories
                .remove(&(owner.to_string(), name.to_string()))
            {
                Some(_) => Reply::Success(()),
                None => Reply::NotFound,
            },
        )
    }

    async fn create_access_token(
        &self,
        opt: &CreateAccessTokenOption,
    ) -> HostResult<Reply<HostAccessToken>> {
        let user = self.effective_user();
        let mut state = self.enter("create_access_token")?;
        if !state.users.contains_key(&user) {
            return Ok(Reply::NotFound);
        }
        let key = (user, opt.name.clone());
        if opt.name.is_empty() || state.tokens.contains_key(&key) {
            return Ok(Reply::Unexpected(UNPROCESSABLE));
        }

        let token = HostAccessToken {
            id: state.next_id(),
            name: opt.name.clone(),
            sha1: generate_token_secret(),
        };
        state.tokens.insert(key, token.clone());
        Ok(Reply::Success(token))
    }

    async fn delete_access_token(&self, name: &str) -> HostResult<Reply<()>> {
        let user = self.effective_user();
        let mut state = self.enter("delete_access_token")?;
        Ok(match state.tokens.remove(&(user, name.to_string())) {
            Some(_) => Reply::Success(()),
            None => Reply::NotFound,
        })
    }

    async fn list_my_repositories(&self) -> HostResult<Reply<Vec<HostRepository>>> {
        let user = self.effective_user();
        let state = self.enter("list_my_repositories")?;
        Ok(Reply::Success(
            state
                .repositories
                .iter()
                .filter(|((owner, _), _)| *owner == user)
                .map(|(_, repo)| repo.clone())
                .collect(),
        ))
    }
}

impl Impersonator for MemoryHost {
    fn impersonate(&self, username: &str) -> HostResult<Arc<dyn RepositoryHost>> {
        Ok(Arc::new(self.acting_as(username)))
    }
}
