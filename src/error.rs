use thiserror::Error;

use crate::host::HostError;

#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("the repository already exists")]
    RepositoryAlreadyExists,

    #[error("the repository does not exist")]
    RepositoryDoesNotExist,

    /// The host answered, but not with the status the step expects.
    #[error("unable to {operation}, received unexpected status code: {status}")]
    Upstream { operation: String, status: u16 },

    #[error("unable to {operation}: {source}")]
    Transport {
        operation: String,
        #[source]
        source: HostError,
    },

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl Error {
    pub fn upstream(operation: impl Into<String>, status: u16) -> Self {
        Self::Upstream {
            operation: operation.into(),
            status,
        }
    }

    pub fn transport(operation: impl Into<String>, source: HostError) -> Self {
        Self::Transport {
            operation: operation.into(),
            source,
        }
    }

    /// True for failures caused by the host rather than by the caller.
    #[must_use]
    pub fn is_upstream(&self) -> bool {
        matches!(self, Self::Upstream { .. } | Self::Transport { .. })
    }
}

pub type Result<T> = std::result::Result<T, Error>;
