use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use tracing::{error, warn};

use crate::error::Error;

/// Status-only error response. Details go to the log, never to the body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ApiError {
    pub status: StatusCode,
}

impl ApiError {
    #[must_use]
    pub fn bad_request() -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
        }
    }

    /// Maps an engine failure to its outward status and logs it.
    #[must_use]
    pub fn from_engine(action: &str, err: &Error) -> Self {
        let status = status_for(err);
        if status.is_server_error() || status == StatusCode::FAILED_DEPENDENCY {
            error!("Unable to {action}: {err}");
        } else {
            warn!("Unable to {action}: {err}");
        }
        Self { status }
    }
}

/// The only place engine conditions become HTTP status codes.
#[must_use]
pub fn status_for(err: &Error) -> StatusCode {
    match err {
        Error::InvalidRequest(_) => StatusCode::UNPROCESSABLE_ENTITY,
        Error::RepositoryAlreadyExists => StatusCode::CONFLICT,
        Error::RepositoryDoesNotExist => StatusCode::NOT_FOUND,
        Error::Upstream { .. } | Error::Transport { .. } => StatusCode::FAILED_DEPENDENCY,
        Error::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        self.status.into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::HostError;

    #[test]
    fn test_status_for_taxonomy() {
        assert_eq!(
            status_for(&Error::InvalidRequest("empty".into())),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(status_for(&Error::RepositoryAlreadyExists), StatusCode::CONFLICT);
        assert_eq!(status_for(&Error::RepositoryDoesNotExist), StatusCode::NOT_FOUND);
        assert_eq!(
            status_for(&Error::upstream("create user", 403)),
            StatusCode::FAILED_DEPENDENCY
        );
        assert_eq!(
            status_for(&Error::transport(
                "create user",
                HostError::Unavailable("down".into())
            )),
            StatusCode::FAILED_DEPENDENCY
        );
    }
}
