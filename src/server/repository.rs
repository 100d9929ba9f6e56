use std::sync::Arc;

use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{MethodRouter, post},
};
use bytes::Bytes;
use tracing::{info, warn};

use crate::server::AppState;
use crate::server::dto::{ProvisionRequest, ProvisionResponse};
use crate::server::response::ApiError;

/// `POST` provisions, `DELETE` tears down; other methods get 405 from axum.
pub fn repository_routes() -> MethodRouter<Arc<AppState>> {
    post(provision_repository).delete(delete_repository)
}

/// Decodes the body regardless of `Content-Type`; anything that is not a
/// request object is a 400.
fn decode_request(body: &[u8]) -> Result<ProvisionRequest, ApiError> {
    serde_json::from_slice(body).map_err(|e| {
        warn!("Unable to process request body: {e}");
        ApiError::bad_request()
    })
}

/// - 201 with the remote URL, token and user once everything exists
/// - 400 if the body cannot be decoded
/// - 409 if the repository already exists on the host
/// - 422 if the project is empty
/// - 424 if the host failed
pub async fn provision_repository(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<impl IntoResponse, ApiError> {
    let request = decode_request(&body)?;

    info!(
        "Provisioning repository {:?} for namespace {:?}",
        request.project, request.namespace
    );

    let provisioned = state
        .provisioner
        .provision_repository(&request.namespace, &request.project)
        .await
        .map_err(|e| ApiError::from_engine("provision repository", &e))?;

    Ok((
        StatusCode::CREATED,
        Json(ProvisionResponse::from(provisioned)),
    ))
}

/// - 204 once repository and token are gone
/// - 400 if the body cannot be decoded
/// - 404 if the repository does not exist
/// - 422 if the project is empty
/// - 424 if the host failed
pub async fn delete_repository(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<StatusCode, ApiError> {
    let request = decode_request(&body)?;

    info!(
        "Deleting repository {:?} in namespace {:?}",
        request.project, request.namespace
    );

    state
        .provisioner
        .delete_repository(&request.namespace, &request.project)
        .await
        .map_err(|e| ApiError::from_engine("delete repository", &e))?;

    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use axum::body::{Body, to_bytes};
    use axum::http::{Method, Request};
    use serde_json::Value;
    use tower::ServiceExt;

    use super::*;
    use crate::error::{Error, Result};
    use crate::host::HostError;
    use crate::provisioner::{GitProvisioner, Provisioned};
    use crate::server::create_router;

    enum Outcome {
        Ok,
        AlreadyExists,
        DoesNotExist,
        Upstream,
    }

    /// Records calls and answers with a fixed outcome; empty projects are
    /// rejected the way the engine does.
    struct StubProvisioner {
        outcome: Outcome,
        calls: Mutex<Vec<(String, String)>>,
    }

    impl StubProvisioner {
        fn new(outcome: Outcome) -> Arc<Self> {
            Arc::new(Self {
                outcome,
                calls: Mutex::new(Vec::new()),
            })
        }

        fn calls(&self) -> Vec<(String, String)> {
            self.calls.lock().unwrap().clone()
        }

        fn answer(&self, namespace: &str, project: &str) -> Result<()> {
            self.calls
                .lock()
                .unwrap()
                .push((namespace.to_string(), project.to_string()));
            if project.is_empty() {
                return Err(Error::InvalidRequest("empty project".into()));
            }
            match self.outcome {
                Outcome::Ok => Ok(()),
                Outcome::AlreadyExists => Err(Error::RepositoryAlreadyExists),
                Outcome::DoesNotExist => Err(Error::RepositoryDoesNotExist),
                Outcome::Upstream => Err(Error::transport(
                    "create user",
                    HostError::Unavailable("upstream error".into()),
                )),
            }
        }
    }

    #[async_trait]
    impl GitProvisioner for StubProvisioner {
        async fn provision_repository(&self, namespace: &str, project: &str) -> Result<Provisioned> {
            self.answer(namespace, project)?;
            Ok(Provisioned {
                git_remote_url: "http://some.git.server:9999/user-keptn/repository-test".into(),
                git_token: "8399p4q8cbunq983N489VNB2Q89T7B09".into(),
                git_user: "user-keptn".into(),
            })
        }

        async fn delete_repository(&self, namespace: &str, project: &str) -> Result<()> {
            self.answer(namespace, project)
        }
    }

    async fn send(
        provisioner: Arc<StubProvisioner>,
        method: Method,
        body: &'static str,
    ) -> (StatusCode, Bytes) {
        let router = create_router(Arc::new(AppState::new(provisioner)));
        let request = Request::builder()
            .method(method)
            .uri("/repository")
            .body(Body::from(body))
            .unwrap();
        let response = router.oneshot(request).await.unwrap();
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, body)
    }

    const BODY: &str = r#"{"namespace":"keptn","project":"test"}"#;

    #[tokio::test]
    async fn test_create_repository() {
        let provisioner = StubProvisioner::new(Outcome::Ok);
        let (status, body) = send(provisioner.clone(), Method::POST, BODY).await;

        assert_eq!(status, StatusCode::CREATED);
        let value: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "gitRemoteURL": "http://some.git.server:9999/user-keptn/repository-test",
                "gitToken": "8399p4q8cbunq983N489VNB2Q89T7B09",
                "gitUser": "user-keptn",
            })
        );
        assert_eq!(provisioner.calls(), vec![("keptn".into(), "test".into())]);
    }

    #[tokio::test]
    async fn test_create_repository_conflict() {
        let (status, body) =
            send(StubProvisioner::new(Outcome::AlreadyExists), Method::POST, BODY).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert!(body.is_empty());
    }

    #[tokio::test]
    async fn test_delete_repository() {
        let (status, body) = send(StubProvisioner::new(Outcome::Ok), Method::DELETE, BODY).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        assert!(body.is_empty());
    }

    #[tokio::test]
    async fn test_delete_repository_not_found() {
        let (status, body) =
            send(StubProvisioner::new(Outcome::DoesNotExist), Method::DELETE, BODY).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body.is_empty());
    }

    #[tokio::test]
    async fn test_invalid_request_bodies() {
        let cases = [
            (Method::POST, "{}", StatusCode::UNPROCESSABLE_ENTITY),
            (Method::POST, "asiovsadifvbsapüoi", StatusCode::BAD_REQUEST),
            (Method::DELETE, "{}", StatusCode::UNPROCESSABLE_ENTITY),
            (Method::DELETE, "asiovsadifvbsapüoi", StatusCode::BAD_REQUEST),
            (Method::POST, r#"{"project": 5}"#, StatusCode::BAD_REQUEST),
        ];

        for (method, content, expected) in cases {
            let (status, body) =
                send(StubProvisioner::new(Outcome::Ok), method.clone(), content).await;
            assert_eq!(status, expected, "{method} {content}");
            assert!(body.is_empty(), "{method} {content}");
        }
    }

    #[tokio::test]
    async fn test_null_fields_decode_as_empty() {
        let provisioner = StubProvisioner::new(Outcome::Ok);
        let (status, _) = send(
            provisioner.clone(),
            Method::POST,
            r#"{"project":"demo","namespace":null}"#,
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(provisioner.calls(), vec![(String::new(), "demo".into())]);

        for method in [Method::POST, Method::DELETE] {
            let (status, body) = send(
                StubProvisioner::new(Outcome::Ok),
                method,
                r#"{"project":null,"namespace":"keptn"}"#,
            )
            .await;
            assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
            assert!(body.is_empty());
        }
    }

    #[tokio::test]
    async fn test_undecodable_body_never_reaches_engine() {
        let provisioner = StubProvisioner::new(Outcome::Ok);
        send(provisioner.clone(), Method::POST, "not json").await;
        assert!(provisioner.calls().is_empty());
    }

    #[tokio::test]
    async fn test_invalid_method() {
        for method in [Method::GET, Method::PUT, Method::PATCH] {
            let (status, body) = send(StubProvisioner::new(Outcome::Ok), method, "").await;
            assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
            assert!(body.is_empty());
        }
    }

    #[tokio::test]
    async fn test_unresponsive_upstream() {
        for method in [Method::POST, Method::DELETE] {
            let (status, body) =
                send(StubProvisioner::new(Outcome::Upstream), method, BODY).await;
            assert_eq!(status, StatusCode::FAILED_DEPENDENCY);
            assert!(body.is_empty());
        }
    }

    #[tokio::test]
    async fn test_health() {
        let router = create_router(Arc::new(AppState::new(StubProvisioner::new(Outcome::Ok))));
        let request = Request::builder().uri("/health").body(Body::empty()).unwrap();
        let response = router.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
