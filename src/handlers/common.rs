use crate::errors::ServiceError;
use async_trait::async_trait;
use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        FromRequest, FromRequestParts, Path, Request,
    },
    http::{request::Parts, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{de::DeserializeOwned, Serialize};
use validator::Validate;

/// Standard success response
pub fn success_response<T: Serialize>(data: T) -> Response {
    (StatusCode::OK, Json(data)).into_response()
}

/// Standard created response
pub fn created_response<T: Serialize>(data: T) -> Response {
    (StatusCode::CREATED, Json(data)).into_response()
}

/// Standard no content response
pub fn no_content_response() -> Response {
    StatusCode::NO_CONTENT.into_response()
}

/// Validate request input
pub fn validate_input<T: Validate>(input: &T) -> Result<(), ServiceError> {
    input.validate().map_err(ServiceError::from)
}

/// JSON body that has been deserialized and validated; failures surface as
/// the standard JSON error body instead of axum's plain-text rejection.
#[derive(Debug, Clone)]
pub struct ValidatedJson<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate + Send,
    S: Send + Sync,
{
    type Rejection = ServiceError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(map_json_rejection)?;
        validate_input(&value)?;
        Ok(Self(value))
    }
}

fn map_json_rejection(rejection: JsonRejection) -> ServiceError {
    match rejection {
        JsonRejection::JsonDataError(err) => ServiceError::ValidationError(err.body_text()),
        other => ServiceError::BadRequest(other.body_text()),
    }
}

/// Path parameters whose parse failures answer with the JSON error body
#[derive(Debug, Clone)]
pub struct ApiPath<T>(pub T);

#[async_trait]
impl<S, T> FromRequestParts<S> for ApiPath<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
{
    type Rejection = ServiceError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(value) = Path::<T>::from_request_parts(parts, state)
            .await
            .map_err(map_path_rejection)?;
        Ok(Self(value))
    }
}

fn map_path_rejection(rejection: PathRejection) -> ServiceError {
    ServiceError::BadRequest(rejection.body_text())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::{to_bytes, Body},
        http::Request as HttpRequest,
        routing::{get, post},
        Router,
    };
    use serde::Deserialize;
    use tower::ServiceExt;

    #[derive(Debug, Deserialize, Validate)]
    struct Payload {
        #[validate(length(min = 1))]
        name: String,
    }

    async fn echo(ValidatedJson(payload): ValidatedJson<Payload>) -> Response {
        success_response(payload.name)
    }

    async fn send(body: &'static str) -> StatusCode {
        Router::new()
            .route("/", post(echo))
            .oneshot(
                HttpRequest::builder()
                    .method("POST")
                    .uri("/")
                    .header("content-type", "application/json")
                    .body(Body::from(body))
                    .unwrap(),
            )
            .await
            .unwrap()
            .status()
    }

    #[tokio::test]
    async fn valid_payload_passes() {
        assert_eq!(send(r#"{"name":"bolts"}"#).await, StatusCode::OK);
    }

    #[tokio::test]
    async fn validation_failure_is_bad_request() {
        assert_eq!(send(r#"{"name":""}"#).await, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn malformed_json_is_bad_request() {
        assert_eq!(send(r#"{"name":"#).await, StatusCode::BAD_REQUEST);
        assert_eq!(send(r#"{"name":7}"#).await, StatusCode::BAD_REQUEST);
    }

    async fn show(ApiPath(id): ApiPath<i32>) -> Response {
        success_response(id)
    }

    async fn get_path(uri: &str) -> (StatusCode, serde_json::Value) {
        let response = Router::new()
            .route("/items/:id", get(show))
            .oneshot(HttpRequest::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn numeric_path_id_is_extracted() {
        let (status, body) = get_path("/items/42").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, serde_json::json!(42));
    }

    #[tokio::test]
    async fn unparsable_path_id_is_a_json_bad_request() {
        for uri in ["/items/abc", "/items/99999999999"] {
            let (status, body) = get_path(uri).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "{}", uri);
            assert_eq!(body["error"], "Bad Request", "{}", uri);
            assert!(body["message"].as_str().unwrap().contains("i32"), "{}", uri);
        }
    }
}
