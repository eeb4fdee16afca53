use http_body_util::BodyExt;

use super::*;
use crate::rate_limit::RateLimitError;

async fn body_json(response: Response) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn renders_error_envelope() {
    let response = ApiError::NotFound("job offer not found".into()).into_response();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(response).await, serde_json::json!({"error": "job offer not found"}));
}

#[tokio::test]
async fn internal_errors_hide_details() {
    let err = ApiError::from(RecordError::Database(sqlx::Error::PoolTimedOut));
    assert_eq!(err, ApiError::Internal);
    let response = err.into_response();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body_json(response).await["error"], "Internal server error");
}

#[test]
fn record_errors_map_to_statuses() {
    assert_eq!(ApiError::from(RecordError::NotFound("filter")).status(), StatusCode::NOT_FOUND);
    assert_eq!(ApiError::from(RecordError::Forbidden("nope")).status(), StatusCode::FORBIDDEN);
    assert_eq!(
        ApiError::from(RecordError::Conflict("application")),
        ApiError::Conflict("application already exists".into())
    );
    assert_eq!(ApiError::from(RecordError::Invalid("bad".into())).status(), StatusCode::BAD_REQUEST);
}

#[test]
fn auth_errors_map_to_statuses() {
    assert_eq!(
        ApiError::from(AuthError::InvalidCredentials),
        ApiError::Unauthorized("Invalid email or password".into())
    );
    assert_eq!(ApiError::from(AuthError::Unauthenticated).status(), StatusCode::UNAUTHORIZED);
    assert_eq!(ApiError::from(AuthError::EmailTaken).status(), StatusCode::CONFLICT);
    let throttled = AuthError::TooManyAttempts(RateLimitError::TooManyAttempts { limit: 3, window_secs: 60 });
    assert_eq!(ApiError::from(throttled).status(), StatusCode::TOO_MANY_REQUESTS);
}

#[test]
fn csrf_errors_are_forbidden() {
    assert_eq!(ApiError::from(CsrfError::MissingHeader).status(), StatusCode::FORBIDDEN);
}
