use super::*;

#[test]
fn http_status_mapping() {
    assert_eq!(AppError::validation("validation_error", "oops").http_status(), 400);
    assert_eq!(AppError::unauthorized().http_status(), 401);
    assert_eq!(AppError::not_found("not_found", "missing").http_status(), 404);
    assert_eq!(AppError::too_large("payload_too_large", "big").http_status(), 413);
    assert_eq!(AppError::unavailable("storage_unavailable", "down").http_status(), 503);
    assert_eq!(AppError::storage("storage_error", "bad row").http_status(), 500);
    assert_eq!(AppError::internal("internal", "io").http_status(), 500);
}

#[test]
fn unauthorized_message_is_generic() {
    let e = AppError::unauthorized();
    assert_eq!(e.code_str(), "unauthorized");
    assert_eq!(e.message(), "invalid credentials");
}

#[test]
fn store_errors_keep_unavailable_distinct() {
    let down: AppError = StoreError::Unavailable("connection closed".into()).into();
    assert_eq!(down.http_status(), 503);
    assert_eq!(down.code_str(), "storage_unavailable");

    let failed: AppError = StoreError::Backend("duplicate key".into()).into();
    assert_eq!(failed.http_status(), 500);
    assert_eq!(failed.code_str(), "storage_error");
}

#[tokio::test]
async fn renders_json_body() {
    let resp = AppError::not_found("not_found", "portfolio item 9 not found").into_response();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    let v: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(v["status"], "error");
    assert_eq!(v["code"], "not_found");
    assert_eq!(v["message"], "portfolio item 9 not found");
}
