//! Request extractors whose rejections use the service error body.
//!
//! axum's own `Json`, `Path` and `Query` reject with plain-text bodies; these
//! wrappers turn the same failures into `ServiceError` so a malformed request
//! gets a status and `code` like any other input error.

use async_trait::async_trait;
use axum::{
    extract::{FromRequest, FromRequestParts, Path, Query, Request},
    http::request::Parts,
    Json,
};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

use crate::errors::ServiceError;

/// JSON body. A `quantity` that is not a whole number is an invalid
/// quantity; every other body problem is a validation error.
#[derive(Debug, Clone)]
pub struct ApiJson<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ServiceError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<Value>::from_request(req, state)
            .await
            .map_err(|rejection| ServiceError::ValidationError(rejection.body_text()))?;

        let invalid_quantity = value
            .get("quantity")
            .filter(|q| q.as_i64().and_then(|n| i32::try_from(n).ok()).is_none())
            .cloned();

        match serde_json::from_value::<T>(value) {
            Ok(payload) => Ok(ApiJson(payload)),
            Err(err) => {
                debug!(error = %err, "rejected request body");
                match invalid_quantity {
                    Some(q) => Err(ServiceError::InvalidQuantity(format!(
                        "Quantity must be a whole number, got {}",
                        q
                    ))),
                    None => Err(ServiceError::ValidationError(format!(
                        "Invalid request body: {}",
                        err
                    ))),
                }
            }
        }
    }
}

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
        Path::<T>::from_request_parts(parts, state)
            .await
            .map(|Path(value)| ApiPath(value))
            .map_err(|rejection| ServiceError::ValidationError(rejection.body_text()))
    }
}

#[derive(Debug, Clone)]
pub struct ApiQuery<T>(pub T);

#[async_trait]
impl<S, T> FromRequestParts<S> for ApiQuery<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ServiceError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        Query::<T>::from_request_parts(parts, state)
            .await
            .map(|Query(value)| ApiQuery(value))
            .map_err(|rejection| ServiceError::ValidationError(rejection.body_text()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use axum::body::Body;
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    struct Payload {
        #[allow(dead_code)]
        quantity: i32,
        #[allow(dead_code)]
        note: String,
    }

    fn json_request(body: &str) -> Request {
        Request::builder()
            .method("POST")
            .uri("/")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn extract(body: &str) -> Result<ApiJson<Payload>, ServiceError> {
        ApiJson::<Payload>::from_request(json_request(body), &()).await
    }

    #[tokio::test]
    async fn non_integer_quantities_are_invalid_quantities() {
        for body in [
            r#"{"quantity": "two", "note": "x"}"#,
            r#"{"quantity": 1.5, "note": "x"}"#,
            r#"{"quantity": 99999999999, "note": "x"}"#,
            r#"{"quantity": null, "note": "x"}"#,
        ] {
            assert_matches!(extract(body).await, Err(ServiceError::InvalidQuantity(_)), "{}", body);
        }
    }

    #[tokio::test]
    async fn other_body_problems_are_validation_errors() {
        assert_matches!(
            extract(r#"{"quantity": 2}"#).await,
            Err(ServiceError::ValidationError(_))
        );
        assert_matches!(extract("{not json").await, Err(ServiceError::ValidationError(_)));
        assert!(extract(r#"{"quantity": 2, "note": "x"}"#).await.is_ok());
    }
}
