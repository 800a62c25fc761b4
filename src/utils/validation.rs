use axum::{
    async_trait,
    extract::{rejection::JsonRejection, FromRequest, Request},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use validator::ValidationErrors;

pub fn into_response(errors: ValidationErrors) -> (StatusCode, Json<serde_json::Value>) {
    (StatusCode::BAD_REQUEST, Json(json!({"errors": errors})))
}

pub fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}

/// Same as `Json`, but a body that does not parse is a 400 `{ "error": .. }`.
pub struct JsonBody<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for JsonBody<T>
where
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(JsonBody(value)),
            Err(rejection) => {
                tracing::warn!("Failed to parse request body: {}", rejection.body_text());
                Err((
                    StatusCode::BAD_REQUEST,
                    Json(json!({ "error": rejection.body_text() })),
                )
                    .into_response())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::order::repository::OrderStatus;
    use axum::{body::Body, http::header};
    use serde::Deserialize;

    #[derive(Deserialize)]
    struct StatusChange {
        status: OrderStatus,
    }

    fn request(body: &str) -> Request {
        Request::builder()
            .method("PATCH")
            .uri("/orders/01J9ZQ3Y8D8X9M7Q2W4K6T1B3C")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn known_status_is_extracted() {
        let body = request(r#"{"status":"ready"}"#);
        let JsonBody(change) = JsonBody::<StatusChange>::from_request(body, &())
            .await
            .ok()
            .unwrap();

        assert_eq!(change.status, OrderStatus::Ready);
    }

    #[tokio::test]
    async fn unknown_status_is_a_bad_request() {
        let body = request(r#"{"status":"shipped"}"#);
        let response = JsonBody::<StatusChange>::from_request(body, &())
            .await
            .err()
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn malformed_body_is_a_bad_request() {
        let response = JsonBody::<StatusChange>::from_request(request("{status"), &())
            .await
            .err()
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
