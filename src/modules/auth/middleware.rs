use super::service;
use crate::modules::user;
use crate::modules::user::repository::User;
use crate::types::Context;
use axum::extract::FromRequestParts;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::RequestPartsExt;
use axum::{async_trait, Json};
use axum::{extract::Extension, http, http::request::Parts, response::Response};
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;

enum Error {
    InvalidSession,
}

fn get_token_from_header(header: &str) -> Result<String, Error> {
    header
        .strip_prefix("Bearer ")
        .map(|token| token.trim().to_string())
        .filter(|token| !token.is_empty())
        .ok_or(Error::InvalidSession)
}

async fn get_user_from_header(ctx: Arc<Context>, header: &str) -> Result<User, Error> {
    let token = get_token_from_header(header)?;
    let session = service::auth::verify_access_token(ctx.clone(), token)
        .await
        .map_err(|_| Error::InvalidSession)?;

    let user = user::repository::find_by_id(&ctx.db_conn.pool, session.user_id)
        .await
        .map_err(|_| Error::InvalidSession)?
        .ok_or(Error::InvalidSession)?;

    if !user.is_verified {
        return Err(Error::InvalidSession);
    }

    Ok(user)
}

#[derive(Serialize, Clone)]
pub struct Auth {
    pub user: User,
}

fn unauthorized() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({"error": "Invalid session token"})),
    )
        .into_response()
}

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for Auth {
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, _: &S) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get(http::header::AUTHORIZATION)
            .and_then(|header| header.to_str().ok())
            .map(|header| header.to_string())
            .ok_or_else(unauthorized)?;

        let Extension(ctx) = parts
            .extract::<Extension<Arc<Context>>>()
            .await
            .map_err(|err| {
                tracing::error!("Application context is not attached to the request: {}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "error": "Sorry an error occurred" })),
                )
                    .into_response()
            })?;

        get_user_from_header(ctx, &auth_header)
            .await
            .map(|user| Self { user })
            .map_err(|_| unauthorized())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bearer_token_is_extracted() {
        assert_eq!(
            get_token_from_header("Bearer 01J9ZQ3Y8D").ok(),
            Some("01J9ZQ3Y8D".to_string())
        );
        assert!(get_token_from_header("Basic abc").is_err());
        assert!(get_token_from_header("Bearer ").is_err());
    }
}
