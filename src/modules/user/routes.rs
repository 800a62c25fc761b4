use crate::{modules::auth::middleware::Auth, types::Context};
use axum::{http::StatusCode, response::IntoResponse, routing::get, Json, Router};
use serde_json::json;
use std::sync::Arc;

async fn get_profile(auth: Auth) -> impl IntoResponse {
    (StatusCode::OK, Json(json!(auth.user)))
}

pub fn get_router() -> Router<Arc<Context>> {
    Router::new().route("/profile", get(get_profile))
}
