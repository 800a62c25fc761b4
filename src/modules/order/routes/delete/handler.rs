use crate::{
    modules::{auth::middleware::Auth, order::repository},
    types::Context,
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde_json::json;
use std::sync::Arc;

pub async fn handler(
    State(ctx): State<Arc<Context>>,
    auth: Auth,
    Path(id): Path<String>,
) -> impl IntoResponse {
    match repository::find_by_id_and_owner_id(&ctx.db_conn.pool, id.clone(), auth.user.id.clone())
        .await
    {
        Ok(Some(_)) => match repository::delete_by_id(&ctx.db_conn.pool, id).await {
            Ok(_) => (
                StatusCode::OK,
                Json(json!({ "message": "Order deleted successfully" })),
            ),
            Err(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "Failed to delete order" })),
            ),
        },
        Ok(None) => (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": "Order not found" })),
        ),
        Err(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": "Failed to delete order" })),
        ),
    }
}
