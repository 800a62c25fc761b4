use super::service;
use crate::{
    modules::{dish, restaurant},
    types::Context,
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde_json::json;
use std::sync::Arc;

async fn get_menu(
    State(ctx): State<Arc<Context>>,
    Path(restaurant_id): Path<String>,
) -> impl IntoResponse {
    let restaurant =
        match restaurant::repository::find_by_id(&ctx.db_conn.pool, restaurant_id.clone()).await {
            Ok(Some(restaurant)) => restaurant,
            Ok(None) => {
                return (
                    StatusCode::NOT_FOUND,
                    Json(json!({ "error": "Restaurant not found" })),
                )
            }
            Err(_) => {
                return (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "error": "Failed to fetch menu" })),
                )
            }
        };

    match dish::repository::find_many_by_restaurant_id(&ctx.db_conn.pool, restaurant_id).await {
        Ok(dishes) => (
            StatusCode::OK,
            Json(json!({
                "restaurant": {
                    "id": restaurant.id,
                    "name": restaurant.name,
                    "location": restaurant.location,
                    "slug": restaurant.slug,
                },
                "sections": service::group_by_category(dishes),
            })),
        ),
        Err(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": "Failed to fetch menu" })),
        ),
    }
}

pub fn get_router() -> Router<Arc<Context>> {
    Router::new().route("/:restaurant_id", get(get_menu))
}
