use super::repository;
use crate::{
    modules::{auth::middleware::Auth, dish},
    types::Context,
    utils::{self, pagination::Pagination, validation::JsonBody},
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use validator::Validate;

#[derive(Deserialize, Validate)]
struct CreateRestaurantPayload {
    #[validate(length(min = 2, message = "Name must be at least 2 characters"))]
    name: String,
    #[validate(length(min = 2, message = "Location must be at least 2 characters"))]
    location: String,
}

async fn create_restaurant(
    State(ctx): State<Arc<Context>>,
    auth: Auth,
    JsonBody(payload): JsonBody<CreateRestaurantPayload>,
) -> impl IntoResponse {
    if let Err(errors) = payload.validate() {
        return utils::validation::into_response(errors);
    }

    match repository::create(
        &ctx.db_conn.pool,
        repository::CreateRestaurantPayload {
            name: payload.name.trim().to_string(),
            location: payload.location.trim().to_string(),
            owner_id: auth.user.id.clone(),
        },
    )
    .await
    {
        Ok(restaurant) => (StatusCode::CREATED, Json(json!(restaurant))),
        Err(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": "Failed to create restaurant" })),
        ),
    }
}

async fn get_restaurants(
    State(ctx): State<Arc<Context>>,
    auth: Auth,
    pagination: Pagination,
) -> impl IntoResponse {
    match repository::find_many_by_owner_id(&ctx.db_conn.pool, auth.user.id.clone(), pagination)
        .await
    {
        Ok(restaurants) => (StatusCode::OK, Json(json!(restaurants))),
        Err(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": "Failed to fetch restaurants" })),
        ),
    }
}

async fn get_restaurant_by_id(
    State(ctx): State<Arc<Context>>,
    auth: Auth,
    Path(id): Path<String>,
) -> impl IntoResponse {
    match repository::find_by_id_and_owner_id(&ctx.db_conn.pool, id, auth.user.id.clone()).await {
        Ok(Some(restaurant)) => (StatusCode::OK, Json(json!(restaurant))),
        Ok(None) => (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": "Restaurant not found" })),
        ),
        Err(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": "Failed to fetch restaurant" })),
        ),
    }
}

#[derive(Deserialize, Validate)]
struct UpdateRestaurantPayload {
    #[validate(length(min = 2, message = "Name must be at least 2 characters"))]
    name: Option<String>,
    #[validate(length(min = 2, message = "Location must be at least 2 characters"))]
    location: Option<String>,
}

async fn update_restaurant_by_id(
    State(ctx): State<Arc<Context>>,
    auth: Auth,
    Path(id): Path<String>,
    JsonBody(payload): JsonBody<UpdateRestaurantPayload>,
) -> impl IntoResponse {
    if let Err(errors) = payload.validate() {
        return utils::validation::into_response(errors);
    }

    match repository::find_by_id_and_owner_id(&ctx.db_conn.pool, id.clone(), auth.user.id.clone())
        .await
    {
        Ok(Some(_)) => (),
        Ok(None) => {
            return (
                StatusCode::NOT_FOUND,
                Json(json!({ "error": "Restaurant not found" })),
            )
        }
        Err(_) => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "Failed to update restaurant" })),
            )
        }
    };

    match repository::update_by_id(
        &ctx.db_conn.pool,
        id,
        repository::UpdateRestaurantPayload {
            name: payload.name.map(|name| name.trim().to_string()),
            location: payload.location.map(|location| location.trim().to_string()),
        },
    )
    .await
    {
        Ok(restaurant) => (StatusCode::OK, Json(json!(restaurant))),
        Err(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": "Failed to update restaurant" })),
        ),
    }
}

async fn delete_restaurant_by_id(
    State(ctx): State<Arc<Context>>,
    auth: Auth,
    Path(id): Path<String>,
) -> impl IntoResponse {
    let err = (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "error": "Failed to delete restaurant" })),
    );

    let mut tx = match ctx.db_conn.pool.begin().await {
        Ok(tx) => tx,
        Err(e) => {
            tracing::error!("Failed to start database transaction: {}", e);
            return err;
        }
    };

    match repository::find_by_id_and_owner_id(&mut *tx, id.clone(), auth.user.id.clone()).await {
        Ok(Some(_)) => (),
        Ok(None) => {
            return (
                StatusCode::NOT_FOUND,
                Json(json!({ "error": "Restaurant not found" })),
            )
        }
        Err(_) => return err,
    };

    if repository::delete_by_id(&mut *tx, id.clone()).await.is_err() {
        return err;
    }

    if dish::repository::delete_orphaned(&mut *tx).await.is_err() {
        return err;
    }

    if let Err(e) = tx.commit().await {
        tracing::error!("Failed to commit database transaction: {}", e);
        return err;
    }

    (
        StatusCode::OK,
        Json(json!({ "message": "Restaurant deleted successfully" })),
    )
}

async fn get_qr_code(
    State(ctx): State<Arc<Context>>,
    auth: Auth,
    Path(id): Path<String>,
) -> impl IntoResponse {
    match repository::find_by_id_and_owner_id(&ctx.db_conn.pool, id, auth.user.id.clone()).await {
        Ok(Some(restaurant)) => (
            StatusCode::OK,
            Json(json!({
                "restaurant_id": restaurant.id,
                "url": format!(
                    "{}/{}/start",
                    ctx.app.menu_base_url.trim_end_matches('/'),
                    restaurant.id
                ),
            })),
        ),
        Ok(None) => (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": "Restaurant not found" })),
        ),
        Err(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": "Failed to fetch restaurant" })),
        ),
    }
}

pub fn get_router() -> Router<Arc<Context>> {
    Router::new()
        .route("/", post(create_restaurant).get(get_restaurants))
        .route(
            "/:id",
            get(get_restaurant_by_id)
                .patch(update_restaurant_by_id)
                .delete(delete_restaurant_by_id),
        )
        .route("/:id/qr-code", get(get_qr_code))
}
