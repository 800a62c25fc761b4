use super::repository;
use crate::{
    modules::{auth::middleware::Auth, restaurant},
    types::Context,
    utils::{self, validation::JsonBody},
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{patch, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use validator::Validate;

#[derive(Deserialize)]
struct Filters {
    restaurant_id: Option<String>,
}

async fn get_categories(
    State(ctx): State<Arc<Context>>,
    auth: Auth,
    Query(filters): Query<Filters>,
) -> impl IntoResponse {
    match repository::find_many(
        &ctx.db_conn.pool,
        repository::Filters {
            owner_id: auth.user.id.clone(),
            restaurant_id: filters.restaurant_id,
        },
    )
    .await
    {
        Ok(categories) => (StatusCode::OK, Json(json!({ "items": categories }))),
        Err(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": "Failed to fetch categories" })),
        ),
    }
}

#[derive(Deserialize, Validate)]
struct CreateCategoryPayload {
    #[validate(length(min = 2, message = "Name must be at least 2 characters"))]
    name: String,
    restaurant_id: String,
}

async fn create_category(
    State(ctx): State<Arc<Context>>,
    auth: Auth,
    JsonBody(payload): JsonBody<CreateCategoryPayload>,
) -> impl IntoResponse {
    if let Err(errors) = payload.validate() {
        return utils::validation::into_response(errors);
    }

    match restaurant::repository::find_by_id_and_owner_id(
        &ctx.db_conn.pool,
        payload.restaurant_id.clone(),
        auth.user.id.clone(),
    )
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
                Json(json!({ "error": "Failed to create category" })),
            )
        }
    };

    match repository::create(
        &ctx.db_conn.pool,
        repository::CreateCategoryPayload {
            name: payload.name.trim().to_string(),
            restaurant_id: payload.restaurant_id,
        },
    )
    .await
    {
        Ok(category) => (StatusCode::CREATED, Json(json!(category))),
        Err(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": "Failed to create category" })),
        ),
    }
}

#[derive(Deserialize, Validate)]
struct UpdateCategoryPayload {
    #[validate(length(min = 2, message = "Name must be at least 2 characters"))]
    name: String,
}

async fn update_category_by_id(
    State(ctx): State<Arc<Context>>,
    auth: Auth,
    Path(id): Path<String>,
    JsonBody(payload): JsonBody<UpdateCategoryPayload>,
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
                Json(json!({ "error": "Category not found" })),
            )
        }
        Err(_) => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "Failed to update category" })),
            )
        }
    };

    match repository::update_by_id(&ctx.db_conn.pool, id, payload.name.trim().to_string()).await {
        Ok(category) => (StatusCode::OK, Json(json!(category))),
        Err(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": "Failed to update category" })),
        ),
    }
}

async fn delete_category_by_id(
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
                Json(json!({ "message": "Category deleted successfully" })),
            ),
            Err(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "Failed to delete category" })),
            ),
        },
        Ok(None) => (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": "Category not found" })),
        ),
        Err(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": "Failed to delete category" })),
        ),
    }
}

pub fn get_router() -> Router<Arc<Context>> {
    Router::new()
        .route("/", post(create_category).get(get_categories))
        .route(
            "/:id",
            patch(update_category_by_id).delete(delete_category_by_id),
        )
}
