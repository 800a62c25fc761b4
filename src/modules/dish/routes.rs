use super::repository;
use crate::{
    modules::{auth::middleware::Auth, category, restaurant},
    types::Context,
    utils::{self, money, validation::JsonBody},
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{patch, post},
    Json, Router,
};
use bigdecimal::BigDecimal;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use validator::Validate;

#[derive(Deserialize)]
struct Filters {
    restaurant_id: String,
}

async fn get_dishes(
    State(ctx): State<Arc<Context>>,
    auth: Auth,
    Query(filters): Query<Filters>,
) -> impl IntoResponse {
    match restaurant::repository::find_by_id_and_owner_id(
        &ctx.db_conn.pool,
        filters.restaurant_id.clone(),
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
                Json(json!({ "error": "Failed to fetch dishes" })),
            )
        }
    };

    match repository::find_many_by_restaurant_id(&ctx.db_conn.pool, filters.restaurant_id).await {
        Ok(dishes) => (StatusCode::OK, Json(json!({ "items": dishes }))),
        Err(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": "Failed to fetch dishes" })),
        ),
    }
}

#[derive(Deserialize, Validate)]
struct CreateDishPayload {
    #[validate(length(min = 2, message = "Name must be at least 2 characters"))]
    name: String,
    #[serde(default)]
    description: String,
    price: BigDecimal,
    #[serde(default)]
    spice_level: String,
    #[serde(default)]
    image_url: String,
    restaurant_id: String,
    category_id: String,
}

async fn create_dish(
    State(ctx): State<Arc<Context>>,
    auth: Auth,
    JsonBody(payload): JsonBody<CreateDishPayload>,
) -> impl IntoResponse {
    if let Err(errors) = payload.validate() {
        return utils::validation::into_response(errors);
    }

    let price = match money::parse_price(&payload.price) {
        Ok(price) => price,
        Err(err) => return (StatusCode::BAD_REQUEST, Json(json!({ "error": err.message() }))),
    };

    let err = (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "error": "Failed to create dish" })),
    );

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
        Err(_) => return err,
    };

    match category::repository::find_by_id_and_restaurant_id(
        &ctx.db_conn.pool,
        payload.category_id.clone(),
        payload.restaurant_id.clone(),
    )
    .await
    {
        Ok(Some(_)) => (),
        Ok(None) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({ "error": "Category does not belong to this restaurant" })),
            )
        }
        Err(_) => return err,
    };

    let mut tx = match ctx.db_conn.pool.begin().await {
        Ok(tx) => tx,
        Err(e) => {
            tracing::error!("Failed to start database transaction: {}", e);
            return err;
        }
    };

    let dish = match repository::create(
        &mut *tx,
        repository::CreateDishPayload {
            name: payload.name.trim().to_string(),
            description: payload.description,
            price,
            spice_level: payload.spice_level,
            image_url: payload.image_url,
        },
    )
    .await
    {
        Ok(dish) => dish,
        Err(_) => return err,
    };

    if repository::link_restaurant(&mut *tx, dish.id.clone(), payload.restaurant_id)
        .await
        .is_err()
    {
        return err;
    }

    if repository::link_category(&mut *tx, dish.id.clone(), payload.category_id)
        .await
        .is_err()
    {
        return err;
    }

    if let Err(e) = tx.commit().await {
        tracing::error!("Failed to commit database transaction: {}", e);
        return err;
    }

    (StatusCode::CREATED, Json(json!(dish)))
}

#[derive(Deserialize, Validate)]
struct UpdateDishPayload {
    #[validate(length(min = 2, message = "Name must be at least 2 characters"))]
    name: Option<String>,
    description: Option<String>,
    price: Option<BigDecimal>,
    spice_level: Option<String>,
    image_url: Option<String>,
    category_id: Option<String>,
}

async fn update_dish_by_id(
    State(ctx): State<Arc<Context>>,
    auth: Auth,
    Path(id): Path<String>,
    JsonBody(payload): JsonBody<UpdateDishPayload>,
) -> impl IntoResponse {
    if let Err(errors) = payload.validate() {
        return utils::validation::into_response(errors);
    }

    let price = match payload.price.as_ref().map(money::parse_price).transpose() {
        Ok(price) => price,
        Err(err) => return (StatusCode::BAD_REQUEST, Json(json!({ "error": err.message() }))),
    };

    let err = (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "error": "Failed to update dish" })),
    );

    match repository::find_by_id_and_owner_id(&ctx.db_conn.pool, id.clone(), auth.user.id.clone())
        .await
    {
        Ok(Some(_)) => (),
        Ok(None) => {
            return (
                StatusCode::NOT_FOUND,
                Json(json!({ "error": "Dish not found" })),
            )
        }
        Err(_) => return err,
    };

    if let Some(category_id) = payload.category_id.clone() {
        let category = match category::repository::find_by_id_and_owner_id(
            &ctx.db_conn.pool,
            category_id,
            auth.user.id.clone(),
        )
        .await
        {
            Ok(Some(category)) => category,
            Ok(None) => {
                return (
                    StatusCode::NOT_FOUND,
                    Json(json!({ "error": "Category not found" })),
                )
            }
            Err(_) => return err,
        };

        match repository::find_restaurant_ids(&ctx.db_conn.pool, id.clone()).await {
            Ok(restaurant_ids) if restaurant_ids.contains(&category.restaurant_id) => (),
            Ok(_) => {
                return (
                    StatusCode::BAD_REQUEST,
                    Json(json!({ "error": "Category does not belong to this dish's restaurant" })),
                )
            }
            Err(_) => return err,
        };
    }

    let mut tx = match ctx.db_conn.pool.begin().await {
        Ok(tx) => tx,
        Err(e) => {
            tracing::error!("Failed to start database transaction: {}", e);
            return err;
        }
    };

    let dish = match repository::update_by_id(
        &mut *tx,
        id.clone(),
        repository::UpdateDishPayload {
            name: payload.name.map(|name| name.trim().to_string()),
            description: payload.description,
            price,
            spice_level: payload.spice_level,
            image_url: payload.image_url,
        },
    )
    .await
    {
        Ok(dish) => dish,
        Err(_) => return err,
    };

    if let Some(category_id) = payload.category_id {
        if repository::clear_categories(&mut *tx, id.clone()).await.is_err() {
            return err;
        }

        if repository::link_category(&mut *tx, id, category_id)
            .await
            .is_err()
        {
            return err;
        }
    }

    if let Err(e) = tx.commit().await {
        tracing::error!("Failed to commit database transaction: {}", e);
        return err;
    }

    (StatusCode::OK, Json(json!(dish)))
}

async fn delete_dish_by_id(
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
                Json(json!({ "message": "Dish deleted successfully" })),
            ),
            Err(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "Failed to delete dish" })),
            ),
        },
        Ok(None) => (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": "Dish not found" })),
        ),
        Err(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": "Failed to delete dish" })),
        ),
    }
}

pub fn get_router() -> Router<Arc<Context>> {
    Router::new()
        .route("/", post(create_dish).get(get_dishes))
        .route("/:id", patch(update_dish_by_id).delete(delete_dish_by_id))
}
