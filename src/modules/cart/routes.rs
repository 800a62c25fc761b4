use super::{
    repository::{self, CartStatus},
    service,
};
use crate::{
    modules::{dish, order, restaurant},
    types::Context,
    utils::validation::{is_blank, JsonBody},
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

fn unexpected_error() -> (StatusCode, Json<serde_json::Value>) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "error": "Sorry an error occurred" })),
    )
}

fn cart_not_found() -> (StatusCode, Json<serde_json::Value>) {
    (
        StatusCode::NOT_FOUND,
        Json(json!({ "error": "Cart not found" })),
    )
}

fn cart_checked_out() -> (StatusCode, Json<serde_json::Value>) {
    (
        StatusCode::CONFLICT,
        Json(json!({ "error": "Cart has already been checked out" })),
    )
}

#[derive(Deserialize)]
struct CreateCartPayload {
    restaurant_id: String,
    customer_name: String,
    table_number: String,
}

async fn create_cart(
    State(ctx): State<Arc<Context>>,
    JsonBody(payload): JsonBody<CreateCartPayload>,
) -> impl IntoResponse {
    if is_blank(&payload.customer_name) || is_blank(&payload.table_number) {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "Customer name and table number are required" })),
        );
    }

    match restaurant::repository::find_by_id(&ctx.db_conn.pool, payload.restaurant_id.clone())
        .await
    {
        Ok(Some(_)) => (),
        Ok(None) => {
            return (
                StatusCode::NOT_FOUND,
                Json(json!({ "error": "Restaurant not found" })),
            )
        }
        Err(_) => return unexpected_error(),
    };

    match repository::create(
        &ctx.db_conn.pool,
        repository::CreateCartPayload {
            restaurant_id: payload.restaurant_id,
            customer_name: payload.customer_name.trim().to_string(),
            table_number: payload.table_number.trim().to_string(),
        },
    )
    .await
    {
        Ok(cart) => (StatusCode::CREATED, Json(json!(cart))),
        Err(_) => unexpected_error(),
    }
}

async fn price(
    ctx: &Context,
    cart: repository::Cart,
) -> Result<service::PricedCart, dish::repository::Error> {
    let ids = cart.items.0.iter().map(|item| item.dish_id.clone()).collect();

    dish::repository::find_many_by_ids_for_restaurant(
        &ctx.db_conn.pool,
        ids,
        cart.restaurant_id.clone(),
    )
    .await
    .map(|dishes| service::price_cart(cart, dishes))
}

async fn get_cart(State(ctx): State<Arc<Context>>, Path(id): Path<String>) -> impl IntoResponse {
    let cart = match repository::find_by_id(&ctx.db_conn.pool, id).await {
        Ok(Some(cart)) => cart,
        Ok(None) => return cart_not_found(),
        Err(_) => return unexpected_error(),
    };

    match price(&ctx, cart).await {
        Ok(priced) => (StatusCode::OK, Json(json!(priced))),
        Err(_) => unexpected_error(),
    }
}

#[derive(Deserialize)]
struct SetItemPayload {
    quantity: i32,
}

async fn apply_item_change(
    ctx: Arc<Context>,
    id: String,
    dish_id: String,
    quantity: i32,
) -> (StatusCode, Json<serde_json::Value>) {
    if !(0..=order::service::MAX_QUANTITY).contains(&quantity) {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "Quantity must be between 0 and 100" })),
        );
    }

    let mut tx = match ctx.db_conn.pool.begin().await {
        Ok(tx) => tx,
        Err(err) => {
            tracing::error!("Failed to start database transaction: {}", err);
            return unexpected_error();
        }
    };

    let cart = match repository::find_by_id_for_update(&mut *tx, id.clone()).await {
        Ok(Some(cart)) => cart,
        Ok(None) => return cart_not_found(),
        Err(_) => return unexpected_error(),
    };

    if cart.status == CartStatus::CheckedOut {
        return cart_checked_out();
    }

    if quantity > 0 {
        match dish::repository::find_many_by_ids_for_restaurant(
            &mut *tx,
            vec![dish_id.clone()],
            cart.restaurant_id.clone(),
        )
        .await
        {
            Ok(dishes) if !dishes.is_empty() => (),
            Ok(_) => {
                return (
                    StatusCode::BAD_REQUEST,
                    Json(json!({ "error": "Dish is not offered at this restaurant" })),
                )
            }
            Err(_) => return unexpected_error(),
        };
    }

    let items = service::set_item(cart.items.0, &dish_id, quantity);

    let cart = match repository::update_items(&mut *tx, id, items).await {
        Ok(cart) => cart,
        Err(_) => return unexpected_error(),
    };

    if let Err(err) = tx.commit().await {
        tracing::error!("Failed to commit database transaction: {}", err);
        return unexpected_error();
    }

    match price(&ctx, cart).await {
        Ok(priced) => (StatusCode::OK, Json(json!(priced))),
        Err(_) => unexpected_error(),
    }
}

async fn set_cart_item(
    State(ctx): State<Arc<Context>>,
    Path((id, dish_id)): Path<(String, String)>,
    JsonBody(payload): JsonBody<SetItemPayload>,
) -> impl IntoResponse {
    apply_item_change(ctx, id, dish_id, payload.quantity).await
}

async fn remove_cart_item(
    State(ctx): State<Arc<Context>>,
    Path((id, dish_id)): Path<(String, String)>,
) -> impl IntoResponse {
    apply_item_change(ctx, id, dish_id, 0).await
}

async fn checkout_cart(State(ctx): State<Arc<Context>>, Path(id): Path<String>) -> Response {
    let mut tx = match ctx.db_conn.pool.begin().await {
        Ok(tx) => tx,
        Err(err) => {
            tracing::error!("Failed to start database transaction: {}", err);
            return unexpected_error().into_response();
        }
    };

    let cart = match repository::find_by_id_for_update(&mut *tx, id.clone()).await {
        Ok(Some(cart)) => cart,
        Ok(None) => return cart_not_found().into_response(),
        Err(_) => return unexpected_error().into_response(),
    };

    if cart.status == CartStatus::CheckedOut {
        return cart_checked_out().into_response();
    }

    if cart.items.0.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "Cart is empty" })),
        )
            .into_response();
    }

    let order = match order::service::create_order(
        &mut *tx,
        order::service::CreateOrderInput {
            customer_name: cart.customer_name,
            table_number: cart.table_number,
            restaurant_id: cart.restaurant_id,
            items: cart
                .items
                .0
                .into_iter()
                .map(|item| order::service::RequestedItem {
                    dish_id: item.dish_id,
                    quantity: item.quantity,
                })
                .collect(),
        },
    )
    .await
    {
        Ok(order) => order,
        Err(err) => return err.into_response(),
    };

    if repository::mark_checked_out(&mut *tx, id, order.order.id.clone())
        .await
        .is_err()
    {
        return unexpected_error().into_response();
    }

    if let Err(err) = tx.commit().await {
        tracing::error!("Failed to commit database transaction: {}", err);
        return unexpected_error().into_response();
    }

    tracing::info!(order_id = %order.order.id, "Cart checked out");

    (StatusCode::CREATED, Json(json!(order))).into_response()
}

pub fn get_router() -> Router<Arc<Context>> {
    Router::new()
        .route("/", post(create_cart))
        .route("/:id", get(get_cart))
        .route(
            "/:id/items/:dish_id",
            put(set_cart_item).delete(remove_cart_item),
        )
        .route("/:id/checkout", post(checkout_cart))
}
