use super::types::{request, response};
use crate::{modules::order::service, types::Context};
use std::sync::Arc;

pub async fn service(ctx: Arc<Context>, payload: request::Payload) -> response::Response {
    let input = service::CreateOrderInput {
        customer_name: payload.customer_name,
        table_number: payload.table_number,
        restaurant_id: payload.restaurant_id,
        items: payload
            .items
            .into_iter()
            .map(|item| service::RequestedItem {
                dish_id: item.dish_id,
                quantity: item.quantity,
            })
            .collect(),
    };

    // reject malformed orders before touching the database
    service::validate_request(&input).map_err(response::Error::FailedToCreateOrder)?;

    let mut tx = ctx.db_conn.pool.begin().await.map_err(|err| {
        tracing::error!("Failed to start database transaction: {}", err);
        response::Error::UnexpectedError
    })?;

    let order = service::create_order(&mut *tx, input)
        .await
        .map_err(response::Error::FailedToCreateOrder)?;

    tx.commit().await.map_err(|err| {
        tracing::error!("Failed to commit database transaction: {}", err);
        response::Error::UnexpectedError
    })?;

    tracing::info!(
        order_id = %order.order.id,
        restaurant_id = %order.order.restaurant_id,
        total = %order.order.total,
        "Order placed"
    );

    Ok(response::Success::OrderCreated(order))
}
