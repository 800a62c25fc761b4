use super::types::{request, response};
use crate::{
    modules::order::{repository, service},
    types::Context,
};
use std::sync::Arc;

pub async fn service(ctx: Arc<Context>, payload: request::Payload) -> response::Response {
    let mut conn = ctx.db_conn.pool.acquire().await.map_err(|err| {
        tracing::error!("Failed to acquire database connection: {}", err);
        response::Error::FailedToUpdateOrderStatus
    })?;

    let order =
        repository::find_by_id_and_owner_id(&mut *conn, payload.id, payload.auth.user.id.clone())
            .await
            .map_err(|_| response::Error::FailedToUpdateOrderStatus)?
            .ok_or(response::Error::OrderNotFound)?;

    service::update_order_status(&mut *conn, order, payload.body.status)
        .await
        .map(|order| {
            tracing::info!(order_id = %order.id, status = %order.status, "Order status updated");
            response::Success::OrderStatusUpdated(order)
        })
        .map_err(|err| match err {
            service::UpdateStatusError::OrderNotFound => response::Error::OrderNotFound,
            service::UpdateStatusError::InvalidTransition { from, to } => {
                response::Error::InvalidStatusTransition { from, to }
            }
            service::UpdateStatusError::UnexpectedError => {
                response::Error::FailedToUpdateOrderStatus
            }
        })
}
