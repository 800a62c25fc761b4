use super::types::{request, response};
use crate::{modules::order::repository, types::Context};
use std::sync::Arc;

pub async fn service(ctx: Arc<Context>, payload: request::Payload) -> response::Response {
    repository::find_many_by_owner_id(
        &ctx.db_conn.pool,
        payload.auth.user.id.clone(),
        payload.pagination,
        payload.filters,
    )
    .await
    .map(response::Success::Orders)
    .map_err(|_| response::Error::FailedToFetchOrders)
}
