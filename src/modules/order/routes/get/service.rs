use super::types::response;
use crate::{modules::order::repository, types::Context};
use std::sync::Arc;

pub async fn service(ctx: Arc<Context>, id: String) -> response::Response {
    repository::find_full_order_by_id(&ctx.db_conn.pool, id)
        .await
        .map_err(|_| response::Error::FailedToFetchOrder)?
        .map(response::Success::Order)
        .ok_or(response::Error::OrderNotFound)
}
