use bigdecimal::BigDecimal;
use chrono::NaiveDateTime;
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgConnection, PgExecutor};
use std::{fmt, str::FromStr};
use ulid::Ulid;

use crate::utils::pagination::{Paginated, Pagination};

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Preparing,
    Ready,
    Completed,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Preparing => "preparing",
            OrderStatus::Ready => "ready",
            OrderStatus::Completed => "completed",
        }
    }

    pub fn next(&self) -> Option<OrderStatus> {
        match self {
            OrderStatus::Pending => Some(OrderStatus::Preparing),
            OrderStatus::Preparing => Some(OrderStatus::Ready),
            OrderStatus::Ready => Some(OrderStatus::Completed),
            OrderStatus::Completed => None,
        }
    }

    pub fn can_transition_to(&self, to: OrderStatus) -> bool {
        self.next() == Some(to)
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "pending" => Ok(OrderStatus::Pending),
            "preparing" => Ok(OrderStatus::Preparing),
            "ready" => Ok(OrderStatus::Ready),
            "completed" => Ok(OrderStatus::Completed),
            _ => Err(format!("'{}' is not a valid OrderStatus", s)),
        }
    }
}

impl TryFrom<String> for OrderStatus {
    type Error = String;

    fn try_from(s: String) -> std::result::Result<Self, Self::Error> {
        s.parse()
    }
}

#[derive(Serialize, FromRow, Clone, Debug)]
pub struct Order {
    pub id: String,
    pub customer_name: String,
    pub table_number: String,
    pub restaurant_id: String,
    pub total: BigDecimal,
    #[sqlx(try_from = "String")]
    pub status: OrderStatus,
    pub created_at: NaiveDateTime,
    pub updated_at: Option<NaiveDateTime>,
}

#[derive(Serialize, FromRow, Clone, Debug)]
pub struct OrderItem {
    pub id: String,
    pub order_id: String,
    pub dish_id: Option<String>,
    pub name: String,
    pub price: BigDecimal,
    pub quantity: i32,
    pub position: i32,
}

#[derive(Serialize, Clone, Debug)]
pub struct FullOrder {
    #[serde(flatten)]
    pub order: Order,
    pub items: Vec<OrderItem>,
}

/// A priced line ready to be written; `price` comes from the dish row.
#[derive(Clone, Debug)]
pub struct OrderLine {
    pub dish_id: String,
    pub name: String,
    pub price: BigDecimal,
    pub quantity: i32,
}

#[derive(Debug)]
pub enum Error {
    UnexpectedError,
}

type Result<T> = std::result::Result<T, Error>;

pub struct CreateOrderPayload {
    pub customer_name: String,
    pub table_number: String,
    pub restaurant_id: String,
    pub total: BigDecimal,
    pub lines: Vec<OrderLine>,
}

/// Writes the header and its items. Run it inside a transaction.
pub async fn create(conn: &mut PgConnection, payload: CreateOrderPayload) -> Result<FullOrder> {
    let order = sqlx::query_as::<_, Order>(
        "
        INSERT INTO orders (id, customer_name, table_number, restaurant_id, total, status)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING *
        ",
    )
    .bind(Ulid::new().to_string())
    .bind(payload.customer_name)
    .bind(payload.table_number)
    .bind(&payload.restaurant_id)
    .bind(payload.total)
    .bind(OrderStatus::Pending.as_str())
    .fetch_one(&mut *conn)
    .await
    .map_err(|err| {
        tracing::error!(
            "Error occurred while creating an order for restaurant {}: {}",
            payload.restaurant_id,
            err
        );
        Error::UnexpectedError
    })?;

    let mut items = Vec::with_capacity(payload.lines.len());
    for (position, line) in payload.lines.into_iter().enumerate() {
        let item = sqlx::query_as::<_, OrderItem>(
            "
            INSERT INTO order_items (id, order_id, dish_id, name, price, quantity, position)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            ",
        )
        .bind(Ulid::new().to_string())
        .bind(&order.id)
        .bind(line.dish_id)
        .bind(line.name)
        .bind(line.price)
        .bind(line.quantity)
        .bind(position as i32)
        .fetch_one(&mut *conn)
        .await
        .map_err(|err| {
            tracing::error!(
                "Error occurred while adding an item to order {}: {}",
                order.id,
                err
            );
            Error::UnexpectedError
        })?;

        items.push(item);
    }

    Ok(FullOrder { order, items })
}

pub async fn find_by_id<'e, E: PgExecutor<'e>>(e: E, id: String) -> Result<Option<Order>> {
    sqlx::query_as::<_, Order>("SELECT * FROM orders WHERE id = $1")
        .bind(&id)
        .fetch_optional(e)
        .await
        .map_err(|err| {
            tracing::error!("Error occurred while fetching order with id {}: {}", id, err);
            Error::UnexpectedError
        })
}

/// Only returns the order when its restaurant belongs to `owner_id`.
pub async fn find_by_id_and_owner_id<'e, E: PgExecutor<'e>>(
    e: E,
    id: String,
    owner_id: String,
) -> Result<Option<Order>> {
    sqlx::query_as::<_, Order>(
        "
        SELECT orders.*
        FROM orders
        INNER JOIN restaurants ON restaurants.id = orders.restaurant_id
        WHERE orders.id = $1 AND restaurants.owner_id = $2
        ",
    )
    .bind(&id)
    .bind(owner_id)
    .fetch_optional(e)
    .await
    .map_err(|err| {
        tracing::error!("Error occurred while fetching order with id {}: {}", id, err);
        Error::UnexpectedError
    })
}

pub async fn find_items_by_order_ids<'e, E: PgExecutor<'e>>(
    e: E,
    order_ids: Vec<String>,
) -> Result<Vec<OrderItem>> {
    sqlx::query_as::<_, OrderItem>(
        "
        SELECT * FROM order_items
        WHERE order_id = ANY($1)
        ORDER BY order_id, position
        ",
    )
    .bind(order_ids)
    .fetch_all(e)
    .await
    .map_err(|err| {
        tracing::error!("Error occurred while fetching order items: {}", err);
        Error::UnexpectedError
    })
}

pub async fn find_full_order_by_id<'e, E>(e: E, id: String) -> Result<Option<FullOrder>>
where
    E: PgExecutor<'e> + Copy,
{
    let order = match find_by_id(e, id.clone()).await? {
        Some(order) => order,
        None => return Ok(None),
    };

    let items = find_items_by_order_ids(e, vec![id]).await?;

    Ok(Some(FullOrder { order, items }))
}

#[derive(Deserialize, Default)]
pub struct Filters {
    pub restaurant_id: Option<String>,
    pub status: Option<OrderStatus>,
}

/// Orders across every restaurant of `owner_id`, newest first.
pub async fn find_many_by_owner_id<'e, E>(
    e: E,
    owner_id: String,
    pagination: Pagination,
    filters: Filters,
) -> Result<Paginated<FullOrder>>
where
    E: PgExecutor<'e> + Copy,
{
    let status = filters.status.map(|status| status.as_str());

    let total = sqlx::query_scalar::<_, i64>(
        "
        SELECT COUNT(orders.id)
        FROM orders
        INNER JOIN restaurants ON restaurants.id = orders.restaurant_id
        WHERE
            restaurants.owner_id = $1
            AND ($2::VARCHAR IS NULL OR orders.restaurant_id = $2)
            AND ($3::VARCHAR IS NULL OR orders.status = $3)
        ",
    )
    .bind(&owner_id)
    .bind(&filters.restaurant_id)
    .bind(status)
    .fetch_one(e)
    .await
    .map_err(|err| {
        tracing::error!("Error occurred while counting orders: {}", err);
        Error::UnexpectedError
    })?;

    let orders = sqlx::query_as::<_, Order>(
        "
        SELECT orders.*
        FROM orders
        INNER JOIN restaurants ON restaurants.id = orders.restaurant_id
        WHERE
            restaurants.owner_id = $1
            AND ($2::VARCHAR IS NULL OR orders.restaurant_id = $2)
            AND ($3::VARCHAR IS NULL OR orders.status = $3)
        ORDER BY orders.created_at DESC, orders.id DESC
        LIMIT $4
        OFFSET $5
        ",
    )
    .bind(&owner_id)
    .bind(&filters.restaurant_id)
    .bind(status)
    .bind(pagination.limit())
    .bind(pagination.offset())
    .fetch_all(e)
    .await
    .map_err(|err| {
        tracing::error!(
            "Error occurred while fetching orders of owner {}: {}",
            owner_id,
            err
        );
        Error::UnexpectedError
    })?;

    let mut items = find_items_by_order_ids(e, orders.iter().map(|o| o.id.clone()).collect())
        .await?
        .into_iter()
        .into_group_map_by(|item| item.order_id.clone());

    let orders = orders
        .into_iter()
        .map(|order| FullOrder {
            items: items.remove(&order.id).unwrap_or_default(),
            order,
        })
        .collect();

    Ok(Paginated::new(
        orders,
        total as u32,
        pagination.page.max(1),
        pagination.limit() as u32,
    ))
}

/// Moves the order from `from` to `to` only if it is still in `from`.
pub async fn update_status<'e, E: PgExecutor<'e>>(
    e: E,
    id: String,
    from: OrderStatus,
    to: OrderStatus,
) -> Result<Option<Order>> {
    sqlx::query_as::<_, Order>(
        "
        UPDATE orders SET
            status = $3,
            updated_at = NOW()
        WHERE id = $1 AND status = $2
        RETURNING *
        ",
    )
    .bind(&id)
    .bind(from.as_str())
    .bind(to.as_str())
    .fetch_optional(e)
    .await
    .map_err(|err| {
        tracing::error!(
            "Error occurred while updating status of order {}: {}",
            id,
            err
        );
        Error::UnexpectedError
    })
}

pub async fn delete_by_id<'e, E: PgExecutor<'e>>(e: E, id: String) -> Result<()> {
    sqlx::query("DELETE FROM orders WHERE id = $1")
        .bind(&id)
        .execute(e)
        .await
        .map(|_| ())
        .map_err(|err| {
            tracing::error!("Error occurred while deleting order with id {}: {}", id, err);
            Error::UnexpectedError
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_moves_one_step_forward() {
        assert!(OrderStatus::Pending.can_transition_to(OrderStatus::Preparing));
        assert!(OrderStatus::Preparing.can_transition_to(OrderStatus::Ready));
        assert!(OrderStatus::Ready.can_transition_to(OrderStatus::Completed));
    }

    #[test]
    fn skipping_or_reversing_is_rejected() {
        assert!(!OrderStatus::Pending.can_transition_to(OrderStatus::Ready));
        assert!(!OrderStatus::Ready.can_transition_to(OrderStatus::Pending));
        assert!(!OrderStatus::Pending.can_transition_to(OrderStatus::Pending));
        assert!(OrderStatus::Completed.next().is_none());
    }

    #[test]
    fn unknown_status_strings_are_rejected() {
        assert!("cancelled".parse::<OrderStatus>().is_err());
        assert!("PENDING".parse::<OrderStatus>().is_err());
        assert!(serde_json::from_str::<OrderStatus>("\"shipped\"").is_err());
        assert_eq!(
            serde_json::from_str::<OrderStatus>("\"ready\"").unwrap(),
            OrderStatus::Ready
        );
    }

    #[test]
    fn stored_status_column_converts_back() {
        assert_eq!(
            OrderStatus::try_from("preparing".to_string()),
            Ok(OrderStatus::Preparing)
        );
        assert!(OrderStatus::try_from("shipped".to_string()).is_err());
        assert_eq!(OrderStatus::Completed.to_string(), "completed");
    }
}
