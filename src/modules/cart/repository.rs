use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::{types::Json, FromRow, PgExecutor};
use std::{fmt, str::FromStr};
use ulid::Ulid;

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum CartStatus {
    #[serde(rename = "ACTIVE")]
    Active,
    #[serde(rename = "CHECKED_OUT")]
    CheckedOut,
}

impl fmt::Display for CartStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CartStatus::Active => f.write_str("ACTIVE"),
            CartStatus::CheckedOut => f.write_str("CHECKED_OUT"),
        }
    }
}

impl FromStr for CartStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "ACTIVE" => Ok(CartStatus::Active),
            "CHECKED_OUT" => Ok(CartStatus::CheckedOut),
            _ => Err(format!("'{}' is not a valid CartStatus", s)),
        }
    }
}

impl TryFrom<String> for CartStatus {
    type Error = String;

    fn try_from(s: String) -> std::result::Result<Self, Self::Error> {
        s.parse()
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct CartItem {
    pub dish_id: String,
    pub quantity: i32,
}

#[derive(Serialize, FromRow, Clone, Debug)]
pub struct Cart {
    pub id: String,
    pub restaurant_id: String,
    pub customer_name: String,
    pub table_number: String,
    pub items: Json<Vec<CartItem>>,
    #[sqlx(try_from = "String")]
    pub status: CartStatus,
    pub order_id: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: Option<NaiveDateTime>,
}

#[derive(Debug)]
pub enum Error {
    UnexpectedError,
}

type Result<T> = std::result::Result<T, Error>;

pub struct CreateCartPayload {
    pub restaurant_id: String,
    pub customer_name: String,
    pub table_number: String,
}

pub async fn create<'e, E: PgExecutor<'e>>(e: E, payload: CreateCartPayload) -> Result<Cart> {
    sqlx::query_as::<_, Cart>(
        "
        INSERT INTO carts (id, restaurant_id, customer_name, table_number, items, status)
        VALUES ($1, $2, $3, $4, '[]'::JSONB, $5)
        RETURNING *
        ",
    )
    .bind(Ulid::new().to_string())
    .bind(&payload.restaurant_id)
    .bind(payload.customer_name)
    .bind(payload.table_number)
    .bind(CartStatus::Active.to_string())
    .fetch_one(e)
    .await
    .map_err(|err| {
        tracing::error!(
            "Error occurred while creating a cart for restaurant {}: {}",
            payload.restaurant_id,
            err
        );
        Error::UnexpectedError
    })
}

pub async fn find_by_id<'e, E: PgExecutor<'e>>(e: E, id: String) -> Result<Option<Cart>> {
    sqlx::query_as::<_, Cart>("SELECT * FROM carts WHERE id = $1")
        .bind(&id)
        .fetch_optional(e)
        .await
        .map_err(|err| {
            tracing::error!("Error occurred while fetching cart with id {}: {}", id, err);
            Error::UnexpectedError
        })
}

/// Locks the row until the surrounding transaction ends.
pub async fn find_by_id_for_update<'e, E: PgExecutor<'e>>(
    e: E,
    id: String,
) -> Result<Option<Cart>> {
    sqlx::query_as::<_, Cart>("SELECT * FROM carts WHERE id = $1 FOR UPDATE")
        .bind(&id)
        .fetch_optional(e)
        .await
        .map_err(|err| {
            tracing::error!("Error occurred while locking cart with id {}: {}", id, err);
            Error::UnexpectedError
        })
}

pub async fn update_items<'e, E: PgExecutor<'e>>(
    e: E,
    id: String,
    items: Vec<CartItem>,
) -> Result<Cart> {
    sqlx::query_as::<_, Cart>(
        "
        UPDATE carts SET
            items = $2,
            updated_at = NOW()
        WHERE id = $1
        RETURNING *
        ",
    )
    .bind(&id)
    .bind(Json(items))
    .fetch_one(e)
    .await
    .map_err(|err| {
        tracing::error!("Error occurred while updating items of cart {}: {}", id, err);
        Error::UnexpectedError
    })
}

pub async fn mark_checked_out<'e, E: PgExecutor<'e>>(
    e: E,
    id: String,
    order_id: String,
) -> Result<Cart> {
    sqlx::query_as::<_, Cart>(
        "
        UPDATE carts SET
            status = $2,
            order_id = $3,
            updated_at = NOW()
        WHERE id = $1
        RETURNING *
        ",
    )
    .bind(&id)
    .bind(CartStatus::CheckedOut.to_string())
    .bind(order_id)
    .fetch_one(e)
    .await
    .map_err(|err| {
        tracing::error!("Error occurred while checking out cart {}: {}", id, err);
        Error::UnexpectedError
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stored_status_column_converts_back() {
        assert_eq!(
            CartStatus::try_from("CHECKED_OUT".to_string()),
            Ok(CartStatus::CheckedOut)
        );
        assert_eq!("ACTIVE".parse::<CartStatus>(), Ok(CartStatus::Active));
        assert!(CartStatus::try_from("active".to_string()).is_err());
        assert_eq!(CartStatus::CheckedOut.to_string(), "CHECKED_OUT");
    }
}
