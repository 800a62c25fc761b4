use crate::utils::pagination::{Paginated, Pagination};
use chrono::NaiveDateTime;
use regex::Regex;
use serde::Serialize;
use sqlx::{FromRow, PgExecutor};
use std::sync::OnceLock;
use ulid::Ulid;

#[derive(Serialize, FromRow, Clone, Debug)]
pub struct Restaurant {
    pub id: String,
    pub name: String,
    pub location: String,
    pub slug: String,
    pub owner_id: String,
    pub created_at: NaiveDateTime,
    pub updated_at: Option<NaiveDateTime>,
}

#[derive(Debug)]
pub enum Error {
    UnexpectedError,
}

type Result<T> = std::result::Result<T, Error>;

fn non_alphanumeric() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[^a-z0-9]+").expect("Invalid slug regex"))
}

/// `Spice Hub!` created at millisecond `...4821` becomes `spice-hub-4821`.
pub fn make_slug(name: &str, millis: i64) -> String {
    let lowered = name.trim().to_lowercase();
    let base = non_alphanumeric().replace_all(&lowered, "-");
    let base = match base.trim_matches('-') {
        "" => "restaurant",
        base => base,
    };
    format!("{}-{:04}", base, millis.rem_euclid(10_000))
}

pub struct CreateRestaurantPayload {
    pub name: String,
    pub location: String,
    pub owner_id: String,
}

pub async fn create<'e, E: PgExecutor<'e>>(
    e: E,
    payload: CreateRestaurantPayload,
) -> Result<Restaurant> {
    let slug = make_slug(&payload.name, chrono::Utc::now().timestamp_millis());

    sqlx::query_as::<_, Restaurant>(
        "
        INSERT INTO restaurants (id, name, location, slug, owner_id)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING *
        ",
    )
    .bind(Ulid::new().to_string())
    .bind(payload.name)
    .bind(payload.location)
    .bind(slug)
    .bind(&payload.owner_id)
    .fetch_one(e)
    .await
    .map_err(|err| {
        tracing::error!(
            "Error occurred while creating a restaurant for owner {}: {}",
            payload.owner_id,
            err
        );
        Error::UnexpectedError
    })
}

pub async fn find_by_id<'e, E: PgExecutor<'e>>(e: E, id: String) -> Result<Option<Restaurant>> {
    sqlx::query_as::<_, Restaurant>("SELECT * FROM restaurants WHERE id = $1")
        .bind(&id)
        .fetch_optional(e)
        .await
        .map_err(|err| {
            tracing::error!(
                "Error occurred while fetching restaurant with id {}: {}",
                id,
                err
            );
            Error::UnexpectedError
        })
}

pub async fn find_by_id_and_owner_id<'e, E: PgExecutor<'e>>(
    e: E,
    id: String,
    owner_id: String,
) -> Result<Option<Restaurant>> {
    sqlx::query_as::<_, Restaurant>("SELECT * FROM restaurants WHERE id = $1 AND owner_id = $2")
        .bind(&id)
        .bind(owner_id)
        .fetch_optional(e)
        .await
        .map_err(|err| {
            tracing::error!(
                "Error occurred while fetching restaurant with id {}: {}",
                id,
                err
            );
            Error::UnexpectedError
        })
}

pub async fn find_many_by_owner_id<'e, E>(
    e: E,
    owner_id: String,
    pagination: Pagination,
) -> Result<Paginated<Restaurant>>
where
    E: PgExecutor<'e> + Copy,
{
    let total = sqlx::query_scalar::<_, i64>("SELECT COUNT(id) FROM restaurants WHERE owner_id = $1")
        .bind(&owner_id)
        .fetch_one(e)
        .await
        .map_err(|err| {
            tracing::error!("Error occurred while counting restaurants: {}", err);
            Error::UnexpectedError
        })?;

    let items = sqlx::query_as::<_, Restaurant>(
        "
        SELECT * FROM restaurants
        WHERE owner_id = $1
        ORDER BY created_at DESC, id DESC
        LIMIT $2
        OFFSET $3
        ",
    )
    .bind(&owner_id)
    .bind(pagination.limit())
    .bind(pagination.offset())
    .fetch_all(e)
    .await
    .map_err(|err| {
        tracing::error!(
            "Error occurred while fetching restaurants of owner {}: {}",
            owner_id,
            err
        );
        Error::UnexpectedError
    })?;

    Ok(Paginated::new(
        items,
        total as u32,
        pagination.page.max(1),
        pagination.limit() as u32,
    ))
}

pub struct UpdateRestaurantPayload {
    pub name: Option<String>,
    pub location: Option<String>,
}

pub async fn update_by_id<'e, E: PgExecutor<'e>>(
    e: E,
    id: String,
    payload: UpdateRestaurantPayload,
) -> Result<Restaurant> {
    sqlx::query_as::<_, Restaurant>(
        "
        UPDATE restaurants SET
            name = COALESCE($2, name),
            location = COALESCE($3, location),
            updated_at = NOW()
        WHERE id = $1
        RETURNING *
        ",
    )
    .bind(&id)
    .bind(payload.name)
    .bind(payload.location)
    .fetch_one(e)
    .await
    .map_err(|err| {
        tracing::error!(
            "Error occurred while updating restaurant with id {}: {}",
            id,
            err
        );
        Error::UnexpectedError
    })
}

pub async fn delete_by_id<'e, E: PgExecutor<'e>>(e: E, id: String) -> Result<()> {
    sqlx::query("DELETE FROM restaurants WHERE id = $1")
        .bind(&id)
        .execute(e)
        .await
        .map(|_| ())
        .map_err(|err| {
            tracing::error!(
                "Error occurred while deleting restaurant with id {}: {}",
                id,
                err
            );
            Error::UnexpectedError
        })
}
