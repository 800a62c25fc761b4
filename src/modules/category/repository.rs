use chrono::NaiveDateTime;
use serde::Serialize;
use sqlx::{FromRow, PgExecutor};
use ulid::Ulid;

#[derive(Serialize, FromRow, Clone, Debug)]
pub struct Category {
    pub id: String,
    pub name: String,
    pub restaurant_id: String,
    pub created_at: NaiveDateTime,
    pub updated_at: Option<NaiveDateTime>,
}

#[derive(Serialize, FromRow, Clone, Debug)]
pub struct CategoryWithRestaurant {
    pub id: String,
    pub name: String,
    pub restaurant_id: String,
    pub restaurant_name: String,
    pub created_at: NaiveDateTime,
    pub updated_at: Option<NaiveDateTime>,
}

#[derive(Debug)]
pub enum Error {
    UnexpectedError,
}

type Result<T> = std::result::Result<T, Error>;

pub struct CreateCategoryPayload {
    pub name: String,
    pub restaurant_id: String,
}

pub async fn create<'e, E: PgExecutor<'e>>(e: E, payload: CreateCategoryPayload) -> Result<Category> {
    sqlx::query_as::<_, Category>(
        "
        INSERT INTO categories (id, name, restaurant_id)
        VALUES ($1, $2, $3)
        RETURNING *
        ",
    )
    .bind(Ulid::new().to_string())
    .bind(payload.name)
    .bind(&payload.restaurant_id)
    .fetch_one(e)
    .await
    .map_err(|err| {
        tracing::error!(
            "Error occurred while creating a category in restaurant {}: {}",
            payload.restaurant_id,
            err
        );
        Error::UnexpectedError
    })
}

/// Only returns the category when its restaurant belongs to `owner_id`.
pub async fn find_by_id_and_owner_id<'e, E: PgExecutor<'e>>(
    e: E,
    id: String,
    owner_id: String,
) -> Result<Option<Category>> {
    sqlx::query_as::<_, Category>(
        "
        SELECT categories.*
        FROM categories
        INNER JOIN restaurants ON restaurants.id = categories.restaurant_id
        WHERE categories.id = $1 AND restaurants.owner_id = $2
        ",
    )
    .bind(&id)
    .bind(owner_id)
    .fetch_optional(e)
    .await
    .map_err(|err| {
        tracing::error!(
            "Error occurred while fetching category with id {}: {}",
            id,
            err
        );
        Error::UnexpectedError
    })
}

pub async fn find_by_id_and_restaurant_id<'e, E: PgExecutor<'e>>(
    e: E,
    id: String,
    restaurant_id: String,
) -> Result<Option<Category>> {
    sqlx::query_as::<_, Category>("SELECT * FROM categories WHERE id = $1 AND restaurant_id = $2")
        .bind(&id)
        .bind(restaurant_id)
        .fetch_optional(e)
        .await
        .map_err(|err| {
            tracing::error!(
                "Error occurred while fetching category with id {}: {}",
                id,
                err
            );
            Error::UnexpectedError
        })
}

pub struct Filters {
    pub owner_id: String,
    pub restaurant_id: Option<String>,
}

pub async fn find_many<'e, E: PgExecutor<'e>>(
    e: E,
    filters: Filters,
) -> Result<Vec<CategoryWithRestaurant>> {
    sqlx::query_as::<_, CategoryWithRestaurant>(
        "
        SELECT
            categories.id,
            categories.name,
            categories.restaurant_id,
            restaurants.name AS restaurant_name,
            categories.created_at,
            categories.updated_at
        FROM categories
        INNER JOIN restaurants ON restaurants.id = categories.restaurant_id
        WHERE
            restaurants.owner_id = $1
            AND ($2::VARCHAR IS NULL OR categories.restaurant_id = $2)
        ORDER BY
            CASE WHEN $2::VARCHAR IS NULL THEN NULL ELSE categories.name END ASC,
            COALESCE(categories.updated_at, categories.created_at) DESC,
            categories.id DESC
        ",
    )
    .bind(&filters.owner_id)
    .bind(filters.restaurant_id)
    .fetch_all(e)
    .await
    .map_err(|err| {
        tracing::error!(
            "Error occurred while fetching categories of owner {}: {}",
            filters.owner_id,
            err
        );
        Error::UnexpectedError
    })
}

pub async fn update_by_id<'e, E: PgExecutor<'e>>(e: E, id: String, name: String) -> Result<Category> {
    sqlx::query_as::<_, Category>(
        "
        UPDATE categories SET
            name = $2,
            updated_at = NOW()
        WHERE id = $1
        RETURNING *
        ",
    )
    .bind(&id)
    .bind(name)
    .fetch_one(e)
    .await
    .map_err(|err| {
        tracing::error!(
            "Error occurred while updating category with id {}: {}",
            id,
            err
        );
        Error::UnexpectedError
    })
}

pub async fn delete_by_id<'e, E: PgExecutor<'e>>(e: E, id: String) -> Result<()> {
    sqlx::query("DELETE FROM categories WHERE id = $1")
        .bind(&id)
        .execute(e)
        .await
        .map(|_| ())
        .map_err(|err| {
            tracing::error!(
                "Error occurred while deleting category with id {}: {}",
                id,
                err
            );
            Error::UnexpectedError
        })
}
