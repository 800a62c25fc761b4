use bigdecimal::BigDecimal;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::{types::Json, FromRow, PgExecutor};
use ulid::Ulid;

#[derive(Serialize, FromRow, Clone, Debug)]
pub struct Dish {
    pub id: String,
    pub name: String,
    pub description: String,
    pub price: BigDecimal,
    pub spice_level: String,
    pub image_url: String,
    pub created_at: NaiveDateTime,
    pub updated_at: Option<NaiveDateTime>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct DishCategory {
    pub id: String,
    pub name: String,
}

/// A dish together with the categories it sits in at one restaurant.
#[derive(Serialize, FromRow, Clone, Debug)]
pub struct DishWithCategories {
    pub id: String,
    pub name: String,
    pub description: String,
    pub price: BigDecimal,
    pub spice_level: String,
    pub image_url: String,
    pub categories: Json<Vec<DishCategory>>,
    pub created_at: NaiveDateTime,
    pub updated_at: Option<NaiveDateTime>,
}

#[derive(Debug)]
pub enum Error {
    UnexpectedError,
}

type Result<T> = std::result::Result<T, Error>;

pub struct CreateDishPayload {
    pub name: String,
    pub description: String,
    pub price: BigDecimal,
    pub spice_level: String,
    pub image_url: String,
}

pub async fn create<'e, E: PgExecutor<'e>>(e: E, payload: CreateDishPayload) -> Result<Dish> {
    sqlx::query_as::<_, Dish>(
        "
        INSERT INTO dishes (id, name, description, price, spice_level, image_url)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING *
        ",
    )
    .bind(Ulid::new().to_string())
    .bind(payload.name)
    .bind(payload.description)
    .bind(payload.price)
    .bind(payload.spice_level)
    .bind(payload.image_url)
    .fetch_one(e)
    .await
    .map_err(|err| {
        tracing::error!("Error occurred while creating a dish: {}", err);
        Error::UnexpectedError
    })
}

pub async fn link_restaurant<'e, E: PgExecutor<'e>>(
    e: E,
    dish_id: String,
    restaurant_id: String,
) -> Result<()> {
    sqlx::query(
        "
        INSERT INTO dish_restaurants (dish_id, restaurant_id)
        VALUES ($1, $2)
        ON CONFLICT DO NOTHING
        ",
    )
    .bind(&dish_id)
    .bind(&restaurant_id)
    .execute(e)
    .await
    .map(|_| ())
    .map_err(|err| {
        tracing::error!(
            "Error occurred while linking dish {} to restaurant {}: {}",
            dish_id,
            restaurant_id,
            err
        );
        Error::UnexpectedError
    })
}

pub async fn link_category<'e, E: PgExecutor<'e>>(
    e: E,
    dish_id: String,
    category_id: String,
) -> Result<()> {
    sqlx::query(
        "
        INSERT INTO dish_categories (dish_id, category_id)
        VALUES ($1, $2)
        ON CONFLICT DO NOTHING
        ",
    )
    .bind(&dish_id)
    .bind(&category_id)
    .execute(e)
    .await
    .map(|_| ())
    .map_err(|err| {
        tracing::error!(
            "Error occurred while linking dish {} to category {}: {}",
            dish_id,
            category_id,
            err
        );
        Error::UnexpectedError
    })
}

pub async fn clear_categories<'e, E: PgExecutor<'e>>(e: E, dish_id: String) -> Result<()> {
    sqlx::query("DELETE FROM dish_categories WHERE dish_id = $1")
        .bind(&dish_id)
        .execute(e)
        .await
        .map(|_| ())
        .map_err(|err| {
            tracing::error!(
                "Error occurred while clearing categories of dish {}: {}",
                dish_id,
                err
            );
            Error::UnexpectedError
        })
}

pub async fn find_many_by_restaurant_id<'e, E: PgExecutor<'e>>(
    e: E,
    restaurant_id: String,
) -> Result<Vec<DishWithCategories>> {
    sqlx::query_as::<_, DishWithCategories>(
        "
        SELECT
            dishes.id,
            dishes.name,
            dishes.description,
            dishes.price,
            dishes.spice_level,
            dishes.image_url,
            COALESCE(
                JSONB_AGG(
                    JSONB_BUILD_OBJECT('id', categories.id, 'name', categories.name)
                    ORDER BY categories.name
                ) FILTER (WHERE categories.id IS NOT NULL),
                '[]'::JSONB
            ) AS categories,
            dishes.created_at,
            dishes.updated_at
        FROM dishes
        INNER JOIN dish_restaurants
            ON dish_restaurants.dish_id = dishes.id
            AND dish_restaurants.restaurant_id = $1
        LEFT JOIN dish_categories ON dish_categories.dish_id = dishes.id
        LEFT JOIN categories
            ON categories.id = dish_categories.category_id
            AND categories.restaurant_id = $1
        GROUP BY dishes.id
        ORDER BY dishes.name ASC, dishes.id ASC
        ",
    )
    .bind(&restaurant_id)
    .fetch_all(e)
    .await
    .map_err(|err| {
        tracing::error!(
            "Error occurred while fetching dishes of restaurant {}: {}",
            restaurant_id,
            err
        );
        Error::UnexpectedError
    })
}

/// Dishes among `ids` that are offered at `restaurant_id`. Unknown ids are skipped.
pub async fn find_many_by_ids_for_restaurant<'e, E: PgExecutor<'e>>(
    e: E,
    ids: Vec<String>,
    restaurant_id: String,
) -> Result<Vec<Dish>> {
    sqlx::query_as::<_, Dish>(
        "
        SELECT dishes.*
        FROM dishes
        INNER JOIN dish_restaurants ON dish_restaurants.dish_id = dishes.id
        WHERE dishes.id = ANY($1) AND dish_restaurants.restaurant_id = $2
        ",
    )
    .bind(ids)
    .bind(&restaurant_id)
    .fetch_all(e)
    .await
    .map_err(|err| {
        tracing::error!(
            "Error occurred while fetching dishes for restaurant {}: {}",
            restaurant_id,
            err
        );
        Error::UnexpectedError
    })
}

/// Only returns the dish when it is offered at a restaurant of `owner_id`.
pub async fn find_by_id_and_owner_id<'e, E: PgExecutor<'e>>(
    e: E,
    id: String,
    owner_id: String,
) -> Result<Option<Dish>> {
    sqlx::query_as::<_, Dish>(
        "
        SELECT dishes.*
        FROM dishes
        WHERE dishes.id = $1 AND EXISTS (
            SELECT 1
            FROM dish_restaurants
            INNER JOIN restaurants ON restaurants.id = dish_restaurants.restaurant_id
            WHERE dish_restaurants.dish_id = dishes.id AND restaurants.owner_id = $2
        )
        ",
    )
    .bind(&id)
    .bind(owner_id)
    .fetch_optional(e)
    .await
    .map_err(|err| {
        tracing::error!("Error occurred while fetching dish with id {}: {}", id, err);
        Error::UnexpectedError
    })
}

pub async fn find_restaurant_ids<'e, E: PgExecutor<'e>>(e: E, id: String) -> Result<Vec<String>> {
    sqlx::query_scalar::<_, String>("SELECT restaurant_id FROM dish_restaurants WHERE dish_id = $1")
        .bind(&id)
        .fetch_all(e)
        .await
        .map_err(|err| {
            tracing::error!(
                "Error occurred while fetching restaurants of dish {}: {}",
                id,
                err
            );
            Error::UnexpectedError
        })
}

pub struct UpdateDishPayload {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<BigDecimal>,
    pub spice_level: Option<String>,
    pub image_url: Option<String>,
}

pub async fn update_by_id<'e, E: PgExecutor<'e>>(
    e: E,
    id: String,
    payload: UpdateDishPayload,
) -> Result<Dish> {
    sqlx::query_as::<_, Dish>(
        "
        UPDATE dishes SET
            name = COALESCE($2, name),
            description = COALESCE($3, description),
            price = COALESCE($4, price),
            spice_level = COALESCE($5, spice_level),
            image_url = COALESCE($6, image_url),
            updated_at = NOW()
        WHERE id = $1
        RETURNING *
        ",
    )
    .bind(&id)
    .bind(payload.name)
    .bind(payload.description)
    .bind(payload.price)
    .bind(payload.spice_level)
    .bind(payload.image_url)
    .fetch_one(e)
    .await
    .map_err(|err| {
        tracing::error!("Error occurred while updating dish with id {}: {}", id, err);
        Error::UnexpectedError
    })
}

pub async fn delete_by_id<'e, E: PgExecutor<'e>>(e: E, id: String) -> Result<()> {
    sqlx::query("DELETE FROM dishes WHERE id = $1")
        .bind(&id)
        .execute(e)
        .await
        .map(|_| ())
        .map_err(|err| {
            tracing::error!("Error occurred while deleting dish with id {}: {}", id, err);
            Error::UnexpectedError
        })
}

/// Removes dishes that are no longer offered at any restaurant.
pub async fn delete_orphaned<'e, E: PgExecutor<'e>>(e: E) -> Result<u64> {
    sqlx::query(
        "
        DELETE FROM dishes
        WHERE NOT EXISTS (
            SELECT 1 FROM dish_restaurants WHERE dish_restaurants.dish_id = dishes.id
        )
        ",
    )
    .execute(e)
    .await
    .map(|res| res.rows_affected())
    .map_err(|err| {
        tracing::error!("Error occurred while deleting orphaned dishes: {}", err);
        Error::UnexpectedError
    })
}
