use chrono::NaiveDateTime;
use serde::Serialize;
use sqlx::{FromRow, PgExecutor};
use ulid::Ulid;

#[derive(Serialize, FromRow, Clone, Debug)]
pub struct Session {
    pub id: String,
    pub user_id: String,
    pub access_token: String,
    pub refresh_token: String,
    pub access_token_expires_at: NaiveDateTime,
    pub refresh_token_expires_at: NaiveDateTime,
    pub created_at: NaiveDateTime,
}

#[derive(Debug)]
pub enum Error {
    UnexpectedError,
}

pub struct SessionCreationPayload {
    pub user_id: String,
    pub access_token: String,
    pub refresh_token: String,
    pub access_token_expires_at: NaiveDateTime,
    pub refresh_token_expires_at: NaiveDateTime,
}

pub async fn create<'e, E: PgExecutor<'e>>(
    e: E,
    payload: SessionCreationPayload,
) -> Result<Session, Error> {
    sqlx::query_as::<_, Session>(
        "
        INSERT INTO sessions (
            id,
            user_id,
            access_token,
            refresh_token,
            access_token_expires_at,
            refresh_token_expires_at
        )
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING *
        ",
    )
    .bind(Ulid::new().to_string())
    .bind(&payload.user_id)
    .bind(payload.access_token)
    .bind(payload.refresh_token)
    .bind(payload.access_token_expires_at)
    .bind(payload.refresh_token_expires_at)
    .fetch_one(e)
    .await
    .map_err(|err| {
        tracing::error!(
            "Error occurred while creating a new session for user with id {}: {}",
            payload.user_id,
            err
        );
        Error::UnexpectedError
    })
}

pub async fn find_by_access_token<'e, E: PgExecutor<'e>>(
    e: E,
    access_token: String,
) -> Result<Option<Session>, Error> {
    sqlx::query_as::<_, Session>("SELECT * FROM sessions WHERE access_token = $1")
        .bind(access_token)
        .fetch_optional(e)
        .await
        .map_err(|err| {
            tracing::error!("Error occurred while fetching session by access token: {}", err);
            Error::UnexpectedError
        })
}

pub async fn find_by_refresh_token<'e, E: PgExecutor<'e>>(
    e: E,
    refresh_token: String,
) -> Result<Option<Session>, Error> {
    sqlx::query_as::<_, Session>("SELECT * FROM sessions WHERE refresh_token = $1")
        .bind(refresh_token)
        .fetch_optional(e)
        .await
        .map_err(|err| {
            tracing::error!("Error occurred while fetching session by refresh token: {}", err);
            Error::UnexpectedError
        })
}

pub struct UpdateSessionPayload {
    pub access_token: String,
    pub refresh_token: String,
    pub access_token_expires_at: NaiveDateTime,
    pub refresh_token_expires_at: NaiveDateTime,
}

pub async fn update_by_id<'e, E: PgExecutor<'e>>(
    e: E,
    id: String,
    payload: UpdateSessionPayload,
) -> Result<Session, Error> {
    sqlx::query_as::<_, Session>(
        "
        UPDATE sessions SET
            access_token = $2,
            refresh_token = $3,
            access_token_expires_at = $4,
            refresh_token_expires_at = $5
        WHERE id = $1
        RETURNING *
        ",
    )
    .bind(&id)
    .bind(payload.access_token)
    .bind(payload.refresh_token)
    .bind(payload.access_token_expires_at)
    .bind(payload.refresh_token_expires_at)
    .fetch_one(e)
    .await
    .map_err(|err| {
        tracing::error!("Error occurred while updating session {}: {}", id, err);
        Error::UnexpectedError
    })
}
