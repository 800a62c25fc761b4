use chrono::NaiveDateTime;
use serde::Serialize;
use sqlx::{FromRow, PgExecutor};
use ulid::Ulid;

#[derive(Serialize, FromRow, Clone, Debug)]
pub struct User {
    pub id: String,
    pub email: String,
    pub name: String,
    pub country: String,
    #[serde(skip_serializing)]
    pub otp_hash: Option<String>,
    #[serde(skip_serializing)]
    pub otp_expires_at: Option<NaiveDateTime>,
    #[serde(skip_serializing)]
    pub otp_attempts: i32,
    #[serde(skip_serializing)]
    pub otp_sent_at: Option<NaiveDateTime>,
    pub is_verified: bool,
    pub created_at: NaiveDateTime,
    pub updated_at: Option<NaiveDateTime>,
}

impl User {
    pub fn has_complete_profile(&self) -> bool {
        !self.name.trim().is_empty() && !self.country.trim().is_empty()
    }
}

type Result<T> = std::result::Result<T, Error>;

#[derive(Debug)]
pub enum Error {
    UnexpectedError,
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

pub async fn find_by_id<'e, E: PgExecutor<'e>>(e: E, id: String) -> Result<Option<User>> {
    sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
        .bind(&id)
        .fetch_optional(e)
        .await
        .map_err(|err| {
            tracing::error!("Error occurred while fetching user with id {}: {}", id, err);
            Error::UnexpectedError
        })
}

/// Locks the row until the surrounding transaction ends.
pub async fn find_by_email_for_update<'e, E: PgExecutor<'e>>(
    e: E,
    email: String,
) -> Result<Option<User>> {
    sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = $1 FOR UPDATE")
        .bind(normalize_email(&email))
        .fetch_optional(e)
        .await
        .map_err(|err| {
            tracing::error!("Error occurred while locking user by email: {}", err);
            Error::UnexpectedError
        })
}

pub struct StoreOtpPayload {
    pub email: String,
    pub otp_hash: String,
    pub otp_expires_at: NaiveDateTime,
    pub otp_sent_at: NaiveDateTime,
    /// A pending code sent after this instant blocks the new one.
    pub resend_after: NaiveDateTime,
}

/// Creates the user on first contact, otherwise replaces any pending code.
/// Returns `None` when the previous code was sent too recently.
pub async fn store_otp<'e, E: PgExecutor<'e>>(
    e: E,
    payload: StoreOtpPayload,
) -> Result<Option<User>> {
    sqlx::query_as::<_, User>(
        "
        INSERT INTO users (id, email, otp_hash, otp_expires_at, otp_attempts, otp_sent_at)
        VALUES ($1, $2, $3, $4, 0, $5)
        ON CONFLICT (email) DO UPDATE SET
            otp_hash = EXCLUDED.otp_hash,
            otp_expires_at = EXCLUDED.otp_expires_at,
            otp_attempts = 0,
            otp_sent_at = EXCLUDED.otp_sent_at,
            updated_at = NOW()
        WHERE users.otp_sent_at IS NULL OR users.otp_sent_at <= $6
        RETURNING *
        ",
    )
    .bind(Ulid::new().to_string())
    .bind(normalize_email(&payload.email))
    .bind(payload.otp_hash)
    .bind(payload.otp_expires_at)
    .bind(payload.otp_sent_at)
    .bind(payload.resend_after)
    .fetch_optional(e)
    .await
    .map_err(|err| {
        tracing::error!("Error occurred while storing an otp: {}", err);
        Error::UnexpectedError
    })
}

/// Drops a code that never reached the user so a new one can be requested at once.
pub async fn release_otp<'e, E: PgExecutor<'e>>(
    e: E,
    id: String,
    sent_at: NaiveDateTime,
) -> Result<()> {
    sqlx::query(
        "
        UPDATE users SET
            otp_hash = NULL,
            otp_expires_at = NULL,
            otp_sent_at = NULL,
            updated_at = NOW()
        WHERE id = $1 AND otp_sent_at = $2
        ",
    )
    .bind(&id)
    .bind(sent_at)
    .execute(e)
    .await
    .map(|_| ())
    .map_err(|err| {
        tracing::error!("Error occurred while releasing the otp of user {}: {}", id, err);
        Error::UnexpectedError
    })
}

/// Counts a wrong guess and drops the pending code once `max_attempts` is reached.
pub async fn record_failed_otp_attempt<'e, E: PgExecutor<'e>>(
    e: E,
    id: String,
    max_attempts: i32,
) -> Result<()> {
    sqlx::query(
        "
        UPDATE users SET
            otp_attempts = otp_attempts + 1,
            otp_hash = CASE WHEN otp_attempts + 1 >= $2 THEN NULL ELSE otp_hash END,
            otp_expires_at = CASE WHEN otp_attempts + 1 >= $2 THEN NULL ELSE otp_expires_at END,
            updated_at = NOW()
        WHERE id = $1
        ",
    )
    .bind(&id)
    .bind(max_attempts)
    .execute(e)
    .await
    .map(|_| ())
    .map_err(|err| {
        tracing::error!(
            "Error occurred while recording a failed otp attempt for user {}: {}",
            id,
            err
        );
        Error::UnexpectedError
    })
}

pub struct Profile {
    pub name: String,
    pub country: String,
}

pub async fn complete_verification<'e, E: PgExecutor<'e>>(
    e: E,
    id: String,
    profile: Option<Profile>,
) -> Result<User> {
    let (name, country) = match profile {
        Some(profile) => (Some(profile.name), Some(profile.country)),
        None => (None, None),
    };

    sqlx::query_as::<_, User>(
        "
        UPDATE users SET
            name = COALESCE($2, name),
            country = COALESCE($3, country),
            is_verified = TRUE,
            otp_hash = NULL,
            otp_expires_at = NULL,
            otp_attempts = 0,
            updated_at = NOW()
        WHERE id = $1
        RETURNING *
        ",
    )
    .bind(&id)
    .bind(name)
    .bind(country)
    .fetch_one(e)
    .await
    .map_err(|err| {
        tracing::error!("Error occurred while verifying user {}: {}", id, err);
        Error::UnexpectedError
    })
}
