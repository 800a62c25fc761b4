use chrono::{Duration, NaiveDateTime, Utc};
use rand::Rng;
use sha2::Digest;
use std::sync::Arc;

use crate::{
    modules::{notification, user, user::repository::User},
    types::Context,
};

pub const CODE_VALIDITY_MINUTES: i64 = 5;
pub const RESEND_INTERVAL_SECONDS: i64 = 60;
pub const MAX_ATTEMPTS: i32 = 5;

#[derive(Eq, PartialEq, Debug)]
pub enum SendError {
    NotSent,
    TooSoon,
}

#[derive(Eq, PartialEq, Debug)]
pub enum VerificationError {
    InvalidCode,
    Expired,
}

pub fn generate_code() -> String {
    rand::thread_rng().gen_range(100_000..=999_999).to_string()
}

pub fn hash_code(code: &str) -> String {
    let mut hasher = sha2::Sha256::new();
    hasher.update(code.trim());
    base16ct::lower::encode_string(&hasher.finalize())
}

/// Latest send time of a pending code that still allows a new one at `now`.
pub fn resend_cutoff(now: NaiveDateTime) -> NaiveDateTime {
    now - Duration::seconds(RESEND_INTERVAL_SECONDS)
}

/// A wrong code is reported as such even when the pending one has expired.
pub fn check_code(user: &User, code: &str, now: NaiveDateTime) -> Result<(), VerificationError> {
    let stored = user
        .otp_hash
        .as_deref()
        .ok_or(VerificationError::InvalidCode)?;

    if stored != hash_code(code) {
        return Err(VerificationError::InvalidCode);
    }

    match user.otp_expires_at {
        Some(expires_at) if now <= expires_at => Ok(()),
        _ => Err(VerificationError::Expired),
    }
}

pub async fn send(ctx: Arc<Context>, email: String) -> Result<User, SendError> {
    let now = Utc::now().naive_utc();
    let code = generate_code();

    let user = user::repository::store_otp(
        &ctx.db_conn.pool,
        user::repository::StoreOtpPayload {
            email,
            otp_hash: hash_code(&code),
            otp_expires_at: now + Duration::minutes(CODE_VALIDITY_MINUTES),
            otp_sent_at: now,
            resend_after: resend_cutoff(now),
        },
    )
    .await
    .map_err(|_| SendError::NotSent)?
    .ok_or(SendError::TooSoon)?;

    let backend = notification::service::default_backend(&ctx);
    let delivered = notification::service::send(
        ctx.clone(),
        notification::service::Notification::otp_requested(
            user.email.clone(),
            code,
            CODE_VALIDITY_MINUTES,
        ),
        backend,
    )
    .await;

    if let Err(err) = delivered {
        tracing::error!("Failed to deliver otp to user {}: {:?}", user.id, err);
        // match on the stored value; postgres keeps microseconds only
        if let Some(sent_at) = user.otp_sent_at {
            let _ =
                user::repository::release_otp(&ctx.db_conn.pool, user.id.clone(), sent_at).await;
        }
        return Err(SendError::NotSent);
    }

    Ok(user)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user_with_code(code: &str, expires_at: NaiveDateTime) -> User {
        User {
            id: "01J9ZQ3Y8D8X9M7Q2W4K6T1B3C".to_string(),
            email: "owner@spicehub.in".to_string(),
            name: "Asha".to_string(),
            country: "India".to_string(),
            otp_hash: Some(hash_code(code)),
            otp_expires_at: Some(expires_at),
            otp_attempts: 0,
            otp_sent_at: Some(expires_at - Duration::minutes(CODE_VALIDITY_MINUTES)),
            is_verified: false,
            created_at: expires_at - Duration::minutes(CODE_VALIDITY_MINUTES),
            updated_at: None,
        }
    }

    #[test]
    fn generated_codes_have_six_digits() {
        for _ in 0..50 {
            let code = generate_code();
            assert_eq!(code.len(), 6);
            assert!(code.chars().all(|c| c.is_ascii_digit()));
        }
    }

    #[test]
    fn correct_unexpired_code_is_accepted() {
        let now = Utc::now().naive_utc();
        let user = user_with_code("123456", now + Duration::minutes(3));

        assert_eq!(check_code(&user, "123456", now), Ok(()));
    }

    #[test]
    fn wrong_code_is_invalid_even_after_expiry() {
        let now = Utc::now().naive_utc();
        let user = user_with_code("123456", now - Duration::minutes(1));

        assert_eq!(
            check_code(&user, "654321", now),
            Err(VerificationError::InvalidCode)
        );
        assert_eq!(
            check_code(&user, "123456", now),
            Err(VerificationError::Expired)
        );
    }

    #[test]
    fn missing_code_is_invalid() {
        let now = Utc::now().naive_utc();
        let mut user = user_with_code("123456", now + Duration::minutes(3));
        user.otp_hash = None;

        assert_eq!(
            check_code(&user, "123456", now),
            Err(VerificationError::InvalidCode)
        );
    }

    #[test]
    fn resend_cutoff_is_one_interval_back() {
        let now = Utc::now().naive_utc();
        let cutoff = resend_cutoff(now);

        assert!(now - Duration::seconds(10) > cutoff);
        assert_eq!(now - Duration::seconds(RESEND_INTERVAL_SECONDS), cutoff);
    }
}
