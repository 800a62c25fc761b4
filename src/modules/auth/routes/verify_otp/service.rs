use super::types::{request, response};
use crate::{
    modules::{auth::service, user},
    types::Context,
    utils::validation::is_blank,
};
use chrono::Utc;
use std::sync::Arc;
use validator::Validate;

fn profile_from(payload: &request::Payload) -> Option<user::repository::Profile> {
    match (&payload.name, &payload.country) {
        (Some(name), Some(country)) if !is_blank(name) && !is_blank(country) => {
            Some(user::repository::Profile {
                name: name.trim().to_string(),
                country: country.trim().to_string(),
            })
        }
        _ => None,
    }
}

pub async fn service(ctx: Arc<Context>, payload: request::Payload) -> response::Response {
    payload.validate().map_err(|errors| {
        tracing::warn!("Failed to validate payload: {errors}");
        response::Error::FailedToValidate(errors)
    })?;

    let mut tx = ctx.db_conn.pool.begin().await.map_err(|err| {
        tracing::error!("Failed to start database transaction: {}", err);
        response::Error::UnexpectedError
    })?;

    let user = user::repository::find_by_email_for_update(&mut *tx, payload.email.clone())
        .await
        .map_err(|_| response::Error::UnexpectedError)?
        .ok_or(response::Error::UserNotFound)?;

    if let Err(err) = service::otp::check_code(&user, &payload.otp, Utc::now().naive_utc()) {
        return match err {
            service::otp::VerificationError::InvalidCode => {
                user::repository::record_failed_otp_attempt(
                    &mut *tx,
                    user.id.clone(),
                    service::otp::MAX_ATTEMPTS,
                )
                .await
                .map_err(|_| response::Error::UnexpectedError)?;

                tx.commit().await.map_err(|err| {
                    tracing::error!("Failed to commit database transaction: {}", err);
                    response::Error::UnexpectedError
                })?;

                Err(response::Error::InvalidOtp)
            }
            service::otp::VerificationError::Expired => Err(response::Error::ExpiredOtp),
        };
    }

    let existing_user = user.has_complete_profile();
    let profile = profile_from(&payload);

    // the code stays pending so the client can resubmit with the profile
    if !existing_user && profile.is_none() {
        return Ok(response::Success::NeedsProfile);
    }

    let user = user::repository::complete_verification(
        &mut *tx,
        user.id.clone(),
        if existing_user { None } else { profile },
    )
    .await
    .map_err(|_| response::Error::UnexpectedError)?;

    let session = service::auth::create_session(&mut *tx, user.id.clone())
        .await
        .map_err(|_| response::Error::UnexpectedError)?;

    tx.commit().await.map_err(|err| {
        tracing::error!("Failed to commit database transaction: {}", err);
        response::Error::UnexpectedError
    })?;

    Ok(response::Success::SignedIn {
        existing_user,
        user,
        session,
    })
}
