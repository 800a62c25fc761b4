use super::types::{request, response};
use crate::{modules::auth::service, types::Context};
use std::sync::Arc;
use validator::Validate;

pub async fn service(ctx: Arc<Context>, payload: request::Payload) -> response::Response {
    payload.validate().map_err(|errors| {
        tracing::warn!("Failed to validate payload: {errors}");
        response::Error::FailedToValidate(errors)
    })?;

    service::otp::send(ctx.clone(), payload.email)
        .await
        .map(|_| response::Success::CheckEmailForOtp)
        .map_err(|err| match err {
            service::otp::SendError::TooSoon => response::Error::OtpRequestedTooSoon,
            service::otp::SendError::NotSent => response::Error::FailedToSendOtp,
        })
}
