pub mod email;

use crate::types::Context;
use std::sync::Arc;

pub enum Backend {
    Email,
    Log,
}

pub mod types {
    #[derive(Clone)]
    pub struct OtpRequested {
        pub email: String,
        pub code: String,
        pub validity_minutes: i64,
    }
}

#[derive(Clone)]
pub enum Notification {
    OtpRequested(types::OtpRequested),
}

impl Notification {
    pub fn otp_requested(email: String, code: String, validity_minutes: i64) -> Self {
        Notification::OtpRequested(types::OtpRequested {
            email,
            code,
            validity_minutes,
        })
    }
}

#[derive(Debug)]
pub enum Error {
    NotSent,
    NotConfigured,
}

pub type Result<T> = std::result::Result<T, Error>;

/// Without an SMTP transport (development only) codes are written to the log.
pub fn default_backend(ctx: &Context) -> Backend {
    match ctx.mail {
        Some(_) => Backend::Email,
        None => Backend::Log,
    }
}

pub async fn send(ctx: Arc<Context>, notification: Notification, backend: Backend) -> Result<()> {
    match backend {
        Backend::Email => email::send(ctx, notification).await,
        Backend::Log => {
            log(notification);
            Ok(())
        }
    }
}

fn log(notification: Notification) {
    match notification {
        Notification::OtpRequested(n) => {
            tracing::info!(email = %n.email, code = %n.code, "OTP issued");
        }
    }
}
