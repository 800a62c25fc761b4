use crate::types::Context;
use lettre::{
    message::{header::ContentType, Mailbox},
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use std::sync::Arc;

use super::{types, Error, Notification, Result};

pub async fn send(ctx: Arc<Context>, notification: Notification) -> Result<()> {
    match notification {
        Notification::OtpRequested(n) => send_otp_requested_email(ctx, n).await,
    }
}

struct SendEmailPayload {
    to: String,
    subject: String,
    body: String,
}

async fn send_email(ctx: Arc<Context>, payload: SendEmailPayload) -> Result<()> {
    let mail = ctx.mail.as_ref().ok_or(Error::NotConfigured)?;

    let from = mail.sender.parse::<Mailbox>().map_err(|err| {
        tracing::error!("Invalid mail sender {}: {}", mail.sender, err);
        Error::NotConfigured
    })?;
    let to = payload.to.parse::<Mailbox>().map_err(|err| {
        tracing::error!("Invalid recipient address: {}", err);
        Error::NotSent
    })?;

    let email = Message::builder()
        .from(from)
        .to(to)
        .subject(payload.subject)
        .header(ContentType::TEXT_PLAIN)
        .body(payload.body)
        .map_err(|err| {
            tracing::error!("Failed to build email: {}", err);
            Error::NotSent
        })?;

    let transport: AsyncSmtpTransport<Tokio1Executor> =
        AsyncSmtpTransport::<Tokio1Executor>::relay(&mail.host)
            .map_err(|err| {
                tracing::error!("Failed to set up mail transport for {}: {}", mail.host, err);
                Error::NotConfigured
            })?
            .credentials(Credentials::new(mail.user.clone(), mail.password.clone()))
            .build();

    transport.send(email).await.map(|_| ()).map_err(|err| {
        tracing::error!("Failed to send email: {}", err);
        Error::NotSent
    })
}

async fn send_otp_requested_email(ctx: Arc<Context>, n: types::OtpRequested) -> Result<()> {
    send_email(
        ctx,
        SendEmailPayload {
            to: n.email,
            subject: String::from("Your sign-in code"),
            body: format!(
                "Your sign-in code is {}. It expires in {} minutes.",
                n.code, n.validity_minutes
            ),
        },
    )
    .await
}
