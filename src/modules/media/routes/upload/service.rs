use super::types::{request, response};
use crate::{modules::auth::middleware::Auth, types::Context};
use std::io::Read;
use std::sync::Arc;

pub async fn service(ctx: Arc<Context>, auth: Auth, mut payload: request::Payload) -> response::Response {
    let mut buf: Vec<u8> = vec![];

    payload
        .file
        .contents
        .read_to_end(&mut buf)
        .map_err(|err| {
            tracing::error!("Failed to read the uploaded file {err:?}");
            response::Error::FailedToReadUpload
        })?;

    if buf.is_empty() {
        return Err(response::Error::EmptyUpload);
    }

    let media = ctx
        .storage
        .upload(buf)
        .await
        .map_err(|_| response::Error::FailedToUploadMedia)?;

    tracing::info!(user_id = %auth.user.id, public_id = %media.public_id, "Media uploaded");

    Ok(response::Success::UploadedMedia(media))
}
