pub mod request {
    use axum_typed_multipart::{FieldData, TryFromMultipart};
    use tempfile::NamedTempFile;

    #[derive(TryFromMultipart)]
    pub struct Payload {
        #[form_data(limit = "10MiB")]
        pub file: FieldData<NamedTempFile>,
    }
}

pub mod response {
    use axum::{extract::Json, http::StatusCode, response::IntoResponse};
    use serde_json::json;

    use crate::modules::storage::UploadedMedia;

    pub enum Success {
        UploadedMedia(UploadedMedia),
    }

    impl IntoResponse for Success {
        fn into_response(self) -> axum::response::Response {
            match self {
                Self::UploadedMedia(media) => (
                    StatusCode::OK,
                    Json(json!({
                        "url": media.url,
                        "public_id": media.public_id,
                    })),
                )
                    .into_response(),
            }
        }
    }

    pub enum Error {
        FailedToReadUpload,
        EmptyUpload,
        FailedToUploadMedia,
    }

    impl IntoResponse for Error {
        fn into_response(self) -> axum::response::Response {
            match self {
                Self::FailedToReadUpload => (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "error": "Failed to read the uploaded file" })),
                )
                    .into_response(),
                Self::EmptyUpload => (
                    StatusCode::BAD_REQUEST,
                    Json(json!({ "error": "Uploaded file is empty" })),
                )
                    .into_response(),
                Self::FailedToUploadMedia => (
                    StatusCode::BAD_GATEWAY,
                    Json(json!({ "error": "Failed to upload media" })),
                )
                    .into_response(),
            }
        }
    }

    pub type Response = Result<Success, Error>;
}
