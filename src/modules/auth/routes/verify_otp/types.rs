pub mod request {
    use serde::Deserialize;
    use validator::Validate;

    #[derive(Deserialize, Validate)]
    pub struct Payload {
        #[validate(email(code = "INVALID_USER_EMAIL", message = "Invalid email address"))]
        pub email: String,
        #[validate(length(equal = 6, code = "INVALID_OTP", message = "OTP must be 6 digits"))]
        pub otp: String,
        pub name: Option<String>,
        pub country: Option<String>,
    }
}

pub mod response {
    use axum::{extract::Json, http::StatusCode, response::IntoResponse};
    use serde_json::json;
    use validator::ValidationErrors;

    use crate::{
        modules::{auth::repository::session::Session, user::repository::User},
        utils,
    };

    pub enum Success {
        NeedsProfile,
        SignedIn {
            existing_user: bool,
            user: User,
            session: Session,
        },
    }

    impl IntoResponse for Success {
        fn into_response(self) -> axum::response::Response {
            match self {
                Self::NeedsProfile => (
                    StatusCode::OK,
                    Json(json!({
                        "needs_profile": true,
                        "message": "Name and country are required to finish signing up"
                    })),
                )
                    .into_response(),
                Self::SignedIn {
                    existing_user,
                    user,
                    session,
                } => (
                    StatusCode::OK,
                    Json(json!({
                        "needs_profile": false,
                        "existing_user": existing_user,
                        "user": user,
                        "access_token": session.access_token,
                        "refresh_token": session.refresh_token,
                    })),
                )
                    .into_response(),
            }
        }
    }

    pub enum Error {
        FailedToValidate(ValidationErrors),
        UserNotFound,
        InvalidOtp,
        ExpiredOtp,
        UnexpectedError,
    }

    impl IntoResponse for Error {
        fn into_response(self) -> axum::response::Response {
            match self {
                Self::FailedToValidate(errors) => {
                    utils::validation::into_response(errors).into_response()
                }
                Self::UserNotFound => (
                    StatusCode::NOT_FOUND,
                    Json(json!({ "error": "User not found"})),
                )
                    .into_response(),
                Self::InvalidOtp => (
                    StatusCode::BAD_REQUEST,
                    Json(json!({ "error": "Invalid OTP"})),
                )
                    .into_response(),
                Self::ExpiredOtp => (
                    StatusCode::BAD_REQUEST,
                    Json(json!({ "error": "OTP has expired"})),
                )
                    .into_response(),
                Self::UnexpectedError => (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "error": "Sorry an error occurred" })),
                )
                    .into_response(),
            }
        }
    }

    pub type Response = Result<Success, Error>;
}
