pub mod request {
    use serde::Deserialize;

    #[derive(Deserialize)]
    pub struct Item {
        pub dish_id: String,
        pub quantity: i32,
    }

    #[derive(Deserialize)]
    pub struct Payload {
        pub customer_name: String,
        pub table_number: String,
        pub restaurant_id: String,
        pub items: Vec<Item>,
    }
}

pub mod response {
    use axum::{extract::Json, http::StatusCode, response::IntoResponse};
    use serde_json::json;

    use crate::modules::order::{repository::FullOrder, service::CreateOrderError};

    pub enum Success {
        OrderCreated(FullOrder),
    }

    impl IntoResponse for Success {
        fn into_response(self) -> axum::response::Response {
            match self {
                Self::OrderCreated(order) => (StatusCode::CREATED, Json(json!(order))).into_response(),
            }
        }
    }

    pub enum Error {
        FailedToCreateOrder(CreateOrderError),
        UnexpectedError,
    }

    impl IntoResponse for Error {
        fn into_response(self) -> axum::response::Response {
            match self {
                Self::FailedToCreateOrder(err) => err.into_response(),
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
