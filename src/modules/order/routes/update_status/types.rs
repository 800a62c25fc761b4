pub mod request {
    use crate::modules::{auth::middleware::Auth, order::repository};
    use serde::Deserialize;

    #[derive(Deserialize)]
    pub struct Body {
        pub status: repository::OrderStatus,
    }

    pub struct Payload {
        pub id: String,
        pub body: Body,
        pub auth: Auth,
    }
}

pub mod response {
    use axum::{extract::Json, http::StatusCode, response::IntoResponse};
    use serde_json::json;

    use crate::modules::order::repository::{Order, OrderStatus};

    pub enum Success {
        OrderStatusUpdated(Order),
    }

    impl IntoResponse for Success {
        fn into_response(self) -> axum::response::Response {
            match self {
                Self::OrderStatusUpdated(order) => (
                    StatusCode::OK,
                    Json(json!({
                        "message": "Order status updated successfully",
                        "order": order,
                    })),
                )
                    .into_response(),
            }
        }
    }

    pub enum Error {
        OrderNotFound,
        InvalidStatusTransition { from: OrderStatus, to: OrderStatus },
        FailedToUpdateOrderStatus,
    }

    impl IntoResponse for Error {
        fn into_response(self) -> axum::response::Response {
            match self {
                Self::OrderNotFound => (
                    StatusCode::NOT_FOUND,
                    Json(json!({ "error": "Order not found" })),
                )
                    .into_response(),
                Self::InvalidStatusTransition { from, to } => (
                    StatusCode::CONFLICT,
                    Json(json!({
                        "error": format!("Cannot move an order from {} to {}", from, to),
                        "current_status": from,
                    })),
                )
                    .into_response(),
                Self::FailedToUpdateOrderStatus => (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "error": "Failed to update order status" })),
                )
                    .into_response(),
            }
        }
    }

    pub type Response = Result<Success, Error>;
}
