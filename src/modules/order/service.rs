use axum::{http::StatusCode, response::IntoResponse, Json};
use bigdecimal::BigDecimal;
use itertools::Itertools;
use serde_json::json;
use sqlx::PgConnection;
use std::collections::HashMap;

use super::repository::{self, FullOrder, Order, OrderLine, OrderStatus};
use crate::{
    modules::{dish, dish::repository::Dish, restaurant},
    utils::{money, validation::is_blank},
};

pub const MAX_QUANTITY: i32 = 100;

#[derive(Clone, Debug)]
pub struct RequestedItem {
    pub dish_id: String,
    pub quantity: i32,
}

pub struct CreateOrderInput {
    pub customer_name: String,
    pub table_number: String,
    pub restaurant_id: String,
    pub items: Vec<RequestedItem>,
}

#[derive(Debug, PartialEq, Eq)]
pub enum CreateOrderError {
    Invalid(&'static str),
    RestaurantNotFound,
    DishNotOffered(String),
    UnexpectedError,
}

impl IntoResponse for CreateOrderError {
    fn into_response(self) -> axum::response::Response {
        match self {
            Self::Invalid(message) => {
                (StatusCode::BAD_REQUEST, Json(json!({ "error": message }))).into_response()
            }
            Self::RestaurantNotFound => (
                StatusCode::NOT_FOUND,
                Json(json!({ "error": "Restaurant not found" })),
            )
                .into_response(),
            Self::DishNotOffered(dish_id) => (
                StatusCode::BAD_REQUEST,
                Json(json!({
                    "error": "Dish is not offered at this restaurant",
                    "dish_id": dish_id,
                })),
            )
                .into_response(),
            Self::UnexpectedError => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "Failed to create order" })),
            )
                .into_response(),
        }
    }
}

/// Repeated dishes are folded into one line; first-seen order is kept.
pub fn merge_items(items: Vec<RequestedItem>) -> Vec<RequestedItem> {
    let mut merged: Vec<RequestedItem> = Vec::with_capacity(items.len());
    let mut index: HashMap<String, usize> = HashMap::new();

    for item in items {
        match index.get(&item.dish_id) {
            Some(&at) => merged[at].quantity += item.quantity,
            None => {
                index.insert(item.dish_id.clone(), merged.len());
                merged.push(item);
            }
        }
    }

    merged
}

pub fn validate_request(input: &CreateOrderInput) -> Result<Vec<RequestedItem>, CreateOrderError> {
    if is_blank(&input.customer_name) {
        return Err(CreateOrderError::Invalid("Customer name is required"));
    }

    if is_blank(&input.table_number) {
        return Err(CreateOrderError::Invalid("Table number is required"));
    }

    if input.items.is_empty() {
        return Err(CreateOrderError::Invalid("Order must contain at least one item"));
    }

    if input.items.iter().any(|item| is_blank(&item.dish_id)) {
        return Err(CreateOrderError::Invalid("Every item needs a dish id"));
    }

    if input
        .items
        .iter()
        .any(|item| item.quantity < 1 || item.quantity > MAX_QUANTITY)
    {
        return Err(CreateOrderError::Invalid("Quantity must be between 1 and 100"));
    }

    let merged = merge_items(input.items.clone());

    if merged.iter().any(|item| item.quantity > MAX_QUANTITY) {
        return Err(CreateOrderError::Invalid("Quantity must be between 1 and 100"));
    }

    Ok(merged)
}

/// Prices every requested item from the stored dish rows.
pub fn price_lines(
    items: &[RequestedItem],
    dishes: Vec<Dish>,
) -> Result<Vec<OrderLine>, CreateOrderError> {
    let dishes: HashMap<String, Dish> = dishes
        .into_iter()
        .map(|dish| (dish.id.clone(), dish))
        .collect();

    items
        .iter()
        .map(|item| {
            dishes
                .get(&item.dish_id)
                .map(|dish| OrderLine {
                    dish_id: dish.id.clone(),
                    name: dish.name.clone(),
                    price: dish.price.clone(),
                    quantity: item.quantity,
                })
                .ok_or_else(|| CreateOrderError::DishNotOffered(item.dish_id.clone()))
        })
        .collect()
}

pub fn compute_total(lines: &[OrderLine]) -> BigDecimal {
    lines
        .iter()
        .map(|line| money::line_total(&line.price, line.quantity))
        .fold(BigDecimal::from(0), |acc, amount| acc + amount)
}

/// Validates, prices and writes an order on `conn`; the caller owns the transaction.
pub async fn create_order(
    conn: &mut PgConnection,
    input: CreateOrderInput,
) -> Result<FullOrder, CreateOrderError> {
    let items = validate_request(&input)?;

    restaurant::repository::find_by_id(&mut *conn, input.restaurant_id.clone())
        .await
        .map_err(|_| CreateOrderError::UnexpectedError)?
        .ok_or(CreateOrderError::RestaurantNotFound)?;

    let dishes = dish::repository::find_many_by_ids_for_restaurant(
        &mut *conn,
        items.iter().map(|item| item.dish_id.clone()).unique().collect(),
        input.restaurant_id.clone(),
    )
    .await
    .map_err(|_| CreateOrderError::UnexpectedError)?;

    let lines = price_lines(&items, dishes)?;
    let total = compute_total(&lines);

    repository::create(
        conn,
        repository::CreateOrderPayload {
            customer_name: input.customer_name.trim().to_string(),
            table_number: input.table_number.trim().to_string(),
            restaurant_id: input.restaurant_id,
            total,
            lines,
        },
    )
    .await
    .map_err(|_| CreateOrderError::UnexpectedError)
}

#[derive(Debug)]
pub enum UpdateStatusError {
    OrderNotFound,
    InvalidTransition { from: OrderStatus, to: OrderStatus },
    UnexpectedError,
}

pub async fn update_order_status(
    conn: &mut PgConnection,
    order: Order,
    to: OrderStatus,
) -> Result<Order, UpdateStatusError> {
    if !order.status.can_transition_to(to) {
        return Err(UpdateStatusError::InvalidTransition {
            from: order.status,
            to,
        });
    }

    match repository::update_status(&mut *conn, order.id.clone(), order.status, to)
        .await
        .map_err(|_| UpdateStatusError::UnexpectedError)?
    {
        Some(order) => Ok(order),
        // someone else moved it first
        None => match repository::find_by_id(&mut *conn, order.id)
            .await
            .map_err(|_| UpdateStatusError::UnexpectedError)?
        {
            Some(current) => Err(UpdateStatusError::InvalidTransition {
                from: current.status,
                to,
            }),
            None => Err(UpdateStatusError::OrderNotFound),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use std::str::FromStr;

    fn dish(id: &str, name: &str, price: &str) -> Dish {
        Dish {
            id: id.to_string(),
            name: name.to_string(),
            description: String::new(),
            price: BigDecimal::from_str(price).unwrap(),
            spice_level: String::new(),
            image_url: String::new(),
            created_at: Utc::now().naive_utc(),
            updated_at: None,
        }
    }

    fn item(dish_id: &str, quantity: i32) -> RequestedItem {
        RequestedItem {
            dish_id: dish_id.to_string(),
            quantity,
        }
    }

    fn input(items: Vec<RequestedItem>) -> CreateOrderInput {
        CreateOrderInput {
            customer_name: "Ravi".to_string(),
            table_number: "4".to_string(),
            restaurant_id: "r1".to_string(),
            items,
        }
    }

    #[test]
    fn total_is_sum_of_server_prices() {
        let items = vec![item("paneer", 2), item("naan", 3)];
        let lines = price_lines(
            &items,
            vec![dish("paneer", "Paneer Tikka", "180"), dish("naan", "Butter Naan", "45.50")],
        )
        .unwrap();

        assert_eq!(compute_total(&lines), BigDecimal::from_str("496.50").unwrap());
        assert_eq!(lines[0].name, "Paneer Tikka");
    }

    #[test]
    fn dish_missing_from_restaurant_is_rejected() {
        let items = vec![item("paneer", 1), item("biryani", 1)];
        assert_eq!(
            price_lines(&items, vec![dish("paneer", "Paneer Tikka", "180")]).unwrap_err(),
            CreateOrderError::DishNotOffered("biryani".to_string())
        );
    }

    #[test]
    fn duplicate_dishes_are_merged() {
        let merged = merge_items(vec![item("a", 1), item("b", 2), item("a", 3)]);
        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0].dish_id, "a");
        assert_eq!(merged[0].quantity, 4);
        assert_eq!(merged[1].quantity, 2);
    }

    #[test]
    fn empty_orders_and_bad_quantities_are_rejected() {
        assert!(matches!(
            validate_request(&input(vec![])),
            Err(CreateOrderError::Invalid(_))
        ));
        assert!(matches!(
            validate_request(&input(vec![item("a", 0)])),
            Err(CreateOrderError::Invalid(_))
        ));
        assert!(matches!(
            validate_request(&input(vec![item("a", 60), item("a", 60)])),
            Err(CreateOrderError::Invalid(_))
        ));
    }

    #[test]
    fn blank_customer_details_are_rejected() {
        let mut request = input(vec![item("a", 1)]);
        request.table_number = "  ".to_string();
        assert_eq!(
            validate_request(&request).unwrap_err(),
            CreateOrderError::Invalid("Table number is required")
        );
    }
}
