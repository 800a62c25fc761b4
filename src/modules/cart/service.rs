use bigdecimal::BigDecimal;
use serde::Serialize;
use std::collections::HashMap;

use super::repository::{Cart, CartItem};
use crate::{modules::dish::repository::Dish, utils::money};

#[derive(Serialize, Debug)]
pub struct PricedLine {
    pub dish_id: String,
    pub name: String,
    pub price: BigDecimal,
    pub quantity: i32,
    pub line_total: BigDecimal,
}

#[derive(Serialize, Debug)]
pub struct PricedCart {
    #[serde(flatten)]
    pub cart: Cart,
    pub lines: Vec<PricedLine>,
    /// Items whose dish is no longer offered at the cart's restaurant.
    pub unavailable: Vec<String>,
    pub total: BigDecimal,
}

/// Replaces the quantity for `dish_id`; zero removes the line.
pub fn set_item(mut items: Vec<CartItem>, dish_id: &str, quantity: i32) -> Vec<CartItem> {
    match items.iter().position(|item| item.dish_id == dish_id) {
        Some(at) if quantity == 0 => {
            items.remove(at);
        }
        Some(at) => items[at].quantity = quantity,
        None if quantity == 0 => (),
        None => items.push(CartItem {
            dish_id: dish_id.to_string(),
            quantity,
        }),
    }

    items
}

pub fn price_cart(cart: Cart, dishes: Vec<Dish>) -> PricedCart {
    let dishes: HashMap<&str, &Dish> = dishes.iter().map(|dish| (dish.id.as_str(), dish)).collect();

    let mut lines = vec![];
    let mut unavailable = vec![];

    for item in cart.items.0.iter() {
        match dishes.get(item.dish_id.as_str()) {
            Some(dish) => lines.push(PricedLine {
                dish_id: dish.id.clone(),
                name: dish.name.clone(),
                price: dish.price.clone(),
                quantity: item.quantity,
                line_total: money::line_total(&dish.price, item.quantity),
            }),
            None => unavailable.push(item.dish_id.clone()),
        }
    }

    let total = lines
        .iter()
        .fold(BigDecimal::from(0), |acc, line| acc + &line.line_total);

    PricedCart {
        cart,
        lines,
        unavailable,
        total,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::cart::repository::CartStatus;
    use chrono::Utc;
    use sqlx::types::Json;

    fn item(dish_id: &str, quantity: i32) -> CartItem {
        CartItem {
            dish_id: dish_id.to_string(),
            quantity,
        }
    }

    #[test]
    fn setting_quantity_adds_updates_and_removes() {
        let items = set_item(vec![], "a", 2);
        assert_eq!(items, vec![item("a", 2)]);

        let items = set_item(items, "a", 5);
        assert_eq!(items, vec![item("a", 5)]);

        let items = set_item(items, "b", 1);
        let items = set_item(items, "a", 0);
        assert_eq!(items, vec![item("b", 1)]);

        assert!(set_item(vec![], "c", 0).is_empty());
    }

    #[test]
    fn cart_is_priced_from_dish_rows() {
        let now = Utc::now().naive_utc();
        let cart = Cart {
            id: "cart".to_string(),
            restaurant_id: "r1".to_string(),
            customer_name: "Ravi".to_string(),
            table_number: "4".to_string(),
            items: Json(vec![item("paneer", 2), item("gone", 1)]),
            status: CartStatus::Active,
            order_id: None,
            created_at: now,
            updated_at: None,
        };
        let paneer = Dish {
            id: "paneer".to_string(),
            name: "Paneer Tikka".to_string(),
            description: String::new(),
            price: BigDecimal::from(180),
            spice_level: String::new(),
            image_url: String::new(),
            created_at: now,
            updated_at: None,
        };

        let priced = price_cart(cart, vec![paneer]);

        assert_eq!(priced.lines.len(), 1);
        assert_eq!(priced.total, BigDecimal::from(360));
        assert_eq!(priced.unavailable, vec!["gone".to_string()]);
    }
}
