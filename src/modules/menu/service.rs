use bigdecimal::BigDecimal;
use serde::Serialize;
use std::collections::BTreeMap;

use crate::modules::dish::repository::DishWithCategories;

pub const DEFAULT_SECTION: &str = "Other";

#[derive(Serialize, Clone, Debug)]
pub struct MenuDish {
    pub id: String,
    pub name: String,
    pub description: String,
    pub price: BigDecimal,
    pub spice_level: String,
    pub image_url: String,
}

#[derive(Serialize, Clone, Debug)]
pub struct MenuSection {
    pub name: String,
    pub category_id: Option<String>,
    pub dishes: Vec<MenuDish>,
}

impl From<&DishWithCategories> for MenuDish {
    fn from(dish: &DishWithCategories) -> Self {
        Self {
            id: dish.id.clone(),
            name: dish.name.clone(),
            description: dish.description.clone(),
            price: dish.price.clone(),
            spice_level: dish.spice_level.clone(),
            image_url: dish.image_url.clone(),
        }
    }
}

fn is_default_section(name: &str) -> bool {
    name.trim().eq_ignore_ascii_case(DEFAULT_SECTION)
}

/// Sections sorted by name with uncategorised dishes in a trailing "Other" section.
/// A category that is itself named "Other" is folded into that section.
/// A dish in several categories shows up in each of them.
pub fn group_by_category(dishes: Vec<DishWithCategories>) -> Vec<MenuSection> {
    // (is_default, name, category_id)
    let mut sections: BTreeMap<(bool, String, String), MenuSection> = BTreeMap::new();
    let default_key = || (true, DEFAULT_SECTION.to_string(), String::new());

    for dish in &dishes {
        if dish.categories.0.is_empty() {
            sections
                .entry(default_key())
                .or_insert_with(|| MenuSection {
                    name: DEFAULT_SECTION.to_string(),
                    category_id: None,
                    dishes: vec![],
                })
                .dishes
                .push(MenuDish::from(dish));
            continue;
        }

        for category in dish.categories.0.iter() {
            let key = match is_default_section(&category.name) {
                true => default_key(),
                false => (false, category.name.clone(), category.id.clone()),
            };

            let section = sections.entry(key).or_insert_with(|| MenuSection {
                name: DEFAULT_SECTION.to_string(),
                category_id: None,
                dishes: vec![],
            });

            if !is_default_section(&category.name) {
                section.name = category.name.clone();
            }
            section.category_id.get_or_insert_with(|| category.id.clone());
            section.dishes.push(MenuDish::from(dish));
        }
    }

    sections
        .into_values()
        .map(|mut section| {
            section
                .dishes
                .sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));
            section.dishes.dedup_by(|a, b| a.id == b.id);
            section
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::dish::repository::DishCategory;
    use chrono::Utc;
    use sqlx::types::Json;

    fn dish(id: &str, name: &str, price: i32, categories: &[(&str, &str)]) -> DishWithCategories {
        DishWithCategories {
            id: id.to_string(),
            name: name.to_string(),
            description: String::new(),
            price: BigDecimal::from(price),
            spice_level: String::new(),
            image_url: String::new(),
            categories: Json(
                categories
                    .iter()
                    .map(|(id, name)| DishCategory {
                        id: id.to_string(),
                        name: name.to_string(),
                    })
                    .collect(),
            ),
            created_at: Utc::now().naive_utc(),
            updated_at: None,
        }
    }

    #[test]
    fn single_category_single_dish() {
        let sections = group_by_category(vec![dish("d1", "Paneer Tikka", 180, &[("c1", "Starters")])]);

        assert_eq!(sections.len(), 1);
        assert_eq!(sections[0].name, "Starters");
        assert_eq!(sections[0].dishes.len(), 1);
        assert_eq!(sections[0].dishes[0].price, BigDecimal::from(180));
    }

    #[test]
    fn sections_are_alphabetical_with_other_last() {
        let sections = group_by_category(vec![
            dish("d1", "Lassi", 60, &[]),
            dish("d2", "Gulab Jamun", 90, &[("c2", "Desserts")]),
            dish("d3", "Samosa", 40, &[("c1", "Starters")]),
            dish("d4", "Aloo Tikki", 50, &[("c1", "Starters")]),
        ]);

        let names: Vec<&str> = sections.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["Desserts", "Starters", "Other"]);

        let starters: Vec<&str> = sections[1].dishes.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(starters, vec!["Aloo Tikki", "Samosa"]);
    }

    #[test]
    fn dish_in_two_categories_appears_in_both() {
        let sections = group_by_category(vec![dish(
            "d1",
            "Masala Dosa",
            120,
            &[("c1", "Breakfast"), ("c2", "South Indian")],
        )]);

        assert_eq!(sections.len(), 2);
        assert!(sections.iter().all(|s| s.dishes[0].id == "d1"));
    }

    #[test]
    fn no_dishes_means_no_sections() {
        assert!(group_by_category(vec![]).is_empty());
    }

    #[test]
    fn category_named_other_joins_the_default_section() {
        let sections = group_by_category(vec![
            dish("d1", "Lassi", 60, &[]),
            dish("d2", "Chaas", 40, &[("c9", "Other")]),
            dish("d3", "Samosa", 40, &[("c1", "Starters")]),
        ]);

        let names: Vec<&str> = sections.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["Starters", "Other"]);

        let other: Vec<&str> = sections[1].dishes.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(other, vec!["Chaas", "Lassi"]);
        assert_eq!(sections[1].category_id.as_deref(), Some("c9"));
    }
}
