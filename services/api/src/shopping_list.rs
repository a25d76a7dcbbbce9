//! Shopping list aggregation and text export
//!
//! Cart lines are grouped by ingredient id and their amounts summed. Two
//! ingredients that share a display name but have different ids stay
//! separate. The result is ordered by ingredient id ascending.

use serde::Serialize;
use sqlx::FromRow;
use std::collections::BTreeMap;

/// One ingredient line of one recipe in a user's cart
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct CartLine {
    pub ingredient_id: i64,
    pub name: String,
    pub measurement_unit: String,
    pub amount: i64,
}

/// Total amount of one ingredient across the cart
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ShoppingItem {
    pub ingredient_id: i64,
    pub name: String,
    pub total_amount: i64,
    pub measurement_unit: String,
}

/// Sum cart lines per ingredient
pub fn aggregate<I>(lines: I) -> Vec<ShoppingItem>
where
    I: IntoIterator<Item = CartLine>,
{
    let mut totals: BTreeMap<i64, ShoppingItem> = BTreeMap::new();

    for line in lines {
        totals
            .entry(line.ingredient_id)
            .and_modify(|item| item.total_amount += line.amount)
            .or_insert_with(|| ShoppingItem {
                ingredient_id: line.ingredient_id,
                name: line.name.clone(),
                total_amount: line.amount,
                measurement_unit: line.measurement_unit.clone(),
            });
    }

    totals.into_values().collect()
}

/// Render the downloadable plain-text list
pub fn render(header: &str, items: &[ShoppingItem]) -> String {
    let mut lines = Vec::with_capacity(items.len() + 1);
    lines.push(header.to_string());
    lines.extend(items.iter().map(|item| {
        format!(
            "{} - {} {}.",
            item.name, item.total_amount, item.measurement_unit
        )
    }));
    lines.join("\n")
}

/// `Content-Disposition` value offering the list as a file download
pub fn content_disposition(filename: &str) -> String {
    format!("attachment; filename=\"{}\"", filename.replace('"', ""))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn line(id: i64, name: &str, unit: &str, amount: i64) -> CartLine {
        CartLine {
            ingredient_id: id,
            name: name.to_string(),
            measurement_unit: unit.to_string(),
            amount,
        }
    }

    fn bread_and_cake() -> Vec<CartLine> {
        vec![
            // Recipe A
            line(1, "flour", "g", 200),
            line(2, "salt", "g", 5),
            // Recipe B
            line(1, "flour", "g", 100),
            line(3, "sugar", "g", 50),
        ]
    }

    fn as_set(items: &[ShoppingItem]) -> HashSet<(String, i64, String)> {
        items
            .iter()
            .map(|item| {
                (
                    item.name.clone(),
                    item.total_amount,
                    item.measurement_unit.clone(),
                )
            })
            .collect()
    }

    #[test]
    fn test_amounts_are_summed_per_ingredient() {
        let items = aggregate(bread_and_cake());

        let expected: HashSet<_> = [
            ("flour".to_string(), 300, "g".to_string()),
            ("salt".to_string(), 5, "g".to_string()),
            ("sugar".to_string(), 50, "g".to_string()),
        ]
        .into_iter()
        .collect();
        assert_eq!(as_set(&items), expected);
    }

    #[test]
    fn test_recipe_order_does_not_change_result() {
        let forward = aggregate(bread_and_cake());

        let mut reversed_lines = bread_and_cake();
        reversed_lines.reverse();
        let reversed = aggregate(reversed_lines);

        let mut rotated_lines = bread_and_cake();
        rotated_lines.rotate_left(2);
        let rotated = aggregate(rotated_lines);

        assert_eq!(as_set(&forward), as_set(&reversed));
        assert_eq!(as_set(&forward), as_set(&rotated));
    }

    #[test]
    fn test_same_name_different_ids_stay_separate() {
        let items = aggregate(vec![line(7, "salt", "g", 5), line(9, "salt", "g", 3)]);

        assert_eq!(items.len(), 2);
        assert!(items.iter().all(|item| item.name == "salt"));
    }

    #[test]
    fn test_output_is_ordered_by_ingredient_id() {
        let items = aggregate(vec![
            line(30, "sugar", "g", 1),
            line(10, "flour", "g", 1),
            line(20, "salt", "g", 1),
        ]);

        let ids: Vec<i64> = items.iter().map(|item| item.ingredient_id).collect();
        assert_eq!(ids, vec![10, 20, 30]);
    }

    #[test]
    fn test_empty_cart_renders_header_only() {
        let items = aggregate(Vec::new());

        assert!(items.is_empty());
        assert_eq!(render("Shopping list:", &items), "Shopping list:");
    }

    #[test]
    fn test_render_matches_download_format() {
        let items = aggregate(bread_and_cake());

        assert_eq!(
            render("Shopping list:", &items),
            "Shopping list:\nflour - 300 g.\nsalt - 5 g.\nsugar - 50 g."
        );
    }

    #[test]
    fn test_content_disposition() {
        assert_eq!(
            content_disposition("shopping_cart.txt"),
            "attachment; filename=\"shopping_cart.txt\""
        );
    }
}
