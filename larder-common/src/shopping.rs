//! Shopping list derivation
//!
//! Two rules over the loaded files:
//! 1. **Restock**: an inventory item with a measured unit and less than
//!    [`LOW_QUANTITY_THRESHOLD`](crate::model::LOW_QUANTITY_THRESHOLD), or with at most [`RESTOCK_DAYS`] days left.
//!    High priority when expiry triggered it, medium otherwise.
//! 2. **Standard**: a standard item whose name is not in the inventory
//!    (ignoring case). Always medium priority.
//!
//! Output is stably sorted by priority rank, then by name.

use std::fmt;

use chrono::NaiveDate;
use serde::Serialize;

use crate::model::{format_quantity, Ingredient};

/// Items expiring within this many days are restocked with high priority
pub const RESTOCK_DAYS: i64 = 2;

/// Reason text of a standard entry
pub const STANDARD_REASON: &str = "Standard item not in inventory";

/// Shopping priority; ordering is the display rank (high first)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    Medium,
    Low,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::High => "high",
            Priority::Medium => "medium",
            Priority::Low => "low",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which rule produced an entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ShoppingKind {
    Restock,
    Standard,
}

impl ShoppingKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ShoppingKind::Restock => "restock",
            ShoppingKind::Standard => "standard",
        }
    }
}

impl fmt::Display for ShoppingKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One entry of the shopping list
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ShoppingItem {
    pub name: String,
    pub details: String,
    pub reason: String,
    pub priority: Priority,
    pub kind: ShoppingKind,
}

fn restock_entry(item: &Ingredient, today: NaiveDate) -> Option<ShoppingItem> {
    let days_remaining = item.days_remaining(today);
    let low = item.is_low_quantity();
    let expiring = days_remaining <= RESTOCK_DAYS;
    if !low && !expiring {
        return None;
    }

    let mut reasons = Vec::with_capacity(2);
    if low {
        reasons.push(format!(
            "Low quantity ({} {})",
            format_quantity(item.quantity),
            item.unit
        ));
    }
    if expiring {
        reasons.push(format!("Expires in {} days", days_remaining));
    }

    Some(ShoppingItem {
        name: item.name.clone(),
        details: item.amount(),
        reason: reasons.join(", "),
        priority: if expiring {
            Priority::High
        } else {
            Priority::Medium
        },
        kind: ShoppingKind::Restock,
    })
}

/// Build the prioritised shopping list
pub fn derive_shopping_list(
    inventory: &[Ingredient],
    standard: &[Ingredient],
    today: NaiveDate,
) -> Vec<ShoppingItem> {
    let mut list: Vec<ShoppingItem> = inventory
        .iter()
        .filter_map(|item| restock_entry(item, today))
        .collect();

    for item in standard {
        let stocked = inventory.iter().any(|i| i.matches_name(&item.name));
        if !stocked {
            list.push(ShoppingItem {
                name: item.name.clone(),
                details: item.unit.clone(),
                reason: STANDARD_REASON.to_string(),
                priority: Priority::Medium,
                kind: ShoppingKind::Standard,
            });
        }
    }

    list.sort_by(|a, b| a.priority.cmp(&b.priority).then_with(|| a.name.cmp(&b.name)));
    list
}

/// The first `limit` entries plus the number left out
pub fn preview(list: &[ShoppingItem], limit: usize) -> (&[ShoppingItem], usize) {
    let shown = list.len().min(limit);
    (&list[..shown], list.len() - shown)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn item(name: &str, quantity: f64, unit: &str, added: NaiveDate, expires_in: i64) -> Ingredient {
        Ingredient::new(name, quantity, unit, added, expires_in)
    }

    #[test]
    fn test_low_and_expiring_milk_is_high_priority() {
        let today = date(2024, 1, 4);
        let inventory = vec![item("Milk", 0.5, "l", date(2024, 1, 1), 5)];

        let list = derive_shopping_list(&inventory, &[], today);
        assert_eq!(list.len(), 1);
        let milk = &list[0];
        assert_eq!(milk.kind, ShoppingKind::Restock);
        assert_eq!(milk.priority, Priority::High);
        assert_eq!(milk.details, "0.5 l");
        assert_eq!(milk.reason, "Low quantity (0.5 l), Expires in 2 days");
    }

    #[test]
    fn test_low_quantity_only_is_medium() {
        let today = date(2024, 1, 4);
        for unit in ["kg", "kgs", "l", "liter", "liters", "KG"] {
            let inventory = vec![item("Flour", 0.4, unit, date(2024, 1, 1), 100)];
            let list = derive_shopping_list(&inventory, &[], today);
            assert_eq!(list.len(), 1, "unit {}", unit);
            assert_eq!(list[0].priority, Priority::Medium);
            assert_eq!(list[0].reason, format!("Low quantity (0.4 {})", unit));
        }
    }

    #[test]
    fn test_expiring_only_is_high() {
        let today = date(2024, 1, 10);
        let inventory = vec![item("Yogurt", 6.0, "pcs", date(2024, 1, 1), 5)];
        let list = derive_shopping_list(&inventory, &[], today);
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].priority, Priority::High);
        assert_eq!(list[0].reason, "Expires in -4 days");
    }

    #[test]
    fn test_well_stocked_item_not_listed() {
        let today = date(2024, 1, 4);
        let inventory = vec![
            item("Rice", 2.0, "kg", date(2024, 1, 1), 300),
            item("Butter", 0.2, "pack", date(2024, 1, 1), 30),
        ];
        assert!(derive_shopping_list(&inventory, &[], today).is_empty());
    }

    #[test]
    fn test_missing_standard_item() {
        let today = date(2024, 1, 4);
        let standard = vec![item("Eggs", 0.0, "", today, 0)];
        let list = derive_shopping_list(&[], &standard, today);
        assert_eq!(
            list,
            vec![ShoppingItem {
                name: "Eggs".to_string(),
                details: String::new(),
                reason: STANDARD_REASON.to_string(),
                priority: Priority::Medium,
                kind: ShoppingKind::Standard,
            }]
        );
    }

    #[test]
    fn test_stocked_standard_item_ignores_case() {
        let today = date(2024, 1, 4);
        let inventory = vec![item("eggs", 12.0, "pcs", today, 14)];
        let standard = vec![item("Eggs", 0.0, "", today, 0)];
        assert!(derive_shopping_list(&inventory, &standard, today).is_empty());
    }

    #[test]
    fn test_sorted_by_priority_then_name() {
        let today = date(2024, 1, 4);
        let inventory = vec![
            item("Zucchini", 3.0, "pcs", date(2024, 1, 1), 3),
            item("Sugar", 0.5, "kg", date(2024, 1, 1), 365),
            item("Apples", 4.0, "pcs", date(2024, 1, 1), 1),
        ];
        let standard = vec![
            item("Coffee", 0.0, "", today, 0),
            item("Bread", 0.0, "", today, 0),
        ];

        let list = derive_shopping_list(&inventory, &standard, today);
        let order: Vec<(&str, Priority)> =
            list.iter().map(|i| (i.name.as_str(), i.priority)).collect();
        assert_eq!(
            order,
            vec![
                ("Apples", Priority::High),
                ("Zucchini", Priority::High),
                ("Bread", Priority::Medium),
                ("Coffee", Priority::Medium),
                ("Sugar", Priority::Medium),
            ]
        );
    }

    #[test]
    fn test_priority_rank_order() {
        assert!(Priority::High < Priority::Medium);
        assert!(Priority::Medium < Priority::Low);
        assert_eq!(Priority::Medium.to_string(), "medium");
    }

    #[test]
    fn test_preview_counts_remainder() {
        let today = date(2024, 1, 4);
        let standard: Vec<Ingredient> = ["A", "B", "C", "D", "E"]
            .iter()
            .map(|n| item(n, 0.0, "", today, 0))
            .collect();
        let list = derive_shopping_list(&[], &standard, today);

        let (shown, more) = preview(&list, 3);
        assert_eq!(shown.len(), 3);
        assert_eq!(more, 2);

        let (shown, more) = preview(&list[..2], 3);
        assert_eq!(shown.len(), 2);
        assert_eq!(more, 0);
    }
}
