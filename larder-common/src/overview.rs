//! Home-page summary of the inventory

use chrono::NaiveDate;

use crate::model::Ingredient;

/// Items with at most this many days left (and not yet expired) are flagged
pub const NEARLY_EXPIRED_DAYS: i64 = 3;

/// An item past or near its expiry date
#[derive(Debug, Clone, PartialEq)]
pub struct ExpiryNotice {
    pub name: String,
    pub days_remaining: i64,
}

impl ExpiryNotice {
    /// `"Milk (expired 2 days ago)"` or `"Milk (expires in 1 days)"`
    pub fn describe(&self) -> String {
        if self.days_remaining < 0 {
            format!(
                "{} (expired {} days ago)",
                self.name,
                self.days_remaining.unsigned_abs()
            )
        } else {
            format!("{} (expires in {} days)", self.name, self.days_remaining)
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct InventoryOverview {
    pub expired: Vec<ExpiryNotice>,
    pub nearly_expired: Vec<ExpiryNotice>,
    pub low_quantity: Vec<Ingredient>,
}

impl InventoryOverview {
    pub fn from_inventory(inventory: &[Ingredient], today: NaiveDate) -> Self {
        let mut overview = Self::default();
        for item in inventory {
            let days_remaining = item.days_remaining(today);
            let notice = ExpiryNotice {
                name: item.name.clone(),
                days_remaining,
            };
            if days_remaining < 0 {
                overview.expired.push(notice);
            } else if days_remaining <= NEARLY_EXPIRED_DAYS {
                overview.nearly_expired.push(notice);
            }
        }
        overview.low_quantity = low_quantity(inventory);
        overview
    }
}

/// Measured-unit items running low
pub fn low_quantity(inventory: &[Ingredient]) -> Vec<Ingredient> {
    inventory
        .iter()
        .filter(|item| item.is_low_quantity())
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_overview_buckets() {
        let added = date(2024, 1, 1);
        let inventory = vec![
            Ingredient::new("Fish", 1.0, "pcs", added, 1),
            Ingredient::new("Milk", 0.5, "l", added, 8),
            Ingredient::new("Cheese", 1.0, "pcs", added, 4),
            Ingredient::new("Rice", 5.0, "kg", added, 365),
        ];

        let overview = InventoryOverview::from_inventory(&inventory, date(2024, 1, 4));
        assert_eq!(
            overview.expired,
            vec![ExpiryNotice {
                name: "Fish".to_string(),
                days_remaining: -2
            }]
        );
        assert_eq!(
            overview.nearly_expired,
            vec![ExpiryNotice {
                name: "Cheese".to_string(),
                days_remaining: 1
            }]
        );
        assert_eq!(overview.low_quantity.len(), 1);
        assert_eq!(overview.low_quantity[0].name, "Milk");
    }

    #[test]
    fn test_expiry_notice_text() {
        let expired = ExpiryNotice {
            name: "Fish".to_string(),
            days_remaining: -2,
        };
        assert_eq!(expired.describe(), "Fish (expired 2 days ago)");

        let soon = ExpiryNotice {
            name: "Cheese".to_string(),
            days_remaining: 0,
        };
        assert_eq!(soon.describe(), "Cheese (expires in 0 days)");
    }

    #[test]
    fn test_empty_inventory() {
        let overview = InventoryOverview::from_inventory(&[], date(2024, 1, 4));
        assert_eq!(overview, InventoryOverview::default());
    }
}
