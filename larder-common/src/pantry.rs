//! Pantry operations over the inventory and standard-item files
//!
//! Every mutation is a locked read-modify-write through
//! [`RecordFile::update`], so concurrent requests cannot lose each other's
//! changes.

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use tracing::info;

use crate::model::{
    normalize_quantity, validate_consume_quantity, validate_name, Ingredient, NewIngredient,
};
use crate::shopping::{derive_shopping_list, ShoppingItem};
use crate::store::{RecordFile, RecordLayout};
use crate::Result;

/// Inventory file name inside the root folder
pub const INVENTORY_FILE: &str = "ingredients.txt";

/// Standard (recurring) items file name inside the root folder
pub const STANDARD_FILE: &str = "singredients.txt";

/// Result of adding an inventory record
#[derive(Debug, Clone, PartialEq)]
pub enum AddOutcome {
    Added(Ingredient),
    /// A record with the same name (ignoring case) already exists
    Duplicate(Ingredient),
}

/// Result of taking an amount out of stock
#[derive(Debug, Clone, PartialEq)]
pub enum ConsumeOutcome {
    /// Everything was taken; carries the record as it was before removal
    Removed(Ingredient),
    /// Part was taken; carries the record with its remaining quantity
    Decremented { taken: f64, remaining: Ingredient },
    NotFound,
}

/// Result of adding a standard item
#[derive(Debug, Clone, PartialEq)]
pub enum StandardOutcome {
    Added(Ingredient),
    AlreadyPresent,
}

/// The two record files of a household
#[derive(Debug, Clone)]
pub struct Pantry {
    inventory: RecordFile,
    standard: RecordFile,
}

impl Pantry {
    /// Pantry stored in `root_folder` using the default file names
    pub fn open(root_folder: &Path) -> Self {
        Self::with_files(
            root_folder.join(INVENTORY_FILE),
            root_folder.join(STANDARD_FILE),
        )
    }

    pub fn with_files(inventory: impl Into<PathBuf>, standard: impl Into<PathBuf>) -> Self {
        Self {
            inventory: RecordFile::new(inventory, RecordLayout::Inventory),
            standard: RecordFile::new(standard, RecordLayout::Standard),
        }
    }

    pub fn inventory_path(&self) -> &Path {
        self.inventory.path()
    }

    pub fn standard_path(&self) -> &Path {
        self.standard.path()
    }

    pub fn inventory(&self) -> Result<Vec<Ingredient>> {
        self.inventory.load()
    }

    pub fn standard_items(&self) -> Result<Vec<Ingredient>> {
        self.standard.load()
    }

    /// Append a record dated `today` unless the name is already stocked
    pub fn add_ingredient(&self, item: NewIngredient, today: NaiveDate) -> Result<AddOutcome> {
        let record = item.into_ingredient(today)?;
        let outcome = self.inventory.update(|records| {
            if let Some(existing) = records.iter().find(|r| r.matches_name(&record.name)) {
                return AddOutcome::Duplicate(existing.clone());
            }
            records.push(record.clone());
            AddOutcome::Added(record)
        })?;

        if let AddOutcome::Added(record) = &outcome {
            info!(name = %record.name, amount = %record.amount(), expires_in = record.expires_in, "Ingredient added");
        }
        Ok(outcome)
    }

    /// Take `quantity` of `name`; taking at least the stored amount removes
    /// the record
    pub fn consume(&self, name: &str, quantity: f64) -> Result<ConsumeOutcome> {
        let name = name.trim();
        let quantity = validate_consume_quantity(quantity)?;

        self.inventory.update(|records| {
            let Some(index) = records.iter().position(|r| r.matches_name(name)) else {
                return ConsumeOutcome::NotFound;
            };
            if quantity >= records[index].quantity {
                ConsumeOutcome::Removed(records.remove(index))
            } else {
                let record = &mut records[index];
                record.quantity = normalize_quantity(record.quantity - quantity);
                ConsumeOutcome::Decremented {
                    taken: quantity,
                    remaining: record.clone(),
                }
            }
        })
    }

    /// Add a name to the standard list (quantity 0, no unit, expires in 0)
    pub fn add_standard(&self, name: &str, today: NaiveDate) -> Result<StandardOutcome> {
        let name = validate_name(name)?;
        self.standard.update(|records| {
            if records.iter().any(|r| r.matches_name(&name)) {
                return StandardOutcome::AlreadyPresent;
            }
            let record = Ingredient::new(name, 0.0, "", today, 0);
            records.push(record.clone());
            StandardOutcome::Added(record)
        })
    }

    /// Remove every standard item matching `name`; false when none matched
    pub fn remove_standard(&self, name: &str) -> Result<bool> {
        let name = name.trim();
        self.standard.update(|records| {
            let before = records.len();
            records.retain(|r| !r.matches_name(name));
            records.len() < before
        })
    }

    /// Derive the shopping list from the current files
    pub fn shopping_list(&self, today: NaiveDate) -> Result<Vec<ShoppingItem>> {
        let inventory = self.inventory()?;
        let standard = self.standard_items()?;
        Ok(derive_shopping_list(&inventory, &standard, today))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;
    use std::fs;
    use tempfile::tempdir;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn milk() -> NewIngredient {
        NewIngredient::new("Milk", 2.0, "l", 5).unwrap()
    }

    #[test]
    fn test_add_ingredient_stamps_date() {
        let dir = tempdir().unwrap();
        let pantry = Pantry::open(dir.path());

        let outcome = pantry.add_ingredient(milk(), date(2024, 1, 1)).unwrap();
        assert_eq!(
            outcome,
            AddOutcome::Added(Ingredient::new("Milk", 2.0, "l", date(2024, 1, 1), 5))
        );
        assert_eq!(
            fs::read_to_string(pantry.inventory_path()).unwrap(),
            "Milk|2|l|2024-01-01|5\n"
        );
    }

    #[test]
    fn test_add_ingredient_rejects_duplicate_ignoring_case() {
        let dir = tempdir().unwrap();
        let pantry = Pantry::open(dir.path());
        pantry.add_ingredient(milk(), date(2024, 1, 1)).unwrap();

        let again = NewIngredient::new("MILK", 1.0, "l", 3).unwrap();
        let outcome = pantry.add_ingredient(again, date(2024, 1, 2)).unwrap();
        assert!(matches!(outcome, AddOutcome::Duplicate(ref existing) if existing.name == "Milk"));
        assert_eq!(pantry.inventory().unwrap().len(), 1);
    }

    #[test]
    fn test_add_ingredient_with_unreadable_expiry_leaves_file_alone() {
        let dir = tempdir().unwrap();
        let pantry = Pantry::open(dir.path());
        pantry
            .add_ingredient(NewIngredient::new("Salt", 1.0, "kg", 30).unwrap(), date(2024, 1, 1))
            .unwrap();

        let overflowing = NewIngredient {
            name: "Pepper".to_string(),
            quantity: 1.0,
            unit: "kg".to_string(),
            expires_in: 99_999_999_999,
        };
        assert!(matches!(
            pantry.add_ingredient(overflowing, date(2024, 1, 1)),
            Err(Error::InvalidInput(_))
        ));
        assert_eq!(
            fs::read_to_string(pantry.inventory_path()).unwrap(),
            "Salt|1|kg|2024-01-01|30\n"
        );

        let again = NewIngredient::new("salt", 2.0, "kg", 5).unwrap();
        assert!(matches!(
            pantry.add_ingredient(again, date(2024, 1, 2)).unwrap(),
            AddOutcome::Duplicate(_)
        ));
        assert_eq!(pantry.inventory().unwrap().len(), 1);
    }

    #[test]
    fn test_consume_less_than_stored_decrements() {
        let dir = tempdir().unwrap();
        let pantry = Pantry::open(dir.path());
        pantry.add_ingredient(milk(), date(2024, 1, 1)).unwrap();

        let outcome = pantry.consume("milk", 0.7).unwrap();
        match outcome {
            ConsumeOutcome::Decremented { taken, remaining } => {
                assert_eq!(taken, 0.7);
                assert_eq!(remaining.quantity, 1.3);
            }
            other => panic!("unexpected outcome {:?}", other),
        }
        let stored = pantry.inventory().unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].quantity, 1.3);
    }

    #[test]
    fn test_consume_at_least_stored_removes() {
        let dir = tempdir().unwrap();
        let pantry = Pantry::open(dir.path());
        pantry.add_ingredient(milk(), date(2024, 1, 1)).unwrap();

        let outcome = pantry.consume("Milk", 2.0).unwrap();
        assert!(matches!(outcome, ConsumeOutcome::Removed(ref r) if r.quantity == 2.0));
        assert!(pantry.inventory().unwrap().is_empty());
    }

    #[test]
    fn test_consume_unknown_name() {
        let dir = tempdir().unwrap();
        let pantry = Pantry::open(dir.path());
        pantry.add_ingredient(milk(), date(2024, 1, 1)).unwrap();

        assert_eq!(pantry.consume("Bread", 1.0).unwrap(), ConsumeOutcome::NotFound);
        assert_eq!(pantry.inventory().unwrap().len(), 1);
    }

    #[test]
    fn test_consume_rejects_non_positive_quantity() {
        let dir = tempdir().unwrap();
        let pantry = Pantry::open(dir.path());
        pantry.add_ingredient(milk(), date(2024, 1, 1)).unwrap();

        assert!(pantry.consume("Milk", 0.0).is_err());
        assert!(pantry.consume("Milk", -1.0).is_err());
        assert_eq!(pantry.inventory().unwrap()[0].quantity, 2.0);
    }

    #[test]
    fn test_standard_items_add_and_remove() {
        let dir = tempdir().unwrap();
        let pantry = Pantry::open(dir.path());
        let today = date(2024, 1, 1);

        assert!(matches!(
            pantry.add_standard("Eggs", today).unwrap(),
            StandardOutcome::Added(_)
        ));
        assert_eq!(
            pantry.add_standard("eggs", today).unwrap(),
            StandardOutcome::AlreadyPresent
        );
        assert_eq!(
            fs::read_to_string(pantry.standard_path()).unwrap(),
            "Eggs|0||2024-01-01|0\n"
        );

        assert!(pantry.remove_standard("EGGS").unwrap());
        assert!(!pantry.remove_standard("Eggs").unwrap());
        assert!(pantry.standard_items().unwrap().is_empty());
    }

    #[test]
    fn test_add_standard_rejects_blank_name() {
        let dir = tempdir().unwrap();
        let pantry = Pantry::open(dir.path());
        assert!(pantry.add_standard("   ", date(2024, 1, 1)).is_err());
    }

    #[test]
    fn test_shopping_list_reads_both_files() {
        let dir = tempdir().unwrap();
        let pantry = Pantry::open(dir.path());
        let today = date(2024, 1, 4);
        fs::write(pantry.inventory_path(), "Milk|0.5|l|2024-01-01|5\n").unwrap();
        fs::write(pantry.standard_path(), "Eggs\nmilk\n").unwrap();

        let list = pantry.shopping_list(today).unwrap();
        let names: Vec<&str> = list.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, vec!["Milk", "Eggs"]);
    }
}
