//! Ingredient model
//!
//! An [`Ingredient`] carries the five stored fields of a record; the expiry
//! date and days remaining are derived on demand against a reference date so
//! callers (and tests) control what "today" means.

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Units whose quantity is checked against [`LOW_QUANTITY_THRESHOLD`]
pub const MEASURED_UNITS: &[&str] = &["kg", "kgs", "l", "liter", "liters"];

/// Measured-unit quantities below this are considered low stock
pub const LOW_QUANTITY_THRESHOLD: f64 = 1.0;

/// Largest accepted shelf life in either direction
pub const MAX_EXPIRES_IN_DAYS: i64 = 1_000_000;

/// Field separator of the record files (never escaped)
pub const FIELD_SEPARATOR: char = '|';

/// One inventory (or standard-list) record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ingredient {
    pub name: String,
    pub quantity: f64,
    pub unit: String,
    pub added_date: NaiveDate,
    /// Shelf life in days counted from `added_date`
    pub expires_in: i64,
}

impl Ingredient {
    pub fn new(
        name: impl Into<String>,
        quantity: f64,
        unit: impl Into<String>,
        added_date: NaiveDate,
        expires_in: i64,
    ) -> Self {
        Self {
            name: name.into(),
            quantity,
            unit: unit.into(),
            added_date,
            expires_in,
        }
    }

    /// Checked `added_date + expires_in`, `None` when outside the calendar range
    pub fn checked_expiry_date(&self) -> Option<NaiveDate> {
        let days = Days::new(self.expires_in.unsigned_abs());
        if self.expires_in >= 0 {
            self.added_date.checked_add_days(days)
        } else {
            self.added_date.checked_sub_days(days)
        }
    }

    /// `added_date + expires_in`, saturating at the calendar bounds
    pub fn expiry_date(&self) -> NaiveDate {
        self.checked_expiry_date().unwrap_or(if self.expires_in >= 0 {
            NaiveDate::MAX
        } else {
            NaiveDate::MIN
        })
    }

    /// Days from `today` until expiry; negative once expired
    pub fn days_remaining(&self, today: NaiveDate) -> i64 {
        (self.expiry_date() - today).num_days()
    }

    /// Whether the unit is one of [`MEASURED_UNITS`]
    pub fn has_measured_unit(&self) -> bool {
        is_measured_unit(&self.unit)
    }

    /// Measured unit and quantity under [`LOW_QUANTITY_THRESHOLD`]
    pub fn is_low_quantity(&self) -> bool {
        self.has_measured_unit() && self.quantity < LOW_QUANTITY_THRESHOLD
    }

    /// Case-insensitive name comparison
    pub fn matches_name(&self, name: &str) -> bool {
        names_match(&self.name, name)
    }

    /// `"<quantity> <unit>"` as shown in lists and messages
    pub fn amount(&self) -> String {
        format!("{} {}", format_quantity(self.quantity), self.unit)
    }
}

/// A validated request to add a new inventory record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewIngredient {
    pub name: String,
    pub quantity: f64,
    pub unit: String,
    pub expires_in: i64,
}

impl NewIngredient {
    /// Trim and validate all fields
    pub fn new(name: &str, quantity: f64, unit: &str, expires_in: i64) -> Result<Self> {
        Ok(Self {
            name: validate_name(name)?,
            quantity: validate_stock_quantity(quantity)?,
            unit: validate_unit(unit)?,
            expires_in: validate_expires_in(expires_in)?,
        })
    }

    /// Stamp the record with the date it was added
    ///
    /// Fails when the expiry date falls outside the calendar range, since
    /// such a record could not be read back.
    pub fn into_ingredient(self, added_date: NaiveDate) -> Result<Ingredient> {
        let record = Ingredient::new(
            self.name,
            self.quantity,
            self.unit,
            added_date,
            self.expires_in,
        );
        if record.checked_expiry_date().is_none() {
            return Err(Error::InvalidInput(format!(
                "Expiry of {} days from {} is out of range",
                record.expires_in, added_date
            )));
        }
        Ok(record)
    }
}

/// Case-insensitive unit check against [`MEASURED_UNITS`]
pub fn is_measured_unit(unit: &str) -> bool {
    let unit = unit.trim().to_lowercase();
    MEASURED_UNITS.contains(&unit.as_str())
}

/// Case-insensitive name equality (full Unicode lower-casing)
pub fn names_match(a: &str, b: &str) -> bool {
    a.to_lowercase() == b.to_lowercase()
}

/// Shortest decimal form that parses back to the same value
pub fn format_quantity(quantity: f64) -> String {
    quantity.to_string()
}

/// Round to 6 decimal places, dropping subtraction noise
pub fn normalize_quantity(quantity: f64) -> f64 {
    (quantity * 1_000_000.0).round() / 1_000_000.0
}

fn check_free_text(field: &str, value: &str) -> Result<()> {
    if value.contains(FIELD_SEPARATOR) || value.contains('\n') || value.contains('\r') {
        return Err(Error::InvalidInput(format!(
            "{} must not contain '{}' or line breaks",
            field, FIELD_SEPARATOR
        )));
    }
    Ok(())
}

/// Trimmed, non-empty name that fits the record format
pub fn validate_name(name: &str) -> Result<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(Error::InvalidInput("Name must not be empty".to_string()));
    }
    check_free_text("Name", name)?;
    Ok(name.to_string())
}

/// Trimmed unit (may be empty) that fits the record format
pub fn validate_unit(unit: &str) -> Result<String> {
    let unit = unit.trim();
    check_free_text("Unit", unit)?;
    Ok(unit.to_string())
}

/// Shelf life within [`MAX_EXPIRES_IN_DAYS`]
pub fn validate_expires_in(expires_in: i64) -> Result<i64> {
    if expires_in.unsigned_abs() > MAX_EXPIRES_IN_DAYS.unsigned_abs() {
        return Err(Error::InvalidInput(format!(
            "Expiry days must be within {} days, got {}",
            MAX_EXPIRES_IN_DAYS, expires_in
        )));
    }
    Ok(expires_in)
}

/// Finite, non-negative quantity for stored records
pub fn validate_stock_quantity(quantity: f64) -> Result<f64> {
    if !quantity.is_finite() || quantity < 0.0 {
        return Err(Error::InvalidInput(format!(
            "Quantity must be a non-negative number, got {}",
            quantity
        )));
    }
    Ok(quantity)
}

/// Finite, strictly positive quantity to take out of stock
pub fn validate_consume_quantity(quantity: f64) -> Result<f64> {
    if !quantity.is_finite() || quantity <= 0.0 {
        return Err(Error::InvalidInput(format!(
            "Quantity to take must be greater than zero, got {}",
            quantity
        )));
    }
    Ok(quantity)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_expiry_and_days_remaining() {
        let milk = Ingredient::new("Milk", 0.5, "l", date(2024, 1, 1), 5);
        assert_eq!(milk.expiry_date(), date(2024, 1, 6));
        assert_eq!(milk.days_remaining(date(2024, 1, 4)), 2);
        assert_eq!(milk.days_remaining(date(2024, 1, 6)), 0);
        assert_eq!(milk.days_remaining(date(2024, 1, 9)), -3);
    }

    #[test]
    fn test_expiry_crosses_month_and_leap_day() {
        let cheese = Ingredient::new("Cheese", 1.0, "pcs", date(2024, 2, 27), 3);
        assert_eq!(cheese.expiry_date(), date(2024, 3, 1));
    }

    #[test]
    fn test_negative_expires_in() {
        let old = Ingredient::new("Old", 1.0, "", date(2024, 1, 10), -4);
        assert_eq!(old.expiry_date(), date(2024, 1, 6));
    }

    #[test]
    fn test_expiry_overflow_is_detected() {
        let forever = Ingredient::new("Salt", 1.0, "kg", date(2024, 1, 1), i64::MAX);
        assert_eq!(forever.checked_expiry_date(), None);
        assert_eq!(forever.expiry_date(), NaiveDate::MAX);
    }

    #[test]
    fn test_measured_units_case_insensitive() {
        for unit in ["kg", "KG", "Kgs", "l", "L", "liter", "Liters"] {
            assert!(is_measured_unit(unit), "{} should be measured", unit);
        }
        for unit in ["g", "ml", "pcs", "", "litre"] {
            assert!(!is_measured_unit(unit), "{} should not be measured", unit);
        }
    }

    #[test]
    fn test_low_quantity_requires_measured_unit() {
        let today = date(2024, 1, 1);
        assert!(Ingredient::new("Flour", 0.9, "kg", today, 30).is_low_quantity());
        assert!(!Ingredient::new("Flour", 1.0, "kg", today, 30).is_low_quantity());
        assert!(!Ingredient::new("Eggs", 0.5, "pcs", today, 30).is_low_quantity());
    }

    #[test]
    fn test_names_match_ignores_case() {
        assert!(names_match("Milk", "mILK"));
        assert!(names_match("Äpfel", "äpfel"));
        assert!(!names_match("Milk", "Milk "));
    }

    #[test]
    fn test_normalize_quantity_removes_noise() {
        let remaining = normalize_quantity(1.0 - 0.7);
        assert_eq!(format_quantity(remaining), "0.3");
    }

    #[test]
    fn test_new_ingredient_trims_and_validates() {
        let item = NewIngredient::new("  Butter ", 0.25, " kg ", 14).unwrap();
        assert_eq!(item.name, "Butter");
        assert_eq!(item.unit, "kg");

        assert!(NewIngredient::new("   ", 1.0, "kg", 1).is_err());
        assert!(NewIngredient::new("Bad|Name", 1.0, "kg", 1).is_err());
        assert!(NewIngredient::new("Milk", 1.0, "l\n", 1).is_ok());
        assert!(NewIngredient::new("Milk", 1.0, "l|x", 1).is_err());
        assert!(NewIngredient::new("Milk", -1.0, "l", 1).is_err());
        assert!(NewIngredient::new("Milk", f64::NAN, "l", 1).is_err());
    }

    #[test]
    fn test_new_ingredient_rejects_unbounded_expiry() {
        assert!(NewIngredient::new("Salt", 1.0, "kg", MAX_EXPIRES_IN_DAYS).is_ok());
        assert!(NewIngredient::new("Salt", 1.0, "kg", -MAX_EXPIRES_IN_DAYS).is_ok());
        assert!(matches!(
            NewIngredient::new("Salt", 1.0, "kg", 99_999_999_999),
            Err(Error::InvalidInput(_))
        ));
        assert!(NewIngredient::new("Salt", 1.0, "kg", i64::MIN).is_err());
    }

    #[test]
    fn test_into_ingredient_requires_readable_expiry() {
        let item = NewIngredient {
            name: "Salt".to_string(),
            quantity: 1.0,
            unit: "kg".to_string(),
            expires_in: 1,
        };
        assert!(matches!(
            item.clone().into_ingredient(NaiveDate::MAX),
            Err(Error::InvalidInput(_))
        ));

        let record = item.into_ingredient(date(2024, 1, 1)).unwrap();
        assert_eq!(record.expiry_date(), date(2024, 1, 2));
    }

    #[test]
    fn test_consume_quantity_must_be_positive() {
        assert!(validate_consume_quantity(0.5).is_ok());
        assert!(validate_consume_quantity(0.0).is_err());
        assert!(validate_consume_quantity(-2.0).is_err());
        assert!(validate_consume_quantity(f64::INFINITY).is_err());
    }
}
