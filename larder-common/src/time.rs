//! Calendar date utilities

use chrono::{Local, NaiveDate};

/// On-disk date format for added dates (`YYYY-MM-DD`)
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Current local calendar date
pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Parse a `YYYY-MM-DD` date
pub fn parse_date(text: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(text.trim(), DATE_FORMAT).ok()
}

/// Format a date as `YYYY-MM-DD`
pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_today_is_reasonable() {
        let date = today();
        assert!(date > NaiveDate::from_ymd_opt(2000, 1, 1).unwrap());
        assert!(date < NaiveDate::from_ymd_opt(2100, 1, 1).unwrap());
    }

    #[test]
    fn test_parse_date_valid() {
        assert_eq!(
            parse_date("2024-01-04"),
            NaiveDate::from_ymd_opt(2024, 1, 4)
        );
        assert_eq!(
            parse_date(" 2024-02-29 "),
            NaiveDate::from_ymd_opt(2024, 2, 29)
        );
    }

    #[test]
    fn test_parse_date_invalid() {
        assert_eq!(parse_date("2023-02-29"), None);
        assert_eq!(parse_date("04/01/2024"), None);
        assert_eq!(parse_date(""), None);
    }

    #[test]
    fn test_format_date_pads() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 7).unwrap();
        assert_eq!(format_date(date), "2024-03-07");
    }
}
