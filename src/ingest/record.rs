//! Price record model and field-level validation
//!
//! A `Record` is one CSV row / one `prices` row. Import files carry the
//! columns `[product_id, name, category, price, created_at]`; the store and
//! the export file use `[id, created_at, name, category, price]`.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Positional layout of an uploaded CSV row
pub mod column {
    pub const PRODUCT_ID: usize = 0;
    pub const NAME: usize = 1;
    pub const CATEGORY: usize = 2;
    pub const PRICE: usize = 3;
    pub const CREATED_AT: usize = 4;

    /// Number of columns every data row must carry
    pub const COUNT: usize = 5;
}

/// Header row written at the top of every export file
pub const EXPORT_HEADER: [&str; 5] = ["id", "created_at", "name", "category", "price"];

/// Validated price row
///
/// Field order matches `EXPORT_HEADER` so the struct serializes straight
/// into an export row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub id: i64,
    /// Opaque timestamp, stored and returned verbatim
    pub created_at: String,
    pub name: String,
    pub category: String,
    pub price: f64,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseError {
    #[error("line {line}: expected {expected} columns, found {found}")]
    ColumnCount {
        line: u64,
        expected: usize,
        found: usize,
    },

    #[error("line {line}: invalid {field} '{value}'")]
    InvalidField {
        line: u64,
        field: &'static str,
        value: String,
    },

    /// Reader-level failure (bad quoting, invalid UTF-8, I/O)
    ///
    /// `line` is the row the reader was on, when it knows.
    #[error("{}malformed CSV: {message}", line_prefix(.line))]
    Csv { line: Option<u64>, message: String },
}

fn line_prefix(line: &Option<u64>) -> String {
    line.map(|l| format!("line {}: ", l)).unwrap_or_default()
}

impl From<csv::Error> for ParseError {
    fn from(err: csv::Error) -> Self {
        ParseError::Csv {
            line: err.position().map(|p| p.line()),
            message: err.to_string(),
        }
    }
}

impl Record {
    /// Build a record from one raw upload row
    ///
    /// Every field is trimmed before it is interpreted. `line` is only used
    /// to point error messages at the offending row.
    pub fn from_fields(fields: &[&str], line: u64) -> Result<Self, ParseError> {
        if fields.len() != column::COUNT {
            return Err(ParseError::ColumnCount {
                line,
                expected: column::COUNT,
                found: fields.len(),
            });
        }

        let raw_id = fields[column::PRODUCT_ID].trim();
        let id = raw_id
            .parse::<i64>()
            .map_err(|_| ParseError::InvalidField {
                line,
                field: "product_id",
                value: raw_id.to_string(),
            })?;

        let raw_price = fields[column::PRICE].trim();
        let price = parse_price(raw_price).ok_or_else(|| ParseError::InvalidField {
            line,
            field: "price",
            value: raw_price.to_string(),
        })?;

        Ok(Self {
            id,
            created_at: fields[column::CREATED_AT].trim().to_string(),
            name: fields[column::NAME].trim().to_string(),
            category: fields[column::CATEGORY].trim().to_string(),
            price,
        })
    }
}

/// Prices must be finite, non-negative decimals
fn parse_price(raw: &str) -> Option<f64> {
    let price = raw.parse::<f64>().ok()?;
    (price.is_finite() && price >= 0.0).then_some(price)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fields_are_trimmed() {
        let record =
            Record::from_fields(&[" 7 ", "  Widget", "tools  ", " 9.99", " 2024-01-01 "], 2)
                .unwrap();

        assert_eq!(record.id, 7);
        assert_eq!(record.name, "Widget");
        assert_eq!(record.category, "tools");
        assert_eq!(record.price, 9.99);
        assert_eq!(record.created_at, "2024-01-01");
    }

    #[test]
    fn test_created_at_is_opaque() {
        // Not a date at all, still accepted verbatim
        let record = Record::from_fields(&["1", "a", "b", "1", "yesterday-ish"], 2).unwrap();
        assert_eq!(record.created_at, "yesterday-ish");
    }

    #[test]
    fn test_invalid_product_id() {
        let err = Record::from_fields(&["x1", "a", "b", "1.0", "2024-01-01"], 3).unwrap_err();
        assert_eq!(
            err,
            ParseError::InvalidField {
                line: 3,
                field: "product_id",
                value: "x1".to_string()
            }
        );
    }

    #[test]
    fn test_fractional_product_id_rejected() {
        let err = Record::from_fields(&["1.5", "a", "b", "1.0", "2024-01-01"], 2).unwrap_err();
        assert!(matches!(err, ParseError::InvalidField { field: "product_id", .. }));
    }

    #[test]
    fn test_invalid_price() {
        let err = Record::from_fields(&["1", "a", "b", "abc", "2024-01-01"], 4).unwrap_err();
        assert_eq!(err.to_string(), "line 4: invalid price 'abc'");
    }

    #[test]
    fn test_negative_and_non_finite_prices_rejected() {
        for raw in ["-1", "NaN", "inf", ""] {
            let result = Record::from_fields(&["1", "a", "b", raw, "2024-01-01"], 2);
            assert!(result.is_err(), "price '{}' should be rejected", raw);
        }
    }

    #[test]
    fn test_short_row_is_column_count_error() {
        let err = Record::from_fields(&["1", "a", "b"], 5).unwrap_err();
        assert_eq!(
            err,
            ParseError::ColumnCount {
                line: 5,
                expected: 5,
                found: 3
            }
        );
    }

    #[test]
    fn test_extra_columns_rejected() {
        let err = Record::from_fields(&["1", "a", "b", "1", "t", "extra"], 2).unwrap_err();
        assert!(matches!(err, ParseError::ColumnCount { found: 6, .. }));
    }

    #[test]
    fn test_empty_name_and_category_accepted() {
        let record = Record::from_fields(&["1", "  ", "", "0", "t"], 2).unwrap();
        assert!(record.name.is_empty());
        assert!(record.category.is_empty());
        assert_eq!(record.price, 0.0);
    }

    #[test]
    fn test_csv_error_message_names_line() {
        let with_line = ParseError::Csv {
            line: Some(7),
            message: "bad".to_string(),
        };
        let without = ParseError::Csv {
            line: None,
            message: "bad".to_string(),
        };

        assert_eq!(with_line.to_string(), "line 7: malformed CSV: bad");
        assert_eq!(without.to_string(), "malformed CSV: bad");
    }
}
