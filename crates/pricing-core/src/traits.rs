use rust_decimal::Decimal;
use std::path::Path;
use std::str::FromStr;
use tax_engine::round_money;

use crate::DataAccessError;

/// One result row with every column fetched as text.
///
/// Numeric columns arrive as their decimal text so no value passes through
/// binary floating point on its way into a [`Decimal`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Row {
    values: Vec<Option<String>>,
}

impl Row {
    pub fn new(values: Vec<Option<String>>) -> Self {
        Self { values }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    fn raw(&self, column: usize) -> Result<Option<&str>, DataAccessError> {
        self.values
            .get(column)
            .map(|value| value.as_deref())
            .ok_or_else(|| DataAccessError::Decode {
                column,
                message: format!("row has only {} columns", self.values.len()),
            })
    }

    /// Text value with CHAR padding removed; `None` for NULL.
    pub fn text(&self, column: usize) -> Result<Option<String>, DataAccessError> {
        Ok(self.raw(column)?.map(|value| value.trim_end().to_string()))
    }

    /// Trimmed text value; `None` for NULL or blank.
    pub fn non_blank(&self, column: usize) -> Result<Option<String>, DataAccessError> {
        Ok(self
            .raw(column)?
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(str::to_string))
    }

    /// Exact decimal rounded to four digits; `None` for NULL.
    pub fn optional_decimal(&self, column: usize) -> Result<Option<Decimal>, DataAccessError> {
        let Some(value) = self.raw(column)? else {
            return Ok(None);
        };
        let value = value.trim();
        if value.is_empty() {
            return Ok(None);
        }
        Decimal::from_str(value)
            .or_else(|_| Decimal::from_scientific(value))
            .map(|parsed| Some(round_money(parsed)))
            .map_err(|e| DataAccessError::Decode {
                column,
                message: format!("'{}' is not a decimal: {}", value, e),
            })
    }

    /// Exact decimal rounded to four digits; NULL reads as zero.
    pub fn decimal(&self, column: usize) -> Result<Decimal, DataAccessError> {
        Ok(self.optional_decimal(column)?.unwrap_or(Decimal::ZERO))
    }

    /// Integer value; NULL reads as zero. Fractional input is truncated.
    pub fn integer(&self, column: usize) -> Result<i64, DataAccessError> {
        let value = self.decimal(column)?;
        i64::try_from(value.trunc()).map_err(|e| DataAccessError::Decode {
            column,
            message: format!("{} does not fit an integer: {}", value, e),
        })
    }
}

impl<S: Into<String>> FromIterator<Option<S>> for Row {
    fn from_iter<I: IntoIterator<Item = Option<S>>>(iter: I) -> Self {
        Self::new(iter.into_iter().map(|value| value.map(Into::into)).collect())
    }
}

/// A live, read-only connection to one company database.
///
/// Every statement binds exactly one text parameter (a product code or a
/// scheme key). Dropping the connection releases it.
pub trait DataConnection {
    fn query(&mut self, sql: &str, key: &str) -> Result<Vec<Row>, DataAccessError>;

    fn query_first(&mut self, sql: &str, key: &str) -> Result<Option<Row>, DataAccessError> {
        Ok(self.query(sql, key)?.into_iter().next())
    }
}

/// Opens connections to company database files.
pub trait ConnectionProvider: Send + Sync {
    type Connection: DataConnection;

    fn open(&self, database: &Path) -> Result<Self::Connection, DataAccessError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn row(values: &[Option<&str>]) -> Row {
        values.iter().copied().collect()
    }

    #[test]
    fn test_text_strips_char_padding() {
        let row = row(&[Some("A-100   "), None, Some("   ")]);
        assert_eq!(row.text(0).unwrap().as_deref(), Some("A-100"));
        assert_eq!(row.text(1).unwrap(), None);
        assert_eq!(row.non_blank(2).unwrap(), None);
    }

    #[test]
    fn test_decimal_parsing() {
        let row = row(&[
            Some("16.000000"),
            Some("1.600000000000000e+01"),
            None,
            Some("99.123456"),
            Some("abc"),
        ]);
        assert_eq!(row.decimal(0).unwrap(), dec!(16));
        assert_eq!(row.decimal(1).unwrap(), dec!(16));
        assert_eq!(row.decimal(2).unwrap(), Decimal::ZERO);
        assert_eq!(row.optional_decimal(2).unwrap(), None);
        assert_eq!(row.decimal(3).unwrap(), dec!(99.1235));
        assert!(matches!(
            row.decimal(4),
            Err(DataAccessError::Decode { column: 4, .. })
        ));
    }

    #[test]
    fn test_integer_parsing() {
        let row = row(&[Some("2"), None, Some("3.0000")]);
        assert_eq!(row.integer(0).unwrap(), 2);
        assert_eq!(row.integer(1).unwrap(), 0);
        assert_eq!(row.integer(2).unwrap(), 3);
    }

    #[test]
    fn test_missing_column_is_decode_error() {
        let row = row(&[Some("x")]);
        assert!(row.text(3).is_err());
    }
}
