//! Row-to-model helpers shared by both variants.

use pricing_core::{DataAccessError, DataConnection, PriceEntry, Row, StockEntry};
use rust_decimal::Decimal;
use tax_engine::{TaxScheme, SLOT_COUNT};

use crate::ResolveError;

/// Price entry for one list; `final_price` carries tax only when requested.
pub fn price_entry(
    list_id: i64,
    base_price: Decimal,
    scheme: &TaxScheme,
    include_tax: bool,
) -> Result<PriceEntry, ResolveError> {
    let final_price = if include_tax {
        scheme
            .price_with_tax(base_price)
            .map_err(|source| ResolveError::Tax { list_id, source })?
    } else {
        base_price
    };

    Ok(PriceEntry {
        list_id,
        base_price,
        final_price,
    })
}

/// Scheme from a row holding four percentages followed by four rules.
pub fn scheme_from_row(row: &Row) -> Result<TaxScheme, DataAccessError> {
    let mut percentages = [Decimal::ZERO; SLOT_COUNT];
    let mut rules = [0i64; SLOT_COUNT];
    for slot in 0..SLOT_COUNT {
        percentages[slot] = row.decimal(slot)?;
        rules[slot] = row.integer(SLOT_COUNT + slot)?;
    }
    Ok(TaxScheme::from_columns(percentages, rules))
}

/// Tax scheme stored under `key`. A missing key or row yields the zero scheme.
pub fn fetch_tax_scheme<C: DataConnection>(
    connection: &mut C,
    sql: &str,
    key: Option<&str>,
) -> Result<TaxScheme, DataAccessError> {
    let Some(key) = key else {
        return Ok(TaxScheme::zero());
    };

    match connection.query_first(sql, key)? {
        Some(row) => scheme_from_row(&row),
        None => {
            tracing::debug!("Tax scheme {} not found, using zero scheme", key);
            Ok(TaxScheme::zero())
        }
    }
}

/// Stock rows of (location, quantity), in the order read.
pub fn fetch_stock<C: DataConnection>(
    connection: &mut C,
    sql: &str,
    product_code: &str,
) -> Result<Vec<StockEntry>, DataAccessError> {
    connection
        .query(sql, product_code)?
        .iter()
        .map(|row| {
            Ok(StockEntry {
                location_code: row.text(0)?.unwrap_or_default(),
                quantity: row.decimal(1)?,
            })
        })
        .collect()
}
