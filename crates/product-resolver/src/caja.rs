//! CAJA variant: fixed table names, four price columns on the product row.

use pricing_core::{DataConnection, PriceEntry, ProductQuery, ProductResult, Row};
use tax_engine::TaxScheme;

use crate::pricing::{fetch_stock, fetch_tax_scheme, price_entry};
use crate::{image, ProductLookup, ResolveError};

const PRODUCT_SQL: &str = "SELECT producto, descripcio, CAST(existencia AS VARCHAR(40)), \
     CAST(esqimp AS VARCHAR(20)), clvalter1, clvalter2, clvalter3, \
     CAST(preciop AS VARCHAR(40)), CAST(precio2 AS VARCHAR(40)), \
     CAST(precio3 AS VARCHAR(40)), CAST(precio4 AS VARCHAR(40)), imagen \
     FROM catinven WHERE producto = ?";

const TAX_SCHEME_SQL: &str = "SELECT CAST(porcen1 AS VARCHAR(40)), CAST(porcen2 AS VARCHAR(40)), \
     CAST(porcen3 AS VARCHAR(40)), CAST(porcen4 AS VARCHAR(40)), \
     CAST(aplica1 AS VARCHAR(20)), CAST(aplica2 AS VARCHAR(20)), \
     CAST(aplica3 AS VARCHAR(20)), CAST(aplica4 AS VARCHAR(20)) \
     FROM esqimp WHERE clave = ?";

const STOCK_SQL: &str = "SELECT CAST(tienda AS VARCHAR(20)), CAST(existienda AS VARCHAR(40)) \
     FROM exist WHERE producto = ? ORDER BY tienda";

// Column positions in PRODUCT_SQL
const CODE: usize = 0;
const DESCRIPTION: usize = 1;
const TOTAL_STOCK: usize = 2;
const TAX_SCHEME: usize = 3;
const ALTERNATES: [usize; 3] = [4, 5, 6];
const PRICES: [usize; 4] = [7, 8, 9, 10];
const IMAGE: usize = 11;

#[derive(Debug, Clone, Copy, Default)]
pub struct CajaStrategy;

impl CajaStrategy {
    /// Price lists 1 to 4 from the product row. A NULL column has no entry.
    fn price_entries(
        row: &Row,
        scheme: &TaxScheme,
        include_tax: bool,
    ) -> Result<Vec<PriceEntry>, ResolveError> {
        let mut entries = Vec::with_capacity(PRICES.len());
        for (list_id, column) in (1..).zip(PRICES) {
            if let Some(base) = row.optional_decimal(column)? {
                entries.push(price_entry(list_id, base, scheme, include_tax)?);
            }
        }
        Ok(entries)
    }
}

impl ProductLookup for CajaStrategy {
    fn lookup<C: DataConnection>(
        &self,
        connection: &mut C,
        query: &ProductQuery,
    ) -> Result<Option<ProductResult>, ResolveError> {
        let code = query.product_code.as_str();

        let Some(row) = connection.query_first(PRODUCT_SQL, code)? else {
            return Ok(None);
        };

        let tax_scheme_key = row.non_blank(TAX_SCHEME)?;
        let scheme = fetch_tax_scheme(connection, TAX_SCHEME_SQL, tax_scheme_key.as_deref())?;

        let mut alternate_codes = Vec::new();
        for column in ALTERNATES {
            if let Some(alternate) = row.non_blank(column)? {
                alternate_codes.push(alternate);
            }
        }

        let price_entries = Self::price_entries(&row, &scheme, query.include_tax)?;
        let stock_entries = fetch_stock(connection, STOCK_SQL, code)?;

        let image_key = row.non_blank(IMAGE)?;
        let image_data_uri = image::load_product_image(&query.company_path, image_key.as_deref());

        Ok(Some(ProductResult {
            code: row.text(CODE)?.unwrap_or_else(|| code.to_string()),
            description: row.text(DESCRIPTION)?.unwrap_or_default(),
            alternate_codes,
            tax_scheme_key,
            total_stock: row.decimal(TOTAL_STOCK)?,
            stock_entries,
            price_entries,
            image_data_uri,
            include_tax: query.include_tax,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_null_price_columns_are_skipped() {
        let row: Row = [
            Some("A1"),
            Some("Widget"),
            Some("3"),
            None,
            None,
            None,
            None,
            Some("10"),
            None,
            Some("30.5"),
            None,
            None,
        ]
        .into_iter()
        .collect();

        let entries = CajaStrategy::price_entries(&row, &TaxScheme::zero(), true).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].list_id, 1);
        assert_eq!(entries[0].base_price, dec!(10));
        assert_eq!(entries[1].list_id, 3);
        assert_eq!(entries[1].final_price, dec!(30.5));
    }

    #[test]
    fn test_statements_read_fixed_tables() {
        assert!(PRODUCT_SQL.contains("FROM catinven WHERE producto = ?"));
        assert!(TAX_SCHEME_SQL.contains("FROM esqimp WHERE clave = ?"));
        assert!(STOCK_SQL.ends_with("ORDER BY tienda"));
    }
}
