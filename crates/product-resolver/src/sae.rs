//! SAE variant: one set of tables per company, selected by a two-character
//! suffix appended to fixed base names.

use pricing_core::{DataConnection, PriceEntry, ProductQuery, ProductResult, Row};
use rust_decimal::Decimal;

use crate::pricing::{fetch_stock, fetch_tax_scheme, price_entry};
use crate::{image, ProductLookup, ResolveError};

/// Table names for one company. Built only from a validated suffix, which is
/// the one piece of runtime text interpolated into SQL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaeTables {
    pub products: String,
    pub alternates: String,
    pub taxes: String,
    pub stock: String,
    pub prices: String,
}

impl SaeTables {
    pub fn for_suffix(suffix: &str) -> Result<Self, ResolveError> {
        let suffix = validate_suffix(suffix)?;
        Ok(Self {
            products: format!("INVE{}", suffix),
            alternates: format!("CVES_ALTER{}", suffix),
            taxes: format!("IMPU{}", suffix),
            stock: format!("MULT{}", suffix),
            prices: format!("PRECIO_X_PROD{}", suffix),
        })
    }
}

/// Exactly two ASCII letters or digits, uppercased.
fn validate_suffix(suffix: &str) -> Result<String, ResolveError> {
    let trimmed = suffix.trim();
    if trimmed.len() == 2 && trimmed.bytes().all(|b| b.is_ascii_alphanumeric()) {
        Ok(trimmed.to_ascii_uppercase())
    } else {
        Err(ResolveError::InvalidTableSuffix(suffix.to_string()))
    }
}

/// Base product row
struct SaeProduct {
    code: String,
    description: String,
    total_stock: Decimal,
    tax_scheme_key: Option<String>,
    image_key: Option<String>,
}

impl SaeProduct {
    fn from_row(row: &Row, requested_code: &str) -> Result<Self, ResolveError> {
        Ok(Self {
            code: row.text(0)?.unwrap_or_else(|| requested_code.to_string()),
            description: row.text(1)?.unwrap_or_default(),
            total_stock: row.decimal(2)?,
            tax_scheme_key: row.non_blank(3)?,
            image_key: row.non_blank(4)?,
        })
    }
}

#[derive(Debug, Clone)]
pub struct SaeStrategy {
    tables: SaeTables,
}

impl SaeStrategy {
    pub fn new(table_suffix: &str) -> Result<Self, ResolveError> {
        Ok(Self {
            tables: SaeTables::for_suffix(table_suffix)?,
        })
    }

    pub fn tables(&self) -> &SaeTables {
        &self.tables
    }

    fn product_sql(&self) -> String {
        format!(
            "SELECT cve_art, descr, CAST(exist AS VARCHAR(40)), CAST(cve_esqimpu AS VARCHAR(20)), cve_imagen \
             FROM {} WHERE cve_art = ?",
            self.tables.products
        )
    }

    fn alternates_sql(&self) -> String {
        format!(
            "SELECT cve_alter FROM {} WHERE cve_art = ?",
            self.tables.alternates
        )
    }

    fn tax_scheme_sql(&self) -> String {
        format!(
            "SELECT CAST(impuesto1 AS VARCHAR(40)), CAST(impuesto2 AS VARCHAR(40)), \
             CAST(impuesto3 AS VARCHAR(40)), CAST(impuesto4 AS VARCHAR(40)), \
             CAST(imp1aplica AS VARCHAR(20)), CAST(imp2aplica AS VARCHAR(20)), \
             CAST(imp3aplica AS VARCHAR(20)), CAST(imp4aplica AS VARCHAR(20)) \
             FROM {} WHERE cve_esqimpu = ?",
            self.tables.taxes
        )
    }

    fn prices_sql(&self) -> String {
        format!(
            "SELECT CAST(cve_precio AS VARCHAR(20)), CAST(precio AS VARCHAR(40)) \
             FROM {} WHERE cve_art = ? ORDER BY cve_precio",
            self.tables.prices
        )
    }

    fn stock_sql(&self) -> String {
        format!(
            "SELECT CAST(cve_alm AS VARCHAR(20)), CAST(exist AS VARCHAR(40)) \
             FROM {} WHERE cve_art = ? ORDER BY cve_alm",
            self.tables.stock
        )
    }
}

impl ProductLookup for SaeStrategy {
    fn lookup<C: DataConnection>(
        &self,
        connection: &mut C,
        query: &ProductQuery,
    ) -> Result<Option<ProductResult>, ResolveError> {
        let code = query.product_code.as_str();

        let Some(row) = connection.query_first(&self.product_sql(), code)? else {
            return Ok(None);
        };
        let product = SaeProduct::from_row(&row, code)?;

        let alternate_codes = connection
            .query(&self.alternates_sql(), code)?
            .iter()
            .map(|row| row.non_blank(0))
            .filter_map(Result::transpose)
            .collect::<Result<Vec<_>, _>>()?;

        let scheme = fetch_tax_scheme(
            connection,
            &self.tax_scheme_sql(),
            product.tax_scheme_key.as_deref(),
        )?;

        let price_entries = connection
            .query(&self.prices_sql(), code)?
            .iter()
            .map(|row| -> Result<PriceEntry, ResolveError> {
                price_entry(row.integer(0)?, row.decimal(1)?, &scheme, query.include_tax)
            })
            .collect::<Result<Vec<_>, _>>()?;

        let stock_entries = fetch_stock(connection, &self.stock_sql(), code)?;

        let image_data_uri =
            image::load_product_image(&query.company_path, product.image_key.as_deref());

        Ok(Some(ProductResult {
            code: product.code,
            description: product.description,
            alternate_codes,
            tax_scheme_key: product.tax_scheme_key,
            total_stock: product.total_stock,
            stock_entries,
            price_entries,
            image_data_uri,
            include_tax: query.include_tax,
        }))
    }
}
