use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::str::FromStr;

use crate::error::UnknownVariant;

/// Table suffix used when a company folder name carries no trailing digits
pub const DEFAULT_TABLE_SUFFIX: &str = "01";

/// Supported ERP product-schema shapes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SystemVariant {
    #[serde(rename = "SAE")]
    Sae,
    #[serde(rename = "CAJA")]
    Caja,
}

impl SystemVariant {
    /// Canonical code, also the folder-name prefix of its installations
    pub fn code(&self) -> &'static str {
        match self {
            SystemVariant::Sae => "SAE",
            SystemVariant::Caja => "CAJA",
        }
    }

    pub fn all() -> [SystemVariant; 2] {
        [SystemVariant::Sae, SystemVariant::Caja]
    }
}

impl std::fmt::Display for SystemVariant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for SystemVariant {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "SAE" => Ok(SystemVariant::Sae),
            "CAJA" => Ok(SystemVariant::Caja),
            _ => Err(UnknownVariant(s.to_string())),
        }
    }
}

/// One versioned copy of an ERP system found under the base path
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstallationVersion {
    pub label: String,
    pub path: PathBuf,
}

/// One business dataset inside an installation version
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Company {
    pub name: String,
    pub path: PathBuf,
    /// Two-character code appended to SAE table names
    pub table_suffix: String,
}

impl Company {
    /// Trailing two digits of a company folder name, or [`DEFAULT_TABLE_SUFFIX`].
    pub fn table_suffix_for(folder_name: &str) -> String {
        let bytes = folder_name.as_bytes();
        match bytes {
            [.., a, b] if a.is_ascii_digit() && b.is_ascii_digit() => {
                format!("{}{}", *a as char, *b as char)
            }
            _ => DEFAULT_TABLE_SUFFIX.to_string(),
        }
    }
}

/// A single product lookup request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductQuery {
    pub system_variant: SystemVariant,
    pub version_path: PathBuf,
    pub company_path: PathBuf,
    pub table_suffix: String,
    pub product_code: String,
    pub include_tax: bool,
}

impl ProductQuery {
    /// Query against a discovered company, taking its path and table suffix.
    pub fn for_company(
        system_variant: SystemVariant,
        version: &InstallationVersion,
        company: &Company,
        product_code: impl Into<String>,
    ) -> Self {
        Self {
            system_variant,
            version_path: version.path.clone(),
            company_path: company.path.clone(),
            table_suffix: company.table_suffix.clone(),
            product_code: product_code.into(),
            include_tax: false,
        }
    }

    pub fn with_tax(mut self, include_tax: bool) -> Self {
        self.include_tax = include_tax;
        self
    }
}

/// Price of one price list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceEntry {
    pub list_id: i64,
    pub base_price: Decimal,
    /// Equal to `base_price` unless the query asked for tax-inclusive prices
    pub final_price: Decimal,
}

/// Stock held at one warehouse or store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockEntry {
    pub location_code: String,
    pub quantity: Decimal,
}

/// Fully assembled product record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductResult {
    pub code: String,
    pub description: String,
    pub alternate_codes: Vec<String>,
    pub tax_scheme_key: Option<String>,
    pub total_stock: Decimal,
    pub stock_entries: Vec<StockEntry>,
    pub price_entries: Vec<PriceEntry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_data_uri: Option<String>,
    pub include_tax: bool,
}
