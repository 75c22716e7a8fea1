use pricing_core::DataAccessError;
use tax_engine::TaxError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ResolveError {
    #[error("Invalid table suffix '{0}': expected two ASCII letters or digits")]
    InvalidTableSuffix(String),

    #[error("Data access error: {0}")]
    DataAccess(#[from] DataAccessError),

    #[error("Price list {list_id}: {source}")]
    Tax {
        list_id: i64,
        #[source]
        source: TaxError,
    },
}
