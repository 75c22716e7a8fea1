//! Product Resolver
//!
//! Assembles a complete product record (identity, alternate codes, stock,
//! prices with compounding tax, image) from a company database. Each system
//! variant has its own table layout and its own lookup strategy; both produce
//! the same [`ProductResult`] shape.

pub mod caja;
pub mod database;
pub mod error;
pub mod image;
pub mod pricing;
pub mod sae;


use pricing_core::{ConnectionProvider, DataConnection, ProductQuery, ProductResult, SystemVariant};

pub use caja::CajaStrategy;
pub use error::ResolveError;
pub use sae::{SaeStrategy, SaeTables};

/// A per-variant way of reading one product from an open connection.
pub trait ProductLookup {
    /// `Ok(None)` when the product row does not exist. No further statements
    /// are issued in that case.
    fn lookup<C: DataConnection>(
        &self,
        connection: &mut C,
        query: &ProductQuery,
    ) -> Result<Option<ProductResult>, ResolveError>;
}

/// Lookup strategy selected from a query's system variant
#[derive(Debug, Clone)]
pub enum VariantStrategy {
    Sae(SaeStrategy),
    Caja(CajaStrategy),
}

impl VariantStrategy {
    pub fn for_query(query: &ProductQuery) -> Result<Self, ResolveError> {
        match query.system_variant {
            SystemVariant::Sae => Ok(Self::Sae(SaeStrategy::new(&query.table_suffix)?)),
            SystemVariant::Caja => Ok(Self::Caja(CajaStrategy)),
        }
    }
}

impl ProductLookup for VariantStrategy {
    fn lookup<C: DataConnection>(
        &self,
        connection: &mut C,
        query: &ProductQuery,
    ) -> Result<Option<ProductResult>, ResolveError> {
        match self {
            Self::Sae(strategy) => strategy.lookup(connection, query),
            Self::Caja(strategy) => strategy.lookup(connection, query),
        }
    }
}

/// Resolves product queries against company databases.
///
/// Stateless apart from its connection provider; safe to share across
/// worker threads when the provider is.
pub struct ProductResolver<P> {
    provider: P,
}

impl<P: ConnectionProvider> ProductResolver<P> {
    pub fn new(provider: P) -> Self {
        Self { provider }
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Product record for `query`, or `None` when the product does not exist
    /// or the lookup failed. Failures are logged with the product code.
    pub fn resolve(&self, query: &ProductQuery) -> Option<ProductResult> {
        match self.try_resolve(query) {
            Ok(Some(product)) => Some(product),
            Ok(None) => {
                tracing::info!(
                    "Product {} not found in {} company {}",
                    query.product_code,
                    query.system_variant,
                    query.company_path.display()
                );
                None
            }
            Err(e) => {
                tracing::error!("Error looking up product {}: {}", query.product_code, e);
                None
            }
        }
    }

    /// Like [`ProductResolver::resolve`] but reports failures instead of
    /// folding them into `None`.
    pub fn try_resolve(&self, query: &ProductQuery) -> Result<Option<ProductResult>, ResolveError> {
        let strategy = VariantStrategy::for_query(query)?;

        if query.company_path.as_os_str().is_empty() {
            return Ok(None);
        }

        let Some(database) = database::locate_database(&query.company_path) else {
            tracing::warn!(
                "No Firebird database found for {} in {}",
                query.system_variant,
                query.company_path.display()
            );
            return Ok(None);
        };

        tracing::debug!(
            "Looking up product {} in {}",
            query.product_code,
            database.display()
        );

        // Dropped on every return path below, releasing the connection
        let mut connection = self.provider.open(&database)?;
        strategy.lookup(&mut connection, query)
    }
}
