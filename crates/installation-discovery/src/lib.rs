//! Installation Discovery
//!
//! Enumerates installed ERP versions and their companies from disk and
//! memoizes each listing until it is explicitly cleared.

pub mod cache;
pub mod discovery;
pub mod error;
pub mod scanner;

pub use cache::ComputeOnceCache;
pub use discovery::InstallationDiscoveryCache;
pub use error::DiscoveryError;
pub use scanner::COMPANIES_FOLDER;
