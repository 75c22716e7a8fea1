use pricing_core::{Company, DiscoveryConfig, InstallationVersion, SystemVariant};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::cache::ComputeOnceCache;
use crate::scanner;

/// Composite key for company listings
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CompanyKey {
    variant: SystemVariant,
    version_path: PathBuf,
}

/// Memoized view of the installations and companies found on disk.
///
/// Listings are cached per key until cleared. Scan failures are logged and
/// reported as an empty listing, and are never cached.
pub struct InstallationDiscoveryCache {
    base_path: PathBuf,
    versions: ComputeOnceCache<SystemVariant, Vec<InstallationVersion>>,
    companies: ComputeOnceCache<CompanyKey, Vec<Company>>,
}

impl InstallationDiscoveryCache {
    pub fn new(config: &DiscoveryConfig) -> Self {
        Self {
            base_path: scanner::absolute(&config.base_path),
            versions: ComputeOnceCache::new(),
            companies: ComputeOnceCache::new(),
        }
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// Installed versions of `variant`, newest-looking first.
    pub fn list_versions(&self, variant: SystemVariant) -> Arc<Vec<InstallationVersion>> {
        if let Some(versions) = self.versions.get(&variant) {
            tracing::debug!("Version cache hit for {}", variant);
            return versions;
        }

        let result = self.versions.get_or_try_compute(&variant, || {
            tracing::debug!("Scanning {} for {} versions", self.base_path.display(), variant);
            scanner::scan_versions(&self.base_path, variant)
        });

        match result {
            Ok(versions) => versions,
            Err(e) => {
                tracing::warn!("Failed to list {} versions: {}", variant, e);
                Arc::new(Vec::new())
            }
        }
    }

    /// Companies of the version at `version_path`, sorted by name.
    pub fn list_companies(
        &self,
        variant: SystemVariant,
        version_path: &Path,
    ) -> Arc<Vec<Company>> {
        let key = CompanyKey {
            variant,
            version_path: version_path.to_path_buf(),
        };
        if let Some(companies) = self.companies.get(&key) {
            tracing::debug!("Company cache hit for {}", version_path.display());
            return companies;
        }

        let result = self.companies.get_or_try_compute(&key, || {
            tracing::debug!("Scanning {} for {} companies", version_path.display(), variant);
            scanner::scan_companies(version_path)
        });

        match result {
            Ok(companies) => companies,
            Err(e) => {
                tracing::error!(
                    "Failed to list companies in {}: {}",
                    version_path.display(),
                    e
                );
                Arc::new(Vec::new())
            }
        }
    }

    pub fn clear_versions(&self) {
        self.versions.clear();
        tracing::info!("Version cache cleared");
    }

    pub fn clear_companies(&self) {
        self.companies.clear();
        tracing::info!("Company cache cleared");
    }
}
