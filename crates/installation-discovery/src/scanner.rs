//! Filesystem scans behind the discovery cache.
//!
//! Each scan returns a typed error on failure; the cache decides what the
//! caller sees.

use pricing_core::{Company, InstallationVersion, SystemVariant};
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::DiscoveryError;

/// Folder holding one subfolder per company
pub const COMPANIES_FOLDER: &str = "Empresas";

/// Levels below a version folder searched for [`COMPANIES_FOLDER`]
const COMPANIES_SEARCH_DEPTH: usize = 2;

/// Absolute form of `path`, falling back to the path as given.
pub fn absolute(path: &Path) -> PathBuf {
    std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf())
}

/// Immediate subdirectories of `dir` as (name, absolute path) pairs.
fn subdirectories(dir: &Path) -> Result<Vec<(String, PathBuf)>, DiscoveryError> {
    if !dir.is_dir() {
        return Err(DiscoveryError::MissingDirectory(dir.to_path_buf()));
    }

    let io_error = |source: std::io::Error| DiscoveryError::Io {
        path: dir.to_path_buf(),
        source,
    };

    let mut found = Vec::new();
    for entry in fs::read_dir(dir).map_err(io_error)? {
        let entry = entry.map_err(io_error)?;
        let path = entry.path();
        if path.is_dir() {
            let name = entry.file_name().to_string_lossy().into_owned();
            found.push((name, absolute(&path)));
        }
    }
    Ok(found)
}

/// Version folders under `base_path` whose name starts with the variant code
/// (case-insensitive), newest-looking name first.
pub fn scan_versions(
    base_path: &Path,
    variant: SystemVariant,
) -> Result<Vec<InstallationVersion>, DiscoveryError> {
    let prefix = variant.code();
    let mut versions: Vec<InstallationVersion> = subdirectories(base_path)?
        .into_iter()
        .filter(|(name, _)| name.to_uppercase().starts_with(prefix))
        .map(|(label, path)| InstallationVersion { label, path })
        .collect();

    versions.sort_by(|a, b| b.label.cmp(&a.label));
    Ok(versions)
}

/// Folder whose children are the companies of `version_path`.
///
/// Prefers `Empresas` directly under the version, then the first folder named
/// `Empresas` (any case) within two levels, then the version folder itself.
pub fn locate_companies_folder(version_path: &Path) -> PathBuf {
    let direct = version_path.join(COMPANIES_FOLDER);
    if direct.is_dir() {
        return direct;
    }

    let nested = WalkDir::new(version_path)
        .min_depth(1)
        .max_depth(COMPANIES_SEARCH_DEPTH)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                tracing::debug!("Skipping unreadable entry under {}: {}", version_path.display(), e);
                None
            }
        })
        .find(|entry| {
            entry.file_type().is_dir()
                && entry
                    .file_name()
                    .to_string_lossy()
                    .eq_ignore_ascii_case(COMPANIES_FOLDER)
        });

    match nested {
        Some(entry) => entry.into_path(),
        None => {
            tracing::debug!(
                "No {} folder under {}, listing the version folder itself",
                COMPANIES_FOLDER,
                version_path.display()
            );
            version_path.to_path_buf()
        }
    }
}

/// Companies of one installation version, sorted by name.
pub fn scan_companies(version_path: &Path) -> Result<Vec<Company>, DiscoveryError> {
    if version_path.as_os_str().is_empty() {
        return Err(DiscoveryError::BlankPath);
    }
    let version_path = absolute(version_path);
    if !version_path.is_dir() {
        return Err(DiscoveryError::MissingDirectory(version_path));
    }

    let companies_folder = locate_companies_folder(&version_path);
    let mut companies: Vec<Company> = subdirectories(&companies_folder)?
        .into_iter()
        .map(|(name, path)| Company {
            table_suffix: Company::table_suffix_for(&name),
            name,
            path,
        })
        .collect();

    companies.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(companies)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn mkdirs(root: &Path, dirs: &[&str]) {
        for dir in dirs {
            fs::create_dir_all(root.join(dir)).unwrap();
        }
    }

    #[test]
    fn test_scan_versions_filters_and_sorts_descending() {
        let tmp = TempDir::new().unwrap();
        mkdirs(tmp.path(), &["SAE70", "sae90", "SAE80", "CAJA40", "COI10"]);
        fs::write(tmp.path().join("SAE99.txt"), b"not a folder").unwrap();

        let versions = scan_versions(tmp.path(), SystemVariant::Sae).unwrap();
        let labels: Vec<&str> = versions.iter().map(|v| v.label.as_str()).collect();
        // byte order: lowercase sorts after uppercase
        assert_eq!(labels, vec!["sae90", "SAE80", "SAE70"]);
        assert!(versions.iter().all(|v| v.path.is_absolute()));

        let caja = scan_versions(tmp.path(), SystemVariant::Caja).unwrap();
        assert_eq!(caja.len(), 1);
        assert_eq!(caja[0].label, "CAJA40");
    }

    #[test]
    fn test_scan_versions_missing_base() {
        let tmp = TempDir::new().unwrap();
        let missing = tmp.path().join("nope");
        assert!(matches!(
            scan_versions(&missing, SystemVariant::Sae),
            Err(DiscoveryError::MissingDirectory(_))
        ));
    }

    #[test]
    fn test_companies_folder_directly_under_version() {
        let tmp = TempDir::new().unwrap();
        mkdirs(tmp.path(), &["Empresas/ACME02", "Empresas/Beta", "Datos"]);

        let companies = scan_companies(tmp.path()).unwrap();
        let names: Vec<&str> = companies.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["ACME02", "Beta"]);
        assert_eq!(companies[0].table_suffix, "02");
        assert_eq!(companies[1].table_suffix, "01");
        assert!(companies[0].path.ends_with("Empresas/ACME02"));
    }

    #[test]
    fn test_companies_folder_found_two_levels_deep() {
        let tmp = TempDir::new().unwrap();
        mkdirs(tmp.path(), &["Datos/EMPRESAS/Zeta10", "Datos/EMPRESAS/Alfa03"]);

        assert!(locate_companies_folder(tmp.path()).ends_with("Datos/EMPRESAS"));
        let companies = scan_companies(tmp.path()).unwrap();
        let names: Vec<&str> = companies.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Alfa03", "Zeta10"]);
    }

    #[test]
    fn test_companies_folder_beyond_depth_is_ignored() {
        let tmp = TempDir::new().unwrap();
        mkdirs(tmp.path(), &["a/b/Empresas/Deep01"]);

        assert_eq!(locate_companies_folder(tmp.path()), tmp.path().to_path_buf());
        let companies = scan_companies(tmp.path()).unwrap();
        let names: Vec<&str> = companies.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["a"]);
    }

    #[test]
    fn test_scan_companies_rejects_bad_paths() {
        assert!(matches!(
            scan_companies(Path::new("")),
            Err(DiscoveryError::BlankPath)
        ));
        let tmp = TempDir::new().unwrap();
        assert!(matches!(
            scan_companies(&tmp.path().join("missing")),
            Err(DiscoveryError::MissingDirectory(_))
        ));
    }
}
