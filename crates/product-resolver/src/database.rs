use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// How far below the company folder a database file may sit
const SEARCH_DEPTH: usize = 4;

/// First `.fdb` file (any case) under `company_path`, in file-name order.
pub fn locate_database(company_path: &Path) -> Option<PathBuf> {
    WalkDir::new(company_path)
        .max_depth(SEARCH_DEPTH)
        .sort_by_file_name()
        .into_iter()
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_file())
        .find(|entry| is_database_file(entry.path()))
        .map(|entry| entry.into_path())
}

fn is_database_file(path: &Path) -> bool {
    path.extension()
        .and_then(|extension| extension.to_str())
        .is_some_and(|extension| extension.eq_ignore_ascii_case("fdb"))
}
