use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DiscoveryError {
    #[error("Directory does not exist or is not accessible: {0}")]
    MissingDirectory(PathBuf),

    #[error("Path is blank")]
    BlankPath,

    #[error("I/O error listing {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
