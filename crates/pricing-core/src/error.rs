use thiserror::Error;

#[derive(Error, Debug)]
pub enum DataAccessError {
    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Query error: {0}")]
    Query(String),

    #[error("Decode error in column {column}: {message}")]
    Decode { column: usize, message: String },
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Unknown system variant: {0}")]
pub struct UnknownVariant(pub String);
