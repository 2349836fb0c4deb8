use thiserror::Error;

#[derive(Error, Debug)]
pub enum AccountingError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Store error: {0}")]
    Store(#[from] common::CommonError),

    #[error("Malformed counter data: {0}")]
    Malformed(String),

    #[error("Invalid persisted state: {0}")]
    InvalidState(String),
}

pub type Result<T> = std::result::Result<T, AccountingError>;
