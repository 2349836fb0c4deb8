use thiserror::Error;

#[derive(Error, Debug)]
pub enum CommonError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    #[error("Invalid stored value for {key}: {value}")]
    InvalidValue { key: String, value: String },
}

pub type Result<T> = std::result::Result<T, CommonError>;
