//! Application-wide error types using thiserror
//!
//! Everything above the adapter layer (config loading, the binary) reports
//! through AppError; adapter calls keep returning ExchangeError.

use thiserror::Error;
use crate::adapters::errors::ExchangeError;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Exchange error: {0}")]
    Exchange(#[from] ExchangeError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
