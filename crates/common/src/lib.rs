use thiserror::Error;

pub mod types;
pub mod utils;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("invalid status code: {0}")]
    InvalidStatus(u16),
}
