//! Domain errors. Used by ports and use cases.
//!
//! Adapters map infrastructure errors into these.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DomainError {
    #[error("Ticket store error: {0}")]
    Store(String),

    #[error("Messenger error: {0}")]
    Messenger(String),

    #[error("Correlation map error: {0}")]
    Correlation(String),
}
