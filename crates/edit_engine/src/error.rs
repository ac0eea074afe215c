//! Error types for history operations

use thiserror::Error;

#[derive(Debug, Error)]
pub enum EditError {
    #[error("model error: {0}")]
    Model(#[from] art_model::ArtModelError),

    #[error("no update transaction is open")]
    NoOpenUpdate,
}

pub type Result<T> = std::result::Result<T, EditError>;
