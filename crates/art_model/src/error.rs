//! Error types for the shape model

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ArtModelError {
    #[error("element is not attached to a layer")]
    NotAttached,

    #[error("cannot attach an element to itself")]
    SelfAttachment,

    #[error("drag session is no longer active")]
    SessionDisabled,

    #[error("unknown shape type: {0}")]
    UnknownShapeType(String),

    #[error("invalid shape record: {0}")]
    InvalidRecord(String),

    #[error("invalid path data: {0}")]
    InvalidPathData(String),

    #[error("command has no recorded undo state")]
    MissingSnapshot,
}

pub type Result<T> = std::result::Result<T, ArtModelError>;
