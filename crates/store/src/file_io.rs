//! File I/O for saved drawings

use crate::{DrawingSaveData, Result, StoreError};
use std::path::Path;
use tracing::debug;

/// Save a drawing to a file
pub fn save_drawing(data: &DrawingSaveData, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    let json = crate::serialize(data)?;
    debug!(path = %path.display(), bytes = json.len(), "save drawing");
    std::fs::write(path, json)?;
    Ok(())
}

/// Load a drawing from a file
pub fn load_drawing(path: impl AsRef<Path>) -> Result<DrawingSaveData> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(StoreError::FileNotFound(path.display().to_string()));
    }

    debug!(path = %path.display(), "load drawing");
    let json = std::fs::read_to_string(path)?;
    crate::deserialize(&json)
}
