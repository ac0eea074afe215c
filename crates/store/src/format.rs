//! The drawing save format
//!
//! The persisted layout is the only wire format in the core and must stay
//! stable across versions:
//!
//! ```json
//! {
//!   "size": { "width": 800.0, "height": 600.0 },
//!   "saveData": {
//!     "background": { "color": "#ffffff" },
//!     "shapes": [ { "type": "rect", "attr": { ... }, "style": { ... } } ]
//!   }
//! }
//! ```
//!
//! `background` is always present and nullable; each shape entry is the
//! record its shape serialized into.

use art_model::ShapeRecord;
use serde::{Deserialize, Serialize};

/// File extension for saved drawings
pub const FILE_EXTENSION: &str = "drawing";

/// Canvas dimensions
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CanvasSize {
    pub width: f64,
    pub height: f64,
}

impl CanvasSize {
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

/// Background of the drawing: a flat color, an image source, or both absent
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackgroundData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub src: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fill_mode: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y: Option<f64>,
}

impl BackgroundData {
    /// Flat color background
    pub fn color(color: impl Into<String>) -> Self {
        Self {
            color: Some(color.into()),
            ..Default::default()
        }
    }

    /// Image background with a fill mode ("contain", "cover", ...)
    pub fn image(src: impl Into<String>, fill_mode: impl Into<String>) -> Self {
        Self {
            src: Some(src.into()),
            fill_mode: Some(fill_mode.into()),
            ..Default::default()
        }
    }
}

/// The shape payload of a saved drawing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaveData {
    pub background: Option<BackgroundData>,
    pub shapes: Vec<ShapeRecord>,
}

/// A complete saved drawing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DrawingSaveData {
    pub size: CanvasSize,
    #[serde(rename = "saveData")]
    pub save_data: SaveData,
}

impl DrawingSaveData {
    pub fn new(size: CanvasSize) -> Self {
        Self {
            size,
            save_data: SaveData {
                background: None,
                shapes: Vec::new(),
            },
        }
    }
}
