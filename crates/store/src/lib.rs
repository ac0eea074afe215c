//! Store - persistence for drawings
//!
//! This crate owns the document-level save format (`{size, saveData}`), the
//! JSON serializer, and plain file I/O. Per-shape records live in
//! `art_model`; this layer composes them with the canvas size and background.

mod error;
mod file_io;
mod format;
mod serializer;

pub use error::*;
pub use file_io::*;
pub use format::*;
pub use serializer::*;
