//! Edit Engine - undo/redo history for the shape model
//!
//! This crate owns the command history: a linear stack with a floating
//! index, branch truncation on new writes, edge-triggered availability
//! notifications, and update transactions that batch several commands into
//! one undoable unit. Commands themselves live in `art_model`; the manager
//! implements that crate's `CommandSink` so shapes can route generated
//! commands here.

mod error;
mod manager;

pub use error::*;
pub use manager::*;
