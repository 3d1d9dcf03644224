//! Core types and the analysis/synthesis window builder.

pub mod types;
pub mod window;

pub use types::*;
pub use window::{fill_half_window, WindowKind};
