//! Foundation types for the matlint toolchain.
//!
//! This module provides:
//! - [`Location`], [`Position`] - line/column locations with byte ranges
//! - [`TextRange`], [`TextSize`] - byte offsets (re-exported from `text-size`)
//!
//! This module has NO dependencies on other matlint modules.

mod position;

pub use position::{Location, Position};

// Re-export text-size types for convenience
pub use text_size::{TextRange, TextSize};
