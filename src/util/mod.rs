//! Utility types and functions shared by every layer.
//!
//! This module contains fundamental types used throughout the library:
//! - [`Error`] / [`Result`] - Error handling
//! - Math type re-exports from glam and [`BBox3f`]
//! - Windows-1252 text conversion

mod error;
mod math;
mod text;

pub use error::*;
pub use math::*;
pub use text::*;
