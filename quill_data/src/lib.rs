//! Shared data model for Quill compiled content.

pub mod defs;
pub mod validate;

pub use defs::*;
pub use validate::{ValidationError, validate_assemblage, validate_scene};
