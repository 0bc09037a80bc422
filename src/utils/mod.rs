//! Utility functions

pub mod validation;

pub use validation::{validate_code, validate_language, validate_pagination};
