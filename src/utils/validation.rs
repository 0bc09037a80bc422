//! Input validation utilities

use crate::constants::{DEFAULT_PAGE_SIZE, MAX_CODE_LENGTH, MAX_LANGUAGE_LENGTH, MAX_PAGE_SIZE};

/// Validate a language tag such as `cpp17` or `c#`
pub fn validate_language(language: &str) -> Result<(), &'static str> {
    if language.is_empty() {
        return Err("Language is required");
    }
    if language.chars().count() as u64 > MAX_LANGUAGE_LENGTH {
        return Err("Language must be at most 32 characters");
    }
    if !language.chars().all(|c| c.is_ascii_graphic()) {
        return Err("Language may not contain whitespace or control characters");
    }
    Ok(())
}

/// Validate source code; length is counted in Unicode code points
pub fn validate_code(code: &str) -> Result<(), &'static str> {
    if code.trim().is_empty() {
        return Err("Code is required");
    }
    if code.chars().count() as u64 > MAX_CODE_LENGTH {
        return Err("Code must be at most 65535 characters");
    }
    Ok(())
}

/// Normalize 1-based pagination, rejecting out-of-range values
pub fn validate_pagination(page: Option<u32>, size: Option<u32>) -> Result<(u32, u32), &'static str> {
    let page = page.unwrap_or(1);
    let size = size.unwrap_or(DEFAULT_PAGE_SIZE);

    if page < 1 {
        return Err("Page number must be at least 1");
    }
    if !(1..=MAX_PAGE_SIZE).contains(&size) {
        return Err("Page size must be between 1 and 100");
    }
    Ok((page, size))
}
