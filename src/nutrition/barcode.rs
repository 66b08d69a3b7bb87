// ABOUTME: Barcode normalization and validation for product lookups
// ABOUTME: Keeps only ASCII digits and rejects codes too short to be an EAN or UPC
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use crate::constants::{limits, messages};
use crate::errors::{AppError, AppResult};

/// Trim and drop every character that is not an ASCII digit
#[must_use]
pub fn normalize(raw: &str) -> String {
    raw.trim().chars().filter(char::is_ascii_digit).collect()
}

/// Normalize a code and check it is long enough to look up
///
/// # Errors
///
/// Returns `InvalidInput` when the input is blank or has too few digits
pub fn validate_lookup_code(raw: &str) -> AppResult<String> {
    if raw.trim().is_empty() {
        return Err(AppError::invalid_input(messages::BARCODE_INVALID));
    }

    let code = normalize(raw);
    if code.len() < limits::MIN_BARCODE_DIGITS {
        return Err(AppError::invalid_input(messages::BARCODE_TOO_SHORT));
    }

    Ok(code)
}
