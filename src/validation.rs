// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Custom field validators for request bodies.

use crate::models::Money;
use validator::ValidationError;

/// Digits in a Vietnamese phone number, leading zero included.
const PHONE_DIGITS: usize = 10;

/// Reject empty or whitespace-only strings.
pub fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("blank").with_message("must not be blank".into()));
    }
    Ok(())
}

/// Exactly ten ASCII digits, starting with `0`.
pub fn phone_number(value: &str) -> Result<(), ValidationError> {
    let value = value.trim();
    let valid = value.len() == PHONE_DIGITS
        && value.starts_with('0')
        && value.bytes().all(|b| b.is_ascii_digit());

    if !valid {
        return Err(ValidationError::new("phone")
            .with_message("must be 10 digits starting with 0".into()));
    }
    Ok(())
}

pub fn non_negative(value: &Money) -> Result<(), ValidationError> {
    if value.is_negative() {
        return Err(ValidationError::new("negative").with_message("must not be negative".into()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_blank() {
        assert!(not_blank("An").is_ok());
        assert!(not_blank("").is_err());
        assert!(not_blank("  \t").is_err());
    }

    #[test]
    fn test_phone_number() {
        assert!(phone_number("0901234567").is_ok());
        assert!(phone_number(" 0901234567 ").is_ok());
        assert!(phone_number("901234567").is_err());
        assert!(phone_number("1901234567").is_err());
        assert!(phone_number("09012345678").is_err());
        assert!(phone_number("09012a4567").is_err());
        assert!(phone_number("０901234567").is_err());
    }

    #[test]
    fn test_non_negative() {
        assert!(non_negative(&Money::ZERO).is_ok());
        assert!(non_negative(&Money::from_dong(-1)).is_err());
    }
}
