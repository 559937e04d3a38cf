//! Input validation for payout operations.
//!
//! Validators run before any gateway call, so malformed input fails fast
//! and never consumes retry budget or gateway quota.

use crate::error::{PayrailError, Result};

/// NUBAN account numbers are exactly ten digits.
const ACCOUNT_NUMBER_LENGTH: usize = 10;

/// Bank sort codes are between three and six digits.
const BANK_CODE_MIN_LENGTH: usize = 3;
const BANK_CODE_MAX_LENGTH: usize = 6;

/// Maximum length for plan codes.
const MAX_PLAN_CODE_LENGTH: usize = 64;

/// Validate a NUBAN bank account number (exactly ten ASCII digits).
pub fn validate_account_number(account_number: &str) -> Result<()> {
    if account_number.len() != ACCOUNT_NUMBER_LENGTH
        || !account_number.chars().all(|c| c.is_ascii_digit())
    {
        return Err(PayrailError::validation(format!(
            "account number must be exactly {ACCOUNT_NUMBER_LENGTH} digits"
        )));
    }
    Ok(())
}

/// Validate a bank sort code (three to six ASCII digits).
pub fn validate_bank_code(bank_code: &str) -> Result<()> {
    if bank_code.len() < BANK_CODE_MIN_LENGTH
        || bank_code.len() > BANK_CODE_MAX_LENGTH
        || !bank_code.chars().all(|c| c.is_ascii_digit())
    {
        return Err(PayrailError::validation(format!(
            "bank code must be {BANK_CODE_MIN_LENGTH} to {BANK_CODE_MAX_LENGTH} digits"
        )));
    }
    Ok(())
}

/// Validate a plan code.
///
/// Plan codes must be non-empty, at most 64 characters, and contain only
/// alphanumeric characters, underscores, and hyphens.
pub fn validate_plan_code(plan_code: &str) -> Result<()> {
    if plan_code.is_empty() {
        return Err(PayrailError::validation("plan code cannot be empty"));
    }

    if plan_code.len() > MAX_PLAN_CODE_LENGTH {
        return Err(PayrailError::validation(format!(
            "plan code exceeds maximum length of {MAX_PLAN_CODE_LENGTH}"
        )));
    }

    if !plan_code
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
    {
        return Err(PayrailError::validation(format!(
            "plan code '{}' contains invalid characters",
            sanitize_for_error(plan_code)
        )));
    }

    Ok(())
}

/// Strip anything unprintable before echoing input back in an error.
fn sanitize_for_error(input: &str) -> String {
    input
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_' || *c == '-')
        .take(32)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_account_number() {
        assert!(validate_account_number("0001234567").is_ok());
        assert!(validate_account_number("123456789").is_err()); // too short
        assert!(validate_account_number("12345678901").is_err()); // too long
        assert!(validate_account_number("00012345a7").is_err()); // non-digit
        assert!(validate_account_number("").is_err());
    }

    #[test]
    fn test_bank_code() {
        assert!(validate_bank_code("058").is_ok());
        assert!(validate_bank_code("100004").is_ok());
        assert!(validate_bank_code("05").is_err());
        assert!(validate_bank_code("1000045").is_err());
        assert!(validate_bank_code("05X").is_err());
    }

    #[test]
    fn test_plan_code() {
        assert!(validate_plan_code("PLN_x2rbfmkgy1z7j9m").is_ok());
        assert!(validate_plan_code("").is_err());
        assert!(validate_plan_code(&"p".repeat(65)).is_err());
        assert!(validate_plan_code("PLN <script>").is_err());
    }

    #[test]
    fn test_sanitize_for_error() {
        assert_eq!(sanitize_for_error("PLN <b>x</b>"), "PLNbxb");
        assert_eq!(sanitize_for_error(&"a".repeat(64)).len(), 32);
    }
}
