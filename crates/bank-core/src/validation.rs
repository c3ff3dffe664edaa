//! Input validation.
//!
//! Pure, side-effect-free checks applied before a request reaches the ledger.
//! Each failure is a [`ValidationError`] and maps to a client error at the
//! HTTP boundary.

use std::str::FromStr;

use rust_decimal::Decimal;
use validator::ValidateEmail;

use crate::error::{PasswordRule, ValidationError};
use crate::ids::AccountId;

/// Minimum password length.
pub const MIN_PASSWORD_LEN: usize = 8;

/// Longest email the schema stores.
pub const MAX_EMAIL_LEN: usize = 120;

/// Check that `email` is a well-formed address that fits the schema.
///
/// # Errors
///
/// Returns `ValidationError::InvalidEmail` otherwise.
pub fn validate_email(email: &str) -> Result<(), ValidationError> {
    if email.len() > MAX_EMAIL_LEN || !email.validate_email() {
        return Err(ValidationError::InvalidEmail(email.to_string()));
    }
    Ok(())
}

/// Check `password` against every complexity rule.
///
/// # Errors
///
/// Returns `ValidationError::WeakPassword` listing all unmet rules.
pub fn validate_password(password: &str) -> Result<(), ValidationError> {
    let mut unmet = Vec::new();

    if password.chars().count() < MIN_PASSWORD_LEN {
        unmet.push(PasswordRule::MinLength);
    }
    if !password.chars().any(char::is_lowercase) {
        unmet.push(PasswordRule::Lowercase);
    }
    if !password.chars().any(char::is_uppercase) {
        unmet.push(PasswordRule::Uppercase);
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        unmet.push(PasswordRule::Digit);
    }
    if !password
        .chars()
        .any(|c| !c.is_alphanumeric() && !c.is_whitespace())
    {
        unmet.push(PasswordRule::Symbol);
    }

    if unmet.is_empty() {
        Ok(())
    } else {
        Err(ValidationError::WeakPassword(unmet))
    }
}

/// Check the shape of a transfer request.
///
/// # Errors
///
/// - `ValidationError::ConversionType` if both endpoints are the same account.
/// - `ValidationError::AmountTooSmall` if `amount` is not strictly positive.
pub fn validate_transfer(
    from: &AccountId,
    to: &AccountId,
    amount: Decimal,
) -> Result<(), ValidationError> {
    if from == to {
        return Err(ValidationError::ConversionType(
            "source and destination accounts must be different".into(),
        ));
    }
    if amount <= Decimal::ZERO {
        return Err(ValidationError::AmountTooSmall(format!(
            "transfer amount must be positive, got {amount}"
        )));
    }
    Ok(())
}

/// Check a balance set directly by an administrator.
///
/// # Errors
///
/// Returns `ValidationError::AmountTooSmall` for negative values.
pub fn validate_new_balance(amount: Decimal) -> Result<(), ValidationError> {
    if amount < Decimal::ZERO {
        return Err(ValidationError::AmountTooSmall(format!(
            "balance cannot be negative, got {amount}"
        )));
    }
    Ok(())
}

/// Parse a textual amount, accepting plain and scientific notation.
///
/// # Errors
///
/// Returns `ValidationError::ConversionType` if `raw` is not a number.
pub fn parse_amount(raw: &str) -> Result<Decimal, ValidationError> {
    let trimmed = raw.trim();
    Decimal::from_str(trimmed)
        .or_else(|_| Decimal::from_scientific(trimmed))
        .map_err(|_| ValidationError::ConversionType(format!("not a numeric amount: {raw:?}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rules(password: &str) -> Vec<PasswordRule> {
        match validate_password(password) {
            Ok(()) => Vec::new(),
            Err(ValidationError::WeakPassword(rules)) => rules,
            Err(other) => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn accepts_well_formed_emails() {
        assert!(validate_email("a@x.com").is_ok());
        assert!(validate_email("first.last+tag@example.co.uk").is_ok());
    }

    #[test]
    fn rejects_malformed_emails() {
        assert!(validate_email("").is_err());
        assert!(validate_email("no-at-sign").is_err());
        assert!(validate_email("two@@x.com").is_err());
        let long = format!("{}@x.com", "a".repeat(MAX_EMAIL_LEN));
        assert!(validate_email(&long).is_err());
    }

    #[test]
    fn short_password_cites_length() {
        assert!(rules("abc").contains(&PasswordRule::MinLength));
    }

    #[test]
    fn lowercase_only_password_cites_missing_classes() {
        assert_eq!(
            rules("abcdefgh"),
            vec![PasswordRule::Uppercase, PasswordRule::Digit, PasswordRule::Symbol]
        );
    }

    #[test]
    fn strong_password_passes() {
        assert!(rules("Aa1!2345").is_empty());
        assert!(rules("Aa123456!").is_empty());
    }

    #[test]
    fn same_account_transfer_is_a_conversion_error() {
        let a = AccountId::generate();
        let err = validate_transfer(&a, &a, Decimal::TEN).unwrap_err();
        assert!(matches!(err, ValidationError::ConversionType(_)));
    }

    #[test]
    fn non_positive_transfer_is_too_small() {
        let a = AccountId::generate();
        let b = AccountId::generate();
        for amount in [Decimal::ZERO, Decimal::NEGATIVE_ONE] {
            let err = validate_transfer(&a, &b, amount).unwrap_err();
            assert!(matches!(err, ValidationError::AmountTooSmall(_)));
        }
        assert!(validate_transfer(&a, &b, Decimal::new(1, 2)).is_ok());
    }

    #[test]
    fn new_balance_may_be_zero_but_not_negative() {
        assert!(validate_new_balance(Decimal::ZERO).is_ok());
        assert!(validate_new_balance(Decimal::ONE_HUNDRED).is_ok());
        assert!(matches!(
            validate_new_balance(Decimal::NEGATIVE_ONE),
            Err(ValidationError::AmountTooSmall(_))
        ));
    }

    #[test]
    fn parse_amount_accepts_numbers() {
        assert_eq!(parse_amount("40").unwrap(), Decimal::new(40, 0));
        assert_eq!(parse_amount(" 12.50 ").unwrap(), Decimal::new(1250, 2));
        assert_eq!(parse_amount("1e2").unwrap(), Decimal::ONE_HUNDRED);
    }

    #[test]
    fn parse_amount_rejects_text() {
        assert!(matches!(
            parse_amount("ten"),
            Err(ValidationError::ConversionType(_))
        ));
        assert!(parse_amount("").is_err());
    }
}
