//! Request precondition checks.
//!
//! Failures are [`CdsError::Precondition`] errors whose message is returned to the CDS client
//! verbatim, so the wording is part of the API.

use crate::{CdsError, CdsResult};

/// Checks that exactly `expected` items of `name` were supplied.
///
/// # Errors
///
/// Returns `CdsError::Precondition` with `Expected {expected} of '{name}' but found {actual}.`
pub fn expect_count(expected: usize, actual: usize, name: &str) -> CdsResult<()> {
    if expected != actual {
        return Err(CdsError::Precondition(format!(
            "Expected {expected} of '{name}' but found {actual}."
        )));
    }
    Ok(())
}

/// Unwraps a required value.
///
/// # Errors
///
/// Returns `CdsError::Precondition` with `'{name}' is expected, it must not be null.`
pub fn expect_present<T>(value: Option<T>, name: &str) -> CdsResult<T> {
    value.ok_or_else(|| {
        CdsError::Precondition(format!("'{name}' is expected, it must not be null."))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn count_mismatch_names_the_field() {
        assert!(expect_count(1, 1, "x").is_ok());
        let err = expect_count(1, 2, "Medication Request doseAndRate").unwrap_err();
        assert_eq!(
            err.to_string(),
            "Expected 1 of 'Medication Request doseAndRate' but found 2."
        );
    }

    #[test]
    fn missing_value_names_the_field() {
        assert_eq!(expect_present(Some(3), "n").unwrap(), 3);
        let err = expect_present::<u8>(None, "Medication Request doseQuantity").unwrap_err();
        assert_eq!(
            err.to_string(),
            "'Medication Request doseQuantity' is expected, it must not be null."
        );
    }
}
