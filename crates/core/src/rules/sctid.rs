//! SNOMED CT identifier repair.
//!
//! Spreadsheets store long identifiers as numbers and write them back in scientific notation
//! (`9.99000011E+17`), losing the trailing digits. Extension identifiers end in the partition
//! `10` and a Verhoeff check digit, so the identifier is rebuilt from the mantissa digits, the
//! partition and a freshly computed check digit.

const D: [[u8; 10]; 10] = [
    [0, 1, 2, 3, 4, 5, 6, 7, 8, 9],
    [1, 2, 3, 4, 0, 6, 7, 8, 9, 5],
    [2, 3, 4, 0, 1, 7, 8, 9, 5, 6],
    [3, 4, 0, 1, 2, 8, 9, 5, 6, 7],
    [4, 0, 1, 2, 3, 9, 5, 6, 7, 8],
    [5, 9, 8, 7, 6, 0, 4, 3, 2, 1],
    [6, 5, 9, 8, 7, 1, 0, 4, 3, 2],
    [7, 6, 5, 9, 8, 2, 1, 0, 4, 3],
    [8, 7, 6, 5, 9, 3, 2, 1, 0, 4],
    [9, 8, 7, 6, 5, 4, 3, 2, 1, 0],
];

const P: [[u8; 10]; 8] = [
    [0, 1, 2, 3, 4, 5, 6, 7, 8, 9],
    [1, 5, 7, 6, 2, 8, 3, 0, 9, 4],
    [5, 8, 0, 3, 7, 9, 6, 1, 4, 2],
    [8, 9, 1, 6, 0, 4, 3, 5, 2, 7],
    [9, 4, 5, 3, 1, 2, 7, 6, 8, 0],
    [4, 2, 8, 6, 5, 7, 3, 9, 0, 1],
    [2, 7, 9, 3, 8, 0, 6, 4, 1, 5],
    [7, 0, 4, 6, 9, 1, 3, 2, 5, 8],
];

const INV: [u8; 10] = [0, 4, 3, 2, 1, 5, 6, 7, 8, 9];

/// Partition identifier of extension concepts.
const LONG_CONCEPT_PARTITION: &str = "10";

/// Verhoeff check digit for `digits`. `None` if `digits` contains anything but ASCII digits.
pub fn verhoeff_check_digit(digits: &str) -> Option<char> {
    let mut c = 0usize;
    for (i, ch) in digits.chars().rev().enumerate() {
        let digit = ch.to_digit(10)? as usize;
        c = D[c][P[(i + 1) % 8][digit] as usize] as usize;
    }
    char::from_digit(u32::from(INV[c]), 10)
}

/// True if the last digit of `identifier` is its Verhoeff check digit.
pub fn is_valid_sctid(identifier: &str) -> bool {
    if identifier.is_empty() {
        return false;
    }
    let mut c = 0usize;
    for (i, ch) in identifier.chars().rev().enumerate() {
        let Some(digit) = ch.to_digit(10) else {
            return false;
        };
        c = D[c][P[i % 8][digit as usize] as usize] as usize;
    }
    c == 0
}

/// True if `value` looks like a number in spreadsheet scientific notation.
pub fn is_scientific_notation(value: &str) -> bool {
    value.contains("E+")
}

/// Rebuilds an identifier from scientific notation such as `1.234567E+9`.
///
/// Returns `None` when `value` is not `<digits and dots>E+<digits>`.
pub fn repair_sctid(value: &str) -> Option<String> {
    let (mantissa, exponent) = value.trim().split_once("E+")?;
    let mantissa_ok = !mantissa.is_empty()
        && mantissa.chars().all(|c| c.is_ascii_digit() || c == '.')
        && mantissa.chars().any(|c| c.is_ascii_digit());
    let exponent_ok = !exponent.is_empty() && exponent.chars().all(|c| c.is_ascii_digit());
    if !(mantissa_ok && exponent_ok) {
        return None;
    }

    let mut identifier: String = mantissa.chars().filter(|c| *c != '.').collect();
    identifier.push_str(LONG_CONCEPT_PARTITION);
    let check = verhoeff_check_digit(&identifier)?;
    identifier.push(check);
    Some(identifier)
}
