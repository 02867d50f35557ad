//! Static conversion factors between dose units.

/// `(from, to, factor)`: a quantity in `from` times `factor` is the quantity in `to`.
const CONVERSIONS: &[(&str, &str, f64)] = &[
    ("mg", "mg", 1.0),
    ("mg", "g", 0.001),
    ("mg", "mcg", 1000.0),
    ("g", "mg", 1000.0),
    ("g", "g", 1.0),
    ("g", "mcg", 1_000_000.0),
    ("mcg", "mg", 0.001),
    ("mcg", "g", 0.000_001),
    ("mcg", "mcg", 1.0),
    ("L", "L", 1.0),
    ("L", "mL", 1000.0),
    ("L", "uL", 1_000_000.0),
    ("mL", "L", 0.001),
    ("mL", "mL", 1.0),
    ("mL", "uL", 1000.0),
    ("uL", "L", 0.000_001),
    ("uL", "mL", 0.001),
    ("uL", "uL", 1.0),
    ("Tablet", "Tablet", 1.0),
    ("Tablet", "Capsule", 1.0),
    ("Capsule", "Capsule", 1.0),
];

/// Factor converting a quantity in `from` into `to`. Unit names are case-sensitive.
///
/// Returns `None` for pairs outside the table, including mass to volume.
pub fn factor_of_conversion(from: &str, to: &str) -> Option<f64> {
    CONVERSIONS
        .iter()
        .find(|(f, t, _)| *f == from && *t == to)
        .map(|(_, _, factor)| *factor)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn converts_within_a_dimension() {
        assert_eq!(factor_of_conversion("g", "mg"), Some(1000.0));
        assert_eq!(factor_of_conversion("mcg", "mg"), Some(0.001));
        assert_eq!(factor_of_conversion("L", "uL"), Some(1_000_000.0));
        assert_eq!(factor_of_conversion("Tablet", "Capsule"), Some(1.0));
    }

    #[test]
    fn unknown_pairs_have_no_factor() {
        assert_eq!(factor_of_conversion("mg", "mL"), None);
        assert_eq!(factor_of_conversion("Capsule", "Tablet"), None);
        assert_eq!(factor_of_conversion("MG", "mg"), None);
    }

    #[test]
    fn identity_pairs_are_one() {
        for unit in ["mg", "g", "mcg", "L", "mL", "uL", "Tablet", "Capsule"] {
            assert_eq!(factor_of_conversion(unit, unit), Some(1.0), "{unit}");
        }
    }
}
