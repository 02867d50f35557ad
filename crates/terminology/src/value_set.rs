//! Implicit SNOMED CT value-set URIs.

use crate::SNOMED_SYSTEM;

/// The concept and all of its descendants.
pub fn isa_uri(code: &str) -> String {
    format!("{SNOMED_SYSTEM}?fhir_vs=isa/{code}")
}

/// Members of an expression constraint. The expression is passed through unencoded; the HTTP
/// client encodes the whole URI as a query parameter.
pub fn ecl_uri(ecl: &str) -> String {
    format!("{SNOMED_SYSTEM}?fhir_vs=ecl/{ecl}")
}

/// Value-set URI for a rule table cell: an `ECL=` expression, otherwise a concept and its
/// descendants.
pub fn code_or_ecl_uri(cell: &str) -> String {
    match cell.strip_prefix("ECL=") {
        Some(ecl) => ecl_uri(ecl),
        None => isa_uri(cell),
    }
}
