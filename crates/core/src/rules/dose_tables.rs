//! Dose form map and substance defined daily dose tables.

use crate::dose::reference::{
    DefinedDailyDoses, DoseFormMap, ManyToOneMapEntry, SubstanceDefinedDailyDose,
};
use crate::rules::tabular::{read_table, Row};
use crate::{CdsError, CdsResult};
use std::path::Path;
use terminology::value_set::ecl_uri;
use terminology::TerminologyResolver;

pub const DOSE_FORMS_HEADER: [&str; 7] = [
    "adm_r",
    "adm_label",
    "snomed_basic_dose_form",
    "snomed_administration_method",
    "snomed_intended_site",
    "manufactured_dose_form_snomed_query",
    "priority",
];

pub const SUBSTANCE_DDD_HEADER: [&str; 8] = [
    "atc_code",
    "atc_name",
    "snomed_code",
    "snomed_label",
    "ddd",
    "uom",
    "adm_r",
    "note",
];

const DOSE_FORMS_FILE: &str = "Medication dose form file";
const SUBSTANCE_DDD_FILE: &str = "SNOMED Substance DDD file";

/// Loads the manufactured dose form → ATC route of administration map.
///
/// Each row's ECL query is expanded to the dose forms it covers.
///
/// # Errors
///
/// - `CdsError::RuleHeader` / `CdsError::RuleFileRead` for an unreadable table
/// - `CdsError::RuleRow` for a missing route, query or priority
/// - `CdsError::Terminology` if an expansion fails
pub fn load_dose_form_map(
    path: &Path,
    terminology: &dyn TerminologyResolver,
) -> CdsResult<DoseFormMap> {
    tracing::info!(
        "Loading SNOMED CT Manufactured dose form to ATC route of administration - dynamic map."
    );
    let mut entries = Vec::new();
    for row in read_table(path, DOSE_FORMS_FILE, &DOSE_FORMS_HEADER)? {
        let route = required(&row, 0, "adm_r", DOSE_FORMS_FILE)?;
        let query = required(&row, 5, "manufactured_dose_form_snomed_query", DOSE_FORMS_FILE)?;
        let priority = required(&row, 6, "priority", DOSE_FORMS_FILE)?
            .parse::<i32>()
            .map_err(|_| number_error(&row, DOSE_FORMS_FILE))?;

        let source_codes = terminology
            .expand_value_set(&ecl_uri(query))?
            .into_iter()
            .map(|coding| coding.code)
            .collect::<std::collections::HashSet<_>>();
        tracing::info!(
            "Mapping {} SNOMED CT Manufactured dose forms to ATC route of administration '{}'.",
            source_codes.len(),
            route
        );

        entries.push(ManyToOneMapEntry {
            source_codes,
            target_code: route.to_string(),
            priority,
            label: row.cell(1).map(str::to_string),
        });
    }
    Ok(DoseFormMap::new(entries))
}

/// Loads WHO defined daily doses keyed by SNOMED CT substance.
///
/// # Errors
///
/// - `CdsError::RuleHeader` / `CdsError::RuleFileRead` for an unreadable table
/// - `CdsError::RuleRow` naming the row when a dose is not a number or a field is missing
pub fn load_defined_daily_doses(path: &Path) -> CdsResult<DefinedDailyDoses> {
    tracing::info!("Loading SNOMED CT Substance Defined Daily Dose information");
    let mut ddds = DefinedDailyDoses::new();
    for row in read_table(path, SUBSTANCE_DDD_FILE, &SUBSTANCE_DDD_HEADER)? {
        let substance = required(&row, 2, "snomed_code", SUBSTANCE_DDD_FILE)?;
        let dose = required(&row, 4, "ddd", SUBSTANCE_DDD_FILE)?
            .parse::<f64>()
            .ok()
            .filter(|d| d.is_finite() && *d > 0.0)
            .ok_or_else(|| number_error(&row, SUBSTANCE_DDD_FILE))?;

        ddds.insert(
            substance,
            SubstanceDefinedDailyDose {
                route: required(&row, 6, "adm_r", SUBSTANCE_DDD_FILE)?.to_string(),
                dose,
                unit: required(&row, 5, "uom", SUBSTANCE_DDD_FILE)?.to_string(),
                atc_code: required(&row, 0, "atc_code", SUBSTANCE_DDD_FILE)?.to_string(),
            },
        );
    }
    tracing::info!("Doses loaded for {} substances.", ddds.substance_count());
    Ok(ddds)
}

// ============================================================================
// Helper functions (internal)
// ============================================================================

fn required<'a>(row: &'a Row, column: usize, field: &str, file: &str) -> CdsResult<&'a str> {
    row.cell(column).ok_or_else(|| CdsError::RuleRow {
        file: file.to_string(),
        row: row.number,
        message: format!("missing {field}"),
    })
}

fn number_error(row: &Row, file: &str) -> CdsError {
    CdsError::RuleRow {
        file: file.to_string(),
        row: row.number,
        message: format!("Number format error while reading row {}", row.number),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cds_types::Coding;
    use std::io::Write;
    use terminology::{StaticTerminology, SNOMED_SYSTEM};

    fn table(header: &[&str], rows: &[&str]) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        writeln!(file, "{}", header.join("\t")).expect("write header");
        for row in rows {
            writeln!(file, "{row}").expect("write row");
        }
        file
    }

    #[test]
    fn loads_dose_forms_in_priority_order() {
        let file = table(
            &DOSE_FORMS_HEADER,
            &[
                "O\toral\t\t\t\t<< 385268001\t2",
                "SL\tsublingual\t\t\t\t<< 385084000\t1",
            ],
        );
        let terminology = StaticTerminology::new()
            .with_value_set(
                "http://snomed.info/sct?fhir_vs=ecl/<< 385268001",
                [
                    Coding::new(SNOMED_SYSTEM, "385055001"),
                    Coding::new(SNOMED_SYSTEM, "385084000"),
                ],
            )
            .with_value_set(
                "http://snomed.info/sct?fhir_vs=ecl/<< 385084000",
                [Coding::new(SNOMED_SYSTEM, "385084000")],
            );

        let map = load_dose_form_map(file.path(), &terminology).expect("map");
        assert_eq!(map.len(), 2);
        let sublingual = map.route_for("385084000").expect("mapped");
        assert_eq!(sublingual.target_code, "SL");
        assert_eq!(sublingual.display(), "sublingual");
        assert_eq!(map.route_for("385055001").map(|e| e.display()), Some("oral"));
    }

    #[test]
    fn dose_form_priority_must_be_a_number() {
        let file = table(&DOSE_FORMS_HEADER, &["O\toral\t\t\t\t<< 385268001\tfirst"]);
        let err = load_dose_form_map(file.path(), &StaticTerminology::new())
            .expect_err("bad priority");
        assert!(matches!(err, CdsError::RuleRow { row: 2, .. }));
    }

    #[test]
    fn loads_defined_daily_doses() {
        let file = table(
            &SUBSTANCE_DDD_HEADER,
            &[
                "N02BE01\tparacetamol\t387517004\tParacetamol\t3\tg\tO\t",
                "N02BE01\tparacetamol\t387517004\tParacetamol\t3\tg\tR\t",
                "B01AC06\tacetylsalicylic acid\t387458008\tAspirin\t0.15\tg\tO\tref",
            ],
        );
        let ddds = load_defined_daily_doses(file.path()).expect("ddds");
        assert_eq!(ddds.substance_count(), 2);
        let rectal = ddds.for_route("387517004", "R").expect("rectal");
        assert_eq!(rectal.dose, 3.0);
        assert_eq!(rectal.unit, "g");
        assert_eq!(rectal.atc_code, "N02BE01");
        assert_eq!(ddds.for_route("387458008", "O").map(|d| d.dose), Some(0.15));
    }

    #[test]
    fn bad_dose_names_the_row() {
        let file = table(
            &SUBSTANCE_DDD_HEADER,
            &[
                "N02BE01\tparacetamol\t387517004\tParacetamol\t3\tg\tO\t",
                "N02BE01\tparacetamol\t387517004\tParacetamol\tthree\tg\tR\t",
            ],
        );
        let err = load_defined_daily_doses(file.path()).expect_err("bad number");
        match err {
            CdsError::RuleRow { row, message, .. } => {
                assert_eq!(row, 3);
                assert_eq!(message, "Number format error while reading row 3");
            }
            other => panic!("expected RuleRow, got {other:?}"),
        }
    }

    #[test]
    fn wrong_ddd_header_is_fatal() {
        let file = table(&["atc_code", "ddd"], &[]);
        let err = load_defined_daily_doses(file.path()).expect_err("bad header");
        assert_eq!(
            err.to_string(),
            "SNOMED Substance DDD file does not have the expected header. Expected: 'atc_code\tatc_name\tsnomed_code\tsnomed_label\tddd\tuom\tadm_r\tnote', Actual: 'atc_code\tddd'"
        );
    }
}
