//! Tab-separated rule table reading.
//!
//! Responsibilities:
//! - Read a table from disk and check its header line exactly
//! - Hand out data rows with their 1-based line numbers
//! - Normalise SNOMED CT code cells (term suffixes, float artefacts, scientific notation)

use crate::rules::sctid::{is_scientific_notation, repair_sctid};
use crate::{CdsError, CdsResult};
use std::fs;
use std::path::Path;

/// One data row of a table.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Row {
    /// Line number in the file; the header is line 1.
    pub number: usize,
    cells: Vec<String>,
}

impl Row {
    pub fn new(number: usize, cells: Vec<String>) -> Self {
        Self { number, cells }
    }

    /// Trimmed cell content, `None` when the cell is missing or blank.
    pub fn cell(&self, index: usize) -> Option<&str> {
        self.cells
            .get(index)
            .map(|c| c.trim())
            .filter(|c| !c.is_empty())
    }
}

/// Reads `path`, checks that the header equals `expected` and returns the non-blank data rows.
///
/// `name` identifies the table in errors.
///
/// # Errors
///
/// - `CdsError::RuleFileRead` if the file cannot be read
/// - `CdsError::RuleHeader` if the header does not match
pub fn read_table(path: &Path, name: &str, expected: &[&str]) -> CdsResult<Vec<Row>> {
    let content = fs::read_to_string(path).map_err(|source| CdsError::RuleFileRead {
        path: path.to_path_buf(),
        source,
    })?;
    parse_table(&content, name, expected)
}

/// [`read_table`] over content already in memory.
pub fn parse_table(content: &str, name: &str, expected: &[&str]) -> CdsResult<Vec<Row>> {
    let content = content.strip_prefix('\u{feff}').unwrap_or(content);
    let mut lines = content.lines();

    let expected_header = expected.join("\t");
    let actual_header = lines.next().unwrap_or_default().trim_end_matches('\r');
    if actual_header != expected_header {
        return Err(CdsError::RuleHeader {
            file: name.to_string(),
            expected: expected_header,
            actual: actual_header.to_string(),
        });
    }

    Ok(lines
        .enumerate()
        .map(|(i, line)| (i + 2, line.trim_end_matches('\r')))
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(number, line)| Row::new(number, line.split('\t').map(str::to_string).collect()))
        .collect())
}

/// Normalises a cell holding a SNOMED CT code or an `ECL=` expression.
///
/// - `ECL=...` is returned unchanged
/// - scientific notation is repaired, see [`repair_sctid`]
/// - `code |term|` keeps the code
/// - a float rendering such as `22298006.0` loses its `.0`
///
/// # Errors
///
/// Returns `CdsError::CorruptIdentifier` when scientific notation cannot be repaired. `column`
/// is 0-based and reported 1-based.
pub fn read_concept_or_ecl(value: &str, column: usize, row: usize) -> CdsResult<String> {
    let value = value.trim();
    if value.starts_with("ECL=") {
        return Ok(value.to_string());
    }
    if is_scientific_notation(value) {
        return repair_sctid(value).ok_or(CdsError::CorruptIdentifier {
            column: column + 1,
            row,
        });
    }

    let code = match value.split_once('|') {
        Some((code, _term)) => code.trim(),
        None => value,
    };
    Ok(code.strip_suffix(".0").unwrap_or(code).to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const HEADER: [&str; 3] = ["a", "b", "c"];

    #[test]
    fn reads_rows_with_line_numbers() {
        let rows = parse_table("a\tb\tc\r\n1\t2\t3\n\n\t \t\nx\t\ty\n", "test", &HEADER)
            .expect("table");
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].number, 2);
        assert_eq!(rows[0].cell(2), Some("3"));
        assert_eq!(rows[1].number, 5);
        assert_eq!(rows[1].cell(1), None);
        assert_eq!(rows[1].cell(7), None);
    }

    #[test]
    fn header_must_match_exactly() {
        let err = parse_table("a\tb\n1\t2\n", "Medication dose form file", &HEADER)
            .expect_err("bad header");
        match err {
            CdsError::RuleHeader {
                file,
                expected,
                actual,
            } => {
                assert_eq!(file, "Medication dose form file");
                assert_eq!(expected, "a\tb\tc");
                assert_eq!(actual, "a\tb");
            }
            other => panic!("expected RuleHeader, got {other:?}"),
        }
        assert!(parse_table("", "empty", &HEADER).is_err());
    }

    #[test]
    fn reads_from_disk_and_reports_missing_files() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        write!(file, "\u{feff}a\tb\tc\n1\t2\t3\n").expect("write");
        let rows = read_table(file.path(), "test", &HEADER).expect("table");
        assert_eq!(rows.len(), 1);

        let dir = tempfile::tempdir().expect("temp dir");
        let missing = dir.path().join("missing.tsv");
        let err = read_table(&missing, "test", &HEADER).expect_err("missing file");
        assert!(matches!(err, CdsError::RuleFileRead { .. }));
    }

    #[test]
    fn normalises_code_cells() {
        assert_eq!(read_concept_or_ecl("22298006", 2, 3).unwrap(), "22298006");
        assert_eq!(read_concept_or_ecl(" 22298006.0 ", 2, 3).unwrap(), "22298006");
        assert_eq!(
            read_concept_or_ecl("22298006 |Myocardial infarction|", 2, 3).unwrap(),
            "22298006"
        );
        assert_eq!(
            read_concept_or_ecl("ECL=<< 22298006 |Myocardial infarction|", 2, 3).unwrap(),
            "ECL=<< 22298006 |Myocardial infarction|"
        );
        assert_eq!(read_concept_or_ecl("1.234567E+9", 2, 3).unwrap(), "1234567108");
    }

    #[test]
    fn corrupt_scientific_notation_is_fatal() {
        let err = read_concept_or_ecl("1.2E+x", 4, 7).expect_err("corrupt");
        assert_eq!(
            err.to_string(),
            "Unable to fix SNOMED CT concept id in column 5, row 7, the number is corrupted."
        );
    }
}
