//! Drug-condition and drug-drug rule tables.
//!
//! Each row becomes one [`Trigger`]. The SNOMED CT code (or `ECL=` expression) on either side is
//! expanded through the terminology resolver; pass a caching resolver so that a code shared by
//! many rows is expanded once.
//!
//! Rows missing a mandatory field are skipped and logged. Card Detail and Source Link are
//! optional. An invalid card indicator, a corrupt identifier or a failed expansion aborts the
//! load.

use crate::card::{Card, Indicator, Source};
use crate::rules::tabular::{read_concept_or_ecl, read_table, Row};
use crate::trigger::{RuleSide, Trigger, TriggerKind};
use crate::{CdsError, CdsResult};
use std::path::Path;
use terminology::value_set::code_or_ecl_uri;
use terminology::TerminologyResolver;

pub const MEDICATION_CONDITION_HEADER: [&str; 10] = [
    "UUID",
    "Medication",
    "Medication SNOMED Code",
    "Contraindication - Finding",
    "Finding SNOMED Code",
    "Card Indicator",
    "Card Summary",
    "Card Detail",
    "Source",
    "Source Link",
];

pub const MEDICATION_MEDICATION_HEADER: [&str; 10] = [
    "UUID",
    "Medication1",
    "Medication1 SNOMED Code",
    "Medication2",
    "Medication2 SNOMED Code",
    "Card Indicator",
    "Card Summary",
    "Card Detail",
    "Source",
    "Source Link",
];

const UUID: usize = 0;
const PRIMARY_LABEL: usize = 1;
const PRIMARY_CODE: usize = 2;
const SECONDARY_LABEL: usize = 3;
const SECONDARY_CODE: usize = 4;
const INDICATOR: usize = 5;
const SUMMARY: usize = 6;
const DETAIL: usize = 7;
const SOURCE: usize = 8;
const SOURCE_LINK: usize = 9;

/// Loads medication / condition contraindication rules.
pub fn load_drug_condition_triggers(
    path: &Path,
    terminology: &dyn TerminologyResolver,
) -> CdsResult<Vec<Trigger>> {
    tracing::info!("Loading medication condition rules from {}", path.display());
    load_triggers(
        path,
        "Medication condition rule file",
        &MEDICATION_CONDITION_HEADER,
        TriggerKind::DrugCondition,
        terminology,
    )
}

/// Loads medication / medication interaction rules.
pub fn load_drug_drug_triggers(
    path: &Path,
    terminology: &dyn TerminologyResolver,
) -> CdsResult<Vec<Trigger>> {
    tracing::info!("Loading medication combination rules from {}", path.display());
    load_triggers(
        path,
        "Medication combination rule file",
        &MEDICATION_MEDICATION_HEADER,
        TriggerKind::DrugDrug,
        terminology,
    )
}

fn load_triggers(
    path: &Path,
    name: &str,
    header: &[&str],
    kind: TriggerKind,
    terminology: &dyn TerminologyResolver,
) -> CdsResult<Vec<Trigger>> {
    let mut triggers = Vec::new();
    for row in read_table(path, name, header)? {
        let Some(rule) = RuleRow::parse(&row, name, kind)? else {
            continue;
        };

        let primary = RuleSide::new(
            rule.primary_label,
            terminology.expand_value_set(&code_or_ecl_uri(&rule.primary_code))?,
        );
        let secondary = RuleSide::new(
            rule.secondary_label,
            terminology.expand_value_set(&code_or_ecl_uri(&rule.secondary_code))?,
        );
        tracing::info!("Created trigger {} / {}", primary.label, secondary.label);

        triggers.push(match kind {
            TriggerKind::DrugCondition => Trigger::drug_condition(primary, secondary, rule.card),
            TriggerKind::DrugDrug => Trigger::drug_drug(primary, secondary, rule.card),
        });
    }
    Ok(triggers)
}

/// A row with every mandatory field present.
struct RuleRow {
    primary_label: String,
    primary_code: String,
    secondary_label: String,
    secondary_code: String,
    card: Card,
}

impl RuleRow {
    /// `Ok(None)` when the row lacks a mandatory field.
    fn parse(row: &Row, name: &str, kind: TriggerKind) -> CdsResult<Option<Self>> {
        let (primary, secondary) = match kind {
            TriggerKind::DrugCondition => ("Medication", "Condition"),
            TriggerKind::DrugDrug => ("Medication1", "Medication2"),
        };

        let Some(uuid) = row.cell(UUID) else {
            tracing::debug!("Ignoring row {}, missing UUID.", row.number);
            return Ok(None);
        };
        let mandatory = [
            (PRIMARY_LABEL, format!("{primary} label")),
            (PRIMARY_CODE, format!("{primary} code")),
            (SECONDARY_LABEL, format!("{secondary} label")),
            (SECONDARY_CODE, format!("{secondary} code")),
            (INDICATOR, "Card Indicator".to_string()),
            (SUMMARY, "Card Summary".to_string()),
            (SOURCE, "Source".to_string()),
        ];
        for (column, field) in &mandatory {
            if row.cell(*column).is_none() {
                tracing::info!("Ignoring row {}, missing {}.", row.number, field);
                return Ok(None);
            }
        }

        let cell = |column: usize| row.cell(column).unwrap_or_default();
        let indicator = cell(INDICATOR)
            .parse::<Indicator>()
            .map_err(|err| CdsError::RuleRow {
                file: name.to_string(),
                row: row.number,
                message: err.to_string(),
            })?;

        Ok(Some(Self {
            primary_label: cell(PRIMARY_LABEL).to_string(),
            primary_code: read_concept_or_ecl(cell(PRIMARY_CODE), PRIMARY_CODE, row.number)?,
            secondary_label: cell(SECONDARY_LABEL).to_string(),
            secondary_code: read_concept_or_ecl(cell(SECONDARY_CODE), SECONDARY_CODE, row.number)?,
            card: Card::new(
                uuid,
                cell(SUMMARY),
                row.cell(DETAIL).map(str::to_string),
                indicator,
                Source::new(cell(SOURCE), row.cell(SOURCE_LINK).map(str::to_string)),
            ),
        }))
    }
}
