//! Rule and reference table loading.
//!
//! All tables are loaded once at startup. Any error here is a configuration error and should stop
//! the process before it starts serving.

pub mod dose_tables;
pub mod interaction;
pub mod sctid;
pub mod tabular;

use crate::config::CoreConfig;
use crate::dose::reference::{DefinedDailyDoses, DoseFormMap};
use crate::trigger::Trigger;
use crate::CdsResult;
use terminology::TerminologyResolver;

pub use dose_tables::{load_defined_daily_doses, load_dose_form_map};
pub use interaction::{load_drug_condition_triggers, load_drug_drug_triggers};
pub use sctid::repair_sctid;

/// Every table the medication services need.
#[derive(Clone, Debug, Default)]
pub struct RuleSet {
    pub drug_condition: Vec<Trigger>,
    pub drug_drug: Vec<Trigger>,
    pub dose_forms: DoseFormMap,
    pub defined_daily_doses: DefinedDailyDoses,
}

impl RuleSet {
    /// Loads the four tables named in `config`.
    pub fn load(config: &CoreConfig, terminology: &dyn TerminologyResolver) -> CdsResult<Self> {
        let rule_set = Self {
            drug_condition: load_drug_condition_triggers(
                config.medication_condition_rules(),
                terminology,
            )?,
            drug_drug: load_drug_drug_triggers(config.medication_medication_rules(), terminology)?,
            dose_forms: load_dose_form_map(config.dose_forms_table(), terminology)?,
            defined_daily_doses: load_defined_daily_doses(config.substance_ddd_table())?,
        };
        tracing::info!(
            "Loaded {} drug-condition rules, {} drug-drug rules, {} dose form mappings and doses for {} substances",
            rule_set.drug_condition.len(),
            rule_set.drug_drug.len(),
            rule_set.dose_forms.len(),
            rule_set.defined_daily_doses.substance_count()
        );
        Ok(rule_set)
    }
}
