//! Dose safety checking against WHO ATC defined daily doses.

pub mod aggregation;
pub mod alert;
pub mod engine;
pub mod frequency;
pub mod reference;
pub mod units;

pub use aggregation::{
    AggregatedMedicationsBySubstance, DosageComparisonByRoute, PrescribedDailyDose,
    SubstanceAggregation,
};
pub use alert::AlertSettings;
pub use engine::{prescribed_daily_dose, DoseSafetyEngine};
pub use reference::{DefinedDailyDoses, DoseFormMap, ManyToOneMapEntry, SubstanceDefinedDailyDose};
