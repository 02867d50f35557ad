//! Constants used throughout the CDS core crate.
//!
//! SNOMED CT attribute identifiers, service identifiers and configuration defaults live here so
//! that loaders, engines and tests agree on them.

/// SNOMED CT code system URI.
pub const SNOMED_SYSTEM: &str = terminology::SNOMED_SYSTEM;

/// Has manufactured dose form.
pub const ATTRIBUTE_MANUFACTURED_DOSE_FORM: &str = "411116001";
/// Has basis of strength substance.
pub const ATTRIBUTE_BASIS_OF_STRENGTH_SUBSTANCE: &str = "732943007";

/// Has presentation strength numerator value.
pub const ATTRIBUTE_PRESENTATION_NUMERATOR_VALUE: &str = "1142135004";
/// Has presentation strength numerator unit.
pub const ATTRIBUTE_PRESENTATION_NUMERATOR_UNIT: &str = "732945000";
/// Has presentation strength denominator value.
pub const ATTRIBUTE_PRESENTATION_DENOMINATOR_VALUE: &str = "1142136003";
/// Has presentation strength denominator unit.
pub const ATTRIBUTE_PRESENTATION_DENOMINATOR_UNIT: &str = "732947008";

/// Has concentration strength numerator value.
pub const ATTRIBUTE_CONCENTRATION_NUMERATOR_VALUE: &str = "1142138002";
/// Has concentration strength numerator unit.
pub const ATTRIBUTE_CONCENTRATION_NUMERATOR_UNIT: &str = "733725009";
/// Has concentration strength denominator value.
pub const ATTRIBUTE_CONCENTRATION_DENOMINATOR_VALUE: &str = "1142137007";
/// Has concentration strength denominator unit.
pub const ATTRIBUTE_CONCENTRATION_DENOMINATOR_UNIT: &str = "733722007";

/// Id of the medication order select service.
pub const MEDICATION_ORDER_SELECT_SERVICE_ID: &str = "medication-order-select";
/// CDS Hooks hook served by [`MEDICATION_ORDER_SELECT_SERVICE_ID`].
pub const MEDICATION_ORDER_SELECT_HOOK: &str = "order-select";

/// Prefetch key for the patient resource.
pub const PREFETCH_PATIENT: &str = "patient";
/// Prefetch key for the active condition bundle.
pub const PREFETCH_CONDITIONS: &str = "conditions";
/// Prefetch key for the draft medication request bundle.
pub const PREFETCH_DRAFT_MEDICATION_REQUESTS: &str = "draftMedicationRequests";

/// Source label of dose alert cards.
pub const DOSE_ALERT_SOURCE_LABEL: &str = "WHO ATC DDD";
/// Alert type of dose alert cards.
pub const HIGH_DOSAGE_ALERT_TYPE: &str = "High Dosage";

/// Default factor at which an info card is raised.
pub const DEFAULT_ACCEPTABLE_DAILY_DOSE_FACTOR: f64 = 2.0;
/// Default factor at which a warning card is raised.
pub const DEFAULT_MAXIMUM_DAILY_DOSE_FACTOR: f64 = 4.0;

/// Default dose card summary. `{{Substance}}` and `{{Factor}}` are substituted.
pub const DEFAULT_CARD_SUMMARY_TEMPLATE: &str =
    "The amount of {{Substance}} prescribed is {{Factor}} times the average daily dose.";
/// Default ATC index URL. `{{AtcCode}}` is substituted.
pub const DEFAULT_ATC_URL_TEMPLATE: &str = "https://www.whocc.no/atc_ddd_index/?code={{AtcCode}}";

/// Default terminology server.
pub const DEFAULT_TERMINOLOGY_URL: &str = "https://snowstorm.ihtsdotools.org/fhir";
/// Default timeout for terminology calls, in seconds.
pub const DEFAULT_TERMINOLOGY_TIMEOUT_SECS: u64 = 30;

/// Default drug-condition rule table.
pub const DEFAULT_RULES_MEDICATION_CONDITION: &str = "rules/medication-condition.tsv";
/// Default drug-drug rule table.
pub const DEFAULT_RULES_MEDICATION_MEDICATION: &str = "rules/medication-medication.tsv";
/// Default dose form to route map.
pub const DEFAULT_RULES_DOSE_FORMS: &str = "rules/dose-forms.tsv";
/// Default substance defined daily dose table.
pub const DEFAULT_RULES_SUBSTANCE_DDD: &str = "rules/substance-ddd.tsv";
