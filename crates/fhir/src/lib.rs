//! FHIR R4 wire/boundary support for CDS Hooks prefetch data.
//!
//! This crate provides **wire models** and **translation helpers** for the resources a CDS Hooks
//! request carries in its prefetch:
//! - `Bundle` of `Condition` resources (the patient's active problems)
//! - `Bundle` of draft `MedicationRequest` resources (the orders being signed)
//!
//! This crate focuses on:
//! - the narrow slice of each resource the rule engines read
//! - serde deserialisation with path-aware error messages
//! - translation from wire structs into domain carriers built on [`cds_types::Coding`]
//!
//! It does not validate resources beyond the fields it reads. Unknown fields are ignored, since
//! EHRs send full resources.

pub mod bundle;
pub mod condition;
mod datatypes;
pub mod medication_request;

// Re-export facades
pub use bundle::PrefetchBundle;

// Re-export public domain-level types
pub use condition::ConditionData;
pub use medication_request::{
    DoseAndRate, DosageInstruction, MedicationRequestData, PeriodUnit, Quantity, TimingRepeat,
};

/// Errors returned by the `fhir` boundary crate.
#[derive(Debug, thiserror::Error)]
pub enum FhirError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("invalid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("translation error: {0}")]
    Translation(String),
}

/// Type alias for Results that can fail with a [`FhirError`].
pub type FhirResult<T> = Result<T, FhirError>;
