//! # Terminology
//!
//! Access to a FHIR terminology server for value-set expansion and concept lookup.
//!
//! The [`TerminologyResolver`] trait is the seam used by rule loading and by the dose engine.
//! Implementations:
//! - [`FhirTerminologyClient`]: blocking HTTP client against a FHIR R4 terminology server
//! - [`StaticTerminology`]: in-memory resolver for tests and offline runs
//! - [`CachingResolver`]: wraps another resolver with query-string keyed caches
//!
//! Every remote failure surfaces as a [`TerminologyError`]; nothing in this crate retries.

mod cache;
mod client;
mod normal_form;
mod static_terminology;
pub mod value_set;

pub use cache::CachingResolver;
pub use client::FhirTerminologyClient;
pub use normal_form::{AttributeMap, NormalForm, NormalFormParser};
pub use static_terminology::StaticTerminology;

use cds_types::CodeSet;

/// SNOMED CT code system URI.
pub const SNOMED_SYSTEM: &str = "http://snomed.info/sct";

#[derive(Debug, thiserror::Error)]
pub enum TerminologyError {
    #[error("terminology server unreachable at {0}")]
    Unreachable(String),
    #[error("terminology request timed out after {0}s")]
    Timeout(u64),
    #[error("terminology server returned status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("invalid terminology response: {0}")]
    InvalidResponse(String),
    #[error("failed to build terminology client: {0}")]
    Client(String),
    #[error("unknown value set: {0}")]
    UnknownValueSet(String),
    #[error("unknown concept {system}|{code}")]
    UnknownConcept { system: String, code: String },
}

impl TerminologyError {
    /// True when the server answered that the value set or concept does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            TerminologyError::Status { status: 404, .. }
                | TerminologyError::UnknownValueSet(_)
                | TerminologyError::UnknownConcept { .. }
        )
    }
}

pub type TerminologyResult<T> = std::result::Result<T, TerminologyError>;

/// Result of a concept lookup.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ConceptDetails {
    pub display: Option<String>,
    /// Parsed `normalFormTerse` property, when the server provides one.
    pub normal_form: Option<NormalForm>,
}

/// Resolves value sets and concept details.
///
/// Implementations block the calling thread and must be shareable across threads.
pub trait TerminologyResolver: Send + Sync {
    /// Expands a value-set URI such as `http://snomed.info/sct?fhir_vs=isa/123` into its codings.
    fn expand_value_set(&self, uri: &str) -> TerminologyResult<CodeSet>;

    /// Looks up display text and normal form of one concept.
    fn lookup(&self, system: &str, code: &str) -> TerminologyResult<ConceptDetails>;
}

impl<T: TerminologyResolver + ?Sized> TerminologyResolver for std::sync::Arc<T> {
    fn expand_value_set(&self, uri: &str) -> TerminologyResult<CodeSet> {
        (**self).expand_value_set(uri)
    }

    fn lookup(&self, system: &str, code: &str) -> TerminologyResult<ConceptDetails> {
        (**self).lookup(system, code)
    }
}
