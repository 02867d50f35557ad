//! FHIR `Condition` wire model and translation.
//!
//! Only `id` and `code.coding` are read.

use crate::datatypes::CodeableConceptWire;
use cds_types::Coding;
use serde::Deserialize;

// ============================================================================
// Public domain-level types
// ============================================================================

/// Domain-level carrier for one of the patient's conditions.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConditionData {
    /// Resource id, when present.
    pub id: Option<String>,

    /// Every coding of `Condition.code`, in document order.
    pub codings: Vec<Coding>,
}

// ============================================================================
// Wire types (internal)
// ============================================================================

#[derive(Debug, Deserialize)]
pub(crate) struct ConditionWire {
    id: Option<String>,
    #[serde(default)]
    code: CodeableConceptWire,
}

pub(crate) fn wire_to_domain(wire: ConditionWire) -> ConditionData {
    ConditionData {
        id: wire.id,
        codings: wire.code.into_codings(),
    }
}
