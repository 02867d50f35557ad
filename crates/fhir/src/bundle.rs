//! FHIR `Bundle` handling for prefetch payloads.
//!
//! Responsibilities:
//! - Accept a prefetch value as sent by the EHR (a `Bundle`)
//! - Select entries by `resourceType`
//! - Hand each selected resource to its translation helper, reporting the entry index on failure
//!
//! Notes:
//! - Entries without a `resource` and entries of other resource types are skipped

use crate::condition::{self, ConditionData};
use crate::medication_request::{self, MedicationRequestData};
use crate::{FhirError, FhirResult};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;

// ============================================================================
// Public PrefetchBundle operations
// ============================================================================

/// Prefetch bundle operations.
///
/// This is a zero-sized type used for namespacing bundle-related operations.
/// All methods are associated functions.
pub struct PrefetchBundle;

impl PrefetchBundle {
    /// Extract every `Condition` from a prefetch bundle.
    ///
    /// # Errors
    ///
    /// Returns [`FhirError`] if the value is not a `Bundle`, or if a `Condition` entry does not
    /// match the wire schema.
    pub fn conditions(bundle: &Value) -> FhirResult<Vec<ConditionData>> {
        resources_of_type(bundle, "Condition")?
            .into_iter()
            .map(|(index, resource)| {
                let wire = deserialize_resource(resource, "Condition", index)?;
                Ok(condition::wire_to_domain(wire))
            })
            .collect()
    }

    /// Extract every `MedicationRequest` from a prefetch bundle.
    ///
    /// # Errors
    ///
    /// Returns [`FhirError`] if the value is not a `Bundle`, or if a `MedicationRequest` entry
    /// does not match the wire schema.
    pub fn medication_requests(bundle: &Value) -> FhirResult<Vec<MedicationRequestData>> {
        resources_of_type(bundle, "MedicationRequest")?
            .into_iter()
            .map(|(index, resource)| {
                let wire = deserialize_resource(resource, "MedicationRequest", index)?;
                Ok(medication_request::wire_to_domain(wire))
            })
            .collect()
    }
}

// ============================================================================
// Wire types (internal)
// ============================================================================

#[derive(Debug, Deserialize)]
struct BundleWire {
    #[serde(rename = "resourceType")]
    resource_type: String,
    #[serde(default)]
    entry: Vec<EntryWire>,
}

#[derive(Debug, Deserialize)]
struct EntryWire {
    resource: Option<Value>,
}

// ============================================================================
// Helper functions (internal)
// ============================================================================

fn resources_of_type(bundle: &Value, resource_type: &str) -> FhirResult<Vec<(usize, Value)>> {
    let wire: BundleWire = match serde_path_to_error::deserialize(bundle) {
        Ok(parsed) => parsed,
        Err(err) => {
            let path = err.path().to_string();
            let source = err.into_inner();
            let path = if path.is_empty() {
                "<root>"
            } else {
                path.as_str()
            };
            return Err(FhirError::Translation(format!(
                "Bundle schema mismatch at {path}: {source}"
            )));
        }
    };

    if wire.resource_type != "Bundle" {
        return Err(FhirError::InvalidInput(format!(
            "expected resourceType Bundle, found {}",
            wire.resource_type
        )));
    }

    Ok(wire
        .entry
        .into_iter()
        .enumerate()
        .filter_map(|(index, entry)| entry.resource.map(|r| (index, r)))
        .filter(|(_, resource)| {
            resource.get("resourceType").and_then(Value::as_str) == Some(resource_type)
        })
        .collect())
}

fn deserialize_resource<T: DeserializeOwned>(
    resource: Value,
    resource_type: &str,
    index: usize,
) -> FhirResult<T> {
    serde_path_to_error::deserialize(resource).map_err(|err| {
        let path = err.path().to_string();
        let source = err.into_inner();
        let path = if path.is_empty() {
            "<root>".to_string()
        } else {
            path
        };
        FhirError::Translation(format!(
            "{resource_type} schema mismatch at entry[{index}].resource.{path}: {source}"
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_bundle() -> Value {
        json!({
            "resourceType": "Bundle",
            "type": "searchset",
            "entry": [
                {
                    "resource": {
                        "resourceType": "Condition",
                        "id": "c1",
                        "code": {
                            "coding": [
                                {"system": "http://snomed.info/sct", "code": "197321007", "display": "Steatosis of liver"}
                            ]
                        }
                    }
                },
                {
                    "resource": {
                        "resourceType": "Patient",
                        "id": "p1"
                    }
                },
                {
                    "resource": {
                        "resourceType": "MedicationRequest",
                        "id": "m1",
                        "status": "draft",
                        "medicationCodeableConcept": {
                            "coding": [
                                {"system": "http://snomed.info/sct", "code": "1145423002", "display": "Atorvastatin 10 mg oral tablet"}
                            ]
                        }
                    }
                },
                {"fullUrl": "urn:uuid:no-resource"}
            ]
        })
    }

    #[test]
    fn selects_entries_by_resource_type() {
        let bundle = sample_bundle();
        let conditions = PrefetchBundle::conditions(&bundle).expect("conditions");
        assert_eq!(conditions.len(), 1);
        assert_eq!(conditions[0].id.as_deref(), Some("c1"));
        assert_eq!(conditions[0].codings[0].code, "197321007");

        let orders = PrefetchBundle::medication_requests(&bundle).expect("orders");
        assert_eq!(orders.len(), 1);
        assert_eq!(orders[0].codings[0].label(), "Atorvastatin 10 mg oral tablet");
        assert!(orders[0].dosage_instructions.is_empty());
    }

    #[test]
    fn empty_bundle_yields_nothing() {
        let bundle = json!({"resourceType": "Bundle"});
        assert!(PrefetchBundle::conditions(&bundle).expect("conditions").is_empty());
    }

    #[test]
    fn rejects_non_bundle() {
        let err = PrefetchBundle::conditions(&json!({"resourceType": "Patient"}))
            .expect_err("not a bundle");
        assert!(matches!(err, FhirError::InvalidInput(_)));
    }

    #[test]
    fn reports_path_of_schema_mismatch() {
        let bundle = json!({
            "resourceType": "Bundle",
            "entry": [
                {"resource": {"resourceType": "Condition", "code": {"coding": "not-a-list"}}}
            ]
        });
        let err = PrefetchBundle::conditions(&bundle).expect_err("bad coding");
        match err {
            FhirError::Translation(msg) => {
                assert!(msg.contains("entry[0]"), "{msg}");
                assert!(msg.contains("code.coding"), "{msg}");
            }
            other => panic!("expected Translation error, got {other:?}"),
        }
    }
}
