//! CDS Hooks services.
//!
//! Responsibilities:
//! - Describe each service for discovery (id, hook, prefetch templates)
//! - Check and parse the prefetch data a request carries
//! - Run interaction triggers and the dose engine and return their cards in order
//!
//! Notes:
//! - Services are built once at startup from loaded rule tables and are shared read-only.
//! - Every call allocates its own cards; nothing is written back into a service.

use crate::card::{Card, Indicator, Reference, Source};
use crate::constants::{
    MEDICATION_ORDER_SELECT_HOOK, MEDICATION_ORDER_SELECT_SERVICE_ID, PREFETCH_CONDITIONS,
    PREFETCH_DRAFT_MEDICATION_REQUESTS, PREFETCH_PATIENT,
};
use crate::dose::DoseSafetyEngine;
use crate::trigger::Trigger;
use crate::{CdsError, CdsResult};
use cds_types::{CodeSet, Coding};
use fhir::{ConditionData, MedicationRequestData, PrefetchBundle};
use serde::Deserialize;
use serde_json::Value;
use std::borrow::Cow;
use std::collections::{BTreeMap, HashMap};

/// Message returned when a medication request lacks prefetch data.
pub const MISSING_PREFETCH_MESSAGE: &str =
    "Request does not include required prefetch information: patient, diagnosis and medications.";

// ============================================================================
// Public domain-level types
// ============================================================================

/// A CDS Hooks service call.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CdsRequest {
    #[serde(default)]
    pub hook: Option<String>,
    #[serde(default)]
    pub hook_instance: Option<String>,
    #[serde(default)]
    pub context: HashMap<String, Value>,
    /// FHIR data keyed by prefetch template name. Values are resources, or resources encoded as
    /// JSON strings.
    #[serde(default)]
    pub prefetch: Option<HashMap<String, Value>>,
}

impl CdsRequest {
    /// Prefetch entry `key`, decoded when sent as a JSON string. `None` when absent or null.
    pub fn prefetch_value(&self, key: &str) -> CdsResult<Option<Cow<'_, Value>>> {
        match self.prefetch.as_ref().and_then(|p| p.get(key)) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::String(encoded)) => {
                let decoded: Value =
                    serde_json::from_str(encoded).map_err(fhir::FhirError::from)?;
                Ok(Some(Cow::Owned(decoded)))
            }
            Some(value) => Ok(Some(Cow::Borrowed(value))),
        }
    }
}

/// Discovery entry of a service.
#[derive(Clone, Debug, PartialEq)]
pub struct ServiceDescriptor {
    /// The `{id}` in `/cds-services/{id}`.
    pub id: String,
    pub hook: String,
    pub title: Option<String>,
    pub description: String,
    /// FHIR query per prefetch key.
    pub prefetch: BTreeMap<String, String>,
    pub usage_requirements: Option<String>,
}

/// A CDS service an EHR can call.
pub trait CdsService: Send + Sync {
    fn descriptor(&self) -> &ServiceDescriptor;

    /// Evaluates one request and returns its cards.
    fn call(&self, request: &CdsRequest) -> CdsResult<Vec<Card>>;
}

// ============================================================================
// medication-order-select
// ============================================================================

/// Checks draft medication orders against contraindication rules, interaction rules and
/// defined daily doses.
#[derive(Debug)]
pub struct MedicationOrderSelectService {
    descriptor: ServiceDescriptor,
    drug_condition: Vec<Trigger>,
    drug_drug: Vec<Trigger>,
    dose_engine: DoseSafetyEngine,
}

impl MedicationOrderSelectService {
    pub fn new(
        drug_condition: Vec<Trigger>,
        drug_drug: Vec<Trigger>,
        dose_engine: DoseSafetyEngine,
    ) -> Self {
        let prefetch = [
            (PREFETCH_PATIENT, "Patient/{{context.patientId}}"),
            (
                PREFETCH_CONDITIONS,
                "Condition?patient={{context.patientId}}&category=problem-list-item&status=active",
            ),
            (
                PREFETCH_DRAFT_MEDICATION_REQUESTS,
                "MedicationRequest?patient={{context.patientId}}&status=draft",
            ),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

        Self {
            descriptor: ServiceDescriptor {
                id: MEDICATION_ORDER_SELECT_SERVICE_ID.into(),
                hook: MEDICATION_ORDER_SELECT_HOOK.into(),
                title: Some("Medication order select".into()),
                description: "Contraindication, interaction and high dosage alerts for draft \
                              medication orders."
                    .into(),
                prefetch,
                usage_requirements: None,
            },
            drug_condition,
            drug_drug,
            dose_engine,
        }
    }

    /// Evaluates already parsed patient data. Cards come in the order drug-condition,
    /// drug-drug, dose.
    pub fn evaluate(
        &self,
        conditions: &[ConditionData],
        orders: &[MedicationRequestData],
    ) -> CdsResult<Vec<Card>> {
        let active: CodeSet = conditions
            .iter()
            .flat_map(|c| c.codings.iter().cloned())
            .collect();
        let draft: CodeSet = orders
            .iter()
            .flat_map(|o| o.codings.iter().cloned())
            .collect();

        let condition_codings: Vec<&[Coding]> =
            conditions.iter().map(|c| c.codings.as_slice()).collect();
        let order_codings: Vec<&[Coding]> = orders.iter().map(|o| o.codings.as_slice()).collect();

        let mut cards = Vec::new();
        for trigger in &self.drug_condition {
            if let Some(mut card) = trigger.create_relevant_card(&active, &draft) {
                enrich_references(&mut card.reference_medications, &order_codings);
                enrich_references(&mut card.reference_conditions, &condition_codings);
                cards.push(card);
            }
        }
        for trigger in &self.drug_drug {
            if let Some(mut card) = trigger.create_relevant_card(&draft, &draft) {
                enrich_references(&mut card.reference_medications, &order_codings);
                cards.push(card);
            }
        }
        cards.extend(self.dose_engine.check_medications(orders)?);

        tracing::debug!(
            "Evaluated {} conditions and {} draft orders into {} cards",
            conditions.len(),
            orders.len(),
            cards.len()
        );
        Ok(cards)
    }

    pub fn drug_condition_triggers(&self) -> &[Trigger] {
        &self.drug_condition
    }

    pub fn drug_drug_triggers(&self) -> &[Trigger] {
        &self.drug_drug
    }

    pub fn dose_engine(&self) -> &DoseSafetyEngine {
        &self.dose_engine
    }
}

impl CdsService for MedicationOrderSelectService {
    fn descriptor(&self) -> &ServiceDescriptor {
        &self.descriptor
    }

    fn call(&self, request: &CdsRequest) -> CdsResult<Vec<Card>> {
        let patient = request.prefetch_value(PREFETCH_PATIENT)?;
        let conditions = request.prefetch_value(PREFETCH_CONDITIONS)?;
        let orders = request.prefetch_value(PREFETCH_DRAFT_MEDICATION_REQUESTS)?;
        let (Some(_patient), Some(conditions), Some(orders)) = (patient, conditions, orders) else {
            return Err(CdsError::Precondition(MISSING_PREFETCH_MESSAGE.into()));
        };

        let conditions = PrefetchBundle::conditions(&conditions)?;
        let orders = PrefetchBundle::medication_requests(&orders)?;
        self.evaluate(&conditions, &orders)
    }
}

// ============================================================================
// hello-test
// ============================================================================

/// Always answers with one info card. Lets an EHR integration check connectivity.
#[derive(Debug)]
pub struct HelloService {
    descriptor: ServiceDescriptor,
}

impl HelloService {
    pub fn new() -> Self {
        Self {
            descriptor: ServiceDescriptor {
                id: "hello-test".into(),
                hook: "patient-view".into(),
                title: Some("Hello".into()),
                description: "Connectivity test service.".into(),
                prefetch: BTreeMap::new(),
                usage_requirements: None,
            },
        }
    }
}

impl Default for HelloService {
    fn default() -> Self {
        Self::new()
    }
}

impl CdsService for HelloService {
    fn descriptor(&self) -> &ServiceDescriptor {
        &self.descriptor
    }

    fn call(&self, _request: &CdsRequest) -> CdsResult<Vec<Card>> {
        let mut card = Card::new(
            "22e982b7-4786-4afe-9f67-5af8266363f6",
            "Hello! The CDS Service is working.",
            Some("This is an example card from the 'hello-test' CDS Service.".into()),
            Indicator::Info,
            Source::new("http://example.com", None),
        );
        card.alert_type = Some("Contraindication".into());
        Ok(vec![card])
    }
}

// ============================================================================
// Helper functions (internal)
// ============================================================================

/// Replaces each reference's coding with every coding of the first resource that carries it.
fn enrich_references(references: &mut [Reference], resources: &[&[Coding]]) {
    for reference in references {
        let Some(matched) = reference.primary() else {
            continue;
        };
        if let Some(codings) = resources.iter().find(|codings| codings.contains(matched)) {
            reference.coding = codings.to_vec();
        }
    }
}
