//! FHIR `MedicationRequest` wire model and translation.
//!
//! Responsibilities:
//! - Read `medicationCodeableConcept.coding` for rule matching
//! - Read `dosageInstruction[]` with `doseAndRate[].doseQuantity` and `timing.repeat` for dose
//!   checking
//!
//! Notes:
//! - Cardinality is preserved as received. Whether an order has exactly one instruction is a
//!   question for the dose engine, not for parsing.

use crate::datatypes::CodeableConceptWire;
use cds_types::Coding;
use serde::Deserialize;

// ============================================================================
// Public domain-level types
// ============================================================================

/// Domain-level carrier for a draft medication order.
#[derive(Clone, Debug, PartialEq)]
pub struct MedicationRequestData {
    /// Resource id, when present.
    pub id: Option<String>,

    /// Every coding of `medicationCodeableConcept`, in document order.
    pub codings: Vec<Coding>,

    pub dosage_instructions: Vec<DosageInstruction>,
}

impl MedicationRequestData {
    /// First coding from the given code system.
    pub fn coding_in(&self, system: &str) -> Option<&Coding> {
        self.codings.iter().find(|c| c.system == system)
    }
}

/// One `Dosage` entry.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DosageInstruction {
    pub dose_and_rate: Vec<DoseAndRate>,
    pub repeat: Option<TimingRepeat>,
}

/// One `Dosage.doseAndRate` entry.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DoseAndRate {
    /// `None` when the entry carries a range or rate instead of a simple quantity.
    pub dose_quantity: Option<Quantity>,
}

/// A measured amount. The unit is the human-readable `unit`, falling back to `code`.
#[derive(Clone, Debug, PartialEq)]
pub struct Quantity {
    pub value: f64,
    pub unit: String,
}

/// `Timing.repeat`: `frequency` times per `period` `period_unit`.
#[derive(Clone, Debug, PartialEq)]
pub struct TimingRepeat {
    pub frequency: u32,
    pub period: Option<f64>,
    pub period_unit: Option<PeriodUnit>,
}

/// FHIR `UnitsOfTime`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
pub enum PeriodUnit {
    #[serde(rename = "s")]
    Second,
    #[serde(rename = "min")]
    Minute,
    #[serde(rename = "h")]
    Hour,
    #[serde(rename = "d")]
    Day,
    #[serde(rename = "wk")]
    Week,
    #[serde(rename = "mo")]
    Month,
    #[serde(rename = "a")]
    Year,
}

impl PeriodUnit {
    pub fn code(self) -> &'static str {
        match self {
            PeriodUnit::Second => "s",
            PeriodUnit::Minute => "min",
            PeriodUnit::Hour => "h",
            PeriodUnit::Day => "d",
            PeriodUnit::Week => "wk",
            PeriodUnit::Month => "mo",
            PeriodUnit::Year => "a",
        }
    }
}

// ============================================================================
// Wire types (internal)
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct MedicationRequestWire {
    id: Option<String>,
    #[serde(default)]
    medication_codeable_concept: CodeableConceptWire,
    #[serde(default)]
    dosage_instruction: Vec<DosageWire>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DosageWire {
    #[serde(default)]
    dose_and_rate: Vec<DoseAndRateWire>,
    timing: Option<TimingWire>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DoseAndRateWire {
    dose_quantity: Option<QuantityWire>,
}

#[derive(Debug, Deserialize)]
struct QuantityWire {
    value: Option<f64>,
    unit: Option<String>,
    code: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TimingWire {
    repeat: Option<RepeatWire>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RepeatWire {
    frequency: Option<u32>,
    period: Option<f64>,
    period_unit: Option<PeriodUnit>,
}

// ============================================================================
// Helper functions (internal)
// ============================================================================

pub(crate) fn wire_to_domain(wire: MedicationRequestWire) -> MedicationRequestData {
    MedicationRequestData {
        id: wire.id,
        codings: wire.medication_codeable_concept.into_codings(),
        dosage_instructions: wire
            .dosage_instruction
            .into_iter()
            .map(dosage_to_domain)
            .collect(),
    }
}

fn dosage_to_domain(wire: DosageWire) -> DosageInstruction {
    DosageInstruction {
        dose_and_rate: wire
            .dose_and_rate
            .into_iter()
            .map(|d| DoseAndRate {
                dose_quantity: d.dose_quantity.and_then(quantity_to_domain),
            })
            .collect(),
        repeat: wire.timing.and_then(|t| t.repeat).map(|r| TimingRepeat {
            frequency: r.frequency.unwrap_or(1),
            period: r.period,
            period_unit: r.period_unit,
        }),
    }
}

fn quantity_to_domain(wire: QuantityWire) -> Option<Quantity> {
    Some(Quantity {
        value: wire.value?,
        unit: wire.unit.or(wire.code)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parse(value: serde_json::Value) -> MedicationRequestData {
        let wire: MedicationRequestWire = serde_json::from_value(value).expect("medication request");
        wire_to_domain(wire)
    }

    #[test]
    fn reads_dose_and_timing() {
        let order = parse(json!({
            "resourceType": "MedicationRequest",
            "id": "m1",
            "status": "draft",
            "intent": "order",
            "medicationCodeableConcept": {
                "coding": [
                    {"system": "http://snomed.info/sct", "code": "322236009", "display": "Paracetamol 500 mg oral tablet"}
                ]
            },
            "dosageInstruction": [{
                "text": "1 tablet every 8 hours",
                "timing": {"repeat": {"frequency": 1, "period": 8, "periodUnit": "h"}},
                "doseAndRate": [{"doseQuantity": {"value": 10, "unit": "mg", "system": "http://unitsofmeasure.org", "code": "mg"}}]
            }]
        }));

        assert_eq!(order.id.as_deref(), Some("m1"));
        let dosage = &order.dosage_instructions[0];
        let quantity = dosage.dose_and_rate[0].dose_quantity.as_ref().expect("quantity");
        assert_eq!(quantity.value, 10.0);
        assert_eq!(quantity.unit, "mg");
        let repeat = dosage.repeat.as_ref().expect("repeat");
        assert_eq!(repeat.frequency, 1);
        assert_eq!(repeat.period, Some(8.0));
        assert_eq!(repeat.period_unit, Some(PeriodUnit::Hour));
        assert_eq!(
            order.coding_in("http://snomed.info/sct").map(|c| c.code.as_str()),
            Some("322236009")
        );
    }

    #[test]
    fn missing_frequency_defaults_to_one() {
        let order = parse(json!({
            "resourceType": "MedicationRequest",
            "dosageInstruction": [{"timing": {"repeat": {"period": 1, "periodUnit": "d"}}}]
        }));
        let repeat = order.dosage_instructions[0].repeat.as_ref().expect("repeat");
        assert_eq!(repeat.frequency, 1);
        assert_eq!(repeat.period_unit.map(PeriodUnit::code), Some("d"));
    }

    #[test]
    fn quantity_unit_falls_back_to_code() {
        let order = parse(json!({
            "resourceType": "MedicationRequest",
            "dosageInstruction": [{"doseAndRate": [
                {"doseQuantity": {"value": 2, "code": "Tablet"}},
                {"doseRange": {"low": {"value": 1}}}
            ]}]
        }));
        let entries = &order.dosage_instructions[0].dose_and_rate;
        assert_eq!(entries.len(), 2);
        assert_eq!(
            entries[0].dose_quantity.as_ref().map(|q| q.unit.as_str()),
            Some("Tablet")
        );
        assert!(entries[1].dose_quantity.is_none());
    }

    #[test]
    fn rejects_unknown_period_unit() {
        let result: Result<MedicationRequestWire, _> = serde_json::from_value(json!({
            "dosageInstruction": [{"timing": {"repeat": {"periodUnit": "fortnight"}}}]
        }));
        assert!(result.is_err());
    }
}
