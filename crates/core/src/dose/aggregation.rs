//! Per-request accumulators for the dose engine.
//!
//! Orders are folded into one [`AggregatedMedicationsBySubstance`] per active substance, each
//! holding one [`DosageComparisonByRoute`] per route of administration. Everything here is built
//! fresh for every evaluation and dropped with the response.

use crate::card::Reference;
use crate::dose::reference::SubstanceDefinedDailyDose;
use crate::{CdsError, CdsResult};
use cds_types::Coding;

// ============================================================================
// Prescribed doses
// ============================================================================

/// A daily quantity in a single unit.
#[derive(Clone, Debug, PartialEq)]
pub struct PrescribedDailyDose {
    pub quantity: f64,
    pub unit: String,
}

impl PrescribedDailyDose {
    pub fn new(quantity: f64, unit: impl Into<String>) -> Self {
        Self {
            quantity,
            unit: unit.into(),
        }
    }

    /// Adds `other` to this dose.
    ///
    /// # Errors
    ///
    /// Returns `CdsError::UnitMismatch` if the units differ; the quantity is left unchanged.
    pub fn add(&mut self, other: &PrescribedDailyDose) -> CdsResult<()> {
        if self.unit != other.unit {
            return Err(CdsError::UnitMismatch {
                left: self.unit.clone(),
                right: other.unit.clone(),
            });
        }
        self.quantity += other.quantity;
        Ok(())
    }
}

/// Total prescribed dose of one substance by one route, next to its defined daily dose.
#[derive(Clone, Debug, PartialEq)]
pub struct DosageComparisonByRoute {
    pub route_code: String,
    /// Capitalised route label shown on the card.
    pub route_label: String,
    pub total: PrescribedDailyDose,
    pub reference: SubstanceDefinedDailyDose,
}

impl DosageComparisonByRoute {
    /// How many defined daily doses the total amounts to.
    pub fn factor(&self) -> f64 {
        self.total.quantity / self.reference.dose
    }
}

// ============================================================================
// Per-substance aggregation
// ============================================================================

/// Everything the request prescribes of one substance.
#[derive(Clone, Debug, PartialEq)]
pub struct AggregatedMedicationsBySubstance {
    pub substance_code: String,
    pub substance_display: String,
    /// Labels of the contributing medications, first-seen order, no duplicates.
    pub medications: Vec<String>,
    /// One reference per entry of `medications`, carrying the order's full coding list.
    pub references: Vec<Reference>,
    pub routes: Vec<DosageComparisonByRoute>,
}

impl AggregatedMedicationsBySubstance {
    pub fn new(substance_code: impl Into<String>, substance_display: impl Into<String>) -> Self {
        Self {
            substance_code: substance_code.into(),
            substance_display: substance_display.into(),
            medications: Vec::new(),
            references: Vec::new(),
            routes: Vec::new(),
        }
    }

    /// Records a contributing medication. A label already present is ignored, along with its
    /// codings.
    pub fn add_medication(&mut self, label: &str, codings: &[Coding]) {
        if self.medications.iter().any(|m| m == label) {
            return;
        }
        self.medications.push(label.to_string());
        self.references.push(Reference {
            coding: codings.to_vec(),
        });
    }

    /// Adds a daily dose (already in the unit of `reference`) to the total for its route.
    pub fn add_dose(
        &mut self,
        route_code: &str,
        route_label: &str,
        dose: PrescribedDailyDose,
        reference: &SubstanceDefinedDailyDose,
    ) -> CdsResult<()> {
        match self.routes.iter_mut().find(|r| r.route_code == route_code) {
            Some(existing) => existing.total.add(&dose),
            None => {
                self.routes.push(DosageComparisonByRoute {
                    route_code: route_code.to_string(),
                    route_label: capitalize(route_label.trim()),
                    total: dose,
                    reference: reference.clone(),
                });
                Ok(())
            }
        }
    }

    /// Sum of the per-route factors.
    pub fn factor(&self) -> f64 {
        self.routes.iter().map(DosageComparisonByRoute::factor).sum()
    }

    /// ATC code of the first route recorded.
    pub fn atc_code(&self) -> Option<&str> {
        self.routes.first().map(|r| r.reference.atc_code.as_str())
    }
}

/// Substances in the order they were first met.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SubstanceAggregation {
    substances: Vec<AggregatedMedicationsBySubstance>,
}

impl SubstanceAggregation {
    pub fn new() -> Self {
        Self::default()
    }

    /// The aggregate for `substance_code`, created with the display returned by `display` when
    /// the substance is met for the first time.
    pub fn get_or_try_insert_with<F>(
        &mut self,
        substance_code: &str,
        display: F,
    ) -> CdsResult<&mut AggregatedMedicationsBySubstance>
    where
        F: FnOnce() -> CdsResult<String>,
    {
        let index = match self
            .substances
            .iter()
            .position(|s| s.substance_code == substance_code)
        {
            Some(index) => index,
            None => {
                self.substances.push(AggregatedMedicationsBySubstance::new(
                    substance_code,
                    display()?,
                ));
                self.substances.len() - 1
            }
        };
        Ok(&mut self.substances[index])
    }

    pub fn iter(&self) -> impl Iterator<Item = &AggregatedMedicationsBySubstance> {
        self.substances.iter()
    }

    pub fn len(&self) -> usize {
        self.substances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.substances.is_empty()
    }
}

// ============================================================================
// Helper functions (internal)
// ============================================================================

fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCT: &str = "http://snomed.info/sct";

    fn paracetamol_oral() -> SubstanceDefinedDailyDose {
        SubstanceDefinedDailyDose {
            route: "O".into(),
            dose: 3.0,
            unit: "g".into(),
            atc_code: "N02BE01".into(),
        }
    }

    #[test]
    fn adding_doses_requires_the_same_unit() {
        let mut total = PrescribedDailyDose::new(1.5, "g");
        total.add(&PrescribedDailyDose::new(2.0, "g")).expect("same unit");
        assert_eq!(total.quantity, 3.5);

        let err = total
            .add(&PrescribedDailyDose::new(500.0, "mg"))
            .expect_err("unit mismatch");
        match err {
            CdsError::UnitMismatch { left, right } => {
                assert_eq!(left, "g");
                assert_eq!(right, "mg");
            }
            other => panic!("expected UnitMismatch, got {other:?}"),
        }
        assert_eq!(total.quantity, 3.5);
    }

    #[test]
    fn routes_accumulate_and_factors_sum() {
        let mut agg = AggregatedMedicationsBySubstance::new("387517004", "Paracetamol");
        let oral = paracetamol_oral();
        let rectal = SubstanceDefinedDailyDose {
            route: "R".into(),
            ..paracetamol_oral()
        };

        agg.add_dose("O", " oral", PrescribedDailyDose::new(6.0, "g"), &oral)
            .expect("add");
        agg.add_dose("O", "oral", PrescribedDailyDose::new(3.0, "g"), &oral)
            .expect("add");
        agg.add_dose("R", "rectal", PrescribedDailyDose::new(3.0, "g"), &rectal)
            .expect("add");

        assert_eq!(agg.routes.len(), 2);
        assert_eq!(agg.routes[0].route_label, "Oral");
        assert_eq!(agg.routes[0].total.quantity, 9.0);
        assert_eq!(agg.routes[0].factor(), 3.0);
        assert_eq!(agg.factor(), 4.0);
        assert_eq!(agg.atc_code(), Some("N02BE01"));
    }

    #[test]
    fn medications_are_deduplicated_by_label() {
        let mut agg = AggregatedMedicationsBySubstance::new("387517004", "Paracetamol");
        let first = [Coding::with_display(SCT, "322236009", "Paracetamol 500 mg oral tablet")];
        agg.add_medication("Paracetamol 500 mg oral tablet", &first);
        agg.add_medication(
            "Paracetamol 500 mg oral tablet",
            &[Coding::new("urn:local", "para")],
        );
        assert_eq!(agg.medications.len(), 1);
        assert_eq!(agg.references.len(), 1);
        assert_eq!(
            agg.references[0].coding[0].display.as_deref(),
            Some("Paracetamol 500 mg oral tablet")
        );
    }

    #[test]
    fn substances_keep_first_seen_order() {
        let mut all = SubstanceAggregation::new();
        all.get_or_try_insert_with("2", || Ok("B".into())).expect("insert");
        all.get_or_try_insert_with("1", || Ok("A".into())).expect("insert");
        let existing = all
            .get_or_try_insert_with("2", || panic!("display looked up twice"))
            .expect("existing");
        assert_eq!(existing.substance_display, "B");
        assert_eq!(all.len(), 2);
        let order: Vec<_> = all.iter().map(|s| s.substance_display.as_str()).collect();
        assert_eq!(order, vec!["B", "A"]);
    }

    #[test]
    fn failed_display_lookup_adds_nothing() {
        let mut all = SubstanceAggregation::new();
        let err = all
            .get_or_try_insert_with("1", || Err(CdsError::Precondition("down".into())))
            .expect_err("lookup failed");
        assert!(matches!(err, CdsError::Precondition(_)));
        assert!(all.is_empty());
    }

    #[test]
    fn capitalize_handles_empty_and_unicode() {
        assert_eq!(capitalize(""), "");
        assert_eq!(capitalize("oral"), "Oral");
        assert_eq!(capitalize("écrit"), "Écrit");
    }
}
