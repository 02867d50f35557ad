//! Dose safety engine.
//!
//! Responsibilities:
//! - Turn each draft order's dosage instruction into a prescribed daily dose
//! - Resolve the order's SNOMED CT product to its substances, strengths and route
//! - Convert daily doses into the unit of the substance's defined daily dose and add them up
//! - Raise one alert card per substance whose combined factor crosses a threshold
//!
//! Notes:
//! - Orders without a SNOMED CT coding, normal form, dose form or mapped route are skipped.
//! - A substance without a defined daily dose for the route is skipped; the other substances of
//!   the same product are still checked.

use crate::card::Card;
use crate::constants::{
    ATTRIBUTE_BASIS_OF_STRENGTH_SUBSTANCE, ATTRIBUTE_CONCENTRATION_DENOMINATOR_UNIT,
    ATTRIBUTE_CONCENTRATION_DENOMINATOR_VALUE, ATTRIBUTE_CONCENTRATION_NUMERATOR_UNIT,
    ATTRIBUTE_CONCENTRATION_NUMERATOR_VALUE, ATTRIBUTE_MANUFACTURED_DOSE_FORM,
    ATTRIBUTE_PRESENTATION_DENOMINATOR_UNIT, ATTRIBUTE_PRESENTATION_DENOMINATOR_VALUE,
    ATTRIBUTE_PRESENTATION_NUMERATOR_UNIT, ATTRIBUTE_PRESENTATION_NUMERATOR_VALUE, SNOMED_SYSTEM,
};
use crate::dose::aggregation::{PrescribedDailyDose, SubstanceAggregation};
use crate::dose::alert::{dose_alert, AlertSettings};
use crate::dose::frequency::times_per_day_for;
use crate::dose::reference::{
    DefinedDailyDoses, DoseFormMap, ManyToOneMapEntry, SubstanceDefinedDailyDose,
};
use crate::dose::units::factor_of_conversion;
use crate::validation::{expect_count, expect_present};
use crate::{CdsError, CdsResult};
use fhir::MedicationRequestData;
use std::sync::Arc;
use terminology::{AttributeMap, NormalForm, TerminologyResolver};

/// Checks draft orders against WHO defined daily doses.
pub struct DoseSafetyEngine {
    dose_forms: DoseFormMap,
    ddds: DefinedDailyDoses,
    terminology: Arc<dyn TerminologyResolver>,
    settings: AlertSettings,
}

impl std::fmt::Debug for DoseSafetyEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DoseSafetyEngine")
            .field("dose_forms", &self.dose_forms.len())
            .field("substances", &self.ddds.substance_count())
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

impl DoseSafetyEngine {
    pub fn new(
        dose_forms: DoseFormMap,
        ddds: DefinedDailyDoses,
        terminology: Arc<dyn TerminologyResolver>,
        settings: AlertSettings,
    ) -> Self {
        Self {
            dose_forms,
            ddds,
            terminology,
            settings,
        }
    }

    pub fn dose_forms(&self) -> &DoseFormMap {
        &self.dose_forms
    }

    pub fn defined_daily_doses(&self) -> &DefinedDailyDoses {
        &self.ddds
    }

    /// Aggregates the orders by substance and returns one card per substance over a threshold,
    /// in the order the substances were first met.
    ///
    /// # Errors
    ///
    /// - `CdsError::Precondition` if an order does not carry exactly one dosage instruction with
    ///   exactly one dose quantity, or if its dose unit cannot be converted
    /// - `CdsError::Terminology` if the terminology server fails
    pub fn check_medications(&self, orders: &[MedicationRequestData]) -> CdsResult<Vec<Card>> {
        let mut aggregation = SubstanceAggregation::new();

        for order in orders {
            let daily = prescribed_daily_dose(order)?;
            tracing::debug!(
                "Medication quantity per day {} {}",
                daily.quantity,
                daily.unit
            );

            let Some(medication) = order.coding_in(SNOMED_SYSTEM) else {
                tracing::debug!("Medication request has no SNOMED CT coding, ignoring.");
                continue;
            };
            let Some(normal_form) = self.normal_form_of(&medication.code)? else {
                continue;
            };
            let Some(dose_form) = normal_form.attribute(ATTRIBUTE_MANUFACTURED_DOSE_FORM) else {
                tracing::info!(
                    "SNOMED drug {} has no manufactured dose form, skipping.",
                    medication.code
                );
                continue;
            };
            let Some(route) = self.dose_forms.route_for(dose_form) else {
                tracing::info!(
                    "SNOMED dose form {} is not covered by the route of administration map, skipping",
                    dose_form
                );
                continue;
            };

            self.aggregate(
                &mut aggregation,
                order,
                medication.label(),
                &daily,
                route,
                &normal_form,
            )?;
        }

        Ok(aggregation
            .iter()
            .filter_map(|substance| dose_alert(substance, &self.settings))
            .collect())
    }

    fn aggregate(
        &self,
        aggregation: &mut SubstanceAggregation,
        order: &MedicationRequestData,
        label: &str,
        daily: &PrescribedDailyDose,
        route: &ManyToOneMapEntry,
        normal_form: &NormalForm,
    ) -> CdsResult<()> {
        for group in &normal_form.attribute_groups {
            let Some(substance) = group.get(ATTRIBUTE_BASIS_OF_STRENGTH_SUBSTANCE) else {
                continue;
            };
            let Some(ddd) = self.ddds.for_route(substance, &route.target_code) else {
                tracing::debug!(
                    "No DDD found for substance {} and route of administration {}",
                    substance,
                    route.target_code
                );
                continue;
            };

            let dose = self.in_unit_of_ddd(daily, group, ddd)?.ok_or_else(|| {
                CdsError::Precondition(format!(
                    "Prescribed dosage could not be validated for {label}. Reason: Invalid dose unit."
                ))
            })?;

            let entry =
                aggregation.get_or_try_insert_with(substance, || self.display_of(substance))?;
            entry.add_medication(label, &order.codings);
            entry.add_dose(&route.target_code, route.display(), dose, ddd)?;
        }
        Ok(())
    }

    /// Converts a daily dose of the product into a daily amount of the substance in the unit of
    /// its defined daily dose. `None` when the strength or a unit cannot be resolved.
    fn in_unit_of_ddd(
        &self,
        daily: &PrescribedDailyDose,
        group: &AttributeMap,
        ddd: &SubstanceDefinedDailyDose,
    ) -> CdsResult<Option<PrescribedDailyDose>> {
        let Some(strength) = Strength::from_group(group) else {
            return Ok(None);
        };
        let Some(strength_unit) = self.unit_display(strength.unit)? else {
            return Ok(None);
        };
        let Some(denominator_unit) = self.unit_display(strength.denominator_unit)? else {
            return Ok(None);
        };

        let (Some(to_denominator), Some(to_ddd)) = (
            factor_of_conversion(&daily.unit, &denominator_unit),
            factor_of_conversion(&strength_unit, &ddd.unit),
        ) else {
            return Ok(None);
        };

        let in_strength_unit =
            daily.quantity * strength.value / strength.denominator_value * to_denominator;
        Ok(Some(PrescribedDailyDose::new(
            in_strength_unit * to_ddd,
            ddd.unit.clone(),
        )))
    }

    /// Normal form of a product, or `None` when the server does not know it or has none.
    fn normal_form_of(&self, code: &str) -> CdsResult<Option<NormalForm>> {
        match self.terminology.lookup(SNOMED_SYSTEM, code) {
            Ok(details) => {
                if details.normal_form.is_none() {
                    tracing::info!("No normal form found for SNOMED code {}, skipping.", code);
                }
                Ok(details.normal_form)
            }
            Err(err) if err.is_not_found() => {
                tracing::debug!("No SNOMED concept found for code {}, ignoring.", code);
                Ok(None)
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Display text of a unit concept, e.g. `mg` for 258684004.
    fn unit_display(&self, code: &str) -> CdsResult<Option<String>> {
        match self.terminology.lookup(SNOMED_SYSTEM, code) {
            Ok(details) => Ok(details.display),
            Err(err) if err.is_not_found() => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    /// Display text of a substance, falling back to its code.
    fn display_of(&self, code: &str) -> CdsResult<String> {
        match self.terminology.lookup(SNOMED_SYSTEM, code) {
            Ok(details) => Ok(details.display.unwrap_or_else(|| code.to_string())),
            Err(err) if err.is_not_found() => Ok(code.to_string()),
            Err(err) => Err(err.into()),
        }
    }
}

/// Daily amount of the product prescribed by an order, in the unit of its dose quantity.
///
/// # Errors
///
/// Returns `CdsError::Precondition` unless the order has exactly one dosage instruction with
/// exactly one `doseAndRate` entry carrying a `doseQuantity`.
pub fn prescribed_daily_dose(order: &MedicationRequestData) -> CdsResult<PrescribedDailyDose> {
    expect_count(
        1,
        order.dosage_instructions.len(),
        "Medication Request dosageInstruction",
    )?;
    let dosage = &order.dosage_instructions[0];
    expect_count(1, dosage.dose_and_rate.len(), "Medication Request doseAndRate")?;
    let quantity = expect_present(
        dosage.dose_and_rate[0].dose_quantity.as_ref(),
        "Medication Request doseQuantity",
    )?;

    Ok(PrescribedDailyDose::new(
        quantity.value * times_per_day_for(dosage.repeat.as_ref()),
        quantity.unit.clone(),
    ))
}

// ============================================================================
// Helper types (internal)
// ============================================================================

/// Amount of substance per amount of product, from one attribute group.
struct Strength<'a> {
    value: f64,
    unit: &'a str,
    denominator_value: f64,
    denominator_unit: &'a str,
}

impl<'a> Strength<'a> {
    /// Presentation strength when present, otherwise concentration strength.
    fn from_group(group: &'a AttributeMap) -> Option<Self> {
        let [value, unit, denominator_value, denominator_unit] =
            if group.contains_key(ATTRIBUTE_PRESENTATION_NUMERATOR_VALUE) {
                [
                    ATTRIBUTE_PRESENTATION_NUMERATOR_VALUE,
                    ATTRIBUTE_PRESENTATION_NUMERATOR_UNIT,
                    ATTRIBUTE_PRESENTATION_DENOMINATOR_VALUE,
                    ATTRIBUTE_PRESENTATION_DENOMINATOR_UNIT,
                ]
            } else {
                [
                    ATTRIBUTE_CONCENTRATION_NUMERATOR_VALUE,
                    ATTRIBUTE_CONCENTRATION_NUMERATOR_UNIT,
                    ATTRIBUTE_CONCENTRATION_DENOMINATOR_VALUE,
                    ATTRIBUTE_CONCENTRATION_DENOMINATOR_UNIT,
                ]
            };

        let denominator_value = group.get(denominator_value)?.parse::<f64>().ok()?;
        if denominator_value == 0.0 {
            return None;
        }
        Some(Self {
            value: group.get(value)?.parse().ok()?,
            unit: group.get(unit)?,
            denominator_value,
            denominator_unit: group.get(denominator_unit)?,
        })
    }
}
