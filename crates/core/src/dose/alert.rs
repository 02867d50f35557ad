//! High-dosage alert cards.

use crate::card::{Card, Indicator, Source};
use crate::config::DoseThresholds;
use crate::constants::{DOSE_ALERT_SOURCE_LABEL, HIGH_DOSAGE_ALERT_TYPE};
use crate::dose::aggregation::AggregatedMedicationsBySubstance;
use crate::markdown::{trimmed_decimals, MarkdownService};
use md5::{Digest, Md5};
use uuid::Builder;

/// Card wording taken from configuration.
#[derive(Clone, Debug, PartialEq)]
pub struct AlertSettings {
    pub thresholds: DoseThresholds,
    /// `{{Substance}}` and `{{Factor}}` are substituted.
    pub card_summary_template: String,
    /// `{{AtcCode}}` is substituted.
    pub atc_url_template: String,
}

/// `warning` at or above the maximum factor, `info` at or above the acceptable one.
pub fn indicator_for(factor: f64, thresholds: DoseThresholds) -> Option<Indicator> {
    if factor >= thresholds.maximum() {
        Some(Indicator::Warning)
    } else if factor >= thresholds.acceptable() {
        Some(Indicator::Info)
    } else {
        None
    }
}

/// Deterministic card id derived from the substance display name.
///
/// Version 3 id over the MD5 of the raw name bytes, with no namespace prefix.
pub fn alert_uuid(substance_display: &str) -> String {
    let mut digest = [0u8; 16];
    digest.copy_from_slice(&Md5::digest(substance_display.as_bytes()));
    Builder::from_md5_bytes(digest).into_uuid().to_string()
}

/// Builds the alert for `substance`, or `None` when its factor stays below both thresholds.
pub fn dose_alert(
    substance: &AggregatedMedicationsBySubstance,
    settings: &AlertSettings,
) -> Option<Card> {
    let factor = substance.factor();
    let indicator = indicator_for(factor, settings.thresholds)?;

    let summary = settings
        .card_summary_template
        .replace("{{Substance}}", &substance.substance_display)
        .replace("{{Factor}}", &trimmed_decimals(factor));
    let detail = MarkdownService::new().dose_alert_detail(substance, factor);
    let url = substance
        .atc_code()
        .map(|atc| settings.atc_url_template.replace("{{AtcCode}}", atc));

    let mut card = Card::new(
        alert_uuid(&substance.substance_display),
        summary,
        Some(detail),
        indicator,
        Source::new(DOSE_ALERT_SOURCE_LABEL, url),
    );
    card.reference_medications = substance.references.clone();
    card.alert_type = Some(HIGH_DOSAGE_ALERT_TYPE.to_string());
    Some(card)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::{DEFAULT_ATC_URL_TEMPLATE, DEFAULT_CARD_SUMMARY_TEMPLATE};
    use crate::dose::aggregation::PrescribedDailyDose;
    use crate::dose::reference::SubstanceDefinedDailyDose;
    use cds_types::Coding;

    fn settings() -> AlertSettings {
        AlertSettings {
            thresholds: DoseThresholds::default(),
            card_summary_template: DEFAULT_CARD_SUMMARY_TEMPLATE.into(),
            atc_url_template: DEFAULT_ATC_URL_TEMPLATE.into(),
        }
    }

    fn paracetamol(total_grams: f64) -> AggregatedMedicationsBySubstance {
        let mut agg = AggregatedMedicationsBySubstance::new("387517004", "Paracetamol");
        agg.add_medication(
            "Paracetamol 500 mg oral tablet",
            &[Coding::with_display(
                "http://snomed.info/sct",
                "322236009",
                "Paracetamol 500 mg oral tablet",
            )],
        );
        agg.add_dose(
            "O",
            "oral",
            PrescribedDailyDose::new(total_grams, "g"),
            &SubstanceDefinedDailyDose {
                route: "O".into(),
                dose: 3.0,
                unit: "g".into(),
                atc_code: "N02BE01".into(),
            },
        )
        .expect("add dose");
        agg
    }

    #[test]
    fn thresholds_pick_the_indicator() {
        let t = DoseThresholds::default();
        assert_eq!(indicator_for(1.99, t), None);
        assert_eq!(indicator_for(2.0, t), Some(Indicator::Info));
        assert_eq!(indicator_for(3.99, t), Some(Indicator::Info));
        assert_eq!(indicator_for(4.0, t), Some(Indicator::Warning));
        assert_eq!(indicator_for(6.0, t), Some(Indicator::Warning));
    }

    #[test]
    fn warning_card_content() {
        let card = dose_alert(&paracetamol(18.0), &settings()).expect("card");
        assert_eq!(card.indicator, Indicator::Warning);
        assert_eq!(
            card.summary,
            "The amount of Paracetamol prescribed is 6 times the average daily dose."
        );
        assert_eq!(card.source.label, "WHO ATC DDD");
        assert_eq!(
            card.source.url.as_deref(),
            Some("https://www.whocc.no/atc_ddd_index/?code=N02BE01")
        );
        assert_eq!(card.alert_type.as_deref(), Some("High Dosage"));
        assert_eq!(card.reference_medications.len(), 1);
        assert!(card
            .detail
            .as_deref()
            .is_some_and(|d| d.ends_with("Combined prescribed amount is 6.00 times the average daily dose.")));
    }

    #[test]
    fn below_threshold_has_no_card() {
        assert!(dose_alert(&paracetamol(3.0), &settings()).is_none());
    }

    #[test]
    fn uuid_is_name_based_over_the_substance_display() {
        assert_eq!(
            alert_uuid("Paracetamol"),
            "875e75a1-7cb2-39ab-996e-d50332ed9dc3"
        );
        let card = dose_alert(&paracetamol(18.0), &settings()).expect("card");
        assert_eq!(card.uuid, "875e75a1-7cb2-39ab-996e-d50332ed9dc3");
    }

    #[test]
    fn uuid_is_stable_per_substance() {
        assert_eq!(alert_uuid("Paracetamol"), alert_uuid("Paracetamol"));
        assert_ne!(alert_uuid("Paracetamol"), alert_uuid("Ibuprofen"));
        let a = dose_alert(&paracetamol(18.0), &settings()).expect("card");
        let b = dose_alert(&paracetamol(7.5), &settings()).expect("card");
        assert_eq!(a.uuid, b.uuid);
    }
}
