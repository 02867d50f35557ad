//! Interaction rules and the cards they produce.
//!
//! A [`Trigger`] pairs two rule sides with a template card. It fires when the draft medication
//! codings hit the primary side and the active codings hit the secondary side. The
//! [`TriggerKind`] decides which placeholders the template uses and where the secondary hit is
//! referenced.

use crate::card::{append_references, Card};
use cds_types::CodeSet;

/// The kind of interaction a trigger encodes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TriggerKind {
    /// Medication contraindicated by a condition. Placeholders: `{{RuleMedication}}`,
    /// `{{ActualMedication}}`, `{{RuleCondition}}`, `{{ActualCondition}}`.
    DrugCondition,
    /// Two interacting medications. Placeholders: `{{RuleMedication1}}`, `{{ActualMedication1}}`,
    /// `{{RuleMedication2}}`, `{{ActualMedication2}}`.
    DrugDrug,
}

impl TriggerKind {
    /// Placeholder names as `(rule primary, actual primary, rule secondary, actual secondary)`.
    fn placeholders(self) -> [&'static str; 4] {
        match self {
            TriggerKind::DrugCondition => [
                "{{RuleMedication}}",
                "{{ActualMedication}}",
                "{{RuleCondition}}",
                "{{ActualCondition}}",
            ],
            TriggerKind::DrugDrug => [
                "{{RuleMedication1}}",
                "{{ActualMedication1}}",
                "{{RuleMedication2}}",
                "{{ActualMedication2}}",
            ],
        }
    }
}

/// One side of a rule: the label authored in the rule table and its expanded codings.
#[derive(Clone, Debug, PartialEq)]
pub struct RuleSide {
    pub label: String,
    pub codings: CodeSet,
}

impl RuleSide {
    pub fn new(label: impl Into<String>, codings: CodeSet) -> Self {
        Self {
            label: label.into(),
            codings,
        }
    }
}

/// An immutable interaction rule.
#[derive(Clone, Debug, PartialEq)]
pub struct Trigger {
    kind: TriggerKind,
    primary: RuleSide,
    secondary: RuleSide,
    card: Card,
}

impl Trigger {
    pub fn drug_condition(medication: RuleSide, condition: RuleSide, card: Card) -> Self {
        Self {
            kind: TriggerKind::DrugCondition,
            primary: medication,
            secondary: condition,
            card,
        }
    }

    pub fn drug_drug(medication1: RuleSide, medication2: RuleSide, card: Card) -> Self {
        Self {
            kind: TriggerKind::DrugDrug,
            primary: medication1,
            secondary: medication2,
            card,
        }
    }

    pub fn kind(&self) -> TriggerKind {
        self.kind
    }

    pub fn primary(&self) -> &RuleSide {
        &self.primary
    }

    pub fn secondary(&self) -> &RuleSide {
        &self.secondary
    }

    /// The template card as loaded.
    pub fn card(&self) -> &Card {
        &self.card
    }

    /// Matches the trigger against patient data.
    ///
    /// `active` holds the codings matched against the secondary side (active conditions for
    /// drug-condition rules, draft medications for drug-drug rules). `draft` holds the draft
    /// medication codings matched against the primary side.
    ///
    /// Returns `None` unless both sides hit. The returned card is a fresh value; the template is
    /// never modified.
    pub fn create_relevant_card(&self, active: &CodeSet, draft: &CodeSet) -> Option<Card> {
        let secondary_hit = active.intersection(&self.secondary.codings);
        let primary_hit = draft.intersection(&self.primary.codings);
        if secondary_hit.is_empty() || primary_hit.is_empty() {
            return None;
        }

        let mut reference_medications = Vec::new();
        let mut reference_conditions = Vec::new();
        append_references(&mut reference_medications, &primary_hit);
        match self.kind {
            TriggerKind::DrugCondition => {
                append_references(&mut reference_conditions, &secondary_hit)
            }
            TriggerKind::DrugDrug => append_references(&mut reference_medications, &secondary_hit),
        }

        Some(Card {
            uuid: self.card.uuid.clone(),
            summary: self.substitute(&self.card.summary, &primary_hit, &secondary_hit),
            detail: self
                .card
                .detail
                .as_deref()
                .map(|detail| self.substitute(detail, &primary_hit, &secondary_hit)),
            indicator: self.card.indicator,
            source: self.card.source.clone(),
            reference_medications,
            reference_conditions,
            alert_type: self.card.alert_type.clone(),
        })
    }

    fn substitute(&self, text: &str, primary_hit: &CodeSet, secondary_hit: &CodeSet) -> String {
        let [rule_primary, actual_primary, rule_secondary, actual_secondary] =
            self.kind.placeholders();
        text.replace(rule_primary, &self.primary.label)
            .replace(actual_primary, &render_human(primary_hit))
            .replace(rule_secondary, &self.secondary.label)
            .replace(actual_secondary, &render_human(secondary_hit))
    }
}

/// Renders codings as quoted display texts joined with ` and `.
///
/// Display texts are deduplicated in first-seen order. A coding without display renders its
/// code.
pub fn render_human(codings: &CodeSet) -> String {
    let mut labels: Vec<&str> = Vec::new();
    for coding in codings {
        let label = coding.label();
        if !labels.contains(&label) {
            labels.push(label);
        }
    }
    labels
        .iter()
        .map(|label| format!("\"{label}\""))
        .collect::<Vec<_>>()
        .join(" and ")
}
