//! CDS Hooks card model shared by the interaction and dose engines.

use cds_types::Coding;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Urgency of a card.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Indicator {
    Info,
    Warning,
    Critical,
}

impl Indicator {
    pub fn as_str(self) -> &'static str {
        match self {
            Indicator::Info => "info",
            Indicator::Warning => "warning",
            Indicator::Critical => "critical",
        }
    }
}

impl fmt::Display for Indicator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a rule table names an indicator outside `info`, `warning`, `critical`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid card indicator '{0}', expected one of info, warning, critical")]
pub struct InvalidIndicator(pub String);

impl FromStr for Indicator {
    type Err = InvalidIndicator;

    /// Case-insensitive; surrounding whitespace is ignored.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "info" => Ok(Indicator::Info),
            "warning" => Ok(Indicator::Warning),
            "critical" => Ok(Indicator::Critical),
            _ => Err(InvalidIndicator(s.to_string())),
        }
    }
}

/// Where the advice on a card comes from.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Source {
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topic: Option<Coding>,
}

impl Source {
    pub fn new(label: impl Into<String>, url: Option<String>) -> Self {
        Self {
            label: label.into(),
            url,
            topic: None,
        }
    }
}

/// Points a card at one medication or condition of the request by its codings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reference {
    pub coding: Vec<Coding>,
}

impl Reference {
    pub fn single(coding: Coding) -> Self {
        Self {
            coding: vec![coding],
        }
    }

    /// The coding the reference was created from.
    pub fn primary(&self) -> Option<&Coding> {
        self.coding.first()
    }
}

/// A CDS Hooks card.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Card {
    pub uuid: String,
    pub summary: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    pub indicator: Indicator,
    pub source: Source,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub reference_medications: Vec<Reference>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub reference_conditions: Vec<Reference>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alert_type: Option<String>,
}

impl Card {
    pub fn new(
        uuid: impl Into<String>,
        summary: impl Into<String>,
        detail: Option<String>,
        indicator: Indicator,
        source: Source,
    ) -> Self {
        Self {
            uuid: uuid.into(),
            summary: summary.into(),
            detail,
            indicator,
            source,
            reference_medications: Vec::new(),
            reference_conditions: Vec::new(),
            alert_type: None,
        }
    }
}

/// Appends one single-coding reference per coding, skipping codings already referenced.
///
/// Codings lose their display text; enrichment restores it from the request.
pub(crate) fn append_references<'a>(
    references: &mut Vec<Reference>,
    codings: impl IntoIterator<Item = &'a Coding>,
) {
    for coding in codings {
        let already = references
            .iter()
            .flat_map(|r| r.coding.iter())
            .any(|existing| existing == coding);
        if !already {
            references.push(Reference::single(coding.without_display()));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCT: &str = "http://snomed.info/sct";

    #[test]
    fn parses_indicator_leniently() {
        assert_eq!("warning".parse::<Indicator>().unwrap(), Indicator::Warning);
        assert_eq!(" Info ".parse::<Indicator>().unwrap(), Indicator::Info);
        assert_eq!("CRITICAL".parse::<Indicator>().unwrap(), Indicator::Critical);
        assert_eq!(
            "severe".parse::<Indicator>().unwrap_err(),
            InvalidIndicator("severe".into())
        );
    }

    #[test]
    fn serialises_in_cds_hooks_shape() {
        let mut card = Card::new(
            "c6f8a9b3-0000-4000-8000-000000000001",
            "Contraindication",
            None,
            Indicator::Warning,
            Source::new("BNF", Some("https://bnf.nice.org.uk".into())),
        );
        card.reference_medications
            .push(Reference::single(Coding::new(SCT, "108600003")));
        card.alert_type = Some("High Dosage".into());

        let json = serde_json::to_value(&card).unwrap();
        assert_eq!(json["indicator"], "warning");
        assert_eq!(json["source"]["label"], "BNF");
        assert_eq!(json["referenceMedications"][0]["coding"][0]["code"], "108600003");
        assert_eq!(json["alertType"], "High Dosage");
        assert!(json.get("detail").is_none());
        assert!(json.get("referenceConditions").is_none());
    }

    #[test]
    fn append_references_deduplicates_by_identity() {
        let mut refs = Vec::new();
        let a = Coding::with_display(SCT, "1", "One");
        let b = Coding::new(SCT, "2");
        append_references(&mut refs, [&a, &b]);
        append_references(&mut refs, [&Coding::new(SCT, "1")]);
        assert_eq!(refs.len(), 2);
        assert!(refs[0].coding[0].display.is_none());
    }
}
