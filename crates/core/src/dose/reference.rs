//! Reference tables consulted by the dose engine. Loaded once, read-only afterwards.

use std::collections::{HashMap, HashSet};

/// WHO defined daily dose of a substance for one route of administration.
#[derive(Clone, Debug, PartialEq)]
pub struct SubstanceDefinedDailyDose {
    /// ATC route of administration code, e.g. `O` or `P`.
    pub route: String,
    pub dose: f64,
    pub unit: String,
    pub atc_code: String,
}

/// Many source codes mapped to one target code.
#[derive(Clone, Debug, PartialEq)]
pub struct ManyToOneMapEntry {
    pub source_codes: HashSet<String>,
    pub target_code: String,
    pub priority: i32,
    pub label: Option<String>,
}

impl ManyToOneMapEntry {
    /// The label, or the target code when there is none.
    pub fn display(&self) -> &str {
        self.label.as_deref().unwrap_or(&self.target_code)
    }
}

/// Manufactured dose form → ATC route of administration.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DoseFormMap {
    entries: Vec<ManyToOneMapEntry>,
}

impl DoseFormMap {
    /// Entries are ordered by ascending priority; ties keep their given order.
    pub fn new(mut entries: Vec<ManyToOneMapEntry>) -> Self {
        entries.sort_by_key(|e| e.priority);
        Self { entries }
    }

    /// The highest-priority entry covering `dose_form`.
    pub fn route_for(&self, dose_form: &str) -> Option<&ManyToOneMapEntry> {
        self.entries
            .iter()
            .find(|e| e.source_codes.contains(dose_form))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Defined daily doses keyed by SNOMED CT substance code.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DefinedDailyDoses {
    by_substance: HashMap<String, Vec<SubstanceDefinedDailyDose>>,
}

impl DefinedDailyDoses {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, substance: impl Into<String>, ddd: SubstanceDefinedDailyDose) {
        self.by_substance
            .entry(substance.into())
            .or_default()
            .push(ddd);
    }

    /// The first defined daily dose listed for `substance` and `route`.
    pub fn for_route(&self, substance: &str, route: &str) -> Option<&SubstanceDefinedDailyDose> {
        self.by_substance
            .get(substance)?
            .iter()
            .find(|d| d.route == route)
    }

    /// Number of substances with at least one defined daily dose.
    pub fn substance_count(&self) -> usize {
        self.by_substance.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(codes: &[&str], target: &str, priority: i32) -> ManyToOneMapEntry {
        ManyToOneMapEntry {
            source_codes: codes.iter().map(|c| c.to_string()).collect(),
            target_code: target.into(),
            priority,
            label: None,
        }
    }

    #[test]
    fn lowest_priority_number_wins() {
        let map = DoseFormMap::new(vec![
            entry(&["421026006", "385055001"], "O", 2),
            entry(&["421026006"], "SL", 1),
        ]);
        assert_eq!(map.route_for("421026006").map(|e| e.target_code.as_str()), Some("SL"));
        assert_eq!(map.route_for("385055001").map(|e| e.target_code.as_str()), Some("O"));
        assert!(map.route_for("1").is_none());
    }

    #[test]
    fn display_falls_back_to_target_code() {
        let mut e = entry(&[], "O", 1);
        assert_eq!(e.display(), "O");
        e.label = Some("oral".into());
        assert_eq!(e.display(), "oral");
    }

    #[test]
    fn ddd_lookup_by_substance_and_route() {
        let mut ddds = DefinedDailyDoses::new();
        ddds.insert(
            "387517004",
            SubstanceDefinedDailyDose {
                route: "O".into(),
                dose: 3.0,
                unit: "g".into(),
                atc_code: "N02BE01".into(),
            },
        );
        ddds.insert(
            "387517004",
            SubstanceDefinedDailyDose {
                route: "R".into(),
                dose: 3.0,
                unit: "g".into(),
                atc_code: "N02BE01".into(),
            },
        );
        assert_eq!(ddds.substance_count(), 1);
        assert_eq!(ddds.for_route("387517004", "R").map(|d| d.route.as_str()), Some("R"));
        assert!(ddds.for_route("387517004", "P").is_none());
        assert!(ddds.for_route("1", "O").is_none());
    }
}
