//! Shared value types for the CDS workspace.
//!
//! - [`Coding`]: a (system, code, display) triple naming a clinical concept.
//! - [`CodeSet`]: an insertion-ordered set of codings, unique by (system, code).

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::hash::{Hash, Hasher};

/// A coded clinical concept.
///
/// Identity is `(system, code)`. The display text is carried for rendering only and never takes
/// part in equality, hashing or matching.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Coding {
    pub system: String,
    pub code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display: Option<String>,
}

impl Coding {
    pub fn new(system: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            system: system.into(),
            code: code.into(),
            display: None,
        }
    }

    pub fn with_display(
        system: impl Into<String>,
        code: impl Into<String>,
        display: impl Into<String>,
    ) -> Self {
        Self {
            system: system.into(),
            code: code.into(),
            display: Some(display.into()),
        }
    }

    /// Returns a copy carrying only the identity fields.
    pub fn without_display(&self) -> Self {
        Self::new(self.system.clone(), self.code.clone())
    }

    /// Display text for human-readable output, falling back to the code.
    pub fn label(&self) -> &str {
        self.display.as_deref().unwrap_or(&self.code)
    }

    fn key(&self) -> (&str, &str) {
        (self.system.as_str(), self.code.as_str())
    }
}

impl PartialEq for Coding {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for Coding {}

impl Hash for Coding {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key().hash(state);
    }
}

/// An insertion-ordered set of [`Coding`]s, unique by `(system, code)`.
///
/// The first inserted coding wins, so its display text is the one kept. Iteration order is
/// insertion order, which keeps every derived result (intersections, rendered text) deterministic.
#[derive(Clone, Debug, Default)]
pub struct CodeSet {
    codings: Vec<Coding>,
    index: HashSet<Coding>,
}

impl CodeSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a coding. Returns `false` if a coding with the same identity is already present.
    pub fn insert(&mut self, coding: Coding) -> bool {
        if !self.index.insert(coding.without_display()) {
            return false;
        }
        self.codings.push(coding);
        true
    }

    /// Exact, case-sensitive identity lookup.
    pub fn contains(&self, coding: &Coding) -> bool {
        self.index.contains(coding)
    }

    pub fn contains_code(&self, system: &str, code: &str) -> bool {
        self.index.contains(&Coding::new(system, code))
    }

    /// True iff some member of `self` equals some member of `other` on `(system, code)`.
    pub fn overlaps(&self, other: &CodeSet) -> bool {
        self.codings.iter().any(|c| other.contains(c))
    }

    /// The members of `self` that are also present in `other`, in `self`'s order.
    ///
    /// Members keep their own display text, so the result describes what the patient record
    /// says rather than what the rule says.
    pub fn intersection(&self, other: &CodeSet) -> CodeSet {
        self.codings
            .iter()
            .filter(|c| other.contains(c))
            .cloned()
            .collect()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Coding> {
        self.codings.iter()
    }

    pub fn len(&self) -> usize {
        self.codings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.codings.is_empty()
    }

    pub fn as_slice(&self) -> &[Coding] {
        &self.codings
    }
}

impl PartialEq for CodeSet {
    fn eq(&self, other: &Self) -> bool {
        self.codings == other.codings
    }
}

impl Eq for CodeSet {}

impl FromIterator<Coding> for CodeSet {
    fn from_iter<I: IntoIterator<Item = Coding>>(iter: I) -> Self {
        let mut set = CodeSet::new();
        for coding in iter {
            set.insert(coding);
        }
        set
    }
}

impl Extend<Coding> for CodeSet {
    fn extend<I: IntoIterator<Item = Coding>>(&mut self, iter: I) {
        for coding in iter {
            self.insert(coding);
        }
    }
}

impl IntoIterator for CodeSet {
    type Item = Coding;
    type IntoIter = std::vec::IntoIter<Coding>;

    fn into_iter(self) -> Self::IntoIter {
        self.codings.into_iter()
    }
}

impl<'a> IntoIterator for &'a CodeSet {
    type Item = &'a Coding;
    type IntoIter = std::slice::Iter<'a, Coding>;

    fn into_iter(self) -> Self::IntoIter {
        self.codings.iter()
    }
}

impl Serialize for CodeSet {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        self.codings.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for CodeSet {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let codings = Vec::<Coding>::deserialize(deserializer)?;
        Ok(codings.into_iter().collect())
    }
}
