use crate::{ConceptDetails, TerminologyError, TerminologyResolver, TerminologyResult};
use cds_types::{CodeSet, Coding};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

/// In-memory resolver backed by fixed value sets and concepts.
///
/// Unknown value sets and concepts are errors, so a test fails loudly when it forgets to register
/// something. Calls are counted to let tests observe caching.
#[derive(Debug, Default)]
pub struct StaticTerminology {
    value_sets: HashMap<String, CodeSet>,
    concepts: HashMap<(String, String), ConceptDetails>,
    expand_calls: AtomicUsize,
    lookup_calls: AtomicUsize,
}

impl StaticTerminology {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_value_set(
        mut self,
        uri: impl Into<String>,
        codings: impl IntoIterator<Item = Coding>,
    ) -> Self {
        self.value_sets
            .insert(uri.into(), codings.into_iter().collect());
        self
    }

    pub fn with_concept(
        mut self,
        system: impl Into<String>,
        code: impl Into<String>,
        details: ConceptDetails,
    ) -> Self {
        self.concepts.insert((system.into(), code.into()), details);
        self
    }

    pub fn expand_calls(&self) -> usize {
        self.expand_calls.load(Ordering::SeqCst)
    }

    pub fn lookup_calls(&self) -> usize {
        self.lookup_calls.load(Ordering::SeqCst)
    }
}

impl TerminologyResolver for StaticTerminology {
    fn expand_value_set(&self, uri: &str) -> TerminologyResult<CodeSet> {
        self.expand_calls.fetch_add(1, Ordering::SeqCst);
        self.value_sets
            .get(uri)
            .cloned()
            .ok_or_else(|| TerminologyError::UnknownValueSet(uri.to_string()))
    }

    fn lookup(&self, system: &str, code: &str) -> TerminologyResult<ConceptDetails> {
        self.lookup_calls.fetch_add(1, Ordering::SeqCst);
        self.concepts
            .get(&(system.to_string(), code.to_string()))
            .cloned()
            .ok_or_else(|| TerminologyError::UnknownConcept {
                system: system.to_string(),
                code: code.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SNOMED_SYSTEM;

    #[test]
    fn unknown_entries_are_errors() {
        let terminology = StaticTerminology::new();
        assert!(matches!(
            terminology.expand_value_set("x"),
            Err(TerminologyError::UnknownValueSet(uri)) if uri == "x"
        ));
        assert!(matches!(
            terminology.lookup(SNOMED_SYSTEM, "1"),
            Err(TerminologyError::UnknownConcept { .. })
        ));
        assert_eq!(terminology.expand_calls(), 1);
        assert_eq!(terminology.lookup_calls(), 1);
    }
}
