//! Wire models for FHIR datatypes shared by several resources.

use cds_types::Coding;
use serde::Deserialize;

#[derive(Clone, Debug, Default, Deserialize)]
pub(crate) struct CodeableConceptWire {
    #[serde(default)]
    pub coding: Vec<CodingWire>,
}

#[derive(Clone, Debug, Deserialize)]
pub(crate) struct CodingWire {
    pub system: Option<String>,
    pub code: Option<String>,
    pub display: Option<String>,
}

impl CodeableConceptWire {
    /// Codings carrying both a system and a code. Others cannot take part in matching.
    pub fn into_codings(self) -> Vec<Coding> {
        self.coding
            .into_iter()
            .filter_map(|c| {
                Some(Coding {
                    system: c.system?,
                    code: c.code?,
                    display: c.display,
                })
            })
            .collect()
    }
}
