//! Parser for the SNOMED CT terse normal form returned by `$lookup`.
//!
//! The terse form looks like
//!
//! ```text
//! ===763158003:411116001=421026006,{762949000=387517004,732943007=387517004,1142135004=#500,...}
//! ```
//!
//! Parents precede the first `:`. Ungrouped attributes precede the first `{`. Each `{...}` is
//! one attribute group. Concrete values (`#500`) lose their `#`.

use regex::Regex;
use std::collections::HashMap;

pub type AttributeMap = HashMap<String, String>;

#[derive(Clone, Debug, Default, PartialEq)]
pub struct NormalForm {
    pub parents: Vec<String>,
    pub attributes: AttributeMap,
    pub attribute_groups: Vec<AttributeMap>,
}

/// Compiled patterns for [`NormalForm`] parsing.
#[derive(Clone, Debug)]
pub struct NormalFormParser {
    attribute: Regex,
    group: Regex,
}

impl NormalFormParser {
    pub fn new() -> Result<Self, regex::Error> {
        Ok(Self {
            attribute: Regex::new(r"(\d+) ?= ?#?([\d.]+)")?,
            group: Regex::new(r"\{([^}]*)}")?,
        })
    }

    /// Parses a terse normal form. Returns `None` when there is no `:` separator.
    pub fn parse(&self, input: &str) -> Option<NormalForm> {
        let stripped = input.replace("===", "").replace("<<<", "");
        let (parents, rest) = stripped.split_once(':')?;

        let parents = parents
            .split('+')
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(str::to_string)
            .collect();

        let ungrouped = match rest.find('{') {
            Some(idx) => &rest[..idx],
            None => rest,
        };

        let attribute_groups = self
            .group
            .captures_iter(rest)
            .map(|caps| self.collect_attributes(&caps[1]))
            .collect();

        Some(NormalForm {
            parents,
            attributes: self.collect_attributes(ungrouped),
            attribute_groups,
        })
    }

    fn collect_attributes(&self, text: &str) -> AttributeMap {
        self.attribute
            .captures_iter(text)
            .map(|caps| (caps[1].to_string(), caps[2].to_string()))
            .collect()
    }
}

impl NormalForm {
    pub fn attribute(&self, id: &str) -> Option<&str> {
        self.attributes.get(id).map(String::as_str)
    }
}
