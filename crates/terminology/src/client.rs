use crate::{
    ConceptDetails, NormalFormParser, TerminologyError, TerminologyResolver, TerminologyResult,
};
use cds_types::{CodeSet, Coding};
use serde::Deserialize;
use std::time::Duration;

/// Page size requested from `ValueSet/$expand`.
const EXPAND_PAGE_SIZE: usize = 1000;

/// Property code of the SNOMED CT terse normal form.
const NORMAL_FORM_PROPERTY: &str = "normalFormTerse";

/// Blocking client for a FHIR R4 terminology server.
///
/// Performs no caching of its own; wrap it in [`crate::CachingResolver`].
pub struct FhirTerminologyClient {
    base_url: String,
    client: reqwest::blocking::Client,
    timeout_secs: u64,
    parser: NormalFormParser,
}

impl FhirTerminologyClient {
    pub fn new(base_url: &str, timeout_secs: u64) -> TerminologyResult<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| TerminologyError::Client(e.to_string()))?;
        let parser = NormalFormParser::new().map_err(|e| TerminologyError::Client(e.to_string()))?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
            timeout_secs,
            parser,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn get(&self, path: &str, query: &[(&str, String)]) -> TerminologyResult<String> {
        let url = format!("{}{}", self.base_url, path);
        let response = self
            .client
            .get(&url)
            .header("Accept", "application/fhir+json")
            .query(query)
            .send()
            .map_err(|e| self.transport_error(e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(TerminologyError::Status {
                status: status.as_u16(),
                body,
            });
        }

        response.text().map_err(|e| self.transport_error(e))
    }

    fn transport_error(&self, e: reqwest::Error) -> TerminologyError {
        if e.is_timeout() {
            TerminologyError::Timeout(self.timeout_secs)
        } else if e.is_connect() {
            TerminologyError::Unreachable(self.base_url.clone())
        } else {
            TerminologyError::InvalidResponse(e.to_string())
        }
    }
}

impl TerminologyResolver for FhirTerminologyClient {
    fn expand_value_set(&self, uri: &str) -> TerminologyResult<CodeSet> {
        tracing::info!("Expanding ValueSet {}", uri);

        let mut codings = CodeSet::new();
        let mut offset = 0usize;
        loop {
            let body = self.get(
                "/ValueSet/$expand",
                &[
                    ("url", uri.to_string()),
                    ("size", EXPAND_PAGE_SIZE.to_string()),
                    ("offset", offset.to_string()),
                ],
            )?;
            let page = parse_expansion_page(&body)?;
            let received = page.codings.len();
            offset += received;
            codings.extend(page.codings);

            match page.total {
                Some(total) if received > 0 && offset < total => continue,
                _ => break,
            }
        }

        tracing::debug!("ValueSet {} expanded to {} codings", uri, codings.len());
        Ok(codings)
    }

    fn lookup(&self, system: &str, code: &str) -> TerminologyResult<ConceptDetails> {
        tracing::info!("Lookup system {} code {}", system, code);
        let body = self.get(
            "/CodeSystem/$lookup",
            &[
                ("system", system.to_string()),
                ("code", code.to_string()),
                ("property", "*".to_string()),
            ],
        )?;
        parse_lookup(&body, &self.parser)
    }
}

// ============================================================================
// Wire model
// ============================================================================

#[derive(Debug, Deserialize)]
struct ValueSetWire {
    expansion: Option<ExpansionWire>,
}

#[derive(Debug, Deserialize)]
struct ExpansionWire {
    total: Option<usize>,
    #[serde(default)]
    contains: Vec<ExpansionEntryWire>,
}

#[derive(Debug, Deserialize)]
struct ExpansionEntryWire {
    system: String,
    code: String,
    display: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ParametersWire {
    #[serde(default)]
    parameter: Vec<ParameterWire>,
}

#[derive(Debug, Deserialize)]
struct ParameterWire {
    name: String,
    #[serde(rename = "valueString")]
    value_string: Option<String>,
    #[serde(rename = "valueCode")]
    value_code: Option<String>,
    #[serde(default)]
    part: Vec<ParameterWire>,
}

impl ParameterWire {
    fn value(&self) -> Option<&str> {
        self.value_string
            .as_deref()
            .or(self.value_code.as_deref())
    }
}

#[derive(Debug)]
struct ExpansionPage {
    total: Option<usize>,
    codings: Vec<Coding>,
}

fn parse_expansion_page(body: &str) -> TerminologyResult<ExpansionPage> {
    let wire: ValueSetWire = serde_json::from_str(body)
        .map_err(|e| TerminologyError::InvalidResponse(format!("ValueSet: {e}")))?;
    let Some(expansion) = wire.expansion else {
        return Ok(ExpansionPage {
            total: None,
            codings: Vec::new(),
        });
    };
    let codings = expansion
        .contains
        .into_iter()
        .map(|c| Coding {
            system: c.system,
            code: c.code,
            display: c.display,
        })
        .collect();
    Ok(ExpansionPage {
        total: expansion.total,
        codings,
    })
}

fn parse_lookup(body: &str, parser: &NormalFormParser) -> TerminologyResult<ConceptDetails> {
    let wire: ParametersWire = serde_json::from_str(body)
        .map_err(|e| TerminologyError::InvalidResponse(format!("Parameters: {e}")))?;

    let display = wire
        .parameter
        .iter()
        .find(|p| p.name == "display")
        .and_then(|p| p.value())
        .map(str::to_string);

    let normal_form = wire
        .parameter
        .iter()
        .filter(|p| p.name == "property")
        .find_map(|property| {
            let is_normal_form = property
                .part
                .iter()
                .any(|part| part.name == "code" && part.value() == Some(NORMAL_FORM_PROPERTY));
            if !is_normal_form {
                return None;
            }
            property
                .part
                .iter()
                .find(|part| part.name == "value" || part.name == "valueString")
                .and_then(|part| part.value())
        })
        .and_then(|text| parser.parse(text));

    Ok(ConceptDetails {
        display,
        normal_form,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parser() -> NormalFormParser {
        NormalFormParser::new().expect("patterns compile")
    }

    #[test]
    fn parses_expansion_page() {
        let body = r#"{
            "resourceType": "ValueSet",
            "expansion": {
                "total": 2,
                "contains": [
                    {"system": "http://snomed.info/sct", "code": "108600003", "display": "Atorvastatin-containing product"},
                    {"system": "http://snomed.info/sct", "code": "1145423002"}
                ]
            }
        }"#;
        let page = parse_expansion_page(body).expect("page");
        assert_eq!(page.total, Some(2));
        assert_eq!(page.codings.len(), 2);
        assert_eq!(page.codings[0].label(), "Atorvastatin-containing product");
        assert_eq!(page.codings[1].label(), "1145423002");
    }

    #[test]
    fn missing_expansion_is_an_empty_page() {
        let page = parse_expansion_page(r#"{"resourceType": "ValueSet"}"#).expect("page");
        assert!(page.total.is_none());
        assert!(page.codings.is_empty());
    }

    #[test]
    fn rejects_malformed_expansion() {
        let err = parse_expansion_page("not json").expect_err("invalid");
        match err {
            TerminologyError::InvalidResponse(msg) => assert!(msg.starts_with("ValueSet")),
            other => panic!("expected InvalidResponse, got {other:?}"),
        }
    }

    #[test]
    fn parses_lookup_display_and_normal_form() {
        let body = r#"{
            "resourceType": "Parameters",
            "parameter": [
                {"name": "name", "valueString": "SNOMED CT"},
                {"name": "display", "valueString": "Paracetamol 500 mg oral tablet"},
                {"name": "property", "part": [
                    {"name": "code", "valueCode": "parent"},
                    {"name": "value", "valueCode": "763158003"}
                ]},
                {"name": "property", "part": [
                    {"name": "code", "valueString": "normalFormTerse"},
                    {"name": "valueString", "valueString": "===763158003:411116001=421026006,{732943007=387517004,1142135004=#500}"}
                ]}
            ]
        }"#;
        let details = parse_lookup(body, &parser()).expect("lookup");
        assert_eq!(
            details.display.as_deref(),
            Some("Paracetamol 500 mg oral tablet")
        );
        let nf = details.normal_form.expect("normal form");
        assert_eq!(nf.attribute("411116001"), Some("421026006"));
        assert_eq!(nf.attribute_groups.len(), 1);
    }

    #[test]
    fn lookup_without_normal_form() {
        let body = r#"{"resourceType": "Parameters", "parameter": [
            {"name": "display", "valueString": "mg"}
        ]}"#;
        let details = parse_lookup(body, &parser()).expect("lookup");
        assert_eq!(details.display.as_deref(), Some("mg"));
        assert!(details.normal_form.is_none());
    }

    #[test]
    fn trims_trailing_slash_from_base_url() {
        let client = FhirTerminologyClient::new("http://localhost:8080/fhir/", 5).expect("client");
        assert_eq!(client.base_url(), "http://localhost:8080/fhir");
    }
}
