//! CDS Hooks wire types shared by the API crates.
//!
//! These mirror the JSON bodies of the CDS Hooks 1.0 discovery and service endpoints. They carry
//! `utoipa` schemas for the OpenAPI document and convert from the core domain types.

use cds_core::{Card, CdsRequest, Indicator, Reference, ServiceDescriptor, Source};
use cds_types::Coding;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use utoipa::ToSchema;

// ============================================================================
// Requests
// ============================================================================

/// Body of `POST /cds-services/{id}`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CdsHooksReq {
    /// Hook that triggered the call, e.g. `order-select`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hook: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hook_instance: Option<String>,
    #[serde(default)]
    #[schema(value_type = Object)]
    pub context: HashMap<String, Value>,
    /// FHIR resources keyed by prefetch template name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Object>)]
    pub prefetch: Option<HashMap<String, Value>>,
}

impl From<CdsHooksReq> for CdsRequest {
    fn from(req: CdsHooksReq) -> Self {
        CdsRequest {
            hook: req.hook,
            hook_instance: req.hook_instance,
            context: req.context,
            prefetch: req.prefetch,
        }
    }
}

// ============================================================================
// Responses
// ============================================================================

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct CodingDto {
    pub system: String,
    pub code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display: Option<String>,
}

impl From<Coding> for CodingDto {
    fn from(c: Coding) -> Self {
        Self {
            system: c.system,
            code: c.code,
            display: c.display,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum IndicatorDto {
    Info,
    Warning,
    Critical,
}

impl From<Indicator> for IndicatorDto {
    fn from(i: Indicator) -> Self {
        match i {
            Indicator::Info => IndicatorDto::Info,
            Indicator::Warning => IndicatorDto::Warning,
            Indicator::Critical => IndicatorDto::Critical,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct SourceDto {
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topic: Option<CodingDto>,
}

impl From<Source> for SourceDto {
    fn from(s: Source) -> Self {
        Self {
            label: s.label,
            url: s.url,
            topic: s.topic.map(Into::into),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ReferenceDto {
    pub coding: Vec<CodingDto>,
}

impl From<Reference> for ReferenceDto {
    fn from(r: Reference) -> Self {
        Self {
            coding: r.coding.into_iter().map(Into::into).collect(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CardDto {
    pub uuid: String,
    pub summary: String,
    /// Markdown.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    pub indicator: IndicatorDto,
    pub source: SourceDto,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub reference_medications: Vec<ReferenceDto>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub reference_conditions: Vec<ReferenceDto>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alert_type: Option<String>,
}

impl From<Card> for CardDto {
    fn from(card: Card) -> Self {
        Self {
            uuid: card.uuid,
            summary: card.summary,
            detail: card.detail,
            indicator: card.indicator.into(),
            source: card.source.into(),
            reference_medications: card
                .reference_medications
                .into_iter()
                .map(Into::into)
                .collect(),
            reference_conditions: card
                .reference_conditions
                .into_iter()
                .map(Into::into)
                .collect(),
            alert_type: card.alert_type,
        }
    }
}

/// Body returned by a CDS service.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct CardsRes {
    pub cards: Vec<CardDto>,
}

impl From<Vec<Card>> for CardsRes {
    fn from(cards: Vec<Card>) -> Self {
        Self {
            cards: cards.into_iter().map(Into::into).collect(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ServiceDescriptorDto {
    pub id: String,
    pub hook: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub description: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub prefetch: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage_requirements: Option<String>,
}

impl From<&ServiceDescriptor> for ServiceDescriptorDto {
    fn from(d: &ServiceDescriptor) -> Self {
        Self {
            id: d.id.clone(),
            hook: d.hook.clone(),
            title: d.title.clone(),
            description: d.description.clone(),
            prefetch: d.prefetch.clone(),
            usage_requirements: d.usage_requirements.clone(),
        }
    }
}

/// Body of `GET /cds-services`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ServicesRes {
    pub services: Vec<ServiceDescriptorDto>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct HealthRes {
    pub ok: bool,
    pub message: String,
}

/// Error body for every non-2xx response.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ErrorRes {
    pub status: u16,
    /// Reason phrase of `status`.
    pub error: String,
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn card_serialises_in_cds_hooks_shape() {
        let mut card = Card::new(
            "uuid-1",
            "High dose",
            Some("**detail**".into()),
            Indicator::Warning,
            Source::new("WHO ATC DDD", Some("https://www.whocc.no".into())),
        );
        card.reference_medications.push(Reference {
            coding: vec![Coding::with_display(
                "http://snomed.info/sct",
                "322236009",
                "Paracetamol 500 mg oral tablet",
            )],
        });
        card.alert_type = Some("High Dosage".into());

        let body = serde_json::to_value(CardsRes::from(vec![card])).expect("json");
        assert_eq!(
            body,
            json!({"cards": [{
                "uuid": "uuid-1",
                "summary": "High dose",
                "detail": "**detail**",
                "indicator": "warning",
                "source": {"label": "WHO ATC DDD", "url": "https://www.whocc.no"},
                "referenceMedications": [{"coding": [{
                    "system": "http://snomed.info/sct",
                    "code": "322236009",
                    "display": "Paracetamol 500 mg oral tablet"
                }]}],
                "alertType": "High Dosage"
            }]})
        );
    }

    #[test]
    fn request_reads_camel_case_fields() {
        let req: CdsHooksReq = serde_json::from_value(json!({
            "hook": "order-select",
            "hookInstance": "abc",
            "context": {"patientId": "1"},
            "prefetch": {"patient": {"resourceType": "Patient"}}
        }))
        .expect("request");
        let core: CdsRequest = req.into();
        assert_eq!(core.hook_instance.as_deref(), Some("abc"));
        assert_eq!(core.context["patientId"], "1");
        assert!(core.prefetch.expect("prefetch").contains_key("patient"));
    }

    #[test]
    fn descriptor_omits_empty_prefetch() {
        let descriptor = ServiceDescriptor {
            id: "hello-test".into(),
            hook: "patient-view".into(),
            title: None,
            description: "Connectivity test service.".into(),
            prefetch: BTreeMap::new(),
            usage_requirements: None,
        };
        let body = serde_json::to_value(ServiceDescriptorDto::from(&descriptor)).expect("json");
        assert_eq!(
            body,
            json!({"id": "hello-test", "hook": "patient-view", "description": "Connectivity test service."})
        );
    }
}
