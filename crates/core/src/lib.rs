//! # CDS Core
//!
//! Clinical decision support logic behind the CDS Hooks services.
//!
//! This crate contains:
//! - Loading of rule and reference tables (drug-condition, drug-drug, dose forms, defined daily
//!   doses)
//! - Interaction triggers and the cards they produce
//! - The dose safety engine that aggregates daily doses per substance
//! - The CDS services and the registry that dispatches calls to them
//!
//! **No API concerns**: HTTP routing, OpenAPI documents and wire DTOs belong in `api-rest` and
//! `api-shared`.

pub mod card;
pub mod config;
pub mod constants;
pub mod dose;
pub mod error;
pub mod markdown;
pub mod registry;
pub mod rules;
pub mod service;
pub mod trigger;
pub mod validation;

pub use card::{Card, Indicator, Reference, Source};
pub use config::{CoreConfig, DoseThresholds, RulePaths};
pub use error::{CdsError, CdsResult, ErrorKind};
pub use registry::CdsServiceRegistry;
pub use rules::RuleSet;
pub use service::{CdsRequest, CdsService, ServiceDescriptor};
pub use trigger::{Trigger, TriggerKind};
