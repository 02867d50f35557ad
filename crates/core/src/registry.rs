//! Lookup of CDS services by id.

use crate::card::Card;
use crate::config::CoreConfig;
use crate::dose::{AlertSettings, DoseSafetyEngine};
use crate::rules::RuleSet;
use crate::service::{
    CdsRequest, CdsService, HelloService, MedicationOrderSelectService, ServiceDescriptor,
};
use crate::{CdsError, CdsResult};
use std::sync::Arc;
use terminology::TerminologyResolver;

/// The services this process answers for, in discovery order.
#[derive(Default)]
pub struct CdsServiceRegistry {
    services: Vec<Box<dyn CdsService>>,
}

impl std::fmt::Debug for CdsServiceRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.services.iter().map(|s| &s.descriptor().id))
            .finish()
    }
}

impl CdsServiceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds the standard registry: `medication-order-select` over `rules`, then `hello-test`.
    pub fn standard(
        config: &CoreConfig,
        rules: RuleSet,
        terminology: Arc<dyn TerminologyResolver>,
    ) -> Self {
        let dose_engine = DoseSafetyEngine::new(
            rules.dose_forms,
            rules.defined_daily_doses,
            terminology,
            AlertSettings {
                thresholds: config.thresholds(),
                card_summary_template: config.card_summary_template().to_string(),
                atc_url_template: config.atc_url_template().to_string(),
            },
        );

        let mut registry = Self::new();
        registry.register(MedicationOrderSelectService::new(
            rules.drug_condition,
            rules.drug_drug,
            dose_engine,
        ));
        registry.register(HelloService::new());
        registry
    }

    /// Adds a service. When two services share an id the first one registered is kept.
    pub fn register(&mut self, service: impl CdsService + 'static) {
        let id = &service.descriptor().id;
        if self.get(id).is_some() {
            tracing::warn!("CDS service {} is already registered, ignoring", id);
            return;
        }
        tracing::info!("Registered CDS service {}", id);
        self.services.push(Box::new(service));
    }

    pub fn get(&self, id: &str) -> Option<&dyn CdsService> {
        self.services
            .iter()
            .find(|s| s.descriptor().id == id)
            .map(|s| s.as_ref())
    }

    pub fn descriptors(&self) -> impl Iterator<Item = &ServiceDescriptor> {
        self.services.iter().map(|s| s.descriptor())
    }

    /// Calls service `id`.
    ///
    /// # Errors
    ///
    /// Returns `CdsError::UnknownService` for an unregistered id, otherwise whatever the service
    /// returns.
    pub fn call(&self, id: &str, request: &CdsRequest) -> CdsResult<Vec<Card>> {
        let service = self
            .get(id)
            .ok_or_else(|| CdsError::UnknownService(id.to_string()))?;
        service.call(request)
    }
}
