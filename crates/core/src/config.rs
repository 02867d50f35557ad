//! Core runtime configuration.
//!
//! This module defines configuration that should be resolved once at process startup and then
//! passed into core services. Library code never reads process-wide environment variables;
//! binaries read them and hand the raw values to the `*_from_env_value` helpers below.

use crate::constants::{
    DEFAULT_ACCEPTABLE_DAILY_DOSE_FACTOR, DEFAULT_ATC_URL_TEMPLATE, DEFAULT_CARD_SUMMARY_TEMPLATE,
    DEFAULT_MAXIMUM_DAILY_DOSE_FACTOR, DEFAULT_RULES_DOSE_FORMS,
    DEFAULT_RULES_MEDICATION_CONDITION, DEFAULT_RULES_MEDICATION_MEDICATION,
    DEFAULT_RULES_SUBSTANCE_DDD, DEFAULT_TERMINOLOGY_TIMEOUT_SECS, DEFAULT_TERMINOLOGY_URL,
};
use crate::{CdsError, CdsResult};
use std::path::{Path, PathBuf};

/// Locations of the four rule and reference tables.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RulePaths {
    pub medication_condition: PathBuf,
    pub medication_medication: PathBuf,
    pub dose_forms: PathBuf,
    pub substance_ddd: PathBuf,
}

impl Default for RulePaths {
    fn default() -> Self {
        Self {
            medication_condition: PathBuf::from(DEFAULT_RULES_MEDICATION_CONDITION),
            medication_medication: PathBuf::from(DEFAULT_RULES_MEDICATION_MEDICATION),
            dose_forms: PathBuf::from(DEFAULT_RULES_DOSE_FORMS),
            substance_ddd: PathBuf::from(DEFAULT_RULES_SUBSTANCE_DDD),
        }
    }
}

/// Factors of the defined daily dose at which dose cards are raised.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DoseThresholds {
    acceptable: f64,
    maximum: f64,
}

impl DoseThresholds {
    /// Both factors must be positive and `acceptable` must not exceed `maximum`.
    pub fn new(acceptable: f64, maximum: f64) -> CdsResult<Self> {
        if !(acceptable.is_finite() && acceptable > 0.0) {
            return Err(CdsError::InvalidConfig(format!(
                "acceptable daily dose factor must be positive, got {acceptable}"
            )));
        }
        if !(maximum.is_finite() && maximum > 0.0) {
            return Err(CdsError::InvalidConfig(format!(
                "maximum daily dose factor must be positive, got {maximum}"
            )));
        }
        if acceptable > maximum {
            return Err(CdsError::InvalidConfig(format!(
                "acceptable daily dose factor {acceptable} exceeds maximum {maximum}"
            )));
        }
        Ok(Self {
            acceptable,
            maximum,
        })
    }

    pub fn acceptable(&self) -> f64 {
        self.acceptable
    }

    pub fn maximum(&self) -> f64 {
        self.maximum
    }
}

impl Default for DoseThresholds {
    fn default() -> Self {
        Self {
            acceptable: DEFAULT_ACCEPTABLE_DAILY_DOSE_FACTOR,
            maximum: DEFAULT_MAXIMUM_DAILY_DOSE_FACTOR,
        }
    }
}

/// Core configuration resolved at startup.
#[derive(Clone, Debug)]
pub struct CoreConfig {
    terminology_url: String,
    terminology_timeout_secs: u64,
    rule_paths: RulePaths,
    thresholds: DoseThresholds,
    card_summary_template: String,
    atc_url_template: String,
}

impl CoreConfig {
    /// Create a new `CoreConfig`.
    pub fn new(
        terminology_url: String,
        terminology_timeout_secs: u64,
        rule_paths: RulePaths,
        thresholds: DoseThresholds,
        card_summary_template: String,
        atc_url_template: String,
    ) -> CdsResult<Self> {
        if terminology_url.trim().is_empty() {
            return Err(CdsError::InvalidConfig(
                "terminology_url cannot be empty".into(),
            ));
        }
        if terminology_timeout_secs == 0 {
            return Err(CdsError::InvalidConfig(
                "terminology_timeout_secs must be greater than zero".into(),
            ));
        }
        if card_summary_template.trim().is_empty() {
            return Err(CdsError::InvalidConfig(
                "card_summary_template cannot be empty".into(),
            ));
        }

        Ok(Self {
            terminology_url,
            terminology_timeout_secs,
            rule_paths,
            thresholds,
            card_summary_template,
            atc_url_template,
        })
    }

    pub fn terminology_url(&self) -> &str {
        &self.terminology_url
    }

    pub fn terminology_timeout_secs(&self) -> u64 {
        self.terminology_timeout_secs
    }

    pub fn rule_paths(&self) -> &RulePaths {
        &self.rule_paths
    }

    pub fn medication_condition_rules(&self) -> &Path {
        &self.rule_paths.medication_condition
    }

    pub fn medication_medication_rules(&self) -> &Path {
        &self.rule_paths.medication_medication
    }

    pub fn dose_forms_table(&self) -> &Path {
        &self.rule_paths.dose_forms
    }

    pub fn substance_ddd_table(&self) -> &Path {
        &self.rule_paths.substance_ddd
    }

    pub fn thresholds(&self) -> DoseThresholds {
        self.thresholds
    }

    pub fn card_summary_template(&self) -> &str {
        &self.card_summary_template
    }

    pub fn atc_url_template(&self) -> &str {
        &self.atc_url_template
    }
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            terminology_url: DEFAULT_TERMINOLOGY_URL.into(),
            terminology_timeout_secs: DEFAULT_TERMINOLOGY_TIMEOUT_SECS,
            rule_paths: RulePaths::default(),
            thresholds: DoseThresholds::default(),
            card_summary_template: DEFAULT_CARD_SUMMARY_TEMPLATE.into(),
            atc_url_template: DEFAULT_ATC_URL_TEMPLATE.into(),
        }
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Parse a daily dose factor from an optional string value.
///
/// If `value` is `None` or empty/whitespace, returns `default`.
pub fn dose_factor_from_env_value(value: Option<String>, default: f64) -> CdsResult<f64> {
    match non_blank(value) {
        None => Ok(default),
        Some(v) => {
            let parsed = v.parse::<f64>().map_err(|_| {
                CdsError::InvalidConfig(format!("daily dose factor is not a number: {v}"))
            })?;
            if !(parsed.is_finite() && parsed > 0.0) {
                return Err(CdsError::InvalidConfig(format!(
                    "daily dose factor must be positive, got {v}"
                )));
            }
            Ok(parsed)
        }
    }
}

/// Parse both dose thresholds and check them against each other.
pub fn dose_thresholds_from_env_values(
    acceptable: Option<String>,
    maximum: Option<String>,
) -> CdsResult<DoseThresholds> {
    DoseThresholds::new(
        dose_factor_from_env_value(acceptable, DEFAULT_ACCEPTABLE_DAILY_DOSE_FACTOR)?,
        dose_factor_from_env_value(maximum, DEFAULT_MAXIMUM_DAILY_DOSE_FACTOR)?,
    )
}

/// Parse the terminology timeout in whole seconds.
///
/// If `value` is `None` or empty/whitespace, returns the default timeout.
pub fn timeout_secs_from_env_value(value: Option<String>) -> CdsResult<u64> {
    match non_blank(value) {
        None => Ok(DEFAULT_TERMINOLOGY_TIMEOUT_SECS),
        Some(v) => match v.parse::<u64>() {
            Ok(secs) if secs > 0 => Ok(secs),
            _ => Err(CdsError::InvalidConfig(format!(
                "terminology timeout must be a positive whole number of seconds, got {v}"
            ))),
        },
    }
}

/// Resolve a rule table path, falling back to `default`.
pub fn path_from_env_value(value: Option<String>, default: &str) -> PathBuf {
    PathBuf::from(non_blank(value).unwrap_or_else(|| default.to_string()))
}

/// Resolve a text setting, falling back to `default`. Whitespace is kept as given.
pub fn text_from_env_value(value: Option<String>, default: &str) -> String {
    value
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| default.to_string())
}

/// Environment variable names read by the binaries.
pub mod env {
    pub const TERMINOLOGY_URL: &str = "CDS_TERMINOLOGY_URL";
    pub const TERMINOLOGY_TIMEOUT_SECS: &str = "CDS_TERMINOLOGY_TIMEOUT_SECS";
    pub const RULES_MEDICATION_CONDITION: &str = "CDS_RULES_MEDICATION_CONDITION";
    pub const RULES_MEDICATION_MEDICATION: &str = "CDS_RULES_MEDICATION_MEDICATION";
    pub const RULES_DOSE_FORMS: &str = "CDS_RULES_DOSE_FORMS";
    pub const RULES_SUBSTANCE_DDD: &str = "CDS_RULES_SUBSTANCE_DDD";
    pub const ACCEPTABLE_DAILY_DOSE_FACTOR: &str = "CDS_ACCEPTABLE_DAILY_DOSE_FACTOR";
    pub const MAXIMUM_DAILY_DOSE_FACTOR: &str = "CDS_MAXIMUM_DAILY_DOSE_FACTOR";
    pub const CARD_SUMMARY_TEMPLATE: &str = "CDS_CARD_SUMMARY_TEMPLATE";
    pub const ATC_URL_TEMPLATE: &str = "CDS_ATC_URL_TEMPLATE";
}

/// Build a `CoreConfig` from named settings.
///
/// `lookup` maps a variable name from [`env`] to its raw value. Binaries pass
/// `|name| std::env::var(name).ok()`.
///
/// # Errors
///
/// Returns `CdsError::InvalidConfig` if any value fails its `*_from_env_value` check.
pub fn core_config_from_lookup(lookup: impl Fn(&str) -> Option<String>) -> CdsResult<CoreConfig> {
    let rule_paths = RulePaths {
        medication_condition: path_from_env_value(
            lookup(env::RULES_MEDICATION_CONDITION),
            DEFAULT_RULES_MEDICATION_CONDITION,
        ),
        medication_medication: path_from_env_value(
            lookup(env::RULES_MEDICATION_MEDICATION),
            DEFAULT_RULES_MEDICATION_MEDICATION,
        ),
        dose_forms: path_from_env_value(lookup(env::RULES_DOSE_FORMS), DEFAULT_RULES_DOSE_FORMS),
        substance_ddd: path_from_env_value(
            lookup(env::RULES_SUBSTANCE_DDD),
            DEFAULT_RULES_SUBSTANCE_DDD,
        ),
    };

    CoreConfig::new(
        text_from_env_value(lookup(env::TERMINOLOGY_URL), DEFAULT_TERMINOLOGY_URL),
        timeout_secs_from_env_value(lookup(env::TERMINOLOGY_TIMEOUT_SECS))?,
        rule_paths,
        dose_thresholds_from_env_values(
            lookup(env::ACCEPTABLE_DAILY_DOSE_FACTOR),
            lookup(env::MAXIMUM_DAILY_DOSE_FACTOR),
        )?,
        text_from_env_value(
            lookup(env::CARD_SUMMARY_TEMPLATE),
            DEFAULT_CARD_SUMMARY_TEMPLATE,
        ),
        text_from_env_value(lookup(env::ATC_URL_TEMPLATE), DEFAULT_ATC_URL_TEMPLATE),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dose_factor_defaults_when_unset_or_blank() {
        assert_eq!(dose_factor_from_env_value(None, 2.0).unwrap(), 2.0);
        assert_eq!(
            dose_factor_from_env_value(Some("  ".into()), 4.0).unwrap(),
            4.0
        );
        assert_eq!(
            dose_factor_from_env_value(Some(" 1.5 ".into()), 4.0).unwrap(),
            1.5
        );
    }

    #[test]
    fn dose_factor_rejects_garbage_and_non_positive() {
        assert!(dose_factor_from_env_value(Some("abc".into()), 2.0).is_err());
        assert!(dose_factor_from_env_value(Some("0".into()), 2.0).is_err());
        assert!(dose_factor_from_env_value(Some("-1".into()), 2.0).is_err());
        assert!(dose_factor_from_env_value(Some("NaN".into()), 2.0).is_err());
    }

    #[test]
    fn thresholds_must_be_ordered() {
        let err = dose_thresholds_from_env_values(Some("5".into()), Some("3".into()))
            .expect_err("acceptable above maximum");
        assert!(matches!(err, CdsError::InvalidConfig(_)));

        let thresholds = dose_thresholds_from_env_values(None, None).unwrap();
        assert_eq!(thresholds.acceptable(), DEFAULT_ACCEPTABLE_DAILY_DOSE_FACTOR);
        assert_eq!(thresholds.maximum(), DEFAULT_MAXIMUM_DAILY_DOSE_FACTOR);
    }

    #[test]
    fn timeout_must_be_positive_integer() {
        assert_eq!(
            timeout_secs_from_env_value(None).unwrap(),
            DEFAULT_TERMINOLOGY_TIMEOUT_SECS
        );
        assert_eq!(timeout_secs_from_env_value(Some("10".into())).unwrap(), 10);
        assert!(timeout_secs_from_env_value(Some("0".into())).is_err());
        assert!(timeout_secs_from_env_value(Some("2.5".into())).is_err());
    }

    #[test]
    fn paths_and_templates_fall_back_to_defaults() {
        assert_eq!(
            path_from_env_value(None, DEFAULT_RULES_DOSE_FORMS),
            PathBuf::from(DEFAULT_RULES_DOSE_FORMS)
        );
        assert_eq!(
            path_from_env_value(Some("/srv/rules/forms.tsv".into()), DEFAULT_RULES_DOSE_FORMS),
            PathBuf::from("/srv/rules/forms.tsv")
        );
        assert_eq!(
            text_from_env_value(Some("".into()), DEFAULT_ATC_URL_TEMPLATE),
            DEFAULT_ATC_URL_TEMPLATE
        );
    }

    #[test]
    fn core_config_validates_inputs() {
        let ok = CoreConfig::new(
            "http://localhost:8080/fhir".into(),
            5,
            RulePaths::default(),
            DoseThresholds::default(),
            DEFAULT_CARD_SUMMARY_TEMPLATE.into(),
            DEFAULT_ATC_URL_TEMPLATE.into(),
        )
        .expect("valid config");
        assert_eq!(ok.terminology_timeout_secs(), 5);

        let err = CoreConfig::new(
            " ".into(),
            5,
            RulePaths::default(),
            DoseThresholds::default(),
            DEFAULT_CARD_SUMMARY_TEMPLATE.into(),
            DEFAULT_ATC_URL_TEMPLATE.into(),
        )
        .expect_err("blank url");
        assert!(matches!(err, CdsError::InvalidConfig(_)));
    }

    #[test]
    fn config_from_lookup_reads_named_settings() {
        let vars = std::collections::HashMap::from([
            (env::TERMINOLOGY_URL, "http://localhost:8080/fhir"),
            (env::RULES_DOSE_FORMS, "/srv/rules/forms.tsv"),
            (env::MAXIMUM_DAILY_DOSE_FACTOR, "5"),
        ]);
        let cfg = core_config_from_lookup(|name| vars.get(name).map(|v| v.to_string()))
            .expect("config");
        assert_eq!(cfg.terminology_url(), "http://localhost:8080/fhir");
        assert_eq!(cfg.dose_forms_table(), Path::new("/srv/rules/forms.tsv"));
        assert_eq!(
            cfg.substance_ddd_table(),
            Path::new(DEFAULT_RULES_SUBSTANCE_DDD)
        );
        assert_eq!(cfg.thresholds().maximum(), 5.0);

        let err = core_config_from_lookup(|name| {
            (name == env::ACCEPTABLE_DAILY_DOSE_FACTOR).then(|| "ten".to_string())
        })
        .expect_err("bad factor");
        assert!(matches!(err, CdsError::InvalidConfig(_)));
    }
}
