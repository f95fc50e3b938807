use crate::*;
use thiserror::Error;

/// Tolerance for the scoring weights summing to one
pub const WEIGHT_SUM_TOLERANCE: f64 = 1e-6;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("{field} must be a positive integer")]
    InvalidPositiveInteger { field: String },

    #[error("{field} must be a positive float")]
    InvalidPositiveFloat { field: String },

    #[error("{field} must be between 0 and 100, got: {value}")]
    InvalidPercentageRange { field: String, value: f64 },

    #[error("Scoring weight {field} must be non-negative, got: {value}")]
    NegativeWeight { field: String, value: f64 },

    #[error("Scoring weights must sum to 1.0, got: {sum}")]
    InvalidWeightSum { sum: f64 },

    #[error("Provider '{kind}': {message}")]
    InvalidProvider { kind: String, message: String },

    #[error("Invalid log format '{0}'. Must be one of: pretty, json, compact")]
    InvalidLogFormat(String),

    #[error("Watchlist entry {index} is blank")]
    BlankWatchlistSymbol { index: usize },

    #[error("Environment variable '{var}' is missing or invalid: {message}")]
    InvalidEnvVar { var: String, message: String },
}

#[derive(Debug, Clone)]
pub struct ValidationWarning {
    pub field: String,
    pub message: String,
}

#[derive(Debug, Clone)]
pub struct DefaultApplied {
    pub field: String,
    pub value: String,
}

#[derive(Debug, Clone)]
pub struct ValidationReport {
    pub errors: Vec<ValidationError>,
    pub warnings: Vec<ValidationWarning>,
    pub defaults_applied: Vec<DefaultApplied>,
}

impl ValidationReport {
    pub fn new() -> Self {
        Self {
            errors: Vec::new(),
            warnings: Vec::new(),
            defaults_applied: Vec::new(),
        }
    }

    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn add_error(&mut self, error: ValidationError) {
        self.errors.push(error);
    }

    pub fn add_warning(&mut self, field: &str, message: &str) {
        self.warnings.push(ValidationWarning {
            field: field.to_string(),
            message: message.to_string(),
        });
    }

    pub fn add_default(&mut self, field: &str, value: &str) {
        self.defaults_applied.push(DefaultApplied {
            field: field.to_string(),
            value: value.to_string(),
        });
    }
}

impl Default for ValidationReport {
    fn default() -> Self {
        Self::new()
    }
}

pub fn validate_config(config: &StratifyConfig) -> ValidationReport {
    let mut report = ValidationReport::new();

    validate_engine(&config.engine, &mut report);
    validate_scoring(&config.scoring, &mut report);
    validate_selection(&config.selection, &mut report);
    validate_pricing(&config.pricing, &mut report);
    validate_provider(&config.provider, &mut report);
    validate_filters(&config.filters, &mut report);
    validate_logging(&config.logging, &mut report);
    validate_watchlist(&config.watchlist, &mut report);

    report
}

fn validate_engine(engine: &EngineConfig, report: &mut ValidationReport) {
    if engine.max_days == 0 {
        report.add_error(ValidationError::InvalidPositiveInteger {
            field: "engine.max_days".to_string(),
        });
    }
    if engine.top_n == 0 {
        report.add_error(ValidationError::InvalidPositiveInteger {
            field: "engine.top_n".to_string(),
        });
    }
    if engine.max_concurrency == 0 {
        report.add_error(ValidationError::InvalidPositiveInteger {
            field: "engine.max_concurrency".to_string(),
        });
    }
    if engine.fetch_timeout_seconds == 0 {
        report.add_error(ValidationError::InvalidPositiveInteger {
            field: "engine.fetch_timeout_seconds".to_string(),
        });
    }
    if engine.history_window_days < 2 {
        report.add_error(ValidationError::InvalidPositiveInteger {
            field: "engine.history_window_days (at least 2)".to_string(),
        });
    }
    if engine.max_days > 365 {
        report.add_warning(
            "engine.max_days",
            "Expirations beyond one year make screening slow and probabilities flat",
        );
    }
}

fn validate_scoring(scoring: &ScoringConfig, report: &mut ValidationReport) {
    let weights = [
        ("scoring.probability_weight", scoring.probability_weight),
        ("scoring.roi_weight", scoring.roi_weight),
        ("scoring.risk_weight", scoring.risk_weight),
    ];
    for (field, value) in weights {
        if !value.is_finite() || value < 0.0 {
            report.add_error(ValidationError::NegativeWeight {
                field: field.to_string(),
                value,
            });
        }
    }

    let sum = scoring.weight_sum();
    if !sum.is_finite() || (sum - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
        report.add_error(ValidationError::InvalidWeightSum { sum });
    }

    if !scoring.roi_scale.is_finite() || scoring.roi_scale <= 0.0 {
        report.add_error(ValidationError::InvalidPositiveFloat {
            field: "scoring.roi_scale".to_string(),
        });
    }
}

fn validate_selection(selection: &SelectionConfig, report: &mut ValidationReport) {
    let otm = selection.min_otm_percent;
    if !otm.is_finite() || !(0.0..100.0).contains(&otm) {
        report.add_error(ValidationError::InvalidPercentageRange {
            field: "selection.min_otm_percent".to_string(),
            value: otm,
        });
    } else if otm > 20.0 {
        report.add_warning(
            "selection.min_otm_percent",
            "Short strikes more than 20% out of the money rarely carry usable premium",
        );
    }

    if !selection.min_spread_width.is_finite() || selection.min_spread_width <= 0.0 {
        report.add_error(ValidationError::InvalidPositiveFloat {
            field: "selection.min_spread_width".to_string(),
        });
    }
}

fn validate_pricing(pricing: &PricingConfig, report: &mut ValidationReport) {
    let rate = pricing.risk_free_rate;
    if !rate.is_finite() {
        report.add_error(ValidationError::InvalidPositiveFloat {
            field: "pricing.risk_free_rate".to_string(),
        });
    } else if !(0.0..=0.2).contains(&rate) {
        report.add_warning(
            "pricing.risk_free_rate",
            &format!("Risk-free rate {} is outside the usual 0 to 0.2 range", rate),
        );
    }
}

fn validate_provider(provider: &ProviderConfig, report: &mut ValidationReport) {
    match provider.kind {
        ProviderKind::Static => match provider.fixture_path.as_deref() {
            None | Some("") => report.add_error(ValidationError::InvalidProvider {
                kind: provider.kind.to_string(),
                message: "fixture_path is required".to_string(),
            }),
            Some(path) if has_unresolved_env_vars(path) => {
                report.add_error(ValidationError::InvalidEnvVar {
                    var: path.to_string(),
                    message: "fixture_path references an unset variable".to_string(),
                });
            }
            Some(_) => {}
        },
        ProviderKind::Yahoo => {
            if let Err(e) = url::Url::parse(&provider.base_url) {
                report.add_error(ValidationError::InvalidProvider {
                    kind: provider.kind.to_string(),
                    message: format!("Invalid base_url '{}': {}", provider.base_url, e),
                });
            }
        }
    }

    if provider.timeout_seconds == 0 {
        report.add_default("provider.timeout_seconds", &default_provider_timeout_seconds().to_string());
    }
    if provider.rsi_period < 2 {
        report.add_error(ValidationError::InvalidPositiveInteger {
            field: "provider.rsi_period (at least 2)".to_string(),
        });
    }
}

fn validate_filters(filters: &FilterConfig, report: &mut ValidationReport) {
    for (field, value) in [
        ("filters.min_probability", filters.min_probability),
        ("filters.max_rsi", filters.max_rsi),
    ] {
        if !value.is_finite() || !(0.0..=100.0).contains(&value) {
            report.add_error(ValidationError::InvalidPercentageRange {
                field: field.to_string(),
                value,
            });
        }
    }
    if !filters.min_roi.is_finite() {
        report.add_error(ValidationError::InvalidPositiveFloat {
            field: "filters.min_roi".to_string(),
        });
    }
}

fn validate_logging(logging: &LoggingConfig, report: &mut ValidationReport) {
    let valid_formats = ["pretty", "json", "compact"];
    if !valid_formats.contains(&logging.format.to_lowercase().as_str()) {
        report.add_error(ValidationError::InvalidLogFormat(logging.format.clone()));
    }
}

fn validate_watchlist(watchlist: &[String], report: &mut ValidationReport) {
    if watchlist.is_empty() {
        report.add_warning("watchlist", "Watchlist is empty; screen requires explicit symbols");
    }
    for (index, symbol) in watchlist.iter().enumerate() {
        if symbol.trim().is_empty() {
            report.add_error(ValidationError::BlankWatchlistSymbol { index });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn test_default_config_is_valid() {
        let report = validate_config(&StratifyConfig::default());
        assert!(report.is_valid(), "errors: {:?}", report.errors);
        assert!(report.warnings.is_empty());
    }

    #[test]
    fn test_weights_must_sum_to_one() {
        let mut config = StratifyConfig::default();
        config.scoring.roi_weight = 0.5;
        let report = validate_config(&config);
        assert!(!report.is_valid());
        assert_matches!(report.errors[0], ValidationError::InvalidWeightSum { .. });
    }

    #[test]
    fn test_negative_weight_rejected() {
        let mut config = StratifyConfig::default();
        config.scoring.probability_weight = 1.1;
        config.scoring.risk_weight = -0.3;
        let report = validate_config(&config);
        assert!(report
            .errors
            .iter()
            .any(|e| matches!(e, ValidationError::NegativeWeight { field, .. } if field == "scoring.risk_weight")));
    }

    #[test]
    fn test_static_provider_needs_fixture() {
        let mut config = StratifyConfig::default();
        config.provider.kind = ProviderKind::Static;
        let report = validate_config(&config);
        assert_matches!(report.errors[0], ValidationError::InvalidProvider { .. });

        config.provider.fixture_path = Some("fixtures/market.json".to_string());
        assert!(validate_config(&config).is_valid());
    }

    #[test]
    fn test_bad_base_url() {
        let mut config = StratifyConfig::default();
        config.provider.base_url = "not a url".to_string();
        let report = validate_config(&config);
        assert_matches!(report.errors[0], ValidationError::InvalidProvider { .. });
    }

    #[test]
    fn test_otm_percent_range() {
        let mut config = StratifyConfig::default();
        config.selection.min_otm_percent = 100.0;
        assert_matches!(
            validate_config(&config).errors[0],
            ValidationError::InvalidPercentageRange { .. }
        );

        config.selection.min_otm_percent = 25.0;
        let report = validate_config(&config);
        assert!(report.is_valid());
        assert_eq!(report.warnings[0].field, "selection.min_otm_percent");
    }

    #[test]
    fn test_zero_limits_rejected() {
        let mut config = StratifyConfig::default();
        config.engine.top_n = 0;
        config.engine.max_concurrency = 0;
        let report = validate_config(&config);
        assert_eq!(report.errors.len(), 2);
    }

    #[test]
    fn test_empty_watchlist_warns() {
        let mut config = StratifyConfig::default();
        config.watchlist.clear();
        let report = validate_config(&config);
        assert!(report.is_valid());
        assert_eq!(report.warnings[0].field, "watchlist");
    }

    #[test]
    fn test_invalid_log_format() {
        let mut config = StratifyConfig::default();
        config.logging.format = "xml".to_string();
        assert_matches!(
            validate_config(&config).errors[0],
            ValidationError::InvalidLogFormat(_)
        );
    }
}
