use serde::{Deserialize, Serialize};

pub mod defaults;
pub mod parser;
pub mod substitution;
pub mod validator;

pub use defaults::*;
pub use parser::*;
pub use substitution::*;
pub use validator::*;

// ==================================================================================
// ENGINE CONFIG
// ==================================================================================

/// Screening limits and concurrency for the strategy engine
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct EngineConfig {
    /// Furthest expiration considered, in calendar days
    #[serde(default = "default_max_days")]
    pub max_days: u32,
    /// Number of ranked strategies returned per symbol
    #[serde(default = "default_top_n")]
    pub top_n: usize,
    /// Maximum chain fetches in flight per screen
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,
    #[serde(default = "default_fetch_timeout_seconds")]
    pub fetch_timeout_seconds: u64,
    /// Trailing calendar window for historical volatility
    #[serde(default = "default_history_window_days")]
    pub history_window_days: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_days: default_max_days(),
            top_n: default_top_n(),
            max_concurrency: default_max_concurrency(),
            fetch_timeout_seconds: default_fetch_timeout_seconds(),
            history_window_days: default_history_window_days(),
        }
    }
}

// ==================================================================================
// SCORING / SELECTION / PRICING
// ==================================================================================

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ScoringConfig {
    #[serde(default = "default_probability_weight")]
    pub probability_weight: f64,
    #[serde(default = "default_roi_weight")]
    pub roi_weight: f64,
    #[serde(default = "default_risk_weight")]
    pub risk_weight: f64,
    /// Multiplier applied to ROI before clamping into the composite score
    #[serde(default = "default_roi_scale")]
    pub roi_scale: f64,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            probability_weight: default_probability_weight(),
            roi_weight: default_roi_weight(),
            risk_weight: default_risk_weight(),
            roi_scale: default_roi_scale(),
        }
    }
}

impl ScoringConfig {
    pub fn weight_sum(&self) -> f64 {
        self.probability_weight + self.roi_weight + self.risk_weight
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct SelectionConfig {
    /// Minimum distance of short strikes from spot, in percent
    #[serde(default = "default_min_otm_percent")]
    pub min_otm_percent: f64,
    /// Target distance between spread legs, in dollars
    #[serde(default = "default_min_spread_width")]
    pub min_spread_width: f64,
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            min_otm_percent: default_min_otm_percent(),
            min_spread_width: default_min_spread_width(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct PricingConfig {
    /// Annualized risk-free rate as a decimal
    #[serde(default = "default_risk_free_rate")]
    pub risk_free_rate: f64,
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self {
            risk_free_rate: default_risk_free_rate(),
        }
    }
}

// ==================================================================================
// PROVIDER CONFIG
// ==================================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderKind {
    /// Yahoo Finance over HTTP
    Yahoo,
    /// JSON fixture file, for offline runs
    Static,
}

impl std::fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProviderKind::Yahoo => write!(f, "yahoo"),
            ProviderKind::Static => write!(f, "static"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ProviderConfig {
    #[serde(default = "default_provider_kind")]
    pub kind: ProviderKind,
    #[serde(default = "default_yahoo_base_url")]
    pub base_url: String,
    /// Fixture file for the static provider
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fixture_path: Option<String>,
    #[serde(default = "default_provider_timeout_seconds")]
    pub timeout_seconds: u64,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    #[serde(default = "default_rsi_period")]
    pub rsi_period: usize,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            kind: default_provider_kind(),
            base_url: default_yahoo_base_url(),
            fixture_path: None,
            timeout_seconds: default_provider_timeout_seconds(),
            user_agent: default_user_agent(),
            rsi_period: default_rsi_period(),
        }
    }
}

// ==================================================================================
// RESULT FILTERS
// ==================================================================================

/// Default post-ranking filters applied to screening output
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct FilterConfig {
    /// Minimum ROI, in percent
    #[serde(default = "default_min_roi")]
    pub min_roi: f64,
    /// Minimum probability of any profit, in percent
    #[serde(default = "default_min_probability")]
    pub min_probability: f64,
    /// Maximum RSI of the underlying
    #[serde(default = "default_max_rsi")]
    pub max_rsi: f64,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            min_roi: default_min_roi(),
            min_probability: default_min_probability(),
            max_rsi: default_max_rsi(),
        }
    }
}

// ==================================================================================
// SERVER / LOGGING / METRICS
// ==================================================================================

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct HttpConfig {
    /// Host address - can be env var placeholder like "[STRATIFY_HOST]"
    #[serde(default = "default_host")]
    pub host: String,
    /// Fallback address if env var is not set
    #[serde(default = "default_host")]
    pub fallback: String,
    #[serde(default = "default_http_port")]
    pub http_port: u16,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            fallback: default_host(),
            http_port: default_http_port(),
        }
    }
}

impl HttpConfig {
    /// Resolve the host by extracting env var name from brackets and looking it up
    pub fn resolve_host(&self) -> String {
        if self.host.starts_with('[') && self.host.ends_with(']') {
            let env_var = &self.host[1..self.host.len() - 1];
            get_env_or_default(env_var, &self.fallback)
        } else {
            self.host.clone()
        }
    }

    /// Get the full HTTP address (host:http_port)
    pub fn http_address(&self) -> String {
        format!("{}:{}", self.resolve_host(), self.http_port)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// pretty, json or compact
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            format: default_log_format(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct MetricsConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_metrics_port")]
    pub port: u16,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            port: default_metrics_port(),
        }
    }
}

// ==================================================================================
// TOP LEVEL
// ==================================================================================

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct StratifyConfig {
    #[serde(default)]
    pub engine: EngineConfig,
    #[serde(default)]
    pub scoring: ScoringConfig,
    #[serde(default)]
    pub selection: SelectionConfig,
    #[serde(default)]
    pub pricing: PricingConfig,
    #[serde(default)]
    pub provider: ProviderConfig,
    #[serde(default)]
    pub filters: FilterConfig,
    #[serde(default)]
    pub server: HttpConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub metrics: MetricsConfig,
    /// Symbols screened when none are given explicitly
    #[serde(default = "default_watchlist")]
    pub watchlist: Vec<String>,
}

impl Default for StratifyConfig {
    fn default() -> Self {
        Self {
            engine: EngineConfig::default(),
            scoring: ScoringConfig::default(),
            selection: SelectionConfig::default(),
            pricing: PricingConfig::default(),
            provider: ProviderConfig::default(),
            filters: FilterConfig::default(),
            server: HttpConfig::default(),
            logging: LoggingConfig::default(),
            metrics: MetricsConfig::default(),
            watchlist: default_watchlist(),
        }
    }
}
