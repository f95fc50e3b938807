pub fn default_enabled() -> bool {
    true
}

pub fn default_max_days() -> u32 {
    21
}

pub fn default_top_n() -> usize {
    20
}

pub fn default_max_concurrency() -> usize {
    8
}

pub fn default_fetch_timeout_seconds() -> u64 {
    10
}

pub fn default_history_window_days() -> u32 {
    90
}

pub fn default_probability_weight() -> f64 {
    0.70
}

pub fn default_roi_weight() -> f64 {
    0.20
}

pub fn default_risk_weight() -> f64 {
    0.10
}

pub fn default_roi_scale() -> f64 {
    1.5
}

pub fn default_min_otm_percent() -> f64 {
    2.5
}

pub fn default_min_spread_width() -> f64 {
    5.0
}

pub fn default_risk_free_rate() -> f64 {
    0.045
}

pub fn default_provider_kind() -> super::ProviderKind {
    super::ProviderKind::Yahoo
}

pub fn default_yahoo_base_url() -> String {
    "https://query2.finance.yahoo.com".to_string()
}

pub fn default_provider_timeout_seconds() -> u64 {
    10
}

pub fn default_user_agent() -> String {
    "Mozilla/5.0 (compatible; stratify/0.1)".to_string()
}

pub fn default_rsi_period() -> usize {
    14
}

pub fn default_min_roi() -> f64 {
    0.0
}

pub fn default_min_probability() -> f64 {
    0.0
}

pub fn default_max_rsi() -> f64 {
    100.0
}

pub fn default_host() -> String {
    "0.0.0.0".to_string()
}

pub fn default_http_port() -> u16 {
    8090
}

pub fn default_log_format() -> String {
    "pretty".to_string()
}

pub fn default_metrics_port() -> u16 {
    9090
}

pub fn default_watchlist() -> Vec<String> {
    ["AAPL", "MSFT", "NVDA", "AMZN", "GOOGL", "META", "TSLA", "SPY", "QQQ", "AMD"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}
