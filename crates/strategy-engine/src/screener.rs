//! Multi-symbol screening
//!
//! The [`Screener`] owns a market data provider and the default evaluation
//! configuration. For every symbol it fetches the underlying once, lists the
//! expirations inside the requested window, fetches those chains with bounded
//! concurrency and runs every strategy against every chain. Failed
//! evaluations are counted by reason rather than aborting the symbol.
//!
//! # Key Invariants
//!
//! - At most `max_concurrency` provider calls are in flight across the whole
//!   screen, and each one is bounded by `fetch_timeout`.
//! - Results come back in request order, one report per distinct symbol.
//! - Per-request overrides never change the screener's defaults.

use std::collections::BTreeMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::{NaiveDate, Utc};
use common::{OptionChain, StrategyKind, Symbol, UnderlyingSnapshot};
use futures::stream::{self, StreamExt};
use market_data::MarketDataProvider;
use observability::{ScreenTimer, ScreenerMetrics};
use tokio::sync::Semaphore;
use tracing::{debug, info, instrument, warn};

use crate::error::{ScreenError, SkipReason, StrategyError};
use crate::ranking::{rank_candidates, sort_by_score, ResultFilters};
use crate::request::{ScreenRequest, ScreenResponse, SymbolReport};
use crate::strategies::{self, EvaluationContext};
use crate::types::{EvaluationConfig, StrategyCandidate};
use crate::volatility::historical_volatility;

/// Limits and defaults for a screener
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScreenerSettings {
    pub max_days: u32,
    pub top_n: usize,
    pub max_concurrency: usize,
    pub fetch_timeout: Duration,
}

impl Default for ScreenerSettings {
    fn default() -> Self {
        Self::from(&config::EngineConfig::default())
    }
}

impl From<&config::EngineConfig> for ScreenerSettings {
    fn from(c: &config::EngineConfig) -> Self {
        Self {
            max_days: c.max_days,
            top_n: c.top_n,
            max_concurrency: c.max_concurrency.max(1),
            fetch_timeout: Duration::from_secs(c.fetch_timeout_seconds),
        }
    }
}

/// Candidates for one symbol plus the evaluations that produced nothing
#[derive(Debug, Clone, PartialEq)]
pub struct Ranking {
    pub candidates: Vec<StrategyCandidate>,
    pub skipped: BTreeMap<SkipReason, usize>,
}

/// Everything fetched once per symbol
struct SymbolData {
    underlying: UnderlyingSnapshot,
    expirations: Vec<NaiveDate>,
    historical_vol: f64,
}

type ChainResult = (NaiveDate, Result<OptionChain, StrategyError>);

pub struct Screener {
    provider: Arc<dyn MarketDataProvider>,
    evaluation: EvaluationConfig,
    filters: ResultFilters,
    settings: ScreenerSettings,
    semaphore: Arc<Semaphore>,
    metrics: ScreenerMetrics,
}

impl Screener {
    pub fn new(
        provider: Arc<dyn MarketDataProvider>,
        evaluation: EvaluationConfig,
        settings: ScreenerSettings,
    ) -> Self {
        let permits = settings.max_concurrency.max(1);
        Self {
            provider,
            evaluation,
            filters: ResultFilters::default(),
            settings: ScreenerSettings {
                max_concurrency: permits,
                ..settings
            },
            semaphore: Arc::new(Semaphore::new(permits)),
            metrics: ScreenerMetrics::default(),
        }
    }

    pub fn from_config(provider: Arc<dyn MarketDataProvider>, config: &config::StratifyConfig) -> Self {
        Self::new(
            provider,
            EvaluationConfig::from_config(config),
            ScreenerSettings::from(&config.engine),
        )
        .with_filters(ResultFilters::from(&config.filters))
    }

    pub fn with_metrics(mut self, metrics: ScreenerMetrics) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn with_filters(mut self, filters: ResultFilters) -> Self {
        self.filters = filters;
        self
    }

    pub fn evaluation(&self) -> &EvaluationConfig {
        &self.evaluation
    }

    pub fn settings(&self) -> &ScreenerSettings {
        &self.settings
    }

    pub fn filters(&self) -> &ResultFilters {
        &self.filters
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    /// Screen every requested symbol
    ///
    /// Symbol-level failures are reported per symbol; only an invalid request
    /// fails the whole call.
    #[instrument(skip(self, request), fields(symbols = request.symbols().len()))]
    pub async fn screen(
        &self,
        request: &ScreenRequest,
        as_of: NaiveDate,
    ) -> common::Result<ScreenResponse> {
        request.validate()?;

        let mut config = self
            .evaluation
            .with_selection(request.otm_percent, request.spread_width);
        if let Some(weights) = request.weights {
            config = config.with_scoring(weights);
        }
        let max_days = request.max_days.unwrap_or(self.settings.max_days);
        let top_n = request.top_n.unwrap_or(self.settings.top_n);
        let filters = request.filters.unwrap_or(self.filters);
        let config = &config;

        let results = stream::iter(request.symbols())
            .map(|symbol| async move {
                self.screen_symbol(symbol, max_days, top_n, config, &filters, as_of)
                    .await
            })
            .buffered(self.settings.max_concurrency)
            .collect::<Vec<_>>()
            .await;

        Ok(ScreenResponse {
            results,
            timestamp: Utc::now(),
        })
    }

    async fn screen_symbol(
        &self,
        symbol: Symbol,
        max_days: u32,
        top_n: usize,
        config: &EvaluationConfig,
        filters: &ResultFilters,
        as_of: NaiveDate,
    ) -> SymbolReport {
        let timer = ScreenTimer::new(&self.metrics);
        let (outcome, skipped) = self
            .rank_with_skips(&symbol, max_days, top_n, config, as_of)
            .await;
        self.metrics.record_symbol(outcome.is_ok());

        match outcome {
            Ok(ranked) => {
                let ranked_count = ranked.len();
                let strategies = filters.apply(ranked);
                info!(
                    symbol = %symbol,
                    ranked = ranked_count,
                    returned = strategies.len(),
                    skipped = skipped.values().sum::<usize>(),
                    elapsed_ms = timer.elapsed().as_millis() as u64,
                    "Screened symbol"
                );
                SymbolReport::Ranked {
                    symbol: symbol.0,
                    strategies,
                    skipped,
                }
            }
            Err(e) => {
                warn!(symbol = %symbol, error = %e, "Symbol produced no strategies");
                SymbolReport::Failed {
                    symbol: symbol.0,
                    error: e.to_string(),
                    skipped,
                }
            }
        }
    }

    /// Diversified top `top_n` candidates for one symbol across all strategies
    #[instrument(skip(self, config), fields(symbol = %symbol))]
    pub async fn rank(
        &self,
        symbol: &Symbol,
        max_days: u32,
        top_n: usize,
        config: &EvaluationConfig,
        as_of: NaiveDate,
    ) -> Result<Ranking, ScreenError> {
        let (outcome, skipped) = self
            .rank_with_skips(symbol, max_days, top_n, config, as_of)
            .await;
        outcome.map(|candidates| Ranking {
            candidates,
            skipped,
        })
    }

    /// Every candidate of one strategy kind, best first, without diversification
    #[instrument(skip(self, config), fields(symbol = %symbol, strategy = kind.as_str()))]
    pub async fn evaluate_strategy(
        &self,
        symbol: &Symbol,
        kind: StrategyKind,
        max_days: u32,
        config: &EvaluationConfig,
        as_of: NaiveDate,
    ) -> Result<Ranking, ScreenError> {
        let data = self.prepare(symbol, max_days, config, as_of).await?;
        let chains = self.fetch_chains(symbol, &data.expirations).await;
        let (mut candidates, skipped) = self.evaluate_chains(&data, &chains, &[kind], config, as_of);
        if candidates.is_empty() {
            return Err(all_failed(&skipped));
        }
        sort_by_score(&mut candidates);
        Ok(Ranking {
            candidates,
            skipped,
        })
    }

    async fn rank_with_skips(
        &self,
        symbol: &Symbol,
        max_days: u32,
        top_n: usize,
        config: &EvaluationConfig,
        as_of: NaiveDate,
    ) -> (
        Result<Vec<StrategyCandidate>, ScreenError>,
        BTreeMap<SkipReason, usize>,
    ) {
        let data = match self.prepare(symbol, max_days, config, as_of).await {
            Ok(data) => data,
            Err(e) => return (Err(e), BTreeMap::new()),
        };
        let chains = self.fetch_chains(symbol, &data.expirations).await;
        let (candidates, skipped) =
            self.evaluate_chains(&data, &chains, &StrategyKind::ALL, config, as_of);

        if candidates.is_empty() {
            let err = all_failed(&skipped);
            return (Err(err), skipped);
        }
        (Ok(rank_candidates(candidates, top_n)), skipped)
    }

    /// Underlying snapshot, in-window expirations and historical volatility
    async fn prepare(
        &self,
        symbol: &Symbol,
        max_days: u32,
        config: &EvaluationConfig,
        as_of: NaiveDate,
    ) -> Result<SymbolData, ScreenError> {
        let underlying = self
            .bounded(self.provider.underlying(symbol.as_str(), config.history_window_days))
            .await
            .map_err(|e| ScreenError::MarketData(e.to_string()))?;

        let listed = self
            .bounded(self.provider.expirations(symbol.as_str()))
            .await
            .map_err(|e| ScreenError::MarketData(e.to_string()))?;
        if listed.is_empty() {
            return Err(ScreenError::NoExpirations);
        }

        let expirations = expirations_in_window(&listed, as_of, max_days);
        if expirations.is_empty() {
            debug!(symbol = %symbol, listed = listed.len(), max_days, "No expirations within range");
            return Err(ScreenError::NoExpirationsInRange);
        }

        let historical_vol = historical_volatility(&underlying.history, config.history_window_days);
        debug!(
            symbol = %symbol,
            spot = ?underlying.spot,
            expirations = expirations.len(),
            historical_vol,
            "Prepared symbol"
        );
        Ok(SymbolData {
            underlying,
            expirations,
            historical_vol,
        })
    }

    /// One chain per expiration, in expiration order
    async fn fetch_chains(&self, symbol: &Symbol, expirations: &[NaiveDate]) -> Vec<ChainResult> {
        stream::iter(expirations.iter().copied())
            .map(|expiration| async move {
                let chain = self
                    .bounded(self.provider.option_chain(symbol.as_str(), expiration))
                    .await
                    .map_err(|e| {
                        warn!(symbol = %symbol, %expiration, error = %e, "Chain fetch failed");
                        match e {
                            FetchError::Timeout(after) => StrategyError::FetchTimeout(after),
                            FetchError::Provider(msg) => StrategyError::ChainFetchFailed(msg),
                        }
                    });
                (expiration, chain)
            })
            .buffered(self.settings.max_concurrency)
            .collect()
            .await
    }

    fn evaluate_chains(
        &self,
        data: &SymbolData,
        chains: &[ChainResult],
        kinds: &[StrategyKind],
        config: &EvaluationConfig,
        as_of: NaiveDate,
    ) -> (Vec<StrategyCandidate>, BTreeMap<SkipReason, usize>) {
        let mut candidates = Vec::new();
        let mut skipped: BTreeMap<SkipReason, usize> = BTreeMap::new();

        for (expiration, chain) in chains {
            for &kind in kinds {
                self.metrics.record_evaluation(kind.as_str());
                let result = chain.as_ref().map_err(Clone::clone).and_then(|chain| {
                    let ctx =
                        EvaluationContext::new(&data.underlying, chain, data.historical_vol, as_of);
                    strategies::evaluate(kind, &ctx, config)
                });
                match result {
                    Ok(candidate) => {
                        self.metrics.record_candidate(kind.as_str());
                        candidates.push(candidate);
                    }
                    Err(e) => {
                        let reason = e.skip_reason();
                        debug!(
                            symbol = %data.underlying.symbol,
                            strategy = kind.as_str(),
                            %expiration,
                            %reason,
                            "Skipping evaluation"
                        );
                        self.metrics.record_skip(reason.as_str());
                        *skipped.entry(reason).or_default() += 1;
                    }
                }
            }
        }
        (candidates, skipped)
    }

    /// Run a provider call under the shared permit pool and the fetch timeout
    async fn bounded<T, F>(&self, call: F) -> Result<T, FetchError>
    where
        F: Future<Output = market_data::Result<T>>,
    {
        // the pool is never closed, so a failed acquire cannot happen in practice
        let _permit = self.semaphore.acquire().await.ok();
        self.metrics.fetch_started();
        let result = tokio::time::timeout(self.settings.fetch_timeout, call).await;
        self.metrics.fetch_finished();
        match result {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => Err(FetchError::Provider(e.to_string())),
            Err(_) => Err(FetchError::Timeout(self.settings.fetch_timeout)),
        }
    }
}

#[derive(Debug)]
enum FetchError {
    Provider(String),
    Timeout(Duration),
}

impl std::fmt::Display for FetchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FetchError::Provider(msg) => f.write_str(msg),
            FetchError::Timeout(after) => write!(f, "timed out after {:?}", after),
        }
    }
}

/// Parse, window and order listed expirations
///
/// Unparseable entries are skipped. The window is `1..=max_days` calendar
/// days after `as_of`.
pub fn expirations_in_window(listed: &[String], as_of: NaiveDate, max_days: u32) -> Vec<NaiveDate> {
    let mut out: Vec<NaiveDate> = listed
        .iter()
        .filter_map(|s| NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").ok())
        .filter(|d| {
            let days = (*d - as_of).num_days();
            days >= 1 && days <= i64::from(max_days)
        })
        .collect();
    out.sort();
    out.dedup();
    out
}

fn all_failed(skipped: &BTreeMap<SkipReason, usize>) -> ScreenError {
    let summary = skipped
        .iter()
        .map(|(reason, count)| format!("{}: {}", reason, count))
        .collect::<Vec<_>>()
        .join(", ");
    ScreenError::AllEvaluationsFailed(summary)
}
