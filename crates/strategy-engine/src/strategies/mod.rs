//! The seven strategy evaluators
//!
//! Each evaluator selects its legs from one expiration's chain, prices them,
//! and describes the position as an [`Assessment`]: premiums, payoff bounds,
//! profit bands and a risk score. Turning an assessment into a scored
//! [`StrategyCandidate`] is shared.
//!
//! # Key Invariants
//!
//! - Evaluation is pure: the same context and configuration always produce
//!   the same candidate.
//! - A leg with no usable bid/ask/last price fails the evaluation with
//!   [`StrategyError::NoPricingData`]; zero premiums are never scored.
//! - An empty chain side fails with [`StrategyError::NoOptionsAvailable`].

mod bull_call;
mod iron_condor;
mod single;
mod vertical;

pub use bull_call::BullCallSpread;
pub use iron_condor::IronCondor;
pub use single::{CashSecuredPut, CoveredCall, LongCall};
pub use vertical::{BearCallSpread, BullPutSpread};

use chrono::NaiveDate;
use common::{LegAction, OptionChain, OptionContract, OptionType, StrategyKind, UnderlyingSnapshot};

use crate::error::StrategyError;
use crate::numeric::round_to;
use crate::probability::{ProbabilityModel, ProfitBand};
use crate::scoring::composite_score;
use crate::selection::{select, LegPick, SelectionInput, StrikeLadder, Tier};
use crate::types::{EvaluationConfig, Leg, StrategyCandidate, VolatilityEstimate};
use crate::volatility;

pub type Result<T> = std::result::Result<T, StrategyError>;

/// Market data for one (symbol, expiration) evaluation
#[derive(Debug, Clone, Copy)]
pub struct EvaluationContext<'a> {
    pub underlying: &'a UnderlyingSnapshot,
    pub chain: &'a OptionChain,
    pub days_to_expiry: i64,
    /// Annualized historical volatility of the underlying
    pub historical_vol: f64,
    /// Date the evaluation is run for
    pub as_of: NaiveDate,
}

impl<'a> EvaluationContext<'a> {
    pub fn new(
        underlying: &'a UnderlyingSnapshot,
        chain: &'a OptionChain,
        historical_vol: f64,
        as_of: NaiveDate,
    ) -> Self {
        Self {
            underlying,
            chain,
            days_to_expiry: (chain.expiration - as_of).num_days(),
            historical_vol,
            as_of,
        }
    }

    pub fn spot(&self) -> Option<f64> {
        self.underlying.usable_spot()
    }

    pub fn selection(&self, config: &EvaluationConfig) -> SelectionInput {
        SelectionInput::new(self.spot(), &config.selection)
    }

    pub fn model(&self, config: &EvaluationConfig) -> ProbabilityModel {
        ProbabilityModel::new(
            self.spot(),
            self.days_to_expiry,
            self.underlying.adjusted_rate(config.risk_free_rate),
        )
    }

    /// Non-empty ladder for one side of the chain
    fn ladder(&self, option_type: OptionType) -> Result<StrikeLadder<'a>> {
        let ladder = StrikeLadder::new(self.chain.side(option_type));
        if ladder.is_empty() {
            return Err(StrategyError::NoOptionsAvailable);
        }
        Ok(ladder)
    }

    fn earnings_before_expiry(&self) -> bool {
        self.underlying
            .next_earnings
            .is_some_and(|d| self.as_of <= d && d <= self.chain.expiration)
    }
}

/// A strategy shape that can be evaluated against one expiration
pub trait Strategy: Send + Sync {
    fn kind(&self) -> StrategyKind;

    fn evaluate(
        &self,
        ctx: &EvaluationContext<'_>,
        config: &EvaluationConfig,
    ) -> Result<StrategyCandidate>;
}

/// Evaluator for a strategy kind
pub fn strategy_for(kind: StrategyKind) -> &'static dyn Strategy {
    match kind {
        StrategyKind::BullPutSpread => &BullPutSpread,
        StrategyKind::BearCallSpread => &BearCallSpread,
        StrategyKind::CoveredCall => &CoveredCall,
        StrategyKind::CashSecuredPut => &CashSecuredPut,
        StrategyKind::LongCall => &LongCall,
        StrategyKind::BullCallSpread => &BullCallSpread,
        StrategyKind::IronCondor => &IronCondor,
    }
}

/// Evaluate one strategy kind against one expiration
pub fn evaluate(
    kind: StrategyKind,
    ctx: &EvaluationContext<'_>,
    config: &EvaluationConfig,
) -> Result<StrategyCandidate> {
    strategy_for(kind).evaluate(ctx, config)
}

/// Shape-specific description of a priced position
#[derive(Debug, Clone)]
pub(crate) struct Assessment {
    pub legs: Vec<Leg>,
    pub short_strike: Option<String>,
    pub long_strike: Option<String>,
    pub net_premium: f64,
    pub max_profit: Option<f64>,
    pub max_loss: f64,
    pub roi_percent: f64,
    /// Terminal prices at which the full profit is kept
    pub max_band: ProfitBand,
    /// Terminal prices at which the position makes any money
    pub any_band: ProfitBand,
    pub breakevens: Vec<f64>,
    pub risk_score: f64,
    pub volatility: VolatilityEstimate,
}

impl Assessment {
    pub fn into_candidate(
        self,
        kind: StrategyKind,
        ctx: &EvaluationContext<'_>,
        config: &EvaluationConfig,
    ) -> StrategyCandidate {
        let model = ctx.model(config);
        let prob_max_profit = model.probability(&self.max_band);
        let prob_any_profit = model.probability(&self.any_band);
        let composite = composite_score(
            &config.scoring,
            prob_any_profit,
            self.roi_percent,
            self.risk_score,
        );

        StrategyCandidate {
            symbol: ctx.underlying.symbol.clone(),
            strategy: kind,
            expiration: ctx.chain.expiration,
            days_to_expiry: ctx.days_to_expiry,
            spot: ctx.spot(),
            price_timestamp: ctx.underlying.price_timestamp,
            legs: self.legs,
            short_strike: self.short_strike,
            long_strike: self.long_strike,
            net_premium: round_to(self.net_premium, 2),
            max_profit: self.max_profit.map(|p| round_to(p, 2)),
            max_loss: round_to(self.max_loss, 2),
            roi_percent: round_to(self.roi_percent, 2),
            prob_any_profit: round_to(prob_any_profit, 1),
            prob_max_profit: round_to(prob_max_profit, 1),
            breakevens: self.breakevens.into_iter().map(|b| round_to(b, 2)).collect(),
            risk_score: round_to(self.risk_score, 1),
            composite_score: composite,
            volatility: self.volatility,
            rsi: ctx.underlying.rsi,
            earnings_before_expiry: ctx.earnings_before_expiry(),
        }
    }
}

/// Run the tiers against a ladder, treating "nothing selectable" as no options
fn pick(ladder: &StrikeLadder<'_>, input: &SelectionInput, tiers: &[Tier]) -> Result<LegPick> {
    select(ladder, input, tiers).ok_or(StrategyError::NoOptionsAvailable)
}

/// Price a contract for the given side of the trade
fn price_leg(contract: &OptionContract, action: LegAction) -> Result<Leg> {
    contract
        .price_for(action)
        .map(|price| Leg::new(contract, action, price))
        .ok_or(StrategyError::NoPricingData)
}

/// First usable implied volatility among the legs, in leg order
fn chain_iv(legs: &[Leg]) -> Option<f64> {
    legs.iter().find_map(|l| l.implied_volatility)
}

/// Single-sigma estimate from the legs and the underlying's history
fn leg_volatility(legs: &[Leg], ctx: &EvaluationContext<'_>) -> VolatilityEstimate {
    volatility::blend(chain_iv(legs), ctx.historical_vol)
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    pub fn as_of() -> NaiveDate {
        date(2024, 1, 1)
    }

    /// Expiration 21 days after [`as_of`]
    pub fn expiry() -> NaiveDate {
        date(2024, 1, 22)
    }

    /// Spot 100 with a 0.5% dividend, so the adjusted rate is 4%
    pub fn underlying() -> UnderlyingSnapshot {
        UnderlyingSnapshot::new("TEST")
            .with_spot(100.0)
            .with_dividend_yield(0.005)
            .with_rsi(55.0)
    }

    pub fn quoted(contract: OptionContract, bid: f64, ask: f64) -> OptionContract {
        contract.with_bid(bid).with_ask(ask).with_iv(0.25)
    }

    /// A chain with strikes every few dollars around 100, all at 25% IV
    pub fn chain() -> OptionChain {
        chain_for(expiry())
    }

    pub fn chain_for(expiration: NaiveDate) -> OptionChain {
        OptionChain::new(
            expiration,
            vec![
                quoted(OptionContract::put(85.0), 0.10, 0.15),
                quoted(OptionContract::put(92.0), 0.35, 0.40),
                quoted(OptionContract::put(95.0), 0.70, 0.75),
                quoted(OptionContract::put(97.0), 1.20, 1.25),
                quoted(OptionContract::put(100.0), 2.40, 2.50),
            ],
            vec![
                quoted(OptionContract::call(100.0), 2.60, 2.70),
                quoted(OptionContract::call(103.0), 1.10, 1.15),
                quoted(OptionContract::call(105.0), 0.70, 0.75),
                quoted(OptionContract::call(108.0), 0.30, 0.35),
                quoted(OptionContract::call(115.0), 0.05, 0.10),
            ],
        )
    }

    pub fn config() -> EvaluationConfig {
        EvaluationConfig::default()
    }

    /// Historical vol equal to the chain IV so the blend is exactly 25%
    pub const HV: f64 = 0.25;
}
