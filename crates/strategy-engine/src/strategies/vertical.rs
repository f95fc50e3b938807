//! Credit verticals: bull put and bear call spreads

use common::{LegAction, OptionType, StrategyKind};

use super::{leg_volatility, pick, price_leg, Assessment, EvaluationContext, Result, Strategy};
use crate::probability::ProfitBand;
use crate::scoring::{percent_above, percent_below, roi_on_risk, RiskTransform};
use crate::selection::{Tier, BEAR_CALL_TIERS, BULL_PUT_TIERS};
use crate::types::{EvaluationConfig, StrategyCandidate};

const CREDIT_SPREAD_RISK: RiskTransform = RiskTransform::Rising { slope: 5.0 };

/// Sell a put below spot, buy a further-out put
#[derive(Debug, Clone, Copy, Default)]
pub struct BullPutSpread;

/// Sell a call above spot, buy a further-out call
#[derive(Debug, Clone, Copy, Default)]
pub struct BearCallSpread;

impl Strategy for BullPutSpread {
    fn kind(&self) -> StrategyKind {
        StrategyKind::BullPutSpread
    }

    fn evaluate(
        &self,
        ctx: &EvaluationContext<'_>,
        config: &EvaluationConfig,
    ) -> Result<StrategyCandidate> {
        credit_spread(ctx, config, OptionType::Put, BULL_PUT_TIERS)
            .map(|a| a.into_candidate(self.kind(), ctx, config))
    }
}

impl Strategy for BearCallSpread {
    fn kind(&self) -> StrategyKind {
        StrategyKind::BearCallSpread
    }

    fn evaluate(
        &self,
        ctx: &EvaluationContext<'_>,
        config: &EvaluationConfig,
    ) -> Result<StrategyCandidate> {
        credit_spread(ctx, config, OptionType::Call, BEAR_CALL_TIERS)
            .map(|a| a.into_candidate(self.kind(), ctx, config))
    }
}

fn credit_spread(
    ctx: &EvaluationContext<'_>,
    config: &EvaluationConfig,
    side: OptionType,
    tiers: &[Tier],
) -> Result<Assessment> {
    let ladder = ctx.ladder(side)?;
    let chosen = pick(&ladder, &ctx.selection(config), tiers)?;
    let short_contract = ladder.contract(chosen.primary);
    let long_contract = ladder.contract(chosen.secondary.unwrap_or(chosen.primary));

    let short = price_leg(short_contract, LegAction::Sell)?;
    let long = price_leg(long_contract, LegAction::Buy)?;

    let credit = (short.price - long.price).max(0.0);
    let gap = (short.strike - long.strike).abs();
    let max_loss = gap - credit;
    let short_strike = short.strike;

    let legs = vec![short, long];
    let vol = leg_volatility(&legs, ctx);
    let sigma = vol.sigma;

    // Puts profit above the short strike, calls below it
    let (max_band, any_band, breakeven, distance) = match side {
        OptionType::Put => (
            ProfitBand::above(short_strike, sigma),
            ProfitBand::above(short_strike - credit, sigma),
            short_strike - credit,
            percent_below(ctx.spot(), short_strike),
        ),
        OptionType::Call => (
            ProfitBand::below(short_strike, sigma),
            ProfitBand::below(short_strike + credit, sigma),
            short_strike + credit,
            percent_above(ctx.spot(), short_strike),
        ),
    };

    Ok(Assessment {
        legs,
        short_strike: Some(short_contract.label()),
        long_strike: Some(long_contract.label()),
        net_premium: credit,
        max_profit: Some(credit),
        max_loss,
        roi_percent: roi_on_risk(credit, max_loss),
        max_band,
        any_band,
        breakevens: vec![breakeven],
        risk_score: CREDIT_SPREAD_RISK.score(distance),
        volatility: vol,
    })
}
