//! Bull call debit spread

use common::{LegAction, OptionType, StrategyKind};

use super::{leg_volatility, pick, price_leg, Assessment, EvaluationContext, Result, Strategy};
use crate::probability::ProfitBand;
use crate::scoring::{percent_above, roi_on_risk, RiskTransform};
use crate::selection::BULL_CALL_TIERS;
use crate::types::{EvaluationConfig, StrategyCandidate};

/// Buy a call near spot, sell a higher call
#[derive(Debug, Clone, Copy, Default)]
pub struct BullCallSpread;

impl Strategy for BullCallSpread {
    fn kind(&self) -> StrategyKind {
        StrategyKind::BullCallSpread
    }

    fn evaluate(
        &self,
        ctx: &EvaluationContext<'_>,
        config: &EvaluationConfig,
    ) -> Result<StrategyCandidate> {
        let ladder = ctx.ladder(OptionType::Call)?;
        let chosen = pick(&ladder, &ctx.selection(config), BULL_CALL_TIERS)?;
        let low_contract = ladder.contract(chosen.primary);
        let high_contract = ladder.contract(chosen.secondary.unwrap_or(chosen.primary));

        let buy = price_leg(low_contract, LegAction::Buy)?;
        let sell = price_leg(high_contract, LegAction::Sell)?;

        let debit = (buy.price - sell.price).max(0.0);
        let (k_low, k_high) = (buy.strike, sell.strike);
        let max_profit = (k_high - k_low).abs() - debit;

        let legs = vec![buy, sell];
        let vol = leg_volatility(&legs, ctx);
        let distance = percent_above(ctx.spot(), k_low).map(f64::abs);

        let assessment = Assessment {
            legs,
            short_strike: Some(high_contract.label()),
            long_strike: Some(low_contract.label()),
            net_premium: -debit,
            max_profit: Some(max_profit),
            max_loss: debit,
            roi_percent: roi_on_risk(max_profit, debit),
            max_band: ProfitBand::above(k_high, vol.sigma),
            any_band: ProfitBand::above(k_low + debit, vol.sigma),
            breakevens: vec![k_low + debit],
            risk_score: RiskTransform::Falling { slope: 3.0 }.score(distance),
            volatility: vol,
        };
        Ok(assessment.into_candidate(self.kind(), ctx, config))
    }
}

#[cfg(test)]
mod tests {
    use super::super::fixtures::*;
    use super::*;
    use common::{OptionChain, OptionContract};

    #[test]
    fn test_bull_call_spread() {
        let u = underlying();
        let c = chain();
        let ctx = EvaluationContext::new(&u, &c, HV, as_of());
        let candidate = BullCallSpread.evaluate(&ctx, &config()).unwrap();

        // buy 103 at 1.15, sell 108 at 0.30
        assert_eq!(candidate.long_strike.as_deref(), Some("103.00c"));
        assert_eq!(candidate.short_strike.as_deref(), Some("108.00c"));
        assert!((candidate.net_premium + 0.85).abs() < 1e-9);
        assert!((candidate.max_profit.unwrap() - 4.15).abs() < 1e-9);
        assert!((candidate.max_loss - 0.85).abs() < 1e-9);
        assert_eq!(candidate.roi_percent, 488.24);
        assert_eq!(candidate.breakevens, vec![103.85]);
        assert_eq!(candidate.risk_score, 91.0);
        assert!(candidate.prob_any_profit > candidate.prob_max_profit);
    }

    #[test]
    fn test_free_spread_has_zero_roi() {
        // sell side richer than the buy side: debit floors at zero
        let u = underlying();
        let c = OptionChain::new(
            expiry(),
            vec![],
            vec![
                OptionContract::call(103.0).with_ask(0.50),
                OptionContract::call(108.0).with_bid(0.80),
            ],
        );
        let ctx = EvaluationContext::new(&u, &c, HV, as_of());
        let candidate = BullCallSpread.evaluate(&ctx, &config()).unwrap();
        assert_eq!(candidate.max_loss, 0.0);
        assert_eq!(candidate.roi_percent, 0.0);
        assert_eq!(candidate.max_profit, Some(5.0));
    }

    #[test]
    fn test_in_the_money_low_strike_risk_uses_distance_magnitude() {
        let u = underlying();
        let c = OptionChain::new(
            expiry(),
            vec![],
            vec![
                OptionContract::call(90.0).with_ask(10.5),
                OptionContract::call(95.0).with_bid(6.0),
            ],
        );
        let ctx = EvaluationContext::new(&u, &c, HV, as_of());
        let candidate = BullCallSpread.evaluate(&ctx, &config()).unwrap();
        assert_eq!(candidate.long_strike.as_deref(), Some("90.00c"));
        // |90 - 100| / 100 = 10% -> 100 - 30
        assert_eq!(candidate.risk_score, 70.0);
    }
}
