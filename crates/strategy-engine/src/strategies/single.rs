//! Single-leg shapes: covered call, cash-secured put, long call

use common::{LegAction, OptionType, StrategyKind};

use super::{leg_volatility, pick, price_leg, Assessment, EvaluationContext, Result, Strategy};
use crate::probability::ProfitBand;
use crate::scoring::{percent_above, percent_below, RiskTransform};
use crate::selection::{CASH_SECURED_PUT_TIERS, COVERED_CALL_TIERS, LONG_CALL_TIERS};
use crate::types::{EvaluationConfig, StrategyCandidate};

/// ROI reported for a long call, whose upside is open-ended
pub const LONG_CALL_ROI: f64 = 100.0;

/// Own the shares, sell an out-of-the-money call against them
#[derive(Debug, Clone, Copy, Default)]
pub struct CoveredCall;

/// Sell a put with cash set aside to buy the shares
#[derive(Debug, Clone, Copy, Default)]
pub struct CashSecuredPut;

/// Buy a call outright
#[derive(Debug, Clone, Copy, Default)]
pub struct LongCall;

impl Strategy for CoveredCall {
    fn kind(&self) -> StrategyKind {
        StrategyKind::CoveredCall
    }

    fn evaluate(
        &self,
        ctx: &EvaluationContext<'_>,
        config: &EvaluationConfig,
    ) -> Result<StrategyCandidate> {
        let ladder = ctx.ladder(OptionType::Call)?;
        let chosen = pick(&ladder, &ctx.selection(config), COVERED_CALL_TIERS)?;
        let contract = ladder.contract(chosen.primary);
        let short = price_leg(contract, LegAction::Sell)?;

        let strike = short.strike;
        let credit = short.price;
        let spot = ctx.spot();

        // Stock is called away above the strike; the premium cushions the downside
        let (max_profit, max_loss, roi, breakevens) = match spot {
            Some(s) => {
                let max_profit = (strike - s).max(0.0) + credit;
                (
                    max_profit,
                    (s - credit).max(0.0),
                    max_profit / s * 100.0,
                    vec![s - credit],
                )
            }
            None => (credit, 0.0, 0.0, Vec::new()),
        };

        let legs = vec![short];
        let vol = leg_volatility(&legs, ctx);
        let assessment = Assessment {
            legs,
            short_strike: Some(contract.label()),
            long_strike: None,
            net_premium: credit,
            max_profit: Some(max_profit),
            max_loss,
            roi_percent: roi,
            max_band: ProfitBand::above(strike, vol.sigma),
            any_band: ProfitBand::above(spot.map_or(0.0, |s| s - credit), vol.sigma),
            breakevens,
            risk_score: RiskTransform::Falling { slope: 5.0 }.score(percent_above(spot, strike)),
            volatility: vol,
        };
        Ok(assessment.into_candidate(self.kind(), ctx, config))
    }
}

impl Strategy for CashSecuredPut {
    fn kind(&self) -> StrategyKind {
        StrategyKind::CashSecuredPut
    }

    fn evaluate(
        &self,
        ctx: &EvaluationContext<'_>,
        config: &EvaluationConfig,
    ) -> Result<StrategyCandidate> {
        let ladder = ctx.ladder(OptionType::Put)?;
        let chosen = pick(&ladder, &ctx.selection(config), CASH_SECURED_PUT_TIERS)?;
        let contract = ladder.contract(chosen.primary);
        let short = price_leg(contract, LegAction::Sell)?;

        let strike = short.strike;
        let credit = short.price;
        let legs = vec![short];
        let vol = leg_volatility(&legs, ctx);

        let assessment = Assessment {
            legs,
            short_strike: Some(contract.label()),
            long_strike: None,
            net_premium: credit,
            max_profit: Some(credit),
            max_loss: (strike - credit).max(0.0),
            // Return on the cash set aside, not on max loss
            roi_percent: credit / strike * 100.0,
            max_band: ProfitBand::above(strike, vol.sigma),
            any_band: ProfitBand::above(strike - credit, vol.sigma),
            breakevens: vec![strike - credit],
            risk_score: RiskTransform::Rising { slope: 5.0 }.score(percent_below(ctx.spot(), strike)),
            volatility: vol,
        };
        Ok(assessment.into_candidate(self.kind(), ctx, config))
    }
}

impl Strategy for LongCall {
    fn kind(&self) -> StrategyKind {
        StrategyKind::LongCall
    }

    fn evaluate(
        &self,
        ctx: &EvaluationContext<'_>,
        config: &EvaluationConfig,
    ) -> Result<StrategyCandidate> {
        let ladder = ctx.ladder(OptionType::Call)?;
        let chosen = pick(&ladder, &ctx.selection(config), LONG_CALL_TIERS)?;
        let contract = ladder.contract(chosen.primary);
        let long = price_leg(contract, LegAction::Buy)?;

        let strike = long.strike;
        let debit = long.price;
        let legs = vec![long];
        let vol = leg_volatility(&legs, ctx);

        let assessment = Assessment {
            legs,
            short_strike: None,
            long_strike: Some(contract.label()),
            net_premium: -debit,
            max_profit: None,
            max_loss: debit,
            roi_percent: LONG_CALL_ROI,
            max_band: ProfitBand::above(strike, vol.sigma),
            any_band: ProfitBand::above(strike + debit, vol.sigma),
            breakevens: vec![strike + debit],
            risk_score: RiskTransform::Falling { slope: 3.0 }.score(percent_above(ctx.spot(), strike)),
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
    fn test_covered_call() {
        let u = underlying();
        let c = chain();
        let ctx = EvaluationContext::new(&u, &c, HV, as_of());
        let candidate = CoveredCall.evaluate(&ctx, &config()).unwrap();

        assert_eq!(candidate.short_strike.as_deref(), Some("103.00c"));
        assert_eq!(candidate.long_strike, None);
        // 3 of upside plus the 1.10 premium
        assert!((candidate.max_profit.unwrap() - 4.10).abs() < 1e-9);
        assert!((candidate.max_loss - 98.90).abs() < 1e-9);
        assert_eq!(candidate.roi_percent, 4.1);
        assert_eq!(candidate.breakevens, vec![98.9]);
        // 100 - 5 * 3%
        assert_eq!(candidate.risk_score, 85.0);
        // keeping the premium is likelier than being called away
        assert!(candidate.prob_any_profit > candidate.prob_max_profit);
    }

    #[test]
    fn test_cash_secured_put() {
        let u = underlying();
        let c = chain();
        let ctx = EvaluationContext::new(&u, &c, HV, as_of());
        let candidate = CashSecuredPut.evaluate(&ctx, &config()).unwrap();

        assert_eq!(candidate.short_strike.as_deref(), Some("97.00p"));
        assert_eq!(candidate.net_premium, 1.20);
        assert!((candidate.max_loss - 95.80).abs() < 1e-9);
        // 1.20 / 97
        assert_eq!(candidate.roi_percent, 1.24);
        assert_eq!(candidate.breakevens, vec![95.8]);
    }

    #[test]
    fn test_long_call() {
        let u = underlying();
        let c = chain();
        let ctx = EvaluationContext::new(&u, &c, HV, as_of());
        let candidate = LongCall.evaluate(&ctx, &config()).unwrap();

        assert_eq!(candidate.long_strike.as_deref(), Some("103.00c"));
        assert_eq!(candidate.short_strike, None);
        assert_eq!(candidate.net_premium, -1.15);
        assert_eq!(candidate.max_profit, None);
        assert_eq!(candidate.max_loss, 1.15);
        assert_eq!(candidate.roi_percent, LONG_CALL_ROI);
        assert_eq!(candidate.breakevens, vec![104.15]);
        // 100 - 3 * 3%
        assert_eq!(candidate.risk_score, 91.0);
        assert!(!candidate.is_credit());
        assert!(candidate.prob_any_profit < candidate.prob_max_profit);
    }

    #[test]
    fn test_falls_back_to_last_price() {
        let u = underlying();
        let c = OptionChain::new(
            expiry(),
            vec![OptionContract::put(95.0).with_bid(0.0).with_last(0.90)],
            vec![],
        );
        let ctx = EvaluationContext::new(&u, &c, HV, as_of());
        let candidate = CashSecuredPut.evaluate(&ctx, &config()).unwrap();
        assert_eq!(candidate.net_premium, 0.90);
    }

    #[test]
    fn test_near_expiry_uses_interpolation() {
        let u = underlying();
        let c = OptionChain::new(
            as_of(),
            vec![OptionContract::put(90.0).with_bid(0.5)],
            vec![],
        );
        let ctx = EvaluationContext::new(&u, &c, HV, as_of());
        assert_eq!(ctx.days_to_expiry, 0);
        let candidate = CashSecuredPut.evaluate(&ctx, &config()).unwrap();
        // one-sided band above 90: 50 + (10 / 100) * 40
        assert_eq!(candidate.prob_max_profit, 54.0);
    }
}
