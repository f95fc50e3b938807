//! Iron condor: a bull put spread and a bear call spread on one expiration.
//!
//! The two wings are priced with separate sigmas. Each side blends its own
//! implied volatility (short leg first, long leg as fallback) with the
//! historical volatility, then both are scaled by a skew factor derived from
//! the spread of all four legs' IVs and floored again.

use common::{LegAction, OptionType, StrategyKind};

use super::{chain_iv, pick, price_leg, Assessment, EvaluationContext, Result, Strategy};
use crate::probability::{Bound, ProfitBand};
use crate::scoring::{percent_above, percent_below, roi_on_risk, RiskTransform};
use crate::selection::{CONDOR_CALL_TIERS, CONDOR_PUT_TIERS};
use crate::types::{EvaluationConfig, Leg, StrategyCandidate, VolatilityEstimate};
use crate::volatility::{self, VOL_FLOOR};

const CONDOR_RISK: RiskTransform = RiskTransform::Rising { slope: 3.0 };

#[derive(Debug, Clone, Copy, Default)]
pub struct IronCondor;

impl Strategy for IronCondor {
    fn kind(&self) -> StrategyKind {
        StrategyKind::IronCondor
    }

    fn evaluate(
        &self,
        ctx: &EvaluationContext<'_>,
        config: &EvaluationConfig,
    ) -> Result<StrategyCandidate> {
        let put_ladder = ctx.ladder(OptionType::Put)?;
        let call_ladder = ctx.ladder(OptionType::Call)?;
        let input = ctx.selection(config);
        let put_pick = pick(&put_ladder, &input, CONDOR_PUT_TIERS)?;
        let call_pick = pick(&call_ladder, &input, CONDOR_CALL_TIERS)?;

        let short_put_contract = put_ladder.contract(put_pick.primary);
        let long_put_contract = put_ladder.contract(put_pick.secondary.unwrap_or(put_pick.primary));
        let short_call_contract = call_ladder.contract(call_pick.primary);
        let long_call_contract =
            call_ladder.contract(call_pick.secondary.unwrap_or(call_pick.primary));

        let short_put = price_leg(short_put_contract, LegAction::Sell)?;
        let long_put = price_leg(long_put_contract, LegAction::Buy)?;
        let short_call = price_leg(short_call_contract, LegAction::Sell)?;
        let long_call = price_leg(long_call_contract, LegAction::Buy)?;

        let put_credit = (short_put.price - long_put.price).max(0.0);
        let call_credit = (short_call.price - long_call.price).max(0.0);
        let net_credit = put_credit + call_credit;
        let put_width = (short_put.strike - long_put.strike).abs();
        let call_width = (long_call.strike - short_call.strike).abs();
        let max_loss = (put_width - put_credit).max(call_width - call_credit);

        let k_put = short_put.strike;
        let k_call = short_call.strike;
        let legs = vec![short_put, long_put, short_call, long_call];
        let vol = wing_volatility(&legs, ctx.historical_vol);
        let (put_sigma, call_sigma) = match (vol.put_sigma, vol.call_sigma) {
            (Some(p), Some(c)) => (p, c),
            _ => (vol.sigma, vol.sigma),
        };

        let distance = percent_below(ctx.spot(), k_put)
            .zip(percent_above(ctx.spot(), k_call))
            .map(|(p, c)| (p + c) / 2.0);

        let assessment = Assessment {
            legs,
            short_strike: Some(format!(
                "{} / {}",
                short_put_contract.label(),
                short_call_contract.label()
            )),
            long_strike: Some(format!(
                "{} / {}",
                long_put_contract.label(),
                long_call_contract.label()
            )),
            net_premium: net_credit,
            max_profit: Some(net_credit),
            max_loss,
            roi_percent: roi_on_risk(net_credit, max_loss),
            max_band: ProfitBand::between(Bound::new(k_put, put_sigma), Bound::new(k_call, call_sigma)),
            any_band: ProfitBand::between(
                Bound::new(k_put - net_credit, put_sigma),
                Bound::new(k_call + net_credit, call_sigma),
            ),
            breakevens: vec![k_put - net_credit, k_call + net_credit],
            risk_score: CONDOR_RISK.score(distance),
            volatility: vol,
        };
        Ok(assessment.into_candidate(self.kind(), ctx, config))
    }
}

/// Per-wing sigmas for legs ordered short put, long put, short call, long call
fn wing_volatility(legs: &[Leg], historical: f64) -> VolatilityEstimate {
    let side_iv = |short: &Leg, long: &Leg| short.implied_volatility.or(long.implied_volatility);
    let put = volatility::blend(side_iv(&legs[0], &legs[1]), historical);
    let call = volatility::blend(side_iv(&legs[2], &legs[3]), historical);

    let skew = volatility::skew_factor(legs.iter().filter_map(|l| l.implied_volatility));
    let put_sigma = (put.sigma * skew).max(VOL_FLOOR);
    let call_sigma = (call.sigma * skew).max(VOL_FLOOR);

    let overall = volatility::blend(chain_iv(legs), historical);
    VolatilityEstimate {
        sigma: (put_sigma + call_sigma) / 2.0,
        put_sigma: Some(put_sigma),
        call_sigma: Some(call_sigma),
        skew_factor: Some(skew),
        ..overall
    }
}

#[cfg(test)]
mod tests {
    use super::super::fixtures::*;
    use super::*;
    use crate::probability::ProbabilityModel;
    use common::{OptionChain, OptionContract};

    #[test]
    fn test_condor_structure() {
        let u = underlying();
        let c = chain();
        let ctx = EvaluationContext::new(&u, &c, HV, as_of());
        let candidate = IronCondor.evaluate(&ctx, &config()).unwrap();

        assert_eq!(candidate.short_strike.as_deref(), Some("97.00p / 103.00c"));
        assert_eq!(candidate.long_strike.as_deref(), Some("92.00p / 108.00c"));
        assert_eq!(candidate.legs.len(), 4);
        // put wing 1.20 - 0.40, call wing 1.10 - 0.35
        assert!((candidate.net_premium - 1.55).abs() < 1e-9);
        assert!((candidate.max_loss - 4.25).abs() < 1e-9);
        assert_eq!(candidate.roi_percent, 36.47);
        assert_eq!(candidate.breakevens, vec![95.45, 104.55]);
        // 3 * avg(3%, 3%)
        assert_eq!(candidate.risk_score, 9.0);
        assert!(candidate.prob_any_profit > candidate.prob_max_profit);
        assert_eq!(candidate.volatility.skew_factor, Some(1.0));
    }

    #[test]
    fn test_max_band_matches_closed_form() {
        let u = underlying();
        let c = chain();
        let ctx = EvaluationContext::new(&u, &c, HV, as_of());
        let candidate = IronCondor.evaluate(&ctx, &config()).unwrap();

        let m = ProbabilityModel::new(Some(100.0), 21, 0.04);
        let sigma = candidate.volatility.put_sigma.unwrap();
        let expected = (1.0
            - m.prob_below(97.0, sigma).unwrap()
            - (1.0 - m.prob_below(103.0, sigma).unwrap()))
            * 100.0;
        assert!((candidate.prob_max_profit - expected).abs() < 0.051);
    }

    #[test]
    fn test_skew_widens_wings() {
        let u = underlying();
        let c = OptionChain::new(
            expiry(),
            vec![
                OptionContract::put(92.0).with_ask(0.40).with_iv(0.45),
                OptionContract::put(97.0).with_bid(1.20).with_iv(0.35),
            ],
            vec![
                OptionContract::call(103.0).with_bid(1.10).with_iv(0.25),
                OptionContract::call(108.0).with_ask(0.35).with_iv(0.25),
            ],
        );
        let ctx = EvaluationContext::new(&u, &c, 0.30, as_of());
        let candidate = IronCondor.evaluate(&ctx, &config()).unwrap();
        let vol = candidate.volatility;

        let skew = 1.0 + (0.45 - 0.25) * 0.5;
        assert!((vol.skew_factor.unwrap() - skew).abs() < 1e-12);
        let put = (0.7 * 0.35 + 0.3 * 0.30) * skew;
        let call = (0.7 * 0.25 + 0.3 * 0.30) * skew;
        assert!((vol.put_sigma.unwrap() - put).abs() < 1e-12);
        assert!((vol.call_sigma.unwrap() - call).abs() < 1e-12);
        assert!((vol.sigma - (put + call) / 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_missing_side_has_no_options() {
        let u = underlying();
        let c = OptionChain::new(expiry(), vec![OptionContract::put(95.0).with_bid(1.0)], vec![]);
        let ctx = EvaluationContext::new(&u, &c, HV, as_of());
        assert_eq!(
            IronCondor.evaluate(&ctx, &config()),
            Err(crate::error::StrategyError::NoOptionsAvailable)
        );
    }
}
