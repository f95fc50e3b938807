//! Ranking with a diversification pass, and post-ranking result filters

use common::StrategyKind;
use serde::{Deserialize, Serialize};

use crate::types::StrategyCandidate;

/// Stable sort, highest composite score first
pub fn sort_by_score(candidates: &mut [StrategyCandidate]) {
    candidates.sort_by(|a, b| b.composite_score.total_cmp(&a.composite_score));
}

/// Pick the best `top_n` candidates while keeping every strategy represented.
///
/// 1. Sort by composite score, descending.
/// 2. Take the best `max(1, top_n / groups)` of each strategy, groups in
///    order of first appearance.
/// 3. Fill the remaining slots from the sorted list.
/// 4. Re-sort and truncate to `max(1, top_n)`.
pub fn rank_candidates(
    mut candidates: Vec<StrategyCandidate>,
    top_n: usize,
) -> Vec<StrategyCandidate> {
    let limit = top_n.max(1);
    sort_by_score(&mut candidates);

    let mut groups: Vec<StrategyKind> = Vec::new();
    for c in &candidates {
        if !groups.contains(&c.strategy) {
            groups.push(c.strategy);
        }
    }
    if groups.is_empty() {
        return Vec::new();
    }
    let per_type = (limit / groups.len()).max(1);

    let mut selected = vec![false; candidates.len()];
    let mut picked = 0;
    for kind in &groups {
        for (i, _) in candidates
            .iter()
            .enumerate()
            .filter(|(_, c)| c.strategy == *kind)
            .take(per_type)
        {
            selected[i] = true;
            picked += 1;
        }
    }

    for flag in selected.iter_mut() {
        if picked >= limit {
            break;
        }
        if !*flag {
            *flag = true;
            picked += 1;
        }
    }

    let mut ranked: Vec<StrategyCandidate> = candidates
        .into_iter()
        .zip(selected)
        .filter_map(|(c, keep)| keep.then_some(c))
        .collect();
    sort_by_score(&mut ranked);
    ranked.truncate(limit);
    ranked
}

/// Thresholds applied to a ranked list
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ResultFilters {
    /// Minimum ROI percent
    #[serde(default = "config::default_min_roi")]
    pub min_roi: f64,
    /// Minimum probability of any profit, in percent
    #[serde(default = "config::default_min_probability")]
    pub min_probability: f64,
    /// Maximum RSI; candidates without an RSI always pass
    #[serde(default = "config::default_max_rsi")]
    pub max_rsi: f64,
}

impl Default for ResultFilters {
    fn default() -> Self {
        Self::from(&config::FilterConfig::default())
    }
}

impl From<&config::FilterConfig> for ResultFilters {
    fn from(c: &config::FilterConfig) -> Self {
        Self {
            min_roi: c.min_roi,
            min_probability: c.min_probability,
            max_rsi: c.max_rsi,
        }
    }
}

impl ResultFilters {
    pub fn accepts(&self, candidate: &StrategyCandidate) -> bool {
        candidate.roi_percent >= self.min_roi
            && candidate.prob_any_profit >= self.min_probability
            && !candidate.rsi.is_some_and(|rsi| rsi > self.max_rsi)
    }

    pub fn apply(&self, candidates: Vec<StrategyCandidate>) -> Vec<StrategyCandidate> {
        candidates.into_iter().filter(|c| self.accepts(c)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{VolatilityEstimate, VolatilitySource};
    use chrono::NaiveDate;

    fn candidate(strategy: StrategyKind, score: f64) -> StrategyCandidate {
        StrategyCandidate {
            symbol: "TEST".into(),
            strategy,
            expiration: NaiveDate::from_ymd_opt(2024, 1, 19).unwrap(),
            days_to_expiry: 18,
            spot: Some(100.0),
            price_timestamp: None,
            legs: Vec::new(),
            short_strike: None,
            long_strike: None,
            net_premium: 1.0,
            max_profit: Some(1.0),
            max_loss: 4.0,
            roi_percent: 25.0,
            prob_any_profit: 70.0,
            prob_max_profit: 65.0,
            breakevens: Vec::new(),
            risk_score: 20.0,
            composite_score: score,
            volatility: VolatilityEstimate {
                implied: None,
                historical: 0.3,
                sigma: 0.3,
                source: VolatilitySource::HistoricalOnly,
                put_sigma: None,
                call_sigma: None,
                skew_factor: None,
            },
            rsi: None,
            earnings_before_expiry: false,
        }
    }

    fn kinds(ranked: &[StrategyCandidate]) -> Vec<StrategyKind> {
        ranked.iter().map(|c| c.strategy).collect()
    }

    #[test]
    fn test_one_of_each_when_top_n_matches_kinds() {
        let mut all = Vec::new();
        for (i, kind) in StrategyKind::ALL.iter().enumerate() {
            // bull puts dominate the score table
            all.push(candidate(*kind, 50.0 + i as f64));
            all.push(candidate(StrategyKind::BullPutSpread, 90.0 + i as f64));
        }
        let ranked = rank_candidates(all, 7);
        assert_eq!(ranked.len(), 7);
        let mut seen = kinds(&ranked);
        seen.sort();
        seen.dedup();
        assert_eq!(seen.len(), 7);
        let scores: Vec<f64> = ranked.iter().map(|c| c.composite_score).collect();
        assert!(scores.windows(2).all(|w| w[0] >= w[1]));
    }

    #[test]
    fn test_fill_takes_best_remaining() {
        let all = vec![
            candidate(StrategyKind::BullPutSpread, 90.0),
            candidate(StrategyKind::BullPutSpread, 85.0),
            candidate(StrategyKind::BullPutSpread, 80.0),
            candidate(StrategyKind::LongCall, 40.0),
            candidate(StrategyKind::LongCall, 30.0),
        ];
        // one per type, then the best remaining bull put fills the last slot
        let ranked = rank_candidates(all, 3);
        let scores: Vec<f64> = ranked.iter().map(|c| c.composite_score).collect();
        assert_eq!(scores, vec![90.0, 85.0, 40.0]);
    }

    #[test]
    fn test_per_type_floor_of_one() {
        let all = vec![
            candidate(StrategyKind::BullPutSpread, 90.0),
            candidate(StrategyKind::BearCallSpread, 60.0),
            candidate(StrategyKind::IronCondor, 30.0),
        ];
        let ranked = rank_candidates(all, 2);
        // every group gets one before truncation, lowest is cut
        assert_eq!(kinds(&ranked), vec![StrategyKind::BullPutSpread, StrategyKind::BearCallSpread]);
    }

    #[test]
    fn test_zero_top_n_returns_one() {
        let ranked = rank_candidates(vec![candidate(StrategyKind::LongCall, 10.0)], 0);
        assert_eq!(ranked.len(), 1);
        assert!(rank_candidates(Vec::new(), 5).is_empty());
    }

    #[test]
    fn test_ties_keep_input_order() {
        let mut first = candidate(StrategyKind::CoveredCall, 50.0);
        first.days_to_expiry = 5;
        let mut second = candidate(StrategyKind::CoveredCall, 50.0);
        second.days_to_expiry = 12;
        let ranked = rank_candidates(vec![first, second], 2);
        assert_eq!(ranked[0].days_to_expiry, 5);
        assert_eq!(ranked[1].days_to_expiry, 12);
    }

    #[test]
    fn test_filters() {
        let filters = ResultFilters {
            min_roi: 10.0,
            min_probability: 60.0,
            max_rsi: 70.0,
        };
        let mut low_roi = candidate(StrategyKind::BullPutSpread, 50.0);
        low_roi.roi_percent = 5.0;
        let mut overbought = candidate(StrategyKind::BullPutSpread, 50.0);
        overbought.rsi = Some(75.0);
        let mut fine = candidate(StrategyKind::BullPutSpread, 50.0);
        fine.rsi = Some(65.0);
        let no_rsi = candidate(StrategyKind::BullPutSpread, 50.0);

        let kept = filters.apply(vec![low_roi, overbought, fine, no_rsi]);
        assert_eq!(kept.len(), 2);
        assert!(ResultFilters::default().accepts(&candidate(StrategyKind::LongCall, 0.0)));
    }

    #[test]
    fn test_filters_deserialize_partial() {
        let f: ResultFilters = serde_json::from_str(r#"{"min_roi": 12.5}"#).unwrap();
        assert_eq!(f.min_roi, 12.5);
        assert_eq!(f.max_rsi, 100.0);
    }
}
