//! Strike selection
//!
//! Every strategy picks its legs by walking an ordered list of tiers. A tier
//! is a pure function from a sorted strike ladder and the selection inputs
//! to an optional pick; the first tier that returns `Some` wins.
//!
//! # Tier order
//!
//! 1. Out-of-the-money: strikes at least `otm_percent` away from spot, with
//!    the second leg placed nearest to `spread_width` from the first.
//! 2. Spot-relative: any strike on the correct side of spot, second leg by
//!    ordinal adjacency.
//! 3. Extremes of the ladder. This is the only tier that works without a
//!    spot price.

use std::ops::Range;

use common::OptionContract;
use tracing::debug;

use crate::numeric::positive;
use crate::types::SelectionParams;

/// Contracts of one type, ascending by strike
#[derive(Debug, Clone, Copy)]
pub struct StrikeLadder<'a> {
    contracts: &'a [OptionContract],
}

impl<'a> StrikeLadder<'a> {
    /// `contracts` must already be sorted ascending by strike, as
    /// [`common::OptionChain`] guarantees.
    pub fn new(contracts: &'a [OptionContract]) -> Self {
        Self { contracts }
    }

    pub fn len(&self) -> usize {
        self.contracts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contracts.is_empty()
    }

    pub fn strike(&self, index: usize) -> f64 {
        self.contracts[index].strike
    }

    pub fn contract(&self, index: usize) -> &'a OptionContract {
        &self.contracts[index]
    }

    /// Indices with `strike <= level`
    pub fn at_or_below(&self, level: f64) -> Range<usize> {
        0..self.contracts.partition_point(|c| c.strike <= level)
    }

    /// Indices with `strike < level`
    pub fn below(&self, level: f64) -> Range<usize> {
        0..self.contracts.partition_point(|c| c.strike < level)
    }

    /// Indices with `strike >= level`
    pub fn at_or_above(&self, level: f64) -> Range<usize> {
        self.contracts.partition_point(|c| c.strike < level)..self.len()
    }

    /// Indices with `strike > level`
    pub fn above(&self, level: f64) -> Range<usize> {
        self.contracts.partition_point(|c| c.strike <= level)..self.len()
    }

    /// Index in `range` whose strike is closest to `target`; ties go to the
    /// lower strike.
    pub fn nearest(&self, range: Range<usize>, target: f64) -> Option<usize> {
        let mut best: Option<(usize, f64)> = None;
        for i in range {
            let distance = (self.strike(i) - target).abs();
            match best {
                Some((_, d)) if distance >= d => {}
                _ => best = Some((i, distance)),
            }
        }
        best.map(|(i, _)| i)
    }

    /// Neighbour below `index`, clamped at the bottom of the ladder
    fn ordinal_below(&self, index: usize) -> usize {
        index.saturating_sub(1)
    }

    /// Neighbour above `index`, clamped at the top of the ladder
    fn ordinal_above(&self, index: usize) -> usize {
        (index + 1).min(self.len().saturating_sub(1))
    }

    fn last(&self) -> Option<usize> {
        self.len().checked_sub(1)
    }
}

/// Spot and selection parameters shared by every tier
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SelectionInput {
    pub spot: Option<f64>,
    pub otm_percent: f64,
    pub spread_width: f64,
}

impl SelectionInput {
    pub fn new(spot: Option<f64>, params: &SelectionParams) -> Self {
        Self {
            spot: spot.and_then(positive),
            otm_percent: params.otm_percent,
            spread_width: params.spread_width,
        }
    }

    /// Highest strike that still counts as out of the money for puts
    pub fn put_threshold(&self) -> Option<f64> {
        self.spot.map(|s| s * (1.0 - self.otm_percent / 100.0))
    }

    /// Lowest strike that still counts as out of the money for calls
    pub fn call_threshold(&self) -> Option<f64> {
        self.spot.map(|s| s * (1.0 + self.otm_percent / 100.0))
    }
}

/// Ladder indices chosen by a tier
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LegPick {
    pub primary: usize,
    pub secondary: Option<usize>,
    /// Zero-based position of the tier that produced this pick
    pub tier: usize,
}

impl LegPick {
    fn single(primary: usize) -> Self {
        Self { primary, secondary: None, tier: 0 }
    }

    fn pair(primary: usize, secondary: usize) -> Self {
        Self { primary, secondary: Some(secondary), tier: 0 }
    }
}

pub type Tier = fn(&StrikeLadder<'_>, &SelectionInput) -> Option<LegPick>;

/// Try `tiers` in order and return the first pick
pub fn select(
    ladder: &StrikeLadder<'_>,
    input: &SelectionInput,
    tiers: &[Tier],
) -> Option<LegPick> {
    if ladder.is_empty() {
        return None;
    }
    tiers.iter().enumerate().find_map(|(tier, f)| {
        let pick = f(ladder, input)?;
        if tier > 0 {
            debug!(tier, strikes = ladder.len(), spot = ?input.spot, "Strike selection fell back");
        }
        Some(LegPick { tier, ..pick })
    })
}

// Bull put: short the highest OTM put, buy one further down

pub fn put_spread_otm(l: &StrikeLadder<'_>, i: &SelectionInput) -> Option<LegPick> {
    let range = l.at_or_below(i.put_threshold()?);
    let primary = range.end.checked_sub(1)?;
    let target = l.strike(primary) - i.spread_width;
    let secondary = l
        .nearest(l.below(l.strike(primary)), target)
        .unwrap_or_else(|| l.ordinal_below(primary));
    Some(LegPick::pair(primary, secondary))
}

pub fn put_spread_below_spot(l: &StrikeLadder<'_>, i: &SelectionInput) -> Option<LegPick> {
    let primary = l.below(i.spot?).end.checked_sub(1)?;
    Some(LegPick::pair(primary, l.ordinal_below(primary)))
}

pub fn put_spread_extreme(l: &StrikeLadder<'_>, _: &SelectionInput) -> Option<LegPick> {
    let primary = l.last()?;
    Some(LegPick::pair(primary, l.ordinal_below(primary)))
}

pub const BULL_PUT_TIERS: &[Tier] = &[put_spread_otm, put_spread_below_spot, put_spread_extreme];

// Bear call: short the lowest OTM call, buy one further up

pub fn call_spread_otm(l: &StrikeLadder<'_>, i: &SelectionInput) -> Option<LegPick> {
    let range = l.at_or_above(i.call_threshold()?);
    if range.is_empty() {
        return None;
    }
    let primary = range.start;
    let target = l.strike(primary) + i.spread_width;
    let secondary = l
        .nearest(l.above(l.strike(primary)), target)
        .unwrap_or_else(|| l.ordinal_above(primary));
    Some(LegPick::pair(primary, secondary))
}

pub fn call_spread_above_spot(l: &StrikeLadder<'_>, i: &SelectionInput) -> Option<LegPick> {
    let range = l.above(i.spot?);
    if range.is_empty() {
        return None;
    }
    Some(LegPick::pair(range.start, l.ordinal_above(range.start)))
}

pub fn call_spread_extreme(l: &StrikeLadder<'_>, _: &SelectionInput) -> Option<LegPick> {
    l.last()?;
    Some(LegPick::pair(0, l.ordinal_above(0)))
}

pub const BEAR_CALL_TIERS: &[Tier] =
    &[call_spread_otm, call_spread_above_spot, call_spread_extreme];

// Single-leg shapes

pub fn put_otm_single(l: &StrikeLadder<'_>, i: &SelectionInput) -> Option<LegPick> {
    let primary = l.at_or_below(i.put_threshold()?).end.checked_sub(1)?;
    Some(LegPick::single(primary))
}

pub fn put_below_spot_single(l: &StrikeLadder<'_>, i: &SelectionInput) -> Option<LegPick> {
    let primary = l.below(i.spot?).end.checked_sub(1)?;
    Some(LegPick::single(primary))
}

pub fn highest_strike(l: &StrikeLadder<'_>, _: &SelectionInput) -> Option<LegPick> {
    l.last().map(LegPick::single)
}

pub fn call_otm_single(l: &StrikeLadder<'_>, i: &SelectionInput) -> Option<LegPick> {
    let range = l.at_or_above(i.call_threshold()?);
    (!range.is_empty()).then(|| LegPick::single(range.start))
}

pub fn call_above_spot_single(l: &StrikeLadder<'_>, i: &SelectionInput) -> Option<LegPick> {
    let range = l.above(i.spot?);
    (!range.is_empty()).then(|| LegPick::single(range.start))
}

pub fn call_at_or_above_spot_single(l: &StrikeLadder<'_>, i: &SelectionInput) -> Option<LegPick> {
    let range = l.at_or_above(i.spot?);
    (!range.is_empty()).then(|| LegPick::single(range.start))
}

pub const CASH_SECURED_PUT_TIERS: &[Tier] = &[put_otm_single, put_below_spot_single, highest_strike];
pub const COVERED_CALL_TIERS: &[Tier] = &[call_otm_single, call_above_spot_single, highest_strike];
pub const LONG_CALL_TIERS: &[Tier] =
    &[call_otm_single, call_at_or_above_spot_single, highest_strike];

// Bull call: buy the low strike (primary), sell the high strike (secondary)

pub fn debit_spread_otm(l: &StrikeLadder<'_>, i: &SelectionInput) -> Option<LegPick> {
    let range = l.at_or_above(i.call_threshold()?);
    if range.len() < 2 {
        return None;
    }
    let low = range.start;
    let high = l
        .nearest(l.above(l.strike(low)), l.strike(low) + i.spread_width)
        .unwrap_or_else(|| l.ordinal_above(low));
    Some(LegPick::pair(low, high))
}

pub fn debit_spread_at_or_above_spot(l: &StrikeLadder<'_>, i: &SelectionInput) -> Option<LegPick> {
    let range = l.at_or_above(i.spot?);
    (range.len() >= 2).then(|| LegPick::pair(range.start, range.start + 1))
}

pub fn debit_spread_top(l: &StrikeLadder<'_>, _: &SelectionInput) -> Option<LegPick> {
    let high = l.last()?;
    Some(LegPick::pair(high.saturating_sub(1), high))
}

pub const BULL_CALL_TIERS: &[Tier] =
    &[debit_spread_otm, debit_spread_at_or_above_spot, debit_spread_top];

// Iron condor wings: primary is the short leg, secondary the long leg

pub fn condor_put_otm(l: &StrikeLadder<'_>, i: &SelectionInput) -> Option<LegPick> {
    let range = l.at_or_below(i.put_threshold()?);
    if range.len() < 2 {
        return None;
    }
    let short = range.end - 1;
    let long = l
        .nearest(l.below(l.strike(short)), l.strike(short) - i.spread_width)
        .unwrap_or_else(|| l.ordinal_below(short));
    Some(LegPick::pair(short, long))
}

pub fn condor_put_below_spot(l: &StrikeLadder<'_>, i: &SelectionInput) -> Option<LegPick> {
    let range = l.below(i.spot?);
    (range.len() >= 2).then(|| LegPick::pair(range.end - 1, range.end - 2))
}

pub fn condor_put_bottom(l: &StrikeLadder<'_>, _: &SelectionInput) -> Option<LegPick> {
    l.last()?;
    Some(LegPick::pair(0, l.ordinal_above(0)))
}

pub fn condor_call_otm(l: &StrikeLadder<'_>, i: &SelectionInput) -> Option<LegPick> {
    let range = l.at_or_above(i.call_threshold()?);
    if range.len() < 2 {
        return None;
    }
    let short = range.start;
    let long = l
        .nearest(l.above(l.strike(short)), l.strike(short) + i.spread_width)
        .unwrap_or_else(|| l.ordinal_above(short));
    Some(LegPick::pair(short, long))
}

pub fn condor_call_above_spot(l: &StrikeLadder<'_>, i: &SelectionInput) -> Option<LegPick> {
    let range = l.above(i.spot?);
    (range.len() >= 2).then(|| LegPick::pair(range.start, range.start + 1))
}

pub fn condor_call_top(l: &StrikeLadder<'_>, _: &SelectionInput) -> Option<LegPick> {
    let long = l.last()?;
    Some(LegPick::pair(long.saturating_sub(1), long))
}

pub const CONDOR_PUT_TIERS: &[Tier] = &[condor_put_otm, condor_put_below_spot, condor_put_bottom];
pub const CONDOR_CALL_TIERS: &[Tier] = &[condor_call_otm, condor_call_above_spot, condor_call_top];
