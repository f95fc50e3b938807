//! Common types used across Stratify
//!
//! This module provides the option-market domain types: underlying
//! snapshots, option contracts and chains, and the strategy shapes the
//! engine knows how to evaluate.

use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Ticker symbol of an underlying (e.g., "AAPL")
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Symbol(pub String);

impl Symbol {
    /// Create a new Symbol, trimmed and upper-cased
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into().trim().to_uppercase())
    }

    /// Get the symbol as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns true if the symbol is blank
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl std::fmt::Display for Symbol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Symbol {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for Symbol {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

/// Direction of a strategy leg
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LegAction {
    /// Long leg, paid at the ask
    Buy,
    /// Short leg, received at the bid
    Sell,
}

impl LegAction {
    /// Returns the opposite action
    pub fn opposite(&self) -> Self {
        match self {
            LegAction::Buy => LegAction::Sell,
            LegAction::Sell => LegAction::Buy,
        }
    }

    /// Returns true if this leg is bought
    pub fn is_buy(&self) -> bool {
        matches!(self, LegAction::Buy)
    }

    /// Returns true if this leg is sold
    pub fn is_sell(&self) -> bool {
        matches!(self, LegAction::Sell)
    }
}

impl std::fmt::Display for LegAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LegAction::Buy => write!(f, "buy"),
            LegAction::Sell => write!(f, "sell"),
        }
    }
}

/// Option type (Call or Put)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OptionType {
    Call,
    Put,
}

impl OptionType {
    /// Single-letter suffix used in strike labels ("97.00p")
    pub fn suffix(&self) -> char {
        match self {
            OptionType::Call => 'c',
            OptionType::Put => 'p',
        }
    }
}

impl std::fmt::Display for OptionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OptionType::Call => write!(f, "call"),
            OptionType::Put => write!(f, "put"),
        }
    }
}

/// Keep a quote only when it is a usable positive number
fn positive(value: Option<f64>) -> Option<f64> {
    value.filter(|v| v.is_finite() && *v > 0.0)
}

/// A single listed option contract
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptionContract {
    /// Exchange contract symbol, if the provider supplies one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contract_symbol: Option<String>,
    pub option_type: OptionType,
    pub strike: f64,
    #[serde(default)]
    pub bid: Option<f64>,
    #[serde(default)]
    pub ask: Option<f64>,
    #[serde(default)]
    pub last_price: Option<f64>,
    /// Implied volatility as a decimal (0.25 = 25%)
    #[serde(default)]
    pub implied_volatility: Option<f64>,
}

impl OptionContract {
    /// Create a contract with no quotes
    pub fn new(option_type: OptionType, strike: f64) -> Self {
        Self {
            contract_symbol: None,
            option_type,
            strike,
            bid: None,
            ask: None,
            last_price: None,
            implied_volatility: None,
        }
    }

    /// Create a put
    pub fn put(strike: f64) -> Self {
        Self::new(OptionType::Put, strike)
    }

    /// Create a call
    pub fn call(strike: f64) -> Self {
        Self::new(OptionType::Call, strike)
    }

    pub fn with_bid(mut self, bid: f64) -> Self {
        self.bid = Some(bid);
        self
    }

    pub fn with_ask(mut self, ask: f64) -> Self {
        self.ask = Some(ask);
        self
    }

    pub fn with_last(mut self, last: f64) -> Self {
        self.last_price = Some(last);
        self
    }

    pub fn with_iv(mut self, iv: f64) -> Self {
        self.implied_volatility = Some(iv);
        self
    }

    /// Price at which this contract trades for the given action.
    ///
    /// Sold legs take the bid, bought legs the ask; either falls back to
    /// the last traded price when the quote is zero or absent.
    pub fn price_for(&self, action: LegAction) -> Option<f64> {
        let quote = match action {
            LegAction::Sell => self.bid,
            LegAction::Buy => self.ask,
        };
        positive(quote).or_else(|| positive(self.last_price))
    }

    /// Implied volatility if the provider reported a usable one
    pub fn usable_iv(&self) -> Option<f64> {
        positive(self.implied_volatility)
    }

    /// Strike label with type suffix, e.g. "97.00p"
    pub fn label(&self) -> String {
        format!("{:.2}{}", self.strike, self.option_type.suffix())
    }
}

/// Option chain for a single expiration.
///
/// Each side is sorted ascending by strike and holds only contracts with a
/// finite, positive strike.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptionChain {
    pub expiration: NaiveDate,
    puts: Vec<OptionContract>,
    calls: Vec<OptionContract>,
}

impl OptionChain {
    /// Build a chain, dropping unusable strikes and sorting both sides
    pub fn new(
        expiration: NaiveDate,
        puts: Vec<OptionContract>,
        calls: Vec<OptionContract>,
    ) -> Self {
        Self {
            expiration,
            puts: normalize_side(puts),
            calls: normalize_side(calls),
        }
    }

    pub fn puts(&self) -> &[OptionContract] {
        &self.puts
    }

    pub fn calls(&self) -> &[OptionContract] {
        &self.calls
    }

    /// Contracts of the given type
    pub fn side(&self, option_type: OptionType) -> &[OptionContract] {
        match option_type {
            OptionType::Put => &self.puts,
            OptionType::Call => &self.calls,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.puts.is_empty() && self.calls.is_empty()
    }
}

fn normalize_side(mut contracts: Vec<OptionContract>) -> Vec<OptionContract> {
    contracts.retain(|c| c.strike.is_finite() && c.strike > 0.0);
    contracts.sort_by(|a, b| a.strike.total_cmp(&b.strike));
    contracts
}

/// One daily closing price
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DailyClose {
    pub date: NaiveDate,
    pub close: f64,
}

impl DailyClose {
    pub fn new(date: NaiveDate, close: f64) -> Self {
        Self { date, close }
    }
}

/// Point-in-time view of an underlying as reported by a market data provider
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UnderlyingSnapshot {
    pub symbol: String,
    /// Last traded price; absent when the provider has no quote
    #[serde(default)]
    pub spot: Option<f64>,
    #[serde(default)]
    pub price_timestamp: Option<DateTime<Utc>>,
    /// Annual dividend yield as a decimal
    #[serde(default)]
    pub dividend_yield: f64,
    #[serde(default)]
    pub beta: Option<f64>,
    #[serde(default)]
    pub trailing_eps: Option<f64>,
    #[serde(default)]
    pub forward_eps: Option<f64>,
    #[serde(default)]
    pub revenue_growth: Option<f64>,
    #[serde(default)]
    pub earnings_growth: Option<f64>,
    #[serde(default)]
    pub market_cap: Option<f64>,
    /// Trailing daily closes, oldest first
    #[serde(default)]
    pub history: Vec<DailyClose>,
    #[serde(default)]
    pub rsi: Option<f64>,
    #[serde(default)]
    pub next_earnings: Option<NaiveDate>,
}

impl UnderlyingSnapshot {
    pub fn new(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            ..Default::default()
        }
    }

    pub fn with_spot(mut self, spot: f64) -> Self {
        self.spot = Some(spot);
        self
    }

    pub fn with_dividend_yield(mut self, dividend_yield: f64) -> Self {
        self.dividend_yield = dividend_yield;
        self
    }

    pub fn with_history(mut self, history: Vec<DailyClose>) -> Self {
        self.history = history;
        self
    }

    pub fn with_rsi(mut self, rsi: f64) -> Self {
        self.rsi = Some(rsi);
        self
    }

    /// Spot price if it is a usable positive number
    pub fn usable_spot(&self) -> Option<f64> {
        positive(self.spot)
    }

    /// Risk-free rate net of the dividend yield
    pub fn adjusted_rate(&self, risk_free_rate: f64) -> f64 {
        let dividend = if self.dividend_yield.is_finite() {
            self.dividend_yield
        } else {
            0.0
        };
        risk_free_rate - dividend
    }

    /// Closing prices, oldest first
    pub fn closes(&self) -> impl Iterator<Item = f64> + '_ {
        self.history.iter().map(|c| c.close)
    }
}

/// The strategy shapes the engine evaluates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    BullPutSpread,
    BearCallSpread,
    CoveredCall,
    CashSecuredPut,
    LongCall,
    BullCallSpread,
    IronCondor,
}

impl StrategyKind {
    /// Every shape, in evaluation order
    pub const ALL: [StrategyKind; 7] = [
        StrategyKind::BullPutSpread,
        StrategyKind::BearCallSpread,
        StrategyKind::CoveredCall,
        StrategyKind::CashSecuredPut,
        StrategyKind::LongCall,
        StrategyKind::BullCallSpread,
        StrategyKind::IronCondor,
    ];

    /// Human readable name
    pub fn display_name(&self) -> &'static str {
        match self {
            StrategyKind::BullPutSpread => "Bull Put Spread",
            StrategyKind::BearCallSpread => "Bear Call Spread",
            StrategyKind::CoveredCall => "Covered Call",
            StrategyKind::CashSecuredPut => "Cash Secured Put",
            StrategyKind::LongCall => "Long Call",
            StrategyKind::BullCallSpread => "Bull Call Spread",
            StrategyKind::IronCondor => "Iron Condor",
        }
    }

    /// Machine name, as used on the wire
    pub fn as_str(&self) -> &'static str {
        match self {
            StrategyKind::BullPutSpread => "bull_put_spread",
            StrategyKind::BearCallSpread => "bear_call_spread",
            StrategyKind::CoveredCall => "covered_call",
            StrategyKind::CashSecuredPut => "cash_secured_put",
            StrategyKind::LongCall => "long_call",
            StrategyKind::BullCallSpread => "bull_call_spread",
            StrategyKind::IronCondor => "iron_condor",
        }
    }

    /// Whether the position is opened for a net credit
    pub fn is_credit(&self) -> bool {
        !matches!(self, StrategyKind::LongCall | StrategyKind::BullCallSpread)
    }
}

impl std::fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

impl FromStr for StrategyKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace(['-', ' '], "_");
        match normalized.as_str() {
            "bull_put_spread" | "bull_put" => Ok(StrategyKind::BullPutSpread),
            "bear_call_spread" | "bear_call" => Ok(StrategyKind::BearCallSpread),
            "covered_call" => Ok(StrategyKind::CoveredCall),
            "cash_secured_put" | "cash_put" => Ok(StrategyKind::CashSecuredPut),
            "long_call" => Ok(StrategyKind::LongCall),
            "bull_call_spread" | "bull_call" => Ok(StrategyKind::BullCallSpread),
            "iron_condor" => Ok(StrategyKind::IronCondor),
            _ => Err(Error::UnknownStrategy(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_symbol_normalized() {
        let sym = Symbol::new("  aapl ");
        assert_eq!(sym.as_str(), "AAPL");
        assert!(Symbol::new("   ").is_empty());
    }

    #[test]
    fn test_leg_action() {
        assert_eq!(LegAction::Buy.opposite(), LegAction::Sell);
        assert!(LegAction::Sell.is_sell());
        assert!(LegAction::Buy.is_buy());
    }

    #[test]
    fn test_price_falls_back_to_last() {
        let put = OptionContract::put(95.0).with_bid(0.0).with_ask(1.1).with_last(0.9);
        assert_eq!(put.price_for(LegAction::Sell), Some(0.9));
        assert_eq!(put.price_for(LegAction::Buy), Some(1.1));

        let dead = OptionContract::put(90.0).with_bid(f64::NAN);
        assert_eq!(dead.price_for(LegAction::Sell), None);
    }

    #[test]
    fn test_chain_sorted_and_filtered() {
        let chain = OptionChain::new(
            date(2024, 1, 19),
            vec![
                OptionContract::put(100.0),
                OptionContract::put(-5.0),
                OptionContract::put(90.0),
                OptionContract::put(f64::NAN),
                OptionContract::put(95.0),
            ],
            vec![],
        );
        let strikes: Vec<f64> = chain.puts().iter().map(|c| c.strike).collect();
        assert_eq!(strikes, vec![90.0, 95.0, 100.0]);
        assert!(chain.calls().is_empty());
        assert!(!chain.is_empty());
    }

    #[test]
    fn test_contract_label() {
        assert_eq!(OptionContract::put(97.0).label(), "97.00p");
        assert_eq!(OptionContract::call(102.5).label(), "102.50c");
    }

    #[test]
    fn test_adjusted_rate() {
        let snap = UnderlyingSnapshot::new("AAPL").with_dividend_yield(0.005);
        assert!((snap.adjusted_rate(0.045) - 0.04).abs() < 1e-12);
    }

    #[test]
    fn test_strategy_kind_parse() {
        assert_eq!("bull_put".parse::<StrategyKind>().unwrap(), StrategyKind::BullPutSpread);
        assert_eq!("Iron Condor".parse::<StrategyKind>().unwrap(), StrategyKind::IronCondor);
        assert_eq!("cash-put".parse::<StrategyKind>().unwrap(), StrategyKind::CashSecuredPut);
        assert!("straddle".parse::<StrategyKind>().is_err());
    }

    #[test]
    fn test_strategy_kind_serde() {
        let json = serde_json::to_string(&StrategyKind::BearCallSpread).unwrap();
        assert_eq!(json, "\"bear_call_spread\"");
        for kind in StrategyKind::ALL {
            assert_eq!(kind.as_str().parse::<StrategyKind>().unwrap(), kind);
        }
    }
}
