//! Yahoo Finance market data provider
//!
//! Uses the unofficial chart and options endpoints. Data is delayed and
//! intended for personal research use.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use common::{DailyClose, OptionChain, OptionContract, OptionType, UnderlyingSnapshot};
use config::ProviderConfig;
use serde::Deserialize;
use tracing::{debug, instrument};

use crate::error::MarketDataError;
use crate::indicators;
use crate::provider::MarketDataProvider;
use crate::Result;

/// Async Yahoo Finance client
#[derive(Debug, Clone)]
pub struct YahooMarketData {
    client: reqwest::Client,
    base_url: String,
    rsi_period: usize,
}

impl YahooMarketData {
    pub fn new(config: &ProviderConfig) -> Result<Self> {
        let timeout = if config.timeout_seconds == 0 {
            config::default_provider_timeout_seconds()
        } else {
            config.timeout_seconds
        };
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(Duration::from_secs(timeout))
            .build()
            .map_err(|e| MarketDataError::Connection(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            rsi_period: config.rsi_period,
        })
    }

    async fn get_json<T: for<'de> Deserialize<'de>>(&self, url: &str) -> Result<T> {
        debug!(url, "GET");
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(MarketDataError::provider(format!("{} returned {}", url, status)));
        }
        Ok(response.json().await?)
    }

    async fn options_page(&self, symbol: &str, date: Option<i64>) -> Result<YahooOptionChainData> {
        let url = match date {
            Some(ts) => format!("{}/v7/finance/options/{}?date={}", self.base_url, symbol, ts),
            None => format!("{}/v7/finance/options/{}", self.base_url, symbol),
        };
        let response: YahooOptionsResponse = self.get_json(&url).await?;
        response
            .option_chain
            .result
            .into_iter()
            .next()
            .ok_or_else(|| MarketDataError::not_available(format!("No options data for {}", symbol)))
    }

    async fn chart(&self, symbol: &str, history_days: u32) -> Result<YahooChartData> {
        let url = format!(
            "{}/v8/finance/chart/{}?range={}d&interval=1d",
            self.base_url, symbol, history_days
        );
        let response: YahooChartResponse = self.get_json(&url).await?;
        response
            .chart
            .result
            .and_then(|r| r.into_iter().next())
            .ok_or_else(|| MarketDataError::InvalidSymbol(symbol.to_string()))
    }
}

#[async_trait]
impl MarketDataProvider for YahooMarketData {
    fn name(&self) -> &str {
        "yahoo"
    }

    #[instrument(skip(self))]
    async fn underlying(&self, symbol: &str, history_days: u32) -> Result<UnderlyingSnapshot> {
        let chart = self.chart(symbol, history_days).await?;
        let history = chart.daily_closes();

        // Fundamentals ride along with the options quote; a missing page is not fatal
        let quote = match self.options_page(symbol, None).await {
            Ok(page) => Some(page.quote),
            Err(e) => {
                debug!(symbol, error = %e, "Options quote unavailable; fundamentals left empty");
                None
            }
        };

        let closes: Vec<f64> = history.iter().map(|c| c.close).collect();
        let spot = chart
            .meta
            .regular_market_price
            .or_else(|| quote.as_ref().and_then(|q| q.regular_market_price))
            .or_else(|| closes.last().copied());
        let price_timestamp = chart
            .meta
            .regular_market_time
            .and_then(|ts| DateTime::<Utc>::from_timestamp(ts, 0));

        let mut snapshot = UnderlyingSnapshot::new(symbol.to_uppercase());
        snapshot.spot = spot;
        snapshot.price_timestamp = price_timestamp;
        snapshot.rsi = indicators::rsi(&closes, self.rsi_period);
        snapshot.history = history;
        if let Some(q) = quote {
            snapshot.dividend_yield = q.trailing_annual_dividend_yield.unwrap_or(0.0);
            snapshot.trailing_eps = q.eps_trailing_twelve_months;
            snapshot.forward_eps = q.eps_forward;
            snapshot.market_cap = q.market_cap;
            snapshot.next_earnings = q
                .earnings_timestamp
                .and_then(|ts| DateTime::<Utc>::from_timestamp(ts, 0))
                .map(|dt| dt.date_naive());
        }
        Ok(snapshot)
    }

    #[instrument(skip(self))]
    async fn expirations(&self, symbol: &str) -> Result<Vec<String>> {
        let page = self.options_page(symbol, None).await?;
        Ok(page
            .expiration_dates
            .iter()
            .filter_map(|&ts| DateTime::<Utc>::from_timestamp(ts, 0))
            .map(|dt| dt.date_naive().format("%Y-%m-%d").to_string())
            .collect())
    }

    #[instrument(skip(self))]
    async fn option_chain(&self, symbol: &str, expiration: NaiveDate) -> Result<OptionChain> {
        // Yahoo keys expirations by midnight UTC
        let ts = expiration.and_time(NaiveTime::MIN).and_utc().timestamp();
        let page = self.options_page(symbol, Some(ts)).await?;

        let (puts, calls) = match page.options.into_iter().next() {
            Some(options) => (
                convert_side(options.puts, OptionType::Put),
                convert_side(options.calls, OptionType::Call),
            ),
            None => (Vec::new(), Vec::new()),
        };
        Ok(OptionChain::new(expiration, puts, calls))
    }
}

fn convert_side(data: Vec<YahooOptionData>, option_type: OptionType) -> Vec<OptionContract> {
    data.into_iter()
        .filter_map(|d| {
            Some(OptionContract {
                contract_symbol: d.contract_symbol,
                option_type,
                strike: d.strike?,
                bid: d.bid,
                ask: d.ask,
                last_price: d.last_price,
                implied_volatility: d.implied_volatility,
            })
        })
        .collect()
}

// Yahoo Finance API response structures

#[derive(Debug, Deserialize)]
struct YahooChartResponse {
    chart: YahooChart,
}

#[derive(Debug, Deserialize)]
struct YahooChart {
    result: Option<Vec<YahooChartData>>,
}

#[derive(Debug, Deserialize)]
struct YahooChartData {
    meta: YahooChartMeta,
    #[serde(default)]
    timestamp: Vec<i64>,
    indicators: YahooIndicators,
}

impl YahooChartData {
    fn daily_closes(&self) -> Vec<DailyClose> {
        let closes = self
            .indicators
            .quote
            .first()
            .map(|q| q.close.as_slice())
            .unwrap_or_default();
        self.timestamp
            .iter()
            .zip(closes)
            .filter_map(|(&ts, close)| {
                let date = DateTime::<Utc>::from_timestamp(ts, 0)?.date_naive();
                close.map(|c| DailyClose::new(date, c))
            })
            .collect()
    }
}

#[derive(Debug, Deserialize)]
struct YahooChartMeta {
    #[serde(rename = "regularMarketPrice")]
    regular_market_price: Option<f64>,
    #[serde(rename = "regularMarketTime")]
    regular_market_time: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct YahooIndicators {
    #[serde(default)]
    quote: Vec<YahooChartQuote>,
}

#[derive(Debug, Deserialize)]
struct YahooChartQuote {
    #[serde(default)]
    close: Vec<Option<f64>>,
}

#[derive(Debug, Deserialize)]
struct YahooOptionsResponse {
    #[serde(rename = "optionChain")]
    option_chain: YahooOptionChain,
}

#[derive(Debug, Deserialize)]
struct YahooOptionChain {
    result: Vec<YahooOptionChainData>,
}

#[derive(Debug, Deserialize)]
struct YahooOptionChainData {
    #[serde(rename = "expirationDates", default)]
    expiration_dates: Vec<i64>,
    quote: YahooQuoteData,
    #[serde(default)]
    options: Vec<YahooOptions>,
}

#[derive(Debug, Deserialize)]
struct YahooQuoteData {
    #[serde(rename = "regularMarketPrice")]
    regular_market_price: Option<f64>,
    #[serde(rename = "trailingAnnualDividendYield")]
    trailing_annual_dividend_yield: Option<f64>,
    #[serde(rename = "epsTrailingTwelveMonths")]
    eps_trailing_twelve_months: Option<f64>,
    #[serde(rename = "epsForward")]
    eps_forward: Option<f64>,
    #[serde(rename = "marketCap")]
    market_cap: Option<f64>,
    #[serde(rename = "earningsTimestamp")]
    earnings_timestamp: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct YahooOptions {
    #[serde(default)]
    calls: Vec<YahooOptionData>,
    #[serde(default)]
    puts: Vec<YahooOptionData>,
}

#[derive(Debug, Deserialize)]
struct YahooOptionData {
    #[serde(rename = "contractSymbol")]
    contract_symbol: Option<String>,
    strike: Option<f64>,
    bid: Option<f64>,
    ask: Option<f64>,
    #[serde(rename = "lastPrice")]
    last_price: Option<f64>,
    #[serde(rename = "impliedVolatility")]
    implied_volatility: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_options_page() {
        let json = r#"{
            "optionChain": { "result": [ {
                "expirationDates": [1705622400, 1706227200],
                "quote": { "regularMarketPrice": 191.5, "trailingAnnualDividendYield": 0.005,
                           "earningsTimestamp": 1706821200 },
                "options": [ {
                    "calls": [ { "contractSymbol": "AAPL240119C00195000", "strike": 195.0,
                                 "bid": 1.1, "ask": 1.2, "lastPrice": 1.15, "impliedVolatility": 0.22 } ],
                    "puts":  [ { "strike": 185.0, "bid": 0.9, "ask": 1.0 },
                               { "bid": 0.5 } ]
                } ]
            } ] }
        }"#;
        let response: YahooOptionsResponse = serde_json::from_str(json).unwrap();
        let page = response.option_chain.result.into_iter().next().unwrap();
        assert_eq!(page.expiration_dates.len(), 2);
        assert_eq!(page.quote.regular_market_price, Some(191.5));

        let options = page.options.into_iter().next().unwrap();
        let puts = convert_side(options.puts, OptionType::Put);
        // the strike-less row is dropped
        assert_eq!(puts.len(), 1);
        let calls = convert_side(options.calls, OptionType::Call);
        assert_eq!(calls[0].implied_volatility, Some(0.22));
        assert_eq!(calls[0].contract_symbol.as_deref(), Some("AAPL240119C00195000"));
    }

    #[test]
    fn test_parse_chart_with_gaps() {
        let json = r#"{
            "chart": { "result": [ {
                "meta": { "regularMarketPrice": 101.0, "regularMarketTime": 1705622400 },
                "timestamp": [1705363200, 1705449600, 1705536000],
                "indicators": { "quote": [ { "close": [100.0, null, 101.0] } ] }
            } ] }
        }"#;
        let response: YahooChartResponse = serde_json::from_str(json).unwrap();
        let chart = response.chart.result.unwrap().into_iter().next().unwrap();
        let closes = chart.daily_closes();
        assert_eq!(closes.len(), 2);
        assert_eq!(closes[1].close, 101.0);
        assert_eq!(closes[0].date, NaiveDate::from_ymd_opt(2024, 1, 16).unwrap());
    }

    #[test]
    fn test_expiration_timestamp_is_midnight_utc() {
        let date = NaiveDate::from_ymd_opt(2024, 1, 19).unwrap();
        assert_eq!(date.and_time(NaiveTime::MIN).and_utc().timestamp(), 1705622400);
    }

    #[tokio::test]
    #[ignore] // Requires network
    async fn test_live_expirations() {
        let client = YahooMarketData::new(&ProviderConfig::default()).unwrap();
        let expirations = client.expirations("SPY").await.unwrap();
        assert!(!expirations.is_empty());
    }
}
