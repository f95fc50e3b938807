//! In-memory market data, optionally loaded from a JSON fixture
//!
//! Fixture layout:
//!
//! ```json
//! {
//!   "symbols": {
//!     "AAPL": {
//!       "underlying": { "symbol": "AAPL", "spot": 100.0, "history": [] },
//!       "chains": [
//!         { "expiration": "2024-01-19", "puts": [], "calls": [] }
//!       ]
//!     }
//!   }
//! }
//! ```

use std::collections::HashMap;
use std::path::Path;

use async_trait::async_trait;
use chrono::NaiveDate;
use common::{DailyClose, OptionChain, OptionContract, UnderlyingSnapshot};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::MarketDataError;
use crate::provider::MarketDataProvider;
use crate::Result;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChainFixture {
    pub expiration: NaiveDate,
    #[serde(default)]
    pub puts: Vec<OptionContract>,
    #[serde(default)]
    pub calls: Vec<OptionContract>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SymbolFixture {
    pub underlying: UnderlyingSnapshot,
    /// Listed expirations; derived from `chains` when empty
    #[serde(default)]
    pub expirations: Vec<String>,
    #[serde(default)]
    pub chains: Vec<ChainFixture>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MarketFixture {
    #[serde(default)]
    pub symbols: HashMap<String, SymbolFixture>,
}

/// Static market data provider
///
/// Serves whatever snapshots and chains it was given. Used for offline
/// screening and tests.
#[derive(Debug, Default)]
pub struct StaticMarketData {
    symbols: RwLock<HashMap<String, SymbolFixture>>,
}

impl StaticMarketData {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a JSON fixture file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| MarketDataError::Fixture(format!("{}: {}", path.display(), e)))?;
        let provider = Self::from_json(&content)?;
        info!(
            path = %path.display(),
            symbols = provider.symbols.read().len(),
            "Loaded market data fixture"
        );
        Ok(provider)
    }

    pub fn from_json(content: &str) -> Result<Self> {
        let fixture: MarketFixture =
            serde_json::from_str(content).map_err(|e| MarketDataError::Fixture(e.to_string()))?;
        let symbols = fixture
            .symbols
            .into_iter()
            .map(|(symbol, data)| (symbol.to_uppercase(), data))
            .collect();
        Ok(Self {
            symbols: RwLock::new(symbols),
        })
    }

    /// Register an underlying snapshot (builder pattern)
    pub fn with_underlying(self, snapshot: UnderlyingSnapshot) -> Self {
        self.set_underlying(snapshot);
        self
    }

    /// Register a chain (builder pattern)
    pub fn with_chain(self, symbol: &str, chain: OptionChain) -> Self {
        self.add_chain(symbol, chain);
        self
    }

    /// Register an extra listed expiration string, parsable or not
    pub fn with_expiration(self, symbol: &str, expiration: impl Into<String>) -> Self {
        let mut symbols = self.symbols.write();
        if let Some(entry) = symbols.get_mut(&symbol.to_uppercase()) {
            if entry.expirations.is_empty() {
                entry.expirations = entry
                    .chains
                    .iter()
                    .map(|c| c.expiration.format("%Y-%m-%d").to_string())
                    .collect();
            }
            entry.expirations.push(expiration.into());
        }
        drop(symbols);
        self
    }

    pub fn set_underlying(&self, snapshot: UnderlyingSnapshot) {
        let key = snapshot.symbol.to_uppercase();
        let mut symbols = self.symbols.write();
        match symbols.get_mut(&key) {
            Some(entry) => entry.underlying = snapshot,
            None => {
                symbols.insert(
                    key,
                    SymbolFixture {
                        underlying: snapshot,
                        expirations: Vec::new(),
                        chains: Vec::new(),
                    },
                );
            }
        }
    }

    pub fn add_chain(&self, symbol: &str, chain: OptionChain) {
        let key = symbol.to_uppercase();
        let mut symbols = self.symbols.write();
        let entry = symbols.entry(key.clone()).or_insert_with(|| SymbolFixture {
            underlying: UnderlyingSnapshot::new(key),
            expirations: Vec::new(),
            chains: Vec::new(),
        });
        entry.chains.retain(|c| c.expiration != chain.expiration);
        entry.chains.push(ChainFixture {
            expiration: chain.expiration,
            puts: chain.puts().to_vec(),
            calls: chain.calls().to_vec(),
        });
        entry.chains.sort_by_key(|c| c.expiration);
    }

    fn lookup<T>(&self, symbol: &str, f: impl FnOnce(&SymbolFixture) -> Result<T>) -> Result<T> {
        let symbols = self.symbols.read();
        let entry = symbols
            .get(&symbol.to_uppercase())
            .ok_or_else(|| MarketDataError::InvalidSymbol(symbol.to_string()))?;
        f(entry)
    }
}

fn trim_history(history: &[DailyClose], history_days: u32) -> Vec<DailyClose> {
    let Some(last) = history.last() else {
        return Vec::new();
    };
    let cutoff = last.date - chrono::Duration::days(i64::from(history_days));
    history.iter().filter(|c| c.date > cutoff).copied().collect()
}

#[async_trait]
impl MarketDataProvider for StaticMarketData {
    fn name(&self) -> &str {
        "static"
    }

    async fn underlying(&self, symbol: &str, history_days: u32) -> Result<UnderlyingSnapshot> {
        self.lookup(symbol, |entry| {
            let mut snapshot = entry.underlying.clone();
            snapshot.history = trim_history(&snapshot.history, history_days);
            Ok(snapshot)
        })
    }

    async fn expirations(&self, symbol: &str) -> Result<Vec<String>> {
        self.lookup(symbol, |entry| {
            if !entry.expirations.is_empty() {
                return Ok(entry.expirations.clone());
            }
            Ok(entry
                .chains
                .iter()
                .map(|c| c.expiration.format("%Y-%m-%d").to_string())
                .collect())
        })
    }

    async fn option_chain(&self, symbol: &str, expiration: NaiveDate) -> Result<OptionChain> {
        self.lookup(symbol, |entry| {
            let chain = entry
                .chains
                .iter()
                .find(|c| c.expiration == expiration)
                .ok_or_else(|| {
                    MarketDataError::not_available(format!("{} chain for {}", symbol, expiration))
                })?;
            debug!(symbol, %expiration, puts = chain.puts.len(), calls = chain.calls.len(), "Serving static chain");
            Ok(OptionChain::new(
                chain.expiration,
                chain.puts.clone(),
                chain.calls.clone(),
            ))
        })
    }
}
