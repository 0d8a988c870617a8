use chrono::{DateTime, NaiveDate};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

// -----------------------------------------------
// WIRE TYPES: AGGREGATES
// -----------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct AggregatesResponse {
    #[serde(default)]
    pub results: Option<Vec<Bar>>,
}

/// One daily OHLCV bar
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bar {
    /// Bar start, milliseconds since the Unix epoch
    #[serde(rename = "t")]
    pub timestamp: i64,

    #[serde(rename = "o", default)]
    pub open: f64,

    #[serde(rename = "h", default)]
    pub high: f64,

    #[serde(rename = "l", default)]
    pub low: f64,

    #[serde(rename = "c")]
    pub close: f64,

    #[serde(rename = "v", default)]
    pub volume: f64,
}

impl Bar {
    pub fn date(&self) -> Option<NaiveDate> {
        DateTime::from_timestamp_millis(self.timestamp).map(|dt| dt.date_naive())
    }
}

// -----------------------------------------------
// WIRE TYPES: OPTION CHAIN SNAPSHOT
// -----------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct OptionChainResponse {
    #[serde(default)]
    pub results: Option<Vec<OptionSnapshot>>,

    #[serde(default)]
    pub next_url: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OptionSnapshot {
    #[serde(default)]
    pub details: Option<ContractDetails>,

    #[serde(default)]
    pub greeks: Option<Greeks>,

    #[serde(default, deserialize_with = "lenient_f64")]
    pub implied_volatility: Option<f64>,

    #[serde(default, deserialize_with = "lenient_f64")]
    pub open_interest: Option<f64>,

    #[serde(default)]
    pub last_quote: Option<LastQuote>,

    #[serde(default)]
    pub last_trade: Option<LastTrade>,

    #[serde(default)]
    pub underlying_asset: Option<UnderlyingAsset>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContractDetails {
    #[serde(default, alias = "symbol")]
    pub ticker: Option<String>,

    #[serde(default)]
    pub contract_type: Option<String>,

    #[serde(default)]
    pub expiration_date: Option<String>,

    #[serde(default, deserialize_with = "lenient_f64")]
    pub strike_price: Option<f64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Greeks {
    #[serde(default, deserialize_with = "lenient_f64")]
    pub delta: Option<f64>,

    #[serde(default, deserialize_with = "lenient_f64")]
    pub gamma: Option<f64>,

    #[serde(default, deserialize_with = "lenient_f64")]
    pub theta: Option<f64>,

    #[serde(default, deserialize_with = "lenient_f64")]
    pub vega: Option<f64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LastQuote {
    #[serde(default, alias = "bid_price", deserialize_with = "lenient_f64")]
    pub bid: Option<f64>,

    #[serde(default, alias = "ask_price", deserialize_with = "lenient_f64")]
    pub ask: Option<f64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LastTrade {
    #[serde(default, deserialize_with = "lenient_f64")]
    pub price: Option<f64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UnderlyingAsset {
    #[serde(default)]
    pub ticker: Option<String>,

    #[serde(default, deserialize_with = "lenient_f64")]
    pub price: Option<f64>,

    #[serde(default)]
    pub session: Option<Session>,

    #[serde(default)]
    pub last_trade: Option<LastTrade>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Session {
    #[serde(default, deserialize_with = "lenient_f64")]
    pub close_price: Option<f64>,
}

/// Accept a number or a numeric string; anything else reads as missing
fn lenient_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
    .filter(|v| v.is_finite()))
}

// -----------------------------------------------
// DOMAIN TYPES
// -----------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContractType {
    Call,
    Put,
}

impl ContractType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContractType::Call => "call",
            ContractType::Put => "put",
        }
    }
}

impl fmt::Display for ContractType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ContractType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "call" => Ok(ContractType::Call),
            "put" => Ok(ContractType::Put),
            other => Err(format!("unknown contract type '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Trend {
    Bullish,
    Bearish,
    Neutral,
    NoData,
}

impl Trend {
    /// Option side that expresses this trend, if it is directional
    pub fn contract_type(&self) -> Option<ContractType> {
        match self {
            Trend::Bullish => Some(ContractType::Call),
            Trend::Bearish => Some(ContractType::Put),
            Trend::Neutral | Trend::NoData => None,
        }
    }

    pub fn is_directional(&self) -> bool {
        self.contract_type().is_some()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Trend::Bullish => "bullish",
            Trend::Bearish => "bearish",
            Trend::Neutral => "neutral",
            Trend::NoData => "no_data",
        }
    }
}

impl fmt::Display for Trend {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Latest indicator readings for one ticker
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrendInfo {
    pub trend: Trend,
    pub latest_close: Option<f64>,
    pub sma_short: Option<f64>,
    pub sma_long: Option<f64>,
    pub ema_short: Option<f64>,
    pub rsi: Option<f64>,
    pub as_of: Option<NaiveDate>,
}

impl TrendInfo {
    pub fn no_data() -> Self {
        Self {
            trend: Trend::NoData,
            latest_close: None,
            sma_short: None,
            sma_long: None,
            ema_short: None,
            rsi: None,
            as_of: None,
        }
    }
}

/// Option snapshot flattened into the fields the rules look at
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptionContract {
    pub symbol: Option<String>,
    pub contract_type: Option<ContractType>,
    pub expiration_date: Option<String>,
    pub strike_price: Option<f64>,
    pub delta: Option<f64>,
    pub gamma: Option<f64>,
    pub theta: Option<f64>,
    pub vega: Option<f64>,
    pub implied_volatility: Option<f64>,
    pub open_interest: u64,
    pub mark: Option<f64>,
}

/// The single contract recommended for a ticker
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Signal {
    pub ticker: String,
    pub trend: Trend,
    pub underlying_price: Option<f64>,
    pub option_symbol: Option<String>,
    pub contract_type: ContractType,
    pub strike_price: f64,
    pub expiration_date: String,
    pub delta: f64,
    pub open_interest: u64,
    pub mark: f64,
    pub dte: i64,
    pub projected_underlying_change: Option<f64>,
    pub projected_option_change: Option<f64>,
    pub projected_return_pct: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_tolerates_strings_and_gaps() {
        let raw = serde_json::json!({
            "details": {
                "ticker": "O:AAPL250117C00200000",
                "contract_type": "call",
                "expiration_date": "2025-01-17",
                "strike_price": "200"
            },
            "greeks": { "delta": "n/a" },
            "open_interest": 1250,
            "last_quote": { "bid_price": 1.2, "ask_price": 1.4 }
        });

        let snap: OptionSnapshot = serde_json::from_value(raw).unwrap();
        let details = snap.details.unwrap();
        assert_eq!(details.strike_price, Some(200.0));
        assert_eq!(snap.greeks.unwrap().delta, None);
        assert_eq!(snap.open_interest, Some(1250.0));
        assert_eq!(snap.last_quote.as_ref().unwrap().bid, Some(1.2));
        assert!(snap.last_trade.is_none());
    }

    #[test]
    fn test_bar_date() {
        let bar: Bar = serde_json::from_value(serde_json::json!({
            "t": 1_735_689_600_000i64, "o": 1.0, "h": 2.0, "l": 0.5, "c": 1.5, "v": 100
        }))
        .unwrap();
        assert_eq!(bar.date(), NaiveDate::from_ymd_opt(2025, 1, 1));
    }

    #[test]
    fn test_trend_sides() {
        assert_eq!(Trend::Bullish.contract_type(), Some(ContractType::Call));
        assert_eq!(Trend::Bearish.contract_type(), Some(ContractType::Put));
        assert!(!Trend::Neutral.is_directional());
        assert_eq!(Trend::NoData.to_string(), "no_data");
        assert_eq!("PUT".parse::<ContractType>(), Ok(ContractType::Put));
    }
}
