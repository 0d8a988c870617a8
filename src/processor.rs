use crate::models::{ContractType, OptionContract, OptionSnapshot};
use chrono::NaiveDate;

/// Expiration dates come back as ISO dates ("2025-01-17")
pub const EXPIRY_FORMAT: &str = "%Y-%m-%d";

/// Flatten a raw snapshot into the fields the signal rules use
pub fn parse_option_contract(snapshot: &OptionSnapshot) -> OptionContract {
    let details = snapshot.details.clone().unwrap_or_default();
    let greeks = snapshot.greeks.clone().unwrap_or_default();

    OptionContract {
        symbol: details.ticker,
        contract_type: details
            .contract_type
            .as_deref()
            .and_then(|t| t.parse::<ContractType>().ok()),
        expiration_date: details.expiration_date,
        strike_price: details.strike_price,
        delta: greeks.delta,
        gamma: greeks.gamma,
        theta: greeks.theta,
        vega: greeks.vega,
        implied_volatility: snapshot.implied_volatility,
        open_interest: snapshot
            .open_interest
            .filter(|oi| *oi > 0.0)
            .map(|oi| oi as u64)
            .unwrap_or(0),
        mark: calculate_mark(snapshot),
    }
}

/// Mid of bid/ask when both sides are quoted, otherwise the last trade
pub fn calculate_mark(snapshot: &OptionSnapshot) -> Option<f64> {
    if let Some(quote) = &snapshot.last_quote {
        if let (Some(bid), Some(ask)) = (quote.bid, quote.ask) {
            if ask > 0.0 {
                return Some((bid + ask) / 2.0);
            }
        }
    }

    snapshot.last_trade.as_ref().and_then(|t| t.price)
}

/// Read the underlying stock price from the first contract that carries one
pub fn extract_underlying_price(chain: &[OptionSnapshot]) -> Option<f64> {
    chain.iter().find_map(|contract| {
        let underlying = contract.underlying_asset.as_ref()?;

        underlying
            .session
            .as_ref()
            .and_then(|s| s.close_price)
            .or_else(|| underlying.last_trade.as_ref().and_then(|t| t.price))
            .or(underlying.price)
    })
}

/// Calendar days from `today` until expiry. Negative once expired.
pub fn days_to_expiry(expiration_date: &str, today: NaiveDate) -> Option<i64> {
    NaiveDate::parse_from_str(expiration_date.trim(), EXPIRY_FORMAT)
        .ok()
        .map(|expiry| (expiry - today).num_days())
}
