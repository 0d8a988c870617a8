use crate::config::{self, Settings};
use crate::indicators::{ema, last_valid, rsi, sma};
use crate::models::{Bar, ContractType, OptionContract, OptionSnapshot, Signal, Trend, TrendInfo};
use crate::processor::{days_to_expiry, extract_underlying_price, parse_option_contract};
use chrono::NaiveDate;

/// A contract that survived the filters, with its days to expiry
#[derive(Debug, Clone)]
pub struct Candidate {
    pub contract: OptionContract,
    pub dte: i64,
}

/// Compute trend indicators from daily bars (oldest first)
pub fn analyze_trend(bars: &[Bar], settings: &Settings) -> TrendInfo {
    let Some(last_bar) = bars.last() else {
        return TrendInfo::no_data();
    };

    let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();

    let sma_short = last_valid(&sma(&closes, settings.ma_short));
    let sma_long = last_valid(&sma(&closes, settings.ma_long));
    let rsi_val = last_valid(&rsi(&closes, settings.rsi_period));
    let ema_short = last_valid(&ema(&closes, settings.ma_short));

    let trend = match (sma_short, sma_long, rsi_val) {
        (Some(short), Some(long), Some(r)) => classify_trend(short, long, r),
        _ => Trend::NoData,
    };

    TrendInfo {
        trend,
        latest_close: Some(last_bar.close).filter(|c| c.is_finite()),
        sma_short,
        sma_long,
        ema_short,
        rsi: rsi_val,
        as_of: last_bar.date(),
    }
}

/// Moving-average crossover gated by an RSI band
pub fn classify_trend(sma_short: f64, sma_long: f64, rsi: f64) -> Trend {
    if sma_short > sma_long && (config::BULLISH_RSI_MIN..=config::BULLISH_RSI_MAX).contains(&rsi) {
        Trend::Bullish
    } else if sma_short < sma_long && (config::BEARISH_RSI_MIN..=config::BEARISH_RSI_MAX).contains(&rsi) {
        Trend::Bearish
    } else {
        Trend::Neutral
    }
}

/// Delta the ranking aims for on each side
pub fn target_delta(contract_type: ContractType, settings: &Settings) -> f64 {
    match contract_type {
        ContractType::Call => settings.target_delta_call,
        ContractType::Put => settings.target_delta_put,
    }
}

/// Normalize and filter a chain down to tradeable contracts on one side
pub fn filter_candidates(
    chain: &[OptionSnapshot],
    contract_type: ContractType,
    today: NaiveDate,
    settings: &Settings,
) -> Vec<Candidate> {
    chain
        .iter()
        .map(parse_option_contract)
        .filter_map(|contract| {
            let expiry = contract.expiration_date.as_deref()?;
            contract.strike_price?;

            let dte = days_to_expiry(expiry, today)?;
            if dte < settings.min_dte || dte > settings.max_dte {
                return None;
            }
            if contract.open_interest < settings.min_open_interest {
                return None;
            }
            contract.delta?;
            if !contract.mark.is_some_and(|m| m > 0.0) {
                return None;
            }
            // The chain is requested per side, but don't trust it blindly
            if contract.contract_type.is_some_and(|t| t != contract_type) {
                return None;
            }

            Some(Candidate { contract, dte })
        })
        .collect()
}

/// Order by distance to the target delta, then by nearest expiry. Stable on ties.
pub fn rank_candidates(candidates: &mut [Candidate], target: f64) {
    candidates.sort_by(|a, b| {
        let da = (a.contract.delta.unwrap_or(0.0) - target).abs();
        let db = (b.contract.delta.unwrap_or(0.0) - target).abs();
        da.total_cmp(&db).then(a.dte.cmp(&b.dte))
    });
}

/// Pick a single contract for a bullish or bearish trend
pub fn pick_option_for_trend(
    ticker: &str,
    trend_info: &TrendInfo,
    chain: &[OptionSnapshot],
    today: NaiveDate,
    settings: &Settings,
) -> Option<Signal> {
    let contract_type = trend_info.trend.contract_type()?;
    if chain.is_empty() {
        return None;
    }

    let underlying_price = extract_underlying_price(chain).or(trend_info.latest_close);

    let mut candidates = filter_candidates(chain, contract_type, today, settings);
    rank_candidates(&mut candidates, target_delta(contract_type, settings));
    let best = candidates.into_iter().next()?;

    let delta = best.contract.delta?;
    let mark = best.contract.mark?;
    let strike_price = best.contract.strike_price?;
    let expiration_date = best.contract.expiration_date.clone()?;

    let projection = project_return(trend_info.trend, underlying_price, delta, mark);

    Some(Signal {
        ticker: ticker.to_string(),
        trend: trend_info.trend,
        underlying_price,
        option_symbol: best.contract.symbol,
        contract_type: best.contract.contract_type.unwrap_or(contract_type),
        strike_price,
        expiration_date,
        delta,
        open_interest: best.contract.open_interest,
        mark,
        dte: best.dte,
        projected_underlying_change: projection.map(|p| p.underlying_change),
        projected_option_change: projection.map(|p| p.option_change),
        projected_return_pct: projection.map(|p| p.return_pct),
    })
}

/// First-order (delta only) estimate of the option's response to a fixed move
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Projection {
    pub underlying_change: f64,
    pub option_change: f64,
    pub return_pct: f64,
}

pub fn project_return(trend: Trend, underlying_price: Option<f64>, delta: f64, mark: f64) -> Option<Projection> {
    let underlying_price = underlying_price?;
    if mark <= 0.0 {
        return None;
    }

    let move_pct = match trend {
        Trend::Bearish => -config::PROJECTED_MOVE_PCT,
        _ => config::PROJECTED_MOVE_PCT,
    };

    let underlying_change = underlying_price * move_pct;
    let option_change = delta * underlying_change;

    Some(Projection {
        underlying_change,
        option_change,
        return_pct: option_change / mark * 100.0,
    })
}
