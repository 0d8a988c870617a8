use crate::config::Settings;
use crate::massive_client::MassiveClient;
use crate::models::{Signal, TrendInfo};
use crate::signals::{analyze_trend, pick_option_for_trend};
use crate::utility::timing::{AggregateTimer, Timer};
use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::Serialize;
use std::path::Path;
use tracing::{info, warn};

/// What a single ticker produced
#[derive(Debug, Clone, Serialize)]
pub struct TickerOutcome {
    pub ticker: String,
    pub trend: TrendInfo,
    pub signal: Option<Signal>,
}

/// Results of scanning every configured ticker
#[derive(Debug, Clone, Default, Serialize)]
pub struct ScanReport {
    pub outcomes: Vec<TickerOutcome>,
    pub failures: Vec<(String, String)>,
}

impl ScanReport {
    pub fn signals(&self) -> Vec<Signal> {
        self.outcomes.iter().filter_map(|o| o.signal.clone()).collect()
    }

    pub fn record(&mut self, ticker: &str, result: Result<TickerOutcome>) {
        match result {
            Ok(outcome) => self.outcomes.push(outcome),
            Err(e) => {
                let error = format!("{:#}", e);
                warn!(ticker, error = %error, "ticker scan failed");
                self.failures.push((ticker.to_string(), error));
            }
        }
    }

    /// Write the whole report, outcomes and failures included, as pretty JSON
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let json = serde_json::to_string_pretty(self).context("Failed to serialize scan report")?;
        std::fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))?;
        info!(path = %path.display(), outcomes = self.outcomes.len(), failures = self.failures.len(), "report saved");
        Ok(())
    }
}

/// History → indicators → (chain → contract) for one ticker
pub async fn scan_ticker(
    client: &MassiveClient,
    ticker: &str,
    today: NaiveDate,
    settings: &Settings,
) -> Result<TickerOutcome> {
    let bars = client.fetch_daily_history(ticker, settings.lookback_days, today).await?;
    let trend = analyze_trend(&bars, settings);

    info!(
        ticker,
        trend = %trend.trend,
        bars = bars.len(),
        rsi = ?trend.rsi,
        sma_short = ?trend.sma_short,
        sma_long = ?trend.sma_long,
        "trend analyzed"
    );

    let Some(side) = trend.trend.contract_type() else {
        return Ok(TickerOutcome {
            ticker: ticker.to_string(),
            trend,
            signal: None,
        });
    };

    let chain = client.fetch_option_chain(ticker, Some(side)).await?;
    let signal = pick_option_for_trend(ticker, &trend, &chain, today, settings);

    match &signal {
        Some(s) => info!(
            ticker,
            contract = s.option_symbol.as_deref().unwrap_or("n/a"),
            delta = s.delta,
            dte = s.dte,
            "contract selected"
        ),
        None => info!(ticker, chain = chain.len(), "no contract passed the filters"),
    }

    Ok(TickerOutcome {
        ticker: ticker.to_string(),
        trend,
        signal,
    })
}

/// Scan tickers one after another; a failing ticker doesn't stop the run
pub async fn run_scan(client: &MassiveClient, tickers: &[String], today: NaiveDate, settings: &Settings) -> ScanReport {
    let mut report = ScanReport::default();
    let mut per_ticker = AggregateTimer::new("ticker scan");

    for ticker in tickers {
        let timer = Timer::start(format!("scan {}", ticker));
        let result = scan_ticker(client, ticker, today, settings).await;
        per_ticker.record(timer.elapsed());
        report.record(ticker, result);
    }

    per_ticker.summary();
    info!(
        scanned = per_ticker.count(),
        signals = report.signals().len(),
        failures = report.failures.len(),
        "scan finished"
    );
    report
}
