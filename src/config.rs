use anyhow::{Context, Result, bail};
use std::str::FromStr;
use std::time::Duration;

// -----------------------------------------------
// MASSIVE API ENDPOINTS
// -----------------------------------------------
pub const MASSIVE_BASE_URL: &str = "https://api.massive.com";

pub fn massive_daily_aggs_url(base: &str, ticker: &str, start: &str, end: &str) -> String {
    format!(
        "{}/v2/aggs/ticker/{}/range/1/day/{}/{}",
        base.trim_end_matches('/'),
        urlencoding::encode(ticker),
        start,
        end
    )
}

pub fn massive_option_chain_url(base: &str, ticker: &str) -> String {
    format!(
        "{}/v3/snapshot/options/{}",
        base.trim_end_matches('/'),
        urlencoding::encode(ticker)
    )
}

// -----------------------------------------------
// TICKERS TO SCAN
// -----------------------------------------------
pub const DEFAULT_TICKERS: &[&str] = &["AAPL", "NVDA", "AMZN", "META", "MSFT", "TSLA", "GOOG", "WDC"];

// -----------------------------------------------
// INDICATOR PARAMETERS
// -----------------------------------------------
pub const LOOKBACK_DAYS: usize = 90; // trading days kept from the history pull
pub const MAX_LOOKBACK_DAYS: usize = 3650;
pub const MA_SHORT: usize = 10;
pub const MA_LONG: usize = 20;
pub const RSI_PERIOD: usize = 14;

pub const BULLISH_RSI_MIN: f64 = 40.0;
pub const BULLISH_RSI_MAX: f64 = 70.0;
pub const BEARISH_RSI_MIN: f64 = 30.0;
pub const BEARISH_RSI_MAX: f64 = 60.0;

// -----------------------------------------------
// OPTION FILTERS
// -----------------------------------------------
pub const MIN_DTE: i64 = 10;
pub const MAX_DTE: i64 = 60;
pub const TARGET_DELTA_CALL: f64 = 0.35;
pub const TARGET_DELTA_PUT: f64 = -0.35;
pub const MIN_OPEN_INTEREST: u64 = 100;

// Assumed underlying move for the projected return column
pub const PROJECTED_MOVE_PCT: f64 = 0.05;

pub const AGGS_LIMIT: u32 = 5000;
pub const CHAIN_PAGE_LIMIT: u32 = 250;
pub const MAX_CHAIN_PAGES: usize = 4;

// -----------------------------------------------
// HTTP CLIENT CONFIG
// -----------------------------------------------
pub const HTTP_TIMEOUT: Duration = Duration::from_secs(10);
pub const HEADER_ACCEPT_JSON: &str = "application/json";

pub const RETRY_BASE_DELAY_MS: u64 = 200;
pub const RETRY_FACTOR: u64 = 2;
pub const RETRY_MAX_DELAY_SECS: u64 = 3;
pub const RETRY_MAX_ATTEMPTS: usize = 3;

// -----------------------------------------------
// EMAIL
// -----------------------------------------------
pub const DEFAULT_SMTP_HOST: &str = "smtp.gmail.com";
pub const DEFAULT_SMTP_PORT: u16 = 587;
pub const EMAIL_SUBJECT: &str = "Options Signal Bot - Massive scan";

// -----------------------------------------------
// OUTPUT
// -----------------------------------------------
pub const LOG_DIR: &str = "./logs";
pub const DRY_RUN_OUTPUT: &str = "signals.json";

// -----------------------------------------------
// RUNTIME CONFIGURATION
// -----------------------------------------------

/// Execution mode selected with `SIGNAL_MODE`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mode {
    Scan,
    DryRun,
    Single(String),
}

/// Everything a run needs, resolved once at startup
#[derive(Debug, Clone)]
pub struct Settings {
    pub api_key: Option<String>,
    pub base_url: String,
    pub tickers: Vec<String>,

    pub lookback_days: usize,
    pub ma_short: usize,
    pub ma_long: usize,
    pub rsi_period: usize,

    pub min_dte: i64,
    pub max_dte: i64,
    pub target_delta_call: f64,
    pub target_delta_put: f64,
    pub min_open_interest: u64,

    pub smtp_host: String,
    pub smtp_port: u16,
    pub smtp_username: Option<String>,
    pub smtp_password: Option<String>,
    pub email_from: Option<String>,
    pub email_to: Vec<String>,

    pub debug: bool,
    pub timeout: Duration,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: MASSIVE_BASE_URL.to_string(),
            tickers: DEFAULT_TICKERS.iter().map(|t| t.to_string()).collect(),
            lookback_days: LOOKBACK_DAYS,
            ma_short: MA_SHORT,
            ma_long: MA_LONG,
            rsi_period: RSI_PERIOD,
            min_dte: MIN_DTE,
            max_dte: MAX_DTE,
            target_delta_call: TARGET_DELTA_CALL,
            target_delta_put: TARGET_DELTA_PUT,
            min_open_interest: MIN_OPEN_INTEREST,
            smtp_host: DEFAULT_SMTP_HOST.to_string(),
            smtp_port: DEFAULT_SMTP_PORT,
            smtp_username: None,
            smtp_password: None,
            email_from: None,
            email_to: Vec::new(),
            debug: false,
            timeout: HTTP_TIMEOUT,
        }
    }
}

impl Settings {
    /// Create settings from process environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Create settings from any key lookup (the environment in production)
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let defaults = Settings::default();

        let tickers = match get("SIGNAL_TICKERS") {
            Some(raw) => parse_list(&raw).into_iter().map(|t| t.to_uppercase()).collect(),
            None => defaults.tickers,
        };

        let smtp_username = get("SMTP_USERNAME");
        let email_from = get("EMAIL_FROM").or_else(|| smtp_username.clone());
        let email_to = match get("EMAIL_TO") {
            Some(raw) => parse_list(&raw),
            None => email_from.iter().cloned().collect(),
        };

        Ok(Self {
            api_key: get("MASSIVE_API_KEY"),
            base_url: get("MASSIVE_BASE_URL").unwrap_or(defaults.base_url),
            tickers,
            lookback_days: parse_or("SIGNAL_LOOKBACK_DAYS", get("SIGNAL_LOOKBACK_DAYS"), defaults.lookback_days)?,
            ma_short: parse_or("SIGNAL_MA_SHORT", get("SIGNAL_MA_SHORT"), defaults.ma_short)?,
            ma_long: parse_or("SIGNAL_MA_LONG", get("SIGNAL_MA_LONG"), defaults.ma_long)?,
            rsi_period: parse_or("SIGNAL_RSI_PERIOD", get("SIGNAL_RSI_PERIOD"), defaults.rsi_period)?,
            min_dte: parse_or("SIGNAL_MIN_DTE", get("SIGNAL_MIN_DTE"), defaults.min_dte)?,
            max_dte: parse_or("SIGNAL_MAX_DTE", get("SIGNAL_MAX_DTE"), defaults.max_dte)?,
            target_delta_call: parse_or(
                "SIGNAL_TARGET_DELTA_CALL",
                get("SIGNAL_TARGET_DELTA_CALL"),
                defaults.target_delta_call,
            )?,
            target_delta_put: parse_or(
                "SIGNAL_TARGET_DELTA_PUT",
                get("SIGNAL_TARGET_DELTA_PUT"),
                defaults.target_delta_put,
            )?,
            min_open_interest: parse_or(
                "SIGNAL_MIN_OPEN_INTEREST",
                get("SIGNAL_MIN_OPEN_INTEREST"),
                defaults.min_open_interest,
            )?,
            smtp_host: get("SMTP_HOST").unwrap_or(defaults.smtp_host),
            smtp_port: parse_or("SMTP_PORT", get("SMTP_PORT"), defaults.smtp_port)?,
            smtp_username,
            smtp_password: get("SMTP_PASSWORD"),
            email_from,
            email_to,
            debug: get("SIGNAL_DEBUG").is_some_and(|v| parse_flag(&v)),
            timeout: defaults.timeout,
        })
    }

    /// Validate strategy parameters
    pub fn validate(&self) -> Result<()> {
        if self.tickers.is_empty() {
            bail!("No tickers configured");
        }
        if self.ma_short == 0 || self.ma_long == 0 || self.rsi_period == 0 {
            bail!("Indicator periods must be greater than zero");
        }
        if self.ma_short >= self.ma_long {
            bail!(
                "Short moving average ({}) must be shorter than long moving average ({})",
                self.ma_short,
                self.ma_long
            );
        }
        if self.lookback_days < self.ma_long {
            bail!(
                "Lookback of {} days cannot fill a {}-day moving average",
                self.lookback_days,
                self.ma_long
            );
        }
        if self.lookback_days > MAX_LOOKBACK_DAYS {
            bail!(
                "Lookback of {} days exceeds the {}-day maximum",
                self.lookback_days,
                MAX_LOOKBACK_DAYS
            );
        }
        if self.min_dte > self.max_dte {
            bail!("MIN_DTE ({}) is greater than MAX_DTE ({})", self.min_dte, self.max_dte);
        }
        Ok(())
    }

    /// API key, required by every mode that touches the network
    pub fn require_api_key(&self) -> Result<&str> {
        self.api_key
            .as_deref()
            .context("MASSIVE_API_KEY is not set")
    }
}

/// Get the execution mode from environment or default to scan
pub fn get_execution_mode() -> Result<Mode> {
    let mode = std::env::var("SIGNAL_MODE").unwrap_or_else(|_| "scan".to_string());
    parse_mode(&mode, std::env::var("SIGNAL_TICKER").ok())
}

pub fn parse_mode(mode: &str, ticker: Option<String>) -> Result<Mode> {
    match mode.trim().to_lowercase().as_str() {
        "scan" => Ok(Mode::Scan),
        "dry-run" | "dryrun" => Ok(Mode::DryRun),
        "single" => {
            let ticker = ticker
                .map(|t| t.trim().to_uppercase())
                .filter(|t| !t.is_empty())
                .context("SIGNAL_MODE=single requires SIGNAL_TICKER")?;
            Ok(Mode::Single(ticker))
        }
        other => bail!("Invalid mode '{}'. Use 'scan', 'dry-run' or 'single'", other),
    }
}

fn parse_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn parse_flag(raw: &str) -> bool {
    matches!(raw.to_lowercase().as_str(), "1" | "true" | "yes" | "on")
}

fn parse_or<T>(key: &str, raw: Option<String>, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match raw {
        Some(value) => value
            .parse::<T>()
            .map_err(|e| anyhow::anyhow!("Invalid value '{}' for {}: {}", value, key, e)),
        None => Ok(default),
    }
}
