use crate::config::{self, Settings};
use crate::error::{ApiError, preview};
use crate::models::{AggregatesResponse, Bar, ContractType, OptionChainResponse, OptionSnapshot};
use anyhow::{Context, Result};
use chrono::{Duration as ChronoDuration, NaiveDate};
use reqwest::{Client, StatusCode, header};
use std::time::Duration;
use tokio_retry::RetryIf;
use tokio_retry::strategy::ExponentialBackoff;
use tracing::{debug, info, warn};

// -----------------------------------------------
// CLIENT WRAPPER
// -----------------------------------------------
pub struct MassiveClient {
    client: Client,
    base_url: String,
    debug: bool,
}

impl MassiveClient {
    pub fn new(settings: &Settings) -> Result<Self> {
        let api_key = settings.require_api_key()?;
        Ok(Self {
            client: build_client(api_key, settings.timeout)?,
            base_url: settings.base_url.clone(),
            debug: settings.debug,
        })
    }

    /// GET with retry on rate limits and server errors
    async fn fetch_json(&self, url: &str, query: &[(&str, String)]) -> Result<String> {
        let backoff = ExponentialBackoff::from_millis(config::RETRY_BASE_DELAY_MS)
            .factor(config::RETRY_FACTOR)
            .max_delay(Duration::from_secs(config::RETRY_MAX_DELAY_SECS))
            .take(config::RETRY_MAX_ATTEMPTS);

        RetryIf::spawn(
            backoff,
            || self.fetch_once(url, query),
            |err: &ApiError| {
                let retry = err.is_retryable();
                if retry {
                    warn!(url, error = %err, "retrying request");
                }
                retry
            },
        )
        .await
        .with_context(|| format!("GET {} failed", url))
    }

    async fn fetch_once(&self, url: &str, query: &[(&str, String)]) -> Result<String, ApiError> {
        let res = self.client.get(url).query(query).send().await?;

        let status = res.status();
        let final_url = res.url().to_string();
        let text = res.text().await?;

        if self.debug {
            info!(url = %final_url, status = status.as_u16(), body = %preview(&text), "GET");
        } else {
            debug!(url = %final_url, status = status.as_u16(), "GET");
        }

        if status.is_success() {
            let trimmed = text.trim_start();
            if !trimmed.starts_with('{') && !trimmed.starts_with('[') {
                return Err(ApiError::NonJson(preview(&text)));
            }
            Ok(text)
        } else if status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
            Err(ApiError::Retryable { status })
        } else {
            Err(ApiError::Client {
                status,
                preview: preview(&text),
            })
        }
    }

    // -----------------------------------------------
    // DAILY HISTORY
    // -----------------------------------------------
    /// Last `days` daily bars up to `today`, oldest first
    pub async fn fetch_daily_history(&self, ticker: &str, days: usize, today: NaiveDate) -> Result<Vec<Bar>> {
        let (start, today) = history_window(today, days)?;
        let url = config::massive_daily_aggs_url(
            &self.base_url,
            ticker,
            &start.format("%Y-%m-%d").to_string(),
            &today.format("%Y-%m-%d").to_string(),
        );

        let query = [
            ("adjusted", "true".to_string()),
            ("sort", "asc".to_string()),
            ("limit", config::AGGS_LIMIT.to_string()),
        ];

        let text = self.fetch_json(&url, &query).await?;
        let response: AggregatesResponse = serde_json::from_str(&text)
            .with_context(|| format!("Failed to parse aggregates for {}", ticker))?;

        Ok(latest_bars(response.results.unwrap_or_default(), days))
    }

    // -----------------------------------------------
    // OPTION CHAIN SNAPSHOT
    // -----------------------------------------------
    /// Chain snapshot for an underlying, optionally limited to one side
    pub async fn fetch_option_chain(
        &self,
        ticker: &str,
        contract_type: Option<ContractType>,
    ) -> Result<Vec<OptionSnapshot>> {
        let url = config::massive_option_chain_url(&self.base_url, ticker);

        let mut query = vec![("limit", config::CHAIN_PAGE_LIMIT.to_string())];
        if let Some(side) = contract_type {
            query.push(("contract_type", side.as_str().to_string()));
        }

        let mut contracts = Vec::new();
        let mut next = Some((url, query));
        let mut pages = 0;

        while let Some((page_url, page_query)) = next.take() {
            let text = self.fetch_json(&page_url, &page_query).await?;
            let response: OptionChainResponse = serde_json::from_str(&text)
                .with_context(|| format!("Failed to parse option chain for {}", ticker))?;

            contracts.extend(response.results.unwrap_or_default());
            pages += 1;

            // next_url already carries the cursor and filters
            next = match response.next_url {
                Some(url) if pages < config::MAX_CHAIN_PAGES => Some((url, Vec::new())),
                Some(_) => {
                    debug!(ticker, pages, "option chain truncated at page limit");
                    None
                }
                None => None,
            };
        }

        Ok(contracts)
    }
}

/// Calendar range to request for `days` sessions ending `today`.
/// Pulls twice the span so weekends and holidays still leave enough sessions.
pub fn history_window(today: NaiveDate, days: usize) -> Result<(NaiveDate, NaiveDate)> {
    let start = i64::try_from(days)
        .ok()
        .and_then(|d| d.checked_mul(2))
        .and_then(ChronoDuration::try_days)
        .and_then(|span| today.checked_sub_signed(span))
        .with_context(|| format!("Lookback of {} days is out of range", days))?;
    Ok((start, today))
}

/// Sort by timestamp and keep the newest `days` bars
pub fn latest_bars(mut bars: Vec<Bar>, days: usize) -> Vec<Bar> {
    bars.sort_by_key(|b| b.timestamp);
    let skip = bars.len().saturating_sub(days);
    bars.split_off(skip)
}

// -----------------------------------------------
// HTTP CLIENT BUILDER
// -----------------------------------------------
fn build_client(api_key: &str, timeout: Duration) -> Result<Client> {
    let mut headers = header::HeaderMap::new();

    let mut auth = header::HeaderValue::from_str(&format!("Bearer {}", api_key))
        .context("API key is not a valid header value")?;
    auth.set_sensitive(true);
    headers.insert(header::AUTHORIZATION, auth);
    headers.insert(header::ACCEPT, header::HeaderValue::from_static(config::HEADER_ACCEPT_JSON));

    Client::builder()
        .default_headers(headers)
        .gzip(true)
        .timeout(timeout)
        .build()
        .context("Failed to build HTTP client")
}
