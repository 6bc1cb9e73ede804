//! Stock quote fetching
//!
//! A downstream consumer of validated identities: once a caller holds a valid
//! token it may fetch current prices. Each symbol is fetched independently with
//! a bounded number of requests in flight; one symbol's failure never aborts
//! the others.

use std::future::Future;
use std::time::Duration;

use futures::stream::{self, StreamExt};
use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;

use crate::error::{AppError, QuoteError};

pub const MAX_CONCURRENT_FETCHES: usize = 5;

pub const DEFAULT_SYMBOLS: &[&str] = &[
    "AAPL", "AMZN", "GOOGL", "MSFT", "TSLA", "GOOG", "NVDA", "NFLX",
];

pub const DEFAULT_QUOTE_BASE_URL: &str = "https://finance.yahoo.com";

/// Scraped prices above this are treated as parse noise
const PRICE_SANITY_CEILING: f64 = 5000.0;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

lazy_static! {
    static ref FIN_STREAMER: Regex =
        Regex::new(r#"(?s)<fin-streamer([^>]*)>(.*?)</fin-streamer>"#).unwrap();
    static ref NON_NUMERIC: Regex = Regex::new(r"[^\d.]").unwrap();
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct StockQuote {
    pub symbol: String,
    pub price: Option<f64>,
}

pub struct QuoteClient {
    http: reqwest::Client,
    base_url: String,
}

impl QuoteClient {
    pub fn new() -> Result<Self, AppError> {
        Self::with_base_url(DEFAULT_QUOTE_BASE_URL)
    }

    pub fn with_base_url(base_url: impl Into<String>) -> Result<Self, AppError> {
        let http = reqwest::Client::builder()
            .user_agent("Mozilla/5.0")
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(QuoteError::from)?;

        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// Fetch the quote page for `symbol` and extract the market price.
    ///
    /// `Ok(None)` means the page was fetched but held no plausible price.
    pub async fn fetch_price(&self, symbol: &str) -> Result<Option<f64>, QuoteError> {
        let url = format!("{}/quote/{}/", self.base_url, symbol);
        let body = self
            .http
            .get(&url)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;

        let price = parse_price(&body, symbol);
        if let Some(p) = price.filter(|p| *p <= 0.0 || *p > PRICE_SANITY_CEILING) {
            tracing::warn!(symbol = %symbol, price = p, "Discarding implausible scraped price");
            return Ok(None);
        }
        Ok(price)
    }

    /// Like `fetch_price`, but failures are logged and reported as no price.
    pub async fn fetch_quote(&self, symbol: String) -> StockQuote {
        let price = match self.fetch_price(&symbol).await {
            Ok(price) => price,
            Err(e) => {
                tracing::error!(symbol = %symbol, error = %e, "Error fetching price");
                None
            }
        };
        StockQuote { symbol, price }
    }

    pub async fn fetch_all(&self, symbols: &[String]) -> Vec<StockQuote> {
        fetch_quotes(symbols, |symbol| self.fetch_quote(symbol)).await
    }
}

/// Run `fetch` for every symbol with at most `MAX_CONCURRENT_FETCHES` in flight.
/// Results are returned in completion order.
pub async fn fetch_quotes<F, Fut>(symbols: &[String], fetch: F) -> Vec<StockQuote>
where
    F: Fn(String) -> Fut,
    Fut: Future<Output = StockQuote>,
{
    stream::iter(symbols.iter().cloned())
        .map(fetch)
        .buffer_unordered(MAX_CONCURRENT_FETCHES)
        .collect()
        .await
}

/// Extract the `regularMarketPrice` value for `symbol` from a quote page.
pub fn parse_price(html: &str, symbol: &str) -> Option<f64> {
    let field = r#"data-field="regularMarketPrice""#;
    let symbol_attr = format!(r#"data-symbol="{}""#, symbol);

    FIN_STREAMER
        .captures_iter(html)
        .find(|caps| caps[1].contains(field) && caps[1].contains(&symbol_attr))
        .and_then(|caps| {
            let text = caps[2].trim();
            // Some pages carry the value only in the attribute
            let raw = if text.is_empty() {
                attribute_value(&caps[1], "value").unwrap_or_default()
            } else {
                text.to_string()
            };
            let cleaned = NON_NUMERIC.replace_all(&raw, "");
            cleaned.parse::<f64>().ok()
        })
}

fn attribute_value(attrs: &str, name: &str) -> Option<String> {
    let needle = format!(r#" {}=""#, name);
    let start = attrs.find(&needle)? + needle.len();
    let end = attrs[start..].find('"')? + start;
    Some(attrs[start..end].to_string())
}
