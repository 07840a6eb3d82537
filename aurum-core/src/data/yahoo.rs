//! Yahoo Finance data provider.
//!
//! Fetches intraday and daily OHLCV bars from Yahoo's v8 chart API. Handles
//! rate limiting, retries with exponential backoff and response parsing.
//!
//! Yahoo Finance has no official API and is subject to unannounced format changes.
//! The CSV provider is the fallback when Yahoo is unavailable.

use std::time::Duration;

use chrono::DateTime;
use serde::Deserialize;
use tracing::{debug, warn};

use super::provider::{DataError, DataProvider};
use crate::domain::{resample, Bar, Series, Timeframe};

const BASE_URL: &str = "https://query2.finance.yahoo.com/v8/finance/chart";

/// Yahoo Finance v8 chart API response.
#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: ChartResult,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    result: Option<Vec<ChartData>>,
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    code: String,
    description: String,
}

#[derive(Debug, Deserialize)]
struct ChartData {
    timestamp: Option<Vec<i64>>,
    indicators: Indicators,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    quote: Vec<QuoteData>,
}

#[derive(Debug, Deserialize)]
struct QuoteData {
    open: Vec<Option<f64>>,
    high: Vec<Option<f64>>,
    low: Vec<Option<f64>>,
    close: Vec<Option<f64>>,
    volume: Vec<Option<f64>>,
}

/// Yahoo Finance data provider.
pub struct YahooProvider {
    client: reqwest::blocking::Client,
    max_retries: u32,
    base_delay: Duration,
}

impl YahooProvider {
    pub fn new() -> Result<Self, DataError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent("Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36")
            .build()
            .map_err(|e| DataError::Other(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            max_retries: 3,
            base_delay: Duration::from_millis(500),
        })
    }

    pub fn with_retries(mut self, max_retries: u32, base_delay: Duration) -> Self {
        self.max_retries = max_retries;
        self.base_delay = base_delay;
        self
    }

    /// Build the chart API URL for a symbol, native interval and trailing range.
    fn chart_url(symbol: &str, interval: Timeframe, lookback_days: u32) -> String {
        format!(
            "{BASE_URL}/{symbol}?interval={}&range={}d&includePrePost=false",
            interval.label(),
            lookback_days.max(1)
        )
    }

    /// Parse the chart API response into a series at `interval`.
    ///
    /// Rows with a null close (market closed) are skipped, as are rows whose
    /// timestamp does not advance (Yahoo repeats the live bar) and rows with
    /// inconsistent OHLC values.
    fn parse_response(
        symbol: &str,
        interval: Timeframe,
        resp: ChartResponse,
    ) -> Result<Series, DataError> {
        let result = resp.chart.result.ok_or_else(|| {
            if let Some(err) = resp.chart.error {
                if err.code == "Not Found" {
                    DataError::SymbolNotFound {
                        symbol: symbol.to_string(),
                    }
                } else {
                    DataError::ResponseFormatChanged(format!("{}: {}", err.code, err.description))
                }
            } else {
                DataError::ResponseFormatChanged("empty result with no error".into())
            }
        })?;

        let data = result
            .into_iter()
            .next()
            .ok_or_else(|| DataError::ResponseFormatChanged("result array is empty".into()))?;

        let timestamps = data.timestamp.ok_or_else(|| DataError::Empty {
            symbol: symbol.to_string(),
            timeframe: interval,
        })?;

        let quote = data
            .indicators
            .quote
            .into_iter()
            .next()
            .ok_or_else(|| DataError::ResponseFormatChanged("no quote data".into()))?;

        let mut bars: Vec<Bar> = Vec::with_capacity(timestamps.len());

        for (i, &ts) in timestamps.iter().enumerate() {
            let timestamp = DateTime::from_timestamp(ts, 0).ok_or_else(|| {
                DataError::ResponseFormatChanged(format!("invalid timestamp: {ts}"))
            })?;

            let open = quote.open.get(i).copied().flatten();
            let high = quote.high.get(i).copied().flatten();
            let low = quote.low.get(i).copied().flatten();
            let close = quote.close.get(i).copied().flatten();
            let volume = quote.volume.get(i).copied().flatten();

            let Some(close) = close else {
                continue;
            };
            if bars.last().is_some_and(|prev| prev.timestamp >= timestamp) {
                continue;
            }

            let bar = Bar {
                timestamp,
                open: open.unwrap_or(close),
                high: high.unwrap_or(close),
                low: low.unwrap_or(close),
                close,
                volume: volume.unwrap_or(0.0),
            };
            if !bar.is_sane() {
                debug!(symbol, %timestamp, "skipping inconsistent bar");
                continue;
            }
            bars.push(bar);
        }

        if bars.is_empty() {
            return Err(DataError::Empty {
                symbol: symbol.to_string(),
                timeframe: interval,
            });
        }

        Ok(Series::new(symbol, interval, bars)?)
    }

    /// Execute a single chart request with retry logic.
    fn fetch_with_retry(
        &self,
        symbol: &str,
        interval: Timeframe,
        lookback_days: u32,
    ) -> Result<Series, DataError> {
        let url = Self::chart_url(symbol, interval, lookback_days);
        let mut last_error = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                let delay = self.base_delay * 2u32.pow(attempt - 1);
                debug!(symbol, attempt, delay_ms = delay.as_millis() as u64, "retrying chart request");
                std::thread::sleep(delay);
            }

            match self.client.get(&url).send() {
                Ok(resp) => {
                    let status = resp.status();

                    if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
                        let retry_after = resp
                            .headers()
                            .get("retry-after")
                            .and_then(|v| v.to_str().ok())
                            .and_then(|v| v.parse::<u64>().ok())
                            .unwrap_or(60);
                        warn!(symbol, retry_after, "rate limited by Yahoo");
                        last_error = Some(DataError::RateLimited {
                            retry_after_secs: retry_after,
                        });
                        continue;
                    }

                    if status == reqwest::StatusCode::NOT_FOUND {
                        return Err(DataError::SymbolNotFound {
                            symbol: symbol.to_string(),
                        });
                    }

                    if status.is_server_error() {
                        last_error = Some(DataError::Other(format!("HTTP {status} for {symbol}")));
                        continue;
                    }

                    if !status.is_success() {
                        return Err(DataError::Other(format!("HTTP {status} for {symbol}")));
                    }

                    let chart: ChartResponse = resp.json().map_err(|e| {
                        DataError::ResponseFormatChanged(format!(
                            "failed to parse response for {symbol}: {e}"
                        ))
                    })?;

                    return Self::parse_response(symbol, interval, chart);
                }
                Err(e) => {
                    if e.is_connect() || e.is_timeout() {
                        last_error = Some(DataError::NetworkUnreachable(e.to_string()));
                        continue;
                    }
                    return Err(DataError::NetworkUnreachable(e.to_string()));
                }
            }
        }

        Err(last_error.unwrap_or_else(|| DataError::Other("max retries exceeded".into())))
    }
}

impl DataProvider for YahooProvider {
    fn name(&self) -> &str {
        "yahoo_finance"
    }

    fn fetch(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        lookback_days: u32,
    ) -> Result<Series, DataError> {
        let interval = timeframe.source();
        let series = self.fetch_with_retry(symbol, interval, lookback_days)?;
        debug!(symbol, %interval, bars = series.len(), "fetched chart");
        if interval == timeframe {
            Ok(series)
        } else {
            Ok(resample(&series, timeframe)?)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> Result<Series, DataError> {
        let resp: ChartResponse = serde_json::from_str(json).unwrap();
        YahooProvider::parse_response("GC=F", Timeframe::Hour1, resp)
    }

    #[test]
    fn url_uses_interval_and_range() {
        let url = YahooProvider::chart_url("GC=F", Timeframe::Min15, 5);
        assert!(url.ends_with("/GC=F?interval=15m&range=5d&includePrePost=false"));
    }

    #[test]
    fn parses_and_skips_null_rows() {
        let json = r#"{"chart":{"result":[{
            "timestamp":[1717372800,1717376400,1717380000,1717380000],
            "indicators":{"quote":[{
                "open":[2330.0,null,2334.0,2334.0],
                "high":[2335.0,null,2338.0,2339.0],
                "low":[2328.0,null,2331.0,2331.0],
                "close":[2333.0,null,2336.5,2337.0],
                "volume":[1200,null,900,950]
            }]}
        }],"error":null}}"#;
        let series = parse(json).unwrap();
        assert_eq!(series.len(), 2);
        assert_eq!(series.timeframe(), Timeframe::Hour1);
        assert_eq!(series.closes(), vec![2333.0, 2336.5]);
        assert_eq!(series.bars()[1].volume, 900.0);
    }

    #[test]
    fn skips_inconsistent_rows() {
        let json = r#"{"chart":{"result":[{
            "timestamp":[1717372800,1717376400],
            "indicators":{"quote":[{
                "open":[2330.0,2334.0],
                "high":[2325.0,2338.0],
                "low":[2328.0,2331.0],
                "close":[2333.0,2336.5],
                "volume":[1200,900]
            }]}
        }],"error":null}}"#;
        let series = parse(json).unwrap();
        assert_eq!(series.closes(), vec![2336.5]);
    }

    #[test]
    fn not_found_maps_to_symbol_error() {
        let json = r#"{"chart":{"result":null,"error":{"code":"Not Found","description":"No data found, symbol may be delisted"}}}"#;
        assert!(matches!(parse(json), Err(DataError::SymbolNotFound { .. })));
    }

    #[test]
    fn missing_timestamps_is_empty() {
        let json = r#"{"chart":{"result":[{
            "indicators":{"quote":[{"open":[],"high":[],"low":[],"close":[],"volume":[]}]}
        }],"error":null}}"#;
        assert!(matches!(parse(json), Err(DataError::Empty { .. })));
    }
}
