use crate::config::Config;
use crate::errors::{CollectorError, FetchError, Result};
use crate::fetchers::base::StatsFetcher;
use crate::models::stats::{StatValue, Stats};
use crate::models::ticker::Ticker;
use crate::util;
use async_trait::async_trait;
use log::{debug, info, warn};
use once_cell::sync::Lazy;
use reqwest::{Client, StatusCode, Url};
use scraper::{ElementRef, Html, Node, Selector};
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

static ROW_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("tbody tr").expect("Failed to parse row selector"));
static CELL_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("td").expect("Failed to parse cell selector"));

/// Yahoo Finance key-statistics page scraper
pub struct YahooStatsFetcher {
    client: Client,
    base_url: String,
    request_interval: Duration,
    last_request: Mutex<Option<Instant>>,
}

impl YahooStatsFetcher {
    pub fn new(config: &Config) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .user_agent(config.user_agent.as_str())
            .build()?;

        Url::parse(&config.base_url)
            .map_err(|e| CollectorError::Config(format!("Invalid base URL {}: {}", config.base_url, e)))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            request_interval: config.request_interval,
            last_request: Mutex::new(None),
        })
    }

    fn statistics_url(&self, ticker: &Ticker) -> std::result::Result<Url, FetchError> {
        let raw = format!("{}/quote/{}/key-statistics", self.base_url, ticker);
        let mut url = Url::parse(&raw).map_err(|e| FetchError::Other {
            ticker: ticker.clone(),
            reason: format!("invalid URL {}: {}", raw, e),
        })?;
        url.query_pairs_mut().append_pair("p", ticker.as_str());
        Ok(url)
    }

    async fn wait_for_rate_limit(&self) {
        let mut last = self.last_request.lock().await;

        if let Some(time) = *last {
            let elapsed = time.elapsed();
            if elapsed < self.request_interval {
                let wait = self.request_interval - elapsed;
                debug!("Waiting {:?} before next request", wait);
                tokio::time::sleep(wait).await;
            }
        }

        *last = Some(Instant::now());
    }
}

#[async_trait]
impl StatsFetcher for YahooStatsFetcher {
    fn source_name(&self) -> &'static str {
        "yahoo"
    }

    async fn fetch(&self, ticker: &Ticker) -> std::result::Result<Stats, FetchError> {
        let url = self.statistics_url(ticker)?;

        self.wait_for_rate_limit().await;

        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|source| FetchError::Request {
                ticker: ticker.clone(),
                source,
            })?;

        // Unknown tickers are redirected to a lookup page.
        if response.url().path().trim_end_matches('/') != url.path().trim_end_matches('/') {
            warn!("No page exists for ticker {}", ticker);
            debug!("Requested {} but landed on {}", url, response.url());
            return Err(FetchError::NotFound {
                ticker: ticker.clone(),
            });
        }

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(FetchError::NotFound {
                ticker: ticker.clone(),
            });
        }
        if !status.is_success() {
            return Err(FetchError::Status {
                ticker: ticker.clone(),
                status,
            });
        }

        let body = response.text().await.map_err(|source| FetchError::Request {
            ticker: ticker.clone(),
            source,
        })?;
        debug!("Page exists for ticker {}", ticker);

        parse_statistics_page(ticker, &body)
    }
}

/// Extract every two-cell statistics row from a key-statistics page.
pub fn parse_statistics_page(ticker: &Ticker, html: &str) -> std::result::Result<Stats, FetchError> {
    let document = Html::parse_document(html);
    let rows: Vec<ElementRef> = document.select(&ROW_SELECTOR).collect();
    info!("Found {} rows for ticker {}", rows.len(), ticker);

    let parsed: Vec<(String, StatValue)> = rows.into_iter().filter_map(parse_row).collect();
    if parsed.is_empty() {
        return Err(FetchError::NoStatistics {
            ticker: ticker.clone(),
        });
    }

    Ok(Stats::from_rows(parsed))
}

fn parse_row(row: ElementRef) -> Option<(String, StatValue)> {
    let cells: Vec<ElementRef> = row.select(&CELL_SELECTOR).collect();
    if cells.len() != 2 {
        warn!("Row does not contain exactly two cells");
        debug!("Row HTML: {}", row.html());
        return None;
    }

    let label = util::normalize_text(&cell_text(cells[0]));
    let value = util::parse_value(&cell_text(cells[1]));
    if label.is_empty() || matches!(&value, StatValue::Text(t) if t.is_empty()) {
        return None;
    }

    debug!("Scraped row {}: {:?}", label, value);
    Some((label, value))
}

/// Cell text with footnote markers (`<sup>`) removed
fn cell_text(cell: ElementRef) -> String {
    let mut out = String::new();
    collect_text(cell, &mut out);
    out
}

fn collect_text(element: ElementRef, out: &mut String) {
    for child in element.children() {
        match child.value() {
            Node::Text(text) => out.push_str(text),
            Node::Element(e) if e.name() == "sup" => {}
            Node::Element(_) => {
                if let Some(child_element) = ElementRef::wrap(child) {
                    collect_text(child_element, out);
                }
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use mockito::Matcher;

    const PAGE: &str = r#"
        <html><body>
        <table><tbody>
          <tr><td>Market Cap (intraday)</td><td>2.95T</td></tr>
          <tr><td><span>Trailing P/E</span></td><td>29.87</td></tr>
          <tr><td>Beta (5Y Monthly)</td><td>1.29</td></tr>
        </tbody></table>
        <table><tbody>
          <tr><td>Ex-Dividend Date <sup>4</sup></td><td>Feb 9, 2024</td></tr>
          <tr><td>% Held by Insiders <sup>1</sup></td><td>0.07%</td></tr>
          <tr><td>Fiscal Year Ends</td><td>Sep 30, 2023</td></tr>
          <tr><td>Last Split Factor <sup>2</sup></td><td>4:1</td></tr>
          <tr><td>Payout Ratio</td><td>N/A</td></tr>
          <tr><td>only one cell</td></tr>
        </tbody></table>
        </body></html>
    "#;

    fn ticker(symbol: &str) -> Ticker {
        Ticker::parse(symbol).unwrap()
    }

    fn config_for(server: &mockito::Server) -> Config {
        Config::new()
            .with_base_url(&server.url())
            .with_request_interval(Duration::from_millis(0))
    }

    #[test]
    fn parses_rows_and_strips_footnotes() {
        let stats = parse_statistics_page(&ticker("AAPL"), PAGE).unwrap();

        assert_eq!(stats.trailing_pe, Some(29.87));
        assert_eq!(stats.beta, Some(1.29));
        assert_eq!(stats.ex_dividend_date, NaiveDate::from_ymd_opt(2024, 2, 9));
        assert_eq!(
            stats.extra.get("pct_held_by_insiders"),
            Some(&StatValue::Number(0.07 / 100.0))
        );
        assert_eq!(
            stats.extra.get("fiscal_year_ends"),
            Some(&StatValue::Date(NaiveDate::from_ymd_opt(2023, 9, 30).unwrap()))
        );
        assert_eq!(
            stats.extra.get("last_split_factor"),
            Some(&StatValue::Text("4:1".into()))
        );
        assert_eq!(stats.market_cap, Some(2.95 * 1e12));
        assert!(!stats.extra.contains_key("payout_ratio"));
    }

    #[test]
    fn page_without_rows_is_no_statistics() {
        let err = parse_statistics_page(&ticker("AAA"), "<html><body></body></html>").unwrap_err();
        assert!(matches!(err, FetchError::NoStatistics { .. }));
        assert_eq!(err.ticker().as_str(), "AAA");
    }

    #[tokio::test]
    async fn fetches_statistics_page() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/quote/AAPL/key-statistics")
            .match_query(Matcher::UrlEncoded("p".into(), "AAPL".into()))
            .with_status(200)
            .with_body(PAGE)
            .create_async()
            .await;

        let fetcher = YahooStatsFetcher::new(&config_for(&server)).unwrap();
        let stats = fetcher.fetch(&ticker("AAPL")).await.unwrap();

        mock.assert_async().await;
        assert_eq!(stats.trailing_pe, Some(29.87));
    }

    #[tokio::test]
    async fn redirect_to_lookup_is_not_found() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/quote/ZZZZ/key-statistics")
            .match_query(Matcher::Any)
            .with_status(302)
            .with_header("location", "/lookup?s=ZZZZ")
            .create_async()
            .await;
        server
            .mock("GET", "/lookup")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body("<html>Symbols similar to ZZZZ</html>")
            .create_async()
            .await;

        let fetcher = YahooStatsFetcher::new(&config_for(&server)).unwrap();
        let err = fetcher.fetch(&ticker("ZZZZ")).await.unwrap_err();
        assert!(matches!(err, FetchError::NotFound { .. }));
    }

    #[tokio::test]
    async fn server_error_is_status_failure() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/quote/AAA/key-statistics")
            .match_query(Matcher::Any)
            .with_status(503)
            .create_async()
            .await;

        let fetcher = YahooStatsFetcher::new(&config_for(&server)).unwrap();
        match fetcher.fetch(&ticker("AAA")).await {
            Err(FetchError::Status { status, .. }) => {
                assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE)
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn rejects_invalid_base_url() {
        let config = Config::new().with_base_url("not a url");
        assert!(matches!(
            YahooStatsFetcher::new(&config),
            Err(CollectorError::Config(_))
        ));
    }
}
