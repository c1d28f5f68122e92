use crate::config::Config;
use crate::errors::{FetchError, Result};
use crate::fetchers::base::StatsFetcher;
use crate::input::ticker_list;
use crate::models::stats::{DailyRecord, Stats};
use crate::models::ticker::{Ticker, Watchlist};
use crate::storage::daily_store::DailyOutputStore;
use chrono::NaiveDate;
use log::{error, info, warn};
use std::collections::HashSet;
use std::sync::Arc;

/// Watchlist split into what still needs fetching and what does not
#[derive(Debug, Default, PartialEq, Eq)]
pub struct PendingPlan {
    pub pending: Vec<Ticker>,
    /// Already recorded for the date
    pub skipped: Vec<Ticker>,
    /// Repeated watchlist entries collapsed onto their first occurrence
    pub duplicates: Vec<Ticker>,
}

/// Compute the ordered pending tickers for a run.
pub fn pending_tickers(watchlist: &Watchlist, done: &HashSet<Ticker>, collapse_duplicates: bool) -> PendingPlan {
    let mut plan = PendingPlan::default();
    let mut seen = HashSet::new();

    for ticker in watchlist.iter() {
        if !seen.insert(ticker) && collapse_duplicates {
            plan.duplicates.push(ticker.clone());
        } else if done.contains(ticker) {
            plan.skipped.push(ticker.clone());
        } else {
            plan.pending.push(ticker.clone());
        }
    }

    plan
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchFailure {
    pub ticker: Ticker,
    pub reason: String,
}

/// Per-run outcome. Partial success is a normal result, not an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub date: NaiveDate,
    pub fetched: Vec<Ticker>,
    pub skipped: Vec<Ticker>,
    pub duplicates: Vec<Ticker>,
    pub failed: Vec<FetchFailure>,
}

impl RunSummary {
    fn new(date: NaiveDate) -> Self {
        Self {
            date,
            fetched: Vec::new(),
            skipped: Vec::new(),
            duplicates: Vec::new(),
            failed: Vec::new(),
        }
    }

    /// Summary line followed by one line per failure
    pub fn render(&self) -> Vec<String> {
        let mut lines = vec![format!(
            "Run summary for {}: fetched={} skipped={} failed={} duplicates={}",
            self.date,
            self.fetched.len(),
            self.skipped.len(),
            self.failed.len(),
            self.duplicates.len()
        )];
        lines.extend(
            self.failed
                .iter()
                .map(|failure| format!("  failed {}: {}", failure.ticker, failure.reason)),
        );
        lines
    }

    pub fn log(&self) {
        let mut lines = self.render().into_iter();
        if let Some(headline) = lines.next() {
            info!("{}", headline);
        }
        for line in lines {
            warn!("{}", line);
        }
    }
}

/// Idempotent, resumable collection loop
pub struct CollectionRunner {
    config: Config,
    fetcher: Arc<dyn StatsFetcher + Send + Sync>,
    store: DailyOutputStore,
}

impl CollectionRunner {
    pub fn new(config: Config, fetcher: Arc<dyn StatsFetcher + Send + Sync>) -> Self {
        let store = DailyOutputStore::new(&config.data_dir);
        Self { config, fetcher, store }
    }

    pub fn store(&self) -> &DailyOutputStore {
        &self.store
    }

    /// Read the configured watchlist and collect everything not yet recorded for `date`.
    pub async fn run(&self, date: &NaiveDate) -> Result<RunSummary> {
        let watchlist = ticker_list::read_watchlist(&self.config.tickers_path)?;
        self.collect(date, &watchlist).await
    }

    /// Fetch and persist each pending ticker, one at a time.
    ///
    /// Every success is appended before the next fetch starts, so an
    /// interrupted run loses at most the ticker in flight. Fetch failures
    /// are recorded and the loop moves on; a failed append stops the run.
    pub async fn collect(&self, date: &NaiveDate, watchlist: &Watchlist) -> Result<RunSummary> {
        info!(
            "Collecting {} tickers for {} from {}",
            watchlist.len(),
            date,
            self.fetcher.source_name()
        );

        let mut done = self.store.already_recorded(date)?;
        let plan = pending_tickers(watchlist, &done, self.config.collapse_duplicates);

        let mut summary = RunSummary::new(*date);
        for ticker in &plan.skipped {
            info!("skipped {}: already recorded", ticker);
        }
        if !plan.skipped.is_empty() {
            warn!(
                "Skipping {} tickers already scraped at {}",
                plan.skipped.len(),
                self.store.path_for(date).display()
            );
        }
        for ticker in &plan.duplicates {
            info!("skipped {}: duplicate watchlist entry", ticker);
        }
        summary.skipped = plan.skipped;
        summary.duplicates = plan.duplicates;

        for ticker in plan.pending {
            // Uncollapsed duplicates land here once their first occurrence is stored.
            if done.contains(&ticker) {
                info!("skipped {}: already recorded", ticker);
                summary.skipped.push(ticker);
                continue;
            }

            match self.fetch_with_timeout(&ticker).await {
                Ok(stats) => {
                    let record = DailyRecord::new(ticker.clone(), *date, stats);
                    if let Err(e) = self.store.append(date, &record) {
                        error!("Stopping run, cannot persist {}: {}", ticker, e);
                        summary.log();
                        return Err(e);
                    }
                    info!("fetched {} ({} fields)", ticker, record.stats.len());
                    done.insert(ticker.clone());
                    summary.fetched.push(ticker);
                }
                Err(e) => {
                    warn!("failed {}: {}", ticker, e);
                    summary.failed.push(FetchFailure {
                        ticker,
                        reason: e.reason(),
                    });
                }
            }
        }

        summary.log();
        Ok(summary)
    }

    async fn fetch_with_timeout(&self, ticker: &Ticker) -> std::result::Result<Stats, FetchError> {
        let limit = self.config.fetch_timeout;
        match tokio::time::timeout(limit, self.fetcher.fetch(ticker)).await {
            Ok(result) => result,
            Err(_) => Err(FetchError::Timeout {
                ticker: ticker.clone(),
                after: limit,
            }),
        }
    }
}
