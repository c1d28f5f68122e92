use crate::errors::FetchError;
use crate::models::stats::Stats;
use crate::models::ticker::Ticker;
use async_trait::async_trait;

/// Base trait for per-ticker statistics sources
#[async_trait]
pub trait StatsFetcher {
    /// Short name of the data source, used in logs
    fn source_name(&self) -> &'static str;

    /// Fetch current statistics for one ticker
    async fn fetch(&self, ticker: &Ticker) -> Result<Stats, FetchError>;
}
