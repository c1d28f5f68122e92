use keystats_collector::config::{self, Config};
use keystats_collector::fetchers::base::StatsFetcher;
use keystats_collector::fetchers::yahoo::YahooStatsFetcher;
use keystats_collector::logging;
use keystats_collector::services::collection_runner::CollectionRunner;

use chrono::NaiveDate;
use clap::{App, Arg};
use log::{error, info};
use std::error::Error;
use std::sync::Arc;
use std::time::Duration;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let today = chrono::Local::now().format("%Y-%m-%d").to_string();

    let matches = App::new("keystats_collector")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Collect daily key statistics for a watchlist of tickers")
        .arg(
            Arg::with_name("tickers")
                .short('t')
                .long("tickers")
                .value_name("PATH")
                .help("Ticker list, one symbol per line")
                .takes_value(true)
                .default_value("tickers.txt"),
        )
        .arg(
            Arg::with_name("data-dir")
                .short('o')
                .long("data-dir")
                .value_name("DIR")
                .help("Directory for the daily JSON files")
                .takes_value(true)
                .default_value("data"),
        )
        .arg(
            Arg::with_name("logs-dir")
                .long("logs-dir")
                .value_name("DIR")
                .help("Directory for the daily log files")
                .takes_value(true)
                .default_value("logs"),
        )
        .arg(
            Arg::with_name("date")
                .short('d')
                .long("date")
                .value_name("DATE")
                .help("Collection date (YYYY-MM-DD)")
                .takes_value(true)
                .default_value(&today),
        )
        .arg(
            Arg::with_name("timeout")
                .long("timeout")
                .value_name("SECS")
                .help("HTTP request timeout in seconds")
                .takes_value(true)
                .validator(config::parse_timeout_secs)
                .default_value("30"),
        )
        .arg(
            Arg::with_name("interval")
                .long("interval")
                .value_name("MILLIS")
                .help("Minimum delay between requests in milliseconds")
                .takes_value(true)
                .default_value("500"),
        )
        .arg(
            Arg::with_name("keep-duplicates")
                .long("keep-duplicates")
                .help("Do not collapse repeated tickers in the watchlist")
                .takes_value(false),
        )
        .get_matches();

    let date_str = matches.value_of("date").unwrap_or(&today);
    let date = NaiveDate::parse_from_str(date_str, "%Y-%m-%d")?;
    let request_timeout = config::parse_timeout_secs(matches.value_of("timeout").unwrap_or("30"))?;
    let interval_ms = matches.value_of("interval").unwrap_or("500").parse::<u64>()?;

    let config = Config::new()
        .with_tickers_path(matches.value_of("tickers").unwrap_or("tickers.txt"))
        .with_data_dir(matches.value_of("data-dir").unwrap_or("data"))
        .with_logs_dir(matches.value_of("logs-dir").unwrap_or("logs"))
        .with_request_timeout(request_timeout)
        .with_fetch_timeout(config::fetch_budget(request_timeout))
        .with_request_interval(Duration::from_millis(interval_ms))
        .with_collapse_duplicates(!matches.is_present("keep-duplicates"));

    let log_path = logging::init(&config.logs_dir, &date)?;
    info!("Logging to {}", log_path.display());

    let fetcher: Arc<dyn StatsFetcher + Send + Sync> = Arc::new(YahooStatsFetcher::new(&config)?);
    let runner = CollectionRunner::new(config, fetcher);

    match runner.run(&date).await {
        Ok(summary) => {
            info!(
                "Done: {} fetched, {} skipped, {} failed",
                summary.fetched.len(),
                summary.skipped.len(),
                summary.failed.len()
            );
            Ok(())
        }
        Err(e) => {
            error!("Run aborted: {}", e);
            Err(e.into())
        }
    }
}
