use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://finance.yahoo.com";
pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0 Safari/537.36";

/// Parse a `--timeout` value in whole seconds. Zero is rejected.
pub fn parse_timeout_secs(raw: &str) -> Result<Duration, String> {
    match raw.trim().parse::<u64>() {
        Ok(0) => Err("timeout must be at least 1 second".to_string()),
        Ok(secs) => Ok(Duration::from_secs(secs)),
        Err(e) => Err(format!("invalid timeout {:?}: {}", raw, e)),
    }
}

/// Budget for one whole fetch: two request timeouts, saturating at `Duration::MAX`
pub fn fetch_budget(request_timeout: Duration) -> Duration {
    request_timeout.saturating_mul(2)
}

#[derive(Debug, Clone)]
pub struct Config {
    pub tickers_path: PathBuf,
    pub data_dir: PathBuf,
    pub logs_dir: PathBuf,
    pub base_url: String,
    pub user_agent: String,
    /// HTTP client timeout for a single request
    pub request_timeout: Duration,
    /// Upper bound on one whole fetch, enforced by the runner
    pub fetch_timeout: Duration,
    /// Minimum spacing between two requests to the data source
    pub request_interval: Duration,
    pub collapse_duplicates: bool,
}

impl Config {
    pub fn new() -> Self {
        Self {
            tickers_path: PathBuf::from("tickers.txt"),
            data_dir: PathBuf::from("data"),
            logs_dir: PathBuf::from("logs"),
            base_url: DEFAULT_BASE_URL.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            request_timeout: Duration::from_secs(30),
            fetch_timeout: Duration::from_secs(60),
            request_interval: Duration::from_millis(500),
            collapse_duplicates: true,
        }
    }

    pub fn with_tickers_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.tickers_path = path.into();
        self
    }

    pub fn with_data_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.data_dir = dir.into();
        self
    }

    pub fn with_logs_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.logs_dir = dir.into();
        self
    }

    pub fn with_base_url(mut self, url: &str) -> Self {
        self.base_url = url.trim_end_matches('/').to_string();
        self
    }

    pub fn with_user_agent(mut self, user_agent: &str) -> Self {
        self.user_agent = user_agent.to_string();
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn with_fetch_timeout(mut self, timeout: Duration) -> Self {
        self.fetch_timeout = timeout;
        self
    }

    pub fn with_request_interval(mut self, interval: Duration) -> Self {
        self.request_interval = interval;
        self
    }

    pub fn with_collapse_duplicates(mut self, collapse: bool) -> Self {
        self.collapse_duplicates = collapse;
        self
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}
