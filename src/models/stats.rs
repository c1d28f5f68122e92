use chrono::NaiveDate;
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::models::ticker::Ticker;

/// One parsed statistics cell
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StatValue {
    Number(f64),
    Date(NaiveDate),
    Text(String),
}

impl StatValue {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            StatValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            StatValue::Date(d) => Some(*d),
            _ => None,
        }
    }
}

/// Key statistics for one company.
///
/// Well-known rows get a typed field (serialized as `null` when the page
/// did not carry them); every other row lands in `extra` under its
/// normalized label.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Stats {
    pub market_cap: Option<f64>,
    pub enterprise_value: Option<f64>,
    pub trailing_pe: Option<f64>,
    pub forward_pe: Option<f64>,
    pub peg_ratio: Option<f64>,
    pub price_to_sales: Option<f64>,
    pub price_to_book: Option<f64>,
    pub beta: Option<f64>,
    pub fifty_two_week_high: Option<f64>,
    pub fifty_two_week_low: Option<f64>,
    pub shares_outstanding: Option<f64>,
    pub profit_margin: Option<f64>,
    pub operating_margin: Option<f64>,
    pub return_on_assets: Option<f64>,
    pub return_on_equity: Option<f64>,
    pub revenue: Option<f64>,
    pub diluted_eps: Option<f64>,
    pub total_cash: Option<f64>,
    pub total_debt: Option<f64>,
    pub dividend_date: Option<NaiveDate>,
    pub ex_dividend_date: Option<NaiveDate>,
    pub most_recent_quarter: Option<NaiveDate>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, StatValue>,
}

/// Serialized names of the typed fields; `extra` must never reuse them
const TYPED_FIELDS: [&str; 22] = [
    "market_cap",
    "enterprise_value",
    "trailing_pe",
    "forward_pe",
    "peg_ratio",
    "price_to_sales",
    "price_to_book",
    "beta",
    "fifty_two_week_high",
    "fifty_two_week_low",
    "shares_outstanding",
    "profit_margin",
    "operating_margin",
    "return_on_assets",
    "return_on_equity",
    "revenue",
    "diluted_eps",
    "total_cash",
    "total_debt",
    "dividend_date",
    "ex_dividend_date",
    "most_recent_quarter",
];

impl Stats {
    /// Build stats from `(normalized label, value)` rows in page order.
    /// A later row with the same label overwrites an earlier one.
    pub fn from_rows<I>(rows: I) -> Self
    where
        I: IntoIterator<Item = (String, StatValue)>,
    {
        let mut stats = Stats::default();
        for (label, value) in rows {
            stats.insert(label, value);
        }
        stats
    }

    /// Number of populated fields, typed and extra
    pub fn len(&self) -> usize {
        let typed = [
            self.market_cap,
            self.enterprise_value,
            self.trailing_pe,
            self.forward_pe,
            self.peg_ratio,
            self.price_to_sales,
            self.price_to_book,
            self.beta,
            self.fifty_two_week_high,
            self.fifty_two_week_low,
            self.shares_outstanding,
            self.profit_margin,
            self.operating_margin,
            self.return_on_assets,
            self.return_on_equity,
            self.revenue,
            self.diluted_eps,
            self.total_cash,
            self.total_debt,
        ]
        .iter()
        .filter(|v| v.is_some())
        .count();
        let dates = [self.dividend_date, self.ex_dividend_date, self.most_recent_quarter]
            .iter()
            .filter(|v| v.is_some())
            .count();
        typed + dates + self.extra.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn insert(&mut self, label: String, value: StatValue) {
        let slot = match label.as_str() {
            "market_cap" | "market_cap_intraday" => &mut self.market_cap,
            "enterprise_value" => &mut self.enterprise_value,
            "trailing_p/e" => &mut self.trailing_pe,
            "forward_p/e" => &mut self.forward_pe,
            "peg_ratio_5yr_expected" | "peg_ratio_5_yr_expected" => &mut self.peg_ratio,
            "price/sales_ttm" => &mut self.price_to_sales,
            "price/book_mrq" => &mut self.price_to_book,
            "beta_5y_monthly" | "beta" => &mut self.beta,
            "52_week_high" => &mut self.fifty_two_week_high,
            "52_week_low" => &mut self.fifty_two_week_low,
            "shares_outstanding" => &mut self.shares_outstanding,
            "profit_margin" => &mut self.profit_margin,
            "operating_margin_ttm" => &mut self.operating_margin,
            "return_on_assets_ttm" => &mut self.return_on_assets,
            "return_on_equity_ttm" => &mut self.return_on_equity,
            "revenue_ttm" => &mut self.revenue,
            "diluted_eps_ttm" => &mut self.diluted_eps,
            "total_cash_mrq" => &mut self.total_cash,
            "total_debt_mrq" => &mut self.total_debt,
            "dividend_date" => return self.set_date(label, value, |s| &mut s.dividend_date),
            "exdividend_date" => return self.set_date(label, value, |s| &mut s.ex_dividend_date),
            "most_recent_quarter_mrq" => {
                return self.set_date(label, value, |s| &mut s.most_recent_quarter)
            }
            _ if TYPED_FIELDS.contains(&label.as_str()) => {
                let renamed = format!("{}_raw", label);
                warn!("Label {} clashes with a typed field, storing it as {}", label, renamed);
                self.extra.insert(renamed, value);
                return;
            }
            _ => {
                self.extra.insert(label, value);
                return;
            }
        };

        match value.as_f64() {
            Some(n) => *slot = Some(n),
            None => debug!("Ignoring non-numeric value {:?} for {}", value, label),
        }
    }

    fn set_date<F>(&mut self, label: String, value: StatValue, slot: F)
    where
        F: FnOnce(&mut Self) -> &mut Option<NaiveDate>,
    {
        match value.as_date() {
            Some(d) => *slot(self) = Some(d),
            None => debug!("Ignoring non-date value {:?} for {}", value, label),
        }
    }
}

/// One persisted line: a ticker's statistics for one collection date
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyRecord {
    pub ticker: Ticker,
    pub date_accessed: NaiveDate,
    #[serde(flatten)]
    pub stats: Stats,
}

impl DailyRecord {
    pub fn new(ticker: Ticker, date_accessed: NaiveDate, stats: Stats) -> Self {
        Self {
            ticker,
            date_accessed,
            stats,
        }
    }
}
