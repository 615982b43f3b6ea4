use std::collections::BTreeSet;
use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::ParamsError;

pub const DEFAULT_WORKER_COUNT: usize = 4;
const DEFAULT_MIN_PRICE: u64 = 1000;
const DEFAULT_MAX_PRICE: u64 = 100_000;
const DEFAULT_POLL_INTERVAL_SECS: f64 = 1.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    Alipay,
    Bank,
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PaymentMethod::Alipay => write!(f, "alipay"),
            PaymentMethod::Bank => write!(f, "bank"),
        }
    }
}

/// Per-run configuration, captured once when grabbing starts.
///
/// The serde form is the UI's order form: camelCase keys, with
/// `orderInterval` accepted for the poll interval. Fields the UI sends that
/// the grabber does not use are ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GrabParams {
    #[serde(default)]
    pub site: String,
    #[serde(default = "default_min_price")]
    pub min_price: u64,
    #[serde(default = "default_max_price")]
    pub max_price: u64,
    #[serde(default)]
    pub payment_methods: BTreeSet<PaymentMethod>,
    #[serde(default = "default_poll_interval", alias = "orderInterval")]
    pub poll_interval_seconds: f64,
    #[serde(default = "default_worker_count", alias = "threadCount")]
    pub worker_count: usize,
}

fn default_min_price() -> u64 {
    DEFAULT_MIN_PRICE
}

fn default_max_price() -> u64 {
    DEFAULT_MAX_PRICE
}

fn default_poll_interval() -> f64 {
    DEFAULT_POLL_INTERVAL_SECS
}

fn default_worker_count() -> usize {
    DEFAULT_WORKER_COUNT
}

impl GrabParams {
    pub fn new(site: impl Into<String>) -> Self {
        Self {
            site: site.into(),
            min_price: DEFAULT_MIN_PRICE,
            max_price: DEFAULT_MAX_PRICE,
            payment_methods: BTreeSet::new(),
            poll_interval_seconds: DEFAULT_POLL_INTERVAL_SECS,
            worker_count: DEFAULT_WORKER_COUNT,
        }
    }

    pub fn with_price_range(mut self, min_price: u64, max_price: u64) -> Self {
        self.min_price = min_price;
        self.max_price = max_price;
        self
    }

    pub fn with_payment_methods(
        mut self,
        methods: impl IntoIterator<Item = PaymentMethod>,
    ) -> Self {
        self.payment_methods = methods.into_iter().collect();
        self
    }

    pub fn with_poll_interval(mut self, seconds: f64) -> Self {
        self.poll_interval_seconds = seconds;
        self
    }

    pub fn with_worker_count(mut self, count: usize) -> Self {
        self.worker_count = count;
        self
    }

    /// Decode the UI's order form.
    pub fn from_json(value: &serde_json::Value) -> Result<Self, ParamsError> {
        Self::deserialize(value).map_err(|err| ParamsError::Malformed(err.to_string()))
    }

    pub fn validate(&self) -> Result<(), ParamsError> {
        if self.site.trim().is_empty() {
            return Err(ParamsError::MissingSite);
        }
        if self.worker_count == 0 {
            return Err(ParamsError::NoWorkers);
        }
        if self.poll_interval_seconds <= 0.0
            || Duration::try_from_secs_f64(self.poll_interval_seconds).is_err()
        {
            return Err(ParamsError::BadInterval(self.poll_interval_seconds));
        }
        if self.min_price > self.max_price {
            return Err(ParamsError::InvertedPriceRange {
                min: self.min_price,
                max: self.max_price,
            });
        }
        Ok(())
    }

    /// Base URL with any trailing slash removed, ready for path joining.
    pub fn site_base(&self) -> &str {
        self.site.trim().trim_end_matches('/')
    }

    /// Falls back to the default interval for values `validate` rejects.
    pub fn poll_interval(&self) -> Duration {
        Duration::try_from_secs_f64(self.poll_interval_seconds)
            .ok()
            .filter(|interval| !interval.is_zero())
            .unwrap_or(Duration::from_secs_f64(DEFAULT_POLL_INTERVAL_SECS))
    }

    pub fn accepts(&self, method: PaymentMethod) -> bool {
        self.payment_methods.contains(&method)
    }
}
