use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Observation frequency of a FRED series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Frequency {
    Quarterly,
    Annual,
}

/// Static metadata for a known FRED series.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct SeriesInfo {
    pub id: &'static str,
    pub name: &'static str,
    pub frequency: Frequency,
    pub start_date: &'static str,
}

/// Federal government current tax receipts: taxes on corporate income (quarterly).
pub const TAX_RECEIPTS_QUARTERLY: &str = "B075RC1Q027SBEA";
/// Corporate profits before tax, without IVA and CCAdj (quarterly).
pub const PROFITS_BEFORE_TAX_QUARTERLY: &str = "A053RC1Q027SBEA";
/// Federal government tax receipts on corporate income (annual).
pub const TAX_RECEIPTS_ANNUAL: &str = "FCTAX";
/// Corporate profits after tax, without IVA and CCAdj (quarterly).
pub const PROFITS_AFTER_TAX_QUARTERLY: &str = "CP";
/// Corporate profits with IVA and CCAdj (quarterly).
pub const PROFITS_WITH_ADJUSTMENTS_QUARTERLY: &str = "CPROFIT";

pub const SERIES_CATALOG: &[SeriesInfo] = &[
    SeriesInfo {
        id: TAX_RECEIPTS_QUARTERLY,
        name: "Federal government current tax receipts: Taxes on corporate income",
        frequency: Frequency::Quarterly,
        start_date: "1947-01-01",
    },
    SeriesInfo {
        id: PROFITS_BEFORE_TAX_QUARTERLY,
        name: "Corporate profits before tax (without IVA and CCAdj)",
        frequency: Frequency::Quarterly,
        start_date: "1947-01-01",
    },
    SeriesInfo {
        id: TAX_RECEIPTS_ANNUAL,
        name: "Federal Government: Tax Receipts on Corporate Income",
        frequency: Frequency::Annual,
        start_date: "1929-01-01",
    },
    SeriesInfo {
        id: PROFITS_AFTER_TAX_QUARTERLY,
        name: "Corporate Profits After Tax (without IVA and CCAdj)",
        frequency: Frequency::Quarterly,
        start_date: "1947-01-01",
    },
    SeriesInfo {
        id: PROFITS_WITH_ADJUSTMENTS_QUARTERLY,
        name: "Corporate Profits with IVA and CCAdj",
        frequency: Frequency::Quarterly,
        start_date: "1947-01-01",
    },
];

pub fn series_info(id: &str) -> Option<&'static SeriesInfo> {
    SERIES_CATALOG.iter().find(|info| info.id == id)
}

/// A date-ordered set of observations for one series id.
///
/// Missing observations (FRED's `"."` markers) are dropped before a `Series`
/// is constructed, so every stored value is a finite number.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Series {
    pub id: String,
    pub observations: BTreeMap<NaiveDate, f64>,
}

impl Series {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            observations: BTreeMap::new(),
        }
    }

    pub fn from_observations(
        id: impl Into<String>,
        observations: impl IntoIterator<Item = (NaiveDate, f64)>,
    ) -> Self {
        Self {
            id: id.into(),
            observations: observations.into_iter().collect(),
        }
    }

    pub fn insert(&mut self, date: NaiveDate, value: f64) {
        self.observations.insert(date, value);
    }

    pub fn len(&self) -> usize {
        self.observations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.observations.keys().next().copied()
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.observations.keys().next_back().copied()
    }

    pub fn get(&self, date: NaiveDate) -> Option<f64> {
        self.observations.get(&date).copied()
    }
}

/// One period of the quarterly effective tax rate table.
///
/// `effective_rate` is `(tax_receipts / profits_before_tax) × 100`; rows with
/// a zero denominator never make it into a table, the transform fails instead.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RatePoint {
    pub period: NaiveDate,
    pub tax_receipts: f64,
    pub profits_before_tax: f64,
    pub effective_rate: f64,
    /// Trailing moving average of the rate, absent until the window fills.
    pub moving_average: Option<f64>,
}

/// One calendar year of the annual table, aggregated from quarterly sums.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnualRatePoint {
    pub year: i32,
    pub tax_receipts: f64,
    pub profits_before_tax: f64,
    pub effective_rate: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct DecadeAverage {
    pub decade: i32,
    pub mean: f64,
}

/// Descriptive statistics over a rate table.
#[derive(Debug, Clone, Serialize)]
pub struct SummaryStats {
    pub count: usize,
    pub mean: f64,
    pub median: f64,
    pub std_dev: f64,
    pub min: f64,
    pub min_period: String,
    pub max: f64,
    pub max_period: String,
    pub decade_averages: Vec<DecadeAverage>,
}

/// Output of the transform phase: both rate tables plus the raw series
/// they were computed from.
#[derive(Debug, Clone)]
pub struct RateReport {
    pub quarterly: Vec<RatePoint>,
    pub annual: Vec<AnnualRatePoint>,
    pub raw_series: Vec<Series>,
    pub quarterly_summary: Option<SummaryStats>,
    pub annual_summary: Option<SummaryStats>,
}
