// Energy domain models
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

/// One raw hourly reading. `value` is `None` when the source recorded no value.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeSeriesSample {
    pub timestamp: DateTime<Utc>,
    pub value: Option<Decimal>,
}

impl TimeSeriesSample {
    pub fn new(timestamp: DateTime<Utc>, value: Option<Decimal>) -> Self {
        Self { timestamp, value }
    }
}

/// Reference data for one energy category.
#[derive(Debug, Clone, PartialEq)]
pub struct EnergyCategory {
    pub id: u64,
    pub name: String,
    pub unit_of_measure: String,
    /// Kilograms of coal equivalent per unit of measure.
    pub kgce: Decimal,
    /// Kilograms of CO2 equivalent per unit of measure.
    pub kgco2e: Decimal,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Space {
    pub id: u64,
    pub name: String,
    pub area: Option<Decimal>,
    pub cost_center_id: Option<u64>,
}

/// One aggregated period. `value` is `None` when no sample fell into the period.
#[derive(Debug, Clone, PartialEq)]
pub struct PeriodBucket {
    pub period_start: DateTime<Utc>,
    pub value: Option<Decimal>,
}

/// Buckets of one category over one window, with running subtotals.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CategorySeries {
    pub buckets: Vec<PeriodBucket>,
    pub subtotal: Decimal,
    pub subtotal_in_kgce: Decimal,
    pub subtotal_in_kgco2e: Decimal,
}

impl CategorySeries {
    pub fn from_buckets(buckets: Vec<PeriodBucket>, category: &EnergyCategory) -> Self {
        let mut series = Self::default();
        for bucket in buckets {
            series.push(bucket, category);
        }
        series
    }

    /// Subtotals saturate at the `Decimal` bounds.
    pub fn push(&mut self, bucket: PeriodBucket, category: &EnergyCategory) {
        if let Some(value) = bucket.value {
            self.subtotal = self.subtotal.saturating_add(value);
            self.subtotal_in_kgce = self
                .subtotal_in_kgce
                .saturating_add(value.saturating_mul(category.kgce));
            self.subtotal_in_kgco2e = self
                .subtotal_in_kgco2e
                .saturating_add(value.saturating_mul(category.kgco2e));
        }
        self.buckets.push(bucket);
    }

    pub fn values(&self) -> Vec<Option<Decimal>> {
        self.buckets.iter().map(|bucket| bucket.value).collect()
    }
}
