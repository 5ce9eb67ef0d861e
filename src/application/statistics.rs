// Statistics engine - Descriptive statistics and guarded ratios
use rust_decimal::{Decimal, MathematicalOps};

/// Relative change of `current` against `previous`.
///
/// `None` whenever `previous` is missing, zero or negative: "no baseline" and
/// "zero baseline" are reported the same way.
pub fn increment_rate(current: Option<Decimal>, previous: Option<Decimal>) -> Option<Decimal> {
    let previous = previous.filter(|previous| *previous > Decimal::ZERO)?;
    current?.checked_sub(previous)?.checked_div(previous)
}

/// `value / area`, or `None` when the area is missing or not positive.
pub fn per_unit_area(value: Option<Decimal>, area: Option<Decimal>) -> Option<Decimal> {
    let area = area.filter(|area| *area > Decimal::ZERO)?;
    value?.checked_div(area)
}

/// Sum that yields `None` instead of overflowing.
fn checked_sum<'a>(values: impl IntoIterator<Item = &'a Decimal>) -> Option<Decimal> {
    values
        .into_iter()
        .try_fold(Decimal::ZERO, |sum, value| sum.checked_add(*value))
}

pub fn mean(values: &[Decimal]) -> Option<Decimal> {
    if values.is_empty() {
        return None;
    }
    checked_sum(values)?.checked_div(Decimal::from(values.len()))
}

pub fn median(values: &[Decimal]) -> Option<Decimal> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_unstable();
    let middle = sorted.len() / 2;
    if sorted.len() % 2 == 1 {
        Some(sorted[middle])
    } else {
        sorted[middle - 1]
            .checked_add(sorted[middle])?
            .checked_div(Decimal::TWO)
    }
}

/// Variance with Bessel's correction (n - 1); needs at least two values.
/// `None` when an intermediate result leaves the `Decimal` range.
pub fn sample_variance(values: &[Decimal]) -> Option<Decimal> {
    if values.len() < 2 {
        return None;
    }
    let mean = mean(values)?;
    let squared_deviations = values
        .iter()
        .map(|value| {
            let deviation = value.checked_sub(mean)?;
            deviation.checked_mul(deviation)
        })
        .try_fold(Decimal::ZERO, |sum, squared| sum.checked_add(squared?))?;
    squared_deviations.checked_div(Decimal::from(values.len() - 1))
}

pub fn sample_stdev(values: &[Decimal]) -> Option<Decimal> {
    sample_variance(values)?.sqrt()
}

/// Summary of one category's bucket values within one window.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DescriptiveStatistics {
    pub mean: Option<Decimal>,
    pub median: Option<Decimal>,
    pub minimum: Option<Decimal>,
    pub maximum: Option<Decimal>,
    pub stdev: Option<Decimal>,
    pub variance: Option<Decimal>,
}

impl DescriptiveStatistics {
    /// Empty buckets (`None`) carry no data and are left out.
    pub fn from_buckets(values: &[Option<Decimal>]) -> Self {
        let values: Vec<Decimal> = values.iter().flatten().copied().collect();
        Self {
            mean: mean(&values),
            median: median(&values),
            minimum: values.iter().min().copied(),
            maximum: values.iter().max().copied(),
            stdev: sample_stdev(&values),
            variance: sample_variance(&values),
        }
    }

    /// Field-wise increment rates of `self` against `base`.
    pub fn increment_rates(&self, base: &Self) -> Self {
        Self {
            mean: increment_rate(self.mean, base.mean),
            median: increment_rate(self.median, base.median),
            minimum: increment_rate(self.minimum, base.minimum),
            maximum: increment_rate(self.maximum, base.maximum),
            stdev: increment_rate(self.stdev, base.stdev),
            variance: increment_rate(self.variance, base.variance),
        }
    }

    pub fn per_unit_area(&self, area: Option<Decimal>) -> Self {
        Self {
            mean: per_unit_area(self.mean, area),
            median: per_unit_area(self.median, area),
            minimum: per_unit_area(self.minimum, area),
            maximum: per_unit_area(self.maximum, area),
            stdev: per_unit_area(self.stdev, area),
            variance: per_unit_area(self.variance, area),
        }
    }
}
