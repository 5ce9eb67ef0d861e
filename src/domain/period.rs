// Period and time window domain models
use chrono::{DateTime, FixedOffset, Months, TimeDelta, Utc};
use std::fmt;
use std::str::FromStr;

/// Granularity of the buckets a report is aggregated into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PeriodType {
    Hourly,
    Daily,
    Monthly,
    Yearly,
}

#[derive(Debug, thiserror::Error)]
#[error("unknown period type: {0}")]
pub struct UnknownPeriodType(pub String);

impl PeriodType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Hourly => "hourly",
            Self::Daily => "daily",
            Self::Monthly => "monthly",
            Self::Yearly => "yearly",
        }
    }

    /// Start of the `n`th period after `start`.
    ///
    /// Computed from `start` directly: a clamped month end (Jan 31 -> Feb 28)
    /// does not carry over into later periods.
    pub fn nth_period_start(
        &self,
        start: DateTime<FixedOffset>,
        n: u32,
    ) -> Option<DateTime<FixedOffset>> {
        match self {
            Self::Hourly => start.checked_add_signed(TimeDelta::try_hours(i64::from(n))?),
            Self::Daily => start.checked_add_signed(TimeDelta::try_days(i64::from(n))?),
            Self::Monthly => start.checked_add_months(Months::new(n)),
            Self::Yearly => start.checked_add_months(Months::new(n.checked_mul(12)?)),
        }
    }

    /// strftime pattern used to display a bucket start.
    pub fn timestamp_format(&self) -> &'static str {
        match self {
            Self::Hourly => "%Y-%m-%dT%H:%M:%S",
            Self::Daily => "%Y-%m-%d",
            Self::Monthly => "%Y-%m",
            Self::Yearly => "%Y",
        }
    }

    pub fn format_local(&self, instant: DateTime<Utc>, utc_offset: FixedOffset) -> String {
        instant
            .with_timezone(&utc_offset)
            .format(self.timestamp_format())
            .to_string()
    }
}

impl FromStr for PeriodType {
    type Err = UnknownPeriodType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "hourly" => Ok(Self::Hourly),
            "daily" => Ok(Self::Daily),
            "monthly" => Ok(Self::Monthly),
            "yearly" => Ok(Self::Yearly),
            other => Err(UnknownPeriodType(other.to_string())),
        }
    }
}

impl fmt::Display for PeriodType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Half-open UTC interval `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeWindow {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn local(offset: FixedOffset, y: i32, m: u32, d: u32, h: u32) -> DateTime<FixedOffset> {
        offset.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
    }

    #[test]
    fn test_parse_period_type() {
        assert_eq!(" daily ".parse::<PeriodType>().unwrap(), PeriodType::Daily);
        assert_eq!("yearly".parse::<PeriodType>().unwrap(), PeriodType::Yearly);
        assert!("weekly".parse::<PeriodType>().is_err());
        assert!("Daily".parse::<PeriodType>().is_err());
    }

    #[test]
    fn test_monthly_periods_do_not_drift_after_clamping() {
        let offset = FixedOffset::east_opt(0).unwrap();
        let start = local(offset, 2021, 1, 31, 0);

        assert_eq!(
            PeriodType::Monthly.nth_period_start(start, 1).unwrap(),
            local(offset, 2021, 2, 28, 0)
        );
        assert_eq!(
            PeriodType::Monthly.nth_period_start(start, 2).unwrap(),
            local(offset, 2021, 3, 31, 0)
        );
    }

    #[test]
    fn test_yearly_periods_follow_calendar() {
        let offset = FixedOffset::east_opt(8 * 3600).unwrap();
        let start = local(offset, 2020, 2, 29, 0);

        assert_eq!(
            PeriodType::Yearly.nth_period_start(start, 1).unwrap(),
            local(offset, 2021, 2, 28, 0)
        );
        assert_eq!(
            PeriodType::Yearly.nth_period_start(start, 4).unwrap(),
            local(offset, 2024, 2, 29, 0)
        );
    }

    #[test]
    fn test_format_local_per_period_type() {
        let offset = FixedOffset::east_opt(8 * 3600).unwrap();
        // 16:00 UTC is midnight of the next day at +08:00
        let instant = Utc.with_ymd_and_hms(2020, 12, 31, 16, 0, 0).unwrap();

        assert_eq!(PeriodType::Hourly.format_local(instant, offset), "2021-01-01T00:00:00");
        assert_eq!(PeriodType::Daily.format_local(instant, offset), "2021-01-01");
        assert_eq!(PeriodType::Monthly.format_local(instant, offset), "2021-01");
        assert_eq!(PeriodType::Yearly.format_local(instant, offset), "2021");
    }
}
