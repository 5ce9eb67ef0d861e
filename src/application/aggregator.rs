// Period aggregator - Buckets hourly samples into report periods
use crate::domain::energy::{PeriodBucket, TimeSeriesSample};
use crate::domain::period::PeriodType;
use chrono::{DateTime, FixedOffset, Utc};
use rust_decimal::Decimal;

#[derive(Debug, Clone, Copy)]
pub struct PeriodAggregator {
    period_type: PeriodType,
    utc_offset: FixedOffset,
}

impl PeriodAggregator {
    pub fn new(period_type: PeriodType, utc_offset: FixedOffset) -> Self {
        Self {
            period_type,
            utc_offset,
        }
    }

    /// Sum `samples` into consecutive periods anchored at `window_start`.
    ///
    /// Bucket `k` covers `[start + k periods, start + (k + 1) periods)`, with
    /// calendar arithmetic done in the configured local offset. Buckets run
    /// without gaps up to the one holding the last sample; a bucket no sample
    /// fell into is `None`, while null samples count as zero. Sums saturate
    /// at the `Decimal` bounds. Samples must be ordered by timestamp. No
    /// samples means no buckets.
    pub fn aggregate(
        &self,
        samples: &[TimeSeriesSample],
        window_start: DateTime<Utc>,
    ) -> Vec<PeriodBucket> {
        let Some(last) = samples.last() else {
            return Vec::new();
        };

        let local_start = window_start.with_timezone(&self.utc_offset);
        let mut pending = samples
            .iter()
            .skip_while(|sample| sample.timestamp < window_start)
            .peekable();
        let mut buckets = Vec::new();

        for n in 0u32.. {
            let Some(period_start) = self.period_start(local_start, n) else {
                break;
            };
            if period_start > last.timestamp {
                break;
            }
            let period_end = self.period_start(local_start, n + 1);

            let mut value: Option<Decimal> = None;
            while let Some(sample) = pending
                .next_if(|sample| period_end.is_none_or(|end| sample.timestamp < end))
            {
                let subtotal = value.get_or_insert(Decimal::ZERO);
                if let Some(sample_value) = sample.value {
                    *subtotal = subtotal.saturating_add(sample_value);
                }
            }

            buckets.push(PeriodBucket {
                period_start,
                value,
            });
        }

        buckets
    }

    fn period_start(&self, local_start: DateTime<FixedOffset>, n: u32) -> Option<DateTime<Utc>> {
        self.period_type
            .nth_period_start(local_start, n)
            .map(|start| start.with_timezone(&Utc))
    }
}
