// Repository trait for energy data access
use crate::domain::energy::{EnergyCategory, Space, TimeSeriesSample};
use crate::domain::period::TimeWindow;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::collections::BTreeSet;

#[async_trait]
pub trait EnergyRepository: Send + Sync {
    /// Look up a space by id
    async fn find_space(&self, space_id: u64) -> anyhow::Result<Option<Space>>;

    /// All energy category reference records, ordered by id
    async fn energy_categories(&self) -> anyhow::Result<Vec<EnergyCategory>>;

    /// Ids of the energy categories with at least one hourly input in the window
    async fn category_ids_with_data(
        &self,
        space_id: u64,
        window: &TimeWindow,
    ) -> anyhow::Result<BTreeSet<u64>>;

    /// Hourly input samples of one category, ordered by timestamp
    async fn hourly_samples(
        &self,
        space_id: u64,
        category_id: u64,
        window: &TimeWindow,
    ) -> anyhow::Result<Vec<TimeSeriesSample>>;

    /// Tariff prices of one category for a cost center, ordered by timestamp
    async fn tariffs(
        &self,
        cost_center_id: u64,
        category_id: u64,
        window: &TimeWindow,
    ) -> anyhow::Result<Vec<(DateTime<Utc>, Decimal)>>;
}
