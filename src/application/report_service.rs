// Report service - Use case for building space statistics reports
use crate::application::aggregator::PeriodAggregator;
use crate::application::energy_repository::EnergyRepository;
use crate::application::errors::ReportError;
use crate::application::report_renderer::{RenderContext, ReportRenderer};
use crate::application::report_request::ReportRequest;
use crate::application::statistics::{increment_rate, per_unit_area, DescriptiveStatistics};
use crate::domain::energy::{CategorySeries, EnergyCategory, Space};
use crate::domain::period::{PeriodType, TimeWindow};
use crate::domain::report::{BasePeriod, Parameters, ReportDocument, ReportingPeriod, SpaceSummary};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use chrono::FixedOffset;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

const TARIFF_TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Base and reporting series of one category, owned by a single build.
#[derive(Debug, Default)]
struct CategoryAccumulator {
    base: CategorySeries,
    reporting: CategorySeries,
}

#[derive(Clone)]
pub struct ReportService {
    repository: Arc<dyn EnergyRepository>,
    renderer: Arc<dyn ReportRenderer>,
    utc_offset: FixedOffset,
}

impl ReportService {
    pub fn new(
        repository: Arc<dyn EnergyRepository>,
        renderer: Arc<dyn ReportRenderer>,
        utc_offset: FixedOffset,
    ) -> Self {
        Self {
            repository,
            renderer,
            utc_offset,
        }
    }

    pub fn utc_offset(&self) -> FixedOffset {
        self.utc_offset
    }

    /// Build the report document and, when requested, attach the rendered CSV.
    pub async fn build(&self, request: &ReportRequest) -> Result<ReportDocument, ReportError> {
        let mut document = self.build_document(request).await?;
        if request.include_spreadsheet {
            let artifact = self.render(&document, request)?;
            document.excel_bytes_base64 = Some(STANDARD.encode(artifact));
        }
        Ok(document)
    }

    pub async fn build_document(
        &self,
        request: &ReportRequest,
    ) -> Result<ReportDocument, ReportError> {
        tracing::info!(
            space_id = request.space_id,
            period_type = %request.period_type,
            "Building space statistics report"
        );

        let space = self
            .repository
            .find_space(request.space_id)
            .await
            .map_err(ReportError::DataSource)?
            .ok_or(ReportError::not_found("API.SPACE_NOT_FOUND"))?;

        let categories = self.load_categories(&space, request).await?;
        let space_summary = SpaceSummary {
            name: space.name.clone(),
            area: space.area,
        };
        if categories.is_empty() {
            tracing::info!(space_id = space.id, "No energy category data in either window");
            return Ok(ReportDocument::empty(space_summary));
        }

        let aggregator = PeriodAggregator::new(request.period_type, self.utc_offset);
        let mut accumulators: BTreeMap<u64, CategoryAccumulator> = BTreeMap::new();
        for category in categories.values() {
            let base = match &request.base_window {
                Some(window) => self.aggregate(&aggregator, &space, category, window).await?,
                None => CategorySeries::default(),
            };
            let reporting = self
                .aggregate(&aggregator, &space, category, &request.reporting_window)
                .await?;
            accumulators.insert(category.id, CategoryAccumulator { base, reporting });
        }

        let parameters = self
            .load_tariffs(&space, &categories, &request.reporting_window)
            .await?;

        let document = assemble(
            space_summary,
            &categories,
            &accumulators,
            parameters,
            request.period_type,
            self.utc_offset,
        );
        tracing::info!(
            space_id = space.id,
            categories = document.reporting_period.names.len(),
            "Built space statistics report"
        );
        Ok(document)
    }

    pub fn render(
        &self,
        document: &ReportDocument,
        request: &ReportRequest,
    ) -> Result<Vec<u8>, ReportError> {
        let context = RenderContext {
            name: document.space.name.clone(),
            reporting_start_local: request.reporting_begins_display(),
            reporting_end_local: request.reporting_ends_display(),
            period_type: request.period_type.to_string(),
        };
        self.renderer
            .render(document, &context)
            .map_err(ReportError::Render)
    }

    /// Reference records of the categories with data in either window, keyed by id.
    async fn load_categories(
        &self,
        space: &Space,
        request: &ReportRequest,
    ) -> Result<BTreeMap<u64, EnergyCategory>, ReportError> {
        let mut category_ids = BTreeSet::new();
        for window in request.base_window.iter().chain([&request.reporting_window]) {
            let ids = self
                .repository
                .category_ids_with_data(space.id, window)
                .await
                .map_err(ReportError::DataSource)?;
            category_ids.extend(ids);
        }

        let reference = self
            .repository
            .energy_categories()
            .await
            .map_err(ReportError::DataSource)?;
        if reference.is_empty() {
            return Err(ReportError::not_found("API.ENERGY_CATEGORY_NOT_FOUND"));
        }

        let categories: BTreeMap<u64, EnergyCategory> = reference
            .into_iter()
            .filter(|category| category_ids.contains(&category.id))
            .map(|category| (category.id, category))
            .collect();
        for id in category_ids.iter().filter(|id| !categories.contains_key(id)) {
            tracing::warn!(category_id = id, "Energy category has data but no reference record");
        }
        tracing::debug!(
            space_id = space.id,
            categories = categories.len(),
            "Loaded energy categories"
        );
        Ok(categories)
    }

    async fn aggregate(
        &self,
        aggregator: &PeriodAggregator,
        space: &Space,
        category: &EnergyCategory,
        window: &TimeWindow,
    ) -> Result<CategorySeries, ReportError> {
        let samples = self
            .repository
            .hourly_samples(space.id, category.id, window)
            .await
            .map_err(ReportError::DataSource)?;
        tracing::debug!(
            category_id = category.id,
            samples = samples.len(),
            "Fetched hourly samples"
        );
        let buckets = aggregator.aggregate(&samples, window.start);
        Ok(CategorySeries::from_buckets(buckets, category))
    }

    async fn load_tariffs(
        &self,
        space: &Space,
        categories: &BTreeMap<u64, EnergyCategory>,
        window: &TimeWindow,
    ) -> Result<Parameters, ReportError> {
        let mut parameters = Parameters::default();
        for category in categories.values() {
            let tariffs = match space.cost_center_id {
                Some(cost_center_id) => self
                    .repository
                    .tariffs(cost_center_id, category.id, window)
                    .await
                    .map_err(ReportError::DataSource)?,
                None => Vec::new(),
            };
            let (timestamps, values): (Vec<_>, Vec<_>) = tariffs
                .into_iter()
                .map(|(timestamp, price)| {
                    let local = timestamp.with_timezone(&self.utc_offset);
                    (local.format(TARIFF_TIMESTAMP_FORMAT).to_string(), price)
                })
                .unzip();
            parameters.names.push(format!("TARIFF-{}", category.name));
            parameters.timestamps.push(timestamps);
            parameters.values.push(values);
        }
        Ok(parameters)
    }
}

/// Lay the per-category results out as index-aligned arrays.
fn assemble(
    space: SpaceSummary,
    categories: &BTreeMap<u64, EnergyCategory>,
    accumulators: &BTreeMap<u64, CategoryAccumulator>,
    parameters: Parameters,
    period_type: PeriodType,
    utc_offset: FixedOffset,
) -> ReportDocument {
    let area = space.area;
    let timestamps = |series: &CategorySeries| -> Vec<String> {
        series
            .buckets
            .iter()
            .map(|bucket| period_type.format_local(bucket.period_start, utc_offset))
            .collect()
    };

    let mut base_period = BasePeriod::default();
    let mut reporting_period = ReportingPeriod::default();

    for (category, accumulator) in categories.values().zip(accumulators.values()) {
        let base = &accumulator.base;
        let reporting = &accumulator.reporting;
        let base_statistics = DescriptiveStatistics::from_buckets(&base.values());
        let reporting_statistics = DescriptiveStatistics::from_buckets(&reporting.values());

        base_period.names.push(category.name.clone());
        base_period.units.push(category.unit_of_measure.clone());
        base_period.timestamps.push(timestamps(base));
        base_period.values.push(base.values());
        base_period.subtotals.push(base.subtotal);
        base_period.subtotals_in_kgce.push(base.subtotal_in_kgce);
        base_period.subtotals_in_kgco2e.push(base.subtotal_in_kgco2e);
        base_period.means.push(base_statistics.mean);
        base_period.medians.push(base_statistics.median);
        base_period.minimums.push(base_statistics.minimum);
        base_period.maximums.push(base_statistics.maximum);
        base_period.stdevs.push(base_statistics.stdev);
        base_period.variances.push(base_statistics.variance);
        base_period.total_in_kgce = base_period
            .total_in_kgce
            .saturating_add(base.subtotal_in_kgce);
        base_period.total_in_kgco2e = base_period
            .total_in_kgco2e
            .saturating_add(base.subtotal_in_kgco2e);

        reporting_period.names.push(category.name.clone());
        reporting_period.units.push(category.unit_of_measure.clone());
        reporting_period.timestamps.push(timestamps(reporting));
        reporting_period.values.push(reporting.values());
        reporting_period.subtotals.push(reporting.subtotal);
        reporting_period.subtotals_in_kgce.push(reporting.subtotal_in_kgce);
        reporting_period.subtotals_in_kgco2e.push(reporting.subtotal_in_kgco2e);
        reporting_period
            .subtotals_per_unit_area
            .push(per_unit_area(Some(reporting.subtotal), area));
        reporting_period
            .increment_rates
            .push(increment_rate(Some(reporting.subtotal), Some(base.subtotal)));

        reporting_period.means.push(reporting_statistics.mean);
        reporting_period.medians.push(reporting_statistics.median);
        reporting_period.minimums.push(reporting_statistics.minimum);
        reporting_period.maximums.push(reporting_statistics.maximum);
        reporting_period.stdevs.push(reporting_statistics.stdev);
        reporting_period.variances.push(reporting_statistics.variance);

        let rates = reporting_statistics.increment_rates(&base_statistics);
        reporting_period.means_increment_rate.push(rates.mean);
        reporting_period.medians_increment_rate.push(rates.median);
        reporting_period.minimums_increment_rate.push(rates.minimum);
        reporting_period.maximums_increment_rate.push(rates.maximum);
        reporting_period.stdevs_increment_rate.push(rates.stdev);
        reporting_period.variances_increment_rate.push(rates.variance);

        let per_area = reporting_statistics.per_unit_area(area);
        reporting_period.means_per_unit_area.push(per_area.mean);
        reporting_period.medians_per_unit_area.push(per_area.median);
        reporting_period.minimums_per_unit_area.push(per_area.minimum);
        reporting_period.maximums_per_unit_area.push(per_area.maximum);
        reporting_period.stdevs_per_unit_area.push(per_area.stdev);
        reporting_period.variances_per_unit_area.push(per_area.variance);

        reporting_period.total_in_kgce = reporting_period
            .total_in_kgce
            .saturating_add(reporting.subtotal_in_kgce);
        reporting_period.total_in_kgco2e = reporting_period
            .total_in_kgco2e
            .saturating_add(reporting.subtotal_in_kgco2e);
    }

    let total_in_kgce = Some(reporting_period.total_in_kgce);
    let total_in_kgco2e = Some(reporting_period.total_in_kgco2e);
    reporting_period.total_in_kgce_per_unit_area = per_unit_area(total_in_kgce, area);
    reporting_period.total_in_kgco2e_per_unit_area = per_unit_area(total_in_kgco2e, area);
    reporting_period.increment_rate_in_kgce =
        increment_rate(total_in_kgce, Some(base_period.total_in_kgce));
    reporting_period.increment_rate_in_kgco2e =
        increment_rate(total_in_kgco2e, Some(base_period.total_in_kgco2e));

    ReportDocument {
        space,
        base_period,
        reporting_period,
        parameters,
        excel_bytes_base64: None,
    }
}
