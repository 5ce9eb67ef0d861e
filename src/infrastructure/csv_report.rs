// CSV renderer for space statistics reports
//
// The artifact is UTF-8 CSV, one table after another, and is what the report
// document carries base64 encoded in `excel_bytes_base64`.
use crate::application::report_renderer::{RenderContext, ReportRenderer};
use crate::domain::report::{ReportDocument, ReportingPeriod};
use anyhow::Context;
use rust_decimal::Decimal;

const STATISTICS_HEADER: [&str; 7] = [
    "Reporting Period",
    "Mean",
    "Median",
    "Minimum",
    "Maximum",
    "Stdev",
    "Variance",
];

#[derive(Debug, Clone, Copy, Default)]
pub struct CsvReportRenderer;

impl CsvReportRenderer {
    pub fn new() -> Self {
        Self
    }
}

type Sheet = csv::Writer<Vec<u8>>;

fn two_places(value: Option<Decimal>) -> String {
    value
        .map(|value| format!("{:.2}", value.round_dp(2)))
        .unwrap_or_default()
}

fn whole(value: Option<Decimal>) -> String {
    value
        .map(|value| format!("{:.0}", value.round_dp(0)))
        .unwrap_or_default()
}

/// Missing rates print as `0.00%`; a rate too large to scale to percent is left blank.
fn percent(rate: Option<Decimal>) -> String {
    rate.unwrap_or_default()
        .checked_mul(Decimal::ONE_HUNDRED)
        .map(|rate| format!("{:.2}%", rate.round_dp(2)))
        .unwrap_or_default()
}

fn blank_row(sheet: &mut Sheet) -> csv::Result<()> {
    sheet.write_record([""])
}

fn write_title(sheet: &mut Sheet, context: &RenderContext) -> csv::Result<()> {
    sheet.write_record([
        "Name:",
        context.name.as_str(),
        "Period:",
        context.period_type.as_str(),
        "Date:",
        format!("{}__{}", context.reporting_start_local, context.reporting_end_local).as_str(),
    ])
}

fn write_statistics(sheet: &mut Sheet, name: &str, period: &ReportingPeriod) -> csv::Result<()> {
    sheet.write_record([format!("{name} Statistics")])?;
    sheet.write_record(STATISTICS_HEADER)?;
    for (i, category) in period.names.iter().enumerate() {
        let unit = &period.units[i];
        sheet.write_record([
            format!("{category} ({unit})"),
            two_places(period.means[i]),
            two_places(period.medians[i]),
            two_places(period.minimums[i]),
            two_places(period.maximums[i]),
            two_places(period.stdevs[i]),
            two_places(period.variances[i]),
        ])?;
        sheet.write_record([
            "Increment Rate".to_string(),
            percent(period.means_increment_rate[i]),
            percent(period.medians_increment_rate[i]),
            percent(period.minimums_increment_rate[i]),
            percent(period.maximums_increment_rate[i]),
            percent(period.stdevs_increment_rate[i]),
            percent(period.variances_increment_rate[i]),
        ])?;
    }
    Ok(())
}

fn write_per_unit_area(
    sheet: &mut Sheet,
    name: &str,
    area: Option<Decimal>,
    period: &ReportingPeriod,
) -> csv::Result<()> {
    sheet.write_record([format!("{name} Per Unit Area"), format!("{}M²", two_places(area))])?;
    sheet.write_record(STATISTICS_HEADER)?;
    for (i, category) in period.names.iter().enumerate() {
        let unit = &period.units[i];
        sheet.write_record([
            format!("{category} ({unit}/M²)"),
            two_places(period.means_per_unit_area[i]),
            two_places(period.medians_per_unit_area[i]),
            two_places(period.minimums_per_unit_area[i]),
            two_places(period.maximums_per_unit_area[i]),
            two_places(period.stdevs_per_unit_area[i]),
            two_places(period.variances_per_unit_area[i]),
        ])?;
    }
    Ok(())
}

/// One row per bucket, one column per category, closed by a subtotal row.
///
/// Every category's buckets share the window start, so the longest timestamp
/// list labels the rows and shorter categories leave trailing cells blank.
fn write_details(sheet: &mut Sheet, name: &str, period: &ReportingPeriod) -> csv::Result<()> {
    sheet.write_record([format!("{name} Detailed Data")])?;

    let mut header = vec!["Datetime".to_string()];
    header.extend(
        period
            .names
            .iter()
            .zip(&period.units)
            .map(|(category, unit)| format!("{category} ({unit})")),
    );
    sheet.write_record(&header)?;

    let Some(timestamps) = period.timestamps.iter().max_by_key(|timestamps| timestamps.len()) else {
        return Ok(());
    };
    if timestamps.is_empty() {
        return Ok(());
    }

    for (j, timestamp) in timestamps.iter().enumerate() {
        let mut row = vec![timestamp.clone()];
        row.extend(
            period
                .values
                .iter()
                .map(|values| whole(values.get(j).copied().flatten())),
        );
        sheet.write_record(&row)?;
    }

    let mut subtotals = vec!["Subtotal".to_string()];
    subtotals.extend(period.subtotals.iter().map(|subtotal| whole(Some(*subtotal))));
    sheet.write_record(&subtotals)
}

impl ReportRenderer for CsvReportRenderer {
    fn render(
        &self,
        document: &ReportDocument,
        context: &RenderContext,
    ) -> anyhow::Result<Vec<u8>> {
        let mut sheet = csv::WriterBuilder::new()
            .flexible(true)
            .from_writer(Vec::new());

        write_title(&mut sheet, context).context("Failed to write title block")?;

        if document.has_category_data() {
            let period = &document.reporting_period;
            blank_row(&mut sheet)?;
            write_statistics(&mut sheet, &context.name, period)
                .context("Failed to write statistics table")?;
            blank_row(&mut sheet)?;
            write_per_unit_area(&mut sheet, &context.name, document.space.area, period)
                .context("Failed to write per unit area table")?;
            blank_row(&mut sheet)?;
            write_details(&mut sheet, &context.name, period)
                .context("Failed to write detail table")?;
        } else {
            tracing::debug!(name = %context.name, "Rendering header-only report");
        }

        sheet
            .into_inner()
            .map_err(|e| anyhow::anyhow!("Failed to flush report: {}", e.error()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::statistics::DescriptiveStatistics;
    use crate::domain::report::SpaceSummary;

    fn context() -> RenderContext {
        RenderContext {
            name: "Building A".to_string(),
            reporting_start_local: "2021-01-01T00:00:00".to_string(),
            reporting_end_local: "2021-01-03T00:00:00".to_string(),
            period_type: "daily".to_string(),
        }
    }

    fn render(document: &ReportDocument) -> Vec<String> {
        let bytes = CsvReportRenderer::new().render(document, &context()).unwrap();
        String::from_utf8(bytes)
            .unwrap()
            .lines()
            .map(str::to_string)
            .collect()
    }

    fn document() -> ReportDocument {
        let some = |n: i64, scale: u32| Some(Decimal::new(n, scale));
        let mut document = ReportDocument::empty(SpaceSummary {
            name: "Building A".to_string(),
            area: Some(Decimal::from(100)),
        });
        let period = &mut document.reporting_period;
        period.names = vec!["Electricity".to_string(), "Water".to_string()];
        period.units = vec!["kWh".to_string(), "m3".to_string()];
        period.timestamps = vec![
            vec!["2021-01-01".to_string(), "2021-01-02".to_string()],
            vec!["2021-01-01".to_string()],
        ];
        period.values = vec![vec![some(2449, 2), some(235, 1)], vec![some(5, 0)]];
        period.subtotals = vec![Decimal::new(4799, 2), Decimal::from(5)];
        period.means = vec![some(2399, 2), some(5, 0)];
        period.medians = vec![some(2399, 2), some(5, 0)];
        period.minimums = vec![some(235, 1), some(5, 0)];
        period.maximums = vec![some(2449, 2), some(5, 0)];
        period.stdevs = vec![some(7071, 4), None];
        period.variances = vec![some(5, 1), None];
        period.means_increment_rate = vec![some(5, 1), None];
        period.medians_increment_rate = vec![some(-125, 3), None];
        period.minimums_increment_rate = vec![None, None];
        period.maximums_increment_rate = vec![None, None];
        period.stdevs_increment_rate = vec![None, None];
        period.variances_increment_rate = vec![None, None];
        period.means_per_unit_area = vec![some(2399, 4), some(5, 2)];
        period.medians_per_unit_area = vec![some(2399, 4), some(5, 2)];
        period.minimums_per_unit_area = vec![some(235, 3), some(5, 2)];
        period.maximums_per_unit_area = vec![some(2449, 4), some(5, 2)];
        period.stdevs_per_unit_area = vec![some(7071, 6), None];
        period.variances_per_unit_area = vec![some(6, 3), None];
        document
    }

    #[test]
    fn test_empty_document_renders_title_only() {
        let document = ReportDocument::empty(SpaceSummary {
            name: "Building A".to_string(),
            area: None,
        });

        let lines = render(&document);

        assert_eq!(
            lines,
            vec!["Name:,Building A,Period:,daily,Date:,2021-01-01T00:00:00__2021-01-03T00:00:00"]
        );
    }

    #[test]
    fn test_statistics_table_with_rate_rows() {
        let lines = render(&document());

        assert_eq!(lines[2], "Building A Statistics");
        assert_eq!(lines[3], "Reporting Period,Mean,Median,Minimum,Maximum,Stdev,Variance");
        assert_eq!(lines[4], "Electricity (kWh),23.99,23.99,23.50,24.49,0.71,0.50");
        assert_eq!(lines[5], "Increment Rate,50.00%,-12.50%,0.00%,0.00%,0.00%,0.00%");
        assert_eq!(lines[6], "Water (m3),5.00,5.00,5.00,5.00,,");
        assert_eq!(lines[7], "Increment Rate,0.00%,0.00%,0.00%,0.00%,0.00%,0.00%");
    }

    #[test]
    fn test_per_unit_area_table() {
        let lines = render(&document());

        assert_eq!(lines[9], "Building A Per Unit Area,100.00M²");
        assert_eq!(lines[11], "Electricity (kWh/M²),0.24,0.24,0.24,0.24,0.01,0.01");
        assert_eq!(lines[12], "Water (m3/M²),0.05,0.05,0.05,0.05,,");
    }

    #[test]
    fn test_detail_table_rounds_to_whole_units() {
        let lines = render(&document());

        assert_eq!(lines[14], "Building A Detailed Data");
        assert_eq!(lines[15], "Datetime,Electricity (kWh),Water (m3)");
        assert_eq!(lines[16], "2021-01-01,24,5");
        assert_eq!(lines[17], "2021-01-02,24,");
        assert_eq!(lines[18], "Subtotal,48,5");
        assert_eq!(lines.len(), 19);
    }

    #[test]
    fn test_percent_formatting() {
        assert_eq!(percent(Some(Decimal::new(5, 1))), "50.00%");
        assert_eq!(percent(Some(Decimal::new(12346, 5))), "12.35%");
        assert_eq!(percent(None), "0.00%");
    }

    #[test]
    fn test_percent_of_huge_rate_is_blank() {
        let base = DescriptiveStatistics::from_buckets(&[
            Some(Decimal::new(10_000_000_001, 10)),
            Some(Decimal::ONE),
        ]);
        let reporting = DescriptiveStatistics::from_buckets(&[
            Some(Decimal::ZERO),
            Some(Decimal::from(10_000)),
        ]);
        let rates = reporting.increment_rates(&base);

        assert!(rates.variance.is_some());
        assert_eq!(percent(rates.variance), "");
        assert_eq!(percent(Some(Decimal::MAX)), "");
    }

    #[test]
    fn test_artifact_reads_back_as_csv() {
        let bytes = CsvReportRenderer::new().render(&document(), &context()).unwrap();

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(bytes.as_slice());
        let records: Vec<csv::StringRecord> = reader.records().map(Result::unwrap).collect();

        assert_eq!(&records[0][1], "Building A");
        assert!(records.iter().any(|record| &record[0] == "Electricity (kWh)"));
        assert_eq!(records.last().map(|record| &record[0]), Some("Subtotal"));
    }
}
