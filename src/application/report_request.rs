// Report request - Validation of raw query parameters
use crate::application::errors::ReportError;
use crate::domain::period::{PeriodType, TimeWindow};
use chrono::{DateTime, FixedOffset, NaiveDateTime, TimeZone, Utc};
use serde::Deserialize;

const LOCAL_DATETIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Raw parameters as they arrive on the query string.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReportParams {
    #[serde(rename = "spaceid")]
    pub space_id: Option<String>,
    #[serde(rename = "periodtype")]
    pub period_type: Option<String>,
    #[serde(rename = "baseperiodbeginsdatetime")]
    pub base_period_begins: Option<String>,
    #[serde(rename = "baseperiodendsdatetime")]
    pub base_period_ends: Option<String>,
    #[serde(rename = "reportingperiodbeginsdatetime")]
    pub reporting_period_begins: Option<String>,
    #[serde(rename = "reportingperiodendsdatetime")]
    pub reporting_period_ends: Option<String>,
    #[serde(default)]
    pub excel: bool,
}

/// Validated report request with windows converted to UTC.
#[derive(Debug, Clone)]
pub struct ReportRequest {
    pub space_id: u64,
    pub period_type: PeriodType,
    /// Absent unless both base boundaries were supplied.
    pub base_window: Option<TimeWindow>,
    pub reporting_window: TimeWindow,
    pub reporting_begins_local: NaiveDateTime,
    pub reporting_ends_local: NaiveDateTime,
    pub include_spreadsheet: bool,
}

impl ReportRequest {
    pub fn parse(params: &ReportParams, utc_offset: FixedOffset) -> Result<Self, ReportError> {
        let space_id = params
            .space_id
            .as_deref()
            .and_then(|id| id.trim().parse::<u64>().ok())
            .filter(|id| *id > 0)
            .ok_or(ReportError::validation("API.INVALID_SPACE_ID"))?;

        let period_type = params
            .period_type
            .as_deref()
            .and_then(|period_type| period_type.parse::<PeriodType>().ok())
            .ok_or(ReportError::validation("API.INVALID_PERIOD_TYPE"))?;

        let base_begins = parse_optional_local(
            params.base_period_begins.as_deref(),
            "API.INVALID_BASE_PERIOD_BEGINS_DATETIME",
        )?;
        let base_ends = parse_optional_local(
            params.base_period_ends.as_deref(),
            "API.INVALID_BASE_PERIOD_ENDS_DATETIME",
        )?;
        let base_window = match (base_begins, base_ends) {
            (Some(begins), Some(ends)) => Some(to_window(
                begins,
                ends,
                utc_offset,
                "API.INVALID_BASE_PERIOD_ENDS_DATETIME",
            )?),
            _ => None,
        };

        let reporting_begins_local = parse_optional_local(
            params.reporting_period_begins.as_deref(),
            "API.INVALID_REPORTING_PERIOD_BEGINS_DATETIME",
        )?
        .ok_or(ReportError::validation("API.INVALID_REPORTING_PERIOD_BEGINS_DATETIME"))?;
        let reporting_ends_local = parse_optional_local(
            params.reporting_period_ends.as_deref(),
            "API.INVALID_REPORTING_PERIOD_ENDS_DATETIME",
        )?
        .ok_or(ReportError::validation("API.INVALID_REPORTING_PERIOD_ENDS_DATETIME"))?;
        let reporting_window = to_window(
            reporting_begins_local,
            reporting_ends_local,
            utc_offset,
            "API.INVALID_REPORTING_PERIOD_ENDS_DATETIME",
        )?;

        Ok(Self {
            space_id,
            period_type,
            base_window,
            reporting_window,
            reporting_begins_local,
            reporting_ends_local,
            include_spreadsheet: params.excel,
        })
    }

    pub fn reporting_begins_display(&self) -> String {
        self.reporting_begins_local.format(LOCAL_DATETIME_FORMAT).to_string()
    }

    pub fn reporting_ends_display(&self) -> String {
        self.reporting_ends_local.format(LOCAL_DATETIME_FORMAT).to_string()
    }
}

/// Blank values count as absent.
fn parse_optional_local(
    value: Option<&str>,
    field: &'static str,
) -> Result<Option<NaiveDateTime>, ReportError> {
    match value.map(str::trim).filter(|value| !value.is_empty()) {
        None => Ok(None),
        Some(value) => NaiveDateTime::parse_from_str(value, LOCAL_DATETIME_FORMAT)
            .map(Some)
            .map_err(|_| ReportError::validation(field)),
    }
}

fn to_window(
    begins: NaiveDateTime,
    ends: NaiveDateTime,
    utc_offset: FixedOffset,
    ends_field: &'static str,
) -> Result<TimeWindow, ReportError> {
    if begins >= ends {
        return Err(ReportError::validation(ends_field));
    }
    Ok(TimeWindow::new(
        to_utc(begins, utc_offset, ends_field)?,
        to_utc(ends, utc_offset, ends_field)?,
    ))
}

fn to_utc(
    local: NaiveDateTime,
    utc_offset: FixedOffset,
    field: &'static str,
) -> Result<DateTime<Utc>, ReportError> {
    utc_offset
        .from_local_datetime(&local)
        .single()
        .map(|local| local.with_timezone(&Utc))
        .ok_or(ReportError::validation(field))
}
