// InfluxDB repository implementation
use crate::application::energy_repository::EnergyRepository;
use crate::domain::energy::{EnergyCategory, Space, TimeSeriesSample};
use crate::domain::period::TimeWindow;
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use rust_decimal::Decimal;
use rust_decimal::prelude::FromPrimitive;
use serde::Deserialize;
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet, HashMap};

const SPACE_QUERY: &str = r#"SELECT "name", "area", "cost_center_id" FROM "spaces" WHERE "space_id" = '${space_id}' ORDER BY time DESC LIMIT 1"#;

const ENERGY_CATEGORIES_QUERY: &str = r#"SELECT "name", "unit_of_measure", "kgce", "kgco2e", "category_id" FROM "energy_categories""#;

const CATEGORY_IDS_QUERY: &str = r#"SELECT count("actual_value") FROM "space_input_category_hourly" WHERE "space_id" = '${space_id}' AND time >= '${start}' AND time < '${end}' GROUP BY "energy_category_id""#;

const HOURLY_SAMPLES_QUERY: &str = r#"SELECT "actual_value" FROM "space_input_category_hourly" WHERE "space_id" = '${space_id}' AND "energy_category_id" = '${category_id}' AND time >= '${start}' AND time < '${end}' ORDER BY time ASC"#;

const TARIFFS_QUERY: &str = r#"SELECT "price" FROM "cost_center_tariffs" WHERE "cost_center_id" = '${cost_center_id}' AND "energy_category_id" = '${category_id}' AND time >= '${start}' AND time < '${end}' ORDER BY time ASC"#;

#[derive(Debug, Clone)]
pub struct InfluxRepository {
    client: reqwest::Client,
    host: String,
    token: String,
    database: String,
    retention_policy: String,
}

#[derive(Debug, Deserialize)]
struct InfluxQLResponse {
    results: Vec<InfluxQLResult>,
}

#[derive(Debug, Deserialize)]
struct InfluxQLResult {
    #[serde(default)]
    series: Option<Vec<InfluxQLSeries>>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct InfluxQLSeries {
    columns: Vec<String>,
    #[serde(default)]
    values: Vec<Vec<Value>>,
    #[serde(default)]
    tags: Option<HashMap<String, String>>,
}

impl InfluxQLSeries {
    fn rows(&self) -> impl Iterator<Item = Row<'_>> {
        self.values.iter().map(|values| Row {
            columns: &self.columns,
            values,
        })
    }

    fn tag(&self, key: &str) -> Option<&str> {
        self.tags.as_ref()?.get(key).map(String::as_str)
    }
}

/// One result row, addressed by column name
struct Row<'a> {
    columns: &'a [String],
    values: &'a [Value],
}

impl Row<'_> {
    fn get(&self, column: &str) -> Option<&Value> {
        let index = self.columns.iter().position(|c| c == column)?;
        self.values.get(index).filter(|value| !value.is_null())
    }

    fn string(&self, column: &str) -> Option<String> {
        match self.get(column)? {
            Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    fn decimal(&self, column: &str) -> Option<Decimal> {
        value_as_decimal(self.get(column)?)
    }

    fn id(&self, column: &str) -> Option<u64> {
        value_as_id(self.get(column)?)
    }

    fn time(&self) -> Option<DateTime<Utc>> {
        let time = self.get("time")?.as_str()?;
        DateTime::parse_from_rfc3339(time)
            .ok()
            .map(|time| time.with_timezone(&Utc))
    }
}

fn value_as_decimal(value: &Value) -> Option<Decimal> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .map(Decimal::from)
            .or_else(|| n.to_string().parse().ok())
            .or_else(|| n.as_f64().and_then(Decimal::from_f64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn value_as_id(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Replace `${name}` placeholders with quote-escaped values
fn bind_query(template: &str, vars: &[(&str, String)]) -> String {
    let mut result = template.to_string();
    for (key, value) in vars {
        let placeholder = format!("${{{}}}", key);
        let escaped = value.replace('\\', "\\\\").replace('\'', "\\'");
        result = result.replace(&placeholder, &escaped);
    }
    result
}

fn window_vars(window: &TimeWindow) -> [(&'static str, String); 2] {
    [
        ("start", window.start.to_rfc3339_opts(SecondsFormat::Secs, true)),
        ("end", window.end.to_rfc3339_opts(SecondsFormat::Secs, true)),
    ]
}

impl InfluxQLResponse {
    fn series(&self) -> impl Iterator<Item = &InfluxQLSeries> {
        self.results
            .iter()
            .flat_map(|result| result.series.iter().flatten())
    }

    fn rows(&self) -> impl Iterator<Item = Row<'_>> {
        self.series().flat_map(InfluxQLSeries::rows)
    }

    fn into_space(self, space_id: u64) -> Option<Space> {
        let row = self.rows().next()?;
        Some(Space {
            id: space_id,
            name: row.string("name").unwrap_or_default(),
            area: row.decimal("area"),
            cost_center_id: row.id("cost_center_id"),
        })
    }

    fn into_energy_categories(self) -> Vec<EnergyCategory> {
        // later rows win so a re-written record replaces the older one
        let mut categories = BTreeMap::new();
        for row in self.rows() {
            let Some(id) = row.id("category_id") else {
                tracing::warn!("Skipping energy category row without category_id");
                continue;
            };
            categories.insert(
                id,
                EnergyCategory {
                    id,
                    name: row.string("name").unwrap_or_default(),
                    unit_of_measure: row.string("unit_of_measure").unwrap_or_default(),
                    kgce: row.decimal("kgce").unwrap_or_default(),
                    kgco2e: row.decimal("kgco2e").unwrap_or_default(),
                },
            );
        }
        categories.into_values().collect()
    }

    fn into_category_ids(self) -> BTreeSet<u64> {
        self.series()
            .filter_map(|series| series.tag("energy_category_id"))
            .filter_map(|id| id.parse().ok())
            .collect()
    }

    fn into_samples(self) -> Vec<TimeSeriesSample> {
        self.rows()
            .filter_map(|row| Some(TimeSeriesSample::new(row.time()?, row.decimal("actual_value"))))
            .collect()
    }

    fn into_tariffs(self) -> Vec<(DateTime<Utc>, Decimal)> {
        self.rows()
            .filter_map(|row| Some((row.time()?, row.decimal("price")?)))
            .collect()
    }
}

impl InfluxRepository {
    pub fn new(host: String, token: String, database: String, retention_policy: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            host: host.trim_end_matches('/').to_string(),
            token,
            database,
            retention_policy,
        }
    }

    fn build_query_url(&self, query: &str) -> String {
        format!(
            "{}/query?db={}&rp={}&q={}",
            self.host,
            urlencoding::encode(&self.database),
            urlencoding::encode(&self.retention_policy),
            urlencoding::encode(query)
        )
    }

    async fn execute_query(&self, query: &str) -> Result<InfluxQLResponse> {
        tracing::debug!(query, "Executing InfluxQL query");
        let response = self
            .client
            .get(self.build_query_url(query))
            .header("Authorization", format!("Token {}", self.token))
            .header("Accept", "application/json")
            .send()
            .await
            .context("Failed to send request to InfluxDB")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("InfluxDB query failed with status {}: {}", status, body);
        }

        let data = response
            .json::<InfluxQLResponse>()
            .await
            .context("Failed to parse InfluxDB response")?;

        if let Some(error) = data.results.iter().find_map(|result| result.error.as_ref()) {
            anyhow::bail!("InfluxDB query error: {}", error);
        }

        Ok(data)
    }
}

#[async_trait]
impl EnergyRepository for InfluxRepository {
    async fn find_space(&self, space_id: u64) -> Result<Option<Space>> {
        let query = bind_query(SPACE_QUERY, &[("space_id", space_id.to_string())]);
        let response = self.execute_query(&query).await?;
        Ok(response.into_space(space_id))
    }

    async fn energy_categories(&self) -> Result<Vec<EnergyCategory>> {
        let response = self.execute_query(ENERGY_CATEGORIES_QUERY).await?;
        Ok(response.into_energy_categories())
    }

    async fn category_ids_with_data(
        &self,
        space_id: u64,
        window: &TimeWindow,
    ) -> Result<BTreeSet<u64>> {
        let [start, end] = window_vars(window);
        let query = bind_query(
            CATEGORY_IDS_QUERY,
            &[("space_id", space_id.to_string()), start, end],
        );
        let response = self.execute_query(&query).await?;
        Ok(response.into_category_ids())
    }

    async fn hourly_samples(
        &self,
        space_id: u64,
        category_id: u64,
        window: &TimeWindow,
    ) -> Result<Vec<TimeSeriesSample>> {
        let [start, end] = window_vars(window);
        let query = bind_query(
            HOURLY_SAMPLES_QUERY,
            &[
                ("space_id", space_id.to_string()),
                ("category_id", category_id.to_string()),
                start,
                end,
            ],
        );
        let response = self.execute_query(&query).await?;
        Ok(response.into_samples())
    }

    async fn tariffs(
        &self,
        cost_center_id: u64,
        category_id: u64,
        window: &TimeWindow,
    ) -> Result<Vec<(DateTime<Utc>, Decimal)>> {
        let [start, end] = window_vars(window);
        let query = bind_query(
            TARIFFS_QUERY,
            &[
                ("cost_center_id", cost_center_id.to_string()),
                ("category_id", category_id.to_string()),
                start,
                end,
            ],
        );
        let response = self.execute_query(&query).await?;
        Ok(response.into_tariffs())
    }
}
