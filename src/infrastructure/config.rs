use anyhow::Context;
use chrono::FixedOffset;
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerSettings,
    pub report: ReportSettings,
    pub influx: InfluxSettings,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerSettings {
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
        }
    }
}

fn default_bind_addr() -> String {
    "0.0.0.0:8080".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct ReportSettings {
    /// Offset of the site's local time from UTC, e.g. `+08:00`
    pub utc_offset: String,
}

impl ReportSettings {
    pub fn utc_offset(&self) -> anyhow::Result<FixedOffset> {
        self.utc_offset
            .trim()
            .parse::<FixedOffset>()
            .with_context(|| format!("Invalid utc_offset: {}", self.utc_offset))
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct InfluxSettings {
    pub host: String,
    pub token: String,
    pub database: String,
    pub retention_policy: String,
}

/// Load `config/report.toml`, overridden by `SPACE_REPORT__*` environment variables
pub fn load_config() -> anyhow::Result<AppConfig> {
    build_config(config::File::with_name("config/report"))
}

fn build_config<S>(file: S) -> anyhow::Result<AppConfig>
where
    S: config::Source + Send + Sync + 'static,
{
    let settings = config::Config::builder()
        .add_source(file)
        .add_source(
            config::Environment::with_prefix("SPACE_REPORT")
                .prefix_separator("__")
                .separator("__"),
        )
        .build()?;

    Ok(settings.try_deserialize()?)
}
