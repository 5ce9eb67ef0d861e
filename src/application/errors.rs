// Report build errors
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReportError {
    /// A request parameter is missing or malformed. `field` is the API error code.
    #[error("invalid request parameter: {field}")]
    Validation { field: &'static str },

    #[error("not found: {what}")]
    NotFound { what: &'static str },

    #[error("data source query failed: {0:#}")]
    DataSource(anyhow::Error),

    #[error("failed to render report: {0:#}")]
    Render(anyhow::Error),
}

impl ReportError {
    pub fn validation(field: &'static str) -> Self {
        Self::Validation { field }
    }

    pub fn not_found(what: &'static str) -> Self {
        Self::NotFound { what }
    }
}
