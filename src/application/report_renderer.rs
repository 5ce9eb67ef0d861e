// Renderer trait for report artifacts
use crate::domain::report::ReportDocument;

/// Display metadata printed in the artifact header.
#[derive(Debug, Clone)]
pub struct RenderContext {
    pub name: String,
    pub reporting_start_local: String,
    pub reporting_end_local: String,
    pub period_type: String,
}

pub trait ReportRenderer: Send + Sync {
    /// Render the document into artifact bytes.
    ///
    /// A document without category data still renders, to an artifact that
    /// only carries the header.
    fn render(&self, document: &ReportDocument, context: &RenderContext) -> anyhow::Result<Vec<u8>>;
}
