// Report document domain models
//
// Every `Vec` directly under a period is indexed by category: position `i`
// of `names`, `units`, `values`, `subtotals`, `means`, ... always describes
// the same energy category.
use rust_decimal::Decimal;
use serde::Serialize;

#[derive(Debug, Clone, Default, Serialize)]
pub struct ReportDocument {
    pub space: SpaceSummary,
    pub base_period: BasePeriod,
    pub reporting_period: ReportingPeriod,
    pub parameters: Parameters,
    /// Base64 encoded CSV report, present only when requested. The field
    /// keeps its legacy name.
    pub excel_bytes_base64: Option<String>,
}

impl ReportDocument {
    /// Report shell for a space without any category data.
    pub fn empty(space: SpaceSummary) -> Self {
        Self {
            space,
            ..Self::default()
        }
    }

    pub fn has_category_data(&self) -> bool {
        !self.reporting_period.names.is_empty()
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct SpaceSummary {
    pub name: String,
    pub area: Option<Decimal>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct BasePeriod {
    pub names: Vec<String>,
    pub units: Vec<String>,
    pub timestamps: Vec<Vec<String>>,
    pub values: Vec<Vec<Option<Decimal>>>,
    pub subtotals: Vec<Decimal>,
    pub subtotals_in_kgce: Vec<Decimal>,
    pub subtotals_in_kgco2e: Vec<Decimal>,
    pub means: Vec<Option<Decimal>>,
    pub medians: Vec<Option<Decimal>>,
    pub minimums: Vec<Option<Decimal>>,
    pub maximums: Vec<Option<Decimal>>,
    pub stdevs: Vec<Option<Decimal>>,
    pub variances: Vec<Option<Decimal>>,
    pub total_in_kgce: Decimal,
    pub total_in_kgco2e: Decimal,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ReportingPeriod {
    pub names: Vec<String>,
    pub units: Vec<String>,
    pub timestamps: Vec<Vec<String>>,
    pub values: Vec<Vec<Option<Decimal>>>,
    pub subtotals: Vec<Decimal>,
    pub subtotals_in_kgce: Vec<Decimal>,
    pub subtotals_in_kgco2e: Vec<Decimal>,
    pub subtotals_per_unit_area: Vec<Option<Decimal>>,
    pub increment_rates: Vec<Option<Decimal>>,

    pub means: Vec<Option<Decimal>>,
    pub medians: Vec<Option<Decimal>>,
    pub minimums: Vec<Option<Decimal>>,
    pub maximums: Vec<Option<Decimal>>,
    pub stdevs: Vec<Option<Decimal>>,
    pub variances: Vec<Option<Decimal>>,

    pub means_increment_rate: Vec<Option<Decimal>>,
    pub medians_increment_rate: Vec<Option<Decimal>>,
    pub minimums_increment_rate: Vec<Option<Decimal>>,
    pub maximums_increment_rate: Vec<Option<Decimal>>,
    pub stdevs_increment_rate: Vec<Option<Decimal>>,
    pub variances_increment_rate: Vec<Option<Decimal>>,

    pub means_per_unit_area: Vec<Option<Decimal>>,
    pub medians_per_unit_area: Vec<Option<Decimal>>,
    pub minimums_per_unit_area: Vec<Option<Decimal>>,
    pub maximums_per_unit_area: Vec<Option<Decimal>>,
    pub stdevs_per_unit_area: Vec<Option<Decimal>>,
    pub variances_per_unit_area: Vec<Option<Decimal>>,

    pub total_in_kgce: Decimal,
    pub total_in_kgco2e: Decimal,
    pub total_in_kgce_per_unit_area: Option<Decimal>,
    pub total_in_kgco2e_per_unit_area: Option<Decimal>,
    pub increment_rate_in_kgce: Option<Decimal>,
    pub increment_rate_in_kgco2e: Option<Decimal>,
}

/// Tariff price series, one entry per category.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Parameters {
    pub names: Vec<String>,
    pub timestamps: Vec<Vec<String>>,
    pub values: Vec<Vec<Decimal>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_document_keeps_structure() {
        let document = ReportDocument::empty(SpaceSummary {
            name: "Building A".to_string(),
            area: Some(Decimal::from(1200)),
        });
        assert!(!document.has_category_data());

        let json = serde_json::to_value(&document).unwrap();
        assert_eq!(json["space"]["name"], "Building A");
        assert_eq!(json["space"]["area"], 1200.0);
        assert_eq!(json["reporting_period"]["names"], serde_json::json!([]));
        assert_eq!(json["reporting_period"]["increment_rate_in_kgce"], serde_json::Value::Null);
        assert_eq!(json["base_period"]["total_in_kgce"], 0.0);
        assert_eq!(json["parameters"]["values"], serde_json::json!([]));
        assert_eq!(json["excel_bytes_base64"], serde_json::Value::Null);
    }
}
