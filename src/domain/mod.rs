// Domain layer - Energy data, periods and report documents
pub mod energy;
pub mod period;
pub mod report;
