// Application layer - Report use cases and ports
pub mod aggregator;
pub mod energy_repository;
pub mod errors;
pub mod report_renderer;
pub mod report_request;
pub mod report_service;
pub mod statistics;
