pub mod config;
pub mod metrics_server;
pub mod observability;
pub mod pipeline;
pub mod report;
pub mod sinks;
pub mod sources;

pub use pipeline::{FacilityScope, ReportArtifact, ReportError, ReportOutcome, ReportPipeline};
