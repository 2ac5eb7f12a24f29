pub mod file;
pub mod http;

pub use file::FileSink;

use crate::pipeline::ReportArtifact;

#[derive(thiserror::Error, Debug)]
pub enum SinkError {
    #[error("failed to write report: {0}")]
    Io(#[from] std::io::Error),
}

/// Hands a finished report to whoever delivers it.
#[async_trait::async_trait]
pub trait ReportSink: Send + Sync {
    async fn deliver(&self, artifact: &ReportArtifact) -> Result<(), SinkError>;
}
