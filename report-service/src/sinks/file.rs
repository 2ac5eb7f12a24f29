use std::path::{Path, PathBuf};

use crate::pipeline::ReportArtifact;

use super::{ReportSink, SinkError};

/// Writes reports into a directory, replacing any earlier file of the same name.
pub struct FileSink {
    dir: PathBuf,
}

impl FileSink {
    pub fn new<P: Into<PathBuf>>(dir: P) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path_for(&self, artifact: &ReportArtifact) -> PathBuf {
        self.dir.join(Path::new(&artifact.filename))
    }
}

#[async_trait::async_trait]
impl ReportSink for FileSink {
    async fn deliver(&self, artifact: &ReportArtifact) -> Result<(), SinkError> {
        tokio::fs::create_dir_all(&self.dir).await?;
        let path = self.path_for(artifact);
        tokio::fs::write(&path, &artifact.bytes).await?;

        tracing::info!(path = %path.display(), bytes = artifact.bytes.len(), "report written");
        Ok(())
    }
}
