//! Filesystem report archive.
//!
//! Writes each generated report as a markdown file under
//! `<base_dir>/<project_id>/`. Directories are created on demand.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use rivalscope_core::types::DbId;

use crate::error::StoreError;
use crate::ports::ReportArchive;

/// Archive rooted at a local directory.
pub struct FsReportArchive {
    base_dir: PathBuf,
}

impl FsReportArchive {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    fn project_dir(&self, project_id: DbId) -> PathBuf {
        self.base_dir.join(project_id.to_string())
    }
}

#[async_trait]
impl ReportArchive for FsReportArchive {
    async fn write_file(
        &self,
        project_id: DbId,
        file_name: &str,
        contents: &str,
    ) -> Result<PathBuf, StoreError> {
        // File names are generated, but never let one escape the project dir.
        if file_name.contains('/') || file_name.contains('\\') || file_name.starts_with('.') {
            return Err(StoreError::Io(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("invalid archive file name '{file_name}'"),
            )));
        }

        let dir = self.project_dir(project_id);
        tokio::fs::create_dir_all(&dir).await?;

        let path = dir.join(file_name);
        tokio::fs::write(&path, contents).await?;

        tracing::debug!(path = %path.display(), bytes = contents.len(), "Report archived");
        Ok(path)
    }
}
