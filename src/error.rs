use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Run-level failures. Per-entry decode problems are not part of this
/// taxonomy: they are logged and the entry is skipped.
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("archive not found: {}", .0.display())]
    ArchiveNotFound(PathBuf),

    #[error("failed to open archive {}: {message}", path.display())]
    ArchiveOpenError { path: PathBuf, message: String },

    #[error("analysis exceeded the {}s budget", limit.as_secs())]
    AnalysisTimeout { limit: Duration },

    #[error("analysis cancelled by caller")]
    AnalysisCancelled,
}
