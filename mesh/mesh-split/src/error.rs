//! Error types for the split pipeline.

use std::path::PathBuf;

use mesh_io::IoError;
use mesh_region::RegionError;
use thiserror::Error;

/// Result type for pipeline operations.
pub type SplitResult<T> = Result<T, SplitError>;

/// Errors that abort processing of one input mesh.
///
/// A failure writing a single region file is not one of these; it is
/// recorded in the [`WriteReport`](crate::WriteReport) instead.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SplitError {
    /// Reading or encoding mesh data failed.
    #[error(transparent)]
    Mesh(#[from] IoError),

    /// The rule table is invalid, the mesh is empty, or a classification is inconsistent.
    #[error(transparent)]
    Region(#[from] RegionError),

    /// The output directory could not be prepared.
    #[error("cannot create output directory {}: {source}", path.display())]
    OutputDir {
        /// Directory that could not be created.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// A metadata document could not be written.
    #[error("cannot write {}: {source}", path.display())]
    Metadata {
        /// Document path.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// A metadata document could not be serialized or parsed.
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

impl SplitError {
    /// Whether the input mesh had no triangles.
    #[must_use]
    pub const fn is_empty_mesh(&self) -> bool {
        matches!(self, Self::Region(RegionError::EmptyMesh))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_mesh_detection() {
        let err: SplitError = RegionError::EmptyMesh.into();
        assert!(err.is_empty_mesh());
        assert_eq!(err.to_string(), "mesh is empty");

        let err: SplitError = RegionError::MissingCatchAll.into();
        assert!(!err.is_empty_mesh());
    }

    #[test]
    fn test_format_error_passes_through() {
        let err: SplitError = IoError::Truncated {
            offset: 90,
            expected: 134,
        }
        .into();
        assert!(matches!(err, SplitError::Mesh(IoError::Truncated { offset: 90, .. })));
    }
}
