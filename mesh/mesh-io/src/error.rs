//! Error types for mesh I/O operations.

use std::path::PathBuf;
use thiserror::Error;

/// Result type for mesh I/O operations.
pub type IoResult<T> = Result<T, IoError>;

/// Errors that can occur while decoding, encoding, or packaging meshes.
#[derive(Debug, Error)]
pub enum IoError {
    /// File not found.
    #[error("file not found: {path}")]
    FileNotFound {
        /// Path that was not found.
        path: PathBuf,
    },

    /// The byte stream ended before the declared triangle count was satisfied.
    #[error("truncated STL: data ends at byte {offset}, expected {expected} bytes")]
    Truncated {
        /// Byte offset at which data ran out.
        offset: u64,
        /// Total length implied by the header and triangle count.
        expected: u64,
    },

    /// A writer was finished with a different number of triangles than declared.
    #[error("triangle count mismatch: header declares {declared}, wrote {written}")]
    TriangleCountMismatch {
        /// Count written into the header.
        declared: u32,
        /// Triangles actually written.
        written: u32,
    },

    /// The mesh has more triangles than a binary STL can declare.
    #[error("too many triangles for binary STL: {count}")]
    TooManyTriangles {
        /// Number of faces in the mesh.
        count: usize,
    },

    /// A face references a vertex outside the vertex array.
    #[error("face {face} references vertex {index} (mesh has {vertex_count} vertices)")]
    InvalidFaceIndex {
        /// Offending face.
        face: usize,
        /// Offending vertex index.
        index: u32,
        /// Number of vertices in the mesh.
        vertex_count: usize,
    },

    /// Invalid file content (parse or generation error).
    #[error("invalid file content: {message}")]
    InvalidContent {
        /// Description of what was invalid.
        message: String,
    },

    /// ZIP container error.
    #[error("archive error: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// JSON serialization error for embedded metadata.
    #[error("metadata serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error from the standard library.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl IoError {
    /// Create an `InvalidContent` error with the given message.
    #[must_use]
    pub fn invalid_content(message: impl Into<String>) -> Self {
        Self::InvalidContent {
            message: message.into(),
        }
    }

    /// Whether this error describes malformed input rather than an
    /// environment failure.
    ///
    /// Format errors are unrecoverable for the current input.
    #[must_use]
    pub const fn is_format_error(&self) -> bool {
        matches!(
            self,
            Self::Truncated { .. } | Self::InvalidContent { .. } | Self::InvalidFaceIndex { .. }
        )
    }

    /// Map an open failure on `path` to [`IoError::FileNotFound`] when appropriate.
    pub(crate) fn from_open(err: std::io::Error, path: &std::path::Path) -> Self {
        if err.kind() == std::io::ErrorKind::NotFound {
            Self::FileNotFound {
                path: path.to_path_buf(),
            }
        } else {
            Self::Io(err)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncated_message_names_offset() {
        let err = IoError::Truncated {
            offset: 134,
            expected: 184,
        };
        assert!(err.to_string().contains("134"));
        assert!(err.is_format_error());
    }

    #[test]
    fn not_found_is_mapped() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err = IoError::from_open(io, std::path::Path::new("model.stl"));
        assert!(matches!(err, IoError::FileNotFound { .. }));
        assert!(!err.is_format_error());
    }
}
