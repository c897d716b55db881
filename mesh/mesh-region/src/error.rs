//! Error types for region classification and partitioning.

use std::path::PathBuf;
use thiserror::Error;

/// Result type for region operations.
pub type RegionResult<T> = Result<T, RegionError>;

/// Errors that can occur while building rule tables or partitioning meshes.
///
/// Every rule-table variant is detected before any triangle is classified.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum RegionError {
    /// A region or rule entry lacks a required field.
    #[error("{location}: missing required field '{field}'")]
    MissingField {
        /// Entry that is incomplete, e.g. `region 2` or `rule 0`.
        location: String,
        /// Name of the missing field.
        field: &'static str,
    },

    /// A rule refers to a region that is not declared.
    #[error("rule {rule_index}: unknown region '{region}'")]
    UnknownRegion {
        /// Index of the offending rule.
        rule_index: usize,
        /// Region id the rule names.
        region: String,
    },

    /// The rule list does not end with an unconditional rule.
    #[error("rule table has no terminal catch-all rule (last rule must be `always`)")]
    MissingCatchAll,

    /// A rule follows an unconditional rule and can never match.
    #[error("rule {rule_index} is unreachable: an earlier rule always matches")]
    UnreachableRule {
        /// Index of the first unreachable rule.
        rule_index: usize,
    },

    /// A region id is declared twice.
    #[error("region '{name}' is declared more than once")]
    DuplicateRegion {
        /// The duplicate region id.
        name: String,
    },

    /// Two region ids map to the same output filename.
    #[error("regions '{first}' and '{second}' would both be written as '{stem}'")]
    FilenameCollision {
        /// Earlier region id.
        first: String,
        /// Later region id.
        second: String,
        /// The shared filename stem.
        stem: String,
    },

    /// No preset has this name.
    #[error("unknown preset '{name}' (expected one of: {expected})")]
    UnknownPreset {
        /// Requested name.
        name: String,
        /// Comma-separated list of valid names.
        expected: String,
    },

    /// A region color is not a `#RRGGBB` hex string.
    #[error("region '{region}': invalid color '{value}'")]
    InvalidColor {
        /// Region id.
        region: String,
        /// The rejected value.
        value: String,
    },

    /// A rule condition is malformed or compares against a non-finite value.
    #[error("rule {rule_index}: invalid condition: {message}")]
    InvalidCondition {
        /// Index of the offending rule (0 when parsed outside a table).
        rule_index: usize,
        /// What was wrong.
        message: String,
    },

    /// A classification does not fit the mesh or rule table it is used with.
    #[error("classification has {actual} entries but mesh has {expected} faces")]
    ClassificationMismatch {
        /// Face count of the mesh.
        expected: usize,
        /// Entries in the classification.
        actual: usize,
    },

    /// A classification entry names a region index outside the table.
    #[error("face {face} assigned to region index {region} (table has {region_count} regions)")]
    InvalidRegionIndex {
        /// Face index.
        face: usize,
        /// Offending region index.
        region: u32,
        /// Number of regions available.
        region_count: usize,
    },

    /// A face references a vertex outside the vertex array.
    #[error("face {face} references vertex {index} (mesh has {vertex_count} vertices)")]
    InvalidVertexIndex {
        /// Offending face.
        face: usize,
        /// The invalid index.
        index: u32,
        /// Total number of vertices in the mesh.
        vertex_count: usize,
    },

    /// The mesh has no triangles.
    #[error("mesh is empty")]
    EmptyMesh,

    /// A rule-table file could not be parsed.
    #[error("invalid rule table {}: {source}", path.display())]
    Config {
        /// File being parsed (empty for in-memory sources).
        path: PathBuf,
        /// Underlying TOML error.
        #[source]
        source: toml::de::Error,
    },

    /// A rule-table file could not be read.
    #[error("failed to read {}: {source}", path.display())]
    Io {
        /// File being read.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}

impl RegionError {
    /// Whether this error comes from an invalid rule table.
    #[must_use]
    pub const fn is_config_error(&self) -> bool {
        matches!(
            self,
            Self::MissingField { .. }
                | Self::UnknownRegion { .. }
                | Self::MissingCatchAll
                | Self::UnreachableRule { .. }
                | Self::DuplicateRegion { .. }
                | Self::FilenameCollision { .. }
                | Self::InvalidColor { .. }
                | Self::InvalidCondition { .. }
                | Self::UnknownPreset { .. }
                | Self::Config { .. }
        )
    }

    pub(crate) fn missing(location: impl Into<String>, field: &'static str) -> Self {
        Self::MissingField {
            location: location.into(),
            field,
        }
    }
}
