//! Error types for the rbigen-core library.
//!
//! Fatal conditions are variants of [`Error`] and abort generation. The one
//! non-fatal condition, an illegal Ruby field name, is reported as a
//! [`NamingHazard`] value instead and only degrades the constructor stub.

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for rbigen operations
pub type Result<T> = std::result::Result<T, Error>;

/// Comprehensive error type for all rbigen operations
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// A field kind reached a closed mapping table that has no rule for it.
    ///
    /// This means the descriptor model and the generator disagree (for
    /// example a proto2 group, or a message used where only scalars are
    /// allowed). No output from the run should be trusted.
    #[error("unsupported field type for field '{field}': no mapping for kind '{kind}'")]
    SchemaInvariantViolation {
        /// Fully-qualified name of the offending field
        field: String,
        /// Name of the kind that had no mapping
        kind: String,
    },

    /// Failed to decode a descriptor set or plugin request
    #[error("failed to decode protobuf input: {0}")]
    DescriptorParse(#[from] prost::DecodeError),

    /// Failed to build the descriptor pool with prost-reflect
    #[error("failed to build descriptor pool: {0}")]
    DescriptorBuild(String),

    /// A file named for generation is not present in the pool
    #[error("file '{name}' was requested for generation but is not in the descriptor set")]
    FileNotFound {
        /// The proto file name
        name: String,
    },

    /// A protoc parameter was malformed or unknown
    #[error("invalid parameter '{key}': {details}")]
    InvalidParameter {
        /// The parameter key
        key: String,
        /// What was wrong with it
        details: String,
    },

    /// Failed to read input file
    #[error("failed to read file '{path}': {source}")]
    FileRead {
        /// Path to the file that failed to read
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Failed to write output file
    #[error("failed to write file '{path}': {source}")]
    FileWrite {
        /// Path to the file that failed to write
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Path traversal attempt detected (security error)
    #[error("path traversal detected: '{path}' would escape output directory")]
    PathTraversal {
        /// The suspicious path
        path: PathBuf,
    },

    /// Formatting into the output buffer failed
    #[error("failed to format stub output")]
    Format(#[from] fmt::Error),
}

impl Error {
    /// Creates a new schema invariant violation
    pub fn schema_invariant(field: impl Into<String>, kind: impl Into<String>) -> Self {
        Self::SchemaInvariantViolation {
            field: field.into(),
            kind: kind.into(),
        }
    }

    /// Creates a new descriptor build error
    pub fn descriptor_build(msg: impl Into<String>) -> Self {
        Self::DescriptorBuild(msg.into())
    }

    /// Creates a new file-not-found error
    pub fn file_not_found(name: impl Into<String>) -> Self {
        Self::FileNotFound { name: name.into() }
    }

    /// Creates a new invalid parameter error
    pub fn invalid_parameter(key: impl Into<String>, details: impl Into<String>) -> Self {
        Self::InvalidParameter {
            key: key.into(),
            details: details.into(),
        }
    }

    /// Creates a new file read error
    pub fn file_read(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::FileRead {
            path: path.into(),
            source,
        }
    }

    /// Creates a new file write error
    pub fn file_write(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::FileWrite {
            path: path.into(),
            source,
        }
    }

    /// Creates a new path traversal error
    pub fn path_traversal(path: impl Into<PathBuf>) -> Self {
        Self::PathTraversal { path: path.into() }
    }

    /// Returns true if this error must terminate the whole run.
    ///
    /// Schema invariant violations are never retried or defaulted; input
    /// errors are fatal for the input that produced them only.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::SchemaInvariantViolation { .. } | Self::Format(_))
    }
}

/// A field whose name cannot be used as a Ruby keyword argument.
///
/// Not an error: the owning message falls back to an untyped constructor
/// while the field keeps its typed accessors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamingHazard {
    /// Fully-qualified name of the field
    pub field: String,
    /// Why the name was rejected
    pub reason: HazardReason,
}

/// Why a field name was rejected as a Ruby identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HazardReason {
    /// The name is empty
    Empty,
    /// The name starts with a digit
    LeadingDigit,
    /// The name starts with an upper-case letter (a Ruby constant)
    LeadingUppercase,
    /// The name contains a character outside `[A-Za-z0-9_]`
    IllegalCharacter(char),
}

impl fmt::Display for NamingHazard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.reason {
            HazardReason::Empty => write!(f, "field '{}' has an empty name", self.field),
            HazardReason::LeadingDigit => {
                write!(f, "field '{}' starts with a digit", self.field)
            }
            HazardReason::LeadingUppercase => {
                write!(f, "field '{}' starts with an upper-case letter", self.field)
            }
            HazardReason::IllegalCharacter(c) => {
                write!(f, "field '{}' contains illegal character {:?}", self.field, c)
            }
        }
    }
}
