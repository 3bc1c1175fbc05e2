//! Error types for cascade and value operations.
//!
//! None of these is fatal to the engine: a broken stylesheet must never
//! prevent the document from being stylable, only degrade the styling of
//! the offending rule or property.

use thiserror::Error;

/// Errors that can occur while parsing, converting, or computing CSS values.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// Malformed value for a known property. Callers skip the declaration.
    #[error("syntax error in '{property}': {message}")]
    Syntax { property: String, message: String },

    /// Declaration references a property the registry does not know.
    #[error("unknown property: {0}")]
    UnknownProperty(String),

    /// A value was asked for a representation its variant cannot provide,
    /// e.g. asking a color for a float.
    #[error("unsupported conversion: expected {expected}, got {actual}")]
    UnsupportedConversion {
        expected: &'static str,
        actual: &'static str,
    },

    /// A property's computation re-entered its own resolution. The engine
    /// substitutes the registered initial value.
    #[error("cyclic value dependency while computing '{property}'")]
    CyclicDependency { property: String },

    /// An external resource (@import target, color profile) could not be
    /// loaded. The engine degrades the reference to a no-op.
    #[error("resource unavailable: {0}")]
    ResourceUnavailable(String),
}

impl Error {
    pub(crate) fn syntax(property: &str, message: impl Into<String>) -> Self {
        Error::Syntax {
            property: property.to_string(),
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
