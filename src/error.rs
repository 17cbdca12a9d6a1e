// src/error.rs

//! Error types for debsolve

use crate::coordinate::Coordinate;
use thiserror::Error;

/// Errors raised while reading descriptors, rules and package indexes,
/// or while classifying a single reference.
#[derive(Debug, Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Invalid rule: {0}")]
    InvalidRule(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Command failed: {0}")]
    CommandFailed(String),

    #[error("Not found: {0}")]
    NotFoundError(String),

    /// No providing package was found and the reference was not ignored
    #[error("Unresolved dependency {0}")]
    UnresolvedReference(Coordinate),
}

/// Result type for debsolve operations
pub type Result<T> = std::result::Result<T, Error>;
