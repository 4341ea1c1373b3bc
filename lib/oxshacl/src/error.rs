//! Error types for graph loading, inference, shape evaluation, report building and
//! expected result checks.

use oxrdf::{IriParseError, NamedNode, Term};
use oxrdfio::RdfSyntaxError;
use std::io;
use std::path::PathBuf;

/// Main error type of a validation run.
///
/// A run either completes with a report or fails with one of these, there is no partial result.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum ValidateError {
    /// The data or shapes graph could not be loaded.
    #[error(transparent)]
    Load(#[from] LoadError),

    /// The inference pass could not be set up or failed.
    #[error(transparent)]
    Inference(#[from] InferenceError),

    /// Shape discovery or per-shape evaluation failed.
    #[error(transparent)]
    Shape(#[from] ShapeError),

    /// The validation report could not be built or serialized.
    #[error(transparent)]
    Report(#[from] ReportError),

    /// The expected result fixture or the report is malformed.
    #[error(transparent)]
    Fixture(#[from] FixtureError),
}

/// Error raised while resolving an input into a graph.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum LoadError {
    /// The input is neither a graph nor a string.
    #[error("Cannot determine the format of the input graph: {message}")]
    InputType { message: String },

    /// The referenced file could not be read.
    #[error("Failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The input content is not valid in the resolved serialization format.
    #[error(transparent)]
    Parse(#[from] RdfSyntaxError),

    /// A format name did not match any supported RDF serialization.
    #[error("The RDF format '{name}' is unknown")]
    UnknownFormat { name: String },
}

impl LoadError {
    /// Creates an input type error.
    pub fn input_type(message: impl Into<String>) -> Self {
        Self::InputType {
            message: message.into(),
        }
    }

    /// Creates an unknown format error.
    pub fn unknown_format(name: impl Into<String>) -> Self {
        Self::UnknownFormat { name: name.into() }
    }
}

/// Error raised while selecting or running a deductive closure.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum InferenceError {
    /// The inference selector is not one of the supported modes.
    #[error("Don't know how to do '{mode}' type inferencing")]
    UnsupportedMode { mode: String },

    /// The closure engine could not be constructed or failed during expansion.
    #[error("Inference engine failure: {message}")]
    Engine { message: String },
}

impl InferenceError {
    /// Creates an unsupported mode error.
    pub fn unsupported_mode(mode: impl Into<String>) -> Self {
        Self::UnsupportedMode { mode: mode.into() }
    }

    /// Creates an engine error.
    pub fn engine(message: impl Into<String>) -> Self {
        Self::Engine {
            message: message.into(),
        }
    }
}

/// Error raised by shape discovery or per-shape validation.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum ShapeError {
    /// Invalid shape definition.
    #[error("Invalid shape definition for {shape}: {message}")]
    InvalidShape { shape: Term, message: String },

    /// Invalid constraint parameter value.
    #[error("Invalid value for {parameter} in shape {shape}: expected {expected}, got {actual}")]
    InvalidParameter {
        shape: Term,
        parameter: NamedNode,
        expected: String,
        actual: Term,
    },

    /// Property path form that is not supported.
    #[error("Unsupported property path in shape {shape}: {path}")]
    UnsupportedPath { shape: Term, path: Term },

    /// Invalid regex pattern.
    #[error("Invalid regex pattern '{pattern}': {message}")]
    InvalidRegex { pattern: String, message: String },
}

impl ShapeError {
    /// Creates an invalid shape error.
    pub fn invalid_shape(shape: impl Into<Term>, message: impl Into<String>) -> Self {
        Self::InvalidShape {
            shape: shape.into(),
            message: message.into(),
        }
    }

    /// Creates an invalid parameter error.
    pub fn invalid_parameter(
        shape: impl Into<Term>,
        parameter: impl Into<NamedNode>,
        expected: impl Into<String>,
        actual: impl Into<Term>,
    ) -> Self {
        Self::InvalidParameter {
            shape: shape.into(),
            parameter: parameter.into(),
            expected: expected.into(),
            actual: actual.into(),
        }
    }

    /// Creates an unsupported path error.
    pub fn unsupported_path(shape: impl Into<Term>, path: impl Into<Term>) -> Self {
        Self::UnsupportedPath {
            shape: shape.into(),
            path: path.into(),
        }
    }

    /// Creates an invalid regex error.
    pub fn invalid_regex(pattern: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidRegex {
            pattern: pattern.into(),
            message: message.into(),
        }
    }
}

/// Error raised while assembling or serializing a validation report.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum ReportError {
    /// A non-conformant outcome was reported without any result.
    #[error("A Non-Conformant Validation Report must have at least one result")]
    InvariantViolation,

    /// The report graph could not be written.
    #[error("Failed to serialize the validation report: {0}")]
    Serialization(#[from] io::Error),

    /// A serialization prefix is not a valid IRI.
    #[error("Invalid report prefix: {0}")]
    Prefix(#[from] IriParseError),
}

/// Error raised when an expected result fixture or a report lacks a required node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum FixtureError {
    #[error(
        "Cannot check the expected result, the given expected result graph does not have a GraphValidationTestCase"
    )]
    NoTestCase,

    #[error(
        "Cannot check the expected result, the given GraphValidationTestCase does not have an expectedResult"
    )]
    NoExpectedResult,

    #[error("Cannot check the expected result, the given expectedResult does not have an sh:conforms")]
    NoExpectedConforms,

    #[error("Cannot check the validation report, the report graph does not contain a ValidationReport")]
    NoReportNode,

    #[error("Cannot check the validation report, the report graph does not have an sh:conforms")]
    NoReportConforms,
}
