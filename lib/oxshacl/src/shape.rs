//! Interfaces to shape discovery and per-shape evaluation.
//!
//! The orchestrator only sees shapes through [`ShapeDiscovery`] and [`Shape`].
//! [`CoreShapes`](crate::CoreShapes) is the built-in implementation.

use crate::error::ShapeError;
use oxrdf::{BlankNode, Graph, NamedNodeRef, Term, Triple};
use std::fmt;

/// One violation found by a shape, ready to be merged into a report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultFragment {
    /// Human readable rendering of the violation.
    pub text: String,
    /// The `sh:ValidationResult` node.
    pub node: BlankNode,
    /// All triples describing the violation, rooted at [`node`](Self::node).
    pub triples: Vec<Triple>,
}

/// What a shape reports about a target graph.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShapeOutcome {
    pub conforms: bool,
    pub results: Vec<ResultFragment>,
}

impl ShapeOutcome {
    /// An outcome without any result.
    pub fn conformant() -> Self {
        Self {
            conforms: true,
            results: Vec::new(),
        }
    }
}

/// A constraint definition that can be evaluated against a target graph.
pub trait Shape {
    /// The shape node in the shapes graph.
    fn id(&self) -> Term;

    /// Evaluates the shape against every focus node it selects in `target`.
    fn validate(&self, target: &Graph) -> Result<ShapeOutcome, ShapeError>;
}

/// Extracts the shapes declared in a shapes graph.
pub trait ShapeDiscovery {
    fn find_shapes(&self, shapes_graph: &Graph) -> Result<Vec<Box<dyn Shape>>, ShapeError>;
}

/// Severity of a validation result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Severity {
    #[default]
    Violation,
    Warning,
    Info,
}

impl Severity {
    pub fn iri(self) -> NamedNodeRef<'static> {
        use crate::vocab::sh;
        match self {
            Self::Violation => sh::VIOLATION,
            Self::Warning => sh::WARNING,
            Self::Info => sh::INFO,
        }
    }

    pub fn from_iri(iri: NamedNodeRef<'_>) -> Option<Self> {
        [Self::Violation, Self::Warning, Self::Info]
            .into_iter()
            .find(|s| s.iri() == iri)
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Violation => "Violation",
            Self::Warning => "Warning",
            Self::Info => "Info",
        })
    }
}
