//! Property paths of property shapes.
//!
//! Only predicate paths and inverse predicate paths (`[ sh:inversePath ex:p ]`) are supported.

use crate::error::ShapeError;
use crate::model::{as_node, object_of};
use crate::vocab::sh;
use oxrdf::{BlankNode, Graph, NamedNode, Term, TermRef, Triple};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PropertyPath {
    /// `ex:p`
    Predicate(NamedNode),
    /// `[ sh:inversePath ex:p ]`
    Inverse(NamedNode),
}

impl PropertyPath {
    /// Reads the path value of `shape` from the shapes graph.
    pub fn parse(graph: &Graph, shape: &Term, path: TermRef<'_>) -> Result<Self, ShapeError> {
        match path {
            TermRef::NamedNode(predicate) => Ok(Self::Predicate(predicate.into_owned())),
            TermRef::BlankNode(node) => {
                let node = Term::from(node.into_owned());
                match object_of(graph, &node, sh::INVERSE_PATH) {
                    Some(Term::NamedNode(predicate)) => Ok(Self::Inverse(predicate)),
                    _ => Err(ShapeError::unsupported_path(shape.clone(), node)),
                }
            }
            _ => Err(ShapeError::unsupported_path(shape.clone(), path.into_owned())),
        }
    }

    /// Returns the value nodes reached from `focus`.
    pub fn values(&self, graph: &Graph, focus: &Term) -> Vec<Term> {
        match self {
            Self::Predicate(predicate) => match as_node(focus) {
                Some(subject) => graph
                    .objects_for_subject_predicate(subject, predicate)
                    .map(TermRef::into_owned)
                    .collect(),
                None => Vec::new(),
            },
            Self::Inverse(predicate) => graph
                .subjects_for_predicate_object(predicate, focus)
                .map(|s| s.into_owned().into())
                .collect(),
        }
    }

    /// Encodes the path as an `sh:resultPath` value, pushing the auxiliary triples it needs.
    pub fn to_result_path(&self, triples: &mut Vec<Triple>) -> Term {
        match self {
            Self::Predicate(predicate) => predicate.clone().into(),
            Self::Inverse(predicate) => {
                let node = BlankNode::default();
                triples.push(Triple::new(node.clone(), sh::INVERSE_PATH, predicate.clone()));
                node.into()
            }
        }
    }
}

impl fmt::Display for PropertyPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Predicate(p) => write!(f, "{p}"),
            Self::Inverse(p) => write!(f, "^{p}"),
        }
    }
}
