//! The SHACL Core constraint components evaluated by [`CoreShapes`](crate::CoreShapes).

use crate::model::{as_node, as_node_ref};
use crate::vocab::sh;
use oxrdf::vocab::{rdf, rdfs};
use oxrdf::{Graph, NamedNode, NamedNodeRef, Term, TermRef};
use regex::Regex;
use rustc_hash::FxHashSet;

/// A constraint of a shape, with its parameters already validated.
#[derive(Debug, Clone)]
pub enum Constraint {
    /// sh:minCount
    MinCount(usize),
    /// sh:maxCount
    MaxCount(usize),
    /// sh:class, satisfied by instances of subclasses too.
    Class(NamedNode),
    /// sh:datatype
    Datatype(NamedNode),
    /// sh:nodeKind
    NodeKind(NodeKind),
    /// sh:hasValue
    HasValue(Term),
    /// sh:in
    In(Vec<Term>),
    /// sh:minLength
    MinLength(usize),
    /// sh:maxLength
    MaxLength(usize),
    /// sh:pattern, compiled with its sh:flags.
    Pattern { pattern: String, regex: Regex },
}

/// A value node, or a focus node for count-like constraints, that fails a constraint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    pub value: Option<Term>,
    pub message: String,
}

impl Constraint {
    /// The IRI of the constraint component.
    pub fn component(&self) -> NamedNodeRef<'static> {
        match self {
            Self::MinCount(_) => sh::MIN_COUNT_CONSTRAINT_COMPONENT,
            Self::MaxCount(_) => sh::MAX_COUNT_CONSTRAINT_COMPONENT,
            Self::Class(_) => sh::CLASS_CONSTRAINT_COMPONENT,
            Self::Datatype(_) => sh::DATATYPE_CONSTRAINT_COMPONENT,
            Self::NodeKind(_) => sh::NODE_KIND_CONSTRAINT_COMPONENT,
            Self::HasValue(_) => sh::HAS_VALUE_CONSTRAINT_COMPONENT,
            Self::In(_) => sh::IN_CONSTRAINT_COMPONENT,
            Self::MinLength(_) => sh::MIN_LENGTH_CONSTRAINT_COMPONENT,
            Self::MaxLength(_) => sh::MAX_LENGTH_CONSTRAINT_COMPONENT,
            Self::Pattern { .. } => sh::PATTERN_CONSTRAINT_COMPONENT,
        }
    }

    /// The component name as shown in the report text.
    pub fn name(&self) -> &'static str {
        match self {
            Self::MinCount(_) => "MinCountConstraintComponent",
            Self::MaxCount(_) => "MaxCountConstraintComponent",
            Self::Class(_) => "ClassConstraintComponent",
            Self::Datatype(_) => "DatatypeConstraintComponent",
            Self::NodeKind(_) => "NodeKindConstraintComponent",
            Self::HasValue(_) => "HasValueConstraintComponent",
            Self::In(_) => "InConstraintComponent",
            Self::MinLength(_) => "MinLengthConstraintComponent",
            Self::MaxLength(_) => "MaxLengthConstraintComponent",
            Self::Pattern { .. } => "PatternConstraintComponent",
        }
    }

    /// Checks the value nodes of one focus node.
    pub fn check(&self, data: &Graph, values: &[Term]) -> Vec<Violation> {
        match self {
            Self::MinCount(min) => {
                if values.len() < *min {
                    vec![Violation {
                        value: None,
                        message: format!("Less than {min} values, got {}", values.len()),
                    }]
                } else {
                    Vec::new()
                }
            }
            Self::MaxCount(max) => {
                if values.len() > *max {
                    vec![Violation {
                        value: None,
                        message: format!("More than {max} values, got {}", values.len()),
                    }]
                } else {
                    Vec::new()
                }
            }
            Self::HasValue(expected) => {
                if values.contains(expected) {
                    Vec::new()
                } else {
                    vec![Violation {
                        value: None,
                        message: format!("Missing expected value {expected}"),
                    }]
                }
            }
            Self::Class(class) => each_failing(values, |v| is_instance_of(data, v, class), |v| {
                format!("Value {v} is not an instance of {class}")
            }),
            Self::Datatype(datatype) => each_failing(
                values,
                |v| matches!(v, Term::Literal(l) if l.datatype() == datatype.as_ref()),
                |v| format!("Value {v} does not have datatype {datatype}"),
            ),
            Self::NodeKind(kind) => each_failing(values, |v| kind.matches(v), |v| {
                format!("Value {v} is not of node kind {}", kind.iri())
            }),
            Self::In(allowed) => each_failing(values, |v| allowed.contains(v), |v| {
                format!("Value {v} is not in the list of allowed values")
            }),
            Self::MinLength(min) => each_failing(
                values,
                |v| string_value(v).is_some_and(|s| s.chars().count() >= *min),
                |v| format!("Value {v} is shorter than {min} characters"),
            ),
            Self::MaxLength(max) => each_failing(
                values,
                |v| string_value(v).is_some_and(|s| s.chars().count() <= *max),
                |v| format!("Value {v} is longer than {max} characters"),
            ),
            Self::Pattern { pattern, regex } => each_failing(
                values,
                |v| string_value(v).is_some_and(|s| regex.is_match(s)),
                |v| format!("Value {v} does not match pattern \"{pattern}\""),
            ),
        }
    }
}

fn each_failing(
    values: &[Term],
    accept: impl Fn(&Term) -> bool,
    message: impl Fn(&Term) -> String,
) -> Vec<Violation> {
    values
        .iter()
        .filter(|&v| !accept(v))
        .map(|v| Violation {
            value: Some(v.clone()),
            message: message(v),
        })
        .collect()
}

/// The lexical form used by string constraints, blank nodes have none.
fn string_value(term: &Term) -> Option<&str> {
    match term {
        Term::NamedNode(n) => Some(n.as_str()),
        Term::Literal(l) => Some(l.value()),
        _ => None,
    }
}

/// Whether `term` has `class` or one of its subclasses as `rdf:type` in `graph`.
fn is_instance_of(graph: &Graph, term: &Term, class: &NamedNode) -> bool {
    let Some(node) = as_node(term) else {
        return false;
    };
    let target = TermRef::from(class.as_ref());
    let mut visited = FxHashSet::default();
    let mut to_check: Vec<TermRef<'_>> = graph.objects_for_subject_predicate(node, rdf::TYPE).collect();
    while let Some(current) = to_check.pop() {
        if current == target {
            return true;
        }
        if !visited.insert(current) {
            continue;
        }
        let Some(current_node) = as_node_ref(current) else {
            continue;
        };
        to_check.extend(graph.objects_for_subject_predicate(current_node, rdfs::SUB_CLASS_OF));
    }
    false
}

/// Values of sh:nodeKind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Iri,
    BlankNode,
    Literal,
    BlankNodeOrIri,
    BlankNodeOrLiteral,
    IriOrLiteral,
}

impl NodeKind {
    const ALL: [Self; 6] = [
        Self::Iri,
        Self::BlankNode,
        Self::Literal,
        Self::BlankNodeOrIri,
        Self::BlankNodeOrLiteral,
        Self::IriOrLiteral,
    ];

    pub fn iri(self) -> NamedNodeRef<'static> {
        match self {
            Self::Iri => sh::IRI,
            Self::BlankNode => sh::BLANK_NODE,
            Self::Literal => sh::LITERAL,
            Self::BlankNodeOrIri => sh::BLANK_NODE_OR_IRI,
            Self::BlankNodeOrLiteral => sh::BLANK_NODE_OR_LITERAL,
            Self::IriOrLiteral => sh::IRI_OR_LITERAL,
        }
    }

    pub fn from_iri(iri: NamedNodeRef<'_>) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.iri() == iri)
    }

    pub fn matches(self, term: &Term) -> bool {
        match self {
            Self::Iri => matches!(term, Term::NamedNode(_)),
            Self::BlankNode => matches!(term, Term::BlankNode(_)),
            Self::Literal => matches!(term, Term::Literal(_)),
            Self::BlankNodeOrIri => matches!(term, Term::NamedNode(_) | Term::BlankNode(_)),
            Self::BlankNodeOrLiteral => matches!(term, Term::BlankNode(_) | Term::Literal(_)),
            Self::IriOrLiteral => matches!(term, Term::NamedNode(_) | Term::Literal(_)),
        }
    }
}
