//! Built-in shape discovery covering a subset of SHACL Core.
//!
//! [`CoreShapes`] reads node shapes and their `sh:property` shapes from a shapes graph.
//! Supported features:
//! - targets: `sh:targetClass`, `sh:targetNode`, `sh:targetSubjectsOf`, `sh:targetObjectsOf`
//!   and implicit class targets
//! - paths: predicates and `sh:inversePath`
//! - the constraint components listed in [`Constraint`]
//! - `sh:deactivated`, `sh:severity` and `sh:message`

use crate::constraint::{Constraint, NodeKind, Violation};
use crate::error::ShapeError;
use crate::path::PropertyPath;
use crate::shape::{ResultFragment, Severity, Shape, ShapeDiscovery, ShapeOutcome};
use crate::vocab::sh;
use oxrdf::vocab::{rdf, rdfs};
use oxrdf::{
    BlankNode, Graph, Literal, NamedNode, NamedNodeRef, NamedOrBlankNodeRef, Term, TermRef, Triple,
    TripleRef,
};
use regex::RegexBuilder;
use rustc_hash::FxHashSet;

/// Maximum nesting depth of `sh:property` shapes.
const MAX_NESTING_DEPTH: usize = 32;

/// Shape discovery for the SHACL Core subset implemented by [`CoreShape`].
///
/// Shapes are returned sorted by their term so that reports are reproducible.
#[derive(Debug, Clone, Copy, Default)]
pub struct CoreShapes;

impl ShapeDiscovery for CoreShapes {
    fn find_shapes(&self, shapes_graph: &Graph) -> Result<Vec<Box<dyn Shape>>, ShapeError> {
        let mut seen = FxHashSet::default();
        let mut ids = Vec::new();
        let mut candidate = |node: NamedOrBlankNodeRef<'_>| {
            let id = Term::from(node.into_owned());
            if seen.insert(id.clone()) {
                ids.push(id);
            }
        };
        for node in shapes_graph.subjects_for_predicate_object(rdf::TYPE, sh::NODE_SHAPE) {
            candidate(node);
        }
        for node in shapes_graph.subjects_for_predicate_object(rdf::TYPE, sh::PROPERTY_SHAPE) {
            if shapes_graph.object_for_subject_predicate(node, sh::PATH).is_some() {
                candidate(node);
            }
        }
        for target in [
            sh::TARGET_CLASS,
            sh::TARGET_NODE,
            sh::TARGET_SUBJECTS_OF,
            sh::TARGET_OBJECTS_OF,
        ] {
            for t in shapes_graph.triples_for_predicate(target) {
                candidate(t.subject);
            }
        }
        ids.sort_by_cached_key(ToString::to_string);

        ids.into_iter()
            .map(|id| -> Result<Box<dyn Shape>, ShapeError> {
                Ok(Box::new(CoreShape::parse(shapes_graph, id, 0)?))
            })
            .collect()
    }
}

/// How a shape selects its focus nodes in the data graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    /// Instances of the class and of its subclasses.
    Class(NamedNode),
    Node(Term),
    SubjectsOf(NamedNode),
    ObjectsOf(NamedNode),
}

impl Target {
    fn focus_nodes(&self, data: &Graph, out: &mut Vec<Term>) {
        match self {
            Self::Class(class) => {
                for class in class_hierarchy(data, class) {
                    out.extend(
                        data.subjects_for_predicate_object(rdf::TYPE, &class)
                            .map(|s| Term::from(s.into_owned())),
                    );
                }
            }
            Self::Node(node) => out.push(node.clone()),
            Self::SubjectsOf(predicate) => out.extend(
                data.triples_for_predicate(predicate)
                    .map(|t| Term::from(t.subject.into_owned())),
            ),
            Self::ObjectsOf(predicate) => out.extend(
                data.triples_for_predicate(predicate)
                    .map(|t| t.object.into_owned()),
            ),
        }
    }
}

/// A class and all its subclasses in `graph`.
fn class_hierarchy(graph: &Graph, class: &NamedNode) -> Vec<Term> {
    let mut classes = vec![Term::from(class.clone())];
    let mut to_check = classes.clone();
    while let Some(current) = to_check.pop() {
        for subclass in graph.subjects_for_predicate_object(rdfs::SUB_CLASS_OF, &current) {
            let subclass = Term::from(subclass.into_owned());
            if !classes.contains(&subclass) {
                classes.push(subclass.clone());
                to_check.push(subclass);
            }
        }
    }
    classes
}

/// A node shape or a property shape read by [`CoreShapes`].
#[derive(Debug, Clone)]
pub struct CoreShape {
    id: Term,
    targets: Vec<Target>,
    path: Option<PropertyPath>,
    constraints: Vec<Constraint>,
    properties: Vec<CoreShape>,
    severity: Severity,
    deactivated: bool,
    message: Option<String>,
}

impl CoreShape {
    fn parse(graph: &Graph, id: Term, depth: usize) -> Result<Self, ShapeError> {
        if depth > MAX_NESTING_DEPTH {
            return Err(ShapeError::invalid_shape(id, "sh:property shapes are nested too deeply"));
        }
        let path = object_of(graph, &id, sh::PATH)
            .map(|path| PropertyPath::parse(graph, &id, path.as_ref()))
            .transpose()?;
        let mut shape = Self {
            targets: Vec::new(),
            path,
            constraints: Vec::new(),
            properties: Vec::new(),
            severity: Severity::Violation,
            deactivated: false,
            message: None,
            id,
        };
        if depth == 0 {
            shape.parse_targets(graph)?;
        }
        shape.parse_constraints(graph)?;
        shape.parse_metadata(graph)?;
        for property in objects_of(graph, &shape.id, sh::PROPERTY) {
            if object_of(graph, &property, sh::PATH).is_none() {
                return Err(ShapeError::invalid_shape(property, "a property shape must have a sh:path"));
            }
            shape.properties.push(Self::parse(graph, property, depth + 1)?);
        }
        Ok(shape)
    }

    fn parse_targets(&mut self, graph: &Graph) -> Result<(), ShapeError> {
        for class in objects_of(graph, &self.id, sh::TARGET_CLASS) {
            let class = self.named_parameter(sh::TARGET_CLASS, class)?;
            self.targets.push(Target::Class(class));
        }
        for node in objects_of(graph, &self.id, sh::TARGET_NODE) {
            self.targets.push(Target::Node(node));
        }
        for predicate in objects_of(graph, &self.id, sh::TARGET_SUBJECTS_OF) {
            let predicate = self.named_parameter(sh::TARGET_SUBJECTS_OF, predicate)?;
            self.targets.push(Target::SubjectsOf(predicate));
        }
        for predicate in objects_of(graph, &self.id, sh::TARGET_OBJECTS_OF) {
            let predicate = self.named_parameter(sh::TARGET_OBJECTS_OF, predicate)?;
            self.targets.push(Target::ObjectsOf(predicate));
        }
        if let Term::NamedNode(id) = &self.id {
            if graph.contains(TripleRef::new(id.as_ref(), rdf::TYPE, rdfs::CLASS)) {
                self.targets.push(Target::Class(id.clone()));
            }
        }
        Ok(())
    }

    fn parse_constraints(&mut self, graph: &Graph) -> Result<(), ShapeError> {
        if let Some(value) = object_of(graph, &self.id, sh::MIN_COUNT) {
            let min = self.integer_parameter(sh::MIN_COUNT, value)?;
            self.constraints.push(Constraint::MinCount(min));
        }
        if let Some(value) = object_of(graph, &self.id, sh::MAX_COUNT) {
            let max = self.integer_parameter(sh::MAX_COUNT, value)?;
            self.constraints.push(Constraint::MaxCount(max));
        }
        for class in objects_of(graph, &self.id, sh::CLASS) {
            let class = self.named_parameter(sh::CLASS, class)?;
            self.constraints.push(Constraint::Class(class));
        }
        if let Some(value) = object_of(graph, &self.id, sh::DATATYPE) {
            let datatype = self.named_parameter(sh::DATATYPE, value)?;
            self.constraints.push(Constraint::Datatype(datatype));
        }
        if let Some(value) = object_of(graph, &self.id, sh::NODE_KIND) {
            let kind = match &value {
                Term::NamedNode(n) => NodeKind::from_iri(n.as_ref()),
                _ => None,
            }
            .ok_or_else(|| {
                ShapeError::invalid_parameter(self.id.clone(), sh::NODE_KIND, "a SHACL node kind", value)
            })?;
            self.constraints.push(Constraint::NodeKind(kind));
        }
        for value in objects_of(graph, &self.id, sh::HAS_VALUE) {
            self.constraints.push(Constraint::HasValue(value));
        }
        if let Some(list) = object_of(graph, &self.id, sh::IN) {
            let values = parse_list(graph, &self.id, list)?;
            self.constraints.push(Constraint::In(values));
        }
        if let Some(value) = object_of(graph, &self.id, sh::MIN_LENGTH) {
            let min = self.integer_parameter(sh::MIN_LENGTH, value)?;
            self.constraints.push(Constraint::MinLength(min));
        }
        if let Some(value) = object_of(graph, &self.id, sh::MAX_LENGTH) {
            let max = self.integer_parameter(sh::MAX_LENGTH, value)?;
            self.constraints.push(Constraint::MaxLength(max));
        }
        if let Some(value) = object_of(graph, &self.id, sh::PATTERN) {
            let Term::Literal(pattern) = value else {
                return Err(ShapeError::invalid_parameter(
                    self.id.clone(),
                    sh::PATTERN,
                    "a string literal",
                    value,
                ));
            };
            let flags = match object_of(graph, &self.id, sh::FLAGS) {
                Some(Term::Literal(flags)) => flags.value().to_owned(),
                Some(other) => {
                    return Err(ShapeError::invalid_parameter(
                        self.id.clone(),
                        sh::FLAGS,
                        "a string literal",
                        other,
                    ));
                }
                None => String::new(),
            };
            let regex = RegexBuilder::new(pattern.value())
                .case_insensitive(flags.contains('i'))
                .multi_line(flags.contains('m'))
                .dot_matches_new_line(flags.contains('s'))
                .ignore_whitespace(flags.contains('x'))
                .build()
                .map_err(|e| ShapeError::invalid_regex(pattern.value(), e.to_string()))?;
            self.constraints.push(Constraint::Pattern {
                pattern: pattern.value().to_owned(),
                regex,
            });
        }
        Ok(())
    }

    fn parse_metadata(&mut self, graph: &Graph) -> Result<(), ShapeError> {
        if let Some(value) = object_of(graph, &self.id, sh::DEACTIVATED) {
            self.deactivated = match &value {
                Term::Literal(l) if matches!(l.value(), "true" | "1") => true,
                Term::Literal(l) if matches!(l.value(), "false" | "0") => false,
                _ => {
                    return Err(ShapeError::invalid_parameter(
                        self.id.clone(),
                        sh::DEACTIVATED,
                        "a boolean",
                        value,
                    ));
                }
            };
        }
        if let Some(value) = object_of(graph, &self.id, sh::SEVERITY) {
            self.severity = match &value {
                Term::NamedNode(n) => Severity::from_iri(n.as_ref()),
                _ => None,
            }
            .ok_or_else(|| {
                ShapeError::invalid_parameter(
                    self.id.clone(),
                    sh::SEVERITY,
                    "sh:Violation, sh:Warning or sh:Info",
                    value,
                )
            })?;
        }
        if let Some(Term::Literal(message)) = object_of(graph, &self.id, sh::MESSAGE) {
            self.message = Some(message.value().to_owned());
        }
        Ok(())
    }

    fn named_parameter(&self, parameter: NamedNodeRef<'_>, value: Term) -> Result<NamedNode, ShapeError> {
        match value {
            Term::NamedNode(n) => Ok(n),
            other => Err(ShapeError::invalid_parameter(self.id.clone(), parameter, "an IRI", other)),
        }
    }

    fn integer_parameter(&self, parameter: NamedNodeRef<'_>, value: Term) -> Result<usize, ShapeError> {
        if let Term::Literal(l) = &value {
            if let Ok(n) = l.value().parse() {
                return Ok(n);
            }
        }
        Err(ShapeError::invalid_parameter(
            self.id.clone(),
            parameter,
            "a non-negative integer",
            value,
        ))
    }

    /// The property shapes evaluated as part of this shape.
    pub fn properties(&self) -> &[CoreShape] {
        &self.properties
    }

    pub fn targets(&self) -> &[Target] {
        &self.targets
    }

    fn focus_nodes(&self, data: &Graph) -> Vec<Term> {
        let mut nodes = Vec::new();
        for target in &self.targets {
            target.focus_nodes(data, &mut nodes);
        }
        nodes.sort_by_cached_key(ToString::to_string);
        nodes.dedup();
        nodes
    }

    /// Evaluates the shape on one focus node, returns whether no violation-level result was found.
    fn evaluate(&self, data: &Graph, focus: &Term, results: &mut Vec<ResultFragment>) -> bool {
        if self.deactivated {
            return true;
        }
        let values = match &self.path {
            Some(path) => path.values(data, focus),
            None => vec![focus.clone()],
        };
        let mut conforms = true;
        for constraint in &self.constraints {
            for violation in constraint.check(data, &values) {
                results.push(self.fragment(focus, constraint, violation));
                conforms &= self.severity != Severity::Violation;
            }
        }
        for property in &self.properties {
            for value in property_focus(&self.path, focus, &values) {
                conforms &= property.evaluate(data, value, results);
            }
        }
        conforms
    }

    fn fragment(&self, focus: &Term, constraint: &Constraint, violation: Violation) -> ResultFragment {
        let node = BlankNode::default();
        let mut triples = vec![
            Triple::new(node.clone(), rdf::TYPE, sh::VALIDATION_RESULT),
            Triple::new(node.clone(), sh::FOCUS_NODE, focus.clone()),
        ];
        let result_path = self.path.as_ref().map(|path| {
            let term = path.to_result_path(&mut triples);
            triples.push(Triple::new(node.clone(), sh::RESULT_PATH, term));
            path
        });
        if let Some(value) = &violation.value {
            triples.push(Triple::new(node.clone(), sh::VALUE, value.clone()));
        }
        let message = self.message.clone().unwrap_or(violation.message);
        triples.extend([
            Triple::new(node.clone(), sh::SOURCE_SHAPE, self.id.clone()),
            Triple::new(node.clone(), sh::SOURCE_CONSTRAINT_COMPONENT, constraint.component()),
            Triple::new(node.clone(), sh::RESULT_SEVERITY, self.severity.iri()),
            Triple::new(node.clone(), sh::RESULT_MESSAGE, Literal::from(message.as_str())),
        ]);

        let mut lines = vec![
            format!(
                "Constraint Violation in {} ({}):\n",
                constraint.name(),
                constraint.component().as_str()
            ),
            format!("\tSeverity: sh:{}\n", self.severity),
            format!("\tSource Shape: {}\n", self.id),
            format!("\tFocus Node: {focus}\n"),
        ];
        if let Some(value) = &violation.value {
            lines.push(format!("\tValue Node: {value}\n"));
        }
        if let Some(path) = result_path {
            lines.push(format!("\tResult Path: {path}\n"));
        }
        lines.push(format!("\tMessage: {message}\n"));
        let text = lines.concat();
        ResultFragment {
            text,
            node,
            triples,
        }
    }
}

/// Property shapes nested in a node shape apply to the focus node, nested in a property shape
/// they apply to each value node.
fn property_focus<'a>(
    path: &Option<PropertyPath>,
    focus: &'a Term,
    values: &'a [Term],
) -> &'a [Term] {
    if path.is_some() {
        values
    } else {
        std::slice::from_ref(focus)
    }
}

impl Shape for CoreShape {
    fn id(&self) -> Term {
        self.id.clone()
    }

    fn validate(&self, target: &Graph) -> Result<ShapeOutcome, ShapeError> {
        let mut outcome = ShapeOutcome::conformant();
        if self.deactivated {
            return Ok(outcome);
        }
        for focus in self.focus_nodes(target) {
            outcome.conforms &= self.evaluate(target, &focus, &mut outcome.results);
        }
        Ok(outcome)
    }
}

pub(crate) fn as_node(term: &Term) -> Option<NamedOrBlankNodeRef<'_>> {
    as_node_ref(term.as_ref())
}

pub(crate) fn as_node_ref(term: TermRef<'_>) -> Option<NamedOrBlankNodeRef<'_>> {
    match term {
        TermRef::NamedNode(n) => Some(n.into()),
        TermRef::BlankNode(b) => Some(b.into()),
        _ => None,
    }
}

pub(crate) fn object_of(graph: &Graph, subject: &Term, predicate: NamedNodeRef<'_>) -> Option<Term> {
    graph
        .object_for_subject_predicate(as_node(subject)?, predicate)
        .map(TermRef::into_owned)
}

pub(crate) fn objects_of(graph: &Graph, subject: &Term, predicate: NamedNodeRef<'_>) -> Vec<Term> {
    match as_node(subject) {
        Some(node) => graph
            .objects_for_subject_predicate(node, predicate)
            .map(TermRef::into_owned)
            .collect(),
        None => Vec::new(),
    }
}

/// Reads an RDF collection.
fn parse_list(graph: &Graph, shape: &Term, head: Term) -> Result<Vec<Term>, ShapeError> {
    let mut items = Vec::new();
    let mut visited = FxHashSet::default();
    let mut current = head;
    while !matches!(&current, Term::NamedNode(n) if n.as_ref() == rdf::NIL) {
        if !visited.insert(current.clone()) {
            return Err(ShapeError::invalid_shape(shape.clone(), "cyclic RDF list"));
        }
        let first = object_of(graph, &current, rdf::FIRST)
            .ok_or_else(|| ShapeError::invalid_shape(shape.clone(), "RDF list without rdf:first"))?;
        items.push(first);
        current = object_of(graph, &current, rdf::REST)
            .ok_or_else(|| ShapeError::invalid_shape(shape.clone(), "RDF list without rdf:rest"))?;
    }
    Ok(items)
}

#[cfg(test)]
mod tests {
    use super::*;
    use oxrdfio::{RdfFormat, RdfParser};

    fn turtle(data: &str) -> Graph {
        let mut graph = Graph::new();
        for quad in RdfParser::from_format(RdfFormat::Turtle).for_slice(data.as_bytes()) {
            graph.insert(quad.unwrap().as_ref());
        }
        graph
    }

    const PREFIXES: &str = "@prefix sh: <http://www.w3.org/ns/shacl#> .\n\
        @prefix rdfs: <http://www.w3.org/2000/01/rdf-schema#> .\n\
        @prefix xsd: <http://www.w3.org/2001/XMLSchema#> .\n\
        @prefix ex: <http://example.org/> .\n";

    fn shapes(body: &str) -> Vec<Box<dyn Shape>> {
        CoreShapes.find_shapes(&turtle(&format!("{PREFIXES}{body}"))).unwrap()
    }

    fn data(body: &str) -> Graph {
        turtle(&format!("{PREFIXES}{body}"))
    }

    #[test]
    fn test_empty_shapes_graph() {
        assert!(CoreShapes.find_shapes(&Graph::new()).unwrap().is_empty());
    }

    #[test]
    fn test_discovery_is_sorted() {
        let found = shapes(
            "ex:B a sh:NodeShape .
             ex:A sh:targetNode ex:x .
             ex:C a sh:PropertyShape ; sh:path ex:p .
             ex:D a sh:PropertyShape .",
        );
        let ids: Vec<String> = found.iter().map(|s| s.id().to_string()).collect();
        assert_eq!(
            ids,
            [
                "<http://example.org/A>",
                "<http://example.org/B>",
                "<http://example.org/C>"
            ]
        );
    }

    #[test]
    fn test_min_count_violation() {
        let found = shapes(
            "ex:PersonShape a sh:NodeShape ;
                sh:targetClass ex:Person ;
                sh:property [ sh:path ex:name ; sh:minCount 1 ] .",
        );
        let outcome = found[0]
            .validate(&data("ex:alice a ex:Person . ex:bob a ex:Person ; ex:name \"Bob\" ."))
            .unwrap();

        assert!(!outcome.conforms);
        assert_eq!(outcome.results.len(), 1);
        let result = &outcome.results[0];
        assert!(result.text.starts_with(
            "Constraint Violation in MinCountConstraintComponent (http://www.w3.org/ns/shacl#MinCountConstraintComponent):\n"
        ));
        assert!(result.text.contains("\tFocus Node: <http://example.org/alice>\n"));
        assert!(result.text.contains("\tResult Path: <http://example.org/name>\n"));
        assert!(result.triples.contains(&Triple::new(
            result.node.clone(),
            sh::FOCUS_NODE,
            NamedNode::new("http://example.org/alice").unwrap()
        )));
        assert!(result.triples.contains(&Triple::new(
            result.node.clone(),
            sh::SOURCE_CONSTRAINT_COMPONENT,
            sh::MIN_COUNT_CONSTRAINT_COMPONENT
        )));
    }

    #[test]
    fn test_implicit_class_target_and_subclasses() {
        let found = shapes(
            "ex:Person a sh:NodeShape, rdfs:Class ;
                sh:property [ sh:path ex:age ; sh:datatype xsd:integer ] .",
        );
        let outcome = found[0]
            .validate(&data(
                "ex:Student rdfs:subClassOf ex:Person .
                 ex:bob a ex:Student ; ex:age \"old\" .",
            ))
            .unwrap();
        assert_eq!(outcome.results.len(), 1);
        assert!(outcome.results[0].text.contains("\tValue Node: \"old\"\n"));
    }

    #[test]
    fn test_severity_is_per_shape_and_deactivated_shapes_are_skipped() {
        let found = shapes(
            "ex:S sh:targetNode ex:x ;
                sh:severity sh:Warning ;
                sh:message \"Needs a label\" ;
                sh:property [ sh:path rdfs:label ; sh:minCount 1 ] .
             ex:T sh:targetNode ex:x ;
                sh:deactivated true ;
                sh:property [ sh:path rdfs:label ; sh:minCount 1 ] .",
        );
        let graph = data("ex:x ex:p ex:y .");

        let warning = found[0].validate(&graph).unwrap();
        assert!(!warning.conforms);
        let deactivated = found[1].validate(&graph).unwrap();
        assert!(deactivated.conforms);
        assert!(deactivated.results.is_empty());
    }

    #[test]
    fn test_node_level_warning_conforms() {
        let found = shapes(
            "ex:S sh:targetNode ex:x ;
                sh:severity sh:Warning ;
                sh:message \"Should be a literal\" ;
                sh:nodeKind sh:Literal .",
        );
        let outcome = found[0].validate(&data("ex:x ex:p ex:y .")).unwrap();
        assert!(outcome.conforms);
        assert_eq!(outcome.results.len(), 1);
        assert!(outcome.results[0].text.contains("\tSeverity: sh:Warning\n"));
        assert!(outcome.results[0].text.contains("\tMessage: Should be a literal\n"));
    }

    #[test]
    fn test_in_pattern_and_inverse_path() {
        let found = shapes(
            "ex:S sh:targetNode ex:x ;
                sh:property [ sh:path ex:color ; sh:in ( ex:red ex:green ) ] ;
                sh:property [ sh:path ex:code ; sh:pattern \"^[a-z]+$\" ; sh:flags \"i\" ] ;
                sh:property [ sh:path [ sh:inversePath ex:owns ] ; sh:maxCount 1 ] .",
        );
        let outcome = found[0]
            .validate(&data(
                "ex:x ex:color ex:red, ex:blue ; ex:code \"ABC\", \"A1\" .
                 ex:a ex:owns ex:x . ex:b ex:owns ex:x .",
            ))
            .unwrap();
        assert!(!outcome.conforms);
        assert_eq!(outcome.results.len(), 3);
        assert!(
            outcome
                .results
                .iter()
                .any(|r| r.text.contains("\tResult Path: ^<http://example.org/owns>\n"))
        );
    }

    #[test]
    fn test_malformed_parameters() {
        let graph = data("ex:S sh:targetNode ex:x ; sh:minCount \"many\" .");
        assert!(matches!(
            CoreShapes.find_shapes(&graph),
            Err(ShapeError::InvalidParameter { .. })
        ));
        let graph = data("ex:S sh:targetNode ex:x ; sh:pattern \"(\" .");
        assert!(matches!(
            CoreShapes.find_shapes(&graph),
            Err(ShapeError::InvalidRegex { .. })
        ));
        let graph = data("ex:S sh:targetNode ex:x ; sh:property [ sh:minCount 1 ] .");
        assert!(matches!(
            CoreShapes.find_shapes(&graph),
            Err(ShapeError::InvalidShape { .. })
        ));
    }
}
