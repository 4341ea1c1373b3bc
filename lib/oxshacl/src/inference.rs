//! Deductive closure of the data graph before validation.
//!
//! The inference selector is parsed once into an [`InferenceMode`]. The [`InferenceRunner`]
//! maps it to a [`Closure`] strategy and expands the data graph in place.
//!
//! The built-in strategy is [`RuleClosure`], a naive forward chainer over triple-pattern rules:
//! - [`Semantics::Rdfs`] applies RDFS entailment (rdf1, rdfs2, rdfs3, rdfs5, rdfs6, rdfs7,
//!   rdfs9, rdfs10, rdfs11) without the RDFS axiomatic triples.
//! - [`Semantics::OwlRl`] applies the OWL 2 RL rules expressible as triple rules
//!   (prp-dom, prp-rng, prp-spo1, prp-symp, prp-trp, prp-inv1/2, prp-eqp1/2, cax-sco,
//!   cax-eqc1/2, eq-sym, eq-trans, scm-sco, scm-spo).
//! - [`Semantics::RdfsOwlRl`] applies both.

use crate::error::InferenceError;
use crate::model::as_node_ref;
use crate::vocab::owl;
use oxrdf::vocab::{rdf, rdfs};
use oxrdf::{Graph, NamedNodeRef, NamedOrBlankNodeRef, TermRef, Triple};
use std::fmt;
use std::str::FromStr;
use std::time::{Duration, Instant};
use tracing::{debug, error, info};

/// Which closure, if any, to compute on the data graph before validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum InferenceMode {
    /// No inference.
    #[default]
    None,
    /// RDFS entailment.
    Rdfs,
    /// OWL 2 RL entailment.
    OwlRl,
    /// RDFS and OWL 2 RL entailment together.
    Combined,
}

impl InferenceMode {
    /// The closure semantics this mode selects, `None` for [`InferenceMode::None`].
    pub fn semantics(self) -> Option<Semantics> {
        match self {
            Self::None => None,
            Self::Rdfs => Some(Semantics::Rdfs),
            Self::OwlRl => Some(Semantics::OwlRl),
            Self::Combined => Some(Semantics::RdfsOwlRl),
        }
    }
}

impl FromStr for InferenceMode {
    type Err = InferenceError;

    /// Parses an inference selector.
    ///
    /// Matching is case-sensitive, `both`, `all` and `rdfsowlrl` are aliases.
    fn from_str(mode: &str) -> Result<Self, Self::Err> {
        match mode {
            "none" => Ok(Self::None),
            "rdfs" => Ok(Self::Rdfs),
            "owlrl" => Ok(Self::OwlRl),
            "both" | "all" | "rdfsowlrl" => Ok(Self::Combined),
            _ => {
                error!(mode, "Unsupported inference mode");
                Err(InferenceError::unsupported_mode(mode))
            }
        }
    }
}

impl fmt::Display for InferenceMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::None => "none",
            Self::Rdfs => "rdfs",
            Self::OwlRl => "owlrl",
            Self::Combined => "rdfsowlrl",
        })
    }
}

/// A closure rule set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Semantics {
    Rdfs,
    OwlRl,
    RdfsOwlRl,
}

impl Semantics {
    /// The rules of this semantics, without duplicates.
    pub fn rules(self) -> Vec<Rule> {
        const RDFS: [Rule; 9] = [
            Rule::PropertyTyping,
            Rule::Domain,
            Rule::Range,
            Rule::SubPropertyTransitivity,
            Rule::SubPropertyReflexivity,
            Rule::SubPropertyInheritance,
            Rule::SubClassInheritance,
            Rule::SubClassReflexivity,
            Rule::SubClassTransitivity,
        ];
        const OWL_RL: [Rule; 13] = [
            Rule::Domain,
            Rule::Range,
            Rule::SubPropertyInheritance,
            Rule::Symmetric,
            Rule::Transitive,
            Rule::Inverse,
            Rule::EquivalentProperty,
            Rule::SubClassInheritance,
            Rule::EquivalentClass,
            Rule::SameAsSymmetry,
            Rule::SameAsTransitivity,
            Rule::SubClassTransitivity,
            Rule::SubPropertyTransitivity,
        ];
        let mut rules = Vec::new();
        if matches!(self, Self::Rdfs | Self::RdfsOwlRl) {
            rules.extend(RDFS);
        }
        if matches!(self, Self::OwlRl | Self::RdfsOwlRl) {
            for rule in OWL_RL {
                if !rules.contains(&rule) {
                    rules.push(rule);
                }
            }
        }
        rules
    }
}

impl fmt::Display for Semantics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Rdfs => "RDFS",
            Self::OwlRl => "OWL-RL",
            Self::RdfsOwlRl => "RDFS+OWL-RL",
        })
    }
}

/// An entailment rule over triple patterns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Rule {
    /// rdf1: `?s ?p ?o` ⇒ `?p a rdf:Property`
    PropertyTyping,
    /// rdfs2 / prp-dom
    Domain,
    /// rdfs3 / prp-rng
    Range,
    /// rdfs5 / scm-spo
    SubPropertyTransitivity,
    /// rdfs6: `?p a rdf:Property` ⇒ `?p rdfs:subPropertyOf ?p`
    SubPropertyReflexivity,
    /// rdfs7 / prp-spo1
    SubPropertyInheritance,
    /// rdfs9 / cax-sco
    SubClassInheritance,
    /// rdfs10: `?c a rdfs:Class` ⇒ `?c rdfs:subClassOf ?c`
    SubClassReflexivity,
    /// rdfs11 / scm-sco
    SubClassTransitivity,
    /// prp-symp
    Symmetric,
    /// prp-trp
    Transitive,
    /// prp-inv1 and prp-inv2
    Inverse,
    /// prp-eqp1 and prp-eqp2
    EquivalentProperty,
    /// cax-eqc1 and cax-eqc2
    EquivalentClass,
    /// eq-sym
    SameAsSymmetry,
    /// eq-trans
    SameAsTransitivity,
}

impl Rule {
    /// Returns the triples this rule derives from `graph`, including already present ones.
    fn apply(self, graph: &Graph, out: &mut Vec<Triple>) {
        match self {
            Self::PropertyTyping => {
                for t in graph {
                    out.push(Triple::new(t.predicate.into_owned(), rdf::TYPE, rdf::PROPERTY));
                }
            }
            Self::Domain => {
                for decl in graph.triples_for_predicate(rdfs::DOMAIN) {
                    let Some(property) = named(decl.subject) else {
                        continue;
                    };
                    for t in graph.triples_for_predicate(property) {
                        out.push(Triple::new(t.subject.into_owned(), rdf::TYPE, decl.object.into_owned()));
                    }
                }
            }
            Self::Range => {
                for decl in graph.triples_for_predicate(rdfs::RANGE) {
                    let Some(property) = named(decl.subject) else {
                        continue;
                    };
                    for t in graph.triples_for_predicate(property) {
                        if let Some(object) = as_node_ref(t.object) {
                            out.push(Triple::new(object.into_owned(), rdf::TYPE, decl.object.into_owned()));
                        }
                    }
                }
            }
            Self::SubPropertyTransitivity => transitive_closure(graph, rdfs::SUB_PROPERTY_OF, out),
            Self::SubPropertyReflexivity => {
                for property in graph.subjects_for_predicate_object(rdf::TYPE, rdf::PROPERTY) {
                    out.push(Triple::new(property.into_owned(), rdfs::SUB_PROPERTY_OF, property.into_owned()));
                }
            }
            Self::SubPropertyInheritance => {
                for decl in graph.triples_for_predicate(rdfs::SUB_PROPERTY_OF) {
                    let (Some(sub), TermRef::NamedNode(sup)) = (named(decl.subject), decl.object) else {
                        continue;
                    };
                    for t in graph.triples_for_predicate(sub) {
                        out.push(Triple::new(t.subject.into_owned(), sup.into_owned(), t.object.into_owned()));
                    }
                }
            }
            Self::SubClassInheritance => {
                for decl in graph.triples_for_predicate(rdfs::SUB_CLASS_OF) {
                    let sub: TermRef<'_> = decl.subject.into();
                    for instance in graph.subjects_for_predicate_object(rdf::TYPE, sub) {
                        out.push(Triple::new(instance.into_owned(), rdf::TYPE, decl.object.into_owned()));
                    }
                }
            }
            Self::SubClassReflexivity => {
                for class in graph.subjects_for_predicate_object(rdf::TYPE, rdfs::CLASS) {
                    out.push(Triple::new(class.into_owned(), rdfs::SUB_CLASS_OF, class.into_owned()));
                }
            }
            Self::SubClassTransitivity => transitive_closure(graph, rdfs::SUB_CLASS_OF, out),
            Self::Symmetric => {
                for property in graph.subjects_for_predicate_object(rdf::TYPE, owl::SYMMETRIC_PROPERTY) {
                    let Some(property) = named(property) else {
                        continue;
                    };
                    for t in graph.triples_for_predicate(property) {
                        if let Some(object) = as_node_ref(t.object) {
                            out.push(Triple::new(object.into_owned(), property.into_owned(), t.subject.into_owned()));
                        }
                    }
                }
            }
            Self::Transitive => {
                for property in graph.subjects_for_predicate_object(rdf::TYPE, owl::TRANSITIVE_PROPERTY) {
                    if let Some(property) = named(property) {
                        transitive_closure(graph, property, out);
                    }
                }
            }
            Self::Inverse => {
                for decl in graph.triples_for_predicate(owl::INVERSE_OF) {
                    let (Some(p1), TermRef::NamedNode(p2)) = (named(decl.subject), decl.object) else {
                        continue;
                    };
                    swap_into(graph, p1, p2, out);
                    swap_into(graph, p2, p1, out);
                }
            }
            Self::EquivalentProperty => {
                for decl in graph.triples_for_predicate(owl::EQUIVALENT_PROPERTY) {
                    let (Some(p1), TermRef::NamedNode(p2)) = (named(decl.subject), decl.object) else {
                        continue;
                    };
                    copy_into(graph, p1, p2, out);
                    copy_into(graph, p2, p1, out);
                }
            }
            Self::EquivalentClass => {
                for decl in graph.triples_for_predicate(owl::EQUIVALENT_CLASS) {
                    let c1: TermRef<'_> = decl.subject.into();
                    for instance in graph.subjects_for_predicate_object(rdf::TYPE, c1) {
                        out.push(Triple::new(instance.into_owned(), rdf::TYPE, decl.object.into_owned()));
                    }
                    for instance in graph.subjects_for_predicate_object(rdf::TYPE, decl.object) {
                        out.push(Triple::new(instance.into_owned(), rdf::TYPE, c1.into_owned()));
                    }
                }
            }
            Self::SameAsSymmetry => {
                for t in graph.triples_for_predicate(owl::SAME_AS) {
                    if let Some(object) = as_node_ref(t.object) {
                        out.push(Triple::new(object.into_owned(), owl::SAME_AS, t.subject.into_owned()));
                    }
                }
            }
            Self::SameAsTransitivity => transitive_closure(graph, owl::SAME_AS, out),
        }
    }
}

fn named(node: NamedOrBlankNodeRef<'_>) -> Option<NamedNodeRef<'_>> {
    match node {
        NamedOrBlankNodeRef::NamedNode(n) => Some(n),
        NamedOrBlankNodeRef::BlankNode(_) => None,
    }
}

/// One step of `?x p ?y . ?y p ?z ⇒ ?x p ?z`.
fn transitive_closure(graph: &Graph, property: NamedNodeRef<'_>, out: &mut Vec<Triple>) {
    for first in graph.triples_for_predicate(property) {
        let Some(middle) = as_node_ref(first.object) else {
            continue;
        };
        for last in graph.objects_for_subject_predicate(middle, property) {
            out.push(Triple::new(first.subject.into_owned(), property.into_owned(), last.into_owned()));
        }
    }
}

/// `?x from ?y ⇒ ?x to ?y`
fn copy_into(graph: &Graph, from: NamedNodeRef<'_>, to: NamedNodeRef<'_>, out: &mut Vec<Triple>) {
    for t in graph.triples_for_predicate(from) {
        out.push(Triple::new(t.subject.into_owned(), to.into_owned(), t.object.into_owned()));
    }
}

/// `?x from ?y ⇒ ?y to ?x`
fn swap_into(graph: &Graph, from: NamedNodeRef<'_>, to: NamedNodeRef<'_>, out: &mut Vec<Triple>) {
    for t in graph.triples_for_predicate(from) {
        if let Some(object) = as_node_ref(t.object) {
            out.push(Triple::new(object.into_owned(), to.into_owned(), t.subject.into_owned()));
        }
    }
}

/// A deductive closure strategy.
pub trait Closure {
    /// Adds all entailed triples to `graph` and returns how many were added.
    fn expand(&self, graph: &mut Graph) -> Result<usize, InferenceError>;
}

/// Limits of a [`RuleClosure`] run.
#[derive(Debug, Clone)]
pub struct ClosureConfig {
    /// Maximum number of fixpoint iterations.
    pub max_iterations: usize,
    /// Maximum number of inferred triples (None = unlimited).
    pub max_inferred_triples: Option<usize>,
    /// Maximum time allowed for the expansion (None = unlimited).
    pub timeout: Option<Duration>,
}

impl Default for ClosureConfig {
    fn default() -> Self {
        Self {
            max_iterations: 64,
            max_inferred_triples: None,
            timeout: None,
        }
    }
}

/// Forward-chaining closure over a fixed rule set.
#[derive(Debug, Clone)]
pub struct RuleClosure {
    semantics: Semantics,
    rules: Vec<Rule>,
    config: ClosureConfig,
}

impl RuleClosure {
    /// Creates a closure with the default limits.
    pub fn new(semantics: Semantics) -> Result<Self, InferenceError> {
        Self::with_config(semantics, ClosureConfig::default())
    }

    /// Creates a closure with custom limits.
    pub fn with_config(semantics: Semantics, config: ClosureConfig) -> Result<Self, InferenceError> {
        if config.max_iterations == 0 {
            return Err(InferenceError::engine(
                "the closure must be allowed at least one iteration",
            ));
        }
        Ok(Self {
            semantics,
            rules: semantics.rules(),
            config,
        })
    }

    pub fn semantics(&self) -> Semantics {
        self.semantics
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }
}

impl Closure for RuleClosure {
    fn expand(&self, graph: &mut Graph) -> Result<usize, InferenceError> {
        let start = Instant::now();
        let mut inferred = 0;
        let mut candidates = Vec::new();
        for iteration in 1..=self.config.max_iterations {
            candidates.clear();
            for rule in &self.rules {
                rule.apply(graph, &mut candidates);
            }
            let mut added = 0;
            for triple in &candidates {
                if graph.insert(triple) {
                    added += 1;
                }
            }
            inferred += added;
            debug!(iteration, added, semantics = %self.semantics, "closure iteration");
            if added == 0 {
                return Ok(inferred);
            }
            if let Some(limit) = self.config.max_inferred_triples {
                if inferred > limit {
                    return Err(InferenceError::engine(format!(
                        "materialization limit exceeded ({limit} triples)"
                    )));
                }
            }
            if let Some(timeout) = self.config.timeout {
                if start.elapsed() >= timeout {
                    return Err(InferenceError::engine(format!(
                        "closure timeout exceeded ({timeout:?})"
                    )));
                }
            }
        }
        Err(InferenceError::engine(format!(
            "no fixpoint reached after {} iterations",
            self.config.max_iterations
        )))
    }
}

type ClosureFactory = dyn Fn(Semantics) -> Result<Box<dyn Closure>, InferenceError>;

/// Selects the closure strategy for an [`InferenceMode`] and applies it in place.
pub struct InferenceRunner {
    factory: Box<ClosureFactory>,
}

impl InferenceRunner {
    /// Uses [`RuleClosure`] with the default limits.
    pub fn new() -> Self {
        Self::with_config(ClosureConfig::default())
    }

    /// Uses [`RuleClosure`] with custom limits.
    pub fn with_config(config: ClosureConfig) -> Self {
        Self::with_factory(move |semantics| -> Result<Box<dyn Closure>, InferenceError> {
            Ok(Box::new(RuleClosure::with_config(semantics, config.clone())?))
        })
    }

    /// Uses a custom closure constructor.
    pub fn with_factory(
        factory: impl Fn(Semantics) -> Result<Box<dyn Closure>, InferenceError> + 'static,
    ) -> Self {
        Self {
            factory: Box::new(factory),
        }
    }

    /// Expands `graph` according to `mode`.
    ///
    /// Returns the number of added triples, 0 for [`InferenceMode::None`].
    pub fn run(&self, graph: &mut Graph, mode: InferenceMode) -> Result<usize, InferenceError> {
        let Some(semantics) = mode.semantics() else {
            return Ok(0);
        };
        let closure = (self.factory)(semantics).inspect_err(|e| {
            error!(%semantics, "Error during creation of the deductive closure: {e}");
        })?;
        let added = closure.expand(graph).inspect_err(|e| {
            error!(%semantics, "Error while running the deductive closure: {e}");
        })?;
        info!(%semantics, added, "deductive closure expanded the data graph");
        Ok(added)
    }
}

impl Default for InferenceRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for InferenceRunner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InferenceRunner").finish_non_exhaustive()
    }
}
