//! Assembly of the `sh:ValidationReport` graph and of its text summary.

use crate::error::ReportError;
use crate::shape::ResultFragment;
use crate::vocab::sh;
use oxrdf::vocab::rdf;
use oxrdf::{BlankNode, Graph, Literal, Triple};
use oxrdfio::{RdfFormat, RdfSerializer};
use tracing::error;

/// The outcome of a validation run as an RDF report.
#[derive(Debug)]
pub struct ValidationReport {
    conforms: bool,
    graph: Graph,
    text: String,
    result_count: usize,
}

impl ValidationReport {
    /// Builds the report graph of a run from its aggregated results.
    ///
    /// The graph has a single fresh report node linked with `sh:result` to every fragment node,
    /// and every fragment triple is merged as is.
    ///
    /// Fails if `conforms` is false and there is no result.
    pub fn build(conforms: bool, results: &[ResultFragment]) -> Result<Self, ReportError> {
        if !conforms && results.is_empty() {
            let err = ReportError::InvariantViolation;
            error!("{err}");
            return Err(err);
        }
        let mut graph = Graph::new();
        let report = BlankNode::default();
        graph.insert(&Triple::new(report.clone(), rdf::TYPE, sh::VALIDATION_REPORT));
        graph.insert(&Triple::new(report.clone(), sh::CONFORMS, Literal::from(conforms)));
        for result in results {
            graph.insert(&Triple::new(report.clone(), sh::RESULT, result.node.clone()));
            for triple in &result.triples {
                graph.insert(triple);
            }
        }
        Ok(Self {
            conforms,
            graph,
            text: report_text(conforms, results),
            result_count: results.len(),
        })
    }

    pub fn conforms(&self) -> bool {
        self.conforms
    }

    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    pub fn into_graph(self) -> Graph {
        self.graph
    }

    /// The human readable summary, see [`report_text`].
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Number of `sh:result` links of the report node.
    pub fn result_count(&self) -> usize {
        self.result_count
    }

    /// Serializes the report graph with the `sh`, `rdf` and `xsd` prefixes.
    pub fn serialize(&self, format: RdfFormat) -> Result<Vec<u8>, ReportError> {
        serialize_graph(&self.graph, format)
    }
}

/// Renders the text summary of a report.
///
/// ```text
/// Validation Report
/// Conforms: False
/// Results (1):
/// <text of each result>
/// ```
///
/// The `Results` line is omitted when there is no result.
pub fn report_text(conforms: bool, results: &[ResultFragment]) -> String {
    let header = format!(
        "Validation Report\nConforms: {}\n",
        if conforms { "True" } else { "False" }
    );
    if results.is_empty() {
        return header;
    }
    let count = format!("Results ({}):\n", results.len());
    [header.as_str(), count.as_str()]
        .into_iter()
        .chain(results.iter().map(|result| result.text.as_str()))
        .collect()
}

/// Serializes a report graph.
pub fn serialize_graph(graph: &Graph, format: RdfFormat) -> Result<Vec<u8>, ReportError> {
    let mut serializer = RdfSerializer::from_format(format)
        .with_prefix("sh", sh::NAMESPACE)?
        .with_prefix("rdf", "http://www.w3.org/1999/02/22-rdf-syntax-ns#")?
        .with_prefix("xsd", "http://www.w3.org/2001/XMLSchema#")?
        .for_writer(Vec::new());
    for triple in graph {
        serializer.serialize_triple(triple)?;
    }
    Ok(serializer.finish()?)
}
