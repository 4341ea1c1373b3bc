//! Validation runs: optional inference, per-shape evaluation and report assembly.

use crate::error::ValidateError;
use crate::expected::check_expected_result;
use crate::inference::{InferenceMode, InferenceRunner};
use crate::loader::{GraphInput, load};
use crate::model::CoreShapes;
use crate::report::ValidationReport;
use crate::shape::ShapeDiscovery;
use oxrdf::Graph;
use oxrdfio::RdfFormat;
use std::fmt;
use tracing::{debug, error, info};

/// Options of a validation run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ValidationOptions {
    /// Closure computed on the data graph before validation.
    pub inference: InferenceMode,
    /// Stop at the first shape evaluation error.
    ///
    /// Shape evaluation errors always abort the run at the moment, this flag is kept for
    /// callers that want to state it explicitly.
    pub abort_on_error: bool,
}

impl ValidationOptions {
    #[must_use]
    pub fn with_inference(mut self, inference: InferenceMode) -> Self {
        self.inference = inference;
        self
    }

    #[must_use]
    pub fn with_abort_on_error(mut self, abort_on_error: bool) -> Self {
        self.abort_on_error = abort_on_error;
        self
    }
}

/// Drives a validation run over a data graph and a shapes graph.
///
/// ```
/// use oxrdf::Graph;
/// use oxshacl::ValidationOrchestrator;
///
/// let mut data = Graph::new();
/// let report = ValidationOrchestrator::default().run(&mut data, &Graph::new())?;
/// assert!(report.conforms());
/// assert_eq!(report.result_count(), 0);
/// # Result::<_, Box<dyn std::error::Error>>::Ok(())
/// ```
pub struct ValidationOrchestrator {
    options: ValidationOptions,
    discovery: Box<dyn ShapeDiscovery>,
    inference: InferenceRunner,
}

impl ValidationOrchestrator {
    /// Uses [`CoreShapes`] and the built-in closure rules.
    pub fn new(options: ValidationOptions) -> Self {
        Self {
            options,
            discovery: Box::new(CoreShapes),
            inference: InferenceRunner::new(),
        }
    }

    /// Replaces the shape discovery.
    #[must_use]
    pub fn with_discovery(mut self, discovery: impl ShapeDiscovery + 'static) -> Self {
        self.discovery = Box::new(discovery);
        self
    }

    /// Replaces the inference runner.
    #[must_use]
    pub fn with_inference_runner(mut self, inference: InferenceRunner) -> Self {
        self.inference = inference;
        self
    }

    pub fn options(&self) -> &ValidationOptions {
        &self.options
    }

    /// Validates `data` against the shapes of `shapes`.
    ///
    /// The data graph is expanded in place when an inference mode is set.
    /// Shapes are evaluated in discovery order and their results are kept in that order.
    /// Any error aborts the run.
    pub fn run(&self, data: &mut Graph, shapes: &Graph) -> Result<ValidationReport, ValidateError> {
        debug!(
            inference = %self.options.inference,
            abort_on_error = self.options.abort_on_error,
            "starting validation"
        );
        self.inference.run(data, self.options.inference)?;

        let shapes = self
            .discovery
            .find_shapes(shapes)
            .inspect_err(|e| error!("Shape discovery failed: {e}"))?;
        let mut conforms = true;
        let mut results = Vec::new();
        for shape in &shapes {
            let outcome = shape
                .validate(data)
                .inspect_err(|e| error!(shape = %shape.id(), "Shape validation failed: {e}"))?;
            debug!(
                shape = %shape.id(),
                conforms = outcome.conforms,
                results = outcome.results.len(),
                "validated shape"
            );
            conforms &= outcome.conforms;
            results.extend(outcome.results);
        }

        let report = ValidationReport::build(conforms, &results)?;
        info!(shapes = shapes.len(), "{}", report.text());
        Ok(report)
    }
}

impl Default for ValidationOrchestrator {
    fn default() -> Self {
        Self::new(ValidationOptions::default())
    }
}

impl fmt::Debug for ValidationOrchestrator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValidationOrchestrator")
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

/// Everything [`validate`] needs besides the data graph.
#[derive(Debug, Default)]
pub struct ValidateArgs {
    /// The shapes graph, the data graph itself if `None`.
    pub shacl: Option<GraphInput>,
    pub data_format: Option<RdfFormat>,
    pub shacl_format: Option<RdfFormat>,
    pub options: ValidationOptions,
    /// Compare the report with the `dash:GraphValidationTestCase` of the shapes graph.
    pub check_expected_result: bool,
    /// Return the report serialized in this format.
    pub serialize_report: Option<RdfFormat>,
}

/// What [`validate`] returns.
#[derive(Debug)]
pub enum ValidateOutput {
    Report(ValidationReport),
    Serialized { conforms: bool, bytes: Vec<u8> },
    /// Whether the report matches the expected result.
    ExpectedResult(bool),
}

impl ValidateOutput {
    /// Conformance of the data graph, or the expected result check outcome.
    pub fn is_success(&self) -> bool {
        match self {
            Self::Report(report) => report.conforms(),
            Self::Serialized { conforms, .. } => *conforms,
            Self::ExpectedResult(matches) => *matches,
        }
    }
}

/// Loads the inputs and validates them.
///
/// Without a shapes graph, the shapes are read from a copy of the data graph taken before
/// inference.
///
/// ```
/// use oxshacl::{ValidateArgs, ValidateOutput, validate};
///
/// let shapes = "@prefix sh: <http://www.w3.org/ns/shacl#> .
///     @prefix ex: <http://example.org/> .
///     ex:S sh:targetNode ex:alice ; sh:property [ sh:path ex:name ; sh:minCount 1 ] .";
/// let args = ValidateArgs {
///     shacl: Some(shapes.into()),
///     ..ValidateArgs::default()
/// };
/// let ValidateOutput::Report(report) = validate("<http://example.org/alice> <http://example.org/age> 42 .", args)? else {
///     unreachable!()
/// };
/// assert!(!report.conforms());
/// assert!(report.text().contains("Results (1):"));
/// # Result::<_, Box<dyn std::error::Error>>::Ok(())
/// ```
pub fn validate(
    data: impl Into<GraphInput>,
    args: ValidateArgs,
) -> Result<ValidateOutput, ValidateError> {
    let mut data_graph =
        load(data.into(), args.data_format).inspect_err(|e| error!("Cannot load the data graph: {e}"))?;
    let shapes_graph = match args.shacl {
        Some(shacl) => load(shacl, args.shacl_format)
            .inspect_err(|e| error!("Cannot load the shapes graph: {e}"))?,
        None => data_graph.iter().collect(),
    };

    let report = ValidationOrchestrator::new(args.options).run(&mut data_graph, &shapes_graph)?;

    if args.check_expected_result {
        return Ok(ValidateOutput::ExpectedResult(check_expected_result(
            report.graph(),
            &shapes_graph,
        )?));
    }
    if let Some(format) = args.serialize_report {
        return Ok(ValidateOutput::Serialized {
            conforms: report.conforms(),
            bytes: report.serialize(format)?,
        });
    }
    Ok(ValidateOutput::Report(report))
}
