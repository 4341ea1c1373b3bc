#![doc = include_str!("../README.md")]
#![doc(test(attr(deny(warnings))))]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc(html_favicon_url = "https://raw.githubusercontent.com/oxigraph/oxigraph/main/logo.svg")]
#![doc(html_logo_url = "https://raw.githubusercontent.com/oxigraph/oxigraph/main/logo.svg")]

mod constraint;
mod error;
mod expected;
mod inference;
mod loader;
mod model;
mod path;
mod report;
mod shape;
mod validator;
pub mod vocab;

pub use constraint::{Constraint, NodeKind, Violation};
pub use error::{
    FixtureError, InferenceError, LoadError, ReportError, ShapeError, ValidateError,
};
pub use expected::check_expected_result;
pub use inference::{
    Closure, ClosureConfig, InferenceMode, InferenceRunner, Rule, RuleClosure, Semantics,
};
pub use loader::{GraphInput, InputKind, classify, load, parse_format_name, sniff_format};
pub use model::{CoreShape, CoreShapes, Target};
pub use path::PropertyPath;
pub use report::{ValidationReport, report_text, serialize_graph};
pub use shape::{ResultFragment, Severity, Shape, ShapeDiscovery, ShapeOutcome};
pub use validator::{
    ValidateArgs, ValidateOutput, ValidationOptions, ValidationOrchestrator, validate,
};
