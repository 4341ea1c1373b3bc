use clap::{Parser, ValueEnum, ValueHint};
use std::ffi::OsString;
use std::path::PathBuf;

#[derive(Parser)]
#[command(about, version, name = "oxshacl")]
/// Validates RDF data graphs against SHACL shapes graphs
///
/// Exits with 0 if the data conforms, 1 if it does not and 2 on error.
pub struct Args {
    /// The data graph to validate
    ///
    /// Either a file path (".ttl", ".nt", ".xml" and ".json" files, or any file behind "file://"),
    /// an inline serialization or "-" to read from the standard input.
    #[arg(value_hint = ValueHint::AnyPath)]
    pub data: OsString,
    /// The shapes graph
    ///
    /// Read like the data graph. If not present, shapes are read from the data graph.
    #[arg(short, long, value_hint = ValueHint::AnyPath)]
    pub shacl: Option<OsString>,
    /// Closure to compute on the data graph before validation
    #[arg(short, long, default_value = "none", value_parser = ["none", "rdfs", "owlrl", "both", "all", "rdfsowlrl"])]
    pub inference: String,
    /// Stop at the first error raised while evaluating a shape
    #[arg(short, long)]
    pub abort: bool,
    /// The format of the data graph
    ///
    /// Can be a name like "turtle", an extension like "nt" or a MIME type like "application/n-triples".
    ///
    /// By default the format is guessed from the file extension or from the content.
    #[arg(long)]
    pub data_format: Option<String>,
    /// The format of the shapes graph
    ///
    /// Same values as --data-format.
    #[arg(long)]
    pub shacl_format: Option<String>,
    /// The report output format
    ///
    /// "human" for the text summary, or any RDF format accepted by --data-format.
    #[arg(short, long, default_value = "turtle")]
    pub format: String,
    /// File to write the report to
    ///
    /// By default the standard output is used.
    #[arg(short, long, value_hint = ValueHint::FilePath)]
    pub output: Option<PathBuf>,
    /// Compare the report with the dash:GraphValidationTestCase of the shapes graph
    ///
    /// Prints "true" or "false" instead of the report.
    #[arg(long)]
    pub check_expected_result: bool,
    /// Only log warnings and errors
    #[arg(short, long)]
    pub quiet: bool,
    /// Format of the logs written to the standard error
    #[arg(long, value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}
