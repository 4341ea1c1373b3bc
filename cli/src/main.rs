#![allow(clippy::print_stderr, clippy::use_debug)]
use crate::cli::{Args, LogFormat};
use anyhow::{Context, bail};
use clap::Parser;
use oxshacl::{
    GraphInput, InferenceMode, ValidateArgs, ValidateOutput, ValidationOptions,
    parse_format_name, validate,
};
use std::ffi::OsStr;
use std::fs;
use std::io::{self, Read, Write, stdin, stdout};
use std::path::Path;
use std::process::ExitCode;
use tracing::debug;
use tracing_subscriber::EnvFilter;

mod cli;

/// Exit status of runs that failed before producing a report.
const ERROR_EXIT_CODE: u8 = 2;

pub fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(args.quiet, args.log_format);
    match run(args) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("Error: {e:?}");
            ExitCode::from(ERROR_EXIT_CODE)
        }
    }
}

fn init_logging(quiet: bool, format: LogFormat) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(if quiet { "warn" } else { "info" }));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr);
    match format {
        LogFormat::Text => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}

/// Returns whether the data conforms, or whether the report matches the expected result.
fn run(args: Args) -> anyhow::Result<bool> {
    if args.data == "-" && args.shacl.as_deref().is_some_and(|shacl| shacl == "-") {
        bail!("Only one of the data and shapes graphs can be read from the standard input")
    }
    let inference = args.inference.parse::<InferenceMode>()?;
    let data = read_input(&args.data).context("Invalid data graph")?;
    let shacl = args
        .shacl
        .as_deref()
        .map(read_input)
        .transpose()
        .context("Invalid shapes graph")?;
    let data_format = args
        .data_format
        .as_deref()
        .map(parse_format_name)
        .transpose()?;
    let shacl_format = args
        .shacl_format
        .as_deref()
        .map(parse_format_name)
        .transpose()?;
    let serialize_report = match args.format.as_str() {
        "human" => None,
        name => Some(
            parse_format_name(name)
                .with_context(|| format!("Invalid report format '{name}'"))?,
        ),
    };

    let output = validate(
        data,
        ValidateArgs {
            shacl,
            data_format,
            shacl_format,
            options: ValidationOptions::default()
                .with_inference(inference)
                .with_abort_on_error(args.abort),
            check_expected_result: args.check_expected_result,
            serialize_report,
        },
    )?;
    let success = output.is_success();
    let bytes = match output {
        ValidateOutput::Report(report) => report.text().as_bytes().to_vec(),
        ValidateOutput::Serialized { bytes, .. } => bytes,
        ValidateOutput::ExpectedResult(matches) => format!("{matches}\n").into_bytes(),
    };
    write_output(args.output.as_deref(), &bytes)?;
    Ok(success)
}

fn read_input(arg: &OsStr) -> anyhow::Result<GraphInput> {
    if arg == "-" {
        let mut text = String::new();
        stdin()
            .lock()
            .read_to_string(&mut text)
            .context("Failed to read the standard input")?;
        return Ok(text.into());
    }
    Ok(GraphInput::from_os_str(arg)?)
}

fn write_output(path: Option<&Path>, bytes: &[u8]) -> anyhow::Result<()> {
    if let Some(path) = path {
        debug!(path = %path.display(), "writing the report");
        fs::write(path, bytes).with_context(|| format!("Failed to write {}", path.display()))
    } else {
        let mut stdout = stdout().lock();
        stdout.write_all(bytes)?;
        Ok(stdout.flush()?)
    }
}
