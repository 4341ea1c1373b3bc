//! Resolution of validation inputs into graphs.
//!
//! An input is either an already loaded [`Graph`], returned as is, or a string that is
//! classified as a file reference or as inline RDF text:
//! - strings starting with `file://` are file paths,
//! - strings shorter than 240 characters ending with `.ttl`, `.nt`, `.xml` or `.json` are file
//!   paths, in Turtle, N-Triples, RDF/XML and JSON-LD respectively,
//! - anything else is inline text.
//!
//! Without an explicit or extension derived format, the content is sniffed, see [`sniff_format`].

use crate::error::LoadError;
use oxrdf::Graph;
use oxrdfio::{RdfFormat, RdfParser};
use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Strings at least this long are never considered file names.
const MAX_FILE_NAME_LENGTH: usize = 240;

const FILE_SCHEME: &str = "file://";

/// A data or shapes graph given to a validation run.
#[derive(Debug)]
pub enum GraphInput {
    Graph(Graph),
    /// A file reference or inline RDF text.
    Text(String),
}

impl GraphInput {
    /// Converts a raw command line argument.
    pub fn from_os_str(value: &OsStr) -> Result<Self, LoadError> {
        value
            .to_str()
            .map(|s| Self::Text(s.to_owned()))
            .ok_or_else(|| {
                LoadError::input_type(format!(
                    "{} is neither a graph nor a valid Unicode string",
                    value.to_string_lossy()
                ))
            })
    }
}

impl From<Graph> for GraphInput {
    fn from(graph: Graph) -> Self {
        Self::Graph(graph)
    }
}

impl From<String> for GraphInput {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<&str> for GraphInput {
    fn from(text: &str) -> Self {
        Self::Text(text.to_owned())
    }
}

/// How a textual input is read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputKind {
    /// A local file, with the format implied by its extension if any.
    File {
        path: PathBuf,
        format: Option<RdfFormat>,
    },
    /// Serialized RDF.
    Inline,
}

/// Classifies a textual input.
pub fn classify(text: &str) -> InputKind {
    if let Some(path) = text.strip_prefix(FILE_SCHEME) {
        let format = Path::new(path)
            .extension()
            .and_then(OsStr::to_str)
            .and_then(RdfFormat::from_extension);
        return InputKind::File {
            path: PathBuf::from(path),
            format,
        };
    }
    if text.chars().count() < MAX_FILE_NAME_LENGTH {
        for (extension, format) in [
            (".ttl", RdfFormat::Turtle),
            (".nt", RdfFormat::NTriples),
            (".xml", RdfFormat::RdfXml),
        ] {
            if text.ends_with(extension) {
                return InputKind::File {
                    path: PathBuf::from(text),
                    format: Some(format),
                };
            }
        }
        if text.ends_with(".json") {
            return InputKind::File {
                path: PathBuf::from(text),
                format: RdfFormat::from_extension("json"),
            };
        }
    }
    InputKind::Inline
}

/// Resolves `input` into a graph.
///
/// An explicit `format` takes precedence over the one implied by a file extension.
pub fn load(input: GraphInput, format: Option<RdfFormat>) -> Result<Graph, LoadError> {
    let text = match input {
        GraphInput::Graph(graph) => return Ok(graph),
        GraphInput::Text(text) => text,
    };
    match classify(&text) {
        InputKind::File {
            path,
            format: implied,
        } => {
            let data = fs::read(&path).map_err(|source| LoadError::Io {
                path: path.clone(),
                source,
            })?;
            let format = format.or(implied).unwrap_or_else(|| sniff_format(&data));
            debug!(path = %path.display(), format = format.name(), "loading graph from file");
            parse(&data, format)
        }
        InputKind::Inline => {
            let format = format.unwrap_or_else(|| sniff_format(text.as_bytes()));
            debug!(format = format.name(), "loading inline graph");
            parse(text.as_bytes(), format)
        }
    }
}

fn parse(data: &[u8], format: RdfFormat) -> Result<Graph, LoadError> {
    let mut graph = Graph::new();
    for quad in RdfParser::from_format(format).for_slice(data) {
        graph.insert(quad?.as_ref());
    }
    Ok(graph)
}

/// Guesses the serialization of some RDF content from its first bytes.
///
/// `{` or `[` means JSON-LD, `<?xml` or `<rdf:RDF` means RDF/XML, everything else is read as
/// Turtle, which also covers N-Triples.
pub fn sniff_format(data: &[u8]) -> RdfFormat {
    let start = data.trim_ascii_start();
    if start.starts_with(b"{") || start.starts_with(b"[") {
        if let Some(format) = RdfFormat::from_extension("json") {
            return format;
        }
    }
    if start.starts_with(b"<?xml") || start.starts_with(b"<rdf:RDF") {
        return RdfFormat::RdfXml;
    }
    RdfFormat::Turtle
}

/// Parses a format given by name, file extension or media type.
pub fn parse_format_name(name: &str) -> Result<RdfFormat, LoadError> {
    let format = match name.to_ascii_lowercase().as_str() {
        "turtle" => Some(RdfFormat::Turtle),
        "ntriples" | "n-triples" => Some(RdfFormat::NTriples),
        "xml" | "rdfxml" | "rdf/xml" => Some(RdfFormat::RdfXml),
        "json-ld" | "jsonld" => RdfFormat::from_extension("json"),
        other => RdfFormat::from_extension(other).or_else(|| RdfFormat::from_media_type(other)),
    };
    format.ok_or_else(|| LoadError::unknown_format(name))
}
