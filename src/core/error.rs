//! Purpose: Top-level error type shared by the conversion library and the CLI.
//! Exports: `Error`, `ErrorKind`, `to_exit_code`.
//! Role: Every domain failure (schema, decode, sink, I/O) funnels into this type.
//! Invariants: Exit codes per kind are stable once published.
use std::error::Error as StdError;
use std::fmt;
use std::path::PathBuf;

use crate::core::columnar::SinkError;
use crate::core::pipeline::PipelineError;
use crate::core::schema::SchemaParseError;
use crate::core::value::{DecodeError, EncodeError};

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ErrorKind {
    Internal,
    Usage,
    NotFound,
    AlreadyExists,
    Schema,
    Decode,
    Corrupt,
    Io,
}

#[derive(Debug)]
pub struct Error {
    kind: ErrorKind,
    message: Option<String>,
    hint: Option<String>,
    path: Option<PathBuf>,
    line: Option<u64>,
    source: Option<Box<dyn StdError + Send + Sync>>,
}

impl Error {
    pub fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            message: None,
            hint: None,
            path: None,
            line: None,
            source: None,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    pub fn hint(&self) -> Option<&str> {
        self.hint.as_deref()
    }

    pub fn path(&self) -> Option<&PathBuf> {
        self.path.as_ref()
    }

    pub fn line(&self) -> Option<u64> {
        self.line
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }

    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// 1-based input line of the record the failure belongs to.
    pub fn with_line(mut self, line: u64) -> Self {
        self.line = Some(line);
        self
    }

    pub fn with_source(mut self, source: impl StdError + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.kind)?;
        if let Some(message) = &self.message {
            write!(f, ": {message}")?;
        }
        if let Some(path) = &self.path {
            write!(f, " (path: {})", path.display())?;
        }
        if let Some(line) = self.line {
            write!(f, " (line: {line})")?;
        }
        Ok(())
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.source
            .as_ref()
            .map(|source| source.as_ref() as &(dyn StdError + 'static))
    }
}

pub fn to_exit_code(kind: ErrorKind) -> i32 {
    match kind {
        ErrorKind::Internal => 1,
        ErrorKind::Usage => 2,
        ErrorKind::NotFound => 3,
        ErrorKind::AlreadyExists => 4,
        ErrorKind::Schema => 5,
        ErrorKind::Decode => 6,
        ErrorKind::Corrupt => 7,
        ErrorKind::Io => 8,
    }
}

impl From<SchemaParseError> for Error {
    fn from(err: SchemaParseError) -> Self {
        let mut out = Error::new(ErrorKind::Schema).with_message(err.to_string());
        match &err {
            SchemaParseError::UnrecognizedSyntax => {
                out = out.with_hint(
                    "Schemas start with `struct<`, `message <name> {`, or a CREATE TABLE statement.",
                );
            }
            SchemaParseError::UnmappedType(_) => {
                out = out.with_hint("Nested and collection types cannot be flattened to CSV columns.");
            }
            SchemaParseError::Malformed { .. } => {}
        }
        out.with_source(err)
    }
}

impl From<DecodeError> for Error {
    fn from(err: DecodeError) -> Self {
        Error::new(ErrorKind::Decode)
            .with_message(format!("{err}: {}", err.cause))
            .with_source(err)
    }
}

impl From<EncodeError> for Error {
    fn from(err: EncodeError) -> Self {
        Error::new(ErrorKind::Decode)
            .with_message(format!("{err}: {}", err.cause))
            .with_source(err)
    }
}

impl From<SinkError> for Error {
    fn from(err: SinkError) -> Self {
        let kind = match &err {
            SinkError::Io(io) if io.kind() == std::io::ErrorKind::NotFound => ErrorKind::NotFound,
            SinkError::Io(_) | SinkError::Orc(_) => ErrorKind::Io,
            SinkError::Arrow(_) => ErrorKind::Internal,
            SinkError::Parquet(_) | SinkError::ShortColumn { .. } => ErrorKind::Corrupt,
            SinkError::Schema(_) | SinkError::Unsupported { .. } => ErrorKind::Schema,
            SinkError::NullInRequired { .. }
            | SinkError::TypeMismatch { .. }
            | SinkError::RowWidth { .. } => ErrorKind::Decode,
        };
        let mut out = Error::new(kind).with_message(err.to_string());
        if matches!(err, SinkError::NullInRequired { .. }) {
            out = out.with_hint("Declare the column OPTIONAL or set --null to a marker absent from the data.");
        }
        out.with_source(err)
    }
}

impl From<PipelineError> for Error {
    fn from(err: PipelineError) -> Self {
        let line = err.line();
        let out = match err {
            PipelineError::Decode { source, .. } => Error::from(source),
            PipelineError::Encode { row, source } => {
                let message = format!("row {row}: {source}: {}", source.cause);
                Error::new(ErrorKind::Decode)
                    .with_message(message)
                    .with_source(source)
            }
            PipelineError::Sink { source, .. } => Error::from(source),
            PipelineError::Csv { source, .. } => {
                let kind = if source.is_io_error() {
                    ErrorKind::Io
                } else {
                    ErrorKind::Decode
                };
                Error::new(kind)
                    .with_message(format!("malformed delimited input: {source}"))
                    .with_hint("Check --separator, --quote and --escape against the input.")
                    .with_source(source)
            }
            PipelineError::Io(source) => Error::new(ErrorKind::Io)
                .with_message("cannot write delimited output")
                .with_source(source),
        };
        match line {
            Some(line) => out.with_line(line),
            None => out,
        }
    }
}
