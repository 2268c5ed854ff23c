//! Purpose: Path conventions for inputs, schema files and default outputs.
//! Exports: `OutputFormat`, `strip_gz`, `is_gzip`, `schema_candidates`, `resolve_schema_source`.
//! Role: Keep CLI path semantics in one place so commands agree on lookups.
//! Invariants: An output ending in `.orc` is written as ORC; anything else is Parquet.
//! Invariants: Default schema lookup is `<input>.<format>.schema`, then `<input>.schema`.
//! Invariants: A trailing `.gz` is removed before deriving schema paths.

use std::path::{Path, PathBuf};

pub(crate) const DEFAULT_PARQUET_OUTPUT: &str = "output.parquet";
pub(crate) const DEFAULT_CSV_OUTPUT: &str = "output.csv";

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum OutputFormat {
    Parquet,
    Orc,
}

impl OutputFormat {
    pub(crate) fn for_output(path: &Path) -> Self {
        if path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("orc"))
        {
            OutputFormat::Orc
        } else {
            OutputFormat::Parquet
        }
    }

    pub(crate) fn name(self) -> &'static str {
        match self {
            OutputFormat::Parquet => "parquet",
            OutputFormat::Orc => "orc",
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) enum SchemaSource {
    Inline(String),
    File(PathBuf),
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) enum SchemaLookupError {
    MissingFile(PathBuf),
    NoDefault { tried: Vec<PathBuf> },
}

pub(crate) fn is_gzip(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("gz"))
}

pub(crate) fn strip_gz(path: &Path) -> PathBuf {
    if is_gzip(path) {
        path.with_extension("")
    } else {
        path.to_path_buf()
    }
}

pub(crate) fn schema_candidates(input: &Path, format: OutputFormat) -> Vec<PathBuf> {
    let base = strip_gz(input).into_os_string();
    [format!(".{}.schema", format.name()), ".schema".to_string()]
        .iter()
        .map(|suffix| {
            let mut candidate = base.clone();
            candidate.push(suffix);
            PathBuf::from(candidate)
        })
        .collect()
}

/// `-s` may carry an inline `struct<...>` description or a path; without it the
/// first existing default next to `input` wins.
pub(crate) fn resolve_schema_source(
    arg: Option<&str>,
    input: &Path,
    format: OutputFormat,
) -> Result<SchemaSource, SchemaLookupError> {
    if let Some(arg) = arg {
        if arg.trim_start().starts_with("struct<") {
            return Ok(SchemaSource::Inline(arg.to_string()));
        }
        let path = PathBuf::from(arg);
        if !path.is_file() {
            return Err(SchemaLookupError::MissingFile(path));
        }
        return Ok(SchemaSource::File(path));
    }
    let tried = schema_candidates(input, format);
    match tried.iter().find(|candidate| candidate.is_file()) {
        Some(found) => Ok(SchemaSource::File(found.clone())),
        None => Err(SchemaLookupError::NoDefault { tried }),
    }
}
