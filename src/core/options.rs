//! Purpose: Explicit configuration values for CSV reading/writing and columnar output.
//! Exports: `CsvDialect`, `WriterOptions`, `Compression`, `apply_define`.
//! Role: Threaded by value through every conversion call; there is no global dialect.
//! Invariants: Defaults match the historic tool: `,` `"` `\` no header, `""` as NULL.
//! Invariants: `-D key=value` defines only touch the keys listed in `apply_define`.
use std::str::FromStr;

use crate::core::error::{Error, ErrorKind};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CsvDialect {
    pub separator: u8,
    pub quote: u8,
    /// `None` disables backslash-style escaping; quotes are then doubled.
    pub escape: Option<u8>,
    /// Leading lines skipped before the first data record.
    pub header_lines: usize,
    pub null_marker: String,
    /// Try `0x..x0` literals before the per-type text parse.
    pub binary_literals: bool,
}

impl Default for CsvDialect {
    fn default() -> Self {
        Self {
            separator: b',',
            quote: b'"',
            escape: Some(b'\\'),
            header_lines: 0,
            null_marker: String::new(),
            binary_literals: false,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Compression {
    Uncompressed,
    Gzip,
    Snappy,
    Zstd,
}

impl FromStr for Compression {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_ascii_uppercase().as_str() {
            "NONE" | "UNCOMPRESSED" => Ok(Compression::Uncompressed),
            "GZIP" | "ZIP" => Ok(Compression::Gzip),
            "SNAPPY" => Ok(Compression::Snappy),
            "ZSTD" => Ok(Compression::Zstd),
            _ => Err(Error::new(ErrorKind::Usage)
                .with_message(format!("unknown compression `{value}`"))
                .with_hint("Use one of: none, gzip, snappy, zstd.")),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WriterOptions {
    pub compression: Compression,
    /// Rows buffered per row group before it is flushed.
    pub row_group_size: usize,
    /// Approximate bytes buffered per row group before it is flushed.
    pub block_size: usize,
    pub page_size: usize,
    pub dictionary: bool,
    /// Target bytes per ORC stripe.
    pub stripe_size: usize,
}

impl Default for WriterOptions {
    fn default() -> Self {
        Self {
            compression: Compression::Gzip,
            row_group_size: 64 * 1024,
            block_size: 128 * 1024 * 1024,
            page_size: 1024 * 1024,
            dictionary: true,
            stripe_size: 64 * 1024 * 1024,
        }
    }
}

/// Applies one `key=value` define from the command line.
pub fn apply_define(
    define: &str,
    writer: &mut WriterOptions,
    dialect: &mut CsvDialect,
) -> Result<(), Error> {
    let (key, value) = define.split_once('=').ok_or_else(|| {
        Error::new(ErrorKind::Usage)
            .with_message(format!("define `{define}` is not key=value"))
            .with_hint("Use -D parquet.compress=SNAPPY style defines.")
    })?;
    let (key, value) = (key.trim(), value.trim());
    match key {
        "parquet.compress" => writer.compression = value.parse()?,
        "parquet.BLOCK_SIZE" => writer.block_size = parse_size(key, value)?,
        "parquet.PAGE_SIZE" => writer.page_size = parse_size(key, value)?,
        "parquet.enabledictionary" => writer.dictionary = parse_flag(key, value)?,
        "orc.stripe.size" => writer.stripe_size = parse_size(key, value)?,
        "orc.compress" => parse_orc_compression(value)?,
        "csvformat" => dialect.binary_literals = parse_csv_format(value)?,
        _ => {
            return Err(Error::new(ErrorKind::Usage)
                .with_message(format!("unknown define `{key}`"))
                .with_hint(
                    "Known defines: parquet.compress, parquet.BLOCK_SIZE, parquet.PAGE_SIZE, parquet.enabledictionary, orc.compress, orc.stripe.size, csvformat.",
                ));
        }
    }
    Ok(())
}

/// `binary` enables hex literals; `default` (or empty) disables them.
pub fn parse_csv_format(value: &str) -> Result<bool, Error> {
    match value.to_ascii_lowercase().as_str() {
        "binary" => Ok(true),
        "" | "default" | "text" => Ok(false),
        _ => Err(Error::new(ErrorKind::Usage)
            .with_message(format!("unknown csv format `{value}`"))
            .with_hint("Use binary or default.")),
    }
}

/// ORC stripes are written uncompressed, so only `NONE` is accepted.
fn parse_orc_compression(value: &str) -> Result<(), Error> {
    match value.parse::<Compression>()? {
        Compression::Uncompressed => Ok(()),
        _ => Err(Error::new(ErrorKind::Usage)
            .with_message(format!("orc.compress={value} is not supported"))
            .with_hint("ORC output is written uncompressed; use orc.compress=NONE.")),
    }
}

fn parse_size(key: &str, value: &str) -> Result<usize, Error> {
    match value.parse::<usize>() {
        Ok(size) if size > 0 => Ok(size),
        _ => Err(Error::new(ErrorKind::Usage)
            .with_message(format!("{key} must be a positive integer, got `{value}`"))),
    }
}

fn parse_flag(key: &str, value: &str) -> Result<bool, Error> {
    match value.to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        _ => Err(Error::new(ErrorKind::Usage)
            .with_message(format!("{key} must be true or false, got `{value}`"))),
    }
}
