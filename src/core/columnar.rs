//! Purpose: Interfaces to the physical columnar writer and reader.
//! Exports: `RowSink`, `RowSource`, `SinkSummary`, `SinkError`.
//! Role: Seam between the conversion pipeline and any concrete file format.
//! Invariants: A sink either accepts a whole row or rejects it without buffering any cell.
use crate::core::schema::{LogicalType, Schema, SchemaParseError};
use crate::core::value::TypedValue;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SinkSummary {
    pub rows: u64,
    pub row_groups: u64,
}

#[derive(Debug, thiserror::Error)]
pub enum SinkError {
    #[error(transparent)]
    Parquet(#[from] parquet::errors::ParquetError),
    #[error(transparent)]
    Orc(#[from] orc_rust::error::OrcError),
    #[error(transparent)]
    Arrow(#[from] arrow::error::ArrowError),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Schema(#[from] SchemaParseError),
    #[error("column {column_index} `{column_name}` is required but the value is null")]
    NullInRequired {
        column_index: usize,
        column_name: String,
    },
    #[error("column {column_index} `{column_name}` stores {expected}, got a {found} value")]
    TypeMismatch {
        column_index: usize,
        column_name: String,
        expected: LogicalType,
        found: &'static str,
    },
    #[error("row has {found} values but the schema has {expected} columns")]
    RowWidth { expected: usize, found: usize },
    #[error("column `{column}` is not supported: {detail}")]
    Unsupported { column: String, detail: String },
    #[error("column `{column}` yielded {found} values for {expected} rows")]
    ShortColumn {
        column: String,
        expected: usize,
        found: usize,
    },
}

/// Receives decoded rows in input order.
pub trait RowSink {
    fn write_row(&mut self, row: &[TypedValue]) -> Result<(), SinkError>;

    /// Flushes buffered rows and finalizes the output.
    fn finish(self) -> Result<SinkSummary, SinkError>
    where
        Self: Sized;
}

/// Yields typed rows in storage order, one batch at a time.
pub trait RowSource {
    fn schema(&self) -> &Schema;

    fn next_batch(&mut self) -> Result<Option<Vec<Vec<TypedValue>>>, SinkError>;
}
