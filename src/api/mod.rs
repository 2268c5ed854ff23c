//! Purpose: Define the public Rust API boundary for csv2parquet.
//! Exports: Core types and operations needed by the CLI and integration tests.
//! Role: Public, additive-only surface; hides internal module layout.
//! Invariants: This module is the only public path to core types.

#[doc(hidden)]
pub use crate::core::error::to_exit_code;
pub use crate::core::columnar::{RowSink, RowSource, SinkError, SinkSummary};
pub use crate::core::error::{Error, ErrorKind};
pub use crate::core::hex::{self, HexLiteral};
pub use crate::core::message_type::{
    Annotation, MessageField, MessageType, Primitive, Repetition,
};
pub use crate::core::options::{
    Compression, CsvDialect, WriterOptions, apply_define, parse_csv_format,
};
pub use crate::core::orc_io::{OrcSink, orc_data_type};
pub use crate::core::parquet_io::{ParquetMeta, ParquetSink, ParquetSource, read_meta};
pub use crate::core::pipeline::{
    ConvertOutcome, ExportOutcome, PipelineError, ShapedRecord, convert, export,
};
pub use crate::core::row::{Shape, shape};
pub use crate::core::schema::{
    Column, DERIVED_MESSAGE_NAME, LogicalType, Schema, SchemaParseError, SchemaSyntax,
    derive_message, derive_struct,
};
pub use crate::core::sql_scan::{ColumnDef, SqlType, extract};
pub use crate::core::struct_type::{Category, NestedKind, StructField, StructType};
pub use crate::core::temporal::{self, Int96Timestamp, TemporalParseError};
pub use crate::core::value::{
    DecodeCause, DecodeError, EncodeCause, EncodeError, TypedValue, ValueCodec,
};
