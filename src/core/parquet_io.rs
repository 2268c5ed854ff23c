//! Purpose: Parquet implementations of `RowSink` and `RowSource`.
//! Exports: `ParquetSink`, `ParquetSource`, `ParquetMeta`, `read_meta`.
//! Role: Concrete columnar collaborator used by the CLI; format details stay in `parquet`.
//! Invariants: Rows are buffered column-wise and flushed one row group at a time.
//! Invariants: A rejected row leaves every column buffer untouched.
//! Invariants: The reader rebuilds the canonical schema from physical + converted types.
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::sync::Arc;

use parquet::basic::{
    Compression as PqCompression, ConvertedType, GzipLevel, Repetition as PqRepetition,
    Type as PhysicalType, ZstdLevel,
};
use parquet::column::reader::{ColumnReader, ColumnReaderImpl};
use parquet::column::writer::ColumnWriter;
use parquet::data_type::{ByteArray, DataType, FixedLenByteArray, Int96};
use parquet::file::properties::WriterProperties;
use parquet::file::reader::{FileReader, SerializedFileReader};
use parquet::file::writer::SerializedFileWriter;
use parquet::schema::types::{SchemaDescriptor, Type};
use serde::Serialize;

use crate::core::columnar::{RowSink, RowSource, SinkError, SinkSummary};
use crate::core::message_type::{Annotation, MessageField, MessageType, Primitive, Repetition};
use crate::core::options::{Compression, WriterOptions};
use crate::core::schema::{Column, LogicalType, Schema};
use crate::core::temporal::Int96Timestamp;
use crate::core::value::TypedValue;

/// One cell converted to its physical representation, ready to buffer.
enum Cell {
    Null,
    Bool(bool),
    I32(i32),
    I64(i64),
    I96(Int96),
    F32(f32),
    F64(f64),
    Bytes(Vec<u8>),
}

impl Cell {
    /// Plain-encoded payload size, used to budget row groups in bytes.
    fn encoded_len(&self) -> usize {
        match self {
            Cell::Null => 0,
            Cell::Bool(_) => 1,
            Cell::I32(_) | Cell::F32(_) => 4,
            Cell::I64(_) | Cell::F64(_) => 8,
            Cell::I96(_) => 12,
            Cell::Bytes(bytes) => 4 + bytes.len(),
        }
    }
}

enum Values {
    Bool(Vec<bool>),
    Int32(Vec<i32>),
    Int64(Vec<i64>),
    Int96(Vec<Int96>),
    Float(Vec<f32>),
    Double(Vec<f64>),
    Bytes(Vec<ByteArray>),
    Fixed(Vec<FixedLenByteArray>),
}

struct ColumnBuffer {
    column: Column,
    primitive: Primitive,
    values: Values,
    def_levels: Vec<i16>,
}

impl ColumnBuffer {
    fn new(column: Column, primitive: Primitive) -> Self {
        let values = match primitive {
            Primitive::Boolean => Values::Bool(Vec::new()),
            Primitive::Int32 => Values::Int32(Vec::new()),
            Primitive::Int64 => Values::Int64(Vec::new()),
            Primitive::Int96 => Values::Int96(Vec::new()),
            Primitive::Float => Values::Float(Vec::new()),
            Primitive::Double => Values::Double(Vec::new()),
            Primitive::Binary => Values::Bytes(Vec::new()),
            Primitive::FixedLenByteArray(_) => Values::Fixed(Vec::new()),
        };
        Self {
            column,
            primitive,
            values,
            def_levels: Vec::new(),
        }
    }

    fn to_cell(&self, index: usize, value: &TypedValue) -> Result<Cell, SinkError> {
        let mismatch = || SinkError::TypeMismatch {
            column_index: index,
            column_name: self.column.name.clone(),
            expected: self.column.logical_type,
            found: value.tag(),
        };
        if value.is_null() {
            if !self.column.nullable {
                return Err(SinkError::NullInRequired {
                    column_index: index,
                    column_name: self.column.name.clone(),
                });
            }
            return Ok(Cell::Null);
        }
        if !value.fits(self.column.logical_type) {
            return Err(mismatch());
        }
        let cell = match (self.primitive, value) {
            (Primitive::Boolean, TypedValue::Boolean(v)) => Cell::Bool(*v),
            (
                Primitive::Int32,
                TypedValue::Int32(v) | TypedValue::Date(v) | TypedValue::TimeMillis(v),
            ) => Cell::I32(*v),
            (Primitive::Int32, TypedValue::Decimal { unscaled, .. }) => {
                Cell::I32(i32::try_from(*unscaled).map_err(|_| mismatch())?)
            }
            (
                Primitive::Int64,
                TypedValue::Int64(v)
                | TypedValue::TimeMicros(v)
                | TypedValue::TimestampMillis(v)
                | TypedValue::TimestampMicros(v),
            ) => Cell::I64(*v),
            (Primitive::Int64, TypedValue::Decimal { unscaled, .. }) => {
                Cell::I64(i64::try_from(*unscaled).map_err(|_| mismatch())?)
            }
            (Primitive::Int96, TypedValue::Timestamp(ts)) => {
                let words = ts.to_words();
                let mut raw = Int96::new();
                raw.set_data(words[0], words[1], words[2]);
                Cell::I96(raw)
            }
            (Primitive::Float, TypedValue::Float(v)) => Cell::F32(*v),
            (Primitive::Double, TypedValue::Double(v)) => Cell::F64(*v),
            (Primitive::Binary, TypedValue::Bytes(bytes)) => Cell::Bytes(bytes.clone()),
            (Primitive::Binary, TypedValue::Decimal { unscaled, .. }) => {
                Cell::Bytes(decimal_to_be_bytes(*unscaled))
            }
            (Primitive::FixedLenByteArray(len), TypedValue::Bytes(bytes))
                if bytes.len() == len as usize =>
            {
                Cell::Bytes(bytes.clone())
            }
            _ => return Err(mismatch()),
        };
        Ok(cell)
    }

    fn push(&mut self, cell: Cell) {
        if self.column.nullable {
            self.def_levels.push(if matches!(cell, Cell::Null) { 0 } else { 1 });
        }
        match (&mut self.values, cell) {
            (_, Cell::Null) => {}
            (Values::Bool(v), Cell::Bool(x)) => v.push(x),
            (Values::Int32(v), Cell::I32(x)) => v.push(x),
            (Values::Int64(v), Cell::I64(x)) => v.push(x),
            (Values::Int96(v), Cell::I96(x)) => v.push(x),
            (Values::Float(v), Cell::F32(x)) => v.push(x),
            (Values::Double(v), Cell::F64(x)) => v.push(x),
            (Values::Bytes(v), Cell::Bytes(x)) => v.push(ByteArray::from(x)),
            (Values::Fixed(v), Cell::Bytes(x)) => {
                v.push(FixedLenByteArray::from(ByteArray::from(x)))
            }
            // to_cell only produces cells matching the buffer's primitive.
            _ => {}
        }
    }

    fn clear(&mut self) {
        self.def_levels.clear();
        match &mut self.values {
            Values::Bool(v) => v.clear(),
            Values::Int32(v) => v.clear(),
            Values::Int64(v) => v.clear(),
            Values::Int96(v) => v.clear(),
            Values::Float(v) => v.clear(),
            Values::Double(v) => v.clear(),
            Values::Bytes(v) => v.clear(),
            Values::Fixed(v) => v.clear(),
        }
    }
}

/// Buffers typed rows and writes them as Parquet row groups.
pub struct ParquetSink<W: Write + Send> {
    writer: SerializedFileWriter<W>,
    buffers: Vec<ColumnBuffer>,
    buffered_rows: usize,
    buffered_bytes: usize,
    row_group_size: usize,
    block_size: usize,
    summary: SinkSummary,
}

impl ParquetSink<BufWriter<File>> {
    /// Creates (or truncates) `path`; callers decide whether overwriting is allowed.
    pub fn create(path: &Path, schema: &Schema, options: &WriterOptions) -> Result<Self, SinkError> {
        let file = File::create(path)?;
        Self::new(BufWriter::new(file), schema, options)
    }
}

impl<W: Write + Send> ParquetSink<W> {
    pub fn new(out: W, schema: &Schema, options: &WriterOptions) -> Result<Self, SinkError> {
        let root = Arc::new(parquet_schema(schema.message())?);
        let writer = SerializedFileWriter::new(out, root, Arc::new(writer_properties(options)))?;
        let buffers = schema
            .columns()
            .iter()
            .zip(&schema.message().fields)
            .map(|(column, field)| ColumnBuffer::new(column.clone(), field.primitive))
            .collect();
        Ok(Self {
            writer,
            buffers,
            buffered_rows: 0,
            buffered_bytes: 0,
            row_group_size: options.row_group_size.max(1),
            block_size: options.block_size.max(1),
            summary: SinkSummary::default(),
        })
    }

    fn flush_row_group(&mut self) -> Result<(), SinkError> {
        if self.buffered_rows == 0 {
            return Ok(());
        }
        let mut row_group = self.writer.next_row_group()?;
        let mut index = 0usize;
        while let Some(mut column_writer) = row_group.next_column()? {
            let Some(buffer) = self.buffers.get_mut(index) else {
                return Err(SinkError::RowWidth {
                    expected: self.buffers.len(),
                    found: index + 1,
                });
            };
            let defs = buffer
                .column
                .nullable
                .then_some(buffer.def_levels.as_slice());
            match (column_writer.untyped(), &buffer.values) {
                (ColumnWriter::BoolColumnWriter(w), Values::Bool(v)) => {
                    w.write_batch(v, defs, None)?;
                }
                (ColumnWriter::Int32ColumnWriter(w), Values::Int32(v)) => {
                    w.write_batch(v, defs, None)?;
                }
                (ColumnWriter::Int64ColumnWriter(w), Values::Int64(v)) => {
                    w.write_batch(v, defs, None)?;
                }
                (ColumnWriter::Int96ColumnWriter(w), Values::Int96(v)) => {
                    w.write_batch(v, defs, None)?;
                }
                (ColumnWriter::FloatColumnWriter(w), Values::Float(v)) => {
                    w.write_batch(v, defs, None)?;
                }
                (ColumnWriter::DoubleColumnWriter(w), Values::Double(v)) => {
                    w.write_batch(v, defs, None)?;
                }
                (ColumnWriter::ByteArrayColumnWriter(w), Values::Bytes(v)) => {
                    w.write_batch(v, defs, None)?;
                }
                (ColumnWriter::FixedLenByteArrayColumnWriter(w), Values::Fixed(v)) => {
                    w.write_batch(v, defs, None)?;
                }
                _ => {
                    return Err(SinkError::Unsupported {
                        column: buffer.column.name.clone(),
                        detail: "column writer does not match the buffered values".to_string(),
                    });
                }
            }
            column_writer.close()?;
            buffer.clear();
            index += 1;
        }
        row_group.close()?;
        tracing::debug!(rows = self.buffered_rows, "flushed row group");
        self.summary.row_groups += 1;
        self.buffered_rows = 0;
        self.buffered_bytes = 0;
        Ok(())
    }
}

impl<W: Write + Send> RowSink for ParquetSink<W> {
    fn write_row(&mut self, row: &[TypedValue]) -> Result<(), SinkError> {
        if row.len() != self.buffers.len() {
            return Err(SinkError::RowWidth {
                expected: self.buffers.len(),
                found: row.len(),
            });
        }
        let cells = self
            .buffers
            .iter()
            .zip(row)
            .enumerate()
            .map(|(index, (buffer, value))| buffer.to_cell(index, value))
            .collect::<Result<Vec<_>, _>>()?;
        for (buffer, cell) in self.buffers.iter_mut().zip(cells) {
            self.buffered_bytes += cell.encoded_len();
            buffer.push(cell);
        }
        self.buffered_rows += 1;
        self.summary.rows += 1;
        if self.buffered_rows >= self.row_group_size || self.buffered_bytes >= self.block_size {
            self.flush_row_group()?;
        }
        Ok(())
    }

    fn finish(mut self) -> Result<SinkSummary, SinkError> {
        self.flush_row_group()?;
        self.writer.close()?;
        Ok(self.summary)
    }
}

/// Reads a Parquet file back as typed rows, one row group per batch.
pub struct ParquetSource {
    reader: SerializedFileReader<File>,
    schema: Schema,
    next_row_group: usize,
}

impl ParquetSource {
    pub fn open(path: &Path) -> Result<Self, SinkError> {
        let reader = SerializedFileReader::new(File::open(path)?)?;
        let message = message_from_descriptor(reader.metadata().file_metadata().schema_descr())?;
        let schema = Schema::from_message(message)?;
        Ok(Self {
            reader,
            schema,
            next_row_group: 0,
        })
    }

    pub fn meta(&self) -> ParquetMeta {
        let metadata = self.reader.metadata();
        ParquetMeta {
            rows: metadata.file_metadata().num_rows().max(0) as u64,
            row_groups: metadata.num_row_groups() as u64,
            created_by: metadata.file_metadata().created_by().map(str::to_string),
        }
    }

    fn read_row_group(&self, group: usize) -> Result<Vec<Vec<TypedValue>>, SinkError> {
        let row_group = self.reader.get_row_group(group)?;
        let rows = row_group.metadata().num_rows().max(0) as usize;
        let mut columns = Vec::with_capacity(self.schema.column_count());
        for (index, column) in self.schema.columns().iter().enumerate() {
            let nullable = column.nullable;
            let lt = column.logical_type;
            let cells = match row_group.get_column_reader(index)? {
                ColumnReader::BoolColumnReader(mut r) => {
                    expand(read_column(&mut r, rows, nullable)?, TypedValue::Boolean)
                }
                ColumnReader::Int32ColumnReader(mut r) => {
                    expand(read_column(&mut r, rows, nullable)?, |v| int32_value(v, lt))
                }
                ColumnReader::Int64ColumnReader(mut r) => {
                    expand(read_column(&mut r, rows, nullable)?, |v| int64_value(v, lt))
                }
                ColumnReader::Int96ColumnReader(mut r) => {
                    expand(read_column(&mut r, rows, nullable)?, |v| {
                        let d = v.data();
                        TypedValue::Timestamp(Int96Timestamp::from_words([d[0], d[1], d[2]]))
                    })
                }
                ColumnReader::FloatColumnReader(mut r) => {
                    expand(read_column(&mut r, rows, nullable)?, TypedValue::Float)
                }
                ColumnReader::DoubleColumnReader(mut r) => {
                    expand(read_column(&mut r, rows, nullable)?, TypedValue::Double)
                }
                ColumnReader::ByteArrayColumnReader(mut r) => {
                    expand(read_column(&mut r, rows, nullable)?, |v| {
                        bytes_value(v.data(), lt)
                    })
                }
                ColumnReader::FixedLenByteArrayColumnReader(mut r) => {
                    expand(read_column(&mut r, rows, nullable)?, |v| {
                        bytes_value(v.data(), lt)
                    })
                }
            };
            if cells.len() != rows {
                return Err(SinkError::ShortColumn {
                    column: column.name.clone(),
                    expected: rows,
                    found: cells.len(),
                });
            }
            columns.push(cells);
        }
        Ok(transpose(columns, rows))
    }
}

impl RowSource for ParquetSource {
    fn schema(&self) -> &Schema {
        &self.schema
    }

    fn next_batch(&mut self) -> Result<Option<Vec<Vec<TypedValue>>>, SinkError> {
        if self.next_row_group >= self.reader.metadata().num_row_groups() {
            return Ok(None);
        }
        let rows = self.read_row_group(self.next_row_group)?;
        self.next_row_group += 1;
        Ok(Some(rows))
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ParquetMeta {
    pub rows: u64,
    pub row_groups: u64,
    pub created_by: Option<String>,
}

/// Schema and footer facts of a Parquet file without reading any data pages.
pub fn read_meta(path: &Path) -> Result<(Schema, ParquetMeta), SinkError> {
    let source = ParquetSource::open(path)?;
    let meta = source.meta();
    Ok((source.schema, meta))
}

fn read_column<T: DataType>(
    reader: &mut ColumnReaderImpl<T>,
    rows: usize,
    nullable: bool,
) -> Result<(Vec<T::T>, Option<Vec<i16>>), SinkError> {
    let mut values = Vec::with_capacity(rows);
    let mut defs = Vec::with_capacity(if nullable { rows } else { 0 });
    let mut read = 0usize;
    while read < rows {
        let def_levels = if nullable { Some(&mut defs) } else { None };
        let (records, _, _) = reader.read_records(rows - read, def_levels, None, &mut values)?;
        if records == 0 {
            break;
        }
        read += records;
    }
    Ok((values, nullable.then_some(defs)))
}

fn expand<V>(
    (values, defs): (Vec<V>, Option<Vec<i16>>),
    convert: impl Fn(V) -> TypedValue,
) -> Vec<TypedValue> {
    match defs {
        None => values.into_iter().map(convert).collect(),
        Some(defs) => {
            let mut values = values.into_iter();
            defs.iter()
                .map(|level| match level {
                    0 => TypedValue::Null,
                    _ => values.next().map(&convert).unwrap_or(TypedValue::Null),
                })
                .collect()
        }
    }
}

fn transpose(columns: Vec<Vec<TypedValue>>, rows: usize) -> Vec<Vec<TypedValue>> {
    let mut out = (0..rows)
        .map(|_| Vec::with_capacity(columns.len()))
        .collect::<Vec<Vec<TypedValue>>>();
    for column in columns {
        for (row, cell) in out.iter_mut().zip(column) {
            row.push(cell);
        }
    }
    out
}

fn int32_value(v: i32, logical_type: LogicalType) -> TypedValue {
    match logical_type {
        LogicalType::Date => TypedValue::Date(v),
        LogicalType::TimeMillis => TypedValue::TimeMillis(v),
        LogicalType::Decimal { scale, .. } => TypedValue::Decimal {
            unscaled: i128::from(v),
            scale,
        },
        _ => TypedValue::Int32(v),
    }
}

fn int64_value(v: i64, logical_type: LogicalType) -> TypedValue {
    match logical_type {
        LogicalType::TimeMicros => TypedValue::TimeMicros(v),
        LogicalType::TimestampMillis => TypedValue::TimestampMillis(v),
        LogicalType::TimestampMicros => TypedValue::TimestampMicros(v),
        LogicalType::Decimal { scale, .. } => TypedValue::Decimal {
            unscaled: i128::from(v),
            scale,
        },
        _ => TypedValue::Int64(v),
    }
}

fn bytes_value(data: &[u8], logical_type: LogicalType) -> TypedValue {
    match logical_type {
        LogicalType::Decimal { scale, .. } => TypedValue::Decimal {
            unscaled: decimal_from_be_bytes(data),
            scale,
        },
        _ => TypedValue::Bytes(data.to_vec()),
    }
}

/// Minimal big-endian two's complement encoding, as Parquet stores BINARY decimals.
fn decimal_to_be_bytes(unscaled: i128) -> Vec<u8> {
    let bytes = unscaled.to_be_bytes();
    let mut start = 0;
    while start < bytes.len() - 1 {
        let redundant = (bytes[start] == 0x00 && bytes[start + 1] & 0x80 == 0)
            || (bytes[start] == 0xFF && bytes[start + 1] & 0x80 != 0);
        if !redundant {
            break;
        }
        start += 1;
    }
    bytes[start..].to_vec()
}

fn decimal_from_be_bytes(bytes: &[u8]) -> i128 {
    let negative = bytes.first().is_some_and(|b| b & 0x80 != 0);
    let seed: i128 = if negative { -1 } else { 0 };
    bytes
        .iter()
        .fold(seed, |acc, byte| (acc << 8) | i128::from(*byte))
}

fn parquet_schema(message: &MessageType) -> Result<Type, SinkError> {
    let fields = message
        .fields
        .iter()
        .map(|field| parquet_field(field).map(Arc::new))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Type::group_type_builder(&message.name)
        .with_fields(fields)
        .build()?)
}

fn parquet_field(field: &MessageField) -> Result<Type, SinkError> {
    let physical = match field.primitive {
        Primitive::Boolean => PhysicalType::BOOLEAN,
        Primitive::Int32 => PhysicalType::INT32,
        Primitive::Int64 => PhysicalType::INT64,
        Primitive::Int96 => PhysicalType::INT96,
        Primitive::Float => PhysicalType::FLOAT,
        Primitive::Double => PhysicalType::DOUBLE,
        Primitive::Binary => PhysicalType::BYTE_ARRAY,
        Primitive::FixedLenByteArray(_) => PhysicalType::FIXED_LEN_BYTE_ARRAY,
    };
    let repetition = match field.repetition {
        Repetition::Required => PqRepetition::REQUIRED,
        Repetition::Optional => PqRepetition::OPTIONAL,
    };
    let mut builder =
        Type::primitive_type_builder(&field.name, physical).with_repetition(repetition);
    if let Primitive::FixedLenByteArray(len) = field.primitive {
        builder = builder.with_length(len as i32);
    }
    if let Some(annotation) = field.annotation {
        let converted = match annotation {
            Annotation::Utf8 => ConvertedType::UTF8,
            Annotation::Date => ConvertedType::DATE,
            Annotation::TimeMillis => ConvertedType::TIME_MILLIS,
            Annotation::TimeMicros => ConvertedType::TIME_MICROS,
            Annotation::TimestampMillis => ConvertedType::TIMESTAMP_MILLIS,
            Annotation::TimestampMicros => ConvertedType::TIMESTAMP_MICROS,
            Annotation::Decimal { .. } => ConvertedType::DECIMAL,
            Annotation::Int8 => ConvertedType::INT_8,
            Annotation::Int16 => ConvertedType::INT_16,
            Annotation::Int32 => ConvertedType::INT_32,
            Annotation::Int64 => ConvertedType::INT_64,
        };
        builder = builder.with_converted_type(converted);
        if let Annotation::Decimal { precision, scale } = annotation {
            builder = builder
                .with_precision(precision as i32)
                .with_scale(scale as i32);
        }
    }
    Ok(builder.build()?)
}

fn message_from_descriptor(descr: &SchemaDescriptor) -> Result<MessageType, SinkError> {
    let fields = descr
        .columns()
        .iter()
        .map(|column| {
            let name = column.name().to_string();
            if column.max_rep_level() > 0 || column.path().parts().len() > 1 {
                return Err(SinkError::Unsupported {
                    column: column.path().string(),
                    detail: "nested or repeated columns cannot be flattened to CSV".to_string(),
                });
            }
            let primitive = match column.physical_type() {
                PhysicalType::BOOLEAN => Primitive::Boolean,
                PhysicalType::INT32 => Primitive::Int32,
                PhysicalType::INT64 => Primitive::Int64,
                PhysicalType::INT96 => Primitive::Int96,
                PhysicalType::FLOAT => Primitive::Float,
                PhysicalType::DOUBLE => Primitive::Double,
                PhysicalType::BYTE_ARRAY => Primitive::Binary,
                PhysicalType::FIXED_LEN_BYTE_ARRAY => {
                    Primitive::FixedLenByteArray(column.type_length().max(0) as u32)
                }
            };
            let annotation = match column.converted_type() {
                ConvertedType::NONE => None,
                ConvertedType::UTF8 => Some(Annotation::Utf8),
                ConvertedType::DATE => Some(Annotation::Date),
                ConvertedType::TIME_MILLIS => Some(Annotation::TimeMillis),
                ConvertedType::TIME_MICROS => Some(Annotation::TimeMicros),
                ConvertedType::TIMESTAMP_MILLIS => Some(Annotation::TimestampMillis),
                ConvertedType::TIMESTAMP_MICROS => Some(Annotation::TimestampMicros),
                ConvertedType::DECIMAL => Some(Annotation::Decimal {
                    precision: column.type_precision().max(0) as u32,
                    scale: column.type_scale().max(0) as u32,
                }),
                ConvertedType::INT_8 => Some(Annotation::Int8),
                ConvertedType::INT_16 => Some(Annotation::Int16),
                ConvertedType::INT_32 => Some(Annotation::Int32),
                ConvertedType::INT_64 => Some(Annotation::Int64),
                other => {
                    return Err(SinkError::Unsupported {
                        column: name,
                        detail: format!("converted type {other} has no column mapping"),
                    });
                }
            };
            let repetition = if column.max_def_level() > 0 {
                Repetition::Optional
            } else {
                Repetition::Required
            };
            Ok(MessageField {
                name,
                repetition,
                primitive,
                annotation,
            })
        })
        .collect::<Result<Vec<_>, SinkError>>()?;
    Ok(MessageType::new(descr.name(), fields))
}

fn writer_properties(options: &WriterOptions) -> WriterProperties {
    let compression = match options.compression {
        Compression::Uncompressed => PqCompression::UNCOMPRESSED,
        Compression::Gzip => PqCompression::GZIP(GzipLevel::default()),
        Compression::Snappy => PqCompression::SNAPPY,
        Compression::Zstd => PqCompression::ZSTD(ZstdLevel::default()),
    };
    WriterProperties::builder()
        .set_compression(compression)
        .set_dictionary_enabled(options.dictionary)
        .set_data_page_size_limit(options.page_size)
        .set_max_row_group_size(options.row_group_size.max(1))
        .set_created_by(format!("csv2parquet version {}", env!("CARGO_PKG_VERSION")))
        .build()
}
