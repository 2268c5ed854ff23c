//! Purpose: Write typed rows as an ORC file through Arrow record batches.
//! Exports: `OrcSink`, `orc_data_type`.
//! Role: `RowSink` for `.orc` outputs; the column layout comes from the struct form of the schema.
//! Invariants: A row is validated in full before any builder is touched.
//! Invariants: Stripes are written uncompressed; `stripe_size` bounds their encoded bytes.
use std::fs::File;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;

use arrow::array::{
    ArrayRef, BinaryBuilder, BooleanBuilder, Float32Builder, Float64Builder, Int8Builder,
    Int16Builder, Int32Builder, Int64Builder, StringBuilder,
};
use arrow::datatypes::{DataType, Field, Schema as ArrowSchema, SchemaRef};
use arrow::record_batch::RecordBatch;
use orc_rust::{ArrowWriter, ArrowWriterBuilder};

use crate::core::columnar::{RowSink, SinkError, SinkSummary};
use crate::core::options::WriterOptions;
use crate::core::schema::{Column, Schema};
use crate::core::struct_type::Category;
use crate::core::value::TypedValue;

/// Rows handed to the ORC writer per record batch.
const BATCH_ROWS: usize = 1024;

/// Arrow type the ORC writer encodes for `category`; `None` when it has no encoder for it.
pub fn orc_data_type(category: &Category) -> Option<DataType> {
    let data_type = match category {
        Category::Boolean => DataType::Boolean,
        Category::Byte => DataType::Int8,
        Category::Short => DataType::Int16,
        Category::Int => DataType::Int32,
        Category::Long => DataType::Int64,
        Category::Float => DataType::Float32,
        Category::Double => DataType::Float64,
        Category::String | Category::Varchar(_) | Category::Char(_) => DataType::Utf8,
        Category::Binary(_) => DataType::Binary,
        Category::Decimal { .. } | Category::Date | Category::Timestamp | Category::Nested(..) => {
            return None;
        }
    };
    Some(data_type)
}

enum OrcCell {
    Null,
    Bool(bool),
    I8(i8),
    I16(i16),
    I32(i32),
    I64(i64),
    F32(f32),
    F64(f64),
    Text(String),
    Bytes(Vec<u8>),
}

enum Builder {
    Bool(BooleanBuilder),
    Int8(Int8Builder),
    Int16(Int16Builder),
    Int32(Int32Builder),
    Int64(Int64Builder),
    Float(Float32Builder),
    Double(Float64Builder),
    Text(StringBuilder),
    Bytes(BinaryBuilder),
}

struct OrcColumn {
    column: Column,
    builder: Builder,
}

impl OrcColumn {
    fn new(column: Column, data_type: &DataType) -> Option<Self> {
        let builder = match data_type {
            DataType::Boolean => Builder::Bool(BooleanBuilder::new()),
            DataType::Int8 => Builder::Int8(Int8Builder::new()),
            DataType::Int16 => Builder::Int16(Int16Builder::new()),
            DataType::Int32 => Builder::Int32(Int32Builder::new()),
            DataType::Int64 => Builder::Int64(Int64Builder::new()),
            DataType::Float32 => Builder::Float(Float32Builder::new()),
            DataType::Float64 => Builder::Double(Float64Builder::new()),
            DataType::Utf8 => Builder::Text(StringBuilder::new()),
            DataType::Binary => Builder::Bytes(BinaryBuilder::new()),
            _ => return None,
        };
        Some(Self { column, builder })
    }

    fn to_cell(&self, index: usize, value: &TypedValue) -> Result<OrcCell, SinkError> {
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
            return Ok(OrcCell::Null);
        }
        if !value.fits(self.column.logical_type) {
            return Err(mismatch());
        }
        let cell = match (&self.builder, value) {
            (Builder::Bool(_), TypedValue::Boolean(v)) => OrcCell::Bool(*v),
            (Builder::Int8(_), TypedValue::Int32(v)) => {
                OrcCell::I8(i8::try_from(*v).map_err(|_| mismatch())?)
            }
            (Builder::Int16(_), TypedValue::Int32(v)) => {
                OrcCell::I16(i16::try_from(*v).map_err(|_| mismatch())?)
            }
            (Builder::Int32(_), TypedValue::Int32(v)) => OrcCell::I32(*v),
            (Builder::Int64(_), TypedValue::Int64(v)) => OrcCell::I64(*v),
            (Builder::Float(_), TypedValue::Float(v)) => OrcCell::F32(*v),
            (Builder::Double(_), TypedValue::Double(v)) => OrcCell::F64(*v),
            (Builder::Text(_), TypedValue::Bytes(bytes)) => {
                let text = String::from_utf8(bytes.clone()).map_err(|_| SinkError::Unsupported {
                    column: self.column.name.clone(),
                    detail: "string values must be valid UTF-8".to_string(),
                })?;
                OrcCell::Text(text)
            }
            (Builder::Bytes(_), TypedValue::Bytes(bytes)) => OrcCell::Bytes(bytes.clone()),
            _ => return Err(mismatch()),
        };
        Ok(cell)
    }

    fn push(&mut self, cell: OrcCell) {
        match (&mut self.builder, cell) {
            (Builder::Bool(b), OrcCell::Null) => b.append_null(),
            (Builder::Int8(b), OrcCell::Null) => b.append_null(),
            (Builder::Int16(b), OrcCell::Null) => b.append_null(),
            (Builder::Int32(b), OrcCell::Null) => b.append_null(),
            (Builder::Int64(b), OrcCell::Null) => b.append_null(),
            (Builder::Float(b), OrcCell::Null) => b.append_null(),
            (Builder::Double(b), OrcCell::Null) => b.append_null(),
            (Builder::Text(b), OrcCell::Null) => b.append_null(),
            (Builder::Bytes(b), OrcCell::Null) => b.append_null(),
            (Builder::Bool(b), OrcCell::Bool(v)) => b.append_value(v),
            (Builder::Int8(b), OrcCell::I8(v)) => b.append_value(v),
            (Builder::Int16(b), OrcCell::I16(v)) => b.append_value(v),
            (Builder::Int32(b), OrcCell::I32(v)) => b.append_value(v),
            (Builder::Int64(b), OrcCell::I64(v)) => b.append_value(v),
            (Builder::Float(b), OrcCell::F32(v)) => b.append_value(v),
            (Builder::Double(b), OrcCell::F64(v)) => b.append_value(v),
            (Builder::Text(b), OrcCell::Text(v)) => b.append_value(v),
            (Builder::Bytes(b), OrcCell::Bytes(v)) => b.append_value(v),
            // to_cell only produces cells matching the column's builder.
            _ => {}
        }
    }

    fn finish(&mut self) -> ArrayRef {
        match &mut self.builder {
            Builder::Bool(b) => Arc::new(b.finish()),
            Builder::Int8(b) => Arc::new(b.finish()),
            Builder::Int16(b) => Arc::new(b.finish()),
            Builder::Int32(b) => Arc::new(b.finish()),
            Builder::Int64(b) => Arc::new(b.finish()),
            Builder::Float(b) => Arc::new(b.finish()),
            Builder::Double(b) => Arc::new(b.finish()),
            Builder::Text(b) => Arc::new(b.finish()),
            Builder::Bytes(b) => Arc::new(b.finish()),
        }
    }
}

/// Buffers typed rows and hands them to the ORC writer as Arrow record batches.
pub struct OrcSink<W: Write + Send> {
    writer: ArrowWriter<W>,
    arrow_schema: SchemaRef,
    columns: Vec<OrcColumn>,
    buffered_rows: usize,
    summary: SinkSummary,
}

impl OrcSink<File> {
    /// Creates (or truncates) `path`; stripes are encoded in memory and written whole.
    pub fn create(path: &Path, schema: &Schema, options: &WriterOptions) -> Result<Self, SinkError> {
        let (arrow_schema, columns) = orc_layout(schema)?;
        let file = File::create(path)?;
        Self::with_layout(file, arrow_schema, columns, options)
    }
}

impl<W: Write + Send> OrcSink<W> {
    pub fn new(out: W, schema: &Schema, options: &WriterOptions) -> Result<Self, SinkError> {
        let (arrow_schema, columns) = orc_layout(schema)?;
        Self::with_layout(out, arrow_schema, columns, options)
    }

    fn with_layout(
        out: W,
        arrow_schema: SchemaRef,
        columns: Vec<OrcColumn>,
        options: &WriterOptions,
    ) -> Result<Self, SinkError> {
        let writer = ArrowWriterBuilder::new(out, arrow_schema.clone())
            .with_stripe_byte_size(options.stripe_size.max(1))
            .try_build()?;
        Ok(Self {
            writer,
            arrow_schema,
            columns,
            buffered_rows: 0,
            summary: SinkSummary::default(),
        })
    }

    fn flush_batch(&mut self) -> Result<(), SinkError> {
        if self.buffered_rows == 0 {
            return Ok(());
        }
        let arrays = self
            .columns
            .iter_mut()
            .map(OrcColumn::finish)
            .collect::<Vec<_>>();
        let batch = RecordBatch::try_new(self.arrow_schema.clone(), arrays)?;
        self.writer.write(&batch)?;
        tracing::debug!(rows = self.buffered_rows, "wrote ORC batch");
        self.summary.row_groups += 1;
        self.buffered_rows = 0;
        Ok(())
    }
}

impl<W: Write + Send> RowSink for OrcSink<W> {
    fn write_row(&mut self, row: &[TypedValue]) -> Result<(), SinkError> {
        if row.len() != self.columns.len() {
            return Err(SinkError::RowWidth {
                expected: self.columns.len(),
                found: row.len(),
            });
        }
        let cells = self
            .columns
            .iter()
            .zip(row)
            .enumerate()
            .map(|(index, (column, value))| column.to_cell(index, value))
            .collect::<Result<Vec<_>, _>>()?;
        for (column, cell) in self.columns.iter_mut().zip(cells) {
            column.push(cell);
        }
        self.buffered_rows += 1;
        self.summary.rows += 1;
        if self.buffered_rows >= BATCH_ROWS {
            self.flush_batch()?;
        }
        Ok(())
    }

    fn finish(mut self) -> Result<SinkSummary, SinkError> {
        self.flush_batch()?;
        self.writer.close()?;
        Ok(self.summary)
    }
}

fn orc_layout(schema: &Schema) -> Result<(SchemaRef, Vec<OrcColumn>), SinkError> {
    let mut fields = Vec::with_capacity(schema.column_count());
    let mut columns = Vec::with_capacity(schema.column_count());
    for (column, field) in schema.columns().iter().zip(&schema.struct_type().fields) {
        let unsupported = || SinkError::Unsupported {
            column: column.name.clone(),
            detail: format!("ORC output has no encoder for `{}`", field.category),
        };
        let data_type = orc_data_type(&field.category).ok_or_else(unsupported)?;
        let orc_column = OrcColumn::new(column.clone(), &data_type).ok_or_else(unsupported)?;
        fields.push(Field::new(column.name.as_str(), data_type, column.nullable));
        columns.push(orc_column);
    }
    Ok((Arc::new(ArrowSchema::new(fields)), columns))
}

#[cfg(test)]
mod tests {
    use super::{OrcSink, orc_data_type};
    use crate::core::columnar::{RowSink, SinkError};
    use crate::core::options::WriterOptions;
    use crate::core::schema::Schema;
    use crate::core::struct_type::Category;
    use crate::core::value::TypedValue;
    use arrow::array::{Array, BooleanArray, Float64Array, Int64Array, Int8Array, StringArray};
    use arrow::datatypes::DataType;
    use orc_rust::ArrowReaderBuilder;

    fn schema() -> Schema {
        Schema::parse("struct<tiny:tinyint,id:bigint,name:string,ratio:double,ok:boolean>")
            .expect("schema")
    }

    fn row(id: i64, name: Option<&str>) -> Vec<TypedValue> {
        vec![
            TypedValue::Int32(7),
            TypedValue::Int64(id),
            name.map(|n| TypedValue::Bytes(n.as_bytes().to_vec()))
                .unwrap_or(TypedValue::Null),
            TypedValue::Double(0.5),
            TypedValue::Boolean(id % 2 == 0),
        ]
    }

    #[test]
    fn written_file_reads_back_through_arrow() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("out.orc");
        let mut sink =
            OrcSink::create(&path, &schema(), &WriterOptions::default()).expect("sink");
        for (id, name) in [(1, Some("a")), (2, None), (3, Some("c"))] {
            sink.write_row(&row(id, name)).expect("write");
        }
        let summary = sink.finish().expect("finish");
        assert_eq!(summary.rows, 3);
        assert_eq!(summary.row_groups, 1);

        let bytes = std::fs::read(&path).expect("read");
        assert_eq!(&bytes[..3], b"ORC");

        let file = std::fs::File::open(&path).expect("open");
        let batches = ArrowReaderBuilder::try_new(file)
            .expect("reader")
            .build()
            .collect::<Result<Vec<_>, _>>()
            .expect("batches");
        let rows = batches.iter().map(|b| b.num_rows()).sum::<usize>();
        assert_eq!(rows, 3);
        let batch = &batches[0];
        let tiny = batch
            .column(0)
            .as_any()
            .downcast_ref::<Int8Array>()
            .expect("tinyint column");
        assert_eq!(tiny.value(0), 7);
        let ids = batch
            .column(1)
            .as_any()
            .downcast_ref::<Int64Array>()
            .expect("bigint column");
        assert_eq!(ids.value(2), 3);
        let names = batch
            .column(2)
            .as_any()
            .downcast_ref::<StringArray>()
            .expect("string column");
        assert_eq!(names.value(0), "a");
        assert!(names.is_null(1));
        let ratios = batch
            .column(3)
            .as_any()
            .downcast_ref::<Float64Array>()
            .expect("double column");
        assert_eq!(ratios.value(1), 0.5);
        let flags = batch
            .column(4)
            .as_any()
            .downcast_ref::<BooleanArray>()
            .expect("boolean column");
        assert!(flags.value(1));
    }

    #[test]
    fn rows_are_validated_before_buffering() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("out.orc");
        let mut sink =
            OrcSink::create(&path, &schema(), &WriterOptions::default()).expect("sink");
        let mut overflow = row(1, Some("a"));
        overflow[0] = TypedValue::Int32(300);
        assert!(matches!(
            sink.write_row(&overflow),
            Err(SinkError::TypeMismatch { column_index: 0, .. })
        ));
        assert!(matches!(
            sink.write_row(&[TypedValue::Int64(1)]),
            Err(SinkError::RowWidth { expected: 5, found: 1 })
        ));
        sink.write_row(&row(2, Some("b"))).expect("write");
        assert_eq!(sink.finish().expect("finish").rows, 1);
    }

    #[test]
    fn required_columns_reject_nulls() {
        let schema = Schema::parse("message m { required int64 id; }").expect("schema");
        let mut sink = OrcSink::new(Vec::new(), &schema, &WriterOptions::default()).expect("sink");
        assert!(matches!(
            sink.write_row(&[TypedValue::Null]),
            Err(SinkError::NullInRequired { column_index: 0, .. })
        ));
    }

    #[test]
    fn columns_without_an_encoder_are_rejected_up_front() {
        let schema = Schema::parse("struct<id:int,day:date>").expect("schema");
        let err = OrcSink::new(Vec::new(), &schema, &WriterOptions::default())
            .err()
            .expect("date column rejected");
        assert!(matches!(err, SinkError::Unsupported { ref column, .. } if column == "day"));
        assert_eq!(orc_data_type(&Category::Varchar(8)), Some(DataType::Utf8));
        assert_eq!(orc_data_type(&Category::Binary(Some(4))), Some(DataType::Binary));
        assert_eq!(orc_data_type(&Category::Timestamp), None);
    }
}
