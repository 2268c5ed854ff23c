//! Purpose: Drive whole-file conversions between delimited text and columnar rows.
//! Exports: `convert`, `export`, `ConvertOutcome`, `ExportOutcome`, `ShapedRecord`, `PipelineError`.
//! Role: Glue between the csv reader/writer, `RowShaper`, `ValueCodec` and a sink or source.
//! Invariants: Records are processed one at a time, in input order.
//! Invariants: The first failing record aborts the conversion; its line is reported.
//! Invariants: Header lines are skipped before shaping and never decoded.
use std::io::{Read, Write};

use bstr::ByteSlice;

use crate::core::columnar::{RowSink, RowSource, SinkError};
use crate::core::options::CsvDialect;
use crate::core::row::{self, Shape};
use crate::core::schema::Schema;
use crate::core::value::{DecodeError, EncodeError, ValueCodec};

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct ConvertOutcome {
    pub records: u64,
    pub header_lines: u64,
    pub rows: u64,
    pub shaped_rows: u64,
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct ExportOutcome {
    pub rows: u64,
    pub batches: u64,
}

/// A record whose width did not match the schema.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ShapedRecord {
    pub line: u64,
    pub shape: Shape,
}

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("malformed delimited input")]
    Csv {
        line: Option<u64>,
        #[source]
        source: csv::Error,
    },
    #[error("cannot decode record")]
    Decode {
        line: u64,
        #[source]
        source: DecodeError,
    },
    #[error("cannot encode row {row}")]
    Encode {
        row: u64,
        #[source]
        source: EncodeError,
    },
    #[error("columnar storage rejected the data")]
    Sink {
        line: Option<u64>,
        #[source]
        source: SinkError,
    },
    #[error("cannot write delimited output")]
    Io(#[source] std::io::Error),
}

impl PipelineError {
    pub fn line(&self) -> Option<u64> {
        match self {
            PipelineError::Csv { line, .. } | PipelineError::Sink { line, .. } => *line,
            PipelineError::Decode { line, .. } => Some(*line),
            PipelineError::Encode { .. } | PipelineError::Io(_) => None,
        }
    }
}

fn csv_error(source: csv::Error) -> PipelineError {
    let line = source.position().map(|pos| pos.line());
    PipelineError::Csv { line, source }
}

/// Reads every record from `reader`, shapes and decodes it, and hands it to `sink`.
///
/// The sink is borrowed so several inputs can be appended to one output before `finish`.
pub fn convert<R, S, F>(
    reader: R,
    schema: &Schema,
    dialect: &CsvDialect,
    sink: &mut S,
    mut on_shaped: F,
) -> Result<ConvertOutcome, PipelineError>
where
    R: Read,
    S: RowSink,
    F: FnMut(ShapedRecord),
{
    let mut csv_reader = csv::ReaderBuilder::new()
        .delimiter(dialect.separator)
        .quote(dialect.quote)
        .escape(dialect.escape)
        .double_quote(true)
        .has_headers(false)
        .flexible(true)
        .from_reader(reader);
    let codec = ValueCodec::new(schema, dialect);
    let column_count = schema.column_count();
    let mut outcome = ConvertOutcome::default();
    let mut record = csv::ByteRecord::new();

    while csv_reader.read_byte_record(&mut record).map_err(csv_error)? {
        outcome.records += 1;
        let line = record
            .position()
            .map(|pos| pos.line())
            .unwrap_or(outcome.records);
        if outcome.header_lines < dialect.header_lines as u64 {
            outcome.header_lines += 1;
            continue;
        }

        let mut fields = record
            .iter()
            .map(|field| field.to_str_lossy().into_owned())
            .collect::<Vec<_>>();
        let shape = row::shape(&mut fields, column_count);
        if shape.changed() {
            outcome.shaped_rows += 1;
            tracing::debug!(line, ?shape, "record width differs from schema");
            on_shaped(ShapedRecord { line, shape });
        }

        let values = codec
            .decode_row(&fields)
            .map_err(|source| PipelineError::Decode { line, source })?;
        sink.write_row(&values)
            .map_err(|source| PipelineError::Sink {
                line: Some(line),
                source,
            })?;
        outcome.rows += 1;
    }

    Ok(outcome)
}

/// Writes every row of `source` as one delimited line.
pub fn export<S, W>(
    source: &mut S,
    dialect: &CsvDialect,
    out: W,
    header: bool,
) -> Result<ExportOutcome, PipelineError>
where
    S: RowSource,
    W: Write,
{
    let schema = source.schema().clone();
    let codec = ValueCodec::new(&schema, dialect);
    let mut builder = csv::WriterBuilder::new();
    builder.delimiter(dialect.separator).quote(dialect.quote);
    match dialect.escape {
        Some(escape) => builder.double_quote(false).escape(escape),
        None => builder.double_quote(true),
    };
    let mut writer = builder.from_writer(out);

    if header {
        writer
            .write_record(schema.columns().iter().map(|column| column.name.as_str()))
            .map_err(csv_error)?;
    }

    let mut outcome = ExportOutcome::default();
    loop {
        let batch = source
            .next_batch()
            .map_err(|source| PipelineError::Sink { line: None, source })?;
        let Some(rows) = batch else {
            break;
        };
        outcome.batches += 1;
        for values in rows {
            outcome.rows += 1;
            let fields = codec
                .encode_row(&values)
                .map_err(|source| PipelineError::Encode {
                    row: outcome.rows,
                    source,
                })?;
            writer.write_record(&fields).map_err(csv_error)?;
        }
    }
    writer.flush().map_err(PipelineError::Io)?;
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::{PipelineError, ShapedRecord, convert, export};
    use crate::core::columnar::{RowSink, RowSource, SinkError, SinkSummary};
    use crate::core::options::CsvDialect;
    use crate::core::row::Shape;
    use crate::core::schema::Schema;
    use crate::core::value::TypedValue;

    #[derive(Default)]
    struct MemorySink {
        rows: Vec<Vec<TypedValue>>,
    }

    impl RowSink for MemorySink {
        fn write_row(&mut self, row: &[TypedValue]) -> Result<(), SinkError> {
            self.rows.push(row.to_vec());
            Ok(())
        }

        fn finish(self) -> Result<SinkSummary, SinkError> {
            Ok(SinkSummary {
                rows: self.rows.len() as u64,
                row_groups: 1,
            })
        }
    }

    struct MemorySource {
        schema: Schema,
        batches: Vec<Vec<Vec<TypedValue>>>,
    }

    impl RowSource for MemorySource {
        fn schema(&self) -> &Schema {
            &self.schema
        }

        fn next_batch(&mut self) -> Result<Option<Vec<Vec<TypedValue>>>, SinkError> {
            if self.batches.is_empty() {
                return Ok(None);
            }
            Ok(Some(self.batches.remove(0)))
        }
    }

    fn schema() -> Schema {
        Schema::parse("struct<id:int,name:string,day:date>").expect("schema")
    }

    #[test]
    fn converts_records_and_shapes_widths() {
        let schema = schema();
        let dialect = CsvDialect {
            header_lines: 1,
            ..CsvDialect::default()
        };
        let input = "id,name,day\n1,alice,2017-05-02\n2,bob\n3,\"c, d\",1970-01-02,extra\n";
        let mut sink = MemorySink::default();
        let mut shaped = Vec::new();
        let outcome = convert(input.as_bytes(), &schema, &dialect, &mut sink, |rec| {
            shaped.push(rec)
        })
        .expect("convert");

        assert_eq!(outcome.header_lines, 1);
        assert_eq!(outcome.rows, 3);
        assert_eq!(outcome.shaped_rows, 2);
        assert_eq!(
            shaped,
            vec![
                ShapedRecord {
                    line: 3,
                    shape: Shape::Padded { missing: 1 }
                },
                ShapedRecord {
                    line: 4,
                    shape: Shape::Truncated { dropped: 1 }
                },
            ]
        );
        assert_eq!(sink.rows[1][2], TypedValue::Null);
        assert_eq!(sink.rows[2][1], TypedValue::Bytes(b"c, d".to_vec()));
        assert_eq!(sink.rows[2][2], TypedValue::Date(1));
    }

    #[test]
    fn decode_failure_reports_line_and_stops() {
        let schema = schema();
        let dialect = CsvDialect::default();
        let input = "1,a,2017-05-02\nx,b,2017-05-02\n3,c,2017-05-02\n";
        let mut sink = MemorySink::default();
        let err = convert(input.as_bytes(), &schema, &dialect, &mut sink, |_| {}).unwrap_err();
        assert_eq!(err.line(), Some(2));
        match err {
            PipelineError::Decode { source, .. } => {
                assert_eq!(source.column_index, 0);
                assert_eq!(source.raw_text, "x");
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(sink.rows.len(), 1);
    }

    #[test]
    fn custom_separator_and_escape() {
        let schema = schema();
        let dialect = CsvDialect {
            separator: b'|',
            ..CsvDialect::default()
        };
        let input = "1|\"say \\\"hi\\\"\"|19700102\n";
        let mut sink = MemorySink::default();
        convert(input.as_bytes(), &schema, &dialect, &mut sink, |_| {}).expect("convert");
        assert_eq!(sink.rows[0][1], TypedValue::Bytes(b"say \"hi\"".to_vec()));
        assert_eq!(sink.rows[0][2], TypedValue::Date(1));
    }

    #[test]
    fn export_writes_header_and_null_marker() {
        let mut source = MemorySource {
            schema: schema(),
            batches: vec![
                vec![vec![
                    TypedValue::Int32(1),
                    TypedValue::Bytes(b"a,b".to_vec()),
                    TypedValue::Date(17_288),
                ]],
                vec![vec![TypedValue::Int32(2), TypedValue::Null, TypedValue::Null]],
            ],
        };
        let dialect = CsvDialect {
            escape: None,
            null_marker: "NULL".to_string(),
            ..CsvDialect::default()
        };
        let mut out = Vec::new();
        let outcome = export(&mut source, &dialect, &mut out, true).expect("export");
        assert_eq!(outcome.rows, 2);
        assert_eq!(outcome.batches, 2);
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "id,name,day\n1,\"a,b\",2017-05-02\n2,NULL,NULL\n"
        );
    }

    #[test]
    fn export_reports_mismatched_values() {
        let mut source = MemorySource {
            schema: schema(),
            batches: vec![vec![vec![
                TypedValue::Double(1.0),
                TypedValue::Null,
                TypedValue::Null,
            ]]],
        };
        let err = export(&mut source, &CsvDialect::default(), Vec::new(), false).unwrap_err();
        assert!(matches!(err, PipelineError::Encode { row: 1, .. }));
    }
}
