//! Purpose: Open delimited inputs (plain or gzip) and append them to one row sink.
//! Exports: `IngestConfig`, `IngestOutcome`, `InputReport`, `open_input`, `ingest`.
//! Role: Input ingestion engine used by `convert`; isolates file handling from main.
//! Invariants: Inputs are read sequentially, in the order given, into the same sink.
//! Invariants: A failing input stops ingestion; the error carries the input path.
//! Invariants: Readers are buffered and dropped before the next input is opened.
use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::{Path, PathBuf};

use csv2parquet::api::{
    ConvertOutcome, CsvDialect, Error, ErrorKind, RowSink, Schema, ShapedRecord, convert,
};
use flate2::read::MultiGzDecoder;

use crate::file_paths::is_gzip;

#[derive(Copy, Clone, Debug)]
pub struct IngestConfig<'a> {
    pub schema: &'a Schema,
    pub dialect: &'a CsvDialect,
}

#[derive(Clone, Debug, Default)]
pub struct IngestOutcome {
    pub files: u64,
    pub records: u64,
    pub rows: u64,
    pub shaped_rows: u64,
    pub inputs: Vec<InputReport>,
}

/// Per-input facts the CLI turns into notices.
#[derive(Clone, Debug)]
pub struct InputReport {
    pub path: PathBuf,
    pub outcome: ConvertOutcome,
    pub first_shaped_line: Option<u64>,
}

fn io_error(err: io::Error, message: &str, path: &Path) -> Error {
    let kind = if err.kind() == io::ErrorKind::NotFound {
        ErrorKind::NotFound
    } else {
        ErrorKind::Io
    };
    Error::new(kind)
        .with_message(message)
        .with_path(path)
        .with_source(err)
}

/// Opens `path` for reading, decompressing when it ends in `.gz`.
pub fn open_input(path: &Path) -> Result<Box<dyn Read>, Error> {
    let file = File::open(path).map_err(|err| io_error(err, "failed to open input", path))?;
    let reader = BufReader::new(file);
    if is_gzip(path) {
        return Ok(Box::new(MultiGzDecoder::new(reader)));
    }
    Ok(Box::new(reader))
}

pub fn ingest<S, N>(
    inputs: &[PathBuf],
    config: IngestConfig<'_>,
    sink: &mut S,
    mut on_shaped: N,
) -> Result<IngestOutcome, Error>
where
    S: RowSink,
    N: FnMut(&Path, ShapedRecord),
{
    let mut outcome = IngestOutcome::default();
    for path in inputs {
        tracing::info!(input = %path.display(), "converting input");
        let reader = open_input(path)?;
        let mut first_shaped_line = None;
        let converted = convert(reader, config.schema, config.dialect, sink, |record| {
            first_shaped_line.get_or_insert(record.line);
            on_shaped(path.as_path(), record);
        })
        .map_err(|err| Error::from(err).with_path(path))?;
        tracing::info!(
            input = %path.display(),
            rows = converted.rows,
            shaped_rows = converted.shaped_rows,
            "input converted"
        );

        outcome.files += 1;
        outcome.records += converted.records;
        outcome.rows += converted.rows;
        outcome.shaped_rows += converted.shaped_rows;
        outcome.inputs.push(InputReport {
            path: path.clone(),
            outcome: converted,
            first_shaped_line,
        });
    }
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::{IngestConfig, ingest, open_input};
    use csv2parquet::api::{
        CsvDialect, ErrorKind, RowSink, Schema, SinkError, SinkSummary, TypedValue,
    };
    use flate2::Compression;
    use flate2::write::GzEncoder;
    use std::io::{Read, Write};

    #[derive(Default)]
    struct CollectSink {
        rows: Vec<Vec<TypedValue>>,
    }

    impl RowSink for CollectSink {
        fn write_row(&mut self, row: &[TypedValue]) -> Result<(), SinkError> {
            self.rows.push(row.to_vec());
            Ok(())
        }

        fn finish(self) -> Result<SinkSummary, SinkError> {
            Ok(SinkSummary::default())
        }
    }

    #[test]
    fn gzip_inputs_are_decompressed() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("in.csv.gz");
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(b"1,a\n2,b\n").unwrap();
        std::fs::write(&path, encoder.finish().unwrap()).unwrap();

        let mut text = String::new();
        open_input(&path)
            .expect("open")
            .read_to_string(&mut text)
            .unwrap();
        assert_eq!(text, "1,a\n2,b\n");
    }

    #[test]
    fn inputs_append_in_order_and_report_shaping() {
        let temp = tempfile::tempdir().expect("tempdir");
        let first = temp.path().join("a.csv");
        let second = temp.path().join("b.csv");
        std::fs::write(&first, "1,a\n2\n").unwrap();
        std::fs::write(&second, "3,c\n").unwrap();

        let schema = Schema::parse("struct<id:int,name:string>").unwrap();
        let dialect = CsvDialect::default();
        let mut sink = CollectSink::default();
        let mut shaped = Vec::new();
        let outcome = ingest(
            &[first.clone(), second],
            IngestConfig {
                schema: &schema,
                dialect: &dialect,
            },
            &mut sink,
            |path, record| shaped.push((path.to_path_buf(), record.line)),
        )
        .expect("ingest");

        assert_eq!(outcome.files, 2);
        assert_eq!(outcome.rows, 3);
        assert_eq!(outcome.shaped_rows, 1);
        assert_eq!(outcome.inputs[0].first_shaped_line, Some(2));
        assert_eq!(shaped, vec![(first, 2)]);
        assert_eq!(sink.rows[2][0], TypedValue::Int32(3));
    }

    #[test]
    fn missing_input_is_not_found() {
        let temp = tempfile::tempdir().expect("tempdir");
        let err = open_input(&temp.path().join("absent.csv")).err().expect("error");
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert!(err.path().is_some());
    }
}
