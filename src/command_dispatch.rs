//! Purpose: Hold top-level CLI command dispatch for `csv2parquet`.
//! Exports: `dispatch_command`.
//! Role: Keep `main.rs` focused on parse/bootstrap and delegate command execution.
//! Invariants: Command behavior, output envelopes, and exit code semantics stay unchanged.
//! Invariants: Helpers in `main.rs` remain the source of command business logic.

use super::*;

pub(super) fn dispatch_command(command: Command, color_mode: ColorMode) -> Result<RunOutcome, Error> {
    match command {
        Command::Completion { shell } => {
            let mut cmd = Cli::command();
            clap_complete::aot::generate(shell, &mut cmd, "csv2parquet", &mut io::stdout());
            Ok(RunOutcome::ok())
        }
        Command::Version => {
            emit_version_output(color_mode);
            Ok(RunOutcome::ok())
        }
        Command::Convert {
            inputs,
            schema,
            output,
            force,
            header,
            dialect,
            compression,
            row_group_size,
            page_size,
            no_dictionary,
            defines,
        } => {
            let mut csv_dialect = dialect.to_dialect(header)?;
            let options = build_writer_options(
                &defines,
                compression.as_deref(),
                row_group_size,
                page_size,
                no_dictionary,
                &mut csv_dialect,
            )?;
            if let Some(format) = dialect.csv_format {
                csv_dialect.binary_literals = format == CsvFormat::Binary;
            }
            let Some(first) = inputs.first() else {
                return Err(Error::new(ErrorKind::Usage)
                    .with_message("convert requires at least one input")
                    .with_hint("Use `csv2parquet convert <input.csv>...`."));
            };
            let output = output.unwrap_or_else(|| PathBuf::from(DEFAULT_PARQUET_OUTPUT));
            let format = OutputFormat::for_output(&output);
            if format == OutputFormat::Orc && compression.is_some() {
                tracing::warn!("--compression applies to Parquet output; ORC stripes are uncompressed");
            }
            let schema = load_schema(schema.as_deref(), first, format)?;
            ensure_output_writable(&output, force)?;

            let (outcome, summary) =
                match convert_files(&inputs, &schema, &csv_dialect, &output, format, &options) {
                    Ok(result) => result,
                    Err(err) => {
                        remove_partial_output(&output);
                        return Err(err);
                    }
                };
            for report in &outcome.inputs {
                for notice in input_notices(report, &csv_dialect, schema.column_count()) {
                    emit_notice(&notice, color_mode);
                }
            }
            tracing::info!(
                output = %output.display(),
                format = format.name(),
                rows = summary.rows,
                row_groups = summary.row_groups,
                "conversion finished"
            );
            emit_json(
                json!({
                    "files": outcome.files,
                    "rows": summary.rows,
                    "shaped_rows": outcome.shaped_rows,
                    "row_groups": summary.row_groups,
                    "format": format.name(),
                    "output": output.display().to_string(),
                }),
                color_mode,
            );
            Ok(RunOutcome::ok())
        }
        Command::Export {
            input,
            output,
            force,
            dialect,
            header,
        } => {
            let csv_dialect = dialect.to_dialect(0)?;
            let mut source =
                ParquetSource::open(&input).map_err(|err| Error::from(err).with_path(&input))?;

            if output.as_deref() == Some(Path::new("-")) {
                let stdout = io::stdout();
                export(&mut source, &csv_dialect, stdout.lock(), header)
                    .map_err(|err| Error::from(err).with_path(&input))?;
                return Ok(RunOutcome::ok());
            }

            let output = output.unwrap_or_else(|| PathBuf::from(DEFAULT_CSV_OUTPUT));
            ensure_output_writable(&output, force)?;
            let summary = match export_file(&mut source, &csv_dialect, &output, header) {
                Ok(summary) => summary,
                Err(err) => {
                    remove_partial_output(&output);
                    return Err(err);
                }
            };
            emit_json(summary, color_mode);
            Ok(RunOutcome::ok())
        }
        Command::Schema {
            file,
            extended,
            json,
        } => {
            let schema = load_any_schema(&file)?;
            if json {
                emit_json(schema_json(&schema, extended), color_mode);
            } else {
                println!("{}", schema_text(&schema, extended));
            }
            Ok(RunOutcome::ok())
        }
        Command::Meta { file } => {
            let (schema, meta) = read_meta(&file).map_err(|err| Error::from(err).with_path(&file))?;
            let report = MetaReport {
                path: file.display().to_string(),
                meta: &meta,
                message: schema.message().to_string(),
                columns: columns_json(&schema),
            };
            let value = serde_json::to_value(&report).map_err(|err| {
                Error::new(ErrorKind::Internal)
                    .with_message("failed to encode file metadata")
                    .with_source(err)
            })?;
            emit_json(value, color_mode);
            Ok(RunOutcome::ok())
        }
    }
}
