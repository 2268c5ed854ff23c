//! Purpose: `csv2parquet` CLI entry point and command dispatch.
//! Role: Binary crate root; parses args, runs commands, emits JSON on stdout.
//! Invariants: Commands emit stable stdout formats (human or JSON by command/flags).
//! Invariants: Non-interactive errors are emitted as JSON on stderr.
//! Invariants: Process exit code is derived from `api::to_exit_code`.
//! Invariants: A failed conversion never leaves a partial output file behind.
#![allow(clippy::result_large_err)]
use std::fs::File;
use std::io::{self, BufWriter, IsTerminal, Read};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use clap::{
    ArgAction, Args, CommandFactory, Parser, Subcommand, ValueEnum, ValueHint,
    error::ErrorKind as ClapErrorKind,
};
use clap_complete::aot::Shell;
use csv2parquet::api::{
    CsvDialect, Error, ErrorKind, OrcSink, ParquetMeta, ParquetSink, ParquetSource, RowSink,
    Schema, SchemaSyntax, SinkError, SinkSummary, WriterOptions, apply_define, export, read_meta,
    to_exit_code,
};
use csv2parquet::notice::{Notice, notice_json};
use serde::Serialize;
use serde_json::{Map, Value, json};
use std::error::Error as StdError;
use tracing_subscriber::EnvFilter;

mod command_dispatch;
mod file_paths;
mod ingest;

use file_paths::{
    DEFAULT_CSV_OUTPUT, DEFAULT_PARQUET_OUTPUT, OutputFormat, SchemaLookupError, SchemaSource,
    resolve_schema_source,
};
use ingest::{IngestConfig, IngestOutcome, InputReport, ingest};

#[derive(Copy, Clone, Debug)]
struct RunOutcome {
    exit_code: i32,
}

impl RunOutcome {
    fn ok() -> Self {
        Self { exit_code: 0 }
    }

    fn with_code(exit_code: i32) -> Self {
        Self { exit_code }
    }
}

fn main() {
    let exit_code = match run() {
        Ok(outcome) => outcome.exit_code,
        Err((err, color_mode)) => {
            emit_error(&err, color_mode);
            to_exit_code(err.kind())
        }
    };
    std::process::exit(exit_code);
}

fn run() -> Result<RunOutcome, (Error, ColorMode)> {
    let cli = match Cli::try_parse_from(std::env::args_os()) {
        Ok(cli) => cli,
        Err(err) => match err.kind() {
            ClapErrorKind::DisplayHelp
            | ClapErrorKind::DisplayVersion
            | ClapErrorKind::DisplayHelpOnMissingArgumentOrSubcommand => {
                err.print().map_err(|io_err| {
                    (
                        Error::new(ErrorKind::Io)
                            .with_message("failed to write help")
                            .with_source(io_err),
                        ColorMode::Auto,
                    )
                })?;
                let exit_code = if matches!(
                    err.kind(),
                    ClapErrorKind::DisplayHelpOnMissingArgumentOrSubcommand
                ) {
                    2
                } else {
                    0
                };
                return Ok(RunOutcome::with_code(exit_code));
            }
            _ => {
                let message = clap_error_summary(&err);
                let hint = clap_error_hint(&err);
                return Err((
                    Error::new(ErrorKind::Usage)
                        .with_message(message)
                        .with_hint(hint),
                    ColorMode::Auto,
                ));
            }
        },
    };

    init_tracing(cli.verbose);
    let color_mode = cli.color;

    let result = command_dispatch::dispatch_command(cli.command, color_mode);

    result
        .map_err(add_corrupt_hint)
        .map_err(add_io_hint)
        .map_err(add_internal_hint)
        .map_err(|err| (err, color_mode))
}

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(io::stderr)
        .with_ansi(io::stderr().is_terminal())
        .with_target(false)
        .try_init();
}

#[derive(Parser)]
#[command(
    name = "csv2parquet",
    version,
    about = "Convert CSV files to Parquet and back using a declared schema",
    help_template = r#"{about-with-newline}
{before-help}USAGE
  {usage}

COMMANDS
{subcommands}

OPTIONS
{options}

{after-help}
"#,
    long_about = None,
    before_help = r#"Every column is typed by a schema: a `struct<...>` description, a Parquet
`message` definition, or a SQL `CREATE TABLE` statement.

Mental model:
  - `convert` reads CSV text and writes one Parquet file
  - `export` reads a Parquet file and writes CSV text
  - `schema` shows how a schema is understood
"#,
    after_help = r#"EXAMPLES
  $ csv2parquet convert sales.csv -s 'struct<id:int,amount:decimal(9,2),day:date>'
  $ csv2parquet convert part-*.csv.gz -s sales.schema -o sales.parquet -c snappy
  $ csv2parquet export sales.parquet -o sales.csv --header
  $ csv2parquet schema sales.schema --extended

LEARN MORE
  $ csv2parquet <command> --help"#,
    arg_required_else_help = true,
    disable_help_subcommand = false
)]
struct Cli {
    #[arg(
        long,
        default_value = "auto",
        value_enum,
        global = true,
        help = "Colorize stderr diagnostics and pretty JSON output: auto|always|never"
    )]
    color: ColorMode,
    #[arg(
        short = 'v',
        long = "verbose",
        action = ArgAction::Count,
        global = true,
        help = "Log progress to stderr (-v info, -vv debug; RUST_LOG overrides)"
    )]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum ColorMode {
    Auto,
    Always,
    Never,
}

impl ColorMode {
    fn use_color(self, is_tty: bool) -> bool {
        match self {
            ColorMode::Auto => is_tty,
            ColorMode::Always => true,
            ColorMode::Never => false,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum CsvFormat {
    Default,
    Binary,
}

/// Delimited-text flags shared by `convert` and `export`.
#[derive(Args, Clone, Debug)]
struct DialectArgs {
    #[arg(
        short = 'S',
        long = "separator",
        default_value = ",",
        value_parser = parse_dialect_byte,
        help = "Field separator (single ASCII character, or `tab`)"
    )]
    separator: u8,
    #[arg(
        short = 'q',
        long = "quote",
        default_value = "\"",
        value_parser = parse_dialect_byte,
        help = "Quote character"
    )]
    quote: u8,
    #[arg(
        short = 'e',
        long = "escape",
        default_value = "\\",
        help = "Escape character; `none` means quotes are escaped by doubling"
    )]
    escape: String,
    #[arg(
        short = 'n',
        long = "null",
        default_value = "",
        help = "Text that stands for NULL (default: empty field)"
    )]
    null: String,
    #[arg(
        short = 'f',
        long = "csvformat",
        value_enum,
        help = "Cell format: default|binary (binary accepts 0x..x0 hex literals)"
    )]
    csv_format: Option<CsvFormat>,
}

impl DialectArgs {
    fn to_dialect(&self, header_lines: usize) -> Result<CsvDialect, Error> {
        let escape = match self.escape.as_str() {
            "" | "none" | "NONE" => None,
            other => Some(parse_dialect_byte(other).map_err(|message| {
                Error::new(ErrorKind::Usage)
                    .with_message(format!("invalid --escape: {message}"))
                    .with_hint("Use a single character such as \\\\ or `none`.")
            })?),
        };
        Ok(CsvDialect {
            separator: self.separator,
            quote: self.quote,
            escape,
            header_lines,
            null_marker: self.null.clone(),
            binary_literals: self.csv_format == Some(CsvFormat::Binary),
        })
    }
}

#[derive(Subcommand)]
enum Command {
    #[command(
        arg_required_else_help = true,
        about = "Convert CSV files into one Parquet or ORC file",
        long_about = r#"Convert one or more CSV files into a single Parquet (or ORC) file.

Every input is appended, in order, to the same output. Records are padded with
empty fields or truncated to the schema's column count before decoding."#,
        after_help = r#"EXAMPLES
  $ csv2parquet convert in.csv -s 'struct<a:int,b:string>'
  $ csv2parquet convert in.csv.gz -s in.schema -o out.parquet --force
  $ csv2parquet convert in.tsv -S tab -H 1 -n '\N' -D parquet.compress=SNAPPY"#,
        after_long_help = r#"EXAMPLES
  # Inline struct schema
  $ csv2parquet convert in.csv -s 'struct<a:int,b:string>'

  # Schema file found next to the input (in.csv.parquet.schema or in.csv.schema)
  $ csv2parquet convert in.csv

  # ORC output is chosen by the .orc extension (schema lookup: in.csv.orc.schema)
  $ csv2parquet convert in.csv -o out.orc -D orc.stripe.size=33554432

  # Several gzip inputs into one file
  $ csv2parquet convert day1.csv.gz day2.csv.gz -s days.schema -o days.parquet

  # Hex literals such as 0x0102x0 for exact bytes
  $ csv2parquet convert raw.csv -s raw.schema -f binary

NOTES
  - Schema text may be a struct<...> description, a Parquet message, or CREATE TABLE DDL
  - `-D` accepts parquet.compress, parquet.BLOCK_SIZE (bytes per row group),
    parquet.PAGE_SIZE, parquet.enabledictionary, orc.compress (NONE only),
    orc.stripe.size and csvformat; explicit flags win over defines
  - Prints a JSON summary (files, rows, shaped_rows, row_groups, output) on stdout"#
    )]
    Convert {
        #[arg(
            required = true,
            help = "CSV input files (a .gz suffix is decompressed)",
            value_hint = ValueHint::FilePath
        )]
        inputs: Vec<PathBuf>,
        #[arg(
            short = 's',
            long = "schema",
            help = "Schema file path or inline struct<...> description"
        )]
        schema: Option<String>,
        #[arg(
            short = 'o',
            long = "output",
            help = "Output file; a .orc extension writes ORC (default: output.parquet)",
            value_hint = ValueHint::FilePath
        )]
        output: Option<PathBuf>,
        #[arg(long, help = "Overwrite the output file if it exists")]
        force: bool,
        #[arg(
            short = 'H',
            long = "header",
            default_value_t = 0,
            help = "Number of leading header lines to skip in each input"
        )]
        header: usize,
        #[command(flatten)]
        dialect: DialectArgs,
        #[arg(
            short = 'c',
            long = "compression",
            help = "Compression codec: none|gzip|snappy|zstd (default: gzip)"
        )]
        compression: Option<String>,
        #[arg(long = "row-group-size", help = "Rows per row group")]
        row_group_size: Option<usize>,
        #[arg(long = "page-size", help = "Data page size limit in bytes")]
        page_size: Option<usize>,
        #[arg(long = "no-dictionary", help = "Disable dictionary encoding")]
        no_dictionary: bool,
        #[arg(
            short = 'D',
            long = "define",
            value_name = "KEY=VALUE",
            help = "Writer/format define, e.g. parquet.compress=SNAPPY (repeatable)"
        )]
        defines: Vec<String>,
    },
    #[command(
        arg_required_else_help = true,
        about = "Export a Parquet file as CSV",
        long_about = r#"Write every row of a Parquet file as one CSV line.

Columns are rendered by their schema type; byte columns print as UTF-8 text,
or as 0x..x0 hex literals when they are not valid UTF-8 or -f binary is set."#,
        after_help = r#"EXAMPLES
  $ csv2parquet export in.parquet -o out.csv --header
  $ csv2parquet export in.parquet -o - -S '|' -n NULL"#
    )]
    Export {
        #[arg(help = "Parquet input file", value_hint = ValueHint::FilePath)]
        input: PathBuf,
        #[arg(
            short = 'o',
            long = "output",
            help = "Output CSV file, or - for stdout (default: output.csv)",
            value_hint = ValueHint::FilePath
        )]
        output: Option<PathBuf>,
        #[arg(long, help = "Overwrite the output file if it exists")]
        force: bool,
        #[command(flatten)]
        dialect: DialectArgs,
        #[arg(long, help = "Write a header line with the column names")]
        header: bool,
    },
    #[command(
        arg_required_else_help = true,
        about = "Show how a schema is understood",
        long_about = r#"Print the unified schema of a schema text file or a Parquet file.

The message form is always shown; --extended adds the struct description and
SQL column lines."#,
        after_help = r#"EXAMPLES
  $ csv2parquet schema table.sql
  $ csv2parquet schema data.parquet --extended
  $ csv2parquet schema in.schema --json"#
    )]
    Schema {
        #[arg(help = "Schema text file or Parquet file", value_hint = ValueHint::FilePath)]
        file: PathBuf,
        #[arg(short = 'x', long, help = "Also show struct and SQL forms")]
        extended: bool,
        #[arg(long, help = "Emit JSON instead of text")]
        json: bool,
    },
    #[command(
        arg_required_else_help = true,
        about = "Print Parquet file metadata as JSON",
        after_help = r#"EXAMPLES
  $ csv2parquet meta out.parquet"#
    )]
    Meta {
        #[arg(help = "Parquet file", value_hint = ValueHint::FilePath)]
        file: PathBuf,
    },
    #[command(
        about = "Print version info as JSON",
        long_about = r#"Emit version info as JSON (stable, machine-readable)."#,
        after_help = r#"EXAMPLES
  $ csv2parquet version"#
    )]
    Version,
    #[command(
        arg_required_else_help = true,
        about = "Generate shell completions",
        long_about = r#"Generate shell completion scripts.

Prints a completion script for the given shell to stdout."#,
        after_help = r#"EXAMPLES
  $ csv2parquet completion bash > ~/.local/share/bash-completion/completions/csv2parquet
  $ csv2parquet completion zsh > ~/.zfunc/_csv2parquet
  $ csv2parquet completion fish > ~/.config/fish/completions/csv2parquet.fish"#
    )]
    Completion {
        #[arg(help = "Shell to generate completions for")]
        shell: Shell,
    },
}

fn parse_dialect_byte(value: &str) -> Result<u8, String> {
    match value {
        "tab" | "\\t" | "\t" => return Ok(b'\t'),
        "space" => return Ok(b' '),
        _ => {}
    }
    let bytes = value.as_bytes();
    if bytes.len() != 1 || !bytes[0].is_ascii() {
        return Err(format!("expected a single ASCII character, got `{value}`"));
    }
    Ok(bytes[0])
}

fn parse_positive(flag: &str, value: usize) -> Result<usize, Error> {
    if value == 0 {
        return Err(Error::new(ErrorKind::Usage)
            .with_message(format!("{flag} must be greater than zero")));
    }
    Ok(value)
}

fn build_writer_options(
    defines: &[String],
    compression: Option<&str>,
    row_group_size: Option<usize>,
    page_size: Option<usize>,
    no_dictionary: bool,
    dialect: &mut CsvDialect,
) -> Result<WriterOptions, Error> {
    let mut options = WriterOptions::default();
    for define in defines {
        apply_define(define, &mut options, dialect)?;
    }
    if let Some(compression) = compression {
        options.compression = compression.parse()?;
    }
    if let Some(size) = row_group_size {
        options.row_group_size = parse_positive("--row-group-size", size)?;
    }
    if let Some(size) = page_size {
        options.page_size = parse_positive("--page-size", size)?;
    }
    if no_dictionary {
        options.dictionary = false;
    }
    Ok(options)
}

fn read_text_file(path: &Path, what: &str) -> Result<String, Error> {
    std::fs::read_to_string(path).map_err(|err| {
        let kind = if err.kind() == io::ErrorKind::NotFound {
            ErrorKind::NotFound
        } else {
            ErrorKind::Io
        };
        Error::new(kind)
            .with_message(format!("failed to read {what}"))
            .with_path(path)
            .with_source(err)
    })
}

fn map_schema_lookup_error(err: SchemaLookupError, input: &Path) -> Error {
    match err {
        SchemaLookupError::MissingFile(path) => Error::new(ErrorKind::NotFound)
            .with_message("schema file not found")
            .with_path(path)
            .with_hint("Pass -s with an existing schema file or an inline struct<...> description."),
        SchemaLookupError::NoDefault { tried } => {
            let names = tried
                .iter()
                .map(|path| path.display().to_string())
                .collect::<Vec<_>>()
                .join(" or ");
            Error::new(ErrorKind::NotFound)
                .with_message("no schema given and no default schema file found")
                .with_path(input)
                .with_hint(format!("Pass -s <schema>, or create {names}."))
        }
    }
}

/// Resolves `-s` (or the default lookup next to `input`) and parses it.
fn load_schema(arg: Option<&str>, input: &Path, format: OutputFormat) -> Result<Schema, Error> {
    let source = resolve_schema_source(arg, input, format)
        .map_err(|err| map_schema_lookup_error(err, input))?;
    match source {
        SchemaSource::Inline(text) => Ok(Schema::parse(&text)?),
        SchemaSource::File(path) => {
            let text = read_text_file(&path, "schema file")?;
            tracing::debug!(schema = %path.display(), "loaded schema file");
            Schema::parse(&text).map_err(|err| Error::from(err).with_path(path))
        }
    }
}

fn is_parquet_file(path: &Path) -> Result<bool, Error> {
    let mut file = File::open(path).map_err(|err| {
        let kind = if err.kind() == io::ErrorKind::NotFound {
            ErrorKind::NotFound
        } else {
            ErrorKind::Io
        };
        Error::new(kind)
            .with_message("failed to open file")
            .with_path(path)
            .with_source(err)
    })?;
    let mut magic = [0u8; 4];
    match file.read_exact(&mut magic) {
        Ok(()) => Ok(&magic == b"PAR1"),
        Err(err) if err.kind() == io::ErrorKind::UnexpectedEof => Ok(false),
        Err(err) => Err(Error::new(ErrorKind::Io)
            .with_message("failed to read file")
            .with_path(path)
            .with_source(err)),
    }
}

/// Schema of either a Parquet file or a schema text file.
fn load_any_schema(path: &Path) -> Result<Schema, Error> {
    if is_parquet_file(path)? {
        let (schema, _) = read_meta(path).map_err(|err| Error::from(err).with_path(path))?;
        return Ok(schema);
    }
    let text = read_text_file(path, "schema file")?;
    Schema::parse(&text).map_err(|err| Error::from(err).with_path(path))
}

fn ensure_output_writable(path: &Path, force: bool) -> Result<(), Error> {
    if path.exists() && !force {
        return Err(Error::new(ErrorKind::AlreadyExists)
            .with_message("output file already exists")
            .with_path(path)
            .with_hint("Pass --force to overwrite it, or choose another path with -o."));
    }
    Ok(())
}

fn remove_partial_output(path: &Path) {
    if let Err(err) = std::fs::remove_file(path) {
        if err.kind() != io::ErrorKind::NotFound {
            tracing::warn!(output = %path.display(), error = %err, "failed to remove partial output");
        }
    }
}

fn convert_files(
    inputs: &[PathBuf],
    schema: &Schema,
    dialect: &CsvDialect,
    output: &Path,
    format: OutputFormat,
    options: &WriterOptions,
) -> Result<(IngestOutcome, SinkSummary), Error> {
    match format {
        OutputFormat::Parquet => {
            let sink = ParquetSink::create(output, schema, options);
            convert_into(inputs, schema, dialect, output, sink)
        }
        OutputFormat::Orc => {
            let sink = OrcSink::create(output, schema, options);
            convert_into(inputs, schema, dialect, output, sink)
        }
    }
}

fn convert_into<S: RowSink>(
    inputs: &[PathBuf],
    schema: &Schema,
    dialect: &CsvDialect,
    output: &Path,
    sink: Result<S, SinkError>,
) -> Result<(IngestOutcome, SinkSummary), Error> {
    let mut sink = sink.map_err(|err| Error::from(err).with_path(output))?;
    let outcome = ingest(
        inputs,
        IngestConfig { schema, dialect },
        &mut sink,
        |_, _| {},
    )?;
    let summary = sink
        .finish()
        .map_err(|err| Error::from(err).with_path(output))?;
    Ok((outcome, summary))
}

fn export_file(
    source: &mut ParquetSource,
    dialect: &CsvDialect,
    output: &Path,
    header: bool,
) -> Result<Value, Error> {
    let file = File::create(output).map_err(|err| {
        Error::new(ErrorKind::Io)
            .with_message("failed to create output file")
            .with_path(output)
            .with_source(err)
    })?;
    let outcome = export(source, dialect, BufWriter::new(file), header)
        .map_err(|err| Error::from(err).with_path(output))?;
    Ok(json!({
        "rows": outcome.rows,
        "row_groups": outcome.batches,
        "output": output.display().to_string(),
    }))
}

fn input_notices(report: &InputReport, dialect: &CsvDialect, column_count: usize) -> Vec<Notice> {
    let time = notice_time_now().unwrap_or_default();
    let input = report.path.display().to_string();
    let mut notices = Vec::new();
    if report.outcome.shaped_rows > 0 {
        notices.push(Notice::shaped_rows(
            time.clone(),
            input.clone(),
            report.outcome.shaped_rows,
            column_count,
            report.first_shaped_line,
        ));
    }
    if report.outcome.header_lines < dialect.header_lines as u64 {
        notices.push(Notice::header_short(
            time,
            input,
            dialect.header_lines,
            report.outcome.header_lines,
        ));
    }
    notices
}

fn syntax_label(syntax: SchemaSyntax) -> &'static str {
    match syntax {
        SchemaSyntax::Struct => "struct",
        SchemaSyntax::Message => "message",
        SchemaSyntax::SqlDdl => "sql",
    }
}

#[derive(Serialize)]
struct MetaReport<'a> {
    path: String,
    #[serde(flatten)]
    meta: &'a ParquetMeta,
    message: String,
    columns: Value,
}

fn columns_json(schema: &Schema) -> Value {
    Value::Array(
        schema
            .columns()
            .iter()
            .map(|column| {
                json!({
                    "name": column.name,
                    "type": column.logical_type.to_string(),
                    "nullable": column.nullable,
                })
            })
            .collect(),
    )
}

fn schema_json(schema: &Schema, extended: bool) -> Value {
    let mut out = Map::new();
    out.insert("syntax".to_string(), json!(syntax_label(schema.syntax())));
    out.insert("message".to_string(), json!(schema.message().to_string()));
    out.insert("columns".to_string(), columns_json(schema));
    if extended {
        out.insert("struct".to_string(), json!(schema.struct_type().to_string()));
        out.insert("sql".to_string(), json!(schema.sql_lines()));
    }
    Value::Object(out)
}

fn schema_text(schema: &Schema, extended: bool) -> String {
    let mut out = schema.message().to_string();
    if extended {
        out.push_str("\n\n");
        out.push_str(&schema.struct_type().to_string());
        out.push_str("\n\n");
        out.push_str(&schema.sql_lines().join("\n"));
    }
    out
}

fn add_io_hint(err: Error) -> Error {
    if err.hint().is_some() {
        return err;
    }
    match err.kind() {
        ErrorKind::NotFound => err.with_hint("Check the path; relative paths resolve from the current directory."),
        ErrorKind::Io => err.with_hint("I/O error. Check the path, permissions, and disk space."),
        _ => err,
    }
}

fn add_corrupt_hint(err: Error) -> Error {
    if err.kind() != ErrorKind::Corrupt || err.hint().is_some() {
        return err;
    }
    err.with_hint("The file is not a readable Parquet file, or it was truncated.")
}

fn add_internal_hint(err: Error) -> Error {
    if err.kind() != ErrorKind::Internal || err.hint().is_some() {
        return err;
    }
    err.with_hint(
        "Unexpected internal failure. Retry with RUST_BACKTRACE=1 and share command/context if it persists.",
    )
}

fn emit_version_output(color_mode: ColorMode) {
    if io::stdout().is_terminal() {
        println!("csv2parquet {}", env!("CARGO_PKG_VERSION"));
    } else {
        emit_json(
            json!({
                "name": "csv2parquet",
                "version": env!("CARGO_PKG_VERSION"),
            }),
            color_mode,
        );
    }
}

fn emit_json(value: serde_json::Value, color_mode: ColorMode) {
    let is_tty = io::stdout().is_terminal();
    let pretty = is_tty || color_mode.use_color(is_tty);
    let json = if pretty {
        serde_json::to_string_pretty(&value)
    } else {
        serde_json::to_string(&value)
    }
    .unwrap_or_else(|_| "{\"error\":\"json encode failed\"}".to_string());
    println!("{json}");
}

#[derive(Copy, Clone, Debug)]
enum AnsiColor {
    Red,
    Yellow,
}

fn colorize_label(label: &str, enabled: bool, color: AnsiColor) -> String {
    if !enabled {
        return label.to_string();
    }
    let code = match color {
        AnsiColor::Red => "31",
        AnsiColor::Yellow => "33",
    };
    format!("\u{1b}[{code}m{label}\u{1b}[0m")
}

fn emit_error(err: &Error, color_mode: ColorMode) {
    let is_tty = io::stderr().is_terminal();
    if is_tty {
        eprintln!("{}", error_text(err, color_mode.use_color(is_tty)));
        return;
    }

    let value = error_json(err);
    let json = serde_json::to_string(&value).unwrap_or_else(|_| {
        "{\"error\":{\"kind\":\"Internal\",\"message\":\"json encode failed\"}}".to_string()
    });
    eprintln!("{json}");
}

fn notice_time_now() -> Option<String> {
    use time::format_description::well_known::Rfc3339;
    let duration = SystemTime::now().duration_since(UNIX_EPOCH).ok()?;
    let ts = time::OffsetDateTime::from_unix_timestamp_nanos(duration.as_nanos() as i128).ok()?;
    ts.format(&Rfc3339).ok()
}

fn emit_notice(notice: &Notice, color_mode: ColorMode) {
    let is_tty = io::stderr().is_terminal();
    if is_tty {
        let label = colorize_label("notice:", color_mode.use_color(is_tty), AnsiColor::Yellow);
        eprintln!("{label} {} (input: {})", notice.message, notice.input);
        return;
    }

    let value = notice_json(notice);
    let json = serde_json::to_string(&value).unwrap_or_else(|_| {
        "{\"notice\":{\"kind\":\"Internal\",\"message\":\"json encode failed\"}}".to_string()
    });
    eprintln!("{json}");
}

fn error_message(err: &Error) -> String {
    if let Some(message) = err.message() {
        return message.to_string();
    }
    match err.kind() {
        ErrorKind::Internal => "internal error".to_string(),
        ErrorKind::Usage => "usage error".to_string(),
        ErrorKind::NotFound => "not found".to_string(),
        ErrorKind::AlreadyExists => "already exists".to_string(),
        ErrorKind::Schema => "invalid schema".to_string(),
        ErrorKind::Decode => "cannot convert value".to_string(),
        ErrorKind::Corrupt => "corrupt data".to_string(),
        ErrorKind::Io => "i/o error".to_string(),
    }
}

fn error_causes(err: &Error) -> Vec<String> {
    let mut causes = Vec::new();
    let mut cur = err.source();
    while let Some(source) = cur {
        causes.push(source.to_string());
        cur = source.source();
    }
    causes
}

fn error_json(err: &Error) -> Value {
    let mut inner = Map::new();
    inner.insert("kind".to_string(), json!(format!("{:?}", err.kind())));
    inner.insert("message".to_string(), json!(error_message(err)));
    if let Some(hint) = err.hint() {
        inner.insert("hint".to_string(), json!(hint));
    }
    if let Some(path) = err.path() {
        inner.insert("path".to_string(), json!(path.display().to_string()));
    }
    if let Some(line) = err.line() {
        inner.insert("line".to_string(), json!(line));
    }
    let causes = error_causes(err);
    if !causes.is_empty() {
        inner.insert("causes".to_string(), json!(causes));
    }

    let mut outer = Map::new();
    outer.insert("error".to_string(), Value::Object(inner));
    Value::Object(outer)
}

fn error_text(err: &Error, use_color: bool) -> String {
    let mut lines = Vec::new();
    lines.push(format!(
        "{} {}",
        colorize_label("error:", use_color, AnsiColor::Red),
        error_message(err)
    ));

    if let Some(hint) = err.hint() {
        lines.push(format!(
            "{} {hint}",
            colorize_label("hint:", use_color, AnsiColor::Yellow)
        ));
    }
    if let Some(path) = err.path() {
        lines.push(format!(
            "{} {}",
            colorize_label("path:", use_color, AnsiColor::Yellow),
            path.display()
        ));
    }
    if let Some(line) = err.line() {
        lines.push(format!(
            "{} {line}",
            colorize_label("line:", use_color, AnsiColor::Yellow)
        ));
    }

    let causes = error_causes(err);
    if let Some(cause) = causes.first() {
        lines.push(format!(
            "{} {cause}",
            colorize_label("caused by:", use_color, AnsiColor::Yellow)
        ));
    }

    lines.join("\n")
}

fn clap_error_summary(err: &clap::Error) -> String {
    for line in err.to_string().lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        if let Some(rest) = trimmed.strip_prefix("error:") {
            return rest.trim().to_string();
        }
        return trimmed.to_string();
    }
    "invalid arguments".to_string()
}

fn clap_error_hint(err: &clap::Error) -> String {
    let rendered = err.to_string();
    let usage = rendered
        .lines()
        .find_map(|line| line.trim().strip_prefix("Usage: "))
        .map(str::trim);

    let Some(usage) = usage else {
        return "Try `csv2parquet --help`.".to_string();
    };

    let tokens: Vec<&str> = usage.split_whitespace().collect();
    let Some(pos) = tokens.iter().position(|t| *t == "csv2parquet") else {
        return "Try `csv2parquet --help`.".to_string();
    };

    let mut parts = Vec::new();
    for token in tokens.iter().skip(pos + 1) {
        if token.starts_with('-') || token.starts_with('<') || token.starts_with('[') {
            break;
        }
        parts.push(*token);
    }

    if parts.is_empty() {
        return "Try `csv2parquet --help`.".to_string();
    }

    format!("Try `csv2parquet {} --help`.", parts.join(" "))
}
