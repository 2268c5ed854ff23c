// CLI integration tests for convert/export/schema/meta flows.
use std::io::Write;
use std::path::Path;
use std::process::Command;

use serde_json::Value;

fn cmd() -> Command {
    let exe = env!("CARGO_BIN_EXE_csv2parquet");
    Command::new(exe)
}

fn parse_json(value: &str) -> Value {
    serde_json::from_str(value).expect("valid json")
}

fn parse_json_line(output: &[u8]) -> Value {
    let text = String::from_utf8_lossy(output);
    let line = text.lines().next().expect("json line");
    parse_json(line)
}

fn path_str(path: &Path) -> &str {
    path.to_str().expect("utf8 path")
}

const SCHEMA: &str = "struct<id:int,name:string,amount:decimal(9,2),day:date,at:timestamp>";

#[test]
fn convert_then_export_round_trips_rows() {
    let temp = tempfile::tempdir().expect("tempdir");
    let input = temp.path().join("sales.csv");
    std::fs::write(
        &input,
        "id,name,amount,day,at\n\
         1,alice,12.50,2017-05-02,2017-01-02 00:13:45\n\
         2,\"bob, jr\",-0.07,19700102,1970-01-01 00:00:00\n\
         3,,,,\n",
    )
    .expect("write input");
    let output = temp.path().join("sales.parquet");

    let convert = cmd()
        .args([
            "convert",
            path_str(&input),
            "-s",
            SCHEMA,
            "-o",
            path_str(&output),
            "-H",
            "1",
            "-c",
            "snappy",
        ])
        .output()
        .expect("convert");
    assert!(
        convert.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&convert.stderr)
    );
    let summary = parse_json(std::str::from_utf8(&convert.stdout).expect("utf8"));
    assert_eq!(summary["files"], 1);
    assert_eq!(summary["rows"], 3);
    assert_eq!(summary["shaped_rows"], 0);
    assert_eq!(summary["row_groups"], 1);

    let csv_out = temp.path().join("sales.out.csv");
    let export = cmd()
        .args([
            "export",
            path_str(&output),
            "-o",
            path_str(&csv_out),
            "--header",
        ])
        .output()
        .expect("export");
    assert!(
        export.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&export.stderr)
    );
    let exported = parse_json(std::str::from_utf8(&export.stdout).expect("utf8"));
    assert_eq!(exported["rows"], 3);

    let text = std::fs::read_to_string(&csv_out).expect("read csv");
    assert_eq!(
        text,
        "id,name,amount,day,at\n\
         1,alice,12.50,2017-05-02,2017-01-02 00:13:45\n\
         2,\"bob, jr\",-0.07,1970-01-02,1970-01-01 00:00:00\n\
         3,,,,\n"
    );
}

#[test]
fn default_schema_file_and_gzip_inputs() {
    let temp = tempfile::tempdir().expect("tempdir");
    let first = temp.path().join("part1.csv.gz");
    let second = temp.path().join("part2.csv");
    let mut encoder =
        flate2::write::GzEncoder::new(Vec::new(), flate2::Compression::default());
    encoder.write_all(b"1|x\n2|y|extra\n").expect("gz write");
    std::fs::write(&first, encoder.finish().expect("gz finish")).expect("write gz");
    std::fs::write(&second, "3\n").expect("write second");
    std::fs::write(
        temp.path().join("part1.csv.schema"),
        "CREATE TABLE t (\n  id INT,\n  tag VARCHAR(4) NULL\n);\n",
    )
    .expect("write schema");
    let output = temp.path().join("parts.parquet");

    let convert = cmd()
        .args([
            "convert",
            path_str(&first),
            path_str(&second),
            "-S",
            "|",
            "-o",
            path_str(&output),
        ])
        .output()
        .expect("convert");
    assert!(
        convert.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&convert.stderr)
    );
    let summary = parse_json(std::str::from_utf8(&convert.stdout).expect("utf8"));
    assert_eq!(summary["files"], 2);
    assert_eq!(summary["rows"], 3);
    assert_eq!(summary["shaped_rows"], 2);

    let stderr = String::from_utf8_lossy(&convert.stderr);
    let notices = stderr
        .lines()
        .map(parse_json)
        .filter(|value| value["notice"]["kind"] == "shaped_rows")
        .count();
    assert_eq!(notices, 2);

    let export = cmd()
        .args(["export", path_str(&output), "-o", "-"])
        .output()
        .expect("export");
    assert!(export.status.success());
    assert_eq!(String::from_utf8_lossy(&export.stdout), "1,x\n2,y\n3,\n");
}

#[test]
fn existing_output_requires_force() {
    let temp = tempfile::tempdir().expect("tempdir");
    let input = temp.path().join("in.csv");
    std::fs::write(&input, "1\n").expect("write input");
    let output = temp.path().join("out.parquet");
    std::fs::write(&output, "keep me").expect("write output");

    let convert = cmd()
        .args([
            "convert",
            path_str(&input),
            "-s",
            "struct<id:int>",
            "-o",
            path_str(&output),
        ])
        .output()
        .expect("convert");
    assert_eq!(convert.status.code(), Some(4));
    let err = parse_json_line(&convert.stderr);
    assert_eq!(err["error"]["kind"], "AlreadyExists");
    assert!(err["error"]["hint"].as_str().unwrap().contains("--force"));
    assert_eq!(std::fs::read_to_string(&output).unwrap(), "keep me");

    let forced = cmd()
        .args([
            "convert",
            path_str(&input),
            "-s",
            "struct<id:int>",
            "-o",
            path_str(&output),
            "--force",
        ])
        .output()
        .expect("convert");
    assert!(forced.status.success());
}

#[test]
fn bad_cell_reports_decode_error_and_removes_output() {
    let temp = tempfile::tempdir().expect("tempdir");
    let input = temp.path().join("in.csv");
    std::fs::write(&input, "1,a\nnope,b\n").expect("write input");
    let output = temp.path().join("out.parquet");

    let convert = cmd()
        .args([
            "convert",
            path_str(&input),
            "-s",
            "struct<id:int,name:string>",
            "-o",
            path_str(&output),
        ])
        .output()
        .expect("convert");
    assert_eq!(convert.status.code(), Some(6));
    let err = parse_json_line(&convert.stderr);
    assert_eq!(err["error"]["kind"], "Decode");
    assert_eq!(err["error"]["line"], 2);
    assert!(err["error"]["message"].as_str().unwrap().contains("nope"));
    assert!(err["error"]["path"].as_str().unwrap().ends_with("in.csv"));
    assert!(!output.exists());
}

#[test]
fn missing_schema_is_not_found() {
    let temp = tempfile::tempdir().expect("tempdir");
    let input = temp.path().join("in.csv");
    std::fs::write(&input, "1\n").expect("write input");

    let convert = cmd()
        .current_dir(temp.path())
        .args(["convert", path_str(&input)])
        .output()
        .expect("convert");
    assert_eq!(convert.status.code(), Some(3));
    let err = parse_json_line(&convert.stderr);
    assert_eq!(err["error"]["kind"], "NotFound");
    assert!(err["error"]["hint"].as_str().unwrap().contains("in.csv.schema"));
}

#[test]
fn unrecognized_schema_is_schema_error() {
    let temp = tempfile::tempdir().expect("tempdir");
    let schema = temp.path().join("bad.schema");
    std::fs::write(&schema, "columns: a, b").expect("write schema");

    let out = cmd()
        .args(["schema", path_str(&schema)])
        .output()
        .expect("schema");
    assert_eq!(out.status.code(), Some(5));
    let err = parse_json_line(&out.stderr);
    assert_eq!(err["error"]["kind"], "Schema");
}

#[test]
fn schema_command_shows_message_struct_and_sql() {
    let temp = tempfile::tempdir().expect("tempdir");
    let schema = temp.path().join("t.schema");
    std::fs::write(
        &schema,
        "message hive_schema {\n  required int32 id;\n  optional binary name (UTF8);\n}\n",
    )
    .expect("write schema");

    let out = cmd()
        .args(["schema", path_str(&schema), "--extended", "--json"])
        .output()
        .expect("schema");
    assert!(out.status.success());
    let value = parse_json(std::str::from_utf8(&out.stdout).expect("utf8"));
    assert_eq!(value["syntax"], "message");
    assert_eq!(value["struct"], "struct<id:int,name:string>");
    assert_eq!(value["columns"][0]["nullable"], false);
    assert_eq!(value["columns"][1]["type"], "Varchar(0)");
    assert_eq!(value["sql"].as_array().map(|lines| lines.len()), Some(2));
}

#[test]
fn meta_reports_rows_and_schema() {
    let temp = tempfile::tempdir().expect("tempdir");
    let input = temp.path().join("in.csv");
    std::fs::write(&input, "1,a\n2,b\n3,c\n").expect("write input");
    let output = temp.path().join("out.parquet");

    let convert = cmd()
        .args([
            "convert",
            path_str(&input),
            "-s",
            "struct<id:int,name:string>",
            "-o",
            path_str(&output),
            "--row-group-size",
            "2",
            "-D",
            "parquet.compress=NONE",
        ])
        .output()
        .expect("convert");
    assert!(convert.status.success());

    let meta = cmd()
        .args(["meta", path_str(&output)])
        .output()
        .expect("meta");
    assert!(meta.status.success());
    let value = parse_json(std::str::from_utf8(&meta.stdout).expect("utf8"));
    assert_eq!(value["rows"], 3);
    assert_eq!(value["row_groups"], 2);
    assert!(value["message"].as_str().unwrap().contains("binary name (UTF8)"));

    let schema = cmd()
        .args(["schema", path_str(&output)])
        .output()
        .expect("schema");
    assert!(schema.status.success());
    assert!(String::from_utf8_lossy(&schema.stdout).starts_with("message m {"));
}

#[test]
fn block_size_define_is_a_byte_budget() {
    let temp = tempfile::tempdir().expect("tempdir");
    let input = temp.path().join("in.csv");
    std::fs::write(&input, "1,a\n2,b\n3,c\n").expect("write input");

    let row_groups = |block_size: &str, name: &str| {
        let output = temp.path().join(name);
        let define = format!("parquet.BLOCK_SIZE={block_size}");
        let convert = cmd()
            .args([
                "convert",
                path_str(&input),
                "-s",
                "struct<id:int,name:string>",
                "-o",
                path_str(&output),
                "-D",
                &define,
            ])
            .output()
            .expect("convert");
        assert!(convert.status.success());
        let meta = cmd()
            .args(["meta", path_str(&output)])
            .output()
            .expect("meta");
        assert!(meta.status.success());
        let value = parse_json(std::str::from_utf8(&meta.stdout).expect("utf8"));
        value["row_groups"].as_u64().expect("row_groups")
    };

    assert_eq!(row_groups("2", "tiny.parquet"), 3);
    assert_eq!(row_groups("1048576", "roomy.parquet"), 1);
}

#[test]
fn meta_on_non_parquet_is_corrupt() {
    let temp = tempfile::tempdir().expect("tempdir");
    let file = temp.path().join("plain.csv");
    std::fs::write(&file, "1,2,3\n").expect("write");

    let meta = cmd()
        .args(["meta", path_str(&file)])
        .output()
        .expect("meta");
    assert_eq!(meta.status.code(), Some(7));
    let err = parse_json_line(&meta.stderr);
    assert_eq!(err["error"]["kind"], "Corrupt");
    assert!(err["error"]["hint"].is_string());
}

#[test]
fn binary_format_round_trips_hex_literals() {
    let temp = tempfile::tempdir().expect("tempdir");
    let input = temp.path().join("raw.csv");
    std::fs::write(&input, "0x0102x0,0x02x0\n").expect("write input");
    let output = temp.path().join("raw.parquet");
    std::fs::write(
        temp.path().join("raw.schema"),
        "message m {\n  required fixed_len_byte_array(2) blob;\n  required int64 n;\n}\n",
    )
    .expect("write schema");

    let convert = cmd()
        .args([
            "convert",
            path_str(&input),
            "-s",
            path_str(&temp.path().join("raw.schema")),
            "-o",
            path_str(&output),
            "-f",
            "binary",
        ])
        .output()
        .expect("convert");
    assert!(
        convert.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&convert.stderr)
    );

    let export = cmd()
        .args(["export", path_str(&output), "-o", "-", "-f", "binary"])
        .output()
        .expect("export");
    assert!(export.status.success());
    assert_eq!(String::from_utf8_lossy(&export.stdout), "0x0102x0,2\n");
}

#[test]
fn orc_output_is_chosen_by_extension() {
    let temp = tempfile::tempdir().expect("tempdir");
    let input = temp.path().join("in.csv");
    std::fs::write(&input, "1,a\n2,\n3,c\n").expect("write input");
    std::fs::write(
        temp.path().join("in.csv.orc.schema"),
        "struct<\n  id:int,\n  name:string\n>\n",
    )
    .expect("write schema");
    let output = temp.path().join("out.orc");

    let convert = cmd()
        .args([
            "convert",
            path_str(&input),
            "-o",
            path_str(&output),
            "-D",
            "orc.stripe.size=1048576",
        ])
        .output()
        .expect("convert");
    assert!(
        convert.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&convert.stderr)
    );
    let summary = parse_json(std::str::from_utf8(&convert.stdout).expect("utf8"));
    assert_eq!(summary["rows"], 3);
    assert_eq!(summary["format"], "orc");
    let bytes = std::fs::read(&output).expect("read output");
    assert_eq!(&bytes[..3], b"ORC");
}

#[test]
fn orc_output_rejects_unencodable_columns_and_compression() {
    let temp = tempfile::tempdir().expect("tempdir");
    let input = temp.path().join("in.csv");
    std::fs::write(&input, "1,2017-05-02\n").expect("write input");
    let output = temp.path().join("out.orc");

    let dated = cmd()
        .args([
            "convert",
            path_str(&input),
            "-s",
            "struct<id:int,day:date>",
            "-o",
            path_str(&output),
        ])
        .output()
        .expect("convert");
    assert_eq!(dated.status.code(), Some(5));
    let err = parse_json_line(&dated.stderr);
    assert_eq!(err["error"]["kind"], "Schema");
    assert!(!output.exists());

    let compressed = cmd()
        .args([
            "convert",
            path_str(&input),
            "-s",
            "struct<id:int,day:string>",
            "-o",
            path_str(&output),
            "-D",
            "orc.compress=SNAPPY",
        ])
        .output()
        .expect("convert");
    assert_eq!(compressed.status.code(), Some(2));
}

#[test]
fn int64_timestamp_columns_export_civil_text() {
    let temp = tempfile::tempdir().expect("tempdir");
    let input = temp.path().join("ts.csv");
    std::fs::write(&input, "2017-01-02 00:13:45.250,2017-01-02T00:13:45.000250\n")
        .expect("write input");
    let schema = temp.path().join("ts.schema");
    std::fs::write(
        &schema,
        "message m {\n  required int64 ms (TIMESTAMP_MILLIS);\n  required int64 us (TIMESTAMP_MICROS);\n}\n",
    )
    .expect("write schema");
    let output = temp.path().join("ts.parquet");

    let convert = cmd()
        .args([
            "convert",
            path_str(&input),
            "-s",
            path_str(&schema),
            "-o",
            path_str(&output),
        ])
        .output()
        .expect("convert");
    assert!(
        convert.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&convert.stderr)
    );

    let export = cmd()
        .args(["export", path_str(&output), "-o", "-"])
        .output()
        .expect("export");
    assert!(export.status.success());
    assert_eq!(
        String::from_utf8_lossy(&export.stdout),
        "2017-01-02 00:13:45.250,2017-01-02 00:13:45.000250\n"
    );
}

#[test]
fn sql_not_null_columns_accept_empty_cells() {
    let temp = tempfile::tempdir().expect("tempdir");
    let input = temp.path().join("t.csv");
    std::fs::write(&input, "1,a\n,b\n").expect("write input");
    let schema = temp.path().join("t.sql");
    std::fs::write(
        &schema,
        "CREATE TABLE t (\n  id INT NOT NULL,\n  name VARCHAR(8)\n);\n",
    )
    .expect("write schema");
    let output = temp.path().join("t.parquet");

    let convert = cmd()
        .args([
            "convert",
            path_str(&input),
            "-s",
            path_str(&schema),
            "-o",
            path_str(&output),
        ])
        .output()
        .expect("convert");
    assert!(
        convert.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&convert.stderr)
    );

    let export = cmd()
        .args(["export", path_str(&output), "-o", "-"])
        .output()
        .expect("export");
    assert!(export.status.success());
    assert_eq!(String::from_utf8_lossy(&export.stdout), "1,a\n,b\n");
}

#[test]
fn usage_errors_exit_two() {
    let out = cmd()
        .args(["convert", "in.csv", "-c", "lz77", "-s", "struct<a:int>"])
        .output()
        .expect("convert");
    assert_eq!(out.status.code(), Some(2));
    let err = parse_json_line(&out.stderr);
    assert_eq!(err["error"]["kind"], "Usage");

    let bad_flag = cmd().args(["convert", "--nope"]).output().expect("convert");
    assert_eq!(bad_flag.status.code(), Some(2));
}

#[test]
fn version_emits_json_when_piped() {
    let out = cmd().arg("version").output().expect("version");
    assert!(out.status.success());
    let value = parse_json(std::str::from_utf8(&out.stdout).expect("utf8"));
    assert_eq!(value["name"], "csv2parquet");
    assert!(value["version"].is_string());
}
