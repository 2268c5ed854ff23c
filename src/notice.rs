//! Purpose: Structured stderr notices for records the converter accepted but reshaped.
//! Exports: `Notice`, `NoticeKind`, `notice_json`.
//! Role: Builds the per-input `shaped_rows` and `header_short` diagnostics for `convert`.
//! Invariants: Notices are non-fatal and never alter stdout payloads.
//! Invariants: Each kind carries a fixed set of `details` keys; new keys are additive-only.
use serde::Serialize;
use serde_json::{Map, Value, json};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeKind {
    /// Records padded or truncated to the schema width.
    ShapedRows,
    /// The input ended inside its header block.
    HeaderShort,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Notice {
    pub kind: NoticeKind,
    pub time: String,
    pub cmd: &'static str,
    pub input: String,
    pub message: String,
    pub details: Map<String, Value>,
}

impl Notice {
    pub fn shaped_rows(
        time: String,
        input: String,
        shaped_rows: u64,
        columns: usize,
        first_line: Option<u64>,
    ) -> Self {
        let mut details = Map::new();
        details.insert("shaped_rows".to_string(), json!(shaped_rows));
        details.insert("columns".to_string(), json!(columns));
        if let Some(line) = first_line {
            details.insert("first_line".to_string(), json!(line));
        }
        Self {
            kind: NoticeKind::ShapedRows,
            time,
            cmd: "convert",
            input,
            message: format!("{shaped_rows} records padded or truncated to {columns} columns"),
            details,
        }
    }

    pub fn header_short(time: String, input: String, expected: usize, skipped: u64) -> Self {
        let mut details = Map::new();
        details.insert("expected".to_string(), json!(expected));
        details.insert("skipped".to_string(), json!(skipped));
        Self {
            kind: NoticeKind::HeaderShort,
            time,
            cmd: "convert",
            input,
            message: format!("input ended after {skipped} of {expected} header lines"),
            details,
        }
    }
}

pub fn notice_json(notice: &Notice) -> Value {
    json!({ "notice": notice })
}
