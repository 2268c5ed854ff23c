//! Purpose: Shared library crate used by the `csv2parquet` CLI and tests.
//! Exports: `api` (schema, codecs, pipeline, Parquet sink/source, errors), `notice`.
//! Role: Internal library backing the binary; not yet a stable public SDK.
//! Invariants: Core modules prefer explicit inputs/outputs over hidden state.
//! Invariants: The CSV dialect is always passed in; nothing is process-global.
pub mod api;
mod core;
pub mod notice;
