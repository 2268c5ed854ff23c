//! Purpose: Normalize raw delimited records to exactly the schema's column count.
//! Exports: `Shape`, `shape`.
//! Role: Runs on every input record before cell decoding.
//! Invariants: Output length always equals the requested column count; never errors.

/// How a record was adjusted to fit the schema.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Shape {
    Exact,
    Padded { missing: usize },
    Truncated { dropped: usize },
}

impl Shape {
    pub fn changed(self) -> bool {
        self != Shape::Exact
    }
}

/// Pads with empty strings or drops trailing fields so `fields.len() == column_count`.
pub fn shape(fields: &mut Vec<String>, column_count: usize) -> Shape {
    let len = fields.len();
    if len < column_count {
        fields.resize(column_count, String::new());
        return Shape::Padded {
            missing: column_count - len,
        };
    }
    if len > column_count {
        fields.truncate(column_count);
        return Shape::Truncated {
            dropped: len - column_count,
        };
    }
    Shape::Exact
}
