//! Purpose: Pull one column definition out of one line of `CREATE TABLE` text.
//! Exports: `SqlType`, `ColumnDef`, `extract`.
//! Role: Line scanner behind the SQL DDL schema syntax.
//! Invariants: Patterns are tried in a fixed priority order; the first match wins.
//! Invariants: Lines that match nothing are ignored by callers, never an error.
use std::sync::LazyLock;

use regex::Regex;

use crate::core::message_type::{Annotation, MessageField, Primitive, Repetition};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SqlType {
    Varchar,
    Timestamp,
    Time,
    Date,
    TinyInt,
    ShortInt,
    Int,
    Double,
    Float,
    Bool,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ColumnDef {
    pub name: String,
    pub sql_type: SqlType,
    /// Declared length for VARCHAR variants, 0 otherwise.
    pub length: u32,
    pub nullable: bool,
}

static VARCHAR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)([A-Za-z0-9_]+)\s+(?:CHARACTER\s+VARYING|VARCHAR|NVARCHAR)\s*\(\s*(\d+)\s*\)")
        .expect("varchar pattern")
});

static KEYWORDS: LazyLock<Vec<(SqlType, Regex)>> = LazyLock::new(|| {
    [
        (SqlType::Timestamp, "TIMESTAMP"),
        (SqlType::Time, "TIME"),
        (SqlType::Date, "DATE"),
        (SqlType::TinyInt, "TINYINT"),
        (SqlType::ShortInt, "SHORTINT"),
        (SqlType::Int, "INT"),
        (SqlType::Double, "DOUBLE"),
        (SqlType::Float, "FLOAT"),
        (SqlType::Bool, "BOOL"),
    ]
    .into_iter()
    .map(|(sql_type, keyword)| {
        let pattern = format!(r"(?i)([A-Za-z0-9_]+)\s+{keyword}");
        (sql_type, Regex::new(&pattern).expect("keyword pattern"))
    })
    .collect()
});

static NULL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\s+NULL\b").expect("null pattern"));

/// Scans `line` for a column definition; `None` when no type pattern matches.
/// Any whitespace-led `NULL` token marks the column nullable, `NOT NULL` included.
pub fn extract(line: &str) -> Option<ColumnDef> {
    let nullable = NULL.is_match(line);

    if let Some(caps) = VARCHAR.captures(line) {
        return Some(ColumnDef {
            name: caps[1].to_string(),
            sql_type: SqlType::Varchar,
            length: caps[2].parse().unwrap_or(u32::MAX),
            nullable,
        });
    }

    KEYWORDS.iter().find_map(|(sql_type, pattern)| {
        pattern.captures(line).map(|caps| ColumnDef {
            name: caps[1].to_string(),
            sql_type: *sql_type,
            length: 0,
            nullable,
        })
    })
}

impl ColumnDef {
    /// The message field this column is stored as.
    pub fn to_message_field(&self) -> MessageField {
        let repetition = if self.nullable {
            Repetition::Optional
        } else {
            Repetition::Required
        };
        let (primitive, annotation) = match self.sql_type {
            SqlType::Varchar => (Primitive::Binary, None),
            SqlType::Timestamp => (Primitive::Int96, None),
            SqlType::Time => (Primitive::Int32, Some(Annotation::TimeMillis)),
            SqlType::Date => (Primitive::Int32, Some(Annotation::Date)),
            SqlType::TinyInt => (Primitive::Int32, Some(Annotation::Int8)),
            SqlType::ShortInt => (Primitive::Int32, Some(Annotation::Int16)),
            SqlType::Int => (Primitive::Int64, Some(Annotation::Int64)),
            SqlType::Double => (Primitive::Double, None),
            SqlType::Float => (Primitive::Float, None),
            SqlType::Bool => (Primitive::Boolean, None),
        };
        MessageField {
            name: self.name.clone(),
            repetition,
            primitive,
            annotation,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{ColumnDef, SqlType, extract};
    use crate::core::message_type::{Annotation, Primitive, Repetition};

    fn def(name: &str, sql_type: SqlType, length: u32, nullable: bool) -> ColumnDef {
        ColumnDef {
            name: name.to_string(),
            sql_type,
            length,
            nullable,
        }
    }

    #[test]
    fn varchar_variants_capture_length() {
        assert_eq!(
            extract("ABC CHARACTER VARYING(16)"),
            Some(def("ABC", SqlType::Varchar, 16, false))
        );
        assert_eq!(
            extract("abc VARcHAR(37) NULL"),
            Some(def("abc", SqlType::Varchar, 37, true))
        );
        assert_eq!(
            extract("  label NVARCHAR(5),"),
            Some(def("label", SqlType::Varchar, 5, false))
        );
    }

    #[test]
    fn priority_order_picks_timestamp_before_time() {
        assert_eq!(extract("ts TIMESTAMP NULL,").unwrap().sql_type, SqlType::Timestamp);
        assert_eq!(extract("t TIME,").unwrap().sql_type, SqlType::Time);
        assert_eq!(extract("d DATE").unwrap().sql_type, SqlType::Date);
        assert_eq!(extract("s SHORTINT").unwrap().sql_type, SqlType::ShortInt);
        assert_eq!(extract("b TINYINT").unwrap().sql_type, SqlType::TinyInt);
        assert_eq!(extract("x DOUBLE").unwrap().sql_type, SqlType::Double);
        assert_eq!(extract("f FLOAT").unwrap().sql_type, SqlType::Float);
        assert_eq!(extract("ok BOOLEAN").unwrap().sql_type, SqlType::Bool);
    }

    #[test]
    fn int_maps_to_int64() {
        let column = extract("n INTEGER NULL").expect("column");
        assert_eq!(column.sql_type, SqlType::Int);
        let field = column.to_message_field();
        assert_eq!(field.primitive, Primitive::Int64);
        assert_eq!(field.annotation, Some(Annotation::Int64));
        assert_eq!(field.repetition, Repetition::Optional);
    }

    #[test]
    fn any_null_token_marks_nullable() {
        let column = extract("id INT NOT NULL,").expect("column");
        assert!(column.nullable);
        assert_eq!(column.to_message_field().repetition, Repetition::Optional);
        assert!(!extract("id INT,").expect("column").nullable);
        assert!(!extract("nullcount INT,").expect("column").nullable);
    }

    #[test]
    fn unmatched_lines_are_none() {
        assert_eq!(extract("CREATE TABLE sales ("), None);
        assert_eq!(extract(");"), None);
        assert_eq!(extract("amount NUMERIC(10,2)"), None);
    }

    #[test]
    fn message_field_mapping() {
        let time = extract("t TIME").unwrap().to_message_field();
        assert_eq!(time.primitive, Primitive::Int32);
        assert_eq!(time.annotation, Some(Annotation::TimeMillis));
        let ts = extract("ts TIMESTAMP").unwrap().to_message_field();
        assert_eq!(ts.primitive, Primitive::Int96);
        let date = extract("d DATE").unwrap().to_message_field();
        assert_eq!(date.annotation, Some(Annotation::Date));
    }
}
