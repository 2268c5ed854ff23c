//! Purpose: Parse and print the flat Parquet `message name { ... }` schema text.
//! Exports: `MessageType`, `MessageField`, `Primitive`, `Annotation`, `Repetition`.
//! Role: Native representation for message-syntax schemas and the Parquet writer's input.
//! Invariants: Only flat schemas of primitive fields are accepted; groups are rejected.
//! Invariants: `Display` output parses back to an equal `MessageType`.
use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

use crate::core::schema::SchemaParseError;

const SYNTAX: &str = "message";

static HEADER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)\bmessage\s+([A-Za-z0-9_.$-]+)\s*\{(.*)\}").expect("message header pattern")
});

static FIELD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?xi)^
        (?P<rep>required|optional|repeated) \s+
        (?P<prim>boolean|int32|int64|int96|float|double|binary|byte_array
            |fixed_len_byte_array\s*\(\s*(?P<len>\d+)\s*\)) \s+
        (?P<name>[A-Za-z0-9_.$-]+) \s*
        (?: \( \s* (?P<ann>[A-Za-z0-9_]+ (?:\s*\([\d\s,]*\))? ) \s* \) )? \s*
        (?: = \s* (?P<tail>[A-Za-z0-9_]+ (?:\s*\([\d\s,]*\))? ) )? \s*
        $",
    )
    .expect("message field pattern")
});

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Repetition {
    Required,
    Optional,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Primitive {
    Boolean,
    Int32,
    Int64,
    Int96,
    Float,
    Double,
    Binary,
    FixedLenByteArray(u32),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Annotation {
    Utf8,
    Date,
    TimeMillis,
    TimeMicros,
    TimestampMillis,
    TimestampMicros,
    Decimal { precision: u32, scale: u32 },
    Int8,
    Int16,
    Int32,
    Int64,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MessageField {
    pub name: String,
    pub repetition: Repetition,
    pub primitive: Primitive,
    pub annotation: Option<Annotation>,
}

impl MessageField {
    pub fn new(name: impl Into<String>, repetition: Repetition, primitive: Primitive) -> Self {
        Self {
            name: name.into(),
            repetition,
            primitive,
            annotation: None,
        }
    }

    pub fn annotated(mut self, annotation: Annotation) -> Self {
        self.annotation = Some(annotation);
        self
    }

    pub fn nullable(&self) -> bool {
        self.repetition == Repetition::Optional
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MessageType {
    pub name: String,
    pub fields: Vec<MessageField>,
}

impl MessageType {
    pub fn new(name: impl Into<String>, fields: Vec<MessageField>) -> Self {
        Self {
            name: name.into(),
            fields,
        }
    }

    pub fn parse(text: &str) -> Result<Self, SchemaParseError> {
        let caps = HEADER
            .captures(text)
            .ok_or_else(|| malformed("expected `message <name> { ... }`"))?;
        let name = caps[1].to_string();
        let body = &caps[2];
        if body.contains('{') {
            return Err(malformed("nested groups are not supported"));
        }
        let fields = body
            .split(';')
            .map(str::trim)
            .filter(|stmt| !stmt.is_empty())
            .map(parse_field)
            .collect::<Result<Vec<_>, _>>()?;
        if fields.is_empty() {
            return Err(malformed("message declares no fields"));
        }
        Ok(Self { name, fields })
    }
}

fn parse_field(stmt: &str) -> Result<MessageField, SchemaParseError> {
    let stmt = stmt.split_whitespace().collect::<Vec<_>>().join(" ");
    let caps = FIELD
        .captures(&stmt)
        .ok_or_else(|| malformed(format!("cannot read field `{stmt}`")))?;

    let repetition = match caps["rep"].to_ascii_lowercase().as_str() {
        "required" => Repetition::Required,
        "optional" => Repetition::Optional,
        _ => return Err(malformed(format!("repeated field `{}` is not supported", &caps["name"]))),
    };
    let primitive = match caps.name("len") {
        Some(len) => Primitive::FixedLenByteArray(parse_u32(len.as_str())?),
        None => match caps["prim"].to_ascii_lowercase().as_str() {
            "boolean" => Primitive::Boolean,
            "int32" => Primitive::Int32,
            "int64" => Primitive::Int64,
            "int96" => Primitive::Int96,
            "float" => Primitive::Float,
            "double" => Primitive::Double,
            _ => Primitive::Binary,
        },
    };

    let mut annotation = caps.name("ann").map(|m| parse_annotation(m.as_str())).transpose()?;
    // `= 3` is a field id; `= DATE` is an annotation written in the alternate position.
    if let Some(tail) = caps.name("tail") {
        let tail = tail.as_str();
        if !tail.bytes().all(|b| b.is_ascii_digit()) && annotation.is_none() {
            annotation = Some(parse_annotation(tail)?);
        }
    }

    Ok(MessageField {
        name: caps["name"].to_string(),
        repetition,
        primitive,
        annotation,
    })
}

fn parse_annotation(text: &str) -> Result<Annotation, SchemaParseError> {
    let compact = text
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_ascii_uppercase();
    if let Some(args) = compact.strip_prefix("DECIMAL") {
        let args = args.trim_start_matches('(').trim_end_matches(')');
        let mut parts = args.split(',').filter(|part| !part.is_empty());
        let precision = parts.next().map(parse_u32).transpose()?.unwrap_or(38);
        let scale = parts.next().map(parse_u32).transpose()?.unwrap_or(0);
        if scale > precision {
            return Err(malformed(format!("decimal scale {scale} exceeds precision {precision}")));
        }
        return Ok(Annotation::Decimal { precision, scale });
    }
    let annotation = match compact.as_str() {
        "UTF8" | "STRING" => Annotation::Utf8,
        "DATE" => Annotation::Date,
        "TIME_MILLIS" => Annotation::TimeMillis,
        "TIME_MICROS" => Annotation::TimeMicros,
        "TIMESTAMP_MILLIS" => Annotation::TimestampMillis,
        "TIMESTAMP_MICROS" => Annotation::TimestampMicros,
        "INT_8" => Annotation::Int8,
        "INT_16" => Annotation::Int16,
        "INT_32" => Annotation::Int32,
        "INT_64" => Annotation::Int64,
        _ => return Err(SchemaParseError::UnmappedType(compact)),
    };
    Ok(annotation)
}

fn parse_u32(text: &str) -> Result<u32, SchemaParseError> {
    text.trim()
        .parse::<u32>()
        .map_err(|_| malformed(format!("expected a number, found `{text}`")))
}

fn malformed(detail: impl Into<String>) -> SchemaParseError {
    SchemaParseError::Malformed {
        syntax: SYNTAX,
        detail: detail.into(),
    }
}

impl fmt::Display for Primitive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Primitive::Boolean => f.write_str("boolean"),
            Primitive::Int32 => f.write_str("int32"),
            Primitive::Int64 => f.write_str("int64"),
            Primitive::Int96 => f.write_str("int96"),
            Primitive::Float => f.write_str("float"),
            Primitive::Double => f.write_str("double"),
            Primitive::Binary => f.write_str("binary"),
            Primitive::FixedLenByteArray(len) => write!(f, "fixed_len_byte_array({len})"),
        }
    }
}

impl fmt::Display for Annotation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Annotation::Utf8 => f.write_str("UTF8"),
            Annotation::Date => f.write_str("DATE"),
            Annotation::TimeMillis => f.write_str("TIME_MILLIS"),
            Annotation::TimeMicros => f.write_str("TIME_MICROS"),
            Annotation::TimestampMillis => f.write_str("TIMESTAMP_MILLIS"),
            Annotation::TimestampMicros => f.write_str("TIMESTAMP_MICROS"),
            Annotation::Decimal { precision, scale } => write!(f, "DECIMAL({precision},{scale})"),
            Annotation::Int8 => f.write_str("INT_8"),
            Annotation::Int16 => f.write_str("INT_16"),
            Annotation::Int32 => f.write_str("INT_32"),
            Annotation::Int64 => f.write_str("INT_64"),
        }
    }
}

impl fmt::Display for MessageField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rep = match self.repetition {
            Repetition::Required => "required",
            Repetition::Optional => "optional",
        };
        write!(f, "{rep} {} {}", self.primitive, self.name)?;
        if let Some(annotation) = &self.annotation {
            write!(f, " ({annotation})")?;
        }
        f.write_str(";")
    }
}

impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "message {} {{", self.name)?;
        for field in &self.fields {
            writeln!(f, "  {field}")?;
        }
        f.write_str("}")
    }
}

#[cfg(test)]
mod tests {
    use super::{Annotation, MessageField, MessageType, Primitive, Repetition};
    use crate::core::schema::SchemaParseError;

    #[test]
    fn parses_annotations_in_both_positions() {
        let text = "message m {\n  required int32 d (DATE);\n  optional INT64 t = TIME_MICROS;\n  required binary s (UTF8) = 3;\n}\n";
        let message = MessageType::parse(text).expect("parse");
        assert_eq!(message.name, "m");
        assert_eq!(message.fields.len(), 3);
        assert_eq!(message.fields[0].annotation, Some(Annotation::Date));
        assert_eq!(message.fields[1].annotation, Some(Annotation::TimeMicros));
        assert_eq!(message.fields[1].repetition, Repetition::Optional);
        assert_eq!(message.fields[2].annotation, Some(Annotation::Utf8));
    }

    #[test]
    fn parses_fixed_length_and_decimal() {
        let text = "message s { REQUIRED FIXED_LEN_BYTE_ARRAY(16) id; OPTIONAL BYTE_ARRAY amount (DECIMAL(10, 2)); }";
        let message = MessageType::parse(text).expect("parse");
        assert_eq!(message.fields[0].primitive, Primitive::FixedLenByteArray(16));
        assert_eq!(message.fields[1].primitive, Primitive::Binary);
        assert_eq!(
            message.fields[1].annotation,
            Some(Annotation::Decimal {
                precision: 10,
                scale: 2
            })
        );
    }

    #[test]
    fn display_parses_back() {
        let message = MessageType::new(
            "m",
            vec![
                MessageField::new("a", Repetition::Required, Primitive::Int32)
                    .annotated(Annotation::Int16),
                MessageField::new("b", Repetition::Optional, Primitive::FixedLenByteArray(4)),
                MessageField::new("c", Repetition::Optional, Primitive::Binary).annotated(
                    Annotation::Decimal {
                        precision: 38,
                        scale: 10,
                    },
                ),
                MessageField::new("d", Repetition::Required, Primitive::Int96),
            ],
        );
        let text = message.to_string();
        assert!(text.starts_with("message m {\n  required int32 a (INT_16);"));
        assert_eq!(MessageType::parse(&text).expect("parse"), message);
    }

    #[test]
    fn rejects_groups_and_repeated_fields() {
        let nested = "message m { required group g { required int32 a; } }";
        assert!(matches!(
            MessageType::parse(nested),
            Err(SchemaParseError::Malformed { .. })
        ));
        let repeated = "message m { repeated int32 a; }";
        assert!(matches!(
            MessageType::parse(repeated),
            Err(SchemaParseError::Malformed { .. })
        ));
    }

    #[test]
    fn unknown_annotation_is_unmapped() {
        let text = "message m { required binary j (JSON); }";
        assert!(matches!(
            MessageType::parse(text),
            Err(SchemaParseError::UnmappedType(name)) if name == "JSON"
        ));
    }
}
