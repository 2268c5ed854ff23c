//! Purpose: Unify struct, message and SQL DDL schema text into one canonical `Schema`.
//! Exports: `Schema`, `Column`, `LogicalType`, `SchemaSyntax`, `SchemaParseError`,
//!          `derive_struct`, `derive_message`.
//! Role: Built once per conversion; read-only afterwards by codecs, shaper and sinks.
//! Invariants: Column types are derived from the native form and never change.
//! Invariants: Both canonical forms are always present once a `Schema` exists.
//! Invariants: Unmapped categories fail construction instead of degrading silently.
use std::fmt;

use crate::core::message_type::{Annotation, MessageField, MessageType, Primitive, Repetition};
use crate::core::sql_scan::{self, ColumnDef, SqlType};
use crate::core::struct_type::{
    Category, DEFAULT_VARCHAR_LENGTH, NestedKind, StructField, StructType,
};

/// Name given to message types derived from struct or SQL descriptions.
pub const DERIVED_MESSAGE_NAME: &str = "m";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SchemaParseError {
    #[error("schema text is neither `struct<...>`, `message name {{ ... }}`, nor CREATE TABLE DDL")]
    UnrecognizedSyntax,
    #[error("type `{0}` has no mapping between schema forms")]
    UnmappedType(String),
    #[error("malformed {syntax} schema: {detail}")]
    Malformed { syntax: &'static str, detail: String },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogicalType {
    Boolean,
    Int32,
    Int64,
    Float,
    Double,
    Binary,
    /// Maximum length in characters; 0 means unbounded.
    Varchar(u32),
    Decimal { precision: u32, scale: u32 },
    Date,
    TimeMillis,
    TimeMicros,
    /// INT64 epoch milliseconds.
    TimestampMillis,
    /// INT64 epoch microseconds.
    TimestampMicros,
    TimestampInt96,
    FixedBinary(u32),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Column {
    pub name: String,
    pub logical_type: LogicalType,
    pub nullable: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SchemaSyntax {
    Struct,
    Message,
    SqlDdl,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Schema {
    columns: Vec<Column>,
    message: MessageType,
    struct_type: StructType,
    syntax: SchemaSyntax,
}

impl Schema {
    /// Detects the syntax of `text`, parses it and cross-derives the other form.
    pub fn parse(text: &str) -> Result<Self, SchemaParseError> {
        let text = text.replace("\r\n", "\n");
        let syntax = detect_syntax(&text)?;
        tracing::debug!(?syntax, "detected schema syntax");
        match syntax {
            SchemaSyntax::Struct => Self::from_struct(StructType::parse(&text)?),
            SchemaSyntax::Message => Self::from_message(MessageType::parse(&text)?),
            SchemaSyntax::SqlDdl => Self::from_sql(&text),
        }
    }

    pub fn from_message(message: MessageType) -> Result<Self, SchemaParseError> {
        let columns = message
            .fields
            .iter()
            .map(|field| {
                Ok(Column {
                    name: field.name.clone(),
                    logical_type: message_logical_type(field)?,
                    nullable: field.nullable(),
                })
            })
            .collect::<Result<Vec<_>, SchemaParseError>>()?;
        let struct_type = derive_struct(&message)?;
        Ok(Self {
            columns,
            message,
            struct_type,
            syntax: SchemaSyntax::Message,
        })
    }

    pub fn from_struct(struct_type: StructType) -> Result<Self, SchemaParseError> {
        let columns = struct_type
            .fields
            .iter()
            .map(|field| {
                Ok(Column {
                    name: field.name.clone(),
                    logical_type: struct_logical_type(&field.category)?,
                    nullable: field.nullable,
                })
            })
            .collect::<Result<Vec<_>, SchemaParseError>>()?;
        let message = derive_message(&struct_type)?;
        Ok(Self {
            columns,
            message,
            struct_type,
            syntax: SchemaSyntax::Struct,
        })
    }

    fn from_sql(text: &str) -> Result<Self, SchemaParseError> {
        let defs = text.lines().filter_map(sql_scan::extract).collect::<Vec<_>>();
        if defs.is_empty() {
            return Err(SchemaParseError::Malformed {
                syntax: "SQL",
                detail: "no column definitions found".to_string(),
            });
        }
        let message = MessageType::new(
            DERIVED_MESSAGE_NAME,
            defs.iter().map(ColumnDef::to_message_field).collect(),
        );
        let mut struct_fields = Vec::with_capacity(defs.len());
        let mut columns = Vec::with_capacity(defs.len());
        for (def, field) in defs.iter().zip(&message.fields) {
            let mut struct_field = struct_field_for(field)?;
            let logical_type = match def.sql_type {
                SqlType::Varchar => {
                    struct_field.category = Category::Varchar(def.length);
                    LogicalType::Varchar(def.length)
                }
                _ => message_logical_type(field)?,
            };
            struct_fields.push(struct_field);
            columns.push(Column {
                name: def.name.clone(),
                logical_type,
                nullable: def.nullable,
            });
        }
        Ok(Self {
            columns,
            message,
            struct_type: StructType::new(struct_fields),
            syntax: SchemaSyntax::SqlDdl,
        })
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn message(&self) -> &MessageType {
        &self.message
    }

    pub fn struct_type(&self) -> &StructType {
        &self.struct_type
    }

    pub fn syntax(&self) -> SchemaSyntax {
        self.syntax
    }

    /// One `name TYPE [NULL];` line per column.
    pub fn sql_lines(&self) -> Vec<String> {
        self.columns
            .iter()
            .map(|column| {
                let null = if column.nullable { " NULL" } else { "" };
                format!("{} {}{null};", column.name, sql_type_name(column.logical_type))
            })
            .collect()
    }
}

fn detect_syntax(text: &str) -> Result<SchemaSyntax, SchemaParseError> {
    if text.trim_start().starts_with("struct<") {
        return Ok(SchemaSyntax::Struct);
    }
    if text.contains("message") && text.contains('{') {
        return Ok(SchemaSyntax::Message);
    }
    if text.contains("CREATE") && text.contains("TABLE") {
        return Ok(SchemaSyntax::SqlDdl);
    }
    Err(SchemaParseError::UnrecognizedSyntax)
}

/// Struct form of a message; every field must have a struct category.
pub fn derive_struct(message: &MessageType) -> Result<StructType, SchemaParseError> {
    message
        .fields
        .iter()
        .map(struct_field_for)
        .collect::<Result<Vec<_>, _>>()
        .map(StructType::new)
}

/// Message form of a struct description, named `m`.
pub fn derive_message(struct_type: &StructType) -> Result<MessageType, SchemaParseError> {
    let fields = struct_type
        .fields
        .iter()
        .map(|field| {
            let repetition = if field.nullable {
                Repetition::Optional
            } else {
                Repetition::Required
            };
            let (primitive, annotation) = match &field.category {
                Category::Boolean => (Primitive::Boolean, None),
                Category::Byte => (Primitive::Int32, Some(Annotation::Int8)),
                Category::Short => (Primitive::Int32, Some(Annotation::Int16)),
                Category::Int => (Primitive::Int32, None),
                Category::Long => (Primitive::Int64, None),
                Category::Float => (Primitive::Float, None),
                Category::Double => (Primitive::Double, None),
                Category::Decimal { precision, scale } => (
                    Primitive::Binary,
                    Some(Annotation::Decimal {
                        precision: *precision,
                        scale: *scale,
                    }),
                ),
                Category::String => (Primitive::Binary, Some(Annotation::Utf8)),
                Category::Varchar(_) | Category::Char(_) => (Primitive::Binary, None),
                Category::Binary(Some(len)) => (Primitive::FixedLenByteArray(*len), None),
                Category::Binary(None) => (Primitive::Binary, None),
                Category::Date => (Primitive::Int32, Some(Annotation::Date)),
                Category::Timestamp => (Primitive::Int96, None),
                nested @ Category::Nested(..) => {
                    return Err(SchemaParseError::UnmappedType(nested.keyword().to_string()));
                }
            };
            Ok(MessageField {
                name: field.name.clone(),
                repetition,
                primitive,
                annotation,
            })
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok(MessageType::new(DERIVED_MESSAGE_NAME, fields))
}

fn struct_field_for(field: &MessageField) -> Result<StructField, SchemaParseError> {
    use Annotation as A;
    let category = match (field.primitive, field.annotation) {
        (Primitive::Boolean, None) => Category::Boolean,
        (Primitive::Binary, None) => Category::Varchar(DEFAULT_VARCHAR_LENGTH),
        (Primitive::Binary, Some(A::Utf8)) => Category::String,
        (
            Primitive::Binary | Primitive::Int32 | Primitive::Int64,
            Some(A::Decimal { precision, scale }),
        ) => Category::Decimal { precision, scale },
        (Primitive::Int32, None | Some(A::Int32)) => Category::Int,
        (Primitive::Int32, Some(A::Int8)) => Category::Byte,
        (Primitive::Int32, Some(A::Int16)) => Category::Short,
        (Primitive::Int32, Some(A::Date)) => Category::Date,
        (Primitive::Int32, Some(A::TimeMillis)) => Category::Timestamp,
        (Primitive::Int64, None | Some(A::Int64)) => Category::Long,
        (
            Primitive::Int64,
            Some(A::Date | A::TimeMillis | A::TimeMicros | A::TimestampMillis | A::TimestampMicros),
        ) => Category::Timestamp,
        (Primitive::Int96, None) => Category::Timestamp,
        (Primitive::Float, None) => Category::Float,
        (Primitive::Double, None) => Category::Double,
        (Primitive::FixedLenByteArray(len), None) => Category::Binary(Some(len)),
        (primitive, annotation) => return Err(unmapped(primitive, annotation)),
    };
    Ok(StructField {
        name: field.name.clone(),
        category,
        nullable: field.nullable(),
    })
}

fn message_logical_type(field: &MessageField) -> Result<LogicalType, SchemaParseError> {
    use Annotation as A;
    let logical_type = match (field.primitive, field.annotation) {
        (Primitive::Boolean, None) => LogicalType::Boolean,
        (
            Primitive::Binary | Primitive::Int32 | Primitive::Int64,
            Some(A::Decimal { precision, scale }),
        ) => LogicalType::Decimal { precision, scale },
        (Primitive::Binary, None | Some(A::Utf8)) => LogicalType::Varchar(0),
        (Primitive::Int32, None | Some(A::Int8 | A::Int16 | A::Int32)) => LogicalType::Int32,
        (Primitive::Int32, Some(A::Date)) => LogicalType::Date,
        (Primitive::Int32, Some(A::TimeMillis)) => LogicalType::TimeMillis,
        (Primitive::Int64, Some(A::TimeMicros)) => LogicalType::TimeMicros,
        (Primitive::Int64, Some(A::TimestampMillis)) => LogicalType::TimestampMillis,
        (Primitive::Int64, Some(A::TimestampMicros)) => LogicalType::TimestampMicros,
        (Primitive::Int64, None | Some(A::Int64 | A::Date | A::TimeMillis)) => LogicalType::Int64,
        (Primitive::Int96, None) => LogicalType::TimestampInt96,
        (Primitive::Float, None) => LogicalType::Float,
        (Primitive::Double, None) => LogicalType::Double,
        (Primitive::FixedLenByteArray(len), None) => LogicalType::FixedBinary(len),
        (primitive, annotation) => return Err(unmapped(primitive, annotation)),
    };
    Ok(logical_type)
}

fn struct_logical_type(category: &Category) -> Result<LogicalType, SchemaParseError> {
    let logical_type = match category {
        Category::Boolean => LogicalType::Boolean,
        Category::Byte | Category::Short | Category::Int => LogicalType::Int32,
        Category::Long => LogicalType::Int64,
        Category::Float => LogicalType::Float,
        Category::Double => LogicalType::Double,
        Category::Decimal { precision, scale } => LogicalType::Decimal {
            precision: *precision,
            scale: *scale,
        },
        Category::String => LogicalType::Varchar(0),
        Category::Varchar(len) | Category::Char(len) => LogicalType::Varchar(*len),
        Category::Binary(Some(len)) => LogicalType::FixedBinary(*len),
        Category::Binary(None) => LogicalType::Binary,
        Category::Date => LogicalType::Date,
        Category::Timestamp => LogicalType::TimestampInt96,
        Category::Nested(kind, _) => {
            let name = match kind {
                NestedKind::Struct => "struct",
                NestedKind::Array => "array",
                NestedKind::Map => "map",
            };
            return Err(SchemaParseError::UnmappedType(name.to_string()));
        }
    };
    Ok(logical_type)
}

fn unmapped(primitive: Primitive, annotation: Option<Annotation>) -> SchemaParseError {
    match annotation {
        Some(annotation) => SchemaParseError::UnmappedType(format!("{primitive} ({annotation})")),
        None => SchemaParseError::UnmappedType(primitive.to_string()),
    }
}

fn sql_type_name(logical_type: LogicalType) -> String {
    match logical_type {
        LogicalType::Boolean => "BOOL".to_string(),
        LogicalType::Int32 => "INTEGER".to_string(),
        LogicalType::Int64 => "BIGINT".to_string(),
        LogicalType::Float => "FLOAT".to_string(),
        LogicalType::Double => "DOUBLE".to_string(),
        LogicalType::Binary => "VARBINARY".to_string(),
        LogicalType::Varchar(0) => "VARCHAR".to_string(),
        LogicalType::Varchar(len) => format!("VARCHAR({len})"),
        LogicalType::Decimal { precision, scale } => format!("DECIMAL({precision},{scale})"),
        LogicalType::Date => "DATE".to_string(),
        LogicalType::TimeMillis | LogicalType::TimeMicros => "TIME".to_string(),
        LogicalType::TimestampMillis
        | LogicalType::TimestampMicros
        | LogicalType::TimestampInt96 => "TIMESTAMP".to_string(),
        LogicalType::FixedBinary(len) => format!("BINARY({len})"),
    }
}

impl fmt::Display for LogicalType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogicalType::Boolean => f.write_str("Boolean"),
            LogicalType::Int32 => f.write_str("Int32"),
            LogicalType::Int64 => f.write_str("Int64"),
            LogicalType::Float => f.write_str("Float"),
            LogicalType::Double => f.write_str("Double"),
            LogicalType::Binary => f.write_str("Binary"),
            LogicalType::Varchar(len) => write!(f, "Varchar({len})"),
            LogicalType::Decimal { precision, scale } => write!(f, "Decimal({precision},{scale})"),
            LogicalType::Date => f.write_str("Date"),
            LogicalType::TimeMillis => f.write_str("TimeMillis"),
            LogicalType::TimeMicros => f.write_str("TimeMicros"),
            LogicalType::TimestampMillis => f.write_str("TimestampMillis"),
            LogicalType::TimestampMicros => f.write_str("TimestampMicros"),
            LogicalType::TimestampInt96 => f.write_str("TimestampInt96"),
            LogicalType::FixedBinary(len) => write!(f, "FixedBinary({len})"),
        }
    }
}
