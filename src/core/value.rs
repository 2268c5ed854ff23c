//! Purpose: Convert single CSV cells to typed values and back, driven by column types.
//! Exports: `TypedValue`, `ValueCodec`, `DecodeError`, `DecodeCause`, `EncodeError`, `EncodeCause`.
//! Role: Per-cell codec between the row shaper and the columnar sink/source.
//! Invariants: The NULL marker is checked before any other parse.
//! Invariants: In binary mode a valid hex literal wins over the text parse.
//! Invariants: A failing cell fails the whole row; nothing is partially emitted.
use std::num::{ParseFloatError, ParseIntError};

use crate::core::hex::{self, HexLiteral};
use crate::core::options::CsvDialect;
use crate::core::schema::{Column, LogicalType, Schema};
use crate::core::temporal::{self, Int96Timestamp, TemporalParseError};

#[derive(Clone, Debug, PartialEq)]
pub enum TypedValue {
    Null,
    Boolean(bool),
    Int32(i32),
    Int64(i64),
    Float(f32),
    Double(f64),
    /// Binary, Varchar and FixedBinary payloads.
    Bytes(Vec<u8>),
    Decimal { unscaled: i128, scale: u32 },
    Date(i32),
    TimeMillis(i32),
    TimeMicros(i64),
    TimestampMillis(i64),
    TimestampMicros(i64),
    Timestamp(Int96Timestamp),
}

impl TypedValue {
    pub fn is_null(&self) -> bool {
        matches!(self, TypedValue::Null)
    }

    /// Short tag used in mismatch diagnostics.
    pub fn tag(&self) -> &'static str {
        match self {
            TypedValue::Null => "null",
            TypedValue::Boolean(_) => "boolean",
            TypedValue::Int32(_) => "int32",
            TypedValue::Int64(_) => "int64",
            TypedValue::Float(_) => "float",
            TypedValue::Double(_) => "double",
            TypedValue::Bytes(_) => "bytes",
            TypedValue::Decimal { .. } => "decimal",
            TypedValue::Date(_) => "date",
            TypedValue::TimeMillis(_) => "time_millis",
            TypedValue::TimeMicros(_) => "time_micros",
            TypedValue::TimestampMillis(_) => "timestamp_millis",
            TypedValue::TimestampMicros(_) => "timestamp_micros",
            TypedValue::Timestamp(_) => "timestamp",
        }
    }

    /// Null is compatible with every type; nullability is enforced by sinks.
    pub fn fits(&self, logical_type: LogicalType) -> bool {
        match (self, logical_type) {
            (TypedValue::Null, _) => true,
            (TypedValue::Boolean(_), LogicalType::Boolean) => true,
            (TypedValue::Int32(_), LogicalType::Int32) => true,
            (TypedValue::Int64(_), LogicalType::Int64) => true,
            (TypedValue::Float(_), LogicalType::Float) => true,
            (TypedValue::Double(_), LogicalType::Double) => true,
            (
                TypedValue::Bytes(_),
                LogicalType::Binary | LogicalType::Varchar(_) | LogicalType::FixedBinary(_),
            ) => true,
            (TypedValue::Decimal { scale, .. }, LogicalType::Decimal { scale: expected, .. }) => {
                *scale == expected
            }
            (TypedValue::Date(_), LogicalType::Date) => true,
            (TypedValue::TimeMillis(_), LogicalType::TimeMillis) => true,
            (TypedValue::TimeMicros(_), LogicalType::TimeMicros) => true,
            (TypedValue::TimestampMillis(_), LogicalType::TimestampMillis) => true,
            (TypedValue::TimestampMicros(_), LogicalType::TimestampMicros) => true,
            (TypedValue::Timestamp(_), LogicalType::TimestampInt96) => true,
            _ => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DecodeCause {
    #[error("invalid integer: {0}")]
    Integer(#[from] ParseIntError),
    #[error("invalid floating point number: {0}")]
    Float(#[from] ParseFloatError),
    #[error(transparent)]
    Temporal(#[from] TemporalParseError),
    #[error("not a plain decimal number")]
    DecimalSyntax,
    #[error("{digits} fraction digits exceed scale {scale}")]
    DecimalScale { digits: usize, scale: u32 },
    #[error("{digits} significant digits exceed precision {precision}")]
    DecimalPrecision { digits: usize, precision: u32 },
    #[error("{actual} characters exceed the declared length {max}")]
    TooLong { max: u32, actual: usize },
    #[error("expected exactly {expected} bytes, found {actual}")]
    LengthMismatch { expected: u32, actual: usize },
    #[error("row has no column at this position")]
    NoColumn,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("column {column_index} `{column_name}` ({target_type}): cannot decode `{raw_text}`")]
pub struct DecodeError {
    pub column_index: usize,
    pub column_name: String,
    pub target_type: LogicalType,
    pub raw_text: String,
    #[source]
    pub cause: DecodeCause,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EncodeCause {
    #[error("value of kind {found} does not fit the column type")]
    TypeMismatch { found: &'static str },
    #[error(transparent)]
    Temporal(#[from] TemporalParseError),
    #[error("row has no column at this position")]
    NoColumn,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("column {column_index} `{column_name}` ({target_type}): cannot render value")]
pub struct EncodeError {
    pub column_index: usize,
    pub column_name: String,
    pub target_type: LogicalType,
    #[source]
    pub cause: EncodeCause,
}

/// Cell codec bound to one schema and one dialect.
#[derive(Clone, Copy, Debug)]
pub struct ValueCodec<'a> {
    columns: &'a [Column],
    dialect: &'a CsvDialect,
}

impl<'a> ValueCodec<'a> {
    pub fn new(schema: &'a Schema, dialect: &'a CsvDialect) -> Self {
        Self {
            columns: schema.columns(),
            dialect,
        }
    }

    pub fn decode_field(&self, index: usize, text: &str) -> Result<TypedValue, DecodeError> {
        let Some(column) = self.columns.get(index) else {
            return Err(DecodeError {
                column_index: index,
                column_name: String::new(),
                target_type: LogicalType::Binary,
                raw_text: text.to_string(),
                cause: DecodeCause::NoColumn,
            });
        };
        if text == self.dialect.null_marker {
            return Ok(TypedValue::Null);
        }
        if self.dialect.binary_literals {
            if let Some(literal) = hex::parse(text) {
                return Ok(from_literal(literal, column.logical_type));
            }
        }
        from_text(text, column.logical_type).map_err(|cause| DecodeError {
            column_index: index,
            column_name: column.name.clone(),
            target_type: column.logical_type,
            raw_text: text.to_string(),
            cause,
        })
    }

    /// Decodes an already shaped row; the first failing cell aborts the row.
    pub fn decode_row<S: AsRef<str>>(&self, fields: &[S]) -> Result<Vec<TypedValue>, DecodeError> {
        fields
            .iter()
            .enumerate()
            .map(|(index, text)| self.decode_field(index, text.as_ref()))
            .collect()
    }

    pub fn encode_field(&self, index: usize, value: &TypedValue) -> Result<String, EncodeError> {
        let Some(column) = self.columns.get(index) else {
            return Err(EncodeError {
                column_index: index,
                column_name: String::new(),
                target_type: LogicalType::Binary,
                cause: EncodeCause::NoColumn,
            });
        };
        let fail = |cause: EncodeCause| EncodeError {
            column_index: index,
            column_name: column.name.clone(),
            target_type: column.logical_type,
            cause,
        };
        if !value.fits(column.logical_type) {
            return Err(fail(EncodeCause::TypeMismatch { found: value.tag() }));
        }
        let text = match value {
            TypedValue::Null => self.dialect.null_marker.clone(),
            TypedValue::Boolean(flag) => flag.to_string(),
            TypedValue::Int32(v) => v.to_string(),
            TypedValue::Int64(v) => v.to_string(),
            TypedValue::Float(v) => v.to_string(),
            TypedValue::Double(v) => v.to_string(),
            TypedValue::Decimal { unscaled, scale } => format_decimal(*unscaled, *scale),
            TypedValue::Date(days) => temporal::decode_date(*days).map_err(|e| fail(e.into()))?,
            TypedValue::TimeMillis(v) => {
                temporal::decode_time_millis(*v).map_err(|e| fail(e.into()))?
            }
            TypedValue::TimeMicros(v) => {
                temporal::decode_time_micros(*v).map_err(|e| fail(e.into()))?
            }
            TypedValue::TimestampMillis(v) => {
                temporal::decode_timestamp_millis(*v).map_err(|e| fail(e.into()))?
            }
            TypedValue::TimestampMicros(v) => {
                temporal::decode_timestamp_micros(*v).map_err(|e| fail(e.into()))?
            }
            TypedValue::Timestamp(ts) => {
                temporal::decode_timestamp(*ts).map_err(|e| fail(e.into()))?
            }
            TypedValue::Bytes(bytes) => self.render_bytes(bytes, column.logical_type),
        };
        Ok(text)
    }

    pub fn encode_row(&self, values: &[TypedValue]) -> Result<Vec<String>, EncodeError> {
        values
            .iter()
            .enumerate()
            .map(|(index, value)| self.encode_field(index, value))
            .collect()
    }

    fn render_bytes(&self, bytes: &[u8], logical_type: LogicalType) -> String {
        let raw_column = matches!(
            logical_type,
            LogicalType::Binary | LogicalType::FixedBinary(_)
        );
        if self.dialect.binary_literals && raw_column {
            return hex::format(bytes);
        }
        match std::str::from_utf8(bytes) {
            Ok(text) => text.to_string(),
            Err(_) => hex::format(bytes),
        }
    }
}

fn from_literal(literal: HexLiteral, logical_type: LogicalType) -> TypedValue {
    match logical_type {
        LogicalType::Boolean => TypedValue::Boolean(literal.as_bool()),
        LogicalType::Int32 => TypedValue::Int32(literal.as_int32()),
        LogicalType::Int64 => TypedValue::Int64(literal.as_int64()),
        LogicalType::Float => TypedValue::Float(literal.as_float()),
        LogicalType::Double => TypedValue::Double(literal.as_double()),
        LogicalType::Date => TypedValue::Date(literal.as_int32()),
        LogicalType::TimeMillis => TypedValue::TimeMillis(literal.as_int32()),
        LogicalType::TimeMicros => TypedValue::TimeMicros(literal.as_int64()),
        LogicalType::TimestampMillis => TypedValue::TimestampMillis(literal.as_int64()),
        LogicalType::TimestampMicros => TypedValue::TimestampMicros(literal.as_int64()),
        LogicalType::Decimal { scale, .. } => TypedValue::Decimal {
            unscaled: i128::from(literal.as_int64()),
            scale,
        },
        LogicalType::TimestampInt96 => {
            let mut raw = [0u8; 12];
            raw.copy_from_slice(&literal.get_bytes(12));
            TypedValue::Timestamp(Int96Timestamp::from_le_bytes(raw))
        }
        LogicalType::FixedBinary(len) => TypedValue::Bytes(literal.get_bytes(len as usize)),
        LogicalType::Binary | LogicalType::Varchar(_) => {
            TypedValue::Bytes(literal.into_raw_bytes())
        }
    }
}

fn from_text(text: &str, logical_type: LogicalType) -> Result<TypedValue, DecodeCause> {
    let value = match logical_type {
        LogicalType::Boolean => TypedValue::Boolean(parse_bool(text)),
        LogicalType::Int32 => TypedValue::Int32(text.trim().parse()?),
        LogicalType::Int64 => TypedValue::Int64(text.trim().parse()?),
        LogicalType::Float => TypedValue::Float(text.trim().parse()?),
        LogicalType::Double => TypedValue::Double(text.trim().parse()?),
        LogicalType::Date => TypedValue::Date(temporal::encode_date(text)?),
        LogicalType::TimeMillis => TypedValue::TimeMillis(temporal::encode_time_millis(text)?),
        LogicalType::TimeMicros => TypedValue::TimeMicros(temporal::encode_time_micros(text)?),
        LogicalType::TimestampMillis => {
            TypedValue::TimestampMillis(temporal::encode_timestamp_millis(text)?)
        }
        LogicalType::TimestampMicros => {
            TypedValue::TimestampMicros(temporal::encode_timestamp_micros(text)?)
        }
        LogicalType::TimestampInt96 => TypedValue::Timestamp(temporal::encode_timestamp(text)?),
        LogicalType::Decimal { precision, scale } => TypedValue::Decimal {
            unscaled: parse_decimal(text, precision, scale)?,
            scale,
        },
        LogicalType::Binary => TypedValue::Bytes(text.as_bytes().to_vec()),
        LogicalType::Varchar(max) => {
            let actual = text.chars().count();
            if max > 0 && actual > max as usize {
                return Err(DecodeCause::TooLong { max, actual });
            }
            TypedValue::Bytes(text.as_bytes().to_vec())
        }
        LogicalType::FixedBinary(expected) => {
            if text.len() != expected as usize {
                return Err(DecodeCause::LengthMismatch {
                    expected,
                    actual: text.len(),
                });
            }
            TypedValue::Bytes(text.as_bytes().to_vec())
        }
    };
    Ok(value)
}

fn parse_bool(text: &str) -> bool {
    let text = text.trim();
    text.eq_ignore_ascii_case("true") || text.eq_ignore_ascii_case("t") || text == "1"
}

/// Unscaled integer for `text` at `scale`; short fractions are zero-extended.
fn parse_decimal(text: &str, precision: u32, scale: u32) -> Result<i128, DecodeCause> {
    let text = text.trim();
    let (negative, body) = match text.as_bytes().first() {
        Some(b'-') => (true, &text[1..]),
        Some(b'+') => (false, &text[1..]),
        _ => (false, text),
    };
    let (whole, fraction) = body.split_once('.').unwrap_or((body, ""));
    let all_digits = |part: &str| part.bytes().all(|b| b.is_ascii_digit());
    if (whole.is_empty() && fraction.is_empty()) || !all_digits(whole) || !all_digits(fraction) {
        return Err(DecodeCause::DecimalSyntax);
    }
    if fraction.len() > scale as usize {
        return Err(DecodeCause::DecimalScale {
            digits: fraction.len(),
            scale,
        });
    }
    let mut digits = String::with_capacity(whole.len() + scale as usize);
    digits.push_str(whole);
    digits.push_str(fraction);
    digits.push_str(&"0".repeat(scale as usize - fraction.len()));
    let significant = digits.trim_start_matches('0');
    if significant.len() > precision as usize {
        return Err(DecodeCause::DecimalPrecision {
            digits: significant.len(),
            precision,
        });
    }
    let magnitude = if significant.is_empty() {
        0
    } else {
        significant
            .parse::<i128>()
            .map_err(|_| DecodeCause::DecimalPrecision {
                digits: significant.len(),
                precision,
            })?
    };
    Ok(if negative { -magnitude } else { magnitude })
}

fn format_decimal(unscaled: i128, scale: u32) -> String {
    let sign = if unscaled < 0 { "-" } else { "" };
    let digits = unscaled.unsigned_abs().to_string();
    if scale == 0 {
        return format!("{sign}{digits}");
    }
    let scale = scale as usize;
    let padded = if digits.len() <= scale {
        format!("{}{digits}", "0".repeat(scale + 1 - digits.len()))
    } else {
        digits
    };
    let (whole, fraction) = padded.split_at(padded.len() - scale);
    format!("{sign}{whole}.{fraction}")
}
