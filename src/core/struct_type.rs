//! Purpose: Parse and print the `struct<name:type,...>` schema description.
//! Exports: `StructType`, `StructField`, `Category`.
//! Role: Native representation for struct-syntax schemas; also derived for every other syntax.
//! Invariants: Parsing ignores all whitespace, so line-broken descriptions are accepted.
//! Invariants: Nested categories parse but carry no column mapping.
use std::fmt;

use crate::core::schema::SchemaParseError;

const SYNTAX: &str = "struct";

/// Length used for `varchar` when the source form does not carry one.
pub const DEFAULT_VARCHAR_LENGTH: u32 = 65_535;
pub const DEFAULT_DECIMAL_PRECISION: u32 = 38;
pub const DEFAULT_DECIMAL_SCALE: u32 = 10;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Category {
    Boolean,
    Byte,
    Short,
    Int,
    Long,
    Float,
    Double,
    Decimal { precision: u32, scale: u32 },
    String,
    Varchar(u32),
    Char(u32),
    /// A retained length marks a fixed-width binary column.
    Binary(Option<u32>),
    Date,
    Timestamp,
    Nested(NestedKind, Vec<StructField>),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NestedKind {
    Struct,
    Array,
    Map,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StructField {
    pub name: String,
    pub category: Category,
    pub nullable: bool,
}

impl StructField {
    pub fn new(name: impl Into<String>, category: Category) -> Self {
        Self {
            name: name.into(),
            category,
            nullable: true,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StructType {
    pub fields: Vec<StructField>,
}

impl StructType {
    pub fn new(fields: Vec<StructField>) -> Self {
        Self { fields }
    }

    pub fn parse(text: &str) -> Result<Self, SchemaParseError> {
        let compact = text.chars().filter(|c| !c.is_whitespace()).collect::<String>();
        let mut parser = Parser {
            input: compact.as_bytes(),
            pos: 0,
        };
        let category = parser.category()?;
        if parser.pos != parser.input.len() {
            return Err(parser.error("trailing text after the closing `>`"));
        }
        match category {
            Category::Nested(NestedKind::Struct, fields) if !fields.is_empty() => {
                Ok(Self { fields })
            }
            Category::Nested(NestedKind::Struct, _) => Err(parser.error("struct declares no fields")),
            _ => Err(parser.error("top level must be `struct<...>`")),
        }
    }
}

impl Category {
    pub fn keyword(&self) -> &'static str {
        match self {
            Category::Boolean => "boolean",
            Category::Byte => "tinyint",
            Category::Short => "smallint",
            Category::Int => "int",
            Category::Long => "bigint",
            Category::Float => "float",
            Category::Double => "double",
            Category::Decimal { .. } => "decimal",
            Category::String => "string",
            Category::Varchar(_) => "varchar",
            Category::Char(_) => "char",
            Category::Binary(_) => "binary",
            Category::Date => "date",
            Category::Timestamp => "timestamp",
            Category::Nested(NestedKind::Struct, _) => "struct",
            Category::Nested(NestedKind::Array, _) => "array",
            Category::Nested(NestedKind::Map, _) => "map",
        }
    }
}

struct Parser<'a> {
    input: &'a [u8],
    pos: usize,
}

impl Parser<'_> {
    fn category(&mut self) -> Result<Category, SchemaParseError> {
        let word = self.word().to_ascii_lowercase();
        let category = match word.as_str() {
            "boolean" => Category::Boolean,
            "tinyint" | "byte" => Category::Byte,
            "smallint" | "short" => Category::Short,
            "int" | "integer" => Category::Int,
            "bigint" | "long" => Category::Long,
            "float" => Category::Float,
            "double" => Category::Double,
            "string" => Category::String,
            "date" => Category::Date,
            "timestamp" => Category::Timestamp,
            "binary" => Category::Binary(None),
            "varchar" => Category::Varchar(self.single_arg()?.unwrap_or(DEFAULT_VARCHAR_LENGTH)),
            "char" => Category::Char(self.single_arg()?.unwrap_or(1)),
            "decimal" => self.decimal()?,
            "struct" => {
                self.expect(b'<')?;
                let fields = self.fields()?;
                Category::Nested(NestedKind::Struct, fields)
            }
            "array" => {
                self.expect(b'<')?;
                let element = self.category()?;
                self.expect(b'>')?;
                Category::Nested(NestedKind::Array, vec![StructField::new("_elem", element)])
            }
            "map" => {
                self.expect(b'<')?;
                let key = self.category()?;
                self.expect(b',')?;
                let value = self.category()?;
                self.expect(b'>')?;
                Category::Nested(
                    NestedKind::Map,
                    vec![StructField::new("_key", key), StructField::new("_value", value)],
                )
            }
            "" => return Err(self.error("expected a type name")),
            other => return Err(SchemaParseError::UnmappedType(other.to_string())),
        };
        Ok(category)
    }

    fn fields(&mut self) -> Result<Vec<StructField>, SchemaParseError> {
        let mut fields = Vec::new();
        if self.eat(b'>') {
            return Ok(fields);
        }
        loop {
            let name = self.field_name();
            if name.is_empty() {
                return Err(self.error("expected a field name"));
            }
            self.expect(b':')?;
            let category = self.category()?;
            fields.push(StructField::new(name, category));
            if self.eat(b',') {
                continue;
            }
            self.expect(b'>')?;
            return Ok(fields);
        }
    }

    fn decimal(&mut self) -> Result<Category, SchemaParseError> {
        if !self.eat(b'(') {
            return Ok(Category::Decimal {
                precision: DEFAULT_DECIMAL_PRECISION,
                scale: DEFAULT_DECIMAL_SCALE,
            });
        }
        let precision = self.number()?;
        let scale = if self.eat(b',') { self.number()? } else { 0 };
        self.expect(b')')?;
        if scale > precision {
            return Err(self.error("decimal scale exceeds precision"));
        }
        Ok(Category::Decimal { precision, scale })
    }

    fn single_arg(&mut self) -> Result<Option<u32>, SchemaParseError> {
        if !self.eat(b'(') {
            return Ok(None);
        }
        let value = self.number()?;
        self.expect(b')')?;
        Ok(Some(value))
    }

    fn word(&mut self) -> String {
        self.take_while(|b| b.is_ascii_alphanumeric() || b == b'_')
    }

    fn field_name(&mut self) -> String {
        self.take_while(|b| !matches!(b, b':' | b',' | b'<' | b'>' | b'(' | b')'))
    }

    fn number(&mut self) -> Result<u32, SchemaParseError> {
        let digits = self.take_while(|b| b.is_ascii_digit());
        digits
            .parse::<u32>()
            .map_err(|_| self.error("expected a number"))
    }

    fn take_while(&mut self, keep: impl Fn(u8) -> bool) -> String {
        let start = self.pos;
        while self.pos < self.input.len() && keep(self.input[self.pos]) {
            self.pos += 1;
        }
        String::from_utf8_lossy(&self.input[start..self.pos]).into_owned()
    }

    fn eat(&mut self, byte: u8) -> bool {
        if self.input.get(self.pos) == Some(&byte) {
            self.pos += 1;
            return true;
        }
        false
    }

    fn expect(&mut self, byte: u8) -> Result<(), SchemaParseError> {
        if self.eat(byte) {
            return Ok(());
        }
        Err(self.error(format!("expected `{}`", byte as char)))
    }

    fn error(&self, detail: impl Into<String>) -> SchemaParseError {
        SchemaParseError::Malformed {
            syntax: SYNTAX,
            detail: format!("{} at offset {}", detail.into(), self.pos),
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Category::Decimal { precision, scale } => write!(f, "decimal({precision},{scale})"),
            Category::Varchar(len) => write!(f, "varchar({len})"),
            Category::Char(len) => write!(f, "char({len})"),
            Category::Nested(NestedKind::Struct, fields) => {
                f.write_str("struct<")?;
                for (idx, field) in fields.iter().enumerate() {
                    if idx > 0 {
                        f.write_str(",")?;
                    }
                    write!(f, "{}:{}", field.name, field.category)?;
                }
                f.write_str(">")
            }
            Category::Nested(NestedKind::Array, fields) => match fields.first() {
                Some(elem) => write!(f, "array<{}>", elem.category),
                None => f.write_str("array<>"),
            },
            Category::Nested(NestedKind::Map, fields) => match (fields.first(), fields.get(1)) {
                (Some(key), Some(value)) => write!(f, "map<{},{}>", key.category, value.category),
                _ => f.write_str("map<>"),
            },
            other => f.write_str(other.keyword()),
        }
    }
}

impl fmt::Display for StructType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        Category::Nested(NestedKind::Struct, self.fields.clone()).fmt(f)
    }
}
