//! Purpose: Parse and produce the `0x<hex>x0` exact-byte literal used in binary CSV mode.
//! Exports: `HexLiteral`, `parse`, `format`.
//! Role: Leaf codec consulted by `value` before any per-type text parse.
//! Invariants: Numeric views are computed eagerly from the raw bytes at parse time.
//! Invariants: Short inputs are left-padded with zeros; long inputs drop leading digits.
use std::fmt::Write as _;
use std::sync::LazyLock;

use regex::Regex;

static HEX_LITERAL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^0x((?:[0-9A-Fa-f]{2})+)x0$").expect("hex literal pattern compiles")
});

/// A parsed hex literal with every numeric reinterpretation precomputed.
#[derive(Clone, Debug, PartialEq)]
pub struct HexLiteral {
    raw: Vec<u8>,
    as_int32: i32,
    as_int64: i64,
    as_float: f32,
    as_double: f64,
}

impl HexLiteral {
    fn from_digits(digits: &str) -> Self {
        let raw = digits
            .as_bytes()
            .chunks(2)
            .map(|pair| (nibble(pair[0]) << 4) | nibble(pair[1]))
            .collect::<Vec<_>>();
        let as_int32 = u32::from_be_bytes(fit_array::<4>(&raw)) as i32;
        let as_int64 = u64::from_be_bytes(fit_array::<8>(&raw)) as i64;
        Self {
            as_float: f32::from_bits(as_int32 as u32),
            as_double: f64::from_bits(as_int64 as u64),
            raw,
            as_int32,
            as_int64,
        }
    }

    pub fn into_raw_bytes(self) -> Vec<u8> {
        self.raw
    }

    pub fn as_int32(&self) -> i32 {
        self.as_int32
    }

    pub fn as_int64(&self) -> i64 {
        self.as_int64
    }

    pub fn as_float(&self) -> f32 {
        self.as_float
    }

    pub fn as_double(&self) -> f64 {
        self.as_double
    }

    /// True when any raw byte is non-zero.
    pub fn as_bool(&self) -> bool {
        self.raw.iter().any(|b| *b != 0)
    }

    /// Raw bytes fitted to `len`: leading zero bytes added, or leading bytes dropped.
    pub fn get_bytes(&self, len: usize) -> Vec<u8> {
        fit_bytes(&self.raw, len)
    }
}

/// Parses `0x` + an even, non-zero count of hex digits + `x0`; anything else is `None`.
pub fn parse(text: &str) -> Option<HexLiteral> {
    let caps = HEX_LITERAL.captures(text)?;
    Some(HexLiteral::from_digits(caps.get(1)?.as_str()))
}

/// Renders bytes as a literal that `parse` reads back unchanged.
pub fn format(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 2 + 4);
    out.push_str("0x");
    for byte in bytes {
        let _ = write!(out, "{byte:02x}");
    }
    out.push_str("x0");
    out
}

fn fit_bytes(raw: &[u8], len: usize) -> Vec<u8> {
    if raw.len() >= len {
        return raw[raw.len() - len..].to_vec();
    }
    let mut out = vec![0u8; len - raw.len()];
    out.extend_from_slice(raw);
    out
}

fn fit_array<const N: usize>(raw: &[u8]) -> [u8; N] {
    let mut out = [0u8; N];
    let fitted = fit_bytes(raw, N);
    out.copy_from_slice(&fitted);
    out
}

fn nibble(digit: u8) -> u8 {
    match digit {
        b'0'..=b'9' => digit - b'0',
        b'a'..=b'f' => digit - b'a' + 10,
        b'A'..=b'F' => digit - b'A' + 10,
        _ => 0,
    }
}
