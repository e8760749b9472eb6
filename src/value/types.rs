//! Database scalar types: object identifiers, decimals and binary blobs.

use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::OnceLock;

use chrono::Utc;
use rand::Rng;

/// A 12-byte object identifier.
///
/// Layout: 4-byte big-endian seconds, 5 process-unique random bytes,
/// 3-byte big-endian counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId([u8; 12]);

impl ObjectId {
    /// Generates a fresh identifier.
    pub fn new() -> Self {
        let secs = Utc::now().timestamp() as u32;
        let count = next_counter();

        let mut bytes = [0u8; 12];
        bytes[0..4].copy_from_slice(&secs.to_be_bytes());
        bytes[4..9].copy_from_slice(process_unique());
        bytes[9..12].copy_from_slice(&count.to_be_bytes()[1..4]);
        Self(bytes)
    }

    pub fn from_bytes(bytes: [u8; 12]) -> Self {
        Self(bytes)
    }

    pub fn bytes(&self) -> [u8; 12] {
        self.0
    }

    /// Parses a 24-character hex string.
    pub fn parse_hex(s: &str) -> Option<Self> {
        if s.len() != 24 || !s.bytes().all(|b| b.is_ascii_hexdigit()) {
            return None;
        }
        let mut bytes = [0u8; 12];
        for (i, byte) in bytes.iter_mut().enumerate() {
            *byte = u8::from_str_radix(&s[i * 2..i * 2 + 2], 16).ok()?;
        }
        Some(Self(bytes))
    }

    pub fn to_hex(&self) -> String {
        self.0.iter().map(|b| format!("{:02x}", b)).collect()
    }
}

impl Default for ObjectId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

fn process_unique() -> &'static [u8; 5] {
    static PROCESS_UNIQUE: OnceLock<[u8; 5]> = OnceLock::new();
    PROCESS_UNIQUE.get_or_init(|| {
        let mut bytes = [0u8; 5];
        rand::thread_rng().fill(&mut bytes[..]);
        bytes
    })
}

fn next_counter() -> u32 {
    static COUNTER: OnceLock<AtomicU32> = OnceLock::new();
    COUNTER
        .get_or_init(|| AtomicU32::new(rand::thread_rng().gen_range(0..0x00ff_ffff)))
        .fetch_add(1, Ordering::Relaxed)
        & 0x00ff_ffff
}

/// A high-precision decimal kept in its textual form.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Decimal128(String);

impl Decimal128 {
    /// Parses a decimal literal: `[+-]digits[.digits][e[+-]digits]`,
    /// `NaN` or `[+-]Infinity`.
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        let unsigned = s.strip_prefix(['+', '-']).unwrap_or(s);
        if unsigned == "Infinity" {
            return Some(Self(s.trim_start_matches('+').to_string()));
        }
        if s == "NaN" {
            return Some(Self(s.to_string()));
        }

        let (mantissa, exponent) = match unsigned.find(['e', 'E']) {
            Some(pos) => (&unsigned[..pos], Some(&unsigned[pos + 1..])),
            None => (unsigned, None),
        };
        let (int_part, frac_part) = match mantissa.split_once('.') {
            Some((i, f)) => (i, Some(f)),
            None => (mantissa, None),
        };

        let digits = |part: &str| !part.is_empty() && part.bytes().all(|b| b.is_ascii_digit());
        if !digits(int_part) {
            return None;
        }
        if let Some(frac) = frac_part {
            if !digits(frac) {
                return None;
            }
        }
        if let Some(exp) = exponent {
            let exp = exp.strip_prefix(['+', '-']).unwrap_or(exp);
            if !digits(exp) {
                return None;
            }
        }

        Some(Self(s.trim_start_matches('+').to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for Decimal128 {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| format!("invalid decimal literal '{}'", s))
    }
}

impl fmt::Display for Decimal128 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Binary subtype tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinarySubtype {
    Generic,
    Function,
    Uuid,
    Md5,
    Encrypted,
    Column,
    Sensitive,
    /// 0x80..=0xff
    UserDefined(u8),
    /// Any other reserved tag
    Reserved(u8),
}

impl BinarySubtype {
    pub fn from_u8(tag: u8) -> Self {
        match tag {
            0x00 => BinarySubtype::Generic,
            0x01 => BinarySubtype::Function,
            0x04 => BinarySubtype::Uuid,
            0x05 => BinarySubtype::Md5,
            0x06 => BinarySubtype::Encrypted,
            0x07 => BinarySubtype::Column,
            0x08 => BinarySubtype::Sensitive,
            0x80..=0xff => BinarySubtype::UserDefined(tag),
            other => BinarySubtype::Reserved(other),
        }
    }

    pub fn as_u8(&self) -> u8 {
        match self {
            BinarySubtype::Generic => 0x00,
            BinarySubtype::Function => 0x01,
            BinarySubtype::Uuid => 0x04,
            BinarySubtype::Md5 => 0x05,
            BinarySubtype::Encrypted => 0x06,
            BinarySubtype::Column => 0x07,
            BinarySubtype::Sensitive => 0x08,
            BinarySubtype::UserDefined(tag) | BinarySubtype::Reserved(tag) => *tag,
        }
    }
}

impl fmt::Display for BinarySubtype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02x}", self.as_u8())
    }
}

/// A binary blob tagged with its subtype.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Binary {
    pub subtype: BinarySubtype,
    pub bytes: Vec<u8>,
}

impl Binary {
    pub fn new(subtype: BinarySubtype, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            subtype,
            bytes: bytes.into(),
        }
    }

    pub fn generic(bytes: impl Into<Vec<u8>>) -> Self {
        Self::new(BinarySubtype::Generic, bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_object_id_hex_roundtrip() {
        let id = ObjectId::new();
        let parsed = ObjectId::parse_hex(&id.to_hex()).unwrap();
        assert_eq!(id, parsed);
        assert_eq!(id.to_hex().len(), 24);
    }

    #[test]
    fn test_object_ids_are_unique() {
        let a = ObjectId::new();
        let b = ObjectId::new();
        assert_ne!(a, b);
    }

    #[test]
    fn test_object_id_rejects_bad_hex() {
        assert!(ObjectId::parse_hex("abc").is_none());
        assert!(ObjectId::parse_hex("zzzzzzzzzzzzzzzzzzzzzzzz").is_none());
    }

    #[test]
    fn test_decimal_grammar() {
        assert!(Decimal128::parse("12.50").is_some());
        assert!(Decimal128::parse("-0.001").is_some());
        assert!(Decimal128::parse("1e-10").is_some());
        assert!(Decimal128::parse("+3").map(|d| d.as_str() == "3").unwrap());
        assert!(Decimal128::parse("NaN").is_some());
        assert!(Decimal128::parse("-Infinity").is_some());
        assert!(Decimal128::parse("1.").is_none());
        assert!(Decimal128::parse("abc").is_none());
        assert!(Decimal128::parse("").is_none());
    }

    #[test]
    fn test_binary_subtype_tags() {
        assert_eq!(BinarySubtype::from_u8(4), BinarySubtype::Uuid);
        assert_eq!(BinarySubtype::from_u8(0x85), BinarySubtype::UserDefined(0x85));
        assert_eq!(BinarySubtype::Uuid.as_u8(), 4);
        assert_eq!(BinarySubtype::Md5.to_string(), "05");
    }
}
