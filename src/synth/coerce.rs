//! Primitive kinds and how they coerce: schema type tag, format, default
//! example, and string → typed literal conversion.
use indexmap::IndexMap;
use once_cell::sync::Lazy;
use ordered_float::OrderedFloat;

use crate::node::{Literal, TypeTag};

/// Placeholder example for timestamp fields without a usable literal.
pub const TIMESTAMP_PLACEHOLDER: &str = "datetime";
/// Placeholder example for free-form string fields.
pub const STRING_PLACEHOLDER: &str = "string";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Primitive {
    I8, I16, I32, I64, Isize,
    U8, U16, U32, U64, Usize,
    F32, F64,
    Bool,
    Char,
    String,
    /// Opaque timestamp: never expanded as an object, rendered as a string.
    Timestamp,
}

static BY_NAME: Lazy<IndexMap<&'static str, Primitive>> = Lazy::new(|| {
    use Primitive::*;
    IndexMap::from([
        ("i8", I8), ("i16", I16), ("i32", I32), ("i64", I64), ("isize", Isize),
        ("u8", U8), ("u16", U16), ("u32", U32), ("u64", U64), ("usize", Usize),
        ("f32", F32), ("f64", F64),
        ("bool", Bool),
        ("char", Char),
        ("String", String), ("str", String),
        ("DateTime", Timestamp), ("NaiveDateTime", Timestamp),
        ("OffsetDateTime", Timestamp), ("SystemTime", Timestamp),
        ("Timestamp", Timestamp),
    ])
});

impl Primitive {
    pub fn from_name(name: &str) -> Option<Self> {
        BY_NAME.get(name).copied()
    }

    pub fn tag(&self) -> TypeTag {
        use Primitive::*;
        match self {
            I8 | I16 | I32 | I64 | Isize | U8 | U16 | U32 | U64 | Usize => TypeTag::Integer,
            F32 | F64 => TypeTag::Number,
            Bool => TypeTag::Boolean,
            Char | String | Timestamp => TypeTag::String,
        }
    }

    pub fn format(&self) -> Option<&'static str> {
        use Primitive::*;
        match self {
            I8 | I16 | I32 | U8 | U16 | U32 => Some("int32"),
            I64 | Isize | U64 | Usize => Some("int64"),
            F32 => Some("float"),
            F64 => Some("double"),
            Timestamp => Some("date-time"),
            Bool | Char | String => None,
        }
    }

    pub fn default_example(&self) -> Literal {
        match self.tag() {
            TypeTag::Integer => Literal::Int(0),
            TypeTag::Number => Literal::Float(OrderedFloat(0.1)),
            TypeTag::Boolean => Literal::Bool(false),
            TypeTag::String if *self == Primitive::Timestamp => Literal::from(TIMESTAMP_PLACEHOLDER),
            TypeTag::String => Literal::from(STRING_PLACEHOLDER),
        }
    }

    /// `None` when `raw` is empty or not a valid value of this kind.
    pub fn convert(&self, raw: &str) -> Option<Literal> {
        use Primitive::*;
        let raw = raw.trim();
        if raw.is_empty() {
            return None;
        }
        match self {
            // parse at the kind's own width so out-of-range literals fall back
            I8 => raw.parse::<i8>().ok().map(|v| Literal::Int(v.into())),
            I16 => raw.parse::<i16>().ok().map(|v| Literal::Int(v.into())),
            I32 => raw.parse::<i32>().ok().map(|v| Literal::Int(v.into())),
            I64 => raw.parse::<i64>().ok().map(Literal::Int),
            Isize => raw.parse::<isize>().ok().and_then(|v| i64::try_from(v).ok()).map(Literal::Int),
            U8 => raw.parse::<u8>().ok().map(|v| Literal::UInt(v.into())),
            U16 => raw.parse::<u16>().ok().map(|v| Literal::UInt(v.into())),
            U32 => raw.parse::<u32>().ok().map(|v| Literal::UInt(v.into())),
            U64 => raw.parse::<u64>().ok().map(Literal::UInt),
            Usize => raw.parse::<usize>().ok().and_then(|v| u64::try_from(v).ok()).map(Literal::UInt),
            F32 => raw.parse::<f64>().ok()
                .filter(|f| f.is_finite() && f.abs() <= f64::from(f32::MAX))
                .map(|f| Literal::Float(OrderedFloat(f))),
            F64 => raw.parse::<f64>().ok()
                .filter(|f| f.is_finite())
                .map(|f| Literal::Float(OrderedFloat(f))),
            Bool => parse_bool(raw).map(Literal::Bool),
            Timestamp => chrono::DateTime::parse_from_rfc3339(raw).ok().map(|_| Literal::from(raw)),
            Char | String => Some(Literal::from(raw)),
        }
    }

    /// Literal example for a field; silently falls back to the default.
    pub fn example_or_default(&self, raw: Option<&str>) -> Literal {
        raw.and_then(|r| self.convert(r))
            .unwrap_or_else(|| self.default_example())
    }

    /// Typed enum literals; a candidate that does not convert stays a string.
    pub fn convert_enum(&self, candidates: &[String]) -> Vec<Literal> {
        candidates.iter()
            .map(|c| self.convert(c).unwrap_or_else(|| Literal::from(c.as_str())))
            .collect()
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw {
        "1" | "t" | "T" | "TRUE" | "true" | "True" => Some(true),
        "0" | "f" | "F" | "FALSE" | "false" | "False" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_map_to_tags_and_defaults() {
        assert_eq!(Primitive::I64.tag(), TypeTag::Integer);
        assert_eq!(Primitive::I64.default_example(), Literal::Int(0));
        assert_eq!(Primitive::F32.tag(), TypeTag::Number);
        assert_eq!(Primitive::F64.default_example(), Literal::Float(OrderedFloat(0.1)));
        assert_eq!(Primitive::Bool.default_example(), Literal::Bool(false));
        assert_eq!(Primitive::String.default_example(), Literal::from("string"));
        assert_eq!(Primitive::Timestamp.tag(), TypeTag::String);
        assert_eq!(Primitive::Timestamp.default_example(), Literal::from("datetime"));
    }

    #[test]
    fn malformed_examples_fall_back_silently() {
        assert_eq!(Primitive::I32.example_or_default(Some("abc")), Literal::Int(0));
        assert_eq!(Primitive::U8.example_or_default(Some("-3")), Literal::Int(0));
        assert_eq!(Primitive::F64.example_or_default(Some("NaN")), Literal::Float(OrderedFloat(0.1)));
        assert_eq!(Primitive::Bool.example_or_default(Some("maybe")), Literal::Bool(false));
        assert_eq!(Primitive::String.example_or_default(Some("")), Literal::from("string"));
        assert_eq!(Primitive::Timestamp.example_or_default(Some("yesterday")), Literal::from("datetime"));
        assert_eq!(Primitive::I64.example_or_default(None), Literal::Int(0));
    }

    #[test]
    fn valid_examples_convert() {
        assert_eq!(Primitive::I64.example_or_default(Some("7")), Literal::Int(7));
        assert_eq!(Primitive::U64.example_or_default(Some("18446744073709551615")), Literal::UInt(u64::MAX));
        assert_eq!(Primitive::Bool.example_or_default(Some("T")), Literal::Bool(true));
        assert_eq!(
            Primitive::Timestamp.example_or_default(Some("2024-05-01T10:00:00Z")),
            Literal::from("2024-05-01T10:00:00Z")
        );
    }

    #[test]
    fn examples_out_of_range_for_the_width_fall_back() {
        assert_eq!(Primitive::I8.example_or_default(Some("300")), Literal::Int(0));
        assert_eq!(Primitive::I8.example_or_default(Some("-128")), Literal::Int(-128));
        assert_eq!(Primitive::U8.example_or_default(Some("300")), Literal::Int(0));
        assert_eq!(Primitive::U8.example_or_default(Some("255")), Literal::UInt(255));
        assert_eq!(Primitive::I32.example_or_default(Some("5000000000")), Literal::Int(0));
        assert_eq!(Primitive::I64.example_or_default(Some("5000000000")), Literal::Int(5_000_000_000));
        assert_eq!(Primitive::U16.example_or_default(Some("70000")), Literal::Int(0));
        assert_eq!(Primitive::F32.example_or_default(Some("1e300")), Literal::Float(OrderedFloat(0.1)));
        assert_eq!(Primitive::F64.example_or_default(Some("1e300")), Literal::Float(OrderedFloat(1e300)));
    }

    #[test]
    fn enum_candidates_are_typed_per_kind() {
        let raw = vec!["1".to_string(), "2".to_string(), "3".to_string()];
        assert_eq!(Primitive::I32.convert_enum(&raw), vec![Literal::Int(1), Literal::Int(2), Literal::Int(3)]);
        assert_eq!(
            Primitive::String.convert_enum(&raw),
            vec![Literal::from("1"), Literal::from("2"), Literal::from("3")]
        );
        let mixed = vec!["1".to_string(), "x".to_string()];
        assert_eq!(Primitive::I32.convert_enum(&mixed), vec![Literal::Int(1), Literal::from("x")]);
    }

    #[test]
    fn names_resolve_through_the_table() {
        assert_eq!(Primitive::from_name("str"), Some(Primitive::String));
        assert_eq!(Primitive::from_name("String"), Some(Primitive::String));
        assert_eq!(Primitive::from_name("DateTime"), Some(Primitive::Timestamp));
        assert_eq!(Primitive::from_name("Address"), None);
    }
}
