//! Cell values and their canonical text form
//!
//! Every value that lands in a CSV cell passes through [`CellValue`], a closed
//! variant covering the JSON data model plus the Avro primitives that map onto
//! it. [`CellValue::format`] is total: it never fails and always produces the
//! same string for the same value.

use apache_avro::types::Value as AvroValue;
use serde::{Serialize, Serializer};
use serde_json::{Map, Number, Value};
use std::collections::BTreeMap;

/// A dynamically typed value destined for a single cell
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Null,
    Bool(bool),
    Integer(i64),
    /// Integers above `i64::MAX`
    Unsigned(u64),
    Float(f64),
    Text(String),
    Array(Vec<CellValue>),
    Object(BTreeMap<String, CellValue>),
}

impl CellValue {
    /// Canonical text for this value
    ///
    /// Integral floats lose their decimal point (`5.0` becomes `"5"`), other
    /// floats use the shortest round-trippable form, strings are returned
    /// unchanged and nested values are embedded as compact JSON.
    pub fn format(&self) -> String {
        match self {
            CellValue::Null => String::new(),
            CellValue::Bool(b) => b.to_string(),
            CellValue::Integer(i) => i.to_string(),
            CellValue::Unsigned(u) => u.to_string(),
            CellValue::Float(f) => format_float(*f),
            CellValue::Text(s) => s.clone(),
            CellValue::Array(_) | CellValue::Object(_) => {
                serde_json::to_string(self).unwrap_or_else(|_| format!("{:?}", self))
            }
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, CellValue::Null)
    }
}

fn format_float(f: f64) -> String {
    if !f.is_finite() {
        return f.to_string();
    }

    if f.fract() == 0.0 {
        // -2^63 is exact in f64, 2^63 is not representable as i64
        if f >= i64::MIN as f64 && f < i64::MAX as f64 {
            return (f as i64).to_string();
        }
        return format!("{:.0}", f);
    }

    f.to_string()
}

/// Format a JSON value as a cell
pub fn format_json(value: &Value) -> String {
    CellValue::from(value).format()
}

impl Serialize for CellValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            CellValue::Null => serializer.serialize_unit(),
            CellValue::Bool(b) => serializer.serialize_bool(*b),
            CellValue::Integer(i) => serializer.serialize_i64(*i),
            CellValue::Unsigned(u) => serializer.serialize_u64(*u),
            CellValue::Float(f) => serializer.serialize_f64(*f),
            CellValue::Text(s) => serializer.serialize_str(s),
            CellValue::Array(items) => serializer.collect_seq(items),
            CellValue::Object(fields) => serializer.collect_map(fields),
        }
    }
}

impl From<&Value> for CellValue {
    fn from(value: &Value) -> Self {
        match value {
            Value::Null => CellValue::Null,
            Value::Bool(b) => CellValue::Bool(*b),
            Value::Number(n) => from_number(n),
            Value::String(s) => CellValue::Text(s.clone()),
            Value::Array(items) => CellValue::Array(items.iter().map(CellValue::from).collect()),
            Value::Object(fields) => CellValue::Object(
                fields
                    .iter()
                    .map(|(k, v)| (k.clone(), CellValue::from(v)))
                    .collect(),
            ),
        }
    }
}

impl From<Value> for CellValue {
    fn from(value: Value) -> Self {
        CellValue::from(&value)
    }
}

fn from_number(n: &Number) -> CellValue {
    if let Some(i) = n.as_i64() {
        CellValue::Integer(i)
    } else if let Some(u) = n.as_u64() {
        CellValue::Unsigned(u)
    } else {
        CellValue::Float(n.as_f64().unwrap_or(f64::NAN))
    }
}

impl From<CellValue> for Value {
    fn from(cell: CellValue) -> Self {
        match cell {
            CellValue::Null => Value::Null,
            CellValue::Bool(b) => Value::Bool(b),
            CellValue::Integer(i) => Value::Number(i.into()),
            CellValue::Unsigned(u) => Value::Number(u.into()),
            CellValue::Float(f) => Number::from_f64(f).map_or(Value::Null, Value::Number),
            CellValue::Text(s) => Value::String(s),
            CellValue::Array(items) => Value::Array(items.into_iter().map(Value::from).collect()),
            CellValue::Object(fields) => Value::Object(
                fields
                    .into_iter()
                    .map(|(k, v)| (k, Value::from(v)))
                    .collect::<Map<String, Value>>(),
            ),
        }
    }
}

impl From<AvroValue> for CellValue {
    fn from(value: AvroValue) -> Self {
        match value {
            AvroValue::Null => CellValue::Null,
            AvroValue::Boolean(b) => CellValue::Bool(b),
            AvroValue::Int(i) => CellValue::Integer(i.into()),
            AvroValue::Long(i) => CellValue::Integer(i),
            AvroValue::Float(f) => CellValue::Float(f.into()),
            AvroValue::Double(f) => CellValue::Float(f),
            AvroValue::String(s) => CellValue::Text(s),
            AvroValue::Enum(_, symbol) => CellValue::Text(symbol),
            AvroValue::Bytes(bytes) | AvroValue::Fixed(_, bytes) => CellValue::Array(
                bytes
                    .into_iter()
                    .map(|b| CellValue::Integer(b.into()))
                    .collect(),
            ),
            AvroValue::Union(_, inner) => CellValue::from(*inner),
            AvroValue::Array(items) => {
                CellValue::Array(items.into_iter().map(CellValue::from).collect())
            }
            AvroValue::Map(fields) => CellValue::Object(
                fields
                    .into_iter()
                    .map(|(k, v)| (k, CellValue::from(v)))
                    .collect(),
            ),
            AvroValue::Record(fields) => CellValue::Object(
                fields
                    .into_iter()
                    .map(|(k, v)| (k, CellValue::from(v)))
                    .collect(),
            ),
            AvroValue::Date(days) => CellValue::Integer(days.into()),
            AvroValue::TimeMillis(ms) => CellValue::Integer(ms.into()),
            AvroValue::TimeMicros(us)
            | AvroValue::TimestampMillis(us)
            | AvroValue::TimestampMicros(us) => CellValue::Integer(us),
            AvroValue::Uuid(uuid) => CellValue::Text(uuid.to_string()),
            other => CellValue::Text(format!("{:?}", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_scalars() {
        assert_eq!(CellValue::Null.format(), "");
        assert_eq!(CellValue::Bool(true).format(), "true");
        assert_eq!(CellValue::Bool(false).format(), "false");
        assert_eq!(CellValue::Integer(-42).format(), "-42");
        assert_eq!(CellValue::Text("a,\"b\"".into()).format(), "a,\"b\"");
    }

    #[test]
    fn test_integral_float_drops_decimal_point() {
        assert_eq!(CellValue::Float(5.0).format(), "5");
        assert_eq!(CellValue::Float(-0.0).format(), "0");
        assert_eq!(CellValue::Float(1_700_000_000_000.0).format(), "1700000000000");
        assert_eq!(CellValue::Float(1e20).format(), "100000000000000000000");
    }

    #[test]
    fn test_fractional_float_is_shortest() {
        assert_eq!(CellValue::Float(5.5).format(), "5.5");
        assert_eq!(CellValue::Float(0.1).format(), "0.1");
        assert_eq!(CellValue::Float(f64::NAN).format(), "NaN");
    }

    #[test]
    fn test_formatting_is_idempotent() {
        for input in [json!(5.0), json!(5.5), json!(1234567), json!(-3.25)] {
            let first = format_json(&input);
            let reparsed: Value = serde_json::from_str(&first).unwrap();
            assert_eq!(format_json(&reparsed), first);
        }
    }

    #[test]
    fn test_nested_values_become_compact_json() {
        let value = json!({"b": [1, 2.5, null], "a": {"x": true}});
        assert_eq!(format_json(&value), r#"{"a":{"x":true},"b":[1,2.5,null]}"#);
        assert_eq!(format_json(&json!([])), "[]");
    }

    #[test]
    fn test_json_round_trip() {
        let value = json!({"id": 7, "tags": ["a"], "score": 0.5, "ok": false});
        let cell = CellValue::from(&value);
        assert_eq!(Value::from(cell), value);
    }

    #[test]
    fn test_large_unsigned_keeps_every_digit() {
        for text in ["12345678901234567891", "18446744073709551615", "9223372036854775808"] {
            let value: Value = serde_json::from_str(text).unwrap();
            let cell = CellValue::from(&value);
            assert!(matches!(cell, CellValue::Unsigned(_)));
            assert_eq!(cell.format(), text);
            assert_eq!(Value::from(cell), value);
        }

        let nested: Value = serde_json::from_str(r#"{"id": 12345678901234567891}"#).unwrap();
        assert_eq!(format_json(&nested), r#"{"id":12345678901234567891}"#);
    }

    #[test]
    fn test_avro_conversion() {
        let record = AvroValue::Record(vec![
            ("id".to_string(), AvroValue::Long(3)),
            (
                "name".to_string(),
                AvroValue::Union(1, Box::new(AvroValue::String("x".into()))),
            ),
            ("ratio".to_string(), AvroValue::Float(0.5)),
            ("kind".to_string(), AvroValue::Enum(0, "A".into())),
        ]);

        let cell = CellValue::from(record);
        assert_eq!(cell.format(), r#"{"id":3,"kind":"A","name":"x","ratio":0.5}"#);
    }
}
