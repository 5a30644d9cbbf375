//! The host-native tree boundary.
//!
//! A [`Value`] serializes to, and deserializes from, the plain nested
//! maps/lists/scalars/null every self-describing serde format speaks. This is
//! the total, lossless conversion between the four-variant model and the
//! generic host tree: wire codecs never see domain types, only this shape.

use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;

use serde_core::de::{self, Deserialize, Deserializer, MapAccess, SeqAccess, Visitor};
use serde_core::ser::{Serialize, Serializer};

use crate::value::{Number, Scalar, Value, ValueMap};

// -----------------------------------------------------------------------------
// Serialize

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Null => serializer.serialize_unit(),
            Value::Primitive(Scalar::Str(s)) => serializer.serialize_str(s),
            Value::Primitive(Scalar::Bool(b)) => serializer.serialize_bool(*b),
            Value::Primitive(Scalar::Num(Number::Int(i))) => serializer.serialize_i64(*i),
            Value::Primitive(Scalar::Num(Number::Float(f))) => serializer.serialize_f64(*f),
            Value::Collection(items) => serializer.collect_seq(items),
            Value::Object(members) => serializer.collect_map(members),
        }
    }
}

// -----------------------------------------------------------------------------
// Deserialize

struct ValueVisitor;

impl<'de> Visitor<'de> for ValueVisitor {
    type Value = Value;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a scalar, sequence, map or null")
    }

    #[inline]
    fn visit_bool<E: de::Error>(self, v: bool) -> Result<Value, E> {
        Ok(Value::bool(v))
    }

    #[inline]
    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Value, E> {
        Ok(Value::int(v))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Value, E> {
        // Out-of-range unsigned values degrade to floats rather than failing;
        // the scalar model has no unsigned kind.
        match i64::try_from(v) {
            Ok(i) => Ok(Value::int(i)),
            Err(_) => Ok(Value::float(v as f64)),
        }
    }

    #[inline]
    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Value, E> {
        Ok(Value::float(v))
    }

    #[inline]
    fn visit_str<E: de::Error>(self, v: &str) -> Result<Value, E> {
        Ok(Value::str(v))
    }

    #[inline]
    fn visit_string<E: de::Error>(self, v: String) -> Result<Value, E> {
        Ok(Value::Primitive(Scalar::Str(v)))
    }

    #[inline]
    fn visit_unit<E: de::Error>(self) -> Result<Value, E> {
        Ok(Value::Null)
    }

    #[inline]
    fn visit_none<E: de::Error>(self) -> Result<Value, E> {
        Ok(Value::Null)
    }

    fn visit_some<D: Deserializer<'de>>(self, deserializer: D) -> Result<Value, D::Error> {
        Value::deserialize(deserializer)
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Value, A::Error> {
        let mut items = Vec::with_capacity(seq.size_hint().unwrap_or(0));
        while let Some(item) = seq.next_element()? {
            items.push(item);
        }
        Ok(Value::Collection(items))
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Value, A::Error> {
        let mut members = ValueMap::default();
        while let Some((name, value)) = map.next_entry::<String, Value>()? {
            members.insert(name, value);
        }
        Ok(Value::Object(members))
    }
}

impl<'de> Deserialize<'de> for Value {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Value, D::Error> {
        deserializer.deserialize_any(ValueVisitor)
    }
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use crate::value::Value;

    fn sample() -> Value {
        Value::object([
            ("name", Value::str("octo")),
            ("lives", Value::int(9)),
            ("weight", Value::float(4.5)),
            ("tame", Value::bool(true)),
            ("nick", Value::Null),
            (
                "litters",
                Value::collection([Value::int(3), Value::int(4)]),
            ),
        ])
    }

    #[test]
    fn json_round_trip_is_identity() {
        let tree = sample();
        let text = serde_json::to_string(&tree).unwrap();
        let back: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(tree, back);
    }

    #[test]
    fn ron_round_trip_is_identity() {
        let tree = sample();
        let text = ron::to_string(&tree).unwrap();
        let back: Value = ron::from_str(&text).unwrap();
        assert_eq!(tree, back);
    }

    #[test]
    fn null_maps_to_json_null() {
        assert_eq!(serde_json::to_string(&Value::Null).unwrap(), "null");
        assert_eq!(serde_json::from_str::<Value>("null").unwrap(), Value::Null);
    }

    #[test]
    fn large_unsigned_degrades_to_float() {
        let text = u64::MAX.to_string();
        let back: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(back, Value::float(u64::MAX as f64));
    }

    #[test]
    fn unsupported_host_shape_is_an_error() {
        // A JSON document fragment is the closest thing to an unsupported
        // shape serde_json can hand us; raw bytes are rejected by the visitor.
        use serde_core::de::value::{BytesDeserializer, Error};
        let result = <Value as serde_core::de::Deserialize>::deserialize(
            BytesDeserializer::<Error>::new(b"\x00\x01"),
        );
        assert!(result.is_err());
    }
}
