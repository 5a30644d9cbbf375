use alloc::string::{String, ToString};
use alloc::vec::Vec;
use core::fmt;

use crate::hash::HashMap;

// -----------------------------------------------------------------------------
// Number

/// A numeric scalar, either an integer or a floating point value.
///
/// Integers are kept exact; a wire format that only knows floats will still
/// round-trip any integer with at most 53 significant bits.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Number {
    Int(i64),
    Float(f64),
}

impl Number {
    /// Returns the value as `f64`, converting integers lossily if needed.
    #[inline]
    pub fn as_f64(&self) -> f64 {
        match *self {
            Self::Int(i) => i as f64,
            Self::Float(f) => f,
        }
    }

    /// Returns the value as `i64` if it is an integer, or a float without
    /// a fractional part.
    pub fn as_i64(&self) -> Option<i64> {
        // `i64::MAX as f64` rounds up to 2^63, which is out of range, so the
        // upper bound is exclusive. `i64::MIN as f64` is exactly -2^63.
        match *self {
            Self::Int(i) => Some(i),
            Self::Float(f) if f.fract() == 0.0 && f >= i64::MIN as f64 && f < i64::MAX as f64 => {
                Some(f as i64)
            }
            Self::Float(_) => None,
        }
    }
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(i) => write!(f, "{i}"),
            Self::Float(v) => write!(f, "{v}"),
        }
    }
}

// -----------------------------------------------------------------------------
// Scalar

/// A native scalar: string, number or boolean.
///
/// This is the full set of primitive payloads a [`Value`] can carry. Anything
/// else a domain type wants on the wire must be expressed through one of
/// these three.
#[derive(Clone, Debug, PartialEq)]
pub enum Scalar {
    Str(String),
    Num(Number),
    Bool(bool),
}

impl Scalar {
    /// Returns which of the three scalar kinds this is.
    #[inline]
    pub const fn kind(&self) -> ScalarKind {
        match self {
            Self::Str(_) => ScalarKind::Str,
            Self::Num(_) => ScalarKind::Num,
            Self::Bool(_) => ScalarKind::Bool,
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Str(s) => write!(f, "{s:?}"),
            Self::Num(n) => write!(f, "{n}"),
            Self::Bool(b) => write!(f, "{b}"),
        }
    }
}

/// The three scalar kinds a custom primitive can declare as its wire shape.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ScalarKind {
    Str,
    Num,
    Bool,
}

impl fmt::Display for ScalarKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Str => "string",
            Self::Num => "number",
            Self::Bool => "boolean",
        })
    }
}

// -----------------------------------------------------------------------------
// Value

/// The mapping for an object's members: name to [`Value`].
///
/// Member order is not significant.
pub type ValueMap = HashMap<String, Value>;

/// The format-agnostic intermediate value tree.
///
/// Every native value reachable from a serializable root is represented as
/// exactly one of these four variants before it is handed to a wire codec:
///
/// - [`Object`](Self::Object): named members, order-insensitive;
/// - [`Collection`](Self::Collection): an ordered sequence;
/// - [`Primitive`](Self::Primitive): one [`Scalar`];
/// - [`Null`](Self::Null): the absence of a value.
///
/// The model describes *shape* only; it has no knowledge of domain types.
///
/// # Examples
///
/// ```
/// use treebind_value::Value;
///
/// let tree = Value::object([
///     ("id", Value::int(7)),
///     ("tags", Value::collection([Value::str("a"), Value::str("b")])),
///     ("nick", Value::Null),
/// ]);
///
/// assert_eq!(tree.get("id"), Some(&Value::int(7)));
/// assert!(tree.get("missing").is_none());
/// ```
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Object(ValueMap),
    Collection(Vec<Value>),
    Primitive(Scalar),
    Null,
}

impl Value {
    /// Creates a string primitive.
    #[inline]
    pub fn str(value: impl Into<String>) -> Self {
        Self::Primitive(Scalar::Str(value.into()))
    }

    /// Creates an integer primitive.
    #[inline]
    pub fn int(value: i64) -> Self {
        Self::Primitive(Scalar::Num(Number::Int(value)))
    }

    /// Creates a floating point primitive.
    #[inline]
    pub fn float(value: f64) -> Self {
        Self::Primitive(Scalar::Num(Number::Float(value)))
    }

    /// Creates a boolean primitive.
    #[inline]
    pub fn bool(value: bool) -> Self {
        Self::Primitive(Scalar::Bool(value))
    }

    /// Creates an object from `(name, value)` pairs.
    pub fn object<N: Into<String>>(members: impl IntoIterator<Item = (N, Value)>) -> Self {
        Self::Object(
            members
                .into_iter()
                .map(|(name, value)| (name.into(), value))
                .collect(),
        )
    }

    /// Creates a collection from an ordered sequence of values.
    pub fn collection(items: impl IntoIterator<Item = Value>) -> Self {
        Self::Collection(items.into_iter().collect())
    }

    /// Returns the member with the given name, if this is an object.
    pub fn get(&self, name: &str) -> Option<&Value> {
        match self {
            Self::Object(map) => map.get(name),
            _ => None,
        }
    }

    /// Returns the object members, if this is an object.
    #[inline]
    pub fn as_object(&self) -> Option<&ValueMap> {
        match self {
            Self::Object(map) => Some(map),
            _ => None,
        }
    }

    /// Returns the ordered items, if this is a collection.
    #[inline]
    pub fn as_collection(&self) -> Option<&[Value]> {
        match self {
            Self::Collection(items) => Some(items),
            _ => None,
        }
    }

    /// Returns the scalar payload, if this is a primitive.
    #[inline]
    pub fn as_scalar(&self) -> Option<&Scalar> {
        match self {
            Self::Primitive(scalar) => Some(scalar),
            _ => None,
        }
    }

    /// Returns `true` for [`Value::Null`].
    #[inline]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Returns the coarse shape of this value, for diagnostics.
    #[inline]
    pub const fn shape(&self) -> ValueShape {
        match self {
            Self::Object(_) => ValueShape::Object,
            Self::Collection(_) => ValueShape::Collection,
            Self::Primitive(_) => ValueShape::Primitive,
            Self::Null => ValueShape::Null,
        }
    }
}

impl From<Scalar> for Value {
    #[inline]
    fn from(scalar: Scalar) -> Self {
        Self::Primitive(scalar)
    }
}

// -----------------------------------------------------------------------------
// ValueShape

/// The four coarse shapes of a [`Value`], used in structural error messages.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ValueShape {
    Object,
    Collection,
    Primitive,
    Null,
}

impl fmt::Display for ValueShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Object => "object",
            Self::Collection => "collection",
            Self::Primitive => "primitive",
            Self::Null => "null",
        })
    }
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use super::{Number, Scalar, Value, ValueShape};

    #[test]
    fn object_members_are_order_insensitive() {
        let a = Value::object([("x", Value::int(1)), ("y", Value::int(2))]);
        let b = Value::object([("y", Value::int(2)), ("x", Value::int(1))]);
        assert_eq!(a, b);
    }

    #[test]
    fn collection_order_is_significant() {
        let a = Value::collection([Value::int(1), Value::int(2)]);
        let b = Value::collection([Value::int(2), Value::int(1)]);
        assert_ne!(a, b);
    }

    #[test]
    fn scalar_kinds() {
        assert_eq!(
            Value::str("x").as_scalar().map(Scalar::kind),
            Some(super::ScalarKind::Str)
        );
        assert_eq!(Value::int(1).shape(), ValueShape::Primitive);
        assert_eq!(Value::Null.shape(), ValueShape::Null);
    }

    #[test]
    fn number_as_i64() {
        assert_eq!(Number::Int(42).as_i64(), Some(42));
        assert_eq!(Number::Float(42.0).as_i64(), Some(42));
        assert_eq!(Number::Float(42.5).as_i64(), None);
    }

    #[test]
    fn number_as_i64_range_boundaries() {
        // -2^63 is exactly representable; 2^63 (what i64::MAX rounds to as
        // f64) is out of range and must not saturate.
        assert_eq!(Number::Float(i64::MIN as f64).as_i64(), Some(i64::MIN));
        assert_eq!(Number::Float(i64::MAX as f64).as_i64(), None);
        assert_eq!(Number::Float(f64::INFINITY).as_i64(), None);
    }
}
