use core::any::Any;
use core::error::Error;

use treebind_value::{Scalar, ScalarKind};

use crate::descriptor::{Args, FieldValue, Getter, owner_ref};
use crate::error::Cause;
use crate::info::TypeExpr;

// -----------------------------------------------------------------------------
// Definition

/// The detected mapping strategy for one registered type.
///
/// Detection runs once per type; afterwards the traversal only ever executes
/// one of these six forms. All of them are `Send + Sync`, so a finished
/// registry can serve concurrent calls without locking.
pub enum Definition {
    /// Maps to a single scalar through a converter pair.
    Scalar(ScalarDef),
    /// Maps to an object through fields and a factory.
    Record(RecordDef),
    /// Maps to an ordered collection.
    Sequence(SequenceDef),
    /// Maps to an object with dynamic string keys.
    Dictionary(MapDef),
    /// Maps to its inner type, with `Null` for the absent case.
    Optional(OptionalDef),
    /// Transparently forwards to a wrapped inner type.
    Delegate(DelegateDef),
}

impl core::fmt::Debug for Definition {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_tuple("Definition").field(&self.kind_name()).finish()
    }
}

impl Definition {
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Scalar(_) => "scalar",
            Self::Record(_) => "record",
            Self::Sequence(_) => "sequence",
            Self::Dictionary(_) => "dictionary",
            Self::Optional(_) => "optional",
            Self::Delegate(_) => "delegate",
        }
    }
}

// -----------------------------------------------------------------------------
// ScalarDef

pub type EncodeFn = Box<dyn Fn(&dyn Any) -> Result<Scalar, Cause> + Send + Sync>;
pub type DecodeFn = Box<dyn Fn(Scalar) -> Result<Box<dyn Any>, Cause> + Send + Sync>;

/// A converter pair mapping a type to one scalar kind and back.
pub struct ScalarDef {
    pub(crate) kind: ScalarKind,
    pub(crate) encode: EncodeFn,
    pub(crate) decode: DecodeFn,
}

impl ScalarDef {
    /// A converter with an infallible encoder, the common case.
    pub fn new<T, E>(
        kind: ScalarKind,
        encode: impl Fn(&T) -> Scalar + Send + Sync + 'static,
        decode: impl Fn(Scalar) -> Result<T, E> + Send + Sync + 'static,
    ) -> Self
    where
        T: 'static,
        E: Error + Send + Sync + 'static,
    {
        Self::fallible::<T, core::convert::Infallible, E>(
            kind,
            move |value| Ok(encode(value)),
            decode,
        )
    }

    /// A converter whose encoder can fail.
    pub fn fallible<T, E1, E2>(
        kind: ScalarKind,
        encode: impl Fn(&T) -> Result<Scalar, E1> + Send + Sync + 'static,
        decode: impl Fn(Scalar) -> Result<T, E2> + Send + Sync + 'static,
    ) -> Self
    where
        T: 'static,
        E1: Error + Send + Sync + 'static,
        E2: Error + Send + Sync + 'static,
    {
        Self {
            kind,
            encode: Box::new(move |value| encode(owner_ref::<T>(value)?).map_err(Cause::new)),
            decode: Box::new(move |scalar| {
                decode(scalar)
                    .map(|value| Box::new(value) as Box<dyn Any>)
                    .map_err(Cause::new)
            }),
        }
    }

    /// The scalar kind this converter reads and writes.
    #[inline]
    pub fn kind(&self) -> ScalarKind {
        self.kind
    }
}

// -----------------------------------------------------------------------------
// RecordDef

/// One serializable field of a record: a name, a member type, an accessor.
pub struct BoundField {
    pub(crate) name: &'static str,
    pub(crate) expr: TypeExpr,
    pub(crate) get: Getter,
}

impl BoundField {
    #[inline]
    pub fn name(&self) -> &'static str {
        self.name
    }
}

/// One parameter of a factory: the member name it is fed from, and its type.
pub struct Param {
    pub(crate) name: &'static str,
    pub(crate) expr: TypeExpr,
}

impl Param {
    /// A parameter of the concrete type `T`.
    pub fn of<T: crate::descriptor::Describe>(name: &'static str) -> Self {
        Self {
            name,
            expr: TypeExpr::of::<T>(),
        }
    }

    /// A parameter whose type is one of the owner's generic parameters.
    pub fn var(name: &'static str, var: &'static str) -> Self {
        Self {
            name,
            expr: TypeExpr::Var(var),
        }
    }
}

pub type InvokeFn = Box<dyn Fn(Args) -> Result<Box<dyn Any>, Cause> + Send + Sync>;

/// The single creation path of a record.
pub struct Factory {
    pub(crate) name: &'static str,
    pub(crate) params: Vec<Param>,
    pub(crate) invoke: InvokeFn,
}

/// A record: named fields on the way out, one factory on the way in.
///
/// The two sides are independent; a field with no matching parameter is
/// write-only and a parameter with no matching field is read-only.
pub struct RecordDef {
    pub(crate) fields: Vec<BoundField>,
    pub(crate) factory: Factory,
}

impl RecordDef {
    pub fn new(fields: Vec<BoundField>, factory: Factory) -> Self {
        Self { fields, factory }
    }
}

// -----------------------------------------------------------------------------
// SequenceDef

pub type IterFn = Box<dyn Fn(&dyn Any, &mut dyn FnMut(&dyn Any) -> bool) + Send + Sync>;

/// Accumulates decoded elements and produces the finished container.
pub trait SequenceBuilder {
    fn push(&mut self, elem: Box<dyn Any>) -> Result<(), Cause>;
    fn finish(self: Box<Self>) -> Result<Box<dyn Any>, Cause>;
}

/// An ordered container: one element type, iteration out, a builder in.
pub struct SequenceDef {
    pub(crate) elem: TypeExpr,
    pub(crate) iter: IterFn,
    pub(crate) make_builder: Box<dyn Fn(usize) -> Box<dyn SequenceBuilder> + Send + Sync>,
}

impl SequenceDef {
    /// Builds a sequence definition over a concrete container type `C`.
    ///
    /// `iter` walks the container's elements in order, stopping early when
    /// the callback returns `false`; `make_builder` receives the incoming
    /// element count as a capacity hint.
    pub fn new<C: 'static>(
        elem: TypeExpr,
        iter: impl Fn(&C, &mut dyn FnMut(&dyn Any) -> bool) + Send + Sync + 'static,
        make_builder: impl Fn(usize) -> Box<dyn SequenceBuilder> + Send + Sync + 'static,
    ) -> Self {
        Self {
            elem,
            iter: Box::new(move |container, visit| {
                // The caller guarantees the container type; a mismatch would
                // already have failed definition lookup.
                if let Some(container) = container.downcast_ref::<C>() {
                    iter(container, visit);
                }
            }),
            make_builder: Box::new(make_builder),
        }
    }
}

// -----------------------------------------------------------------------------
// MapDef

pub type EntryIterFn =
    Box<dyn Fn(&dyn Any, &mut dyn FnMut(&str, &dyn Any) -> bool) + Send + Sync>;

/// Accumulates decoded entries and produces the finished map.
pub trait MapBuilder {
    fn insert(&mut self, key: String, value: Box<dyn Any>) -> Result<(), Cause>;
    fn finish(self: Box<Self>) -> Result<Box<dyn Any>, Cause>;
}

/// A string-keyed map: one value type, entry iteration out, a builder in.
pub struct MapDef {
    pub(crate) value: TypeExpr,
    pub(crate) iter: EntryIterFn,
    pub(crate) make_builder: Box<dyn Fn() -> Box<dyn MapBuilder> + Send + Sync>,
}

impl MapDef {
    pub fn new<C: 'static>(
        value: TypeExpr,
        iter: impl Fn(&C, &mut dyn FnMut(&str, &dyn Any) -> bool) + Send + Sync + 'static,
        make_builder: impl Fn() -> Box<dyn MapBuilder> + Send + Sync + 'static,
    ) -> Self {
        Self {
            value,
            iter: Box::new(move |container, visit| {
                if let Some(container) = container.downcast_ref::<C>() {
                    iter(container, visit);
                }
            }),
            make_builder: Box::new(make_builder),
        }
    }
}

// -----------------------------------------------------------------------------
// OptionalDef

/// A type with an explicit absent case, mapped to `Null`.
pub struct OptionalDef {
    pub(crate) inner: TypeExpr,
    pub(crate) none: Box<dyn Fn() -> Box<dyn Any> + Send + Sync>,
    pub(crate) some: Box<dyn Fn(Box<dyn Any>) -> Result<Box<dyn Any>, Cause> + Send + Sync>,
    pub(crate) unwrap: Box<dyn for<'a> Fn(&'a dyn Any) -> Option<&'a dyn Any> + Send + Sync>,
}

impl OptionalDef {
    pub fn new<C: 'static, T: 'static>(
        inner: TypeExpr,
        none: impl Fn() -> C + Send + Sync + 'static,
        some: impl Fn(T) -> C + Send + Sync + 'static,
        unwrap: impl for<'a> Fn(&'a C) -> Option<&'a T> + Send + Sync + 'static,
    ) -> Self {
        Self {
            inner,
            none: Box::new(move || Box::new(none())),
            some: Box::new(move |value| {
                let value = value.downcast::<T>().map_err(|_| {
                    Cause::internal(format!(
                        "optional payload is not a `{}`",
                        core::any::type_name::<T>()
                    ))
                })?;
                Ok(Box::new(some(*value)))
            }),
            unwrap: Box::new(move |container| {
                container
                    .downcast_ref::<C>()
                    .and_then(|container| unwrap(container).map(|inner| inner as &dyn Any))
            }),
        }
    }
}

// -----------------------------------------------------------------------------
// DelegateDef

/// A transparent wrapper: the wire shape is entirely the inner type's.
pub struct DelegateDef {
    pub(crate) inner: TypeExpr,
    pub(crate) deref: Box<dyn for<'a> Fn(&'a dyn Any) -> Result<FieldValue<'a>, Cause> + Send + Sync>,
    pub(crate) wrap: Box<dyn Fn(Box<dyn Any>) -> Result<Box<dyn Any>, Cause> + Send + Sync>,
}

impl DelegateDef {
    pub fn new<C: 'static, T: 'static>(
        inner: TypeExpr,
        deref: impl for<'a> Fn(&'a C) -> Result<FieldValue<'a>, Cause> + Send + Sync + 'static,
        wrap: impl Fn(T) -> C + Send + Sync + 'static,
    ) -> Self {
        Self {
            inner,
            deref: Box::new(move |container| deref(owner_ref::<C>(container)?)),
            wrap: Box::new(move |value| {
                let value = value.downcast::<T>().map_err(|_| {
                    Cause::internal(format!(
                        "delegate payload is not a `{}`",
                        core::any::type_name::<T>()
                    ))
                })?;
                Ok(Box::new(wrap(*value)))
            }),
        }
    }
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use super::ScalarDef;
    use crate::error::ScalarFault;
    use treebind_value::{Scalar, ScalarKind};

    #[test]
    fn scalar_converter_round_trips() {
        let def = ScalarDef::new::<i64, ScalarFault>(
            ScalarKind::Num,
            |n| Scalar::Num(treebind_value::Number::Int(*n)),
            |scalar| match scalar {
                Scalar::Num(treebind_value::Number::Int(n)) => Ok(n),
                other => Err(ScalarFault::new(format!("expected integer, got {other}"))),
            },
        );

        let encoded = (def.encode)(&41i64).unwrap();
        let decoded = (def.decode)(encoded).unwrap();
        assert_eq!(decoded.downcast_ref::<i64>(), Some(&41));
    }

    #[test]
    fn encode_rejects_a_foreign_owner() {
        let def = ScalarDef::new::<i64, ScalarFault>(
            ScalarKind::Num,
            |n| Scalar::Num(treebind_value::Number::Int(*n)),
            |_| Ok(0),
        );
        assert!((def.encode)(&String::from("nope")).is_err());
    }
}
