//! The [`Binder`]: registry, failure map and codecs behind one facade.

use treebind_value::Value;
use treebind_value::codec::{CodecError, CodecRegistry};

use crate::de::{self, FailureMap, Injector, Outcome};
use crate::descriptor::Describe;
use crate::error::{BuildError, FatalError, SerializeError};
use crate::registry::BindRegistry;
use crate::ser;

// -----------------------------------------------------------------------------
// BindError

/// Any error a [`Binder`] entry point can return.
#[derive(Debug, thiserror::Error)]
pub enum BindError {
    #[error(transparent)]
    Build(#[from] BuildError),

    #[error(transparent)]
    Serialize(#[from] SerializeError),

    #[error(transparent)]
    Fatal(#[from] FatalError),

    #[error(transparent)]
    Codec(#[from] CodecError),
}

// -----------------------------------------------------------------------------
// Binder

/// The top-level engine: one registry of type definitions, one failure map,
/// one set of wire codecs.
///
/// Configure it up front (register types, map failures, register codecs),
/// then share it: every mapping entry point takes `&self`.
///
/// # Examples
///
/// ```
/// use treebind_bind::Binder;
/// use treebind_bind::de::Injector;
/// use treebind_bind::descriptor::{Describe, TypeDescriptor};
/// use treebind_bind::info::ResolvedType;
/// use treebind_bind::registry::{BindRegistry, Param};
/// use treebind_bind::BuildError;
/// use treebind_value::Value;
///
/// #[derive(Debug, PartialEq)]
/// struct Point {
///     x: i64,
///     y: i64,
/// }
///
/// impl Describe for Point {
///     fn shape() -> ResolvedType {
///         ResolvedType::plain::<Self>()
///     }
///
///     fn descriptor() -> TypeDescriptor {
///         TypeDescriptor::describe::<Self>(&[])
///             .field("x", |p: &Point| &p.x)
///             .field("y", |p: &Point| &p.y)
///             .constructor(
///                 "new",
///                 vec![Param::of::<i64>("x"), Param::of::<i64>("y")],
///                 |(x, y): (i64, i64)| Ok::<_, std::convert::Infallible>(Point { x, y }),
///             )
///             .finish()
///     }
///
///     fn register_dependencies(registry: &mut BindRegistry) -> Result<(), BuildError> {
///         registry.register::<i64>()
///     }
/// }
///
/// let mut binder = Binder::new();
/// binder.register::<Point>().unwrap();
///
/// let tree = binder.to_value(&Point { x: 1, y: 2 }).unwrap();
/// assert_eq!(tree.get("x"), Some(&Value::int(1)));
///
/// let back: Point = binder
///     .from_value(&tree, &Injector::new())
///     .unwrap()
///     .into_result()
///     .unwrap();
/// assert_eq!(back, Point { x: 1, y: 2 });
/// ```
pub struct Binder {
    registry: BindRegistry,
    failures: FailureMap,
    codecs: CodecRegistry,
}

impl Binder {
    /// A binder with the default detectors, the default failure map, no
    /// codecs, and the primitive types pre-registered.
    pub fn new() -> Self {
        let mut registry = BindRegistry::new();
        register_primitives(&mut registry);
        Self {
            registry,
            failures: FailureMap::default(),
            codecs: CodecRegistry::new(),
        }
    }

    /// Registers `T` and its dependencies.
    pub fn register<T: Describe>(&mut self) -> Result<(), BuildError> {
        self.registry.register::<T>()
    }

    /// Registers every type submitted through
    /// [`register_type!`](crate::register_type).
    #[cfg(feature = "auto_register")]
    pub fn auto_register(&mut self) -> Result<(), BuildError> {
        for registration in inventory::iter::<BindRegistration> {
            (registration.register)(&mut self.registry)?;
        }
        Ok(())
    }

    #[inline]
    pub fn registry(&self) -> &BindRegistry {
        &self.registry
    }

    #[inline]
    pub fn registry_mut(&mut self) -> &mut BindRegistry {
        &mut self.registry
    }

    #[inline]
    pub fn failures_mut(&mut self) -> &mut FailureMap {
        &mut self.failures
    }

    #[inline]
    pub fn codecs(&self) -> &CodecRegistry {
        &self.codecs
    }

    #[inline]
    pub fn codecs_mut(&mut self) -> &mut CodecRegistry {
        &mut self.codecs
    }

    /// Serializes a native value into a [`Value`] tree.
    pub fn to_value<T: Describe>(&self, value: &T) -> Result<Value, SerializeError> {
        ser::serialize_root(&self.registry, value)
    }

    /// Deserializes a native value out of a [`Value`] tree.
    pub fn from_value<T: Describe>(
        &self,
        input: &Value,
        injector: &Injector,
    ) -> Result<Outcome<T>, FatalError> {
        de::deserialize_root(&self.registry, &self.failures, injector, input)
    }

    /// Serializes to wire text through the named codec.
    pub fn marshal<T: Describe>(&self, format: &str, value: &T) -> Result<String, BindError> {
        let tree = self.to_value(value)?;
        Ok(self.codecs.get(format)?.marshal(&tree)?)
    }

    /// Deserializes from wire text through the named codec.
    pub fn unmarshal<T: Describe>(
        &self,
        format: &str,
        text: &str,
        injector: &Injector,
    ) -> Result<Outcome<T>, BindError> {
        let tree = self.codecs.get(format)?.unmarshal(text)?;
        Ok(self.from_value(&tree, injector)?)
    }
}

impl Default for Binder {
    fn default() -> Self {
        Self::new()
    }
}

fn register_primitives(registry: &mut BindRegistry) {
    fn must<T: Describe>(registry: &mut BindRegistry) {
        if let Err(err) = registry.register::<T>() {
            // Primitive descriptors are static and always detectable.
            unreachable!("builtin registration failed: {err}");
        }
    }
    must::<bool>(registry);
    must::<i8>(registry);
    must::<i16>(registry);
    must::<i32>(registry);
    must::<i64>(registry);
    must::<isize>(registry);
    must::<u8>(registry);
    must::<u16>(registry);
    must::<u32>(registry);
    must::<u64>(registry);
    must::<usize>(registry);
    must::<f32>(registry);
    must::<f64>(registry);
    must::<char>(registry);
    must::<String>(registry);
}

// -----------------------------------------------------------------------------
// Auto registration

/// One type submitted for [`Binder::auto_register`].
#[cfg(feature = "auto_register")]
pub struct BindRegistration {
    register: fn(&mut BindRegistry) -> Result<(), BuildError>,
}

#[cfg(feature = "auto_register")]
impl BindRegistration {
    pub const fn of<T: Describe>() -> Self {
        Self {
            register: register_one::<T>,
        }
    }
}

#[cfg(feature = "auto_register")]
fn register_one<T: Describe>(registry: &mut BindRegistry) -> Result<(), BuildError> {
    registry.register::<T>()
}

#[cfg(feature = "auto_register")]
inventory::collect!(BindRegistration);

/// Submits a [`Describe`] type for [`Binder::auto_register`].
#[cfg(feature = "auto_register")]
#[macro_export]
macro_rules! register_type {
    ($ty:ty) => {
        $crate::inventory::submit! {
            $crate::binder::BindRegistration::of::<$ty>()
        }
    };
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use super::{BindError, Binder};
    use crate::de::Injector;
    use crate::descriptor::{Describe, TypeDescriptor};
    use crate::error::BuildError;
    use crate::info::{ResolvedType, TypeExpr};
    use crate::registry::{BindRegistry, Param};
    use core::any::Any;
    use core::convert::Infallible;
    use std::collections::{BTreeMap, VecDeque};
    use std::sync::Arc;
    use treebind_value::codec::{Codec, CodecError};
    use treebind_value::Value;

    struct Json;

    impl Codec for Json {
        fn marshal(&self, tree: &Value) -> Result<String, CodecError> {
            serde_json::to_string(tree).map_err(CodecError::failed)
        }
        fn unmarshal(&self, text: &str) -> Result<Value, CodecError> {
            serde_json::from_str(text).map_err(CodecError::failed)
        }
    }

    #[derive(Debug, Clone, PartialEq)]
    struct Pair<A, B> {
        first: A,
        second: B,
    }

    impl<A: Describe, B: Describe> Describe for Pair<A, B> {
        fn shape() -> ResolvedType {
            ResolvedType::class::<Self>(&["A", "B"], vec![A::shape(), B::shape()])
        }

        fn descriptor() -> TypeDescriptor {
            TypeDescriptor::describe::<Self>(&["A", "B"])
                .field_as("first", TypeExpr::Var("A"), |p: &Pair<A, B>| {
                    &p.first as &dyn Any
                })
                .field_as("second", TypeExpr::Var("B"), |p: &Pair<A, B>| {
                    &p.second as &dyn Any
                })
                .constructor(
                    "new",
                    vec![Param::var("first", "A"), Param::var("second", "B")],
                    |(first, second): (A, B)| Ok::<_, Infallible>(Pair { first, second }),
                )
                .finish()
        }

        fn register_dependencies(registry: &mut BindRegistry) -> Result<(), BuildError> {
            registry.register::<A>()?;
            registry.register::<B>()
        }
    }

    #[test]
    fn generic_records_round_trip() {
        let mut binder = Binder::new();
        binder.register::<Pair<String, i64>>().unwrap();

        let pair = Pair {
            first: String::from("a"),
            second: 2i64,
        };
        let tree = binder.to_value(&pair).unwrap();
        let back: Pair<String, i64> = binder
            .from_value(&tree, &Injector::new())
            .unwrap()
            .into_result()
            .unwrap();
        assert_eq!(back, pair);
    }

    #[test]
    fn nested_generics_round_trip() {
        let mut binder = Binder::new();
        binder.register::<Vec<Pair<String, i64>>>().unwrap();

        let pairs = vec![
            Pair {
                first: String::from("x"),
                second: 1i64,
            },
            Pair {
                first: String::from("y"),
                second: 2i64,
            },
        ];
        let tree = binder.to_value(&pairs).unwrap();
        let back: Vec<Pair<String, i64>> = binder
            .from_value(&tree, &Injector::new())
            .unwrap()
            .into_result()
            .unwrap();
        assert_eq!(back, pairs);
    }

    #[test]
    fn string_keyed_maps_round_trip() {
        let mut binder = Binder::new();
        binder.register::<BTreeMap<String, i64>>().unwrap();

        let mut scores = BTreeMap::new();
        scores.insert(String::from("alice"), 10i64);
        scores.insert(String::from("bob"), 3i64);

        let tree = binder.to_value(&scores).unwrap();
        assert_eq!(
            tree,
            Value::object([("alice", Value::int(10)), ("bob", Value::int(3))])
        );

        let back: BTreeMap<String, i64> = binder
            .from_value(&tree, &Injector::new())
            .unwrap()
            .into_result()
            .unwrap();
        assert_eq!(back, scores);
    }

    #[test]
    fn deques_round_trip_in_order() {
        let mut binder = Binder::new();
        binder.register::<VecDeque<i64>>().unwrap();

        let deque: VecDeque<i64> = [3i64, 1, 2].into_iter().collect();
        let tree = binder.to_value(&deque).unwrap();
        assert_eq!(
            tree,
            Value::collection([Value::int(3), Value::int(1), Value::int(2)])
        );

        let back: VecDeque<i64> = binder
            .from_value(&tree, &Injector::new())
            .unwrap()
            .into_result()
            .unwrap();
        assert_eq!(back, deque);
    }

    #[test]
    fn delegating_wrappers_are_transparent_on_the_wire() {
        let mut binder = Binder::new();
        binder.register::<Box<i64>>().unwrap();
        binder.register::<Arc<String>>().unwrap();

        let tree = binder.to_value(&Box::new(7i64)).unwrap();
        assert_eq!(tree, Value::int(7));
        let back: Box<i64> = binder
            .from_value(&tree, &Injector::new())
            .unwrap()
            .into_result()
            .unwrap();
        assert_eq!(*back, 7);

        let tree = binder.to_value(&Arc::new(String::from("shared"))).unwrap();
        assert_eq!(tree, Value::str("shared"));
        let back: Arc<String> = binder
            .from_value(&tree, &Injector::new())
            .unwrap()
            .into_result()
            .unwrap();
        assert_eq!(back.as_str(), "shared");
    }

    #[test]
    fn marshal_goes_through_the_named_codec() {
        let mut binder = Binder::new();
        binder.register::<Pair<String, i64>>().unwrap();
        binder.codecs_mut().register("json", Json);

        let pair = Pair {
            first: String::from("a"),
            second: 2i64,
        };
        let text = binder.marshal("json", &pair).unwrap();
        let back: Pair<String, i64> = binder
            .unmarshal("json", &text, &Injector::new())
            .unwrap()
            .into_result()
            .unwrap();
        assert_eq!(back, pair);

        assert!(matches!(
            binder.marshal("yaml", &pair),
            Err(BindError::Codec(_))
        ));
    }

    #[test]
    fn primitives_are_preregistered() {
        let binder = Binder::new();
        assert!(binder.to_value(&42i64).is_ok());
        assert!(binder.to_value(&String::from("x")).is_ok());
        assert!(binder.to_value(&true).is_ok());
    }
}
