use core::any::{Any, TypeId};

use treebind_value::Value;
use treebind_value::hash::{HashMap, TypeIdMap};

use crate::info::Type;

// -----------------------------------------------------------------------------
// Injector

/// Values supplied by the caller instead of the input document.
///
/// Three binding forms, checked in this order at every position:
///
/// 1. *path* bindings, matching one exact position;
/// 2. *type* bindings, matching every position of that exact type;
/// 3. *raw* bindings, which replace the input subtree at a position and then
///    deserialize normally.
///
/// Path and type bindings short-circuit: the input at that position, present
/// or not, is ignored. Bound values must be `Clone`, since one injector can
/// serve the same position many times across calls.
///
/// # Examples
///
/// ```
/// use treebind_bind::de::Injector;
///
/// let mut injector = Injector::new();
/// injector.bind_path("address.city", String::from("Reykjavik"));
/// injector.bind_type(42i64);
/// ```
#[derive(Default)]
pub struct Injector {
    by_path: HashMap<String, Provided>,
    by_type: TypeIdMap<Provided>,
    raw: HashMap<String, Value>,
}

/// One bound native value, reproducible on demand.
pub(crate) struct Provided {
    ty: Type,
    make: Box<dyn Fn() -> Box<dyn Any> + Send + Sync>,
}

impl Provided {
    fn new<T: Clone + Send + Sync + 'static>(value: T) -> Self {
        Self {
            ty: Type::of::<T>(),
            make: Box::new(move || Box::new(value.clone())),
        }
    }

    #[inline]
    pub(crate) fn ty(&self) -> Type {
        self.ty
    }

    pub(crate) fn produce(&self) -> Box<dyn Any> {
        (self.make)()
    }
}

impl Injector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds `value` to one exact position.
    pub fn bind_path<T: Clone + Send + Sync + 'static>(
        &mut self,
        path: impl Into<String>,
        value: T,
    ) -> &mut Self {
        self.by_path.insert(path.into(), Provided::new(value));
        self
    }

    /// Binds `value` to every position requiring exactly `T`.
    pub fn bind_type<T: Clone + Send + Sync + 'static>(&mut self, value: T) -> &mut Self {
        self.by_type.insert(TypeId::of::<T>(), Provided::new(value));
        self
    }

    /// Replaces the *input subtree* at a position; deserialization of the
    /// replacement then proceeds normally, validation included.
    pub fn bind_raw(&mut self, path: impl Into<String>, value: Value) -> &mut Self {
        self.raw.insert(path.into(), value);
        self
    }

    /// Whether nothing is bound.
    pub fn is_empty(&self) -> bool {
        self.by_path.is_empty() && self.by_type.is_empty() && self.raw.is_empty()
    }

    pub(crate) fn value_at(&self, position: &str) -> Option<&Provided> {
        self.by_path.get(position)
    }

    pub(crate) fn value_for(&self, id: TypeId) -> Option<&Provided> {
        self.by_type.get(&id)
    }

    pub(crate) fn raw_at(&self, position: &str) -> Option<&Value> {
        self.raw.get(position)
    }
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use super::Injector;
    use core::any::TypeId;
    use treebind_value::Value;

    #[test]
    fn bindings_are_looked_up_by_their_key()
    {
        let mut injector = Injector::new();
        injector.bind_path("a.b", 1i64);
        injector.bind_type(String::from("x"));
        injector.bind_raw("c", Value::int(2));

        assert!(injector.value_at("a.b").is_some());
        assert!(injector.value_at("a").is_none());
        assert!(injector.value_for(TypeId::of::<String>()).is_some());
        assert_eq!(injector.raw_at("c"), Some(&Value::int(2)));
    }

    #[test]
    fn provided_values_reproduce() {
        let mut injector = Injector::new();
        injector.bind_path("n", 7i64);
        let provided = injector.value_at("n").unwrap();
        let first = provided.produce();
        let second = provided.produce();
        assert_eq!(first.downcast_ref::<i64>(), Some(&7));
        assert_eq!(second.downcast_ref::<i64>(), Some(&7));
    }
}
