//! The serializing traversal: erased values in, [`Value`] trees out.

use core::any::{Any, TypeId};

use treebind_value::{Value, ValueMap};

use crate::descriptor::Describe;
use crate::error::SerializeError;
use crate::info::{ResolvedType, TypeExpr};
use crate::registry::{BindRegistry, Definition, MapDef, RecordDef, SequenceDef};

/// Serializes `value` against the registry, starting from its own shape.
pub(crate) fn serialize_root<T: Describe>(
    registry: &BindRegistry,
    value: &T,
) -> Result<Value, SerializeError> {
    Serializer::new(registry).serialize(value, &T::shape())
}

// -----------------------------------------------------------------------------
// Serializer

/// One serialize call's traversal state.
///
/// The only state is the cycle guard: the identity of every aggregate on the
/// *active* path, pushed on entry and popped on return. Sharing the same
/// instance from two sibling positions is fine; reaching it again while it
/// is still being serialized is a cycle and aborts the call.
pub struct Serializer<'r> {
    registry: &'r BindRegistry,
    active: Vec<(usize, TypeId)>,
}

impl<'r> Serializer<'r> {
    pub fn new(registry: &'r BindRegistry) -> Self {
        Self {
            registry,
            active: Vec::new(),
        }
    }

    /// Serializes an erased value of the given resolved type.
    pub fn serialize(
        &mut self,
        value: &dyn Any,
        ty: &ResolvedType,
    ) -> Result<Value, SerializeError> {
        let registry = self.registry;
        match registry.definition(ty)? {
            Definition::Scalar(def) => {
                (def.encode)(value)
                    .map(Value::Primitive)
                    .map_err(|cause| SerializeError::Encode {
                        type_path: ty.path(),
                        cause,
                    })
            }
            Definition::Optional(def) => match (def.unwrap)(value) {
                None => Ok(Value::Null),
                Some(inner) => {
                    let inner_ty = def.inner.resolve(ty)?;
                    self.serialize(inner, &inner_ty)
                }
            },
            Definition::Delegate(def) => {
                let inner = (def.deref)(value).map_err(|cause| SerializeError::Deref {
                    type_path: ty.path(),
                    cause,
                })?;
                let inner_ty = def.inner.resolve(ty)?;
                self.serialize(inner.get(), &inner_ty)
            }
            Definition::Record(def) => self.guarded(value, ty, |this| {
                this.serialize_record(def, value, ty)
            }),
            Definition::Sequence(def) => self.guarded(value, ty, |this| {
                this.serialize_sequence(def, value, ty)
            }),
            Definition::Dictionary(def) => self.guarded(value, ty, |this| {
                this.serialize_map(def, value, ty)
            }),
        }
    }

    /// Runs `visit` with the value's identity on the active path.
    fn guarded(
        &mut self,
        value: &dyn Any,
        ty: &ResolvedType,
        visit: impl FnOnce(&mut Self) -> Result<Value, SerializeError>,
    ) -> Result<Value, SerializeError> {
        let key = (value as *const dyn Any as *const () as usize, ty.id());
        if self.active.contains(&key) {
            return Err(SerializeError::CircularReference {
                type_path: ty.path(),
            });
        }
        self.active.push(key);
        let result = visit(self);
        self.active.pop();
        result
    }

    fn serialize_record(
        &mut self,
        def: &RecordDef,
        value: &dyn Any,
        ty: &ResolvedType,
    ) -> Result<Value, SerializeError> {
        let mut members = ValueMap::default();
        for field in &def.fields {
            let field_ty = field.expr.resolve(ty)?;
            let field_value = (field.get)(value).map_err(|cause| SerializeError::Access {
                type_path: ty.path(),
                field: field.name,
                cause,
            })?;
            let tree = self.serialize(field_value.get(), &field_ty)?;
            members.insert(field.name.to_string(), tree);
        }
        Ok(Value::Object(members))
    }

    fn serialize_sequence(
        &mut self,
        def: &SequenceDef,
        value: &dyn Any,
        ty: &ResolvedType,
    ) -> Result<Value, SerializeError> {
        let elem_ty = self.resolve_element(&def.elem, ty, |visit| (def.iter)(value, visit))?;
        let mut items = Vec::new();
        let mut failure = None;
        (def.iter)(value, &mut |elem| match self.serialize(elem, &elem_ty) {
            Ok(tree) => {
                items.push(tree);
                true
            }
            Err(err) => {
                failure = Some(err);
                false
            }
        });
        match failure {
            Some(err) => Err(err),
            None => Ok(Value::Collection(items)),
        }
    }

    fn serialize_map(
        &mut self,
        def: &MapDef,
        value: &dyn Any,
        ty: &ResolvedType,
    ) -> Result<Value, SerializeError> {
        let value_ty = self.resolve_entry_value(&def.value, ty, |visit| (def.iter)(value, visit))?;
        let mut members = ValueMap::default();
        let mut failure = None;
        (def.iter)(value, &mut |key, entry| {
            match self.serialize(entry, &value_ty) {
                Ok(tree) => {
                    members.insert(key.to_string(), tree);
                    true
                }
                Err(err) => {
                    failure = Some(err);
                    false
                }
            }
        });
        match failure {
            Some(err) => Err(err),
            None => Ok(Value::Object(members)),
        }
    }

    /// Resolves a container's element type, falling back to the first live
    /// element's registered shape when the owner binds no arguments. This is
    /// what lets a dynamically typed container still serialize, best effort.
    fn resolve_element(
        &self,
        expr: &TypeExpr,
        owner: &ResolvedType,
        iterate: impl FnOnce(&mut dyn FnMut(&dyn Any) -> bool),
    ) -> Result<ResolvedType, SerializeError> {
        match expr.resolve(owner) {
            Ok(ty) => Ok(ty),
            Err(unresolved) => {
                let mut inferred = None;
                iterate(&mut |elem| {
                    inferred = self.registry.shape_of(elem.type_id()).cloned();
                    false
                });
                inferred.ok_or_else(|| unresolved.into())
            }
        }
    }

    fn resolve_entry_value(
        &self,
        expr: &TypeExpr,
        owner: &ResolvedType,
        iterate: impl FnOnce(&mut dyn FnMut(&str, &dyn Any) -> bool),
    ) -> Result<ResolvedType, SerializeError> {
        match expr.resolve(owner) {
            Ok(ty) => Ok(ty),
            Err(unresolved) => {
                let mut inferred = None;
                iterate(&mut |_, entry| {
                    inferred = self.registry.shape_of(entry.type_id()).cloned();
                    false
                });
                inferred.ok_or_else(|| unresolved.into())
            }
        }
    }
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use super::serialize_root;
    use crate::descriptor::{Describe, TypeDescriptor};
    use crate::error::{BuildError, ScalarFault, SerializeError};
    use crate::info::ResolvedType;
    use crate::registry::{BindRegistry, Param};
    use core::cell::RefCell;
    use core::convert::Infallible;
    use std::rc::Rc;
    use treebind_value::Value;

    struct User {
        name: String,
        age: i64,
    }

    impl Describe for User {
        fn shape() -> ResolvedType {
            ResolvedType::plain::<Self>()
        }

        fn descriptor() -> TypeDescriptor {
            TypeDescriptor::describe::<Self>(&[])
                .field("name", |u: &User| &u.name)
                .field("age", |u: &User| &u.age)
                .constructor(
                    "new",
                    vec![Param::of::<String>("name"), Param::of::<i64>("age")],
                    |(name, age): (String, i64)| Ok::<_, Infallible>(User { name, age }),
                )
                .finish()
        }

        fn register_dependencies(registry: &mut BindRegistry) -> Result<(), BuildError> {
            registry.register::<String>()?;
            registry.register::<i64>()
        }
    }

    struct Node {
        label: String,
        next: Option<Rc<RefCell<Node>>>,
    }

    impl Describe for Node {
        fn shape() -> ResolvedType {
            ResolvedType::plain::<Self>()
        }

        fn descriptor() -> TypeDescriptor {
            TypeDescriptor::describe::<Self>(&[])
                .field("label", |n: &Node| &n.label)
                .field("next", |n: &Node| &n.next)
                .constructor(
                    "new",
                    vec![
                        Param::of::<String>("label"),
                        Param::of::<Option<Rc<RefCell<Node>>>>("next"),
                    ],
                    |(label, next): (String, Option<Rc<RefCell<Node>>>)| {
                        Ok::<_, Infallible>(Node { label, next })
                    },
                )
                .finish()
        }

        fn register_dependencies(registry: &mut BindRegistry) -> Result<(), BuildError> {
            registry.register::<String>()?;
            registry.register::<Option<Rc<RefCell<Node>>>>()
        }
    }

    #[test]
    fn records_serialize_to_objects() {
        let mut registry = BindRegistry::new();
        registry.register::<User>().unwrap();

        let user = User {
            name: "ada".into(),
            age: 36,
        };
        let tree = serialize_root(&registry, &user).unwrap();
        assert_eq!(
            tree,
            Value::object([("name", Value::str("ada")), ("age", Value::int(36))])
        );
    }

    #[test]
    fn a_self_cycle_is_detected() {
        let mut registry = BindRegistry::new();
        registry.register::<Node>().unwrap();

        let node = Rc::new(RefCell::new(Node {
            label: "a".into(),
            next: None,
        }));
        node.borrow_mut().next = Some(Rc::clone(&node));

        let err = serialize_root(&registry, &node).unwrap_err();
        assert!(matches!(err, SerializeError::CircularReference { .. }));
    }

    #[test]
    fn sibling_sharing_is_not_a_cycle() {
        let mut registry = BindRegistry::new();
        registry.register::<Vec<Rc<RefCell<Node>>>>().unwrap();

        let shared = Rc::new(RefCell::new(Node {
            label: "shared".into(),
            next: None,
        }));
        let list = vec![Rc::clone(&shared), shared];

        let tree = serialize_root(&registry, &list).unwrap();
        assert_eq!(tree.as_collection().map(<[Value]>::len), Some(2));
    }

    #[test]
    fn accessor_failures_abort_with_context() {
        struct Flaky;

        impl Describe for Flaky {
            fn shape() -> ResolvedType {
                ResolvedType::plain::<Self>()
            }

            fn descriptor() -> TypeDescriptor {
                TypeDescriptor::describe::<Self>(&[])
                    .try_field("volatile", |_: &Flaky| {
                        Err::<i64, _>(ScalarFault::new("backing store gone"))
                    })
                    .constructor("new", vec![], |(): ()| Ok::<_, Infallible>(Flaky))
                    .finish()
            }

            fn register_dependencies(registry: &mut BindRegistry) -> Result<(), BuildError> {
                registry.register::<i64>()
            }
        }

        let mut registry = BindRegistry::new();
        registry.register::<Flaky>().unwrap();

        let err = serialize_root(&registry, &Flaky).unwrap_err();
        let SerializeError::Access { field, .. } = err else {
            panic!("expected an accessor failure, got {err}");
        };
        assert_eq!(field, "volatile");
    }

    #[test]
    fn unregistered_types_are_config_errors() {
        let registry = BindRegistry::new();
        let err = serialize_root(&registry, &42i64).unwrap_err();
        assert!(matches!(err, SerializeError::Config(_)));
    }
}
