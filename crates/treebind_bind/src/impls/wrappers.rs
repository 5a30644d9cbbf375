//! Built-in optional and delegating wrapper mappings.
//!
//! `Option<T>` is the optional form; `Box`, `Rc`, `Arc` and `RefCell` are
//! transparent delegates whose wire shape is entirely the inner type's.
//! Shared graph shapes compose: `Rc<RefCell<T>>` needs no impl of its own.

use core::any::Any;
use core::cell::{Ref, RefCell};
use std::rc::Rc;
use std::sync::Arc;

use crate::descriptor::{Describe, FieldValue, TypeDescriptor};
use crate::error::{BuildError, Cause};
use crate::info::{ResolvedType, TypeExpr};
use crate::registry::{BindRegistry, DelegateDef, OptionalDef};

// -----------------------------------------------------------------------------
// Option

impl<T: Describe> Describe for Option<T> {
    fn shape() -> ResolvedType {
        ResolvedType::class::<Self>(&["T"], vec![T::shape()])
    }

    fn descriptor() -> TypeDescriptor {
        TypeDescriptor::describe::<Self>(&["T"])
            .optional(OptionalDef::new::<Self, T>(
                TypeExpr::of::<T>(),
                || None,
                Some,
                Option::as_ref,
            ))
            .finish()
    }

    fn register_dependencies(registry: &mut BindRegistry) -> Result<(), BuildError> {
        registry.register::<T>()
    }
}

// -----------------------------------------------------------------------------
// Delegating wrappers

impl<T: Describe> Describe for Box<T> {
    fn shape() -> ResolvedType {
        ResolvedType::class::<Self>(&["T"], vec![T::shape()])
    }

    fn descriptor() -> TypeDescriptor {
        TypeDescriptor::describe::<Self>(&["T"])
            .delegate(DelegateDef::new::<Self, T>(
                TypeExpr::of::<T>(),
                |boxed: &Box<T>| Ok(FieldValue::Borrowed(&**boxed)),
                Box::new,
            ))
            .finish()
    }

    fn register_dependencies(registry: &mut BindRegistry) -> Result<(), BuildError> {
        registry.register::<T>()
    }
}

impl<T: Describe> Describe for Rc<T> {
    fn shape() -> ResolvedType {
        ResolvedType::class::<Self>(&["T"], vec![T::shape()])
    }

    fn descriptor() -> TypeDescriptor {
        TypeDescriptor::describe::<Self>(&["T"])
            .delegate(DelegateDef::new::<Self, T>(
                TypeExpr::of::<T>(),
                |shared: &Rc<T>| Ok(FieldValue::Borrowed(&**shared)),
                Rc::new,
            ))
            .finish()
    }

    fn register_dependencies(registry: &mut BindRegistry) -> Result<(), BuildError> {
        registry.register::<T>()
    }
}

impl<T: Describe> Describe for Arc<T> {
    fn shape() -> ResolvedType {
        ResolvedType::class::<Self>(&["T"], vec![T::shape()])
    }

    fn descriptor() -> TypeDescriptor {
        TypeDescriptor::describe::<Self>(&["T"])
            .delegate(DelegateDef::new::<Self, T>(
                TypeExpr::of::<T>(),
                |shared: &Arc<T>| Ok(FieldValue::Borrowed(&**shared)),
                Arc::new,
            ))
            .finish()
    }

    fn register_dependencies(registry: &mut BindRegistry) -> Result<(), BuildError> {
        registry.register::<T>()
    }
}

impl<T: Describe> Describe for RefCell<T> {
    fn shape() -> ResolvedType {
        ResolvedType::class::<Self>(&["T"], vec![T::shape()])
    }

    fn descriptor() -> TypeDescriptor {
        TypeDescriptor::describe::<Self>(&["T"])
            .delegate(DelegateDef::new::<Self, T>(
                TypeExpr::of::<T>(),
                |cell: &RefCell<T>| {
                    let guard = cell.try_borrow().map_err(Cause::new)?;
                    Ok(FieldValue::Guarded(Ref::map(guard, |inner| {
                        inner as &dyn Any
                    })))
                },
                RefCell::new,
            ))
            .finish()
    }

    fn register_dependencies(registry: &mut BindRegistry) -> Result<(), BuildError> {
        registry.register::<T>()
    }
}
