//! Built-in container mappings: vectors, arrays and string-keyed maps.

use core::any::Any;
use std::collections::{BTreeMap, HashMap, VecDeque};

use crate::descriptor::{Describe, TypeDescriptor};
use crate::error::{BuildError, Cause, LengthFault};
use crate::info::{ResolvedType, TypeExpr};
use crate::registry::{BindRegistry, MapBuilder, MapDef, SequenceBuilder, SequenceDef};

// -----------------------------------------------------------------------------
// Sequence builders

/// Accumulates typed elements, then hands them to a finishing function.
struct SeqCollector<T, C> {
    items: Vec<T>,
    finish: fn(Vec<T>) -> Result<C, Cause>,
}

impl<T: 'static, C: 'static> SequenceBuilder for SeqCollector<T, C> {
    fn push(&mut self, elem: Box<dyn Any>) -> Result<(), Cause> {
        let elem = elem.downcast::<T>().map_err(|_| {
            Cause::internal(format!(
                "sequence element is not a `{}`",
                core::any::type_name::<T>()
            ))
        })?;
        self.items.push(*elem);
        Ok(())
    }

    fn finish(self: Box<Self>) -> Result<Box<dyn Any>, Cause> {
        (self.finish)(self.items).map(|c| Box::new(c) as Box<dyn Any>)
    }
}

// -----------------------------------------------------------------------------
// Vec / VecDeque

impl<T: Describe> Describe for Vec<T> {
    fn shape() -> ResolvedType {
        ResolvedType::class::<Self>(&["T"], vec![T::shape()])
    }

    fn descriptor() -> TypeDescriptor {
        TypeDescriptor::describe::<Self>(&["T"])
            .element(SequenceDef::new::<Self>(
                TypeExpr::Var("T"),
                |items: &Vec<T>, visit| {
                    for item in items {
                        if !visit(item) {
                            break;
                        }
                    }
                },
                |capacity| {
                    Box::new(SeqCollector::<T, Vec<T>> {
                        items: Vec::with_capacity(capacity),
                        finish: Ok,
                    })
                },
            ))
            .finish()
    }

    fn register_dependencies(registry: &mut BindRegistry) -> Result<(), BuildError> {
        registry.register::<T>()
    }
}

impl<T: Describe> Describe for VecDeque<T> {
    fn shape() -> ResolvedType {
        ResolvedType::class::<Self>(&["T"], vec![T::shape()])
    }

    fn descriptor() -> TypeDescriptor {
        TypeDescriptor::describe::<Self>(&["T"])
            .element(SequenceDef::new::<Self>(
                TypeExpr::Var("T"),
                |items: &VecDeque<T>, visit| {
                    for item in items {
                        if !visit(item) {
                            break;
                        }
                    }
                },
                |capacity| {
                    Box::new(SeqCollector::<T, VecDeque<T>> {
                        items: Vec::with_capacity(capacity),
                        finish: |items| Ok(VecDeque::from(items)),
                    })
                },
            ))
            .finish()
    }

    fn register_dependencies(registry: &mut BindRegistry) -> Result<(), BuildError> {
        registry.register::<T>()
    }
}

// -----------------------------------------------------------------------------
// Fixed-size arrays

impl<T: Describe, const N: usize> Describe for [T; N] {
    fn shape() -> ResolvedType {
        ResolvedType::array::<Self>(T::shape())
    }

    fn descriptor() -> TypeDescriptor {
        TypeDescriptor::describe::<Self>(&[])
            .element(SequenceDef::new::<Self>(
                TypeExpr::of::<T>(),
                |items: &[T; N], visit| {
                    for item in items {
                        if !visit(item) {
                            break;
                        }
                    }
                },
                |capacity| {
                    Box::new(SeqCollector::<T, [T; N]> {
                        items: Vec::with_capacity(capacity),
                        finish: |items| {
                            items.try_into().map_err(|items: Vec<T>| {
                                Cause::new(LengthFault {
                                    expected: N,
                                    actual: items.len(),
                                })
                            })
                        },
                    })
                },
            ))
            .finish()
    }

    fn register_dependencies(registry: &mut BindRegistry) -> Result<(), BuildError> {
        registry.register::<T>()
    }
}

// -----------------------------------------------------------------------------
// Map builders

struct MapCollector<V, C> {
    entries: Vec<(String, V)>,
    finish: fn(Vec<(String, V)>) -> C,
}

impl<V: 'static, C: 'static> MapBuilder for MapCollector<V, C> {
    fn insert(&mut self, key: String, value: Box<dyn Any>) -> Result<(), Cause> {
        let value = value.downcast::<V>().map_err(|_| {
            Cause::internal(format!(
                "map value is not a `{}`",
                core::any::type_name::<V>()
            ))
        })?;
        self.entries.push((key, *value));
        Ok(())
    }

    fn finish(self: Box<Self>) -> Result<Box<dyn Any>, Cause> {
        Ok(Box::new((self.finish)(self.entries)))
    }
}

// -----------------------------------------------------------------------------
// HashMap / BTreeMap

impl<V: Describe> Describe for HashMap<String, V> {
    fn shape() -> ResolvedType {
        ResolvedType::class::<Self>(&["V"], vec![V::shape()])
    }

    fn descriptor() -> TypeDescriptor {
        TypeDescriptor::describe::<Self>(&["V"])
            .entries(MapDef::new::<Self>(
                TypeExpr::Var("V"),
                |map: &HashMap<String, V>, visit| {
                    for (key, value) in map {
                        if !visit(key, value) {
                            break;
                        }
                    }
                },
                || {
                    Box::new(MapCollector::<V, HashMap<String, V>> {
                        entries: Vec::new(),
                        finish: |entries| entries.into_iter().collect(),
                    })
                },
            ))
            .finish()
    }

    fn register_dependencies(registry: &mut BindRegistry) -> Result<(), BuildError> {
        registry.register::<V>()
    }
}

impl<V: Describe> Describe for BTreeMap<String, V> {
    fn shape() -> ResolvedType {
        ResolvedType::class::<Self>(&["V"], vec![V::shape()])
    }

    fn descriptor() -> TypeDescriptor {
        TypeDescriptor::describe::<Self>(&["V"])
            .entries(MapDef::new::<Self>(
                TypeExpr::Var("V"),
                |map: &BTreeMap<String, V>, visit| {
                    for (key, value) in map {
                        if !visit(key, value) {
                            break;
                        }
                    }
                },
                || {
                    Box::new(MapCollector::<V, BTreeMap<String, V>> {
                        entries: Vec::new(),
                        finish: |entries| entries.into_iter().collect(),
                    })
                },
            ))
            .finish()
    }

    fn register_dependencies(registry: &mut BindRegistry) -> Result<(), BuildError> {
        registry.register::<V>()
    }
}
