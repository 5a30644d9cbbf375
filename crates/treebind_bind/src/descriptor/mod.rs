//! Per-type mapping facts and the [`Describe`] trait.
//!
//! A [`TypeDescriptor`] is declarative: it lists everything mapping-relevant
//! about a type (fields, creation paths, converters, container facts) without
//! committing to a strategy. Detection reads the facts and produces a
//! [`Definition`](crate::registry::Definition); descriptors themselves never
//! serialize anything.
//!
//! Descriptors are written through the typed [`DescriptorBuilder`], which
//! performs the erasure so the engine can traverse values as `&dyn Any`.

mod access;
mod args;

pub use access::{FieldValue, Getter};
pub(crate) use access::owner_ref;
pub use args::{Args, FactoryArgs};

use core::any::Any;
use core::error::Error;
use core::marker::PhantomData;

use treebind_value::{Scalar, ScalarKind};

use crate::error::{BuildError, Cause};
use crate::info::{ResolvedType, Type, TypeExpr};
use crate::registry::BindRegistry;
use crate::registry::definition::{
    BoundField, DelegateDef, Factory, MapDef, OptionalDef, Param, ScalarDef, SequenceDef,
};

// -----------------------------------------------------------------------------
// Describe

/// A type that can describe its mapping facts.
///
/// Implementations are explicit: each mapped type states its resolved shape,
/// produces its descriptor, and registers the types it depends on. The
/// registry calls [`register_dependencies`](Self::register_dependencies)
/// after inserting the type's own definition, so recursive types terminate.
pub trait Describe: Any + Sized {
    /// The resolved type of `Self`, generic arguments included.
    fn shape() -> ResolvedType;

    /// The mapping facts for `Self`.
    fn descriptor() -> TypeDescriptor;

    /// Registers every type this descriptor references.
    fn register_dependencies(registry: &mut BindRegistry) -> Result<(), BuildError> {
        let _ = registry;
        Ok(())
    }
}

// -----------------------------------------------------------------------------
// TypeDescriptor

/// Everything mapping-relevant about one type, strategy not yet decided.
pub struct TypeDescriptor {
    ty: Type,
    params: &'static [&'static str],
    fields: Vec<BoundField>,
    constructors: Vec<ConstructorSpec>,
    converters: Vec<ConverterSpec>,
    element: Option<SequenceDef>,
    entries: Option<MapDef>,
    optional: Option<OptionalDef>,
    delegate: Option<DelegateDef>,
}

/// A declared creation path, possibly marked as the preferred one.
pub struct ConstructorSpec {
    marked: bool,
    factory: Factory,
}

impl ConstructorSpec {
    #[inline]
    pub fn name(&self) -> &'static str {
        self.factory.name
    }

    #[inline]
    pub fn arity(&self) -> usize {
        self.factory.params.len()
    }

    #[inline]
    pub fn marked(&self) -> bool {
        self.marked
    }

    pub fn into_factory(self) -> Factory {
        self.factory
    }
}

/// A declared scalar converter, possibly marked as the preferred one.
pub struct ConverterSpec {
    name: &'static str,
    marked: bool,
    def: ScalarDef,
}

impl ConverterSpec {
    #[inline]
    pub fn name(&self) -> &'static str {
        self.name
    }

    #[inline]
    pub fn marked(&self) -> bool {
        self.marked
    }

    pub fn into_def(self) -> ScalarDef {
        self.def
    }
}

impl TypeDescriptor {
    /// Starts a typed builder for `T`.
    pub fn describe<T: 'static>(params: &'static [&'static str]) -> DescriptorBuilder<T> {
        DescriptorBuilder {
            inner: Self {
                ty: Type::of::<T>(),
                params,
                fields: Vec::new(),
                constructors: Vec::new(),
                converters: Vec::new(),
                element: None,
                entries: None,
                optional: None,
                delegate: None,
            },
            _marker: PhantomData,
        }
    }

    #[inline]
    pub fn ty(&self) -> &Type {
        &self.ty
    }

    #[inline]
    pub fn params(&self) -> &'static [&'static str] {
        self.params
    }

    // Detectors inspect facts through the slices and *extract* what they
    // claim; extraction makes ownership of closures explicit.

    #[inline]
    pub fn constructors(&self) -> &[ConstructorSpec] {
        &self.constructors
    }

    #[inline]
    pub fn converters(&self) -> &[ConverterSpec] {
        &self.converters
    }

    pub fn take_fields(&mut self) -> Vec<BoundField> {
        core::mem::take(&mut self.fields)
    }

    pub fn take_constructor(&mut self, index: usize) -> ConstructorSpec {
        self.constructors.remove(index)
    }

    pub fn take_converter(&mut self, index: usize) -> ConverterSpec {
        self.converters.remove(index)
    }

    pub fn take_element(&mut self) -> Option<SequenceDef> {
        self.element.take()
    }

    pub fn take_entries(&mut self) -> Option<MapDef> {
        self.entries.take()
    }

    pub fn take_optional(&mut self) -> Option<OptionalDef> {
        self.optional.take()
    }

    pub fn take_delegate(&mut self) -> Option<DelegateDef> {
        self.delegate.take()
    }
}

// -----------------------------------------------------------------------------
// DescriptorBuilder

/// The typed way to write a [`TypeDescriptor`].
///
/// The owner type `T` keeps accessors, factories and converters fully typed;
/// the builder erases them on the way in.
///
/// # Examples
///
/// ```
/// use treebind_bind::descriptor::{Describe, DescriptorBuilder, TypeDescriptor};
/// use treebind_bind::info::ResolvedType;
/// use treebind_bind::registry::{BindRegistry, Param};
/// use treebind_bind::BuildError;
///
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
/// ```
pub struct DescriptorBuilder<T: 'static> {
    inner: TypeDescriptor,
    _marker: PhantomData<fn() -> T>,
}

impl<T: 'static> DescriptorBuilder<T> {
    /// Declares a field borrowed straight out of the owner.
    pub fn field<F: Describe>(mut self, name: &'static str, get: fn(&T) -> &F) -> Self {
        self.inner.fields.push(BoundField {
            name,
            expr: TypeExpr::of::<F>(),
            get: Box::new(move |owner| {
                Ok(FieldValue::Borrowed(get(owner_ref::<T>(owner)?)))
            }),
        });
        self
    }

    /// Declares a derived field: the accessor computes an owned value.
    pub fn field_with<F: Describe>(
        mut self,
        name: &'static str,
        get: impl Fn(&T) -> F + Send + Sync + 'static,
    ) -> Self {
        self.inner.fields.push(BoundField {
            name,
            expr: TypeExpr::of::<F>(),
            get: Box::new(move |owner| {
                Ok(FieldValue::Owned(Box::new(get(owner_ref::<T>(owner)?))))
            }),
        });
        self
    }

    /// Declares a field whose accessor can fail.
    pub fn try_field<F, E>(
        mut self,
        name: &'static str,
        get: impl Fn(&T) -> Result<F, E> + Send + Sync + 'static,
    ) -> Self
    where
        F: Describe,
        E: Error + Send + Sync + 'static,
    {
        self.inner.fields.push(BoundField {
            name,
            expr: TypeExpr::of::<F>(),
            get: Box::new(move |owner| {
                get(owner_ref::<T>(owner)?)
                    .map(|value| FieldValue::Owned(Box::new(value)))
                    .map_err(Cause::new)
            }),
        });
        self
    }

    /// Declares a field with an explicit type expression and an erased
    /// accessor. This is the form generic owners use for `Var` fields.
    pub fn field_as(
        mut self,
        name: &'static str,
        expr: TypeExpr,
        get: fn(&T) -> &dyn Any,
    ) -> Self {
        self.inner.fields.push(BoundField {
            name,
            expr,
            get: Box::new(move |owner| {
                Ok(FieldValue::Borrowed(get(owner_ref::<T>(owner)?)))
            }),
        });
        self
    }

    /// Declares a creation path.
    ///
    /// `params` name the object members the factory consumes, in order;
    /// `make` receives them as a typed tuple. Factory errors are carried as
    /// causes and classified by the failure map at deserialize time.
    ///
    /// # Panics
    ///
    /// Panics if `params` and the closure's tuple arity disagree; the two
    /// declarations describe the same parameter list.
    pub fn constructor<Ps, E>(
        self,
        name: &'static str,
        params: Vec<Param>,
        make: impl Fn(Ps) -> Result<T, E> + Send + Sync + 'static,
    ) -> Self
    where
        Ps: FactoryArgs,
        E: Error + Send + Sync + 'static,
    {
        self.add_constructor(false, name, params, make)
    }

    /// Declares a creation path and marks it as the preferred one.
    pub fn marked_constructor<Ps, E>(
        self,
        name: &'static str,
        params: Vec<Param>,
        make: impl Fn(Ps) -> Result<T, E> + Send + Sync + 'static,
    ) -> Self
    where
        Ps: FactoryArgs,
        E: Error + Send + Sync + 'static,
    {
        self.add_constructor(true, name, params, make)
    }

    fn add_constructor<Ps, E>(
        mut self,
        marked: bool,
        name: &'static str,
        params: Vec<Param>,
        make: impl Fn(Ps) -> Result<T, E> + Send + Sync + 'static,
    ) -> Self
    where
        Ps: FactoryArgs,
        E: Error + Send + Sync + 'static,
    {
        assert_eq!(
            params.len(),
            Ps::ARITY,
            "constructor `{}` of `{}` declares {} parameter(s) but its closure takes {}",
            name,
            self.inner.ty.path(),
            params.len(),
            Ps::ARITY,
        );
        self.inner.constructors.push(ConstructorSpec {
            marked,
            factory: Factory {
                name,
                params,
                invoke: Box::new(move |mut args| {
                    let params = Ps::extract(&mut args)?;
                    make(params)
                        .map(|value| Box::new(value) as Box<dyn Any>)
                        .map_err(Cause::new)
                }),
            },
        });
        self
    }

    /// Declares a scalar converter.
    pub fn converter<E>(
        mut self,
        name: &'static str,
        kind: ScalarKind,
        encode: impl Fn(&T) -> Scalar + Send + Sync + 'static,
        decode: impl Fn(Scalar) -> Result<T, E> + Send + Sync + 'static,
    ) -> Self
    where
        E: Error + Send + Sync + 'static,
    {
        self.inner.converters.push(ConverterSpec {
            name,
            marked: false,
            def: ScalarDef::new(kind, encode, decode),
        });
        self
    }

    /// Declares a scalar converter and marks it as the preferred one.
    pub fn marked_converter<E>(
        mut self,
        name: &'static str,
        kind: ScalarKind,
        encode: impl Fn(&T) -> Scalar + Send + Sync + 'static,
        decode: impl Fn(Scalar) -> Result<T, E> + Send + Sync + 'static,
    ) -> Self
    where
        E: Error + Send + Sync + 'static,
    {
        self.inner.converters.push(ConverterSpec {
            name,
            marked: true,
            def: ScalarDef::new(kind, encode, decode),
        });
        self
    }

    /// Declares a scalar converter whose encoder can fail.
    pub fn fallible_converter<E1, E2>(
        mut self,
        name: &'static str,
        kind: ScalarKind,
        encode: impl Fn(&T) -> Result<Scalar, E1> + Send + Sync + 'static,
        decode: impl Fn(Scalar) -> Result<T, E2> + Send + Sync + 'static,
    ) -> Self
    where
        E1: Error + Send + Sync + 'static,
        E2: Error + Send + Sync + 'static,
    {
        self.inner.converters.push(ConverterSpec {
            name,
            marked: false,
            def: ScalarDef::fallible(kind, encode, decode),
        });
        self
    }

    /// Declares this type an ordered container.
    pub fn element(mut self, def: SequenceDef) -> Self {
        self.inner.element = Some(def);
        self
    }

    /// Declares this type a string-keyed map.
    pub fn entries(mut self, def: MapDef) -> Self {
        self.inner.entries = Some(def);
        self
    }

    /// Declares this type optional: it has an explicit absent case.
    pub fn optional(mut self, def: OptionalDef) -> Self {
        self.inner.optional = Some(def);
        self
    }

    /// Declares this type a transparent wrapper around its inner type.
    pub fn delegate(mut self, def: DelegateDef) -> Self {
        self.inner.delegate = Some(def);
        self
    }

    pub fn finish(self) -> TypeDescriptor {
        self.inner
    }
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use super::TypeDescriptor;
    use crate::registry::Param;
    use core::convert::Infallible;

    struct Point {
        x: i64,
        y: i64,
    }

    #[test]
    fn builder_records_fields_and_constructors() {
        let descriptor = TypeDescriptor::describe::<Point>(&[])
            .field("x", |p: &Point| &p.x)
            .field("y", |p: &Point| &p.y)
            .constructor(
                "new",
                vec![Param::of::<i64>("x"), Param::of::<i64>("y")],
                |(x, y): (i64, i64)| Ok::<_, Infallible>(Point { x, y }),
            )
            .finish();

        assert_eq!(descriptor.constructors().len(), 1);
        assert_eq!(descriptor.constructors()[0].name(), "new");
        assert_eq!(descriptor.constructors()[0].arity(), 2);
        assert!(!descriptor.constructors()[0].marked());
    }

    #[test]
    #[should_panic(expected = "closure takes")]
    fn constructor_arity_mismatch_panics() {
        TypeDescriptor::describe::<Point>(&[]).constructor(
            "new",
            vec![Param::of::<i64>("x")],
            |(x, y): (i64, i64)| Ok::<_, Infallible>(Point { x, y }),
        );
    }
}
