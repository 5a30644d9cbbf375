//! The per-type definition registry and strategy detection.
//!
//! Registration happens once, up front: each [`Describe`] type's descriptor
//! is run through three detector passes (scalar, container, record) and the
//! first detector to claim it produces the type's [`Definition`]. Traversals
//! afterwards only read; a finished registry is shareable across threads.

pub mod definition;
mod detect;

pub use definition::{
    BoundField, Definition, DelegateDef, Factory, MapBuilder, MapDef, OptionalDef, Param,
    RecordDef, ScalarDef, SequenceBuilder, SequenceDef,
};
pub use detect::{
    DelegateDetector, Detector, MapDetector, MarkedConverterDetector, MarkedFactoryDetector,
    NamingFactoryDetector, OptionalDetector, SequenceDetector, SoleConverterDetector,
    StructuralDetector,
};

use core::any::TypeId;

use treebind_value::hash::TypeIdMap;

use crate::descriptor::{Describe, TypeDescriptor};
use crate::error::{BuildError, ConfigError};
use crate::info::ResolvedType;

// -----------------------------------------------------------------------------
// BindRegistry

/// Registered definitions, shapes, and the detector chains that build them.
///
/// Detection runs in three fixed passes: scalar detectors first, then
/// container detectors, then record detectors. Within a pass detectors run
/// in priority order and the first definition wins. User-added detectors go
/// to the front of their pass, ahead of the built-in ones.
pub struct BindRegistry {
    defs: TypeIdMap<Definition>,
    shapes: TypeIdMap<ResolvedType>,
    scalar_detectors: Vec<Box<dyn Detector>>,
    container_detectors: Vec<Box<dyn Detector>>,
    record_detectors: Vec<Box<dyn Detector>>,
}

impl BindRegistry {
    /// A registry with the built-in detector chains and no types.
    pub fn new() -> Self {
        Self {
            defs: TypeIdMap::default(),
            shapes: TypeIdMap::default(),
            scalar_detectors: vec![
                Box::new(MarkedConverterDetector),
                Box::new(SoleConverterDetector),
            ],
            container_detectors: vec![
                Box::new(OptionalDetector),
                Box::new(DelegateDetector),
                Box::new(SequenceDetector),
                Box::new(MapDetector),
            ],
            record_detectors: vec![
                Box::new(MarkedFactoryDetector),
                Box::new(NamingFactoryDetector::new("from_")),
                Box::new(StructuralDetector),
            ],
        }
    }

    /// Registers `T` and, transitively, everything its descriptor mentions.
    ///
    /// Idempotent: a type already registered is left untouched. The type's
    /// own definition is inserted *before* its dependencies are registered,
    /// so recursive types terminate.
    pub fn register<T: Describe>(&mut self) -> Result<(), BuildError> {
        let id = TypeId::of::<T>();
        if self.defs.contains_key(&id) {
            return Ok(());
        }
        let shape = T::shape();
        let mut descriptor = T::descriptor();
        check_params(&descriptor, &shape)?;
        let definition = self.detect(&mut descriptor)?;
        log::debug!(
            "registered `{}` as {}",
            descriptor.ty().path(),
            definition.kind_name()
        );
        self.defs.insert(id, definition);
        self.shapes.insert(id, shape);
        T::register_dependencies(self)
    }

    fn detect(&self, descriptor: &mut TypeDescriptor) -> Result<Definition, BuildError> {
        let passes = self
            .scalar_detectors
            .iter()
            .chain(&self.container_detectors)
            .chain(&self.record_detectors);
        for detector in passes {
            if let Some(definition) = detector.detect(descriptor)? {
                log::trace!(
                    "detector `{}` claimed `{}` as {}",
                    detector.name(),
                    descriptor.ty().path(),
                    definition.kind_name()
                );
                return Ok(definition);
            }
        }
        Err(BuildError::Undetectable {
            type_path: descriptor.ty().path(),
        })
    }

    /// Adds a scalar detector ahead of the built-in ones.
    pub fn add_scalar_detector(&mut self, detector: impl Detector + 'static) {
        self.scalar_detectors.insert(0, Box::new(detector));
    }

    /// Adds a container detector ahead of the built-in ones.
    pub fn add_container_detector(&mut self, detector: impl Detector + 'static) {
        self.container_detectors.insert(0, Box::new(detector));
    }

    /// Adds a record detector ahead of the built-in ones.
    pub fn add_record_detector(&mut self, detector: impl Detector + 'static) {
        self.record_detectors.insert(0, Box::new(detector));
    }

    /// The definition for a resolved type.
    ///
    /// Reaching an unregistered type mid-traversal is a configuration error.
    pub fn definition(&self, ty: &ResolvedType) -> Result<&Definition, ConfigError> {
        self.defs.get(&ty.id()).ok_or_else(|| ConfigError::UnknownType {
            type_path: ty.path().to_string(),
        })
    }

    /// The registered shape of a type, by id.
    ///
    /// Used by the serializer to infer element types of dynamic containers
    /// from live values.
    pub fn shape_of(&self, id: TypeId) -> Option<&ResolvedType> {
        self.shapes.get(&id)
    }

    /// Whether the type is registered.
    #[inline]
    pub fn contains(&self, id: TypeId) -> bool {
        self.defs.contains_key(&id)
    }

    /// The number of registered types.
    #[inline]
    pub fn len(&self) -> usize {
        self.defs.len()
    }
}

impl Default for BindRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// A descriptor and its shape must declare the same generic parameter list;
/// a `Var` field named after a parameter the shape never binds would only
/// fail later, mid-traversal, with a worse message.
fn check_params(descriptor: &TypeDescriptor, shape: &ResolvedType) -> Result<(), BuildError> {
    let bound: &[&str] = match shape {
        ResolvedType::Class(class) => class.params(),
        ResolvedType::Array(_) => &[],
    };
    if descriptor.params() != bound {
        return Err(BuildError::Malformed {
            type_path: descriptor.ty().path(),
            detail: format!(
                "descriptor declares generic parameters {:?} but the shape binds {:?}",
                descriptor.params(),
                bound,
            ),
        });
    }
    Ok(())
}

// -----------------------------------------------------------------------------
// Tests
