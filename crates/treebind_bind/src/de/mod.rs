//! The deserializing traversal: [`Value`] trees in, native values out.
//!
//! Deserialization is validation-first. Data problems never abort the walk:
//! they are recorded against the position they were found at and the
//! traversal carries on, so one call reports every invalid member of a
//! document at once. A record's factory runs only when its whole subtree
//! decoded cleanly, so no half-valid native value is ever constructed.
//!
//! Setup problems do abort, as [`FatalError`]; see [`crate::error`] for the
//! boundary between the two.

mod coerce;
mod failure;
mod inject;
mod tracker;

pub use coerce::{CoerceError, coerce};
pub use failure::FailureMap;
pub use inject::Injector;
pub use tracker::{NodeId, Report, Step, Tracker, ValidationError, ValidationKind};

use core::any::Any;

use treebind_value::Value;

use crate::descriptor::Describe;
use crate::error::{Cause, ConfigError, FatalError};
use crate::info::ResolvedType;
use crate::registry::{
    BindRegistry, Definition, MapDef, OptionalDef, RecordDef, ScalarDef, SequenceDef,
};

// -----------------------------------------------------------------------------
// Outcome

/// What one deserialize call produced.
///
/// A clean call has a value and an empty report; an invalid document has no
/// value and a non-empty report. Both must be consulted.
#[derive(Debug)]
pub struct Outcome<T> {
    pub value: Option<T>,
    pub report: Report,
}

impl<T> Outcome<T> {
    /// The value if the input was clean, the full report otherwise.
    pub fn into_result(self) -> Result<T, Report> {
        match self.value {
            Some(value) if self.report.is_empty() => Ok(value),
            _ => Err(self.report),
        }
    }

    #[inline]
    pub fn is_clean(&self) -> bool {
        self.value.is_some() && self.report.is_empty()
    }
}

/// Deserializes a `T` from `input` against the registry.
pub(crate) fn deserialize_root<T: Describe>(
    registry: &BindRegistry,
    failures: &FailureMap,
    injector: &Injector,
    input: &Value,
) -> Result<Outcome<T>, FatalError> {
    let driver = Driver {
        registry,
        failures,
        injector,
    };
    let mut tracker = Tracker::new();
    let root = tracker.root();
    let value = driver.drive(input, &T::shape(), &mut tracker, root)?;
    let report = tracker.into_report();
    match value {
        Some(boxed) => match boxed.downcast::<T>() {
            Ok(value) => Ok(Outcome {
                value: Some(*value),
                report,
            }),
            Err(_) => Err(FatalError::Internal {
                position: String::new(),
                detail: "root value decoded to an unexpected type".into(),
            }),
        },
        None if report.is_empty() => Err(FatalError::Internal {
            position: String::new(),
            detail: "traversal produced neither a value nor errors".into(),
        }),
        None => Ok(Outcome {
            value: None,
            report,
        }),
    }
}

// -----------------------------------------------------------------------------
// Driver

/// The recursive deserializing walk. Stateless apart from its inputs; all
/// per-call state lives in the [`Tracker`].
struct Driver<'r> {
    registry: &'r BindRegistry,
    failures: &'r FailureMap,
    injector: &'r Injector,
}

impl Driver<'_> {
    /// Decodes one input position.
    ///
    /// `Ok(Some(_))` is a decoded value with a clean subtree; `Ok(None)`
    /// means data errors were recorded below this node; `Err(_)` aborts the
    /// whole call.
    fn drive(
        &self,
        input: &Value,
        ty: &ResolvedType,
        tracker: &mut Tracker,
        node: NodeId,
    ) -> Result<Option<Box<dyn Any>>, FatalError> {
        // Caller-supplied values win over the document, absent input
        // included: path bindings first, then type bindings, then raw
        // subtree replacement.
        if let Some(provided) = self.injector.value_at(tracker.position(node)) {
            if provided.ty().id() != ty.id() {
                return Err(ConfigError::InjectionMismatch {
                    position: tracker.position(node).to_string(),
                    expected: ty.path(),
                    found: provided.ty().path(),
                }
                .into());
            }
            return Ok(Some(provided.produce()));
        }
        if let Some(provided) = self.injector.value_for(ty.id()) {
            return Ok(Some(provided.produce()));
        }
        let input = self
            .injector
            .raw_at(tracker.position(node))
            .unwrap_or(input);

        match self.registry.definition(ty)? {
            Definition::Scalar(def) => self.drive_scalar(def, input, tracker, node),
            Definition::Optional(def) => self.drive_optional(def, input, ty, tracker, node),
            Definition::Delegate(def) => {
                let inner_ty = def.inner.resolve(ty)?;
                match self.drive(input, &inner_ty, tracker, node)? {
                    Some(inner) => (def.wrap)(inner)
                        .map(Some)
                        .map_err(|cause| self.internal(cause, tracker, node)),
                    None => Ok(None),
                }
            }
            Definition::Sequence(def) => self.drive_sequence(def, input, ty, tracker, node),
            Definition::Dictionary(def) => self.drive_map(def, input, ty, tracker, node),
            Definition::Record(def) => self.drive_record(def, input, ty, tracker, node),
        }
    }

    fn drive_scalar(
        &self,
        def: &ScalarDef,
        input: &Value,
        tracker: &mut Tracker,
        node: NodeId,
    ) -> Result<Option<Box<dyn Any>>, FatalError> {
        let Value::Primitive(scalar) = input else {
            tracker.record(
                node,
                ValidationKind::Shape {
                    expected: def.kind().to_string(),
                    actual: input.shape(),
                },
            );
            return Ok(None);
        };
        let scalar = match coerce(scalar.clone(), def.kind()) {
            Ok(scalar) => scalar,
            Err(err) => {
                tracker.record(
                    node,
                    ValidationKind::Format {
                        detail: err.to_string(),
                    },
                );
                return Ok(None);
            }
        };
        match (def.decode)(scalar) {
            Ok(value) => Ok(Some(value)),
            Err(cause) => {
                self.classify(cause, tracker, node)?;
                Ok(None)
            }
        }
    }

    fn drive_optional(
        &self,
        def: &OptionalDef,
        input: &Value,
        ty: &ResolvedType,
        tracker: &mut Tracker,
        node: NodeId,
    ) -> Result<Option<Box<dyn Any>>, FatalError> {
        if input.is_null() {
            return Ok(Some((def.none)()));
        }
        let inner_ty = def.inner.resolve(ty)?;
        match self.drive(input, &inner_ty, tracker, node)? {
            Some(inner) => (def.some)(inner)
                .map(Some)
                .map_err(|cause| self.internal(cause, tracker, node)),
            None => Ok(None),
        }
    }

    fn drive_sequence(
        &self,
        def: &SequenceDef,
        input: &Value,
        ty: &ResolvedType,
        tracker: &mut Tracker,
        node: NodeId,
    ) -> Result<Option<Box<dyn Any>>, FatalError> {
        let Value::Collection(items) = input else {
            tracker.record(
                node,
                ValidationKind::Shape {
                    expected: "collection".into(),
                    actual: input.shape(),
                },
            );
            return Ok(None);
        };
        let elem_ty = def.elem.resolve(ty)?;
        let mut decoded = Vec::with_capacity(items.len());
        let mut complete = true;
        for (index, item) in items.iter().enumerate() {
            let child = tracker.child(node, Step::Index(index));
            match self.drive(item, &elem_ty, tracker, child)? {
                Some(value) => decoded.push(value),
                None => complete = false,
            }
        }
        if !complete {
            return Ok(None);
        }
        let mut builder = (def.make_builder)(decoded.len());
        for value in decoded {
            builder
                .push(value)
                .map_err(|cause| self.internal(cause, tracker, node))?;
        }
        match builder.finish() {
            Ok(value) => Ok(Some(value)),
            Err(cause) if cause.is_internal() => Err(self.internal(cause, tracker, node)),
            Err(cause) => {
                self.classify(cause, tracker, node)?;
                Ok(None)
            }
        }
    }

    fn drive_map(
        &self,
        def: &MapDef,
        input: &Value,
        ty: &ResolvedType,
        tracker: &mut Tracker,
        node: NodeId,
    ) -> Result<Option<Box<dyn Any>>, FatalError> {
        let Value::Object(members) = input else {
            tracker.record(
                node,
                ValidationKind::Shape {
                    expected: "object".into(),
                    actual: input.shape(),
                },
            );
            return Ok(None);
        };
        let value_ty = def.value.resolve(ty)?;
        let mut decoded = Vec::with_capacity(members.len());
        let mut complete = true;
        for (name, member) in members {
            let child = tracker.child(node, Step::Field(name));
            match self.drive(member, &value_ty, tracker, child)? {
                Some(value) => decoded.push((name.clone(), value)),
                None => complete = false,
            }
        }
        if !complete {
            return Ok(None);
        }
        let mut builder = (def.make_builder)();
        for (name, value) in decoded {
            builder
                .insert(name, value)
                .map_err(|cause| self.internal(cause, tracker, node))?;
        }
        match builder.finish() {
            Ok(value) => Ok(Some(value)),
            Err(cause) => Err(self.internal(cause, tracker, node)),
        }
    }

    fn drive_record(
        &self,
        def: &RecordDef,
        input: &Value,
        ty: &ResolvedType,
        tracker: &mut Tracker,
        node: NodeId,
    ) -> Result<Option<Box<dyn Any>>, FatalError> {
        let members = match input {
            Value::Object(members) => members,
            other => {
                tracker.record(
                    node,
                    ValidationKind::Shape {
                        expected: "object".into(),
                        actual: other.shape(),
                    },
                );
                return Ok(None);
            }
        };
        let mut args = Vec::with_capacity(def.factory.params.len());
        let mut complete = true;
        for param in &def.factory.params {
            // An absent member decodes like an explicit null.
            let member = members.get(param.name).unwrap_or(&Value::Null);
            let param_ty = param.expr.resolve(ty)?;
            let child = tracker.child(node, Step::Field(param.name));
            match self.drive(member, &param_ty, tracker, child)? {
                Some(value) => args.push(value),
                None => complete = false,
            }
        }
        // Never hand a factory a partially valid argument list.
        if !complete {
            return Ok(None);
        }
        match (def.factory.invoke)(crate::descriptor::Args::new(args)) {
            Ok(value) => Ok(Some(value)),
            Err(cause) if cause.is_internal() => Err(self.internal(cause, tracker, node)),
            Err(cause) => {
                log::debug!(
                    "factory `{}` rejected input at `{}`: {}",
                    def.factory.name,
                    tracker.position(node),
                    cause.message()
                );
                self.classify(cause, tracker, node)?;
                Ok(None)
            }
        }
    }

    /// Runs a user failure through the failure map; unrecognized ones are
    /// fatal.
    fn classify(
        &self,
        cause: Cause,
        tracker: &mut Tracker,
        node: NodeId,
    ) -> Result<(), FatalError> {
        if cause.is_internal() {
            return Err(self.internal(cause, tracker, node));
        }
        let position = tracker.position(node).to_string();
        match self.failures.apply(&cause, &position) {
            Some(error) => {
                tracker.push(node, error);
                Ok(())
            }
            None => Err(FatalError::UnrecognizedFailure { position, cause }),
        }
    }

    fn internal(&self, cause: Cause, tracker: &Tracker, node: NodeId) -> FatalError {
        FatalError::Internal {
            position: tracker.position(node).to_string(),
            detail: cause.message().to_string(),
        }
    }
}

// -----------------------------------------------------------------------------
// Tests
