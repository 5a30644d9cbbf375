use core::any::{TypeId, type_name};
use core::error::Error;
use core::fmt;

use treebind_value::hash::TypeIdMap;

use crate::error::{Cause, LengthFault, ScalarFault};

use super::tracker::{ValidationError, ValidationKind};

type Handler = Box<dyn Fn(&Cause, &str) -> ValidationError + Send + Sync>;

// -----------------------------------------------------------------------------
// FailureMap

/// Classifies failures thrown by user mapping code.
///
/// A converter or factory reports errors as its own types; this map decides,
/// per error type, how such a failure becomes a positioned validation error.
/// A failure with no mapping cannot be classified as a data problem and
/// aborts the call as a
/// [`FatalError::UnrecognizedFailure`](crate::error::FatalError).
///
/// The default map covers the engine's own fault types, so the built-in
/// converters report bad digits as invalid data out of the box.
pub struct FailureMap {
    table: TypeIdMap<Handler>,
}

impl FailureMap {
    /// An empty map; even the built-in fault types are unrecognized.
    pub fn empty() -> Self {
        Self {
            table: TypeIdMap::default(),
        }
    }

    /// Maps `E` through an arbitrary classification function.
    pub fn map<E, F>(&mut self, classify: F) -> &mut Self
    where
        E: Error + Send + Sync + 'static,
        F: Fn(&E, &str) -> ValidationError + Send + Sync + 'static,
    {
        self.table.insert(
            TypeId::of::<E>(),
            Box::new(move |cause, position| match cause.downcast_ref::<E>() {
                Some(err) => classify(err, position),
                // Unreachable: the table is keyed by the cause's type id.
                None => ValidationError::new(
                    position,
                    ValidationKind::Domain {
                        cause_type: cause.type_path(),
                        detail: cause.message().to_string(),
                    },
                ),
            }),
        );
        self
    }

    /// Maps `E` to a format error carrying its rendered message.
    pub fn map_to_format<E: Error + Send + Sync + 'static>(&mut self) -> &mut Self {
        self.map::<E, _>(|err, position| {
            ValidationError::new(
                position,
                ValidationKind::Format {
                    detail: err.to_string(),
                },
            )
        })
    }

    /// Maps `E` to a domain error carrying its type and rendered message.
    pub fn map_to_domain<E: Error + Send + Sync + 'static>(&mut self) -> &mut Self {
        self.map::<E, _>(|err, position| {
            ValidationError::new(
                position,
                ValidationKind::Domain {
                    cause_type: type_name::<E>(),
                    detail: err.to_string(),
                },
            )
        })
    }

    /// Classifies a cause, if a mapping for its type exists.
    pub(crate) fn apply(&self, cause: &Cause, position: &str) -> Option<ValidationError> {
        self.table
            .get(&cause.type_id())
            .map(|handler| handler(cause, position))
    }
}

impl Default for FailureMap {
    /// The engine's own fault types, mapped to format errors.
    fn default() -> Self {
        let mut map = Self::empty();
        map.map_to_format::<ScalarFault>();
        map.map_to_format::<LengthFault>();
        map
    }
}

impl fmt::Debug for FailureMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FailureMap")
            .field("mappings", &self.table.len())
            .finish()
    }
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use super::FailureMap;
    use crate::de::tracker::{ValidationError, ValidationKind};
    use crate::error::{Cause, ScalarFault};

    #[derive(Debug, thiserror::Error)]
    #[error("age must be positive")]
    struct AgeError;

    #[test]
    fn the_default_map_recognizes_scalar_faults() {
        let map = FailureMap::default();
        let cause = Cause::new(ScalarFault::new("not a number"));
        let error = map.apply(&cause, "user.age").unwrap();
        assert_eq!(error.position(), "user.age");
        assert!(matches!(error.kind(), ValidationKind::Format { .. }));
    }

    #[test]
    fn unmapped_causes_stay_unclassified() {
        let map = FailureMap::default();
        let cause = Cause::new(AgeError);
        assert!(map.apply(&cause, "user.age").is_none());
    }

    #[test]
    fn custom_mappings_see_the_typed_error() {
        let mut map = FailureMap::empty();
        map.map::<AgeError, _>(|err, position| {
            ValidationError::new(
                position,
                ValidationKind::Domain {
                    cause_type: "AgeError",
                    detail: err.to_string(),
                },
            )
        });
        let error = map.apply(&Cause::new(AgeError), "age").unwrap();
        assert_eq!(error.to_string(), "age: age must be positive (AgeError)");
    }
}
