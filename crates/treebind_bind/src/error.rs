//! Errors raised while building, serializing against, or deserializing
//! against a registry.
//!
//! The engine keeps two families strictly apart:
//!
//! - *setup and configuration* errors ([`BuildError`], [`ConfigError`]) mean
//!   the mapping itself is broken and abort the call that hit them;
//! - *data* errors never surface here at all; they are collected as
//!   validation errors by the deserializer (see [`crate::de`]).
//!
//! [`Cause`] sits between the two: a type-erased failure thrown by user code
//! (a converter, a factory) that the failure map later classifies one way or
//! the other.

use core::any::{Any, TypeId};
use core::error::Error;
use core::fmt;

use crate::info::{ResolveError, Type};

// -----------------------------------------------------------------------------
// Cause

/// A type-erased failure raised by user-supplied mapping code.
///
/// Converters, accessors and factories report errors as their own types; the
/// engine carries them opaquely as a `Cause` until a failure mapping decides
/// whether they describe bad data or a broken setup. The original error stays
/// downcastable the whole way.
pub struct Cause {
    ty: Type,
    message: String,
    inner: Box<dyn Any + Send + Sync>,
}

impl Cause {
    /// Erases a concrete error.
    pub fn new<E: Error + Send + Sync + 'static>(err: E) -> Self {
        Self {
            ty: Type::of::<E>(),
            message: err.to_string(),
            inner: Box::new(err),
        }
    }

    /// A failure produced by the engine itself, with no user error behind it.
    pub(crate) fn internal(detail: impl Into<String>) -> Self {
        Self {
            ty: Type::of::<InternalFault>(),
            message: detail.into(),
            inner: Box::new(InternalFault),
        }
    }

    /// The [`TypeId`] of the erased error.
    #[inline]
    pub fn type_id(&self) -> TypeId {
        self.ty.id()
    }

    /// The full path of the erased error type.
    #[inline]
    pub fn type_path(&self) -> &'static str {
        self.ty.path()
    }

    /// The rendered message of the erased error.
    #[inline]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Borrows the original error if it is an `E`.
    pub fn downcast_ref<E: 'static>(&self) -> Option<&E> {
        self.inner.downcast_ref::<E>()
    }

    /// Whether this failure came from the engine rather than user code.
    pub(crate) fn is_internal(&self) -> bool {
        self.ty.id() == TypeId::of::<InternalFault>()
    }
}

impl fmt::Debug for Cause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cause")
            .field("type", &self.ty.path())
            .field("message", &self.message)
            .finish()
    }
}

impl fmt::Display for Cause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.ty.name(), self.message)
    }
}

/// Marker behind [`Cause::internal`].
#[derive(Debug)]
struct InternalFault;

// -----------------------------------------------------------------------------
// ScalarFault

/// The failure raised by the built-in scalar converters.
///
/// Mapped to a format validation error by the default failure map, so a bad
/// digit string is reported as invalid data rather than aborting the call.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{detail}")]
pub struct ScalarFault {
    pub detail: String,
}

impl ScalarFault {
    pub fn new(detail: impl Into<String>) -> Self {
        Self {
            detail: detail.into(),
        }
    }
}

// -----------------------------------------------------------------------------
// LengthFault

/// A fixed-size container that received the wrong number of elements.
///
/// Raised by sequence builders at finish time and recorded as a validation
/// error; the input's length is data, not configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("expected exactly {expected} element(s), got {actual}")]
pub struct LengthFault {
    pub expected: usize,
    pub actual: usize,
}

// -----------------------------------------------------------------------------
// BuildError

/// Errors raised while registering a type.
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    /// Every detector passed on the type's descriptor.
    #[error("no mapping strategy detected for type `{type_path}`")]
    Undetectable { type_path: &'static str },

    /// One detection rule matched several equally plausible candidates.
    ///
    /// The message names every candidate so the offending declaration can be
    /// found without re-running detection.
    #[error("ambiguous {what} for type `{type_path}`: {candidates:?}")]
    Ambiguous {
        type_path: &'static str,
        what: &'static str,
        candidates: Vec<&'static str>,
    },

    /// A descriptor that cannot mean anything, however it is detected.
    #[error("malformed descriptor for type `{type_path}`: {detail}")]
    Malformed {
        type_path: &'static str,
        detail: String,
    },
}

// -----------------------------------------------------------------------------
// ConfigError

/// Errors that mean the mapping configuration is broken.
///
/// These abort the whole serialize or deserialize call; they are never
/// aggregated with data validation errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The traversal reached a type nobody registered.
    #[error("type `{type_path}` was reached during mapping but is not registered")]
    UnknownType { type_path: String },

    /// A type variable could not be bound. See [`ResolveError`].
    #[error(transparent)]
    Unresolved(#[from] ResolveError),

    /// An injected value does not have the type the position requires.
    #[error("injected value at `{position}` has type `{found}` but `{expected}` is required")]
    InjectionMismatch {
        position: String,
        expected: &'static str,
        found: &'static str,
    },
}

// -----------------------------------------------------------------------------
// SerializeError

/// Errors aborting a serialize call.
#[derive(Debug, thiserror::Error)]
pub enum SerializeError {
    /// The same instance was reached again on the active traversal path.
    #[error("circular reference detected while serializing `{type_path}`")]
    CircularReference { type_path: &'static str },

    /// A custom scalar encoder failed.
    #[error("converter for `{type_path}` failed to encode: {cause}")]
    Encode {
        type_path: &'static str,
        cause: Cause,
    },

    /// A field accessor failed.
    #[error("accessor `{field}` of `{type_path}` failed: {cause}")]
    Access {
        type_path: &'static str,
        field: &'static str,
        cause: Cause,
    },

    /// A transparent wrapper could not expose its inner value, e.g. an
    /// already mutably borrowed cell.
    #[error("wrapper `{type_path}` failed to expose its inner value: {cause}")]
    Deref {
        type_path: &'static str,
        cause: Cause,
    },

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl From<ResolveError> for SerializeError {
    fn from(err: ResolveError) -> Self {
        Self::Config(err.into())
    }
}

// -----------------------------------------------------------------------------
// FatalError

/// Errors aborting a deserialize call.
///
/// Everything here means the *setup* is wrong; data problems are aggregated
/// in the call's [`Report`](crate::de::Report) instead.
#[derive(Debug, thiserror::Error)]
pub enum FatalError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// User code threw a failure no mapping recognizes.
    ///
    /// An unrecognized failure cannot be classified as a data error, so it is
    /// treated as a bug in the mapping setup.
    #[error(
        "no failure mapping registered for `{}` raised at `{position}`: {}",
        cause.type_path(),
        cause.message()
    )]
    UnrecognizedFailure { position: String, cause: Cause },

    /// The engine contradicted itself; a bug in a definition or the driver.
    #[error("internal mapping fault at `{position}`: {detail}")]
    Internal { position: String, detail: String },
}

impl From<ResolveError> for FatalError {
    fn from(err: ResolveError) -> Self {
        Self::Config(err.into())
    }
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use super::{Cause, ScalarFault};

    #[test]
    fn cause_keeps_the_original_error_downcastable() {
        let cause = Cause::new(ScalarFault::new("not a number"));
        assert_eq!(
            cause.downcast_ref::<ScalarFault>(),
            Some(&ScalarFault::new("not a number"))
        );
        assert_eq!(cause.message(), "not a number");
        assert!(!cause.is_internal());
    }

    #[test]
    fn internal_cause_is_flagged() {
        let cause = Cause::internal("builder state out of sync");
        assert!(cause.is_internal());
        assert!(cause.downcast_ref::<ScalarFault>().is_none());
    }
}
