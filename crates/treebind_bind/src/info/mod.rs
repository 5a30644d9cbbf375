//! Type identity and generic type resolution.
//!
//! The traversal never works on bare [`TypeId`](core::any::TypeId)s: it
//! carries a [`ResolvedType`], a fully concrete type with every generic
//! argument bound. Descriptors declare member types as [`TypeExpr`]s, which
//! are either concrete or variables bound against the owner's arguments at
//! traversal time. This is how one descriptor for `Pair<A, B>` serves every
//! instantiation of it.

mod expr;
mod resolved;
mod ty;

pub use expr::{ResolveError, TypeExpr};
pub use resolved::{ArrayType, ClassType, ResolvedType};
pub use ty::Type;
