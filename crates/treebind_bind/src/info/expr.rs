use core::fmt;

use super::resolved::ResolvedType;
use crate::descriptor::Describe;

// -----------------------------------------------------------------------------
// TypeExpr

/// A member type as declared by a descriptor: either concrete, or a variable
/// to be bound against the owner's generic arguments.
///
/// Concrete expressions carry a shape *thunk* rather than a shape, so a
/// recursive type's descriptor can mention the type itself without recursing
/// at construction time.
#[derive(Clone, Copy)]
pub enum TypeExpr {
    /// A concrete type, independent of the owner.
    Concrete(fn() -> ResolvedType),
    /// A reference to one of the owner's generic parameters, by name.
    Var(&'static str),
}

impl TypeExpr {
    /// The concrete type `T`.
    pub fn of<T: Describe>() -> Self {
        Self::Concrete(T::shape)
    }

    /// Resolves this expression against the owner's bound arguments.
    ///
    /// A variable is looked up positionally in the owner's parameter list;
    /// asking a type for a parameter it never declared is a configuration
    /// error, reported with both names.
    pub fn resolve(&self, owner: &ResolvedType) -> Result<ResolvedType, ResolveError> {
        match self {
            Self::Concrete(shape) => Ok(shape()),
            Self::Var(var) => match owner {
                ResolvedType::Class(class) => {
                    class
                        .arg(var)
                        .cloned()
                        .ok_or_else(|| ResolveError::UnboundVariable {
                            var,
                            owner: class.ty.path(),
                        })
                }
                ResolvedType::Array(array) => Err(ResolveError::VariableOnArray {
                    var,
                    owner: array.ty.path(),
                }),
            },
        }
    }
}

impl fmt::Debug for TypeExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Concrete(shape) => write!(f, "Concrete({})", shape()),
            Self::Var(var) => write!(f, "Var({var})"),
        }
    }
}

// -----------------------------------------------------------------------------
// ResolveError

/// A type variable that could not be bound.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResolveError {
    /// The owner does not declare the named parameter.
    #[error("type variable `{var}` is not declared by owner type `{owner}`")]
    UnboundVariable {
        var: &'static str,
        owner: &'static str,
    },

    /// Arrays bind no named parameters.
    #[error("type variable `{var}` cannot be bound against array type `{owner}`")]
    VariableOnArray {
        var: &'static str,
        owner: &'static str,
    },
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use super::{ResolveError, TypeExpr};
    use crate::info::ResolvedType;

    #[test]
    fn concrete_expressions_ignore_the_owner() {
        let owner = ResolvedType::plain::<i64>();
        let resolved = TypeExpr::of::<String>().resolve(&owner).unwrap();
        assert_eq!(resolved, ResolvedType::plain::<String>());
    }

    #[test]
    fn variables_bind_positionally() {
        struct Marker;
        let owner = ResolvedType::class::<Marker>(
            &["A", "B"],
            vec![ResolvedType::plain::<String>(), ResolvedType::plain::<i64>()],
        );
        assert_eq!(
            TypeExpr::Var("B").resolve(&owner).unwrap(),
            ResolvedType::plain::<i64>()
        );
    }

    #[test]
    fn unbound_variable_names_both_sides() {
        let owner = ResolvedType::plain::<i64>();
        let err = TypeExpr::Var("T").resolve(&owner).unwrap_err();
        assert_eq!(
            err,
            ResolveError::UnboundVariable {
                var: "T",
                owner: "i64",
            }
        );
    }
}
