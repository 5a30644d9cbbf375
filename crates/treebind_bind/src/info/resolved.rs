use core::any::TypeId;
use core::fmt;

use super::ty::Type;

// -----------------------------------------------------------------------------
// ResolvedType

/// A fully concrete type: every generic argument bound, no free variables.
///
/// This is the currency of the traversal. A serialize or deserialize call
/// starts from the root's resolved type and derives each member's resolved
/// type from it, so `Vec<Pair<String, i64>>` knows down to the leaf what its
/// elements are.
#[derive(Clone, Debug, PartialEq)]
pub enum ResolvedType {
    /// A nominal type with zero or more bound generic arguments.
    Class(ClassType),
    /// A fixed-size array; element type boxed, one dimension per level.
    Array(ArrayType),
}

impl ResolvedType {
    /// A type without generic parameters.
    pub fn plain<T: 'static>() -> Self {
        Self::Class(ClassType::new(Type::of::<T>(), &[], Vec::new()))
    }

    /// A generic type with its parameter names and bound arguments.
    ///
    /// # Panics
    ///
    /// Panics if `params` and `args` differ in length; a descriptor that
    /// declares two parameters but binds three is a programming error.
    pub fn class<T: 'static>(params: &'static [&'static str], args: Vec<ResolvedType>) -> Self {
        Self::Class(ClassType::new(Type::of::<T>(), params, args))
    }

    /// A fixed-size array of `elem`.
    pub fn array<T: 'static>(elem: ResolvedType) -> Self {
        Self::Array(ArrayType {
            ty: Type::of::<T>(),
            elem: Box::new(elem),
        })
    }

    /// The identity of the outermost type.
    #[inline]
    pub fn ty(&self) -> &Type {
        match self {
            Self::Class(class) => &class.ty,
            Self::Array(array) => &array.ty,
        }
    }

    #[inline]
    pub fn id(&self) -> TypeId {
        self.ty().id()
    }

    #[inline]
    pub fn path(&self) -> &'static str {
        self.ty().path()
    }
}

impl fmt::Display for ResolvedType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Class(class) => {
                // `type_name` bakes generic arguments into the path already;
                // keep only the base name and render the resolved args.
                let name = class.ty.name();
                let base = name.split('<').next().unwrap_or(name);
                f.write_str(base)?;
                if !class.args.is_empty() {
                    f.write_str("<")?;
                    for (i, arg) in class.args.iter().enumerate() {
                        if i > 0 {
                            f.write_str(", ")?;
                        }
                        write!(f, "{arg}")?;
                    }
                    f.write_str(">")?;
                }
                Ok(())
            }
            Self::Array(array) => write!(f, "[{}]", array.elem),
        }
    }
}

// -----------------------------------------------------------------------------
// ClassType

/// A nominal type with its generic parameter names and bound arguments.
///
/// `params` and `args` correspond positionally: for `Pair<String, i64>`,
/// `params` is `["A", "B"]` and `args` is the resolved `String` and `i64`.
#[derive(Clone, Debug)]
pub struct ClassType {
    pub(crate) ty: Type,
    pub(crate) params: &'static [&'static str],
    pub(crate) args: Vec<ResolvedType>,
}

impl ClassType {
    pub fn new(ty: Type, params: &'static [&'static str], args: Vec<ResolvedType>) -> Self {
        assert_eq!(
            params.len(),
            args.len(),
            "type `{}` declares {} generic parameter(s) but {} argument(s) were bound",
            ty.path(),
            params.len(),
            args.len(),
        );
        Self { ty, params, args }
    }

    /// The argument bound to the parameter named `param`, if declared.
    pub fn arg(&self, param: &str) -> Option<&ResolvedType> {
        self.params
            .iter()
            .position(|p| *p == param)
            .map(|i| &self.args[i])
    }

    /// The declared generic parameter names, positionally matching
    /// [`args`](Self::args).
    #[inline]
    pub fn params(&self) -> &'static [&'static str] {
        self.params
    }

    #[inline]
    pub fn args(&self) -> &[ResolvedType] {
        &self.args
    }
}

impl PartialEq for ClassType {
    fn eq(&self, other: &Self) -> bool {
        self.ty == other.ty && self.args == other.args
    }
}

// -----------------------------------------------------------------------------
// ArrayType

/// A fixed-size array type and its element type.
///
/// Nested arrays resolve one dimension per level: `[[i64; 2]; 3]` is an
/// array whose element is itself an array of `i64`.
#[derive(Clone, Debug, PartialEq)]
pub struct ArrayType {
    pub(crate) ty: Type,
    pub(crate) elem: Box<ResolvedType>,
}

impl ArrayType {
    #[inline]
    pub fn elem(&self) -> &ResolvedType {
        &self.elem
    }
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use super::ResolvedType;

    #[test]
    fn positional_argument_lookup() {
        let pair = ResolvedType::class::<(String, i64)>(
            &["A", "B"],
            vec![ResolvedType::plain::<String>(), ResolvedType::plain::<i64>()],
        );
        let ResolvedType::Class(class) = &pair else {
            unreachable!()
        };
        assert_eq!(class.arg("A"), Some(&ResolvedType::plain::<String>()));
        assert_eq!(class.arg("B"), Some(&ResolvedType::plain::<i64>()));
        assert_eq!(class.arg("C"), None);
    }

    #[test]
    #[should_panic(expected = "generic parameter")]
    fn arity_mismatch_panics() {
        ResolvedType::class::<Vec<i64>>(&["T"], Vec::new());
    }

    #[test]
    fn display_is_compact() {
        let ty = ResolvedType::class::<Vec<String>>(
            &["T"],
            vec![ResolvedType::plain::<String>()],
        );
        assert_eq!(ty.to_string(), "Vec<String>");
    }
}
