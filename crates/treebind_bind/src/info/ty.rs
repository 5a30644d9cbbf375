use core::any::{TypeId, type_name};
use core::fmt;
use core::hash::{Hash, Hasher};

// -----------------------------------------------------------------------------
// Type

/// The identity of a Rust type: its [`TypeId`] paired with its path.
///
/// Equality and hashing go through the id only; the path is carried for
/// diagnostics.
#[derive(Clone, Copy, Debug, Eq)]
pub struct Type {
    id: TypeId,
    path: &'static str,
}

impl Type {
    /// The identity of `T`.
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            path: type_name::<T>(),
        }
    }

    #[inline]
    pub fn id(&self) -> TypeId {
        self.id
    }

    /// The full path, e.g. `alloc::string::String`.
    #[inline]
    pub fn path(&self) -> &'static str {
        self.path
    }

    /// The path with leading module segments stripped, e.g. `String`.
    #[inline]
    pub fn name(&self) -> &'static str {
        short_name(self.path)
    }
}

impl PartialEq for Type {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Hash for Type {
    #[inline]
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path)
    }
}

/// Strips module segments from a type path, leaving generic arguments alone.
///
/// Only `::` separators outside angle brackets are considered, so
/// `alloc::vec::Vec<alloc::string::String>` becomes
/// `Vec<alloc::string::String>`.
pub(crate) fn short_name(path: &'static str) -> &'static str {
    let bytes = path.as_bytes();
    let mut depth = 0usize;
    let mut start = 0;
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'<' | b'(' | b'[' => depth += 1,
            b'>' | b')' | b']' => depth = depth.saturating_sub(1),
            b':' if depth == 0 && bytes.get(i + 1) == Some(&b':') => {
                start = i + 2;
                i += 1;
            }
            _ => {}
        }
        i += 1;
    }
    &path[start..]
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use super::{Type, short_name};

    #[test]
    fn identity_ignores_the_path() {
        assert_eq!(Type::of::<String>(), Type::of::<String>());
        assert_ne!(Type::of::<String>(), Type::of::<i64>());
    }

    #[test]
    fn short_names() {
        assert_eq!(short_name("i64"), "i64");
        assert_eq!(short_name("alloc::string::String"), "String");
        assert_eq!(
            short_name("alloc::vec::Vec<alloc::string::String>"),
            "Vec<alloc::string::String>"
        );
    }

    #[test]
    fn short_name_of_real_types() {
        assert_eq!(Type::of::<String>().name(), "String");
        assert!(Type::of::<Vec<String>>().name().starts_with("Vec<"));
    }
}
