use core::any::Any;
use core::cell::Ref;

use crate::error::Cause;

// -----------------------------------------------------------------------------
// FieldValue

/// An erased field value handed back by an accessor.
///
/// Accessors usually borrow straight out of the owner, but derived fields
/// produce owned values and interior-mutability wrappers hand out cell
/// guards. All three look the same to the serializer: something a `&dyn Any`
/// can be taken from for the duration of the visit.
pub enum FieldValue<'a> {
    Borrowed(&'a dyn Any),
    Owned(Box<dyn Any>),
    Guarded(Ref<'a, dyn Any>),
}

impl FieldValue<'_> {
    /// Borrows the erased value.
    pub fn get(&self) -> &dyn Any {
        match self {
            Self::Borrowed(value) => *value,
            Self::Owned(value) => value.as_ref(),
            Self::Guarded(guard) => &**guard,
        }
    }
}

/// An erased field accessor.
///
/// The input is the erased owner; a downcast failure inside is an engine
/// fault, everything else is the accessor's own error surfaced as a
/// [`Cause`].
pub type Getter =
    Box<dyn for<'a> Fn(&'a dyn Any) -> Result<FieldValue<'a>, Cause> + Send + Sync>;

/// Downcasts an erased owner inside an accessor or definition closure.
pub(crate) fn owner_ref<T: Any>(owner: &dyn Any) -> Result<&T, Cause> {
    owner.downcast_ref::<T>().ok_or_else(|| {
        Cause::internal(format!(
            "owner is not a `{}`",
            core::any::type_name::<T>()
        ))
    })
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use super::{FieldValue, owner_ref};
    use core::any::Any;
    use core::cell::RefCell;

    #[test]
    fn all_three_carriers_expose_the_value() {
        let s = String::from("x");
        assert!(FieldValue::Borrowed(&s).get().is::<String>());
        assert!(FieldValue::Owned(Box::new(7i64)).get().is::<i64>());

        let cell = RefCell::new(5u8);
        let guard = core::cell::Ref::map(cell.borrow(), |v| v as &dyn Any);
        assert!(FieldValue::Guarded(guard).get().is::<u8>());
    }

    #[test]
    fn owner_downcast_mismatch_is_internal() {
        let owner: &dyn Any = &3i32;
        assert!(owner_ref::<String>(owner).unwrap_err().message().contains("String"));
    }
}
