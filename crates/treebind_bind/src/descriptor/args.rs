use core::any::Any;

use crate::error::Cause;

// -----------------------------------------------------------------------------
// Args

/// The erased, positional arguments handed to a factory.
///
/// Each slot is taken at most once; the typed [`FactoryArgs`] tuples drain
/// them in declaration order.
pub struct Args {
    values: Vec<Option<Box<dyn Any>>>,
}

impl Args {
    pub(crate) fn new(values: Vec<Box<dyn Any>>) -> Self {
        Self {
            values: values.into_iter().map(Some).collect(),
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Takes the argument at `index` as an `A`.
    ///
    /// A missing slot or a type mismatch is an engine fault: the driver built
    /// these values from the factory's own parameter declarations.
    pub fn take<A: 'static>(&mut self, index: usize) -> Result<A, Cause> {
        self.values
            .get_mut(index)
            .and_then(Option::take)
            .and_then(|value| value.downcast::<A>().ok())
            .map(|value| *value)
            .ok_or_else(|| {
                Cause::internal(format!(
                    "factory argument {index} is missing or is not a `{}`",
                    core::any::type_name::<A>()
                ))
            })
    }
}

// -----------------------------------------------------------------------------
// FactoryArgs

/// A typed view of a factory's parameter list, implemented for tuples.
///
/// Lets factories be written as ordinary closures over typed tuples while the
/// registry stores them erased.
pub trait FactoryArgs: Sized {
    /// How many parameters the factory takes.
    const ARITY: usize;

    /// Drains `args` into the typed tuple, in declaration order.
    fn extract(args: &mut Args) -> Result<Self, Cause>;
}

macro_rules! impl_factory_args {
    ($arity:expr; $($ty:ident => $idx:expr),*) => {
        impl<$($ty: 'static),*> FactoryArgs for ($($ty,)*) {
            const ARITY: usize = $arity;

            #[allow(unused_variables)]
            fn extract(args: &mut Args) -> Result<Self, Cause> {
                Ok(($(args.take::<$ty>($idx)?,)*))
            }
        }
    };
}

impl_factory_args!(0;);
impl_factory_args!(1; A0 => 0);
impl_factory_args!(2; A0 => 0, A1 => 1);
impl_factory_args!(3; A0 => 0, A1 => 1, A2 => 2);
impl_factory_args!(4; A0 => 0, A1 => 1, A2 => 2, A3 => 3);
impl_factory_args!(5; A0 => 0, A1 => 1, A2 => 2, A3 => 3, A4 => 4);
impl_factory_args!(6; A0 => 0, A1 => 1, A2 => 2, A3 => 3, A4 => 4, A5 => 5);
impl_factory_args!(7; A0 => 0, A1 => 1, A2 => 2, A3 => 3, A4 => 4, A5 => 5, A6 => 6);
impl_factory_args!(8; A0 => 0, A1 => 1, A2 => 2, A3 => 3, A4 => 4, A5 => 5, A6 => 6, A7 => 7);

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use super::{Args, FactoryArgs};

    #[test]
    fn tuples_extract_in_order() {
        let mut args = Args::new(vec![Box::new(String::from("a")), Box::new(2i64)]);
        let (s, n) = <(String, i64)>::extract(&mut args).unwrap();
        assert_eq!((s.as_str(), n), ("a", 2));
    }

    #[test]
    fn type_mismatch_is_internal() {
        let mut args = Args::new(vec![Box::new(1u8)]);
        let err = <(String,)>::extract(&mut args).unwrap_err();
        assert!(err.message().contains("argument 0"));
    }

    #[test]
    fn slots_are_taken_once() {
        let mut args = Args::new(vec![Box::new(1i64)]);
        assert!(args.take::<i64>(0).is_ok());
        assert!(args.take::<i64>(0).is_err());
    }
}
