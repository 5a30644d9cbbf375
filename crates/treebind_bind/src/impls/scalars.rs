//! Built-in scalar mappings for the primitive types.
//!
//! Integers map to the number kind through `i64`; unsigned values wider than
//! `i64` degrade to floats on the way out, matching what the value model can
//! carry. Decoding accepts any number whose value fits the target exactly.

use treebind_value::{Number, Scalar, ScalarKind};

use crate::descriptor::{Describe, TypeDescriptor};
use crate::error::ScalarFault;
use crate::info::ResolvedType;

fn int_from_scalar<T: TryFrom<i64>>(scalar: Scalar, what: &'static str) -> Result<T, ScalarFault> {
    let Scalar::Num(num) = scalar else {
        return Err(ScalarFault::new(format!("expected a number, got {scalar}")));
    };
    let Some(int) = num.as_i64() else {
        return Err(ScalarFault::new(format!("{num} is not an integer")));
    };
    T::try_from(int).map_err(|_| ScalarFault::new(format!("{int} is out of range for {what}")))
}

fn float_from_scalar(scalar: Scalar) -> Result<f64, ScalarFault> {
    match scalar {
        Scalar::Num(num) => Ok(num.as_f64()),
        other => Err(ScalarFault::new(format!("expected a number, got {other}"))),
    }
}

macro_rules! impl_describe_int {
    ($($ty:ty),* $(,)?) => {$(
        impl Describe for $ty {
            fn shape() -> ResolvedType {
                ResolvedType::plain::<Self>()
            }

            fn descriptor() -> TypeDescriptor {
                TypeDescriptor::describe::<Self>(&[])
                    .converter(
                        "int",
                        ScalarKind::Num,
                        |n: &$ty| Scalar::Num(Number::Int(i64::from(*n))),
                        |scalar| int_from_scalar::<$ty>(scalar, stringify!($ty)),
                    )
                    .finish()
            }
        }
    )*};
}

impl_describe_int!(i8, i16, i32, i64, u8, u16, u32);

macro_rules! impl_describe_wide_uint {
    ($($ty:ty),* $(,)?) => {$(
        impl Describe for $ty {
            fn shape() -> ResolvedType {
                ResolvedType::plain::<Self>()
            }

            fn descriptor() -> TypeDescriptor {
                TypeDescriptor::describe::<Self>(&[])
                    .converter(
                        "int",
                        ScalarKind::Num,
                        |n: &$ty| match i64::try_from(*n) {
                            Ok(int) => Scalar::Num(Number::Int(int)),
                            // Wider than the integer model: degrade to float.
                            Err(_) => Scalar::Num(Number::Float(*n as f64)),
                        },
                        |scalar| int_from_scalar::<$ty>(scalar, stringify!($ty)),
                    )
                    .finish()
            }
        }
    )*};
}

impl_describe_wide_uint!(u64, usize);

impl Describe for isize {
    fn shape() -> ResolvedType {
        ResolvedType::plain::<Self>()
    }

    fn descriptor() -> TypeDescriptor {
        TypeDescriptor::describe::<Self>(&[])
            .converter(
                "int",
                ScalarKind::Num,
                |n: &isize| Scalar::Num(Number::Int(*n as i64)),
                |scalar| int_from_scalar::<isize>(scalar, "isize"),
            )
            .finish()
    }
}

impl Describe for f64 {
    fn shape() -> ResolvedType {
        ResolvedType::plain::<Self>()
    }

    fn descriptor() -> TypeDescriptor {
        TypeDescriptor::describe::<Self>(&[])
            .converter(
                "float",
                ScalarKind::Num,
                |n: &f64| Scalar::Num(Number::Float(*n)),
                float_from_scalar,
            )
            .finish()
    }
}

impl Describe for f32 {
    fn shape() -> ResolvedType {
        ResolvedType::plain::<Self>()
    }

    fn descriptor() -> TypeDescriptor {
        TypeDescriptor::describe::<Self>(&[])
            .converter(
                "float",
                ScalarKind::Num,
                |n: &f32| Scalar::Num(Number::Float(f64::from(*n))),
                |scalar| float_from_scalar(scalar).map(|f| f as f32),
            )
            .finish()
    }
}

impl Describe for bool {
    fn shape() -> ResolvedType {
        ResolvedType::plain::<Self>()
    }

    fn descriptor() -> TypeDescriptor {
        TypeDescriptor::describe::<Self>(&[])
            .converter(
                "bool",
                ScalarKind::Bool,
                |b: &bool| Scalar::Bool(*b),
                |scalar| match scalar {
                    Scalar::Bool(b) => Ok(b),
                    other => Err(ScalarFault::new(format!("expected a boolean, got {other}"))),
                },
            )
            .finish()
    }
}

impl Describe for String {
    fn shape() -> ResolvedType {
        ResolvedType::plain::<Self>()
    }

    fn descriptor() -> TypeDescriptor {
        TypeDescriptor::describe::<Self>(&[])
            .converter(
                "string",
                ScalarKind::Str,
                |s: &String| Scalar::Str(s.clone()),
                |scalar| match scalar {
                    Scalar::Str(s) => Ok(s),
                    other => Err(ScalarFault::new(format!("expected a string, got {other}"))),
                },
            )
            .finish()
    }
}

impl Describe for char {
    fn shape() -> ResolvedType {
        ResolvedType::plain::<Self>()
    }

    fn descriptor() -> TypeDescriptor {
        TypeDescriptor::describe::<Self>(&[])
            .converter(
                "char",
                ScalarKind::Str,
                |c: &char| Scalar::Str(c.to_string()),
                |scalar| {
                    let Scalar::Str(s) = scalar else {
                        return Err(ScalarFault::new("expected a one-character string"));
                    };
                    let mut chars = s.chars();
                    match (chars.next(), chars.next()) {
                        (Some(c), None) => Ok(c),
                        _ => Err(ScalarFault::new(format!(
                            "expected a one-character string, got {s:?}"
                        ))),
                    }
                },
            )
            .finish()
    }
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use super::int_from_scalar;
    use treebind_value::{Number, Scalar};

    #[test]
    fn whole_floats_decode_as_integers() {
        assert_eq!(
            int_from_scalar::<i64>(Scalar::Num(Number::Float(42.0)), "i64"),
            Ok(42)
        );
        assert!(int_from_scalar::<i64>(Scalar::Num(Number::Float(42.5)), "i64").is_err());
    }

    #[test]
    fn out_of_range_integers_are_faults() {
        assert!(int_from_scalar::<u8>(Scalar::Num(Number::Int(300)), "u8").is_err());
        assert!(int_from_scalar::<u8>(Scalar::Num(Number::Int(-1)), "u8").is_err());
        assert_eq!(
            int_from_scalar::<u8>(Scalar::Num(Number::Int(255)), "u8"),
            Ok(255)
        );
    }
}
