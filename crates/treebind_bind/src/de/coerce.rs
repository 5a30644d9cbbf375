//! The fixed scalar coercion policy.
//!
//! Coercion is deliberately asymmetric and not configurable: strings parse
//! into numbers and booleans, but nothing converts *to* a string, and
//! numbers never become booleans. A format that quotes its numbers still
//! binds; sloppier conversions stay errors.

use treebind_value::{Number, Scalar, ScalarKind};

/// Coerces a scalar to the kind a converter expects.
///
/// Same-kind input passes through untouched. `Str` to `Num` parses as an
/// integer first and falls back to float; `Str` to `Bool` accepts exactly
/// `"true"` and `"false"`. Everything else is unsupported.
pub fn coerce(scalar: Scalar, want: ScalarKind) -> Result<Scalar, CoerceError> {
    if scalar.kind() == want {
        return Ok(scalar);
    }
    match (scalar, want) {
        (Scalar::Str(text), ScalarKind::Num) => {
            if let Ok(int) = text.parse::<i64>() {
                Ok(Scalar::Num(Number::Int(int)))
            } else if let Ok(float) = text.parse::<f64>() {
                Ok(Scalar::Num(Number::Float(float)))
            } else {
                Err(CoerceError::Unparseable {
                    text,
                    want: ScalarKind::Num,
                })
            }
        }
        (Scalar::Str(text), ScalarKind::Bool) => match text.as_str() {
            "true" => Ok(Scalar::Bool(true)),
            "false" => Ok(Scalar::Bool(false)),
            _ => Err(CoerceError::Unparseable {
                text,
                want: ScalarKind::Bool,
            }),
        },
        (scalar, want) => Err(CoerceError::Unsupported {
            from: scalar.kind(),
            to: want,
        }),
    }
}

/// A scalar that could not be coerced.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CoerceError {
    #[error("cannot parse {text:?} as a {want}")]
    Unparseable { text: String, want: ScalarKind },

    #[error("no coercion from {from} to {to}")]
    Unsupported { from: ScalarKind, to: ScalarKind },
}

// -----------------------------------------------------------------------------
// Tests
