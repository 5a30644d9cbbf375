#![doc = include_str!("../README.md")]

extern crate alloc;

// -----------------------------------------------------------------------------
// Modules

pub mod codec;
pub mod hash;

mod serde;
mod value;

// -----------------------------------------------------------------------------
// Top-Level exports

pub use value::{Number, Scalar, ScalarKind, Value, ValueMap, ValueShape};
