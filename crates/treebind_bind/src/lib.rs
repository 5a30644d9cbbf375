#![doc = include_str!("../README.md")]

pub mod binder;
pub mod de;
pub mod descriptor;
pub mod error;
pub mod impls;
pub mod info;
pub mod registry;
pub mod ser;

pub use binder::{BindError, Binder};
pub use de::{Injector, Outcome, Report};
pub use descriptor::{Describe, TypeDescriptor};
pub use error::{BuildError, Cause, ConfigError, FatalError, SerializeError};

#[cfg(feature = "auto_register")]
pub use inventory;

#[cfg(feature = "auto_register")]
pub use binder::BindRegistration;
