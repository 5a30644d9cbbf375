#![doc = include_str!("../README.md")]
#![cfg_attr(docsrs, feature(doc_cfg))]

pub use treebind_bind as bind;
pub use treebind_value as value;

pub use treebind_bind::{
    BindError, Binder, BuildError, Describe, Injector, Outcome, Report, TypeDescriptor,
};
pub use treebind_value::{Value, ValueShape};
