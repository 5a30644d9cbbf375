//! [`Describe`](crate::descriptor::Describe) implementations for the
//! standard library types the engine supports out of the box.

mod collections;
mod scalars;
mod wrappers;
