//! Core ownership primitives
//!
//! Intrusive reference counting ([`Ref`]/[`WeakRef`]/[`RefCounted`]) backed by a
//! process-wide live-reference registry. Scene entities, mesh resources, and
//! render targets are shared through these handles; everything else in the
//! editor builds on top.

pub mod registry;

#[allow(unsafe_code)]
pub mod refcount;

pub use refcount::{AnyRef, Ref, RefCounted, RefCounter, WeakRef};
pub use registry::LiveRegistry;
