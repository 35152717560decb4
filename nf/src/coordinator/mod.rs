//! Coordinator tree
//!
//! A [`Coordinator`] owns its children through type-erased
//! [`AnyCoordinator`] entries and points at its parent with a
//! [`WeakCoordinator`], so parent and child never keep each other alive.

mod base;
mod registry;

pub use base::{Coordinator, OnFinish};
pub use registry::{AnyCoordinator, CoordinatorKey, MetaKey, WeakCoordinator};
