//! Stack-tracking navigation
//!
//! [`NavigationCoordinator`] issues commands to the shared host and keeps its
//! own view of which screens belong to it. The pure decision logic for host
//! reports lives in [`reconcile`].

mod action;
mod coordinator;
pub mod reconcile;

pub use action::{NavOptions, NavigationAction, Step};
pub use coordinator::NavigationCoordinator;
pub use reconcile::Reconciliation;
