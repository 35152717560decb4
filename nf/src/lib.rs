//! navflow - coordinator-pattern navigation engine
//!
//! A tree of coordinators owns one shared screen stack. Each navigation
//! coordinator remembers which screens it pushed and presented, notices when
//! user gestures (swipe-back, pull-to-dismiss) take screens away behind its
//! back, and finishes on its own once nothing it owns is left on screen.
//!
//! # Core Concepts
//!
//! - **Flow**: a concrete coordinator, plugged in through the [`Flow`] trait
//! - **Tracked stack**: a flow's own belief about which screens are its own
//! - **Host**: the platform object that owns the real stack ([`host::ScreenStackHost`])
//! - **Reconciliation**: folding host reports back into tracked state
//!
//! # Modules
//!
//! - [`coordinator`] - Coordinator base, children and type-erased references
//! - [`navigation`] - Navigation commands and the tracked-stack state machine
//! - [`host`] - Host contract, screens, host reports and their delivery
//! - [`app`] - Root flow
//! - [`sim`] - In-memory host and scenario simulator
//! - [`config`] - Configuration types and loading
//! - [`cli`] - Command-line interface
//!
//! # Example
//!
//! ```
//! use navflow::host::{ScreenHandle, Screen, pump};
//! use navflow::navigation::{NavOptions, NavigationAction};
//! use navflow::sim::MemoryHost;
//! use navflow::{AppCoordinator, Flow, SharedHost};
//!
//! #[derive(Debug)]
//! struct Home;
//! impl Screen for Home {}
//!
//! let memory = MemoryHost::shared();
//! let host: SharedHost = memory.clone();
//! let app = AppCoordinator::launch(host.clone());
//! app.borrow_mut()
//!     .navigate(NavigationAction::Push(ScreenHandle::new(Home)), NavOptions::default());
//! pump(&host);
//!
//! assert_eq!(app.borrow_mut().navigation().unwrap().stack().len(), 1);
//! ```

pub mod app;
pub mod cli;
pub mod config;
pub mod coordinator;
pub mod flow;
pub mod host;
pub mod navigation;
pub mod sim;

// Re-export commonly used types
pub use app::{AppCoordinator, AppMeta};
pub use config::Config;
pub use coordinator::{AnyCoordinator, Coordinator, CoordinatorKey, MetaKey, WeakCoordinator};
pub use flow::{Flow, FlowHandle};
pub use host::{HostEvent, Screen, ScreenHandle, ScreenKind, ScreenStackHost, SharedHost, Transition};
pub use navigation::{NavOptions, NavigationAction, NavigationCoordinator, Step};
