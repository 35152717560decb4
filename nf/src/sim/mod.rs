//! Simulation: an in-memory host and a scenario runner
//!
//! [`MemoryHost`] stands in for a platform navigation stack, including the
//! user gestures that bypass coordinators. [`Simulator`] plays YAML
//! [`Scenario`] scripts against a coordinator tree built on it.

pub mod embedded;
mod memory_host;
mod runner;
mod scenario;

pub use memory_host::{HostCall, MemoryHost, TransitionRecord};
pub use runner::{Failure, RunReport, ScriptMeta, ScriptedFlow, ScriptedScreen, Simulator, StepReport, run_scenario};
pub use scenario::{APP_FLOW, Expectation, Scenario, ScenarioError, ScreenSpec, ScriptStep};
