//! Embedded demo scenarios
//!
//! These are compiled into the binary from the .yml files in `scenarios/`.

use tracing::debug;

/// Back gestures against a single flow
pub const SWIPE_BACK: &str = include_str!("../../scenarios/swipe-back.yml");

/// A child flow that only presents modals
pub const MODAL_FLOW: &str = include_str!("../../scenarios/modal-flow.yml");

/// Child flows finishing and handing control back
pub const NESTED_FLOWS: &str = include_str!("../../scenarios/nested-flows.yml");

/// Names of every embedded scenario
pub const NAMES: &[&str] = &["swipe-back", "modal-flow", "nested-flows"];

/// Get the embedded scenario by name
pub fn get_embedded(name: &str) -> Option<&'static str> {
    debug!(%name, "get_embedded: called");
    match name {
        "swipe-back" => Some(SWIPE_BACK),
        "modal-flow" => Some(MODAL_FLOW),
        "nested-flows" => Some(NESTED_FLOWS),
        _ => {
            debug!("get_embedded: no match found");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::sim::{Scenario, run_scenario};

    #[test]
    fn test_get_embedded_known() {
        for name in NAMES {
            assert!(get_embedded(name).is_some(), "missing {}", name);
        }
    }

    #[test]
    fn test_get_embedded_unknown() {
        assert!(get_embedded("unknown-scenario").is_none());
    }

    #[test]
    fn test_embedded_names_match_content() {
        for name in NAMES {
            let scenario = Scenario::from_yaml(get_embedded(name).unwrap()).unwrap();
            assert_eq!(scenario.name, *name);
        }
    }

    #[test]
    fn test_embedded_scenarios_pass() {
        for name in NAMES {
            let scenario = Scenario::from_yaml(get_embedded(name).unwrap()).unwrap();
            let report = run_scenario(&scenario, &Config::default()).unwrap();
            assert!(report.passed(), "{}: {:?}", name, report.failures);
        }
    }
}
