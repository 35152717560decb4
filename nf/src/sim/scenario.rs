//! Scripted navigation scenarios
//!
//! A scenario is a YAML list of steps: navigation commands, user gestures,
//! child-flow lifecycle events and expectations about the resulting state.
//!
//! ```yaml
//! name: swipe-back
//! steps:
//!   - op: push
//!     screen: A
//!   - op: swipe-back
//!   - op: expect
//!     stack: [A]
//! ```

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::host::Transition;

/// Name under which the root flow is addressed in expectations
pub const APP_FLOW: &str = "app";

/// Errors from loading, checking or running a scenario
#[derive(Debug, Error)]
pub enum ScenarioError {
    #[error("Failed to read scenario {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse scenario: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("Invalid step {step}: {reason}")]
    Invalid { step: usize, reason: String },

    #[error("Expectation failed at step {step}: {message}")]
    Expectation { step: usize, message: String },
}

/// A screen in a scenario: a bare name, or a name with an explicit kind
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ScreenSpec {
    Name(String),
    Detailed { name: String, kind: Option<String> },
}

impl ScreenSpec {
    pub fn name(&self) -> &str {
        match self {
            Self::Name(name) | Self::Detailed { name, .. } => name,
        }
    }

    /// Kind used for `pop-to` matching; defaults to the name
    pub fn kind(&self) -> &str {
        match self {
            Self::Detailed { kind: Some(kind), .. } => kind,
            _ => self.name(),
        }
    }
}

/// State a scenario expects at one point
///
/// Every field is optional; only the given ones are checked.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct Expectation {
    /// Flow to inspect; defaults to the current flow
    pub flow: Option<String>,
    pub stack: Option<Vec<String>>,
    pub modals: Option<Vec<String>>,
    pub host_stack: Option<Vec<String>>,
    pub host_modals: Option<Vec<String>>,
    pub finished: Option<bool>,
    pub finish_count: Option<usize>,
    pub children: Option<usize>,
}

impl Expectation {
    /// Whether nothing would be checked
    pub fn is_empty(&self) -> bool {
        self.stack.is_none()
            && self.modals.is_none()
            && self.host_stack.is_none()
            && self.host_modals.is_none()
            && self.finished.is_none()
            && self.finish_count.is_none()
            && self.children.is_none()
    }
}

/// One scripted step
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "kebab-case")]
pub enum ScriptStep {
    Push {
        screen: ScreenSpec,
        #[serde(default)]
        animated: Option<bool>,
        #[serde(default)]
        transition: Option<Transition>,
    },
    Present {
        screen: ScreenSpec,
        #[serde(default)]
        animated: Option<bool>,
    },
    Pop {
        #[serde(default)]
        animated: Option<bool>,
        #[serde(default)]
        transition: Option<Transition>,
    },
    PopTo {
        kind: String,
        #[serde(default)]
        animated: Option<bool>,
        #[serde(default)]
        transition: Option<Transition>,
    },
    Set {
        screens: Vec<ScreenSpec>,
        #[serde(default)]
        animated: Option<bool>,
    },
    Root {
        #[serde(default)]
        animated: Option<bool>,
        #[serde(default)]
        transition: Option<Transition>,
    },
    DismissTop {
        #[serde(default)]
        animated: Option<bool>,
    },
    DismissAll {
        #[serde(default)]
        animated: Option<bool>,
    },
    /// User swipes back on the host
    SwipeBack,
    /// User pulls the top presented screen down
    PullToDismiss,
    /// Start a child flow under the current flow; it becomes current
    StartChild { name: String },
    /// Finish the current flow explicitly
    Finish,
    /// Deliver every queued host report
    Pump,
    Expect(Expectation),
}

impl ScriptStep {
    /// Step name as written in YAML
    pub fn op(&self) -> &'static str {
        match self {
            Self::Push { .. } => "push",
            Self::Present { .. } => "present",
            Self::Pop { .. } => "pop",
            Self::PopTo { .. } => "pop-to",
            Self::Set { .. } => "set",
            Self::Root { .. } => "root",
            Self::DismissTop { .. } => "dismiss-top",
            Self::DismissAll { .. } => "dismiss-all",
            Self::SwipeBack => "swipe-back",
            Self::PullToDismiss => "pull-to-dismiss",
            Self::StartChild { .. } => "start-child",
            Self::Finish => "finish",
            Self::Pump => "pump",
            Self::Expect(_) => "expect",
        }
    }
}

/// A named list of steps
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub steps: Vec<ScriptStep>,
}

impl Scenario {
    /// Read and parse a scenario file
    pub fn load(path: &Path) -> Result<Self, ScenarioError> {
        debug!(?path, "Scenario::load: called");
        let content = fs::read_to_string(path).map_err(|source| ScenarioError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml(&content)
    }

    pub fn from_yaml(content: &str) -> Result<Self, ScenarioError> {
        let scenario: Self = serde_yaml::from_str(content)?;
        debug!(name = %scenario.name, steps = scenario.steps.len(), "Scenario::from_yaml: parsed");
        Ok(scenario)
    }

    /// Static checks that need no host
    ///
    /// Step numbers in errors are 1-based. Step 0 refers to the scenario
    /// itself.
    pub fn validate(&self) -> Result<(), ScenarioError> {
        if self.name.trim().is_empty() {
            return Err(invalid(0, "scenario name is empty"));
        }
        if self.steps.is_empty() {
            return Err(invalid(0, "scenario has no steps"));
        }

        let mut flows: HashSet<&str> = HashSet::from([APP_FLOW]);
        for (index, step) in self.steps.iter().enumerate() {
            let number = index + 1;
            match step {
                ScriptStep::Push { screen, .. } | ScriptStep::Present { screen, .. } => check_screen(number, screen)?,
                ScriptStep::Set { screens, .. } => {
                    for screen in screens {
                        check_screen(number, screen)?;
                    }
                }
                ScriptStep::PopTo { kind, .. } if kind.trim().is_empty() => {
                    return Err(invalid(number, "pop-to needs a kind"));
                }
                ScriptStep::StartChild { name } => {
                    if name.trim().is_empty() {
                        return Err(invalid(number, "start-child needs a name"));
                    }
                    if !flows.insert(name.as_str()) {
                        return Err(invalid(number, format!("flow '{}' already started", name)));
                    }
                }
                ScriptStep::Expect(expectation) => {
                    if expectation.is_empty() {
                        return Err(invalid(number, "expect checks nothing"));
                    }
                    if let Some(flow) = &expectation.flow
                        && !flows.contains(flow.as_str())
                    {
                        return Err(invalid(number, format!("unknown flow '{}'", flow)));
                    }
                }
                _ => {}
            }
        }

        debug!(name = %self.name, "Scenario::validate: ok");
        Ok(())
    }
}

fn invalid(step: usize, reason: impl Into<String>) -> ScenarioError {
    ScenarioError::Invalid {
        step,
        reason: reason.into(),
    }
}

fn check_screen(step: usize, screen: &ScreenSpec) -> Result<(), ScenarioError> {
    if screen.name().trim().is_empty() {
        return Err(invalid(step, "screen name is empty"));
    }
    if screen.kind().trim().is_empty() {
        return Err(invalid(step, "screen kind is empty"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const SAMPLE: &str = r#"
name: sample
description: one of everything
steps:
  - op: push
    screen: A
  - op: push
    screen: { name: B, kind: detail }
    animated: false
    transition: fade
  - op: present
    screen: X
  - op: pop-to
    kind: A
  - op: set
    screens: [A, B]
  - op: swipe-back
  - op: pull-to-dismiss
  - op: start-child
    name: settings
  - op: pump
  - op: expect
    flow: settings
    stack: []
    host-stack: [A]
    finish-count: 0
  - op: finish
"#;

    #[test]
    fn test_parse_every_kind_of_step() {
        let scenario = Scenario::from_yaml(SAMPLE).unwrap();
        assert_eq!(scenario.name, "sample");
        assert_eq!(scenario.steps.len(), 11);

        match &scenario.steps[1] {
            ScriptStep::Push {
                screen,
                animated,
                transition,
            } => {
                assert_eq!(screen.name(), "B");
                assert_eq!(screen.kind(), "detail");
                assert_eq!(*animated, Some(false));
                assert_eq!(*transition, Some(Transition::Fade));
            }
            other => panic!("unexpected step {:?}", other),
        }

        match &scenario.steps[9] {
            ScriptStep::Expect(expectation) => {
                assert_eq!(expectation.flow.as_deref(), Some("settings"));
                assert_eq!(expectation.stack, Some(vec![]));
                assert_eq!(expectation.host_stack, Some(vec!["A".to_string()]));
                assert_eq!(expectation.finish_count, Some(0));
                assert!(expectation.modals.is_none());
            }
            other => panic!("unexpected step {:?}", other),
        }

        assert_eq!(scenario.steps[10], ScriptStep::Finish);
        scenario.validate().unwrap();
    }

    #[test]
    fn test_screen_kind_defaults_to_name() {
        let spec = ScreenSpec::Name("Login".to_string());
        assert_eq!(spec.kind(), "Login");
        let spec = ScreenSpec::Detailed {
            name: "Login".to_string(),
            kind: None,
        };
        assert_eq!(spec.kind(), "Login");
    }

    #[test]
    fn test_unknown_op_is_a_parse_error() {
        let err = Scenario::from_yaml("name: x\nsteps:\n  - op: teleport\n").unwrap_err();
        assert!(matches!(err, ScenarioError::Parse(_)));
    }

    #[test]
    fn test_validate_rejects_empty_expect() {
        let scenario = Scenario::from_yaml("name: x\nsteps:\n  - op: expect\n").unwrap();
        let err = scenario.validate().unwrap_err();
        assert!(matches!(err, ScenarioError::Invalid { step: 1, .. }));
    }

    #[test]
    fn test_validate_rejects_unknown_flow() {
        let yaml = "name: x\nsteps:\n  - op: expect\n    flow: ghost\n    finished: false\n";
        let err = Scenario::from_yaml(yaml).unwrap().validate().unwrap_err();
        assert!(err.to_string().contains("ghost"));
    }

    #[test]
    fn test_validate_rejects_duplicate_child() {
        let yaml = "name: x\nsteps:\n  - op: start-child\n    name: a\n  - op: start-child\n    name: a\n";
        let err = Scenario::from_yaml(yaml).unwrap().validate().unwrap_err();
        assert!(matches!(err, ScenarioError::Invalid { step: 2, .. }));
    }

    #[test]
    fn test_validate_rejects_empty_names() {
        let yaml = "name: ''\nsteps:\n  - op: pump\n";
        assert!(Scenario::from_yaml(yaml).unwrap().validate().is_err());

        let yaml = "name: x\nsteps:\n  - op: pop-to\n    kind: ' '\n";
        assert!(Scenario::from_yaml(yaml).unwrap().validate().is_err());

        let yaml = "name: x\nsteps: []\n";
        assert!(Scenario::from_yaml(yaml).unwrap().validate().is_err());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();
        let scenario = Scenario::load(file.path()).unwrap();
        assert_eq!(scenario.name, "sample");
    }

    #[test]
    fn test_load_missing_file() {
        let err = Scenario::load(Path::new("/nonexistent/scenario.yml")).unwrap_err();
        assert!(matches!(err, ScenarioError::Io { .. }));
        assert!(err.to_string().contains("/nonexistent/scenario.yml"));
    }
}
