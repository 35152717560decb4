//! Navigation commands and their options

use std::fmt;

use crate::host::{Completion, Operation, ScreenHandle, ScreenKind, Transition};

/// A command issued by a navigation coordinator to its host
#[derive(Debug, Clone)]
pub enum NavigationAction {
    /// Present a screen modally on top of everything
    Present(ScreenHandle),
    /// Push a screen on the stack
    Push(ScreenHandle),
    /// Pop back to the first tracked screen of a kind
    PopTo(ScreenKind),
    /// Replace the tracked stack and the host stack wholesale
    Set(Vec<ScreenHandle>),
    /// Dismiss the top-most presented screen
    DismissTop,
    /// Dismiss every presented screen
    DismissAll,
    /// Pop to the root of the host stack
    Root,
    /// Pop the top screen
    Pop,
}

impl NavigationAction {
    /// Short command name for logging
    pub fn name(&self) -> &'static str {
        match self {
            Self::Present(_) => "present",
            Self::Push(_) => "push",
            Self::PopTo(_) => "pop_to",
            Self::Set(_) => "set",
            Self::DismissTop => "dismiss_top",
            Self::DismissAll => "dismiss_all",
            Self::Root => "root",
            Self::Pop => "pop",
        }
    }

    /// Stack operation the host performs for this command
    ///
    /// Only push and pop family commands have one, and only they take a
    /// custom transition.
    pub fn operation(&self) -> Option<Operation> {
        match self {
            Self::Push(_) => Some(Operation::Push),
            Self::PopTo(_) | Self::Root | Self::Pop => Some(Operation::Pop),
            Self::Present(_) | Self::Set(_) | Self::DismissTop | Self::DismissAll => None,
        }
    }

    /// Whether a custom transition can apply to this command
    pub fn uses_transition(&self) -> bool {
        self.operation().is_some()
    }
}

impl fmt::Display for NavigationAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Present(screen) | Self::Push(screen) => write!(f, "{} {}", self.name(), screen),
            Self::PopTo(kind) => write!(f, "{} {}", self.name(), kind),
            Self::Set(screens) => {
                let names: Vec<&str> = screens.iter().map(|s| s.title()).collect();
                write!(f, "{} [{}]", self.name(), names.join(", "))
            }
            _ => write!(f, "{}", self.name()),
        }
    }
}

/// Options for a single navigation command
pub struct NavOptions {
    /// Animate the transition
    pub animated: bool,
    /// Custom transition for this push or pop only
    pub transition: Option<Transition>,
    /// Called once the host reports the transition visually complete
    pub completion: Option<Completion>,
}

impl NavOptions {
    /// Options for an animated transition
    pub fn animated() -> Self {
        Self::default()
    }

    /// Options for an instant transition
    pub fn instant() -> Self {
        Self {
            animated: false,
            ..Self::default()
        }
    }

    pub fn with_animated(mut self, animated: bool) -> Self {
        self.animated = animated;
        self
    }

    pub fn with_transition(mut self, transition: Transition) -> Self {
        self.transition = Some(transition);
        self
    }

    pub fn on_complete(mut self, completion: impl FnOnce() + 'static) -> Self {
        self.completion = Some(Box::new(completion));
        self
    }
}

impl Default for NavOptions {
    fn default() -> Self {
        Self {
            animated: true,
            transition: None,
            completion: None,
        }
    }
}

impl fmt::Debug for NavOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NavOptions")
            .field("animated", &self.animated)
            .field("transition", &self.transition)
            .field("completion", &self.completion.is_some())
            .finish()
    }
}

/// Outcome of a navigation command or reconciliation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// The flow stays active
    Continue,
    /// The flow has emptied and must run its finish
    Finish,
}

impl Step {
    pub fn finish_if(condition: bool) -> Self {
        if condition { Self::Finish } else { Self::Continue }
    }
}
