//! Screen-stack host contract
//!
//! The host is the platform object that owns the live screen stack and the
//! modal presentation stack. Coordinators drive it through
//! [`ScreenStackHost`]; it reports back through queued [`Dispatch`] records
//! that [`pump`] delivers to delegates.
//!
//! # Architecture
//!
//! ```text
//! NavigationCoordinator ──commands──▶ ScreenStackHost
//!          ▲                               │ queues
//!          │ handle_host_event             ▼
//!          └──────────── pump ◀──── Dispatch { target, event }
//! ```
//!
//! The host never calls into a coordinator while it is borrowed. That keeps
//! reconciliation free to issue further host calls.

mod events;
mod screen;

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

pub use events::{
    DEFAULT_MAX_DISPATCHES, DelegateId, DelegateRef, Dispatch, HostDelegate, HostEvent, pump, pump_limited,
};
pub use screen::{Screen, ScreenHandle, ScreenKind, titles};

pub(crate) use screen::short_type_name;

/// Callback fired once the host reports a transition visually complete
pub type Completion = Box<dyn FnOnce()>;

/// A host shared by every coordinator in a tree
pub type SharedHost = Rc<RefCell<dyn ScreenStackHost>>;

/// Transition-animation descriptor handed to the host with a push or pop
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Transition {
    Slide,
    Fade,
    Modal,
    Custom(String),
}

impl From<String> for Transition {
    fn from(value: String) -> Self {
        match value.to_lowercase().as_str() {
            "slide" => Self::Slide,
            "fade" => Self::Fade,
            "modal" => Self::Modal,
            _ => Self::Custom(value),
        }
    }
}

impl From<Transition> for String {
    fn from(value: Transition) -> Self {
        value.to_string()
    }
}

impl fmt::Display for Transition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Slide => write!(f, "slide"),
            Self::Fade => write!(f, "fade"),
            Self::Modal => write!(f, "modal"),
            Self::Custom(name) => write!(f, "{}", name),
        }
    }
}

/// Stack operation a transition governs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    Push,
    Pop,
}

/// How a push or pop should be animated
///
/// The transition travels with the single host call it belongs to, together
/// with the stack operation it animates. There is no stored "pending"
/// descriptor for a later transition to pick up.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Animation {
    /// Stack operation being animated; `None` outside the push and pop family
    pub operation: Option<Operation>,
    pub animated: bool,
    pub transition: Option<Transition>,
}

impl Animation {
    /// Animation with no operation and no custom transition
    pub fn plain(animated: bool) -> Self {
        Self {
            operation: None,
            animated,
            transition: None,
        }
    }

    /// Animation for one push or pop
    pub fn for_operation(operation: Operation, animated: bool, transition: Option<Transition>) -> Self {
        Self {
            operation: Some(operation),
            animated,
            transition,
        }
    }
}

/// Operations a screen-stack host exposes to coordinators
///
/// Implementations must not call delegates synchronously from these methods.
/// Reports are queued and handed out through [`ScreenStackHost::next_dispatch`].
pub trait ScreenStackHost {
    /// The live screen stack, bottom first
    fn screens(&self) -> &[ScreenHandle];

    /// Presented modal screens, bottom first
    fn presented(&self) -> &[ScreenHandle];

    /// Whether a screen is on the live stack
    fn contains(&self, screen: &ScreenHandle) -> bool {
        self.screens().contains(screen)
    }

    fn push_screen(&mut self, screen: ScreenHandle, animation: Animation, completion: Option<Completion>);

    fn pop_screen(&mut self, animation: Animation, completion: Option<Completion>);

    fn pop_to_screen(&mut self, screen: &ScreenHandle, animation: Animation, completion: Option<Completion>);

    fn pop_to_root(&mut self, animation: Animation, completion: Option<Completion>);

    fn set_screens(&mut self, screens: Vec<ScreenHandle>, animated: bool);

    /// Present a screen modally; `delegate` receives its user-driven dismissal
    fn present_screen(
        &mut self,
        screen: ScreenHandle,
        animated: bool,
        completion: Option<Completion>,
        delegate: Option<DelegateRef>,
    );

    fn dismiss_top(&mut self, animated: bool, completion: Option<Completion>);

    fn dismiss_all(&mut self, animated: bool, completion: Option<Completion>);

    /// Remove the given screens from the live stack without animation
    fn remove_screens(&mut self, screens: &[ScreenHandle]);

    /// Current receiver of stack transition reports
    fn delegate(&self) -> Option<DelegateRef>;

    fn set_delegate(&mut self, delegate: Option<DelegateRef>);

    /// Run `completion` after everything queued so far has been delivered
    fn defer(&mut self, completion: Completion);

    /// Queue a dispatch behind everything already pending
    fn enqueue(&mut self, dispatch: Dispatch);

    /// Take the oldest pending dispatch
    fn next_dispatch(&mut self) -> Option<Dispatch>;

    /// Make the host the visible root of the application
    fn make_key_and_visible(&mut self) {}
}
