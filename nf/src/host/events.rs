//! Host reports and their delivery
//!
//! Hosts queue [`Dispatch`] records instead of calling delegates. [`pump`]
//! drains the queue with the host borrow released, so a delegate is free to
//! call back into the host while it reconciles.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

use tracing::{debug, warn};
use uuid::Uuid;

use super::{Completion, ScreenHandle, SharedHost};

/// Upper bound on deliveries in a single pump
pub const DEFAULT_MAX_DISPATCHES: usize = 10_000;

/// Report produced by a host after something changed on screen
#[derive(Debug, Clone, PartialEq)]
pub enum HostEvent {
    /// A stack transition finished and `screen` is now on top.
    ///
    /// `from` is the screen that was on top before the transition, if any.
    /// `popped` lists the screens the transition took off the stack, captured
    /// when the report was produced; it is empty for a push.
    Shown {
        screen: ScreenHandle,
        from: Option<ScreenHandle>,
        popped: Vec<ScreenHandle>,
    },

    /// The user dismissed a presented screen without going through a coordinator
    UserDismissedModal { screen: ScreenHandle },
}

impl HostEvent {
    /// Short event name for logging
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::Shown { .. } => "shown",
            Self::UserDismissedModal { .. } => "user_dismissed_modal",
        }
    }
}

/// Receiver of host reports
pub trait HostDelegate {
    fn handle_host_event(&mut self, event: &HostEvent);
}

/// Stable identity of a delegate binding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DelegateId(Uuid);

impl DelegateId {
    fn generate() -> Self {
        Self(Uuid::now_v7())
    }
}

impl fmt::Display for DelegateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// State shared by every clone of one binding
#[derive(Default)]
struct Binding {
    retired: Cell<bool>,
    previous: RefCell<Option<DelegateRef>>,
}

/// Non-owning reference from a host to a delegate
///
/// Holding a `DelegateRef` never keeps a coordinator alive. Each binding also
/// remembers the delegate it displaced, so a host can be handed back down the
/// chain past bindings that were retired out of order.
#[derive(Clone)]
pub struct DelegateRef {
    id: DelegateId,
    target: Weak<RefCell<dyn HostDelegate>>,
    binding: Rc<Binding>,
}

impl DelegateRef {
    /// Create a binding with a fresh identity
    pub fn new(target: Weak<RefCell<dyn HostDelegate>>) -> Self {
        let id = DelegateId::generate();
        debug!(%id, "DelegateRef::new: called");
        Self {
            id,
            target,
            binding: Rc::default(),
        }
    }

    pub fn id(&self) -> DelegateId {
        self.id
    }

    /// Upgrade to the delegate, if it is still alive
    pub fn upgrade(&self) -> Option<Rc<RefCell<dyn HostDelegate>>> {
        self.target.upgrade()
    }

    pub fn is_alive(&self) -> bool {
        self.target.strong_count() > 0
    }

    /// Whether the owner gave this binding up for good
    pub fn is_retired(&self) -> bool {
        self.binding.retired.get()
    }

    /// Alive and not retired: reports sent here are still handled
    pub fn is_active(&self) -> bool {
        self.is_alive() && !self.is_retired()
    }

    pub(crate) fn retire(&self) {
        debug!(id = %self.id, "DelegateRef::retire: called");
        self.binding.retired.set(true);
    }

    /// The delegate this binding displaced when it took over a host
    pub fn previous(&self) -> Option<DelegateRef> {
        self.binding.previous.borrow().clone()
    }

    pub(crate) fn set_previous(&self, previous: Option<DelegateRef>) {
        if previous.as_ref() == Some(self) {
            return;
        }
        *self.binding.previous.borrow_mut() = previous;
    }

    /// First active binding in the chain starting at `start`, following
    /// `previous` past dropped and retired ones
    pub fn first_active(start: Option<DelegateRef>) -> Option<DelegateRef> {
        let mut seen = Vec::new();
        let mut candidate = start;
        while let Some(delegate) = candidate {
            if delegate.is_active() {
                return Some(delegate);
            }
            if seen.contains(&delegate.id) {
                warn!(id = %delegate.id, "DelegateRef::first_active: delegate chain loops");
                return None;
            }
            seen.push(delegate.id);
            debug!(id = %delegate.id, "DelegateRef::first_active: skipping inactive delegate");
            candidate = delegate.previous();
        }
        None
    }
}

impl PartialEq for DelegateRef {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for DelegateRef {}

impl fmt::Debug for DelegateRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DelegateRef")
            .field("id", &self.id)
            .field("alive", &self.is_alive())
            .field("retired", &self.is_retired())
            .finish()
    }
}

/// A queued unit of host output
pub enum Dispatch {
    /// Deliver `event` to `target`
    Event { target: DelegateRef, event: HostEvent },

    /// Run a transition completion callback
    Completion(Completion),
}

impl fmt::Debug for Dispatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Event { target, event } => f
                .debug_struct("Event")
                .field("target", &target.id())
                .field("event", event)
                .finish(),
            Self::Completion(_) => write!(f, "Completion"),
        }
    }
}

/// Deliver every pending dispatch, up to [`DEFAULT_MAX_DISPATCHES`]
pub fn pump(host: &SharedHost) -> usize {
    pump_limited(host, DEFAULT_MAX_DISPATCHES)
}

/// Deliver pending dispatches until the queue is empty or `max` is reached
///
/// Returns the number of dispatches delivered. An event whose delegate was
/// dropped or retired goes to the first active delegate down its chain, or
/// is discarded if there is none. A dispatch whose delegate is
/// already borrowed (a pump started from inside that delegate) is queued again
/// and the pump stops; the outer pump delivers it once the delegate returns.
pub fn pump_limited(host: &SharedHost, max: usize) -> usize {
    let mut delivered = 0;

    while delivered < max {
        let next = host.borrow_mut().next_dispatch();
        let Some(dispatch) = next else {
            debug!(delivered, "pump: queue drained");
            return delivered;
        };

        match dispatch {
            Dispatch::Completion(completion) => {
                debug!("pump: running completion");
                completion();
                delivered += 1;
            }
            Dispatch::Event { target, event } => {
                let target = if target.is_active() {
                    target
                } else {
                    match DelegateRef::first_active(Some(target.clone())) {
                        Some(next) => {
                            debug!(from = %target.id(), to = %next.id(), "pump: target inactive, redirecting");
                            next
                        }
                        None => {
                            debug!(id = %target.id(), event_type = event.event_type(), "pump: no active delegate, discarding");
                            delivered += 1;
                            continue;
                        }
                    }
                };
                let Some(delegate) = target.upgrade() else {
                    delivered += 1;
                    continue;
                };

                let Ok(mut receiver) = delegate.try_borrow_mut() else {
                    warn!(id = %target.id(), event_type = event.event_type(), "pump: delegate busy, requeueing");
                    host.borrow_mut().enqueue(Dispatch::Event { target, event });
                    return delivered;
                };

                debug!(id = %target.id(), event_type = event.event_type(), "pump: delivering");
                receiver.handle_host_event(&event);
                delivered += 1;
            }
        }
    }

    warn!(max, "pump: dispatch limit reached, leaving the rest queued");
    delivered
}
