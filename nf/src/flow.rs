//! The `Flow` trait: how concrete coordinators plug into the engine
//!
//! A concrete coordinator embeds a [`Coordinator`] (plain flows) or a
//! [`NavigationCoordinator`] (flows that drive the host) and implements
//! `Flow` to expose it. Default methods route `start`, `finish`, commands and
//! host reports to the embedded navigation coordinator when there is one.
//! Overriding a hook and calling the embedded coordinator from it is the
//! equivalent of extending a base implementation.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use tracing::{debug, warn};

use crate::coordinator::{Coordinator, WeakCoordinator};
use crate::host::{DelegateRef, HostDelegate, HostEvent};
use crate::navigation::{NavOptions, NavigationAction, NavigationCoordinator, Step};

/// Shared handle to a live flow
pub type FlowHandle<F> = Rc<RefCell<F>>;

pub trait Flow: 'static {
    /// Startup configuration type
    type Meta: 'static;

    fn coordinator(&self) -> &Coordinator<Self::Meta>;

    fn coordinator_mut(&mut self) -> &mut Coordinator<Self::Meta>;

    /// The embedded navigation coordinator, for flows that drive the host
    fn navigation(&mut self) -> Option<&mut NavigationCoordinator<Self::Meta>> {
        None
    }

    fn start(&mut self, meta: Self::Meta) {
        if let Some(navigation) = self.navigation() {
            navigation.start(meta);
            return;
        }
        self.coordinator_mut().start(meta);
    }

    fn finish(&mut self) {
        if let Some(navigation) = self.navigation() {
            navigation.finish();
            return;
        }
        self.coordinator_mut().finish();
    }

    /// Issue a navigation command, finishing the flow if it empties
    fn navigate(&mut self, action: NavigationAction, options: NavOptions) -> Step {
        let Some(navigation) = self.navigation() else {
            warn!(action = action.name(), "Flow::navigate: flow has no navigation coordinator");
            return Step::Continue;
        };

        let step = navigation.navigate(action, options);
        if step == Step::Finish {
            self.finish();
        }
        step
    }

    /// React to a host report, finishing the flow if reconciliation says so
    fn on_host_event(&mut self, event: &HostEvent) {
        let Some(navigation) = self.navigation() else {
            debug!(event_type = event.event_type(), "Flow::on_host_event: no navigation coordinator");
            return;
        };

        if navigation.handle_event(event) == Step::Finish {
            self.finish();
        }
    }

    fn is_finished(&self) -> bool {
        self.coordinator().is_finished()
    }

    /// Wrap the flow in a shared handle and bind its self references
    fn into_handle(self) -> FlowHandle<Self>
    where
        Self: Sized,
    {
        let handle = Rc::new(RefCell::new(self));
        let this = WeakCoordinator::new(&handle);
        let target: Weak<RefCell<dyn HostDelegate>> = Rc::downgrade(&handle) as Weak<RefCell<dyn HostDelegate>>;

        {
            let mut flow = handle.borrow_mut();
            debug!(key = %this.key(), "Flow::into_handle: binding");
            flow.coordinator_mut().bind_handle(this);
            if let Some(navigation) = flow.navigation() {
                navigation.bind_delegate(DelegateRef::new(target));
            }
        }

        handle
    }
}

impl<F: Flow> HostDelegate for F {
    fn handle_host_event(&mut self, event: &HostEvent) {
        self.on_host_event(event);
    }
}
