//! Navigation coordinator: the tracked-stack state machine

use std::mem;

use tracing::{debug, info, warn};

use super::action::{NavOptions, NavigationAction, Step};
use super::reconcile::{Reconciliation, reconcile_dismissal, reconcile_pop};
use crate::coordinator::Coordinator;
use crate::host::{Animation, DelegateRef, Dispatch, HostEvent, ScreenHandle, SharedHost, titles};

/// A coordinator that drives a shared screen-stack host
///
/// It remembers which screens it pushed (`stack`) and presented (`modals`).
/// User gestures that bypass the command API are picked up from host reports
/// and folded back into that bookkeeping. When a reduction leaves both
/// sequences empty the flow is over and [`Step::Finish`] is returned.
pub struct NavigationCoordinator<M> {
    coordinator: Coordinator<M>,
    host: SharedHost,
    stack: Vec<ScreenHandle>,
    modals: Vec<ScreenHandle>,
    delegate: Option<DelegateRef>,
}

impl<M: 'static> NavigationCoordinator<M> {
    pub fn new(host: SharedHost) -> Self {
        Self {
            coordinator: Coordinator::new(),
            host,
            stack: Vec::new(),
            modals: Vec::new(),
            delegate: None,
        }
    }

    pub fn host(&self) -> &SharedHost {
        &self.host
    }

    pub fn coordinator(&self) -> &Coordinator<M> {
        &self.coordinator
    }

    pub fn coordinator_mut(&mut self) -> &mut Coordinator<M> {
        &mut self.coordinator
    }

    /// Screens this flow pushed, bottom first
    pub fn stack(&self) -> &[ScreenHandle] {
        &self.stack
    }

    /// Screens this flow presented, bottom first
    pub fn modals(&self) -> &[ScreenHandle] {
        &self.modals
    }

    pub fn is_empty(&self) -> bool {
        self.stack.is_empty() && self.modals.is_empty()
    }

    /// Binding under which this flow receives host reports
    pub fn delegate(&self) -> Option<&DelegateRef> {
        self.delegate.as_ref()
    }

    pub(crate) fn bind_delegate(&mut self, delegate: DelegateRef) {
        debug!(id = %delegate.id(), "NavigationCoordinator::bind_delegate: called");
        self.delegate = Some(delegate);
    }

    /// Store the meta and become the host's delegate
    ///
    /// The delegate this replaces is remembered on our binding and gets the
    /// host back when this flow finishes.
    pub fn start(&mut self, meta: M) {
        self.coordinator.start(meta);

        let Some(delegate) = self.delegate.clone() else {
            warn!("NavigationCoordinator::start: not bound to a handle, host reports will not arrive");
            return;
        };

        let mut host = self.host.borrow_mut();
        let current = host.delegate();
        if current.as_ref() != Some(&delegate) {
            delegate.set_previous(current);
        }
        debug!(
            id = %delegate.id(),
            previous = ?delegate.previous().as_ref().map(DelegateRef::id),
            "NavigationCoordinator::start: attached to host"
        );
        host.set_delegate(Some(delegate));
    }

    /// Issue a command to the host and update the tracked state
    pub fn navigate(&mut self, action: NavigationAction, options: NavOptions) -> Step {
        if self.coordinator.is_finished() {
            warn!(action = %action, "NavigationCoordinator::navigate: flow already finished, ignoring");
            return Step::Continue;
        }

        let NavOptions {
            animated,
            transition,
            completion,
        } = options;
        debug!(action = %action, animated, ?transition, "NavigationCoordinator::navigate: called");

        if transition.is_some() && !action.uses_transition() {
            debug!(action = action.name(), "NavigationCoordinator::navigate: transition ignored");
        }
        let animation = Animation {
            operation: action.operation(),
            animated,
            transition,
        };

        match action {
            NavigationAction::Present(screen) => {
                self.modals.push(screen.clone());
                let delegate = self.delegate.clone();
                self.host
                    .borrow_mut()
                    .present_screen(screen, animated, completion, delegate);
                Step::Continue
            }
            NavigationAction::DismissTop => {
                if self.modals.is_empty() {
                    warn!("NavigationCoordinator::navigate: dismiss_top with no tracked modal");
                    return Step::Continue;
                }
                {
                    // The host dismisses its own top, which a pending pull may
                    // already have moved below our last tracked modal.
                    let mut host = self.host.borrow_mut();
                    let index = host
                        .presented()
                        .last()
                        .and_then(|top| self.modals.iter().position(|m| m == top))
                        .unwrap_or(self.modals.len() - 1);
                    self.modals.remove(index);
                    host.dismiss_top(animated, completion);
                }
                Step::finish_if(self.is_empty())
            }
            NavigationAction::DismissAll => {
                self.modals.clear();
                self.host.borrow_mut().dismiss_all(animated, completion);
                Step::finish_if(self.stack.is_empty())
            }
            NavigationAction::Push(screen) => {
                self.stack.push(screen.clone());
                self.host.borrow_mut().push_screen(screen, animation, completion);
                Step::Continue
            }
            NavigationAction::Root => {
                self.host.borrow_mut().pop_to_root(animation, completion);
                Step::Continue
            }
            NavigationAction::Pop => {
                self.host.borrow_mut().pop_screen(animation, completion);
                Step::Continue
            }
            NavigationAction::PopTo(kind) => {
                let Some(target) = self.stack.iter().find(|s| s.kind() == &kind).cloned() else {
                    debug!(%kind, "NavigationCoordinator::navigate: no tracked screen of kind");
                    return Step::Continue;
                };
                self.host
                    .borrow_mut()
                    .pop_to_screen(&target, animation, completion);
                Step::Continue
            }
            NavigationAction::Set(screens) => {
                self.stack = screens.clone();
                let mut host = self.host.borrow_mut();
                host.set_screens(screens, animated);
                if let Some(completion) = completion {
                    host.defer(completion);
                }
                Step::Continue
            }
        }
    }

    /// Fold a host report into the tracked state
    pub fn handle_event(&mut self, event: &HostEvent) -> Step {
        if self.coordinator.is_finished() {
            debug!(event_type = event.event_type(), "NavigationCoordinator::handle_event: finished, ignoring");
            return Step::Continue;
        }

        match event {
            HostEvent::Shown { screen, from, popped } => {
                if popped.is_empty() {
                    debug!(%screen, "NavigationCoordinator::handle_event: nothing popped");
                    return Step::Continue;
                }

                let reconciliation = reconcile_pop(&self.stack, screen, popped);
                debug!(
                    %screen,
                    from = ?from.as_ref().map(ScreenHandle::title),
                    popped = ?titles(popped),
                    ?reconciliation,
                    "NavigationCoordinator::handle_event: pop detected"
                );
                let finish = reconciliation.apply(&mut self.stack);
                if finish {
                    self.forward_to_previous(event);
                }
                Step::finish_if(finish)
            }
            HostEvent::UserDismissedModal { screen } => {
                let reconciliation = reconcile_dismissal(&self.modals, screen, self.stack.len());
                if reconciliation == Reconciliation::Unchanged {
                    warn!(%screen, "NavigationCoordinator::handle_event: dismissed screen is not tracked");
                    return Step::Continue;
                }
                debug!(%screen, ?reconciliation, "NavigationCoordinator::handle_event: modal dismissed by user");
                Step::finish_if(reconciliation.apply(&mut self.modals))
            }
        }
    }

    // A pop that ends this flow may also reach into the flow that was
    // delegate before it, so that flow gets the report next.
    fn forward_to_previous(&self, event: &HostEvent) {
        let Some(ours) = &self.delegate else {
            return;
        };
        let Some(previous) = DelegateRef::first_active(ours.previous()) else {
            return;
        };
        if &previous == ours {
            return;
        }
        debug!(to = %previous.id(), "NavigationCoordinator::forward_to_previous: forwarding");
        self.host.borrow_mut().enqueue(Dispatch::Event {
            target: previous.clone(),
            event: event.clone(),
        });
    }

    /// Tear down: release the host, drop tracked screens, leave the parent
    ///
    /// Our delegate binding is retired first. If we hold the host, it goes to
    /// the nearest binding down the chain that is still active, so flows that
    /// finished out of order are skipped. Only the first call has any effect.
    pub fn finish(&mut self) {
        if self.coordinator.is_finished() {
            debug!("NavigationCoordinator::finish: already finished");
            return;
        }

        let screens = mem::take(&mut self.stack);
        info!(
            stack = ?titles(&screens),
            modals = ?titles(&self.modals),
            "NavigationCoordinator finishing"
        );

        {
            let mut host = self.host.borrow_mut();
            if let Some(ours) = &self.delegate {
                ours.retire();
            }
            if let Some(ours) = &self.delegate
                && host.delegate().as_ref() == Some(ours)
            {
                let restored = DelegateRef::first_active(ours.previous());
                debug!(
                    restored = ?restored.as_ref().map(DelegateRef::id),
                    "NavigationCoordinator::finish: releasing host delegate"
                );
                host.set_delegate(restored);
            }
            host.remove_screens(&screens);
        }

        self.modals.clear();
        self.coordinator.detach_from_parent();
        self.coordinator.finish();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flow::{Flow, FlowHandle};
    use crate::host::{Screen, ScreenKind, ScreenStackHost, Transition, pump};
    use crate::sim::MemoryHost;
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;

    #[derive(Debug)]
    struct Page(&'static str);

    impl Screen for Page {
        fn title(&self) -> String {
            self.0.to_string()
        }

        fn kind(&self) -> ScreenKind {
            ScreenKind::named(self.0)
        }
    }

    fn page(name: &'static str) -> ScreenHandle {
        ScreenHandle::new(Page(name))
    }

    struct TestMeta;

    struct TestFlow {
        navigation: NavigationCoordinator<TestMeta>,
    }

    impl Flow for TestFlow {
        type Meta = TestMeta;

        fn coordinator(&self) -> &Coordinator<TestMeta> {
            self.navigation.coordinator()
        }

        fn coordinator_mut(&mut self) -> &mut Coordinator<TestMeta> {
            self.navigation.coordinator_mut()
        }

        fn navigation(&mut self) -> Option<&mut NavigationCoordinator<TestMeta>> {
            Some(&mut self.navigation)
        }
    }

    fn setup() -> (Rc<RefCell<MemoryHost>>, SharedHost, FlowHandle<TestFlow>) {
        let memory = MemoryHost::shared();
        let host: SharedHost = memory.clone();
        let flow = TestFlow {
            navigation: NavigationCoordinator::new(host.clone()),
        }
        .into_handle();
        flow.borrow_mut().start(TestMeta);
        (memory, host, flow)
    }

    fn stack_of(flow: &FlowHandle<TestFlow>) -> Vec<String> {
        titles(flow.borrow_mut().navigation().map(|n| n.stack()).unwrap_or_default())
    }

    fn modals_of(flow: &FlowHandle<TestFlow>) -> Vec<String> {
        titles(flow.borrow_mut().navigation().map(|n| n.modals()).unwrap_or_default())
    }

    fn push(flow: &FlowHandle<TestFlow>, screen: &ScreenHandle) -> Step {
        flow.borrow_mut()
            .navigate(NavigationAction::Push(screen.clone()), NavOptions::default())
    }

    fn count_finishes(flow: &FlowHandle<TestFlow>) -> Rc<Cell<usize>> {
        let count = Rc::new(Cell::new(0));
        let counter = count.clone();
        flow.borrow_mut()
            .coordinator_mut()
            .set_on_finish(move |_| counter.set(counter.get() + 1));
        count
    }

    #[test]
    fn test_start_takes_host_delegate() {
        let (_memory, host, flow) = setup();
        let ours = flow.borrow_mut().navigation().and_then(|n| n.delegate().cloned());
        assert!(ours.is_some());
        assert_eq!(host.borrow().delegate(), ours);
    }

    #[test]
    fn test_push_then_shown_leaves_stack_unchanged() {
        let (_memory, host, flow) = setup();
        let (a, b) = (page("A"), page("B"));
        push(&flow, &a);
        push(&flow, &b);
        pump(&host);
        assert_eq!(stack_of(&flow), vec!["A", "B"]);
        assert!(!flow.borrow().is_finished());
    }

    #[test]
    fn test_swipe_back_truncates() {
        let (memory, host, flow) = setup();
        for name in ["A", "B", "C"] {
            push(&flow, &page(name));
        }
        pump(&host);

        memory.borrow_mut().swipe_back();
        memory.borrow_mut().swipe_back();
        pump(&host);
        assert_eq!(stack_of(&flow), vec!["A"]);

        push(&flow, &page("D"));
        pump(&host);
        assert_eq!(stack_of(&flow), vec!["A", "D"]);
    }

    #[test]
    fn test_pop_to_untracked_finishes() {
        let (memory, host, flow) = setup();
        let finished = count_finishes(&flow);
        let outside = page("Outside");
        memory
            .borrow_mut()
            .push_screen(outside.clone(), Animation::plain(false), None);
        push(&flow, &page("A"));
        push(&flow, &page("B"));
        pump(&host);

        flow.borrow_mut()
            .navigate(NavigationAction::Root, NavOptions::instant());
        pump(&host);

        assert_eq!(finished.get(), 1);
        assert!(flow.borrow().is_finished());
        assert!(stack_of(&flow).is_empty());
        assert_eq!(host.borrow().screens(), &[outside]);
    }

    #[test]
    fn test_pop_to_kind_pops_to_first_match() {
        let (memory, host, flow) = setup();
        let a = page("A");
        push(&flow, &a);
        push(&flow, &page("B"));
        push(&flow, &page("C"));
        pump(&host);

        flow.borrow_mut()
            .navigate(NavigationAction::PopTo(ScreenKind::named("A")), NavOptions::default());
        pump(&host);

        assert_eq!(stack_of(&flow), vec!["A"]);
        assert_eq!(memory.borrow().screens(), &[a]);
    }

    #[test]
    fn test_pop_to_unknown_kind_is_noop() {
        let (memory, host, flow) = setup();
        push(&flow, &page("A"));
        pump(&host);
        let before = memory.borrow().transitions().len();

        let step = flow
            .borrow_mut()
            .navigate(NavigationAction::PopTo(ScreenKind::named("Z")), NavOptions::default());
        assert_eq!(step, Step::Continue);
        assert_eq!(memory.borrow().transitions().len(), before);
    }

    #[test]
    fn test_set_replaces_stack_and_runs_completion() {
        let (memory, host, flow) = setup();
        push(&flow, &page("Old"));
        let fired = Rc::new(Cell::new(false));
        let flag = fired.clone();
        let screens = vec![page("A"), page("B"), page("C")];

        flow.borrow_mut().navigate(
            NavigationAction::Set(screens.clone()),
            NavOptions::instant().on_complete(move || flag.set(true)),
        );
        assert_eq!(stack_of(&flow), vec!["A", "B", "C"]);
        assert!(!fired.get());

        pump(&host);
        assert!(fired.get());
        assert_eq!(memory.borrow().screens(), screens.as_slice());
    }

    #[test]
    fn test_dismiss_top_last_modal_with_empty_stack_finishes() {
        let (_memory, host, flow) = setup();
        let finished = count_finishes(&flow);
        flow.borrow_mut()
            .navigate(NavigationAction::Present(page("X")), NavOptions::default());
        pump(&host);

        let step = flow
            .borrow_mut()
            .navigate(NavigationAction::DismissTop, NavOptions::default());
        assert_eq!(step, Step::Finish);
        assert_eq!(finished.get(), 1);
    }

    #[test]
    fn test_dismiss_top_with_stack_does_not_finish() {
        let (_memory, host, flow) = setup();
        push(&flow, &page("A"));
        flow.borrow_mut()
            .navigate(NavigationAction::Present(page("X")), NavOptions::default());
        pump(&host);

        let step = flow
            .borrow_mut()
            .navigate(NavigationAction::DismissTop, NavOptions::default());
        assert_eq!(step, Step::Continue);
        assert!(modals_of(&flow).is_empty());
        assert!(!flow.borrow().is_finished());
    }

    #[test]
    fn test_dismiss_top_without_modal_is_noop() {
        let (memory, _host, flow) = setup();
        push(&flow, &page("A"));
        let before = memory.borrow().transitions().len();
        let step = flow
            .borrow_mut()
            .navigate(NavigationAction::DismissTop, NavOptions::default());
        assert_eq!(step, Step::Continue);
        assert_eq!(memory.borrow().transitions().len(), before);
    }

    #[test]
    fn test_user_dismissal_then_dismiss_all_finishes_once() {
        let (memory, host, flow) = setup();
        let finished = count_finishes(&flow);
        flow.borrow_mut()
            .navigate(NavigationAction::Present(page("X")), NavOptions::default());
        flow.borrow_mut()
            .navigate(NavigationAction::Present(page("Y")), NavOptions::default());
        pump(&host);

        assert!(memory.borrow_mut().pull_to_dismiss());
        pump(&host);
        assert_eq!(modals_of(&flow), vec!["X"]);

        flow.borrow_mut()
            .navigate(NavigationAction::DismissAll, NavOptions::default());
        pump(&host);
        assert!(modals_of(&flow).is_empty());
        assert_eq!(finished.get(), 1);
    }

    #[test]
    fn test_user_dismissal_of_last_modal_finishes() {
        let (memory, host, flow) = setup();
        let finished = count_finishes(&flow);
        flow.borrow_mut()
            .navigate(NavigationAction::Present(page("X")), NavOptions::default());
        pump(&host);

        memory.borrow_mut().pull_to_dismiss();
        pump(&host);
        assert_eq!(finished.get(), 1);
    }

    #[test]
    fn test_finish_twice_fires_once() {
        let (_memory, _host, flow) = setup();
        let finished = count_finishes(&flow);
        flow.borrow_mut().finish();
        flow.borrow_mut().finish();
        assert_eq!(finished.get(), 1);
    }

    #[test]
    fn test_finish_removes_tracked_screens_and_releases_delegate() {
        let (memory, host, flow) = setup();
        let outside = page("Outside");
        memory
            .borrow_mut()
            .push_screen(outside.clone(), Animation::plain(false), None);
        push(&flow, &page("A"));
        push(&flow, &page("B"));
        pump(&host);

        flow.borrow_mut().finish();
        assert_eq!(memory.borrow().screens(), &[outside]);
        assert!(host.borrow().delegate().is_none());
    }

    #[test]
    fn test_commands_after_finish_are_ignored() {
        let (memory, _host, flow) = setup();
        flow.borrow_mut().finish();
        let step = push(&flow, &page("A"));
        assert_eq!(step, Step::Continue);
        assert!(memory.borrow().screens().is_empty());
        assert!(stack_of(&flow).is_empty());
    }

    #[test]
    fn test_transition_is_passed_with_the_call() {
        let (memory, host, flow) = setup();
        flow.borrow_mut().navigate(
            NavigationAction::Push(page("A")),
            NavOptions::default().with_transition(Transition::Fade),
        );
        push(&flow, &page("B"));
        pump(&host);

        let log = memory.borrow().transitions().to_vec();
        assert_eq!(log[0].transition, Some(Transition::Fade));
        assert_eq!(log[1].transition, None);
    }
}
