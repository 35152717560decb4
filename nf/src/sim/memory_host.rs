//! In-memory screen-stack host

use std::cell::RefCell;
use std::collections::VecDeque;
use std::fmt;
use std::rc::Rc;

use serde::Serialize;
use tracing::{debug, info};

use crate::host::{
    Animation, Completion, DelegateRef, Dispatch, HostEvent, Operation, ScreenHandle, ScreenStackHost, Transition,
    titles,
};

/// Host operation recorded in the transition log
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum HostCall {
    Push,
    Pop,
    PopTo,
    PopToRoot,
    Set,
    Present,
    DismissTop,
    DismissAll,
    Remove,
    SwipeBack,
    PullToDismiss,
}

impl fmt::Display for HostCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Push => "push",
            Self::Pop => "pop",
            Self::PopTo => "pop-to",
            Self::PopToRoot => "pop-to-root",
            Self::Set => "set",
            Self::Present => "present",
            Self::DismissTop => "dismiss-top",
            Self::DismissAll => "dismiss-all",
            Self::Remove => "remove",
            Self::SwipeBack => "swipe-back",
            Self::PullToDismiss => "pull-to-dismiss",
        };
        write!(f, "{}", name)
    }
}

/// One entry of the host's transition log
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransitionRecord {
    pub call: HostCall,
    /// Titles of the screens the call added or removed
    pub screens: Vec<String>,
    /// Stack operation the transition animated, for push and pop family calls
    pub operation: Option<Operation>,
    pub animated: bool,
    pub transition: Option<Transition>,
}

/// Reference [`ScreenStackHost`] that keeps everything in memory
///
/// Transitions complete instantly. Reports and completions are queued in the
/// order a platform host would deliver them: the `Shown` report first, then
/// the completion of the call that caused it. User gestures are simulated with
/// [`MemoryHost::swipe_back`] and [`MemoryHost::pull_to_dismiss`].
#[derive(Default)]
pub struct MemoryHost {
    screens: Vec<ScreenHandle>,
    presented: Vec<ScreenHandle>,
    modal_delegates: Vec<Option<DelegateRef>>,
    delegate: Option<DelegateRef>,
    queue: VecDeque<Dispatch>,
    transitions: Vec<TransitionRecord>,
    key: bool,
}

impl MemoryHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// A new host ready to be shared by a coordinator tree
    pub fn shared() -> Rc<RefCell<Self>> {
        Rc::new(RefCell::new(Self::new()))
    }

    /// Every call the host has performed, oldest first
    pub fn transitions(&self) -> &[TransitionRecord] {
        &self.transitions
    }

    pub fn is_key(&self) -> bool {
        self.key
    }

    /// Number of queued dispatches
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// Simulate the back-swipe gesture
    ///
    /// Returns false when there is nothing to go back to.
    pub fn swipe_back(&mut self) -> bool {
        if self.screens.len() < 2 {
            debug!(screens = self.screens.len(), "MemoryHost::swipe_back: nothing to go back to");
            return false;
        }

        let from = self.screens.pop();
        debug!(from = ?from.as_ref().map(ScreenHandle::title), "MemoryHost::swipe_back: called");
        let popped: Vec<ScreenHandle> = from.iter().cloned().collect();
        self.record(HostCall::SwipeBack, &popped, Animation::for_operation(Operation::Pop, true, None));
        self.announce(from, popped);
        true
    }

    /// Simulate the user pulling the top presented screen down
    ///
    /// Returns false when nothing is presented.
    pub fn pull_to_dismiss(&mut self) -> bool {
        let Some(screen) = self.presented.pop() else {
            debug!("MemoryHost::pull_to_dismiss: nothing presented");
            return false;
        };
        let delegate = self.modal_delegates.pop().flatten();
        debug!(%screen, has_delegate = delegate.is_some(), "MemoryHost::pull_to_dismiss: called");
        self.record(HostCall::PullToDismiss, std::slice::from_ref(&screen), Animation::plain(true));

        if let Some(target) = delegate {
            self.queue.push_back(Dispatch::Event {
                target,
                event: HostEvent::UserDismissedModal { screen },
            });
        }
        true
    }

    fn top(&self) -> Option<&ScreenHandle> {
        self.screens.last()
    }

    fn record(&mut self, call: HostCall, screens: &[ScreenHandle], animation: Animation) {
        self.transitions.push(TransitionRecord {
            call,
            screens: titles(screens),
            operation: animation.operation,
            animated: animation.animated,
            transition: animation.transition,
        });
    }

    // Queue a report if the visible top changed since `from` was on top.
    // `popped` is whatever the change took off the stack.
    fn announce(&mut self, from: Option<ScreenHandle>, popped: Vec<ScreenHandle>) {
        let Some(screen) = self.top().cloned() else {
            return;
        };
        if from.as_ref() == Some(&screen) {
            return;
        }
        let Some(target) = self.delegate.clone() else {
            debug!(%screen, "MemoryHost::announce: no delegate");
            return;
        };
        self.queue.push_back(Dispatch::Event {
            target,
            event: HostEvent::Shown { screen, from, popped },
        });
    }

    fn complete(&mut self, completion: Option<Completion>) {
        if let Some(completion) = completion {
            self.queue.push_back(Dispatch::Completion(completion));
        }
    }
}

impl ScreenStackHost for MemoryHost {
    fn screens(&self) -> &[ScreenHandle] {
        &self.screens
    }

    fn presented(&self) -> &[ScreenHandle] {
        &self.presented
    }

    fn push_screen(&mut self, screen: ScreenHandle, animation: Animation, completion: Option<Completion>) {
        debug!(%screen, animated = animation.animated, "MemoryHost::push_screen: called");
        let from = self.top().cloned();
        self.record(HostCall::Push, std::slice::from_ref(&screen), animation);
        self.screens.push(screen);
        self.announce(from, Vec::new());
        self.complete(completion);
    }

    fn pop_screen(&mut self, animation: Animation, completion: Option<Completion>) {
        if self.screens.len() < 2 {
            debug!("MemoryHost::pop_screen: root cannot be popped");
            self.complete(completion);
            return;
        }
        let from = self.screens.pop();
        let popped: Vec<ScreenHandle> = from.iter().cloned().collect();
        self.record(HostCall::Pop, &popped, animation);
        self.announce(from, popped);
        self.complete(completion);
    }

    fn pop_to_screen(&mut self, screen: &ScreenHandle, animation: Animation, completion: Option<Completion>) {
        let Some(index) = self.screens.iter().position(|s| s == screen) else {
            debug!(%screen, "MemoryHost::pop_to_screen: screen not on stack");
            self.complete(completion);
            return;
        };
        let from = self.top().cloned();
        let removed = self.screens.split_off(index + 1);
        self.record(HostCall::PopTo, &removed, animation);
        self.announce(from, removed);
        self.complete(completion);
    }

    fn pop_to_root(&mut self, animation: Animation, completion: Option<Completion>) {
        if self.screens.len() < 2 {
            debug!("MemoryHost::pop_to_root: already at root");
            self.complete(completion);
            return;
        }
        let from = self.top().cloned();
        let removed = self.screens.split_off(1);
        self.record(HostCall::PopToRoot, &removed, animation);
        self.announce(from, removed);
        self.complete(completion);
    }

    fn set_screens(&mut self, screens: Vec<ScreenHandle>, animated: bool) {
        debug!(screens = ?titles(&screens), animated, "MemoryHost::set_screens: called");
        let from = self.top().cloned();
        self.record(HostCall::Set, &screens, Animation::plain(animated));
        let replaced = std::mem::replace(&mut self.screens, screens);
        let popped = replaced.into_iter().filter(|s| !self.screens.contains(s)).collect();
        self.announce(from, popped);
    }

    fn present_screen(
        &mut self,
        screen: ScreenHandle,
        animated: bool,
        completion: Option<Completion>,
        delegate: Option<DelegateRef>,
    ) {
        debug!(%screen, animated, "MemoryHost::present_screen: called");
        self.record(HostCall::Present, std::slice::from_ref(&screen), Animation::plain(animated));
        self.presented.push(screen);
        self.modal_delegates.push(delegate);
        self.complete(completion);
    }

    fn dismiss_top(&mut self, animated: bool, completion: Option<Completion>) {
        if let Some(screen) = self.presented.pop() {
            self.modal_delegates.pop();
            self.record(HostCall::DismissTop, std::slice::from_ref(&screen), Animation::plain(animated));
        } else {
            debug!("MemoryHost::dismiss_top: nothing presented");
        }
        self.complete(completion);
    }

    fn dismiss_all(&mut self, animated: bool, completion: Option<Completion>) {
        let dismissed = std::mem::take(&mut self.presented);
        self.modal_delegates.clear();
        if !dismissed.is_empty() {
            self.record(HostCall::DismissAll, &dismissed, Animation::plain(animated));
        }
        self.complete(completion);
    }

    fn remove_screens(&mut self, screens: &[ScreenHandle]) {
        let from = self.top().cloned();
        let (removed, kept): (Vec<ScreenHandle>, Vec<ScreenHandle>) =
            self.screens.drain(..).partition(|s| screens.contains(s));
        self.screens = kept;
        if removed.is_empty() {
            return;
        }
        debug!(removed = ?titles(&removed), "MemoryHost::remove_screens: called");
        self.record(HostCall::Remove, &removed, Animation::plain(false));
        self.announce(from, removed);
    }

    fn delegate(&self) -> Option<DelegateRef> {
        self.delegate.clone()
    }

    fn set_delegate(&mut self, delegate: Option<DelegateRef>) {
        debug!(id = ?delegate.as_ref().map(DelegateRef::id), "MemoryHost::set_delegate: called");
        self.delegate = delegate;
    }

    fn defer(&mut self, completion: Completion) {
        self.queue.push_back(Dispatch::Completion(completion));
    }

    fn enqueue(&mut self, dispatch: Dispatch) {
        self.queue.push_back(dispatch);
    }

    fn next_dispatch(&mut self) -> Option<Dispatch> {
        self.queue.pop_front()
    }

    fn make_key_and_visible(&mut self) {
        info!("MemoryHost is now the key window root");
        self.key = true;
    }
}
