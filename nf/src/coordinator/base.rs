//! Base coordinator state

use std::rc::Rc;

use tracing::{debug, info, warn};

use super::registry::{AnyCoordinator, ChildRegistry, CoordinatorKey, MetaKey, WeakCoordinator};
use crate::flow::{Flow, FlowHandle};

/// Callback fired once when a coordinator finishes
pub type OnFinish<M> = Box<dyn FnOnce(&Coordinator<M>)>;

/// Generic unit of a navigation flow
///
/// Owns its children, holds the startup meta `M`, and fires its finish
/// callback at most once. Concrete flows embed a `Coordinator` (directly or
/// through a `NavigationCoordinator`) and expose it via [`Flow`].
pub struct Coordinator<M> {
    children: ChildRegistry,
    meta: Option<M>,
    on_finish: Option<OnFinish<M>>,
    parent: Option<WeakCoordinator>,
    this: Option<WeakCoordinator>,
    finished: bool,
}

impl<M: 'static> Default for Coordinator<M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M: 'static> Coordinator<M> {
    pub fn new() -> Self {
        debug!(meta = %MetaKey::of::<M>(), "Coordinator::new: called");
        Self {
            children: ChildRegistry::new(),
            meta: None,
            on_finish: None,
            parent: None,
            this: None,
            finished: false,
        }
    }

    /// Store the startup meta
    ///
    /// Callers start a coordinator once; a second call replaces the meta and
    /// logs a warning.
    pub fn start(&mut self, meta: M) {
        if self.meta.is_some() {
            warn!(meta = %MetaKey::of::<M>(), "Coordinator::start: already started, replacing meta");
        } else {
            debug!(meta = %MetaKey::of::<M>(), "Coordinator::start: called");
        }
        self.meta = Some(meta);
    }

    /// The startup meta
    ///
    /// # Panics
    ///
    /// Panics if called before [`Coordinator::start`]. Reading the meta of an
    /// unstarted coordinator is a programming error.
    pub fn meta(&self) -> &M {
        match &self.meta {
            Some(meta) => meta,
            None => panic!("Coordinator<{}>::meta read before start", MetaKey::of::<M>()),
        }
    }

    /// The startup meta, or `None` before start
    pub fn try_meta(&self) -> Option<&M> {
        self.meta.as_ref()
    }

    pub fn is_started(&self) -> bool {
        self.meta.is_some()
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Register the callback fired when this coordinator finishes
    pub fn set_on_finish(&mut self, callback: impl FnOnce(&Coordinator<M>) + 'static) {
        self.on_finish = Some(Box::new(callback));
    }

    /// Mark finished and fire the finish callback
    ///
    /// Only the first call has any effect.
    pub fn finish(&mut self) {
        if self.finished {
            debug!(meta = %MetaKey::of::<M>(), "Coordinator::finish: already finished");
            return;
        }
        self.finished = true;
        info!(meta = %MetaKey::of::<M>(), children = self.children.len(), "Coordinator finished");

        if let Some(callback) = self.on_finish.take() {
            callback(self);
        }
    }

    /// Weak reference to the owning coordinator, if any
    pub fn parent(&self) -> Option<&WeakCoordinator> {
        self.parent.as_ref()
    }

    /// Weak reference to this coordinator's own handle
    pub fn this(&self) -> Option<&WeakCoordinator> {
        self.this.as_ref()
    }

    /// Append a child and point its parent link at this coordinator
    pub fn add<C: Flow>(&mut self, child: &FlowHandle<C>) {
        let erased = AnyCoordinator::new(child);
        debug!(child = %erased.key(), meta = %erased.meta(), "Coordinator::add: called");

        match &self.this {
            Some(this) => child.borrow_mut().coordinator_mut().set_parent(this.clone()),
            None => warn!(
                child = %erased.key(),
                "Coordinator::add: coordinator has no handle, child gets no parent link"
            ),
        }

        self.children.push(erased);
    }

    /// Remove every child of concrete type `C`
    pub fn remove_type<C: Flow>(&mut self) -> usize {
        let key = CoordinatorKey::of::<C>();
        let removed = self.children.remove_where(|child| child.key() == key);
        debug!(%key, removed, "Coordinator::remove_type: done");
        removed
    }

    /// Remove a child by instance
    ///
    /// Matching is by the instance's concrete type, so any sibling of the same
    /// type goes too.
    pub fn remove_instance<C: Flow>(&mut self, child: &FlowHandle<C>) -> usize {
        debug!(child = ?Rc::as_ptr(child), "Coordinator::remove_instance: removing by type");
        self.remove_type::<C>()
    }

    /// Remove every child started with meta type `T`
    pub fn remove_meta<T: 'static>(&mut self) -> usize {
        let meta = MetaKey::of::<T>();
        let removed = self.children.remove_where(|child| child.meta() == meta);
        debug!(%meta, removed, "Coordinator::remove_meta: done");
        removed
    }

    /// Remove every child sharing `child`'s meta type
    pub fn remove(&mut self, child: &AnyCoordinator) -> usize {
        let meta = child.meta();
        let removed = self.children.remove_where(|c| c.meta() == meta);
        debug!(%meta, removed, "Coordinator::remove: done");
        removed
    }

    pub fn remove_all(&mut self) {
        let removed = self.children.clear();
        debug!(removed, "Coordinator::remove_all: done");
    }

    /// Snapshot of the children, in insertion order
    pub fn children(&self) -> Vec<AnyCoordinator> {
        self.children.snapshot()
    }

    pub fn child_count(&self) -> usize {
        self.children.len()
    }

    /// First child of concrete type `C`
    pub fn child<C: Flow>(&self) -> Option<FlowHandle<C>> {
        self.children.snapshot().iter().find_map(AnyCoordinator::downcast::<C>)
    }

    pub(crate) fn registry(&self) -> &ChildRegistry {
        &self.children
    }

    pub(crate) fn bind_handle(&mut self, this: WeakCoordinator) {
        self.this = Some(this);
    }

    pub(crate) fn set_parent(&mut self, parent: WeakCoordinator) {
        if let Some(old) = &self.parent {
            warn!(old = %old.key(), new = %parent.key(), "Coordinator::set_parent: replacing existing parent");
        }
        self.parent = Some(parent);
    }

    /// Ask the parent to drop this coordinator
    pub(crate) fn detach_from_parent(&mut self) {
        let Some(parent) = self.parent.take() else {
            return;
        };
        let removed = parent.remove_meta(MetaKey::of::<M>());
        debug!(parent = %parent.key(), removed, "Coordinator::detach_from_parent: done");
    }
}
