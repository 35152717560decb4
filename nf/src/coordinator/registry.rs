//! Type-erased coordinator references
//!
//! A parent holds children of unrelated concrete types in one list. Each
//! entry keeps two identities: the concrete coordinator type
//! ([`CoordinatorKey`]) and the startup meta type ([`MetaKey`]). Removal and
//! equality work at type level, so two live siblings of the same concrete type
//! cannot be told apart.

use std::any::{Any, TypeId, type_name};
use std::cell::RefCell;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::rc::{Rc, Weak};

use tracing::debug;

use crate::flow::{Flow, FlowHandle};
use crate::host::short_type_name;

macro_rules! type_key {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Clone, Copy)]
        pub struct $name {
            id: TypeId,
            name: &'static str,
        }

        impl $name {
            pub fn of<T: 'static>() -> Self {
                Self {
                    id: TypeId::of::<T>(),
                    name: short_type_name(type_name::<T>()),
                }
            }

            /// Type name without its module path
            pub fn name(&self) -> &'static str {
                self.name
            }
        }

        impl PartialEq for $name {
            fn eq(&self, other: &Self) -> bool {
                self.id == other.id
            }
        }

        impl Eq for $name {}

        impl Hash for $name {
            fn hash<H: Hasher>(&self, state: &mut H) {
                self.id.hash(state);
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.name)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.name)
            }
        }
    };
}

type_key!(
    /// Identity of a concrete coordinator type
    CoordinatorKey
);

type_key!(
    /// Identity of a startup meta type
    MetaKey
);

type Children = RefCell<Vec<AnyCoordinator>>;

/// Ordered children of one coordinator
///
/// The list lives behind its own `Rc` so a child can detach itself through a
/// weak reference without borrowing the parent coordinator.
#[derive(Clone, Default)]
pub(crate) struct ChildRegistry {
    inner: Rc<Children>,
}

impl ChildRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, child: AnyCoordinator) {
        self.inner.borrow_mut().push(child);
    }

    /// Remove every child matching `predicate`, returning how many went
    pub fn remove_where(&self, predicate: impl FnMut(&AnyCoordinator) -> bool) -> usize {
        remove_where(&self.inner, predicate)
    }

    pub fn clear(&self) -> usize {
        self.remove_where(|_| true)
    }

    /// Copy of the current children, in insertion order
    pub fn snapshot(&self) -> Vec<AnyCoordinator> {
        self.inner.borrow().clone()
    }

    pub fn len(&self) -> usize {
        self.inner.borrow().len()
    }

    fn downgrade(&self) -> Weak<Children> {
        Rc::downgrade(&self.inner)
    }
}

// Removed children are dropped after the borrow ends, so a child whose last
// strong reference lived here can tear down without touching this list.
fn remove_where(children: &Children, mut predicate: impl FnMut(&AnyCoordinator) -> bool) -> usize {
    let removed: Vec<AnyCoordinator> = {
        let mut list = children.borrow_mut();
        let (removed, kept) = list.drain(..).partition(|child| predicate(child));
        *list = kept;
        removed
    };
    removed.len()
}

fn remove_meta_from(children: &Weak<Children>, meta: MetaKey) -> usize {
    match children.upgrade() {
        Some(children) => {
            let removed = remove_where(&children, |child| child.meta == meta);
            debug!(%meta, removed, "remove_meta_from: done");
            removed
        }
        None => {
            debug!(%meta, "remove_meta_from: owner already dropped");
            0
        }
    }
}

/// Strong, type-erased reference to a coordinator
#[derive(Clone)]
pub struct AnyCoordinator {
    coordinator: Rc<dyn Any>,
    key: CoordinatorKey,
    meta: MetaKey,
    children: Weak<Children>,
}

impl AnyCoordinator {
    /// Erase a flow handle
    pub fn new<C: Flow>(handle: &FlowHandle<C>) -> Self {
        let children = handle.borrow().coordinator().registry().downgrade();
        let coordinator: Rc<dyn Any> = handle.clone();
        Self {
            coordinator,
            key: CoordinatorKey::of::<C>(),
            meta: MetaKey::of::<C::Meta>(),
            children,
        }
    }

    pub fn key(&self) -> CoordinatorKey {
        self.key
    }

    pub fn meta(&self) -> MetaKey {
        self.meta
    }

    /// Whether the erased coordinator is of concrete type `C`
    pub fn is<C: Flow>(&self) -> bool {
        self.key == CoordinatorKey::of::<C>()
    }

    /// Recover the typed handle
    pub fn downcast<C: Flow>(&self) -> Option<FlowHandle<C>> {
        self.coordinator.clone().downcast::<RefCell<C>>().ok()
    }

    /// Remove `child`'s meta type from this coordinator's children
    pub fn remove(&self, child: &AnyCoordinator) -> usize {
        remove_meta_from(&self.children, child.meta)
    }

    /// Remove every child with meta type `meta` from this coordinator
    pub fn remove_meta(&self, meta: MetaKey) -> usize {
        remove_meta_from(&self.children, meta)
    }

    /// Non-owning version of this reference
    pub fn downgrade(&self) -> WeakCoordinator {
        WeakCoordinator {
            coordinator: Rc::downgrade(&self.coordinator),
            key: self.key,
            meta: self.meta,
            children: self.children.clone(),
        }
    }
}

impl PartialEq for AnyCoordinator {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl Eq for AnyCoordinator {}

impl Hash for AnyCoordinator {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key.hash(state);
    }
}

impl fmt::Debug for AnyCoordinator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnyCoordinator")
            .field("key", &self.key)
            .field("meta", &self.meta)
            .finish()
    }
}

/// Weak, type-erased reference to a coordinator
///
/// Used for parent back-references; never extends the parent's lifetime.
#[derive(Clone)]
pub struct WeakCoordinator {
    coordinator: Weak<dyn Any>,
    key: CoordinatorKey,
    meta: MetaKey,
    children: Weak<Children>,
}

impl WeakCoordinator {
    pub fn new<C: Flow>(handle: &FlowHandle<C>) -> Self {
        AnyCoordinator::new(handle).downgrade()
    }

    pub fn key(&self) -> CoordinatorKey {
        self.key
    }

    pub fn meta(&self) -> MetaKey {
        self.meta
    }

    pub fn is_alive(&self) -> bool {
        self.coordinator.strong_count() > 0
    }

    pub fn upgrade(&self) -> Option<AnyCoordinator> {
        let coordinator = self.coordinator.upgrade()?;
        Some(AnyCoordinator {
            coordinator,
            key: self.key,
            meta: self.meta,
            children: self.children.clone(),
        })
    }

    /// Remove `child`'s meta type from the referenced coordinator's children
    pub fn remove(&self, child: &AnyCoordinator) -> usize {
        remove_meta_from(&self.children, child.meta)
    }

    pub fn remove_meta(&self, meta: MetaKey) -> usize {
        remove_meta_from(&self.children, meta)
    }
}

impl PartialEq for WeakCoordinator {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl Eq for WeakCoordinator {}

impl fmt::Debug for WeakCoordinator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WeakCoordinator")
            .field("key", &self.key)
            .field("meta", &self.meta)
            .field("alive", &self.is_alive())
            .finish()
    }
}
