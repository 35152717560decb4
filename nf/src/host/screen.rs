//! Screens and screen identity
//!
//! A screen is opaque to the engine. Two things matter about it: *which*
//! instance it is (pointer identity, used by reconciliation) and *what kind*
//! it is (used by `PopTo` matching).

use std::any::{TypeId, type_name};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::rc::Rc;

/// An opaque unit of UI shown by a screen-stack host
pub trait Screen: fmt::Debug + 'static {
    /// Human readable title used in logs and reports
    fn title(&self) -> String {
        short_type_name(type_name::<Self>()).to_string()
    }

    /// Kind used when popping to a screen by kind
    fn kind(&self) -> ScreenKind
    where
        Self: Sized,
    {
        ScreenKind::of::<Self>()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum KindKey {
    Type(TypeId),
    Named(String),
}

/// Identity of a screen's kind
///
/// Either a concrete Rust type or a free-form name. Names let scripted screens,
/// which all share one Rust type, still be told apart.
#[derive(Clone)]
pub struct ScreenKind {
    key: KindKey,
    name: String,
}

impl ScreenKind {
    /// Kind of the concrete screen type `S`
    pub fn of<S: Screen>() -> Self {
        Self {
            key: KindKey::Type(TypeId::of::<S>()),
            name: short_type_name(type_name::<S>()).to_string(),
        }
    }

    /// Kind identified by name only
    pub fn named(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            key: KindKey::Named(name.clone()),
            name,
        }
    }

    /// Display name of this kind
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl PartialEq for ScreenKind {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl Eq for ScreenKind {}

impl Hash for ScreenKind {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key.hash(state);
    }
}

impl fmt::Debug for ScreenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ScreenKind({})", self.name)
    }
}

impl fmt::Display for ScreenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// Shared reference to a screen instance
///
/// Cloning is cheap. Equality is instance identity, never structural: two
/// handles are equal only if they point at the same screen.
#[derive(Clone)]
pub struct ScreenHandle {
    screen: Rc<dyn Screen>,
    kind: ScreenKind,
    title: String,
}

impl ScreenHandle {
    /// Wrap a screen into a new handle
    pub fn new<S: Screen>(screen: S) -> Self {
        let kind = screen.kind();
        let title = screen.title();
        Self {
            screen: Rc::new(screen),
            kind,
            title,
        }
    }

    /// Kind of the wrapped screen
    pub fn kind(&self) -> &ScreenKind {
        &self.kind
    }

    /// Title of the wrapped screen
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Whether the wrapped screen is of kind `S`
    pub fn is<S: Screen>(&self) -> bool {
        self.kind == ScreenKind::of::<S>()
    }

    /// Borrow the wrapped screen
    pub fn screen(&self) -> &dyn Screen {
        self.screen.as_ref()
    }
}

impl PartialEq for ScreenHandle {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::addr_eq(Rc::as_ptr(&self.screen), Rc::as_ptr(&other.screen))
    }
}

impl Eq for ScreenHandle {}

impl fmt::Debug for ScreenHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Screen({}@{:p})", self.title, Rc::as_ptr(&self.screen) as *const ())
    }
}

impl fmt::Display for ScreenHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.title)
    }
}

/// Titles of a sequence of screens, in order
pub fn titles(screens: &[ScreenHandle]) -> Vec<String> {
    screens.iter().map(|s| s.title().to_string()).collect()
}

/// Strip the module path from a type name, keeping generic arguments intact
pub(crate) fn short_type_name(name: &'static str) -> &'static str {
    let base = name.split('<').next().unwrap_or(name);
    match base.rfind("::") {
        Some(idx) => &name[idx + 2..],
        None => name,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Login;
    impl Screen for Login {}

    #[derive(Debug)]
    struct Profile;
    impl Screen for Profile {}

    #[derive(Debug)]
    struct Named(&'static str);
    impl Screen for Named {
        fn title(&self) -> String {
            self.0.to_string()
        }

        fn kind(&self) -> ScreenKind {
            ScreenKind::named(self.0)
        }
    }

    #[test]
    fn test_handle_equality_is_instance_identity() {
        let a = ScreenHandle::new(Login);
        let b = ScreenHandle::new(Login);
        assert_eq!(a, a.clone());
        assert_ne!(a, b);
    }

    #[test]
    fn test_kind_matches_concrete_type() {
        let login = ScreenHandle::new(Login);
        assert!(login.is::<Login>());
        assert!(!login.is::<Profile>());
        assert_eq!(login.kind(), &ScreenKind::of::<Login>());
        assert_eq!(login.title(), "Login");
    }

    #[test]
    fn test_named_kinds() {
        let a = ScreenHandle::new(Named("settings"));
        assert_eq!(a.kind(), &ScreenKind::named("settings"));
        assert_ne!(a.kind(), &ScreenKind::named("profile"));
        assert_eq!(a.to_string(), "settings");
    }

    #[test]
    fn test_short_type_name() {
        assert_eq!(short_type_name("a::b::Login"), "Login");
        assert_eq!(short_type_name("Login"), "Login");
        assert_eq!(short_type_name("a::Wrapper<b::Inner>"), "Wrapper<b::Inner>");
    }

    #[test]
    fn test_titles() {
        let screens = vec![ScreenHandle::new(Named("a")), ScreenHandle::new(Named("b"))];
        assert_eq!(titles(&screens), vec!["a", "b"]);
    }
}
