//! Root flow of an application

use tracing::info;

use crate::coordinator::Coordinator;
use crate::flow::{Flow, FlowHandle};
use crate::host::SharedHost;
use crate::navigation::NavigationCoordinator;

/// Startup configuration of the root flow
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AppMeta;

/// Root of the coordinator tree
///
/// Owns the shared host for the lifetime of the application. Feature flows are
/// added as its children.
pub struct AppCoordinator {
    navigation: NavigationCoordinator<AppMeta>,
}

impl AppCoordinator {
    pub fn new(host: SharedHost) -> Self {
        Self {
            navigation: NavigationCoordinator::new(host),
        }
    }

    /// Build, wrap and start the root flow
    pub fn launch(host: SharedHost) -> FlowHandle<Self> {
        let app = Self::new(host).into_handle();
        app.borrow_mut().start(AppMeta);
        app
    }

    pub fn host(&self) -> &SharedHost {
        self.navigation.host()
    }
}

impl Flow for AppCoordinator {
    type Meta = AppMeta;

    fn coordinator(&self) -> &Coordinator<AppMeta> {
        self.navigation.coordinator()
    }

    fn coordinator_mut(&mut self) -> &mut Coordinator<AppMeta> {
        self.navigation.coordinator_mut()
    }

    fn navigation(&mut self) -> Option<&mut NavigationCoordinator<AppMeta>> {
        Some(&mut self.navigation)
    }

    fn start(&mut self, meta: AppMeta) {
        self.navigation.start(meta);
        self.navigation.host().borrow_mut().make_key_and_visible();
        info!("AppCoordinator started");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::ScreenStackHost;
    use crate::sim::MemoryHost;

    #[test]
    fn test_launch_makes_host_key_and_takes_delegate() {
        let memory = MemoryHost::shared();
        let app = AppCoordinator::launch(memory.clone());

        assert!(memory.borrow().is_key());
        assert!(app.borrow().coordinator().is_started());
        let ours = app.borrow_mut().navigation().and_then(|n| n.delegate().cloned());
        assert_eq!(memory.borrow().delegate(), ours);
    }

    #[test]
    fn test_new_is_not_started() {
        let app = AppCoordinator::new(MemoryHost::shared());
        assert!(!app.coordinator().is_started());
        assert!(app.coordinator().try_meta().is_none());
    }
}
