//! Window proxy.
//!
//! Windows are located by an opaque platform handle; no liveness checking
//! happens beyond the host's own resolution.

use crate::entity::{host_entity, HostEntity};
use crate::error::Result;
use crate::locator::EntityKind;
use crate::protocol::ops;

host_entity! {
    /// A host window.
    Window => EntityKind::Window
}

impl Window {
    pub fn title(&self) -> Result<String> {
        self.invoke(ops::WINDOW_GET_TITLE, [])
    }

    pub fn refresh(&self) -> Result<()> {
        self.invoke(ops::WINDOW_REFRESH, [])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BridgeError;
    use crate::host::{shared, MemoryHost};
    use crate::locator::Locator;
    use crate::session::Session;

    #[test]
    fn test_main_window_refresh() {
        let session = Session::in_host(shared(MemoryHost::new()));
        let window = session.main_window().unwrap();
        window.refresh().unwrap();
    }

    #[test]
    fn test_unknown_handle_is_stale() {
        let session = Session::in_host(shared(MemoryHost::new()));
        let window =
            Window::from_locator(session, Locator::Window { handle: 0xdead }).unwrap();
        assert!(matches!(
            window.title().unwrap_err(),
            BridgeError::LocatorResolution { .. }
        ));
    }
}
