//! Streaming audio accessor proxy.
//!
//! The locator refers to a host-side streaming handle that is invisible to
//! client-side memory management: nothing frees it except an explicit
//! release. `Item::with_audio_accessor` is the scoped form and the
//! recommended way to use one; `Drop` only backstops a forgotten release
//! with a warning.

use crate::entity::HostEntity;
use crate::error::{BridgeError, Result};
use crate::locator::{EntityKind, Locator};
use crate::protocol::{ops, Value};
use crate::session::Session;
use std::sync::atomic::{AtomicBool, Ordering};

/// Host-side streaming handle for reading item audio sample windows.
#[derive(Debug)]
pub struct AudioAccessor {
    session: Session,
    locator: Locator,
    released: AtomicBool,
}

impl HostEntity for AudioAccessor {
    const KIND: EntityKind = EntityKind::AudioAccessor;

    fn from_parts(session: Session, locator: Locator) -> Self {
        Self {
            session,
            locator,
            released: AtomicBool::new(false),
        }
    }

    fn locator(&self) -> &Locator {
        &self.locator
    }

    fn session(&self) -> &Session {
        &self.session
    }
}

impl AudioAccessor {
    fn guard_released(&self) -> Result<()> {
        if self.released.load(Ordering::Acquire) {
            return Err(BridgeError::LocatorResolution {
                locator: self.locator.to_string(),
            });
        }
        Ok(())
    }

    /// Start of the accessible range, in seconds.
    pub fn start_time(&self) -> Result<f64> {
        self.guard_released()?;
        self.invoke(ops::ACCESSOR_START_TIME, [])
    }

    /// End of the accessible range, in seconds.
    pub fn end_time(&self) -> Result<f64> {
        self.guard_released()?;
        self.invoke(ops::ACCESSOR_END_TIME, [])
    }

    /// Read a window of `frames` samples starting at `start` seconds.
    pub fn read(&self, start: f64, frames: u32) -> Result<Vec<f64>> {
        self.guard_released()?;
        self.invoke(ops::ACCESSOR_READ, [Value::from(start), Value::from(frames)])
    }

    /// Release the host-side handle and invalidate this locator. Calling
    /// release again is a no-op with a warning, not an error: release
    /// ordering across failure paths cannot always be guaranteed by the
    /// caller.
    pub fn release(&self) -> Result<()> {
        if self.released.swap(true, Ordering::AcqRel) {
            tracing::warn!(accessor = %self.locator, "audio accessor already released");
            return Ok(());
        }
        self.invoke(ops::ACCESSOR_RELEASE, [])
    }

    pub fn is_released(&self) -> bool {
        self.released.load(Ordering::Acquire)
    }
}

impl PartialEq for AudioAccessor {
    fn eq(&self, other: &Self) -> bool {
        self.locator == other.locator
    }
}

impl Eq for AudioAccessor {}

impl std::hash::Hash for AudioAccessor {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        std::hash::Hash::hash(&self.locator, state);
    }
}

impl Drop for AudioAccessor {
    fn drop(&mut self) {
        if !self.released.load(Ordering::Acquire) {
            tracing::warn!(accessor = %self.locator, "audio accessor dropped without release");
            if let Err(err) = self.release() {
                tracing::warn!(
                    accessor = %self.locator,
                    error = %err,
                    "release failed; host-side handle leaks"
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::{MemoryHost, SharedHost};
    use crate::item::Item;
    use parking_lot::Mutex;
    use std::sync::Arc;

    fn item_with_host() -> (Item, Arc<Mutex<MemoryHost>>) {
        let host = Arc::new(Mutex::new(MemoryHost::new()));
        let shared: SharedHost = host.clone();
        let session = Session::in_host(shared);
        let item = session
            .current_project()
            .unwrap()
            .add_track(0, "Audio")
            .unwrap()
            .add_item(0.0, 2.0)
            .unwrap();
        (item, host)
    }

    #[test]
    fn test_scoped_read_releases_exactly_once() {
        let (item, host) = item_with_host();
        let samples = item
            .with_audio_accessor(|accessor| accessor.read(0.0, 16))
            .unwrap();
        assert_eq!(samples.len(), 16);
        assert_eq!(host.lock().release_count(), 1);
        assert_eq!(host.lock().live_accessor_count(), 0);
    }

    #[test]
    fn test_scoped_release_happens_when_read_fails() {
        let (item, host) = item_with_host();
        let err = item
            .with_audio_accessor(|accessor| accessor.read(-1.0, 16))
            .unwrap_err();
        assert!(matches!(err, BridgeError::RemoteExecution { .. }));
        assert_eq!(host.lock().release_count(), 1);
        assert_eq!(host.lock().live_accessor_count(), 0);
    }

    #[test]
    fn test_double_release_is_warning_noop() {
        let (item, host) = item_with_host();
        let accessor = item.create_audio_accessor().unwrap();
        accessor.release().unwrap();
        accessor.release().unwrap();
        assert_eq!(host.lock().release_count(), 1);
    }

    #[test]
    fn test_use_after_release_is_stale_locator() {
        let (item, _host) = item_with_host();
        let accessor = item.create_audio_accessor().unwrap();
        accessor.release().unwrap();

        assert!(matches!(
            accessor.read(0.0, 4).unwrap_err(),
            BridgeError::LocatorResolution { .. }
        ));
        assert!(matches!(
            accessor.start_time().unwrap_err(),
            BridgeError::LocatorResolution { .. }
        ));
    }

    #[test]
    fn test_drop_backstop_releases_handle() {
        let (item, host) = item_with_host();
        {
            let _accessor = item.create_audio_accessor().unwrap();
            assert_eq!(host.lock().live_accessor_count(), 1);
        }
        assert_eq!(host.lock().live_accessor_count(), 0);
        assert_eq!(host.lock().release_count(), 1);
    }

    #[test]
    fn test_range_reflects_item_length() {
        let (item, _host) = item_with_host();
        item.with_audio_accessor(|accessor| {
            assert_eq!(accessor.start_time()?, 0.0);
            assert_eq!(accessor.end_time()?, 2.0);
            Ok(())
        })
        .unwrap();
    }
}
