//! Execution context.
//!
//! A `Session` records, once at construction, whether this process is the
//! host (direct calls are legal) or an external client (calls ship over
//! the channel). It is injected into every entity proxy rather than held
//! as process-global state, so both modes can coexist in one process.

use crate::dispatch;
use crate::entity::HostEntity;
use crate::error::{BridgeError, Result};
use crate::host::SharedHost;
use crate::locator::Locator;
use crate::project::Project;
use crate::protocol::{
    ops, BridgeConfig, CallRequest, FailureKind, FromValue, HostRequest, HostResponse, Value,
};
use crate::remote::RemoteBridge;
use crate::window::Window;
use std::fmt;
use std::sync::Arc;

/// Which call path this session uses. Fixed at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionMode {
    /// Running inside the host; operations execute directly against the
    /// host API.
    InHost,
    /// External process with a live channel to the in-host call server.
    Connected,
    /// External process without a reachable transport; every dispatch
    /// fails with a connection error, nothing falls back to direct calls.
    Disconnected,
}

enum SessionInner {
    InHost(SharedHost),
    Connected(RemoteBridge),
    Disconnected,
}

/// Cheap-clone handle carried by every entity proxy.
#[derive(Clone)]
pub struct Session {
    inner: Arc<SessionInner>,
}

impl Session {
    /// Session for code already running inside the host.
    pub fn in_host(host: SharedHost) -> Self {
        Self {
            inner: Arc::new(SessionInner::InHost(host)),
        }
    }

    /// Connect to an in-host call server. Fails eagerly when the host is
    /// unreachable after the configured retry budget.
    pub fn connect(config: BridgeConfig) -> Result<Self> {
        let bridge = RemoteBridge::connect(config)?;
        Ok(Self {
            inner: Arc::new(SessionInner::Connected(bridge)),
        })
    }

    /// Session with no transport. Useful for representing a client whose
    /// host went away, and in tests.
    pub fn disconnected() -> Self {
        Self {
            inner: Arc::new(SessionInner::Disconnected),
        }
    }

    pub fn mode(&self) -> SessionMode {
        match &*self.inner {
            SessionInner::InHost(_) => SessionMode::InHost,
            SessionInner::Connected(_) => SessionMode::Connected,
            SessionInner::Disconnected => SessionMode::Disconnected,
        }
    }

    pub fn is_in_host(&self) -> bool {
        self.mode() == SessionMode::InHost
    }

    /// The host's currently open project.
    pub fn current_project(&self) -> Result<Project> {
        let value = self.call(Locator::Host, ops::HOST_CURRENT_PROJECT, [])?;
        self.rehydrate(value)
    }

    /// Host version string.
    pub fn version(&self) -> Result<String> {
        let value = self.call(Locator::Host, ops::HOST_VERSION, [])?;
        Ok(String::from_value(value)?)
    }

    /// The host's main window.
    pub fn main_window(&self) -> Result<Window> {
        let value = self.call(Locator::Host, ops::HOST_MAIN_WINDOW, [])?;
        self.rehydrate(value)
    }

    /// Route one call through the path fixed at construction.
    pub(crate) fn call(
        &self,
        target: Locator,
        method: &'static str,
        args: impl IntoIterator<Item = Value>,
    ) -> Result<Value> {
        let request = CallRequest::new(target, method, args);
        match &*self.inner {
            SessionInner::InHost(host) => {
                let mut guard = host.lock();
                dispatch::execute(&mut *guard, &request).map_err(BridgeError::from)
            }
            SessionInner::Connected(bridge) => {
                match bridge.call(HostRequest::Call(request))? {
                    HostResponse::Success(value) => Ok(value),
                    HostResponse::Failure { kind, message } => {
                        Err(failure_to_error(kind, message))
                    }
                    HostResponse::BatchSuccess(_) => Err(BridgeError::Protocol(
                        "batch response to a single call".to_string(),
                    )),
                }
            }
            SessionInner::Disconnected => Err(disconnected_error()),
        }
    }

    /// Ship several calls as one request. Executed in order; a failure
    /// aborts the remainder but keeps already-applied writes.
    pub(crate) fn batch(&self, calls: Vec<CallRequest>) -> Result<Vec<Value>> {
        if calls.is_empty() {
            return Ok(Vec::new());
        }
        let request = HostRequest::Batch(calls);
        let response = match &*self.inner {
            SessionInner::InHost(host) => {
                let mut guard = host.lock();
                dispatch::execute_request(&mut *guard, &request)
            }
            SessionInner::Connected(bridge) => bridge.call(request)?,
            SessionInner::Disconnected => return Err(disconnected_error()),
        };
        match response {
            HostResponse::BatchSuccess(values) => Ok(values),
            HostResponse::Failure { kind, message } => Err(failure_to_error(kind, message)),
            HostResponse::Success(_) => Err(BridgeError::Protocol(
                "single response to a batch".to_string(),
            )),
        }
    }

    /// Rebuild a typed proxy from a locator found in a response.
    pub(crate) fn rehydrate<E: HostEntity>(&self, value: Value) -> Result<E> {
        let locator = Locator::from_value(value)?;
        E::from_locator(self.clone(), locator)
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session").field("mode", &self.mode()).finish()
    }
}

fn failure_to_error(kind: FailureKind, message: String) -> BridgeError {
    match kind {
        FailureKind::RemoteExecution => BridgeError::RemoteExecution { message },
        FailureKind::LocatorResolution => BridgeError::LocatorResolution { locator: message },
        FailureKind::UnsupportedType => BridgeError::UnsupportedType { context: message },
    }
}

fn disconnected_error() -> BridgeError {
    BridgeError::Connection("session is disconnected; no transport is reachable".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::{shared, MemoryHost};

    #[test]
    fn test_in_host_session_executes_directly() {
        let session = Session::in_host(shared(MemoryHost::new()));
        assert!(session.is_in_host());
        assert_eq!(session.mode(), SessionMode::InHost);

        let project = session.current_project().unwrap();
        assert_eq!(project.name().unwrap(), "Untitled");
    }

    #[test]
    fn test_disconnected_session_fails_without_host_mutation() {
        let session = Session::disconnected();
        assert_eq!(session.mode(), SessionMode::Disconnected);

        let err = session.current_project().unwrap_err();
        assert!(matches!(err, BridgeError::Connection(_)));
    }

    #[test]
    fn test_version_reads_host_string() {
        let session = Session::in_host(shared(MemoryHost::new()));
        assert!(session.version().unwrap().starts_with("dawlink-memory"));
    }

    #[test]
    fn test_main_window_rehydrates() {
        let session = Session::in_host(shared(MemoryHost::new()));
        let window = session.main_window().unwrap();
        assert_eq!(window.title().unwrap(), "Main");
    }
}
