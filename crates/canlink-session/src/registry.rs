//! Concurrent session registry

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use canlink_core::{Bus, DriverFactory, Frame};
use chrono::Utc;
use parking_lot::RwLock;
use tracing::{debug, info};

use crate::error::SessionError;
use crate::session::{Session, SessionHandle, SessionId, SessionInfo};

/// Maps session identifiers to active sessions
///
/// Every session in the map is active: disconnect marks a session inactive
/// and removes it in the same critical section. The lock is held only for the
/// map operation itself; driver creation and bus I/O happen outside it.
pub struct SessionRegistry {
    factory: Arc<dyn DriverFactory>,
    sessions: RwLock<HashMap<SessionId, Session>>,
    sequence: AtomicU64,
}

impl SessionRegistry {
    pub fn new(factory: Arc<dyn DriverFactory>) -> Self {
        Self {
            factory,
            sessions: RwLock::new(HashMap::new()),
            sequence: AtomicU64::new(0),
        }
    }

    /// Open a session on `channel` and return its identifier
    ///
    /// Fails only if the driver factory does; the registry is left unchanged
    /// in that case.
    pub async fn connect(&self, channel: &str) -> Result<SessionId, SessionError> {
        let driver = self.factory.create(channel).await?;
        let bus = Bus::new(driver);

        let seq = self.sequence.fetch_add(1, Ordering::Relaxed);
        let id = SessionId::generate(Utc::now(), seq);
        let session = Session::new(id.clone(), channel.to_string(), bus);
        let driver_kind = session.bus.driver_kind();

        self.sessions.write().insert(id.clone(), session);

        info!(session_id = %id, channel, driver = driver_kind, "Session connected");
        Ok(id)
    }

    /// Close a session
    ///
    /// Returns whether a session was removed. Unknown identifiers are a no-op,
    /// so repeated calls are safe.
    pub fn disconnect(&self, id: &str) -> bool {
        let removed = {
            let mut sessions = self.sessions.write();
            sessions.remove(id).map(|session| {
                session.deactivate();
                session
            })
        };

        match removed {
            Some(session) => {
                info!(session_id = %session.id, channel = %session.channel, "Session disconnected");
                true
            }
            None => {
                debug!(session_id = id, "Disconnect for unknown session ignored");
                false
            }
        }
    }

    /// Handle to an active session's bus
    pub fn lookup(&self, id: &str) -> Option<SessionHandle> {
        self.sessions.read().get(id).map(Session::handle)
    }

    /// Like [`lookup`](Self::lookup), but reports a missing session as an error
    pub fn require(&self, id: &str) -> Result<SessionHandle, SessionError> {
        self.lookup(id)
            .ok_or_else(|| SessionError::NotFound(id.to_string()))
    }

    /// Transmit a frame on a session's bus
    pub async fn send(&self, id: &str, frame: &Frame) -> Result<(), SessionError> {
        let handle = self.require(id)?;
        handle.bus().send(frame).await?;
        debug!(session_id = id, %frame, "Frame sent");
        Ok(())
    }

    /// Snapshot of all active sessions, oldest first
    pub fn list(&self) -> Vec<SessionInfo> {
        let mut infos: Vec<SessionInfo> =
            self.sessions.read().values().map(Session::info).collect();
        infos.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then_with(|| a.id.cmp(&b.id))
        });
        infos
    }

    pub fn get(&self, id: &str) -> Option<SessionInfo> {
        self.sessions.read().get(id).map(Session::info)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.sessions.read().contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.sessions.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.read().is_empty()
    }
}

impl std::fmt::Debug for SessionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionRegistry")
            .field("sessions", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::SessionStatus;
    use canlink_core::{Driver, DriverError, DriverResult};
    use canlink_driver::MockDriver;

    struct FailingFactory;

    #[async_trait::async_trait]
    impl DriverFactory for FailingFactory {
        async fn create(&self, channel: &str) -> DriverResult<Box<dyn Driver>> {
            Err(DriverError::Unsupported(channel.to_string()))
        }
    }

    struct MockFactory;

    #[async_trait::async_trait]
    impl DriverFactory for MockFactory {
        async fn create(&self, _channel: &str) -> DriverResult<Box<dyn Driver>> {
            Ok(Box::new(MockDriver::with_frames([])))
        }
    }

    #[tokio::test]
    async fn test_factory_failure_leaves_registry_empty() {
        let registry = SessionRegistry::new(Arc::new(FailingFactory));
        let err = registry.connect("vcan9").await.unwrap_err();
        assert_eq!(
            err,
            SessionError::Driver(DriverError::Unsupported("vcan9".into()))
        );
        assert!(registry.is_empty());
    }

    #[tokio::test]
    async fn test_info_and_list() {
        let registry = SessionRegistry::new(Arc::new(MockFactory));
        let a = registry.connect("can0").await.unwrap();
        let b = registry.connect("can1").await.unwrap();

        let info = registry.get(a.as_str()).unwrap();
        assert_eq!(info.channel, "can0");
        assert_eq!(info.status, SessionStatus::Active);
        assert_eq!(info.driver, "mock");

        let ids: Vec<SessionId> = registry.list().into_iter().map(|i| i.id).collect();
        assert_eq!(ids, vec![a.clone(), b]);
        assert!(registry.contains(a.as_str()));
    }

    #[tokio::test]
    async fn test_handle_survives_disconnect() {
        let registry = SessionRegistry::new(Arc::new(MockFactory));
        let id = registry.connect("can0").await.unwrap();
        let handle = registry.lookup(id.as_str()).unwrap();
        assert!(handle.is_active());

        assert!(registry.disconnect(id.as_str()));
        assert_eq!(handle.status(), SessionStatus::Inactive);
        handle.closed().await;

        // The bus is still usable through the handle
        handle.bus().send(&Frame::new(1, vec![1])).await.unwrap();
        assert!(registry.lookup(id.as_str()).is_none());
    }
}
