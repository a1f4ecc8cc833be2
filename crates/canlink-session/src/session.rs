//! Session identity, status and handles

use std::borrow::Borrow;
use std::fmt;
use std::sync::Arc;

use canlink_core::Bus;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::watch;

/// Unique session identifier
///
/// Identifiers have the form `session_<unix-nanos>_<seq>`; the per-registry
/// sequence number keeps them distinct even when two sessions are created
/// within the same clock tick.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    pub(crate) fn generate(now: DateTime<Utc>, seq: u64) -> Self {
        let nanos = now
            .timestamp_nanos_opt()
            .unwrap_or_else(|| now.timestamp_micros().saturating_mul(1000));
        Self(format!("session_{}_{}", nanos, seq))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for SessionId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for SessionId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<String> for SessionId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for SessionId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Lifecycle status of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    Active,
    Inactive,
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionStatus::Active => f.write_str("active"),
            SessionStatus::Inactive => f.write_str("inactive"),
        }
    }
}

/// Serializable snapshot of a session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionInfo {
    pub id: SessionId,
    pub channel: String,
    pub created_at: DateTime<Utc>,
    pub status: SessionStatus,
    /// Transport behind the session's bus ("mock", "replay", ...)
    pub driver: String,
}

/// Registry entry: owns the session's bus and publishes its status
pub(crate) struct Session {
    pub(crate) id: SessionId,
    pub(crate) channel: String,
    pub(crate) created_at: DateTime<Utc>,
    pub(crate) bus: Arc<Bus>,
    pub(crate) status: watch::Sender<SessionStatus>,
}

impl Session {
    pub(crate) fn new(id: SessionId, channel: String, bus: Bus) -> Self {
        let (status, _) = watch::channel(SessionStatus::Active);
        Self {
            id,
            channel,
            created_at: Utc::now(),
            bus: Arc::new(bus),
            status,
        }
    }

    pub(crate) fn info(&self) -> SessionInfo {
        SessionInfo {
            id: self.id.clone(),
            channel: self.channel.clone(),
            created_at: self.created_at,
            status: *self.status.borrow(),
            driver: self.bus.driver_kind().to_string(),
        }
    }

    pub(crate) fn handle(&self) -> SessionHandle {
        SessionHandle {
            id: self.id.clone(),
            channel: self.channel.clone(),
            bus: self.bus.clone(),
            status: self.status.subscribe(),
        }
    }

    /// Mark inactive; subscribers waiting on the status see it immediately
    pub(crate) fn deactivate(&self) {
        self.status.send_replace(SessionStatus::Inactive);
    }
}

/// Reference to an active session's bus, obtained from a registry lookup
///
/// The handle keeps its own reference to the bus, so an operation already in
/// flight completes even if the session is disconnected meanwhile.
#[derive(Debug, Clone)]
pub struct SessionHandle {
    id: SessionId,
    channel: String,
    bus: Arc<Bus>,
    status: watch::Receiver<SessionStatus>,
}

impl SessionHandle {
    pub fn id(&self) -> &SessionId {
        &self.id
    }

    pub fn channel(&self) -> &str {
        &self.channel
    }

    pub fn bus(&self) -> &Arc<Bus> {
        &self.bus
    }

    /// Current status as last published by the registry
    pub fn status(&self) -> SessionStatus {
        *self.status.borrow()
    }

    pub fn is_active(&self) -> bool {
        self.status() == SessionStatus::Active
    }

    /// Receiver for status changes
    pub fn status_receiver(&self) -> watch::Receiver<SessionStatus> {
        self.status.clone()
    }

    /// Resolves once the session has been disconnected (or the registry dropped)
    pub async fn closed(&self) {
        let mut status = self.status.clone();
        let _ = status.wait_for(|s| *s == SessionStatus::Inactive).await;
    }
}
