//! Per-subscriber frame streaming
//!
//! A [`FrameSubscription`] attaches to one session's bus and, once turned
//! into a stream, polls the bus on a fixed interval. Every observed frame
//! whose identifier matches the filter is emitted as a [`FrameEvent`].
//!
//! ```text
//! Attached ──into_stream──▶ Emitting ──cancel / disconnect / exhausted──▶ Closed
//! ```
//!
//! An empty poll or a transient driver error is skipped; the stream only ends
//! when the subscriber cancels (or drops the stream), when the session is
//! disconnected, or when a finite source reports it is exhausted.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_stream::stream;
use canlink_core::{Bus, CanId, DriverResult, Frame, FrameEvent};
use futures::Stream;
use tokio::sync::watch;
use tokio::time::{interval, Interval, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::error::SessionError;
use crate::registry::SessionRegistry;
use crate::session::{SessionHandle, SessionStatus};

/// Default bus poll period
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Shortest accepted poll period
pub const MIN_POLL_INTERVAL: Duration = Duration::from_millis(1);

/// Streaming parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamConfig {
    /// Time between two bus observations, never below [`MIN_POLL_INTERVAL`]
    poll_interval: Duration,
}

impl StreamConfig {
    /// Periods shorter than [`MIN_POLL_INTERVAL`] (including zero) are raised to it
    pub const fn with_poll_interval(poll_interval: Duration) -> Self {
        let poll_interval = if poll_interval.as_nanos() < MIN_POLL_INTERVAL.as_nanos() {
            MIN_POLL_INTERVAL
        } else {
            poll_interval
        };
        Self { poll_interval }
    }

    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

/// Why a subscription stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseReason {
    /// Subscriber cancelled or dropped the stream
    Cancelled,
    /// Owning session was disconnected
    SessionClosed,
    /// Finite source fully consumed
    SourceExhausted,
}

impl fmt::Display for CloseReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CloseReason::Cancelled => f.write_str("cancelled"),
            CloseReason::SessionClosed => f.write_str("session closed"),
            CloseReason::SourceExhausted => f.write_str("source exhausted"),
        }
    }
}

/// Lifecycle of a subscription
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubscriptionState {
    Attached,
    Emitting,
    Closed(CloseReason),
}

impl SubscriptionState {
    pub fn is_closed(&self) -> bool {
        matches!(self, SubscriptionState::Closed(_))
    }
}

/// Subscription to one CAN identifier on one session
pub struct FrameSubscription {
    session: SessionHandle,
    can_id: CanId,
    config: StreamConfig,
    cancel: Arc<watch::Sender<bool>>,
    state: watch::Sender<SubscriptionState>,
}

impl FrameSubscription {
    /// Attach to an active session
    ///
    /// Fails with [`SessionError::NotFound`] if the session is not in the
    /// registry.
    pub fn attach(
        registry: &SessionRegistry,
        session_id: &str,
        can_id: CanId,
        config: StreamConfig,
    ) -> Result<Self, SessionError> {
        let session = registry.require(session_id)?;
        let (cancel, _) = watch::channel(false);
        let (state, _) = watch::channel(SubscriptionState::Attached);

        info!(
            session_id,
            can_id,
            poll_ms = config.poll_interval.as_millis() as u64,
            "Subscription attached"
        );

        Ok(Self {
            session,
            can_id,
            config,
            cancel: Arc::new(cancel),
            state,
        })
    }

    pub fn can_id(&self) -> CanId {
        self.can_id
    }

    pub fn session(&self) -> &SessionHandle {
        &self.session
    }

    pub fn state(&self) -> SubscriptionState {
        *self.state.borrow()
    }

    /// Handle for cancelling the subscription and observing its state
    pub fn handle(&self) -> SubscriptionHandle {
        SubscriptionHandle {
            cancel: self.cancel.clone(),
            state: self.state.subscribe(),
        }
    }

    /// Start emitting
    ///
    /// The stream finishes (returns `None`) when the subscription closes.
    /// Dropping it counts as cancellation.
    pub fn into_stream(self) -> impl Stream<Item = FrameEvent> + Send + 'static {
        let FrameSubscription {
            session,
            can_id,
            config,
            cancel,
            state,
        } = self;

        stream! {
            let guard = CloseGuard {
                session_id: session.id().to_string(),
                state,
            };
            guard.state.send_replace(SubscriptionState::Emitting);

            let bus = session.bus().clone();
            let mut cancel_rx = cancel.subscribe();
            let mut status_rx = session.status_receiver();
            let mut ticker = interval(config.poll_interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                match next_step(&mut ticker, &bus, &mut cancel_rx, &mut status_rx).await {
                    Step::Close(reason) => {
                        guard.close(reason);
                        break;
                    }
                    Step::Observed(Ok(frame)) => {
                        if frame.id() == can_id {
                            debug!(session_id = %session.id(), %frame, "Emitting frame");
                            yield FrameEvent::new(session.id().as_str(), can_id, frame);
                        }
                    }
                    Step::Observed(Err(e)) if e.is_no_frame() => {
                        if bus.is_exhausted() {
                            guard.close(CloseReason::SourceExhausted);
                            break;
                        }
                    }
                    Step::Observed(Err(e)) => {
                        warn!(session_id = %session.id(), error = %e, "Bus read failed");
                    }
                }
            }
        }
    }
}

impl fmt::Debug for FrameSubscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FrameSubscription")
            .field("session_id", self.session.id())
            .field("can_id", &self.can_id)
            .field("config", &self.config)
            .field("state", &self.state())
            .finish()
    }
}

/// Cancels a subscription from outside its stream
#[derive(Debug, Clone)]
pub struct SubscriptionHandle {
    cancel: Arc<watch::Sender<bool>>,
    state: watch::Receiver<SubscriptionState>,
}

impl SubscriptionHandle {
    /// Request the stream to stop; it ends within one poll period
    pub fn cancel(&self) {
        self.cancel.send_replace(true);
    }

    pub fn state(&self) -> SubscriptionState {
        *self.state.borrow()
    }

    /// Resolves once the subscription is closed, returning the reason
    pub async fn closed(&self) -> CloseReason {
        let mut state = self.state.clone();
        // Err: the subscription was dropped before it ever streamed
        let last = state
            .wait_for(SubscriptionState::is_closed)
            .await
            .map(|s| *s)
            .unwrap_or(SubscriptionState::Closed(CloseReason::Cancelled));
        match last {
            SubscriptionState::Closed(reason) => reason,
            _ => CloseReason::Cancelled,
        }
    }
}

impl SessionRegistry {
    /// Attach a frame subscription to a session
    pub fn subscribe(
        &self,
        session_id: &str,
        can_id: CanId,
        config: StreamConfig,
    ) -> Result<FrameSubscription, SessionError> {
        FrameSubscription::attach(self, session_id, can_id, config)
    }
}

enum Step {
    Close(CloseReason),
    Observed(DriverResult<Frame>),
}

/// Wait for the next tick, then observe the bus once
///
/// Cancellation and session close are checked before the tick and while the
/// read is pending, so neither waits for a slow driver.
async fn next_step(
    ticker: &mut Interval,
    bus: &Bus,
    cancel: &mut watch::Receiver<bool>,
    status: &mut watch::Receiver<SessionStatus>,
) -> Step {
    tokio::select! {
        biased;
        reason = close_signal(cancel, status) => return Step::Close(reason),
        _ = ticker.tick() => {}
    }

    tokio::select! {
        biased;
        reason = close_signal(cancel, status) => Step::Close(reason),
        result = bus.receive() => Step::Observed(result),
    }
}

async fn close_signal(
    cancel: &mut watch::Receiver<bool>,
    status: &mut watch::Receiver<SessionStatus>,
) -> CloseReason {
    tokio::select! {
        biased;
        _ = cancel.wait_for(|cancelled| *cancelled) => CloseReason::Cancelled,
        // An error means the session was dropped along with its registry
        _ = status.wait_for(|s| *s == SessionStatus::Inactive) => CloseReason::SessionClosed,
    }
}

/// Moves the subscription to `Closed` exactly once, also when the stream is
/// dropped mid-flight
struct CloseGuard {
    session_id: String,
    state: watch::Sender<SubscriptionState>,
}

impl CloseGuard {
    fn close(&self, reason: CloseReason) {
        let changed = self.state.send_if_modified(|state| {
            if state.is_closed() {
                return false;
            }
            *state = SubscriptionState::Closed(reason);
            true
        });
        if changed {
            info!(session_id = %self.session_id, %reason, "Subscription closed");
        }
    }
}

impl Drop for CloseGuard {
    fn drop(&mut self) {
        self.close(CloseReason::Cancelled);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use canlink_core::{Driver, DriverError, DriverFactory};
    use canlink_driver::{MockDriver, ReplayDriver};
    use futures::StreamExt;
    use pretty_assertions::assert_eq;

    const FAST: StreamConfig = StreamConfig::with_poll_interval(Duration::from_millis(5));

    /// Hands out one prepared driver per connect
    struct QueueFactory(parking_lot::Mutex<Vec<Box<dyn Driver>>>);

    impl QueueFactory {
        fn new(drivers: Vec<Box<dyn Driver>>) -> Arc<Self> {
            Arc::new(Self(parking_lot::Mutex::new(drivers)))
        }
    }

    fn registry_over(driver: impl Driver + 'static) -> SessionRegistry {
        let driver: Box<dyn Driver> = Box::new(driver);
        SessionRegistry::new(QueueFactory::new(vec![driver]))
    }

    #[async_trait]
    impl DriverFactory for QueueFactory {
        async fn create(&self, _channel: &str) -> DriverResult<Box<dyn Driver>> {
            self.0
                .lock()
                .pop()
                .ok_or_else(|| DriverError::Unsupported("no driver left".into()))
        }
    }

    #[tokio::test]
    async fn test_emits_only_matching_frames() {
        let driver = ReplayDriver::from_frames(vec![
            Frame::new(0x100, vec![1]),
            Frame::new(0x123, vec![2]),
            Frame::new(0x200, vec![3]),
            Frame::new(0x123, vec![4]),
        ]);
        let registry = registry_over(driver);
        let id = registry.connect("can0").await.unwrap();

        let events: Vec<FrameEvent> = registry
            .subscribe(id.as_str(), 0x123, FAST)
            .unwrap()
            .into_stream()
            .collect()
            .await;

        assert_eq!(events.len(), 2);
        assert!(events.iter().all(|e| e.can_id == 0x123 && e.frame.id() == 0x123));
        assert!(events.iter().all(|e| e.session_id == id.as_str()));
        assert_eq!(events[0].frame.data(), &[2]);
        assert_eq!(events[1].frame.data(), &[4]);
    }

    #[tokio::test]
    async fn test_state_transitions() {
        let driver = ReplayDriver::from_frames(vec![Frame::new(0x1, vec![])]);
        let registry = registry_over(driver);
        let id = registry.connect("can0").await.unwrap();

        let sub = registry.subscribe(id.as_str(), 0x1, FAST).unwrap();
        let handle = sub.handle();
        assert_eq!(handle.state(), SubscriptionState::Attached);

        let mut stream = Box::pin(sub.into_stream());
        assert!(stream.next().await.is_some());
        assert_eq!(handle.state(), SubscriptionState::Emitting);
        assert!(stream.next().await.is_none());
        assert_eq!(
            handle.state(),
            SubscriptionState::Closed(CloseReason::SourceExhausted)
        );
    }

    #[tokio::test]
    async fn test_empty_polls_do_not_close_live_source() {
        let driver = Arc::new(MockDriver::with_frames([]));
        let registry = registry_over(driver.clone());
        let id = registry.connect("can0").await.unwrap();

        let mut stream = Box::pin(
            registry
                .subscribe(id.as_str(), 0x7FF, FAST)
                .unwrap()
                .into_stream(),
        );

        tokio::spawn({
            let driver = driver.clone();
            async move {
                tokio::time::sleep(Duration::from_millis(50)).await;
                driver.inject(Frame::new(0x7FF, vec![0xAA]));
            }
        });

        let event = stream.next().await.unwrap();
        assert_eq!(event.frame, Frame::new(0x7FF, vec![0xAA]));
    }

    #[tokio::test]
    async fn test_transient_errors_are_skipped() {
        let driver = Arc::new(MockDriver::with_frames([Frame::new(0x10, vec![1])]));
        driver.set_connected(false);
        let registry = registry_over(driver.clone());
        let id = registry.connect("can0").await.unwrap();

        let sub = registry.subscribe(id.as_str(), 0x10, FAST).unwrap();
        let handle = sub.handle();
        let mut stream = Box::pin(sub.into_stream());

        tokio::spawn({
            let driver = driver.clone();
            async move {
                tokio::time::sleep(Duration::from_millis(30)).await;
                driver.set_connected(true);
            }
        });

        assert_eq!(stream.next().await.unwrap().frame.data(), &[1]);
        assert_eq!(handle.state(), SubscriptionState::Emitting);
    }

    #[tokio::test]
    async fn test_cancel_ends_stream() {
        let registry = registry_over(MockDriver::with_frames([]));
        let id = registry.connect("can0").await.unwrap();

        let sub = registry
            .subscribe(id.as_str(), 0x123, StreamConfig::default())
            .unwrap();
        let handle = sub.handle();
        let mut stream = Box::pin(sub.into_stream());

        let canceller = handle.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            canceller.cancel();
        });

        let next = tokio::time::timeout(Duration::from_secs(2), stream.next())
            .await
            .unwrap();
        assert!(next.is_none());
        assert_eq!(handle.closed().await, CloseReason::Cancelled);
        // Cancelling never touches the registry
        assert!(registry.contains(id.as_str()));
    }

    #[tokio::test]
    async fn test_dropping_stream_closes_subscription() {
        let registry = registry_over(MockDriver::with_frames([]));
        let id = registry.connect("can0").await.unwrap();

        let sub = registry.subscribe(id.as_str(), 0x123, FAST).unwrap();
        let handle = sub.handle();
        let mut stream = Box::pin(sub.into_stream());

        // Drive the stream until it is emitting, then drop it
        let _ = tokio::time::timeout(Duration::from_millis(20), stream.next()).await;
        drop(stream);

        assert_eq!(
            handle.state(),
            SubscriptionState::Closed(CloseReason::Cancelled)
        );
    }

    #[tokio::test]
    async fn test_disconnect_ends_stream() {
        let registry = Arc::new(registry_over(MockDriver::with_frames([])));
        let id = registry.connect("can0").await.unwrap();

        let sub = registry
            .subscribe(id.as_str(), 0x123, StreamConfig::default())
            .unwrap();
        let handle = sub.handle();
        let mut stream = Box::pin(sub.into_stream());

        tokio::spawn({
            let registry = registry.clone();
            let id = id.clone();
            async move {
                tokio::time::sleep(Duration::from_millis(20)).await;
                registry.disconnect(id.as_str());
            }
        });

        let next = tokio::time::timeout(Duration::from_secs(2), stream.next())
            .await
            .unwrap();
        assert!(next.is_none());
        assert_eq!(handle.closed().await, CloseReason::SessionClosed);
    }

    #[test]
    fn test_poll_interval_has_floor() {
        assert_eq!(
            StreamConfig::with_poll_interval(Duration::ZERO).poll_interval(),
            MIN_POLL_INTERVAL
        );
        assert_eq!(
            StreamConfig::with_poll_interval(Duration::from_nanos(10)).poll_interval(),
            MIN_POLL_INTERVAL
        );
        assert_eq!(FAST.poll_interval(), Duration::from_millis(5));
    }

    #[tokio::test]
    async fn test_zero_poll_interval_still_streams() {
        let driver = ReplayDriver::from_frames(vec![Frame::new(0x42, vec![1])]);
        let registry = registry_over(driver);
        let id = registry.connect("can0").await.unwrap();

        let events: Vec<FrameEvent> = registry
            .subscribe(
                id.as_str(),
                0x42,
                StreamConfig::with_poll_interval(Duration::ZERO),
            )
            .unwrap()
            .into_stream()
            .collect()
            .await;

        assert_eq!(events.len(), 1);
    }

    #[tokio::test]
    async fn test_closed_when_dropped_before_streaming() {
        let registry = registry_over(MockDriver::with_frames([]));
        let id = registry.connect("can0").await.unwrap();

        let sub = registry.subscribe(id.as_str(), 0x123, FAST).unwrap();
        let handle = sub.handle();
        drop(sub);

        assert_eq!(handle.state(), SubscriptionState::Attached);
        assert_eq!(handle.closed().await, CloseReason::Cancelled);
    }

    #[tokio::test]
    async fn test_filter_on_id_beyond_29_bits() {
        let driver = ReplayDriver::from_frames(vec![
            Frame::new(0x1FFF_FFFF, vec![1]),
            Frame::new(0xFFFF_FFFF, vec![2]),
        ]);
        let registry = registry_over(driver);
        let id = registry.connect("can0").await.unwrap();
        let can_id = canlink_core::parse_can_id("0xFFFFFFFF").unwrap();

        let events: Vec<FrameEvent> = registry
            .subscribe(id.as_str(), can_id, FAST)
            .unwrap()
            .into_stream()
            .collect()
            .await;

        assert_eq!(events.len(), 1);
        assert_eq!(events[0].frame, Frame::new(0xFFFF_FFFF, vec![2]));
    }

    #[tokio::test]
    async fn test_subscribe_unknown_session() {
        let registry = SessionRegistry::new(QueueFactory::new(Vec::new()));
        let err = registry.subscribe("session_0_0", 0x123, FAST).unwrap_err();
        assert!(err.is_not_found());
    }
}
