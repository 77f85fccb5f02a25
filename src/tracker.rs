// MIT License - Copyright (c) 2026 Peter Wright

use std::sync::Arc;

use tokio::sync::Mutex;
use tokio::time::{interval, sleep, Duration, MissedTickBehavior};
use tracing::{debug, warn};

use crate::config::ConfigHandle;
use crate::event::{EventReceiver, TrackerEvent};
use crate::keypad::{self, KeypadState};
use crate::ready::{self, ReadyModes, ReadyState};
use crate::snapshot::PanelSnapshot;

/// Interval of the safety-net resync, independent of override timeouts.
pub const RESYNC_INTERVAL: Duration = Duration::from_secs(30);

/// Host-side lookup of the tracked panel's current state.
///
/// Absence is not an error: `None` means the upstream entity is missing
/// and derives to `unknown`.
pub trait PanelStateSource: Send + Sync {
    fn snapshot(&self) -> Option<PanelSnapshot>;
}

/// Downstream observer of the keypad state.
pub trait StateSink: Send + Sync {
    fn publish(&self, state: KeypadState);
}

/// Downstream observer of the ready-to-arm state.
pub trait ReadySink: Send + Sync {
    fn publish(&self, state: ReadyState);
}

/// Why an arm attempt failed, reduced to the two override buckets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// The panel rejected the PIN.
    InvalidCode,
    /// Any other failure reason.
    Other,
}

impl FailureKind {
    /// Map the panel's verbatim reason string. Only `invalid_code`
    /// selects the PIN-specific override; everything else is generic.
    pub fn from_reason(reason: &str) -> Self {
        if reason == "invalid_code" {
            Self::InvalidCode
        } else {
            Self::Other
        }
    }

    /// The override value displayed for this failure.
    pub fn keypad_state(&self) -> KeypadState {
        match self {
            Self::InvalidCode => KeypadState::IncorrectPin,
            Self::Other => KeypadState::FailedToArm,
        }
    }
}

/// Mutable tracker state, exclusively owned by one tracker instance.
struct TrackerState {
    override_state: Option<KeypadState>,
    reset_handle: Option<tokio::task::JoinHandle<()>>,
    /// Bumped on every override so a reset task that already woke up can
    /// tell it has been superseded.
    reset_generation: u64,
    last_value: Option<KeypadState>,
    last_ready: Option<ReadyState>,
}

struct TrackerInner {
    source: Arc<dyn PanelStateSource>,
    state_sink: Arc<dyn StateSink>,
    ready_sink: Option<Arc<dyn ReadySink>>,
    config: ConfigHandle,
    state: Mutex<TrackerState>,
}

/// Tracks one alarm panel and publishes its keypad-facing state.
///
/// Re-derives on change notifications, republishes on a fixed safety-net
/// interval, and lets failure notifications temporarily override the
/// derived value until a per-kind timeout expires.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use alarmo_keypad_bridge::{
///     event_channel, AlarmTracker, ConfigHandle, KeypadState, PanelSnapshot,
///     PanelStateSource, StateSink, TrackerConfig, TrackerEvent,
/// };
///
/// struct NoPanel;
/// impl PanelStateSource for NoPanel {
///     fn snapshot(&self) -> Option<PanelSnapshot> {
///         None
///     }
/// }
///
/// struct PrintSink;
/// impl StateSink for PrintSink {
///     fn publish(&self, state: KeypadState) {
///         println!("keypad: {state}");
///     }
/// }
///
/// #[tokio::main]
/// async fn main() -> anyhow::Result<()> {
///     let config = TrackerConfig::builder()
///         .panel_entity("alarm_control_panel.alarmo")
///         .build()?;
///     let tracker = AlarmTracker::new(
///         Arc::new(NoPanel),
///         Arc::new(PrintSink),
///         None,
///         ConfigHandle::new(config),
///     );
///     tracker.attach().await;
///
///     let (tx, rx) = event_channel(32);
///     tx.send(TrackerEvent::PanelChanged).await?;
///     tracker.run(rx).await;
///     Ok(())
/// }
/// ```
pub struct AlarmTracker {
    inner: Arc<TrackerInner>,
}

impl AlarmTracker {
    pub fn new(
        source: Arc<dyn PanelStateSource>,
        state_sink: Arc<dyn StateSink>,
        ready_sink: Option<Arc<dyn ReadySink>>,
        config: ConfigHandle,
    ) -> Self {
        Self {
            inner: Arc::new(TrackerInner {
                source,
                state_sink,
                ready_sink,
                config,
                state: Mutex::new(TrackerState {
                    override_state: None,
                    reset_handle: None,
                    reset_generation: 0,
                    last_value: None,
                    last_ready: None,
                }),
            }),
        }
    }

    /// Initial sync: force-publish both derived values once, establishing
    /// the last-published baselines before any notifications arrive.
    pub async fn attach(&self) {
        self.update_from_panel(true).await;
        self.update_ready(true, None).await;
    }

    /// Re-derive the keypad state and publish it.
    ///
    /// No-op while an override is active: the override takes precedence
    /// and is never preempted by a stale resync. Without `force`, a
    /// publish only happens when the value actually changed.
    pub async fn update_from_panel(&self, force: bool) {
        let mut state = self.inner.state.lock().await;
        if state.override_state.is_some() {
            return;
        }
        let value = keypad::derive(self.inner.source.snapshot().as_ref());
        publish_state(&self.inner, &mut state, value, force);
    }

    /// Apply a failure override: force-publish the override value and
    /// schedule the reset after the kind's configured timeout.
    ///
    /// Last-writer-wins: a second failure before the first's timer fires
    /// replaces both the displayed value and the timer; the earlier
    /// timer is cancelled silently and never publishes its reset.
    pub async fn apply_failure(&self, kind: FailureKind) {
        // Timeouts are read fresh so a config reload is picked up
        // without restarting the tracker.
        let config = self.inner.config.get().await;
        let timeout = match kind {
            FailureKind::InvalidCode => config.pin_timeout,
            FailureKind::Other => config.failed_timeout,
        };

        let value = kind.keypad_state();
        let mut state = self.inner.state.lock().await;
        debug!("override {value} for {timeout:?}");
        state.override_state = Some(value);
        publish_state(&self.inner, &mut state, value, true);

        if let Some(handle) = state.reset_handle.take() {
            handle.abort();
        }
        state.reset_generation += 1;
        let generation = state.reset_generation;
        let inner = Arc::clone(&self.inner);
        state.reset_handle = Some(tokio::spawn(async move {
            sleep(timeout).await;
            let mut state = inner.state.lock().await;
            if state.reset_generation != generation {
                // Superseded between wake-up and lock acquisition.
                return;
            }
            state.override_state = None;
            state.reset_handle = None;
            let value = keypad::derive(inner.source.snapshot().as_ref());
            // Forced: observers must see the transition out of the
            // override value even when the derived state is unchanged.
            publish_state(&inner, &mut state, value, true);
        }));
    }

    /// Re-derive the ready-to-arm state and publish it.
    ///
    /// With `modes` (an explicit readiness notification) the event path
    /// applies; otherwise the bypass heuristic. No-op when no ready sink
    /// is attached.
    pub async fn update_ready(&self, force: bool, modes: Option<ReadyModes>) {
        let Some(sink) = &self.inner.ready_sink else {
            return;
        };
        let value = match modes {
            Some(modes) => ready::from_modes(modes),
            None => ready::derive_ready(self.inner.source.snapshot().as_ref()),
        };
        let mut state = self.inner.state.lock().await;
        if force || state.last_ready != Some(value) {
            state.last_ready = Some(value);
            sink.publish(value);
        }
    }

    /// Dispatch a single notification.
    pub async fn handle_event(&self, event: TrackerEvent) {
        match event {
            TrackerEvent::PanelChanged => self.update_from_panel(false).await,
            TrackerEvent::ArmFailed { reason } => {
                let kind = FailureKind::from_reason(&reason);
                if kind == FailureKind::Other {
                    warn!("arm failed: {reason}");
                }
                self.apply_failure(kind).await;
            }
            TrackerEvent::ReadyModesUpdated { modes } => {
                debug!("ready modes updated: {modes:?}");
                self.update_ready(true, Some(modes)).await;
            }
        }
    }

    /// Run the tracker loop: consume notifications in arrival order and
    /// resync both channels every [`RESYNC_INTERVAL`] as a safety net.
    ///
    /// Returns when the event channel closes.
    pub async fn run(&self, mut events: EventReceiver) {
        let mut resync = interval(RESYNC_INTERVAL);
        resync.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately; attach() already synced.
        resync.tick().await;

        loop {
            tokio::select! {
                event = events.recv() => match event {
                    Some(event) => self.handle_event(event).await,
                    None => {
                        debug!("event channel closed, tracker stopping");
                        break;
                    }
                },
                _ = resync.tick() => {
                    self.update_from_panel(false).await;
                    self.update_ready(false, None).await;
                }
            }
        }
        self.shutdown().await;
    }

    /// Cancel a pending override reset without publishing.
    pub async fn shutdown(&self) {
        let mut state = self.inner.state.lock().await;
        if let Some(handle) = state.reset_handle.take() {
            handle.abort();
        }
        // Keep abort from racing a reset task that already woke up.
        state.reset_generation += 1;
    }

    /// The last keypad state handed to the sink, if any.
    pub async fn last_keypad_state(&self) -> Option<KeypadState> {
        self.inner.state.lock().await.last_value
    }

    /// The last ready state handed to the sink, if any.
    pub async fn last_ready_state(&self) -> Option<ReadyState> {
        self.inner.state.lock().await.last_ready
    }
}

fn publish_state(
    inner: &TrackerInner,
    state: &mut TrackerState,
    value: KeypadState,
    force: bool,
) {
    if force || state.last_value != Some(value) {
        state.last_value = Some(value);
        inner.state_sink.publish(value);
    }
}
