// MIT License - Copyright (c) 2026 Peter Wright

use crate::ready::ReadyModes;

/// Notifications consumed by the tracker's run loop.
///
/// The composition root (the MQTT bridge, a test harness) feeds these in
/// through an mpsc channel; the tracker is the single consumer and
/// processes them one at a time in arrival order.
#[derive(Debug, Clone)]
pub enum TrackerEvent {
    /// The tracked panel entity changed state; re-derive and publish.
    PanelChanged,
    /// An arm attempt failed. `reason` is the panel's verbatim reason
    /// string; only `invalid_code` selects the PIN-specific override.
    ArmFailed { reason: String },
    /// The panel reported which arm modes are currently ready.
    ReadyModesUpdated { modes: ReadyModes },
}

/// Type alias for the event sender.
pub type EventSender = tokio::sync::mpsc::Sender<TrackerEvent>;

/// Type alias for the event receiver.
pub type EventReceiver = tokio::sync::mpsc::Receiver<TrackerEvent>;

/// Create a new event channel with the given capacity.
pub fn event_channel(capacity: usize) -> (EventSender, EventReceiver) {
    tokio::sync::mpsc::channel(capacity)
}
