// MIT License - Copyright (c) 2026 Peter Wright

use std::time::Duration;

/// Errors raised outside the derivation core.
///
/// The tracker itself has no fatal path: every input anomaly degrades to
/// a defined keypad value. What remains is configuration rejected before
/// a tracker is constructed, and channel plumbing in the bridge.
#[derive(Debug, thiserror::Error)]
pub enum TrackerError {
    #[error("{field} out of bounds: {value:?} (allowed {min:?}..={max:?})")]
    InvalidTimeout {
        field: &'static str,
        value: Duration,
        min: Duration,
        max: Duration,
    },

    #[error("panel entity id must not be empty")]
    MissingPanelEntity,

    #[error("event channel closed")]
    ChannelClosed,
}

pub type Result<T> = std::result::Result<T, TrackerError>;
