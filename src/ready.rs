// MIT License - Copyright (c) 2026 Peter Wright

use std::fmt;

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

use crate::snapshot::PanelSnapshot;

/// Whether the panel can currently be armed without bypass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReadyState {
    Ready,
    NotReady,
    Unknown,
}

impl ReadyState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ready => "ready",
            Self::NotReady => "not_ready",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for ReadyState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

bitflags! {
    /// Arm modes the panel reports as currently ready.
    ///
    /// Built from the readiness notification payload, one flag per mode
    /// capability field.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ReadyModes: u32 {
        const AWAY          = 0x01;
        const HOME          = 0x02;
        const NIGHT         = 0x04;
        const VACATION      = 0x08;
        const CUSTOM_BYPASS = 0x10;
    }
}

impl ReadyModes {
    /// Build the flag set from the notification's per-mode booleans.
    pub fn from_capabilities(
        away: bool,
        home: bool,
        night: bool,
        vacation: bool,
        custom_bypass: bool,
    ) -> Self {
        let mut modes = Self::empty();
        if away {
            modes |= Self::AWAY;
        }
        if home {
            modes |= Self::HOME;
        }
        if night {
            modes |= Self::NIGHT;
        }
        if vacation {
            modes |= Self::VACATION;
        }
        if custom_bypass {
            modes |= Self::CUSTOM_BYPASS;
        }
        modes
    }
}

/// Heuristic readiness from a snapshot: not ready while any sensor is
/// bypassed. Used on periodic and initial resync, when no explicit
/// readiness notification is at hand.
pub fn derive_ready(snapshot: Option<&PanelSnapshot>) -> ReadyState {
    match snapshot {
        None => ReadyState::Unknown,
        Some(snap) if snap.bypassed_sensors => ReadyState::NotReady,
        Some(_) => ReadyState::Ready,
    }
}

/// Event-driven readiness: ready iff the panel reports the away mode as
/// armable. Takes precedence over the heuristic whenever a notification
/// is received.
pub fn from_modes(modes: ReadyModes) -> ReadyState {
    if modes.contains(ReadyModes::AWAY) {
        ReadyState::Ready
    } else {
        ReadyState::NotReady
    }
}
