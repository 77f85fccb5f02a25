// MIT License - Copyright (c) 2026 Peter Wright

use serde::{Deserialize, Serialize};

/// Target arm mode reported by the panel.
///
/// The panel conflates direction (arming/armed) with target mode in its
/// `armed_*` vocabulary; this enum carries only the mode so the deriver
/// can fan directions out across it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArmMode {
    Home,
    Away,
    Night,
    Vacation,
    CustomBypass,
}

impl ArmMode {
    /// Parse a mode from the panel's `armed_*` vocabulary
    /// (e.g. `arm_mode: "armed_away"` → `Away`).
    ///
    /// Returns `None` for anything unrecognized; the deriver then falls
    /// back to the generic direction value.
    pub fn from_state_name(s: &str) -> Option<Self> {
        match s {
            "armed_home" => Some(Self::Home),
            "armed_away" => Some(Self::Away),
            "armed_night" => Some(Self::Night),
            "armed_vacation" => Some(Self::Vacation),
            "armed_custom_bypass" => Some(Self::CustomBypass),
            _ => None,
        }
    }
}

/// Raw state of the upstream alarm panel entity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PanelState {
    Disarmed,
    ArmedHome,
    ArmedAway,
    ArmedNight,
    ArmedVacation,
    ArmedCustomBypass,
    Arming,
    Pending,
    Triggered,
    Unavailable,
    /// Any state string the tracker does not recognize. Kept verbatim
    /// for logging; derives to `unknown`.
    Other(String),
}

impl PanelState {
    /// Parse a panel state string. Total: unrecognized values become
    /// [`PanelState::Other`], never an error.
    pub fn from_state_str(s: &str) -> Self {
        match s {
            "disarmed" => Self::Disarmed,
            "armed_home" => Self::ArmedHome,
            "armed_away" => Self::ArmedAway,
            "armed_night" => Self::ArmedNight,
            "armed_vacation" => Self::ArmedVacation,
            "armed_custom_bypass" => Self::ArmedCustomBypass,
            "arming" => Self::Arming,
            "pending" => Self::Pending,
            "triggered" => Self::Triggered,
            "unavailable" => Self::Unavailable,
            other => Self::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Disarmed => "disarmed",
            Self::ArmedHome => "armed_home",
            Self::ArmedAway => "armed_away",
            Self::ArmedNight => "armed_night",
            Self::ArmedVacation => "armed_vacation",
            Self::ArmedCustomBypass => "armed_custom_bypass",
            Self::Arming => "arming",
            Self::Pending => "pending",
            Self::Triggered => "triggered",
            Self::Unavailable => "unavailable",
            Self::Other(s) => s,
        }
    }
}

/// Read-only snapshot of the upstream panel's state and attributes.
///
/// Re-fetched on demand through [`PanelStateSource`](crate::tracker::PanelStateSource);
/// the tracker never mutates it.
#[derive(Debug, Clone, PartialEq)]
pub struct PanelSnapshot {
    pub state: PanelState,
    /// Target mode while arming/pending, when the panel reports one.
    pub arm_mode: Option<ArmMode>,
    /// Mode the panel will enter next (pending only).
    pub next_state: Option<ArmMode>,
    /// Whether at least one sensor is currently bypassed.
    pub bypassed_sensors: bool,
}

impl PanelSnapshot {
    pub fn new(state: PanelState) -> Self {
        Self {
            state,
            arm_mode: None,
            next_state: None,
            bypassed_sensors: false,
        }
    }

    pub fn with_arm_mode(mut self, mode: ArmMode) -> Self {
        self.arm_mode = Some(mode);
        self
    }

    pub fn with_next_state(mut self, mode: ArmMode) -> Self {
        self.next_state = Some(mode);
        self
    }

    pub fn with_bypassed_sensors(mut self, bypassed: bool) -> Self {
        self.bypassed_sensors = bypassed;
        self
    }

    /// Effective target mode for the pending direction: `arm_mode` wins,
    /// `next_state` is the fallback.
    pub fn pending_mode(&self) -> Option<ArmMode> {
        self.arm_mode.or(self.next_state)
    }
}
