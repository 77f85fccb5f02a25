// MIT License - Copyright (c) 2026 Peter Wright

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::snapshot::{ArmMode, PanelSnapshot, PanelState};

/// Keypad-facing alarm state.
///
/// The panel's raw vocabulary conflates direction (arming vs armed) with
/// target mode (home/away/...); this enum fans each direction out across
/// the five mode variants so a keypad can render mode-specific icons and
/// text without re-deriving mode logic itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeypadState {
    Disarmed,
    Triggered,
    Unavailable,
    Arming,
    ArmingHome,
    ArmingAway,
    ArmingNight,
    ArmingVacation,
    ArmingCustomBypass,
    Pending,
    PendingHome,
    PendingAway,
    PendingNight,
    PendingVacation,
    PendingCustomBypass,
    ArmedHome,
    ArmedAway,
    ArmedNight,
    ArmedVacation,
    ArmedHomeBypass,
    ArmedAwayBypass,
    ArmedNightBypass,
    ArmedVacationBypass,
    ArmedCustomBypass,
    FailedToArm,
    IncorrectPin,
    Unknown,
}

impl KeypadState {
    /// The snake_case wire value (what gets published).
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Disarmed => "disarmed",
            Self::Triggered => "triggered",
            Self::Unavailable => "unavailable",
            Self::Arming => "arming",
            Self::ArmingHome => "arming_home",
            Self::ArmingAway => "arming_away",
            Self::ArmingNight => "arming_night",
            Self::ArmingVacation => "arming_vacation",
            Self::ArmingCustomBypass => "arming_custom_bypass",
            Self::Pending => "pending",
            Self::PendingHome => "pending_home",
            Self::PendingAway => "pending_away",
            Self::PendingNight => "pending_night",
            Self::PendingVacation => "pending_vacation",
            Self::PendingCustomBypass => "pending_custom_bypass",
            Self::ArmedHome => "armed_home",
            Self::ArmedAway => "armed_away",
            Self::ArmedNight => "armed_night",
            Self::ArmedVacation => "armed_vacation",
            Self::ArmedHomeBypass => "armed_home_bypass",
            Self::ArmedAwayBypass => "armed_away_bypass",
            Self::ArmedNightBypass => "armed_night_bypass",
            Self::ArmedVacationBypass => "armed_vacation_bypass",
            Self::ArmedCustomBypass => "armed_custom_bypass",
            Self::FailedToArm => "failed_to_arm",
            Self::IncorrectPin => "incorrect_pin",
            Self::Unknown => "unknown",
        }
    }

    /// Display string for user-facing surfaces. Pure lookup table, owned
    /// by the presentation layer.
    pub fn pretty(&self) -> &'static str {
        match self {
            Self::Disarmed => "Disarmed",
            Self::Triggered => "Triggered",
            Self::Unavailable => "Unavailable",
            Self::Arming => "Arming",
            Self::ArmingHome => "Arming Home",
            Self::ArmingAway => "Arming Away",
            Self::ArmingNight => "Arming Night",
            Self::ArmingVacation => "Arming Vacation",
            Self::ArmingCustomBypass => "Arming Custom",
            Self::Pending => "Pending",
            Self::PendingHome => "Pending Home",
            Self::PendingAway => "Pending Away",
            Self::PendingNight => "Pending Night",
            Self::PendingVacation => "Pending Vacation",
            Self::PendingCustomBypass => "Pending Custom",
            Self::ArmedHome => "Armed Home",
            Self::ArmedAway => "Armed Away",
            Self::ArmedNight => "Armed Night",
            Self::ArmedVacation => "Armed Vacation",
            Self::ArmedHomeBypass => "Armed Home (Bypass)",
            Self::ArmedAwayBypass => "Armed Away (Bypass)",
            Self::ArmedNightBypass => "Armed Night (Bypass)",
            Self::ArmedVacationBypass => "Armed Vacation (Bypass)",
            Self::ArmedCustomBypass => "Armed Custom (Bypass)",
            Self::FailedToArm => "Failed to Arm",
            Self::IncorrectPin => "Incorrect PIN",
            Self::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for KeypadState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Map a panel snapshot to its keypad state.
///
/// Total function: no side effects, no failure outcomes. An absent
/// snapshot (upstream entity missing) and any unrecognized state both
/// map to [`KeypadState::Unknown`]; an unrecognized mode falls back to
/// the generic direction value.
pub fn derive(snapshot: Option<&PanelSnapshot>) -> KeypadState {
    let Some(snap) = snapshot else {
        return KeypadState::Unknown;
    };

    match &snap.state {
        PanelState::Unavailable => KeypadState::Unavailable,
        PanelState::Arming => match snap.arm_mode {
            Some(ArmMode::Home) => KeypadState::ArmingHome,
            Some(ArmMode::Away) => KeypadState::ArmingAway,
            Some(ArmMode::Night) => KeypadState::ArmingNight,
            Some(ArmMode::Vacation) => KeypadState::ArmingVacation,
            Some(ArmMode::CustomBypass) => KeypadState::ArmingCustomBypass,
            None => KeypadState::Arming,
        },
        // Pending may arrive before the panel sets arm_mode; next_state
        // is the fallback mode source.
        PanelState::Pending => match snap.pending_mode() {
            Some(ArmMode::Home) => KeypadState::PendingHome,
            Some(ArmMode::Away) => KeypadState::PendingAway,
            Some(ArmMode::Night) => KeypadState::PendingNight,
            Some(ArmMode::Vacation) => KeypadState::PendingVacation,
            Some(ArmMode::CustomBypass) => KeypadState::PendingCustomBypass,
            None => KeypadState::Pending,
        },
        PanelState::Disarmed => KeypadState::Disarmed,
        PanelState::Triggered => KeypadState::Triggered,
        PanelState::ArmedHome if snap.bypassed_sensors => KeypadState::ArmedHomeBypass,
        PanelState::ArmedHome => KeypadState::ArmedHome,
        PanelState::ArmedAway if snap.bypassed_sensors => KeypadState::ArmedAwayBypass,
        PanelState::ArmedAway => KeypadState::ArmedAway,
        PanelState::ArmedNight if snap.bypassed_sensors => KeypadState::ArmedNightBypass,
        PanelState::ArmedNight => KeypadState::ArmedNight,
        PanelState::ArmedVacation if snap.bypassed_sensors => KeypadState::ArmedVacationBypass,
        PanelState::ArmedVacation => KeypadState::ArmedVacation,
        // Bypass is implied by the state name itself, regardless of the
        // bypassed_sensors attribute.
        PanelState::ArmedCustomBypass => KeypadState::ArmedCustomBypass,
        PanelState::Other(_) => KeypadState::Unknown,
    }
}
