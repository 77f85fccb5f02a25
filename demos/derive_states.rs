//! Example: print the keypad state derived from a range of panel snapshots.

use alarmo_keypad_bridge::{derive, derive_ready, ArmMode, PanelSnapshot, PanelState};

fn main() {
    let snapshots = [
        ("disarmed", PanelSnapshot::new(PanelState::Disarmed)),
        ("triggered", PanelSnapshot::new(PanelState::Triggered)),
        (
            "arming towards away",
            PanelSnapshot::new(PanelState::Arming).with_arm_mode(ArmMode::Away),
        ),
        (
            "arming, mode unknown",
            PanelSnapshot::new(PanelState::Arming),
        ),
        (
            "pending, next state night",
            PanelSnapshot::new(PanelState::Pending).with_next_state(ArmMode::Night),
        ),
        (
            "armed home, sensor bypassed",
            PanelSnapshot::new(PanelState::ArmedHome).with_bypassed_sensors(true),
        ),
        (
            "armed custom bypass",
            PanelSnapshot::new(PanelState::ArmedCustomBypass),
        ),
        ("unavailable", PanelSnapshot::new(PanelState::Unavailable)),
        (
            "unrecognized state",
            PanelSnapshot::new(PanelState::from_state_str("jammed")),
        ),
    ];

    println!("{:-^72}", " derivation table ");
    for (label, snap) in &snapshots {
        let keypad = derive(Some(snap));
        let ready = derive_ready(Some(snap));
        println!(
            "  {:28} -> {:22} {:22} ready={}",
            label,
            keypad.as_str(),
            format!("({})", keypad.pretty()),
            ready
        );
    }

    // Absent upstream entity
    println!(
        "  {:28} -> {:22} {:22} ready={}",
        "no panel entity",
        derive(None).as_str(),
        format!("({})", derive(None).pretty()),
        derive_ready(None)
    );
}
