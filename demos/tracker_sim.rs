//! Example: drive a tracker with simulated panel changes and failures.
//!
//! Shows the override lifecycle end to end: a wrong PIN masks the derived
//! state, then the tracker heals back to it after the configured timeout.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use alarmo_keypad_bridge::{
    event_channel, AlarmTracker, ConfigHandle, KeypadState, PanelSnapshot, PanelState,
    PanelStateSource, StateSink, TrackerConfig, TrackerEvent,
};

struct SimPanel {
    snapshot: Mutex<Option<PanelSnapshot>>,
}

impl SimPanel {
    fn set(&self, snapshot: PanelSnapshot) {
        *self.snapshot.lock().unwrap() = Some(snapshot);
    }
}

impl PanelStateSource for SimPanel {
    fn snapshot(&self) -> Option<PanelSnapshot> {
        self.snapshot.lock().unwrap().clone()
    }
}

struct PrintSink;

impl StateSink for PrintSink {
    fn publish(&self, state: KeypadState) {
        println!("  keypad -> {:22} ({})", state.as_str(), state.pretty());
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let config = TrackerConfig::builder()
        .panel_entity("alarm_control_panel.alarmo")
        .pin_timeout(Duration::from_secs(2))
        .build()?;

    let panel = Arc::new(SimPanel {
        snapshot: Mutex::new(Some(PanelSnapshot::new(PanelState::Disarmed))),
    });
    let tracker = Arc::new(AlarmTracker::new(
        Arc::clone(&panel) as Arc<dyn PanelStateSource>,
        Arc::new(PrintSink),
        None,
        ConfigHandle::new(config),
    ));

    println!("initial sync:");
    tracker.attach().await;

    let (events, rx) = event_channel(16);
    let run_tracker = Arc::clone(&tracker);
    let run = tokio::spawn(async move { run_tracker.run(rx).await });

    println!("\npanel starts arming towards away:");
    panel.set(
        PanelSnapshot::new(PanelState::Arming)
            .with_arm_mode(alarmo_keypad_bridge::ArmMode::Away),
    );
    events.send(TrackerEvent::PanelChanged).await?;
    tokio::time::sleep(Duration::from_millis(100)).await;

    println!("\nwrong PIN entered (override, heals after 2s):");
    panel.set(PanelSnapshot::new(PanelState::Disarmed));
    events
        .send(TrackerEvent::ArmFailed {
            reason: "invalid_code".to_string(),
        })
        .await?;
    tokio::time::sleep(Duration::from_secs(3)).await;

    drop(events);
    run.await?;
    Ok(())
}
