// MIT License - Copyright (c) 2026 Peter Wright

//! # alarmo-keypad-bridge
//!
//! Derives a simplified, keypad-friendly alarm state from an
//! Alarmo-style alarm panel and tracks it through transient failures:
//! a wrong PIN or a failed arm attempt temporarily overrides the
//! displayed state, then the tracker self-heals back to the true
//! derived value after a configurable timeout.
//!
//! The library owns the derivation and override lifecycle; the
//! `keypad2mqtt` binary wires it to MQTT.
//!
//! ## Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use alarmo_keypad_bridge::{
//!     event_channel, AlarmTracker, ConfigHandle, KeypadState, PanelSnapshot,
//!     PanelStateSource, StateSink, TrackerConfig, TrackerEvent,
//! };
//!
//! struct MySource;
//! impl PanelStateSource for MySource {
//!     fn snapshot(&self) -> Option<PanelSnapshot> {
//!         None // look up the panel here
//!     }
//! }
//!
//! struct MySink;
//! impl StateSink for MySink {
//!     fn publish(&self, state: KeypadState) {
//!         println!("{} ({})", state, state.pretty());
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = TrackerConfig::builder()
//!         .panel_entity("alarm_control_panel.alarmo")
//!         .build()?;
//!
//!     let tracker = AlarmTracker::new(
//!         Arc::new(MySource),
//!         Arc::new(MySink),
//!         None,
//!         ConfigHandle::new(config),
//!     );
//!     tracker.attach().await;
//!
//!     let (events, rx) = event_channel(32);
//!     tokio::spawn(async move {
//!         let _ = events.send(TrackerEvent::PanelChanged).await;
//!     });
//!     tracker.run(rx).await;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod event;
pub mod keypad;
pub mod ready;
pub mod snapshot;
pub mod tracker;

// Re-exports for convenience
pub use config::{ConfigHandle, TrackerConfig, TrackerConfigBuilder};
pub use error::{Result, TrackerError};
pub use event::{event_channel, EventReceiver, EventSender, TrackerEvent};
pub use keypad::{derive, KeypadState};
pub use ready::{derive_ready, ReadyModes, ReadyState};
pub use snapshot::{ArmMode, PanelSnapshot, PanelState};
pub use tracker::{
    AlarmTracker, FailureKind, PanelStateSource, ReadySink, StateSink, RESYNC_INTERVAL,
};
