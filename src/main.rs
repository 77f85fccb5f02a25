// MIT License - Copyright (c) 2026 Peter Wright
// MQTT bridge

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::Parser;
use parking_lot::RwLock;
use rumqttc::{AsyncClient, Event, MqttOptions, Packet, QoS};
use serde::{Deserialize, Serialize};
use tokio::signal::unix::{signal, SignalKind};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use alarmo_keypad_bridge::{
    event_channel, AlarmTracker, ArmMode, ConfigHandle, EventSender, KeypadState, PanelSnapshot,
    PanelState, PanelStateSource, ReadyModes, ReadySink, ReadyState, StateSink, TrackerConfig,
    TrackerEvent,
};

// ---------------------------------------------------------------------------
// CLI
// ---------------------------------------------------------------------------

#[derive(Parser)]
#[command(name = "keypad2mqtt")]
#[command(about = "Bridge between an Alarmo-style alarm panel and a keypad, over MQTT")]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(long, default_value = "config.toml")]
    config: String,
}

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct Config {
    tracker: TrackerToml,
    mqtt: MqttToml,
}

#[derive(Debug, Deserialize)]
struct TrackerToml {
    /// Entity id of the tracked alarm panel (gates inbound events).
    panel_entity: String,
    #[serde(default = "default_timeout_secs")]
    failed_timeout_secs: u64,
    #[serde(default = "default_timeout_secs")]
    pin_timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    2
}

#[derive(Debug, Deserialize)]
struct MqttToml {
    url: String,
    #[serde(default = "default_client_id")]
    client_id: String,
    #[serde(default = "default_panel_state_topic")]
    panel_state_topic: String,
    #[serde(default = "default_panel_event_topic")]
    panel_event_topic: String,
    #[serde(default = "default_keypad_state_topic")]
    keypad_state_topic: String,
    #[serde(default = "default_ready_topic")]
    ready_topic: String,
}

fn default_client_id() -> String {
    "keypad-bridge".to_string()
}
fn default_panel_state_topic() -> String {
    "alarmo/state".to_string()
}
fn default_panel_event_topic() -> String {
    "alarmo/event".to_string()
}
fn default_keypad_state_topic() -> String {
    "keypad/state".to_string()
}
fn default_ready_topic() -> String {
    "keypad/ready".to_string()
}

fn build_tracker_config(toml: &TrackerToml) -> Result<TrackerConfig> {
    TrackerConfig::builder()
        .panel_entity(&toml.panel_entity)
        .failed_timeout(Duration::from_secs(toml.failed_timeout_secs))
        .pin_timeout(Duration::from_secs(toml.pin_timeout_secs))
        .build()
        .context("Invalid tracker configuration")
}

// ---------------------------------------------------------------------------
// Inbound MQTT payloads
// ---------------------------------------------------------------------------

/// Panel state as published by the alarm integration.
#[derive(Debug, Deserialize)]
struct PanelStatePayload {
    #[serde(default)]
    entity_id: Option<String>,
    state: String,
    #[serde(default)]
    arm_mode: Option<String>,
    #[serde(default)]
    next_state: Option<String>,
    /// Entity ids of currently bypassed sensors; non-empty means bypassed.
    #[serde(default)]
    bypassed_sensors: Option<Vec<String>>,
}

impl PanelStatePayload {
    fn to_snapshot(&self) -> PanelSnapshot {
        PanelSnapshot {
            state: PanelState::from_state_str(&self.state),
            arm_mode: self.arm_mode.as_deref().and_then(ArmMode::from_state_name),
            next_state: self
                .next_state
                .as_deref()
                .and_then(ArmMode::from_state_name),
            bypassed_sensors: self
                .bypassed_sensors
                .as_ref()
                .is_some_and(|s| !s.is_empty()),
        }
    }
}

/// Panel event as published by the alarm integration
/// (FAILED_TO_ARM, READY_TO_ARM_MODES_UPDATED).
#[derive(Debug, Deserialize)]
struct PanelEventPayload {
    event: String,
    #[serde(default)]
    entity_id: Option<String>,
    #[serde(default)]
    reason: Option<String>,
    #[serde(default)]
    armed_away: bool,
    #[serde(default)]
    armed_home: bool,
    #[serde(default)]
    armed_night: bool,
    #[serde(default)]
    armed_vacation: bool,
    #[serde(default)]
    armed_custom_bypass: bool,
}

impl PanelEventPayload {
    fn ready_modes(&self) -> ReadyModes {
        ReadyModes::from_capabilities(
            self.armed_away,
            self.armed_home,
            self.armed_night,
            self.armed_vacation,
            self.armed_custom_bypass,
        )
    }
}

// ---------------------------------------------------------------------------
// Outbound MQTT payloads, all sharing the {now, op, ...} flat structure
// ---------------------------------------------------------------------------

#[derive(Serialize)]
struct MqttKeypadState {
    now: u64,
    op: String,
    state: KeypadState,
    pretty: &'static str,
}

#[derive(Serialize)]
struct MqttReadyState {
    now: u64,
    op: String,
    state: ReadyState,
}

fn now_epoch_ms() -> u64 {
    Utc::now().timestamp_millis() as u64
}

// ---------------------------------------------------------------------------
// Tracker wiring
// ---------------------------------------------------------------------------

/// Latest panel snapshot received over MQTT; the tracker's state source.
#[derive(Default)]
struct SnapshotCache {
    snapshot: RwLock<Option<PanelSnapshot>>,
}

impl SnapshotCache {
    fn set(&self, snapshot: PanelSnapshot) {
        *self.snapshot.write() = Some(snapshot);
    }
}

impl PanelStateSource for SnapshotCache {
    fn snapshot(&self) -> Option<PanelSnapshot> {
        self.snapshot.read().clone()
    }
}

struct OutboundMessage {
    topic: String,
    payload: String,
}

/// Serializes a payload onto the publisher channel. Sinks stay
/// synchronous; the publisher task owns the async MQTT client.
fn queue_json(
    tx: &mpsc::UnboundedSender<OutboundMessage>,
    topic: &str,
    payload: &impl Serialize,
) {
    match serde_json::to_string(payload) {
        Ok(json) => {
            if tx
                .send(OutboundMessage {
                    topic: topic.to_string(),
                    payload: json,
                })
                .is_err()
            {
                warn!("Publisher channel closed, dropping message for {topic}");
            }
        }
        Err(e) => error!("Failed to serialize MQTT payload: {e}"),
    }
}

struct MqttStateSink {
    tx: mpsc::UnboundedSender<OutboundMessage>,
    topic: String,
}

impl StateSink for MqttStateSink {
    fn publish(&self, state: KeypadState) {
        info!("Keypad state: {state}");
        let msg = MqttKeypadState {
            now: now_epoch_ms(),
            op: "KEYPAD_STATE".to_string(),
            state,
            pretty: state.pretty(),
        };
        queue_json(&self.tx, &self.topic, &msg);
    }
}

struct MqttReadySink {
    tx: mpsc::UnboundedSender<OutboundMessage>,
    topic: String,
}

impl ReadySink for MqttReadySink {
    fn publish(&self, state: ReadyState) {
        info!("Ready to arm: {state}");
        let msg = MqttReadyState {
            now: now_epoch_ms(),
            op: "READY_TO_ARM".to_string(),
            state,
        };
        queue_json(&self.tx, &self.topic, &msg);
    }
}

// ---------------------------------------------------------------------------
// Inbound message routing
// ---------------------------------------------------------------------------

async fn handle_panel_state(
    payload: &str,
    panel_entity: &str,
    cache: &SnapshotCache,
    events: &EventSender,
) {
    let parsed: PanelStatePayload = match serde_json::from_str(payload) {
        Ok(p) => p,
        Err(e) => {
            warn!("Failed to parse panel state payload: {e}");
            return;
        }
    };

    // Payloads carrying an entity id for a different panel are ignored
    if parsed.entity_id.as_deref().is_some_and(|id| id != panel_entity) {
        debug!("Ignoring state for {:?}", parsed.entity_id);
        return;
    }

    cache.set(parsed.to_snapshot());
    if events.send(TrackerEvent::PanelChanged).await.is_err() {
        warn!("Tracker event channel closed");
    }
}

async fn handle_panel_event(payload: &str, panel_entity: &str, events: &EventSender) {
    let parsed: PanelEventPayload = match serde_json::from_str(payload) {
        Ok(p) => p,
        Err(e) => {
            warn!("Failed to parse panel event payload: {e}");
            return;
        }
    };

    if parsed.entity_id.as_deref().is_some_and(|id| id != panel_entity) {
        debug!("Ignoring event for {:?}", parsed.entity_id);
        return;
    }

    let event = match parsed.event.as_str() {
        "FAILED_TO_ARM" => TrackerEvent::ArmFailed {
            reason: parsed.reason.clone().unwrap_or_default(),
        },
        "READY_TO_ARM_MODES_UPDATED" => TrackerEvent::ReadyModesUpdated {
            modes: parsed.ready_modes(),
        },
        other => {
            debug!("Ignoring panel event {other}");
            return;
        }
    };

    if events.send(event).await.is_err() {
        warn!("Tracker event channel closed");
    }
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> Result<()> {
    // RUST_LOG controls verbosity (e.g. RUST_LOG=debug or
    // RUST_LOG=alarmo_keypad_bridge=trace). Default: info.
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    // systemd journal already adds timestamps, so omit them when running under systemd
    if std::env::var_os("JOURNAL_STREAM").is_some() {
        tracing_subscriber::fmt()
            .without_time()
            .with_env_filter(env_filter)
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    }

    let cli = Cli::parse();

    // Load config
    let config_text =
        std::fs::read_to_string(&cli.config).context("Failed to read config file")?;
    let config: Config = toml::from_str(&config_text).context("Failed to parse config file")?;

    let tracker_config = build_tracker_config(&config.tracker)?;
    let panel_entity = tracker_config.panel_entity.clone();
    let (mqtt_host, mqtt_port) = parse_mqtt_url(&config.mqtt.url)?;

    // Tracker wiring: snapshot cache as source, channel-fed MQTT sinks
    let cache = Arc::new(SnapshotCache::default());
    let (out_tx, mut out_rx) = mpsc::unbounded_channel::<OutboundMessage>();

    let state_sink = Arc::new(MqttStateSink {
        tx: out_tx.clone(),
        topic: config.mqtt.keypad_state_topic.clone(),
    });
    let ready_sink = Arc::new(MqttReadySink {
        tx: out_tx.clone(),
        topic: config.mqtt.ready_topic.clone(),
    });

    let config_handle = ConfigHandle::new(tracker_config);
    let tracker = Arc::new(AlarmTracker::new(
        Arc::clone(&cache) as Arc<dyn PanelStateSource>,
        state_sink,
        Some(ready_sink),
        config_handle.clone(),
    ));

    // Set up MQTT
    let mut mqtt_opts = MqttOptions::new(&config.mqtt.client_id, &mqtt_host, mqtt_port);
    mqtt_opts.set_keep_alive(Duration::from_secs(30));
    let (client, mut eventloop) = AsyncClient::new(mqtt_opts, 256);

    for topic in [&config.mqtt.panel_state_topic, &config.mqtt.panel_event_topic] {
        client
            .subscribe(topic, QoS::AtLeastOnce)
            .await
            .with_context(|| format!("Failed to subscribe to {topic}"))?;
        info!("MQTT: subscribed to {topic}");
    }

    // Task 1: publisher, drains the sink channel into retained messages
    let pub_client = client.clone();
    let publisher_handle = tokio::spawn(async move {
        while let Some(msg) = out_rx.recv().await {
            if let Err(e) = pub_client
                .publish(&msg.topic, QoS::AtLeastOnce, true, msg.payload)
                .await
            {
                error!("Failed to publish to {}: {e}", msg.topic);
            }
        }
    });

    // Initial sync publishes the baseline before any events arrive
    tracker.attach().await;

    // Task 2: tracker run loop (events + 30s resync)
    let (events_tx, events_rx) = event_channel(256);
    let tracker_run = Arc::clone(&tracker);
    let tracker_handle = tokio::spawn(async move {
        tracker_run.run(events_rx).await;
    });

    // Task 3: MQTT event loop, routes inbound panel traffic to the tracker
    let route_cache = Arc::clone(&cache);
    let route_events = events_tx.clone();
    let route_entity = panel_entity.clone();
    let state_topic = config.mqtt.panel_state_topic.clone();
    let event_topic = config.mqtt.panel_event_topic.clone();
    let sub_client = client.clone();
    let mqtt_handle = tokio::spawn(async move {
        loop {
            match eventloop.poll().await {
                Ok(Event::Incoming(Packet::ConnAck(_))) => {
                    // (Re)subscribe after every broker connect/reconnect.
                    // rumqttc does not auto-resubscribe, so without this a
                    // broker restart silently drops our subscriptions.
                    info!("MQTT: connected, subscribing");
                    for topic in [&state_topic, &event_topic] {
                        if let Err(e) = sub_client.subscribe(topic, QoS::AtLeastOnce).await {
                            error!("Failed to subscribe to {topic}: {e}");
                        }
                    }
                }
                Ok(Event::Incoming(Packet::Publish(msg))) => {
                    let payload = String::from_utf8_lossy(&msg.payload);
                    if msg.topic == state_topic {
                        debug!("Panel state received: {payload}");
                        handle_panel_state(&payload, &route_entity, &route_cache, &route_events)
                            .await;
                    } else if msg.topic == event_topic {
                        info!("Panel event received: {payload}");
                        handle_panel_event(&payload, &route_entity, &route_events).await;
                    }
                }
                Ok(_) => {}
                Err(e) => {
                    error!("MQTT event loop error: {e}");
                    tokio::time::sleep(Duration::from_secs(1)).await;
                }
            }
        }
    });

    // Wait for a signal. SIGHUP reloads the timeouts in place: the
    // tracker reads them fresh on the next override, no restart needed.
    let mut sighup = signal(SignalKind::hangup())?;
    let mut sigterm = signal(SignalKind::terminate())?;
    info!("Keypad bridge running. Send SIGHUP to reload timeouts, SIGINT/SIGTERM to stop.");
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("Received SIGINT, shutting down...");
                break;
            }
            _ = sigterm.recv() => {
                info!("Received SIGTERM, shutting down...");
                break;
            }
            _ = sighup.recv() => {
                info!("Received SIGHUP, reloading config from {}", cli.config);
                // Keep the previous config on any failure
                match std::fs::read_to_string(&cli.config)
                    .context("Failed to read config file")
                    .and_then(|text| {
                        toml::from_str::<Config>(&text).context("Failed to parse config file")
                    })
                    .and_then(|new_config| build_tracker_config(&new_config.tracker))
                {
                    Ok(new_tracker_config) => {
                        if new_tracker_config.panel_entity != panel_entity {
                            warn!("panel_entity changed in config; restart to apply");
                        }
                        config_handle.reload(new_tracker_config).await;
                        info!("Timeouts reloaded");
                    }
                    Err(e) => warn!("Failed to reload config, keeping previous: {e}"),
                }
            }
        }
    }

    // Abort tasks and cancel any pending override reset
    mqtt_handle.abort();
    tracker_handle.abort();
    publisher_handle.abort();
    tracker.shutdown().await;

    info!("Shutdown complete");
    Ok(())
}

/// Parse an MQTT URL like "mqtt://host:port" into (host, port).
fn parse_mqtt_url(url: &str) -> Result<(String, u16)> {
    let stripped = url
        .strip_prefix("mqtt://")
        .or_else(|| url.strip_prefix("tcp://"))
        .unwrap_or(url);

    let (host, port_str) = stripped
        .rsplit_once(':')
        .context("MQTT URL must be in format mqtt://host:port")?;

    let port: u16 = port_str.parse().context("Invalid MQTT port number")?;

    Ok((host.to_string(), port))
}
