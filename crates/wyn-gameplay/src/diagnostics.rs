//! Structured diagnostics side channel.
//!
//! Gameplay code reports state transitions and per-frame detail through the
//! [`Diagnostics`] trait. Nothing emitted here ever feeds back into gameplay.
//!
//! Sinks:
//! - [`NoopDiagnostics`]: zero-sized default, everything disabled
//! - [`TracingDiagnostics`]: forwards to `tracing` and keeps a ring buffer
//! - [`RecordingDiagnostics`]: captures everything, for tests and replays

use std::collections::{BTreeMap, VecDeque};
use std::fmt;
use std::path::Path;
use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};
use wyn_common::ConfigError;

use crate::clock::GameClock;

/// Domain a diagnostic event belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiagnosticChannel {
    /// Player controller
    Player,
    /// Camera
    Camera,
    /// Physics
    Physics,
    /// Enemies
    Enemy,
    /// Collectibles
    Collectible,
    /// Scene lifecycle
    Scene,
    /// Audio
    Audio,
    /// Network
    Network,
    /// Settings
    Settings,
}

impl DiagnosticChannel {
    /// Lowercase channel name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Player => "player",
            Self::Camera => "camera",
            Self::Physics => "physics",
            Self::Enemy => "enemy",
            Self::Collectible => "collectible",
            Self::Scene => "scene",
            Self::Audio => "audio",
            Self::Network => "network",
            Self::Settings => "settings",
        }
    }
}

impl fmt::Display for DiagnosticChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Importance of a diagnostic event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiagnosticLevel {
    /// State transitions. Low volume.
    State,
    /// Frame-by-frame detail.
    Debug,
    /// Unexpected conditions.
    Warn,
}

impl DiagnosticLevel {
    /// Lowercase level name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::State => "state",
            Self::Debug => "debug",
            Self::Warn => "warn",
        }
    }
}

impl fmt::Display for DiagnosticLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single recorded event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiagnosticEvent {
    /// Frame the event was emitted on
    pub frame: u64,
    /// Host time of that frame (ms)
    pub timestamp: f64,
    /// Channel
    pub channel: DiagnosticChannel,
    /// Level
    pub level: DiagnosticLevel,
    /// Short event name, e.g. `state-change`
    pub label: String,
    /// Payload
    pub data: Value,
}

/// Query over a sink's buffered events.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DiagnosticFilter {
    /// Only this channel
    pub channel: Option<DiagnosticChannel>,
    /// Only this level
    pub level: Option<DiagnosticLevel>,
    /// Only the newest N matches
    pub last: Option<usize>,
}

impl DiagnosticFilter {
    /// Match everything.
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    /// Restrict to a channel.
    #[must_use]
    pub fn channel(mut self, channel: DiagnosticChannel) -> Self {
        self.channel = Some(channel);
        self
    }

    /// Restrict to a level.
    #[must_use]
    pub fn level(mut self, level: DiagnosticLevel) -> Self {
        self.level = Some(level);
        self
    }

    /// Keep only the newest `n` matches. Zero means no limit.
    #[must_use]
    pub fn last(mut self, n: usize) -> Self {
        self.last = Some(n);
        self
    }

    fn matches(&self, event: &DiagnosticEvent) -> bool {
        self.channel.map_or(true, |c| c == event.channel)
            && self.level.map_or(true, |l| l == event.level)
    }

    fn apply<'a, I>(&self, events: I) -> Vec<DiagnosticEvent>
    where
        I: Iterator<Item = &'a DiagnosticEvent>,
    {
        let mut out: Vec<DiagnosticEvent> = events.filter(|e| self.matches(e)).cloned().collect();
        if let Some(n) = self.last.filter(|&n| n > 0) {
            let skip = out.len().saturating_sub(n);
            out.drain(..skip);
        }
        out
    }
}

/// Structured diagnostics capability.
pub trait Diagnostics {
    /// Emit an event. Sinks drop events for disabled channel/level pairs.
    fn emit(&self, channel: DiagnosticChannel, level: DiagnosticLevel, label: &str, data: Value);

    /// Whether a channel/level pair is currently accepted. Callers should
    /// check this before building expensive payloads.
    fn is_enabled(&self, channel: DiagnosticChannel, level: DiagnosticLevel) -> bool;

    /// Buffered events matching `filter`, oldest first.
    fn query(&self, _filter: &DiagnosticFilter) -> Vec<DiagnosticEvent> {
        Vec::new()
    }
}

impl<T: Diagnostics + ?Sized> Diagnostics for &T {
    fn emit(&self, channel: DiagnosticChannel, level: DiagnosticLevel, label: &str, data: Value) {
        (**self).emit(channel, level, label, data);
    }

    fn is_enabled(&self, channel: DiagnosticChannel, level: DiagnosticLevel) -> bool {
        (**self).is_enabled(channel, level)
    }

    fn query(&self, filter: &DiagnosticFilter) -> Vec<DiagnosticEvent> {
        (**self).query(filter)
    }
}

impl<T: Diagnostics + ?Sized> Diagnostics for Arc<T> {
    fn emit(&self, channel: DiagnosticChannel, level: DiagnosticLevel, label: &str, data: Value) {
        (**self).emit(channel, level, label, data);
    }

    fn is_enabled(&self, channel: DiagnosticChannel, level: DiagnosticLevel) -> bool {
        (**self).is_enabled(channel, level)
    }

    fn query(&self, filter: &DiagnosticFilter) -> Vec<DiagnosticEvent> {
        (**self).query(filter)
    }
}

/// Sink handle shared between several owners.
pub type SharedDiagnostics = Arc<dyn Diagnostics + Send + Sync>;

/// Shared handle to a [`NoopDiagnostics`].
#[must_use]
pub fn noop_shared() -> SharedDiagnostics {
    Arc::new(NoopDiagnostics)
}

/// Sink that accepts nothing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NoopDiagnostics;

impl Diagnostics for NoopDiagnostics {
    fn emit(&self, _: DiagnosticChannel, _: DiagnosticLevel, _: &str, _: Value) {}

    fn is_enabled(&self, _: DiagnosticChannel, _: DiagnosticLevel) -> bool {
        false
    }
}

/// Per-channel level toggles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChannelConfig {
    /// State transitions
    pub state: bool,
    /// Frame detail
    pub debug: bool,
    /// Warnings
    pub warn: bool,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            state: true,
            debug: false,
            warn: true,
        }
    }
}

impl ChannelConfig {
    /// Whether `level` is on.
    #[must_use]
    pub const fn allows(&self, level: DiagnosticLevel) -> bool {
        match level {
            DiagnosticLevel::State => self.state,
            DiagnosticLevel::Debug => self.debug,
            DiagnosticLevel::Warn => self.warn,
        }
    }
}

/// Minimum ring buffer capacity.
pub const MIN_RING_BUFFER: usize = 100;
/// Maximum ring buffer capacity.
pub const MAX_RING_BUFFER: usize = 10_000;

/// Diagnostics settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiagnosticsConfig {
    /// Master switch
    pub enabled: bool,
    /// Sparse per-channel overrides
    pub channels: BTreeMap<DiagnosticChannel, ChannelConfig>,
    /// Ring buffer capacity
    pub ring_buffer_size: usize,
}

impl Default for DiagnosticsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            channels: BTreeMap::new(),
            ring_buffer_size: 500,
        }
    }
}

impl DiagnosticsConfig {
    /// Enabled config with no channel overrides.
    #[must_use]
    pub fn enabled() -> Self {
        Self {
            enabled: true,
            ..Self::default()
        }
    }

    /// Builder-style channel override.
    #[must_use]
    pub fn with_channel(mut self, channel: DiagnosticChannel, config: ChannelConfig) -> Self {
        self.channels.insert(channel, config);
        self
    }

    /// Whether a channel/level pair passes this config.
    ///
    /// Channels without an override accept `state` and `warn`.
    #[must_use]
    pub fn allows(&self, channel: DiagnosticChannel, level: DiagnosticLevel) -> bool {
        if !self.enabled {
            return false;
        }
        self.channels
            .get(&channel)
            .copied()
            .unwrap_or_default()
            .allows(level)
    }

    /// Check the ring buffer size.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if (MIN_RING_BUFFER..=MAX_RING_BUFFER).contains(&self.ring_buffer_size) {
            Ok(())
        } else {
            Err(ConfigError::invalid(
                "diagnostics.ring_buffer_size",
                format!(
                    "must be between {MIN_RING_BUFFER} and {MAX_RING_BUFFER}, got {}",
                    self.ring_buffer_size
                ),
            ))
        }
    }

    /// Parse and validate from RON text.
    pub fn from_ron_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = crate::config::parse_ron(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate from a RON file.
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let config: Self = crate::config::load_ron(path.as_ref())?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a RON file, falling back to defaults if it is missing or
    /// invalid.
    #[must_use]
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Self {
        crate::config::or_default(path.as_ref(), |p| Self::load_from(p))
    }
}

#[derive(Debug, Default, Clone, Copy)]
struct Stamp {
    frame: u64,
    timestamp: f64,
}

struct SinkState {
    stamp: Stamp,
    buffer: VecDeque<DiagnosticEvent>,
}

/// Sink that logs through `tracing` and keeps a bounded history.
///
/// The host calls [`TracingDiagnostics::sync_clock`] once per frame so events
/// carry the right frame number.
pub struct TracingDiagnostics {
    config: DiagnosticsConfig,
    state: Mutex<SinkState>,
}

impl TracingDiagnostics {
    /// Create a sink. The ring buffer size is clamped to the allowed range.
    #[must_use]
    pub fn new(config: DiagnosticsConfig) -> Self {
        let mut config = config;
        config.ring_buffer_size = config
            .ring_buffer_size
            .clamp(MIN_RING_BUFFER, MAX_RING_BUFFER);
        info!(
            "Diagnostics sink ready (enabled: {}, buffer: {})",
            config.enabled, config.ring_buffer_size
        );
        let capacity = config.ring_buffer_size;
        Self {
            config,
            state: Mutex::new(SinkState {
                stamp: Stamp::default(),
                buffer: VecDeque::with_capacity(capacity),
            }),
        }
    }

    /// Config in effect.
    #[must_use]
    pub fn config(&self) -> &DiagnosticsConfig {
        &self.config
    }

    /// Record the current frame and host time for subsequent events.
    pub fn sync_clock<C: GameClock + ?Sized>(&self, clock: &C) {
        let mut state = self.state.lock();
        state.stamp = Stamp {
            frame: clock.frame(),
            timestamp: clock.now(),
        };
    }

    /// Number of buffered events.
    #[must_use]
    pub fn len(&self) -> usize {
        self.state.lock().buffer.len()
    }

    /// Whether nothing is buffered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl fmt::Debug for TracingDiagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TracingDiagnostics")
            .field("config", &self.config)
            .field("buffered", &self.len())
            .finish()
    }
}

impl Diagnostics for TracingDiagnostics {
    fn emit(&self, channel: DiagnosticChannel, level: DiagnosticLevel, label: &str, data: Value) {
        if !self.is_enabled(channel, level) {
            return;
        }

        let mut state = self.state.lock();
        let event = DiagnosticEvent {
            frame: state.stamp.frame,
            timestamp: state.stamp.timestamp,
            channel,
            level,
            label: label.to_string(),
            data,
        };

        match level {
            DiagnosticLevel::State => {
                info!(channel = %channel, frame = event.frame, label, data = %event.data);
            }
            DiagnosticLevel::Debug => {
                debug!(channel = %channel, frame = event.frame, label, data = %event.data);
            }
            DiagnosticLevel::Warn => {
                warn!(channel = %channel, frame = event.frame, label, data = %event.data);
            }
        }

        if state.buffer.len() >= self.config.ring_buffer_size {
            state.buffer.pop_front();
        }
        state.buffer.push_back(event);
    }

    fn is_enabled(&self, channel: DiagnosticChannel, level: DiagnosticLevel) -> bool {
        self.config.allows(channel, level)
    }

    fn query(&self, filter: &DiagnosticFilter) -> Vec<DiagnosticEvent> {
        filter.apply(self.state.lock().buffer.iter())
    }
}

/// Sink that accepts and keeps every event.
#[derive(Debug, Default)]
pub struct RecordingDiagnostics {
    events: Mutex<Vec<DiagnosticEvent>>,
    stamp: Mutex<Stamp>,
}

impl RecordingDiagnostics {
    /// Create an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the current frame and host time for subsequent events.
    pub fn sync_clock<C: GameClock + ?Sized>(&self, clock: &C) {
        *self.stamp.lock() = Stamp {
            frame: clock.frame(),
            timestamp: clock.now(),
        };
    }

    /// Copy of all events so far.
    #[must_use]
    pub fn events(&self) -> Vec<DiagnosticEvent> {
        self.events.lock().clone()
    }

    /// Events with the given label.
    #[must_use]
    pub fn with_label(&self, label: &str) -> Vec<DiagnosticEvent> {
        self.events
            .lock()
            .iter()
            .filter(|e| e.label == label)
            .cloned()
            .collect()
    }

    /// Drop everything recorded.
    pub fn clear(&self) {
        self.events.lock().clear();
    }
}

impl Diagnostics for RecordingDiagnostics {
    fn emit(&self, channel: DiagnosticChannel, level: DiagnosticLevel, label: &str, data: Value) {
        let stamp = *self.stamp.lock();
        self.events.lock().push(DiagnosticEvent {
            frame: stamp.frame,
            timestamp: stamp.timestamp,
            channel,
            level,
            label: label.to_string(),
            data,
        });
    }

    fn is_enabled(&self, _: DiagnosticChannel, _: DiagnosticLevel) -> bool {
        true
    }

    fn query(&self, filter: &DiagnosticFilter) -> Vec<DiagnosticEvent> {
        filter.apply(self.events.lock().iter())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FrameClock;
    use serde_json::json;

    #[test]
    fn test_noop_is_disabled() {
        let sink = NoopDiagnostics;
        assert!(!sink.is_enabled(DiagnosticChannel::Player, DiagnosticLevel::State));
        sink.emit(DiagnosticChannel::Player, DiagnosticLevel::State, "x", json!({}));
        assert!(sink.query(&DiagnosticFilter::all()).is_empty());
    }

    #[test]
    fn test_default_channel_levels() {
        let config = DiagnosticsConfig::enabled();
        assert!(config.allows(DiagnosticChannel::Enemy, DiagnosticLevel::State));
        assert!(config.allows(DiagnosticChannel::Enemy, DiagnosticLevel::Warn));
        assert!(!config.allows(DiagnosticChannel::Enemy, DiagnosticLevel::Debug));
    }

    #[test]
    fn test_master_switch() {
        let config = DiagnosticsConfig::default();
        assert!(!config.allows(DiagnosticChannel::Player, DiagnosticLevel::State));
    }

    #[test]
    fn test_channel_override() {
        let config = DiagnosticsConfig::enabled().with_channel(
            DiagnosticChannel::Player,
            ChannelConfig {
                state: false,
                debug: true,
                warn: true,
            },
        );
        assert!(!config.allows(DiagnosticChannel::Player, DiagnosticLevel::State));
        assert!(config.allows(DiagnosticChannel::Player, DiagnosticLevel::Debug));
        assert!(config.allows(DiagnosticChannel::Camera, DiagnosticLevel::State));
    }

    #[test]
    fn test_config_from_ron() {
        let config = DiagnosticsConfig::from_ron_str(
            "(enabled: true, channels: { player: (debug: true) }, ring_buffer_size: 200)",
        )
        .expect("diagnostics config should parse");
        assert!(config.allows(DiagnosticChannel::Player, DiagnosticLevel::Debug));
        assert!(config.allows(DiagnosticChannel::Player, DiagnosticLevel::State));
        assert_eq!(config.ring_buffer_size, 200);
    }

    #[test]
    fn test_config_rejects_small_buffer() {
        let config = DiagnosticsConfig {
            ring_buffer_size: 10,
            ..DiagnosticsConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_tracing_sink_drops_disabled() {
        let sink = TracingDiagnostics::new(DiagnosticsConfig::enabled());
        sink.emit(DiagnosticChannel::Player, DiagnosticLevel::Debug, "frame", json!({}));
        assert!(sink.is_empty());
        sink.emit(DiagnosticChannel::Player, DiagnosticLevel::State, "state-change", json!({}));
        assert_eq!(sink.len(), 1);
    }

    #[test]
    fn test_tracing_sink_ring_buffer() {
        let sink = TracingDiagnostics::new(DiagnosticsConfig {
            ring_buffer_size: 100,
            ..DiagnosticsConfig::enabled()
        });
        for i in 0..150 {
            sink.emit(DiagnosticChannel::Scene, DiagnosticLevel::State, "tick", json!({ "i": i }));
        }
        assert_eq!(sink.len(), 100);
        let events = sink.query(&DiagnosticFilter::all());
        assert_eq!(events[0].data["i"], 50);
        assert_eq!(events[99].data["i"], 149);
    }

    #[test]
    fn test_tracing_sink_clamps_buffer_size() {
        let sink = TracingDiagnostics::new(DiagnosticsConfig {
            ring_buffer_size: 1,
            ..DiagnosticsConfig::enabled()
        });
        assert_eq!(sink.config().ring_buffer_size, MIN_RING_BUFFER);
    }

    #[test]
    fn test_tracing_sink_stamps_frame() {
        let sink = TracingDiagnostics::new(DiagnosticsConfig::enabled());
        let mut clock = FrameClock::new();
        clock.refresh(1000.0, 16.0);
        clock.refresh(1016.0, 16.0);
        sink.sync_clock(&clock);
        sink.emit(DiagnosticChannel::Enemy, DiagnosticLevel::Warn, "stuck", json!({}));

        let events = sink.query(&DiagnosticFilter::all());
        assert_eq!(events[0].frame, 2);
        assert_eq!(events[0].timestamp, 1016.0);
    }

    #[test]
    fn test_query_filters() {
        let sink = RecordingDiagnostics::new();
        sink.emit(DiagnosticChannel::Player, DiagnosticLevel::State, "a", json!({}));
        sink.emit(DiagnosticChannel::Enemy, DiagnosticLevel::State, "b", json!({}));
        sink.emit(DiagnosticChannel::Player, DiagnosticLevel::Debug, "c", json!({}));
        sink.emit(DiagnosticChannel::Player, DiagnosticLevel::State, "d", json!({}));

        let player = sink.query(&DiagnosticFilter::all().channel(DiagnosticChannel::Player));
        assert_eq!(player.len(), 3);

        let player_state = sink.query(
            &DiagnosticFilter::all()
                .channel(DiagnosticChannel::Player)
                .level(DiagnosticLevel::State),
        );
        let labels: Vec<_> = player_state.iter().map(|e| e.label.as_str()).collect();
        assert_eq!(labels, vec!["a", "d"]);

        let newest = sink.query(&DiagnosticFilter::all().last(1));
        assert_eq!(newest[0].label, "d");
    }

    #[test]
    fn test_query_last_zero_is_unlimited() {
        let sink = RecordingDiagnostics::new();
        sink.emit(DiagnosticChannel::Player, DiagnosticLevel::State, "a", json!({}));
        sink.emit(DiagnosticChannel::Player, DiagnosticLevel::State, "b", json!({}));

        let everything = sink.query(&DiagnosticFilter::all().last(0));
        assert_eq!(everything.len(), 2);
        assert_eq!(everything, sink.query(&DiagnosticFilter::all()));
    }

    #[test]
    fn test_shared_through_arc() {
        let sink = Arc::new(RecordingDiagnostics::new());
        let handle = Arc::clone(&sink);
        handle.emit(DiagnosticChannel::Audio, DiagnosticLevel::Warn, "missing", json!({}));
        assert_eq!(sink.with_label("missing").len(), 1);
    }

    #[test]
    fn test_event_serializes_lowercase() {
        let event = DiagnosticEvent {
            frame: 3,
            timestamp: 50.0,
            channel: DiagnosticChannel::Player,
            level: DiagnosticLevel::State,
            label: "state-change".into(),
            data: json!({ "from": "idle", "to": "jumping" }),
        };
        let text = serde_json::to_string(&event).unwrap_or_default();
        assert!(text.contains("\"channel\":\"player\""));
        assert!(text.contains("\"level\":\"state\""));
    }
}
