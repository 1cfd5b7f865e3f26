//! Configuration loading and typed config structures for the overview builder.
//!
//! The configuration lives in a YAML file (conventionally
//! `overview-config.yaml`). Every field has a default, so an empty file or
//! a partial one is valid.

use std::collections::BTreeMap;
use std::path::Path;

use overview_types::{GrenadeEventKind, Phase};
use serde::Deserialize;

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },

    /// The configuration parsed but describes an unusable setup.
    #[error("invalid configuration: {reason}")]
    Invalid {
        /// Explanation of what is wrong with the configuration.
        reason: String,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level overview configuration.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct OverviewConfig {
    /// Tick rate and phase durations.
    #[serde(default)]
    pub timing: TimingConfig,

    /// Transient effect lifetimes and killfeed retention.
    #[serde(default)]
    pub effects: EffectsConfig,

    /// World-to-overview projection per map name.
    #[serde(default)]
    pub maps: BTreeMap<String, MapProjection>,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl OverviewConfig {
    /// Load configuration from a YAML file at the given path.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read,
    /// [`ConfigError::Yaml`] if the content is not valid YAML, or
    /// [`ConfigError::Invalid`] if a value is out of range.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse configuration from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML, or
    /// [`ConfigError::Invalid`] if a value is out of range.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        // An empty document means all defaults.
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: Self = serde_yml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Projection for a map, falling back to the identity projection for
    /// maps without an entry.
    pub fn projection_for(&self, map_name: &str) -> MapProjection {
        self.maps.get(map_name).copied().unwrap_or_default()
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.timing.tick_rate == 0 {
            return Err(ConfigError::Invalid {
                reason: "timing.tick_rate must be at least 1".to_owned(),
            });
        }
        if self.effects.fire_cell_radius == 0 {
            return Err(ConfigError::Invalid {
                reason: "effects.fire_cell_radius must be at least 1".to_owned(),
            });
        }
        if let Some((name, _)) = self
            .maps
            .iter()
            .find(|(_, projection)| !(projection.scale.is_finite() && projection.scale > 0.0))
        {
            return Err(ConfigError::Invalid {
                reason: format!("maps.{name}.scale must be a positive finite number"),
            });
        }
        Ok(())
    }
}

/// Tick rate and per-phase durations.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TimingConfig {
    /// Server ticks per second.
    #[serde(default = "default_tick_rate")]
    pub tick_rate: u32,

    /// Warmup length. Zero means the warmup timer is not shown.
    #[serde(default)]
    pub warmup_ms: u64,

    /// Buy period length.
    #[serde(default = "default_freezetime_ms")]
    pub freezetime_ms: u64,

    /// Live round length before a plant.
    #[serde(default = "default_round_ms")]
    pub round_ms: u64,

    /// Bomb timer after a plant.
    #[serde(default = "default_bomb_ms")]
    pub bomb_ms: u64,

    /// Delay between round end and the next freezetime.
    #[serde(default = "default_restart_delay_ms")]
    pub restart_delay_ms: u64,

    /// Halftime break length.
    #[serde(default = "default_halftime_ms")]
    pub halftime_ms: u64,
}

impl TimingConfig {
    /// Full duration of a phase.
    pub const fn phase_duration_ms(&self, phase: Phase) -> u64 {
        match phase {
            Phase::Warmup => self.warmup_ms,
            Phase::Freezetime => self.freezetime_ms,
            Phase::Regular => self.round_ms,
            Phase::Planted => self.bomb_ms,
            Phase::Restart => self.restart_delay_ms,
            Phase::Halftime => self.halftime_ms,
        }
    }
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            tick_rate: default_tick_rate(),
            warmup_ms: 0,
            freezetime_ms: default_freezetime_ms(),
            round_ms: default_round_ms(),
            bomb_ms: default_bomb_ms(),
            restart_delay_ms: default_restart_delay_ms(),
            halftime_ms: default_halftime_ms(),
        }
    }
}

/// Lifetimes of transient effects, all in ticks.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct EffectsConfig {
    /// HE explosion visual.
    #[serde(default = "default_he_lifetime")]
    pub he_explode_ticks: u32,

    /// Flashbang burst visual.
    #[serde(default = "default_flash_lifetime")]
    pub flash_explode_ticks: u32,

    /// Smoke cloud pop visual.
    #[serde(default = "default_smoke_lifetime")]
    pub smoke_start_ticks: u32,

    /// Decoy activation visual.
    #[serde(default = "default_decoy_lifetime")]
    pub decoy_start_ticks: u32,

    /// Molotov/incendiary ignition visual.
    #[serde(default = "default_fire_lifetime")]
    pub fire_start_ticks: u32,

    /// A killfeed line is dropped once this many ticks have passed since the kill.
    #[serde(default = "default_killfeed_retention_ticks")]
    pub killfeed_retention_ticks: u64,

    /// At most this many killfeed lines are kept; the oldest go first.
    #[serde(default = "default_killfeed_capacity")]
    pub killfeed_capacity: usize,

    /// Half-width of one fire cell in world units. Fires that do not span
    /// an area on their own are drawn as cells of this size.
    #[serde(default = "default_fire_cell_radius")]
    pub fire_cell_radius: u32,
}

impl EffectsConfig {
    /// Initial lifetime of the visual for a detonation kind.
    pub const fn lifetime_for(&self, kind: GrenadeEventKind) -> u32 {
        match kind {
            GrenadeEventKind::HeExplode => self.he_explode_ticks,
            GrenadeEventKind::FlashExplode => self.flash_explode_ticks,
            GrenadeEventKind::SmokeStart => self.smoke_start_ticks,
            GrenadeEventKind::DecoyStart => self.decoy_start_ticks,
            GrenadeEventKind::FireStart => self.fire_start_ticks,
        }
    }
}

impl Default for EffectsConfig {
    fn default() -> Self {
        Self {
            he_explode_ticks: default_he_lifetime(),
            flash_explode_ticks: default_flash_lifetime(),
            smoke_start_ticks: default_smoke_lifetime(),
            decoy_start_ticks: default_decoy_lifetime(),
            fire_start_ticks: default_fire_lifetime(),
            killfeed_retention_ticks: default_killfeed_retention_ticks(),
            killfeed_capacity: default_killfeed_capacity(),
            fire_cell_radius: default_fire_cell_radius(),
        }
    }
}

/// Radar-style projection from world space to the overview image.
///
/// `x' = (x - origin_x) / scale` and `y' = (origin_y - y) / scale`.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct MapProjection {
    /// World X of the overview's top-left corner.
    pub origin_x: f64,
    /// World Y of the overview's top-left corner.
    pub origin_y: f64,
    /// World units per overview pixel.
    pub scale: f64,
}

impl Default for MapProjection {
    fn default() -> Self {
        Self {
            origin_x: 0.0,
            origin_y: 0.0,
            scale: 1.0,
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error). `RUST_LOG` overrides it.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Emit JSON lines instead of human-readable output.
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

// ---------------------------------------------------------------------------
// Default value functions
// ---------------------------------------------------------------------------

const fn default_tick_rate() -> u32 {
    64
}

const fn default_freezetime_ms() -> u64 {
    15_000
}

const fn default_round_ms() -> u64 {
    115_000
}

const fn default_bomb_ms() -> u64 {
    40_000
}

const fn default_restart_delay_ms() -> u64 {
    7_000
}

const fn default_halftime_ms() -> u64 {
    15_000
}

const fn default_he_lifetime() -> u32 {
    32
}

const fn default_flash_lifetime() -> u32 {
    32
}

const fn default_smoke_lifetime() -> u32 {
    64
}

const fn default_decoy_lifetime() -> u32 {
    32
}

const fn default_fire_lifetime() -> u32 {
    16
}

const fn default_killfeed_retention_ticks() -> u64 {
    320
}

const fn default_killfeed_capacity() -> usize {
    5
}

const fn default_fire_cell_radius() -> u32 {
    30
}

fn default_log_level() -> String {
    "info".to_owned()
}
