/// External configuration loader.
///
/// Reads `config.toml` from the executable's directory (or CWD).
/// Falls back to sensible defaults if the file is missing, incomplete or
/// invalid; `Loaded::report` logs which case applied.

use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::domain::entity::{Direction, PlayerTuning};
use crate::domain::geometry::SceneBounds;
use crate::domain::physics::GoalZone;
use crate::domain::rules::Economy;

// ── Errors ──

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("could not read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("config.toml parse error: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid setting: {0}")]
    Invalid(String),
}

// ── Public Config Struct ──

#[derive(Clone, Debug)]
pub struct GameConfig {
    pub scene: SceneBounds,
    pub player: PlayerTuning,
    pub economy: Economy,
    pub goal: GoalZone,
    pub layout: LayoutConfig,
    pub input: InputConfig,
    pub timing: TimingConfig,
    pub gamepad: GamepadConfig,
    pub log_file: PathBuf,
}

/// Scene contents. Empty lists mean "use the built-in layout".
#[derive(Clone, Debug, Default)]
pub struct LayoutConfig {
    pub elevators: Vec<ElevatorSpec>,
    pub floors: Vec<FloorSpec>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ElevatorSpec {
    pub shaft_x: f64,
    pub speed: f64,
    pub car_y: f64,
    pub direction: Direction,
}

#[derive(Clone, Debug, PartialEq)]
pub struct FloorSpec {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

#[derive(Clone, Debug)]
pub struct InputConfig {
    /// Re-apply the action every tick it is held instead of once per press.
    pub action_repeat: bool,
}

#[derive(Clone, Debug)]
pub struct TimingConfig {
    pub frame_ms: u64,
}

#[derive(Clone, Debug)]
pub struct GamepadConfig {
    pub jump: Vec<String>,
    pub action: Vec<String>,
    pub pause: Vec<String>,
    pub quit: Vec<String>,
}

/// Result of `GameConfig::load`: the settings in effect and where they came from.
pub struct Loaded {
    pub config: GameConfig,
    pub path: Option<PathBuf>,
    pub error: Option<ConfigError>,
}

impl Loaded {
    pub fn report(&self) {
        match (&self.path, &self.error) {
            (Some(_), Some(e)) => log::warn!("{e}; using default settings"),
            (Some(path), None) => log::info!("loaded {}", path.display()),
            (None, _) => log::info!("no config.toml found, using defaults"),
        }
    }
}

// ── TOML Schema (with serde defaults) ──

#[derive(Deserialize, Debug, Default)]
struct TomlConfig {
    #[serde(default)]
    scene: TomlScene,
    #[serde(default)]
    player: TomlPlayer,
    #[serde(default)]
    economy: TomlEconomy,
    #[serde(default)]
    goal: TomlGoal,
    #[serde(default)]
    input: TomlInput,
    #[serde(default)]
    timing: TomlTiming,
    #[serde(default)]
    gamepad: TomlGamepad,
    #[serde(default)]
    general: TomlGeneral,
    #[serde(default)]
    elevators: Vec<TomlElevator>,
    #[serde(default)]
    floors: Vec<TomlFloor>,
}

#[derive(Deserialize, Debug)]
struct TomlScene {
    #[serde(default = "default_scene_width")]
    width: f64,
    #[serde(default = "default_scene_height")]
    height: f64,
    #[serde(default = "default_spawn_x")]
    spawn_x: f64,
    #[serde(default = "default_spawn_y")]
    spawn_y: f64,
}

#[derive(Deserialize, Debug)]
struct TomlPlayer {
    #[serde(default = "default_player_width")]
    width: f64,
    #[serde(default = "default_player_height")]
    height: f64,
    #[serde(default = "default_speed")]
    speed: f64,
    #[serde(default = "default_gravity")]
    gravity: f64,
    #[serde(default = "default_friction")]
    friction: f64,
    #[serde(default = "default_jump_factor")]
    jump_factor: f64,
    #[serde(default = "default_jump_cooldown")]
    jump_cooldown_ms: u64,
    #[serde(default = "default_starting_money")]
    starting_money: f64,
}

#[derive(Deserialize, Debug)]
struct TomlEconomy {
    #[serde(default = "default_move_cost")]
    move_cost: f64,
    #[serde(default = "default_jump_cost")]
    jump_cost: f64,
    #[serde(default = "default_revive_cost")]
    revive_cost: f64,
    #[serde(default = "default_revive_floor")]
    revive_floor: f64,
    #[serde(default = "default_refill_amount")]
    refill_amount: f64,
}

#[derive(Deserialize, Debug)]
struct TomlGoal {
    #[serde(default = "default_goal_top")]
    top: f64,
    #[serde(default = "default_goal_bottom")]
    bottom: f64,
    #[serde(default = "default_goal_min_right")]
    min_right: f64,
}

#[derive(Deserialize, Debug, Default)]
struct TomlInput {
    #[serde(default)]
    action_repeat: bool,
}

#[derive(Deserialize, Debug)]
struct TomlTiming {
    #[serde(default = "default_frame_ms")]
    frame_ms: u64,
}

#[derive(Deserialize, Debug)]
struct TomlGamepad {
    #[serde(default = "default_pad_jump")]
    jump: Vec<String>,
    #[serde(default = "default_pad_action")]
    action: Vec<String>,
    #[serde(default = "default_pad_pause")]
    pause: Vec<String>,
    #[serde(default = "default_pad_quit")]
    quit: Vec<String>,
}

#[derive(Deserialize, Debug)]
struct TomlGeneral {
    #[serde(default = "default_log_file")]
    log_file: String,
}

#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
enum TomlDirection {
    Up,
    Down,
}

#[derive(Deserialize, Debug)]
struct TomlElevator {
    shaft_x: f64,
    speed: f64,
    car_y: f64,
    #[serde(default = "default_direction")]
    direction: TomlDirection,
}

#[derive(Deserialize, Debug)]
struct TomlFloor {
    x: f64,
    y: f64,
    width: f64,
    height: f64,
}

// ── Defaults ──

fn default_scene_width() -> f64 { 812.0 }
fn default_scene_height() -> f64 { 612.0 }
fn default_spawn_x() -> f64 { 25.0 }
fn default_spawn_y() -> f64 { 350.0 }
fn default_player_width() -> f64 { 33.0 }
fn default_player_height() -> f64 { 50.0 }
fn default_speed() -> f64 { 200.0 }
fn default_gravity() -> f64 { 17.0 }       // per tick, not per second
fn default_friction() -> f64 { 0.95 }
fn default_jump_factor() -> f64 { 2.5 }
fn default_jump_cooldown() -> u64 { 500 }
fn default_starting_money() -> f64 { 10_000_000.0 }
fn default_move_cost() -> f64 { 10_000.0 }
fn default_jump_cost() -> f64 { 50_000.0 }
fn default_revive_cost() -> f64 { 500_000.0 }
fn default_revive_floor() -> f64 { 5_000.0 }
fn default_refill_amount() -> f64 { 1_000_000.0 }
fn default_goal_top() -> f64 { 0.0 }
fn default_goal_bottom() -> f64 { 100.0 }
fn default_goal_min_right() -> f64 { 780.0 }
fn default_frame_ms() -> u64 { 16 }
fn default_direction() -> TomlDirection { TomlDirection::Down }

fn default_pad_jump() -> Vec<String> { vec!["A".into(), "L1".into(), "R1".into()] }
fn default_pad_action() -> Vec<String> { vec!["B".into(), "Start".into()] }
fn default_pad_pause() -> Vec<String> { vec!["Y".into()] }
fn default_pad_quit() -> Vec<String> { vec!["Select".into()] }
fn default_log_file() -> String { "elevators.log".into() }

impl Default for TomlScene {
    fn default() -> Self {
        TomlScene {
            width: default_scene_width(),
            height: default_scene_height(),
            spawn_x: default_spawn_x(),
            spawn_y: default_spawn_y(),
        }
    }
}

impl Default for TomlPlayer {
    fn default() -> Self {
        TomlPlayer {
            width: default_player_width(),
            height: default_player_height(),
            speed: default_speed(),
            gravity: default_gravity(),
            friction: default_friction(),
            jump_factor: default_jump_factor(),
            jump_cooldown_ms: default_jump_cooldown(),
            starting_money: default_starting_money(),
        }
    }
}

impl Default for TomlEconomy {
    fn default() -> Self {
        TomlEconomy {
            move_cost: default_move_cost(),
            jump_cost: default_jump_cost(),
            revive_cost: default_revive_cost(),
            revive_floor: default_revive_floor(),
            refill_amount: default_refill_amount(),
        }
    }
}

impl Default for TomlGoal {
    fn default() -> Self {
        TomlGoal {
            top: default_goal_top(),
            bottom: default_goal_bottom(),
            min_right: default_goal_min_right(),
        }
    }
}

impl Default for TomlTiming {
    fn default() -> Self {
        TomlTiming { frame_ms: default_frame_ms() }
    }
}

impl Default for TomlGamepad {
    fn default() -> Self {
        TomlGamepad {
            jump: default_pad_jump(),
            action: default_pad_action(),
            pause: default_pad_pause(),
            quit: default_pad_quit(),
        }
    }
}

impl Default for TomlGeneral {
    fn default() -> Self {
        TomlGeneral { log_file: default_log_file() }
    }
}

// ── Loading ──

impl Default for GameConfig {
    fn default() -> Self {
        GameConfig::from_toml(TomlConfig::default())
    }
}

impl GameConfig {
    /// Load config from `config.toml`.
    /// Search order: (1) exe directory, (2) current working directory.
    /// Missing file or missing keys gracefully fall back to defaults.
    ///
    /// The log file location lives in the config itself, so nothing is
    /// logged here; call `Loaded::report` once the logger is up.
    pub fn load() -> Loaded {
        for dir in candidate_dirs() {
            let path = dir.join("config.toml");
            if !path.exists() {
                continue;
            }
            return match GameConfig::from_file(&path) {
                Ok(config) => Loaded { config, path: Some(path), error: None },
                Err(e) => Loaded { config: GameConfig::default(), path: Some(path), error: Some(e) },
            };
        }
        Loaded { config: GameConfig::default(), path: None, error: None }
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        GameConfig::from_toml_str(&text)
    }

    /// Parse and validate a TOML document.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let raw: TomlConfig = toml::from_str(text)?;
        let cfg = GameConfig::from_toml(raw);
        cfg.validate()?;
        Ok(cfg)
    }

    fn from_toml(t: TomlConfig) -> Self {
        GameConfig {
            scene: SceneBounds { width: t.scene.width, height: t.scene.height },
            player: PlayerTuning {
                width: t.player.width,
                height: t.player.height,
                speed: t.player.speed,
                gravity: t.player.gravity,
                friction: t.player.friction,
                jump_factor: t.player.jump_factor,
                jump_cooldown_ms: t.player.jump_cooldown_ms,
                starting_money: t.player.starting_money,
                spawn: (t.scene.spawn_x, t.scene.spawn_y),
            },
            economy: Economy {
                move_cost: t.economy.move_cost,
                jump_cost: t.economy.jump_cost,
                revive_cost: t.economy.revive_cost,
                revive_floor: t.economy.revive_floor,
                refill_amount: t.economy.refill_amount,
            },
            goal: GoalZone {
                top: t.goal.top,
                bottom: t.goal.bottom,
                min_right: t.goal.min_right,
            },
            layout: LayoutConfig {
                elevators: t.elevators.iter().map(|e| ElevatorSpec {
                    shaft_x: e.shaft_x,
                    speed: e.speed,
                    car_y: e.car_y,
                    direction: match e.direction {
                        TomlDirection::Up => Direction::Up,
                        TomlDirection::Down => Direction::Down,
                    },
                }).collect(),
                floors: t.floors.iter().map(|f| FloorSpec {
                    x: f.x,
                    y: f.y,
                    width: f.width,
                    height: f.height,
                }).collect(),
            },
            input: InputConfig { action_repeat: t.input.action_repeat },
            timing: TimingConfig { frame_ms: t.timing.frame_ms },
            gamepad: GamepadConfig {
                jump: t.gamepad.jump,
                action: t.gamepad.action,
                pause: t.gamepad.pause,
                quit: t.gamepad.quit,
            },
            log_file: PathBuf::from(t.general.log_file),
        }
    }

    /// Reject settings the simulation cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let s = &self.scene;
        let p = &self.player;
        if !(s.width > 0.0 && s.height > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "scene size must be positive, got {}x{}", s.width, s.height
            )));
        }
        if !(p.width > 0.0 && p.height > 0.0) || p.width >= s.width || p.height >= s.height {
            return Err(ConfigError::Invalid(format!(
                "player size {}x{} does not fit the scene", p.width, p.height
            )));
        }
        if !(0.0..=1.0).contains(&p.friction) {
            return Err(ConfigError::Invalid(format!(
                "friction must be within 0..=1, got {}", p.friction
            )));
        }
        if self.timing.frame_ms == 0 {
            return Err(ConfigError::Invalid("frame_ms must be at least 1".into()));
        }
        if let Some(e) = self.layout.elevators.iter().find(|e| e.speed < 0.0) {
            return Err(ConfigError::Invalid(format!(
                "elevator at x={} has negative speed", e.shaft_x
            )));
        }
        if let Some(f) = self.layout.floors.iter().find(|f| f.width <= 0.0 || f.height <= 0.0) {
            return Err(ConfigError::Invalid(format!(
                "floor at ({}, {}) has no area", f.x, f.y
            )));
        }
        Ok(())
    }
}

/// Candidate directories to search: exe dir + CWD (deduplicated).
fn candidate_dirs() -> Vec<PathBuf> {
    let mut dirs = vec![];

    if let Ok(exe) = std::env::current_exe() {
        let resolved = exe.canonicalize().unwrap_or(exe);
        if let Some(parent) = resolved.parent() {
            dirs.push(parent.to_path_buf());
        }
    }

    if let Ok(cwd) = std::env::current_dir() {
        if !dirs.iter().any(|d| d == &cwd) {
            dirs.push(cwd);
        }
    }

    if dirs.is_empty() {
        dirs.push(PathBuf::from("."));
    }

    dirs
}
