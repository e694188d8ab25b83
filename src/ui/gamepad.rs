/// Gamepad input tracker using gilrs.
///
/// Button mapping is loaded from config.toml via `load_button_config()`.
/// Default mapping:
///   D-pad / Left Stick ←→ →  Walk
///   D-pad / Left Stick ↑  →  Jump
///   A / L1 / R1           →  Jump
///   B / Start             →  Action (revive, refill, retry)
///   Y                     →  Pause
///   Select                →  Quit

#[cfg(feature = "gamepad")]
use gilrs::{Axis, Button, EventType, Gilrs};

use crate::config::GamepadConfig;

#[cfg_attr(not(feature = "gamepad"), allow(dead_code))]
const STICK_DEADZONE: f32 = 0.25;

/// Logical button identifiers (one per physical button).
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Btn {
    A,       // South
    B,       // East
    X,       // West
    Y,       // North
    L1,      // LeftTrigger
    R1,      // RightTrigger
    L2,      // LeftTrigger2
    R2,      // RightTrigger2
    Start,
    Select,
}

impl Btn {
    fn from_name(s: &str) -> Option<Btn> {
        match s.to_uppercase().as_str() {
            "A" | "SOUTH"  => Some(Btn::A),
            "B" | "EAST"   => Some(Btn::B),
            "X" | "WEST"   => Some(Btn::X),
            "Y" | "NORTH"  => Some(Btn::Y),
            "L1" | "LB" | "LEFTTRIGGER"  => Some(Btn::L1),
            "R1" | "RB" | "RIGHTTRIGGER" => Some(Btn::R1),
            "L2" | "LT" | "LEFTTRIGGER2"  => Some(Btn::L2),
            "R2" | "RT" | "RIGHTTRIGGER2" => Some(Btn::R2),
            "START" => Some(Btn::Start),
            "SELECT" | "BACK" => Some(Btn::Select),
            _ => None,
        }
    }

    #[cfg(feature = "gamepad")]
    fn from_gilrs(btn: Button) -> Option<Btn> {
        match btn {
            Button::South     => Some(Btn::A),
            Button::East      => Some(Btn::B),
            Button::West      => Some(Btn::X),
            Button::North     => Some(Btn::Y),
            Button::LeftTrigger  => Some(Btn::L1),
            Button::RightTrigger => Some(Btn::R1),
            Button::LeftTrigger2  => Some(Btn::L2),
            Button::RightTrigger2 => Some(Btn::R2),
            Button::Start     => Some(Btn::Start),
            Button::Select    => Some(Btn::Select),
            _ => None,
        }
    }
}

/// Per-button state: held (continuous) and just_pressed (edge).
/// Walk and jump directions only need `held`, so they are plain bools.
#[derive(Clone, Copy, Debug, Default)]
struct BtnState {
    held: bool,
    just_pressed: bool,
}

/// Action-to-button mapping (loaded from config).
struct ActionMap {
    jump: Vec<Btn>,
    action: Vec<Btn>,
    pause: Vec<Btn>,
    quit: Vec<Btn>,
}

impl Default for ActionMap {
    fn default() -> Self {
        ActionMap {
            jump:   vec![Btn::A, Btn::L1, Btn::R1],
            action: vec![Btn::B, Btn::Start],
            pause:  vec![Btn::Y],
            quit:   vec![Btn::Select],
        }
    }
}

pub struct GamepadState {
    #[cfg(feature = "gamepad")]
    gilrs: Option<Gilrs>,

    // All tracked buttons (indexed by Btn)
    buttons: [BtnState; 10],

    // D-pad
    dpad_up: bool,
    dpad_left: bool,
    dpad_right: bool,

    // Stick
    stick_up: bool,
    stick_left: bool,
    stick_right: bool,
    stick_x: f32,
    stick_y: f32,

    // Action mapping
    action_map: ActionMap,

    pub connected: bool,
}

fn btn_index(btn: Btn) -> usize {
    btn as usize
}

impl GamepadState {
    pub fn new() -> Self {
        #[cfg(feature = "gamepad")]
        let (gilrs_opt, connected) = {
            match Gilrs::new() {
                Ok(g) => {
                    let has_pad = g.gamepads().next().is_some();
                    (Some(g), has_pad)
                }
                Err(e) => {
                    log::warn!("gamepad support unavailable: {e}");
                    (None, false)
                }
            }
        };
        #[cfg(not(feature = "gamepad"))]
        let connected = false;

        GamepadState {
            #[cfg(feature = "gamepad")]
            gilrs: gilrs_opt,
            buttons: [BtnState::default(); 10],
            dpad_up: false,
            dpad_left: false,
            dpad_right: false,
            stick_up: false,
            stick_left: false,
            stick_right: false,
            stick_x: 0.0,
            stick_y: 0.0,
            action_map: ActionMap::default(),
            connected,
        }
    }

    /// Load button mapping from config.
    /// Unknown names are skipped; a list with no usable names keeps the default.
    pub fn load_button_config(&mut self, cfg: &GamepadConfig) {
        fn parse_list(names: &[String]) -> Vec<Btn> {
            names.iter()
                .filter_map(|s| {
                    let btn = Btn::from_name(s);
                    if btn.is_none() {
                        log::warn!("unknown gamepad button {s:?} in config");
                    }
                    btn
                })
                .collect()
        }
        fn apply(slot: &mut Vec<Btn>, names: &[String]) {
            let parsed = parse_list(names);
            if !parsed.is_empty() { *slot = parsed; }
        }
        let map = &mut self.action_map;
        apply(&mut map.jump, &cfg.jump);
        apply(&mut map.action, &cfg.action);
        apply(&mut map.pause, &cfg.pause);
        apply(&mut map.quit, &cfg.quit);
    }

    pub fn update(&mut self) {
        self.clear_just_pressed();

        #[cfg(feature = "gamepad")]
        self.poll_gilrs();
    }

    #[cfg(feature = "gamepad")]
    fn poll_gilrs(&mut self) {
        let gilrs = match &mut self.gilrs {
            Some(g) => g,
            None => return,
        };

        let events: Vec<_> = std::iter::from_fn(|| gilrs.next_event()).collect();

        for event in events {
            match event.event {
                EventType::ButtonPressed(btn, _) => {
                    self.connected = true;
                    self.set_button(btn, true, true);
                }
                EventType::ButtonReleased(btn, _) => {
                    self.connected = true;
                    self.set_button(btn, false, false);
                }
                EventType::AxisChanged(axis, value, _) => {
                    self.connected = true;
                    self.update_axis(axis, value);
                }
                EventType::Connected => {
                    log::info!("gamepad connected");
                    self.connected = true;
                }
                EventType::Disconnected => {
                    log::info!("gamepad disconnected");
                    self.connected = false;
                    self.release_all();
                }
                _ => {}
            }
        }

        // Derive stick digital states
        self.derive_stick();
    }

    #[cfg(feature = "gamepad")]
    fn set_button(&mut self, gilrs_btn: Button, held: bool, just_pressed: bool) {
        // D-pad handled separately (not in Btn enum)
        match gilrs_btn {
            Button::DPadUp    => { self.dpad_up = held; return; }
            Button::DPadLeft  => { self.dpad_left = held; return; }
            Button::DPadRight => { self.dpad_right = held; return; }
            _ => {}
        }

        if let Some(btn) = Btn::from_gilrs(gilrs_btn) {
            let idx = btn_index(btn);
            self.buttons[idx].held = held;
            if just_pressed {
                self.buttons[idx].just_pressed = true;
            }
        }
    }

    #[cfg(feature = "gamepad")]
    fn update_axis(&mut self, axis: Axis, value: f32) {
        match axis {
            Axis::LeftStickX => self.stick_x = value,
            Axis::LeftStickY => self.stick_y = value,
            _ => {}
        }
    }

    #[cfg_attr(not(feature = "gamepad"), allow(dead_code))]
    fn derive_stick(&mut self) {
        self.stick_left = self.stick_x < -STICK_DEADZONE;
        self.stick_right = self.stick_x > STICK_DEADZONE;
        self.stick_up = self.stick_y > STICK_DEADZONE;
    }

    // ── Action queries (config-driven) ──

    fn any_just_pressed(&self, btns: &[Btn]) -> bool {
        btns.iter().any(|&b| self.buttons[btn_index(b)].just_pressed)
    }

    fn any_held(&self, btns: &[Btn]) -> bool {
        btns.iter().any(|&b| self.buttons[btn_index(b)].held)
    }

    pub fn jump_held(&self) -> bool {
        self.any_held(&self.action_map.jump) || self.dpad_up || self.stick_up
    }
    pub fn action_pressed(&self) -> bool {
        self.any_just_pressed(&self.action_map.action)
    }
    pub fn action_held(&self) -> bool {
        self.any_held(&self.action_map.action)
    }
    pub fn pause_pressed(&self) -> bool {
        self.any_just_pressed(&self.action_map.pause)
    }
    pub fn quit_pressed(&self) -> bool {
        self.any_just_pressed(&self.action_map.quit)
    }

    // Walking (continuous, held)
    pub fn left_held(&self) -> bool {
        self.dpad_left || self.stick_left
    }
    pub fn right_held(&self) -> bool {
        self.dpad_right || self.stick_right
    }

    // ── Internal ──

    fn clear_just_pressed(&mut self) {
        for b in &mut self.buttons { b.just_pressed = false; }
    }

    #[cfg_attr(not(feature = "gamepad"), allow(dead_code))]
    fn release_all(&mut self) {
        for b in &mut self.buttons { *b = BtnState::default(); }
        self.dpad_up = false;
        self.dpad_left = false;
        self.dpad_right = false;
        self.stick_up = false;
        self.stick_left = false;
        self.stick_right = false;
        self.stick_x = 0.0;
        self.stick_y = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn press(gp: &mut GamepadState, btn: Btn) {
        let s = &mut gp.buttons[btn_index(btn)];
        s.held = true;
        s.just_pressed = true;
    }

    #[test]
    fn button_names_are_case_insensitive() {
        assert_eq!(Btn::from_name("start"), Some(Btn::Start));
        assert_eq!(Btn::from_name("South"), Some(Btn::A));
        assert_eq!(Btn::from_name("back"), Some(Btn::Select));
        assert_eq!(Btn::from_name("turbo"), None);
    }

    #[test]
    fn default_map_routes_buttons() {
        let mut gp = GamepadState::new();
        press(&mut gp, Btn::A);
        press(&mut gp, Btn::B);
        assert!(gp.jump_held());
        assert!(gp.action_pressed());
        assert!(!gp.quit_pressed());

        gp.clear_just_pressed();
        assert!(!gp.action_pressed());
        assert!(gp.action_held());
    }

    #[test]
    fn config_overrides_and_ignores_unknown_names() {
        let mut gp = GamepadState::new();
        gp.load_button_config(&GamepadConfig {
            jump: vec!["X".into()],
            action: vec!["nope".into()],
            pause: vec![],
            quit: vec!["Start".into()],
        });
        press(&mut gp, Btn::X);
        press(&mut gp, Btn::B);
        press(&mut gp, Btn::Start);
        assert!(gp.jump_held());
        // Action list had no usable names, so B still maps to it.
        assert!(gp.action_pressed());
        assert!(gp.quit_pressed());
    }

    #[test]
    fn stick_beyond_deadzone_walks() {
        let mut gp = GamepadState::new();
        gp.stick_x = -0.8;
        gp.derive_stick();
        assert!(gp.left_held());
        assert!(!gp.right_held());

        gp.stick_x = 0.1;
        gp.stick_y = 0.9;
        gp.derive_stick();
        assert!(!gp.left_held());
        assert!(gp.jump_held());
    }

    #[test]
    fn directions_stay_held_across_frames_until_released() {
        let mut gp = GamepadState::new();
        gp.dpad_right = true;
        gp.stick_x = -0.8;
        gp.derive_stick();
        gp.clear_just_pressed();
        assert!(gp.right_held());
        assert!(gp.left_held());

        gp.release_all();
        assert!(!gp.right_held());
        assert!(!gp.left_held());
        assert!(!gp.jump_held());
    }
}
