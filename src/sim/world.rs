/// WorldState: the complete in-memory state of a running session.
///
/// Owned by the frame loop and passed by `&mut` into `step`; the renderer
/// only reads it. Nothing here is global.
///
/// ## Lifetimes
///   - `elevators` - created once, never reset, keep moving forever
///   - `floors`    - immutable after construction
///   - `player`    - created once, reset in place on retry

use crate::domain::entity::{Elevator, Floor, Player, PlayerStatus};
use crate::domain::geometry::SceneBounds;
use crate::domain::physics::GoalZone;
use crate::domain::rules::Economy;

pub struct WorldState {
    pub scene: SceneBounds,

    // ── Entities ──
    pub player: Player,
    pub elevators: Vec<Elevator>,
    pub floors: Vec<Floor>,

    // ── Rules ──
    pub economy: Economy,
    pub goal: GoalZone,

    // ── Meta ──
    pub tick: u64,
    /// Terminal window has focus. Losing it suspends the simulation.
    pub focused: bool,
    /// Paused by the player (F1).
    pub paused: bool,

    // ── UI ──
    pub message: String,
    pub message_timer: u32,
}

impl WorldState {
    pub fn new(scene: SceneBounds, player: Player, economy: Economy, goal: GoalZone) -> Self {
        WorldState {
            scene,
            player,
            elevators: vec![],
            floors: vec![],
            economy,
            goal,
            tick: 0,
            focused: true,
            paused: false,
            message: String::new(),
            message_timer: 0,
        }
    }

    /// Does the simulation advance this frame?
    #[inline]
    pub fn is_running(&self) -> bool {
        self.focused && !self.paused
    }

    #[inline]
    pub fn status(&self) -> PlayerStatus {
        self.player.status()
    }

    pub fn set_message(&mut self, msg: &str, duration: u32) {
        self.message = msg.to_string();
        self.message_timer = duration;
    }

    /// Count down the message bar; clears the text when it expires.
    pub fn tick_message(&mut self) {
        if self.message_timer > 0 {
            self.message_timer -= 1;
            if self.message_timer == 0 {
                self.message.clear();
            }
        }
    }
}
