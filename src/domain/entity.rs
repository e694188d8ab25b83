/// Entities: Player, Elevator (shaft + moving car), Floor.
/// Elevators and floors are created once per session; the player is reset
/// in place whenever a terminal state is retried.

use super::geometry::Rect;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Facing {
    Left,
    Right,
}

/// Travel direction of an elevator car.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Direction {
    Up,
    Down,
}

/// Level-triggered input flags, read once per tick.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct InputFlags {
    pub left: bool,
    pub right: bool,
    pub jump: bool,
    pub action: bool,
}

/// Where the player stands relative to the elevators.
///
/// A single shared classification: every elevator the player is checked
/// against overwrites these fields, so the last elevator evaluated in index
/// order wins. Shafts are spaced apart, so at most one can actually hold
/// the player.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct ShaftContact {
    pub in_shaft: Option<usize>,
    pub above_car: Option<usize>,
    pub below_car: Option<usize>,
    pub collided_with_top: Option<usize>,
    pub collided_with_bottom: Option<usize>,
}

/// Which terminal condition, if any, currently freezes the player.
/// Precedence: Dead > Bankrupt > Won.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum PlayerStatus {
    Alive,
    Dead,
    Bankrupt,
    Won,
}

/// Physical constants of the player body.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PlayerTuning {
    pub width: f64,
    pub height: f64,
    pub speed: f64,
    pub gravity: f64,
    pub friction: f64,
    /// Jump impulse = speed * jump_factor, upward.
    pub jump_factor: f64,
    pub jump_cooldown_ms: u64,
    pub starting_money: f64,
    pub spawn: (f64, f64),
}

impl Default for PlayerTuning {
    fn default() -> Self {
        PlayerTuning {
            width: 33.0,
            height: 50.0,
            speed: 200.0,
            gravity: 17.0,
            friction: 0.95,
            jump_factor: 2.5,
            jump_cooldown_ms: 500,
            starting_money: 10_000_000.0,
            spawn: (25.0, 350.0),
        }
    }
}

#[derive(Clone, Debug)]
pub struct Player {
    pub x: f64,
    pub y: f64,
    /// y at the start of the current tick; unchanged y means "landed".
    pub old_y: f64,
    pub width: f64,
    pub height: f64,
    pub vel_x: f64,
    pub vel_y: f64,
    pub speed: f64,
    pub gravity: f64,
    pub friction: f64,
    pub jump_factor: f64,
    pub jump_cooldown_ms: u64,
    pub money: f64,
    pub money_spent: f64,
    pub input: InputFlags,
    pub facing: Facing,
    pub is_jumping: bool,
    /// Clock value (ms) of the last jump start.
    pub jump_time: Option<u64>,
    pub contact: ShaftContact,
    pub is_dead: bool,
    pub won: bool,
    pub spawn: (f64, f64),
}

impl Player {
    pub fn new(tuning: &PlayerTuning) -> Self {
        Player {
            x: tuning.spawn.0,
            y: tuning.spawn.1,
            old_y: 0.0,
            width: tuning.width,
            height: tuning.height,
            vel_x: 0.0,
            vel_y: 0.0,
            speed: tuning.speed,
            gravity: tuning.gravity,
            friction: tuning.friction,
            jump_factor: tuning.jump_factor,
            jump_cooldown_ms: tuning.jump_cooldown_ms,
            money: tuning.starting_money,
            money_spent: 0.0,
            input: InputFlags::default(),
            facing: Facing::Right,
            is_jumping: false,
            jump_time: None,
            contact: ShaftContact::default(),
            is_dead: false,
            won: false,
            spawn: tuning.spawn,
        }
    }

    #[inline]
    pub fn rect(&self) -> Rect {
        Rect::new(self.x, self.y, self.width, self.height)
    }

    /// Copy a resolved body position back onto the player.
    #[inline]
    pub fn set_position(&mut self, body: &Rect) {
        self.x = body.x;
        self.y = body.y;
    }

    pub fn status(&self) -> PlayerStatus {
        if self.is_dead {
            PlayerStatus::Dead
        } else if self.money <= 0.0 {
            PlayerStatus::Bankrupt
        } else if self.won {
            PlayerStatus::Won
        } else {
            PlayerStatus::Alive
        }
    }

    /// Deduct `amount` from the wallet and add it to the spent counter.
    #[inline]
    pub fn charge(&mut self, amount: f64) {
        self.money -= amount;
        self.money_spent += amount;
    }

    /// Freeze at spawn while a terminal state holds.
    /// Movement and jump flags are dropped; only the action flag survives.
    pub fn pin_to_spawn(&mut self) {
        self.x = self.spawn.0;
        self.y = self.spawn.1;
        self.old_y = 0.0;
        self.vel_x = 0.0;
        self.vel_y = 0.0;
        self.input.left = false;
        self.input.right = false;
        self.input.jump = false;
        self.is_jumping = false;
        self.jump_time = None;
        self.contact = ShaftContact::default();
    }
}

/// Fixed geometry of an elevator shaft and its car.
pub const SHAFT_WIDTH: f64 = 100.0;
pub const CAR_WIDTH: f64 = SHAFT_WIDTH + 2.0;
pub const CAR_HEIGHT: f64 = 100.0;

#[derive(Clone, Debug)]
pub struct Elevator {
    pub shaft: Rect,
    pub car: Rect,
    pub speed: f64,
    pub direction: Direction,
    pub car_old_y: f64,
    /// Signed y displacement of the car during the last update.
    pub car_delta: f64,
}

impl Elevator {
    /// A shaft spanning the full scene height at `shaft_x`, with the car
    /// one unit wider than the shaft on each side.
    pub fn new(shaft_x: f64, speed: f64, car_y: f64, direction: Direction, shaft_height: f64) -> Self {
        Elevator {
            shaft: Rect::new(shaft_x, 0.0, SHAFT_WIDTH, shaft_height),
            car: Rect::new(shaft_x - 1.0, car_y, CAR_WIDTH, CAR_HEIGHT),
            speed,
            direction,
            car_old_y: 0.0,
            car_delta: 0.0,
        }
    }

    /// Advance the car one tick. Returns true if the direction reversed.
    ///
    /// The car bounces once its center reaches the shaft top or bottom.
    /// Both direction blocks run in sequence, so a descending car that
    /// reverses is moved down and back up within the same tick.
    pub fn update(&mut self) -> bool {
        let initial = self.direction;
        self.car_old_y = self.car.y;

        if self.direction == Direction::Down {
            if self.car.center_y() >= self.shaft.bottom() {
                self.direction = Direction::Up;
            }
            self.car.y += self.speed;
        }

        if self.direction == Direction::Up {
            if self.car.center_y() <= self.shaft.y {
                self.direction = Direction::Down;
            }
            self.car.y -= self.speed;
        }

        self.car_delta = self.car.y - self.car_old_y;
        self.direction != initial
    }

    #[inline]
    pub fn moving_down(&self) -> bool {
        self.direction == Direction::Down
    }
}

/// Static platform.
#[derive(Clone, Debug)]
pub struct Floor {
    pub rect: Rect,
}

impl Floor {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Floor { rect: Rect::new(x, y, width, height) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn player_starts_at_spawn_facing_right() {
        let p = Player::new(&PlayerTuning::default());
        assert_eq!((p.x, p.y), (25.0, 350.0));
        assert_eq!(p.facing, Facing::Right);
        assert_eq!(p.money, 10_000_000.0);
        assert_eq!(p.status(), PlayerStatus::Alive);
    }

    #[test]
    fn status_precedence() {
        let mut p = Player::new(&PlayerTuning::default());
        p.won = true;
        assert_eq!(p.status(), PlayerStatus::Won);
        p.money = 0.0;
        assert_eq!(p.status(), PlayerStatus::Bankrupt);
        p.is_dead = true;
        assert_eq!(p.status(), PlayerStatus::Dead);
    }

    #[test]
    fn pin_to_spawn_keeps_action_flag() {
        let mut p = Player::new(&PlayerTuning::default());
        p.x = 400.0;
        p.vel_y = -30.0;
        p.input = InputFlags { left: true, right: true, jump: true, action: true };
        p.contact.in_shaft = Some(2);
        p.jump_time = Some(1200);
        p.pin_to_spawn();
        assert_eq!((p.x, p.y, p.old_y), (25.0, 350.0, 0.0));
        assert_eq!((p.vel_x, p.vel_y), (0.0, 0.0));
        assert_eq!(p.input, InputFlags { action: true, ..Default::default() });
        assert_eq!(p.contact, ShaftContact::default());
        assert_eq!(p.jump_time, None);
    }

    #[test]
    fn elevator_car_geometry() {
        let e = Elevator::new(100.0, 2.0, 408.0, Direction::Down, 612.0);
        assert_eq!(e.car, Rect::new(99.0, 408.0, 102.0, 100.0));
        assert_eq!(e.shaft, Rect::new(100.0, 0.0, 100.0, 612.0));
    }

    #[test]
    fn elevator_moves_by_speed() {
        let mut e = Elevator::new(100.0, 2.0, 300.0, Direction::Down, 612.0);
        assert!(!e.update());
        assert_eq!(e.car.y, 302.0);
        assert_eq!(e.car_delta, 2.0);

        let mut e = Elevator::new(275.0, 3.5, 300.0, Direction::Up, 612.0);
        e.update();
        assert_eq!(e.car.y, 296.5);
        assert_eq!(e.car_delta, -3.5);
    }

    #[test]
    fn descending_car_flips_when_center_reaches_bottom() {
        // H = 612, C = 100: flip once car_y >= 562
        let mut e = Elevator::new(100.0, 2.0, 562.0, Direction::Down, 612.0);
        assert!(e.update());
        assert_eq!(e.direction, Direction::Up);
        assert_eq!(e.car.y, 562.0);
        assert_eq!(e.car_delta, 0.0);

        // Next tick climbs normally
        assert!(!e.update());
        assert_eq!(e.car.y, 560.0);
    }

    #[test]
    fn descending_car_short_of_bound_keeps_going() {
        let mut e = Elevator::new(100.0, 2.0, 561.0, Direction::Down, 612.0);
        assert!(!e.update());
        assert_eq!(e.direction, Direction::Down);
        assert_eq!(e.car.y, 563.0);
    }

    #[test]
    fn ascending_car_with_center_in_shaft_keeps_climbing() {
        // Center at y = 1, just inside the shaft top.
        let mut e = Elevator::new(450.0, 2.0, -49.0, Direction::Up, 612.0);
        assert!(!e.update());
        assert_eq!(e.direction, Direction::Up);
        assert_eq!(e.car.y, -51.0);
    }

    #[test]
    fn ascending_car_flips_at_top() {
        let mut e = Elevator::new(450.0, 5.5, -50.0, Direction::Up, 612.0);
        assert!(e.update());
        assert_eq!(e.direction, Direction::Down);
        assert_eq!(e.car.y, -55.5);
        e.update();
        assert_eq!(e.car.y, -50.0);
    }
}
