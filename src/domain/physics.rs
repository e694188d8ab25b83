/// Physics layer: integration and collision resolution for the player.
///
/// ## Tick order (calculate_positions)
///
///   1. Gravity       - flat per-tick acceleration, not scaled by dt
///   2. Car pre-pass  - elevator contact may override vel_y or kill
///   3. Integration   - x += vel_x * dt, y += vel_y * dt
///   4. Walls/floors  - clamp x, push out of floors, die on top/bottom edge
///   5. Victory       - goal zone predicate
///   6. Landing       - unchanged y ends a jump
///
/// Only the position step sees `dt`. Gravity, jump impulse and the car
/// corrections are per-tick values, so physics speed follows frame rate.

use super::entity::{Elevator, Floor, Player};
use super::geometry::{self, SceneBounds};

/// How the player died this tick.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum DeathCause {
    /// Touched the top or bottom scene edge (spikes).
    Boundary,
    /// Fell onto a car roof.
    CrushedFromAbove,
    /// Jumped into a car's underside.
    CrushedFromBelow,
}

/// Victory zone: a band below `top`, ending at `bottom`, right of `min_right`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GoalZone {
    pub top: f64,
    pub bottom: f64,
    pub min_right: f64,
}

impl Default for GoalZone {
    fn default() -> Self {
        GoalZone { top: 0.0, bottom: 100.0, min_right: 780.0 }
    }
}

/// Distance from the car ceiling within which the player sticks to it.
const CEILING_SLACK: f64 = 3.0;
/// Extra push applied while a car descends, so the rider is not left behind.
const DESCENT_CORRECTION: f64 = 100.0;

// ══════════════════════════════════════════════════════════════
// Elevator cars
// ══════════════════════════════════════════════════════════════

/// Classify the player against every elevator and apply car contact.
///
/// Runs before integration. The contact fields on the player are shared by
/// all elevators; each one overwrites them, last in index order wins.
/// Returns the first death cause hit this tick, if any.
pub fn handle_car_collisions(player: &mut Player, elevators: &[Elevator]) -> Option<DeathCause> {
    let mut death = None;

    for (i, elevator) in elevators.iter().enumerate() {
        if !player.rect().x_overlaps(&elevator.shaft) {
            if player.contact.in_shaft == Some(i) {
                player.contact.in_shaft = None;
            }
            continue;
        }

        let car = &elevator.car;
        let c = &mut player.contact;
        c.in_shaft = Some(i);

        let bottom = player.y + player.height;
        if bottom < car.y {
            c.above_car = Some(i);
            c.below_car = None;
        }
        if bottom >= car.y {
            c.collided_with_top = Some(i);
            c.collided_with_bottom = None;
        }
        // Above last tick, touching the roof now: landed on a moving car.
        if c.above_car == Some(i) && c.collided_with_top == Some(i) {
            player.is_dead = true;
            death.get_or_insert(DeathCause::CrushedFromAbove);
        }

        let c = &mut player.contact;
        if player.y > car.bottom() {
            c.below_car = Some(i);
            c.above_car = None;
        }
        if player.y <= car.bottom() {
            c.collided_with_bottom = Some(i);
            c.collided_with_top = None;
        }
        if c.below_car == Some(i) && c.collided_with_bottom == Some(i) {
            player.is_dead = true;
            death.get_or_insert(DeathCause::CrushedFromBelow);
        }

        if player.contact.above_car != Some(i) && player.contact.below_car != Some(i) {
            ride_car(player, elevator);
        }
    }

    death
}

/// Player overlaps the car body: stick to the ceiling, stand on the floor,
/// or float in between.
fn ride_car(player: &mut Player, elevator: &Elevator) {
    let car = &elevator.car;

    if player.y <= car.y + CEILING_SLACK {
        player.vel_y = player.gravity;
        if elevator.moving_down() {
            player.vel_y += elevator.car_delta * DESCENT_CORRECTION;
        }
    } else if player.y + player.height >= car.bottom() {
        if player.vel_y >= elevator.car_delta {
            player.vel_y = elevator.car_delta - player.gravity;
            player.y = car.bottom() - player.height;
        }
        if elevator.moving_down() {
            player.vel_y += elevator.car_delta * DESCENT_CORRECTION;
        }
        player.is_jumping = false;
    } else if player.vel_y < 0.0 {
        player.is_jumping = true;
    }
}

// ══════════════════════════════════════════════════════════════
// Walls and floors
// ══════════════════════════════════════════════════════════════

/// Scene edges and static floors.
///
/// Touching the top or bottom edge kills without clamping; x is clamped
/// into the scene; each floor then corrects a single axis, in list order.
pub fn resolve_walls_and_floors(
    player: &mut Player,
    floors: &[Floor],
    scene: &SceneBounds,
) -> Option<DeathCause> {
    let mut body = player.rect();
    let mut death = None;

    if scene.touches_vertical_edge(&body) {
        player.is_dead = true;
        death = Some(DeathCause::Boundary);
    }

    scene.clamp_x(&mut body);

    for floor in floors {
        geometry::push_out(&mut body, &floor.rect);
    }

    player.set_position(&body);
    death
}

// ══════════════════════════════════════════════════════════════
// Victory
// ══════════════════════════════════════════════════════════════

/// Is the player's box inside the goal zone?
pub fn in_goal(player: &Player, goal: &GoalZone) -> bool {
    let body = player.rect();
    body.bottom() <= goal.bottom && body.y > goal.top && body.right() > goal.min_right
}

/// Latch `won` when the player reaches the goal zone.
pub fn check_victory(player: &mut Player, goal: &GoalZone) {
    if in_goal(player, goal) {
        player.won = true;
    }
}

// ══════════════════════════════════════════════════════════════
// Integration
// ══════════════════════════════════════════════════════════════

/// Everything a tick of player physics reads besides the player itself.
pub struct Surroundings<'a> {
    pub elevators: &'a [Elevator],
    pub floors: &'a [Floor],
    pub scene: &'a SceneBounds,
    pub goal: &'a GoalZone,
}

/// Advance the player by one tick of `dt` seconds. Call only while alive.
pub fn calculate_positions(player: &mut Player, env: &Surroundings, dt: f64) -> Option<DeathCause> {
    player.vel_y += player.gravity;
    let car_death = handle_car_collisions(player, env.elevators);

    player.x += player.vel_x * dt;
    player.y += player.vel_y * dt;

    let wall_death = resolve_walls_and_floors(player, env.floors, env.scene);
    check_victory(player, env.goal);

    if player.y == player.old_y {
        player.is_jumping = false;
        player.vel_y = 0.0;
    }

    car_death.or(wall_death)
}

// ══════════════════════════════════════════════════════════════
// Unit tests
// ══════════════════════════════════════════════════════════════
