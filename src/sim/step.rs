/// The step function: advances the world by one tick.
///
/// Processing order:
///   1. Latch this frame's input flags onto the player
///   2. Player update
///        frozen (dead / bankrupt / won): pin to spawn, then input only
///        alive: input → gravity → car pre-pass → integrate →
///               walls/floors → victory → landing → movement cost
///   3. Elevator motion (index order)
///   4. Status change events
///
/// `dt` is wall-clock seconds since the previous step and only scales the
/// position update. `now_ms` is the session clock used for jump cooldown.

use crate::domain::entity::{InputFlags, PlayerStatus};
use crate::domain::physics::{self, Surroundings};
use crate::domain::rules::{self, InputOutcome};
use super::event::GameEvent;
use super::world::WorldState;

// ══════════════════════════════════════════════════════════════
// Main entry point
// ══════════════════════════════════════════════════════════════

pub fn step(world: &mut WorldState, input: InputFlags, dt: f64, now_ms: u64) -> Vec<GameEvent> {
    if !world.is_running() { return vec![]; }

    let mut events: Vec<GameEvent> = Vec::new();
    world.tick += 1;
    world.tick_message();

    let before = world.status();
    world.player.input = input;

    update_player(world, dt, now_ms, &mut events);
    update_elevators(world, &mut events);
    resolve_status_change(before, world.status(), &mut events);

    events
}

// ══════════════════════════════════════════════════════════════
// Player
// ══════════════════════════════════════════════════════════════

fn update_player(world: &mut WorldState, dt: f64, now_ms: u64, events: &mut Vec<GameEvent>) {
    if world.player.status() != PlayerStatus::Alive {
        world.player.pin_to_spawn();
        let outcome = rules::apply_input(&mut world.player, &world.economy, now_ms);
        push_input_events(world, outcome, events);
        return;
    }

    let outcome = rules::apply_input(&mut world.player, &world.economy, now_ms);
    push_input_events(world, outcome, events);

    let env = Surroundings {
        elevators: &world.elevators,
        floors: &world.floors,
        scene: &world.scene,
        goal: &world.goal,
    };
    if let Some(cause) = physics::calculate_positions(&mut world.player, &env, dt) {
        events.push(GameEvent::PlayerDied { cause });
    }

    // Moving costs money in proportion to velocity, falling included.
    let p = &mut world.player;
    let (vx, vy) = (p.vel_x, p.vel_y);
    p.charge(vx);
    p.charge(vy);
}

fn push_input_events(world: &WorldState, outcome: InputOutcome, events: &mut Vec<GameEvent>) {
    if outcome.jumped {
        events.push(GameEvent::Jumped);
    }
    if outcome.revived {
        events.push(GameEvent::Revived { money: world.player.money });
    }
    if outcome.refilled {
        events.push(GameEvent::Refilled { money: world.player.money });
    }
    if outcome.retried {
        events.push(GameEvent::Retried);
    }
}

// ══════════════════════════════════════════════════════════════
// Elevators
// ══════════════════════════════════════════════════════════════

fn update_elevators(world: &mut WorldState, events: &mut Vec<GameEvent>) {
    for (index, elevator) in world.elevators.iter_mut().enumerate() {
        if elevator.update() {
            log::debug!("elevator {index} reversed at y={:.1}", elevator.car.y);
            events.push(GameEvent::ElevatorReversed { index, direction: elevator.direction });
        }
    }
}

// ══════════════════════════════════════════════════════════════
// Status change
// ══════════════════════════════════════════════════════════════

/// Deaths are reported with their cause by the physics pass; bankruptcy
/// and victory are detected here from the status transition.
fn resolve_status_change(before: PlayerStatus, after: PlayerStatus, events: &mut Vec<GameEvent>) {
    if before == after { return; }
    match after {
        PlayerStatus::Bankrupt => events.push(GameEvent::WentBankrupt),
        PlayerStatus::Won => events.push(GameEvent::Won),
        PlayerStatus::Alive | PlayerStatus::Dead => {}
    }
}

// ══════════════════════════════════════════════════════════════
// Unit tests
// ══════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GameConfig;
    use crate::domain::entity::Direction;
    use crate::domain::physics::DeathCause;
    use crate::sim::level::build_world;
    use proptest::prelude::*;

    const DT: f64 = 1.0 / 60.0;

    fn world() -> WorldState {
        build_world(&GameConfig::default())
    }

    fn idle() -> InputFlags {
        InputFlags::default()
    }

    fn action() -> InputFlags {
        InputFlags { action: true, ..Default::default() }
    }

    #[test]
    fn paused_world_does_not_advance() {
        let mut w = world();
        w.paused = true;
        let car_y = w.elevators[0].car.y;
        assert!(step(&mut w, idle(), DT, 0).is_empty());
        assert_eq!(w.tick, 0);
        assert_eq!(w.elevators[0].car.y, car_y);
    }

    #[test]
    fn unfocused_world_does_not_advance() {
        let mut w = world();
        w.focused = false;
        step(&mut w, idle(), DT, 0);
        assert_eq!(w.tick, 0);
    }

    #[test]
    fn elevators_move_every_tick() {
        let mut w = world();
        step(&mut w, idle(), DT, 0);
        assert_eq!(w.elevators[0].car.y, 410.0);
        assert_eq!(w.elevators[1].car.y, 302.5);
        assert_eq!(w.elevators[1].car_delta, -3.5);
    }

    #[test]
    fn spawn_falls_toward_floor() {
        let mut w = world();
        step(&mut w, idle(), DT, 0);
        assert_eq!(w.player.vel_y, 17.0);
        assert!(w.player.y > 350.0);
        // Falling costs money too.
        assert_eq!(w.player.money, 10_000_000.0 - 17.0);
    }

    #[test]
    fn player_comes_to_rest_on_spawn_floor() {
        let mut w = world();
        for i in 0..600 {
            step(&mut w, idle(), DT, i * 16);
        }
        assert_eq!(w.player.y, 500.0);
        assert_eq!(w.player.vel_y, 0.0);
        assert_eq!(w.status(), PlayerStatus::Alive);
    }

    #[test]
    fn holding_right_costs_move_fee_per_tick() {
        let mut w = world();
        let right = InputFlags { right: true, ..Default::default() };
        let start = w.player.money;
        let mut velocity_cost = 0.0;
        let n = 5;
        for i in 0..n {
            step(&mut w, right, DT, i * 16);
            velocity_cost += w.player.vel_x + w.player.vel_y;
        }
        let fee = start - w.player.money - velocity_cost;
        assert!((fee - 10_000.0 * n as f64).abs() < 1e-6);
    }

    #[test]
    fn boundary_death_is_reported_then_pinned() {
        let mut w = world();
        w.player.x = 300.0;
        w.player.y = 2.0;
        w.player.vel_y = -500.0;
        let events = step(&mut w, idle(), DT, 0);
        assert!(events.contains(&GameEvent::PlayerDied { cause: DeathCause::Boundary }));
        assert_eq!(w.status(), PlayerStatus::Dead);

        let events = step(&mut w, idle(), DT, 16);
        assert!(events.iter().all(|e| matches!(e, GameEvent::ElevatorReversed { .. })));
        assert_eq!((w.player.x, w.player.y), (25.0, 350.0));
        assert_eq!((w.player.vel_x, w.player.vel_y), (0.0, 0.0));
    }

    #[test]
    fn revive_resets_and_resumes() {
        let mut w = world();
        w.player.is_dead = true;
        let events = step(&mut w, action(), DT, 0);
        assert!(events.contains(&GameEvent::Revived { money: 9_500_000.0 }));
        assert_eq!(w.status(), PlayerStatus::Alive);
        assert_eq!((w.player.x, w.player.y), (25.0, 350.0));

        // Physics resumes next tick.
        step(&mut w, idle(), DT, 16);
        assert!(w.player.y > 350.0);
    }

    #[test]
    fn frozen_player_ignores_movement() {
        let mut w = world();
        w.player.won = true;
        let all = InputFlags { left: true, right: true, jump: true, action: false };
        let money = w.player.money;
        step(&mut w, all, DT, 10_000);
        assert_eq!(w.player.money, money);
        assert_eq!(w.player.vel_x, 0.0);
        assert!(!w.player.is_jumping);
    }

    #[test]
    fn bankruptcy_event_and_refill() {
        let mut w = world();
        w.player.money = 5_000.0;
        let right = InputFlags { right: true, ..Default::default() };
        let events = step(&mut w, right, DT, 0);
        assert!(events.contains(&GameEvent::WentBankrupt));
        assert_eq!(w.status(), PlayerStatus::Bankrupt);

        let events = step(&mut w, action(), DT, 16);
        assert!(events.contains(&GameEvent::Refilled { money: 1_000_000.0 }));
        assert_eq!(w.status(), PlayerStatus::Alive);
    }

    #[test]
    fn reaching_goal_wins_then_retry() {
        let mut w = world();
        w.player.x = 760.0;
        w.player.y = 50.0;
        w.player.old_y = 50.0;
        // Standing on the goal ledge: y + h = 100 lands exactly on it.
        let events = step(&mut w, idle(), DT, 0);
        assert!(events.contains(&GameEvent::Won));
        assert_eq!(w.status(), PlayerStatus::Won);

        let events = step(&mut w, action(), DT, 16);
        assert!(events.contains(&GameEvent::Retried));
        assert_eq!(w.player.money_spent, 0.0);
        assert_eq!((w.player.x, w.player.y), (25.0, 350.0));
    }

    #[test]
    fn jump_event_once_per_cooldown() {
        let mut w = world();
        w.player.y = 500.0;
        let jump = InputFlags { jump: true, ..Default::default() };
        let first = step(&mut w, jump, DT, 1_000);
        assert!(first.contains(&GameEvent::Jumped));
        let second = step(&mut w, jump, DT, 1_100);
        assert!(!second.contains(&GameEvent::Jumped));
    }

    #[test]
    fn reversal_event_carries_new_direction() {
        let mut w = world();
        w.elevators[0].car.y = 562.0;
        let events = step(&mut w, idle(), DT, 0);
        assert!(events.contains(&GameEvent::ElevatorReversed { index: 0, direction: Direction::Up }));
    }

    proptest! {
        #[test]
        fn terminal_state_always_pins_to_spawn(
            x in 0.0f64..780.0,
            y in 1.0f64..560.0,
            vx in -300.0f64..300.0,
            vy in -600.0f64..600.0,
            which in 0u8..3,
            left in any::<bool>(),
            right in any::<bool>(),
            jump in any::<bool>(),
        ) {
            let mut w = world();
            w.player.x = x;
            w.player.y = y;
            w.player.vel_x = vx;
            w.player.vel_y = vy;
            match which {
                0 => w.player.is_dead = true,
                1 => w.player.money = 0.0,
                _ => w.player.won = true,
            }
            let input = InputFlags { left, right, jump, action: false };
            step(&mut w, input, DT, 5_000);
            prop_assert_eq!((w.player.x, w.player.y), (25.0, 350.0));
            prop_assert_eq!((w.player.vel_x, w.player.vel_y), (0.0, 0.0));
        }

        #[test]
        fn car_center_stays_near_shaft(ticks in 1usize..3000) {
            let mut w = world();
            for i in 0..ticks {
                step(&mut w, idle(), DT, i as u64 * 16);
            }
            for e in &w.elevators {
                let c = e.car.center_y();
                // A rising car takes one more step on the tick it reverses.
                prop_assert!(c >= -2.0 * e.speed && c <= e.shaft.bottom() + e.speed);
            }
        }
    }
}
