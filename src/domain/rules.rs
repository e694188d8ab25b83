/// Input rules and the economy: what each input flag costs and does.
///
/// `apply_input` mutates only the player. The clock value is the only
/// outside input (jump cooldown).
///
/// ## Per-tick costs
/// ┌──────────────────────┬──────────────────────────┐
/// │ Input / event         │ Charge                   │
/// ├──────────────────────┼──────────────────────────┤
/// │ Left held             │ move_cost (per tick)     │
/// │ Right held            │ move_cost (per tick)     │
/// │ Jump triggered        │ jump_cost                │
/// │ Revive                │ revive_cost              │
/// │ Any movement          │ vel_x + vel_y (physics)  │
/// └──────────────────────┴──────────────────────────┘
///
/// ## Action flag (checked in this order, independently)
/// ┌──────────────────────┬──────────────────────────────────────────┐
/// │ Condition             │ Effect                                   │
/// ├──────────────────────┼──────────────────────────────────────────┤
/// │ Dead                  │ revive, charge revive_cost; if broke,   │
/// │                       │ money = revive_floor; money_spent = 0    │
/// │ money <= 0 && !dead   │ money = refill_amount                    │
/// │ Won                   │ won = false; money_spent = 0             │
/// └──────────────────────┴──────────────────────────────────────────┘

use super::entity::{Facing, Player};

/// Currency amounts charged or granted by the rules.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Economy {
    pub move_cost: f64,
    pub jump_cost: f64,
    pub revive_cost: f64,
    /// Wallet after a revive that would have left the player broke.
    pub revive_floor: f64,
    /// Wallet after bankruptcy is retried.
    pub refill_amount: f64,
}

impl Default for Economy {
    fn default() -> Self {
        Economy {
            move_cost: 10_000.0,
            jump_cost: 50_000.0,
            revive_cost: 500_000.0,
            revive_floor: 5_000.0,
            refill_amount: 1_000_000.0,
        }
    }
}

/// What `apply_input` did this tick, for event reporting.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct InputOutcome {
    pub jumped: bool,
    pub revived: bool,
    pub refilled: bool,
    pub retried: bool,
}

/// Can a jump start at `now_ms`?
pub fn can_jump(player: &Player, now_ms: u64) -> bool {
    if player.is_jumping {
        return false;
    }
    match player.jump_time {
        None => true,
        Some(t) => now_ms.saturating_sub(t) >= player.jump_cooldown_ms,
    }
}

/// Resolve the player's input flags for one tick.
pub fn apply_input(player: &mut Player, economy: &Economy, now_ms: u64) -> InputOutcome {
    let mut outcome = InputOutcome::default();
    player.old_y = player.y;

    if player.input.left {
        player.vel_x = -player.speed;
        player.facing = Facing::Left;
        player.charge(economy.move_cost);
    }

    if player.input.right {
        player.vel_x = player.speed;
        player.facing = Facing::Right;
        player.charge(economy.move_cost);
    }

    if !player.input.left && !player.input.right {
        player.vel_x *= player.friction;
    }

    if player.input.jump && can_jump(player, now_ms) {
        player.is_jumping = true;
        player.jump_time = Some(now_ms);
        player.vel_y = -player.speed * player.jump_factor;
        player.charge(economy.jump_cost);
        outcome.jumped = true;
    }

    if player.input.action && player.is_dead {
        player.is_dead = false;
        player.money -= economy.revive_cost;
        if player.money <= 0.0 {
            player.money = economy.revive_floor;
        }
        player.money_spent = 0.0;
        outcome.revived = true;
    }

    if player.input.action && player.money <= 0.0 && !player.is_dead {
        player.money = economy.refill_amount;
        outcome.refilled = true;
    }

    if player.input.action && player.won {
        player.won = false;
        player.money_spent = 0.0;
        outcome.retried = true;
    }

    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entity::{InputFlags, PlayerTuning};

    fn player() -> Player {
        Player::new(&PlayerTuning::default())
    }

    fn flags(left: bool, right: bool, jump: bool, action: bool) -> InputFlags {
        InputFlags { left, right, jump, action }
    }

    #[test]
    fn right_sets_velocity_and_facing() {
        let mut p = player();
        p.facing = Facing::Left;
        p.input = flags(false, true, false, false);
        apply_input(&mut p, &Economy::default(), 0);
        assert_eq!(p.vel_x, 200.0);
        assert_eq!(p.facing, Facing::Right);
        assert_eq!(p.money, 10_000_000.0 - 10_000.0);
        assert_eq!(p.money_spent, 10_000.0);
    }

    #[test]
    fn both_directions_charge_twice_right_wins() {
        let mut p = player();
        p.input = flags(true, true, false, false);
        apply_input(&mut p, &Economy::default(), 0);
        assert_eq!(p.vel_x, 200.0);
        assert_eq!(p.facing, Facing::Right);
        assert_eq!(p.money_spent, 20_000.0);
    }

    #[test]
    fn holding_right_costs_per_tick() {
        let mut p = player();
        p.input = flags(false, true, false, false);
        let n = 37;
        for _ in 0..n {
            apply_input(&mut p, &Economy::default(), 0);
        }
        assert_eq!(p.money, 10_000_000.0 - 10_000.0 * n as f64);
    }

    #[test]
    fn friction_decays_without_input() {
        let mut p = player();
        p.vel_x = 200.0;
        apply_input(&mut p, &Economy::default(), 0);
        assert!((p.vel_x - 190.0).abs() < 1e-9);
        for _ in 0..200 {
            apply_input(&mut p, &Economy::default(), 0);
        }
        assert!(p.vel_x > 0.0);
        assert!(p.vel_x < 0.01);
        assert_eq!(p.money_spent, 0.0);
    }

    #[test]
    fn jump_applies_impulse_and_cost() {
        let mut p = player();
        p.input = flags(false, false, true, false);
        let out = apply_input(&mut p, &Economy::default(), 1_000);
        assert!(out.jumped);
        assert!(p.is_jumping);
        assert_eq!(p.vel_y, -500.0);
        assert_eq!(p.jump_time, Some(1_000));
        assert_eq!(p.money_spent, 50_000.0);
    }

    #[test]
    fn jumps_100ms_apart_yield_one_impulse() {
        let mut p = player();
        p.input = flags(false, false, true, false);
        let econ = Economy::default();
        let first = apply_input(&mut p, &econ, 1_000);
        p.is_jumping = false; // landed in between
        p.vel_y = 0.0;
        let second = apply_input(&mut p, &econ, 1_100);
        assert!(first.jumped);
        assert!(!second.jumped);
        assert_eq!(p.vel_y, 0.0);
        assert_eq!(p.money_spent, 50_000.0);
    }

    #[test]
    fn jumps_600ms_apart_yield_two_impulses() {
        let mut p = player();
        p.input = flags(false, false, true, false);
        let econ = Economy::default();
        assert!(apply_input(&mut p, &econ, 1_000).jumped);
        p.is_jumping = false;
        p.vel_y = 0.0;
        assert!(apply_input(&mut p, &econ, 1_600).jumped);
        assert_eq!(p.vel_y, -500.0);
        assert_eq!(p.money_spent, 100_000.0);
    }

    #[test]
    fn no_jump_while_airborne() {
        let mut p = player();
        p.is_jumping = true;
        p.input = flags(false, false, true, false);
        assert!(!apply_input(&mut p, &Economy::default(), 10_000).jumped);
    }

    #[test]
    fn action_revives_dead_player() {
        let mut p = player();
        p.is_dead = true;
        p.money_spent = 123.0;
        p.input = flags(false, false, false, true);
        let out = apply_input(&mut p, &Economy::default(), 0);
        assert!(out.revived);
        assert!(!out.refilled);
        assert!(!p.is_dead);
        assert_eq!(p.money, 9_500_000.0);
        assert_eq!(p.money_spent, 0.0);
    }

    #[test]
    fn revive_when_broke_leaves_floor_amount() {
        let mut p = player();
        p.is_dead = true;
        p.money = 200_000.0;
        p.input = flags(false, false, false, true);
        let out = apply_input(&mut p, &Economy::default(), 0);
        assert!(out.revived);
        assert_eq!(p.money, 5_000.0);
        // Wallet is positive again, so no refill on the same tick
        assert!(!out.refilled);
    }

    #[test]
    fn action_refills_bankrupt_player() {
        let mut p = player();
        p.money = -42.0;
        p.input = flags(false, false, false, true);
        let out = apply_input(&mut p, &Economy::default(), 0);
        assert!(out.refilled);
        assert_eq!(p.money, 1_000_000.0);
    }

    #[test]
    fn action_clears_victory() {
        let mut p = player();
        p.won = true;
        p.money_spent = 777.0;
        p.input = flags(false, false, false, true);
        let out = apply_input(&mut p, &Economy::default(), 0);
        assert!(out.retried);
        assert!(!p.won);
        assert_eq!(p.money_spent, 0.0);
    }

    #[test]
    fn action_without_terminal_state_does_nothing() {
        let mut p = player();
        p.input = flags(false, false, false, true);
        let out = apply_input(&mut p, &Economy::default(), 0);
        assert_eq!(out, InputOutcome::default());
        assert_eq!(p.money, 10_000_000.0);
    }

    #[test]
    fn held_action_charges_again_after_revive_when_repeated() {
        let mut p = player();
        p.is_dead = true;
        p.input = flags(false, false, false, true);
        let econ = Economy::default();
        apply_input(&mut p, &econ, 0);
        p.is_dead = true;
        apply_input(&mut p, &econ, 16);
        assert_eq!(p.money, 9_000_000.0);
    }

    #[test]
    fn records_old_y() {
        let mut p = player();
        p.y = 123.0;
        apply_input(&mut p, &Economy::default(), 0);
        assert_eq!(p.old_y, 123.0);
    }
}
