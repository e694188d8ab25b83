/// Scene builder.
///
/// ## Sources (priority order):
///   1. `[[elevators]]` / `[[floors]]` tables in config.toml
///   2. Built-in layout (below)
///
/// Each list falls back independently, so a config can restyle the floors
/// and keep the stock elevators.
///
/// ## Built-in layout (scene height H):
///   ```
///   shaft_x  speed  car_y   direction
///   100      2.0    H/1.5   down
///   275      3.5    H/2     up
///   450      5.5    H/6     up
///   625      7.5    H/3     down
///   ```
///   Floors: spawn ledge (0, 550, 85×64) and goal ledge (738, 100, 74×32).

use crate::config::{ElevatorSpec, FloorSpec, GameConfig};
use crate::domain::entity::{Direction, Elevator, Floor, Player};
use crate::sim::world::WorldState;

// ══════════════════════════════════════════════════════════════
// Public API
// ══════════════════════════════════════════════════════════════

/// Build a fresh world from the configured scene.
pub fn build_world(config: &GameConfig) -> WorldState {
    let mut world = WorldState::new(
        config.scene,
        Player::new(&config.player),
        config.economy,
        config.goal,
    );

    let elevator_specs = if config.layout.elevators.is_empty() {
        default_elevators(config.scene.height)
    } else {
        config.layout.elevators.clone()
    };
    let floor_specs = if config.layout.floors.is_empty() {
        default_floors()
    } else {
        config.layout.floors.clone()
    };

    world.elevators = elevator_specs.iter()
        .map(|e| Elevator::new(e.shaft_x, e.speed, e.car_y, e.direction, config.scene.height))
        .collect();
    world.floors = floor_specs.iter()
        .map(|f| Floor::new(f.x, f.y, f.width, f.height))
        .collect();

    log::info!(
        "scene {}x{}: {} elevators, {} floors",
        config.scene.width, config.scene.height,
        world.elevators.len(), world.floors.len(),
    );

    world
}

// ══════════════════════════════════════════════════════════════
// Built-in layout
// ══════════════════════════════════════════════════════════════

fn default_elevators(scene_height: f64) -> Vec<ElevatorSpec> {
    let spec = |shaft_x: f64, speed: f64, car_y: f64, direction: Direction| ElevatorSpec {
        shaft_x, speed, car_y, direction,
    };
    vec![
        spec(100.0, 2.0, scene_height / 1.5, Direction::Down),
        spec(275.0, 3.5, scene_height / 2.0, Direction::Up),
        spec(450.0, 5.5, scene_height / 6.0, Direction::Up),
        spec(625.0, 7.5, scene_height / 3.0, Direction::Down),
    ]
}

fn default_floors() -> Vec<FloorSpec> {
    vec![
        FloorSpec { x: 0.0, y: 550.0, width: 85.0, height: 64.0 },
        FloorSpec { x: 738.0, y: 100.0, width: 74.0, height: 32.0 },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_layout() {
        let world = build_world(&GameConfig::default());
        assert_eq!(world.elevators.len(), 4);
        assert_eq!(world.floors.len(), 2);

        let e = &world.elevators[0];
        assert_eq!(e.shaft.x, 100.0);
        assert_eq!(e.shaft.height, 612.0);
        assert_eq!(e.car.y, 408.0);
        assert_eq!(e.direction, Direction::Down);

        assert_eq!(world.elevators[2].car.y, 102.0);
        assert_eq!(world.elevators[3].speed, 7.5);
        assert_eq!(world.floors[1].rect.x, 738.0);
        assert_eq!((world.player.x, world.player.y), (25.0, 350.0));
    }

    #[test]
    fn configured_floors_replace_builtin_floors_only() {
        let cfg = GameConfig::from_toml_str(
            "[[floors]]\nx = 10.0\ny = 500.0\nwidth = 50.0\nheight = 20.0\n",
        ).unwrap();
        let world = build_world(&cfg);
        assert_eq!(world.floors.len(), 1);
        assert_eq!(world.floors[0].rect.y, 500.0);
        assert_eq!(world.elevators.len(), 4);
    }

    #[test]
    fn shafts_do_not_overlap() {
        let world = build_world(&GameConfig::default());
        for pair in world.elevators.windows(2) {
            assert!(pair[0].shaft.right() < pair[1].shaft.x);
        }
    }
}
