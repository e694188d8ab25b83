/// Events emitted during a simulation step.
/// The presentation layer consumes these for the message bar and the log.

use crate::domain::entity::Direction;
use crate::domain::physics::DeathCause;

#[derive(Clone, Debug, PartialEq)]
pub enum GameEvent {
    Jumped,
    PlayerDied { cause: DeathCause },
    WentBankrupt,
    Won,
    Revived { money: f64 },
    Refilled { money: f64 },
    Retried,
    ElevatorReversed { index: usize, direction: Direction },
}
