mod default_observer;
mod game_observer;
mod pathfinding;
mod types;

pub use default_observer::DefaultObserver;
pub use game_observer::GameObserver;
pub use pathfinding::{BfsTree, apply_plan, shortest_path};
pub use types::{Action, Position, TargetSet};

// ============================================================================
// Helper functions
// ============================================================================

/// Action that brings `from` closest to (or, when `away`, farthest from) `to`.
pub fn greedy_step(from: Position, to: Position, actions: &[Action], away: bool) -> Option<Action> {
    let distance = |a: &&Action| from.step(**a).distance(&to);
    if away {
        actions.iter().max_by_key(distance).copied()
    } else {
        actions.iter().min_by_key(distance).copied()
    }
}
