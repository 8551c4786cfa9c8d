use crate::infra::{Action, Position, TargetSet};

/// Index of the controlled agent. Adversaries use 1..agent_count().
pub const CONTROLLED_AGENT: usize = 0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AdversaryState {
    pub position: Position,
    /// Remaining moves during which this adversary can be captured.
    pub vulnerable_timer: u32,
}

impl AdversaryState {
    pub fn new(position: Position) -> Self {
        Self {
            position,
            vulnerable_timer: 0,
        }
    }

    pub fn is_vulnerable(&self) -> bool {
        self.vulnerable_timer > 0
    }
}

/// Read-only snapshot of a maze plus pure successor generation.
///
/// Planners and the decision engine only ever see the maze through this
/// trait. `successor` must not mutate `self`.
pub trait WorldView: Sized {
    fn current_position(&self) -> Position;

    fn targets(&self) -> &TargetSet;

    fn bonus_items(&self) -> &TargetSet;

    fn adversaries(&self) -> &[AdversaryState];

    /// Legal actions for `agent`, empty once the world is terminal.
    fn legal_actions(&self, agent: usize) -> Vec<Action>;

    fn successor(&self, agent: usize, action: Action) -> Self;

    fn is_win(&self) -> bool;

    fn is_loss(&self) -> bool;

    fn score(&self) -> f64;

    fn agent_count(&self) -> usize;

    fn has_obstacle(&self, x: i32, y: i32) -> bool;

    fn is_open(&self, pos: Position) -> bool {
        !self.has_obstacle(pos.x, pos.y)
    }

    /// Number of the four neighbours of `pos` that are obstacles.
    fn obstacle_neighbors(&self, pos: Position) -> usize {
        pos.neighbors().iter().filter(|n| !self.is_open(**n)).count()
    }
}
