use crate::game::{ControlMode, GameSummary};
use crate::infra::Action;
use crate::planners::adversarial::Decision;
use crate::state::GridWorld;

/// Trait for observing game events during execution
pub trait GameObserver {
    /// Called when the game starts
    fn on_game_start(&mut self, world: &GridWorld, mode: ControlMode);

    /// Called when an offline planner produced a new plan
    fn on_plan_ready(&mut self, _planner: &str, _plan: &[Action]) {
        // Default implementation does nothing
    }

    /// Called when the decision engine finished a cycle
    fn on_decision(&mut self, _decision: &Decision) {
        // Default implementation does nothing
    }

    /// Called when an action is selected for the controlled agent
    fn on_action_selected(&mut self, tick: u32, action: Action, world: &GridWorld);

    /// Called after every agent has moved for this tick
    fn on_state_update(&mut self, tick: u32, world: &GridWorld);

    /// Called when oscillation is detected
    fn on_oscillation_detected(&mut self, message: &str);

    /// Called when the game finishes
    fn on_game_finished(&mut self, summary: &GameSummary);
}
