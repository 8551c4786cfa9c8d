use tracing::{debug, info, warn};

use crate::game::{ControlMode, GameSummary};
use crate::infra::{Action, GameObserver};
use crate::planners::adversarial::Decision;
use crate::state::{GridWorld, WorldView};

/// Logs every event through `tracing`.
pub struct DefaultObserver;

impl GameObserver for DefaultObserver {
    fn on_game_start(&mut self, world: &GridWorld, mode: ControlMode) {
        info!("Game started");
        info!("- mode: {}", mode);
        info!("- map size: {}x{}", world.width(), world.height());
        info!("- targets: {}", world.targets().len());
        info!("- adversaries: {}", world.adversaries().len());
        debug!("\n{}", world.render());
    }

    fn on_plan_ready(&mut self, planner: &str, plan: &[Action]) {
        if plan.is_empty() {
            warn!("{}: no plan available", planner);
        } else {
            info!("{}: planned {} actions", planner, plan.len());
        }
    }

    fn on_decision(&mut self, decision: &Decision) {
        debug!(
            "depth: {}, nodes: {}, fallback nodes: {}, value: {:.2}",
            decision.depth, decision.nodes, decision.fallback_nodes, decision.value
        );
    }

    fn on_action_selected(&mut self, tick: u32, action: Action, world: &GridWorld) {
        debug!("tick: {}, pos: {}, action: {}", tick, world.current_position(), action);
    }

    fn on_state_update(&mut self, tick: u32, world: &GridWorld) {
        info!(
            "tick: {}, pos: {}, score: {}, targets left: {}",
            tick,
            world.current_position(),
            world.score(),
            world.targets().len()
        );
        debug!("\n{}", world.render());
    }

    fn on_oscillation_detected(&mut self, message: &str) {
        warn!("{}", message);
    }

    fn on_game_finished(&mut self, summary: &GameSummary) {
        info!("Game finished with status: {:?}", summary.status);
        info!("Final tick: {}", summary.ticks);
        info!("Final score: {}", summary.score);
    }
}
