use std::time::{Duration, Instant};

use tracing::{debug, trace};

use crate::infra::{Action, BfsTree, Position, TargetSet};
use crate::state::WorldView;

#[derive(Debug, Clone, Copy)]
pub struct GreedyConfig {
    /// Estimated wall-clock time to execute one move.
    pub step_time: Duration,
    /// Total time the plan (and planning) may take.
    pub budget: Duration,
    pub target_reward: f64,
}

impl Default for GreedyConfig {
    fn default() -> Self {
        Self {
            step_time: Duration::from_millis(100),
            budget: Duration::from_millis(9_900),
            target_reward: 10.0,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct GreedyPlan {
    pub actions: Vec<Action>,
    /// Targets in the order the plan collects them.
    pub collected: Vec<Position>,
    /// Sum over legs of path length times the per-step time.
    pub estimated_time: Duration,
}

/// Myopic multi-target planner: repeatedly walks to the reachable target with
/// the best reward per step until targets, time or reachability run out.
pub struct GreedyMultiGoalPlanner {
    config: GreedyConfig,
}

impl GreedyMultiGoalPlanner {
    pub fn new(config: GreedyConfig) -> Self {
        Self { config }
    }

    pub fn plan<W: WorldView>(&self, world: &W, start: Position, targets: &TargetSet) -> GreedyPlan {
        let started = Instant::now();
        let mut remaining = targets.clone();
        let mut current = start;
        let mut plan = GreedyPlan::default();

        // Standing on a target collects it for free
        if remaining.remove(&current) {
            plan.collected.push(current);
        }

        while !remaining.is_empty() {
            let spent = plan.estimated_time + started.elapsed();
            let Some(available) = self.config.budget.checked_sub(spent) else {
                debug!(collected = plan.collected.len(), "Greedy planner out of budget");
                break;
            };

            let Some((target, path, estimate)) = self.best_leg(world, current, &remaining, available)
            else {
                debug!(
                    remaining = remaining.len(),
                    "No remaining target reachable within budget"
                );
                break;
            };

            trace!(
                target = %target,
                steps = path.len(),
                estimate_ms = estimate.as_millis() as u64,
                "Greedy leg"
            );
            plan.actions.extend(path);
            plan.collected.push(target);
            plan.estimated_time += estimate;
            remaining.remove(&target);
            current = target;
        }

        debug!(
            actions = plan.actions.len(),
            collected = plan.collected.len(),
            estimated_ms = plan.estimated_time.as_millis() as u64,
            "Greedy plan built"
        );
        plan
    }

    /// Reachable target with the highest reward density whose traversal fits
    /// in `available`. Ties keep the first target in set order.
    fn best_leg<W: WorldView>(
        &self,
        world: &W,
        current: Position,
        remaining: &TargetSet,
        available: Duration,
    ) -> Option<(Position, Vec<Action>, Duration)> {
        let tree = BfsTree::flood(world, current);
        let mut best: Option<(Position, Vec<Action>, Duration)> = None;
        let mut best_density = f64::NEG_INFINITY;

        for target in remaining {
            let Some(path) = tree.path_to(*target) else {
                continue;
            };
            if path.is_empty() {
                continue;
            }

            let estimate = self.config.step_time.saturating_mul(path.len() as u32);
            if estimate > available {
                continue;
            }

            let density = self.config.target_reward / path.len() as f64;
            if density > best_density {
                best_density = density;
                best = Some((*target, path, estimate));
            }
        }

        best
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::apply_plan;
    use crate::state::GridWorld;

    const SCATTERED: &str = "
%%%%%%%%%%
%.   %  .%
% %% % %%%
%  P   . %
%%%% %%% %
%.     . %
%%%%%%%%%%
";

    fn plan_for(layout: &str, config: GreedyConfig) -> (GridWorld, GreedyPlan) {
        let world = GridWorld::parse(layout).unwrap();
        let plan =
            GreedyMultiGoalPlanner::new(config).plan(&world, world.current_position(), world.targets());
        (world, plan)
    }

    #[test]
    fn test_collects_everything_with_ample_budget() {
        let (world, plan) = plan_for(SCATTERED, GreedyConfig::default());
        assert_eq!(plan.collected.len(), world.targets().len());

        let visited = apply_plan(&world, world.current_position(), &plan.actions)
            .expect("every step is a legal move");
        for pair in visited.windows(2) {
            assert!(pair[0].is_adjacent(&pair[1]));
        }
        for target in world.targets() {
            assert!(visited.contains(target), "target {} never visited", target);
        }
    }

    #[test]
    fn test_estimated_time_stays_within_budget() {
        let config = GreedyConfig {
            step_time: Duration::from_millis(100),
            budget: Duration::from_millis(1_000),
            target_reward: 10.0,
        };
        let (world, plan) = plan_for(SCATTERED, config);

        assert!(plan.estimated_time <= config.budget);
        assert!(config.step_time * plan.actions.len() as u32 <= config.budget);
        assert!(plan.collected.len() < world.targets().len(), "budget should cut the tour short");
        assert!(!plan.collected.is_empty());
    }

    #[test]
    fn test_picks_nearest_target_first() {
        let (world, plan) = plan_for(SCATTERED, GreedyConfig::default());
        let start = world.current_position();
        let first = plan.collected[0];
        let nearest = world
            .targets()
            .iter()
            .map(|t| crate::infra::shortest_path(&world, start, *t).unwrap().len())
            .min()
            .unwrap();
        let first_len = crate::infra::shortest_path(&world, start, first).unwrap().len();
        assert_eq!(first_len, nearest);
    }

    #[test]
    fn test_walled_off_target_is_skipped() {
        let (_, plan) = plan_for("%%%%%%%%%\n%.%%P  .%\n%%%%%%%%%", GreedyConfig::default());
        assert_eq!(plan.collected, vec![Position::new(7, 1)]);
        assert_eq!(plan.actions, vec![Action::East, Action::East, Action::East]);
    }

    #[test]
    fn test_zero_budget_plans_nothing() {
        let config = GreedyConfig {
            budget: Duration::ZERO,
            ..GreedyConfig::default()
        };
        let (_, plan) = plan_for(SCATTERED, config);
        assert!(plan.actions.is_empty());
        assert_eq!(plan.estimated_time, Duration::ZERO);
    }
}
