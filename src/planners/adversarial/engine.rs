use std::time::{Duration, Instant};

use tracing::{debug, trace, warn};

use crate::infra::Action;
use crate::planners::adversarial::evaluation::Evaluator;
use crate::planners::adversarial::memory::{EngineMemory, Oscillation, evaluation_key};
use crate::state::{CONTROLLED_AGENT, WorldView};

#[derive(Debug, Clone, Copy)]
pub struct EngineConfig {
    /// Measured from the first decision and never renewed.
    pub time_limit: Duration,
    pub history_capacity: usize,
    /// Candidate moves kept for the controlled agent at each of its plies.
    pub max_branches: usize,
    pub oscillation_penalty: f64,
    /// Depth forced while the agent is oscillating.
    pub oscillation_depth: usize,
    /// Fewer remaining targets than this searches `endgame_plies` per agent.
    pub endgame_targets: usize,
    pub endgame_plies: usize,
    /// Fewer remaining targets than this searches `midgame_plies` per agent.
    pub midgame_targets: usize,
    pub midgame_plies: usize,
    pub opening_plies: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            time_limit: Duration::from_secs(29),
            history_capacity: 10,
            max_branches: 3,
            oscillation_penalty: 20.0,
            oscillation_depth: 2,
            endgame_targets: 3,
            endgame_plies: 3,
            midgame_targets: 6,
            midgame_plies: 2,
            opening_plies: 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Decision {
    pub action: Action,
    pub value: f64,
    pub depth: usize,
    pub oscillation: Option<Oscillation>,
    /// Nodes visited, including those answered by the deadline fallback.
    pub nodes: usize,
    pub fallback_nodes: usize,
}

/// Time-bounded alpha-beta search for one controlled agent against every
/// adversary, choosing one action per decision cycle.
pub struct AdversarialDecisionEngine {
    config: EngineConfig,
    evaluator: Evaluator,
    memory: EngineMemory,
}

impl AdversarialDecisionEngine {
    pub fn new(config: EngineConfig, evaluator: Evaluator) -> Self {
        Self {
            config,
            evaluator,
            memory: EngineMemory::new(config.history_capacity),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn memory(&self) -> &EngineMemory {
        &self.memory
    }

    pub fn decide<W: WorldView>(&mut self, world: &W) -> Action {
        self.deliberate(world).action
    }

    /// Run one decision cycle and report how the action was reached.
    pub fn deliberate<W: WorldView>(&mut self, world: &W) -> Decision {
        let deadline = self.memory.arm_deadline(Instant::now(), self.config.time_limit);

        self.memory.record_position(world.current_position());
        self.memory.begin_cycle();

        let oscillation = self.memory.detect_oscillation();
        if let Some(kind) = oscillation {
            debug!(?kind, position = %world.current_position(), "Oscillation detected");
        }
        let depth = self.search_depth(world, oscillation);

        let mut context = SearchContext {
            config: &self.config,
            evaluator: &self.evaluator,
            memory: &mut self.memory,
            deadline,
            nodes: 0,
            fallback_nodes: 0,
        };
        let (value, action) = minimax(
            &mut context,
            world,
            depth,
            CONTROLLED_AGENT,
            f64::NEG_INFINITY,
            f64::INFINITY,
        );
        let (nodes, fallback_nodes) = (context.nodes, context.fallback_nodes);

        let (cache_entries, cache_hits) = self.memory.cache_stats();
        debug!(
            %action,
            value,
            depth,
            nodes,
            fallback_nodes,
            cache_entries,
            cache_hits,
            "Decision made"
        );

        Decision {
            action,
            value,
            depth,
            oscillation,
            nodes,
            fallback_nodes,
        }
    }

    /// Plies to search this cycle: a fixed shallow depth while oscillating,
    /// otherwise deeper as fewer targets remain.
    pub fn search_depth<W: WorldView>(&self, world: &W, oscillation: Option<Oscillation>) -> usize {
        if oscillation.is_some() {
            return self.config.oscillation_depth;
        }
        let remaining = world.targets().len();
        let plies_per_agent = if remaining < self.config.endgame_targets {
            self.config.endgame_plies
        } else if remaining < self.config.midgame_targets {
            self.config.midgame_plies
        } else {
            self.config.opening_plies
        };
        plies_per_agent * world.agent_count()
    }
}

struct SearchContext<'e> {
    config: &'e EngineConfig,
    evaluator: &'e Evaluator,
    memory: &'e mut EngineMemory,
    deadline: Instant,
    nodes: usize,
    fallback_nodes: usize,
}

impl SearchContext<'_> {
    fn evaluate<W: WorldView>(&mut self, world: &W) -> f64 {
        let key = evaluation_key(world);
        if let Some(value) = self.memory.cached_evaluation(key) {
            return value;
        }
        let value = self.evaluator.evaluate(world);
        self.memory.store_evaluation(key, value);
        value
    }

    fn oscillation_penalty<W: WorldView>(&self, successor: &W) -> f64 {
        self.memory.occurrences(successor.current_position()) as f64 * self.config.oscillation_penalty
    }
}

/// Legal actions with Stop removed whenever something else is possible.
fn candidate_actions<W: WorldView>(world: &W, agent: usize) -> Vec<Action> {
    let mut actions = world.legal_actions(agent);
    if actions.len() > 1 {
        actions.retain(|a| *a != Action::Stop);
    }
    actions
}

fn minimax<W: WorldView>(
    context: &mut SearchContext,
    world: &W,
    depth: usize,
    agent: usize,
    mut alpha: f64,
    mut beta: f64,
) -> (f64, Action) {
    context.nodes += 1;

    if depth == 0 || world.is_win() || world.is_loss() {
        return (context.evaluate(world), Action::Stop);
    }

    if Instant::now() >= context.deadline {
        return immediate_choice(context, world, agent);
    }

    let actions = candidate_actions(world, agent);
    if actions.is_empty() {
        return (context.evaluate(world), Action::Stop);
    }
    let next_agent = (agent + 1) % world.agent_count();

    if agent == CONTROLLED_AGENT {
        // Order by static evaluation and keep only the most promising moves
        let mut candidates: Vec<(Action, W, f64)> = actions
            .into_iter()
            .map(|action| {
                let successor = world.successor(agent, action);
                let score = context.evaluate(&successor);
                (action, successor, score)
            })
            .collect();
        candidates.sort_by(|a, b| b.2.total_cmp(&a.2));
        candidates.truncate(context.config.max_branches.max(1));

        let mut value = f64::NEG_INFINITY;
        let mut best_action = Action::Stop;
        for (action, successor, _) in candidates {
            // The penalty offsets the whole subtree, so the child's window shifts with it
            let penalty = context.oscillation_penalty(&successor);
            let (child_value, _) = minimax(
                context,
                &successor,
                depth - 1,
                next_agent,
                alpha + penalty,
                beta + penalty,
            );
            let child_value = child_value - penalty;

            if child_value > value {
                value = child_value;
                best_action = action;
            }
            alpha = alpha.max(value);
            if beta <= alpha {
                trace!(depth, "Beta cutoff");
                break;
            }
        }
        (value, best_action)
    } else {
        let mut value = f64::INFINITY;
        let mut best_action = Action::Stop;
        for action in actions {
            let successor = world.successor(agent, action);
            let (child_value, _) = minimax(context, &successor, depth - 1, next_agent, alpha, beta);

            if child_value < value {
                value = child_value;
                best_action = action;
            }
            beta = beta.min(value);
            if beta <= alpha {
                trace!(depth, agent, "Alpha cutoff");
                break;
            }
        }
        (value, best_action)
    }
}

/// Deadline fallback: pick the best one-ply successor by static evaluation
/// (highest for the controlled agent, lowest for an adversary).
fn immediate_choice<W: WorldView>(context: &mut SearchContext, world: &W, agent: usize) -> (f64, Action) {
    if context.fallback_nodes == 0 {
        warn!("Search deadline passed, falling back to one-ply evaluation");
    }
    context.fallback_nodes += 1;

    let actions = candidate_actions(world, agent);
    if actions.is_empty() {
        return (context.evaluate(world), Action::Stop);
    }

    let maximizing = agent == CONTROLLED_AGENT;
    let mut best: Option<(f64, Action)> = None;
    for action in actions {
        let value = context.evaluate(&world.successor(agent, action));
        let better = match best {
            None => true,
            Some((best_value, _)) if maximizing => value > best_value,
            Some((best_value, _)) => value < best_value,
        };
        if better {
            best = Some((value, action));
        }
    }
    best.unwrap_or((f64::NEG_INFINITY, Action::Stop))
}
