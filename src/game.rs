use std::collections::VecDeque;
use std::error::Error;
use std::fmt;
use std::str::FromStr;
use std::time::Instant;

use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use rand::{Rng, SeedableRng};

use crate::infra::{Action, GameObserver, greedy_step};
use crate::planners::adversarial::{AdversarialDecisionEngine, EngineConfig, Evaluator};
use crate::planners::search::{
    BestFirstPlanner, CollectAllProblem, GreedyConfig, GreedyMultiGoalPlanner, TargetSelector,
};
use crate::state::{CONTROLLED_AGENT, GridWorld, Status, WorldView};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ControlMode {
    /// Alpha-beta decision every tick
    #[default]
    React,
    /// A* towards the target chosen by the target selector
    PlanAStar,
    /// Time-boxed greedy multi-target plan
    PlanGreedy,
    /// A* over the collect-every-target problem
    PlanCollectAll,
}

impl ControlMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ControlMode::React => "react",
            ControlMode::PlanAStar => "plan-astar",
            ControlMode::PlanGreedy => "plan-greedy",
            ControlMode::PlanCollectAll => "plan-all",
        }
    }
}

impl fmt::Display for ControlMode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownMode(pub String);

impl fmt::Display for UnknownMode {
    fn fmt(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        write!(
            formatter,
            "Unknown control mode '{}' (expected react, plan-astar, plan-greedy or plan-all)",
            self.0
        )
    }
}

impl Error for UnknownMode {}

impl FromStr for ControlMode {
    type Err = UnknownMode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "react" => Ok(ControlMode::React),
            "plan-astar" => Ok(ControlMode::PlanAStar),
            "plan-greedy" => Ok(ControlMode::PlanGreedy),
            "plan-all" => Ok(ControlMode::PlanCollectAll),
            other => Err(UnknownMode(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct GameSettings {
    pub mode: ControlMode,
    pub max_ticks: u32,
    pub seed: u64,
    pub engine: EngineConfig,
    pub evaluator: Evaluator,
    pub greedy: GreedyConfig,
    /// Collect-all A* gives up after this many expansions.
    pub collect_all_max_expansions: usize,
    /// Adversaries within this distance mostly step towards the agent.
    pub chase_radius: i32,
    pub chase_probability: f64,
}

impl Default for GameSettings {
    fn default() -> Self {
        Self {
            mode: ControlMode::default(),
            max_ticks: 500,
            seed: 0,
            engine: EngineConfig::default(),
            evaluator: Evaluator::default(),
            greedy: GreedyConfig::default(),
            collect_all_max_expansions: 200_000,
            chase_radius: 5,
            chase_probability: 0.8,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GameSummary {
    pub status: Status,
    pub ticks: u32,
    pub score: f64,
}

/// Runs one episode of a [`GridWorld`], driving the controlled agent with the
/// configured planner and the adversaries with a seeded random policy.
pub struct Game {
    settings: GameSettings,
    observer: Box<dyn GameObserver>,
    rng: StdRng,
    engine: AdversarialDecisionEngine,
    plan: VecDeque<Action>,
    // Target count when planning last came back empty
    stalled_at: Option<usize>,
}

impl Game {
    pub fn new(settings: GameSettings, observer: impl GameObserver + 'static) -> Self {
        Self {
            settings,
            observer: Box::new(observer),
            rng: StdRng::seed_from_u64(settings.seed),
            engine: AdversarialDecisionEngine::new(settings.engine, settings.evaluator),
            plan: VecDeque::new(),
            stalled_at: None,
        }
    }

    pub fn run(&mut self, mut world: GridWorld) -> GameSummary {
        self.observer.on_game_start(&world, self.settings.mode);

        let mut tick = 0;
        while tick < self.settings.max_ticks && !world.is_terminal() {
            let tick_start = Instant::now();

            let action = self.next_action(&world);
            self.observer.on_action_selected(tick, action, &world);
            world = world.successor(CONTROLLED_AGENT, action);

            for agent in 1..world.agent_count() {
                if world.is_terminal() {
                    break;
                }
                let adversary_action = self.adversary_action(&world, agent);
                world = world.successor(agent, adversary_action);
            }

            tick += 1;
            self.observer.on_state_update(tick, &world);

            let tick_duration = tick_start.elapsed();
            if tick_duration.as_millis() > 100 {
                tracing::debug!(
                    "Tick {} took {:.2}ms",
                    tick,
                    tick_duration.as_secs_f64() * 1000.0
                );
            }
        }

        let summary = GameSummary {
            status: world.status(),
            ticks: tick,
            score: world.score(),
        };
        self.observer.on_game_finished(&summary);
        summary
    }

    fn next_action(&mut self, world: &GridWorld) -> Action {
        if self.settings.mode == ControlMode::React {
            let decision = self.engine.deliberate(world);
            self.observer.on_decision(&decision);
            if let Some(kind) = decision.oscillation {
                self.observer.on_oscillation_detected(&format!(
                    "Oscillation {:?} at {}, searching {} plies",
                    kind,
                    world.current_position(),
                    decision.depth
                ));
            }
            return decision.action;
        }

        if self.plan.is_empty() && self.stalled_at != Some(world.targets().len()) {
            self.replan(world);
        }
        self.plan.pop_front().unwrap_or(Action::Stop)
    }

    fn replan(&mut self, world: &GridWorld) {
        let start = world.current_position();
        let actions = match self.settings.mode {
            ControlMode::React => Vec::new(),
            ControlMode::PlanAStar => TargetSelector::plan(world),
            ControlMode::PlanGreedy => {
                GreedyMultiGoalPlanner::new(self.settings.greedy)
                    .plan(world, start, world.targets())
                    .actions
            }
            ControlMode::PlanCollectAll => {
                let problem = CollectAllProblem::new(world);
                let actions = BestFirstPlanner::new(&problem)
                    .with_max_expansions(self.settings.collect_all_max_expansions)
                    .run()
                    .into_actions();
                if actions.is_empty() {
                    TargetSelector::plan(world)
                } else {
                    actions
                }
            }
        };

        self.observer.on_plan_ready(self.settings.mode.as_str(), &actions);
        self.stalled_at = actions.is_empty().then(|| world.targets().len());
        self.plan = actions.into();
    }

    fn adversary_action(&mut self, world: &GridWorld, agent: usize) -> Action {
        let actions = world.legal_actions(agent);
        let adversary = world.adversaries()[agent - 1];
        let target = world.current_position();

        if adversary.position.distance(&target) <= self.settings.chase_radius
            && self.rng.random_bool(self.settings.chase_probability)
            && let Some(action) =
                greedy_step(adversary.position, target, &actions, adversary.is_vulnerable())
        {
            return action;
        }

        actions.choose(&mut self.rng).copied().unwrap_or(Action::Stop)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::planners::adversarial::Decision;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[derive(Default)]
    struct Events {
        started: bool,
        plans: Vec<usize>,
        decisions: usize,
        actions: Vec<Action>,
        updates: u32,
        finished: Option<GameSummary>,
    }

    struct RecordingObserver(Rc<RefCell<Events>>);

    impl GameObserver for RecordingObserver {
        fn on_game_start(&mut self, _world: &GridWorld, _mode: ControlMode) {
            self.0.borrow_mut().started = true;
        }

        fn on_plan_ready(&mut self, _planner: &str, plan: &[Action]) {
            self.0.borrow_mut().plans.push(plan.len());
        }

        fn on_decision(&mut self, _decision: &Decision) {
            self.0.borrow_mut().decisions += 1;
        }

        fn on_action_selected(&mut self, _tick: u32, action: Action, _world: &GridWorld) {
            self.0.borrow_mut().actions.push(action);
        }

        fn on_state_update(&mut self, _tick: u32, _world: &GridWorld) {
            self.0.borrow_mut().updates += 1;
        }

        fn on_oscillation_detected(&mut self, _message: &str) {}

        fn on_game_finished(&mut self, summary: &GameSummary) {
            self.0.borrow_mut().finished = Some(*summary);
        }
    }

    const QUIET: &str = "
%%%%%%%%
%P .   %
% %% % %
%.   . %
%%%%%%%%
";

    fn play(layout: &str, mode: ControlMode) -> (GameSummary, Rc<RefCell<Events>>) {
        let events = Rc::new(RefCell::new(Events::default()));
        let settings = GameSettings {
            mode,
            max_ticks: 100,
            ..GameSettings::default()
        };
        let mut game = Game::new(settings, RecordingObserver(Rc::clone(&events)));
        let summary = game.run(GridWorld::parse(layout).unwrap());
        (summary, events)
    }

    #[test]
    fn test_every_mode_clears_a_quiet_maze() {
        for mode in [
            ControlMode::React,
            ControlMode::PlanAStar,
            ControlMode::PlanGreedy,
            ControlMode::PlanCollectAll,
        ] {
            let (summary, events) = play(QUIET, mode);
            assert_eq!(summary.status, Status::Won, "{} did not win", mode);
            let events = events.borrow();
            assert!(events.started);
            assert_eq!(events.updates, summary.ticks);
            assert_eq!(events.actions.len() as u32, summary.ticks);
            assert_eq!(events.finished, Some(summary));
        }
    }

    #[test]
    fn test_collect_all_plans_once() {
        let (summary, events) = play(QUIET, ControlMode::PlanCollectAll);
        let events = events.borrow();
        assert_eq!(events.plans.len(), 1);
        assert_eq!(events.plans[0] as u32, summary.ticks);
    }

    #[test]
    fn test_react_mode_decides_every_tick() {
        let (summary, events) = play(QUIET, ControlMode::React);
        let events = events.borrow();
        assert_eq!(events.decisions as u32, summary.ticks);
        assert!(!events.actions.contains(&Action::Stop));
    }

    #[test]
    fn test_unreachable_targets_do_not_replan_every_tick() {
        let (summary, events) = play("%%%%%%\n%P%. %\n%%%%%%", ControlMode::PlanAStar);
        assert_eq!(summary.status, Status::Running);
        assert_eq!(summary.ticks, 100);
        let events = events.borrow();
        assert_eq!(events.plans, vec![0]);
        assert!(events.actions.iter().all(|a| *a == Action::Stop));
    }

    #[test]
    fn test_game_ends_on_loss() {
        let settings = GameSettings {
            mode: ControlMode::PlanAStar,
            max_ticks: 50,
            chase_probability: 1.0,
            ..GameSettings::default()
        };
        let mut game = Game::new(settings, crate::infra::DefaultObserver);
        let summary = game.run(GridWorld::parse("%%%%%%%\n%P  G.%\n%%%%%%%").unwrap());
        assert_eq!(summary.status, Status::Lost);
        assert!(summary.ticks < 50);
    }

    #[test]
    fn test_mode_parsing() {
        assert_eq!("plan-greedy".parse::<ControlMode>(), Ok(ControlMode::PlanGreedy));
        assert_eq!("REACT".parse::<ControlMode>(), Ok(ControlMode::React));
        assert!("teleport".parse::<ControlMode>().is_err());
    }
}
