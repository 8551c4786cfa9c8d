mod astar;
mod greedy;
mod problem;
mod target_selector;

pub use astar::{BestFirstPlanner, SearchOutcome, SearchStep};
pub use greedy::{GreedyConfig, GreedyMultiGoalPlanner, GreedyPlan};
pub use problem::{CollectAllProblem, STEP_COST, SearchProblem, SearchState, SingleTargetProblem};
pub use target_selector::TargetSelector;
