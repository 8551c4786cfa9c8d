use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap, HashSet};

use tracing::{debug, trace};

use crate::infra::Action;
use crate::planners::search::problem::{SearchProblem, SearchState};

#[derive(Clone, Eq, PartialEq)]
struct FrontierEntry {
    state: SearchState,
    g_score: u32,
    f_score: u32,
    // Insertion order, so equal priorities pop first-in first-out
    seq: u64,
}

impl Ord for FrontierEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .f_score
            .cmp(&self.f_score)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

impl PartialOrd for FrontierEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchStep {
    Continue,
    /// Search finished; `None` means no path exists (or the cap was hit).
    Done(Option<Vec<Action>>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchOutcome {
    pub plan: Option<Vec<Action>>,
    pub expansions: usize,
}

impl SearchOutcome {
    /// The plan, or an empty sequence when no path was found.
    pub fn into_actions(self) -> Vec<Action> {
        self.plan.unwrap_or_default()
    }
}

/// A* over any [`SearchProblem`].
///
/// Decrease-key is done lazily: an improved cost pushes a fresh entry and the
/// stale one is skipped when it surfaces.
pub struct BestFirstPlanner<'p, P: SearchProblem> {
    problem: &'p P,
    frontier: BinaryHeap<FrontierEntry>,
    explored: HashSet<SearchState>,
    g_score: HashMap<SearchState, u32>,
    came_from: HashMap<SearchState, (SearchState, Action)>,
    expansions: usize,
    max_expansions: Option<usize>,
    next_seq: u64,
}

impl<'p, P: SearchProblem> BestFirstPlanner<'p, P> {
    pub fn new(problem: &'p P) -> Self {
        let mut planner = Self {
            problem,
            frontier: BinaryHeap::new(),
            explored: HashSet::new(),
            g_score: HashMap::new(),
            came_from: HashMap::new(),
            expansions: 0,
            max_expansions: None,
            next_seq: 0,
        };

        let start = problem.start();
        let h_score = problem.heuristic(&start);
        planner.g_score.insert(start.clone(), 0);
        planner.push(start, 0, h_score);
        planner
    }

    /// Give up without a plan after `max` expansions.
    pub fn with_max_expansions(mut self, max: usize) -> Self {
        self.max_expansions = Some(max);
        self
    }

    pub fn expansions(&self) -> usize {
        self.expansions
    }

    pub fn explored(&self) -> &HashSet<SearchState> {
        &self.explored
    }

    pub fn run(mut self) -> SearchOutcome {
        loop {
            if let SearchStep::Done(plan) = self.step() {
                debug!(
                    expansions = self.expansions,
                    plan_length = plan.as_ref().map(|p| p.len()),
                    "A* finished"
                );
                return SearchOutcome {
                    plan,
                    expansions: self.expansions,
                };
            }
        }
    }

    /// Pop and expand a single frontier entry.
    pub fn step(&mut self) -> SearchStep {
        let Some(FrontierEntry { state, g_score, .. }) = self.frontier.pop() else {
            return SearchStep::Done(None);
        };

        if self.explored.contains(&state)
            || g_score > *self.g_score.get(&state).unwrap_or(&u32::MAX)
        {
            return SearchStep::Continue;
        }

        if self.problem.is_goal(&state) {
            return SearchStep::Done(Some(self.reconstruct_path(state)));
        }

        if self.max_expansions.is_some_and(|max| self.expansions >= max) {
            debug!(expansions = self.expansions, "A* expansion cap reached");
            return SearchStep::Done(None);
        }

        trace!(position = %state.position, g_score, "Expanding");
        self.expansions += 1;

        for (successor, action, step_cost) in self.problem.successors(&state) {
            if self.explored.contains(&successor) {
                continue;
            }

            let tentative_g = g_score + step_cost;
            if tentative_g < *self.g_score.get(&successor).unwrap_or(&u32::MAX) {
                self.g_score.insert(successor.clone(), tentative_g);
                self.came_from
                    .insert(successor.clone(), (state.clone(), action));
                let h_score = self.problem.heuristic(&successor);
                self.push(successor, tentative_g, tentative_g + h_score);
            }
        }

        self.explored.insert(state);
        SearchStep::Continue
    }

    fn push(&mut self, state: SearchState, g_score: u32, f_score: u32) {
        self.frontier.push(FrontierEntry {
            state,
            g_score,
            f_score,
            seq: self.next_seq,
        });
        self.next_seq += 1;
    }

    fn reconstruct_path(&self, goal: SearchState) -> Vec<Action> {
        let mut actions = Vec::new();
        let mut current = &goal;
        while let Some((prev, action)) = self.came_from.get(current) {
            actions.push(*action);
            current = prev;
        }
        actions.reverse();
        actions
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::{Position, apply_plan, shortest_path};
    use crate::planners::search::problem::{CollectAllProblem, SingleTargetProblem};
    use crate::state::{GridWorld, WorldView};

    const OPEN: &str = "
%%%%%%%
%     %
%P  . %
%     %
%%%%%%%
";

    const MAZE: &str = "
%%%%%%%%%
%P  %   %
% %%% % %
%   %.% %
%%% % % %
%       %
%%%%%%%%%
";

    #[test]
    fn test_open_grid_three_steps() {
        let world = GridWorld::parse(OPEN).unwrap();
        let goal = Position::new(4, 2);
        let problem = SingleTargetProblem::new(&world, world.current_position(), goal);
        let plan = BestFirstPlanner::new(&problem).run().into_actions();
        assert_eq!(plan, vec![Action::East, Action::East, Action::East]);
    }

    #[test]
    fn test_plan_replays_to_goal() {
        let world = GridWorld::parse(MAZE).unwrap();
        let start = world.current_position();
        let goal = *world.targets().iter().next().unwrap();
        let problem = SingleTargetProblem::new(&world, start, goal);

        let plan = BestFirstPlanner::new(&problem).run().into_actions();
        let visited = apply_plan(&world, start, &plan).expect("plan only uses legal moves");
        assert_eq!(visited.len(), plan.len() + 1);
        assert_eq!(*visited.last().unwrap(), goal);

        let mut state = problem.start();
        for action in &plan {
            state = problem
                .successors(&state)
                .into_iter()
                .find(|(_, a, _)| a == action)
                .map(|(s, _, _)| s)
                .expect("every action is a legal successor");
        }
        assert!(problem.is_goal(&state));
    }

    #[test]
    fn test_path_cost_is_optimal() {
        let world = GridWorld::parse(MAZE).unwrap();
        let start = world.current_position();
        let goal = *world.targets().iter().next().unwrap();
        let problem = SingleTargetProblem::new(&world, start, goal);

        let plan = BestFirstPlanner::new(&problem).run().into_actions();
        let bfs = shortest_path(&world, start, goal).unwrap();
        assert_eq!(plan.len(), bfs.len());
    }

    #[test]
    fn test_never_reexpands_explored_states() {
        let world = GridWorld::parse(MAZE).unwrap();
        let problem = CollectAllProblem::new(&world);
        let mut planner = BestFirstPlanner::new(&problem);

        loop {
            let step = planner.step();
            assert_eq!(
                planner.expansions(),
                planner.explored().len(),
                "an explored state was expanded twice"
            );
            if let SearchStep::Done(plan) = step {
                assert!(plan.is_some());
                break;
            }
        }
    }

    #[test]
    fn test_collect_all_is_optimal_on_corridor() {
        // Targets on both sides: going left first is cheaper (1 + 4) than right first (3 + 4)
        let world = GridWorld::parse("%%%%%%%%\n%.P  . %\n%%%%%%%%").unwrap();
        let problem = CollectAllProblem::new(&world);
        let plan = BestFirstPlanner::new(&problem).run().into_actions();
        assert_eq!(plan.len(), 5);
        assert_eq!(plan[0], Action::West);
    }

    #[test]
    fn test_unreachable_goal_yields_empty_plan() {
        let world = GridWorld::parse("%%%%%%\n%P%  %\n%%%.%%\n%%%%%%").unwrap();
        let goal = *world.targets().iter().next().unwrap();
        let problem = SingleTargetProblem::new(&world, world.current_position(), goal);
        let outcome = BestFirstPlanner::new(&problem).run();
        assert_eq!(outcome.plan, None);
        assert!(outcome.into_actions().is_empty());
    }

    #[test]
    fn test_expansion_cap_gives_up() {
        let world = GridWorld::parse(MAZE).unwrap();
        let problem = CollectAllProblem::new(&world);
        let outcome = BestFirstPlanner::new(&problem).with_max_expansions(2).run();
        assert_eq!(outcome.plan, None);
        assert_eq!(outcome.expansions, 2);
    }

    #[test]
    fn test_start_on_goal_is_empty_success() {
        let world = GridWorld::parse(OPEN).unwrap();
        let start = world.current_position();
        let problem = SingleTargetProblem::new(&world, start, start);
        let outcome = BestFirstPlanner::new(&problem).run();
        assert_eq!(outcome.plan, Some(Vec::new()));
        assert_eq!(outcome.expansions, 0);
    }
}
