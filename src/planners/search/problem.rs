use crate::infra::{Action, Position, TargetSet};
use crate::state::WorldView;

/// Unit cost of every cardinal move.
pub const STEP_COST: u32 = 1;

/// Node of the (position, remaining targets) state space.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SearchState {
    pub position: Position,
    pub remaining: TargetSet,
}

impl SearchState {
    pub fn new(position: Position, remaining: TargetSet) -> Self {
        Self {
            position,
            remaining,
        }
    }
}

pub trait SearchProblem {
    fn start(&self) -> SearchState;

    fn is_goal(&self, state: &SearchState) -> bool {
        state.remaining.is_empty()
    }

    /// `(next_state, action, cost)` for each open cardinal move.
    fn successors(&self, state: &SearchState) -> Vec<(SearchState, Action, u32)>;

    /// Admissible estimate of the remaining cost from `state`.
    fn heuristic(&self, state: &SearchState) -> u32;
}

/// Successor generation shared by both problem variants: step in every open
/// direction and drop the entered cell from the remaining targets.
fn grid_successors<W: WorldView>(world: &W, state: &SearchState) -> Vec<(SearchState, Action, u32)> {
    Action::MOVES
        .iter()
        .filter_map(|action| {
            let next = state.position.step(*action);
            if !world.is_open(next) {
                return None;
            }
            let mut remaining = state.remaining.clone();
            remaining.remove(&next);
            Some((SearchState::new(next, remaining), *action, STEP_COST))
        })
        .collect()
}

/// Reach one specific target.
pub struct SingleTargetProblem<'w, W: WorldView> {
    world: &'w W,
    start: Position,
    goal: Position,
}

impl<'w, W: WorldView> SingleTargetProblem<'w, W> {
    pub fn new(world: &'w W, start: Position, goal: Position) -> Self {
        Self { world, start, goal }
    }

    pub fn goal(&self) -> Position {
        self.goal
    }
}

impl<W: WorldView> SearchProblem for SingleTargetProblem<'_, W> {
    fn start(&self) -> SearchState {
        let mut remaining = TargetSet::new();
        if self.start != self.goal {
            remaining.insert(self.goal);
        }
        SearchState::new(self.start, remaining)
    }

    fn successors(&self, state: &SearchState) -> Vec<(SearchState, Action, u32)> {
        grid_successors(self.world, state)
    }

    fn heuristic(&self, state: &SearchState) -> u32 {
        if state.remaining.is_empty() {
            return 0;
        }
        state.position.distance(&self.goal) as u32
    }
}

/// Visit every target in the maze.
pub struct CollectAllProblem<'w, W: WorldView> {
    world: &'w W,
    start: Position,
    targets: TargetSet,
}

impl<'w, W: WorldView> CollectAllProblem<'w, W> {
    pub fn new(world: &'w W) -> Self {
        let start = world.current_position();
        let mut targets = world.targets().clone();
        targets.remove(&start);
        Self {
            world,
            start,
            targets,
        }
    }
}

impl<W: WorldView> SearchProblem for CollectAllProblem<'_, W> {
    fn start(&self) -> SearchState {
        SearchState::new(self.start, self.targets.clone())
    }

    fn successors(&self, state: &SearchState) -> Vec<(SearchState, Action, u32)> {
        grid_successors(self.world, state)
    }

    /// Manhattan distance to the farthest remaining target.
    fn heuristic(&self, state: &SearchState) -> u32 {
        state
            .remaining
            .iter()
            .map(|t| state.position.distance(t) as u32)
            .max()
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::GridWorld;

    #[test]
    fn test_successors_skip_walls_and_consume_targets() {
        let world = GridWorld::parse("%%%%%\n%P. %\n%%%%%").unwrap();
        let problem = CollectAllProblem::new(&world);
        let start = problem.start();
        assert_eq!(start.remaining.len(), 1);
        assert!(!problem.is_goal(&start));

        let successors = problem.successors(&start);
        assert_eq!(successors.len(), 1);
        let (next, action, cost) = &successors[0];
        assert_eq!(*action, Action::East);
        assert_eq!(*cost, STEP_COST);
        assert!(next.remaining.is_empty());
        assert!(problem.is_goal(next));
    }

    #[test]
    fn test_states_with_equal_fields_are_interchangeable() {
        let world = GridWorld::parse("%%%%%\n%P .%\n%%%%%").unwrap();
        let problem = SingleTargetProblem::new(&world, Position::new(1, 1), Position::new(3, 1));
        let start = problem.start();
        let there_and_back: Vec<SearchState> = problem
            .successors(&start)
            .into_iter()
            .flat_map(|(s, _, _)| problem.successors(&s))
            .map(|(s, _, _)| s)
            .collect();
        assert!(there_and_back.contains(&start));
    }

    #[test]
    fn test_heuristics_are_manhattan_bounds() {
        let world = GridWorld::parse("%%%%%%\n%.  .%\n% P  %\n%%%%%%").unwrap();
        let single = SingleTargetProblem::new(&world, Position::new(2, 1), Position::new(4, 2));
        assert_eq!(single.heuristic(&single.start()), 3);

        let all = CollectAllProblem::new(&world);
        assert_eq!(all.heuristic(&all.start()), 3);
        assert_eq!(all.heuristic(&SearchState::new(Position::new(1, 1), TargetSet::new())), 0);
    }
}
