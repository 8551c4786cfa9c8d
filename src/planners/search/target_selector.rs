use tracing::debug;

use crate::infra::{Action, BfsTree, Position, TargetSet};
use crate::planners::search::astar::BestFirstPlanner;
use crate::planners::search::problem::SingleTargetProblem;
use crate::state::WorldView;

/// Picks the single most convenient reachable target.
///
/// Reachable targets are ranked by Manhattan distance from the start, then by
/// how many of their neighbours are obstacles, so open areas win ties.
pub struct TargetSelector;

impl TargetSelector {
    pub fn select<W: WorldView>(world: &W, start: Position, targets: &TargetSet) -> Option<Position> {
        let reachable = BfsTree::flood(world, start);

        let best = reachable
            .visited()
            .iter()
            .filter(|pos| targets.contains(pos))
            .min_by_key(|pos| (pos.distance(&start), world.obstacle_neighbors(**pos)))
            .copied();

        debug!(
            start = %start,
            targets = targets.len(),
            selected = ?best,
            "Target selection"
        );
        best
    }

    /// Select a target and plan to it with A*. Empty when nothing is reachable.
    pub fn plan<W: WorldView>(world: &W) -> Vec<Action> {
        let start = world.current_position();
        let Some(goal) = Self::select(world, start, world.targets()) else {
            return Vec::new();
        };
        let problem = SingleTargetProblem::new(world, start, goal);
        BestFirstPlanner::new(&problem).run().into_actions()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::GridWorld;

    #[test]
    fn test_prefers_less_obstructed_target_on_tie() {
        // Both targets are 2 away; the northern one sits in a dead-end pocket
        let world = GridWorld::parse(
            "
%%%%%%%
%%%.%%%
%%% %%%
%%%P  %
%%%   %
%%%.  %
%%%%%%%
",
        )
        .unwrap();
        let start = world.current_position();
        let selected = TargetSelector::select(&world, start, world.targets());
        assert_eq!(selected, Some(Position::new(3, 1)));
    }

    #[test]
    fn test_prefers_closer_target() {
        let world = GridWorld::parse("%%%%%%%%\n%. P   .%\n%%%%%%%%").unwrap();
        let start = world.current_position();
        assert_eq!(
            TargetSelector::select(&world, start, world.targets()),
            Some(Position::new(1, 1))
        );
    }

    #[test]
    fn test_walled_off_target_is_ignored() {
        // Equidistant targets, the western one is sealed in
        let world = GridWorld::parse("%%%%%%%%%\n%.%%P  .%\n%%%%%%%%%").unwrap();
        let start = world.current_position();
        assert_eq!(
            TargetSelector::select(&world, start, world.targets()),
            Some(Position::new(7, 1))
        );

        let plan = TargetSelector::plan(&world);
        assert_eq!(plan, vec![Action::East, Action::East, Action::East]);
    }

    #[test]
    fn test_no_reachable_target_gives_empty_plan() {
        let world = GridWorld::parse("%%%%%%\n%P%. %\n%%%%%%").unwrap();
        assert_eq!(TargetSelector::select(&world, world.current_position(), world.targets()), None);
        assert!(TargetSelector::plan(&world).is_empty());
    }
}
