use std::collections::{HashMap, VecDeque};

use crate::infra::{Action, Position};
use crate::state::WorldView;

/// Breadth-first flood from a single origin over open cells.
///
/// Records, for every reached position, the step that first reached it, so a
/// shortest action path to any reached cell can be read back.
pub struct BfsTree {
    origin: Position,
    came_from: HashMap<Position, (Position, Action)>,
    order: Vec<Position>,
}

impl BfsTree {
    pub fn flood<W: WorldView>(world: &W, origin: Position) -> Self {
        Self::flood_until(world, origin, |_| false)
    }

    /// Flood until `stop` returns true for a dequeued position.
    pub fn flood_until<W, F>(world: &W, origin: Position, mut stop: F) -> Self
    where
        W: WorldView,
        F: FnMut(&Position) -> bool,
    {
        let mut queue = VecDeque::new();
        let mut came_from = HashMap::new();
        let mut order = Vec::new();

        queue.push_back(origin);
        came_from.insert(origin, (origin, Action::Stop));

        while let Some(pos) = queue.pop_front() {
            order.push(pos);
            if stop(&pos) {
                break;
            }
            for action in Action::MOVES {
                let next = pos.step(action);
                if !world.is_open(next) || came_from.contains_key(&next) {
                    continue;
                }
                came_from.insert(next, (pos, action));
                queue.push_back(next);
            }
        }

        Self {
            origin,
            came_from,
            order,
        }
    }

    pub fn origin(&self) -> Position {
        self.origin
    }

    pub fn reaches(&self, pos: &Position) -> bool {
        self.came_from.contains_key(pos)
    }

    /// Positions in the order they were dequeued (non-decreasing distance).
    pub fn visited(&self) -> &[Position] {
        &self.order
    }

    pub fn path_to(&self, goal: Position) -> Option<Vec<Action>> {
        if !self.reaches(&goal) {
            return None;
        }
        let mut actions = Vec::new();
        let mut current = goal;
        while current != self.origin {
            let (prev, action) = self.came_from[&current];
            actions.push(action);
            current = prev;
        }
        actions.reverse();
        Some(actions)
    }
}

/// Shortest action path between two cells, `Some(vec![])` when they coincide.
pub fn shortest_path<W: WorldView>(world: &W, from: Position, to: Position) -> Option<Vec<Action>> {
    BfsTree::flood_until(world, from, |pos| *pos == to).path_to(to)
}

/// Replay `actions` from `start` over the obstacle grid of `world`.
///
/// Returns every visited position (including `start`), or `None` as soon as
/// a step would enter an obstacle.
pub fn apply_plan<W: WorldView>(world: &W, start: Position, actions: &[Action]) -> Option<Vec<Position>> {
    let mut visited = Vec::with_capacity(actions.len() + 1);
    visited.push(start);
    let mut current = start;
    for action in actions {
        let next = current.step(*action);
        if !world.is_open(next) {
            return None;
        }
        visited.push(next);
        current = next;
    }
    Some(visited)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::GridWorld;

    const MAZE: &str = "
%%%%%%%
%P    %
%%%%% %
%.    %
%%%%%%%
";

    #[test]
    fn test_shortest_path_follows_corridor() {
        let world = GridWorld::parse(MAZE).unwrap();
        let start = world.current_position();
        let goal = Position::new(1, 1);

        let path = shortest_path(&world, start, goal).expect("goal is reachable");
        assert_eq!(path.len(), 10);

        let visited = apply_plan(&world, start, &path).expect("path only uses open cells");
        assert_eq!(*visited.last().unwrap(), goal);
        for pair in visited.windows(2) {
            assert!(pair[0].is_adjacent(&pair[1]), "{} -> {} is not a single move", pair[0], pair[1]);
        }
    }

    #[test]
    fn test_shortest_path_to_self_is_empty() {
        let world = GridWorld::parse(MAZE).unwrap();
        let start = world.current_position();
        assert_eq!(shortest_path(&world, start, start), Some(Vec::new()));
    }

    #[test]
    fn test_walled_off_cell_is_unreachable() {
        let world = GridWorld::parse("%%%%%\n%P%.%\n%%%%%").unwrap();
        let start = world.current_position();
        assert_eq!(shortest_path(&world, start, Position::new(3, 1)), None);

        let tree = BfsTree::flood(&world, start);
        assert_eq!(tree.visited(), &[start]);
    }

    #[test]
    fn test_apply_plan_rejects_walls() {
        let world = GridWorld::parse(MAZE).unwrap();
        let start = world.current_position();
        assert!(apply_plan(&world, start, &[Action::North]).is_none());
        assert_eq!(
            apply_plan(&world, start, &[Action::East, Action::Stop]),
            Some(vec![start, Position::new(2, 3), Position::new(2, 3)])
        );
    }
}
