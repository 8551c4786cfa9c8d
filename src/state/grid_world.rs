use std::error::Error;
use std::fmt;
use std::rc::Rc;

use crate::infra::{Action, Position, TargetSet};
use crate::state::world_view::{AdversaryState, CONTROLLED_AGENT, WorldView};

const STEP_PENALTY: f64 = 1.0;
const TARGET_REWARD: f64 = 10.0;
const WIN_REWARD: f64 = 500.0;
const LOSS_PENALTY: f64 = 500.0;
const CAPTURE_REWARD: f64 = 200.0;
const VULNERABLE_MOVES: u32 = 40;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LayoutError {
    Empty,
    RaggedRow { row: usize, expected: usize, found: usize },
    UnknownTile { row: usize, column: usize, tile: char },
    MissingAgent,
    DuplicateAgent { row: usize, column: usize },
}

impl fmt::Display for LayoutError {
    fn fmt(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        match self {
            LayoutError::Empty => write!(formatter, "Layout is empty"),
            LayoutError::RaggedRow {
                row,
                expected,
                found,
            } => write!(
                formatter,
                "Row {} has width {} (expected {})",
                row, found, expected
            ),
            LayoutError::UnknownTile { row, column, tile } => {
                write!(formatter, "Unknown tile {:?} at row {}, column {}", tile, row, column)
            }
            LayoutError::MissingAgent => write!(formatter, "Layout has no agent ('P')"),
            LayoutError::DuplicateAgent { row, column } => {
                write!(formatter, "Second agent at row {}, column {}", row, column)
            }
        }
    }
}

impl Error for LayoutError {}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Running,
    Won,
    Lost,
}

/// Static obstacle grid shared by every successor of a world.
#[derive(Debug)]
struct Walls {
    width: i32,
    height: i32,
    cells: Vec<bool>,
}

impl Walls {
    fn is_wall(&self, x: i32, y: i32) -> bool {
        if x < 0 || x >= self.width || y < 0 || y >= self.height {
            return true;
        }
        self.cells[(y * self.width + x) as usize]
    }
}

/// Reference maze simulation implementing [`WorldView`].
#[derive(Debug, Clone)]
pub struct GridWorld {
    walls: Rc<Walls>,
    spawns: Rc<Vec<Position>>,
    agent: Position,
    targets: TargetSet,
    bonus_items: TargetSet,
    adversaries: Vec<AdversaryState>,
    score: f64,
    status: Status,
}

impl GridWorld {
    /// Parse an ASCII layout. The first line is the top row (largest y).
    pub fn parse(text: &str) -> Result<Self, LayoutError> {
        let rows: Vec<&str> = text
            .lines()
            .map(|line| line.trim_end_matches('\r'))
            .skip_while(|line| line.trim().is_empty())
            .collect();
        let rows: Vec<&str> = match rows.iter().rposition(|line| !line.trim().is_empty()) {
            Some(last) => rows[..=last].to_vec(),
            None => return Err(LayoutError::Empty),
        };

        let width = rows[0].chars().count();
        let height = rows.len();
        let mut cells = vec![false; width * height];
        let mut agent = None;
        let mut targets = TargetSet::new();
        let mut bonus_items = TargetSet::new();
        let mut spawns = Vec::new();

        for (row, line) in rows.iter().enumerate() {
            let found = line.chars().count();
            if found != width {
                return Err(LayoutError::RaggedRow {
                    row,
                    expected: width,
                    found,
                });
            }
            let y = (height - 1 - row) as i32;
            for (column, tile) in line.chars().enumerate() {
                let pos = Position::new(column as i32, y);
                match tile {
                    '%' => cells[y as usize * width + column] = true,
                    '.' => {
                        targets.insert(pos);
                    }
                    'o' => {
                        bonus_items.insert(pos);
                    }
                    'G' => spawns.push(pos),
                    'P' => {
                        if agent.is_some() {
                            return Err(LayoutError::DuplicateAgent { row, column });
                        }
                        agent = Some(pos);
                    }
                    ' ' => {}
                    _ => return Err(LayoutError::UnknownTile { row, column, tile }),
                }
            }
        }

        let agent = agent.ok_or(LayoutError::MissingAgent)?;
        let adversaries = spawns.iter().map(|p| AdversaryState::new(*p)).collect();

        Ok(Self {
            walls: Rc::new(Walls {
                width: width as i32,
                height: height as i32,
                cells,
            }),
            spawns: Rc::new(spawns),
            agent,
            targets,
            bonus_items,
            adversaries,
            score: 0.0,
            status: Status::Running,
        })
    }

    pub fn width(&self) -> i32 {
        self.walls.width
    }

    pub fn height(&self) -> i32 {
        self.walls.height
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn is_terminal(&self) -> bool {
        self.status != Status::Running
    }

    /// Plain ASCII snapshot, top row first.
    pub fn render(&self) -> String {
        let mut output = String::new();
        for y in (0..self.walls.height).rev() {
            for x in 0..self.walls.width {
                let pos = Position::new(x, y);
                let tile = if pos == self.agent {
                    'P'
                } else if let Some(adversary) =
                    self.adversaries.iter().find(|a| a.position == pos)
                {
                    if adversary.is_vulnerable() { 'g' } else { 'G' }
                } else if self.walls.is_wall(x, y) {
                    '%'
                } else if self.targets.contains(&pos) {
                    '.'
                } else if self.bonus_items.contains(&pos) {
                    'o'
                } else {
                    ' '
                };
                output.push(tile);
            }
            output.push('\n');
        }
        output
    }

    fn move_agent(&mut self, action: Action) {
        let next = self.agent.step(action);
        if self.walls.is_wall(next.x, next.y) {
            return;
        }
        self.agent = next;
        self.score -= STEP_PENALTY;

        if self.targets.remove(&next) {
            self.score += TARGET_REWARD;
            if self.targets.is_empty() {
                self.score += WIN_REWARD;
                self.status = Status::Won;
                return;
            }
        }

        if self.bonus_items.remove(&next) {
            for adversary in self.adversaries.iter_mut() {
                adversary.vulnerable_timer = VULNERABLE_MOVES;
            }
        }

        for index in 0..self.adversaries.len() {
            self.resolve_contact(index);
        }
    }

    fn move_adversary(&mut self, index: usize, action: Action) {
        let adversary = &mut self.adversaries[index];
        let next = adversary.position.step(action);
        if !self.walls.is_wall(next.x, next.y) {
            adversary.position = next;
        }
        adversary.vulnerable_timer = adversary.vulnerable_timer.saturating_sub(1);
        self.resolve_contact(index);
    }

    fn resolve_contact(&mut self, index: usize) {
        if self.status != Status::Running || self.adversaries[index].position != self.agent {
            return;
        }
        if self.adversaries[index].is_vulnerable() {
            self.score += CAPTURE_REWARD;
            self.adversaries[index] = AdversaryState::new(self.spawns[index]);
        } else {
            self.score -= LOSS_PENALTY;
            self.status = Status::Lost;
        }
    }
}

impl WorldView for GridWorld {
    fn current_position(&self) -> Position {
        self.agent
    }

    fn targets(&self) -> &TargetSet {
        &self.targets
    }

    fn bonus_items(&self) -> &TargetSet {
        &self.bonus_items
    }

    fn adversaries(&self) -> &[AdversaryState] {
        &self.adversaries
    }

    fn legal_actions(&self, agent: usize) -> Vec<Action> {
        if self.is_terminal() || agent >= self.agent_count() {
            return Vec::new();
        }

        let from = if agent == CONTROLLED_AGENT {
            self.agent
        } else {
            self.adversaries[agent - 1].position
        };
        let mut actions: Vec<Action> = Action::MOVES
            .iter()
            .copied()
            .filter(|a| self.is_open(from.step(*a)))
            .collect();

        // Adversaries only stand still when boxed in
        if agent == CONTROLLED_AGENT || actions.is_empty() {
            actions.push(Action::Stop);
        }
        actions
    }

    fn successor(&self, agent: usize, action: Action) -> Self {
        let mut next = self.clone();
        if self.is_terminal() || agent >= self.agent_count() {
            return next;
        }
        if agent == CONTROLLED_AGENT {
            next.move_agent(action);
        } else {
            next.move_adversary(agent - 1, action);
        }
        next
    }

    fn is_win(&self) -> bool {
        self.status == Status::Won
    }

    fn is_loss(&self) -> bool {
        self.status == Status::Lost
    }

    fn score(&self) -> f64 {
        self.score
    }

    fn agent_count(&self) -> usize {
        1 + self.adversaries.len()
    }

    fn has_obstacle(&self, x: i32, y: i32) -> bool {
        self.walls.is_wall(x, y)
    }
}
