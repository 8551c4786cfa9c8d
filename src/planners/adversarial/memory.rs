use std::collections::hash_map::DefaultHasher;
use std::collections::{HashMap, VecDeque};
use std::hash::{Hash, Hasher};
use std::time::{Duration, Instant};

use crate::infra::Position;
use crate::state::WorldView;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Oscillation {
    /// A,B,A,B,A,B
    PeriodTwo,
    /// A,B,C,A,B,C,A,B,C
    PeriodThree,
}

/// State the decision engine carries between decision cycles.
///
/// The position history, visit counts and deadline persist for the engine's
/// lifetime; the evaluation cache is cleared at the start of every cycle.
#[derive(Debug)]
pub struct EngineMemory {
    history: VecDeque<Position>,
    capacity: usize,
    visits: HashMap<Position, u32>,
    deadline: Option<Instant>,
    cache: HashMap<u64, f64>,
    cache_hits: usize,
}

impl EngineMemory {
    pub fn new(capacity: usize) -> Self {
        Self {
            history: VecDeque::with_capacity(capacity + 1),
            capacity,
            visits: HashMap::new(),
            deadline: None,
            cache: HashMap::new(),
            cache_hits: 0,
        }
    }

    /// Append to the bounded history (oldest evicted) and bump the visit count.
    pub fn record_position(&mut self, pos: Position) {
        self.history.push_back(pos);
        while self.history.len() > self.capacity {
            self.history.pop_front();
        }
        *self.visits.entry(pos).or_insert(0) += 1;
    }

    pub fn history(&self) -> &VecDeque<Position> {
        &self.history
    }

    /// How often `pos` appears in the bounded history.
    pub fn occurrences(&self, pos: Position) -> usize {
        self.history.iter().filter(|p| **p == pos).count()
    }

    pub fn visits(&self, pos: Position) -> u32 {
        self.visits.get(&pos).copied().unwrap_or(0)
    }

    /// Set the deadline on first use; later calls return the first one.
    pub fn arm_deadline(&mut self, now: Instant, time_limit: Duration) -> Instant {
        *self.deadline.get_or_insert(now + time_limit)
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn begin_cycle(&mut self) {
        self.cache.clear();
        self.cache_hits = 0;
    }

    pub fn cached_evaluation(&mut self, key: u64) -> Option<f64> {
        let value = self.cache.get(&key).copied();
        if value.is_some() {
            self.cache_hits += 1;
        }
        value
    }

    pub fn store_evaluation(&mut self, key: u64, value: f64) {
        self.cache.insert(key, value);
    }

    /// `(entries, hits)` for the current cycle.
    pub fn cache_stats(&self) -> (usize, usize) {
        (self.cache.len(), self.cache_hits)
    }

    pub fn detect_oscillation(&self) -> Option<Oscillation> {
        if self.is_periodic(2) {
            Some(Oscillation::PeriodTwo)
        } else if self.is_periodic(3) {
            Some(Oscillation::PeriodThree)
        } else {
            None
        }
    }

    /// The last `3 * period` entries repeat with the given period.
    fn is_periodic(&self, period: usize) -> bool {
        let span = 3 * period;
        if self.history.len() < span {
            return false;
        }
        let tail: Vec<&Position> = self.history.iter().skip(self.history.len() - span).collect();
        (period..span).all(|i| tail[i] == tail[i - period])
    }
}

/// Hash of everything the evaluator reads from a world.
pub fn evaluation_key<W: WorldView>(world: &W) -> u64 {
    let mut hasher = DefaultHasher::new();
    world.current_position().hash(&mut hasher);
    world.targets().hash(&mut hasher);
    world.bonus_items().hash(&mut hasher);
    world.adversaries().hash(&mut hasher);
    world.score().to_bits().hash(&mut hasher);
    world.is_loss().hash(&mut hasher);
    hasher.finish()
}
