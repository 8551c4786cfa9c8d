use std::error::Error;
use std::fmt;
use std::str::FromStr;

use crate::infra::{Position, TargetSet};
use crate::state::WorldView;

/// Weights and thresholds of the feature evaluator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EvaluationWeights {
    pub nearest_target: f64,
    pub average_target: f64,
    pub nearest_bonus: f64,
    pub average_bonus: f64,
    pub vulnerable_chase: f64,
    /// Vulnerable adversaries only attract when strictly closer than this.
    pub chase_range: i32,
    pub danger_radius: i32,
    pub danger_penalty: f64,
    pub caution_radius: i32,
    pub caution_penalty: f64,
    pub distant_penalty: f64,
    pub survival_bonus: f64,
    pub movement_bonus: f64,
}

impl Default for EvaluationWeights {
    fn default() -> Self {
        Self {
            nearest_target: 20.0,
            average_target: 10.0,
            nearest_bonus: 30.0,
            average_bonus: 15.0,
            vulnerable_chase: 100.0,
            chase_range: 3,
            danger_radius: 2,
            danger_penalty: 500.0,
            caution_radius: 3,
            caution_penalty: 50.0,
            distant_penalty: 10.0,
            survival_bonus: 50.0,
            movement_bonus: 1.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EvaluationStrategy {
    /// The world's own score, nothing else.
    Score,
    #[default]
    Feature,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownStrategy(pub String);

impl fmt::Display for UnknownStrategy {
    fn fmt(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        write!(formatter, "Unknown evaluation strategy '{}' (expected 'score' or 'feature')", self.0)
    }
}

impl Error for UnknownStrategy {}

impl FromStr for EvaluationStrategy {
    type Err = UnknownStrategy;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "score" => Ok(EvaluationStrategy::Score),
            "feature" | "better" => Ok(EvaluationStrategy::Feature),
            other => Err(UnknownStrategy(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Evaluator {
    strategy: EvaluationStrategy,
    weights: EvaluationWeights,
}

impl Evaluator {
    pub fn new(strategy: EvaluationStrategy, weights: EvaluationWeights) -> Self {
        Self { strategy, weights }
    }

    pub fn strategy(&self) -> EvaluationStrategy {
        self.strategy
    }

    pub fn evaluate<W: WorldView>(&self, world: &W) -> f64 {
        match self.strategy {
            EvaluationStrategy::Score => world.score(),
            EvaluationStrategy::Feature => self.feature_score(world),
        }
    }

    fn feature_score<W: WorldView>(&self, world: &W) -> f64 {
        let w = &self.weights;
        let pos = world.current_position();
        let mut score = world.score();

        if let Some((nearest, average)) = distance_summary(pos, world.targets()) {
            score += w.nearest_target / (nearest + 1.0);
            score += w.average_target / (average + 1.0);
        }

        if let Some((nearest, average)) = distance_summary(pos, world.bonus_items()) {
            score += w.nearest_bonus / (nearest + 1.0);
            score += w.average_bonus / (average + 1.0);
        }

        let adversaries = world.adversaries();
        if let Some(nearest) = adversaries.iter().map(|a| pos.distance(&a.position)).min() {
            let distance = nearest as f64;
            if adversaries.iter().any(|a| a.is_vulnerable()) {
                if nearest < w.chase_range {
                    score += w.vulnerable_chase / (distance + 1.0);
                }
            } else if nearest < w.danger_radius {
                score -= w.danger_penalty;
            } else if nearest < w.caution_radius {
                score -= w.caution_penalty / (distance + 1.0);
            } else {
                score -= w.distant_penalty / (distance + 1.0);
            }
        }

        if !world.is_loss() {
            score += w.survival_bonus;
        }
        score + w.movement_bonus
    }
}

/// Minimum and mean Manhattan distance from `pos` to `points`.
fn distance_summary(pos: Position, points: &TargetSet) -> Option<(f64, f64)> {
    let nearest = points.iter().map(|p| pos.distance(p)).min()?;
    let total: i32 = points.iter().map(|p| pos.distance(p)).sum();
    Some((nearest as f64, total as f64 / points.len() as f64))
}
