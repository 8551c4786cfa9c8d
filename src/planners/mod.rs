pub mod adversarial;
pub mod search;

pub use adversarial::{
    AdversarialDecisionEngine, EngineConfig, EvaluationStrategy, EvaluationWeights, Evaluator,
};
pub use search::{BestFirstPlanner, GreedyMultiGoalPlanner, TargetSelector};
