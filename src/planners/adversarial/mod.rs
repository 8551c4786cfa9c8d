mod engine;
mod evaluation;
mod memory;

pub use engine::{AdversarialDecisionEngine, Decision, EngineConfig};
pub use evaluation::{EvaluationStrategy, EvaluationWeights, Evaluator, UnknownStrategy};
pub use memory::{EngineMemory, Oscillation};
