pub mod game;
pub mod infra;
pub mod planners;
pub mod state;

// Re-export commonly used types for convenience
pub use game::{ControlMode, Game, GameSettings, GameSummary};
pub use infra::{Action, Position, TargetSet};
pub use state::{GridWorld, WorldView};
