mod grid_world;
mod world_view;

pub use grid_world::{GridWorld, LayoutError, Status};
pub use world_view::{AdversaryState, CONTROLLED_AGENT, WorldView};
