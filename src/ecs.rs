//! Sandboxed scene graph backing a preview world.
//!
//! Actors and their scene components are ECS entities. Entity ids double as
//! weak handles: lookups on a despawned id return `None`.

mod systems;
mod types;
mod world;

pub use systems::TimeDelta;
pub use types::*;
pub use world::{SandboxWorld, SpawnCollisionHandling, SpawnParameters, WorldInit};
