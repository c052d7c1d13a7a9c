//! ECS systems for the East vs West simulation.
//!
//! Systems contain the game logic that operates on components.
//!
//! ## Tick order
//!
//! One tick runs these groups in a fixed order. Systems inside a group are
//! chained, so commands (spawns, despawns) issued by one system are visible to
//! the next.
//!
//! **Group 1 (Intake)** - materialise purchases, then snapshot positions:
//! - `spawn_intake_system` - drains the spawn queue and pays for it
//! - `economy_income_system` - passive income
//! - `weather_system` - clear/rain dwell countdown
//! - `spatial_grid_update_system` - rebuilds the spatial grid
//!
//! **Group 2 (Ordnance)** - everything already in flight:
//! - `projectile_system` - round movement and hit resolution
//! - `guided_missile_system` - descent and detonation
//! - `flyover_system` - aircraft and payload release
//!
//! **Group 3 (Terrain)**:
//! - `terrain_state_system` - tree fires burn down, vehicles crush trees
//! - `terrain_awareness_system` - on-hill and in-water flags
//!
//! **Group 4 (Units)**:
//! - `hazard_system` - mines and napalm
//! - `movement_system` - layered steering
//! - `targeting_system` - target search, firing, cooldowns
//! - `arrival_system` - scoring at the enemy edge
//!
//! **Group 5 (Cleanup)**:
//! - `particle_system` - cosmetic decay and the nuke flash
//! - `death_sweep_system` - removes the dead, once
//! - `victory_system` - win check

pub mod clock;
pub mod combat;
pub mod effects;
pub mod hazards;
pub mod intake;
pub mod lifecycle;
pub mod movement;
pub mod ordnance;
pub mod serialization;
pub mod terrain_state;

pub use clock::*;
pub use combat::*;
pub use effects::*;
pub use hazards::*;
pub use intake::*;
pub use lifecycle::*;
pub use movement::*;
pub use ordnance::*;
pub use serialization::*;
pub use terrain_state::*;
