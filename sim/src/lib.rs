//! East vs West - Simulation Core
//!
//! A deterministic, fixed-timestep ECS simulation of a side-on skirmish
//! between two factions racing to push units across the field.
//! Uses `bevy_ecs` for the entity-component-system architecture.
//!
//! The presentation layer drives a [`SimWorld`]: it queues purchases, steps
//! time, and renders from [`Snapshot`]s and drained [`SimEvent`]s.

pub mod api;
pub mod components;
pub mod config;
pub mod constants;
pub mod economy;
pub mod error;
pub mod events;
pub mod spatial;
pub mod systems;
pub mod terrain;
pub mod units;
pub mod weather;
pub mod world;

pub use api::SimWorld;
pub use components::*;
pub use config::SimConfig;
pub use economy::EconomyLedger;
pub use error::{SimError, SimResult};
pub use events::SimEvent;
pub use spatial::{SpatialEntry, SpatialGrid};
pub use systems::*;
pub use terrain::{TerrainField, TerrainGenConfig, TreeState};
pub use units::{Delivery, Payload, UnitKind, UnitProfile};
pub use weather::{Weather, WeatherMode};
pub use world::Snapshot;
