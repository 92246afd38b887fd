//! Deterministic simulation module
//!
//! All flight logic lives here. This module must stay pure:
//! - Seeded RNG only
//! - Fixed operation order per tick
//! - No rendering or platform dependencies

pub mod collision;
pub mod starfield;
pub mod state;
pub mod terrain;
pub mod tick;
pub mod world;

pub use collision::{CrashReason, LandingLimits, Touchdown, classify_touchdown, ground_contact};
pub use starfield::{Star, Starfield};
pub use state::{Outcome, VehicleState};
pub use terrain::{LandingPad, Terrain, TerrainError, TerrainParams};
pub use tick::{Physics, PhysicsError, PhysicsParams, TickInput};
pub use world::{Session, World};
