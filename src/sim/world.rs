//! World generation and the per-run simulation session
//!
//! `World` is built once and shared read-only. `Session` is owned by the
//! control thread and is the only thing that mutates the vehicle.

use glam::Vec2;

use super::collision::Touchdown;
use super::starfield::Starfield;
use super::state::VehicleState;
use super::terrain::{Terrain, TerrainError};
use super::tick::{Physics, TickInput};
use crate::settings::{Settings, SettingsError};

/// Immutable scenery: terrain plus background decoration
#[derive(Debug, Clone)]
pub struct World {
    pub seed: u64,
    pub terrain: Terrain,
    pub starfield: Starfield,
    /// Height of the visible sky, used for star placement and spawning
    pub height: f32,
}

impl World {
    pub fn generate(settings: &Settings) -> Result<Self, TerrainError> {
        let terrain = Terrain::generate(&settings.terrain, settings.seed)?;
        let starfield = Starfield::generate(
            settings.seed,
            settings.star_count,
            terrain.world_width(),
            settings.world_height,
        );
        Ok(Self {
            seed: settings.seed,
            terrain,
            starfield,
            height: settings.world_height,
        })
    }

    /// Where the lander starts: centre of the visible world
    pub fn spawn_point(&self) -> Vec2 {
        Vec2::new(self.terrain.world_width() / 2.0, self.height / 2.0)
    }
}

/// One run of the simulation: world, physics and the vehicle
#[derive(Debug, Clone)]
pub struct Session {
    world: World,
    physics: Physics,
    vehicle: VehicleState,
}

impl Session {
    pub fn new(settings: &Settings) -> Result<Self, SettingsError> {
        let world = World::generate(settings)?;
        let physics = Physics::new(settings.physics.clone())?;
        let vehicle = VehicleState::spawn(world.spawn_point());
        log::info!(
            "World generated with seed {} (pad at x={:.2})",
            world.seed,
            world.terrain.pad().center
        );
        Ok(Self {
            world,
            physics,
            vehicle,
        })
    }

    /// Apply one tick of input
    ///
    /// A reset tick only reinitialises the vehicle; physics resumes on the
    /// next tick without reset held.
    pub fn advance(&mut self, input: &TickInput, dt: f32) -> Option<Touchdown> {
        if input.reset {
            self.vehicle.reset(self.world.spawn_point());
            log::info!("Lander reset");
            return None;
        }

        let touchdown = self
            .physics
            .step(&mut self.vehicle, &self.world.terrain, input, dt);

        if let Some(touch) = &touchdown {
            match touch.crash_reason {
                None => log::info!("Successful landing: {touch}, fuel {:.1}", self.vehicle.fuel()),
                Some(_) => log::info!("Crash: {touch}. Press R to retry"),
            }
        }
        touchdown
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn vehicle(&self) -> &VehicleState {
        &self.vehicle
    }
}
