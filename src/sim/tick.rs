//! Physics step
//!
//! Advances the vehicle by one tick. The order of operations is fixed:
//! rotation, gravity, thrust, integration, horizontal wrap, ground contact.
//! Reordering any of them changes trajectories, so it must not drift.

use glam::Vec2;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::collision::{LandingLimits, Touchdown, classify_touchdown, ground_contact};
use super::state::VehicleState;
use super::terrain::Terrain;
use crate::consts::*;
use crate::wrap_x;

/// Pilot intents for a single tick (level-triggered)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickInput {
    pub thrust: bool,
    pub rotate_left: bool,
    pub rotate_right: bool,
    /// Reinitialise the vehicle before stepping
    pub reset: bool,
}

impl TickInput {
    /// +1 left (counter-clockwise), -1 right, 0 when neither or both are held
    fn rotate_sign(&self) -> f32 {
        (self.rotate_left as i8 - self.rotate_right as i8) as f32
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum PhysicsError {
    #[error("max dt must be positive and finite, got {0}")]
    InvalidMaxDt(f32),
    #[error("{name} must be non-negative and finite, got {value}")]
    InvalidConstant { name: &'static str, value: f32 },
    #[error("{name} must be positive and finite, got {value}")]
    InvalidLimit { name: &'static str, value: f32 },
}

/// Physical constants and landing limits
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsParams {
    pub gravity: f32,
    pub thrust_power: f32,
    pub rotation_speed: f32,
    pub burn_rate: f32,
    pub safe_speed: f32,
    pub safe_angle: f32,
    pub half_height: f32,
    pub max_dt: f32,
}

impl Default for PhysicsParams {
    fn default() -> Self {
        Self {
            gravity: LUNAR_GRAVITY,
            thrust_power: THRUST_POWER,
            rotation_speed: ROTATION_SPEED,
            burn_rate: FUEL_BURN_RATE,
            safe_speed: SAFE_LANDING_VEL,
            safe_angle: SAFE_LANDING_ANGLE,
            half_height: LANDER_HALF_HEIGHT,
            max_dt: MAX_DT,
        }
    }
}

impl PhysicsParams {
    pub fn validate(&self) -> Result<(), PhysicsError> {
        if !self.max_dt.is_finite() || self.max_dt <= 0.0 {
            return Err(PhysicsError::InvalidMaxDt(self.max_dt));
        }
        for (name, value) in [
            ("gravity", self.gravity),
            ("thrust_power", self.thrust_power),
            ("rotation_speed", self.rotation_speed),
            ("burn_rate", self.burn_rate),
            ("half_height", self.half_height),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(PhysicsError::InvalidConstant { name, value });
            }
        }
        for (name, value) in [("safe_speed", self.safe_speed), ("safe_angle", self.safe_angle)] {
            if !value.is_finite() || value <= 0.0 {
                return Err(PhysicsError::InvalidLimit { name, value });
            }
        }
        Ok(())
    }

    fn limits(&self) -> LandingLimits {
        LandingLimits {
            max_speed: self.safe_speed,
            max_angle: self.safe_angle,
        }
    }
}

/// Validated physics core
#[derive(Debug, Clone)]
pub struct Physics {
    params: PhysicsParams,
}

impl Physics {
    pub fn new(params: PhysicsParams) -> Result<Self, PhysicsError> {
        params.validate()?;
        Ok(Self { params })
    }

    /// Clamp a frame delta into `[0, max_dt]`; non-finite deltas count as zero
    pub fn clamp_dt(&self, dt: f32) -> f32 {
        if dt.is_finite() {
            dt.clamp(0.0, self.params.max_dt)
        } else {
            0.0
        }
    }

    /// Advance `vehicle` by one tick
    ///
    /// Returns the touchdown report on the tick the lander meets the ground.
    /// Once the outcome is terminal this is a no-op.
    pub fn step(
        &self,
        vehicle: &mut VehicleState,
        terrain: &Terrain,
        input: &TickInput,
        dt: f32,
    ) -> Option<Touchdown> {
        if vehicle.outcome().is_terminal() {
            return None;
        }
        let p = &self.params;
        let dt = self.clamp_dt(dt);

        vehicle.angle += input.rotate_sign() * p.rotation_speed * dt;

        vehicle.velocity.y -= p.gravity * dt;

        vehicle.thrusting = input.thrust && vehicle.fuel() > 0.0;
        if vehicle.thrusting {
            // Thrust points along the lander's up axis
            let accel = Vec2::new(-vehicle.angle.sin(), vehicle.angle.cos()) * p.thrust_power;
            vehicle.velocity += accel * dt;
            vehicle.burn(p.burn_rate * dt);
        }

        vehicle.position += vehicle.velocity * dt;
        vehicle.position.x = wrap_x(vehicle.position.x, terrain.world_width());

        let ground = ground_contact(vehicle.position, p.half_height, terrain)?;
        vehicle.position.y = ground + p.half_height;

        let touchdown = classify_touchdown(
            vehicle.velocity,
            vehicle.angle,
            vehicle.position.x,
            terrain,
            &p.limits(),
        );
        vehicle.velocity = Vec2::ZERO;
        vehicle.thrusting = false;
        vehicle.settle(touchdown.outcome);

        Some(touchdown)
    }
}
