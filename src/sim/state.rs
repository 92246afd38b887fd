//! Vehicle state and landing outcome
//!
//! Owned and mutated only by the physics step; everything else reads it.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::consts::*;

/// Classification of the landing attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Outcome {
    #[default]
    Flying,
    /// Terminal: touched down on the pad slowly and upright
    Landed,
    /// Terminal: any other ground contact
    Crashed,
}

impl Outcome {
    pub fn is_terminal(self) -> bool {
        self != Outcome::Flying
    }
}

/// Lander kinematics, fuel and outcome
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VehicleState {
    /// World units; x stays within `[0, world_width]`
    pub position: Vec2,
    pub velocity: Vec2,
    /// Radians, 0 = upright. Never wrapped here
    pub angle: f32,
    fuel: f32,
    /// Whether thrust was applied on the last tick
    pub thrusting: bool,
    outcome: Outcome,
}

impl Default for VehicleState {
    fn default() -> Self {
        Self::spawn(Vec2::new(WORLD_WIDTH / 2.0, WORLD_HEIGHT / 2.0))
    }
}

impl VehicleState {
    /// Upright and at rest at `position` with a full tank
    pub fn spawn(position: Vec2) -> Self {
        Self {
            position,
            velocity: Vec2::ZERO,
            angle: 0.0,
            fuel: INITIAL_FUEL,
            thrusting: false,
            outcome: Outcome::Flying,
        }
    }

    /// Replace the remaining fuel, kept within `[0, INITIAL_FUEL]`
    pub fn with_fuel(mut self, fuel: f32) -> Self {
        self.fuel = fuel.clamp(0.0, INITIAL_FUEL);
        self
    }

    pub fn fuel(&self) -> f32 {
        self.fuel
    }

    pub fn outcome(&self) -> Outcome {
        self.outcome
    }

    /// Burn fuel, floored at zero
    pub(crate) fn burn(&mut self, amount: f32) {
        self.fuel = (self.fuel - amount).max(0.0);
    }

    /// Record the result of a ground contact. Only a flying vehicle changes.
    pub(crate) fn settle(&mut self, outcome: Outcome) {
        if self.outcome == Outcome::Flying {
            self.outcome = outcome;
        }
    }

    /// Reinitialise the whole structure; the only way out of a terminal outcome
    pub fn reset(&mut self, spawn: Vec2) {
        *self = Self::spawn(spawn);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spawn_defaults() {
        let v = VehicleState::default();
        assert_eq!(v.position, Vec2::new(WORLD_WIDTH / 2.0, WORLD_HEIGHT / 2.0));
        assert_eq!(v.velocity, Vec2::ZERO);
        assert_eq!(v.angle, 0.0);
        assert_eq!(v.fuel(), INITIAL_FUEL);
        assert_eq!(v.outcome(), Outcome::Flying);
    }

    #[test]
    fn test_fuel_bounds() {
        assert_eq!(VehicleState::default().with_fuel(-3.0).fuel(), 0.0);
        assert_eq!(VehicleState::default().with_fuel(1e6).fuel(), INITIAL_FUEL);

        let mut v = VehicleState::default().with_fuel(1.0);
        v.burn(5.0);
        assert_eq!(v.fuel(), 0.0);
    }

    #[test]
    fn test_outcome_never_reverses() {
        let mut v = VehicleState::default();
        v.settle(Outcome::Crashed);
        v.settle(Outcome::Landed);
        v.settle(Outcome::Flying);
        assert_eq!(v.outcome(), Outcome::Crashed);
        assert!(v.outcome().is_terminal());
    }

    #[test]
    fn test_reset_reinitialises() {
        let mut v = VehicleState::default().with_fuel(3.0);
        v.velocity = Vec2::new(1.0, -4.0);
        v.angle = 1.2;
        v.settle(Outcome::Crashed);

        let spawn = Vec2::new(5.0, 10.0);
        v.reset(spawn);
        assert_eq!(v, VehicleState::spawn(spawn));
    }
}
