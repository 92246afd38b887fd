//! Luna Lander - a 2D lunar landing simulation
//!
//! Core modules:
//! - `sim`: Deterministic simulation (terrain, vehicle state, physics, collision)
//! - `renderer`: Draw sequence building and frame presentation over wgpu
//! - `input`: Level-triggered pilot input sampling
//! - `settings`: Data-driven configuration

pub mod input;
pub mod renderer;
pub mod settings;
pub mod sim;

pub use settings::{Settings, SettingsError};

/// Simulation and presentation constants
pub mod consts {
    /// Horizontal extent of the (periodic) world, in world units
    pub const WORLD_WIDTH: f32 = 40.0;
    /// Visible world height at 16:9
    pub const WORLD_HEIGHT: f32 = 22.5;

    /// Terrain defaults
    pub const TERRAIN_SEGMENTS: usize = 200;
    pub const GROUND_HEIGHT: f32 = 2.0;
    pub const TERRAIN_FLOOR: f32 = 0.5;
    /// Distance over which hills ease into the pad height
    pub const PAD_TRANSITION: f32 = 2.0;
    pub const LANDING_PAD_WIDTH: f32 = 3.0;
    /// Pad centre keeps this far from either world edge
    pub const LANDING_PAD_MARGIN: f32 = 8.0;

    /// Lunar gravity (m/s²)
    pub const LUNAR_GRAVITY: f32 = 1.62;
    /// Acceleration while thrusting (m/s²)
    pub const THRUST_POWER: f32 = 4.0;
    /// Rotation rate (rad/s)
    pub const ROTATION_SPEED: f32 = 2.5;
    pub const INITIAL_FUEL: f32 = 100.0;
    /// Fuel units burned per second of thrust
    pub const FUEL_BURN_RATE: f32 = 8.0;
    /// Max speed for a safe landing (m/s)
    pub const SAFE_LANDING_VEL: f32 = 2.0;
    /// Max tilt for a safe landing (~15 degrees)
    pub const SAFE_LANDING_ANGLE: f32 = 0.26;
    /// Collision extent below the lander origin
    pub const LANDER_HALF_HEIGHT: f32 = 0.5;
    /// Largest dt a single tick integrates (guards against hitches)
    pub const MAX_DT: f32 = 0.05;

    /// Frame slots that may be in flight at once
    pub const MAX_FRAMES_IN_FLIGHT: usize = 2;

    pub const WINDOW_WIDTH: u32 = 1280;
    pub const WINDOW_HEIGHT: u32 = 720;

    pub const DEFAULT_SEED: u64 = 42;
    pub const STAR_COUNT: usize = 300;
    /// Stars never spawn below this height
    pub const STAR_MIN_Y: f32 = 5.0;
}

/// Wrap a horizontal coordinate back into `[0, width]` after it leaves either edge
///
/// Coordinates already inside (both edges included) are returned untouched;
/// anything further out re-enters however many widths it overshot.
#[inline]
pub fn wrap_x(x: f32, width: f32) -> f32 {
    if (0.0..=width).contains(&x) {
        return x;
    }
    let wrapped = x.rem_euclid(width);
    // rem_euclid can round up to the width itself for tiny negative inputs
    if wrapped >= width { 0.0 } else { wrapped }
}

/// Shortest angular distance from upright, in `[0, π]`
#[inline]
pub fn angle_from_upright(angle: f32) -> f32 {
    use std::f32::consts::TAU;
    let a = (angle % TAU).abs();
    a.min(TAU - a)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::{FRAC_PI_2, PI, TAU};

    #[test]
    fn test_wrap_x() {
        assert_eq!(wrap_x(-0.5, 40.0), 39.5);
        assert_eq!(wrap_x(40.5, 40.0), 0.5);
        assert_eq!(wrap_x(12.0, 40.0), 12.0);
        // Edges are inside the world
        assert_eq!(wrap_x(0.0, 40.0), 0.0);
        assert_eq!(wrap_x(40.0, 40.0), 40.0);
    }

    #[test]
    fn test_wrap_x_multiple_widths() {
        assert!((wrap_x(1.5, 1.0) - 0.5).abs() < 1e-6);
        assert!((wrap_x(-2.25, 1.0) - 0.75).abs() < 1e-6);
        assert!((wrap_x(130.0, 40.0) - 10.0).abs() < 1e-4);
        let tiny = wrap_x(-1e-9, 40.0);
        assert!((0.0..40.0).contains(&tiny));
    }

    #[test]
    fn test_angle_from_upright() {
        assert!(angle_from_upright(0.0).abs() < 1e-6);
        assert!((angle_from_upright(FRAC_PI_2) - FRAC_PI_2).abs() < 1e-6);
        assert!((angle_from_upright(-FRAC_PI_2) - FRAC_PI_2).abs() < 1e-6);
        assert!((angle_from_upright(PI) - PI).abs() < 1e-5);
        // Full turns collapse back to upright
        assert!(angle_from_upright(TAU + 0.1) < 0.1 + 1e-5);
        assert!(angle_from_upright(-TAU - 0.1) < 0.1 + 1e-5);
        // Nearly a full turn is close to upright
        assert!(angle_from_upright(TAU - 0.1) < 0.1 + 1e-5);
    }
}
