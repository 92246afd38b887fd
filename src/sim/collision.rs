//! Ground contact and touchdown classification
//!
//! Contact is a single vertical test of the lander's bottom against the
//! sampled terrain. Classification decides Landed vs Crashed; the crash reason
//! is derived for reporting only.

use std::fmt;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::state::Outcome;
use super::terrain::Terrain;
use crate::angle_from_upright;

/// Why a touchdown counted as a crash, in reporting priority order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CrashReason {
    MissedPad,
    TooFast,
    BadAngle,
}

impl fmt::Display for CrashReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CrashReason::MissedPad => write!(f, "missed the landing pad"),
            CrashReason::TooFast => write!(f, "too fast"),
            CrashReason::BadAngle => write!(f, "bad angle"),
        }
    }
}

/// Limits for a safe landing
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LandingLimits {
    /// Exclusive speed limit
    pub max_speed: f32,
    /// Exclusive tilt limit (radians from upright)
    pub max_angle: f32,
}

/// Report produced on the tick the lander touches the ground
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Touchdown {
    pub outcome: Outcome,
    /// Impact speed, before velocity is zeroed
    pub speed: f32,
    /// Shortest angular distance from upright
    pub angle: f32,
    pub on_pad: bool,
    pub crash_reason: Option<CrashReason>,
}

impl fmt::Display for Touchdown {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.crash_reason {
            None => write!(
                f,
                "landed at {:.2} m/s, {:.1} deg",
                self.speed,
                self.angle.to_degrees()
            ),
            Some(reason) => write!(
                f,
                "crashed ({reason}) at {:.2} m/s, {:.1} deg",
                self.speed,
                self.angle.to_degrees()
            ),
        }
    }
}

/// Terrain height under the lander if its bottom is at or below the ground
pub fn ground_contact(position: Vec2, half_height: f32, terrain: &Terrain) -> Option<f32> {
    let ground = terrain.height_at(position.x);
    let bottom = position.y - half_height;
    (bottom <= ground).then_some(ground)
}

/// Classify a touchdown from impact velocity, attitude and position
pub fn classify_touchdown(
    velocity: Vec2,
    angle: f32,
    x: f32,
    terrain: &Terrain,
    limits: &LandingLimits,
) -> Touchdown {
    let speed = velocity.length();
    let angle = angle_from_upright(angle);
    let on_pad = terrain.pad().contains(x);

    let crash_reason = if !on_pad {
        Some(CrashReason::MissedPad)
    } else if speed >= limits.max_speed {
        Some(CrashReason::TooFast)
    } else if angle >= limits.max_angle {
        Some(CrashReason::BadAngle)
    } else {
        None
    };

    let outcome = if crash_reason.is_none() {
        Outcome::Landed
    } else {
        Outcome::Crashed
    };

    Touchdown {
        outcome,
        speed,
        angle,
        on_pad,
        crash_reason,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::*;
    use crate::sim::terrain::TerrainParams;

    fn terrain() -> Terrain {
        Terrain::generate(&TerrainParams::default(), DEFAULT_SEED).unwrap()
    }

    fn limits() -> LandingLimits {
        LandingLimits {
            max_speed: SAFE_LANDING_VEL,
            max_angle: SAFE_LANDING_ANGLE,
        }
    }

    #[test]
    fn test_ground_contact() {
        let t = terrain();
        let x = t.pad().center;
        let ground = t.height_at(x);

        assert_eq!(ground_contact(Vec2::new(x, ground + 0.6), 0.5, &t), None);
        assert_eq!(
            ground_contact(Vec2::new(x, ground + 0.5), 0.5, &t),
            Some(ground)
        );
        assert_eq!(
            ground_contact(Vec2::new(x, ground - 1.0), 0.5, &t),
            Some(ground)
        );
    }

    #[test]
    fn test_gentle_landing_on_pad() {
        let t = terrain();
        let touch = classify_touchdown(Vec2::new(0.0, -1.0), 0.05, t.pad().center, &t, &limits());
        assert_eq!(touch.outcome, Outcome::Landed);
        assert_eq!(touch.crash_reason, None);
        assert!(touch.on_pad);
    }

    #[test]
    fn test_limits_are_exclusive() {
        let t = terrain();
        let x = t.pad().center;
        let fast = classify_touchdown(Vec2::new(0.0, -SAFE_LANDING_VEL), 0.0, x, &t, &limits());
        assert_eq!(fast.crash_reason, Some(CrashReason::TooFast));

        let tilted = classify_touchdown(Vec2::ZERO, SAFE_LANDING_ANGLE, x, &t, &limits());
        assert_eq!(tilted.crash_reason, Some(CrashReason::BadAngle));
    }

    #[test]
    fn test_crash_reason_priority() {
        let t = terrain();
        let off_pad = t.pad().right + 5.0;

        // Everything wrong: the miss is reported
        let all = classify_touchdown(Vec2::new(0.0, -9.0), 1.0, off_pad, &t, &limits());
        assert_eq!(all.outcome, Outcome::Crashed);
        assert_eq!(all.crash_reason, Some(CrashReason::MissedPad));

        // Fast and tilted on the pad: speed is reported
        let both = classify_touchdown(Vec2::new(0.0, -9.0), 1.0, t.pad().center, &t, &limits());
        assert_eq!(both.crash_reason, Some(CrashReason::TooFast));
    }

    #[test]
    fn test_upside_down_wraps_to_shortest_angle() {
        let t = terrain();
        let x = t.pad().center;
        // Nearly a full turn is effectively upright
        let spun = classify_touchdown(Vec2::ZERO, std::f32::consts::TAU - 0.1, x, &t, &limits());
        assert_eq!(spun.outcome, Outcome::Landed);

        let flipped = classify_touchdown(Vec2::ZERO, std::f32::consts::PI, x, &t, &limits());
        assert_eq!(flipped.crash_reason, Some(CrashReason::BadAngle));
    }

    #[test]
    fn test_touchdown_display() {
        let t = terrain();
        let crash = classify_touchdown(Vec2::new(0.0, -5.0), 0.0, t.pad().center, &t, &limits());
        assert!(crash.to_string().contains("too fast"));
    }
}
