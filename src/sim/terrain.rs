//! Procedural terrain with an embedded flat landing pad
//!
//! The profile is sampled once at fixed horizontal spacing and is immutable
//! afterwards. Height lookups are O(1): the bracketing sample pair comes from
//! index arithmetic, not a search.

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::consts::*;

/// Reasons a terrain cannot be generated
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TerrainError {
    #[error("terrain needs at least one segment")]
    NoSegments,
    #[error("world width must be positive and finite, got {0}")]
    InvalidWidth(f32),
    #[error(
        "landing pad {pad_width} wide does not fit with margin {margin} in a world {world_width} wide"
    )]
    PadDoesNotFit {
        pad_width: f32,
        margin: f32,
        world_width: f32,
    },
    #[error("ground height {ground} is below the terrain floor {floor}")]
    GroundBelowFloor { ground: f32, floor: f32 },
    #[error("transition distance must be non-negative and finite, got {0}")]
    InvalidTransition(f32),
}

/// Terrain generation parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TerrainParams {
    pub world_width: f32,
    pub segments: usize,
    /// Height of the pad, and the baseline the hills oscillate around
    pub ground_height: f32,
    pub floor: f32,
    pub pad_width: f32,
    pub pad_margin: f32,
    pub transition: f32,
}

impl Default for TerrainParams {
    fn default() -> Self {
        Self {
            world_width: WORLD_WIDTH,
            segments: TERRAIN_SEGMENTS,
            ground_height: GROUND_HEIGHT,
            floor: TERRAIN_FLOOR,
            pad_width: LANDING_PAD_WIDTH,
            pad_margin: LANDING_PAD_MARGIN,
            transition: PAD_TRANSITION,
        }
    }
}

impl TerrainParams {
    pub fn validate(&self) -> Result<(), TerrainError> {
        if self.segments == 0 {
            return Err(TerrainError::NoSegments);
        }
        if !self.world_width.is_finite() || self.world_width <= 0.0 {
            return Err(TerrainError::InvalidWidth(self.world_width));
        }
        let pad_fits = self.pad_width > 0.0
            && self.pad_margin >= self.pad_width / 2.0
            && self.pad_margin < self.world_width - self.pad_margin;
        if !pad_fits {
            return Err(TerrainError::PadDoesNotFit {
                pad_width: self.pad_width,
                margin: self.pad_margin,
                world_width: self.world_width,
            });
        }
        if !(self.ground_height >= self.floor) {
            return Err(TerrainError::GroundBelowFloor {
                ground: self.ground_height,
                floor: self.floor,
            });
        }
        if !self.transition.is_finite() || self.transition < 0.0 {
            return Err(TerrainError::InvalidTransition(self.transition));
        }
        Ok(())
    }

    /// Layered sine hills, each term adding detail at a finer scale
    fn hill_height(&self, x: f32) -> f32 {
        let height = self.ground_height
            + 1.5 * (x * 0.3).sin()
            + 0.8 * (x * 0.7 + 1.0).sin()
            + 0.4 * (x * 1.5 + 2.0).sin()
            + 0.2 * (x * 3.0 + 0.5).sin();
        height.max(self.floor)
    }

    /// Hill height eased quadratically into the pad height near the pad edges
    fn profile_height(&self, x: f32, pad: &LandingPad) -> f32 {
        let raw = self.hill_height(x);
        let dist = (x - pad.left).abs().min((x - pad.right).abs());
        let t = if self.transition > 0.0 {
            (dist / self.transition).clamp(0.0, 1.0)
        } else {
            1.0
        };
        pad.height + (raw - pad.height) * t * t
    }
}

/// The flat landing zone
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LandingPad {
    pub center: f32,
    pub left: f32,
    pub right: f32,
    pub height: f32,
}

impl LandingPad {
    pub fn new(center: f32, width: f32, height: f32) -> Self {
        Self {
            center,
            left: center - width / 2.0,
            right: center + width / 2.0,
            height,
        }
    }

    /// Whether `x` lies on the pad (edges inclusive)
    #[inline]
    pub fn contains(&self, x: f32) -> bool {
        x >= self.left && x <= self.right
    }

    pub fn width(&self) -> f32 {
        self.right - self.left
    }
}

/// Sampled height profile over `[0, world_width]`
#[derive(Debug, Clone, PartialEq)]
pub struct Terrain {
    samples: Vec<Vec2>,
    pad: LandingPad,
    world_width: f32,
    spacing: f32,
    floor: f32,
}

impl Terrain {
    /// Generate a terrain deterministically from `seed`
    pub fn generate(params: &TerrainParams, seed: u64) -> Result<Self, TerrainError> {
        params.validate()?;

        let mut rng = Pcg32::seed_from_u64(seed);
        let center =
            rng.random_range(params.pad_margin..params.world_width - params.pad_margin);
        let pad = LandingPad::new(center, params.pad_width, params.ground_height);

        let spacing = params.world_width / params.segments as f32;
        let mut samples = Vec::with_capacity(params.segments + 1);
        for i in 0..=params.segments {
            let x = if i == params.segments {
                params.world_width
            } else {
                i as f32 * spacing
            };
            let height = if pad.contains(x) {
                pad.height
            } else {
                params.profile_height(x, &pad)
            };
            samples.push(Vec2::new(x, height));
        }

        // Close the loop so the profile is continuous across the wrap seam
        let first = samples[0].y;
        if let Some(last) = samples.last_mut() {
            last.y = first;
        }

        log::debug!(
            "Generated terrain: {} segments, pad at {:.2} [{:.2}, {:.2}]",
            params.segments,
            pad.center,
            pad.left,
            pad.right
        );

        Ok(Self {
            samples,
            pad,
            world_width: params.world_width,
            spacing,
            floor: params.floor,
        })
    }

    /// Terrain height under `x`, interpolated between the bracketing samples
    ///
    /// `x` is wrapped into `[0, world_width)`, so both world edges report the
    /// same height. Anywhere on the pad the pad height is returned exactly.
    pub fn height_at(&self, x: f32) -> f32 {
        let x = self.wrap(x);
        if self.pad.contains(x) {
            return self.pad.height;
        }

        let last_pair = self.samples.len() - 2;
        let idx = ((x / self.spacing) as usize).min(last_pair);
        let a = self.samples[idx];
        let b = self.samples[idx + 1];
        let t = ((x - a.x) / self.spacing).clamp(0.0, 1.0);
        a.y + (b.y - a.y) * t
    }

    fn wrap(&self, x: f32) -> f32 {
        let wrapped = x.rem_euclid(self.world_width);
        // rem_euclid can round up to the width itself for tiny negative inputs
        if wrapped >= self.world_width {
            0.0
        } else {
            wrapped
        }
    }

    pub fn samples(&self) -> &[Vec2] {
        &self.samples
    }

    pub fn pad(&self) -> &LandingPad {
        &self.pad
    }

    pub fn world_width(&self) -> f32 {
        self.world_width
    }

    pub fn spacing(&self) -> f32 {
        self.spacing
    }

    pub fn floor(&self) -> f32 {
        self.floor
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn terrain(seed: u64) -> Terrain {
        Terrain::generate(&TerrainParams::default(), seed).unwrap()
    }

    #[test]
    fn test_determinism() {
        let a = terrain(1234);
        let b = terrain(1234);
        assert_eq!(a.pad(), b.pad());
        for (sa, sb) in a.samples().iter().zip(b.samples()) {
            assert_eq!(sa.x.to_bits(), sb.x.to_bits());
            assert_eq!(sa.y.to_bits(), sb.y.to_bits());
        }
        for i in 0..400 {
            let x = i as f32 * 0.1;
            assert_eq!(a.height_at(x).to_bits(), b.height_at(x).to_bits());
        }
    }

    #[test]
    fn test_sample_layout() {
        let t = terrain(7);
        let params = TerrainParams::default();
        assert_eq!(t.samples().len(), params.segments + 1);
        assert_eq!(t.samples()[0].x, 0.0);
        assert_eq!(t.samples().last().unwrap().x, params.world_width);
        for pair in t.samples().windows(2) {
            assert!(pair[0].x < pair[1].x, "samples must increase in x");
        }
    }

    #[test]
    fn test_pad_within_margin() {
        for seed in 0..50 {
            let t = terrain(seed);
            let pad = t.pad();
            assert!(pad.center >= LANDING_PAD_MARGIN);
            assert!(pad.center <= WORLD_WIDTH - LANDING_PAD_MARGIN);
            assert!((pad.width() - LANDING_PAD_WIDTH).abs() < 1e-5);
        }
    }

    #[test]
    fn test_pad_samples_are_flat() {
        let t = terrain(99);
        let pad = *t.pad();
        let on_pad: Vec<_> = t.samples().iter().filter(|s| pad.contains(s.x)).collect();
        assert!(!on_pad.is_empty());
        for s in on_pad {
            assert_eq!(s.y, pad.height);
        }
    }

    #[test]
    fn test_pad_edges_exact() {
        let t = terrain(5);
        let pad = *t.pad();
        assert_eq!(t.height_at(pad.left), pad.height);
        assert_eq!(t.height_at(pad.right), pad.height);
        assert_eq!(t.height_at(pad.center), pad.height);
    }

    #[test]
    fn test_transition_eases_into_pad() {
        let t = terrain(11);
        let pad = *t.pad();
        // Just outside the pad the terrain is close to the pad height
        let near = t.height_at(pad.right + 0.05);
        assert!((near - pad.height).abs() < 0.05, "seam too visible: {near}");
    }

    #[test]
    fn test_wrap_continuity() {
        for seed in [0, 1, 42, 1000] {
            let t = terrain(seed);
            assert_eq!(t.height_at(0.0), t.height_at(t.world_width()));
            assert_eq!(t.height_at(-1.0), t.height_at(t.world_width() - 1.0));
        }
    }

    #[test]
    fn test_interpolates_between_samples() {
        let t = terrain(3);
        let pad = *t.pad();
        let idx = t
            .samples()
            .windows(2)
            .position(|w| !pad.contains(w[0].x) && !pad.contains(w[1].x))
            .unwrap();
        let a = t.samples()[idx];
        let b = t.samples()[idx + 1];
        assert!((t.height_at(a.x) - a.y).abs() < 1e-5);
        let mid = t.height_at((a.x + b.x) / 2.0);
        assert!((mid - (a.y + b.y) / 2.0).abs() < 1e-4);
    }

    #[test]
    fn test_zero_segments_rejected() {
        let params = TerrainParams {
            segments: 0,
            ..Default::default()
        };
        assert_eq!(Terrain::generate(&params, 1), Err(TerrainError::NoSegments));
    }

    #[test]
    fn test_invalid_params_rejected() {
        let narrow = TerrainParams {
            world_width: 10.0,
            ..Default::default()
        };
        assert!(matches!(
            Terrain::generate(&narrow, 1),
            Err(TerrainError::PadDoesNotFit { .. })
        ));

        let negative = TerrainParams {
            world_width: -5.0,
            ..Default::default()
        };
        assert_eq!(
            Terrain::generate(&negative, 1),
            Err(TerrainError::InvalidWidth(-5.0))
        );

        let sunk = TerrainParams {
            ground_height: 0.1,
            ..Default::default()
        };
        assert!(matches!(
            Terrain::generate(&sunk, 1),
            Err(TerrainError::GroundBelowFloor { .. })
        ));
    }

    #[test]
    fn test_single_segment_terrain() {
        let params = TerrainParams {
            segments: 1,
            ..Default::default()
        };
        let t = Terrain::generate(&params, 8).unwrap();
        assert_eq!(t.samples().len(), 2);
        assert!(t.height_at(20.0).is_finite());
    }

    proptest! {
        #[test]
        fn prop_height_never_below_floor(seed in any::<u64>(), x in -80.0f32..80.0) {
            let t = terrain(seed);
            prop_assert!(t.height_at(x) >= t.floor());
        }

        #[test]
        fn prop_samples_evenly_spaced(seed in any::<u64>()) {
            let t = terrain(seed);
            for pair in t.samples().windows(2) {
                prop_assert!(pair[1].x > pair[0].x);
                prop_assert!((pair[1].x - pair[0].x - t.spacing()).abs() < 1e-4);
            }
        }

        #[test]
        fn prop_pad_interior_is_flat(seed in any::<u64>(), u in 0.001f32..0.999) {
            let t = terrain(seed);
            let pad = *t.pad();
            let x = pad.left + u * pad.width();
            prop_assert_eq!(t.height_at(x), pad.height);
        }

        #[test]
        fn prop_height_is_periodic(seed in 0u64..64, x in 0.0f32..40.0) {
            let t = terrain(seed);
            let a = t.height_at(x);
            let b = t.height_at(x + t.world_width());
            prop_assert!((a - b).abs() < 1e-3);
        }
    }
}
