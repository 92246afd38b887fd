//! Background starfield
//!
//! Purely decorative. Generated once per world from the world seed on its own
//! PCG stream, so adding or removing stars never perturbs the terrain.

use glam::Vec2;
use rand::Rng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use crate::consts::STAR_MIN_Y;

/// PCG stream reserved for star placement
const STAR_STREAM: u64 = 0x5741_5253;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Star {
    pub pos: Vec2,
    /// 0.2 - 1.0
    pub brightness: f32,
    /// Point size in pixels
    pub size: f32,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Starfield {
    stars: Vec<Star>,
}

impl Starfield {
    pub fn generate(seed: u64, count: usize, world_width: f32, world_height: f32) -> Self {
        let mut rng = Pcg32::new(seed, STAR_STREAM);
        let min_y = STAR_MIN_Y.min(world_height);

        let stars = (0..count)
            .map(|_| {
                let x = rng.random_range(0.0..world_width);
                let y = if world_height > min_y {
                    rng.random_range(min_y..world_height)
                } else {
                    min_y
                };
                Star {
                    pos: Vec2::new(x, y),
                    brightness: rng.random_range(0.2..1.0),
                    size: rng.random_range(1.0..3.0),
                }
            })
            .collect();

        Self { stars }
    }

    pub fn stars(&self) -> &[Star] {
        &self.stars
    }

    pub fn len(&self) -> usize {
        self.stars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stars.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::{STAR_COUNT, WORLD_HEIGHT, WORLD_WIDTH};

    #[test]
    fn test_starfield_bounds() {
        let field = Starfield::generate(42, STAR_COUNT, WORLD_WIDTH, WORLD_HEIGHT);
        assert_eq!(field.len(), STAR_COUNT);
        for star in field.stars() {
            assert!(star.pos.x >= 0.0 && star.pos.x < WORLD_WIDTH);
            assert!(star.pos.y >= STAR_MIN_Y && star.pos.y < WORLD_HEIGHT);
            assert!(star.brightness >= 0.2 && star.brightness < 1.0);
            assert!(star.size >= 1.0 && star.size < 3.0);
        }
    }

    #[test]
    fn test_starfield_determinism() {
        let a = Starfield::generate(7, 50, WORLD_WIDTH, WORLD_HEIGHT);
        let b = Starfield::generate(7, 50, WORLD_WIDTH, WORLD_HEIGHT);
        assert_eq!(a, b);

        let c = Starfield::generate(8, 50, WORLD_WIDTH, WORLD_HEIGHT);
        assert_ne!(a, c);
    }

    #[test]
    fn test_empty_starfield() {
        let field = Starfield::generate(1, 0, WORLD_WIDTH, WORLD_HEIGHT);
        assert!(field.is_empty());
    }
}
