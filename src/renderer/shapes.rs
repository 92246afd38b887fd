//! Static mesh generation
//!
//! Every mesh is built once per world, in world units, as a triangle list.
//! The lander and flame are in model space around the lander origin; the rest
//! are already placed in the world.

use glam::Vec2;

use super::vertex::{Vertex, colors};
use crate::sim::{LandingPad, Starfield, Terrain, World};

/// Model-space scale of the lander outline
const LANDER_SCALE: f32 = 0.5;
/// World units per star "pixel"
const STAR_PIXEL: f32 = 0.03;
/// Height of the pad's corner posts
const PAD_POST_HEIGHT: f32 = 0.8;

/// Handles for the meshes a draw command can reference
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MeshId {
    Stars,
    Terrain,
    LandingPad,
    Lander,
    Flame,
}

impl MeshId {
    pub const ALL: [MeshId; 5] = [
        MeshId::Stars,
        MeshId::Terrain,
        MeshId::LandingPad,
        MeshId::Lander,
        MeshId::Flame,
    ];

    fn index(self) -> usize {
        self as usize
    }
}

/// All static meshes for one world
#[derive(Debug, Clone)]
pub struct MeshLibrary {
    meshes: [Vec<Vertex>; 5],
}

impl MeshLibrary {
    pub fn build(world: &World) -> Self {
        let mut meshes: [Vec<Vertex>; 5] = Default::default();
        meshes[MeshId::Stars.index()] = stars(&world.starfield);
        meshes[MeshId::Terrain.index()] = terrain(&world.terrain);
        meshes[MeshId::LandingPad.index()] = landing_pad(world.terrain.pad());
        meshes[MeshId::Lander.index()] = lander();
        meshes[MeshId::Flame.index()] = flame();
        Self { meshes }
    }

    pub fn get(&self, id: MeshId) -> &[Vertex] {
        &self.meshes[id.index()]
    }

    /// Vertex count across every mesh
    pub fn total_vertices(&self) -> usize {
        self.meshes.iter().map(Vec::len).sum()
    }
}

fn push_tri(out: &mut Vec<Vertex>, a: Vec2, b: Vec2, c: Vec2, color: [f32; 4]) {
    out.push(Vertex::at(a, color));
    out.push(Vertex::at(b, color));
    out.push(Vertex::at(c, color));
}

/// Axis-aligned quad as two triangles
pub fn quad(out: &mut Vec<Vertex>, min: Vec2, max: Vec2, color: [f32; 4]) {
    push_tri(out, min, Vec2::new(max.x, min.y), max, color);
    push_tri(out, min, max, Vec2::new(min.x, max.y), color);
}

/// Filled terrain: one column per segment down to y = 0
pub fn terrain(terrain: &Terrain) -> Vec<Vertex> {
    let samples = terrain.samples();
    let mut vertices = Vec::with_capacity(samples.len().saturating_sub(1) * 6);

    for pair in samples.windows(2) {
        let (a, b) = (pair[0], pair[1]);
        let a_base = Vec2::new(a.x, 0.0);
        let b_base = Vec2::new(b.x, 0.0);
        push_tri(&mut vertices, a_base, a, b, colors::MOON_GRAY);
        push_tri(&mut vertices, a_base, b, b_base, colors::MOON_GRAY);
    }

    vertices
}

/// Pad plate plus a post at each edge
pub fn landing_pad(pad: &LandingPad) -> Vec<Vertex> {
    let mut vertices = Vec::with_capacity(18);
    let y = pad.height;
    quad(
        &mut vertices,
        Vec2::new(pad.left, y),
        Vec2::new(pad.right, y + 0.1),
        colors::PAD,
    );
    for x in [pad.left, pad.right] {
        quad(
            &mut vertices,
            Vec2::new(x - 0.1, y),
            Vec2::new(x + 0.1, y + PAD_POST_HEIGHT),
            colors::PAD,
        );
    }
    vertices
}

/// Small square per star, shaded by brightness
pub fn stars(starfield: &Starfield) -> Vec<Vertex> {
    let mut vertices = Vec::with_capacity(starfield.len() * 6);
    for star in starfield.stars() {
        let half = Vec2::splat(star.size * STAR_PIXEL / 2.0);
        let b = star.brightness;
        quad(&mut vertices, star.pos - half, star.pos + half, [b, b, b, 1.0]);
    }
    vertices
}

/// Lunar module outline around the lander origin
pub fn lander() -> Vec<Vertex> {
    let s = LANDER_SCALE;
    let mut vertices = Vec::with_capacity(72);
    let mut tri = |a: [f32; 2], b: [f32; 2], c: [f32; 2], color: [f32; 4]| {
        push_tri(
            &mut vertices,
            Vec2::from(a) * s,
            Vec2::from(b) * s,
            Vec2::from(c) * s,
            color,
        );
    };

    // Descent stage, fanned from the first point
    let body = [
        [-0.6, 0.0],
        [-0.5, 0.4],
        [-0.2, 0.6],
        [0.2, 0.6],
        [0.5, 0.4],
        [0.6, 0.0],
        [0.5, -0.3],
        [-0.5, -0.3],
    ];
    for i in 1..7 {
        tri(body[0], body[i], body[i + 1], colors::LANDER_GOLD);
    }

    // Ascent stage
    let top = [[-0.3, 0.6], [-0.25, 1.0], [0.25, 1.0], [0.3, 0.6]];
    tri(top[0], top[1], top[2], colors::LANDER_SILVER);
    tri(top[0], top[2], top[3], colors::LANDER_SILVER);

    // Window
    tri([-0.12, 0.75], [0.0, 0.9], [0.12, 0.75], colors::LANDER_DARK);

    // Legs and feet
    tri([-0.5, -0.3], [-0.9, -1.0], [-0.7, -1.0], colors::LANDER_DARK);
    tri([-0.9, -1.0], [-1.1, -1.05], [-0.7, -1.05], colors::LANDER_DARK);
    tri([0.5, -0.3], [0.7, -1.0], [0.9, -1.0], colors::LANDER_DARK);
    tri([0.7, -1.05], [0.9, -1.0], [1.1, -1.05], colors::LANDER_DARK);

    // Nozzle
    tri([-0.15, -0.3], [-0.2, -0.5], [0.2, -0.5], colors::LANDER_DARK);
    tri([-0.15, -0.3], [0.2, -0.5], [0.15, -0.3], colors::LANDER_DARK);

    // Stripe
    tri([-0.4, 0.15], [-0.4, 0.25], [0.4, 0.25], colors::LANDER_STRIPE);
    tri([-0.4, 0.15], [0.4, 0.25], [0.4, 0.15], colors::LANDER_STRIPE);

    vertices
}

/// Exhaust plume under the nozzle, fading out at the tip
pub fn flame() -> Vec<Vertex> {
    let s = LANDER_SCALE;
    vec![
        Vertex::at(Vec2::new(-0.18, -0.5) * s, colors::FLAME_CORE),
        Vertex::at(Vec2::new(0.0, -1.4) * s, colors::FLAME_EDGE),
        Vertex::at(Vec2::new(0.18, -0.5) * s, colors::FLAME_CORE),
    ]
}
