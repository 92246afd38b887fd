//! Vertex types for 2D rendering

use bytemuck::{Pod, Zeroable};
use glam::Vec2;

/// Simple 2D vertex with position and color
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 2],
    pub color: [f32; 4],
}

impl Vertex {
    pub const fn new(x: f32, y: f32, color: [f32; 4]) -> Self {
        Self {
            position: [x, y],
            color,
        }
    }

    pub fn at(pos: Vec2, color: [f32; 4]) -> Self {
        Self::new(pos.x, pos.y, color)
    }

    pub fn pos(&self) -> Vec2 {
        Vec2::from(self.position)
    }

    pub fn desc() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Vertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &[
                wgpu::VertexAttribute {
                    offset: 0,
                    shader_location: 0,
                    format: wgpu::VertexFormat::Float32x2,
                },
                wgpu::VertexAttribute {
                    offset: std::mem::size_of::<[f32; 2]>() as wgpu::BufferAddress,
                    shader_location: 1,
                    format: wgpu::VertexFormat::Float32x4,
                },
            ],
        }
    }
}

/// Multiply two RGBA colors component-wise
#[inline]
pub fn modulate(a: [f32; 4], b: [f32; 4]) -> [f32; 4] {
    [a[0] * b[0], a[1] * b[1], a[2] * b[2], a[3] * b[3]]
}

/// Colors for scene elements
pub mod colors {
    pub const WHITE: [f32; 4] = [1.0, 1.0, 1.0, 1.0];
    pub const BACKGROUND: [f32; 4] = [0.01, 0.01, 0.03, 1.0];
    pub const MOON_GRAY: [f32; 4] = [0.45, 0.42, 0.4, 1.0];
    pub const PAD: [f32; 4] = [0.2, 0.8, 0.2, 1.0];

    pub const LANDER_GOLD: [f32; 4] = [0.85, 0.75, 0.3, 1.0];
    pub const LANDER_SILVER: [f32; 4] = [0.7, 0.72, 0.75, 1.0];
    pub const LANDER_DARK: [f32; 4] = [0.3, 0.3, 0.35, 1.0];
    pub const LANDER_STRIPE: [f32; 4] = [0.9, 0.2, 0.1, 1.0];
    pub const FLAME_CORE: [f32; 4] = [1.0, 0.9, 0.5, 1.0];
    pub const FLAME_EDGE: [f32; 4] = [1.0, 0.45, 0.1, 0.0];

    /// Outcome tints applied to the whole lander
    pub const TINT_LANDED: [f32; 4] = [0.3, 1.0, 0.3, 1.0];
    pub const TINT_CRASHED: [f32; 4] = [1.0, 0.3, 0.3, 1.0];
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vertex_layout_matches_struct() {
        let desc = Vertex::desc();
        assert_eq!(desc.array_stride, 24);
        assert_eq!(desc.attributes.len(), 2);
        assert_eq!(desc.attributes[1].offset, 8);
    }

    #[test]
    fn test_modulate() {
        let c = modulate(colors::WHITE, colors::TINT_CRASHED);
        assert_eq!(c, colors::TINT_CRASHED);
        let half = modulate([0.5, 0.5, 0.5, 1.0], [0.5, 1.0, 0.0, 0.5]);
        assert_eq!(half, [0.25, 0.5, 0.0, 0.5]);
    }
}
