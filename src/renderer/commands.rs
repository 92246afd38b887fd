//! Draw command construction
//!
//! Turns the current vehicle and terrain into an ordered list of mesh draws.
//! Pure: no state of its own, nothing touches the GPU here.

use glam::{Affine2, Vec2};

use super::shapes::MeshId;
use super::vertex::colors;
use crate::sim::{Outcome, Terrain, VehicleState};

/// Distance from a world edge at which the lander is drawn a second time on
/// the opposite side
const GHOST_MARGIN: f32 = 1.2;

/// Draw layers, back to front
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Layer {
    Background,
    Terrain,
    LandingPad,
    Vehicle,
}

impl Layer {
    /// Later layers draw over earlier ones
    pub const ORDER: [Layer; 4] = [
        Layer::Background,
        Layer::Terrain,
        Layer::LandingPad,
        Layer::Vehicle,
    ];
}

/// One mesh draw: which mesh, where, and how it is tinted
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DrawCommand {
    pub layer: Layer,
    pub mesh: MeshId,
    /// Model to world transform
    pub transform: Affine2,
    pub tint: [f32; 4],
}

/// Commands in submission order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DrawSequence {
    commands: Vec<DrawCommand>,
}

impl DrawSequence {
    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    fn push(&mut self, layer: Layer, mesh: MeshId, transform: Affine2, tint: [f32; 4]) {
        self.commands.push(DrawCommand {
            layer,
            mesh,
            transform,
            tint,
        });
    }
}

/// Build the draw sequence for one frame
pub fn build(vehicle: &VehicleState, terrain: &Terrain) -> DrawSequence {
    let mut sequence = DrawSequence::default();
    for layer in Layer::ORDER {
        match layer {
            Layer::Background => {
                sequence.push(layer, MeshId::Stars, Affine2::IDENTITY, colors::WHITE)
            }
            Layer::Terrain => {
                sequence.push(layer, MeshId::Terrain, Affine2::IDENTITY, colors::WHITE)
            }
            Layer::LandingPad => {
                sequence.push(layer, MeshId::LandingPad, Affine2::IDENTITY, colors::WHITE)
            }
            Layer::Vehicle => push_vehicle(&mut sequence, vehicle, terrain.world_width()),
        }
    }
    sequence
}

fn push_vehicle(sequence: &mut DrawSequence, vehicle: &VehicleState, world_width: f32) {
    let tint = match vehicle.outcome() {
        Outcome::Flying => colors::WHITE,
        Outcome::Landed => colors::TINT_LANDED,
        Outcome::Crashed => colors::TINT_CRASHED,
    };

    let x = vehicle.position.x;
    let ghost = if x < GHOST_MARGIN {
        Some(world_width)
    } else if x > world_width - GHOST_MARGIN {
        Some(-world_width)
    } else {
        None
    };

    let offsets = std::iter::once(0.0).chain(ghost);
    for offset in offsets {
        let position = vehicle.position + Vec2::new(offset, 0.0);
        let transform = Affine2::from_angle_translation(vehicle.angle, position);
        // Flame first so the nozzle covers its base
        if vehicle.thrusting {
            sequence.push(Layer::Vehicle, MeshId::Flame, transform, tint);
        }
        sequence.push(Layer::Vehicle, MeshId::Lander, transform, tint);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::*;
    use crate::sim::TerrainParams;

    fn terrain() -> Terrain {
        Terrain::generate(&TerrainParams::default(), DEFAULT_SEED).unwrap()
    }

    fn meshes(sequence: &DrawSequence) -> Vec<MeshId> {
        sequence.commands().iter().map(|c| c.mesh).collect()
    }

    #[test]
    fn test_layers_back_to_front() {
        let t = terrain();
        let sequence = build(&VehicleState::default(), &t);

        assert_eq!(
            meshes(&sequence),
            vec![
                MeshId::Stars,
                MeshId::Terrain,
                MeshId::LandingPad,
                MeshId::Lander
            ]
        );
        let layers: Vec<Layer> = sequence.commands().iter().map(|c| c.layer).collect();
        assert!(layers.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn test_flame_only_while_thrusting() {
        let t = terrain();
        let mut vehicle = VehicleState::default();
        assert!(!meshes(&build(&vehicle, &t)).contains(&MeshId::Flame));

        vehicle.thrusting = true;
        let sequence = build(&vehicle, &t);
        let ids = meshes(&sequence);
        assert_eq!(&ids[3..], &[MeshId::Flame, MeshId::Lander]);
        assert_eq!(sequence.commands()[3].layer, Layer::Vehicle);
    }

    #[test]
    fn test_lander_transform_follows_state() {
        let t = terrain();
        let mut vehicle = VehicleState::spawn(Vec2::new(12.0, 8.0));
        vehicle.angle = std::f32::consts::FRAC_PI_2;

        let sequence = build(&vehicle, &t);
        let lander = sequence.commands().last().unwrap();
        assert_eq!(lander.mesh, MeshId::Lander);

        // The model's up axis points along the thrust direction
        let up = lander.transform.transform_vector2(Vec2::Y);
        assert!((up - Vec2::new(-1.0, 0.0)).length() < 1e-6);
        let origin = lander.transform.transform_point2(Vec2::ZERO);
        assert!((origin - vehicle.position).length() < 1e-6);
    }

    #[test]
    fn test_outcome_tint() {
        let t = terrain();
        let mut vehicle = VehicleState::default();
        vehicle.settle(Outcome::Crashed);
        let sequence = build(&vehicle, &t);
        assert_eq!(sequence.commands().last().unwrap().tint, colors::TINT_CRASHED);
        // Scenery is never tinted
        assert!(sequence.commands()[..3].iter().all(|c| c.tint == colors::WHITE));
    }

    #[test]
    fn test_wrap_ghost_near_edges() {
        let t = terrain();

        let left = VehicleState::spawn(Vec2::new(0.3, 10.0));
        let sequence = build(&left, &t);
        let landers: Vec<_> = sequence
            .commands()
            .iter()
            .filter(|c| c.mesh == MeshId::Lander)
            .collect();
        assert_eq!(landers.len(), 2);
        let ghost_x = landers[1].transform.translation.x;
        assert!((ghost_x - (0.3 + WORLD_WIDTH)).abs() < 1e-4);

        let right = VehicleState::spawn(Vec2::new(WORLD_WIDTH - 0.3, 10.0));
        let sequence = build(&right, &t);
        let ghost = sequence.commands().last().unwrap();
        assert!((ghost.transform.translation.x - (-0.3)).abs() < 1e-4);

        let middle = VehicleState::spawn(Vec2::new(WORLD_WIDTH / 2.0, 10.0));
        assert_eq!(build(&middle, &t).len(), 4);
    }

    #[test]
    fn test_build_is_pure() {
        let t = terrain();
        let vehicle = VehicleState::default();
        assert_eq!(build(&vehicle, &t), build(&vehicle, &t));
    }
}
