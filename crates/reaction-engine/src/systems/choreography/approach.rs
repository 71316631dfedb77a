//! `move_to_center`: reactants converge while the stage dims.

use glam::Vec3;

use super::Cue;
use crate::api::config::ChoreographyConfig;
use crate::components::molecule::MoleculeInstance;
use crate::components::node::Property;
use crate::core::context::RunContext;
use crate::extensions::easing::Easing;
use crate::extensions::timeline::{Position, Timeline};
use crate::extensions::tween::{Tween, TweenLoop};

/// Spin added to every reactant over the step, radians per axis.
const SPIN: Vec3 = Vec3::new(6.0, 6.0, 0.0);
const BREATH: f32 = 1.1;

pub fn approach(
    ctx: &mut RunContext,
    reactants: &[MoleculeInstance],
    config: &ChoreographyConfig,
) -> Timeline<Cue> {
    let d = config.approach_duration;
    let stage = ctx.stage;
    let (camera_to, ambient_to, key_to) = {
        let sc = ctx.stage_config();
        (sc.camera_approach, sc.ambient_dimmed, sc.key_dimmed)
    };

    let mut tl = Timeline::new();
    tl.tween(
        Tween::to(stage.camera, Property::PositionZ, camera_to, d).ease(Easing::CubicInOut),
        Position::At(0.0),
    )
    .tween(
        Tween::to(stage.ambient, Property::Intensity, ambient_to, d * 0.8),
        Position::At(0.0),
    )
    .tween(
        Tween::to(stage.key, Property::Intensity, key_to, d * 0.8),
        Position::At(0.0),
    );

    for m in reactants {
        let target = ctx.rng.in_box(Vec3::splat(config.convergence_extent));
        tl.tween(
            Tween::to(m.group, Property::Position, target, d).ease(Easing::CubicInOut),
            Position::At(0.0),
        )
        .tween(
            Tween::by(m.group, Property::Rotation, SPIN, d).ease(Easing::QuadInOut),
            Position::At(0.0),
        )
        .tween(
            Tween::to(m.group, Property::Scale, Vec3::splat(BREATH), d / 4.0)
                .repeat(TweenLoop::Repeat(3))
                .yoyo(),
            Position::At(0.0),
        );
    }
    tl
}
