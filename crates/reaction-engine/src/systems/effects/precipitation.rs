//! Settling precipitate particles.

use glam::Vec3;

use crate::api::config::EffectConfig;
use crate::api::types::NodeId;
use crate::components::node::{Node, NodeKind, Property};
use crate::core::context::RunContext;
use crate::core::pool::ResourceCategory;
use crate::extensions::easing::Easing;
use crate::extensions::tween::{Completion, Tween};
use crate::plan::document::{Density, FormationArea, PrecipitationOptions};

/// Particles start around this height.
const START_Y: f32 = 5.0;
/// Floor for the `bottom` formation area.
const FLOOR_Y: f32 = -5.0;
/// Width and depth of the falling column.
const SPREAD: f32 = 5.0;
const SETTLED_OPACITY: f32 = 0.8;

fn density_index(density: Density) -> usize {
    match density {
        Density::Light => 0,
        Density::Medium => 1,
        Density::Heavy => 2,
    }
}

/// Spawn the particles of a `precipitation` step.
///
/// Particles fade in, drift down to the formation area and then stay until
/// the run is released.
pub fn precipitate(
    ctx: &mut RunContext,
    options: &PrecipitationOptions,
    config: &EffectConfig,
) -> Vec<NodeId> {
    let slot = density_index(options.density);
    let count = config.precipitate_counts[slot];
    let size = config.precipitate_sizes[slot];

    let mut spawned = Vec::with_capacity(count as usize);
    for _ in 0..count {
        let rng = &mut ctx.rng;
        let start = Vec3::new(
            rng.centered(SPREAD),
            START_Y + rng.range(-2.0, 2.0),
            rng.centered(SPREAD),
        );
        let final_y = match options.formation_area {
            FormationArea::Bottom => FLOOR_Y + rng.range(-0.5, 0.5),
            FormationArea::Center => rng.range(-1.0, 1.0),
        };
        let delay = rng.range(0.0, 0.5);
        let fall = rng.range(2.0, 4.0);

        let id = ctx.next_id();
        ctx.spawn(
            Node::new(id, NodeKind::Precipitate)
                .with_position(start)
                .with_uniform_scale(size)
                .with_color(options.color)
                .with_opacity(0.0),
            ResourceCategory::PrecipitationParticle,
        );
        ctx.effects.add(
            Tween::to(id, Property::Opacity, SETTLED_OPACITY, 1.0).delay(delay),
            Completion::Nothing,
        );
        ctx.effects.add(
            Tween::to(id, Property::PositionY, final_y, fall)
                .ease(Easing::QuadInOut)
                .delay(delay),
            Completion::Nothing,
        );
        spawned.push(id);
    }
    log::debug!("precipitation: {} particles", spawned.len());
    spawned
}
