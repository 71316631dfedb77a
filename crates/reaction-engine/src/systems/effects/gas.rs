//! Rising gas bubbles.

use glam::Vec3;

use super::Rng;
use crate::api::config::EffectConfig;
use crate::api::types::NodeId;
use crate::components::node::{Node, NodeKind, Property};
use crate::core::context::RunContext;
use crate::core::pool::ResourceCategory;
use crate::extensions::easing::Easing;
use crate::extensions::tween::{Completion, Tween, TweenLoop};
use crate::plan::document::GasOptions;

/// Height bubbles rise above their origin, before jitter.
const RISE: f32 = 15.0;
const FADE: f32 = 0.5;
/// Scale factor of the breathing pulse.
const PULSE: f32 = 1.3;

/// Spawn the bubbles of a `gas_evolution` step.
///
/// Each bubble drifts up with its own duration and sideways jitter, fades,
/// and releases itself. A scale pulse loops on every bubble until the bubble
/// is released. Returns the spawned nodes.
pub fn gas_bubbles(ctx: &mut RunContext, options: &GasOptions, config: &EffectConfig) -> Vec<NodeId> {
    let count = options.bubble_count.min(config.max_bubbles);
    let origin = options.origin_point.to_vec3();
    let size = options.bubble_size;

    let mut spawned = Vec::with_capacity(count as usize);
    for _ in 0..count {
        let rng: &mut Rng = &mut ctx.rng;
        let start = origin + Vec3::new(rng.centered(2.0), rng.range(0.0, 2.0), rng.centered(2.0));
        let end = Vec3::new(
            start.x + rng.centered(3.0),
            origin.y + RISE + rng.range(0.0, 5.0),
            start.z,
        );
        let rise = rng.range(3.0, 5.0);
        let pulse = rng.range(0.3, 0.5);

        let id = ctx.next_id();
        ctx.spawn(
            Node::new(id, NodeKind::Bubble)
                .with_position(start)
                .with_uniform_scale(size)
                .with_color(options.gas_color)
                .with_opacity(0.8),
            ResourceCategory::GasBubble,
        );
        ctx.effects.add(
            Tween::to(id, Property::Position, end, rise).ease(Easing::Linear),
            Completion::FadeOutThenRelease(FADE),
        );
        ctx.effects.add(
            Tween::to(id, Property::Scale, Vec3::splat(size * PULSE), pulse)
                .ease(Easing::SineInOut)
                .repeat(TweenLoop::Forever)
                .yoyo(),
            Completion::Nothing,
        );
        spawned.push(id);
    }
    log::debug!("gas: {} bubbles", spawned.len());
    spawned
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::config::StageConfig;

    fn ctx() -> RunContext {
        RunContext::new(&StageConfig::default(), 11)
    }

    #[test]
    fn defaults_spawn_thirty_self_disposing_bubbles() {
        let mut ctx = ctx();
        let bubbles = gas_bubbles(&mut ctx, &GasOptions::default(), &EffectConfig::default());
        assert_eq!(bubbles.len(), 30);
        assert_eq!(ctx.pool.count(ResourceCategory::GasBubble), 30);

        for id in &bubbles {
            let node = ctx.scene.get(*id).unwrap();
            assert!(node.visible && node.opacity > 0.0);
            assert!((node.scale.x - 0.1).abs() < 1e-6);
            assert!(node.position.y >= -5.0 && node.position.y <= -3.0);
        }

        // Longest rise is 5 s, then a 0.5 s fade.
        for _ in 0..60 {
            ctx.tick_stage(0.1);
        }
        assert_eq!(ctx.pool.count(ResourceCategory::GasBubble), 0);
        assert!(bubbles.iter().all(|id| !ctx.scene.contains(*id)));
        // No pulse survives its bubble.
        assert!(ctx.effects.is_empty());
    }

    #[test]
    fn bubble_count_is_capped() {
        let mut ctx = ctx();
        let options = GasOptions {
            bubble_count: 10_000,
            ..GasOptions::default()
        };
        let config = EffectConfig {
            max_bubbles: 50,
            ..EffectConfig::default()
        };
        assert_eq!(gas_bubbles(&mut ctx, &options, &config).len(), 50);
    }

    #[test]
    fn release_all_mid_flight_cancels_everything() {
        let mut ctx = ctx();
        gas_bubbles(&mut ctx, &GasOptions::default(), &EffectConfig::default());
        ctx.tick_stage(1.0);
        ctx.release_all();
        assert!(ctx.pool.is_empty());
        assert!(ctx.effects.is_empty());
    }
}
