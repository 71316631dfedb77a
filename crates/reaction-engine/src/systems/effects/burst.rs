//! Detonation flash and shockwave.

use std::f32::consts::FRAC_PI_2;

use glam::Vec3;

use crate::api::types::NodeId;
use crate::components::node::{Node, NodeKind, Property};
use crate::core::context::RunContext;
use crate::core::pool::ResourceCategory;
use crate::extensions::easing::Easing;
use crate::extensions::tween::{Completion, Tween};
use crate::plan::palette::Color;

pub const EXOTHERMIC_WAVE: Color = Color([0xFF, 0xA5, 0x00]);
pub const ENDOTHERMIC_WAVE: Color = Color([0x87, 0xCE, 0xEB]);

const FLASH_SIZE: f32 = 0.2;
const FLASH_GROWTH: f32 = 20.0;
const WAVE_SIZE: f32 = 30.0;

/// One-shot core flash plus expanding shockwave ring. Both release
/// themselves when their fade ends. Returns (flash, shockwave).
pub fn burst(ctx: &mut RunContext, exothermic: bool) -> (NodeId, NodeId) {
    let flash = ctx.next_id();
    ctx.spawn(
        Node::new(flash, NodeKind::Flash)
            .with_uniform_scale(FLASH_SIZE)
            .with_color(Color::WHITE),
        ResourceCategory::Effect,
    );
    ctx.effects.add(
        Tween::to(flash, Property::Scale, Vec3::splat(FLASH_SIZE * FLASH_GROWTH), 0.4)
            .ease(Easing::CubicOut),
        Completion::Nothing,
    );
    ctx.effects.add(
        Tween::to(flash, Property::Opacity, 0.0, 0.6).ease(Easing::CubicOut),
        Completion::Release,
    );

    let wave = ctx.next_id();
    ctx.spawn(
        Node::new(wave, NodeKind::Shockwave)
            .with_rotation(Vec3::new(FRAC_PI_2, 0.0, 0.0))
            .with_color(if exothermic {
                EXOTHERMIC_WAVE
            } else {
                ENDOTHERMIC_WAVE
            })
            .with_opacity(0.7),
        ResourceCategory::Effect,
    );
    ctx.effects.add(
        Tween::to(wave, Property::Scale, Vec3::splat(WAVE_SIZE), 1.5),
        Completion::Nothing,
    );
    ctx.effects.add(
        Tween::to(wave, Property::Opacity, 0.0, 1.5),
        Completion::Release,
    );

    (flash, wave)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::config::StageConfig;

    #[test]
    fn shockwave_colour_follows_energy() {
        let mut ctx = RunContext::new(&StageConfig::default(), 4);
        let (_, hot) = burst(&mut ctx, true);
        let (_, cold) = burst(&mut ctx, false);
        assert_eq!(ctx.scene.get(hot).unwrap().color, EXOTHERMIC_WAVE.to_vec3());
        assert_eq!(ctx.scene.get(cold).unwrap().color, ENDOTHERMIC_WAVE.to_vec3());
        assert_eq!(ctx.pool.count(ResourceCategory::Effect), 4);
    }

    #[test]
    fn burst_cleans_up_after_itself() {
        let mut ctx = RunContext::new(&StageConfig::default(), 4);
        let (flash, wave) = burst(&mut ctx, true);

        ctx.tick_stage(0.7);
        assert!(!ctx.scene.contains(flash));
        assert!(ctx.scene.contains(wave));
        assert!(ctx.scene.get(wave).unwrap().scale.x > 1.0);

        ctx.tick_stage(1.0);
        assert!(!ctx.scene.contains(wave));
        assert!(ctx.pool.is_empty());
        assert!(ctx.effects.is_empty());
    }
}
