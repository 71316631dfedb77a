//! Reaction plan → one composed timeline.
//!
//! Composition is the only place the run's layout is decided. It seeds the
//! reactant instances, pre-builds what later steps need, and returns a
//! `Timeline<Cue>` with one segment per plan step, each followed by a gate
//! cue. Nothing moves until a playhead plays the timeline.

mod approach;
mod atom_pool;
mod rearrange;

use glam::Vec3;

pub use approach::approach;
pub use atom_pool::AtomPool;
pub use rearrange::rearrange;

use crate::api::config::{ChoreographyConfig, EffectConfig};
use crate::api::types::NodeId;
use crate::components::molecule::{MoleculeInstance, Side};
use crate::core::context::RunContext;
use crate::core::pool::ResourceCategory;
use crate::extensions::timeline::{Position, Timeline};
use crate::plan::document::{
    ColorChangeOptions, GasOptions, PrecipitationOptions, ReactionPlan, StepAction,
};
use crate::systems::builder::{build_molecule, Appearance};
use crate::systems::effects;

/// Side effect a step fires at its start.
#[derive(Debug, Clone, PartialEq)]
pub enum StepEffect {
    Gas(GasOptions),
    Precipitation(PrecipitationOptions),
    ColorChange(ColorChangeOptions),
}

/// One-shot actions placed on the timeline.
#[derive(Debug, Clone, PartialEq)]
pub enum Cue {
    /// End of step `step` (zero-based). Halts playback in explanation mode.
    Gate { step: usize },
    /// Move an atom out of its molecule to the scene root, keeping its
    /// world transform, and hand it to the detached-atom bucket.
    Detach { atom: NodeId },
    Release { node: NodeId },
    ReleaseCategory(ResourceCategory),
    /// Detonation flash and shockwave.
    Burst { exothermic: bool },
    Effect(StepEffect),
}

/// Build every reactant instance for a run.
pub fn seed_reactants(
    ctx: &mut RunContext,
    plan: &ReactionPlan,
    config: &ChoreographyConfig,
) -> Vec<MoleculeInstance> {
    let spread = Vec3::from_array(config.initial_spread);
    let mut instances = Vec::new();
    for substance in &plan.reactants {
        for j in 0..config.instances_for(substance.count) {
            let side = if j % 2 == 0 {
                -config.side_offset
            } else {
                config.side_offset
            };
            let position = ctx.rng.in_box(spread) + Vec3::new(side, 0.0, 0.0);
            instances.push(build_molecule(
                ctx,
                substance,
                Side::Reactant,
                position,
                Appearance::VISIBLE,
            ));
        }
    }
    instances
}

/// Compose the whole run: seed reactants, then one segment per step, each
/// followed by its gate.
pub fn compose(
    plan: &ReactionPlan,
    ctx: &mut RunContext,
    config: &ChoreographyConfig,
) -> Timeline<Cue> {
    let mut reactants = seed_reactants(ctx, plan, config);
    let seeded = reactants.len();

    let mut root = Timeline::new();
    for (index, step) in plan.animation_steps.iter().enumerate() {
        let segment = match &step.action {
            StepAction::MoveToCenter => approach(ctx, &reactants, config),
            StepAction::Rearrange => rearrange(ctx, plan, std::mem::take(&mut reactants), config),
            StepAction::GasEvolution(o) => effect_segment(StepEffect::Gas(o.clone())),
            StepAction::Precipitation(o) => effect_segment(StepEffect::Precipitation(o.clone())),
            StepAction::ColorChange(o) => effect_segment(StepEffect::ColorChange(o.clone())),
            StepAction::Unknown { kind } => {
                log::debug!("compose: step {} ({}) is a no-op", index + 1, kind);
                Timeline::new()
            }
        };
        root.append(segment, Position::End(0.0));
        root.cue(Cue::Gate { step: index }, Position::End(0.0));
    }

    log::info!(
        "composed '{}': {} reactant instances, {} steps, {:.2}s",
        plan.title,
        seeded,
        plan.animation_steps.len(),
        root.duration()
    );
    root
}

fn effect_segment(effect: StepEffect) -> Timeline<Cue> {
    let mut tl = Timeline::new();
    tl.cue(Cue::Effect(effect), Position::At(0.0));
    tl
}

/// Carry out a non-gate cue against the run. Gates are the transport's
/// business and do nothing here.
pub fn apply_cue(cue: &Cue, ctx: &mut RunContext, config: &EffectConfig) {
    match cue {
        Cue::Gate { .. } => {}
        Cue::Detach { atom } => {
            if ctx.scene.reparent(*atom, None) {
                ctx.pool.track(*atom, ResourceCategory::DetachedAtom);
            } else {
                log::debug!("detach: {:?} is gone", atom);
            }
        }
        Cue::Release { node } => {
            ctx.release(*node);
            ctx.molecules.remove(node);
        }
        Cue::ReleaseCategory(category) => {
            ctx.pool
                .release_category(*category, ctx.scene.as_mut(), &mut ctx.effects);
        }
        Cue::Burst { exothermic } => {
            effects::burst(ctx, *exothermic);
        }
        Cue::Effect(StepEffect::Gas(options)) => {
            effects::gas_bubbles(ctx, options, config);
        }
        Cue::Effect(StepEffect::Precipitation(options)) => {
            effects::precipitate(ctx, options, config);
        }
        Cue::Effect(StepEffect::ColorChange(options)) => {
            effects::color_change(ctx, options);
        }
    }
}
