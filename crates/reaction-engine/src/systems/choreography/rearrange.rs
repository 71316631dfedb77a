//! `rearrange`: detonation, supernova, reformation.
//!
//! Phase offsets scale with the step duration (4 s by default):
//! detonation at 0, supernova at 5 %, reformation 40 % after supernova.
//! Product instances are built up front, invisible, so their atom
//! positions are known while the timeline is composed.

use std::f32::consts::{FRAC_PI_2, TAU};

use glam::Vec3;

use super::atom_pool::AtomPool;
use super::Cue;
use crate::api::config::ChoreographyConfig;
use crate::components::molecule::{MoleculeInstance, Side};
use crate::components::node::{Node, NodeKind, Property};
use crate::core::context::RunContext;
use crate::core::pool::ResourceCategory;
use crate::extensions::easing::Easing;
use crate::extensions::timeline::{Position, Timeline};
use crate::extensions::tween::{Tween, TweenLoop};
use crate::plan::document::ReactionPlan;
use crate::plan::palette::Color;
use crate::systems::builder::{build_molecule, Appearance};

const DETONATION: &str = "detonation";
const SUPERNOVA: &str = "supernova";
const REFORMATION: &str = "reformation";

const SHAKE: f32 = 0.2;
const SHAKE_TIME: f32 = 0.8;
const BURST_AT: f32 = 0.15;
const BOND_FADE: f32 = 0.5;
const RING_SIZE: f32 = 8.0;
const RING_OPACITY: f32 = 0.6;
const RING_SPIN: f32 = 4.0;
const HOT: Vec3 = Vec3::new(1.0, 1.0, 0.5);
const GLOW: f32 = 0.1;
const LEFTOVER_FADE: f32 = 0.5;

fn at(label: &str, offset: f32) -> Position {
    Position::label(label, offset)
}

/// Compose the rearrange step. Consumes the reactant instances: after this
/// step they are gone from the scene.
pub fn rearrange(
    ctx: &mut RunContext,
    plan: &ReactionPlan,
    reactants: Vec<MoleculeInstance>,
    config: &ChoreographyConfig,
) -> Timeline<Cue> {
    let d = config.rearrange_duration;
    let stage = ctx.stage;
    let sc = ctx.stage_config().clone();

    let mut tl = Timeline::new();
    tl.add_label(DETONATION, Position::At(0.0))
        .add_label(SUPERNOVA, at(DETONATION, d * 0.05))
        .add_label(REFORMATION, at(SUPERNOVA, d * 0.4));

    // Detonation.
    tl.tween(
        Tween::to(stage.camera, Property::PositionZ, sc.camera_punch, d * 0.2).ease(Easing::QuartIn),
        at(DETONATION, 0.0),
    )
    .tween(
        Tween::to(stage.camera, Property::Shake, 0.0, SHAKE_TIME)
            .from(SHAKE)
            .ease(Easing::Linear),
        at(DETONATION, 0.1),
    )
    .cue(
        Cue::Burst {
            exothermic: plan.is_exothermic,
        },
        at(DETONATION, BURST_AT),
    );

    // Supernova: bonds fade, atoms break free and fly out hot.
    let mut freed = Vec::new();
    for m in &reactants {
        for bond in m.bond_nodes() {
            tl.tween(Tween::to(bond, Property::Opacity, 0.0, BOND_FADE), at(DETONATION, 0.0));
        }
        for atom in &m.atoms {
            let scatter = ctx.rng.in_box(Vec3::splat(config.burst_extent));
            tl.cue(Cue::Detach { atom: atom.node }, at(SUPERNOVA, 0.0))
                .tween(
                    Tween::to(atom.node, Property::Position, scatter, d * 0.4).ease(Easing::CubicOut),
                    at(SUPERNOVA, 0.0),
                )
                .tween(
                    Tween::to(atom.node, Property::Emissive, HOT, d * 0.4).ease(Easing::CubicIn),
                    at(SUPERNOVA, 0.0),
                );
            freed.push(atom.clone());
        }
        // Only after every atom has been detached, or the atoms go with it.
        tl.cue(Cue::Release { node: m.group }, at(DETONATION, BOND_FADE.max(d * 0.05)));
    }

    let ring = ctx.next_id();
    ctx.spawn(
        Node::new(ring, NodeKind::EnergyRing)
            .with_rotation(Vec3::new(FRAC_PI_2, 0.0, 0.0))
            .with_uniform_scale(RING_SIZE)
            .with_color(Color::WHITE)
            .with_opacity(0.0),
        ResourceCategory::Effect,
    );
    tl.tween(Tween::to(ring, Property::Opacity, RING_OPACITY, 1.0), at(SUPERNOVA, 0.0))
        .tween(Tween::by(ring, Property::RotationZ, RING_SPIN, d * 0.8), at(SUPERNOVA, 0.0))
        .tween(Tween::to(ring, Property::Opacity, 0.0, 1.0), at(SUPERNOVA, d * 0.8 - 1.0))
        .cue(Cue::Release { node: ring }, at(SUPERNOVA, d * 0.8));

    // Reformation: products fade in where freed atoms converge.
    let total = plan
        .products
        .iter()
        .fold(0u32, |sum, p| sum.saturating_add(config.instances_for(p.count)));
    let mut pool = AtomPool::new(freed);
    let mut index = 0u32;
    for product in &plan.products {
        for _ in 0..config.instances_for(product.count) {
            let f = index as f32 / total as f32;
            let angle = f * config.spiral_turns * TAU;
            let radius = config.spiral_base_radius + f * config.spiral_radius_growth;
            let position = Vec3::new(
                angle.cos() * radius,
                angle.sin() * radius,
                ctx.rng.centered(config.product_depth_jitter),
            );
            let m = build_molecule(ctx, product, Side::Product, position, Appearance::FORMING);

            for target in &m.atoms {
                let Some(source) = pool.take(&target.symbol) else {
                    continue;
                };
                let dest = ctx.scene.world_position(target.node).unwrap_or(position);
                tl.tween(
                    Tween::to(source.node, Property::Position, dest, d * 0.5).ease(Easing::QuartInOut),
                    at(REFORMATION, 0.0),
                )
                .tween(
                    Tween::to(source.node, Property::Opacity, 0.0, d * 0.5),
                    at(REFORMATION, 0.0),
                )
                .tween(
                    Tween::to(source.node, Property::Emissive, Vec3::ZERO, d * 0.5),
                    at(REFORMATION, 0.0),
                );
            }

            for atom in m.atom_nodes() {
                tl.tween(
                    Tween::to(atom, Property::Opacity, 1.0, d * 0.4),
                    at(REFORMATION, d * 0.1),
                )
                .tween(
                    Tween::to(atom, Property::Emissive, Vec3::splat(GLOW), 0.5)
                        .ease(Easing::SineInOut)
                        .repeat(TweenLoop::Repeat(3))
                        .yoyo(),
                    at(REFORMATION, d * 0.5),
                );
            }
            for bond in &m.bonds {
                for (segment, full) in &bond.segments {
                    tl.tween(
                        Tween::to(*segment, Property::Opacity, 1.0, d * 0.4),
                        at(REFORMATION, d * 0.1),
                    )
                    .tween(
                        Tween::to(*segment, Property::Scale, *full, d * 0.4).ease(Easing::BackOut),
                        at(REFORMATION, d * 0.1),
                    );
                }
            }
            index += 1;
        }
    }

    // Atoms no product asked for fade out on their own.
    for leftover in pool.into_leftovers() {
        tl.tween(
            Tween::to(leftover.node, Property::Opacity, 0.0, LEFTOVER_FADE),
            at(REFORMATION, 0.0),
        )
        .cue(Cue::Release { node: leftover.node }, at(REFORMATION, LEFTOVER_FADE));
    }
    tl.cue(
        Cue::ReleaseCategory(ResourceCategory::DetachedAtom),
        at(REFORMATION, d * 0.5),
    );

    // Stage back to rest.
    tl.tween(
        Tween::to(stage.ambient, Property::Intensity, sc.ambient_rest, d * 0.5),
        at(REFORMATION, 0.0),
    )
    .tween(
        Tween::to(stage.key, Property::Intensity, sc.key_rest, d * 0.5),
        at(REFORMATION, 0.0),
    )
    .tween(
        Tween::to(stage.camera, Property::PositionZ, sc.camera_rest, d * 0.5),
        at(REFORMATION, 0.0),
    );

    tl
}
