//! Substance → positioned molecule instance.
//!
//! Atoms sit on a small ring around the group origin (a lone atom sits on
//! the origin). Bonds are unit cylinders stretched between two atom centres;
//! double and triple bonds become parallel segments.

use glam::{EulerRot, Quat, Vec3};

use crate::components::molecule::{AtomVisual, BondVisual, MoleculeInfo, MoleculeInstance, Side};
use crate::components::node::{Node, NodeKind};
use crate::core::context::RunContext;
use crate::core::pool::ResourceCategory;
use crate::plan::document::{BondType, Substance};
use crate::plan::palette::Color;

pub const ATOM_RADIUS: f32 = 0.5;
/// Ring radius for multi-atom layouts.
pub const RING_RADIUS: f32 = ATOM_RADIUS * 1.5;
/// Bond cylinder radius.
pub const BOND_RADIUS: f32 = 0.1;
/// Out-of-plane jitter for ring atoms.
const RING_JITTER: f32 = 0.25;

/// How a new instance first appears.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Appearance {
    pub opacity: f32,
    /// Bonds start collapsed to zero scale and grow later.
    pub collapsed_bonds: bool,
}

impl Appearance {
    pub const VISIBLE: Appearance = Appearance {
        opacity: 1.0,
        collapsed_bonds: false,
    };

    /// Fully transparent with zero-length bonds, ready to fade in.
    pub const FORMING: Appearance = Appearance {
        opacity: 0.0,
        collapsed_bonds: true,
    };
}

/// Local atom positions for an `n`-atom substance.
pub fn atom_layout(n: usize, ctx: &mut RunContext) -> Vec<Vec3> {
    if n <= 1 {
        return vec![Vec3::ZERO; n];
    }
    (0..n)
        .map(|i| {
            let angle = i as f32 / n as f32 * std::f32::consts::TAU;
            Vec3::new(
                angle.cos() * RING_RADIUS,
                angle.sin() * RING_RADIUS,
                ctx.rng.centered(RING_JITTER),
            )
        })
        .collect()
}

/// Perpendicular used to fan out multi-segment bonds.
fn bond_normal(dir: Vec3) -> Vec3 {
    let perp = dir.cross(Vec3::Y);
    if perp.length_squared() < 1e-4 {
        dir.cross(Vec3::X).normalize_or_zero()
    } else {
        perp.normalize()
    }
}

fn segment_spacing(bond_type: BondType) -> f32 {
    match bond_type {
        BondType::Single => 0.0,
        BondType::Double => 0.05,
        BondType::Triple => 0.07,
    }
}

/// Build one instance of `substance` at `position` and register it with
/// the pool (category `Molecule`) and the run's molecule table.
///
/// Bonds whose indices fall outside the atom list are skipped with a
/// warning; the rest of the molecule is still built.
pub fn build_molecule(
    ctx: &mut RunContext,
    substance: &Substance,
    side: Side,
    position: Vec3,
    appearance: Appearance,
) -> MoleculeInstance {
    let group = ctx.next_id();
    ctx.scene
        .insert(Node::new(group, NodeKind::Group).with_position(position));

    let layout = atom_layout(substance.atoms.len(), ctx);
    let mut atoms = Vec::with_capacity(substance.atoms.len());
    for (atom, local) in substance.atoms.iter().zip(&layout) {
        let id = ctx.next_id();
        ctx.scene.insert(
            Node::new(id, NodeKind::Atom)
                .with_parent(group)
                .with_tag(atom.symbol.clone())
                .with_position(*local)
                .with_uniform_scale(ATOM_RADIUS)
                .with_color(atom.color)
                .with_opacity(appearance.opacity),
        );
        atoms.push(AtomVisual {
            node: id,
            symbol: atom.symbol.clone(),
        });
    }

    let mut bonds = Vec::with_capacity(substance.bonds.len());
    for bond in &substance.bonds {
        let (Some(a), Some(b)) = (layout.get(bond.atom1_index), layout.get(bond.atom2_index))
        else {
            log::warn!(
                "builder: {} bond {}-{} is out of range, skipped",
                substance.molecule,
                bond.atom1_index,
                bond.atom2_index
            );
            continue;
        };
        let delta = *b - *a;
        let length = delta.length();
        if length < 1e-6 {
            log::warn!("builder: {} has a zero-length bond, skipped", substance.molecule);
            continue;
        }
        let dir = delta / length;
        let mid = (*a + *b) * 0.5;
        let normal = bond_normal(dir);
        let (rx, ry, rz) = Quat::from_rotation_arc(Vec3::Y, dir).to_euler(EulerRot::XYZ);
        let full = Vec3::new(BOND_RADIUS, length, BOND_RADIUS);

        let count = bond.bond_type.segments();
        let spacing = segment_spacing(bond.bond_type);
        let mut segments = Vec::with_capacity(count);
        for s in 0..count {
            let shift = (s as f32 - (count as f32 - 1.0) / 2.0) * spacing;
            let id = ctx.next_id();
            ctx.scene.insert(
                Node::new(id, NodeKind::Bond)
                    .with_parent(group)
                    .with_position(mid + normal * shift)
                    .with_rotation(Vec3::new(rx, ry, rz))
                    .with_scale(if appearance.collapsed_bonds {
                        Vec3::ZERO
                    } else {
                        full
                    })
                    .with_color(Color::BOND)
                    .with_opacity(appearance.opacity),
            );
            segments.push((id, full));
        }
        bonds.push(BondVisual {
            bond_type: bond.bond_type,
            segments,
        });
    }

    ctx.pool.track(group, ResourceCategory::Molecule);
    let instance = MoleculeInstance {
        group,
        side,
        atoms,
        bonds,
        info: MoleculeInfo::of(substance, side),
    };
    ctx.molecules.insert(group, instance.clone());
    instance
}
