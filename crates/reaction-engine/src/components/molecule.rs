use glam::Vec3;
use serde::Serialize;

use crate::api::types::NodeId;
use crate::plan::document::{BondType, PhysicalState, Substance};

/// Which side of the equation an instance belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Reactant,
    Product,
}

/// One atom sphere of an instance.
#[derive(Debug, Clone, PartialEq)]
pub struct AtomVisual {
    pub node: NodeId,
    pub symbol: String,
}

/// One bond, drawn as 1 to 3 parallel cylinder segments.
#[derive(Debug, Clone, PartialEq)]
pub struct BondVisual {
    pub bond_type: BondType,
    /// Segment nodes with the scale each has when fully grown.
    pub segments: Vec<(NodeId, Vec3)>,
}

/// One positioned rendering of a substance.
#[derive(Debug, Clone, PartialEq)]
pub struct MoleculeInstance {
    /// Group node carrying the instance transform. Atoms and bonds are its children.
    pub group: NodeId,
    pub side: Side,
    pub atoms: Vec<AtomVisual>,
    pub bonds: Vec<BondVisual>,
    pub info: MoleculeInfo,
}

impl MoleculeInstance {
    /// Every bond segment node.
    pub fn bond_nodes(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.bonds
            .iter()
            .flat_map(|b| b.segments.iter().map(|(id, _)| *id))
    }

    pub fn atom_nodes(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.atoms.iter().map(|a| a.node)
    }
}

/// Tooltip data for an instance.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MoleculeInfo {
    pub formula: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub molecular_weight: Option<f64>,
    /// Human-readable physical state, if known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub physical_state: Option<&'static str>,
    pub side: Side,
}

impl MoleculeInfo {
    pub fn of(substance: &Substance, side: Side) -> Self {
        Self {
            formula: substance.molecule.clone(),
            name: substance.name.clone(),
            molecular_weight: substance.molecular_weight,
            physical_state: substance.physical_state.map(PhysicalState::label),
            side,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plan::document::Atom;
    use crate::plan::palette::Color;

    #[test]
    fn info_serializes_for_the_tooltip() {
        let water = Substance {
            molecule: "H2O".into(),
            name: Some("Water".into()),
            count: 1,
            molecular_weight: Some(18.015),
            physical_state: Some(PhysicalState::Liquid),
            atoms: vec![Atom {
                symbol: "O".into(),
                color: Color::WHITE,
            }],
            bonds: vec![],
        };
        let json = serde_json::to_value(MoleculeInfo::of(&water, Side::Product)).unwrap();
        assert_eq!(json["formula"], "H2O");
        assert_eq!(json["molecularWeight"], 18.015);
        assert_eq!(json["side"], "product");
        assert!(json["physicalState"].is_string());
    }
}
