//! Validated reaction plan.
//!
//! These types only ever come out of [`validate`](super::validate::validate):
//! every optional field has been defaulted, every bond index is in range,
//! every step has been decoded into its own variant. Serialising a plan and
//! validating it again yields the same plan.

use glam::Vec3;
use serde::{Serialize, Serializer};

use super::palette::Color;

/// A complete, validated animation script.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReactionPlan {
    pub title: String,
    pub is_exothermic: bool,
    pub reactants: Vec<Substance>,
    pub products: Vec<Substance>,
    pub animation_steps: Vec<AnimationStep>,
}

impl ReactionPlan {
    /// Every element symbol used by reactants and products, deduplicated,
    /// in first-seen order.
    pub fn element_symbols(&self) -> Vec<&str> {
        let mut symbols: Vec<&str> = Vec::new();
        for atom in self
            .reactants
            .iter()
            .chain(self.products.iter())
            .flat_map(|s| s.atoms.iter())
        {
            if !symbols.contains(&atom.symbol.as_str()) {
                symbols.push(atom.symbol.as_str());
            }
        }
        symbols
    }
}

/// A reactant or product species definition.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Substance {
    /// Formula, e.g. `H2O`.
    pub molecule: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Instance multiplier, always >= 1.
    pub count: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub molecular_weight: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub physical_state: Option<PhysicalState>,
    /// Never empty.
    pub atoms: Vec<Atom>,
    /// Every index is in range and the two ends differ.
    pub bonds: Vec<Bond>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Atom {
    pub symbol: String,
    pub color: Color,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Bond {
    pub atom1_index: usize,
    pub atom2_index: usize,
    pub bond_type: BondType,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BondType {
    #[default]
    Single,
    Double,
    Triple,
}

impl BondType {
    pub fn parse(text: &str) -> Option<Self> {
        match text.trim().to_ascii_lowercase().as_str() {
            "single" => Some(BondType::Single),
            "double" => Some(BondType::Double),
            "triple" => Some(BondType::Triple),
            _ => None,
        }
    }

    /// Number of parallel cylinders drawn for this bond.
    pub fn segments(self) -> usize {
        match self {
            BondType::Single => 1,
            BondType::Double => 2,
            BondType::Triple => 3,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PhysicalState {
    Gas,
    Liquid,
    Solid,
    Aqueous,
}

impl PhysicalState {
    pub fn parse(text: &str) -> Option<Self> {
        match text.trim().to_ascii_lowercase().as_str() {
            "gas" => Some(PhysicalState::Gas),
            "liquid" => Some(PhysicalState::Liquid),
            "solid" => Some(PhysicalState::Solid),
            "aqueous" => Some(PhysicalState::Aqueous),
            _ => None,
        }
    }

    /// Human-readable label for tooltips.
    pub fn label(self) -> &'static str {
        match self {
            PhysicalState::Gas => "Gas",
            PhysicalState::Liquid => "Liquid",
            PhysicalState::Solid => "Solid",
            PhysicalState::Aqueous => "Aqueous solution",
        }
    }
}

/// One entry of the ordered animation script.
#[derive(Debug, Clone, PartialEq)]
pub struct AnimationStep {
    /// Short caption. Defaults to `Step N`.
    pub text: String,
    /// Longer explanation for explanation mode. Defaults to `text`.
    pub explanation: String,
    pub action: StepAction,
}

/// What a step does. Unknown step types are kept (as no-ops) so that step
/// numbering matches the plan the provider produced.
#[derive(Debug, Clone, PartialEq)]
pub enum StepAction {
    MoveToCenter,
    Rearrange,
    GasEvolution(GasOptions),
    Precipitation(PrecipitationOptions),
    ColorChange(ColorChangeOptions),
    Unknown { kind: String },
}

impl StepAction {
    /// The wire `type` tag.
    pub fn kind(&self) -> &str {
        match self {
            StepAction::MoveToCenter => "move_to_center",
            StepAction::Rearrange => "rearrange",
            StepAction::GasEvolution(_) => "gas_evolution",
            StepAction::Precipitation(_) => "precipitation",
            StepAction::ColorChange(_) => "color_change",
            StepAction::Unknown { kind } => kind,
        }
    }
}

/// A point in scene space as it appears in the document.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Point3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Point3 {
    pub fn to_vec3(self) -> Vec3 {
        Vec3::new(self.x, self.y, self.z)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GasOptions {
    pub gas_color: Color,
    pub bubble_count: u32,
    pub bubble_size: f32,
    pub origin_point: Point3,
}

impl Default for GasOptions {
    fn default() -> Self {
        Self {
            gas_color: Color([0xAD, 0xD8, 0xE6]),
            bubble_count: 30,
            bubble_size: 0.1,
            origin_point: Point3 { x: 0.0, y: -5.0, z: 0.0 },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Density {
    Light,
    #[default]
    Medium,
    Heavy,
}

impl Density {
    pub fn parse(text: &str) -> Option<Self> {
        match text.trim().to_ascii_lowercase().as_str() {
            "light" => Some(Density::Light),
            "medium" => Some(Density::Medium),
            "heavy" => Some(Density::Heavy),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FormationArea {
    Center,
    #[default]
    Bottom,
}

impl FormationArea {
    pub fn parse(text: &str) -> Option<Self> {
        match text.trim().to_ascii_lowercase().as_str() {
            "center" => Some(FormationArea::Center),
            "bottom" => Some(FormationArea::Bottom),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PrecipitationOptions {
    pub color: Color,
    pub density: Density,
    pub formation_area: FormationArea,
}

impl Default for PrecipitationOptions {
    fn default() -> Self {
        Self {
            color: Color([0xC0, 0xC0, 0xC0]),
            density: Density::Medium,
            formation_area: FormationArea::Bottom,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColorChangeOptions {
    pub initial_color: Color,
    pub final_color: Color,
    pub initial_opacity: f32,
    pub final_opacity: f32,
    /// Seconds.
    pub duration: f32,
}

impl Default for ColorChangeOptions {
    fn default() -> Self {
        Self {
            initial_color: Color::BLACK,
            final_color: Color([0x87, 0xCE, 0xEB]),
            initial_opacity: 0.0,
            final_opacity: 0.5,
            duration: 2.0,
        }
    }
}

#[derive(Serialize)]
struct StepWire<'a> {
    #[serde(rename = "type")]
    kind: &'a str,
    text: &'a str,
    explanation: &'a str,
    #[serde(flatten)]
    gas: Option<&'a GasOptions>,
    #[serde(flatten)]
    precipitation: Option<&'a PrecipitationOptions>,
    #[serde(flatten)]
    color_change: Option<&'a ColorChangeOptions>,
}

impl Serialize for AnimationStep {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let (gas, precipitation, color_change) = match &self.action {
            StepAction::GasEvolution(o) => (Some(o), None, None),
            StepAction::Precipitation(o) => (None, Some(o), None),
            StepAction::ColorChange(o) => (None, None, Some(o)),
            _ => (None, None, None),
        };
        StepWire {
            kind: self.action.kind(),
            text: &self.text,
            explanation: &self.explanation,
            gas,
            precipitation,
            color_change,
        }
        .serialize(serializer)
    }
}
