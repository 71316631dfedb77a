//! Structural validation of untrusted reaction plans.
//!
//! Hard failures reject the whole plan. Everything else is repaired in place:
//! missing optional fields get their documented defaults, dangling bonds are
//! dropped, unknown step types become no-ops. The output is a fixed point:
//! validating a serialised plan returns the same plan.

use serde_json::{Map, Value};

use super::document::{
    AnimationStep, Atom, Bond, BondType, ColorChangeOptions, Density, FormationArea, GasOptions,
    PhysicalState, Point3, PrecipitationOptions, ReactionPlan, StepAction, Substance,
};
use super::palette::{element_color, Color};
use crate::error::ValidationError;

/// Upper bound on a substance's `count`.
pub const MAX_SUBSTANCE_COUNT: u32 = 25;
/// Upper bound on a gas step's `bubble_count`.
pub const MAX_BUBBLE_COUNT: u32 = 500;

type Object = Map<String, Value>;

/// Validate and normalise a raw document.
pub fn validate(raw: &Value) -> Result<ReactionPlan, ValidationError> {
    let obj = raw.as_object().ok_or(ValidationError::NotAnObject)?;

    let title = untrimmed_text(obj, "title")
        .map(str::to_owned)
        .ok_or(ValidationError::MissingField("title"))?;

    let reactants = array_field(obj, "reactants")?;
    let products = array_field(obj, "products")?;
    let steps = array_field(obj, "animationSteps")?;

    if reactants.is_empty() && products.is_empty() {
        return Err(ValidationError::NoSubstances);
    }

    let is_exothermic = match obj.get("isExothermic") {
        Some(Value::Bool(b)) => *b,
        _ => {
            log::warn!("plan '{}': isExothermic missing or not a boolean, assuming false", title);
            false
        }
    };

    let reactants = reactants
        .iter()
        .enumerate()
        .map(|(i, v)| substance(v, i))
        .collect::<Result<Vec<_>, _>>()?;
    let products = products
        .iter()
        .enumerate()
        .map(|(i, v)| substance(v, i))
        .collect::<Result<Vec<_>, _>>()?;

    let animation_steps = steps.iter().enumerate().map(|(i, v)| step(v, i)).collect();

    Ok(ReactionPlan {
        title,
        is_exothermic,
        reactants,
        products,
        animation_steps,
    })
}

// -- Field helpers --

fn array_field<'a>(obj: &'a Object, key: &'static str) -> Result<&'a Vec<Value>, ValidationError> {
    obj.get(key)
        .and_then(Value::as_array)
        .ok_or(ValidationError::NotAnArray(key))
}

/// A string field that is present and not blank.
fn text_field<'a>(obj: &'a Object, key: &str) -> Option<&'a str> {
    obj.get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

/// Like [`text_field`] but keeps the original whitespace.
fn untrimmed_text<'a>(obj: &'a Object, key: &str) -> Option<&'a str> {
    obj.get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.trim().is_empty())
}

fn number_field(obj: &Object, key: &str) -> Option<f64> {
    obj.get(key).and_then(Value::as_f64).filter(|n| n.is_finite())
}

fn index_field(obj: &Object, key: &str) -> Option<usize> {
    let n = number_field(obj, key)?;
    (n >= 0.0 && n.fract() == 0.0).then_some(n as usize)
}

fn color_field(obj: &Object, key: &str, default: Color, context: &str) -> Color {
    match obj.get(key) {
        None | Some(Value::Null) => default,
        Some(v) => v.as_str().and_then(Color::parse).unwrap_or_else(|| {
            log::warn!("{}: unreadable {} {:?}, using {}", context, key, v, default);
            default
        }),
    }
}

// -- Substances --

fn substance(value: &Value, index: usize) -> Result<Substance, ValidationError> {
    let obj = value.as_object().ok_or_else(|| ValidationError::InvalidSubstance {
        molecule: format!("#{}", index + 1),
        reason: "not an object",
    })?;

    let declared = text_field(obj, "molecule").map(str::to_owned);
    let label = declared.clone().unwrap_or_else(|| format!("#{}", index + 1));

    let atoms_raw = match obj.get("atoms").and_then(Value::as_array) {
        Some(a) if !a.is_empty() => a,
        _ => {
            return Err(ValidationError::InvalidSubstance {
                molecule: label,
                reason: "atoms must be a non-empty array",
            })
        }
    };
    let bonds_raw = match obj.get("bonds") {
        Some(Value::Array(b)) => b,
        _ => return Err(ValidationError::MissingBonds { molecule: label }),
    };

    let atoms = atoms_raw
        .iter()
        .map(|a| atom(a, &label))
        .collect::<Result<Vec<_>, _>>()?;

    let molecule = declared.unwrap_or_else(|| {
        let formula: String = atoms.iter().map(|a| a.symbol.as_str()).collect();
        log::warn!("substance {}: missing formula, using {}", label, formula);
        formula
    });

    let bonds = bonds_raw
        .iter()
        .filter_map(|b| bond(b, atoms.len(), &molecule))
        .collect();

    let count = match number_field(obj, "count") {
        Some(n) => {
            let rounded = n.round().max(1.0);
            if rounded > MAX_SUBSTANCE_COUNT as f64 {
                log::warn!("substance {}: count {} capped at {}", molecule, n, MAX_SUBSTANCE_COUNT);
                MAX_SUBSTANCE_COUNT
            } else {
                rounded as u32
            }
        }
        None => 1,
    };

    let physical_state = match obj.get("physicalState") {
        None | Some(Value::Null) => None,
        Some(v) => {
            let parsed = v.as_str().and_then(PhysicalState::parse);
            if parsed.is_none() {
                log::warn!("substance {}: unknown physicalState {:?}", molecule, v);
            }
            parsed
        }
    };

    Ok(Substance {
        name: text_field(obj, "name").map(str::to_owned),
        count,
        molecular_weight: number_field(obj, "molecularWeight").filter(|w| *w > 0.0),
        physical_state,
        atoms,
        bonds,
        molecule,
    })
}

fn atom(value: &Value, molecule: &str) -> Result<Atom, ValidationError> {
    let obj = value.as_object().ok_or_else(|| ValidationError::InvalidSubstance {
        molecule: molecule.to_owned(),
        reason: "atoms must be objects",
    })?;
    let symbol = match text_field(obj, "symbol") {
        Some(s) => s.to_owned(),
        None => {
            log::warn!("substance {}: atom without symbol", molecule);
            "X".to_owned()
        }
    };
    let fallback = element_color(&symbol).unwrap_or(Color::NEUTRAL);
    let color = color_field(obj, "color", fallback, molecule);
    Ok(Atom { symbol, color })
}

fn bond(value: &Value, atom_count: usize, molecule: &str) -> Option<Bond> {
    let Some(obj) = value.as_object() else {
        log::warn!("substance {}: dropping non-object bond {:?}", molecule, value);
        return None;
    };
    let a = index_field(obj, "atom1Index");
    let b = index_field(obj, "atom2Index");
    let (atom1_index, atom2_index) = match (a, b) {
        (Some(a), Some(b)) if a < atom_count && b < atom_count && a != b => (a, b),
        _ => {
            log::warn!(
                "substance {}: dropping bond {:?}-{:?} ({} atoms)",
                molecule,
                obj.get("atom1Index"),
                obj.get("atom2Index"),
                atom_count
            );
            return None;
        }
    };
    let bond_type = match obj.get("bondType") {
        None | Some(Value::Null) => BondType::Single,
        Some(v) => v.as_str().and_then(BondType::parse).unwrap_or_else(|| {
            log::warn!("substance {}: unknown bondType {:?}, drawing single", molecule, v);
            BondType::Single
        }),
    };
    Some(Bond {
        atom1_index,
        atom2_index,
        bond_type,
    })
}

// -- Steps --

fn step(value: &Value, index: usize) -> AnimationStep {
    let empty = Object::new();
    let obj = value.as_object().unwrap_or(&empty);

    let text = untrimmed_text(obj, "text")
        .map(str::to_owned)
        .unwrap_or_else(|| format!("Step {}", index + 1));
    let explanation = untrimmed_text(obj, "explanation")
        .map(str::to_owned)
        .unwrap_or_else(|| text.clone());

    let kind = obj.get("type").and_then(Value::as_str).unwrap_or_default();
    let context = format!("step {}", index + 1);
    let action = match kind.trim().to_ascii_lowercase().as_str() {
        "move_to_center" => StepAction::MoveToCenter,
        "rearrange" => StepAction::Rearrange,
        "gas_evolution" => StepAction::GasEvolution(gas_options(obj, &context)),
        "precipitation" => StepAction::Precipitation(precipitation_options(obj, &context)),
        "color_change" => StepAction::ColorChange(color_change_options(obj, &context)),
        _ => {
            log::warn!("{}: unknown step type {:?}, treating as no-op", context, kind);
            StepAction::Unknown {
                kind: kind.to_owned(),
            }
        }
    };

    AnimationStep {
        text,
        explanation,
        action,
    }
}

fn gas_options(obj: &Object, context: &str) -> GasOptions {
    let defaults = GasOptions::default();

    let bubble_count = match number_field(obj, "bubble_count").map(f64::round) {
        Some(n) if n >= 1.0 => (n as u32).min(MAX_BUBBLE_COUNT),
        Some(n) => {
            log::warn!("{}: bubble_count {} is not positive", context, n);
            defaults.bubble_count
        }
        None => defaults.bubble_count,
    };
    let bubble_size = number_field(obj, "bubble_size")
        .filter(|s| *s > 0.0)
        .map_or(defaults.bubble_size, |s| s as f32);

    let origin_point = match obj.get("origin_point") {
        None | Some(Value::Null) => defaults.origin_point,
        Some(v) => point(v).unwrap_or_else(|| {
            log::warn!("{}: discarding origin_point {:?}", context, v);
            defaults.origin_point
        }),
    };

    GasOptions {
        gas_color: color_field(obj, "gas_color", defaults.gas_color, context),
        bubble_count,
        bubble_size,
        origin_point,
    }
}

fn point(value: &Value) -> Option<Point3> {
    let obj = value.as_object()?;
    Some(Point3 {
        x: number_field(obj, "x")? as f32,
        y: number_field(obj, "y")? as f32,
        z: number_field(obj, "z")? as f32,
    })
}

fn precipitation_options(obj: &Object, context: &str) -> PrecipitationOptions {
    let defaults = PrecipitationOptions::default();
    PrecipitationOptions {
        color: color_field(obj, "color", defaults.color, context),
        density: text_field(obj, "density")
            .and_then(Density::parse)
            .unwrap_or(defaults.density),
        formation_area: text_field(obj, "formation_area")
            .and_then(FormationArea::parse)
            .unwrap_or(defaults.formation_area),
    }
}

fn color_change_options(obj: &Object, context: &str) -> ColorChangeOptions {
    let defaults = ColorChangeOptions::default();
    let opacity = |key: &str, default: f32| {
        number_field(obj, key).map_or(default, |o| (o as f32).clamp(0.0, 1.0))
    };
    ColorChangeOptions {
        initial_color: color_field(obj, "initial_color", defaults.initial_color, context),
        final_color: color_field(obj, "final_color", defaults.final_color, context),
        initial_opacity: opacity("initial_opacity", defaults.initial_opacity),
        final_opacity: opacity("final_opacity", defaults.final_opacity),
        duration: number_field(obj, "duration")
            .filter(|d| *d > 0.0)
            .map_or(defaults.duration, |d| d as f32),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    fn h2() -> Value {
        json!({
            "molecule": "H2", "count": 1,
            "atoms": [{"symbol": "H", "color": "#FFF"}, {"symbol": "H", "color": "#FFF"}],
            "bonds": [{"atom1Index": 0, "atom2Index": 1, "bondType": "single"}]
        })
    }

    fn plan_with(reactants: Value, products: Value, steps: Value) -> Value {
        json!({
            "title": "2H2 + O2 -> 2H2O",
            "isExothermic": true,
            "reactants": reactants,
            "products": products,
            "animationSteps": steps,
        })
    }

    fn minimal() -> Value {
        plan_with(
            json!([h2()]),
            json!([h2()]),
            json!([{"type": "move_to_center", "text": "Approach"}, {"type": "rearrange", "text": "React"}]),
        )
    }

    #[test]
    fn accepts_minimal_plan() {
        let plan = validate(&minimal()).unwrap();
        assert_eq!(plan.reactants.len(), 1);
        assert_eq!(plan.reactants[0].atoms[0].color, Color::WHITE);
        assert_eq!(plan.animation_steps[0].action, StepAction::MoveToCenter);
        assert_eq!(plan.animation_steps[0].explanation, "Approach");
    }

    #[test]
    fn rejects_non_object_and_missing_title() {
        assert_eq!(validate(&json!([1, 2])), Err(ValidationError::NotAnObject));
        let mut raw = minimal();
        raw["title"] = json!("   ");
        assert_eq!(validate(&raw), Err(ValidationError::MissingField("title")));
    }

    #[test]
    fn rejects_non_array_sections() {
        let mut raw = minimal();
        raw["animationSteps"] = json!({"type": "rearrange"});
        assert_eq!(validate(&raw), Err(ValidationError::NotAnArray("animationSteps")));
        let mut raw = minimal();
        raw.as_object_mut().unwrap().remove("products");
        assert_eq!(validate(&raw), Err(ValidationError::NotAnArray("products")));
    }

    #[test]
    fn rejects_plan_without_substances() {
        let raw = plan_with(json!([]), json!([]), json!([]));
        assert_eq!(validate(&raw), Err(ValidationError::NoSubstances));
    }

    #[test]
    fn rejects_substance_without_bonds_key() {
        let mut water = h2();
        water["molecule"] = json!("H2O");
        water.as_object_mut().unwrap().remove("bonds");
        let raw = plan_with(json!([h2()]), json!([water]), json!([]));
        assert_eq!(
            validate(&raw),
            Err(ValidationError::MissingBonds { molecule: "H2O".into() })
        );
    }

    #[test]
    fn accepts_monatomic_with_empty_bonds() {
        let iron = json!({"molecule": "Fe", "count": 1, "atoms": [{"symbol": "Fe"}], "bonds": []});
        let plan = validate(&plan_with(json!([iron]), json!([]), json!([]))).unwrap();
        assert!(plan.reactants[0].bonds.is_empty());
        // Missing colour falls back to the palette.
        assert_eq!(plan.reactants[0].atoms[0].color, element_color("Fe").unwrap());
    }

    #[test]
    fn drops_out_of_range_bond() {
        let mut sub = h2();
        sub["bonds"] = json!([
            {"atom1Index": 0, "atom2Index": 99, "bondType": "single"},
            {"atom1Index": 0, "atom2Index": 1, "bondType": "double"}
        ]);
        let plan = validate(&plan_with(json!([sub]), json!([]), json!([]))).unwrap();
        assert_eq!(plan.reactants[0].bonds.len(), 1);
        assert_eq!(plan.reactants[0].bonds[0].bond_type, BondType::Double);
    }

    #[test]
    fn clamps_count_to_at_least_one() {
        let mut sub = h2();
        sub["count"] = json!(0);
        let plan = validate(&plan_with(json!([sub]), json!([]), json!([]))).unwrap();
        assert_eq!(plan.reactants[0].count, 1);
    }

    #[test]
    fn gas_step_without_options_gets_defaults() {
        let raw = plan_with(json!([h2()]), json!([]), json!([{"type": "gas_evolution"}]));
        let plan = validate(&raw).unwrap();
        let step = &plan.animation_steps[0];
        assert_eq!(step.text, "Step 1");
        assert_eq!(step.explanation, "Step 1");
        assert_eq!(step.action, StepAction::GasEvolution(GasOptions::default()));
    }

    #[test]
    fn bad_origin_point_is_discarded() {
        let raw = plan_with(
            json!([h2()]),
            json!([]),
            json!([{"type": "gas_evolution", "origin_point": {"x": "left", "y": 0, "z": 0}, "bubble_count": 12}]),
        );
        let plan = validate(&raw).unwrap();
        match &plan.animation_steps[0].action {
            StepAction::GasEvolution(o) => {
                assert_eq!(o.origin_point, GasOptions::default().origin_point);
                assert_eq!(o.bubble_count, 12);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn unknown_step_type_is_kept_as_noop() {
        let raw = plan_with(json!([h2()]), json!([]), json!([{"type": "sparkle", "text": "Sparkle"}]));
        let plan = validate(&raw).unwrap();
        assert_eq!(
            plan.animation_steps[0].action,
            StepAction::Unknown { kind: "sparkle".into() }
        );
    }

    #[test]
    fn missing_exothermic_flag_defaults_to_false() {
        let mut raw = minimal();
        raw.as_object_mut().unwrap().remove("isExothermic");
        assert!(!validate(&raw).unwrap().is_exothermic);
    }

    #[test]
    fn does_not_touch_the_input() {
        let raw = minimal();
        let before = raw.clone();
        let _ = validate(&raw).unwrap();
        assert_eq!(raw, before);
    }

    fn arb_step() -> impl Strategy<Value = Value> {
        prop_oneof![
            Just(json!({"type": "move_to_center"})),
            Just(json!({"type": "rearrange", "text": "React", "explanation": ""})),
            (0u32..800, 0.0f64..2.0).prop_map(|(n, s)| json!({
                "type": "gas_evolution", "bubble_count": n, "bubble_size": s,
                "origin_point": {"x": 1.5, "y": -2, "z": 0.25}
            })),
            prop_oneof![Just("light"), Just("heavy"), Just("dense")]
                .prop_map(|d| json!({"type": "precipitation", "density": d, "color": "#abc"})),
            (-1.0f64..2.0, 0.0f64..5.0).prop_map(|(o, d)| json!({
                "type": "color_change", "final_opacity": o, "duration": d, "final_color": "not a colour"
            })),
            "[a-z_]{0,8}".prop_map(|k| json!({"type": k})),
        ]
    }

    fn arb_substance() -> impl Strategy<Value = Value> {
        (
            prop::collection::vec(prop_oneof![Just("H"), Just("O"), Just("Na"), Just("Q")], 1..5),
            prop::collection::vec((0usize..6, 0usize..6, 0u8..4), 0..5),
            -3.0f64..40.0,
        )
            .prop_map(|(symbols, bonds, count)| {
                let atoms: Vec<Value> = symbols.iter().map(|s| json!({"symbol": s})).collect();
                let bonds: Vec<Value> = bonds
                    .iter()
                    .map(|(a, b, t)| {
                        let kind = ["single", "double", "triple", "quadruple"][*t as usize];
                        json!({"atom1Index": a, "atom2Index": b, "bondType": kind})
                    })
                    .collect();
                json!({"molecule": symbols.concat(), "count": count, "atoms": atoms, "bonds": bonds})
            })
    }

    proptest! {
        #[test]
        fn normalisation_is_a_fixed_point(
            reactants in prop::collection::vec(arb_substance(), 1..3),
            products in prop::collection::vec(arb_substance(), 0..3),
            steps in prop::collection::vec(arb_step(), 0..5),
        ) {
            let raw = plan_with(json!(reactants), json!(products), json!(steps));
            let once = validate(&raw).unwrap();
            let again = validate(&serde_json::to_value(&once).unwrap()).unwrap();
            prop_assert_eq!(once, again);
        }

        #[test]
        fn bonds_key_is_required(substance in arb_substance(), drop_bonds in any::<bool>()) {
            let mut substance = substance;
            if drop_bonds {
                substance.as_object_mut().unwrap().remove("bonds");
            }
            let result = validate(&plan_with(json!([substance]), json!([]), json!([])));
            prop_assert_eq!(result.is_err(), drop_bonds);
        }
    }
}
