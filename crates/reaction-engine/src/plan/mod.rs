//! The reaction plan: document types, extraction from provider text,
//! validation, and the element palette.

pub mod document;
pub mod extract;
pub mod palette;
pub mod validate;

pub use document::{
    AnimationStep, Atom, Bond, BondType, ColorChangeOptions, Density, FormationArea, GasOptions,
    PhysicalState, Point3, PrecipitationOptions, ReactionPlan, StepAction, Substance,
};
pub use extract::extract_document;
pub use palette::{element_color, legend, Color, LegendEntry, ELEMENT_PALETTE};
pub use validate::validate;

use crate::error::ReactionError;

/// Extract, parse and validate raw provider text in one go.
pub fn parse_plan(text: &str) -> Result<ReactionPlan, ReactionError> {
    let raw = extract_document(text)?;
    Ok(validate(&raw)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::types::ErrorKind;

    const WRAPPED: &str = r##"Here is your animation script:

```json
{
  "title": "Fe + S -> FeS",
  "isExothermic": true,
  "reactants": [
    {"molecule": "Fe", "count": 1, "atoms": [{"symbol": "Fe", "color": "#A19D94"}], "bonds": []},
    {"molecule": "S", "count": 1, "atoms": [{"symbol": "S", "color": "#FFF36B"}], "bonds": []}
  ],
  "products": [
    {"molecule": "FeS", "name": "Iron(II) sulfide", "count": 1,
     "atoms": [{"symbol": "Fe", "color": "#A19D94"}, {"symbol": "S", "color": "#FFF36B"}],
     "bonds": [{"atom1Index": 0, "atom2Index": 1, "bondType": "single"}]}
  ],
  "animationSteps": [
    {"type": "move_to_center", "text": "Reactants approach"},
    {"type": "rearrange", "text": "Reaction occurs"}
  ]
}
```

Let me know if you need anything else!"##;

    #[test]
    fn recovers_plan_wrapped_in_commentary() {
        let plan = parse_plan(WRAPPED).unwrap();
        assert_eq!(plan.title, "Fe + S -> FeS");
        assert_eq!(plan.reactants.len(), 2);
        assert_eq!(plan.products[0].name.as_deref(), Some("Iron(II) sulfide"));
        assert_eq!(plan.animation_steps.len(), 2);
    }

    #[test]
    fn format_and_structure_errors_are_distinct() {
        let format = parse_plan("no json here").unwrap_err();
        assert_eq!(format.kind(), ErrorKind::Format);

        let structure = parse_plan(r#"{"title": "x", "reactants": []}"#).unwrap_err();
        assert_eq!(structure.kind(), ErrorKind::Structure);
    }
}
