//! Colour change of the shared solution volume.

use crate::components::node::{Property, Value};
use crate::core::context::RunContext;
use crate::extensions::tween::{Completion, Tween};
use crate::plan::document::ColorChangeOptions;

/// Show the solution volume and tint it from the initial to the final
/// colour and opacity. The volume belongs to the stage, so nothing is
/// pooled; `release_all` puts it back to black and hidden.
pub fn color_change(ctx: &mut RunContext, options: &ColorChangeOptions) {
    let solution = ctx.stage.solution;
    ctx.effects.remove_node(solution);
    ctx.scene.set(solution, Property::Visible, Value::Flag(true));

    let duration = options.duration.max(0.0);
    ctx.effects.add(
        Tween::to(solution, Property::Color, options.final_color.to_vec3(), duration)
            .from(options.initial_color.to_vec3()),
        Completion::Nothing,
    );
    ctx.effects.add(
        Tween::to(solution, Property::Opacity, options.final_opacity, duration)
            .from(options.initial_opacity),
        Completion::Nothing,
    );
}
