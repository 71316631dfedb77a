//! Step effects: gas bubbles, precipitate, solution colour change, and the
//! detonation burst.
//!
//! Every generator is fire-and-forget. It spawns pooled nodes, schedules
//! their tweens on the context's effects scheduler and returns at once; it
//! never fails, because every option it reads was already defaulted by the
//! validator.

mod burst;
mod gas;
mod precipitation;
mod rng;
mod solution;

pub use burst::{burst, ENDOTHERMIC_WAVE, EXOTHERMIC_WAVE};
pub use gas::gas_bubbles;
pub use precipitation::precipitate;
pub use rng::Rng;
pub use solution::color_change;
