// extensions/mod.rs
//
// Animation machinery: easing curves, property tweens, timeline trees and
// the playhead that plays them. Nothing here knows about molecules.

pub mod easing;
pub mod playhead;
pub mod timeline;
pub mod tween;

pub use easing::{lerp, lerp_vec3, Easing};
pub use playhead::{Halt, Playhead, TimelineHost};
pub use timeline::{Position, Timeline};
pub use tween::{Completion, Tween, TweenId, TweenLoop, TweenState, TweenTarget};
