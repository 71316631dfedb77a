pub mod api;
pub mod bridge;
pub mod components;
pub mod core;
pub mod error;
pub mod extensions;
pub mod input;
pub mod plan;
pub mod renderer;
pub mod systems;

// Re-export key types at crate root for convenience
pub use api::config::{ChoreographyConfig, EffectConfig, StageConfig, VisualizerConfig};
pub use api::provider::{ProviderError, ReactionPlanProvider};
pub use api::types::{ErrorKind, NodeId, PlaybackState, ReactionEvent};
pub use api::visualizer::Visualizer;
pub use bridge::protocol::{FrameHeader, ProtocolLayout};
pub use components::molecule::{MoleculeInfo, MoleculeInstance, Side};
pub use components::node::{Node, NodeKind, Property, Value};
pub use core::context::RunContext;
pub use core::pool::{ResourceCategory, ResourcePool};
pub use core::scene::{Scene, Scene3D};
pub use error::{FormatError, ReactionError, ValidationError};
pub use input::queue::{CommandQueue, TransportCommand};
pub use plan::{parse_plan, LegendEntry, ReactionPlan};
pub use renderer::instance::{RenderBuffer, RenderInstance};
pub use systems::transport::TransportController;

// Animation machinery
pub use extensions::{Easing, Playhead, Position, Timeline, Tween, TweenLoop, TweenState};
