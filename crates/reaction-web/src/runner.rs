use reaction_engine::bridge::protocol::HEADER_FLOATS;
use reaction_engine::{
    NodeId, ProtocolLayout, ProviderError, ReactionError, TransportCommand, Visualizer,
    VisualizerConfig,
};

/// Wires the visualizer to the browser loop.
///
/// The crate keeps one `thread_local!` VisualizerRunner and exports free
/// functions via `#[wasm_bindgen]`, which cannot export the engine types
/// directly.
pub struct VisualizerRunner {
    visualizer: Visualizer,
    layout: ProtocolLayout,
    /// Shared header, rewritten after every tick.
    header: [f32; HEADER_FLOATS],
}

impl VisualizerRunner {
    pub fn new(config: VisualizerConfig) -> Self {
        let layout = ProtocolLayout::from_config(&config);
        Self {
            visualizer: Visualizer::new(config),
            layout,
            header: [0.0; HEADER_FLOATS],
        }
    }

    /// Run one frame and refresh the header. Returns the run's progress.
    pub fn tick(&mut self, dt: f32) -> f32 {
        let progress = self.visualizer.tick(dt);
        self.visualizer
            .frame_header()
            .write(&self.layout, &mut self.header);
        progress
    }

    pub fn push_command(&mut self, command: TransportCommand) {
        self.visualizer.push_command(command);
    }

    pub fn begin_generation(&mut self, prompt: &str) -> Result<String, ReactionError> {
        self.visualizer.begin_generation(prompt)
    }

    pub fn finish_generation(&mut self, response: &str) -> Result<(), ReactionError> {
        self.visualizer.finish_generation(Ok(response.to_string()))
    }

    /// The host's request to the provider failed.
    pub fn fail_generation(&mut self, message: &str) -> Result<(), ReactionError> {
        self.visualizer
            .finish_generation(Err(ProviderError::Backend(message.to_string())))
    }

    pub fn load_plan(&mut self, text: &str) -> Result<(), ReactionError> {
        self.visualizer.load_plan_text(text)
    }

    pub fn stop(&mut self) {
        self.visualizer.stop();
    }

    // ---- JSON accessors for the UI layer ----

    pub fn drain_events_json(&mut self) -> String {
        let events = self.visualizer.drain_events();
        to_json(&events, "[]")
    }

    pub fn legend_json(&self) -> String {
        to_json(&self.visualizer.legend(), "[]")
    }

    pub fn describe_json(&self, node: u32) -> String {
        to_json(&self.visualizer.describe(NodeId(node)), "null")
    }

    // ---- Pointer accessors for shared-buffer reads ----

    pub fn header_ptr(&self) -> *const f32 {
        self.header.as_ptr()
    }

    pub fn instances_ptr(&self) -> *const f32 {
        self.visualizer.render_buffer().instances_ptr()
    }

    pub fn instance_count(&self) -> u32 {
        self.visualizer.render_buffer().instance_count()
    }

    pub fn additive_split(&self) -> u32 {
        self.visualizer.render_buffer().additive_split
    }

    pub fn progress(&self) -> f32 {
        self.visualizer.progress()
    }

    pub fn state_code(&self) -> f32 {
        self.visualizer.state().code()
    }

    // ---- Capacity accessors ----

    pub fn max_instances(&self) -> u32 {
        self.layout.max_instances as u32
    }

    pub fn buffer_total_floats(&self) -> u32 {
        self.layout.buffer_total_floats as u32
    }
}

fn to_json<T: serde::Serialize + ?Sized>(value: &T, fallback: &str) -> String {
    serde_json::to_string(value).unwrap_or_else(|e| {
        log::error!("serialize failed: {}", e);
        fallback.to_string()
    })
}
