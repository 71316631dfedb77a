//! The application controller: one run context, one transport, one
//! in-flight generation at a time.
//!
//! ```ignore
//! let mut vis = Visualizer::new(VisualizerConfig::default());
//! let prompt = vis.begin_generation("H2 + O2")?;
//! // ... host sends `prompt` to its AI backend ...
//! vis.finish_generation(response)?;
//! loop {
//!     vis.tick(dt);
//!     for event in vis.drain_events() { /* update UI */ }
//! }
//! ```

use crate::api::config::VisualizerConfig;
use crate::api::provider::{ProviderError, ReactionPlanProvider};
use crate::api::types::{NodeId, PlaybackState, ReactionEvent};
use crate::bridge::protocol::FrameHeader;
use crate::components::molecule::MoleculeInfo;
use crate::core::context::RunContext;
use crate::error::ReactionError;
use crate::input::queue::{CommandQueue, TransportCommand};
use crate::plan::{legend, parse_plan, LegendEntry, ReactionPlan};
use crate::renderer::instance::RenderBuffer;
use crate::systems::render::build_render_buffer;
use crate::systems::transport::TransportController;

/// Shown when no plan is loaded.
const DEFAULT_LEGEND: [&str; 3] = ["H", "O", "C"];

pub struct Visualizer {
    config: VisualizerConfig,
    ctx: RunContext,
    transport: TransportController,
    commands: CommandQueue,
    buffer: RenderBuffer,
    generating: bool,
    runs: u64,
    frame: u32,
}

impl Visualizer {
    pub fn new(config: VisualizerConfig) -> Self {
        let ctx = RunContext::new(&config.stage, config.seed);
        let transport =
            TransportController::new(config.choreography.clone(), config.effects.clone());
        let buffer = RenderBuffer::new(config.max_instances);
        Self {
            config,
            ctx,
            transport,
            commands: CommandQueue::new(),
            buffer,
            generating: false,
            runs: 0,
            frame: 0,
        }
    }

    pub fn config(&self) -> &VisualizerConfig {
        &self.config
    }

    pub fn context(&self) -> &RunContext {
        &self.ctx
    }

    pub fn is_generating(&self) -> bool {
        self.generating
    }

    fn fail(&mut self, error: ReactionError) -> ReactionError {
        log::error!("reaction failed: {}", error);
        self.ctx.emit(ReactionEvent::Failed {
            error: error.kind(),
            message: error.to_string(),
        });
        self.ctx.set_field_visible(true);
        error
    }

    /// Accept a prompt for generation. Returns the trimmed prompt the host
    /// should send to its provider.
    pub fn begin_generation(&mut self, prompt: &str) -> Result<String, ReactionError> {
        let prompt = prompt.trim();
        if prompt.is_empty() {
            return Err(self.fail(ReactionError::EmptyPrompt));
        }
        if self.generating {
            return Err(self.fail(ReactionError::Busy));
        }
        self.generating = true;
        log::info!("generating '{}'", prompt);
        Ok(prompt.to_string())
    }

    /// Hand back the provider's answer. The current run is only replaced once
    /// the answer is a valid plan.
    pub fn finish_generation(
        &mut self,
        response: Result<String, ProviderError>,
    ) -> Result<(), ReactionError> {
        self.generating = false;
        let text = response.map_err(|e| self.fail(e.into()))?;
        self.load_plan_text(&text)
    }

    /// Generate with a blocking provider.
    pub fn generate(
        &mut self,
        provider: &mut dyn ReactionPlanProvider,
        prompt: &str,
    ) -> Result<(), ReactionError> {
        let prompt = self.begin_generation(prompt)?;
        let response = provider.generate(&prompt);
        self.finish_generation(response)
    }

    /// Parse `text` as a plan and start it.
    pub fn load_plan_text(&mut self, text: &str) -> Result<(), ReactionError> {
        let plan = parse_plan(text).map_err(|e| self.fail(e))?;
        self.start(plan);
        Ok(())
    }

    /// Start a validated plan, replacing the current run.
    pub fn start(&mut self, plan: ReactionPlan) {
        let seed = self.config.seed.wrapping_add(self.runs);
        self.runs += 1;
        self.transport.start(plan, seed, &mut self.ctx);
    }

    /// Abort the current run.
    pub fn stop(&mut self) {
        self.transport.stop(&mut self.ctx);
    }

    /// Queue a transport command for the next tick.
    pub fn push_command(&mut self, command: TransportCommand) {
        self.commands.push(command);
    }

    fn apply(&mut self, command: TransportCommand) {
        let ctx = &mut self.ctx;
        match command {
            TransportCommand::Play => self.transport.play(ctx),
            TransportCommand::Pause => self.transport.pause(ctx),
            TransportCommand::Restart => self.transport.restart(ctx),
            TransportCommand::Seek(progress) => self.transport.seek(progress, ctx),
            TransportCommand::SetSpeed(speed) => self.transport.set_speed(speed),
            TransportCommand::SetExplanationMode(on) => {
                self.transport.set_explanation_mode(on, ctx)
            }
            TransportCommand::ContinueExplanation => self.transport.continue_explanation(ctx),
        }
    }

    /// One frame: queued commands, then the run timeline, then effects,
    /// then render packing. Returns the run's progress.
    pub fn tick(&mut self, dt: f32) -> f32 {
        for command in self.commands.drain() {
            self.apply(command);
        }
        let progress = self.transport.tick(dt, &mut self.ctx);
        self.ctx.tick_stage(dt);
        build_render_buffer(self.ctx.scene.as_ref(), &mut self.buffer);
        self.frame = self.frame.wrapping_add(1);
        progress
    }

    pub fn render_buffer(&self) -> &RenderBuffer {
        &self.buffer
    }

    /// Header values for the frame just rendered.
    pub fn frame_header(&self) -> FrameHeader {
        let (ambient, key) = self.ctx.light_intensities();
        FrameHeader {
            frame: self.frame,
            instance_count: self.buffer.instance_count(),
            additive_split: self.buffer.additive_split,
            camera: self.ctx.camera_position().to_array(),
            ambient,
            key,
            progress: self.transport.progress(),
            state: self.transport.state(),
            speed: self.transport.speed(),
            explanation_mode: self.transport.explanation_mode(),
        }
    }

    pub fn state(&self) -> PlaybackState {
        self.transport.state()
    }

    pub fn progress(&self) -> f32 {
        self.transport.progress()
    }

    pub fn speed(&self) -> f32 {
        self.transport.speed()
    }

    pub fn explanation_mode(&self) -> bool {
        self.transport.explanation_mode()
    }

    pub fn plan(&self) -> Option<&ReactionPlan> {
        self.transport.plan()
    }

    /// Tooltip data for the molecule that owns `node`, if any.
    pub fn describe(&self, node: NodeId) -> Option<MoleculeInfo> {
        let mut current = Some(node);
        while let Some(id) = current {
            if let Some(m) = self.ctx.molecules.get(&id) {
                return Some(m.info.clone());
            }
            current = self.ctx.scene.get(id)?.parent;
        }
        None
    }

    /// Element legend for the loaded plan.
    pub fn legend(&self) -> Vec<LegendEntry> {
        match self.transport.plan() {
            Some(plan) => legend(plan.element_symbols()),
            None => legend(DEFAULT_LEGEND),
        }
    }

    pub fn drain_events(&mut self) -> Vec<ReactionEvent> {
        self.ctx.drain_events()
    }
}
