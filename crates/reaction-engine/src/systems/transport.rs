//! Play, pause, seek, speed, restart and the explanation gate, applied
//! uniformly to the whole composed timeline.
//!
//! The controller owns the playhead and the plan it was composed from.
//! Forward seeks fast-forward the playhead; backward seeks rebuild the run
//! from the same seed and fast-forward to the target, so a scrub never
//! leaves a stray node behind and lands exactly where playing would.

use crate::api::config::{ChoreographyConfig, EffectConfig};
use crate::api::types::{PlaybackState, ReactionEvent};
use crate::core::context::RunContext;
use crate::core::scene::Scene3D;
use crate::extensions::playhead::{Halt, Playhead, TimelineHost};
use crate::plan::document::ReactionPlan;
use crate::systems::choreography::{apply_cue, compose, Cue};
use crate::systems::effects::Rng;

/// Fastest playback rate accepted.
pub const MAX_SPEED: f32 = 8.0;

/// The run as seen by the playhead while it plays.
struct RunHost<'a> {
    ctx: &'a mut RunContext,
    plan: &'a ReactionPlan,
    effects: &'a EffectConfig,
    explanation: bool,
    seeking: bool,
    /// Last gate that fired.
    gate: Option<usize>,
}

impl TimelineHost<Cue> for RunHost<'_> {
    fn scene(&mut self) -> &mut dyn Scene3D {
        self.ctx.scene.as_mut()
    }

    fn blocks(&self, cue: &Cue) -> bool {
        self.explanation && !self.seeking && matches!(cue, Cue::Gate { .. })
    }

    fn fire(&mut self, cue: &Cue) {
        let Cue::Gate { step } = cue else {
            apply_cue(cue, self.ctx, self.effects);
            return;
        };
        self.gate = Some(*step);
        if self.seeking {
            return;
        }
        let number = step + 1;
        let (text, explanation) = self
            .plan
            .animation_steps
            .get(*step)
            .map(|s| (s.text.clone(), s.explanation.clone()))
            .unwrap_or_default();
        if self.explanation {
            self.ctx.emit(ReactionEvent::Explanation {
                number,
                title: text,
                explanation,
            });
        } else {
            self.ctx.emit(ReactionEvent::StepNotice { number, text });
        }
    }
}

pub struct TransportController {
    state: PlaybackState,
    playhead: Option<Playhead<Cue>>,
    plan: Option<ReactionPlan>,
    /// Seed the current run was composed with.
    seed: u64,
    speed: f32,
    explanation_mode: bool,
    choreography: ChoreographyConfig,
    effects: EffectConfig,
}

impl TransportController {
    pub fn new(choreography: ChoreographyConfig, effects: EffectConfig) -> Self {
        Self {
            state: PlaybackState::Idle,
            playhead: None,
            plan: None,
            seed: 0,
            speed: 1.0,
            explanation_mode: false,
            choreography,
            effects,
        }
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn speed(&self) -> f32 {
        self.speed
    }

    pub fn explanation_mode(&self) -> bool {
        self.explanation_mode
    }

    pub fn plan(&self) -> Option<&ReactionPlan> {
        self.plan.as_ref()
    }

    /// Seconds into the run.
    pub fn time(&self) -> f32 {
        self.playhead.as_ref().map_or(0.0, |p| p.time())
    }

    pub fn duration(&self) -> f32 {
        self.playhead.as_ref().map_or(0.0, |p| p.duration())
    }

    /// Global progress in [0, 1]. An empty run reads 0 until it completes.
    pub fn progress(&self) -> f32 {
        match (self.state, &self.playhead) {
            (PlaybackState::Idle, _) | (_, None) => 0.0,
            (PlaybackState::Completed, _) => 1.0,
            (_, Some(p)) if p.duration() <= 0.0 => 0.0,
            (_, Some(p)) => p.progress(),
        }
    }

    fn set_state(&mut self, state: PlaybackState, ctx: &mut RunContext) {
        if self.state != state {
            log::debug!("transport: {:?} -> {:?}", self.state, state);
            self.state = state;
            ctx.emit(ReactionEvent::StateChanged { state });
        }
    }

    fn kill(&mut self) {
        if let Some(playhead) = self.playhead.as_mut() {
            playhead.kill();
        }
        self.playhead = None;
    }

    /// Clear the scene and compose `plan` from `seed`. The old playhead is
    /// killed before anything is released.
    fn rebuild(&mut self, plan: ReactionPlan, seed: u64, ctx: &mut RunContext) {
        self.kill();
        ctx.release_all();
        ctx.reset_stage();
        ctx.reseed(seed);

        let timeline = compose(&plan, ctx, &self.choreography);
        let mut playhead = Playhead::compile(timeline);
        playhead.set_time_scale(self.speed);
        self.playhead = Some(playhead);
        self.plan = Some(plan);
        self.seed = seed;
    }

    /// Start a new run of `plan`. Any previous run is stopped and released first.
    pub fn start(&mut self, plan: ReactionPlan, seed: u64, ctx: &mut RunContext) {
        let title = plan.title.clone();
        self.rebuild(plan, seed, ctx);
        ctx.set_field_visible(false);
        ctx.emit(ReactionEvent::RunStarted { title });
        self.set_state(PlaybackState::Running, ctx);
    }

    /// Abort the current run and return to idle.
    pub fn stop(&mut self, ctx: &mut RunContext) {
        self.kill();
        self.plan = None;
        ctx.release_all();
        ctx.reset_stage();
        ctx.set_field_visible(true);
        self.set_state(PlaybackState::Idle, ctx);
    }

    /// Fresh run of the same plan with a new seed.
    pub fn restart(&mut self, ctx: &mut RunContext) {
        let Some(plan) = self.plan.clone() else {
            return;
        };
        let seed = Rng::new(self.seed ^ 0x9E37_79B9_7F4A_7C15).next_u64();
        self.start(plan, seed, ctx);
    }

    pub fn play(&mut self, ctx: &mut RunContext) {
        if self.state == PlaybackState::Paused {
            self.set_state(PlaybackState::Running, ctx);
        }
    }

    pub fn pause(&mut self, ctx: &mut RunContext) {
        if self.state == PlaybackState::Running {
            self.set_state(PlaybackState::Paused, ctx);
        }
    }

    /// Leave an explanation gate and keep playing.
    pub fn continue_explanation(&mut self, ctx: &mut RunContext) {
        if matches!(self.state, PlaybackState::ExplainingPaused { .. }) {
            self.set_state(PlaybackState::Running, ctx);
        }
    }

    /// Scale the playback rate of the whole run. Takes effect immediately.
    pub fn set_speed(&mut self, speed: f32) {
        if !speed.is_finite() || speed <= 0.0 {
            log::warn!("transport: ignoring speed {}", speed);
            return;
        }
        self.speed = speed.min(MAX_SPEED);
        if let Some(playhead) = self.playhead.as_mut() {
            playhead.set_time_scale(self.speed);
        }
    }

    pub fn set_explanation_mode(&mut self, enabled: bool, ctx: &mut RunContext) {
        let was = self.explanation_mode;
        self.explanation_mode = enabled;
        match self.state {
            PlaybackState::Completed if enabled && !was => self.restart(ctx),
            PlaybackState::ExplainingPaused { .. } if !enabled => {
                self.set_state(PlaybackState::Running, ctx)
            }
            _ => {}
        }
    }

    /// Jump to global progress `progress` and pause. Overrides an
    /// explanation gate without continuing it.
    pub fn seek(&mut self, progress: f32, ctx: &mut RunContext) {
        if matches!(self.state, PlaybackState::Idle | PlaybackState::Completed) {
            return;
        }
        let (Some(playhead), Some(plan)) = (self.playhead.as_ref(), self.plan.as_ref()) else {
            return;
        };
        let progress = if progress.is_finite() {
            progress.clamp(0.0, 1.0)
        } else {
            0.0
        };
        let target = progress * playhead.duration();

        if target < playhead.time() {
            let plan = plan.clone();
            self.rebuild(plan, self.seed, ctx);
            ctx.set_field_visible(false);
        }
        self.fast_forward(target, ctx);
        self.set_state(PlaybackState::Paused, ctx);
    }

    fn fast_forward(&mut self, target: f32, ctx: &mut RunContext) {
        let (Some(playhead), Some(plan)) = (self.playhead.as_mut(), self.plan.as_ref()) else {
            return;
        };
        let mut host = RunHost {
            ctx,
            plan,
            effects: &self.effects,
            explanation: self.explanation_mode,
            seeking: true,
            gate: None,
        };
        playhead.fast_forward(target, &mut host);
    }

    /// Advance by `dt × speed` while running. Returns the current progress.
    pub fn tick(&mut self, dt: f32, ctx: &mut RunContext) -> f32 {
        if self.state != PlaybackState::Running {
            return self.progress();
        }
        let (Some(playhead), Some(plan)) = (self.playhead.as_mut(), self.plan.as_ref()) else {
            return self.progress();
        };
        let mut host = RunHost {
            ctx: &mut *ctx,
            plan,
            effects: &self.effects,
            explanation: self.explanation_mode,
            seeking: false,
            gate: None,
        };
        let halt = playhead.advance(dt, &mut host);
        let gate = host.gate;

        match halt {
            Halt::Gate => {
                let step = gate.unwrap_or_default();
                self.set_state(PlaybackState::ExplainingPaused { step }, ctx);
            }
            Halt::End => {
                ctx.set_field_visible(true);
                ctx.emit(ReactionEvent::Completed);
                self.set_state(PlaybackState::Completed, ctx);
            }
            Halt::None => {}
        }
        self.progress()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::config::StageConfig;
    use crate::core::pool::ResourceCategory;
    use crate::plan::parse_plan;

    const DT: f32 = 1.0 / 60.0;

    const PLAN: &str = r##"{
        "title": "Water formation",
        "isExothermic": true,
        "reactants": [
            {"molecule": "H2", "count": 2,
             "atoms": [{"symbol": "H", "color": "#FFFFFF"}, {"symbol": "H", "color": "#FFFFFF"}],
             "bonds": [{"atom1Index": 0, "atom2Index": 1, "bondType": "single"}]},
            {"molecule": "O2", "count": 1,
             "atoms": [{"symbol": "O", "color": "#FF0000"}, {"symbol": "O", "color": "#FF0000"}],
             "bonds": [{"atom1Index": 0, "atom2Index": 1, "bondType": "double"}]}
        ],
        "products": [
            {"molecule": "H2O", "count": 2,
             "atoms": [{"symbol": "O", "color": "#FF0000"}, {"symbol": "H", "color": "#FFFFFF"}, {"symbol": "H", "color": "#FFFFFF"}],
             "bonds": [{"atom1Index": 0, "atom2Index": 1, "bondType": "single"},
                       {"atom1Index": 0, "atom2Index": 2, "bondType": "single"}]}
        ],
        "animationSteps": [
            {"type": "move_to_center", "text": "Approach", "explanation": "Molecules collide."},
            {"type": "rearrange", "text": "Rearrange", "explanation": "Bonds break and reform."},
            {"type": "gas_evolution", "text": "Steam"}
        ]
    }"##;

    fn setup() -> (TransportController, RunContext) {
        let transport = TransportController::new(ChoreographyConfig::default(), EffectConfig::default());
        let ctx = RunContext::new(&StageConfig::default(), 1);
        (transport, ctx)
    }

    fn started() -> (TransportController, RunContext) {
        let (mut t, mut ctx) = setup();
        t.start(parse_plan(PLAN).unwrap(), 77, &mut ctx);
        (t, ctx)
    }

    fn frame(t: &mut TransportController, ctx: &mut RunContext) -> f32 {
        let p = t.tick(DT, ctx);
        ctx.tick_stage(DT);
        p
    }

    /// Frames until completion, or None if it never completes.
    fn run_to_end(t: &mut TransportController, ctx: &mut RunContext) -> Option<usize> {
        (1..=5000).find(|_| {
            frame(t, ctx);
            t.state() == PlaybackState::Completed
        })
    }

    #[test]
    fn start_hides_field_and_announces() {
        let (t, mut ctx) = started();
        assert_eq!(t.state(), PlaybackState::Running);
        assert!(!ctx.field_visible());
        let events = ctx.drain_events();
        assert_eq!(
            events[0],
            ReactionEvent::RunStarted {
                title: "Water formation".into()
            }
        );
        assert!(events.contains(&ReactionEvent::StateChanged {
            state: PlaybackState::Running
        }));
    }

    #[test]
    fn restarts_never_accumulate_resources() {
        let (mut t, mut ctx) = started();
        let fresh = ctx.pool.len();
        assert!(fresh > 0);
        for round in 0..5 {
            for _ in 0..(round * 70) {
                frame(&mut t, &mut ctx);
            }
            t.restart(&mut ctx);
            assert_eq!(ctx.pool.len(), fresh);
            assert_eq!(ctx.pool.count(ResourceCategory::GasBubble), 0);
        }
        ctx.release_all();
        assert_eq!(ctx.pool.len(), 0);
        assert_eq!(ctx.release_all(), 0);
    }

    #[test]
    fn progress_is_monotonic_while_running() {
        let (mut t, mut ctx) = started();
        let mut last = t.progress();
        while t.state() == PlaybackState::Running {
            let p = frame(&mut t, &mut ctx);
            assert!((0.0..=1.0).contains(&p));
            assert!(p >= last, "{} < {}", p, last);
            last = p;
        }
        assert_eq!(t.state(), PlaybackState::Completed);
        assert_eq!(t.progress(), 1.0);
    }

    #[test]
    fn double_speed_halves_the_run() {
        let (mut t, mut ctx) = started();
        let normal = run_to_end(&mut t, &mut ctx).unwrap();

        let (mut t, mut ctx) = started();
        t.set_speed(2.0);
        let fast = run_to_end(&mut t, &mut ctx).unwrap();
        let ratio = fast as f32 / normal as f32;
        assert!((ratio - 0.5).abs() < 0.02, "ratio {}", ratio);
    }

    #[test]
    fn explanation_gates_fire_once_per_step_in_order() {
        let (mut t, mut ctx) = setup();
        t.set_explanation_mode(true, &mut ctx);
        t.start(parse_plan(PLAN).unwrap(), 77, &mut ctx);

        let mut gates = Vec::new();
        for _ in 0..5000 {
            frame(&mut t, &mut ctx);
            if let PlaybackState::ExplainingPaused { step } = t.state() {
                gates.push(step);
                // Held at the gate no matter how long we wait.
                let held = t.time();
                for _ in 0..120 {
                    frame(&mut t, &mut ctx);
                }
                assert_eq!(t.time(), held);
                assert_eq!(t.state(), PlaybackState::ExplainingPaused { step });
                t.continue_explanation(&mut ctx);
            }
            if t.state() == PlaybackState::Completed {
                break;
            }
        }
        assert_eq!(gates, vec![0, 1, 2]);
        let explanations: Vec<_> = ctx
            .drain_events()
            .into_iter()
            .filter_map(|e| match e {
                ReactionEvent::Explanation { number, .. } => Some(number),
                _ => None,
            })
            .collect();
        assert_eq!(explanations, vec![1, 2, 3]);
    }

    #[test]
    fn notices_outside_explanation_mode() {
        let (mut t, mut ctx) = started();
        run_to_end(&mut t, &mut ctx).unwrap();
        let events = ctx.drain_events();
        let notices: Vec<_> = events
            .iter()
            .filter_map(|e| match e {
                ReactionEvent::StepNotice { number, text } => Some((*number, text.as_str())),
                _ => None,
            })
            .collect();
        assert_eq!(notices, vec![(1, "Approach"), (2, "Rearrange"), (3, "Steam")]);
        assert!(events.contains(&ReactionEvent::Completed));
        assert!(ctx.field_visible());
    }

    #[test]
    fn play_and_pause_are_idempotent() {
        let (mut t, mut ctx) = started();
        t.play(&mut ctx);
        assert_eq!(t.state(), PlaybackState::Running);
        t.pause(&mut ctx);
        t.pause(&mut ctx);
        assert_eq!(t.state(), PlaybackState::Paused);
        let at = t.time();
        frame(&mut t, &mut ctx);
        assert_eq!(t.time(), at);
        t.play(&mut ctx);
        assert_eq!(t.state(), PlaybackState::Running);
    }

    #[test]
    fn backward_seek_matches_forward_play() {
        let (mut t, mut ctx) = started();
        for _ in 0..300 {
            frame(&mut t, &mut ctx);
        }
        let pool_before = ctx.pool.len();
        t.seek(0.1, &mut ctx);
        assert_eq!(t.state(), PlaybackState::Paused);
        assert!((t.progress() - 0.1).abs() < 1e-4);

        // A fresh run fast-forwarded to the same point has the same shape.
        let (mut u, mut fresh) = started();
        u.seek(0.1, &mut fresh);
        assert_eq!(ctx.pool.len(), fresh.pool.len());
        assert!(ctx.pool.len() <= pool_before + 10);
        assert_eq!(
            ctx.camera_position().z,
            fresh.camera_position().z
        );
    }

    #[test]
    fn seek_overrides_an_explanation_gate() {
        let (mut t, mut ctx) = setup();
        t.set_explanation_mode(true, &mut ctx);
        t.start(parse_plan(PLAN).unwrap(), 77, &mut ctx);
        while !matches!(t.state(), PlaybackState::ExplainingPaused { .. }) {
            frame(&mut t, &mut ctx);
        }
        ctx.drain_events();
        t.seek(0.9, &mut ctx);
        assert_eq!(t.state(), PlaybackState::Paused);
        // Gates crossed by a scrub stay silent.
        assert!(!ctx
            .drain_events()
            .iter()
            .any(|e| matches!(e, ReactionEvent::Explanation { .. })));
    }

    #[test]
    fn seek_and_play_are_no_ops_once_completed() {
        let (mut t, mut ctx) = started();
        run_to_end(&mut t, &mut ctx).unwrap();
        t.seek(0.2, &mut ctx);
        t.play(&mut ctx);
        assert_eq!(t.state(), PlaybackState::Completed);
        assert_eq!(t.progress(), 1.0);
    }

    #[test]
    fn explanation_mode_on_after_completion_restarts() {
        let (mut t, mut ctx) = started();
        run_to_end(&mut t, &mut ctx).unwrap();
        t.set_explanation_mode(true, &mut ctx);
        assert_eq!(t.state(), PlaybackState::Running);
        assert_eq!(t.progress(), 0.0);
    }

    #[test]
    fn explanation_mode_off_resumes() {
        let (mut t, mut ctx) = setup();
        t.set_explanation_mode(true, &mut ctx);
        t.start(parse_plan(PLAN).unwrap(), 77, &mut ctx);
        while !matches!(t.state(), PlaybackState::ExplainingPaused { .. }) {
            frame(&mut t, &mut ctx);
        }
        t.set_explanation_mode(false, &mut ctx);
        assert_eq!(t.state(), PlaybackState::Running);
        assert_eq!(run_to_end(&mut t, &mut ctx).map(|_| t.state()), Some(PlaybackState::Completed));
    }

    #[test]
    fn speed_is_validated_and_clamped() {
        let (mut t, _) = setup();
        t.set_speed(-1.0);
        t.set_speed(f32::NAN);
        assert_eq!(t.speed(), 1.0);
        t.set_speed(100.0);
        assert_eq!(t.speed(), MAX_SPEED);
    }

    #[test]
    fn stop_releases_everything() {
        let (mut t, mut ctx) = started();
        for _ in 0..200 {
            frame(&mut t, &mut ctx);
        }
        t.stop(&mut ctx);
        assert_eq!(t.state(), PlaybackState::Idle);
        assert!(ctx.pool.is_empty());
        assert!(ctx.field_visible());
        assert_eq!(t.progress(), 0.0);
    }
}
