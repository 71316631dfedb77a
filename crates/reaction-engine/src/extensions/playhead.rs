// extensions/playhead.rs
//
// Compiled playback of a Timeline tree. The tree is flattened once into a
// schedule sorted by (start, cues before tweens, insertion order); after that
// the playhead only ever moves forward.
//
// Usage:
//   let mut playhead = Playhead::compile(timeline);
//   playhead.advance(dt, &mut host);   // host decides which cues halt playback
//   playhead.fast_forward(t, &mut host); // scrub forward, no halting

use super::timeline::{Child, Timeline};
use super::tween::Tween;
use crate::core::scene::Scene3D;

/// The world a playhead plays into.
pub trait TimelineHost<C> {
    fn scene(&mut self) -> &mut dyn Scene3D;

    /// Whether reaching this cue halts playback right after it fires.
    fn blocks(&self, cue: &C) -> bool;

    fn fire(&mut self, cue: &C);
}

/// Why an advance stopped short (or didn't).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Halt {
    /// Still playing.
    None,
    /// Stopped exactly at a blocking cue, which has fired.
    Gate,
    /// Reached the end.
    End,
}

#[derive(Debug)]
enum Slot<C> {
    Cue { cue: C, fired: bool },
    Tween { tween: Tween, done: bool },
}

#[derive(Debug)]
struct Entry<C> {
    start: f32,
    seq: usize,
    slot: Slot<C>,
}

impl<C> Entry<C> {
    fn is_cue(&self) -> bool {
        matches!(self.slot, Slot::Cue { .. })
    }
}

/// A flattened, seekable timeline.
#[derive(Debug)]
pub struct Playhead<C> {
    entries: Vec<Entry<C>>,
    time: f32,
    duration: f32,
    time_scale: f32,
    paused: bool,
    killed: bool,
}

impl<C> Default for Playhead<C> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            time: 0.0,
            duration: 0.0,
            time_scale: 1.0,
            paused: false,
            killed: false,
        }
    }
}

impl<C> Playhead<C> {
    pub fn compile(timeline: Timeline<C>) -> Self {
        let duration = timeline.duration();
        let mut entries = Vec::new();
        flatten(timeline, 0.0, &mut entries);
        entries.sort_by(|a, b| {
            a.start
                .total_cmp(&b.start)
                .then_with(|| b.is_cue().cmp(&a.is_cue()))
                .then_with(|| a.seq.cmp(&b.seq))
        });
        Self {
            entries,
            duration,
            ..Self::default()
        }
    }

    pub fn time(&self) -> f32 {
        self.time
    }

    pub fn duration(&self) -> f32 {
        self.duration
    }

    /// `time / duration`, clamped to [0, 1]. An empty timeline is at 1.
    pub fn progress(&self) -> f32 {
        if self.duration <= 0.0 {
            1.0
        } else {
            (self.time / self.duration).clamp(0.0, 1.0)
        }
    }

    pub fn is_finished(&self) -> bool {
        self.time >= self.duration
    }

    pub fn time_scale(&self) -> f32 {
        self.time_scale
    }

    pub fn set_time_scale(&mut self, scale: f32) {
        self.time_scale = scale;
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn set_paused(&mut self, paused: bool) {
        self.paused = paused;
    }

    /// Drop every scheduled entry. A killed playhead never touches the scene again.
    pub fn kill(&mut self) {
        self.entries.clear();
        self.killed = true;
    }

    pub fn is_killed(&self) -> bool {
        self.killed
    }

    /// Advance by `dt × time_scale` unless paused.
    pub fn advance(&mut self, dt: f32, host: &mut dyn TimelineHost<C>) -> Halt {
        if self.paused || self.killed {
            return self.halt_state();
        }
        let target = self.time + dt.max(0.0) * self.time_scale;
        self.advance_to(target, host, true)
    }

    /// Jump forward to `time` with no blocking cues. Cues on the way still
    /// fire. Earlier times are ignored: a playhead never runs backwards.
    pub fn fast_forward(&mut self, time: f32, host: &mut dyn TimelineHost<C>) -> Halt {
        if self.killed {
            return Halt::None;
        }
        self.advance_to(time.max(self.time), host, false)
    }

    fn halt_state(&self) -> Halt {
        if !self.killed && self.is_finished() {
            Halt::End
        } else {
            Halt::None
        }
    }

    fn advance_to(&mut self, target: f32, host: &mut dyn TimelineHost<C>, gated: bool) -> Halt {
        let mut target = target.min(self.duration);

        // First blocking cue inside the window clamps the window.
        let mut gate = None;
        if gated {
            for (i, entry) in self.entries.iter().enumerate() {
                if entry.start > target {
                    break;
                }
                if let Slot::Cue { cue, fired: false } = &entry.slot {
                    if host.blocks(cue) {
                        gate = Some(i);
                        target = entry.start;
                        break;
                    }
                }
            }
        }

        // Fire pending cues in order, bringing running tweens up to each
        // cue's time first so the cue sees the scene as it was then.
        let mut i = 0;
        while i < self.entries.len() {
            let start = self.entries[i].start;
            if start > target {
                break;
            }
            if matches!(self.entries[i].slot, Slot::Cue { fired: false, .. }) {
                self.render_until(start, i, host.scene());
                if let Slot::Cue { cue, fired } = &mut self.entries[i].slot {
                    *fired = true;
                    host.fire(cue);
                }
                if gate == Some(i) {
                    self.time = start;
                    return Halt::Gate;
                }
            }
            i += 1;
        }

        self.render_until(target, self.entries.len(), host.scene());
        self.time = target;
        if self.is_finished() {
            Halt::End
        } else {
            Halt::None
        }
    }

    /// Render every started, unfinished tween among the first `limit`
    /// entries at time `t`.
    fn render_until(&mut self, t: f32, limit: usize, scene: &mut dyn Scene3D) {
        for entry in self.entries.iter_mut().take(limit) {
            if entry.start > t {
                break;
            }
            if let Slot::Tween { tween, done } = &mut entry.slot {
                if !*done {
                    *done = tween.render(t - entry.start, scene);
                }
            }
        }
    }
}

fn flatten<C>(timeline: Timeline<C>, offset: f32, out: &mut Vec<Entry<C>>) {
    for (start, child) in timeline.children {
        let start = offset + start;
        match child {
            Child::Tween(tween) => {
                let seq = out.len();
                out.push(Entry {
                    start,
                    seq,
                    slot: Slot::Tween { tween, done: false },
                });
            }
            Child::Cue(cue) => {
                let seq = out.len();
                out.push(Entry {
                    start,
                    seq,
                    slot: Slot::Cue { cue, fired: false },
                });
            }
            Child::Nested(inner) => flatten(inner, start, out),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::types::NodeId;
    use crate::components::node::{Node, NodeKind, Property, Value};
    use crate::core::scene::Scene;
    use crate::extensions::easing::Easing;
    use crate::extensions::timeline::Position;

    #[derive(Debug, Clone, PartialEq)]
    enum TestCue {
        Gate(usize),
        Mark(&'static str),
    }

    struct Host {
        scene: Scene,
        gates: bool,
        fired: Vec<TestCue>,
        opacity_at_fire: Vec<f32>,
    }

    impl Host {
        fn new(gates: bool) -> Self {
            let mut scene = Scene::new();
            scene.insert(Node::new(NodeId(1), NodeKind::Atom));
            Self {
                scene,
                gates,
                fired: Vec::new(),
                opacity_at_fire: Vec::new(),
            }
        }

        fn opacity(&self) -> f32 {
            self.scene.get(NodeId(1)).unwrap().opacity
        }
    }

    impl TimelineHost<TestCue> for Host {
        fn scene(&mut self) -> &mut dyn Scene3D {
            &mut self.scene
        }

        fn blocks(&self, cue: &TestCue) -> bool {
            self.gates && matches!(cue, TestCue::Gate(_))
        }

        fn fire(&mut self, cue: &TestCue) {
            let o = self.opacity();
            self.opacity_at_fire.push(o);
            self.fired.push(cue.clone());
        }
    }

    fn fade(seconds: f32) -> Tween {
        Tween::to(NodeId(1), Property::Opacity, 0.0, seconds).ease(Easing::Linear)
    }

    fn two_steps() -> Timeline<TestCue> {
        let mut root = Timeline::new();
        for step in 0..2 {
            let mut segment = Timeline::new();
            segment.tween(fade(1.0).from(1.0), Position::At(0.0));
            root.append(segment, Position::End(0.0));
            root.cue(TestCue::Gate(step), Position::End(0.0));
        }
        root
    }

    #[test]
    fn gates_halt_exactly_and_in_order() {
        let mut host = Host::new(true);
        let mut playhead = Playhead::compile(two_steps());
        assert_eq!(playhead.duration(), 2.0);

        assert_eq!(playhead.advance(0.6, &mut host), Halt::None);
        assert_eq!(playhead.advance(0.6, &mut host), Halt::Gate);
        assert_eq!(playhead.time(), 1.0);
        assert_eq!(host.fired, vec![TestCue::Gate(0)]);

        // The gate has fired; the next advance moves past it.
        assert_eq!(playhead.advance(0.5, &mut host), Halt::None);
        assert_eq!(playhead.advance(5.0, &mut host), Halt::Gate);
        assert_eq!(host.fired, vec![TestCue::Gate(0), TestCue::Gate(1)]);
        assert_eq!(playhead.progress(), 1.0);
        assert_eq!(playhead.advance(0.1, &mut host), Halt::End);
    }

    #[test]
    fn fast_forward_fires_but_never_halts() {
        let mut host = Host::new(true);
        let mut playhead = Playhead::compile(two_steps());
        assert_eq!(playhead.fast_forward(2.0, &mut host), Halt::End);
        assert_eq!(host.fired.len(), 2);
        assert!(host.opacity().abs() < 1e-6);
    }

    #[test]
    fn cues_see_the_scene_at_their_own_time() {
        let mut tl = Timeline::new();
        tl.tween(fade(2.0).from(1.0), Position::At(0.0));
        tl.cue(TestCue::Mark("half"), Position::At(1.0));
        let mut host = Host::new(false);
        let mut playhead = Playhead::compile(tl);

        playhead.advance(2.0, &mut host);
        assert!((host.opacity_at_fire[0] - 0.5).abs() < 1e-5);
        assert!(host.opacity().abs() < 1e-5);
    }

    #[test]
    fn cues_fire_before_tweens_at_the_same_time() {
        let mut tl = Timeline::new();
        tl.tween(fade(1.0), Position::At(0.5));
        tl.cue(TestCue::Mark("first"), Position::At(0.5));
        let mut host = Host::new(false);
        host.scene.set(NodeId(1), Property::Opacity, Value::Scalar(0.8));
        let mut playhead = Playhead::compile(tl);

        playhead.advance(1.0, &mut host);
        assert_eq!(host.opacity_at_fire, vec![0.8]);
    }

    #[test]
    fn paused_and_scaled_time() {
        let mut host = Host::new(false);
        let mut playhead = Playhead::compile(two_steps());
        playhead.set_paused(true);
        playhead.advance(1.0, &mut host);
        assert_eq!(playhead.time(), 0.0);

        playhead.set_paused(false);
        playhead.set_time_scale(2.0);
        playhead.advance(0.25, &mut host);
        assert!((playhead.time() - 0.5).abs() < 1e-6);
    }

    #[test]
    fn killed_playhead_leaves_the_scene_alone() {
        let mut host = Host::new(false);
        let mut playhead = Playhead::compile(two_steps());
        playhead.kill();
        playhead.advance(1.0, &mut host);
        assert_eq!(host.opacity(), 1.0);
        assert!(host.fired.is_empty());
    }

    #[test]
    fn empty_timeline_is_complete_immediately() {
        let mut host = Host::new(true);
        let mut playhead: Playhead<TestCue> = Playhead::compile(Timeline::new());
        assert_eq!(playhead.progress(), 1.0);
        assert_eq!(playhead.advance(0.016, &mut host), Halt::End);
    }
}
