// extensions/tween.rs
//
// Property tweens addressed by NodeId, plus a fire-and-forget scheduler for
// effect tweens that live outside any timeline.
//
// Usage:
//   let mut tweens = TweenState::new();
//   tweens.add(Tween::to(bubble, Property::PositionY, 10.0, 3.0).ease(Easing::Linear),
//              Completion::FadeOutThenRelease(0.5));
//   let finished = tweens.tick(dt, scene);  // nodes whose tweens asked to be released

use std::collections::BTreeMap;

use super::easing::Easing;
use crate::api::types::NodeId;
use crate::components::node::{Property, Value};
use crate::core::scene::Scene3D;

/// Where a tween ends up.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TweenTarget {
    /// Absolute end value.
    To(Value),
    /// End value relative to the captured start (`+=`).
    By(Value),
}

/// How many times a tween plays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TweenLoop {
    #[default]
    Once,
    /// Play `n` extra times after the first pass.
    Repeat(u32),
    /// Never completes. Only valid in the effects scheduler.
    Forever,
}

/// A single property animation on one node.
///
/// The start value is captured from the scene the first time the tween is
/// rendered unless one was given with [`Tween::from`].
#[derive(Debug, Clone)]
pub struct Tween {
    pub node: NodeId,
    pub property: Property,
    pub target: TweenTarget,
    /// Seconds per pass.
    pub duration: f32,
    pub easing: Easing,
    pub looping: TweenLoop,
    /// Odd passes run backwards.
    pub yoyo: bool,
    /// Seconds to wait before the first pass (effects scheduler only).
    pub delay: f32,
    from: Option<Value>,
    resolved: Option<(Value, Value)>,
}

impl Tween {
    fn new(node: NodeId, property: Property, target: TweenTarget, duration: f32) -> Self {
        Self {
            node,
            property,
            target,
            duration: duration.max(0.0),
            easing: Easing::default(),
            looping: TweenLoop::Once,
            yoyo: false,
            delay: 0.0,
            from: None,
            resolved: None,
        }
    }

    /// Animate `property` to an absolute value.
    pub fn to(node: NodeId, property: Property, value: impl Into<Value>, duration: f32) -> Self {
        Self::new(node, property, TweenTarget::To(value.into()), duration)
    }

    /// Animate `property` by a relative amount.
    pub fn by(node: NodeId, property: Property, delta: impl Into<Value>, duration: f32) -> Self {
        Self::new(node, property, TweenTarget::By(delta.into()), duration)
    }

    /// Instant write, for use at a timeline position.
    pub fn set(node: NodeId, property: Property, value: impl Into<Value>) -> Self {
        Self::to(node, property, value, 0.0).ease(Easing::Linear)
    }

    // -- Builder methods --

    pub fn from(mut self, value: impl Into<Value>) -> Self {
        self.from = Some(value.into());
        self
    }

    pub fn ease(mut self, easing: Easing) -> Self {
        self.easing = easing;
        self
    }

    pub fn repeat(mut self, looping: TweenLoop) -> Self {
        self.looping = looping;
        self
    }

    pub fn yoyo(mut self) -> Self {
        self.yoyo = true;
        self
    }

    pub fn delay(mut self, seconds: f32) -> Self {
        self.delay = seconds.max(0.0);
        self
    }

    /// Length of every pass together, excluding delay. Infinite for `Forever`.
    pub fn total_duration(&self) -> f32 {
        match self.looping {
            TweenLoop::Once => self.duration,
            TweenLoop::Repeat(n) => self.duration * (n as f32 + 1.0),
            TweenLoop::Forever => f32::INFINITY,
        }
    }

    /// Curve input at `elapsed` seconds into the tween, accounting for loops
    /// and yoyo. Past the end this is the final pass's end point.
    fn phase(&self, elapsed: f32) -> f32 {
        if self.duration <= 0.0 {
            return if self.yoyo && matches!(self.looping, TweenLoop::Repeat(n) if n % 2 == 1) {
                0.0
            } else {
                1.0
            };
        }
        let total = self.total_duration();
        let (pass, frac) = if elapsed >= total {
            let passes = (total / self.duration).round().max(1.0);
            (passes - 1.0, 1.0)
        } else {
            let pass = (elapsed / self.duration).floor();
            (pass, (elapsed - pass * self.duration) / self.duration)
        };
        if self.yoyo && pass as u64 % 2 == 1 {
            1.0 - frac
        } else {
            frac
        }
    }

    /// Write the tween's value at `elapsed` seconds into the scene.
    /// Returns true once the tween has finished.
    pub fn render(&mut self, elapsed: f32, scene: &mut dyn Scene3D) -> bool {
        let elapsed = elapsed.max(0.0);
        let (from, to) = match self.resolved {
            Some(pair) => pair,
            None => {
                let Some(node) = scene.get(self.node) else {
                    return true;
                };
                let from = self.from.unwrap_or_else(|| node.get(self.property));
                let to = match self.target {
                    TweenTarget::To(v) => v,
                    TweenTarget::By(d) => from.offset(d),
                };
                self.resolved = Some((from, to));
                (from, to)
            }
        };
        let t = self.easing.apply(self.phase(elapsed));
        scene.set(self.node, self.property, from.lerp(to, t));
        elapsed >= self.total_duration()
    }

    /// Forget the captured start so the next render captures it again.
    pub fn reset(&mut self) {
        self.resolved = None;
    }
}

/// What the scheduler does when a tween finishes.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Completion {
    #[default]
    Nothing,
    /// Report the node for release.
    Release,
    /// Fade opacity to zero over the given seconds, then release.
    FadeOutThenRelease(f32),
}

/// Handle to a scheduled tween for later reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TweenId(pub u32);

#[derive(Debug)]
struct Scheduled {
    tween: Tween,
    /// Negative while the delay runs.
    elapsed: f32,
    completion: Completion,
}

/// Fire-and-forget tweens for effects.
///
/// These run on raw frame time, independent of any timeline, and finish
/// with an optional [`Completion`]. Infinite loops stop only when their node
/// goes away: callers must call [`TweenState::remove_node`] when they release
/// a node.
#[derive(Debug, Default)]
pub struct TweenState {
    tweens: BTreeMap<TweenId, Scheduled>,
    next_id: u32,
}

impl TweenState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule a tween. Returns a handle for later control.
    pub fn add(&mut self, tween: Tween, completion: Completion) -> TweenId {
        let id = TweenId(self.next_id);
        self.next_id += 1;
        let elapsed = -tween.delay;
        self.tweens.insert(
            id,
            Scheduled {
                tween,
                elapsed,
                completion,
            },
        );
        id
    }

    pub fn remove(&mut self, id: TweenId) -> bool {
        self.tweens.remove(&id).is_some()
    }

    /// Cancel every tween on a node, including infinite loops.
    pub fn remove_node(&mut self, node: NodeId) -> usize {
        let before = self.tweens.len();
        self.tweens.retain(|_, s| s.tween.node != node);
        before - self.tweens.len()
    }

    /// Whether any tween targets `node`.
    pub fn animates(&self, node: NodeId) -> bool {
        self.tweens.values().any(|s| s.tween.node == node)
    }

    /// Advance every tween and write into the scene.
    /// Returns the nodes whose completion asked for release.
    pub fn tick(&mut self, dt: f32, scene: &mut dyn Scene3D) -> Vec<NodeId> {
        let mut finished = Vec::new();
        let mut follow_ups = Vec::new();
        let mut release = Vec::new();

        for (&id, scheduled) in self.tweens.iter_mut() {
            scheduled.elapsed += dt;
            if scheduled.elapsed < 0.0 {
                continue;
            }
            if !scene.contains(scheduled.tween.node) {
                finished.push(id);
                continue;
            }
            if scheduled.tween.render(scheduled.elapsed, scene) {
                finished.push(id);
                let node = scheduled.tween.node;
                match scheduled.completion {
                    Completion::Nothing => {}
                    Completion::Release => release.push(node),
                    Completion::FadeOutThenRelease(seconds) => follow_ups.push(
                        Tween::to(node, Property::Opacity, 0.0, seconds),
                    ),
                }
            }
        }

        for id in finished {
            self.tweens.remove(&id);
        }
        for tween in follow_ups {
            self.add(tween, Completion::Release);
        }
        release.sort();
        release.dedup();
        release
    }

    pub fn len(&self) -> usize {
        self.tweens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tweens.is_empty()
    }

    pub fn clear(&mut self) {
        self.tweens.clear();
    }
}
