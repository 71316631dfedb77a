//! Everything one run owns, in one place.
//!
//! The scene, the resource pool, the effects scheduler, the run's random
//! stream and the outbound event queue all live on `RunContext`. Exactly one
//! context exists per visualizer, so "one run at a time" holds by
//! construction: starting a run means releasing this context's pool first.

use std::collections::BTreeMap;

use glam::Vec3;

use crate::api::config::StageConfig;
use crate::api::types::{NodeId, ReactionEvent};
use crate::components::molecule::MoleculeInstance;
use crate::components::node::{LightKind, Node, NodeKind, Property, Value};
use crate::core::pool::{ResourceCategory, ResourcePool};
use crate::core::scene::{Scene, Scene3D};
use crate::extensions::tween::TweenState;
use crate::plan::palette::Color;
use crate::systems::effects::Rng;

/// Background field drift, radians per second.
/// Offset between the layout seed and the camera jitter seed.
const JITTER_SALT: u64 = 7919;
const FIELD_SPIN: Vec3 = Vec3::new(0.012, 0.03, 0.0);

/// Nodes that outlive every run. They are never pooled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Stage {
    pub camera: NodeId,
    pub ambient: NodeId,
    pub key: NodeId,
    /// Group holding the background field points.
    pub field: NodeId,
    /// Shared volume tinted by colour-change steps.
    pub solution: NodeId,
}

pub struct RunContext {
    pub scene: Box<dyn Scene3D>,
    pub pool: ResourcePool,
    /// Fire-and-forget effect tweens. Raw frame time.
    pub effects: TweenState,
    /// Layout randomness for the current run.
    pub rng: Rng,
    pub stage: Stage,
    /// Molecule instances of the current run, keyed by group node.
    pub molecules: BTreeMap<NodeId, MoleculeInstance>,
    stage_config: StageConfig,
    events: Vec<ReactionEvent>,
    /// Camera jitter for this frame. Kept off the layout stream.
    jitter: Rng,
    camera_offset: Vec3,
    next_id: u32,
}

impl RunContext {
    pub fn new(config: &StageConfig, seed: u64) -> Self {
        Self::with_scene(Box::new(Scene::new()), config, seed)
    }

    /// Build the context over a host-provided scene. The stage nodes are
    /// inserted right away.
    pub fn with_scene(scene: Box<dyn Scene3D>, config: &StageConfig, seed: u64) -> Self {
        let mut ctx = Self {
            scene,
            pool: ResourcePool::new(),
            effects: TweenState::new(),
            rng: Rng::new(seed),
            stage: Stage {
                camera: NodeId(0),
                ambient: NodeId(0),
                key: NodeId(0),
                field: NodeId(0),
                solution: NodeId(0),
            },
            molecules: BTreeMap::new(),
            stage_config: config.clone(),
            events: Vec::new(),
            jitter: Rng::new(seed.wrapping_add(JITTER_SALT)),
            camera_offset: Vec3::ZERO,
            next_id: 1,
        };
        ctx.build_stage();
        ctx
    }

    fn build_stage(&mut self) {
        let camera = self.next_id();
        self.scene.insert(
            Node::new(camera, NodeKind::Camera)
                .with_position(Vec3::new(0.0, 0.0, self.stage_config.camera_rest)),
        );

        let ambient = self.next_id();
        self.scene.insert(
            Node::new(ambient, NodeKind::Light(LightKind::Ambient))
                .with_intensity(self.stage_config.ambient_rest),
        );

        let key = self.next_id();
        self.scene.insert(
            Node::new(key, NodeKind::Light(LightKind::Key))
                .with_position(Vec3::new(5.0, 10.0, 7.5))
                .with_intensity(self.stage_config.key_rest),
        );

        let field = self.next_id();
        self.scene.insert(Node::new(field, NodeKind::Group));
        let mut points = Rng::new(0x5EED_F1E1D);
        for _ in 0..self.stage_config.field_count {
            let id = self.next_id();
            self.scene.insert(
                Node::new(id, NodeKind::AmbientField)
                    .with_parent(field)
                    .with_position(points.on_sphere(self.stage_config.field_radius))
                    .with_uniform_scale(0.1)
                    .with_opacity(0.5),
            );
        }

        let solution = self.next_id();
        self.scene.insert(
            Node::new(solution, NodeKind::Solution)
                .with_uniform_scale(12.0)
                .with_color(Color::BLACK)
                .with_opacity(0.0)
                .hidden(),
        );

        self.stage = Stage {
            camera,
            ambient,
            key,
            field,
            solution,
        };
    }

    /// Generate the next unique node ID.
    pub fn next_id(&mut self) -> NodeId {
        let id = NodeId(self.next_id);
        self.next_id += 1;
        id
    }

    pub fn stage_config(&self) -> &StageConfig {
        &self.stage_config
    }

    /// Start a new random stream for the next run.
    pub fn reseed(&mut self, seed: u64) {
        self.rng = Rng::new(seed);
        self.jitter = Rng::new(seed.wrapping_add(JITTER_SALT));
    }

    /// Queue an event for the UI.
    pub fn emit(&mut self, event: ReactionEvent) {
        self.events.push(event);
    }

    pub fn drain_events(&mut self) -> Vec<ReactionEvent> {
        std::mem::take(&mut self.events)
    }

    /// Add a node the run owns and track it in the pool.
    pub fn spawn(&mut self, node: Node, category: ResourceCategory) -> NodeId {
        let id = node.id;
        self.scene.insert(node);
        self.pool.track(id, category);
        id
    }

    /// Release one pooled node (and its subtree).
    pub fn release(&mut self, id: NodeId) -> usize {
        self.pool.release(id, self.scene.as_mut(), &mut self.effects)
    }

    /// Drop everything the current run created and reset the shared
    /// solution volume. Idempotent.
    pub fn release_all(&mut self) -> usize {
        let removed = self.pool.release_all(self.scene.as_mut(), &mut self.effects);
        self.effects.clear();
        self.molecules.clear();

        let solution = self.stage.solution;
        self.scene.set(solution, Property::Color, Value::Vec3(Vec3::ZERO));
        self.scene.set(solution, Property::Opacity, Value::Scalar(0.0));
        self.scene.set(solution, Property::Visible, Value::Flag(false));
        removed
    }

    /// Put camera and lights back to their resting values.
    pub fn reset_stage(&mut self) {
        let Stage {
            camera,
            ambient,
            key,
            ..
        } = self.stage;
        let rest = self.stage_config.camera_rest;
        self.scene
            .set(camera, Property::Position, Value::Vec3(Vec3::new(0.0, 0.0, rest)));
        self.scene.set(camera, Property::Shake, Value::Scalar(0.0));
        self.scene
            .set(ambient, Property::Intensity, Value::Scalar(self.stage_config.ambient_rest));
        self.scene
            .set(key, Property::Intensity, Value::Scalar(self.stage_config.key_rest));
        self.camera_offset = Vec3::ZERO;
    }

    pub fn set_field_visible(&mut self, visible: bool) {
        self.scene
            .set(self.stage.field, Property::Visible, Value::Flag(visible));
    }

    pub fn field_visible(&self) -> bool {
        self.scene.get(self.stage.field).is_some_and(|n| n.visible)
    }

    /// Advance effect tweens on raw frame time, release whatever they
    /// finished with, refresh the camera jitter and drift the field.
    pub fn tick_stage(&mut self, dt: f32) {
        let finished = self.effects.tick(dt, self.scene.as_mut());
        for id in finished {
            self.release(id);
        }

        let shake = self
            .scene
            .get(self.stage.camera)
            .map_or(0.0, |n| n.shake);
        self.camera_offset = if shake > 0.0 {
            Vec3::new(
                self.jitter.centered(2.0) * shake,
                self.jitter.centered(2.0) * shake,
                0.0,
            )
        } else {
            Vec3::ZERO
        };

        let field = self.stage.field;
        if let Some(node) = self.scene.get_mut(field) {
            if node.visible {
                node.rotation += FIELD_SPIN * dt;
            }
        }
    }

    /// Camera position including this frame's shake.
    pub fn camera_position(&self) -> Vec3 {
        self.scene
            .get(self.stage.camera)
            .map_or(Vec3::ZERO, |n| n.position)
            + self.camera_offset
    }

    /// Current (ambient, key) light intensities.
    pub fn light_intensities(&self) -> (f32, f32) {
        let get = |id| self.scene.get(id).map_or(0.0, |n: &Node| n.intensity);
        (get(self.stage.ambient), get(self.stage.key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extensions::tween::{Completion, Tween};

    fn ctx() -> RunContext {
        RunContext::new(&StageConfig::default(), 1)
    }

    #[test]
    fn stage_is_built_and_unpooled() {
        let ctx = ctx();
        assert_eq!(ctx.scene.len(), 4 + 1000 + 1);
        assert!(ctx.pool.is_empty());
        assert_eq!(ctx.camera_position(), Vec3::new(0.0, 0.0, 20.0));
        assert_eq!(ctx.light_intensities(), (0.5, 1.0));
        assert!(ctx.field_visible());
    }

    #[test]
    fn ids_are_never_reused() {
        let mut ctx = ctx();
        let a = ctx.next_id();
        ctx.spawn(Node::new(a, NodeKind::Flash), ResourceCategory::Effect);
        ctx.release_all();
        let b = ctx.next_id();
        assert!(b > a);
    }

    #[test]
    fn release_all_resets_the_solution() {
        let mut ctx = ctx();
        let solution = ctx.stage.solution;
        ctx.scene.set(solution, Property::Visible, Value::Flag(true));
        ctx.scene.set(solution, Property::Opacity, Value::Scalar(0.5));
        ctx.effects.add(
            Tween::to(solution, Property::Opacity, 0.9, 5.0),
            Completion::Nothing,
        );

        ctx.release_all();
        let node = ctx.scene.get(solution).unwrap();
        assert!(!node.visible);
        assert_eq!(node.opacity, 0.0);
        assert!(ctx.effects.is_empty());
    }

    #[test]
    fn effect_completion_releases_the_node() {
        let mut ctx = ctx();
        let id = ctx.next_id();
        ctx.spawn(Node::new(id, NodeKind::Flash), ResourceCategory::Effect);
        ctx.effects
            .add(Tween::to(id, Property::Opacity, 0.0, 0.5), Completion::Release);
        ctx.tick_stage(0.6);
        assert!(!ctx.scene.contains(id));
        assert!(ctx.pool.is_empty());
    }

    #[test]
    fn shake_offsets_the_camera_only_while_set() {
        let mut ctx = ctx();
        let camera = ctx.stage.camera;
        ctx.scene.set(camera, Property::Shake, Value::Scalar(0.2));
        ctx.tick_stage(0.016);
        let offset = ctx.camera_position() - Vec3::new(0.0, 0.0, 20.0);
        assert!(offset.x.abs() <= 0.2 && offset.y.abs() <= 0.2);

        ctx.reset_stage();
        ctx.tick_stage(0.016);
        assert_eq!(ctx.camera_position(), Vec3::new(0.0, 0.0, 20.0));
    }

    #[test]
    fn reseed_replays_the_camera_shake() {
        let mut ctx = ctx();
        let camera = ctx.stage.camera;
        let shake = |ctx: &mut RunContext| {
            ctx.scene.set(camera, Property::Shake, Value::Scalar(0.2));
            (0..3)
                .map(|_| {
                    ctx.tick_stage(0.016);
                    ctx.camera_position()
                })
                .collect::<Vec<_>>()
        };

        ctx.reseed(11);
        let first = shake(&mut ctx);
        ctx.reseed(11);
        assert_eq!(shake(&mut ctx), first);
    }
}
