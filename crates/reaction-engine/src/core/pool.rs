//! Ownership ledger for every scene node a run creates.
//!
//! Nothing created for a run escapes this pool: molecule instances, one-shot
//! effects, bubbles, precipitate and detached atoms are all tracked here and
//! removed from the scene together on `release_all`. Releasing a node also
//! cancels its effect tweens, so no infinite loop keeps ticking on a node
//! that is gone.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::api::types::NodeId;
use crate::core::scene::Scene3D;
use crate::extensions::tween::TweenState;

/// Bucket a tracked node belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceCategory {
    Molecule,
    Effect,
    GasBubble,
    PrecipitationParticle,
    /// Atoms freed from a reactant, waiting to be consumed by a product.
    DetachedAtom,
}

#[derive(Debug, Clone, Copy)]
struct Tracked {
    category: ResourceCategory,
    disposed: bool,
}

#[derive(Debug, Default)]
pub struct ResourcePool {
    tracked: BTreeMap<NodeId, Tracked>,
}

impl ResourcePool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record ownership of a node already in the scene. Re-tracking a node
    /// moves it to the new category.
    pub fn track(&mut self, id: NodeId, category: ResourceCategory) {
        self.tracked.insert(
            id,
            Tracked {
                category,
                disposed: false,
            },
        );
    }

    /// Move a tracked node to another bucket. False if it isn't tracked.
    pub fn retag(&mut self, id: NodeId, category: ResourceCategory) -> bool {
        match self.tracked.get_mut(&id) {
            Some(t) if !t.disposed => {
                t.category = category;
                true
            }
            _ => false,
        }
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.tracked.get(&id).is_some_and(|t| !t.disposed)
    }

    pub fn category_of(&self, id: NodeId) -> Option<ResourceCategory> {
        self.tracked
            .get(&id)
            .filter(|t| !t.disposed)
            .map(|t| t.category)
    }

    /// Live tracked nodes.
    pub fn len(&self) -> usize {
        self.tracked.values().filter(|t| !t.disposed).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn count(&self, category: ResourceCategory) -> usize {
        self.tracked
            .values()
            .filter(|t| !t.disposed && t.category == category)
            .count()
    }

    /// Tracked ids in a category, in id order.
    pub fn ids(&self, category: ResourceCategory) -> Vec<NodeId> {
        self.tracked
            .iter()
            .filter(|(_, t)| !t.disposed && t.category == category)
            .map(|(id, _)| *id)
            .collect()
    }

    /// Remove one tracked node and its subtree. Returns how many scene
    /// nodes went away. Untracked or already disposed ids are a no-op.
    pub fn release(
        &mut self,
        id: NodeId,
        scene: &mut dyn Scene3D,
        tweens: &mut TweenState,
    ) -> usize {
        let removed = self.dispose(id, scene, tweens);
        self.sweep();
        removed
    }

    /// Release every node in one bucket.
    pub fn release_category(
        &mut self,
        category: ResourceCategory,
        scene: &mut dyn Scene3D,
        tweens: &mut TweenState,
    ) -> usize {
        let removed = self
            .ids(category)
            .into_iter()
            .map(|id| self.dispose(id, scene, tweens))
            .sum();
        self.sweep();
        log::debug!("pool: released {} nodes from {:?}", removed, category);
        removed
    }

    /// Release everything. Safe to call repeatedly and on an empty pool.
    pub fn release_all(&mut self, scene: &mut dyn Scene3D, tweens: &mut TweenState) -> usize {
        let ids: Vec<NodeId> = self.tracked.keys().copied().collect();
        let removed = ids
            .into_iter()
            .map(|id| self.dispose(id, scene, tweens))
            .sum();
        self.tracked.clear();
        log::debug!("pool: released {} nodes", removed);
        removed
    }

    fn dispose(&mut self, id: NodeId, scene: &mut dyn Scene3D, tweens: &mut TweenState) -> usize {
        match self.tracked.get(&id) {
            Some(t) if !t.disposed => {}
            _ => return 0,
        }
        let removed = scene.remove(id);
        for node in &removed {
            tweens.remove_node(*node);
            if let Some(t) = self.tracked.get_mut(node) {
                t.disposed = true;
            }
        }
        // The node may already have left the scene on its own.
        if let Some(t) = self.tracked.get_mut(&id) {
            t.disposed = true;
        }
        removed.len()
    }

    fn sweep(&mut self) {
        self.tracked.retain(|_, t| !t.disposed);
    }
}
