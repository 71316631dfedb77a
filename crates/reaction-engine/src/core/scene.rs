use std::collections::BTreeMap;

use glam::{EulerRot, Mat4, Vec3};

use crate::api::types::NodeId;
use crate::components::node::{Node, Property, Value};

/// The scene capability the engine drives.
///
/// Everything the choreography does to the 3D world goes through these
/// calls: add and remove nodes, read and write properties, move a node to a
/// new parent. A host with its own scene graph can implement this directly;
/// the engine ships [`Scene`], an in-memory graph that a renderer reads back
/// each frame.
pub trait Scene3D {
    /// Add a node. If `node.parent` names a live node it becomes a child.
    fn insert(&mut self, node: Node);

    /// Remove a node and its whole subtree. Returns every removed id,
    /// parents before children. Unknown ids remove nothing.
    fn remove(&mut self, id: NodeId) -> Vec<NodeId>;

    fn contains(&self, id: NodeId) -> bool;

    fn get(&self, id: NodeId) -> Option<&Node>;

    fn get_mut(&mut self, id: NodeId) -> Option<&mut Node>;

    /// Write one property. False if the node is gone or the value has the
    /// wrong shape.
    fn set(&mut self, id: NodeId, property: Property, value: Value) -> bool {
        self.get_mut(id).is_some_and(|n| n.set(property, value))
    }

    /// Move a node under `parent` (or to the root), keeping its world
    /// transform. Refuses cycles and unknown ids.
    fn reparent(&mut self, id: NodeId, parent: Option<NodeId>) -> bool;

    /// Accumulated transform from the root.
    fn world_transform(&self, id: NodeId) -> Option<Mat4>;

    fn world_position(&self, id: NodeId) -> Option<Vec3> {
        self.world_transform(id).map(|m| m.w_axis.truncate())
    }

    /// Direct children, in insertion order.
    fn children(&self, id: NodeId) -> Vec<NodeId>;

    /// Every live node, in id order.
    fn nodes(&self) -> Box<dyn Iterator<Item = &Node> + '_>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// In-memory scene graph with deterministic (id-ordered) iteration.
#[derive(Debug, Default)]
pub struct Scene {
    nodes: BTreeMap<NodeId, Node>,
    children: BTreeMap<NodeId, Vec<NodeId>>,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    fn unlink(&mut self, id: NodeId, parent: Option<NodeId>) {
        if let Some(p) = parent {
            if let Some(siblings) = self.children.get_mut(&p) {
                siblings.retain(|&c| c != id);
            }
        }
    }

    fn is_ancestor(&self, ancestor: NodeId, mut id: NodeId) -> bool {
        while let Some(parent) = self.nodes.get(&id).and_then(|n| n.parent) {
            if parent == ancestor {
                return true;
            }
            id = parent;
        }
        false
    }
}

impl Scene3D for Scene {
    fn insert(&mut self, mut node: Node) {
        let id = node.id;
        if let Some(old) = self.nodes.get(&id).map(|n| n.parent) {
            self.unlink(id, old);
        }
        match node.parent {
            Some(p) if self.nodes.contains_key(&p) && p != id => {
                self.children.entry(p).or_default().push(id);
            }
            Some(p) => {
                log::warn!("scene: parent {:?} of {:?} is not in the scene", p, id);
                node.parent = None;
            }
            None => {}
        }
        self.nodes.insert(id, node);
    }

    fn remove(&mut self, id: NodeId) -> Vec<NodeId> {
        let Some(parent) = self.nodes.get(&id).map(|n| n.parent) else {
            return Vec::new();
        };
        self.unlink(id, parent);

        let mut removed = Vec::new();
        let mut stack = vec![id];
        while let Some(next) = stack.pop() {
            if self.nodes.remove(&next).is_some() {
                removed.push(next);
            }
            if let Some(kids) = self.children.remove(&next) {
                stack.extend(kids.into_iter().rev());
            }
        }
        removed
    }

    fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(&id)
    }

    fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(&id)
    }

    fn reparent(&mut self, id: NodeId, parent: Option<NodeId>) -> bool {
        if !self.nodes.contains_key(&id) {
            return false;
        }
        if let Some(p) = parent {
            if p == id || !self.nodes.contains_key(&p) || self.is_ancestor(id, p) {
                return false;
            }
        }
        let Some(world) = self.world_transform(id) else {
            return false;
        };
        let parent_world = match parent {
            Some(p) => self.world_transform(p).unwrap_or(Mat4::IDENTITY),
            None => Mat4::IDENTITY,
        };
        let local = parent_world.inverse() * world;
        let (scale, rotation, translation) = local.to_scale_rotation_translation();
        let (rx, ry, rz) = rotation.to_euler(EulerRot::XYZ);

        let old_parent = self.nodes.get(&id).and_then(|n| n.parent);
        self.unlink(id, old_parent);
        if let Some(p) = parent {
            self.children.entry(p).or_default().push(id);
        }
        if let Some(node) = self.nodes.get_mut(&id) {
            node.parent = parent;
            node.position = translation;
            node.rotation = Vec3::new(rx, ry, rz);
            node.scale = scale;
        }
        true
    }

    fn world_transform(&self, id: NodeId) -> Option<Mat4> {
        let node = self.nodes.get(&id)?;
        let mut matrix = node.local_matrix();
        let mut parent = node.parent;
        while let Some(p) = parent {
            let Some(pn) = self.nodes.get(&p) else { break };
            matrix = pn.local_matrix() * matrix;
            parent = pn.parent;
        }
        Some(matrix)
    }

    fn children(&self, id: NodeId) -> Vec<NodeId> {
        self.children.get(&id).cloned().unwrap_or_default()
    }

    fn nodes(&self) -> Box<dyn Iterator<Item = &Node> + '_> {
        Box::new(self.nodes.values())
    }

    fn len(&self) -> usize {
        self.nodes.len()
    }
}
