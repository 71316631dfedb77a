use crate::components::node::Node;
use crate::core::scene::Scene3D;
use crate::renderer::instance::{RenderBuffer, RenderInstance};

/// Whether `node` and every ancestor are visible.
fn shown(scene: &dyn Scene3D, node: &Node) -> bool {
    let mut current = Some(node);
    while let Some(n) = current {
        if !n.visible {
            return false;
        }
        current = n.parent.and_then(|p| scene.get(p));
    }
    true
}

fn instance(scene: &dyn Scene3D, node: &Node) -> Option<RenderInstance> {
    let (scale, rotation, position) = scene.world_transform(node.id)?.to_scale_rotation_translation();
    Some(RenderInstance {
        position: position.to_array(),
        rotation: rotation.to_array(),
        scale: scale.to_array(),
        color: node.color.to_array(),
        opacity: node.opacity,
        emissive: node.emissive.to_array(),
        kind: node.kind.code(),
        _pad: [0.0; 2],
    })
}

/// Build the render buffer from the scene.
/// Opaque and alpha-blended nodes first, then additive ones (bubbles, flash,
/// shockwave, energy ring, field). Sets `additive_split` at the boundary.
pub fn build_render_buffer(scene: &dyn Scene3D, buffer: &mut RenderBuffer) {
    buffer.clear();

    let mut opaque: Vec<RenderInstance> = Vec::new();
    let mut additive: Vec<RenderInstance> = Vec::new();

    for node in scene.nodes() {
        if !node.kind.is_drawable() || node.opacity <= 0.0 || !shown(scene, node) {
            continue;
        }
        let Some(inst) = instance(scene, node) else {
            continue;
        };
        if node.kind.is_additive() {
            additive.push(inst);
        } else {
            opaque.push(inst);
        }
    }

    let mut dropped = 0usize;
    for inst in opaque {
        if !buffer.push(inst) {
            dropped += 1;
        }
    }
    buffer.set_additive_split(buffer.instance_count());
    for inst in additive {
        if !buffer.push(inst) {
            dropped += 1;
        }
    }
    if dropped > 0 {
        log::debug!("render: {} instances over capacity", dropped);
    }
}
