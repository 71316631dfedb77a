use bytemuck::{Pod, Zeroable};

/// Per-instance render data written to the shared buffer for the host renderer.
/// Must match the host protocol: 20 floats = 80 bytes stride.
///
/// Every primitive is unit-sized; `scale` is the world-space size.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Pod, Zeroable)]
pub struct RenderInstance {
    /// World position.
    pub position: [f32; 3],
    /// World rotation quaternion (x, y, z, w).
    pub rotation: [f32; 4],
    /// World scale per axis.
    pub scale: [f32; 3],
    /// Base colour, linear 0..1.
    pub color: [f32; 3],
    /// 0.0 = invisible, 1.0 = opaque.
    pub opacity: f32,
    /// Emissive colour added on top of lighting.
    pub emissive: [f32; 3],
    /// `NodeKind::code` of the node drawn.
    pub kind: f32,
    pub _pad: [f32; 2],
}

impl RenderInstance {
    pub const FLOATS: usize = 20;
    pub const STRIDE_BYTES: usize = Self::FLOATS * 4;
}

/// Render buffer containing every drawable instance of a frame.
pub struct RenderBuffer {
    /// Instances ordered by blend mode: opaque/alpha first, then additive
    /// instances from `additive_split` on.
    pub instances: Vec<RenderInstance>,
    pub additive_split: u32,
    max_instances: usize,
}

impl RenderBuffer {
    pub fn new(max_instances: usize) -> Self {
        Self {
            instances: Vec::with_capacity(max_instances.min(4096)),
            additive_split: 0,
            max_instances,
        }
    }

    pub fn clear(&mut self) {
        self.instances.clear();
        self.additive_split = 0;
    }

    /// Append an instance. Returns false once the buffer is full.
    pub fn push(&mut self, instance: RenderInstance) -> bool {
        if self.instances.len() >= self.max_instances {
            return false;
        }
        self.instances.push(instance);
        true
    }

    pub fn set_additive_split(&mut self, split: u32) {
        self.additive_split = split;
    }

    pub fn instance_count(&self) -> u32 {
        self.instances.len() as u32
    }

    pub fn max_instances(&self) -> usize {
        self.max_instances
    }

    /// Raw pointer to instance data for shared-buffer reads.
    pub fn instances_ptr(&self) -> *const f32 {
        self.instances.as_ptr() as *const f32
    }

    /// Instance data as a flat float slice.
    pub fn as_floats(&self) -> &[f32] {
        bytemuck::cast_slice(&self.instances)
    }
}

impl Default for RenderBuffer {
    fn default() -> Self {
        Self::new(8192)
    }
}
