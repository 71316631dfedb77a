/// Shared-buffer layout.
/// Must stay in sync with the host renderer's `protocol.ts`.
///
/// Layout (all values in f32 / 4 bytes):
/// ```text
/// [Header: 16 floats]
/// [Instances: max_instances × 20 floats]
/// ```
///
/// Capacities are written once into the header at init.
/// The host reads them from the header to compute offsets dynamically.

use crate::api::config::VisualizerConfig;
use crate::api::types::PlaybackState;
use crate::renderer::instance::RenderInstance;

/// Number of floats in the header section.
pub const HEADER_FLOATS: usize = 16;

/// Header field indices.
pub const HEADER_LOCK: usize = 0;
pub const HEADER_FRAME_COUNTER: usize = 1;
pub const HEADER_MAX_INSTANCES: usize = 2;
pub const HEADER_INSTANCE_COUNT: usize = 3;
pub const HEADER_ADDITIVE_SPLIT: usize = 4;
pub const HEADER_PROTOCOL_VERSION: usize = 5;
pub const HEADER_CAMERA_X: usize = 6;
pub const HEADER_CAMERA_Y: usize = 7;
pub const HEADER_CAMERA_Z: usize = 8;
pub const HEADER_AMBIENT_INTENSITY: usize = 9;
pub const HEADER_KEY_INTENSITY: usize = 10;
pub const HEADER_PROGRESS: usize = 11;
pub const HEADER_PLAYBACK_STATE: usize = 12;
pub const HEADER_SPEED: usize = 13;
pub const HEADER_EXPLANATION_MODE: usize = 14;

/// Protocol version written into the header.
pub const PROTOCOL_VERSION: f32 = 1.0;

/// Floats per render instance (wire format, never changes).
pub const INSTANCE_FLOATS: usize = RenderInstance::FLOATS;

/// Runtime-computed buffer layout.
#[derive(Debug, Clone, PartialEq)]
pub struct ProtocolLayout {
    /// Maximum render instances.
    pub max_instances: usize,
    /// Size of instance data section in floats.
    pub instance_data_floats: usize,
    /// Offset (in floats) where instance data begins.
    pub instance_data_offset: usize,
    /// Total buffer size in floats.
    pub buffer_total_floats: usize,
    /// Total buffer size in bytes.
    pub buffer_total_bytes: usize,
}

impl ProtocolLayout {
    pub fn new(max_instances: usize) -> Self {
        let instance_data_floats = max_instances * INSTANCE_FLOATS;
        let instance_data_offset = HEADER_FLOATS;
        let buffer_total_floats = instance_data_offset + instance_data_floats;
        Self {
            max_instances,
            instance_data_floats,
            instance_data_offset,
            buffer_total_floats,
            buffer_total_bytes: buffer_total_floats * 4,
        }
    }

    pub fn from_config(config: &VisualizerConfig) -> Self {
        Self::new(config.max_instances)
    }
}

/// Per-frame values the host reads from the header.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FrameHeader {
    pub frame: u32,
    pub instance_count: u32,
    pub additive_split: u32,
    pub camera: [f32; 3],
    pub ambient: f32,
    pub key: f32,
    pub progress: f32,
    pub state: PlaybackState,
    pub speed: f32,
    pub explanation_mode: bool,
}

impl FrameHeader {
    /// Write into `header`. The lock slot is left to the host.
    pub fn write(&self, layout: &ProtocolLayout, header: &mut [f32; HEADER_FLOATS]) {
        header[HEADER_FRAME_COUNTER] = self.frame as f32;
        header[HEADER_MAX_INSTANCES] = layout.max_instances as f32;
        header[HEADER_INSTANCE_COUNT] = self.instance_count as f32;
        header[HEADER_ADDITIVE_SPLIT] = self.additive_split as f32;
        header[HEADER_PROTOCOL_VERSION] = PROTOCOL_VERSION;
        header[HEADER_CAMERA_X] = self.camera[0];
        header[HEADER_CAMERA_Y] = self.camera[1];
        header[HEADER_CAMERA_Z] = self.camera[2];
        header[HEADER_AMBIENT_INTENSITY] = self.ambient;
        header[HEADER_KEY_INTENSITY] = self.key;
        header[HEADER_PROGRESS] = self.progress;
        header[HEADER_PLAYBACK_STATE] = self.state.code();
        header[HEADER_SPEED] = self.speed;
        header[HEADER_EXPLANATION_MODE] = if self.explanation_mode { 1.0 } else { 0.0 };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_layout() {
        let layout = ProtocolLayout::from_config(&VisualizerConfig::default());
        assert_eq!(layout.max_instances, 8192);
        assert_eq!(layout.instance_data_offset, HEADER_FLOATS);
        assert_eq!(layout.instance_data_floats, 8192 * 20);
        assert_eq!(layout.buffer_total_floats, 16 + 8192 * 20);
        assert_eq!(layout.buffer_total_bytes, (16 + 8192 * 20) * 4);
    }

    #[test]
    fn header_fields_land_in_their_slots() {
        let layout = ProtocolLayout::new(64);
        let mut header = [0.0; HEADER_FLOATS];
        header[HEADER_LOCK] = 1.0;
        FrameHeader {
            frame: 7,
            instance_count: 10,
            additive_split: 4,
            camera: [0.0, 0.5, 20.0],
            ambient: 0.5,
            key: 1.0,
            progress: 0.25,
            state: PlaybackState::ExplainingPaused { step: 1 },
            speed: 2.0,
            explanation_mode: true,
        }
        .write(&layout, &mut header);

        assert_eq!(header[HEADER_LOCK], 1.0);
        assert_eq!(header[HEADER_FRAME_COUNTER], 7.0);
        assert_eq!(header[HEADER_MAX_INSTANCES], 64.0);
        assert_eq!(header[HEADER_ADDITIVE_SPLIT], 4.0);
        assert_eq!(header[HEADER_CAMERA_Z], 20.0);
        assert_eq!(header[HEADER_PLAYBACK_STATE], 3.0);
        assert_eq!(header[HEADER_EXPLANATION_MODE], 1.0);
        assert_eq!(header[15], 0.0);
    }
}
