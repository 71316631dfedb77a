use serde::{Deserialize, Serialize};

/// Top-level visualizer configuration.
/// Every field has a default, so `{}` is a valid config.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VisualizerConfig {
    /// Seed for layout randomness. Each restart derives a fresh seed from it.
    pub seed: u64,
    /// Capacity of the render instance buffer.
    pub max_instances: usize,
    pub choreography: ChoreographyConfig,
    pub effects: EffectConfig,
    pub stage: StageConfig,
}

impl Default for VisualizerConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            max_instances: 8192,
            choreography: ChoreographyConfig::default(),
            effects: EffectConfig::default(),
            stage: StageConfig::default(),
        }
    }
}

impl VisualizerConfig {
    /// Parse a config from a JSON string.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

/// Upper bound on `instance_multiplier`. A validated substance `count` is at
/// most 25, so one substance never seeds more than 400 instances.
pub const MAX_INSTANCE_MULTIPLIER: u32 = 16;

/// Timing and layout of the reaction choreography.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChoreographyConfig {
    /// Instances seeded per unit of a substance's `count`.
    pub instance_multiplier: u32,
    /// Seconds for the `move_to_center` step.
    pub approach_duration: f32,
    /// Seconds for the `rearrange` step.
    pub rearrange_duration: f32,
    /// Size of the box reactants are seeded in (x, y, z).
    pub initial_spread: [f32; 3],
    /// Reactants alternate this far left and right of centre.
    pub side_offset: f32,
    /// Edge of the cube reactants converge into.
    pub convergence_extent: f32,
    /// Edge of the cube freed atoms scatter into.
    pub burst_extent: f32,
    /// Product spiral: radius at the first instance.
    pub spiral_base_radius: f32,
    /// Product spiral: radius added by the last instance.
    pub spiral_radius_growth: f32,
    /// Product spiral: full turns across all instances.
    pub spiral_turns: f32,
    /// Product spiral: depth jitter.
    pub product_depth_jitter: f32,
}

impl ChoreographyConfig {
    /// Instances per unit of `count`, clamped to `1..=MAX_INSTANCE_MULTIPLIER`.
    pub fn multiplier(&self) -> u32 {
        self.instance_multiplier.clamp(1, MAX_INSTANCE_MULTIPLIER)
    }

    /// Instances seeded for a substance with this `count`.
    pub fn instances_for(&self, count: u32) -> u32 {
        count.max(1).saturating_mul(self.multiplier())
    }
}

impl Default for ChoreographyConfig {
    fn default() -> Self {
        Self {
            instance_multiplier: 2,
            approach_duration: 2.5,
            rearrange_duration: 4.0,
            initial_spread: [16.0, 8.0, 8.0],
            side_offset: 4.0,
            convergence_extent: 6.0,
            burst_extent: 20.0,
            spiral_base_radius: 4.0,
            spiral_radius_growth: 8.0,
            spiral_turns: 2.0,
            product_depth_jitter: 6.0,
        }
    }
}

/// Limits and sizes for the step effects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EffectConfig {
    /// Hard cap on bubbles per gas step.
    pub max_bubbles: u32,
    /// Precipitate particle count for light / medium / heavy.
    pub precipitate_counts: [u32; 3],
    /// Precipitate particle size for light / medium / heavy.
    pub precipitate_sizes: [f32; 3],
}

impl Default for EffectConfig {
    fn default() -> Self {
        Self {
            max_bubbles: 500,
            precipitate_counts: [100, 200, 400],
            precipitate_sizes: [0.05, 0.08, 0.12],
        }
    }
}

/// Camera, lights and background of the persistent stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StageConfig {
    /// Camera distance between runs and after a reaction settles.
    pub camera_rest: f32,
    /// Camera distance while reactants converge.
    pub camera_approach: f32,
    /// Camera distance at the moment of detonation.
    pub camera_punch: f32,
    pub ambient_rest: f32,
    pub key_rest: f32,
    pub ambient_dimmed: f32,
    pub key_dimmed: f32,
    /// Points in the background field.
    pub field_count: u32,
    pub field_radius: f32,
}

impl Default for StageConfig {
    fn default() -> Self {
        Self {
            camera_rest: 20.0,
            camera_approach: 25.0,
            camera_punch: 18.0,
            ambient_rest: 0.5,
            key_rest: 1.0,
            ambient_dimmed: 0.1,
            key_dimmed: 0.2,
            field_count: 1000,
            field_radius: 25.0,
        }
    }
}
