//! Seedable pseudo-random number generator (xorshift64).
//! Deterministic and fast. Every layout decision in a run draws from one of
//! these, so a run rebuilt from the same seed lands in the same places.

use glam::Vec3;

#[derive(Debug, Clone)]
pub struct Rng {
    state: u64,
}

impl Rng {
    pub fn new(seed: u64) -> Self {
        Rng {
            state: if seed == 0 { 1 } else { seed },
        }
    }

    pub fn next_u64(&mut self) -> u64 {
        let mut x = self.state;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.state = x;
        x
    }

    /// Generate a random number in [0, upper_bound).
    pub fn next_int(&mut self, upper_bound: u32) -> u32 {
        if upper_bound == 0 {
            return 0;
        }
        (self.next_u64() % upper_bound as u64) as u32
    }

    /// Uniform in [0, 1).
    pub fn next_f32(&mut self) -> f32 {
        (self.next_u64() >> 40) as f32 / (1u64 << 24) as f32
    }

    /// Uniform in [lo, hi).
    pub fn range(&mut self, lo: f32, hi: f32) -> f32 {
        lo + (hi - lo) * self.next_f32()
    }

    /// Uniform in [-extent/2, extent/2).
    pub fn centered(&mut self, extent: f32) -> f32 {
        (self.next_f32() - 0.5) * extent
    }

    /// A point in an axis-aligned box of the given size, centred on the origin.
    pub fn in_box(&mut self, size: Vec3) -> Vec3 {
        Vec3::new(
            self.centered(size.x),
            self.centered(size.y),
            self.centered(size.z),
        )
    }

    /// Uniformly distributed point on a sphere.
    pub fn on_sphere(&mut self, radius: f32) -> Vec3 {
        let theta = std::f32::consts::TAU * self.next_f32();
        let phi = (2.0 * self.next_f32() - 1.0).clamp(-1.0, 1.0).acos();
        Vec3::new(
            radius * phi.sin() * theta.cos(),
            radius * phi.sin() * theta.sin(),
            radius * phi.cos(),
        )
    }
}
