use noise::{NoiseFn, Perlin};
use rand::Rng;

/// Smoothly varying scalar sequence indexed by a continuous step value.
///
/// Samples one axis of a 3D Perlin domain and remaps the result to [0, 1].
/// Every field gets its own seed, so two fields produce unrelated sequences
/// while any single field stays smooth along its step axis.
pub struct NoiseField {
    perlin: Perlin,
}

impl NoiseField {
    // Fixed slice through the 3D domain, kept off the integer lattice where
    // gradient noise pins to zero.
    const SLICE_Y: f64 = 0.5;
    const SLICE_Z: f64 = 0.5;

    /// Creates a field with a fresh random seed. Two fields built this way
    /// are not expected to agree, only to each be smooth.
    pub fn new() -> Self {
        Self::with_seed(rand::thread_rng().gen())
    }

    pub fn with_seed(seed: u32) -> Self {
        NoiseField {
            perlin: Perlin::new(seed),
        }
    }

    /// Samples the sequence at `step`. Nearby steps give correlated values.
    pub fn sample(&self, step: f64) -> f64 {
        let raw = self.perlin.get([step, Self::SLICE_Y, Self::SLICE_Z]);
        ((raw + 1.0) / 2.0).clamp(0.0, 1.0)
    }
}

impl Default for NoiseField {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_samples_stay_in_unit_range() {
        let field = NoiseField::with_seed(7);
        for i in 0..2000 {
            let value = field.sample(i as f64 * 0.083);
            assert!((0.0..=1.0).contains(&value), "sample {} out of range", value);
        }
    }

    #[test]
    fn test_same_seed_same_sequence() {
        let a = NoiseField::with_seed(42);
        let b = NoiseField::with_seed(42);
        for i in 0..100 {
            let step = i as f64 * 0.11;
            assert_eq!(a.sample(step), b.sample(step));
        }
    }

    #[test]
    fn test_adjacent_steps_are_correlated() {
        // Small step increments must produce small value changes, otherwise
        // silhouettes come out jagged instead of rolling.
        let field = NoiseField::with_seed(3);
        for i in 0..1000 {
            let step = i as f64 * 0.05;
            let delta = (field.sample(step + 0.01) - field.sample(step)).abs();
            assert!(delta < 0.1, "jump of {} between adjacent steps", delta);
        }
    }

    #[test]
    fn test_sequence_actually_varies() {
        let field = NoiseField::with_seed(11);
        let first = field.sample(0.3);
        let mut varies = false;
        for i in 1..200 {
            if (field.sample(0.3 + i as f64 * 0.1) - first).abs() > 0.05 {
                varies = true;
                break;
            }
        }
        assert!(varies, "noise sequence is flat");
    }
}
