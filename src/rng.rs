use serde::{Deserialize, Serialize};

/// Source of uniform floats in `[0, 1)`. Every random decision in the game goes through this.
pub trait RandomSource {
    fn next_f32(&mut self) -> f32;

    fn int(&mut self, min: i32, max: i32) -> i32 {
        if max <= min {
            return min;
        }
        let span = (max - min + 1) as f32;
        (min + (self.next_f32() * span).floor() as i32).min(max)
    }

    fn chance(&mut self, probability: f32) -> bool {
        self.next_f32() < probability
    }

    fn pick_index(&mut self, len: usize) -> usize {
        if len <= 1 {
            return 0;
        }
        (self.next_f32() * len as f32).floor().min((len - 1) as f32) as usize
    }
}

impl<R: RandomSource + ?Sized> RandomSource for &mut R {
    fn next_f32(&mut self) -> f32 {
        (**self).next_f32()
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Rng {
    seed: u32,
}

impl Rng {
    pub fn new(seed: u32) -> Self {
        Self { seed }
    }

    pub fn from_entropy() -> Self {
        Self::new(rand::random::<u32>())
    }
}

impl RandomSource for Rng {
    fn next_f32(&mut self) -> f32 {
        self.seed = self.seed.wrapping_add(0x6d2b79f5);
        let mut t = self.seed;
        t = (t ^ (t >> 15)).wrapping_mul(t | 1);
        t ^= t.wrapping_add((t ^ (t >> 7)).wrapping_mul(t | 61));
        let out = t ^ (t >> 14);
        // f64 division can round up to 1.0 once narrowed.
        ((out as f64 / 4_294_967_296.0) as f32).min(0.999_999_94)
    }
}

/// Replays a fixed list of values, wrapping around at the end.
#[derive(Clone, Debug)]
pub struct SequenceRng {
    values: Vec<f32>,
    cursor: usize,
}

impl SequenceRng {
    pub fn new(values: Vec<f32>) -> Self {
        let values = if values.is_empty() { vec![0.0] } else { values };
        Self { values, cursor: 0 }
    }

    pub fn constant(value: f32) -> Self {
        Self::new(vec![value])
    }
}

impl RandomSource for SequenceRng {
    fn next_f32(&mut self) -> f32 {
        let value = self.values[self.cursor % self.values.len()];
        self.cursor = self.cursor.wrapping_add(1);
        value.clamp(0.0, 0.999_999_94)
    }
}
