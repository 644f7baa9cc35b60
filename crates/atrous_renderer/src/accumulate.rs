//! Running per-pixel radiance sums.

use atrous_core::Color;
use rayon::prelude::*;

/// Sum of every accepted sample per pixel since the last clear.
///
/// Divide by the iteration count (see [`AccumulationBuffer::average`]) to get
/// the displayed estimate.
#[derive(Debug, Clone, PartialEq)]
pub struct AccumulationBuffer {
    sums: Vec<Color>,
}

impl AccumulationBuffer {
    /// Zeroed buffer for `pixel_count` pixels.
    pub fn new(pixel_count: usize) -> Self {
        Self::from_storage(Vec::new(), pixel_count)
    }

    /// Zeroed buffer built on pre-reserved storage.
    pub(crate) fn from_storage(mut storage: Vec<Color>, pixel_count: usize) -> Self {
        storage.clear();
        storage.resize(pixel_count, Color::ZERO);
        Self { sums: storage }
    }

    pub fn len(&self) -> usize {
        self.sums.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sums.is_empty()
    }

    /// Add one sample to `pixel`.
    ///
    /// Non-finite radiance is rejected and leaves the pixel untouched.
    pub fn accumulate(&mut self, pixel: usize, radiance: Color) -> bool {
        if !radiance.is_finite() {
            return false;
        }
        self.sums[pixel] += radiance;
        true
    }

    /// Add one iteration's per-pixel radiance.
    ///
    /// Returns the number of rejected (non-finite) samples.
    pub fn accumulate_frame(&mut self, frame: &[Color]) -> usize {
        debug_assert_eq!(frame.len(), self.sums.len());
        self.sums
            .par_iter_mut()
            .zip(frame.par_iter())
            .map(|(sum, radiance)| {
                if radiance.is_finite() {
                    *sum += *radiance;
                    0
                } else {
                    1
                }
            })
            .sum()
    }

    pub fn clear(&mut self) {
        self.sums.fill(Color::ZERO);
    }

    /// Raw sums.
    pub fn sums(&self) -> &[Color] {
        &self.sums
    }

    /// Mean radiance after `iteration` samples (0 is treated as 1).
    pub fn average(&self, iteration: u32) -> Vec<Color> {
        let scale = 1.0 / iteration.max(1) as f32;
        self.sums.par_iter().map(|sum| *sum * scale).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accumulate_and_average() {
        let mut buffer = AccumulationBuffer::new(3);
        assert!(buffer.accumulate(1, Color::splat(2.0)));
        assert!(buffer.accumulate(1, Color::splat(4.0)));

        let average = buffer.average(2);
        assert_eq!(average[0], Color::ZERO);
        assert_eq!(average[1], Color::splat(3.0));
    }

    #[test]
    fn test_non_finite_is_rejected() {
        let mut buffer = AccumulationBuffer::new(2);
        assert!(!buffer.accumulate(0, Color::new(f32::NAN, 0.0, 0.0)));
        assert!(!buffer.accumulate(0, Color::splat(f32::INFINITY)));
        assert_eq!(buffer.sums()[0], Color::ZERO);

        let rejected = buffer.accumulate_frame(&[Color::ONE, Color::splat(f32::NAN)]);
        assert_eq!(rejected, 1);
        assert_eq!(buffer.sums(), &[Color::ONE, Color::ZERO]);
    }

    #[test]
    fn test_clear_and_zero_iteration() {
        let mut buffer = AccumulationBuffer::new(1);
        buffer.accumulate_frame(&[Color::splat(5.0)]);
        assert_eq!(buffer.average(0), vec![Color::splat(5.0)]);

        buffer.clear();
        assert_eq!(buffer.sums(), &[Color::ZERO]);
    }
}
