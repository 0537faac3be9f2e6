//! Overlap-add reconstruction
//!
//! Stitches 50%-overlapped synthesis frames back into a continuous waveform.
//! The retained tail of the previous frame is the only persistent state.

use tracing::trace;

/// Overlap-add reconstructor for 50%-overlapped analysis windows
pub struct OverlapAdd {
    /// Overlap length (transform size / 2)
    overlap_len: usize,
    /// Tail of the previous synthesis frame
    tail: Vec<f32>,
}

impl OverlapAdd {
    /// Create a reconstructor for the given transform size
    pub fn new(transform_size: usize) -> Self {
        debug_assert!(transform_size % 2 == 0);
        let overlap_len = transform_size / 2;
        Self {
            overlap_len,
            tail: vec![0.0; overlap_len],
        }
    }

    /// Overlap length in samples
    pub fn overlap_len(&self) -> usize {
        self.overlap_len
    }

    /// Combine a synthesis frame with the retained tail
    ///
    /// The first half of `output` is the sum of the new frame's first half and
    /// the previous tail; the second half is passed through directly. The last
    /// `overlap_len` samples of `synthesis` become the new tail.
    pub fn reconstruct(&mut self, synthesis: &[f32], output: &mut [f32]) {
        debug_assert_eq!(synthesis.len(), self.overlap_len * 2);
        debug_assert_eq!(output.len(), synthesis.len());

        for i in 0..self.overlap_len {
            output[i] = synthesis[i] + self.tail[i];
        }
        output[self.overlap_len..].copy_from_slice(&synthesis[self.overlap_len..]);

        self.tail.copy_from_slice(&synthesis[self.overlap_len..]);
        trace!("overlap-add: retained {} tail samples", self.overlap_len);
    }

    /// Clear the retained tail
    pub fn reset(&mut self) {
        self.tail.fill(0.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_frame_passes_through() {
        let mut ola = OverlapAdd::new(8);
        let synthesis: Vec<f32> = (0..8).map(|i| i as f32).collect();
        let mut output = vec![0.0f32; 8];

        ola.reconstruct(&synthesis, &mut output);

        // Zero-initialized tail: first frame is unchanged
        assert_eq!(output, synthesis);
    }

    #[test]
    fn test_sum_then_pass_pattern() {
        let mut ola = OverlapAdd::new(8);
        let first: Vec<f32> = (0..8).map(|i| i as f32).collect(); // tail = [4,5,6,7]
        let second: Vec<f32> = (0..8).map(|i| 10.0 + i as f32).collect();
        let mut output = vec![0.0f32; 8];

        ola.reconstruct(&first, &mut output);
        ola.reconstruct(&second, &mut output);

        // First half: second frame's head plus first frame's tail
        assert_eq!(&output[..4], &[10.0 + 4.0, 11.0 + 5.0, 12.0 + 6.0, 13.0 + 7.0]);
        // Second half: emitted directly
        assert_eq!(&output[4..], &[14.0, 15.0, 16.0, 17.0]);
    }

    #[test]
    fn test_reset_clears_tail() {
        let mut ola = OverlapAdd::new(8);
        let frame: Vec<f32> = (0..8).map(|i| 1.0 + i as f32).collect();
        let mut output = vec![0.0f32; 8];

        ola.reconstruct(&frame, &mut output);
        ola.reset();
        ola.reconstruct(&frame, &mut output);

        // After reset the tail contribution is gone again
        assert_eq!(output, frame);
    }
}
