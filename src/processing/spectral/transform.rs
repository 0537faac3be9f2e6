//! Windowed spectral transform
//!
//! Hann-windowed forward/inverse FFT with magnitude/phase conversion for the
//! lower half-spectrum. Analysis and synthesis share one complex scratch
//! buffer owned by the caller; the transform itself owns only its plans,
//! window coefficients, and FFT scratch.

use std::sync::Arc;

use num_complex::Complex32;
use rustfft::{Fft, FftPlanner};
use tracing::debug;

use crate::error::{Error, Result};

/// Minimum supported transform size
pub const MIN_TRANSFORM_SIZE: usize = 64;

/// Maximum supported transform size
pub const MAX_TRANSFORM_SIZE: usize = 4096;

/// Windowed FFT/IFFT pair for one fixed transform size
pub struct SpectralTransform {
    /// Transform size (power of two)
    size: usize,
    /// Forward FFT plan
    forward: Arc<dyn Fft<f32>>,
    /// Inverse FFT plan
    inverse: Arc<dyn Fft<f32>>,
    /// Hann window coefficients, computed once
    window: Vec<f32>,
    /// Scratch space for in-place FFT execution
    scratch: Vec<Complex32>,
}

impl SpectralTransform {
    /// Create a transform pair for the given size
    ///
    /// The size must be a power of two between [`MIN_TRANSFORM_SIZE`] and
    /// [`MAX_TRANSFORM_SIZE`]. Anything else is a configuration error.
    pub fn new(size: usize) -> Result<Self> {
        if !size.is_power_of_two() || size < MIN_TRANSFORM_SIZE || size > MAX_TRANSFORM_SIZE {
            return Err(Error::UnsupportedTransformSize(size));
        }

        let mut planner = FftPlanner::new();
        let forward = planner.plan_fft_forward(size);
        let inverse = planner.plan_fft_inverse(size);

        let window: Vec<f32> = apodize::hanning_iter(size).map(|w| w as f32).collect();

        let scratch_len = forward
            .get_inplace_scratch_len()
            .max(inverse.get_inplace_scratch_len());

        debug!("Created SpectralTransform: size={}", size);

        Ok(Self {
            size,
            forward,
            inverse,
            window,
            scratch: vec![Complex32::default(); scratch_len],
        })
    }

    /// Transform size
    pub fn size(&self) -> usize {
        self.size
    }

    /// Number of bins in the lower half-spectrum
    pub fn half_size(&self) -> usize {
        self.size / 2
    }

    /// Multiply the buffer by the Hann window in place
    pub fn apply_window(&self, buffer: &mut [f32]) {
        debug_assert_eq!(buffer.len(), self.size);
        for (sample, w) in buffer.iter_mut().zip(&self.window) {
            *sample *= w;
        }
    }

    /// Run the forward transform over a real-valued, already-windowed frame
    ///
    /// Fills `spectrum` (length = transform size) with the complex result.
    pub fn forward(&mut self, time: &[f32], spectrum: &mut [Complex32]) {
        debug_assert_eq!(time.len(), self.size);
        debug_assert_eq!(spectrum.len(), self.size);

        for (bin, &sample) in spectrum.iter_mut().zip(time) {
            *bin = Complex32::new(sample, 0.0);
        }
        self.forward.process_with_scratch(spectrum, &mut self.scratch);
    }

    /// Split the lower half-spectrum into magnitude and phase
    pub fn magnitude_phase(&self, spectrum: &[Complex32], magnitude: &mut [f32], phase: &mut [f32]) {
        let half = self.half_size();
        debug_assert_eq!(spectrum.len(), self.size);
        debug_assert_eq!(magnitude.len(), half);
        debug_assert_eq!(phase.len(), half);

        for k in 0..half {
            magnitude[k] = spectrum[k].norm();
            phase[k] = spectrum[k].arg();
        }
    }

    /// Rebuild the complex spectrum from magnitude and phase
    ///
    /// Writes bins `0..N/2` from the polar form and mirrors them into the
    /// conjugate-symmetric upper half. The Nyquist bin carries through from
    /// analysis untouched.
    pub fn rebuild_spectrum(&self, magnitude: &[f32], phase: &[f32], spectrum: &mut [Complex32]) {
        let half = self.half_size();
        debug_assert_eq!(spectrum.len(), self.size);
        debug_assert_eq!(magnitude.len(), half);
        debug_assert_eq!(phase.len(), half);

        for k in 0..half {
            spectrum[k] = Complex32::from_polar(magnitude[k], phase[k]);
        }
        for k in half + 1..self.size {
            spectrum[k] = spectrum[self.size - k].conj();
        }
    }

    /// Run the inverse transform and write the scaled real part
    ///
    /// rustfft does not normalize, so the output is scaled by 1/N here.
    pub fn inverse(&mut self, spectrum: &mut [Complex32], time: &mut [f32]) {
        debug_assert_eq!(spectrum.len(), self.size);
        debug_assert_eq!(time.len(), self.size);

        self.inverse.process_with_scratch(spectrum, &mut self.scratch);

        let scale = 1.0 / self.size as f32;
        for (sample, bin) in time.iter_mut().zip(spectrum.iter()) {
            *sample = bin.re * scale;
        }
    }
}
