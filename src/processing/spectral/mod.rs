//! Spectral analysis and synthesis
//!
//! This module contains the windowed FFT/IFFT front end used by the noise
//! suppressor and the overlap-add reconstructor that stitches processed
//! frames back into a continuous waveform.

pub mod overlap;
pub mod transform;

// Re-export main types
pub use overlap::OverlapAdd;
pub use transform::{SpectralTransform, MAX_TRANSFORM_SIZE, MIN_TRANSFORM_SIZE};
