//! Signal processing modules for the enhancement engine
//!
//! This module contains implementations of the audio processing algorithms
//! used to clean up the capture stream: voice activity detection, spectral
//! noise suppression, and the output effects chain.

// Audio processing components
pub mod audio;

// Spectral analysis/synthesis
pub mod spectral;

// Re-export commonly used types
pub use audio::{
    agc::AutomaticGainControl,
    effects::EffectsChain,
    ns::NoiseSuppressor,
    vad::VoiceActivityDetector,
};
pub use spectral::{OverlapAdd, SpectralTransform};
