//! Audio Processing Components
//!
//! This module contains the audio processing components of the enhancement
//! pipeline: voice activity detection, noise estimation and suppression, and
//! the post-suppression effects stages.

pub mod agc;
pub mod dynamics;
pub mod effects;
pub mod equalizer;
pub mod ns;
pub mod vad;

// Re-export main types
pub use agc::{AgcConfig, AutomaticGainControl};
pub use dynamics::{Compressor, CompressorConfig, Limiter, LimiterConfig};
pub use effects::{EffectsChain, EffectsConfig};
pub use equalizer::{EqBandConfig, Equalizer, EqualizerConfig};
pub use ns::{NoiseSuppressor, NsConfig};
pub use vad::{VadConfig, VadResult, VadState, VoiceActivityDetector};
