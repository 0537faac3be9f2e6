//! # Voice Enhancement Core
//!
//! `clearvoice-core` provides the real-time audio enhancement pipeline used by
//! the headset controller firmware. It consumes fixed-length frames of
//! microphone PCM, detects voice activity, adaptively estimates and suppresses
//! background noise in the spectral domain, and reconstructs a cleaned
//! waveform through an effects chain, all inside a fixed per-frame budget.
//!
//! This crate provides:
//!
//! - Voice activity detection (energy + zero-crossing rate with hangover)
//! - Spectral noise estimation and Wiener suppression
//! - Overlap-add frame reconstruction
//! - An effects chain (AGC, multi-band equalizer, compressor/limiter)
//! - Lock-free monitor taps for UI and mute logic
//!
//! ## Quick Start
//!
//! ```no_run
//! use clearvoice_core::prelude::*;
//!
//! let mut enhancer = AudioEnhancer::new(EnhancerConfig::default())?;
//! enhancer.begin()?;
//!
//! let input = vec![0i16; 512];
//! let mut output = vec![0i16; 512];
//! enhancer.process_frame(&input, &mut output)?;
//!
//! if enhancer.is_voice_active() {
//!     // forward the cleaned frame to the transmit path
//! }
//!
//! enhancer.end();
//! # Ok::<(), clearvoice_core::Error>(())
//! ```
//!
//! The engine is owned by exactly one periodic capture task and is not safe
//! for concurrent frame processing. Other tasks observe it through the
//! [`engine::EnhancerMonitor`] handle, which is lock-free and never blocks
//! the owner.

// Error handling
pub mod error;

// Working modules
pub mod engine;
pub mod processing;

// Re-export common types
pub use error::{Error, Result};
pub use engine::{AudioEnhancer, EnhancerConfig, EnhancerMonitor, EnhancerSnapshot};

/// Media sample type (raw audio data)
pub type Sample = i16;

/// PCM sample rate in Hz
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum SampleRate {
    /// 8kHz (narrowband)
    Rate8000,
    /// 16kHz (wideband)
    Rate16000,
    /// 32kHz
    Rate32000,
    /// 48kHz
    Rate48000,
}

impl SampleRate {
    /// Get the sample rate in Hz
    pub fn as_hz(&self) -> u32 {
        match self {
            Self::Rate8000 => 8000,
            Self::Rate16000 => 16000,
            Self::Rate32000 => 32000,
            Self::Rate48000 => 48000,
        }
    }

    /// Create from a raw Hz value, defaulting to 16kHz if not recognized
    pub fn from_hz(hz: u32) -> Self {
        match hz {
            8000 => Self::Rate8000,
            16000 => Self::Rate16000,
            32000 => Self::Rate32000,
            48000 => Self::Rate48000,
            _ => Self::Rate16000,
        }
    }
}

impl Default for SampleRate {
    fn default() -> Self {
        Self::Rate16000 // Wideband, standard for headset capture
    }
}

/// A captured or processed frame of mono PCM audio
#[derive(Debug, Clone, PartialEq)]
pub struct AudioFrame {
    /// Audio samples as i16 PCM
    pub samples: Vec<Sample>,
    /// Sample rate in Hz
    pub sample_rate: u32,
    /// Number of channels
    pub channels: u8,
    /// Timestamp in samples since capture start
    pub timestamp: u32,
}

impl AudioFrame {
    /// Create a new audio frame
    pub fn new(samples: Vec<Sample>, sample_rate: u32, channels: u8, timestamp: u32) -> Self {
        Self {
            samples,
            sample_rate,
            channels,
            timestamp,
        }
    }

    /// Create a silent frame of the given length
    pub fn silent(len: usize, sample_rate: u32, timestamp: u32) -> Self {
        Self::new(vec![0; len], sample_rate, 1, timestamp)
    }

    /// Get the duration of the frame in milliseconds
    pub fn duration_ms(&self) -> u32 {
        if self.sample_rate == 0 {
            return 0;
        }
        (self.samples.len() as u32 / self.channels.max(1) as u32) * 1000 / self.sample_rate
    }
}

/// Prelude module with commonly used types
pub mod prelude {
    pub use crate::{
        AudioEnhancer, AudioFrame, EnhancerConfig, EnhancerMonitor, EnhancerSnapshot, Error,
        Result, Sample, SampleRate,
    };

    pub use crate::processing::audio::{
        AgcConfig, EffectsChain, EffectsConfig, EqualizerConfig, NsConfig, VadConfig, VadState,
    };
}
