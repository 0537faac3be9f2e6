//! Dynamics stages: compressor and limiter
//!
//! Optional stages at the end of the effects chain. The compressor rides an
//! envelope follower and reduces level above its threshold by the configured
//! ratio; the limiter is a plain saturating ceiling in front of the PCM
//! conversion.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};

/// Configuration for the compressor stage
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompressorConfig {
    /// Level above which compression engages (normalized)
    pub threshold: f32,
    /// Compression ratio (N:1)
    pub ratio: f32,
    /// Envelope coefficient while level is rising
    pub attack: f32,
    /// Envelope coefficient while level is falling
    pub release: f32,
    /// Output makeup gain
    pub makeup_gain: f32,
}

impl Default for CompressorConfig {
    fn default() -> Self {
        Self {
            threshold: 0.5,
            ratio: 4.0,
            attack: 0.02,
            release: 0.0005,
            makeup_gain: 1.0,
        }
    }
}

/// Envelope-following compressor
#[derive(Debug)]
pub struct Compressor {
    config: CompressorConfig,
    /// Smoothed absolute level
    envelope: f32,
}

impl Compressor {
    /// Create a compressor with the given configuration
    pub fn new(config: CompressorConfig) -> Result<Self> {
        debug!("Creating Compressor with config: {:?}", config);

        if config.threshold <= 0.0 || config.threshold > 1.0 {
            return Err(Error::InvalidParameter(
                "compressor threshold must be in (0.0, 1.0]".to_string(),
            ));
        }
        if config.ratio < 1.0 {
            return Err(Error::InvalidParameter(
                "compressor ratio must be at least 1:1".to_string(),
            ));
        }
        if config.attack <= 0.0
            || config.attack > 1.0
            || config.release <= 0.0
            || config.release > 1.0
        {
            return Err(Error::InvalidParameter(
                "compressor attack/release must be in (0.0, 1.0]".to_string(),
            ));
        }
        if config.makeup_gain <= 0.0 {
            return Err(Error::InvalidParameter(
                "compressor makeup gain must be positive".to_string(),
            ));
        }

        Ok(Self {
            config,
            envelope: 0.0,
        })
    }

    /// Process one frame in place
    pub fn process(&mut self, frame: &mut [f32]) {
        let cfg = &self.config;
        for sample in frame.iter_mut() {
            let level = sample.abs();
            let coeff = if level > self.envelope {
                cfg.attack
            } else {
                cfg.release
            };
            self.envelope += coeff * (level - self.envelope);

            let gain = if self.envelope > cfg.threshold {
                (cfg.threshold + (self.envelope - cfg.threshold) / cfg.ratio) / self.envelope
            } else {
                1.0
            };
            *sample *= gain * cfg.makeup_gain;
        }
    }

    /// Clear the envelope state
    pub fn reset(&mut self) {
        self.envelope = 0.0;
    }
}

/// Configuration for the limiter stage
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LimiterConfig {
    /// Hard output ceiling (normalized)
    pub threshold: f32,
}

impl Default for LimiterConfig {
    fn default() -> Self {
        Self { threshold: 0.95 }
    }
}

/// Saturating output limiter
#[derive(Debug)]
pub struct Limiter {
    config: LimiterConfig,
}

impl Limiter {
    /// Create a limiter with the given configuration
    pub fn new(config: LimiterConfig) -> Result<Self> {
        if config.threshold <= 0.0 || config.threshold > 1.0 {
            return Err(Error::InvalidParameter(
                "limiter threshold must be in (0.0, 1.0]".to_string(),
            ));
        }
        Ok(Self { config })
    }

    /// Process one frame in place
    pub fn process(&mut self, frame: &mut [f32]) {
        let ceiling = self.config.threshold;
        for sample in frame.iter_mut() {
            *sample = sample.clamp(-ceiling, ceiling);
        }
    }

    /// Stateless; present for chain symmetry
    pub fn reset(&mut self) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compressor_validation() {
        let mut config = CompressorConfig::default();
        config.ratio = 0.5;
        assert!(Compressor::new(config).is_err());

        let mut config = CompressorConfig::default();
        config.threshold = 0.0;
        assert!(Compressor::new(config).is_err());

        assert!(Compressor::new(CompressorConfig::default()).is_ok());
    }

    #[test]
    fn test_compressor_reduces_loud_signal() {
        let mut comp = Compressor::new(CompressorConfig::default()).unwrap();
        let mut frame = vec![0.9f32; 4000];
        comp.process(&mut frame);

        // Steady state: 0.5 + (0.9 - 0.5) / 4 = 0.6
        let settled = frame[3999];
        assert!((settled - 0.6).abs() < 0.02, "settled at {}", settled);
    }

    #[test]
    fn test_compressor_passes_quiet_signal() {
        let mut comp = Compressor::new(CompressorConfig::default()).unwrap();
        let mut frame = vec![0.1f32; 256];
        comp.process(&mut frame);
        for &s in &frame {
            assert!((s - 0.1).abs() < 1e-6);
        }
    }

    #[test]
    fn test_limiter_clamps_peaks() {
        let mut limiter = Limiter::new(LimiterConfig::default()).unwrap();
        let mut frame = vec![-2.0f32, -0.5, 0.0, 0.5, 2.0];
        limiter.process(&mut frame);
        assert_eq!(frame, vec![-0.95, -0.5, 0.0, 0.5, 0.95]);
    }

    #[test]
    fn test_limiter_validation() {
        assert!(Limiter::new(LimiterConfig { threshold: 0.0 }).is_err());
        assert!(Limiter::new(LimiterConfig { threshold: 1.5 }).is_err());
    }
}
