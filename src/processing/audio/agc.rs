//! Automatic Gain Control (AGC)
//!
//! Frame-level adaptive gain keeping the output RMS near a target level.
//! The gain moves by a fixed per-frame increment, with separate attack
//! (signal below target) and release (signal above target) rates, and is
//! clamped to a configured range.

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::error::{Error, Result};

/// Configuration options for AGC
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgcConfig {
    /// Target output RMS (normalized, 0.0-1.0)
    pub target_rms: f32,
    /// Per-frame adaptation rate when the signal is below target
    pub attack: f32,
    /// Per-frame adaptation rate when the signal is above target
    pub release: f32,
    /// Minimum gain
    pub min_gain: f32,
    /// Maximum gain
    pub max_gain: f32,
}

impl Default for AgcConfig {
    fn default() -> Self {
        Self {
            target_rms: 0.5,
            attack: 0.001,
            release: 0.01,
            min_gain: 0.1,
            max_gain: 10.0,
        }
    }
}

/// AGC implementation
#[derive(Debug)]
pub struct AutomaticGainControl {
    /// Configuration options
    config: AgcConfig,
    /// Current linear gain
    gain: f32,
}

impl AutomaticGainControl {
    /// Create a new AGC instance with the given configuration
    pub fn new(config: AgcConfig) -> Result<Self> {
        debug!("Creating AutomaticGainControl with config: {:?}", config);

        if config.target_rms <= 0.0 || config.target_rms > 1.0 {
            return Err(Error::InvalidParameter(
                "AGC target RMS must be in (0.0, 1.0]".to_string(),
            ));
        }
        if config.attack <= 0.0 || config.release <= 0.0 {
            return Err(Error::InvalidParameter(
                "AGC attack and release rates must be positive".to_string(),
            ));
        }
        if config.min_gain <= 0.0 || config.min_gain >= config.max_gain {
            return Err(Error::InvalidParameter(
                "AGC gain range must satisfy 0 < min < max".to_string(),
            ));
        }

        Ok(Self { config, gain: 1.0 })
    }

    /// Process one frame of normalized samples in place
    ///
    /// The frame is scaled by the current gain; the gain then adapts from the
    /// post-gain level, so under constant input it settles at
    /// `target_rms / input_rms` (clamped to the configured range).
    pub fn process(&mut self, frame: &mut [f32]) {
        let input_rms = frame_rms(frame);
        if input_rms <= 0.0 {
            // Nothing to measure on a silent frame; hold the current gain
            return;
        }

        for sample in frame.iter_mut() {
            *sample *= self.gain;
        }

        let rms = input_rms * self.gain;
        let error = self.config.target_rms - rms;
        let rate = if error > 0.0 {
            self.config.attack
        } else {
            self.config.release
        };
        self.gain = (self.gain + rate * error).clamp(self.config.min_gain, self.config.max_gain);

        trace!("AGC: rms={:.4}, gain={:.4}", rms, self.gain);
    }

    /// Current linear gain
    pub fn current_gain(&self) -> f32 {
        self.gain
    }

    /// Update the target RMS (between frames only)
    pub fn set_target(&mut self, target_rms: f32) -> Result<()> {
        if target_rms <= 0.0 || target_rms > 1.0 {
            return Err(Error::InvalidParameter(
                "AGC target RMS must be in (0.0, 1.0]".to_string(),
            ));
        }
        self.config.target_rms = target_rms;
        Ok(())
    }

    /// Return the gain to unity
    pub fn reset(&mut self) {
        self.gain = 1.0;
    }
}

/// RMS of normalized samples
fn frame_rms(frame: &[f32]) -> f32 {
    if frame.is_empty() {
        return 0.0;
    }
    let sum_squares: f32 = frame.iter().map(|&s| s * s).sum();
    (sum_squares / frame.len() as f32).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_validation() {
        let mut config = AgcConfig::default();
        config.target_rms = 0.0;
        assert!(AutomaticGainControl::new(config).is_err());

        let mut config = AgcConfig::default();
        config.min_gain = 2.0;
        config.max_gain = 1.0;
        assert!(AutomaticGainControl::new(config).is_err());

        assert!(AutomaticGainControl::new(AgcConfig::default()).is_ok());
    }

    #[test]
    fn test_quiet_signal_gains_up() {
        let mut agc = AutomaticGainControl::new(AgcConfig::default()).unwrap();
        let mut frame = vec![0.05f32; 160];

        agc.process(&mut frame);
        assert!(agc.current_gain() > 1.0);
    }

    #[test]
    fn test_loud_signal_gains_down() {
        let mut agc = AutomaticGainControl::new(AgcConfig::default()).unwrap();
        let mut frame = vec![0.9f32; 160];

        agc.process(&mut frame);
        assert!(agc.current_gain() < 1.0);
    }

    #[test]
    fn test_convergence_toward_target_ratio() {
        let config = AgcConfig {
            attack: 0.05,
            release: 0.05,
            ..AgcConfig::default()
        };
        let target = config.target_rms;
        let mut agc = AutomaticGainControl::new(config).unwrap();

        // Constant-amplitude input: the gain approaches target / input_rms
        let amplitude = 0.25f32;
        for _ in 0..2000 {
            let mut frame = vec![amplitude; 160];
            agc.process(&mut frame);
        }

        let expected = target / amplitude;
        assert!(
            (agc.current_gain() - expected).abs() < 0.15 * expected,
            "gain {} did not converge toward {}",
            agc.current_gain(),
            expected
        );
    }

    #[test]
    fn test_gain_clamped_at_extremes() {
        let config = AgcConfig::default();
        let (min_gain, max_gain) = (config.min_gain, config.max_gain);
        let mut agc = AutomaticGainControl::new(config.clone()).unwrap();

        // Near-silent (but nonzero) input wants gain 5000x: rails at the ceiling
        for _ in 0..50_000 {
            let mut frame = vec![1e-4f32; 16];
            agc.process(&mut frame);
            assert!(agc.current_gain() <= max_gain);
        }
        assert!((agc.current_gain() - max_gain).abs() < 1e-2);

        // Far-above-full-scale input wants gain 0.05x: rails at the floor
        let mut agc = AutomaticGainControl::new(config).unwrap();
        for _ in 0..10_000 {
            let mut frame = vec![10.0f32; 16];
            agc.process(&mut frame);
            assert!(agc.current_gain() >= min_gain);
        }
        assert!((agc.current_gain() - min_gain).abs() < 1e-2);
    }

    #[test]
    fn test_silence_holds_gain() {
        let mut agc = AutomaticGainControl::new(AgcConfig::default()).unwrap();
        let mut frame = vec![0.05f32; 160];
        agc.process(&mut frame);
        let held = agc.current_gain();

        let mut silent = vec![0.0f32; 160];
        agc.process(&mut silent);
        assert_eq!(agc.current_gain(), held);
        assert!(silent.iter().all(|&s| s == 0.0));
    }
}
