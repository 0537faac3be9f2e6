//! Noise estimation and Wiener suppression
//!
//! This module maintains the recursively-averaged background noise spectrum
//! and derives the per-bin Wiener gain applied to the signal magnitude.
//! Estimation runs only while the detector reports silence and freezes on the
//! first confirmed voice frame, so speech never leaks into the noise model.

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::error::{Error, Result};

/// Seed value for each noise bin at start and after reset
const NOISE_SEED: f32 = 1e-3;

/// Guard against division by zero in the SNR computation
const SNR_EPSILON: f32 = 1e-10;

/// Configuration for noise estimation and suppression
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NsConfig {
    /// Smoothing factor for the noise spectrum average (0.0-1.0)
    pub noise_alpha: f32,
    /// Minimum allowed Wiener gain (bounds maximum attenuation)
    pub spectral_floor: f32,
}

impl Default for NsConfig {
    fn default() -> Self {
        Self {
            noise_alpha: 0.95,  // 95% history, 5% current
            spectral_floor: 0.1,
        }
    }
}

/// Adaptive noise estimator and Wiener suppression filter
pub struct NoiseSuppressor {
    /// Suppressor configuration
    config: NsConfig,
    /// Running per-bin noise magnitude estimate
    noise_spectrum: Vec<f32>,
    /// Whether the estimate is still adapting
    estimating: bool,
    /// Silent frames folded into the estimate since reset
    frames_observed: u64,
}

impl NoiseSuppressor {
    /// Create a suppressor for the given number of spectral bins
    pub fn new(config: NsConfig, num_bins: usize) -> Result<Self> {
        debug!(
            "Creating NoiseSuppressor: bins={}, config={:?}",
            num_bins, config
        );

        if config.noise_alpha <= 0.0 || config.noise_alpha >= 1.0 {
            return Err(Error::InvalidParameter(
                "noise alpha must be between 0.0 and 1.0".to_string(),
            ));
        }
        if config.spectral_floor <= 0.0 || config.spectral_floor >= 1.0 {
            return Err(Error::InvalidParameter(
                "spectral floor must be between 0.0 and 1.0".to_string(),
            ));
        }
        if num_bins == 0 {
            return Err(Error::InvalidParameter(
                "suppressor needs at least one spectral bin".to_string(),
            ));
        }

        Ok(Self {
            config,
            noise_spectrum: vec![NOISE_SEED; num_bins],
            estimating: true,
            frames_observed: 0,
        })
    }

    /// Fold one silent frame's magnitude spectrum into the noise estimate
    ///
    /// No-op once the estimate is frozen. The caller is responsible for only
    /// passing confirmed-silence frames.
    pub fn update_noise(&mut self, magnitude: &[f32]) {
        if !self.estimating {
            return;
        }
        debug_assert_eq!(magnitude.len(), self.noise_spectrum.len());

        let alpha = self.config.noise_alpha;
        for (noise, &mag) in self.noise_spectrum.iter_mut().zip(magnitude) {
            *noise = alpha * *noise + (1.0 - alpha) * mag;
        }
        self.frames_observed += 1;
        trace!("noise estimate updated, frames_observed={}", self.frames_observed);
    }

    /// Stop adapting the noise estimate (called on first confirmed voice)
    pub fn freeze(&mut self) {
        if self.estimating {
            self.estimating = false;
            debug!(
                "noise estimation frozen after {} silent frames",
                self.frames_observed
            );
        }
    }

    /// Whether the estimate is still adapting
    pub fn is_estimating(&self) -> bool {
        self.estimating
    }

    /// Compute the per-bin Wiener gain for a signal magnitude spectrum
    ///
    /// `gain[k] = snr / (1 + snr)` with `snr = mag[k] / (noise[k] + ε)`,
    /// floored at the configured spectral floor so attenuation is bounded.
    pub fn wiener_gain(&self, magnitude: &[f32], gain: &mut [f32]) {
        debug_assert_eq!(magnitude.len(), self.noise_spectrum.len());
        debug_assert_eq!(gain.len(), self.noise_spectrum.len());

        let floor = self.config.spectral_floor;
        for k in 0..gain.len() {
            let snr = magnitude[k] / (self.noise_spectrum[k] + SNR_EPSILON);
            gain[k] = (snr / (1.0 + snr)).max(floor);
        }
    }

    /// Mean of the noise spectrum (the scalar noise-floor diagnostic)
    pub fn noise_floor(&self) -> f32 {
        let sum: f32 = self.noise_spectrum.iter().sum();
        sum / self.noise_spectrum.len() as f32
    }

    /// Current per-bin noise estimate
    pub fn noise_spectrum(&self) -> &[f32] {
        &self.noise_spectrum
    }

    /// Re-arm estimation and reseed the noise spectrum
    pub fn reset(&mut self) {
        self.noise_spectrum.fill(NOISE_SEED);
        self.estimating = true;
        self.frames_observed = 0;
        debug!("noise estimation reset");
    }

    /// Update the spectral floor (between frames only)
    pub fn set_spectral_floor(&mut self, floor: f32) -> Result<()> {
        if floor <= 0.0 || floor >= 1.0 {
            return Err(Error::InvalidParameter(
                "spectral floor must be between 0.0 and 1.0".to_string(),
            ));
        }
        self.config.spectral_floor = floor;
        Ok(())
    }
}
