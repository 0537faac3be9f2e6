//! Multi-band equalizer
//!
//! A cascade of peaking-EQ biquad sections applied in series, sample by
//! sample. Each band keeps its own direct-form filter history; per-band gain
//! can be changed at runtime, rebuilding the coefficients without dropping
//! the filter state.

use biquad::{Biquad, Coefficients, DirectForm1, ToHertz, Type, Q_BUTTERWORTH_F32};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};

/// Configuration for one equalizer band
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EqBandConfig {
    /// Center frequency in Hz
    pub center_hz: f32,
    /// Band gain in dB (0.0 = transparent)
    pub gain_db: f32,
    /// Filter quality factor
    pub q: f32,
}

/// Configuration for the equalizer cascade
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EqualizerConfig {
    /// Bands applied in order
    pub bands: Vec<EqBandConfig>,
}

impl Default for EqualizerConfig {
    fn default() -> Self {
        // Octave-spaced speech bands, all transparent until tuned
        let bands = [250.0, 500.0, 1000.0, 2000.0, 4000.0]
            .iter()
            .map(|&center_hz| EqBandConfig {
                center_hz,
                gain_db: 0.0,
                q: Q_BUTTERWORTH_F32,
            })
            .collect();
        Self { bands }
    }
}

/// One band of the cascade
struct EqBand {
    config: EqBandConfig,
    filter: DirectForm1<f32>,
}

/// Cascaded multi-band equalizer
pub struct Equalizer {
    /// Sample rate the coefficients were designed for
    sample_rate_hz: f32,
    /// Bands in application order
    bands: Vec<EqBand>,
}

impl Equalizer {
    /// Create an equalizer for the given sample rate
    pub fn new(config: EqualizerConfig, sample_rate_hz: f32) -> Result<Self> {
        debug!(
            "Creating Equalizer: {} bands at {} Hz",
            config.bands.len(),
            sample_rate_hz
        );

        if sample_rate_hz <= 0.0 {
            return Err(Error::InvalidParameter(
                "equalizer sample rate must be positive".to_string(),
            ));
        }

        let mut bands = Vec::with_capacity(config.bands.len());
        for band in config.bands {
            let coeffs = design_band(&band, sample_rate_hz)?;
            bands.push(EqBand {
                config: band,
                filter: DirectForm1::<f32>::new(coeffs),
            });
        }

        Ok(Self {
            sample_rate_hz,
            bands,
        })
    }

    /// Number of bands in the cascade
    pub fn num_bands(&self) -> usize {
        self.bands.len()
    }

    /// Gain of a band in dB
    pub fn band_gain_db(&self, band: usize) -> Result<f32> {
        self.bands
            .get(band)
            .map(|b| b.config.gain_db)
            .ok_or_else(|| Error::InvalidParameter(format!("no such equalizer band: {}", band)))
    }

    /// Change a band's gain, rebuilding its coefficients in place
    pub fn set_band_gain(&mut self, band: usize, gain_db: f32) -> Result<()> {
        let sample_rate_hz = self.sample_rate_hz;
        let entry = self
            .bands
            .get_mut(band)
            .ok_or_else(|| Error::InvalidParameter(format!("no such equalizer band: {}", band)))?;

        entry.config.gain_db = gain_db;
        let coeffs = design_band(&entry.config, sample_rate_hz)?;
        entry.filter.update_coefficients(coeffs);
        Ok(())
    }

    /// Run the cascade over one frame in place
    pub fn process(&mut self, frame: &mut [f32]) {
        for sample in frame.iter_mut() {
            let mut s = *sample;
            for band in self.bands.iter_mut() {
                s = band.filter.run(s);
            }
            *sample = s;
        }
    }

    /// Clear all band filter history
    pub fn reset(&mut self) {
        for band in self.bands.iter_mut() {
            // Rebuilding the section is the cheapest way to zero its history
            if let Ok(coeffs) = design_band(&band.config, self.sample_rate_hz) {
                band.filter = DirectForm1::<f32>::new(coeffs);
            }
        }
    }
}

/// Design the peaking-EQ coefficients for one band
fn design_band(band: &EqBandConfig, sample_rate_hz: f32) -> Result<Coefficients<f32>> {
    // .hz() asserts on non-positive values, so reject those here
    if band.center_hz <= 0.0 || band.q <= 0.0 {
        return Err(Error::InvalidParameter(format!(
            "equalizer band needs positive center frequency and Q, got {} Hz / Q {}",
            band.center_hz, band.q
        )));
    }

    Coefficients::<f32>::from_params(
        Type::PeakingEQ(band.gain_db),
        sample_rate_hz.hz(),
        band.center_hz.hz(),
        band.q,
    )
    .map_err(|e| {
        Error::FilterDesign(format!(
            "band at {} Hz rejected: {:?}",
            band.center_hz, e
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::PI;

    fn sine(freq: f32, sample_rate: f32, len: usize) -> Vec<f32> {
        (0..len)
            .map(|i| (2.0 * PI * freq * i as f32 / sample_rate).sin() * 0.25)
            .collect()
    }

    fn rms(samples: &[f32]) -> f32 {
        (samples.iter().map(|&s| s * s).sum::<f32>() / samples.len() as f32).sqrt()
    }

    #[test]
    fn test_default_config_builds() {
        let eq = Equalizer::new(EqualizerConfig::default(), 16000.0).unwrap();
        assert_eq!(eq.num_bands(), 5);
    }

    #[test]
    fn test_band_above_nyquist_rejected() {
        let config = EqualizerConfig {
            bands: vec![EqBandConfig {
                center_hz: 9000.0,
                gain_db: 0.0,
                q: Q_BUTTERWORTH_F32,
            }],
        };
        assert!(Equalizer::new(config, 16000.0).is_err());
    }

    #[test]
    fn test_unity_bands_are_transparent() {
        let mut eq = Equalizer::new(EqualizerConfig::default(), 16000.0).unwrap();
        let input = sine(1000.0, 16000.0, 1024);
        let mut output = input.clone();

        eq.process(&mut output);

        for (a, b) in input.iter().zip(&output) {
            assert!((a - b).abs() < 1e-4, "transparent cascade altered signal");
        }
    }

    #[test]
    fn test_boost_raises_level_at_center() {
        let mut eq = Equalizer::new(EqualizerConfig::default(), 16000.0).unwrap();
        eq.set_band_gain(2, 6.0).unwrap(); // +6 dB at 1 kHz

        let input = sine(1000.0, 16000.0, 8192);
        let mut output = input.clone();
        eq.process(&mut output);

        // Compare steady-state level, skipping the filter transient
        let in_level = rms(&input[2048..]);
        let out_level = rms(&output[2048..]);
        assert!(
            out_level > in_level * 1.5,
            "boost had no effect: {} vs {}",
            out_level,
            in_level
        );
    }

    #[test]
    fn test_cut_lowers_level_at_center() {
        let mut eq = Equalizer::new(EqualizerConfig::default(), 16000.0).unwrap();
        eq.set_band_gain(2, -12.0).unwrap();

        let input = sine(1000.0, 16000.0, 8192);
        let mut output = input.clone();
        eq.process(&mut output);

        let in_level = rms(&input[2048..]);
        let out_level = rms(&output[2048..]);
        assert!(out_level < in_level * 0.6);
    }

    #[test]
    fn test_band_index_out_of_range() {
        let mut eq = Equalizer::new(EqualizerConfig::default(), 16000.0).unwrap();
        assert!(eq.set_band_gain(99, 3.0).is_err());
        assert!(eq.band_gain_db(99).is_err());
        assert_eq!(eq.band_gain_db(0).unwrap(), 0.0);
    }
}
