//! Voice Activity Detection (VAD)
//!
//! This module implements voice activity detection to distinguish between
//! speech and silence in the capture stream. The decision combines frame
//! energy and zero-crossing rate with a trigger count on the way into voice
//! and a hangover counter on the way out, so trailing speech is not clipped.

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::error::{Error, Result};

/// Configuration for Voice Activity Detection
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VadConfig {
    /// Energy threshold for voice detection (RMS of normalized samples)
    pub energy_threshold: f32,
    /// Zero crossing rate threshold
    pub zcr_threshold: f32,
    /// Consecutive raw-active frames required to enter voice
    pub trigger_frames: u32,
    /// Frames to keep reporting voice after activity drops
    pub hangover_frames: u32,
    /// Smoothing factor for the energy diagnostic (0.0-1.0)
    pub energy_smoothing: f32,
}

impl Default for VadConfig {
    fn default() -> Self {
        Self {
            energy_threshold: 0.02,
            zcr_threshold: 0.1,
            trigger_frames: 3,
            hangover_frames: 5,
            energy_smoothing: 0.9, // 90% history, 10% current
        }
    }
}

/// Discrete detector state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VadState {
    /// No confirmed speech
    Silence,
    /// Confirmed speech (including hangover)
    Voice,
}

/// Result of analyzing one frame
#[derive(Debug, Clone, Copy)]
pub struct VadResult {
    /// Detector state after this frame
    pub state: VadState,
    /// Whether this frame alone crossed both thresholds
    pub raw_active: bool,
    /// RMS energy of the frame (0.0-1.0)
    pub energy: f32,
    /// Zero crossing rate (0.0-1.0)
    pub zero_crossing_rate: f32,
}

/// Voice Activity Detector
pub struct VoiceActivityDetector {
    /// VAD configuration
    config: VadConfig,
    /// Current discrete state
    state: VadState,
    /// Consecutive raw-active frames while in silence
    trigger_count: u32,
    /// Remaining hangover frames
    hangover_count: u32,
    /// Smoothed energy diagnostic
    smoothed_energy: f32,
    /// Ring of recent (energy, zcr) pairs, length = hangover_frames
    history: Vec<(f32, f32)>,
    /// Next write position in the history ring
    history_pos: usize,
    /// Frames analyzed since creation/reset
    frame_count: u64,
}

impl VoiceActivityDetector {
    /// Create a new VAD with the given configuration
    pub fn new(config: VadConfig) -> Result<Self> {
        debug!("Creating VoiceActivityDetector with config: {:?}", config);

        if config.energy_threshold <= 0.0 || config.energy_threshold >= 1.0 {
            return Err(Error::InvalidParameter(
                "VAD energy threshold must be between 0.0 and 1.0".to_string(),
            ));
        }
        if config.zcr_threshold <= 0.0 || config.zcr_threshold >= 1.0 {
            return Err(Error::InvalidParameter(
                "VAD zcr threshold must be between 0.0 and 1.0".to_string(),
            ));
        }
        if config.energy_smoothing < 0.0 || config.energy_smoothing > 1.0 {
            return Err(Error::InvalidParameter(
                "VAD energy smoothing must be between 0.0 and 1.0".to_string(),
            ));
        }
        if config.trigger_frames == 0 || config.hangover_frames == 0 {
            return Err(Error::InvalidParameter(
                "VAD trigger and hangover frame counts must be nonzero".to_string(),
            ));
        }

        let history_len = config.hangover_frames as usize;
        Ok(Self {
            config,
            state: VadState::Silence,
            trigger_count: 0,
            hangover_count: 0,
            smoothed_energy: 0.0,
            history: vec![(0.0, 0.0); history_len],
            history_pos: 0,
            frame_count: 0,
        })
    }

    /// Analyze one frame of normalized ([-1, 1]) samples
    pub fn update(&mut self, samples: &[f32]) -> VadResult {
        let energy = calculate_energy(samples);
        let zcr = calculate_zero_crossing_rate(samples);

        self.history[self.history_pos] = (energy, zcr);
        self.history_pos = (self.history_pos + 1) % self.history.len();

        if self.frame_count == 0 {
            self.smoothed_energy = energy;
        } else {
            self.smoothed_energy = self.config.energy_smoothing * self.smoothed_energy
                + (1.0 - self.config.energy_smoothing) * energy;
        }
        self.frame_count += 1;

        let raw_active = energy > self.config.energy_threshold && zcr > self.config.zcr_threshold;

        if raw_active {
            self.hangover_count = self.config.hangover_frames;
            if self.state == VadState::Silence {
                self.trigger_count += 1;
                if self.trigger_count >= self.config.trigger_frames {
                    self.state = VadState::Voice;
                }
            }
        } else {
            self.trigger_count = 0;
            if self.state == VadState::Voice {
                if self.hangover_count > 0 {
                    self.hangover_count -= 1;
                } else {
                    self.state = VadState::Silence;
                }
            }
        }

        trace!(
            "VAD: energy={:.4}, zcr={:.4}, raw={}, state={:?}",
            energy,
            zcr,
            raw_active,
            self.state
        );

        VadResult {
            state: self.state,
            raw_active,
            energy,
            zero_crossing_rate: zcr,
        }
    }

    /// Current discrete state
    pub fn state(&self) -> VadState {
        self.state
    }

    /// Whether speech is currently reported
    pub fn is_voice(&self) -> bool {
        self.state == VadState::Voice
    }

    /// Most recent frame energy (the activity level diagnostic)
    pub fn activity_level(&self) -> f32 {
        let last = (self.history_pos + self.history.len() - 1) % self.history.len();
        self.history[last].0
    }

    /// Smoothed energy diagnostic
    pub fn smoothed_energy(&self) -> f32 {
        self.smoothed_energy
    }

    /// Clear counters, history, and state back to silence
    pub fn reset(&mut self) {
        self.state = VadState::Silence;
        self.trigger_count = 0;
        self.hangover_count = 0;
        self.smoothed_energy = 0.0;
        self.history.fill((0.0, 0.0));
        self.history_pos = 0;
        self.frame_count = 0;
        debug!("VAD state reset");
    }

    /// Update the decision thresholds (between frames only)
    pub fn set_thresholds(&mut self, energy_threshold: f32, zcr_threshold: f32) -> Result<()> {
        if energy_threshold <= 0.0 || energy_threshold >= 1.0 {
            return Err(Error::InvalidParameter(
                "VAD energy threshold must be between 0.0 and 1.0".to_string(),
            ));
        }
        if zcr_threshold <= 0.0 || zcr_threshold >= 1.0 {
            return Err(Error::InvalidParameter(
                "VAD zcr threshold must be between 0.0 and 1.0".to_string(),
            ));
        }
        self.config.energy_threshold = energy_threshold;
        self.config.zcr_threshold = zcr_threshold;
        Ok(())
    }
}

/// RMS energy of normalized samples
fn calculate_energy(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }
    let sum_squares: f32 = samples.iter().map(|&s| s * s).sum();
    (sum_squares / samples.len() as f32).sqrt()
}

/// Zero crossing rate, counting strict sign changes
fn calculate_zero_crossing_rate(samples: &[f32]) -> f32 {
    if samples.len() < 2 {
        return 0.0;
    }
    let mut crossings = 0u32;
    for i in 1..samples.len() {
        if (samples[i] > 0.0 && samples[i - 1] < 0.0) || (samples[i] < 0.0 && samples[i - 1] > 0.0)
        {
            crossings += 1;
        }
    }
    crossings as f32 / samples.len() as f32
}

#[cfg(test)]
mod tests {
    use super::*;

    fn active_frame(len: usize) -> Vec<f32> {
        // Alternating full-scale samples: high energy and maximal zcr
        (0..len)
            .map(|i| if i % 2 == 0 { 0.5 } else { -0.5 })
            .collect()
    }

    fn silent_frame(len: usize) -> Vec<f32> {
        vec![0.0; len]
    }

    #[test]
    fn test_config_validation() {
        let mut config = VadConfig::default();
        config.energy_threshold = 0.0;
        assert!(VoiceActivityDetector::new(config).is_err());

        let mut config = VadConfig::default();
        config.zcr_threshold = 1.5;
        assert!(VoiceActivityDetector::new(config).is_err());

        let mut config = VadConfig::default();
        config.trigger_frames = 0;
        assert!(VoiceActivityDetector::new(config).is_err());

        assert!(VoiceActivityDetector::new(VadConfig::default()).is_ok());
    }

    #[test]
    fn test_silence_stays_silent() {
        let mut vad = VoiceActivityDetector::new(VadConfig::default()).unwrap();
        for _ in 0..20 {
            let result = vad.update(&silent_frame(160));
            assert_eq!(result.state, VadState::Silence);
            assert!(!result.raw_active);
        }
        assert!(!vad.is_voice());
    }

    #[test]
    fn test_trigger_count_gates_voice_onset() {
        let config = VadConfig::default(); // trigger_frames = 3
        let mut vad = VoiceActivityDetector::new(config).unwrap();

        assert_eq!(vad.update(&active_frame(160)).state, VadState::Silence);
        assert_eq!(vad.update(&active_frame(160)).state, VadState::Silence);
        // Exactly at the trigger count, not earlier
        assert_eq!(vad.update(&active_frame(160)).state, VadState::Voice);
    }

    #[test]
    fn test_single_active_frame_does_not_trigger() {
        let mut vad = VoiceActivityDetector::new(VadConfig::default()).unwrap();

        vad.update(&active_frame(160));
        for _ in 0..10 {
            assert_eq!(vad.update(&silent_frame(160)).state, VadState::Silence);
        }
    }

    #[test]
    fn test_hangover_holds_voice() {
        let config = VadConfig::default(); // hangover_frames = 5
        let hangover = config.hangover_frames;
        let mut vad = VoiceActivityDetector::new(config).unwrap();

        for _ in 0..3 {
            vad.update(&active_frame(160));
        }
        assert!(vad.is_voice());

        // Voice holds through exactly `hangover` silent frames
        for i in 0..hangover {
            let result = vad.update(&silent_frame(160));
            assert_eq!(result.state, VadState::Voice, "dropped early at frame {}", i);
        }
        assert_eq!(vad.update(&silent_frame(160)).state, VadState::Silence);
    }

    #[test]
    fn test_activity_during_hangover_rearms() {
        let mut vad = VoiceActivityDetector::new(VadConfig::default()).unwrap();

        for _ in 0..3 {
            vad.update(&active_frame(160));
        }
        vad.update(&silent_frame(160));
        vad.update(&silent_frame(160));
        // Raw activity resets the hangover counter
        vad.update(&active_frame(160));
        for _ in 0..5 {
            assert_eq!(vad.update(&silent_frame(160)).state, VadState::Voice);
        }
        assert_eq!(vad.update(&silent_frame(160)).state, VadState::Silence);
    }

    #[test]
    fn test_reset_returns_to_silence() {
        let mut vad = VoiceActivityDetector::new(VadConfig::default()).unwrap();
        for _ in 0..3 {
            vad.update(&active_frame(160));
        }
        assert!(vad.is_voice());

        vad.reset();
        assert!(!vad.is_voice());
        assert_eq!(vad.activity_level(), 0.0);
        assert_eq!(vad.smoothed_energy(), 0.0);
        // Trigger count is cleared too: one active frame is not enough
        assert_eq!(vad.update(&active_frame(160)).state, VadState::Silence);
    }

    #[test]
    fn test_energy_only_is_not_active() {
        // DC offset: high energy but zero crossings
        let mut vad = VoiceActivityDetector::new(VadConfig::default()).unwrap();
        let dc = vec![0.5f32; 160];
        for _ in 0..10 {
            let result = vad.update(&dc);
            assert!(!result.raw_active);
            assert_eq!(result.state, VadState::Silence);
        }
    }
}
