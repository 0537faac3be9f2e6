//! Frame orchestrator
//!
//! [`AudioEnhancer`] owns the whole per-frame pipeline: VAD update, the
//! windowed spectral path with noise suppression, overlap-add
//! reconstruction, the effects chain, and the final saturating PCM
//! conversion. It is constructed once, owned by exactly one periodic capture
//! task, and passed by reference into the stateless processing functions of
//! the component modules; there is no global state.

use num_complex::Complex32;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::engine::monitor::EnhancerMonitor;
use crate::error::{Error, Result};
use crate::processing::audio::effects::{EffectsChain, EffectsConfig};
use crate::processing::audio::ns::{NoiseSuppressor, NsConfig};
use crate::processing::audio::vad::{VadConfig, VadState, VoiceActivityDetector};
use crate::processing::spectral::overlap::OverlapAdd;
use crate::processing::spectral::transform::{
    SpectralTransform, MAX_TRANSFORM_SIZE, MIN_TRANSFORM_SIZE,
};
use crate::{AudioFrame, Sample, SampleRate};

/// Scale factor between i16 PCM and normalized float samples
const PCM_SCALE: f32 = 32768.0;

/// Guard for the SNR diagnostic's log argument
const LEVEL_EPSILON: f32 = 1e-10;

/// Configuration for the enhancement engine
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnhancerConfig {
    /// Capture sample rate
    pub sample_rate: SampleRate,
    /// Spectral transform size in samples (power of two)
    pub transform_size: usize,
    /// Apply the Wiener gain to the magnitude spectrum
    pub suppression_enabled: bool,
    /// Voice activity detector parameters
    pub vad: VadConfig,
    /// Noise estimation/suppression parameters
    pub ns: NsConfig,
    /// Effects chain parameters
    pub effects: EffectsConfig,
}

impl Default for EnhancerConfig {
    fn default() -> Self {
        Self {
            sample_rate: SampleRate::Rate16000,
            transform_size: 512, // 32ms at 16kHz
            suppression_enabled: true,
            vad: VadConfig::default(),
            ns: NsConfig::default(),
            effects: EffectsConfig::default(),
        }
    }
}

/// DSP buffers allocated by `begin()` and released by `end()`
struct DspState {
    /// Windowed FFT/IFFT pair
    transform: SpectralTransform,
    /// Overlap-add reconstructor
    overlap: OverlapAdd,
    /// Normalized input scratch
    input_f: Vec<f32>,
    /// Windowed analysis / synthesis scratch
    synthesis: Vec<f32>,
    /// Reconstructed output scratch
    output_f: Vec<f32>,
    /// Complex spectrum scratch
    spectrum: Vec<Complex32>,
    /// Lower half-spectrum magnitude
    magnitude: Vec<f32>,
    /// Lower half-spectrum phase
    phase: Vec<f32>,
    /// Per-bin Wiener gain scratch
    gain: Vec<f32>,
}

impl DspState {
    fn new(transform_size: usize) -> Result<Self> {
        let transform = SpectralTransform::new(transform_size)?;
        let half = transform.half_size();
        Ok(Self {
            transform,
            overlap: OverlapAdd::new(transform_size),
            input_f: vec![0.0; transform_size],
            synthesis: vec![0.0; transform_size],
            output_f: vec![0.0; transform_size],
            spectrum: vec![Complex32::default(); transform_size],
            magnitude: vec![0.0; half],
            phase: vec![0.0; half],
            gain: vec![0.0; half],
        })
    }
}

/// Real-time voice enhancement engine
///
/// Not safe for concurrent frame processing: all adaptive state (noise
/// spectrum, VAD history, overlap tail, effects state) is exclusively owned
/// mutable state of the one task that calls [`AudioEnhancer::process_frame`].
/// Other tasks observe through the [`EnhancerMonitor`] handle.
pub struct AudioEnhancer {
    /// Engine configuration
    config: EnhancerConfig,
    /// Voice activity detector
    vad: VoiceActivityDetector,
    /// Noise estimator and Wiener suppressor
    suppressor: NoiseSuppressor,
    /// Post-suppression effects chain
    effects: EffectsChain,
    /// Buffers owned between `begin()` and `end()`
    dsp: Option<DspState>,
    /// Lock-free observer taps
    monitor: EnhancerMonitor,
    /// Frames processed since `begin()`
    frames_processed: u64,
}

impl AudioEnhancer {
    /// Create an engine from the given configuration
    ///
    /// Validates the configuration and builds the adaptive components; the
    /// frame-sized DSP buffers are not allocated until [`begin()`].
    ///
    /// [`begin()`]: AudioEnhancer::begin
    pub fn new(config: EnhancerConfig) -> Result<Self> {
        debug!(
            "Creating AudioEnhancer: rate={} Hz, transform={}",
            config.sample_rate.as_hz(),
            config.transform_size
        );

        if !config.transform_size.is_power_of_two()
            || config.transform_size < MIN_TRANSFORM_SIZE
            || config.transform_size > MAX_TRANSFORM_SIZE
        {
            return Err(Error::UnsupportedTransformSize(config.transform_size));
        }

        let vad = VoiceActivityDetector::new(config.vad.clone())?;
        let suppressor = NoiseSuppressor::new(config.ns.clone(), config.transform_size / 2)?;
        let effects = EffectsChain::new(
            config.effects.clone(),
            config.sample_rate.as_hz() as f32,
        )?;

        Ok(Self {
            config,
            vad,
            suppressor,
            effects,
            dsp: None,
            monitor: EnhancerMonitor::new(),
            frames_processed: 0,
        })
    }

    /// Allocate the DSP buffers and arm the adaptive state
    ///
    /// Independent of the capture lifecycle; calling `begin()` on a running
    /// engine reinitializes it (fresh buffers, cleared adaptive state).
    pub fn begin(&mut self) -> Result<()> {
        self.dsp = Some(DspState::new(self.config.transform_size)?);
        self.vad.reset();
        self.suppressor.reset();
        self.effects.reset();
        self.frames_processed = 0;
        debug!("AudioEnhancer initialized");
        Ok(())
    }

    /// Release all DSP buffers
    ///
    /// After `end()`, frame processing fails until the next [`begin()`].
    ///
    /// [`begin()`]: AudioEnhancer::begin
    pub fn end(&mut self) {
        self.dsp = None;
        debug!("AudioEnhancer released");
    }

    /// Whether the engine currently holds its DSP buffers
    pub fn is_initialized(&self) -> bool {
        self.dsp.is_some()
    }

    /// Process one captured frame into `output`
    ///
    /// Frames whose length matches the transform size run the full spectral
    /// path; any other length is an explicit pass-through copy. Fails only if
    /// the engine is uninitialized or the output slice length does not match
    /// the input.
    pub fn process_frame(&mut self, input: &[Sample], output: &mut [Sample]) -> Result<()> {
        let dsp = self.dsp.as_mut().ok_or_else(|| {
            Error::InvalidState("engine not initialized; call begin() first".to_string())
        })?;
        if input.len() != output.len() {
            return Err(Error::InvalidParameter(format!(
                "output length {} does not match input length {}",
                output.len(),
                input.len()
            )));
        }

        // Normalize to [-1, 1]
        dsp.input_f.resize(input.len(), 0.0);
        for (dst, &s) in dsp.input_f.iter_mut().zip(input) {
            *dst = s as f32 / PCM_SCALE;
        }

        // VAD always runs first; the first confirmed voice frame freezes the
        // noise estimate
        let vad_result = self.vad.update(&dsp.input_f);
        if vad_result.state == VadState::Voice {
            self.suppressor.freeze();
        }

        if input.len() == self.config.transform_size {
            // Analysis window
            dsp.synthesis.copy_from_slice(&dsp.input_f);
            dsp.transform.apply_window(&mut dsp.synthesis);

            dsp.transform.forward(&dsp.synthesis, &mut dsp.spectrum);
            dsp.transform
                .magnitude_phase(&dsp.spectrum, &mut dsp.magnitude, &mut dsp.phase);

            // Noise learning only during confirmed silence
            if vad_result.state == VadState::Silence {
                self.suppressor.update_noise(&dsp.magnitude);
            }

            if self.config.suppression_enabled {
                self.suppressor.wiener_gain(&dsp.magnitude, &mut dsp.gain);
                for (mag, &g) in dsp.magnitude.iter_mut().zip(&dsp.gain) {
                    *mag *= g;
                }
            }

            // Phase is reused unmodified
            dsp.transform
                .rebuild_spectrum(&dsp.magnitude, &dsp.phase, &mut dsp.spectrum);
            dsp.transform.inverse(&mut dsp.spectrum, &mut dsp.synthesis);

            // Synthesis window, then stitch with the previous tail
            dsp.transform.apply_window(&mut dsp.synthesis);
            dsp.overlap.reconstruct(&dsp.synthesis, &mut dsp.output_f);

            self.effects.process(&mut dsp.output_f);
            write_saturated(&dsp.output_f, output);
        } else {
            // Defined fallback, not a failure
            trace!(
                "frame length {} != transform size {}, passing through",
                input.len(),
                self.config.transform_size
            );
            write_saturated(&dsp.input_f, output);
        }

        self.frames_processed += 1;
        self.publish_monitor(vad_result.energy);
        Ok(())
    }

    /// Convenience wrapper processing an [`AudioFrame`] into a new frame
    pub fn process(&mut self, frame: &AudioFrame) -> Result<AudioFrame> {
        if frame.channels != 1 {
            return Err(Error::InvalidParameter(format!(
                "engine processes mono frames, got {} channels",
                frame.channels
            )));
        }

        let mut samples = vec![0; frame.samples.len()];
        self.process_frame(&frame.samples, &mut samples)?;
        Ok(AudioFrame::new(
            samples,
            frame.sample_rate,
            frame.channels,
            frame.timestamp,
        ))
    }

    /// Whether the detector currently reports speech
    pub fn is_voice_active(&self) -> bool {
        self.vad.is_voice()
    }

    /// Most recent frame energy
    pub fn voice_activity_level(&self) -> f32 {
        self.vad.activity_level()
    }

    /// Scalar noise-floor estimate (mean of the noise spectrum)
    pub fn noise_floor(&self) -> f32 {
        self.suppressor.noise_floor()
    }

    /// Smoothed signal-to-noise ratio in dB
    pub fn snr_db(&self) -> f32 {
        snr_db(self.vad.smoothed_energy(), self.suppressor.noise_floor())
    }

    /// Cloneable lock-free view of the scalar outputs
    pub fn monitor(&self) -> EnhancerMonitor {
        self.monitor.clone()
    }

    /// Frames processed since the last `begin()`
    pub fn frames_processed(&self) -> u64 {
        self.frames_processed
    }

    /// Current configuration
    pub fn config(&self) -> &EnhancerConfig {
        &self.config
    }

    // ---- between-frame configuration and recovery ----

    /// Update the VAD decision thresholds
    pub fn set_vad_thresholds(&mut self, energy_threshold: f32, zcr_threshold: f32) -> Result<()> {
        self.vad.set_thresholds(energy_threshold, zcr_threshold)
    }

    /// Enable or disable spectral suppression (the learned noise estimate is
    /// kept either way)
    pub fn set_noise_suppression(&mut self, enabled: bool) {
        self.config.suppression_enabled = enabled;
    }

    /// Update the minimum Wiener gain
    pub fn set_suppression_floor(&mut self, floor: f32) -> Result<()> {
        self.suppressor.set_spectral_floor(floor)
    }

    /// Enable or disable the AGC stage
    pub fn set_agc_enabled(&mut self, enabled: bool) {
        self.effects.set_agc_enabled(enabled);
    }

    /// Update the AGC target level
    pub fn set_agc_target(&mut self, target_rms: f32) -> Result<()> {
        self.effects.agc_mut().set_target(target_rms)
    }

    /// Enable or disable the equalizer stage
    pub fn set_equalizer_enabled(&mut self, enabled: bool) {
        self.effects.set_equalizer_enabled(enabled);
    }

    /// Update one equalizer band's gain
    pub fn set_eq_band_gain(&mut self, band: usize, gain_db: f32) -> Result<()> {
        self.effects.equalizer_mut().set_band_gain(band, gain_db)
    }

    /// Enable or disable the compressor stage
    pub fn set_compressor_enabled(&mut self, enabled: bool) {
        self.effects.set_compressor_enabled(enabled);
    }

    /// Enable or disable the limiter stage
    pub fn set_limiter_enabled(&mut self, enabled: bool) {
        self.effects.set_limiter_enabled(enabled);
    }

    /// Return the detector to silence (fault recovery, reconnect events)
    pub fn reset_vad(&mut self) {
        self.vad.reset();
    }

    /// Re-arm noise estimation from its seed value
    pub fn reset_noise_estimation(&mut self) {
        self.suppressor.reset();
    }

    fn publish_monitor(&self, activity_level: f32) {
        let noise_floor = self.suppressor.noise_floor();
        self.monitor.publish(
            self.vad.is_voice(),
            activity_level,
            noise_floor,
            snr_db(self.vad.smoothed_energy(), noise_floor),
        );
    }
}

/// Smoothed-energy-over-noise-floor diagnostic in dB
fn snr_db(level: f32, noise_floor: f32) -> f32 {
    20.0 * ((level + LEVEL_EPSILON) / (noise_floor + LEVEL_EPSILON)).log10()
}

/// Convert normalized samples to i16, saturating at the representable range
fn write_saturated(source: &[f32], output: &mut [Sample]) {
    for (dst, &s) in output.iter_mut().zip(source) {
        *dst = (s * PCM_SCALE).clamp(i16::MIN as f32, i16::MAX as f32) as Sample;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_process_before_begin_fails() {
        let mut enhancer = AudioEnhancer::new(EnhancerConfig::default()).unwrap();
        let input = vec![0i16; 512];
        let mut output = vec![0i16; 512];

        let result = enhancer.process_frame(&input, &mut output);
        assert!(matches!(result, Err(Error::InvalidState(_))));
    }

    #[test]
    fn test_lifecycle() {
        let mut enhancer = AudioEnhancer::new(EnhancerConfig::default()).unwrap();
        assert!(!enhancer.is_initialized());

        enhancer.begin().unwrap();
        assert!(enhancer.is_initialized());

        let input = vec![0i16; 512];
        let mut output = vec![0i16; 512];
        enhancer.process_frame(&input, &mut output).unwrap();
        assert_eq!(enhancer.frames_processed(), 1);

        enhancer.end();
        assert!(!enhancer.is_initialized());
        assert!(enhancer.process_frame(&input, &mut output).is_err());

        // begin() after end() brings the engine back
        enhancer.begin().unwrap();
        enhancer.process_frame(&input, &mut output).unwrap();
    }

    #[test]
    fn test_invalid_transform_size_rejected() {
        let config = EnhancerConfig {
            transform_size: 500,
            ..EnhancerConfig::default()
        };
        assert!(matches!(
            AudioEnhancer::new(config),
            Err(Error::UnsupportedTransformSize(500))
        ));
    }

    #[test]
    fn test_length_mismatch_rejected() {
        let mut enhancer = AudioEnhancer::new(EnhancerConfig::default()).unwrap();
        enhancer.begin().unwrap();

        let input = vec![0i16; 512];
        let mut output = vec![0i16; 256];
        assert!(matches!(
            enhancer.process_frame(&input, &mut output),
            Err(Error::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_short_frame_passes_through() {
        let mut enhancer = AudioEnhancer::new(EnhancerConfig::default()).unwrap();
        enhancer.begin().unwrap();

        let input: Vec<i16> = (0..160).map(|i| (i * 50) as i16).collect();
        let mut output = vec![0i16; 160];
        enhancer.process_frame(&input, &mut output).unwrap();

        assert_eq!(output, input);
    }

    #[test]
    fn test_process_frame_wrapper() {
        let mut enhancer = AudioEnhancer::new(EnhancerConfig::default()).unwrap();
        enhancer.begin().unwrap();

        let frame = AudioFrame::silent(160, 16000, 0);
        let processed = enhancer.process(&frame).unwrap();
        assert_eq!(processed.samples.len(), 160);
        assert_eq!(processed.sample_rate, 16000);

        let stereo = AudioFrame::new(vec![0; 160], 16000, 2, 0);
        assert!(enhancer.process(&stereo).is_err());
    }

    #[test]
    fn test_rebegin_clears_adaptive_state() {
        let mut enhancer = AudioEnhancer::new(EnhancerConfig::default()).unwrap();
        enhancer.begin().unwrap();

        // Drive the detector into voice
        let loud: Vec<i16> = (0..512)
            .map(|i| if i % 2 == 0 { 12000 } else { -12000 })
            .collect();
        let mut output = vec![0i16; 512];
        for _ in 0..5 {
            enhancer.process_frame(&loud, &mut output).unwrap();
        }
        assert!(enhancer.is_voice_active());

        enhancer.begin().unwrap();
        assert!(!enhancer.is_voice_active());
        assert_eq!(enhancer.frames_processed(), 0);
    }

    #[test]
    fn test_saturating_output() {
        let samples = vec![2.0f32, -2.0, 0.5, -0.25];
        let mut output = vec![0i16; 4];
        write_saturated(&samples, &mut output);

        assert_eq!(output[0], i16::MAX);
        assert_eq!(output[1], i16::MIN);
        assert_eq!(output[2], 16384);
        assert_eq!(output[3], -8192);
    }
}
