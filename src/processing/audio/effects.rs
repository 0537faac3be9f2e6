//! Post-suppression effects chain
//!
//! An ordered pipeline of tagged processing stages (AGC, equalizer,
//! compressor, limiter) run over each reconstructed frame. Every stage is
//! independently toggleable; the enable flag is checked once per frame, never
//! per sample.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::Result;
use crate::processing::audio::agc::{AgcConfig, AutomaticGainControl};
use crate::processing::audio::dynamics::{
    Compressor, CompressorConfig, Limiter, LimiterConfig,
};
use crate::processing::audio::equalizer::{Equalizer, EqualizerConfig};

/// Configuration for the full effects chain
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EffectsConfig {
    /// Enable the AGC stage
    pub agc_enabled: bool,
    /// AGC parameters
    pub agc: AgcConfig,
    /// Enable the equalizer stage
    pub equalizer_enabled: bool,
    /// Equalizer parameters
    pub equalizer: EqualizerConfig,
    /// Enable the compressor stage
    pub compressor_enabled: bool,
    /// Compressor parameters
    pub compressor: CompressorConfig,
    /// Enable the limiter stage
    pub limiter_enabled: bool,
    /// Limiter parameters
    pub limiter: LimiterConfig,
}

impl Default for EffectsConfig {
    fn default() -> Self {
        Self {
            agc_enabled: true,
            agc: AgcConfig::default(),
            equalizer_enabled: true,
            equalizer: EqualizerConfig::default(),
            // Dynamics stages ship disabled
            compressor_enabled: false,
            compressor: CompressorConfig::default(),
            limiter_enabled: false,
            limiter: LimiterConfig::default(),
        }
    }
}

/// A tagged processing stage
enum StageKind {
    Agc(AutomaticGainControl),
    Equalizer(Equalizer),
    Compressor(Compressor),
    Limiter(Limiter),
}

impl StageKind {
    fn apply(&mut self, frame: &mut [f32]) {
        match self {
            StageKind::Agc(agc) => agc.process(frame),
            StageKind::Equalizer(eq) => eq.process(frame),
            StageKind::Compressor(comp) => comp.process(frame),
            StageKind::Limiter(limiter) => limiter.process(frame),
        }
    }

    fn reset(&mut self) {
        match self {
            StageKind::Agc(agc) => agc.reset(),
            StageKind::Equalizer(eq) => eq.reset(),
            StageKind::Compressor(comp) => comp.reset(),
            StageKind::Limiter(limiter) => limiter.reset(),
        }
    }

    fn name(&self) -> &'static str {
        match self {
            StageKind::Agc(_) => "agc",
            StageKind::Equalizer(_) => "equalizer",
            StageKind::Compressor(_) => "compressor",
            StageKind::Limiter(_) => "limiter",
        }
    }
}

/// One gated stage of the chain
struct EffectStage {
    kind: StageKind,
    enabled: bool,
}

/// Ordered, independently toggleable effects pipeline
pub struct EffectsChain {
    stages: Vec<EffectStage>,
}

impl EffectsChain {
    /// Build the chain in its fixed order: AGC, equalizer, compressor, limiter
    pub fn new(config: EffectsConfig, sample_rate_hz: f32) -> Result<Self> {
        let stages = vec![
            EffectStage {
                kind: StageKind::Agc(AutomaticGainControl::new(config.agc)?),
                enabled: config.agc_enabled,
            },
            EffectStage {
                kind: StageKind::Equalizer(Equalizer::new(config.equalizer, sample_rate_hz)?),
                enabled: config.equalizer_enabled,
            },
            EffectStage {
                kind: StageKind::Compressor(Compressor::new(config.compressor)?),
                enabled: config.compressor_enabled,
            },
            EffectStage {
                kind: StageKind::Limiter(Limiter::new(config.limiter)?),
                enabled: config.limiter_enabled,
            },
        ];

        debug!(
            "Created EffectsChain: [{}]",
            stages
                .iter()
                .map(|s| format!("{}={}", s.kind.name(), s.enabled))
                .collect::<Vec<_>>()
                .join(", ")
        );

        Ok(Self { stages })
    }

    /// Run all enabled stages over the frame in order
    pub fn process(&mut self, frame: &mut [f32]) {
        for stage in self.stages.iter_mut() {
            if stage.enabled {
                stage.kind.apply(frame);
            }
        }
    }

    /// Clear the state of every stage
    pub fn reset(&mut self) {
        for stage in self.stages.iter_mut() {
            stage.kind.reset();
        }
    }

    /// Enable or disable the AGC stage
    pub fn set_agc_enabled(&mut self, enabled: bool) {
        self.set_enabled("agc", enabled);
    }

    /// Enable or disable the equalizer stage
    pub fn set_equalizer_enabled(&mut self, enabled: bool) {
        self.set_enabled("equalizer", enabled);
    }

    /// Enable or disable the compressor stage
    pub fn set_compressor_enabled(&mut self, enabled: bool) {
        self.set_enabled("compressor", enabled);
    }

    /// Enable or disable the limiter stage
    pub fn set_limiter_enabled(&mut self, enabled: bool) {
        self.set_enabled("limiter", enabled);
    }

    fn set_enabled(&mut self, name: &str, enabled: bool) {
        for stage in self.stages.iter_mut() {
            if stage.kind.name() == name {
                stage.enabled = enabled;
            }
        }
    }

    /// Mutable access to the AGC stage
    pub fn agc_mut(&mut self) -> &mut AutomaticGainControl {
        for stage in self.stages.iter_mut() {
            if let StageKind::Agc(agc) = &mut stage.kind {
                return agc;
            }
        }
        unreachable!("chain is always built with an AGC stage")
    }

    /// Mutable access to the equalizer stage
    pub fn equalizer_mut(&mut self) -> &mut Equalizer {
        for stage in self.stages.iter_mut() {
            if let StageKind::Equalizer(eq) = &mut stage.kind {
                return eq;
            }
        }
        unreachable!("chain is always built with an equalizer stage")
    }
}
