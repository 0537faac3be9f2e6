//! Enhancement engine
//!
//! The engine module ties the processing components into one deterministic
//! per-frame pipeline and exposes the lifecycle, configuration, and monitor
//! surface consumed by the rest of the firmware.

pub mod enhancer;
pub mod monitor;

// Re-export main types
pub use enhancer::{AudioEnhancer, EnhancerConfig};
pub use monitor::{EnhancerMonitor, EnhancerSnapshot};
