//! Lock-free monitor taps
//!
//! The enhancement engine runs under a hard periodic deadline and must never
//! block, so cross-task observability goes through plain atomics: the owner
//! stores after each frame, readers load whenever they like. Float values
//! travel as raw bits in `AtomicU32`.

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;

/// Shared storage behind every monitor handle
#[derive(Debug)]
struct MonitorShared {
    voice_active: AtomicBool,
    activity_level: AtomicU32,
    noise_floor: AtomicU32,
    snr_db: AtomicU32,
}

impl Default for MonitorShared {
    fn default() -> Self {
        Self {
            voice_active: AtomicBool::new(false),
            activity_level: AtomicU32::new(0.0f32.to_bits()),
            noise_floor: AtomicU32::new(0.0f32.to_bits()),
            snr_db: AtomicU32::new(0.0f32.to_bits()),
        }
    }
}

/// A consistent copy of the monitor values at one point in time
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnhancerSnapshot {
    /// Whether the detector currently reports speech
    pub voice_active: bool,
    /// Most recent frame energy
    pub activity_level: f32,
    /// Scalar noise-floor estimate
    pub noise_floor: f32,
    /// Smoothed signal-to-noise ratio in dB
    pub snr_db: f32,
}

/// Cloneable, lock-free view of the engine's scalar outputs
///
/// Handles can be passed to UI or mute-logic tasks; reads never block the
/// owning audio task.
#[derive(Debug, Clone)]
pub struct EnhancerMonitor {
    shared: Arc<MonitorShared>,
}

impl EnhancerMonitor {
    pub(crate) fn new() -> Self {
        Self {
            shared: Arc::new(MonitorShared::default()),
        }
    }

    /// Store the per-frame values (owner task only)
    pub(crate) fn publish(
        &self,
        voice_active: bool,
        activity_level: f32,
        noise_floor: f32,
        snr_db: f32,
    ) {
        let shared = &self.shared;
        shared.voice_active.store(voice_active, Ordering::Relaxed);
        shared
            .activity_level
            .store(activity_level.to_bits(), Ordering::Relaxed);
        shared
            .noise_floor
            .store(noise_floor.to_bits(), Ordering::Relaxed);
        shared.snr_db.store(snr_db.to_bits(), Ordering::Relaxed);
    }

    /// Whether the detector currently reports speech
    pub fn voice_active(&self) -> bool {
        self.shared.voice_active.load(Ordering::Relaxed)
    }

    /// Most recent frame energy
    pub fn activity_level(&self) -> f32 {
        f32::from_bits(self.shared.activity_level.load(Ordering::Relaxed))
    }

    /// Scalar noise-floor estimate
    pub fn noise_floor(&self) -> f32 {
        f32::from_bits(self.shared.noise_floor.load(Ordering::Relaxed))
    }

    /// Smoothed signal-to-noise ratio in dB
    pub fn snr_db(&self) -> f32 {
        f32::from_bits(self.shared.snr_db.load(Ordering::Relaxed))
    }

    /// Copy all values at once
    pub fn snapshot(&self) -> EnhancerSnapshot {
        EnhancerSnapshot {
            voice_active: self.voice_active(),
            activity_level: self.activity_level(),
            noise_floor: self.noise_floor(),
            snr_db: self.snr_db(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_publish_and_read() {
        let monitor = EnhancerMonitor::new();
        monitor.publish(true, 0.25, 0.01, 14.0);

        assert!(monitor.voice_active());
        assert_eq!(monitor.activity_level(), 0.25);
        assert_eq!(monitor.noise_floor(), 0.01);
        assert_eq!(monitor.snr_db(), 14.0);
    }

    #[test]
    fn test_clones_share_storage() {
        let monitor = EnhancerMonitor::new();
        let reader = monitor.clone();

        monitor.publish(true, 0.5, 0.02, 20.0);
        let snapshot = reader.snapshot();
        assert!(snapshot.voice_active);
        assert_eq!(snapshot.activity_level, 0.5);
    }

    #[test]
    fn test_reads_from_other_thread() {
        let monitor = EnhancerMonitor::new();
        let reader = monitor.clone();

        monitor.publish(false, 0.1, 0.005, 3.0);
        let handle = std::thread::spawn(move || reader.snapshot());
        let snapshot = handle.join().unwrap();
        assert!(!snapshot.voice_active);
        assert_eq!(snapshot.noise_floor, 0.005);
    }
}
