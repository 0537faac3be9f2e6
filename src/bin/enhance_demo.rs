//! Demo driver for the voice enhancement engine
//!
//! Generates a synthetic capture session (noise lead-in, speech bursts,
//! trailing noise), runs it through the engine on a periodic cadence, and
//! prints what the monitor taps saw.

use std::f32::consts::PI;
use std::time::{Duration, Instant};

use clap::Parser;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use clearvoice_core::prelude::*;

/// Simple demo for the voice enhancement engine
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Sample rate in Hz
    #[arg(short, long, default_value = "16000")]
    sample_rate: u32,

    /// Transform size in samples (power of two)
    #[arg(short, long, default_value = "512")]
    transform_size: usize,

    /// Total frames to run
    #[arg(short, long, default_value = "300")]
    frames: usize,

    /// Background noise amplitude (normalized)
    #[arg(short, long, default_value = "0.008")]
    noise_amplitude: f32,

    /// Disable spectral suppression
    #[arg(long)]
    no_suppression: bool,

    /// Disable the AGC stage
    #[arg(long)]
    no_agc: bool,

    /// Pace frames at the real capture cadence instead of running flat out
    #[arg(long)]
    realtime: bool,

    /// Print the effective configuration as JSON and exit
    #[arg(long)]
    show_config: bool,
}

#[tokio::main]
async fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = Args::parse();

    let mut config = EnhancerConfig::default();
    config.sample_rate = SampleRate::from_hz(args.sample_rate);
    config.transform_size = args.transform_size;
    config.suppression_enabled = !args.no_suppression;
    config.effects.agc_enabled = !args.no_agc;

    if args.show_config {
        println!("{}", serde_json::to_string_pretty(&config)?);
        return Ok(());
    }

    let mut enhancer = AudioEnhancer::new(config)?;
    enhancer.begin()?;
    let monitor = enhancer.monitor();

    let frame_len = args.transform_size;
    let frame_ms = frame_len as u64 * 1000 / args.sample_rate as u64;
    println!(
        "Running {} frames of {} samples ({} ms each) at {} Hz",
        args.frames, frame_len, frame_ms, args.sample_rate
    );

    let mut rng = StdRng::seed_from_u64(7);
    let mut output = vec![0i16; frame_len];
    let mut voice_frames = 0usize;
    let mut transitions = 0usize;
    let mut was_active = false;

    let mut ticker = tokio::time::interval(Duration::from_millis(frame_ms.max(1)));
    let start = Instant::now();

    for n in 0..args.frames {
        if args.realtime {
            ticker.tick().await;
        }

        // First third: background noise only. Middle third: speech bursts on
        // top of the noise. Final third: noise again.
        let speech = n >= args.frames / 3 && n < 2 * args.frames / 3;
        let input = synth_frame(
            frame_len,
            args.sample_rate,
            n,
            args.noise_amplitude,
            speech,
            &mut rng,
        );

        enhancer.process_frame(&input, &mut output)?;

        let active = monitor.voice_active();
        if active {
            voice_frames += 1;
        }
        if active != was_active {
            transitions += 1;
            println!(
                "frame {:4}: voice {} (level={:.4}, noise_floor={:.5}, snr={:.1} dB)",
                n,
                if active { "ON " } else { "off" },
                monitor.activity_level(),
                monitor.noise_floor(),
                monitor.snr_db()
            );
            was_active = active;
        }
    }

    let elapsed = start.elapsed();
    let snapshot = monitor.snapshot();
    println!();
    println!("Processed {} frames in {:.1?}", args.frames, elapsed);
    println!("Voice-active frames: {} ({} transitions)", voice_frames, transitions);
    println!("Final noise floor:   {:.6}", snapshot.noise_floor);
    println!("Final SNR:           {:.1} dB", snapshot.snr_db);
    println!("Final AGC/EQ state:  {} frames through effects", enhancer.frames_processed());

    enhancer.end();
    Ok(())
}

/// One synthetic capture frame: uniform noise, optionally with a speech-band
/// tone mix on top
fn synth_frame(
    len: usize,
    sample_rate: u32,
    frame_index: usize,
    noise_amplitude: f32,
    speech: bool,
    rng: &mut StdRng,
) -> Vec<i16> {
    let base = frame_index * len;
    (0..len)
        .map(|i| {
            let mut s = rng.gen_range(-noise_amplitude..noise_amplitude);
            if speech {
                let t = (base + i) as f32 / sample_rate as f32;
                s += (2.0 * PI * 220.0 * t).sin() * 0.10
                    + (2.0 * PI * 1100.0 * t).sin() * 0.18
                    + (2.0 * PI * 2400.0 * t).sin() * 0.06;
            }
            (s * 32768.0).clamp(i16::MIN as f32, i16::MAX as f32) as i16
        })
        .collect()
}
