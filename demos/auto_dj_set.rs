//! Example: Run an Auto-DJ set over a synthetic library
//!
//! Usage:
//!   cargo run --release --example auto_dj_set -- [--tracks N] [--seed S] [--hour H]
//!
//! Each track is a click train with a sustained triad, analyzed by the
//! engine and then handed to an Auto-DJ session that plays through the set.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use segue_dsp::events::{EngineEvent, EventBus};
use segue_dsp::mixing::session::SessionSettings;
use segue_dsp::mixing::track::SetPosition;
use segue_dsp::{AnalysisConfig, AnalysisEngine, AudioSample, AutoDjSession, CacheKey, Track, TrackSelector};
use std::env;
use std::sync::atomic::AtomicBool;

const SAMPLE_RATE: u32 = 22050;
const GENRES: [&str; 4] = ["house", "tech house", "techno", "progressive house"];

/// Clicks at `bpm` over a major or minor triad rooted at `root_hz`
fn synth_track(bpm: f32, root_hz: f32, minor: bool, seconds: f32) -> Vec<f32> {
    let third = if minor { 1.189_207 } else { 1.259_921 };
    let freqs = [root_hz, root_hz * third, root_hz * 1.498_307];
    let period = (60.0 / bpm * SAMPLE_RATE as f32) as usize;
    let click_len = (0.01 * SAMPLE_RATE as f32) as usize;

    (0..(seconds * SAMPLE_RATE as f32) as usize)
        .map(|i| {
            let t = i as f32 / SAMPLE_RATE as f32;
            let tone: f32 = freqs.iter().map(|f| (2.0 * std::f32::consts::PI * f * t).sin()).sum::<f32>() * 0.1;
            let phase = i % period;
            let click = if phase < click_len {
                0.8 * (-(phase as f32) / click_len as f32 * 4.0).exp()
            } else {
                0.0
            };
            tone + click
        })
        .collect()
}

fn parse_arg<T: std::str::FromStr>(args: &[String], flag: &str, default: T) -> T {
    args.iter()
        .position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let args: Vec<String> = env::args().skip(1).collect();
    let count: usize = parse_arg(&args, "--tracks", 14);
    let seed: u64 = parse_arg(&args, "--seed", 7);
    let hour: u32 = parse_arg(&args, "--hour", 23);

    let mut rng = StdRng::seed_from_u64(seed);
    let jobs: Vec<(CacheKey, AudioSample)> = (0..count)
        .map(|i| {
            let bpm = rng.gen_range(118.0f32..132.0).round();
            let root = 220.0 * 2f32.powf(rng.gen_range(0..12) as f32 / 12.0);
            let minor = rng.gen_bool(0.6);
            let samples = synth_track(bpm, root, minor, 20.0);
            Ok((
                CacheKey::from(format!("synth-{:02}", i).as_str()),
                AudioSample::mono(samples, SAMPLE_RATE)?,
            ))
        })
        .collect::<Result<_, segue_dsp::AnalysisError>>()?;

    let engine = AnalysisEngine::new(AnalysisConfig::default())?;
    eprintln!("Analyzing {} synthetic tracks...", jobs.len());
    let results = engine.analyze_batch(&jobs, &AtomicBool::new(false));

    let mut library = Vec::new();
    for (i, result) in results.into_iter().enumerate() {
        let result = result?;
        let track = Track::new(format!("synth-{:02}", i), format!("Synthetic {}", i + 1), "Segue")
            .with_duration(rng.gen_range(240.0f32..420.0))
            .with_genre(GENRES[i % GENRES.len()])
            .with_analysis(&result);
        println!(
            "{:<9} {:>6.1} BPM  {:<4} {:<4} energy {:.2}",
            track.id,
            track.bpm_or_default(),
            track.key.map(|k| k.name()).unwrap_or_else(|| "-".to_string()),
            track.camelot().map(|c| c.to_string()).unwrap_or_default(),
            track.energy_or_default()
        );
        library.push(track);
    }

    let bus = EventBus::new();
    let events = bus.subscribe();
    let settings = SessionSettings {
        min_library_size: count.min(10),
        ..SessionSettings::default()
    };
    let mut session = AutoDjSession::new(library, TrackSelector::default(), settings)?.with_events(bus);

    let opener = session
        .select_initial_track(SetPosition::Opening, &mut rng)
        .ok_or("empty library")?;
    println!("\nOpening with {}", opener.id);

    for _ in 1..count {
        let scheduled = match session.prepare_next(Some(hour), &mut rng) {
            Some(scheduled) => scheduled.clone(),
            None => break,
        };
        println!(
            "  -> {} at {:.1}s: {} over {:.1}s, {} (score {:.2})",
            scheduled.next.id,
            scheduled.start_at_secs,
            scheduled.instructions.crossfade_strategy.as_str(),
            scheduled.instructions.crossfade_duration,
            scheduled.instructions.harmonic_advice.advice,
            scheduled.score.total()
        );
        session.complete_transition(true, None)?;
    }

    let fallbacks = events
        .try_iter()
        .filter(|e| matches!(e, EngineEvent::NextTrackSelected { fallback: true, .. }))
        .count();
    println!(
        "\nPlayed {} tracks, {} fallback picks, {} transitions logged",
        session.history().len(),
        fallbacks,
        session.analytics().len()
    );

    Ok(())
}
