//! Example: Analyze a single WAV file
//!
//! Usage:
//!   cargo run --release --example analyze_file -- <file.wav>

use segue_dsp::{AnalysisConfig, AnalysisEngine, AudioSample, CacheKey, PersistedAnalysis};
use std::env;
use std::path::PathBuf;
use std::sync::atomic::AtomicBool;

/// Decode a WAV file into interleaved f32 samples
fn load_wav(path: &str) -> Result<AudioSample, Box<dyn std::error::Error>> {
    let mut reader = hound::WavReader::open(path)?;
    let spec = reader.spec();

    let samples: Vec<f32> = match spec.sample_format {
        hound::SampleFormat::Float => reader.samples::<f32>().collect::<Result<Vec<_>, _>>()?,
        hound::SampleFormat::Int => {
            let max_value = (1i64 << (spec.bits_per_sample - 1)) as f32;
            reader
                .samples::<i32>()
                .map(|s| s.map(|s| s as f32 / max_value))
                .collect::<Result<Vec<_>, _>>()?
        }
    };

    Ok(AudioSample::interleaved(samples, spec.channels, spec.sample_rate)?)
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let path = env::args().nth(1).ok_or("Usage: analyze_file <file.wav>")?;
    let sample = load_wav(&path)?;

    let engine = AnalysisEngine::new(AnalysisConfig::default())?;
    let result = engine.analyze(&CacheKey::from(PathBuf::from(&path)), &sample, &AtomicBool::new(false))?;

    println!("Analysis Results:");
    println!("  BPM: {:.2} (confidence: {:.2})", result.bpm, result.bpm_confidence);
    for candidate in &result.bpm_candidates {
        println!("    {:>7.2} {:<11} {:.2}", candidate.value, candidate.label.as_str(), candidate.confidence);
    }
    match (result.key_name(), result.camelot_key) {
        (Some(name), Some(camelot)) => println!("  Key: {} / {} (confidence: {:.2})", name, camelot, result.key_confidence),
        _ => println!("  Key: none"),
    }
    println!("  Energy: {:.2}", result.energy);
    if let Some(cue) = result.cue_points {
        println!("  Cue in/out: {:.2}s / {:.2}s", cue.cue_in, cue.cue_out);
    }
    if let Some(drift) = result.tempo_drift {
        println!("  Tempo drift: {:.2} -> {:.2} BPM", drift.start_bpm, drift.end_bpm);
    }
    for warning in &result.metadata.confidence_warnings {
        println!("  Warning: {}", warning);
    }
    if let Some(error) = &result.error {
        println!("  Fallback: {}", error);
    }
    println!("  Processing time: {:.2} ms", result.metadata.processing_time_ms);
    println!("{}", serde_json::to_string_pretty(&PersistedAnalysis::from(&result))?);

    Ok(())
}
