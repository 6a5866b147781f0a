//! Example: Analyze multiple WAV files in parallel
//!
//! Usage:
//!   cargo run --release --example analyze_batch -- [--jobs N] [--json] [--calibrate] <file1> <file2> ...
//!
//! Notes:
//! - Parallelism is across files. Each file's tempo and key run side by side.
//! - Default workers: (available CPU threads - 1), keeping one core free for the system.
//! - `--calibrate` scores files whose names match the bundled reference set
//!   and prints a calibration report.

use rayon::prelude::*;
use segue_dsp::calibration::{CalibrationHarness, ReferenceSet};
use segue_dsp::{AnalysisConfig, AnalysisEngine, AnalysisResult, AudioSample, CacheKey, PersistedAnalysis};
use std::env;
use std::path::{Path, PathBuf};
use std::sync::atomic::AtomicBool;
use std::time::Instant;

fn load_wav(path: &str) -> Result<AudioSample, Box<dyn std::error::Error + Send + Sync>> {
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

fn default_jobs() -> usize {
    let n = std::thread::available_parallelism().map(|v| v.get()).unwrap_or(1);
    std::cmp::max(1, n.saturating_sub(1))
}

fn percentile(mut xs: Vec<f32>, p: f32) -> Option<f32> {
    if xs.is_empty() {
        return None;
    }
    xs.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let idx = ((xs.len() - 1) as f32 * p.clamp(0.0, 1.0)).round() as usize;
    Some(xs[idx.min(xs.len() - 1)])
}

struct ItemOut {
    path: String,
    outcome: Result<AnalysisResult, String>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let mut args: Vec<String> = env::args().skip(1).collect();

    let mut json = false;
    let mut calibrate = false;
    let mut jobs: Option<usize> = None;
    let mut paths: Vec<String> = Vec::new();

    while let Some(a) = args.first().cloned() {
        args.remove(0);
        match a.as_str() {
            "--json" => json = true,
            "--calibrate" => calibrate = true,
            "--jobs" => {
                let v = args.first().ok_or("--jobs requires a value")?.parse::<usize>()?;
                args.remove(0);
                jobs = Some(std::cmp::max(1, v));
            }
            "--help" | "-h" => {
                eprintln!(
                    "Usage: analyze_batch [--jobs N] [--json] [--calibrate] <file1> <file2> ...\n\
                     \n\
                     --jobs N      Parallel workers (default: CPU-1)\n\
                     --json        Emit one JSON object per line (JSONL)\n\
                     --calibrate   Score files against the bundled reference tracks\n"
                );
                return Ok(());
            }
            _ => paths.push(a),
        }
    }

    if paths.is_empty() {
        eprintln!("ERROR: Provide at least one WAV file path. Use --help for usage.");
        std::process::exit(2);
    }

    let jobs = jobs.unwrap_or_else(default_jobs);
    eprintln!("Batch: {} files, jobs={}", paths.len(), jobs);

    let engine = AnalysisEngine::new(AnalysisConfig::default())?;
    let cancel = AtomicBool::new(false);

    let t0 = Instant::now();
    let pool = rayon::ThreadPoolBuilder::new().num_threads(jobs).build()?;

    let outs: Vec<ItemOut> = pool.install(|| {
        paths
            .par_iter()
            .map(|path| {
                let outcome = match load_wav(path) {
                    Ok(sample) => engine
                        .analyze(&CacheKey::from(PathBuf::from(path)), &sample, &cancel)
                        .map_err(|e| format!("analysis failed: {e}")),
                    Err(e) => Err(format!("decode failed: {e}")),
                };
                ItemOut {
                    path: path.clone(),
                    outcome,
                }
            })
            .collect()
    });

    for (idx, o) in outs.iter().enumerate() {
        match (&o.outcome, json) {
            (Ok(res), true) => {
                let record = serde_json::json!({
                    "file": o.path,
                    "analysis": PersistedAnalysis::from(res),
                    "analyzed": res.analyzed,
                    "processing_time_ms": res.metadata.processing_time_ms,
                });
                println!("{}", record);
            }
            (Err(e), true) => println!("{}", serde_json::json!({ "file": o.path, "error": e })),
            (Ok(res), false) => println!(
                "[{}/{}] {}: BPM={:.2} (conf={:.3}) Key={} {} (conf={:.3}) energy={:.2} time={:.2}ms",
                idx + 1,
                outs.len(),
                o.path,
                res.bpm,
                res.bpm_confidence,
                res.key_name().unwrap_or_else(|| "-".to_string()),
                res.camelot_key.map(|c| c.to_string()).unwrap_or_default(),
                res.key_confidence,
                res.energy,
                res.metadata.processing_time_ms
            ),
            (Err(e), false) => println!("[{}/{}] {}: ERROR: {}", idx + 1, outs.len(), o.path, e),
        }
    }

    let ok_times: Vec<f32> = outs
        .iter()
        .filter_map(|o| o.outcome.as_ref().ok())
        .map(|r| r.metadata.processing_time_ms)
        .collect();
    let wall_ms = t0.elapsed().as_secs_f64() * 1000.0;

    eprintln!("Done: ok={}/{} wall={:.0}ms", ok_times.len(), outs.len(), wall_ms);
    if !ok_times.is_empty() {
        let mean = ok_times.iter().sum::<f32>() / ok_times.len() as f32;
        let p50 = percentile(ok_times.clone(), 0.50).unwrap_or(mean);
        let p90 = percentile(ok_times.clone(), 0.90).unwrap_or(mean);
        let min = ok_times.iter().cloned().fold(f32::INFINITY, f32::min);
        let max = ok_times.iter().cloned().fold(0.0, f32::max);
        eprintln!(
            "processing_time_ms: mean={:.2} p50={:.2} p90={:.2} min={:.2} max={:.2}",
            mean, p50, p90, min, max
        );
    }

    if calibrate {
        let mut harness = CalibrationHarness::new(ReferenceSet::builtin()?);
        for o in &outs {
            let filename = Path::new(&o.path)
                .file_name()
                .and_then(|n| n.to_str())
                .unwrap_or(&o.path);
            harness.record(filename, o.outcome.as_ref().ok());
        }
        eprintln!("Calibration: {} of {} files matched a reference", harness.results().len(), outs.len());
        println!("{}", harness.report().to_json()?);
        match harness.fit_multiplier() {
            Ok(fit) => eprintln!("Best BPM multiplier: {}x ({:.0}% within 3%)", fit.multiplier, fit.match_rate * 100.0),
            Err(e) => eprintln!("Multiplier fit skipped: {}", e),
        }
    }

    Ok(())
}
