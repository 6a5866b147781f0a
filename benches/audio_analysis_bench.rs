//! Performance benchmarks for analysis and selection

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use segue_dsp::config::TempoStrategy;
use segue_dsp::features::key::camelot::{CamelotKey, CamelotLetter};
use segue_dsp::mixing::track::MixContext;
use segue_dsp::{analyze_audio, AnalysisConfig, CompatibilityScorer, Track, TrackSelector};

fn synthetic_audio(seconds: usize) -> Vec<f32> {
    // 440 Hz tone with a click every half second
    (0..44100 * seconds)
        .map(|i| {
            let tone = (i as f32 * 440.0 * 2.0 * std::f32::consts::PI / 44100.0).sin() * 0.3;
            let click = if i % 22050 < 441 { 0.6 } else { 0.0 };
            tone + click
        })
        .collect()
}

fn library(size: usize) -> Vec<Track> {
    (0..size)
        .map(|i| {
            let mut t = Track::new(format!("t{}", i), "", "").with_duration(300.0);
            t.bpm = Some(118.0 + (i % 15) as f32);
            t.energy = Some((i % 10) as f32 / 10.0);
            let letter = if i % 2 == 0 { CamelotLetter::A } else { CamelotLetter::B };
            t.camelot_key = CamelotKey::new((i % 12) as u8 + 1, letter);
            t.analyzed = true;
            t
        })
        .collect()
}

fn bench_analyze_audio(c: &mut Criterion) {
    let samples = synthetic_audio(30);
    let config = AnalysisConfig::default();

    c.bench_function("analyze_audio_30s", |b| {
        b.iter(|| analyze_audio(black_box(&samples), black_box(44100), black_box(&config)));
    });

    let mut spectral = AnalysisConfig::default();
    spectral.tempo.strategy = TempoStrategy::SpectralOnsets;
    c.bench_function("analyze_audio_30s_spectral", |b| {
        b.iter(|| analyze_audio(black_box(&samples), black_box(44100), black_box(&spectral)));
    });
}

fn bench_selection(c: &mut Criterion) {
    let tracks = library(500);
    let scorer = CompatibilityScorer::default();
    let selector = TrackSelector::default();
    let context = MixContext {
        current_hour: Some(23),
        ..MixContext::default()
    };

    c.bench_function("score_pair", |b| {
        b.iter(|| scorer.score(black_box(&tracks[0]), black_box(&tracks[1]), &context));
    });

    c.bench_function("find_optimal_next_track_500", |b| {
        b.iter(|| selector.find_optimal_next_track(black_box(&tracks[0]), tracks[1..].iter(), &context));
    });
}

criterion_group!(benches, bench_analyze_audio, bench_selection);
criterion_main!(benches);
