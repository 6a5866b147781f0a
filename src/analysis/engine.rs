//! Cache-aware, cancellable analysis engine
//!
//! Runs the full feature pipeline on one [`AudioSample`]:
//!
//! 1. Downmix to mono
//! 2. Tempo and key estimation in parallel (`rayon::join`)
//! 3. Energy level, cue points and tempo drift
//! 4. Confidence flags
//!
//! DSP failures never surface as errors: they produce a well-formed result
//! with `analyzed = false` and the reason in `error`. The only error the
//! engine returns is [`AnalysisError::Cancelled`]. Cancelled analyses are
//! never cached.
//!
//! # Example
//!
//! ```no_run
//! use segue_dsp::analysis::cache::CacheKey;
//! use segue_dsp::analysis::engine::AnalysisEngine;
//! use segue_dsp::io::AudioSample;
//! use segue_dsp::AnalysisConfig;
//! use std::sync::atomic::AtomicBool;
//!
//! let engine = AnalysisEngine::new(AnalysisConfig::default())?;
//! let sample = AudioSample::mono(vec![0.0; 44100 * 10], 44100)?;
//! let cancel = AtomicBool::new(false);
//! let result = engine.analyze(&CacheKey::from("/music/track.wav"), &sample, &cancel)?;
//! println!("{} BPM", result.bpm);
//! # Ok::<(), segue_dsp::AnalysisError>(())
//! ```

use super::cache::{AnalysisCache, CacheKey};
use super::confidence::annotate;
use super::metadata::{AnalysisFlag, AnalysisMetadata};
use super::result::AnalysisResult;
use crate::config::{AnalysisConfig, TempoStrategy};
use crate::error::AnalysisError;
use crate::events::{EngineEvent, EventBus};
use crate::features::cue_points::detect_cue_points;
use crate::features::energy::compute_energy_level;
use crate::features::key::{KeyEstimate, KeyEstimator};
use crate::features::period::drift::measure_tempo_drift;
use crate::features::period::energy_peaks::EnergyPeakTempo;
use crate::features::period::spectral::SpectralOnsetTempo;
use crate::features::period::{TempoEstimate, TempoEstimator};
use crate::io::AudioSample;
use chrono::Utc;
use rayon::prelude::*;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

fn check_cancelled(cancel: &AtomicBool, stage: &str) -> Result<(), AnalysisError> {
    if cancel.load(Ordering::Relaxed) {
        log::debug!("Analysis cancelled before {}", stage);
        return Err(AnalysisError::Cancelled(format!("cancelled before {}", stage)));
    }
    Ok(())
}

/// Analysis pipeline with a shared result cache
pub struct AnalysisEngine {
    config: AnalysisConfig,
    cache: Arc<AnalysisCache>,
    tempo: Box<dyn TempoEstimator>,
    key: KeyEstimator,
    events: Option<EventBus>,
}

impl AnalysisEngine {
    /// Build an engine with a private cache sized by `config.cache_capacity`
    ///
    /// # Errors
    ///
    /// Returns `AnalysisError::InvalidInput` if the configuration is invalid
    pub fn new(config: AnalysisConfig) -> Result<Self, AnalysisError> {
        config.validate()?;
        let tempo: Box<dyn TempoEstimator> = match config.tempo.strategy {
            TempoStrategy::EnergyPeaks => Box::new(EnergyPeakTempo::new(config.tempo.clone())),
            TempoStrategy::SpectralOnsets => Box::new(SpectralOnsetTempo::new(config.tempo.clone())),
        };
        Ok(Self {
            cache: Arc::new(AnalysisCache::new(config.cache_capacity)),
            key: KeyEstimator::new(config.key.clone()),
            tempo,
            config,
            events: None,
        })
    }

    /// Share a cache with other engines
    pub fn with_cache(mut self, cache: Arc<AnalysisCache>) -> Self {
        self.cache = cache;
        self
    }

    /// Replace the tempo strategy
    pub fn with_tempo_estimator(mut self, tempo: Box<dyn TempoEstimator>) -> Self {
        self.tempo = tempo;
        self
    }

    /// Publish analysis events on `bus`
    pub fn with_events(mut self, bus: EventBus) -> Self {
        self.events = Some(bus);
        self
    }

    /// The engine's configuration
    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// The result cache
    pub fn cache(&self) -> &Arc<AnalysisCache> {
        &self.cache
    }

    fn publish(&self, event: EngineEvent) {
        if let Some(bus) = &self.events {
            bus.publish(event);
        }
    }

    /// Analyze a sample, serving repeated keys from the cache
    ///
    /// # Arguments
    ///
    /// * `key` - Path or content hash identifying the audio
    /// * `sample` - Decoded PCM
    /// * `cancel` - Set to `true` from another thread to abort
    ///
    /// # Errors
    ///
    /// `AnalysisError::Cancelled` if `cancel` was raised; nothing is cached
    /// in that case
    pub fn analyze(
        &self,
        key: &CacheKey,
        sample: &AudioSample,
        cancel: &AtomicBool,
    ) -> Result<AnalysisResult, AnalysisError> {
        if let Some(hit) = self.cache.get(key) {
            log::debug!("Cache hit for {}", key);
            self.publish(EngineEvent::CacheHit { key: key.to_string() });
            return Ok(hit);
        }

        self.publish(EngineEvent::AnalysisStarted { key: key.to_string() });
        let result = self.analyze_uncached(sample, cancel)?;

        if result.analyzed {
            self.publish(EngineEvent::AnalysisCompleted {
                key: key.to_string(),
                bpm: result.bpm,
                camelot_key: result.camelot_key.map(|c| c.to_string()),
            });
        } else {
            self.publish(EngineEvent::AnalysisFallback {
                key: key.to_string(),
                reason: result.error.clone().unwrap_or_default(),
            });
        }

        self.cache.insert(key.clone(), result.clone());
        Ok(result)
    }

    /// Analyze many samples in parallel
    ///
    /// Each job is independent; results come back in input order.
    pub fn analyze_batch(
        &self,
        jobs: &[(CacheKey, AudioSample)],
        cancel: &AtomicBool,
    ) -> Vec<Result<AnalysisResult, AnalysisError>> {
        log::debug!("Batch analysis of {} tracks", jobs.len());
        jobs.par_iter()
            .map(|(key, sample)| self.analyze(key, sample, cancel))
            .collect()
    }

    /// Run the pipeline without consulting or filling the cache
    ///
    /// # Errors
    ///
    /// Only `AnalysisError::Cancelled`
    pub fn analyze_uncached(
        &self,
        sample: &AudioSample,
        cancel: &AtomicBool,
    ) -> Result<AnalysisResult, AnalysisError> {
        let start_time = Instant::now();
        let sample_rate = sample.sample_rate();
        let mut metadata =
            AnalysisMetadata::for_input(sample.duration_secs(), sample_rate, sample.channels());
        metadata.tempo_method = self.tempo.name().to_string();

        check_cancelled(cancel, "preprocessing")?;
        if sample.is_empty() {
            log::warn!("Empty audio, returning fallback analysis");
            metadata.flag(AnalysisFlag::TempoFallback);
            metadata.flag(AnalysisFlag::KeyFallback);
            return Ok(AnalysisResult::fallback("Empty audio samples", metadata));
        }

        let mono = sample.mono_samples();
        log::debug!(
            "Starting analysis: {} frames at {} Hz ({} channels)",
            mono.len(),
            sample_rate,
            sample.channels()
        );

        check_cancelled(cancel, "tempo/key estimation")?;
        let (tempo, key) = rayon::join(
            || self.tempo.estimate(&mono, sample_rate),
            || self.key.estimate(&mono, sample_rate),
        );

        let mut reasons = Vec::new();
        let tempo = tempo.unwrap_or_else(|e| {
            log::warn!("Tempo estimation failed: {}", e);
            reasons.push(e.to_string());
            TempoEstimate::fallback()
        });
        if tempo.is_fallback {
            metadata.flag(AnalysisFlag::TempoFallback);
            if reasons.is_empty() {
                reasons.push("Fewer than two onsets; tempo defaulted to 120 BPM".to_string());
            }
        }
        let key = key.unwrap_or_else(|e| {
            log::warn!("Key estimation failed: {}", e);
            KeyEstimate::fallback(e.to_string())
        });
        if key.primary.is_none() {
            metadata.flag(AnalysisFlag::KeyFallback);
            reasons.push(
                key.error
                    .clone()
                    .unwrap_or_else(|| "No key detected".to_string()),
            );
        }

        check_cancelled(cancel, "energy and cue points")?;
        let energy = compute_energy_level(&mono, self.config.energy_window);
        let cue_points = detect_cue_points(&mono, sample_rate, &self.config.cue);

        check_cancelled(cancel, "tempo drift")?;
        let drift_estimator = EnergyPeakTempo::new(self.config.tempo.clone());
        let tempo_drift = match measure_tempo_drift(
            &mono,
            sample_rate,
            self.config.drift_window_secs,
            &drift_estimator,
        ) {
            Ok(drift) => drift,
            Err(e) => {
                log::warn!("Tempo drift skipped: {}", e);
                None
            }
        };

        let analyzed = reasons.is_empty();
        metadata.processing_time_ms = start_time.elapsed().as_secs_f32() * 1000.0;

        let mut result = AnalysisResult {
            bpm: tempo.primary,
            bpm_confidence: tempo.confidence,
            bpm_candidates: tempo.candidates,
            key: key.primary,
            key_confidence: key.confidence,
            key_candidates: key.candidates,
            camelot_key: key.camelot,
            energy,
            cue_points,
            tempo_drift,
            beats: tempo.beats,
            tuning_offset: key.tuning_offset,
            analyzed,
            error: if analyzed { None } else { Some(reasons.join("; ")) },
            timestamp: Utc::now(),
            metadata,
        };
        annotate(&mut result);

        log::debug!(
            "Analysis done in {:.1} ms: {:.1} BPM ({:.2}), key {} ({:.2}), energy {:.2}",
            result.metadata.processing_time_ms,
            result.bpm,
            result.bpm_confidence,
            result.key_name().unwrap_or_else(|| "-".to_string()),
            result.key_confidence,
            result.energy
        );

        Ok(result)
    }
}

impl std::fmt::Debug for AnalysisEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnalysisEngine")
            .field("tempo", &self.tempo.name())
            .field("cache", &self.cache)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::period::{BpmCandidate, CandidateLabel};
    use std::sync::atomic::AtomicUsize;

    struct CountingTempo {
        calls: Arc<AtomicUsize>,
    }

    impl TempoEstimator for CountingTempo {
        fn name(&self) -> &'static str {
            "counting"
        }

        fn estimate(&self, _samples: &[f32], _sample_rate: u32) -> Result<TempoEstimate, AnalysisError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(TempoEstimate {
                primary: 126.0,
                confidence: 0.8,
                candidates: vec![BpmCandidate {
                    value: 126.0,
                    confidence: 0.6,
                    label: CandidateLabel::Detected,
                }],
                beats: Vec::new(),
                is_fallback: false,
            })
        }
    }

    fn counting_engine() -> (AnalysisEngine, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let engine = AnalysisEngine::new(AnalysisConfig::default())
            .unwrap()
            .with_tempo_estimator(Box::new(CountingTempo { calls: calls.clone() }));
        (engine, calls)
    }

    fn tone(seconds: f32) -> AudioSample {
        let sr = 22050;
        let samples = (0..(seconds * sr as f32) as usize)
            .map(|i| 0.5 * (2.0 * std::f32::consts::PI * 440.0 * i as f32 / sr as f32).sin())
            .collect();
        AudioSample::mono(samples, sr).unwrap()
    }

    #[test]
    fn test_second_call_served_from_cache() {
        let (engine, calls) = counting_engine();
        let sample = tone(2.0);
        let key = CacheKey::for_content(&sample);
        let cancel = AtomicBool::new(false);

        let first = engine.analyze(&key, &sample, &cancel).unwrap();
        let second = engine.analyze(&key, &sample, &cancel).unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(first, second);
    }

    #[test]
    fn test_clear_forces_recompute() {
        let (engine, calls) = counting_engine();
        let sample = tone(1.0);
        let key = CacheKey::from("/tmp/tone.wav");
        let cancel = AtomicBool::new(false);
        engine.analyze(&key, &sample, &cancel).unwrap();
        engine.cache().clear();
        engine.analyze(&key, &sample, &cancel).unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_cancelled_not_cached() {
        let (engine, calls) = counting_engine();
        let sample = tone(1.0);
        let key = CacheKey::from("/tmp/cancel.wav");
        let cancel = AtomicBool::new(true);
        let err = engine.analyze(&key, &sample, &cancel).unwrap_err();
        assert!(matches!(err, AnalysisError::Cancelled(_)));
        assert!(engine.cache().is_empty());
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_silence_yields_fallback() {
        let engine = AnalysisEngine::new(AnalysisConfig::default()).unwrap();
        let sample = AudioSample::mono(vec![0.0; 44100 * 5], 44100).unwrap();
        let result = engine
            .analyze_uncached(&sample, &AtomicBool::new(false))
            .unwrap();
        assert_eq!(result.bpm, 120.0);
        assert_eq!(result.bpm_confidence, 0.0);
        assert!(result.key.is_none());
        assert!(!result.analyzed);
        assert!(result.error.is_some());
        assert!(result.metadata.has_flag(AnalysisFlag::TempoFallback));
        assert!(result.metadata.has_flag(AnalysisFlag::KeyFallback));
        assert!(result.is_structurally_valid());
    }

    #[test]
    fn test_events_published() {
        let bus = EventBus::new();
        let rx = bus.subscribe();
        let (engine, _) = counting_engine();
        let engine = engine.with_events(bus);
        let sample = tone(1.0);
        let key = CacheKey::from("/tmp/events.wav");
        let cancel = AtomicBool::new(false);
        engine.analyze(&key, &sample, &cancel).unwrap();
        engine.analyze(&key, &sample, &cancel).unwrap();

        let events: Vec<EngineEvent> = rx.try_iter().collect();
        assert!(matches!(events[0], EngineEvent::AnalysisStarted { .. }));
        assert!(matches!(events.last(), Some(EngineEvent::CacheHit { .. })));
    }

    #[test]
    fn test_batch_preserves_order() {
        let (engine, calls) = counting_engine();
        let jobs: Vec<(CacheKey, AudioSample)> = (0..4)
            .map(|i| (CacheKey::from(format!("/tmp/{}.wav", i).as_str()), tone(0.5)))
            .collect();
        let results = engine.analyze_batch(&jobs, &AtomicBool::new(false));
        assert_eq!(results.len(), 4);
        assert!(results.iter().all(|r| r.as_ref().map(|r| r.bpm == 126.0).unwrap_or(false)));
        assert_eq!(calls.load(Ordering::SeqCst), 4);
    }
}
