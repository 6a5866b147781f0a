//! Accuracy scoring and parameter search against reference tracks

use super::reference::{ReferenceSet, ReferenceTrack};
use crate::analysis::result::{AnalysisResult, Key};
use crate::config::OctavePolicy;
use crate::error::AnalysisError;
use crate::features::period::energy_peaks::RawTempo;
use crate::features::period::octave::apply_octave_policy;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Absolute BPM error still counted as a perfect match
pub const BPM_TOLERANCE: f32 = 2.0;

/// Tempo multipliers searched by [`best_bpm_multiplier`]
pub const TESTED_MULTIPLIERS: [f32; 7] = [0.5, 0.66, 0.75, 1.0, 1.33, 1.5, 2.0];

/// Relative error counted as a match by [`best_bpm_multiplier`]
pub const MULTIPLIER_MATCH_TOLERANCE: f32 = 0.03;

/// Observations needed before fitting anything
pub const MIN_OBSERVATIONS: usize = 10;

/// Scores below this flag a track as problematic
const PROBLEM_SCORE: f32 = 70.0;

/// Average below this triggers a recommendation
const RECOMMEND_SCORE: f32 = 80.0;

/// Tempo accuracy on a 0–100 scale
///
/// ±2 BPM scores 100, a half/double reading 85, a third/triple reading 70.
/// Other errors score by relative deviation: 95/85/70/50 within
/// 5/10/15/20 %, then `100 − percent` floored at 0.
pub fn bpm_accuracy(detected: f32, expected: f32) -> f32 {
    if !(detected > 0.0 && expected > 0.0) {
        return 0.0;
    }

    let near = |target: f32| (detected - target).abs() <= BPM_TOLERANCE;
    if near(expected) {
        return 100.0;
    }
    if near(expected * 2.0) || near(expected / 2.0) {
        return 85.0;
    }
    if near(expected * 3.0) || near(expected / 3.0) {
        return 70.0;
    }

    let percent = (detected - expected).abs() / expected * 100.0;
    match percent {
        p if p <= 5.0 => 95.0,
        p if p <= 10.0 => 85.0,
        p if p <= 15.0 => 70.0,
        p if p <= 20.0 => 50.0,
        p => (100.0 - p).max(0.0),
    }
}

fn semitone_distance(a: u32, b: u32) -> u32 {
    let d = (a as i32 - b as i32).unsigned_abs() % 12;
    d.min(12 - d)
}

/// Key accuracy on a 0–100 scale
///
/// Keys compare by pitch class, so enharmonic spellings are exact.
/// Relative 90, parallel 80, a fifth apart 70, one semitone 60, two 40,
/// otherwise `100 − 15 × distance` floored at 0. No detection scores 0.
pub fn key_accuracy(detected: Option<Key>, expected: Key) -> f32 {
    let detected = match detected {
        Some(key) => key,
        None => return 0.0,
    };

    if detected == expected {
        100.0
    } else if detected.relative() == expected {
        90.0
    } else if detected.parallel() == expected {
        80.0
    } else {
        match semitone_distance(detected.tonic(), expected.tonic()) {
            5 => 70.0,
            1 => 60.0,
            2 => 40.0,
            d => (100.0 - 15.0 * d as f32).max(0.0),
        }
    }
}

/// What the analyzer reported for a reference track
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    /// Detected tempo
    pub bpm: f32,
    /// Detected key
    pub key: Option<Key>,
}

/// One reference track scored against its analysis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalibrationResult {
    /// File that was analyzed
    pub filename: String,
    /// Labeled values
    pub expected: ReferenceTrack,
    /// Analyzer output, `None` when analysis failed
    pub detected: Option<Detection>,
    /// Tempo score (0–100)
    pub bpm_accuracy: f32,
    /// Key score (0–100)
    pub key_accuracy: f32,
}

impl CalibrationResult {
    /// Score an analysis (or its absence) against a reference
    pub fn evaluate(filename: impl Into<String>, expected: &ReferenceTrack, analysis: Option<&AnalysisResult>) -> Self {
        let detected = analysis.map(|a| Detection { bpm: a.bpm, key: a.key });
        let (bpm_score, key_score) = match (&detected, expected.expected_key()) {
            (Some(d), Some(key)) => (bpm_accuracy(d.bpm, expected.bpm), key_accuracy(d.key, key)),
            (Some(d), None) => (bpm_accuracy(d.bpm, expected.bpm), 0.0),
            (None, _) => (0.0, 0.0),
        };

        Self {
            filename: filename.into(),
            expected: expected.clone(),
            detected,
            bpm_accuracy: bpm_score,
            key_accuracy: key_score,
        }
    }
}

/// Score distribution over the perfect/excellent/good/fair/poor tiers
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AccuracyTiers {
    /// 100
    pub perfect: usize,
    /// 85–99
    pub excellent: usize,
    /// 70–84
    pub good: usize,
    /// 50–69
    pub fair: usize,
    /// Below 50
    pub poor: usize,
    /// Mean score
    pub average_score: f32,
}

impl AccuracyTiers {
    fn add(&mut self, score: f32) {
        match score {
            s if s >= 100.0 => self.perfect += 1,
            s if s >= 85.0 => self.excellent += 1,
            s if s >= 70.0 => self.good += 1,
            s if s >= 50.0 => self.fair += 1,
            _ => self.poor += 1,
        }
    }
}

/// Per-category averages
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CategorySummary {
    /// Tracks in the category
    pub count: usize,
    /// Mean tempo score
    pub avg_bpm_score: f32,
    /// Mean key score
    pub avg_key_score: f32,
}

/// A track scoring below 70 on tempo or key
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProblemTrack {
    /// File name
    pub name: String,
    /// Reference category
    pub category: String,
    /// Tempo score
    pub bpm_score: f32,
    /// Key score
    pub key_score: f32,
    /// Labeled tempo
    pub expected_bpm: f32,
    /// Detected tempo
    pub detected_bpm: f32,
}

/// Summary of a calibration run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CalibrationReport {
    /// Results submitted
    pub total_tracks: usize,
    /// Results with a detection
    pub successful_detections: usize,
    /// Tempo tiers
    pub bpm_accuracy: AccuracyTiers,
    /// Key tiers
    pub key_accuracy: AccuracyTiers,
    /// Averages by reference category
    pub by_category: BTreeMap<String, CategorySummary>,
    /// Tracks worth a closer look
    pub problematic_tracks: Vec<ProblemTrack>,
    /// Tuning suggestions
    pub recommendations: Vec<String>,
}

impl CalibrationReport {
    /// Build a report; results without a detection are only counted
    pub fn generate(results: &[CalibrationResult]) -> Self {
        let mut report = CalibrationReport {
            total_tracks: results.len(),
            ..CalibrationReport::default()
        };

        let mut bpm_total = 0.0f32;
        let mut key_total = 0.0f32;

        for result in results {
            let detected = match &result.detected {
                Some(d) => d,
                None => continue,
            };
            report.successful_detections += 1;

            bpm_total += result.bpm_accuracy;
            key_total += result.key_accuracy;
            report.bpm_accuracy.add(result.bpm_accuracy);
            report.key_accuracy.add(result.key_accuracy);

            let category = report.by_category.entry(result.expected.category.clone()).or_default();
            category.count += 1;
            category.avg_bpm_score += result.bpm_accuracy;
            category.avg_key_score += result.key_accuracy;

            if result.bpm_accuracy < PROBLEM_SCORE || result.key_accuracy < PROBLEM_SCORE {
                report.problematic_tracks.push(ProblemTrack {
                    name: result.filename.clone(),
                    category: result.expected.category.clone(),
                    bpm_score: result.bpm_accuracy,
                    key_score: result.key_accuracy,
                    expected_bpm: result.expected.bpm,
                    detected_bpm: detected.bpm,
                });
            }
        }

        let valid = report.successful_detections.max(1) as f32;
        report.bpm_accuracy.average_score = bpm_total / valid;
        report.key_accuracy.average_score = key_total / valid;

        for summary in report.by_category.values_mut() {
            summary.avg_bpm_score /= summary.count as f32;
            summary.avg_key_score /= summary.count as f32;
        }

        if report.bpm_accuracy.average_score < RECOMMEND_SCORE {
            report.recommendations.push(
                "BPM detection accuracy is below 80%. Consider adjusting onset detection sensitivity.".to_string(),
            );
        }
        if report.key_accuracy.average_score < RECOMMEND_SCORE {
            report.recommendations.push(
                "Key detection accuracy is below 80%. Consider adjusting chroma analysis parameters.".to_string(),
            );
        }
        for (category, summary) in &report.by_category {
            if summary.avg_bpm_score < PROBLEM_SCORE {
                report.recommendations.push(format!(
                    "Poor BPM detection for {} tracks. Consider specific tuning for this genre.",
                    category
                ));
            }
            if summary.avg_key_score < PROBLEM_SCORE {
                report.recommendations.push(format!(
                    "Poor key detection for {} tracks. Consider specific tuning for this genre.",
                    category
                ));
            }
        }

        log::info!(
            "Calibration: {}/{} detected, BPM avg {:.1}, key avg {:.1}",
            report.successful_detections,
            report.total_tracks,
            report.bpm_accuracy.average_score,
            report.key_accuracy.average_score
        );
        report
    }

    /// Pretty-printed JSON
    ///
    /// # Errors
    ///
    /// Returns `AnalysisError::CalibrationError` if serialization fails
    pub fn to_json(&self) -> Result<String, AnalysisError> {
        serde_json::to_string_pretty(self)
            .map_err(|e| AnalysisError::CalibrationError(format!("Failed to serialize report: {}", e)))
    }
}

/// Matches analyzed files to references and scores them
#[derive(Debug, Clone)]
pub struct CalibrationHarness {
    references: ReferenceSet,
    results: Vec<CalibrationResult>,
}

impl CalibrationHarness {
    /// Harness over a reference set
    pub fn new(references: ReferenceSet) -> Self {
        Self {
            references,
            results: Vec::new(),
        }
    }

    /// The reference set
    pub fn references(&self) -> &ReferenceSet {
        &self.references
    }

    /// Score one analyzed file
    ///
    /// Returns `None` (and records nothing) when no reference matches the
    /// file name.
    pub fn record(&mut self, filename: &str, analysis: Option<&AnalysisResult>) -> Option<&CalibrationResult> {
        let reference = match self.references.find_by_filename(filename) {
            Some(reference) => reference,
            None => {
                log::debug!("No reference for {}", filename);
                return None;
            }
        };
        self.results.push(CalibrationResult::evaluate(filename, reference, analysis));
        self.results.last()
    }

    /// Scored results so far
    pub fn results(&self) -> &[CalibrationResult] {
        &self.results
    }

    /// Report over everything recorded
    pub fn report(&self) -> CalibrationReport {
        CalibrationReport::generate(&self.results)
    }

    /// Multiplier fit over the recorded detections
    ///
    /// # Errors
    ///
    /// See [`best_bpm_multiplier`]
    pub fn fit_multiplier(&self) -> Result<MultiplierFit, AnalysisError> {
        let pairs: Vec<(f32, f32)> = self
            .results
            .iter()
            .filter_map(|r| r.detected.as_ref().map(|d| (d.bpm, r.expected.bpm)))
            .collect();
        best_bpm_multiplier(&pairs)
    }
}

/// Result of [`best_bpm_multiplier`]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MultiplierFit {
    /// Chosen multiplier
    pub multiplier: f32,
    /// Share of observations within 3 % after applying it
    pub match_rate: f32,
}

impl MultiplierFit {
    /// Apply the multiplier to a detected tempo
    pub fn apply(&self, bpm: f32) -> f32 {
        bpm * self.multiplier
    }
}

/// Multiplier that brings the most detections within 3 % of the truth
///
/// # Arguments
///
/// * `observations` - `(detected, expected)` BPM pairs
///
/// # Returns
///
/// The first multiplier in [`TESTED_MULTIPLIERS`] with the highest match
/// rate, or 1.0 when nothing matches
///
/// # Errors
///
/// Returns `AnalysisError::CalibrationError` with fewer than 10 observations
pub fn best_bpm_multiplier(observations: &[(f32, f32)]) -> Result<MultiplierFit, AnalysisError> {
    if observations.len() < MIN_OBSERVATIONS {
        return Err(AnalysisError::CalibrationError(format!(
            "Need at least {} observations, got {}",
            MIN_OBSERVATIONS,
            observations.len()
        )));
    }

    let mut best = MultiplierFit {
        multiplier: 1.0,
        match_rate: 0.0,
    };
    for &multiplier in &TESTED_MULTIPLIERS {
        let matches = observations
            .iter()
            .filter(|&&(detected, expected)| {
                expected > 0.0 && ((detected * multiplier - expected).abs() / expected) < MULTIPLIER_MATCH_TOLERANCE
            })
            .count();
        let rate = matches as f32 / observations.len() as f32;
        if rate > best.match_rate {
            best = MultiplierFit {
                multiplier,
                match_rate: rate,
            };
        }
    }

    log::info!(
        "Best BPM multiplier {}x ({:.1}% within 3%)",
        best.multiplier,
        best.match_rate * 100.0
    );
    Ok(best)
}

/// A pre-octave-policy tempo reading with its label
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TempoObservation {
    /// Labeled tempo
    pub expected_bpm: f32,
    /// Histogram mode before the octave policy
    pub center: f32,
    /// In-range BPM values behind the mode
    pub values: Vec<f32>,
}

impl TempoObservation {
    /// Pair a raw reading with its label
    pub fn from_raw(expected_bpm: f32, raw: &RawTempo) -> Self {
        Self {
            expected_bpm,
            center: raw.center,
            values: raw.values.clone(),
        }
    }
}

/// Result of [`tune_octave_tolerance`]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ToleranceFit {
    /// Chosen standard-deviation tolerance
    pub tolerance: f32,
    /// Mean [`bpm_accuracy`] at that tolerance
    pub mean_accuracy: f32,
}

/// Search the octave policy's standard-deviation tolerance
///
/// Replays the policy over each observation for every tolerance in `grid`
/// (other policy fields come from `base`) and keeps the tolerance with the
/// highest mean [`bpm_accuracy`]. Ties go to the earlier grid entry.
///
/// # Errors
///
/// Returns `AnalysisError::CalibrationError` when `observations` or `grid`
/// is empty
pub fn tune_octave_tolerance(
    observations: &[TempoObservation],
    grid: &[f32],
    base: &OctavePolicy,
) -> Result<ToleranceFit, AnalysisError> {
    if observations.is_empty() {
        return Err(AnalysisError::CalibrationError("No tempo observations".to_string()));
    }
    if grid.is_empty() {
        return Err(AnalysisError::CalibrationError("Empty tolerance grid".to_string()));
    }

    let mut best: Option<ToleranceFit> = None;
    for &tolerance in grid {
        let policy = OctavePolicy {
            std_dev_tolerance: tolerance,
            ..*base
        };
        let total: f32 = observations
            .iter()
            .map(|obs| {
                let decision = apply_octave_policy(obs.center, &obs.values, &policy);
                bpm_accuracy(decision.bpm.round(), obs.expected_bpm)
            })
            .sum();
        let mean_accuracy = total / observations.len() as f32;
        log::debug!("Octave tolerance {:.2}: mean accuracy {:.1}", tolerance, mean_accuracy);

        if best.map_or(true, |b| mean_accuracy > b.mean_accuracy) {
            best = Some(ToleranceFit {
                tolerance,
                mean_accuracy,
            });
        }
    }

    best.ok_or_else(|| AnalysisError::CalibrationError("No tolerance evaluated".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calibration::reference::Mode;

    fn reference(bpm: f32, key: &str, mode: Mode, category: &str) -> ReferenceTrack {
        ReferenceTrack {
            name: "Song".to_string(),
            artist: "Band".to_string(),
            bpm,
            key: key.to_string(),
            mode,
            category: category.to_string(),
            note: None,
            time_signature: None,
        }
    }

    #[test]
    fn test_bpm_accuracy_tiers() {
        assert_eq!(bpm_accuracy(121.5, 120.0), 100.0);
        assert_eq!(bpm_accuracy(240.0, 120.0), 85.0);
        assert_eq!(bpm_accuracy(61.0, 120.0), 85.0);
        assert_eq!(bpm_accuracy(40.0, 120.0), 70.0);
        assert_eq!(bpm_accuracy(125.0, 120.0), 95.0);
        assert_eq!(bpm_accuracy(130.0, 120.0), 85.0);
        assert_eq!(bpm_accuracy(136.0, 120.0), 70.0);
        assert_eq!(bpm_accuracy(142.0, 120.0), 50.0);
        assert!((bpm_accuracy(180.0, 120.0) - 50.0).abs() < 1e-3);
        assert_eq!(bpm_accuracy(0.0, 120.0), 0.0);
    }

    #[test]
    fn test_key_accuracy_tiers() {
        let c = Key::Major(0);
        assert_eq!(key_accuracy(Some(Key::Major(0)), c), 100.0);
        assert_eq!(key_accuracy(Some(Key::Minor(9)), c), 90.0);
        assert_eq!(key_accuracy(Some(Key::Minor(0)), c), 80.0);
        assert_eq!(key_accuracy(Some(Key::Major(7)), c), 70.0);
        assert_eq!(key_accuracy(Some(Key::Major(5)), c), 70.0);
        assert_eq!(key_accuracy(Some(Key::Major(1)), c), 60.0);
        assert_eq!(key_accuracy(Some(Key::Major(2)), c), 40.0);
        assert_eq!(key_accuracy(Some(Key::Major(3)), c), 55.0);
        assert_eq!(key_accuracy(Some(Key::Major(6)), c), 10.0);
        assert_eq!(key_accuracy(None, c), 0.0);
    }

    #[test]
    fn test_enharmonic_reference_is_exact() {
        let track = reference(138.0, "Ab", Mode::Major, "major");
        let mut analysis = AnalysisResult::fallback("test", Default::default());
        analysis.bpm = 138.0;
        analysis.key = Some(Key::Major(8));
        let result = CalibrationResult::evaluate("viva.mp3", &track, Some(&analysis));
        assert_eq!(result.key_accuracy, 100.0);
        assert_eq!(result.bpm_accuracy, 100.0);
    }

    #[test]
    fn test_report_tiers_and_recommendations() {
        let detected = |bpm: f32, key: Option<Key>| Some(Detection { bpm, key });
        let results = vec![
            CalibrationResult {
                filename: "a.mp3".to_string(),
                expected: reference(120.0, "C", Mode::Major, "slow"),
                detected: detected(120.0, Some(Key::Major(0))),
                bpm_accuracy: 100.0,
                key_accuracy: 100.0,
            },
            CalibrationResult {
                filename: "b.mp3".to_string(),
                expected: reference(90.0, "A", Mode::Minor, "swing"),
                detected: detected(60.0, Some(Key::Major(1))),
                bpm_accuracy: 33.3,
                key_accuracy: 40.0,
            },
            CalibrationResult {
                filename: "c.mp3".to_string(),
                expected: reference(100.0, "D", Mode::Minor, "swing"),
                detected: None,
                bpm_accuracy: 0.0,
                key_accuracy: 0.0,
            },
        ];

        let report = CalibrationReport::generate(&results);
        assert_eq!(report.total_tracks, 3);
        assert_eq!(report.successful_detections, 2);
        assert_eq!(report.bpm_accuracy.perfect, 1);
        assert_eq!(report.bpm_accuracy.poor, 1);
        assert_eq!(report.key_accuracy.poor, 1);
        assert_eq!(report.by_category["swing"].count, 1);
        assert_eq!(report.problematic_tracks.len(), 1);
        assert_eq!(report.problematic_tracks[0].name, "b.mp3");
        assert!(report.recommendations.iter().any(|r| r.contains("swing")));
        assert!(report.to_json().unwrap().contains("\"successful_detections\": 2"));
    }

    #[test]
    fn test_best_multiplier_finds_half_time() {
        let observations: Vec<(f32, f32)> = (0..12).map(|i| {
            let expected = 100.0 + i as f32 * 5.0;
            (expected * 2.0, expected)
        }).collect();
        let fit = best_bpm_multiplier(&observations).unwrap();
        assert_eq!(fit.multiplier, 0.5);
        assert_eq!(fit.match_rate, 1.0);
        assert_eq!(fit.apply(240.0), 120.0);
    }

    #[test]
    fn test_best_multiplier_needs_observations() {
        assert!(matches!(
            best_bpm_multiplier(&[(120.0, 120.0); 9]),
            Err(AnalysisError::CalibrationError(_))
        ));
    }

    #[test]
    fn test_tune_octave_tolerance_prefers_doubling() {
        // Slow jittery readings of fast material: only a wide tolerance doubles them
        let observations: Vec<TempoObservation> = (0..5)
            .map(|_| TempoObservation {
                expected_bpm: 132.0,
                center: 66.0,
                values: vec![64.0, 66.0, 68.0],
            })
            .collect();
        let fit = tune_octave_tolerance(&observations, &[1.5, 2.0, 3.0], &OctavePolicy::default()).unwrap();
        assert_eq!(fit.tolerance, 2.0);
        assert_eq!(fit.mean_accuracy, 100.0);
    }

    #[test]
    fn test_tune_octave_tolerance_rejects_empty_input() {
        assert!(tune_octave_tolerance(&[], &[1.5], &OctavePolicy::default()).is_err());
        let obs = vec![TempoObservation {
            expected_bpm: 120.0,
            center: 120.0,
            values: vec![120.0],
        }];
        assert!(tune_octave_tolerance(&obs, &[], &OctavePolicy::default()).is_err());
    }

    #[test]
    fn test_harness_records_matching_files() {
        let mut harness = CalibrationHarness::new(ReferenceSet::builtin().unwrap());
        let mut analysis = AnalysisResult::fallback("test", Default::default());
        analysis.bpm = 116.0;
        analysis.key = Some(Key::Minor(6));
        assert!(harness.record("daft punk - get lucky.wav", Some(&analysis)).is_some());
        assert!(harness.record("no match here.wav", Some(&analysis)).is_none());
        assert_eq!(harness.results().len(), 1);
        assert_eq!(harness.report().bpm_accuracy.perfect, 1);
        assert!(harness.fit_multiplier().is_err());
    }
}
