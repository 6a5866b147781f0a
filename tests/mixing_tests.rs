//! Compatibility scoring, selection and Auto-DJ session tests

use proptest::prelude::*;
use rand::rngs::StdRng;
use rand::SeedableRng;
use segue_dsp::events::{EngineEvent, EventBus};
use segue_dsp::features::key::camelot::{CamelotKey, CamelotLetter};
use segue_dsp::mixing::harmonic::harmonic_score;
use segue_dsp::mixing::selector::{SelectionScore, SelectionSettings};
use segue_dsp::mixing::session::SessionSettings;
use segue_dsp::mixing::track::{EnergyTarget, SetPosition};
use segue_dsp::mixing::{AutoDjSession, CompatibilityScorer, MixContext, PerformanceAnalytics, Track, TrackSelector};
use std::sync::Arc;

fn camelot(code: &str) -> Option<CamelotKey> {
    code.parse().ok()
}

fn track(id: &str, bpm: f32, energy: f32, code: &str) -> Track {
    let mut t = Track::new(id, id, "Artist").with_duration(300.0);
    t.bpm = Some(bpm);
    t.energy = Some(energy);
    t.camelot_key = camelot(code);
    t.analyzed = true;
    t
}

fn afternoon() -> MixContext {
    MixContext {
        current_hour: Some(15),
        ..MixContext::default()
    }
}

#[test]
fn test_camelot_relationships() {
    assert_eq!(harmonic_score(camelot("8A"), camelot("8A")), 1.0);

    for neighbour in ["9A", "7A", "8B", "9B", "7B"] {
        let score = harmonic_score(camelot("8A"), camelot(neighbour));
        assert!((0.7..=0.9).contains(&score), "8A -> {} scored {}", neighbour, score);
    }

    // Wraps around the wheel
    assert_eq!(harmonic_score(camelot("12B"), camelot("1B")), 0.9);

    for unrelated in ["3B", "2A", "11B", "5A"] {
        assert!(harmonic_score(camelot("8A"), camelot(unrelated)) <= 0.3);
    }

    assert_eq!(harmonic_score(None, camelot("8A")), 0.5);
}

#[test]
fn test_harmonic_score_is_symmetric() {
    for a in 1..=12u8 {
        for b in 1..=12u8 {
            for (la, lb) in [
                (CamelotLetter::A, CamelotLetter::A),
                (CamelotLetter::A, CamelotLetter::B),
                (CamelotLetter::B, CamelotLetter::B),
            ] {
                let ka = CamelotKey::new(a, la);
                let kb = CamelotKey::new(b, lb);
                assert_eq!(harmonic_score(ka, kb), harmonic_score(kb, ka));
            }
        }
    }
}

fn arb_track() -> impl Strategy<Value = Track> {
    (
        prop::option::of(40.0f32..220.0),
        prop::option::of(0.0f32..=1.0),
        prop::option::of((1u8..=12, any::<bool>())),
        prop::option::of(prop::sample::select(vec![
            "house", "techno", "Deep House", "rock", "jazz", "polka", "drum & bass", "EDM",
        ])),
        prop::option::of(30.0f32..600.0),
        prop::option::of(0.0f32..20.0),
    )
        .prop_map(|(bpm, energy, code, genre, duration, cue_in)| {
            let mut t = Track::new("p", "Prop", "Artist");
            t.bpm = bpm;
            t.energy = energy;
            t.camelot_key = code.and_then(|(n, minor)| {
                CamelotKey::new(n, if minor { CamelotLetter::A } else { CamelotLetter::B })
            });
            t.genre = genre.map(str::to_string);
            t.duration = duration;
            t.cue_in = cue_in;
            t
        })
}

fn arb_context() -> impl Strategy<Value = MixContext> {
    (
        prop::sample::select(vec![EnergyTarget::Build, EnergyTarget::Maintain, EnergyTarget::WindDown]),
        prop::sample::select(vec![
            SetPosition::Opening,
            SetPosition::Middle,
            SetPosition::Peak,
            SetPosition::Closing,
        ]),
        0u32..24,
    )
        .prop_map(|(energy_target, set_position, hour)| MixContext {
            energy_target,
            set_position,
            current_hour: Some(hour),
            play_history_length: 0,
        })
}

proptest! {
    #[test]
    fn test_total_in_unit_interval(a in arb_track(), b in arb_track(), ctx in arb_context()) {
        let score = CompatibilityScorer::default().score(&a, &b, &ctx);
        for sub in [score.harmonic, score.energy, score.bpm, score.structure, score.genre, score.context] {
            prop_assert!((0.0..=1.0).contains(&sub), "sub-score {} out of range", sub);
        }
        prop_assert!(score.total >= 0.0 && score.total <= 1.0 + 1e-6, "total {}", score.total);
    }

    #[test]
    fn test_best_candidate_is_maximal(
        current in arb_track(),
        pool in prop::collection::vec(arb_track(), 1..12),
        ctx in arb_context(),
    ) {
        let selector = TrackSelector::default();
        let scorer = selector.scorer();
        let totals: Vec<f32> = pool.iter().map(|c| scorer.score(&current, c, &ctx).total).collect();
        let best = totals.iter().cloned().fold(f32::MIN, f32::max);

        match selector.find_optimal_next_track(&current, &pool, &ctx) {
            Some(selection) => {
                prop_assert!(selection.score.total() > 0.3);
                prop_assert_eq!(selection.score.total(), best);
                let first = totals.iter().position(|&t| t == best).unwrap();
                prop_assert_eq!(&selection.track, &pool[first]);
            }
            None => prop_assert!(totals.iter().all(|&t| t <= 0.3)),
        }
    }
}

#[test]
fn test_select_next_never_fails_with_other_tracks() {
    let settings = SelectionSettings {
        min_score: 1.0,
        ..SelectionSettings::default()
    };
    let selector = TrackSelector::new(CompatibilityScorer::default(), settings);
    let library = vec![track("a", 128.0, 0.6, "8A"), track("b", 90.0, 0.2, "3B")];
    let mut rng = StdRng::seed_from_u64(11);

    let selection = selector
        .select_next(&library[0], &library, &[], &afternoon(), &mut rng)
        .unwrap();
    assert_eq!(selection.track.id, "b");
    assert!(selection.score.is_fallback());
    assert_eq!(selection.score, SelectionScore::Fallback { total: 0.4 });
}

fn library() -> Vec<Track> {
    let codes = ["8A", "9A", "8B", "7A", "9B", "10A", "6A", "8A", "3B", "11B", "12A", "1A"];
    codes
        .iter()
        .enumerate()
        .map(|(i, code)| {
            track(&format!("t{:02}", i), 120.0 + (i % 5) as f32, 0.35 + 0.04 * i as f32, code)
                .with_genre(if i % 2 == 0 { "house" } else { "techno" })
        })
        .collect()
}

#[test]
fn test_session_plays_a_set() {
    let bus = EventBus::new();
    let rx = bus.subscribe();
    let analytics = Arc::new(PerformanceAnalytics::new(100));
    let mut session = AutoDjSession::new(library(), TrackSelector::default(), SessionSettings::default())
        .unwrap()
        .with_analytics(analytics.clone())
        .with_events(bus);
    let mut rng = StdRng::seed_from_u64(42);

    session.select_initial_track(SetPosition::Opening, &mut rng).unwrap();
    for _ in 0..8 {
        let scheduled = session.prepare_next(Some(21), &mut rng).unwrap().clone();
        assert!(scheduled.start_at_secs >= 0.0);
        assert_ne!(Some(&scheduled.next.id), session.current().map(|t| &t.id));
        let now = session.complete_transition(true, None).unwrap().id.clone();
        assert_eq!(now, scheduled.next.id);
    }

    assert_eq!(session.history().len(), 9);
    assert_eq!(analytics.len(), 8);

    // No repeats within the five most recent plays
    for window in session.history().windows(6) {
        let last = &window[5];
        assert!(!window[..5].contains(last), "{} repeated too soon", last);
    }

    let events: Vec<EngineEvent> = rx.try_iter().collect();
    let selected = events
        .iter()
        .filter(|e| matches!(e, EngineEvent::NextTrackSelected { .. }))
        .count();
    let completed = events
        .iter()
        .filter(|e| matches!(e, EngineEvent::TransitionCompleted { success: true, .. }))
        .count();
    assert_eq!(selected, 8);
    assert_eq!(completed, 8);
}

#[test]
fn test_small_library_is_rejected() {
    let tracks: Vec<Track> = library().into_iter().take(5).collect();
    assert!(AutoDjSession::new(tracks, TrackSelector::default(), SessionSettings::default()).is_err());
}
