//! Mix compatibility and Auto-DJ
//!
//! Scores how well two analyzed tracks mix, plans the transition between
//! them and drives a session that keeps choosing the next track.

pub mod analytics;
pub mod genre;
pub mod harmonic;
pub mod planner;
pub mod scorer;
pub mod selector;
pub mod session;
pub mod track;

pub use analytics::{MixOutcome, PerformanceAnalytics};
pub use harmonic::{harmonic_advice, harmonic_score, CamelotRelation, HarmonicAdvice};
pub use planner::{CrossfadeStrategy, MixInstructions, MixPlanner};
pub use scorer::{CompatibilityScore, CompatibilityScorer, ScoreWeights};
pub use selector::{Selection, SelectionScore, SelectionSettings, TrackSelector};
pub use session::{AutoDjSession, ScheduledTransition, SessionSettings};
pub use track::{EnergyTarget, MixContext, SetPosition, Track};
