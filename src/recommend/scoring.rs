use crate::error::RecommendError;
use crate::models::{AudioFeatures, TARGET_TEMPO_RANGE, TRACK_TEMPO_RANGE, Track};
use std::cmp::Ordering;

pub const VALENCE_WEIGHT: f32 = 2.5;
pub const ENERGY_WEIGHT: f32 = 2.0;
pub const DANCEABILITY_WEIGHT: f32 = 1.5;
pub const TEMPO_WEIGHT: f32 = 1.0;
/// Divisor that brings a BPM difference onto the same scale as the unit features
pub const TEMPO_NORMALIZATION: f32 = 200.0;

/// A track paired with its distance from the mood target; lower is better
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredTrack {
    pub track: Track,
    pub score: f32,
}

/// Mood-match scoring and ranking
pub struct TrackScorer;

impl TrackScorer {
    /// Weighted L1 distance between two feature vectors.
    ///
    /// Both vectors must lie within the track bounds; nothing is clamped.
    pub fn score(candidate: &AudioFeatures, target: &AudioFeatures) -> Result<f32, RecommendError> {
        candidate.validate(&TRACK_TEMPO_RANGE)?;
        target.validate(&TRACK_TEMPO_RANGE)?;

        let valence = (candidate.valence - target.valence).abs() * VALENCE_WEIGHT;
        let energy = (candidate.energy - target.energy).abs() * ENERGY_WEIGHT;
        let danceability =
            (candidate.danceability - target.danceability).abs() * DANCEABILITY_WEIGHT;
        let tempo = (candidate.tempo - target.tempo).abs() / TEMPO_NORMALIZATION * TEMPO_WEIGHT;

        Ok(valence + energy + danceability + tempo)
    }

    /// Score every feature-complete track against a mood target and keep the best `limit`.
    ///
    /// Feature-less tracks and tracks whose features fail validation are left out.
    pub fn rank(tracks: &[Track], target: &AudioFeatures, limit: usize) -> Vec<ScoredTrack> {
        if let Err(e) = target.validate(&TARGET_TEMPO_RANGE) {
            tracing::warn!("not ranking against an invalid target: {e}");
            return Vec::new();
        }

        let mut scored: Vec<ScoredTrack> = tracks
            .iter()
            .filter_map(|track| {
                let features = track.features.as_ref()?;
                match Self::score(features, target) {
                    Ok(score) => Some(ScoredTrack {
                        track: track.clone(),
                        score,
                    }),
                    Err(e) => {
                        tracing::warn!(track_id = %track.id, "skipping track: {e}");
                        None
                    }
                }
            })
            .collect();

        scored.sort_by(|a, b| a.score.partial_cmp(&b.score).unwrap_or(Ordering::Equal));
        scored.truncate(limit);

        tracing::debug!(
            candidates = tracks.len(),
            ranked = scored.len(),
            "ranked candidates by mood distance"
        );
        scored
    }
}
