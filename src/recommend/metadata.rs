use super::fallback::{FallbackStage, StageReport};
use super::scoring::ScoredTrack;
use crate::models::{AudioFeatures, Track};
use crate::mood::Mood;
use std::fmt;

/// A track in a recommendation; `score` is `None` for artist and last-resort results
#[derive(Debug, Clone, PartialEq)]
pub struct RecommendedTrack {
    pub track: Track,
    pub score: Option<f32>,
}

impl RecommendedTrack {
    pub fn unscored(track: Track) -> Self {
        Self { track, score: None }
    }
}

impl From<ScoredTrack> for RecommendedTrack {
    fn from(scored: ScoredTrack) -> Self {
        Self {
            track: scored.track,
            score: Some(scored.score),
        }
    }
}

/// Which path produced a recommendation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecommendationStatus {
    Library,
    Catalog(FallbackStage),
    LastResort,
    ArtistSearch,
}

impl RecommendationStatus {
    /// Results that were not validated against the mood target
    pub fn is_warning(self) -> bool {
        matches!(self, RecommendationStatus::LastResort)
    }

    pub fn is_scored(self) -> bool {
        matches!(
            self,
            RecommendationStatus::Library | RecommendationStatus::Catalog(_)
        )
    }
}

impl fmt::Display for RecommendationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecommendationStatus::Library => f.write_str("library"),
            RecommendationStatus::Catalog(_) => f.write_str("fallback: catalog"),
            RecommendationStatus::LastResort => f.write_str("fallback: unfiltered"),
            RecommendationStatus::ArtistSearch => f.write_str("artist-search"),
        }
    }
}

/// The outcome of one recommendation request
#[derive(Debug, Clone, PartialEq)]
pub struct Recommendation {
    pub mood: Option<Mood>,
    pub target: Option<AudioFeatures>,
    pub status: RecommendationStatus,
    pub tracks: Vec<RecommendedTrack>,
    /// Every stage attempted, in order
    pub reports: Vec<StageReport>,
}

impl Recommendation {
    pub fn warning(&self) -> Option<String> {
        if self.status.is_warning() {
            Some(format!(
                "no tracks matched the {} mood closely enough; showing unvalidated search results",
                self.mood.map(|m| m.name()).unwrap_or("requested")
            ))
        } else {
            None
        }
    }

    /// Spotify URIs of the recommended tracks, in order
    pub fn track_uris(&self) -> Vec<String> {
        self.tracks.iter().map(|t| t.track.uri.clone()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_labels() {
        assert_eq!(RecommendationStatus::Library.to_string(), "library");
        assert_eq!(
            RecommendationStatus::Catalog(FallbackStage::KeywordOnly).to_string(),
            "fallback: catalog"
        );
        assert_eq!(RecommendationStatus::LastResort.to_string(), "fallback: unfiltered");
        assert_eq!(RecommendationStatus::ArtistSearch.to_string(), "artist-search");
    }

    #[test]
    fn test_only_last_resort_warns() {
        assert!(RecommendationStatus::LastResort.is_warning());
        assert!(!RecommendationStatus::ArtistSearch.is_warning());
        assert!(!RecommendationStatus::ArtistSearch.is_scored());
        assert!(RecommendationStatus::Catalog(FallbackStage::GenreSeed).is_scored());
    }
}
