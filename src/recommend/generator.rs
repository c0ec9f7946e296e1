use super::config::{FeatureOverrides, RecommendConfig};
use super::fallback::FallbackController;
use super::metadata::{Recommendation, RecommendationStatus, RecommendedTrack};
use super::sourcing::CandidateSourcing;
use super::sources::{CatalogSource, FeatureSource, LibrarySource, SearchQuery};
use crate::error::RecommendError;
use crate::models::AudioFeatures;
use crate::mood::{self, Mood, MoodPreset, TextIntent};

/// What the caller asked for
#[derive(Debug, Clone, PartialEq)]
pub enum MoodRequest {
    Preset(Mood),
    Text(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct RecommendRequest {
    pub input: MoodRequest,
    pub count: Option<usize>,
    pub overrides: FeatureOverrides,
}

impl RecommendRequest {
    pub fn preset(mood: Mood) -> Self {
        Self {
            input: MoodRequest::Preset(mood),
            count: None,
            overrides: FeatureOverrides::default(),
        }
    }

    pub fn text(text: &str) -> Self {
        Self {
            input: MoodRequest::Text(text.to_string()),
            count: None,
            overrides: FeatureOverrides::default(),
        }
    }

    pub fn with_count(mut self, count: usize) -> Self {
        self.count = Some(count);
        self
    }

    pub fn with_overrides(mut self, overrides: FeatureOverrides) -> Self {
        self.overrides = overrides;
        self
    }

    /// Validate a request without any network access
    pub fn resolve(&self, config: &RecommendConfig) -> Result<ResolvedRequest, RecommendError> {
        let count = self.count.unwrap_or(config.count);
        config.check_count(count)?;

        let mood = match &self.input {
            MoodRequest::Preset(mood) => *mood,
            MoodRequest::Text(text) => match mood::classify(text) {
                TextIntent::Artist(name) => {
                    if !self.overrides.is_empty() {
                        return Err(RecommendError::InvalidInput(
                            "feature overrides do not apply to artist requests".to_string(),
                        ));
                    }
                    return Ok(ResolvedRequest::Artist { name, count });
                }
                TextIntent::Mood(mood) => mood,
                TextIntent::Unrecognized => {
                    return Err(RecommendError::InvalidInput(format!(
                        "could not work out a mood from '{}'; pick one of the presets",
                        text.trim()
                    )));
                }
            },
        };

        let preset = mood.preset();
        let target = self.overrides.apply(preset.target)?;
        Ok(ResolvedRequest::Mood {
            preset,
            target,
            count,
        })
    }
}

/// A request after validation, ready to touch the network
#[derive(Debug, Clone)]
pub enum ResolvedRequest {
    Mood {
        preset: &'static MoodPreset,
        target: AudioFeatures,
        count: usize,
    },
    Artist {
        name: String,
        count: usize,
    },
}

/// Main recommendation generator
pub struct RecommendationGenerator<'a> {
    library: Option<&'a dyn LibrarySource>,
    catalog: &'a dyn CatalogSource,
    features: &'a dyn FeatureSource,
    config: RecommendConfig,
    current_year: Option<i32>,
}

impl<'a> RecommendationGenerator<'a> {
    /// `library` is `None` when the caller has not authorized library access
    pub fn new(
        library: Option<&'a dyn LibrarySource>,
        catalog: &'a dyn CatalogSource,
        features: &'a dyn FeatureSource,
        config: RecommendConfig,
    ) -> Self {
        Self {
            library,
            catalog,
            features,
            config,
            current_year: None,
        }
    }

    pub fn with_current_year(mut self, year: i32) -> Self {
        self.current_year = Some(year);
        self
    }

    /// Validate a request without any network access
    pub fn resolve(&self, request: &RecommendRequest) -> Result<ResolvedRequest, RecommendError> {
        request.resolve(&self.config)
    }

    /// Resolve the request, then gather, score and rank tracks for it
    pub fn recommend(&self, request: &RecommendRequest) -> Result<Recommendation, RecommendError> {
        match self.resolve(request)? {
            ResolvedRequest::Artist { name, count } => self.artist_search(&name, count),
            ResolvedRequest::Mood {
                preset,
                target,
                count,
            } => {
                tracing::info!(mood = %preset.mood, count, "recommending by mood");
                let sourcing = CandidateSourcing::new(self.catalog, self.features, &self.config);
                let mut controller = FallbackController::new(sourcing, self.library, &self.config);
                if let Some(year) = self.current_year {
                    controller = controller.with_current_year(year);
                }
                controller.run(preset, &target, count)
            }
        }
    }

    /// Artist requests skip mood scoring and the fallback chain
    fn artist_search(&self, name: &str, count: usize) -> Result<Recommendation, RecommendError> {
        tracing::info!(artist = name, count, "recommending by artist");
        let limit = self.config.search_limit(count);
        let tracks = self.catalog.search(&SearchQuery::artist(name), limit)?;
        if tracks.is_empty() {
            return Err(RecommendError::NoMatches);
        }

        Ok(Recommendation {
            mood: None,
            target: None,
            status: RecommendationStatus::ArtistSearch,
            tracks: tracks
                .into_iter()
                .take(count)
                .map(RecommendedTrack::unscored)
                .collect(),
            reports: Vec::new(),
        })
    }
}
