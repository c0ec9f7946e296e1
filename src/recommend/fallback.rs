use super::config::RecommendConfig;
use super::metadata::{Recommendation, RecommendationStatus, RecommendedTrack};
use super::scoring::{ScoredTrack, TrackScorer};
use super::sourcing::{CandidatePool, CandidateSourcing};
use super::sources::{LibrarySource, SearchQuery};
use crate::error::RecommendError;
use crate::models::AudioFeatures;
use crate::mood::MoodPreset;
use chrono::{Datelike, Local};
use std::fmt;
use std::time::Instant;

/// Strategies tried in order until one yields enough validated tracks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FallbackStage {
    Library,
    KeywordRecent,
    KeywordOnly,
    GenreSeed,
    Unfiltered,
}

impl FallbackStage {
    pub const CHAIN: [FallbackStage; 5] = [
        FallbackStage::Library,
        FallbackStage::KeywordRecent,
        FallbackStage::KeywordOnly,
        FallbackStage::GenreSeed,
        FallbackStage::Unfiltered,
    ];

    pub fn is_search(self) -> bool {
        !matches!(self, FallbackStage::Library)
    }
}

impl fmt::Display for FallbackStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            FallbackStage::Library => "library sample",
            FallbackStage::KeywordRecent => "keyword + recency search",
            FallbackStage::KeywordOnly => "keyword search",
            FallbackStage::GenreSeed => "genre-seed search",
            FallbackStage::Unfiltered => "unfiltered last resort",
        };
        f.write_str(label)
    }
}

/// What happened when a stage was attempted
#[derive(Debug, Clone, PartialEq)]
pub enum StageOutcome {
    Accepted { validated: usize },
    Insufficient { validated: usize, candidates: usize },
    Unvalidated { returned: usize },
    Skipped(String),
    Failed(RecommendError),
}

#[derive(Debug, Clone, PartialEq)]
pub struct StageReport {
    pub stage: FallbackStage,
    pub outcome: StageOutcome,
}

const BUDGET_EXHAUSTED: &str = "time budget exhausted";

/// Where the scored stages of the chain ended
enum ChainEnd {
    Accepted {
        stage: FallbackStage,
        ranked: Vec<ScoredTrack>,
    },
    Exhausted {
        last_search: CandidatePool,
    },
}

/// Release-year window for the recency search: more energetic moods lean newer
pub fn recency_window(energy: f32, current_year: i32) -> (i32, i32) {
    let span = if energy > 0.7 {
        5
    } else if energy > 0.4 {
        10
    } else {
        15
    };
    (current_year - span, current_year)
}

/// Walks the fallback chain for one mood request
pub struct FallbackController<'a> {
    sourcing: CandidateSourcing<'a>,
    library: Option<&'a dyn LibrarySource>,
    config: &'a RecommendConfig,
    current_year: i32,
}

impl<'a> FallbackController<'a> {
    pub fn new(
        sourcing: CandidateSourcing<'a>,
        library: Option<&'a dyn LibrarySource>,
        config: &'a RecommendConfig,
    ) -> Self {
        Self {
            sourcing,
            library,
            config,
            current_year: Local::now().year(),
        }
    }

    /// Pin the year used for recency windows and the generic last-resort query
    pub fn with_current_year(mut self, year: i32) -> Self {
        self.current_year = year;
        self
    }

    /// Try each stage in order; stop at the first one with `count` validated tracks.
    ///
    /// Stage errors are recorded and treated as zero results. Only when the last
    /// resort has nothing either does the chain fail, with `NoMatches`.
    pub fn run(
        &self,
        preset: &MoodPreset,
        target: &AudioFeatures,
        count: usize,
    ) -> Result<Recommendation, RecommendError> {
        let started = Instant::now();
        let mut reports: Vec<StageReport> = Vec::new();

        let last_search = match self.walk_chain(preset, target, count, started, &mut reports) {
            ChainEnd::Accepted { stage, ranked } => {
                let status = match stage {
                    FallbackStage::Library => RecommendationStatus::Library,
                    other => RecommendationStatus::Catalog(other),
                };
                return Ok(Recommendation {
                    mood: Some(preset.mood),
                    target: Some(*target),
                    status,
                    tracks: ranked.into_iter().map(RecommendedTrack::from).collect(),
                    reports,
                });
            }
            ChainEnd::Exhausted { last_search } => last_search,
        };

        let tracks = self.last_resort(count, last_search, started, &mut reports);
        if tracks.is_empty() {
            tracing::error!(mood = %preset.mood, ?reports, "every fallback stage came up empty");
            return Err(RecommendError::NoMatches);
        }

        tracing::warn!(
            mood = %preset.mood,
            returned = tracks.len(),
            "returning unvalidated last-resort results"
        );
        Ok(Recommendation {
            mood: Some(preset.mood),
            target: Some(*target),
            status: RecommendationStatus::LastResort,
            tracks,
            reports,
        })
    }

    fn out_of_time(&self, started: Instant) -> bool {
        started.elapsed() >= self.config.time_budget()
    }

    /// Stages 1 to 4; keeps the most recent non-empty search pool for the last resort
    fn walk_chain(
        &self,
        preset: &MoodPreset,
        target: &AudioFeatures,
        count: usize,
        started: Instant,
        reports: &mut Vec<StageReport>,
    ) -> ChainEnd {
        let mut last_search = CandidatePool::new();

        for stage in FallbackStage::CHAIN {
            if stage == FallbackStage::Unfiltered {
                break;
            }
            if self.out_of_time(started) {
                reports.push(StageReport {
                    stage,
                    outcome: StageOutcome::Skipped(BUDGET_EXHAUSTED.to_string()),
                });
                continue;
            }

            let pool = match self.attempt(stage, preset, target, count, started) {
                Ok(pool) => pool,
                Err(e) => {
                    if e.is_recoverable() {
                        tracing::warn!(%stage, "stage failed: {e}");
                    } else {
                        tracing::error!(%stage, "stage failed: {e}");
                    }
                    reports.push(StageReport {
                        stage,
                        outcome: StageOutcome::Failed(e),
                    });
                    continue;
                }
            };

            let ranked = TrackScorer::rank(pool.tracks(), target, count);
            if ranked.len() >= count {
                tracing::info!(%stage, validated = ranked.len(), "stage accepted");
                reports.push(StageReport {
                    stage,
                    outcome: StageOutcome::Accepted {
                        validated: ranked.len(),
                    },
                });
                return ChainEnd::Accepted { stage, ranked };
            }

            tracing::info!(
                %stage,
                validated = ranked.len(),
                candidates = pool.len(),
                "not enough validated tracks, escalating"
            );
            reports.push(StageReport {
                stage,
                outcome: StageOutcome::Insufficient {
                    validated: ranked.len(),
                    candidates: pool.len(),
                },
            });
            if stage.is_search() && !pool.is_empty() {
                last_search = pool;
            }
        }

        ChainEnd::Exhausted { last_search }
    }

    fn attempt(
        &self,
        stage: FallbackStage,
        preset: &MoodPreset,
        target: &AudioFeatures,
        count: usize,
        started: Instant,
    ) -> Result<CandidatePool, RecommendError> {
        match stage {
            FallbackStage::Library => {
                let library = self.library.ok_or_else(|| {
                    RecommendError::Authentication("no authorized library".to_string())
                })?;
                self.sourcing.library_sample(library)
            }
            FallbackStage::KeywordRecent => {
                let (from, to) = recency_window(target.energy, self.current_year);
                let query = SearchQuery::keywords(preset.primary_keyword()).with_years(from, to);
                self.sourcing.catalog_search(&query, count)
            }
            FallbackStage::KeywordOnly => {
                let query = SearchQuery::keywords(preset.primary_keyword());
                self.sourcing.catalog_search(&query, count)
            }
            FallbackStage::GenreSeed => self.genre_seed_search(preset, target, count, started),
            FallbackStage::Unfiltered => Ok(CandidatePool::new()),
        }
    }

    /// Search seed by seed, stopping once the accumulated pool validates or time runs out
    fn genre_seed_search(
        &self,
        preset: &MoodPreset,
        target: &AudioFeatures,
        count: usize,
        started: Instant,
    ) -> Result<CandidatePool, RecommendError> {
        let mut pool = CandidatePool::new();
        let mut last_error = None;
        for seed in preset.genre_seeds {
            if self.out_of_time(started) {
                tracing::info!(seed = *seed, "time budget exhausted, stopping genre search");
                break;
            }
            match self.sourcing.catalog_search(&SearchQuery::genre(seed), count) {
                Ok(found) => pool.extend_unique(found.into_tracks()),
                Err(e) => {
                    tracing::warn!(seed = *seed, "genre search failed: {e}");
                    last_error = Some(e);
                    continue;
                }
            }
            if TrackScorer::rank(pool.tracks(), target, count).len() >= count {
                break;
            }
        }
        match last_error {
            Some(e) if pool.is_empty() => Err(e),
            _ => Ok(pool),
        }
    }

    /// Up to `count` unscored tracks; always records an Unfiltered report
    fn last_resort(
        &self,
        count: usize,
        last_search: CandidatePool,
        started: Instant,
        reports: &mut Vec<StageReport>,
    ) -> Vec<RecommendedTrack> {
        let stage = FallbackStage::Unfiltered;
        let pool = if !last_search.is_empty() {
            last_search
        } else if self.out_of_time(started) {
            reports.push(StageReport {
                stage,
                outcome: StageOutcome::Skipped(BUDGET_EXHAUSTED.to_string()),
            });
            return Vec::new();
        } else {
            let query = SearchQuery::keywords(&format!("top hits {}", self.current_year));
            match self.sourcing.search_raw(&query, count) {
                Ok(pool) => pool,
                Err(e) => {
                    tracing::warn!("last resort failed: {e}");
                    reports.push(StageReport {
                        stage,
                        outcome: StageOutcome::Failed(e),
                    });
                    return Vec::new();
                }
            }
        };

        let tracks: Vec<RecommendedTrack> = pool
            .into_tracks()
            .into_iter()
            .take(count)
            .map(RecommendedTrack::unscored)
            .collect();
        reports.push(StageReport {
            stage,
            outcome: StageOutcome::Unvalidated {
                returned: tracks.len(),
            },
        });
        tracks
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mood::Mood;
    use crate::recommend::sources::{MockCatalogSource, MockFeatureSource, MockLibrarySource};

    fn zero_budget() -> RecommendConfig {
        RecommendConfig {
            time_budget_secs: 0,
            ..RecommendConfig::default()
        }
    }

    #[test]
    fn test_chain_order_is_fixed() {
        assert_eq!(FallbackStage::CHAIN[0], FallbackStage::Library);
        assert_eq!(FallbackStage::CHAIN[4], FallbackStage::Unfiltered);
        assert!(!FallbackStage::Library.is_search());
        assert!(FallbackStage::GenreSeed.is_search());
    }

    #[test]
    fn test_recency_window_follows_energy() {
        assert_eq!(recency_window(0.9, 2026), (2021, 2026));
        assert_eq!(recency_window(0.7, 2026), (2016, 2026));
        assert_eq!(recency_window(0.4, 2026), (2011, 2026));
        assert_eq!(recency_window(0.3, 2026), (2011, 2026));
    }

    #[test]
    fn test_exhausted_budget_skips_every_stage() {
        let config = zero_budget();
        let library = MockLibrarySource::new();
        let catalog = MockCatalogSource::new();
        let features = MockFeatureSource::new();
        let sourcing = CandidateSourcing::new(&catalog, &features, &config);
        let controller =
            FallbackController::new(sourcing, Some(&library), &config).with_current_year(2026);
        let preset = Mood::Happy.preset();

        let mut reports = Vec::new();
        let started = Instant::now();
        let end = controller.walk_chain(preset, &preset.target, 10, started, &mut reports);
        assert!(matches!(end, ChainEnd::Exhausted { ref last_search } if last_search.is_empty()));

        // no generic query once the budget is gone
        let tracks = controller.last_resort(10, CandidatePool::new(), started, &mut reports);
        assert!(tracks.is_empty());

        let stages: Vec<FallbackStage> = reports.iter().map(|r| r.stage).collect();
        assert_eq!(stages, FallbackStage::CHAIN.to_vec());
        assert!(
            reports
                .iter()
                .all(|r| r.outcome == StageOutcome::Skipped("time budget exhausted".to_string()))
        );
    }

    #[test]
    fn test_genre_search_checks_budget_before_each_seed() {
        let config = zero_budget();
        let catalog = MockCatalogSource::new();
        let features = MockFeatureSource::new();
        let sourcing = CandidateSourcing::new(&catalog, &features, &config);
        let controller = FallbackController::new(sourcing, None, &config);
        let preset = Mood::Hype.preset();

        let pool = controller
            .genre_seed_search(preset, &preset.target, 10, Instant::now())
            .unwrap();
        assert!(pool.is_empty());
    }

    #[test]
    fn test_empty_generic_query_is_still_reported() {
        let config = RecommendConfig::default();
        let mut catalog = MockCatalogSource::new();
        catalog
            .expect_search()
            .withf(|query, _| query.to_query_string() == "top hits 2026")
            .times(1)
            .returning(|_, _| Ok(Vec::new()));
        let features = MockFeatureSource::new();
        let sourcing = CandidateSourcing::new(&catalog, &features, &config);
        let controller = FallbackController::new(sourcing, None, &config).with_current_year(2026);

        let mut reports = Vec::new();
        let tracks = controller.last_resort(10, CandidatePool::new(), Instant::now(), &mut reports);

        assert!(tracks.is_empty());
        assert_eq!(
            reports,
            vec![StageReport {
                stage: FallbackStage::Unfiltered,
                outcome: StageOutcome::Unvalidated { returned: 0 },
            }]
        );
    }
}
