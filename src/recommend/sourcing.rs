use super::config::RecommendConfig;
use super::sources::{CatalogSource, FeatureSource, LibrarySource, SearchQuery};
use crate::error::RecommendError;
use crate::models::Track;
use rand::seq::SliceRandom;
use std::collections::HashSet;

/// Page size of the saved-tracks endpoint
const LIBRARY_PAGE_SIZE: usize = 50;

/// Tracks gathered for one request before scoring
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CandidatePool {
    tracks: Vec<Track>,
}

impl CandidatePool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append tracks, skipping ids already in the pool
    pub fn extend_unique(&mut self, tracks: Vec<Track>) {
        let mut seen: HashSet<String> = self.tracks.iter().map(|t| t.id.clone()).collect();
        for track in tracks {
            if seen.insert(track.id.clone()) {
                self.tracks.push(track);
            }
        }
    }

    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    pub fn into_tracks(self) -> Vec<Track> {
        self.tracks
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    /// Tracks whose audio features could not be fetched
    pub fn featureless_count(&self) -> usize {
        self.tracks.iter().filter(|t| !t.has_features()).count()
    }
}

/// Builds candidate pools from the library or the catalog and attaches audio features
pub struct CandidateSourcing<'a> {
    catalog: &'a dyn CatalogSource,
    features: &'a dyn FeatureSource,
    config: &'a RecommendConfig,
}

impl<'a> CandidateSourcing<'a> {
    pub fn new(
        catalog: &'a dyn CatalogSource,
        features: &'a dyn FeatureSource,
        config: &'a RecommendConfig,
    ) -> Self {
        Self {
            catalog,
            features,
            config,
        }
    }

    /// Sample the user's saved tracks and resolve them into a featured pool
    pub fn library_sample(&self, library: &dyn LibrarySource) -> Result<CandidatePool, RecommendError> {
        let saved = self.saved_track_ids(library)?;
        if saved.len() < self.config.min_library_size {
            return Err(RecommendError::InsufficientLibrary {
                found: saved.len(),
                required: self.config.min_library_size,
            });
        }

        let mut rng = rand::thread_rng();
        let sample: Vec<String> = saved
            .choose_multiple(&mut rng, self.config.library_sample_cap)
            .cloned()
            .collect();
        tracing::debug!(saved = saved.len(), sampled = sample.len(), "sampled library");

        let mut pool = CandidatePool::new();
        for batch in sample.chunks(self.config.track_batch_size) {
            pool.extend_unique(self.catalog.tracks(batch)?);
        }
        self.attach_features(&mut pool);
        Ok(pool)
    }

    /// Run one catalog search and attach features to the results
    pub fn catalog_search(&self, query: &SearchQuery, count: usize) -> Result<CandidatePool, RecommendError> {
        let mut pool = self.search_raw(query, count)?;
        self.attach_features(&mut pool);
        Ok(pool)
    }

    /// Run one catalog search without fetching features
    pub fn search_raw(&self, query: &SearchQuery, count: usize) -> Result<CandidatePool, RecommendError> {
        let limit = self.config.search_limit(count);
        let results = self.catalog.search(query, limit)?;
        tracing::debug!(
            query = %query.to_query_string(),
            results = results.len(),
            "catalog search"
        );

        let mut pool = CandidatePool::new();
        pool.extend_unique(results);
        Ok(pool)
    }

    /// Fetch audio features in batches; a failed batch leaves its tracks feature-less
    pub fn attach_features(&self, pool: &mut CandidatePool) {
        for batch in pool.tracks.chunks_mut(self.config.feature_batch_size) {
            let ids: Vec<String> = batch.iter().map(|t| t.id.clone()).collect();
            match self.features.audio_features(&ids) {
                Ok(features) => {
                    for (track, features) in batch.iter_mut().zip(features) {
                        track.features = features;
                    }
                }
                Err(e) => {
                    tracing::warn!(batch = ids.len(), "audio features unavailable for batch: {e}");
                }
            }
        }
        let missing = pool.featureless_count();
        if missing > 0 {
            tracing::info!(missing, total = pool.len(), "some candidates have no audio features");
        }
    }

    /// Page through the library until it runs out or `library_scan_max` items were read
    fn saved_track_ids(&self, library: &dyn LibrarySource) -> Result<Vec<String>, RecommendError> {
        let mut ids: Vec<String> = Vec::new();
        let mut offset = 0;
        while offset < self.config.library_scan_max {
            let page_size = LIBRARY_PAGE_SIZE.min(self.config.library_scan_max - offset);
            let page = library.saved_tracks(page_size, offset)?;
            offset += page.raw_count;
            ids.extend(page.ids);
            if !page.has_next || page.raw_count == 0 {
                break;
            }
        }
        tracing::debug!(read = offset, usable = ids.len(), "scanned saved tracks");
        Ok(ids)
    }
}
