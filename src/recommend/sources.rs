use crate::error::RecommendError;
use crate::models::{AudioFeatures, CreatedPlaylist, Track, UserProfile};

/// One page of the saved-tracks listing
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SavedPage {
    /// Catalog track ids; local files and non-track items are already dropped
    pub ids: Vec<String>,
    /// Items the page held before filtering, used to advance the offset
    pub raw_count: usize,
    pub has_next: bool,
}

/// The user's saved-track library; needs user authorization
#[cfg_attr(test, mockall::automock)]
pub trait LibrarySource {
    fn saved_tracks(&self, limit: usize, offset: usize) -> Result<SavedPage, RecommendError>;
}

/// Catalog search and track lookup
#[cfg_attr(test, mockall::automock)]
pub trait CatalogSource {
    fn search(&self, query: &SearchQuery, limit: usize) -> Result<Vec<Track>, RecommendError>;

    /// Full track details for at most one batch of ids
    fn tracks(&self, ids: &[String]) -> Result<Vec<Track>, RecommendError>;
}

/// Audio-feature lookup; the result is aligned with `ids`, `None` marks a feature-less track
#[cfg_attr(test, mockall::automock)]
pub trait FeatureSource {
    fn audio_features(&self, ids: &[String]) -> Result<Vec<Option<AudioFeatures>>, RecommendError>;
}

/// Playlist writing for the authorized user
#[cfg_attr(test, mockall::automock)]
pub trait PlaylistSink {
    fn current_user(&self) -> Result<UserProfile, RecommendError>;

    fn create_playlist(
        &self,
        user_id: &str,
        name: &str,
        description: &str,
    ) -> Result<CreatedPlaylist, RecommendError>;

    fn add_tracks(&self, playlist_id: &str, uris: &[String]) -> Result<(), RecommendError>;
}

/// A catalog search: free keywords plus optional field filters
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchQuery {
    pub keywords: Option<String>,
    pub genre: Option<String>,
    pub artist: Option<String>,
    pub years: Option<(i32, i32)>,
}

impl SearchQuery {
    pub fn keywords(keywords: &str) -> Self {
        SearchQuery {
            keywords: Some(keywords.to_string()),
            ..SearchQuery::default()
        }
    }

    pub fn genre(genre: &str) -> Self {
        SearchQuery {
            genre: Some(genre.to_string()),
            ..SearchQuery::default()
        }
    }

    pub fn artist(artist: &str) -> Self {
        SearchQuery {
            artist: Some(artist.to_string()),
            ..SearchQuery::default()
        }
    }

    pub fn with_years(mut self, from: i32, to: i32) -> Self {
        self.years = Some((from, to));
        self
    }

    /// Render into the catalog's `q` syntax, e.g. `happy year:2021-2026`
    pub fn to_query_string(&self) -> String {
        let mut parts = Vec::new();
        if let Some(keywords) = &self.keywords {
            parts.push(keywords.trim().to_string());
        }
        if let Some(genre) = &self.genre {
            parts.push(format!("genre:{}", quote_if_spaced(genre)));
        }
        if let Some(artist) = &self.artist {
            parts.push(format!("artist:{}", quote_if_spaced(artist)));
        }
        if let Some((from, to)) = self.years {
            parts.push(format!("year:{from}-{to}"));
        }
        parts.retain(|part| !part.is_empty());
        parts.join(" ")
    }
}

fn quote_if_spaced(value: &str) -> String {
    let value = value.trim();
    if value.contains(char::is_whitespace) {
        format!("\"{value}\"")
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keyword_query_with_years() {
        let query = SearchQuery::keywords("happy").with_years(2021, 2026);
        assert_eq!(query.to_query_string(), "happy year:2021-2026");
    }

    #[test]
    fn test_field_filters_quote_multi_word_values() {
        assert_eq!(
            SearchQuery::artist("Rauw Alejandro").to_query_string(),
            "artist:\"Rauw Alejandro\""
        );
        assert_eq!(SearchQuery::genre("hip-hop").to_query_string(), "genre:hip-hop");
    }

    #[test]
    fn test_empty_query_renders_empty() {
        assert_eq!(SearchQuery::default().to_query_string(), "");
        assert_eq!(SearchQuery::keywords("   ").to_query_string(), "");
    }
}
