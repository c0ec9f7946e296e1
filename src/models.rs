use crate::error::RecommendError;
use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;

/// Bounds shared by valence, energy and danceability
pub const UNIT_RANGE: RangeInclusive<f32> = 0.0..=1.0;
/// Tempo bounds accepted for a track's measured features (BPM)
pub const TRACK_TEMPO_RANGE: RangeInclusive<f32> = 0.0..=250.0;
/// Tempo bounds accepted for a mood target (BPM)
pub const TARGET_TEMPO_RANGE: RangeInclusive<f32> = 60.0..=200.0;

/// The four audio features used to describe a track or a mood target
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AudioFeatures {
    pub valence: f32,
    pub energy: f32,
    pub danceability: f32,
    pub tempo: f32,
}

impl AudioFeatures {
    /// Build a track feature vector, rejecting values outside the track bounds
    pub fn new(
        valence: f32,
        energy: f32,
        danceability: f32,
        tempo: f32,
    ) -> Result<Self, RecommendError> {
        let features = AudioFeatures {
            valence,
            energy,
            danceability,
            tempo,
        };
        features.validate(&TRACK_TEMPO_RANGE)?;
        Ok(features)
    }

    /// Check every component against its bound; tempo uses the given range
    pub fn validate(&self, tempo_range: &RangeInclusive<f32>) -> Result<(), RecommendError> {
        check_component("valence", self.valence, &UNIT_RANGE)?;
        check_component("energy", self.energy, &UNIT_RANGE)?;
        check_component("danceability", self.danceability, &UNIT_RANGE)?;
        check_component("tempo", self.tempo, tempo_range)
    }
}

fn check_component(
    name: &str,
    value: f32,
    range: &RangeInclusive<f32>,
) -> Result<(), RecommendError> {
    // NaN fails `contains` too
    if range.contains(&value) {
        Ok(())
    } else {
        Err(RecommendError::InvalidInput(format!(
            "{name} must be between {} and {}, got {value}",
            range.start(),
            range.end()
        )))
    }
}

/// A catalog track together with its audio features, when the upstream could supply them
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Track {
    pub id: String,
    pub name: String,
    pub artists: Vec<String>,
    pub album: String,
    pub album_art_url: Option<String>,
    pub preview_url: Option<String>,
    pub spotify_url: Option<String>,
    pub uri: String,
    pub features: Option<AudioFeatures>,
}

impl Track {
    pub fn artist_display(&self) -> String {
        self.artists.join(", ")
    }

    pub fn has_features(&self) -> bool {
        self.features.is_some()
    }
}

/// Spotify user profile, needed to own an exported playlist
#[derive(Debug, Clone, PartialEq)]
pub struct UserProfile {
    pub id: String,
    pub display_name: String,
}

/// Playlist returned by the create-playlist call
#[derive(Debug, Clone, PartialEq)]
pub struct CreatedPlaylist {
    pub id: String,
    pub name: String,
    pub url: Option<String>,
    pub track_count: usize,
}

/// Response structure for the client-credentials token call
#[derive(Debug, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub expires_in: u64,
}

/// Generic Spotify paging object
#[derive(Debug, Deserialize)]
pub struct Paging<T> {
    pub items: Vec<T>,
    /// URL of the following page, absent on the last one
    pub next: Option<String>,
}

/// Response structure for the search endpoint
#[derive(Debug, Deserialize)]
pub struct SearchResponse {
    pub tracks: Option<Paging<TrackObject>>,
}

/// One entry from the saved-tracks endpoint
#[derive(Debug, Deserialize)]
pub struct SavedTrackItem {
    pub track: Option<TrackObject>,
}

/// Response structure for the several-tracks endpoint
#[derive(Debug, Deserialize)]
pub struct TracksResponse {
    pub tracks: Vec<Option<TrackObject>>,
}

/// Response structure for the several-audio-features endpoint
#[derive(Debug, Deserialize)]
pub struct AudioFeaturesResponse {
    pub audio_features: Vec<Option<AudioFeaturesObject>>,
}

#[derive(Debug, Deserialize)]
pub struct AudioFeaturesObject {
    pub id: String,
    pub valence: f32,
    pub energy: f32,
    pub danceability: f32,
    pub tempo: f32,
}

impl AudioFeaturesObject {
    /// Convert to a validated vector; out-of-range payloads become feature-less
    pub fn into_features(self) -> Option<AudioFeatures> {
        match AudioFeatures::new(self.valence, self.energy, self.danceability, self.tempo) {
            Ok(features) => Some(features),
            Err(e) => {
                tracing::warn!(track_id = %self.id, "discarding audio features: {e}");
                None
            }
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct TrackObject {
    pub id: Option<String>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub artists: Vec<ArtistObject>,
    pub album: Option<AlbumObject>,
    pub preview_url: Option<String>,
    pub external_urls: Option<ExternalUrls>,
    #[serde(default)]
    pub uri: String,
    #[serde(default)]
    pub is_local: bool,
    #[serde(rename = "type")]
    pub kind: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ArtistObject {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct AlbumObject {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub images: Vec<ImageObject>,
}

#[derive(Debug, Deserialize)]
pub struct ImageObject {
    pub url: String,
}

#[derive(Debug, Deserialize)]
pub struct ExternalUrls {
    pub spotify: Option<String>,
}

impl TrackObject {
    /// Whether this item is a playable catalog track (not a local file or episode)
    pub fn is_catalog_track(&self) -> bool {
        !self.is_local && self.kind.as_deref().is_none_or(|kind| kind == "track")
    }

    /// Convert into our Track, dropping items without an id, a name or any artist
    pub fn into_track(self) -> Option<Track> {
        if !self.is_catalog_track() {
            return None;
        }
        let id = self.id.filter(|id| !id.is_empty())?;
        let artists: Vec<String> = self
            .artists
            .into_iter()
            .map(|artist| artist.name)
            .filter(|name| !name.is_empty())
            .collect();
        if self.name.is_empty() || artists.is_empty() {
            return None;
        }

        let (album, album_art_url) = match self.album {
            Some(album) => {
                let art = album.images.into_iter().next().map(|image| image.url);
                (album.name, art)
            }
            None => (String::new(), None),
        };

        Some(Track {
            id,
            name: self.name,
            artists,
            album,
            album_art_url,
            preview_url: self.preview_url,
            spotify_url: self.external_urls.and_then(|urls| urls.spotify),
            uri: self.uri,
            features: None,
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct UserObject {
    pub id: String,
    pub display_name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct PlaylistObject {
    pub id: String,
    pub name: String,
    pub external_urls: Option<ExternalUrls>,
}
