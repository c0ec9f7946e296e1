use crate::config::Config;
use crate::error::RecommendError;
use crate::models::{
    AudioFeatures, AudioFeaturesResponse, CreatedPlaylist, Paging, PlaylistObject,
    SavedTrackItem, SearchResponse, TokenResponse, Track, TracksResponse, UserObject, UserProfile,
};
use crate::recommend::{
    CatalogSource, FeatureSource, LibrarySource, PlaylistSink, SavedPage, SearchQuery,
};
use base64::{Engine as _, engine::general_purpose::STANDARD};
use std::cell::RefCell;
use std::collections::HashMap;
use std::time::{Duration, Instant};
use ureq::{Agent, AgentBuilder};
use urlencoding::encode;

/// Spotify endpoint limits
pub const MAX_SEARCH_LIMIT: usize = 50;
pub const MAX_TRACK_IDS: usize = 50;
pub const MAX_FEATURE_IDS: usize = 100;
pub const MAX_PLAYLIST_ADD: usize = 100;

/// Refresh the app token this long before Spotify says it expires
const TOKEN_EXPIRY_MARGIN: Duration = Duration::from_secs(60);

struct CachedToken {
    access_token: String,
    expires_at: Instant,
}

/// A blocking Spotify Web API client.
///
/// Catalog and audio-feature calls use an app token from the client-credentials
/// flow. Library and playlist calls need the optional user token.
pub struct SpotifyClient {
    agent: Agent,
    config: Config,
    app_token: RefCell<Option<CachedToken>>,
}

impl SpotifyClient {
    pub fn new(config: Config) -> Self {
        let agent = AgentBuilder::new()
            .timeout_connect(config.http.connect_timeout)
            .timeout(config.http.timeout)
            .build();

        SpotifyClient {
            agent,
            config,
            app_token: RefCell::new(None),
        }
    }

    pub fn has_user_token(&self) -> bool {
        self.config.user_token.is_some()
    }

    /// App token from the cache, or a fresh one from the token endpoint
    fn app_token(&self) -> Result<String, RecommendError> {
        if let Some(cached) = self.app_token.borrow().as_ref() {
            if Instant::now() < cached.expires_at {
                return Ok(cached.access_token.clone());
            }
        }

        tracing::debug!(url = %self.config.token_url, "requesting client-credentials token");
        let credentials = STANDARD.encode(format!(
            "{}:{}",
            self.config.client_id, self.config.client_secret
        ));
        let response = self
            .agent
            .post(&self.config.token_url)
            .set("Authorization", &format!("Basic {credentials}"))
            .send_form(&[("grant_type", "client_credentials")])
            .map_err(|e| match RecommendError::from(e) {
                RecommendError::Api { status: Some(400), .. } => RecommendError::Authentication(
                    "client credentials were rejected".to_string(),
                ),
                other => other,
            })?;
        let token: TokenResponse = response.into_json()?;

        let lifetime = Duration::from_secs(token.expires_in).saturating_sub(TOKEN_EXPIRY_MARGIN);
        *self.app_token.borrow_mut() = Some(CachedToken {
            access_token: token.access_token.clone(),
            expires_at: Instant::now() + lifetime,
        });
        Ok(token.access_token)
    }

    fn user_token(&self) -> Result<&str, RecommendError> {
        self.config.user_token.as_deref().ok_or_else(|| {
            RecommendError::Authentication("SPOTIFY_USER_TOKEN is required for this action".to_string())
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.config.api_base, path.trim_start_matches('/'))
    }

    fn get_json<T: serde::de::DeserializeOwned>(&self, url: &str, token: &str) -> Result<T, RecommendError> {
        tracing::debug!(%url, "GET");
        let response = self
            .agent
            .get(url)
            .set("Authorization", &format!("Bearer {token}"))
            .call()?;
        Ok(response.into_json()?)
    }

    fn post_json<T: serde::de::DeserializeOwned>(
        &self,
        url: &str,
        token: &str,
        body: serde_json::Value,
    ) -> Result<T, RecommendError> {
        tracing::debug!(%url, "POST");
        let response = self
            .agent
            .post(url)
            .set("Authorization", &format!("Bearer {token}"))
            .send_json(body)?;
        Ok(response.into_json()?)
    }
}

/// Playable tracks from a search response
pub fn parse_search(response: SearchResponse) -> Vec<Track> {
    response
        .tracks
        .map(|page| page.items.into_iter().filter_map(|item| item.into_track()).collect())
        .unwrap_or_default()
}

/// Ids of the catalog tracks in one saved-tracks page, plus what is needed to page on
pub fn parse_saved_page(page: Paging<SavedTrackItem>) -> SavedPage {
    let raw_count = page.items.len();
    let has_next = page.next.is_some();
    let ids = page
        .items
        .into_iter()
        .filter_map(|item| item.track)
        .filter(|track| track.is_catalog_track())
        .filter_map(|track| track.id)
        .filter(|id| !id.is_empty())
        .collect();

    SavedPage {
        ids,
        raw_count,
        has_next,
    }
}

pub fn parse_tracks(response: TracksResponse) -> Vec<Track> {
    response
        .tracks
        .into_iter()
        .flatten()
        .filter_map(|track| track.into_track())
        .collect()
}

/// Align audio features with the requested ids; missing or invalid entries become `None`
pub fn parse_features(response: AudioFeaturesResponse, ids: &[String]) -> Vec<Option<AudioFeatures>> {
    let mut by_id: HashMap<String, AudioFeatures> = HashMap::new();
    for object in response.audio_features.into_iter().flatten() {
        let id = object.id.clone();
        if let Some(features) = object.into_features() {
            by_id.insert(id, features);
        }
    }
    ids.iter().map(|id| by_id.get(id).copied()).collect()
}

fn check_batch(ids: &[String], max: usize, what: &str) -> Result<(), RecommendError> {
    if ids.len() > max {
        return Err(RecommendError::InvalidInput(format!(
            "at most {max} {what} per request, got {}",
            ids.len()
        )));
    }
    Ok(())
}

fn join_ids(ids: &[String]) -> String {
    ids.iter().map(|id| encode(id).into_owned()).collect::<Vec<_>>().join(",")
}

impl LibrarySource for SpotifyClient {
    fn saved_tracks(&self, limit: usize, offset: usize) -> Result<SavedPage, RecommendError> {
        let token = self.user_token()?;
        let url = self.url(&format!(
            "me/tracks?limit={}&offset={}&market={}",
            limit.clamp(1, 50),
            offset,
            encode(&self.config.market)
        ));
        let page: Paging<SavedTrackItem> = self.get_json(&url, token)?;
        Ok(parse_saved_page(page))
    }
}

impl CatalogSource for SpotifyClient {
    fn search(&self, query: &SearchQuery, limit: usize) -> Result<Vec<Track>, RecommendError> {
        let q = query.to_query_string();
        if q.is_empty() {
            return Err(RecommendError::InvalidInput("search query is empty".to_string()));
        }
        if limit == 0 || limit > MAX_SEARCH_LIMIT {
            return Err(RecommendError::InvalidInput(format!(
                "search limit must be between 1 and {MAX_SEARCH_LIMIT}, got {limit}"
            )));
        }

        let token = self.app_token()?;
        let url = self.url(&format!(
            "search?q={}&type=track&limit={}&market={}",
            encode(&q),
            limit,
            encode(&self.config.market)
        ));
        let response: SearchResponse = self.get_json(&url, &token)?;
        Ok(parse_search(response))
    }

    fn tracks(&self, ids: &[String]) -> Result<Vec<Track>, RecommendError> {
        check_batch(ids, MAX_TRACK_IDS, "track ids")?;
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let token = self.app_token()?;
        let url = self.url(&format!(
            "tracks?ids={}&market={}",
            join_ids(ids),
            encode(&self.config.market)
        ));
        let response: TracksResponse = self.get_json(&url, &token)?;
        Ok(parse_tracks(response))
    }
}

impl FeatureSource for SpotifyClient {
    fn audio_features(&self, ids: &[String]) -> Result<Vec<Option<AudioFeatures>>, RecommendError> {
        check_batch(ids, MAX_FEATURE_IDS, "audio-feature ids")?;
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let token = self.app_token()?;
        let url = self.url(&format!("audio-features?ids={}", join_ids(ids)));
        let response: AudioFeaturesResponse = self.get_json(&url, &token)?;
        Ok(parse_features(response, ids))
    }
}

impl PlaylistSink for SpotifyClient {
    fn current_user(&self) -> Result<UserProfile, RecommendError> {
        let token = self.user_token()?;
        let user: UserObject = self.get_json(&self.url("me"), token)?;
        Ok(UserProfile {
            display_name: user.display_name.unwrap_or_else(|| user.id.clone()),
            id: user.id,
        })
    }

    fn create_playlist(
        &self,
        user_id: &str,
        name: &str,
        description: &str,
    ) -> Result<CreatedPlaylist, RecommendError> {
        let token = self.user_token()?;
        let url = self.url(&format!("users/{}/playlists", encode(user_id)));
        let body = serde_json::json!({
            "name": name,
            "description": description,
            "public": false,
        });
        let playlist: PlaylistObject = self.post_json(&url, token, body)?;
        Ok(CreatedPlaylist {
            id: playlist.id,
            name: playlist.name,
            url: playlist.external_urls.and_then(|urls| urls.spotify),
            track_count: 0,
        })
    }

    fn add_tracks(&self, playlist_id: &str, uris: &[String]) -> Result<(), RecommendError> {
        check_batch(uris, MAX_PLAYLIST_ADD, "track uris")?;
        let token = self.user_token()?;
        let url = self.url(&format!("playlists/{}/tracks", encode(playlist_id)));
        let _snapshot: serde_json::Value =
            self.post_json(&url, token, serde_json::json!({ "uris": uris }))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_search_skips_local_and_incomplete_items() {
        let json = r#"{
            "tracks": {
                "items": [
                    {
                        "id": "4uLU6hMCjMI75M1A2tKUQC",
                        "name": "Blinding Lights",
                        "artists": [{"name": "The Weeknd"}],
                        "album": {"name": "After Hours", "images": [{"url": "https://i.scdn.co/image/a"}]},
                        "preview_url": null,
                        "external_urls": {"spotify": "https://open.spotify.com/track/4uLU6hMCjMI75M1A2tKUQC"},
                        "uri": "spotify:track:4uLU6hMCjMI75M1A2tKUQC",
                        "is_local": false,
                        "type": "track"
                    },
                    {
                        "id": null,
                        "name": "My Demo",
                        "artists": [{"name": "Me"}],
                        "uri": "spotify:local:Me::My+Demo:180",
                        "is_local": true,
                        "type": "track"
                    },
                    {
                        "id": "ep1",
                        "name": "Podcast Episode",
                        "artists": [{"name": "Host"}],
                        "uri": "spotify:episode:ep1",
                        "type": "episode"
                    },
                    {
                        "id": "noartist",
                        "name": "Mystery",
                        "artists": [],
                        "uri": "spotify:track:noartist"
                    }
                ]
            }
        }"#;
        let response: SearchResponse = serde_json::from_str(json).unwrap();
        let tracks = parse_search(response);

        assert_eq!(tracks.len(), 1);
        let track = &tracks[0];
        assert_eq!(track.name, "Blinding Lights");
        assert_eq!(track.artist_display(), "The Weeknd");
        assert_eq!(track.album_art_url.as_deref(), Some("https://i.scdn.co/image/a"));
        assert!(track.features.is_none());
    }

    #[test]
    fn test_parse_search_without_tracks_is_empty() {
        let response: SearchResponse = serde_json::from_str("{}").unwrap();
        assert!(parse_search(response).is_empty());
    }

    #[test]
    fn test_parse_saved_page_drops_local_files_but_counts_them() {
        let json = r#"{
            "items": [
                {"track": {"id": "a", "name": "A", "artists": [{"name": "X"}], "uri": "spotify:track:a", "is_local": false}},
                {"track": null},
                {"track": {"id": null, "name": "Local", "artists": [], "uri": "spotify:local:x", "is_local": true}},
                {"track": {"id": "b", "name": "B", "artists": [{"name": "Y"}], "uri": "spotify:track:b"}}
            ],
            "next": "https://api.spotify.com/v1/me/tracks?offset=4&limit=4"
        }"#;
        let page: Paging<SavedTrackItem> = serde_json::from_str(json).unwrap();
        let saved = parse_saved_page(page);
        assert_eq!(saved.ids, vec!["a".to_string(), "b".to_string()]);
        assert_eq!(saved.raw_count, 4);
        assert!(saved.has_next);
    }

    #[test]
    fn test_last_saved_page_has_no_next() {
        let page: Paging<SavedTrackItem> =
            serde_json::from_str(r#"{"items": [], "next": null}"#).unwrap();
        assert_eq!(parse_saved_page(page), SavedPage::default());
    }

    #[test]
    fn test_parse_features_aligns_with_requested_ids() {
        let json = r#"{
            "audio_features": [
                {"id": "b", "valence": 0.9, "energy": 0.8, "danceability": 0.7, "tempo": 128.0},
                null,
                {"id": "a", "valence": 0.2, "energy": 0.3, "danceability": 0.4, "tempo": 90.5},
                {"id": "d", "valence": 0.5, "energy": 0.5, "danceability": 0.5, "tempo": 0.0, "extra": 1}
            ]
        }"#;
        let response: AudioFeaturesResponse = serde_json::from_str(json).unwrap();
        let ids: Vec<String> = ["a", "b", "c", "d"].iter().map(|s| s.to_string()).collect();
        let features = parse_features(response, &ids);

        assert_eq!(features.len(), 4);
        assert_eq!(features[0].map(|f| f.tempo), Some(90.5));
        assert_eq!(features[1].map(|f| f.valence), Some(0.9));
        assert!(features[2].is_none());
        assert_eq!(features[3].map(|f| f.tempo), Some(0.0));
    }

    #[test]
    fn test_parse_features_discards_out_of_range_payloads() {
        let json = r#"{"audio_features": [
            {"id": "a", "valence": 1.7, "energy": 0.5, "danceability": 0.5, "tempo": 120.0}
        ]}"#;
        let response: AudioFeaturesResponse = serde_json::from_str(json).unwrap();
        assert_eq!(parse_features(response, &["a".to_string()]), vec![None]);
    }

    #[test]
    fn test_batch_limits_are_enforced_locally() {
        let ids: Vec<String> = (0..51).map(|i| i.to_string()).collect();
        assert!(matches!(
            check_batch(&ids, MAX_TRACK_IDS, "track ids"),
            Err(RecommendError::InvalidInput(_))
        ));
        assert!(check_batch(&ids, MAX_FEATURE_IDS, "audio-feature ids").is_ok());
    }

    #[test]
    fn test_ids_are_encoded_and_comma_joined() {
        let ids = vec!["abc".to_string(), "d e".to_string()];
        assert_eq!(join_ids(&ids), "abc,d%20e");
    }
}
