use super::metadata::Recommendation;
use super::sources::PlaylistSink;
use crate::error::RecommendError;
use crate::models::CreatedPlaylist;

/// Most items the add-tracks endpoint accepts per call
const ADD_TRACKS_BATCH: usize = 100;

/// Name for an exported playlist, e.g. "Happy mood mix"
pub fn playlist_name(recommendation: &Recommendation) -> String {
    match recommendation.mood {
        Some(mood) => format!("{mood} mood mix"),
        None => "Artist mix".to_string(),
    }
}

/// Save a recommendation as a private playlist owned by the authorized user
pub fn save_playlist(
    sink: &dyn PlaylistSink,
    recommendation: &Recommendation,
) -> Result<CreatedPlaylist, RecommendError> {
    let uris = recommendation.track_uris();
    if uris.is_empty() {
        return Err(RecommendError::InvalidInput(
            "cannot create a playlist with no tracks".to_string(),
        ));
    }

    let user = sink.current_user()?;
    let name = playlist_name(recommendation);
    let description = format!(
        "{} tracks picked for you ({})",
        uris.len(),
        recommendation.status
    );

    tracing::info!(user = %user.id, name = %name, tracks = uris.len(), "creating playlist");
    let mut playlist = sink.create_playlist(&user.id, &name, &description)?;

    for batch in uris.chunks(ADD_TRACKS_BATCH) {
        sink.add_tracks(&playlist.id, batch)?;
        playlist.track_count += batch.len();
    }

    tracing::info!(playlist = %playlist.id, owner = %user.display_name, "playlist saved");
    Ok(playlist)
}
