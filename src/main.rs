use anyhow::Result;
use clap::Parser;

mod client;
mod config;
mod error;
mod logging;
mod models;
mod mood;
mod recommend;

use crate::client::SpotifyClient;
use crate::config::load_config;
use crate::mood::Mood;
use crate::recommend::{
    FeatureOverrides, LibrarySource, MoodRequest, RecommendConfig, RecommendRequest,
    Recommendation, RecommendationGenerator, ResolvedRequest, StageOutcome, save_playlist,
};

#[derive(Parser)]
#[command(name = "mood-recommender")]
#[command(about = "Recommend Spotify tracks that fit a mood")]
#[command(version)]
struct Args {
    /// Free text describing a mood, an activity or an artist ("music for studying", "play Adele")
    text: Vec<String>,

    /// Use a mood preset instead of free text
    #[arg(short = 'm', long = "mood", conflicts_with = "text")]
    mood: Option<Mood>,

    /// Number of tracks to recommend
    #[arg(short = 'n', long = "count")]
    count: Option<usize>,

    /// Override the preset's target valence (0.0-1.0)
    #[arg(long)]
    valence: Option<f32>,

    /// Override the preset's target energy (0.0-1.0)
    #[arg(long)]
    energy: Option<f32>,

    /// Override the preset's target danceability (0.0-1.0)
    #[arg(long)]
    danceability: Option<f32>,

    /// Override the preset's target tempo in BPM (60-200)
    #[arg(long)]
    tempo: Option<f32>,

    /// Path to a recommendation tuning JSON file
    #[arg(short = 'c', long = "config")]
    config_file: Option<String>,

    /// Skip the saved-tracks library even when a user token is available
    #[arg(long)]
    no_library: bool,

    /// Save the result as a private playlist (needs SPOTIFY_USER_TOKEN)
    #[arg(short = 's', long)]
    save: bool,

    /// Print the mood presets and exit
    #[arg(long)]
    list_moods: bool,

    /// Verbose logging, including every fallback stage
    #[arg(short = 'd', long = "debug")]
    debug: bool,

    /// Quiet mode - only print the track list
    #[arg(short = 'q', long = "quiet")]
    quiet: bool,
}

impl Args {
    fn request(&self) -> Result<RecommendRequest> {
        let input = match (self.mood, self.text.is_empty()) {
            (Some(mood), _) => MoodRequest::Preset(mood),
            (None, false) => MoodRequest::Text(self.text.join(" ")),
            (None, true) => {
                return Err(anyhow::anyhow!(
                    "describe a mood or pass --mood (try --list-moods)"
                ));
            }
        };

        Ok(RecommendRequest {
            input,
            count: self.count,
            overrides: FeatureOverrides {
                valence: self.valence,
                energy: self.energy,
                danceability: self.danceability,
                tempo: self.tempo,
            },
        })
    }
}

fn print_moods() {
    println!("Available moods:");
    for mood in Mood::ALL {
        let preset = mood.preset();
        let target = preset.target;
        println!(
            "  {:<9} {} (valence {:.1}, energy {:.1}, danceability {:.1}, {:.0} BPM)",
            mood.name(),
            preset.description,
            target.valence,
            target.energy,
            target.danceability,
            target.tempo
        );
    }
}

fn print_recommendation(recommendation: &Recommendation, verbose: bool) {
    let heading = match recommendation.mood {
        Some(mood) => format!("{} ({})", mood, mood.preset().description),
        None => "Artist search".to_string(),
    };
    println!("\n{heading}");
    println!("{}", "=".repeat(heading.len()));
    println!("Source: {}", recommendation.status);

    if let Some(warning) = recommendation.warning() {
        eprintln!("⚠ {warning}");
    }

    if verbose {
        for report in &recommendation.reports {
            let outcome = match &report.outcome {
                StageOutcome::Accepted { validated } => format!("accepted ({validated} validated)"),
                StageOutcome::Insufficient {
                    validated,
                    candidates,
                } => format!("{validated} of {candidates} candidates validated"),
                StageOutcome::Unvalidated { returned } => format!("{returned} returned unscored"),
                StageOutcome::Skipped(reason) => format!("skipped: {reason}"),
                StageOutcome::Failed(e) => format!("failed: {e}"),
            };
            println!("   {:<26} {}", report.stage.to_string(), outcome);
        }
    }

    println!();
    for (i, item) in recommendation.tracks.iter().enumerate() {
        let track = &item.track;
        let score = item
            .score
            .map(|s| format!("d:{s:.2}"))
            .unwrap_or_else(|| "unscored".to_string());
        let tempo = track
            .features
            .map(|f| format!(" | {:.0} BPM", f.tempo))
            .unwrap_or_default();
        println!(
            "{:>3}. {} - {} [{}] ({}{})",
            i + 1,
            track.name,
            track.artist_display(),
            track.album,
            score,
            tempo
        );
        if let Some(url) = track.preview_url.as_ref().or(track.spotify_url.as_ref()) {
            println!("     {url}");
        }
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    logging::init_logging(args.debug, args.quiet);

    if args.list_moods {
        print_moods();
        return Ok(());
    }

    let recommend_config = match &args.config_file {
        Some(path) => RecommendConfig::load_from_file(path).map_err(|e| {
            anyhow::anyhow!("Failed to load recommendation config '{}': {}", path, e)
        })?,
        None => RecommendConfig::default(),
    };

    // Reject bad input before any credentials or network are involved
    let request = args.request()?;
    let resolved = request.resolve(&recommend_config)?;
    if let ResolvedRequest::Mood { preset, target, .. } = &resolved {
        tracing::info!(mood = %preset.mood, ?target, "resolved mood target");
    }

    let config = load_config()?;
    let client = SpotifyClient::new(config);
    if args.save && !client.has_user_token() {
        return Err(anyhow::anyhow!(
            "--save needs SPOTIFY_USER_TOKEN with playlist-modify-private scope"
        ));
    }

    let library: Option<&dyn LibrarySource> = if client.has_user_token() && !args.no_library {
        Some(&client)
    } else {
        None
    };
    let generator = RecommendationGenerator::new(library, &client, &client, recommend_config);

    if !args.quiet {
        println!("Finding tracks...");
    }
    let recommendation = generator.recommend(&request)?;
    print_recommendation(&recommendation, args.debug);

    if args.save {
        let playlist = save_playlist(&client, &recommendation)?;
        println!(
            "\n✓ Saved playlist '{}' with {} tracks",
            playlist.name, playlist.track_count
        );
        if let Some(url) = playlist.url {
            println!("  {url}");
        }
    }

    Ok(())
}
