use crate::error::RecommendError;
use crate::models::AudioFeatures;
use std::fmt;
use std::str::FromStr;

/// The fixed set of moods a request can resolve to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mood {
    Happy,
    Chill,
    Focus,
    Sad,
    Hype,
    Romantic,
}

impl Mood {
    pub const ALL: [Mood; 6] = [
        Mood::Happy,
        Mood::Chill,
        Mood::Focus,
        Mood::Sad,
        Mood::Hype,
        Mood::Romantic,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Mood::Happy => "Happy",
            Mood::Chill => "Chill",
            Mood::Focus => "Focus",
            Mood::Sad => "Sad",
            Mood::Hype => "Hype",
            Mood::Romantic => "Romantic",
        }
    }

    pub fn preset(self) -> &'static MoodPreset {
        // PRESETS is declared in the same order as Mood::ALL
        &PRESETS[self as usize]
    }
}

impl fmt::Display for Mood {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Mood {
    type Err = RecommendError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Mood::ALL
            .into_iter()
            .find(|mood| mood.name().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| {
                let known: Vec<&str> = Mood::ALL.iter().map(|mood| mood.name()).collect();
                RecommendError::Configuration(format!(
                    "unknown mood '{wanted}' (expected one of: {})",
                    known.join(", ")
                ))
            })
    }
}

/// Target features and search hints for one mood
#[derive(Debug)]
pub struct MoodPreset {
    pub mood: Mood,
    pub target: AudioFeatures,
    pub description: &'static str,
    /// Catalog search keywords, most specific first
    pub keywords: &'static [&'static str],
    /// Genre seeds used by the genre-seed fallback search
    pub genre_seeds: &'static [&'static str],
}

impl MoodPreset {
    pub fn primary_keyword(&self) -> &'static str {
        self.keywords.first().copied().unwrap_or("pop")
    }
}

static PRESETS: [MoodPreset; 6] = [
    MoodPreset {
        mood: Mood::Happy,
        target: AudioFeatures {
            valence: 0.8,
            energy: 0.7,
            danceability: 0.7,
            tempo: 120.0,
        },
        description: "Upbeat and joyful vibes",
        keywords: &["happy", "upbeat", "cheerful", "positive", "joyful"],
        genre_seeds: &["pop", "dance", "party", "funk", "disco"],
    },
    MoodPreset {
        mood: Mood::Chill,
        target: AudioFeatures {
            valence: 0.5,
            energy: 0.3,
            danceability: 0.4,
            tempo: 90.0,
        },
        description: "Relaxed and mellow tunes",
        keywords: &["chill", "relaxed", "mellow", "ambient", "calm"],
        genre_seeds: &["ambient", "chill", "indie", "acoustic", "lo-fi"],
    },
    MoodPreset {
        mood: Mood::Focus,
        target: AudioFeatures {
            valence: 0.4,
            energy: 0.4,
            danceability: 0.3,
            tempo: 100.0,
        },
        description: "Concentration-enhancing beats",
        keywords: &["focus", "study", "concentration", "ambient", "instrumental"],
        genre_seeds: &["ambient", "classical", "piano", "study", "minimal-techno"],
    },
    MoodPreset {
        mood: Mood::Sad,
        target: AudioFeatures {
            valence: 0.2,
            energy: 0.3,
            danceability: 0.3,
            tempo: 80.0,
        },
        description: "Melancholic and introspective",
        keywords: &["sad", "melancholy", "emotional", "ballad", "heartbreak"],
        genre_seeds: &["acoustic", "singer-songwriter", "indie", "sad", "emo"],
    },
    MoodPreset {
        mood: Mood::Hype,
        target: AudioFeatures {
            valence: 0.7,
            energy: 0.9,
            danceability: 0.8,
            tempo: 140.0,
        },
        description: "High-energy pump-up tracks",
        keywords: &["hype", "energetic", "pump", "party", "workout"],
        genre_seeds: &["edm", "hip-hop", "rock", "hardstyle", "dubstep"],
    },
    MoodPreset {
        mood: Mood::Romantic,
        target: AudioFeatures {
            valence: 0.6,
            energy: 0.4,
            danceability: 0.5,
            tempo: 95.0,
        },
        description: "Love songs and sweet melodies",
        keywords: &["romantic", "love", "beautiful", "emotional", "sweet"],
        genre_seeds: &["romance", "r-n-b", "soul", "indie-pop", "pop"],
    },
];

/// Look up a preset by mood name, case-insensitively
pub fn lookup(name: &str) -> Result<&'static MoodPreset, RecommendError> {
    name.parse::<Mood>().map(Mood::preset)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TARGET_TEMPO_RANGE;

    #[test]
    fn test_every_mood_has_its_own_preset() {
        for mood in Mood::ALL {
            assert_eq!(mood.preset().mood, mood);
        }
    }

    #[test]
    fn test_preset_targets_are_within_bounds() {
        for mood in Mood::ALL {
            let preset = mood.preset();
            assert!(
                preset.target.validate(&TARGET_TEMPO_RANGE).is_ok(),
                "{mood} target out of range: {:?}",
                preset.target
            );
            assert!(!preset.keywords.is_empty());
            assert!(!preset.genre_seeds.is_empty());
        }
    }

    #[test]
    fn test_lookup_is_case_insensitive() {
        let preset = lookup("  hAPPy ").unwrap();
        assert_eq!(preset.mood, Mood::Happy);
        assert_eq!(preset.target.tempo, 120.0);
        assert_eq!(preset.primary_keyword(), "happy");
    }

    #[test]
    fn test_lookup_unknown_mood_is_configuration_error() {
        match lookup("Grumpy") {
            Err(RecommendError::Configuration(message)) => {
                assert!(message.contains("Grumpy"));
                assert!(message.contains("Romantic"));
            }
            other => panic!("expected configuration error, got {other:?}"),
        }
    }
}
