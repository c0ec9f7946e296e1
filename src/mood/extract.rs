use super::presets::Mood;
use regex::Regex;
use std::sync::LazyLock;

/// Activity keywords, checked before mood keywords
const ACTIVITY_KEYWORDS: &[(&str, Mood)] = &[
    ("workout", Mood::Hype),
    ("work out", Mood::Hype),
    ("working out", Mood::Hype),
    ("gym", Mood::Hype),
    ("running", Mood::Hype),
    ("run", Mood::Hype),
    ("exercise", Mood::Hype),
    ("training", Mood::Hype),
    ("party", Mood::Hype),
    ("study", Mood::Focus),
    ("studying", Mood::Focus),
    ("homework", Mood::Focus),
    ("reading", Mood::Focus),
    ("coding", Mood::Focus),
    ("work", Mood::Focus),
    ("working", Mood::Focus),
    ("concentrate", Mood::Focus),
    ("sleep", Mood::Chill),
    ("sleeping", Mood::Chill),
    ("meditation", Mood::Chill),
    ("yoga", Mood::Chill),
    ("unwind", Mood::Chill),
    ("date", Mood::Romantic),
    ("date night", Mood::Romantic),
    ("dinner", Mood::Romantic),
    ("wedding", Mood::Romantic),
    ("breakup", Mood::Sad),
    ("break up", Mood::Sad),
    ("rainy day", Mood::Sad),
    ("dancing", Mood::Happy),
    ("road trip", Mood::Happy),
];

/// Direct mood keywords
const MOOD_KEYWORDS: &[(&str, Mood)] = &[
    ("happy", Mood::Happy),
    ("joyful", Mood::Happy),
    ("cheerful", Mood::Happy),
    ("upbeat", Mood::Happy),
    ("good mood", Mood::Happy),
    ("chill", Mood::Chill),
    ("chilled", Mood::Chill),
    ("relaxed", Mood::Chill),
    ("relaxing", Mood::Chill),
    ("calm", Mood::Chill),
    ("mellow", Mood::Chill),
    ("focus", Mood::Focus),
    ("focused", Mood::Focus),
    ("sad", Mood::Sad),
    ("melancholy", Mood::Sad),
    ("heartbroken", Mood::Sad),
    ("down", Mood::Sad),
    ("crying", Mood::Sad),
    ("hype", Mood::Hype),
    ("hyped", Mood::Hype),
    ("energetic", Mood::Hype),
    ("pumped", Mood::Hype),
    ("romantic", Mood::Romantic),
    ("love", Mood::Romantic),
    ("in love", Mood::Romantic),
];

/// Words that make a "play ..." phrase a generic request rather than an artist name
const GENERIC_WORDS: &[&str] = &[
    "music",
    "songs",
    "song",
    "tracks",
    "track",
    "something",
    "anything",
    "playlist",
    "tunes",
    "me",
];

static BY_ARTIST: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:songs|music|tracks)\s+(?:by|from)\s+(?P<artist>.+)$")
        .expect("artist pattern is valid")
});

static PLAY_ARTIST: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\s*(?:please\s+)?(?:play|put\s+on|listen\s+to)\s+(?P<artist>.+)$")
        .expect("play pattern is valid")
});

/// What a free-text request asks for
#[derive(Debug, Clone, PartialEq)]
pub enum TextIntent {
    Artist(String),
    Mood(Mood),
    Unrecognized,
}

/// Classify free text: artist requests first, then mood/activity keywords
pub fn classify(text: &str) -> TextIntent {
    if let Some(artist) = artist_request(text) {
        return TextIntent::Artist(artist);
    }
    match extract(text) {
        Some(mood) => TextIntent::Mood(mood),
        None => TextIntent::Unrecognized,
    }
}

/// Find the mood a piece of text talks about.
///
/// Activity keywords take precedence over mood keywords, so "chill tracks to study"
/// resolves to Focus. Within each list the first entry that matches wins.
pub fn extract(text: &str) -> Option<Mood> {
    let normalized = normalize(text);
    find_keyword(&normalized, ACTIVITY_KEYWORDS).or_else(|| find_keyword(&normalized, MOOD_KEYWORDS))
}

/// Extract an artist name from "play X", "listen to X" or "songs by X" style text
pub fn artist_request(text: &str) -> Option<String> {
    let trimmed = text.trim().trim_end_matches(['.', '!', '?']);

    if let Some(captures) = BY_ARTIST.captures(trimmed) {
        return clean_artist(&captures["artist"]);
    }

    let captures = PLAY_ARTIST.captures(trimmed)?;
    let candidate = clean_artist(&captures["artist"])?;
    let normalized = normalize(&candidate);
    let generic = GENERIC_WORDS
        .iter()
        .any(|word| contains_phrase(&normalized, word));
    if generic || extract(&candidate).is_some() {
        return None;
    }
    Some(candidate)
}

fn clean_artist(raw: &str) -> Option<String> {
    let name = raw
        .trim()
        .trim_end_matches(['.', '!', '?', ','])
        .trim_end_matches(" please")
        .trim();
    if name.is_empty() {
        None
    } else {
        Some(name.to_string())
    }
}

fn find_keyword(normalized: &str, dictionary: &[(&str, Mood)]) -> Option<Mood> {
    dictionary
        .iter()
        .find(|(keyword, _)| contains_phrase(normalized, keyword))
        .map(|(_, mood)| *mood)
}

/// Whole-word phrase match against text produced by `normalize`
fn contains_phrase(normalized: &str, phrase: &str) -> bool {
    normalized.contains(&format!(" {phrase} "))
}

/// Lowercase, turn punctuation into spaces, collapse whitespace and pad both ends
fn normalize(text: &str) -> String {
    let lowered: String = text
        .to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect();
    let words: Vec<&str> = lowered.split_whitespace().collect();
    format!(" {} ", words.join(" "))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_workout_resolves_to_hype() {
        assert_eq!(extract("I need workout music"), Some(Mood::Hype));
    }

    #[test]
    fn test_activity_keywords_take_precedence_over_mood_keywords() {
        // "chill" is a mood keyword, "study" an activity keyword
        assert_eq!(extract("chill tracks to study"), Some(Mood::Focus));
        assert_eq!(extract("something sad for my breakup"), Some(Mood::Sad));
        assert_eq!(extract("happy songs for the gym"), Some(Mood::Hype));
    }

    #[test]
    fn test_every_preset_keyword_trigger_is_recognized() {
        for mood in Mood::ALL {
            let text = format!("give me some {} music", mood.name().to_lowercase());
            assert_eq!(extract(&text), Some(mood), "text: {text}");
        }
        for (keyword, mood) in MOOD_KEYWORDS {
            assert_eq!(extract(&format!("Feeling {keyword} today")), Some(*mood));
        }
        for (keyword, mood) in ACTIVITY_KEYWORDS {
            assert_eq!(extract(&format!("{keyword}!")), Some(*mood), "keyword: {keyword}");
        }
    }

    #[test]
    fn test_matching_is_case_insensitive_and_whole_word() {
        assert_eq!(extract("HAPPY vibes please"), Some(Mood::Happy));
        // "sadness" and "brunch" must not trigger "sad" or "run"
        assert_eq!(extract("sadness at brunch"), None);
        assert_eq!(extract("music, for studying."), Some(Mood::Focus));
    }

    #[test]
    fn test_no_keyword_yields_none() {
        assert_eq!(extract("surprise me"), None);
        assert_eq!(extract(""), None);
    }

    #[test]
    fn test_play_artist_is_detected() {
        assert_eq!(
            artist_request("Play Rauw Alejandro"),
            Some("Rauw Alejandro".to_string())
        );
        assert_eq!(
            artist_request("listen to The Weeknd!"),
            Some("The Weeknd".to_string())
        );
        assert_eq!(
            artist_request("I want songs by Bad Bunny please"),
            Some("Bad Bunny".to_string())
        );
    }

    #[test]
    fn test_play_with_mood_words_is_not_an_artist() {
        assert_eq!(artist_request("play some happy music"), None);
        assert_eq!(artist_request("play something for my workout"), None);
        assert_eq!(artist_request("chill tracks to study"), None);
    }

    #[test]
    fn test_classify_prefers_artist_requests() {
        assert_eq!(
            classify("Play Rauw Alejandro"),
            TextIntent::Artist("Rauw Alejandro".to_string())
        );
        assert_eq!(classify("play some happy music"), TextIntent::Mood(Mood::Happy));
        assert_eq!(classify("whatever"), TextIntent::Unrecognized);
    }
}
