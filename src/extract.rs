use once_cell::sync::Lazy;

/// Keyword table driving interest extraction from chat messages. This is a
/// stand-in for real text understanding; callers only depend on the
/// (interest, confidence) contract, so the lookup can be swapped out.
static KEYWORDS: Lazy<Vec<(&'static str, &'static [&'static str])>> = Lazy::new(|| {
    vec![
        ("sports", &["football", "soccer", "basketball", "tennis"]),
        ("music", &["guitar", "piano", "singing", "rock", "pop"]),
        ("movies", &["film", "cinema", "actor", "director"]),
        ("cooking", &["cooking", "baking", "recipe", "kitchen"]),
        ("hiking", &["hiking", "trail", "mountain", "trek"]),
        ("travel", &["travel", "trip", "abroad", "backpacking"]),
        ("reading", &["reading", "book", "novel", "library"]),
        ("video_games", &["gaming", "videogame", "console", "rpg"]),
        ("gardening", &["garden", "plants", "flowers"]),
        ("photography", &["photography", "camera", "photo"]),
        ("pets", &["dog", "cat", "puppy", "kitten"]),
    ]
});

/// Lowercase and strip everything that is not alphanumeric or whitespace.
fn preprocess(message: &str) -> String {
    message
        .to_lowercase()
        .chars()
        .filter(|c| c.is_alphanumeric() || c.is_whitespace())
        .collect()
}

/// Deduce an interest from a free-form message.
///
/// Returns the first matching interest and a confidence in (0, 1], higher
/// when more of its keywords occur. Returns None when nothing matches.
pub fn extract_interest(message: &str) -> Option<(&'static str, f32)> {
    let cleaned = preprocess(message);

    for (interest, keywords) in KEYWORDS.iter() {
        let hits = keywords
            .iter()
            .filter(|keyword| cleaned.contains(*keyword))
            .count();
        if hits > 0 {
            let confidence = (0.6 + 0.1 * hits as f32).min(1.0);
            return Some((interest, confidence));
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extracts_first_matching_interest() {
        let result = extract_interest("I play guitar every weekend");
        assert_eq!(result.map(|(i, _)| i), Some("music"));
    }

    #[test]
    fn test_more_keyword_hits_raise_confidence() {
        let (_, one_hit) = extract_interest("I like football").unwrap();
        let (_, two_hits) = extract_interest("football and tennis fan").unwrap();
        assert!(two_hits > one_hit);
    }

    #[test]
    fn test_punctuation_does_not_block_matches() {
        let result = extract_interest("Love hiking!!! (especially mountain trails)");
        assert_eq!(result.map(|(i, _)| i), Some("hiking"));
    }

    #[test]
    fn test_no_match_returns_none() {
        assert!(extract_interest("nothing relevant here").is_none());
    }

    #[test]
    fn test_extraction_is_deterministic() {
        let a = extract_interest("weekend football and tennis");
        let b = extract_interest("weekend football and tennis");
        assert_eq!(a, b);
    }
}
