//! Human-readable credential generation.
//!
//! Usernames and passphrases are sampled from small fixed word lists for
//! memorability, not entropy: the search space is roughly `30 * 30 * 999`
//! for usernames and `30 * 30 * 99` for passphrases. That defeats casual
//! guessing but is nowhere near a sole authentication factor against an
//! unthrottled online attacker; the passphrase is always combined with the
//! salted-hash check and device binding.

use rand::Rng;

const ADJECTIVES: [&str; 31] = [
    "Swift", "Bright", "Calm", "Eager", "Gentle", "Happy", "Kind", "Lively", "Peaceful",
    "Quick", "Wise", "Bold", "Clear", "Deep", "Fair", "Good", "High", "Just", "Light",
    "Mild", "Nice", "Open", "Pure", "Rich", "Safe", "True", "Warm", "Young", "Zesty",
    "Active", "Brave",
];

const NOUNS: [&str; 31] = [
    "Runner", "Walker", "Dreamer", "Thinker", "Creator", "Explorer", "Learner", "Builder",
    "Helper", "Friend", "Artist", "Writer", "Singer", "Dancer", "Player", "Worker",
    "Teacher", "Student", "Leader", "Follower", "Hunter", "Gatherer", "Farmer", "Fisher",
    "Craft", "Smith", "Wright", "Maker", "Doer", "Seeker", "Finder",
];

const WORDS: [&str; 30] = [
    "stream", "hill", "river", "mountain", "forest", "ocean", "valley", "meadow", "cliff",
    "beach", "canyon", "island", "lake", "spring", "autumn", "winter", "summer", "dawn",
    "dusk", "night", "day", "star", "moon", "sun", "cloud", "rain", "snow", "wind",
    "storm", "calm",
];

/// Generates a username of the form `Adjective-Noun-Number`, with the
/// number in `[1, 999]`.
#[must_use]
pub fn generate_username() -> String {
    username_with(&mut rand::thread_rng())
}

/// Generates a passphrase of the form `word-word-number`, with the number
/// in `[1, 99]`. Words are sampled with replacement.
#[must_use]
pub fn generate_passphrase() -> String {
    passphrase_with(&mut rand::thread_rng())
}

pub(crate) fn username_with<R: Rng>(rng: &mut R) -> String {
    let adjective = ADJECTIVES[rng.gen_range(0..ADJECTIVES.len())];
    let noun = NOUNS[rng.gen_range(0..NOUNS.len())];
    let number = rng.gen_range(1..=999);
    format!("{adjective}-{noun}-{number}")
}

pub(crate) fn passphrase_with<R: Rng>(rng: &mut R) -> String {
    let first = WORDS[rng.gen_range(0..WORDS.len())];
    let second = WORDS[rng.gen_range(0..WORDS.len())];
    let number = rng.gen_range(1..=99);
    format!("{first}-{second}-{number}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_username_format() {
        for _ in 0..200 {
            let username = generate_username();
            let parts: Vec<&str> = username.split('-').collect();
            assert_eq!(parts.len(), 3, "bad username {username}");
            assert!(ADJECTIVES.contains(&parts[0]));
            assert!(NOUNS.contains(&parts[1]));
            let number: u32 = parts[2].parse().unwrap();
            assert!((1..=999).contains(&number));
        }
    }

    #[test]
    fn test_passphrase_format() {
        for _ in 0..200 {
            let passphrase = generate_passphrase();
            let parts: Vec<&str> = passphrase.split('-').collect();
            assert_eq!(parts.len(), 3, "bad passphrase {passphrase}");
            assert!(WORDS.contains(&parts[0]));
            assert!(WORDS.contains(&parts[1]));
            let number: u32 = parts[2].parse().unwrap();
            assert!((1..=99).contains(&number));
        }
    }

    #[test]
    fn test_sampling_covers_the_lists() {
        // With 2000 draws, missing any single list entry has vanishing
        // probability; this catches off-by-one sampling bugs.
        let mut rng = rand::thread_rng();
        let mut seen_adjectives = std::collections::HashSet::new();
        let mut seen_nouns = std::collections::HashSet::new();
        for _ in 0..2000 {
            let username = username_with(&mut rng);
            let parts: Vec<&str> = username.split('-').collect();
            seen_adjectives.insert(parts[0].to_string());
            seen_nouns.insert(parts[1].to_string());
        }
        assert_eq!(seen_adjectives.len(), ADJECTIVES.len());
        assert_eq!(seen_nouns.len(), NOUNS.len());
    }
}
