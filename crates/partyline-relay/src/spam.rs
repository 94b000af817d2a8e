//! Sliding-window spam classification.
//!
//! Two signals, checked in order: raw frequency (more than
//! [`SPAM_WINDOW_CAPACITY`] messages inside the 5-second window) and
//! near-duplicate flooding (edit-distance similarity above
//! [`SPAM_SIMILARITY_THRESHOLD`] against any retained message, once at
//! least two prior messages exist).

use std::collections::VecDeque;
use std::time::Duration;

use tokio::time::Instant;

use partyline_core::config::{
    SPAM_SIMILARITY_THRESHOLD, SPAM_WINDOW_CAPACITY, SPAM_WINDOW_MS,
};

/// Classification outcome for one message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpamVerdict {
    /// Not spam; the message was recorded in the window.
    Clean,
    /// Too many messages inside the sliding window.
    Frequency,
    /// Too similar to a recent message from the same author.
    NearDuplicate,
}

impl SpamVerdict {
    pub fn is_spam(&self) -> bool {
        !matches!(self, SpamVerdict::Clean)
    }
}

/// Levenshtein edit distance via the standard dynamic-programming
/// recurrence, O(|a|·|b|) time and O(min row) space, over Unicode scalars.
pub fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0usize; b.len() + 1];

    for (i, ca) in a.iter().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let substitution = prev[j] + usize::from(ca != cb);
            curr[j + 1] = substitution.min(prev[j + 1] + 1).min(curr[j] + 1);
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[b.len()]
}

/// Normalized similarity: `1 − distance ÷ max(len)`.
///
/// Both strings empty is undefined territory — treated as 0 (never similar)
/// so an author sending empty messages is handled by the frequency check
/// alone.
pub fn similarity(a: &str, b: &str) -> f64 {
    let max_len = a.chars().count().max(b.chars().count());
    if max_len == 0 {
        return 0.0;
    }
    1.0 - levenshtein(a, b) as f64 / max_len as f64
}

/// Recent messages from one author inside one call.
///
/// Bounded to [`SPAM_WINDOW_CAPACITY`] entries; entries older than the
/// window are evicted before every classification.
#[derive(Debug, Default)]
pub struct RateLimitWindow {
    entries: VecDeque<(String, Instant)>,
}

impl RateLimitWindow {
    pub fn new() -> Self {
        Self::default()
    }

    /// Classify `content` arriving at `now`, recording it when clean.
    pub fn classify(&mut self, content: &str, now: Instant) -> SpamVerdict {
        let window = Duration::from_millis(SPAM_WINDOW_MS);
        while let Some((_, t)) = self.entries.front() {
            if now.duration_since(*t) > window {
                self.entries.pop_front();
            } else {
                break;
            }
        }

        if self.entries.len() >= SPAM_WINDOW_CAPACITY {
            return SpamVerdict::Frequency;
        }

        if self.entries.len() >= 2
            && self
                .entries
                .iter()
                .any(|(prev, _)| similarity(prev, content) > SPAM_SIMILARITY_THRESHOLD)
        {
            return SpamVerdict::NearDuplicate;
        }

        self.entries.push_back((content.to_string(), now));
        SpamVerdict::Clean
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn levenshtein_classics() {
        assert_eq!(levenshtein("kitten", "sitting"), 3);
        assert_eq!(levenshtein("flaw", "lawn"), 2);
        assert_eq!(levenshtein("", "abc"), 3);
        assert_eq!(levenshtein("abc", ""), 3);
        assert_eq!(levenshtein("same", "same"), 0);
    }

    #[test]
    fn levenshtein_is_symmetric() {
        let pairs = [
            ("hello world", "hello world!"),
            ("a", "abcdef"),
            ("", "x"),
            ("çafé", "cafe"),
        ];
        for (s1, s2) in pairs {
            assert_eq!(levenshtein(s1, s2), levenshtein(s2, s1), "{s1:?} vs {s2:?}");
        }
    }

    #[test]
    fn similarity_of_two_empty_strings_is_zero() {
        assert_eq!(similarity("", ""), 0.0);
    }

    #[test]
    fn near_identical_strings_cross_threshold() {
        assert!(similarity("hello world", "hello world!") > 0.8);
        assert!(similarity("hello world", "goodbye moon") < 0.8);
    }

    // Pairwise well under the similarity threshold, so only the frequency
    // rule can fire on them.
    const DISSIMILAR: [&str; 5] = [
        "anyone here play chess",
        "my soup went cold again",
        "what a strange dream that was",
        "the bus never showed up today",
        "found an old photo of the lake",
    ];

    #[test]
    fn sixth_message_in_window_is_frequency_spam() {
        let mut w = RateLimitWindow::new();
        let t0 = Instant::now();
        for (i, msg) in DISSIMILAR.iter().enumerate() {
            assert_eq!(
                w.classify(msg, t0 + Duration::from_millis(600 * i as u64)),
                SpamVerdict::Clean,
                "message {i} must be clean"
            );
        }
        assert_eq!(
            w.classify("one more", t0 + Duration::from_secs(4)),
            SpamVerdict::Frequency
        );
    }

    #[test]
    fn window_drains_after_idle_period() {
        let mut w = RateLimitWindow::new();
        let t0 = Instant::now();
        for (i, msg) in DISSIMILAR.iter().enumerate() {
            assert_eq!(
                w.classify(msg, t0 + Duration::from_millis(500 * i as u64)),
                SpamVerdict::Clean
            );
        }
        // 6 seconds after the last message everything has aged out.
        assert_eq!(
            w.classify("fresh start", t0 + Duration::from_secs(8)),
            SpamVerdict::Clean
        );
    }

    #[test]
    fn near_duplicate_needs_two_prior_messages() {
        let mut w = RateLimitWindow::new();
        let t0 = Instant::now();
        assert_eq!(w.classify("hello world", t0), SpamVerdict::Clean);
        // Only one prior message: the near-duplicate rule does not fire yet.
        assert_eq!(
            w.classify("hello world!", t0 + Duration::from_millis(100)),
            SpamVerdict::Clean
        );
        // Two prior messages now; the third near-duplicate is flagged.
        assert_eq!(
            w.classify("hello world!!", t0 + Duration::from_millis(200)),
            SpamVerdict::NearDuplicate
        );
    }

    #[test]
    fn distinct_messages_stay_clean() {
        let mut w = RateLimitWindow::new();
        let t0 = Instant::now();
        assert_eq!(w.classify("first topic entirely", t0), SpamVerdict::Clean);
        assert_eq!(
            w.classify("second subject altogether", t0 + Duration::from_millis(100)),
            SpamVerdict::Clean
        );
        assert_eq!(
            w.classify("third thing completely new", t0 + Duration::from_millis(200)),
            SpamVerdict::Clean
        );
    }

    #[test]
    fn clear_empties_the_window() {
        let mut w = RateLimitWindow::new();
        w.classify("a message", Instant::now());
        w.clear();
        assert!(w.is_empty());
    }
}
