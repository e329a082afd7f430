//! Journal sentiment aggregation
//!
//! Scores the most recent journal entries through a [`PolarityScorer`] and
//! reduces the labels to a percentage distribution.

use std::collections::BTreeMap;

use tracing::debug;

use crate::config::DEFAULT_JOURNAL_WINDOW;
use crate::schema::JournalEntry;
use crate::types::{SentimentDistribution, SentimentLabel};

/// Labels a single piece of text
pub trait PolarityScorer: Send + Sync {
    fn score(&self, text: &str) -> SentimentLabel;
}

/// Compound score at or above which text is positive
pub const POSITIVE_COMPOUND: f64 = 0.05;

/// Compound score at or below which text is negative
pub const NEGATIVE_COMPOUND: f64 = -0.05;

/// Normalization constant for the compound score
const COMPOUND_ALPHA: f64 = 15.0;

const POSITIVE_WORDS: &[(&str, f64)] = &[
    ("happy", 2.7),
    ("great", 3.1),
    ("good", 1.9),
    ("calm", 1.3),
    ("grateful", 2.3),
    ("excited", 2.2),
    ("proud", 2.1),
    ("energized", 2.0),
    ("relaxed", 2.0),
    ("love", 3.2),
    ("enjoyed", 2.3),
    ("better", 1.9),
    ("peaceful", 2.2),
    ("motivated", 1.8),
    ("rested", 1.6),
];

const NEGATIVE_WORDS: &[(&str, f64)] = &[
    ("sad", -2.1),
    ("tired", -1.4),
    ("exhausted", -1.9),
    ("anxious", -1.0),
    ("stressed", -1.4),
    ("angry", -2.3),
    ("bad", -2.5),
    ("awful", -2.0),
    ("lonely", -1.8),
    ("worried", -1.6),
    ("depressed", -2.3),
    ("frustrated", -2.0),
    ("terrible", -2.1),
    ("hate", -2.7),
    ("miserable", -2.2),
];

const NEGATIONS: &[&str] = &["not", "no", "never", "don't", "didn't", "isn't", "wasn't"];

/// Offline lexicon scorer.
///
/// Sums word valences (flipping a word preceded by a negation), squashes the
/// sum into a compound score in (-1, 1) and labels it with the ±0.05 cut-offs.
#[derive(Debug, Clone, Copy, Default)]
pub struct LexiconScorer;

impl LexiconScorer {
    /// Compound score in (-1, 1)
    pub fn compound(&self, text: &str) -> f64 {
        let lowered = text.to_lowercase();
        let tokens: Vec<&str> = lowered
            .split(|c: char| !(c.is_alphanumeric() || c == '\''))
            .filter(|t| !t.is_empty())
            .collect();

        let mut sum = 0.0;
        for (i, token) in tokens.iter().enumerate() {
            let Some(valence) = lookup_valence(token) else {
                continue;
            };
            let negated = i > 0 && NEGATIONS.contains(&tokens[i - 1]);
            sum += if negated { -valence * 0.74 } else { valence };
        }

        sum / (sum * sum + COMPOUND_ALPHA).sqrt()
    }
}

impl PolarityScorer for LexiconScorer {
    fn score(&self, text: &str) -> SentimentLabel {
        let compound = self.compound(text);
        if compound >= POSITIVE_COMPOUND {
            SentimentLabel::Positive
        } else if compound <= NEGATIVE_COMPOUND {
            SentimentLabel::Negative
        } else {
            SentimentLabel::Neutral
        }
    }
}

fn lookup_valence(token: &str) -> Option<f64> {
    POSITIVE_WORDS
        .iter()
        .chain(NEGATIVE_WORDS)
        .find(|(word, _)| *word == token)
        .map(|(_, valence)| *valence)
}

/// Aggregator over a sliding window of recent journal entries
pub struct SentimentAggregator {
    window: usize,
}

impl Default for SentimentAggregator {
    fn default() -> Self {
        Self::new(DEFAULT_JOURNAL_WINDOW)
    }
}

impl SentimentAggregator {
    /// Create an aggregator keeping at most `window` entries (at least one)
    pub fn new(window: usize) -> Self {
        Self {
            window: window.max(1),
        }
    }

    /// Trailing entries that fall inside the window (input is oldest first)
    pub fn window<'a>(&self, entries: &'a [JournalEntry]) -> &'a [JournalEntry] {
        let start = entries.len().saturating_sub(self.window);
        &entries[start..]
    }

    /// Score the window and return label → percentage of the window
    pub fn summarize(
        &self,
        entries: &[JournalEntry],
        scorer: &dyn PolarityScorer,
    ) -> SentimentDistribution {
        let window = self.window(entries);
        if window.is_empty() {
            return SentimentDistribution::default();
        }

        let mut counts: BTreeMap<SentimentLabel, usize> = BTreeMap::new();
        for entry in window {
            *counts.entry(scorer.score(&entry.entry)).or_insert(0) += 1;
        }

        let total = window.len() as f64;
        let distribution: BTreeMap<SentimentLabel, f64> = counts
            .into_iter()
            .map(|(label, count)| (label, count as f64 / total * 100.0))
            .collect();

        debug!(
            entries = entries.len(),
            window = window.len(),
            labels = distribution.len(),
            "Summarized journal sentiment"
        );
        SentimentDistribution(distribution)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entries(texts: &[&str]) -> Vec<JournalEntry> {
        texts
            .iter()
            .enumerate()
            .map(|(i, text)| JournalEntry {
                date: format!("2024-01-{:02}", i + 1),
                entry: text.to_string(),
            })
            .collect()
    }

    /// Labels by a leading marker character: '+', '-', anything else neutral
    struct MarkerScorer;

    impl PolarityScorer for MarkerScorer {
        fn score(&self, text: &str) -> SentimentLabel {
            match text.chars().next() {
                Some('+') => SentimentLabel::Positive,
                Some('-') => SentimentLabel::Negative,
                _ => SentimentLabel::Neutral,
            }
        }
    }

    #[test]
    fn test_distribution_percentages() {
        let journal = entries(&["-", "-", "-", "-", "-", "-", "+", "+", "=", "="]);

        let summary = SentimentAggregator::default().summarize(&journal, &MarkerScorer);

        assert!((summary.percent(SentimentLabel::Negative) - 60.0).abs() < 1e-9);
        assert!((summary.percent(SentimentLabel::Positive) - 20.0).abs() < 1e-9);
        assert!((summary.percent(SentimentLabel::Neutral) - 20.0).abs() < 1e-9);
    }

    #[test]
    fn test_only_last_ten_entries_count() {
        let mut texts = vec!["-"; 5];
        texts.extend(vec!["+"; 10]);
        let journal = entries(&texts);

        let summary = SentimentAggregator::default().summarize(&journal, &MarkerScorer);

        assert_eq!(summary.get(SentimentLabel::Negative), None);
        assert!((summary.percent(SentimentLabel::Positive) - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_percentages_sum_to_hundred() {
        let journal = entries(&["+", "-", "=", "+", "-", "=", "+"]);

        let summary = SentimentAggregator::default().summarize(&journal, &MarkerScorer);
        assert!((summary.total() - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_custom_window() {
        let journal = entries(&["+", "+", "-"]);

        let summary = SentimentAggregator::new(1).summarize(&journal, &MarkerScorer);
        assert!((summary.percent(SentimentLabel::Negative) - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_empty_journal() {
        let summary = SentimentAggregator::default().summarize(&[], &MarkerScorer);
        assert!(summary.is_empty());
    }

    #[test]
    fn test_lexicon_scorer() {
        let scorer = LexiconScorer;

        assert_eq!(
            scorer.score("Had a great run, feeling happy and proud"),
            SentimentLabel::Positive
        );
        assert_eq!(
            scorer.score("So tired and stressed, awful day"),
            SentimentLabel::Negative
        );
        assert_eq!(scorer.score("Went to the office."), SentimentLabel::Neutral);
        assert_eq!(scorer.score("I am not happy"), SentimentLabel::Negative);
    }

    #[test]
    fn test_compound_is_bounded() {
        let text = "great ".repeat(200);
        let compound = LexiconScorer.compound(&text);
        assert!(compound > 0.99 && compound < 1.0);
    }
}
