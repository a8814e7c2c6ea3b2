use std::collections::{BTreeSet, HashSet};
use std::sync::Arc;

use crate::db::GraphStore;
use crate::error::Result;
use crate::models::{AuthorComparison, Disagreement};

const NEGATIVE_WORDS: [&str; 6] = ["not", "never", "unlikely", "wrong", "bad", "fail"];
const POSITIVE_WORDS: [&str; 5] = ["will", "likely", "good", "important", "necessary"];

const DISAGREEMENT_LIMIT: usize = 5;

/// Crude stance score: distinct positive wordlist hits minus distinct
/// negative ones. Zero means no stance signal either way.
pub fn lexical_polarity(text: &str) -> i32 {
    let lowered = text.to_lowercase();
    let words: HashSet<&str> = lowered.split_whitespace().collect();

    let positive = POSITIVE_WORDS.iter().filter(|w| words.contains(**w)).count() as i32;
    let negative = NEGATIVE_WORDS.iter().filter(|w| words.contains(**w)).count() as i32;
    positive - negative
}

/// Candidate disagreements: pairs that share a leading word (matched
/// verbatim, case-sensitive) and score with opposite polarity. Capped at
/// five, keeping the earliest pairs in enumeration order.
pub fn find_disagreements(beliefs_a: &[String], beliefs_b: &[String]) -> Vec<Disagreement> {
    let mut out = Vec::new();

    for a in beliefs_a {
        let lead: Vec<&str> = a.split_whitespace().take(3).collect();
        let polarity_a = lexical_polarity(a);

        for b in beliefs_b {
            if lead.iter().any(|word| b.contains(*word))
                && polarity_a * lexical_polarity(b) < 0
            {
                out.push(Disagreement {
                    claim_a: a.clone(),
                    claim_b: b.clone(),
                });
            }
        }
    }

    out.truncate(DISAGREEMENT_LIMIT);
    out
}

/// Side-by-side view of two authors: topic overlap from their analyzed
/// posts and heuristic disagreement candidates from their belief sets.
pub struct AuthorComparator {
    store: Arc<dyn GraphStore>,
}

impl AuthorComparator {
    pub fn new(store: Arc<dyn GraphStore>) -> Self {
        Self { store }
    }

    pub async fn compare(&self, author_a: &str, author_b: &str) -> Result<AuthorComparison> {
        let topics_a = self.topic_set(author_a).await?;
        let topics_b = self.topic_set(author_b).await?;

        let beliefs_a: Vec<String> = self
            .store
            .get_author_beliefs(author_a)
            .await?
            .into_iter()
            .map(|belief| belief.text)
            .collect();
        let beliefs_b: Vec<String> = self
            .store
            .get_author_beliefs(author_b)
            .await?
            .into_iter()
            .map(|belief| belief.text)
            .collect();

        Ok(AuthorComparison {
            shared_topics: topics_a.intersection(&topics_b).cloned().collect(),
            unique_to_a: topics_a.difference(&topics_b).cloned().collect(),
            unique_to_b: topics_b.difference(&topics_a).cloned().collect(),
            disagreements: find_disagreements(&beliefs_a, &beliefs_b),
        })
    }

    /// Every topic the author's analyses ever mentioned. BTreeSet so the
    /// comparison output is ordered the same on every run.
    async fn topic_set(&self, author_id: &str) -> Result<BTreeSet<String>> {
        let mut topics = BTreeSet::new();
        for (_, analysis) in self.store.get_analyzed_posts(author_id).await? {
            topics.extend(analysis.topics.iter().cloned());
        }
        Ok(topics)
    }
}
