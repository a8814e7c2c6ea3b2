use std::collections::HashMap;
use std::sync::Arc;

use crate::db::GraphStore;
use crate::error::Result;
use crate::models::{BeliefDrift, BeliefSpan, EvolutionReport, Tension, TimelineEntry};

/// Reduce time-ordered timeline rows to one (first_seen, last_seen) span
/// per belief text. Input rows are sorted by occurrence, so spans come
/// out ordered by first appearance.
pub fn reduce_spans(timeline: &[TimelineEntry]) -> Vec<BeliefSpan> {
    let mut spans: Vec<BeliefSpan> = Vec::new();
    let mut by_claim: HashMap<&str, usize> = HashMap::new();

    for entry in timeline {
        match by_claim.get(entry.claim.as_str()) {
            Some(&index) => {
                let span = &mut spans[index];
                if entry.occurred_at < span.first_seen {
                    span.first_seen = entry.occurred_at;
                }
                if entry.occurred_at > span.last_seen {
                    span.last_seen = entry.occurred_at;
                }
            }
            None => {
                by_claim.insert(entry.claim.as_str(), spans.len());
                spans.push(BeliefSpan {
                    claim: entry.claim.clone(),
                    first_seen: entry.occurred_at,
                    last_seen: entry.occurred_at,
                });
            }
        }
    }

    spans
}

/// Cross spans with stored CONTRADICTS pairs. Spans arrive in first-seen
/// order, so for each matched pair the earlier belief is simply the one
/// enumerated first. Tensions whose texts no longer appear in the
/// timeline match nothing and drop out.
pub fn detect_drifts(spans: &[BeliefSpan], tensions: &[Tension]) -> Vec<BeliefDrift> {
    let mut confidence_by_pair: HashMap<(&str, &str), f64> = HashMap::new();
    for tension in tensions {
        let key = pair_key(&tension.belief_a, &tension.belief_b);
        // Tensions are sorted strongest first; keep the strongest on
        // duplicates.
        confidence_by_pair.entry(key).or_insert(tension.confidence);
    }

    let mut drifts = Vec::new();
    for (index, earlier) in spans.iter().enumerate() {
        for later in &spans[index + 1..] {
            if let Some(&confidence) = confidence_by_pair.get(&pair_key(&earlier.claim, &later.claim))
            {
                drifts.push(BeliefDrift {
                    earlier: earlier.claim.clone(),
                    later: later.claim.clone(),
                    confidence,
                });
            }
        }
    }

    drifts
}

fn pair_key<'a>(a: &'a str, b: &'a str) -> (&'a str, &'a str) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

/// Surfaces how an author's beliefs moved over time: when each belief
/// was active, and which contradictory pairs overlap.
pub struct DriftDetector {
    store: Arc<dyn GraphStore>,
}

impl DriftDetector {
    pub fn new(store: Arc<dyn GraphStore>) -> Self {
        Self { store }
    }

    pub async fn detect_author(&self, author_id: &str) -> Result<EvolutionReport> {
        let timeline = self.store.get_author_timeline(author_id).await?;
        let spans = reduce_spans(&timeline);
        let tensions = self.store.get_contradictions(author_id).await?;
        let drifts = detect_drifts(&spans, &tensions);

        tracing::debug!(
            author_id,
            beliefs = spans.len(),
            drifts = drifts.len(),
            "Drift detection complete"
        );

        Ok(EvolutionReport {
            author_id: author_id.to_string(),
            spans,
            drifts,
        })
    }
}
