use std::sync::Arc;

use crate::db::GraphStore;
use crate::error::Result;
use crate::models::{BeliefDraft, ClaimOccurrence, TimelineEntry};

/// Cosine similarity accumulated in f64 so the threshold comparison does
/// not depend on f32 rounding. Mismatched or zero vectors score 0.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f64 {
    if a.is_empty() || a.len() != b.len() {
        return 0.0;
    }

    let mut dot = 0.0f64;
    let mut norm_a = 0.0f64;
    let mut norm_b = 0.0f64;
    for (x, y) in a.iter().zip(b.iter()) {
        let x = f64::from(*x);
        let y = f64::from(*y);
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot / (norm_a.sqrt() * norm_b.sqrt())
}

/// Greedy single-link grouping over claims in input order.
///
/// The first unassigned claim founds a group and stays its seed; every
/// later unassigned claim joins the group when its similarity to the seed
/// (not a centroid) is at or above the threshold. Every claim ends up in
/// exactly one group; a claim with no neighbor becomes a singleton
/// rather than being dropped as noise.
pub fn group_claims(claims: &[ClaimOccurrence], threshold: f64) -> Vec<Vec<usize>> {
    let mut groups: Vec<Vec<usize>> = Vec::new();
    let mut assigned = vec![false; claims.len()];

    for seed_index in 0..claims.len() {
        if assigned[seed_index] {
            continue;
        }
        assigned[seed_index] = true;
        let mut members = vec![seed_index];
        let seed = embedding_of(&claims[seed_index]);

        for candidate in (seed_index + 1)..claims.len() {
            if assigned[candidate] {
                continue;
            }
            if cosine_similarity(seed, embedding_of(&claims[candidate])) >= threshold {
                assigned[candidate] = true;
                members.push(candidate);
            }
        }

        groups.push(members);
    }

    groups
}

/// Reduce groups to belief drafts plus one timeline row per member,
/// stamped with the canonical text. Canonical text is the longest member
/// text; on equal length the earlier member wins.
pub fn build_beliefs(
    claims: &[ClaimOccurrence],
    groups: &[Vec<usize>],
) -> (Vec<BeliefDraft>, Vec<TimelineEntry>) {
    let mut drafts = Vec::with_capacity(groups.len());
    let mut timeline = Vec::new();

    for members in groups {
        let mut canonical = claims[members[0]].text.as_str();
        for &index in &members[1..] {
            let text = claims[index].text.as_str();
            if text.chars().count() > canonical.chars().count() {
                canonical = text;
            }
        }

        let support = members.len();
        let polarity_sum: f64 = members.iter().map(|&i| claims[i].polarity).sum();
        let confidence_sum: f64 = members.iter().map(|&i| claims[i].confidence).sum();

        drafts.push(BeliefDraft {
            text: canonical.to_string(),
            support_count: support as i64,
            avg_polarity: polarity_sum / support as f64,
            avg_confidence: confidence_sum / support as f64,
        });

        for &index in members {
            timeline.push(TimelineEntry {
                author_id: claims[index].author_id.clone(),
                claim: canonical.to_string(),
                occurred_at: claims[index].occurred_at,
            });
        }
    }

    (drafts, timeline)
}

/// Rebuilds an author's canonical belief set from their ADVANCED,
/// embedded claim occurrences.
pub struct BeliefConsolidator {
    store: Arc<dyn GraphStore>,
    similarity_threshold: f64,
}

impl BeliefConsolidator {
    pub fn new(store: Arc<dyn GraphStore>, similarity_threshold: f64) -> Self {
        Self {
            store,
            similarity_threshold,
        }
    }

    /// Group and atomically replace one author's beliefs, returning the
    /// number of beliefs written. An author with nothing clusterable keeps
    /// whatever belief set they already had.
    pub async fn consolidate_author(&self, author_id: &str) -> Result<u64> {
        let claims = self.store.get_clusterable_claims(author_id).await?;
        if claims.is_empty() {
            tracing::debug!(author_id, "No clusterable claims, skipping consolidation");
            return Ok(0);
        }

        let groups = group_claims(&claims, self.similarity_threshold);
        let (drafts, timeline) = build_beliefs(&claims, &groups);

        let written = self
            .store
            .replace_author_beliefs(author_id, &drafts, &timeline)
            .await?;
        tracing::info!(
            author_id,
            claims = claims.len(),
            beliefs = written,
            "Consolidated author beliefs"
        );

        Ok(written)
    }
}

fn embedding_of(claim: &ClaimOccurrence) -> &[f32] {
    claim.embedding.as_deref().unwrap_or(&[])
}
