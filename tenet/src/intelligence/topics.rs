use crate::embeddings::EmbeddingProvider;
use crate::error::Result;

use super::consolidator::cosine_similarity;

/// Fixed anchor vocabulary the projector maps free-form topics onto.
pub const DOMAIN_ANCHORS: [&str; 12] = [
    "artificial intelligence",
    "human cognition",
    "education",
    "psychology",
    "economics",
    "politics",
    "technology",
    "philosophy",
    "culture",
    "forecasting and prediction",
    "social behavior",
    "epistemology",
];

/// Greedy label clustering: each label joins the first cluster whose
/// founding label is strictly more similar than the threshold, otherwise
/// founds its own. Canonical label per cluster is the shortest member
/// (first wins on equal length). Returns canonicals in cluster order.
pub fn cluster_labels(labels: &[String], vectors: &[Vec<f32>], threshold: f64) -> Vec<String> {
    let mut clusters: Vec<(usize, Vec<usize>)> = Vec::new();

    for index in 0..labels.len().min(vectors.len()) {
        let mut placed = false;
        for (seed, members) in clusters.iter_mut() {
            if cosine_similarity(&vectors[index], &vectors[*seed]) > threshold {
                members.push(index);
                placed = true;
                break;
            }
        }
        if !placed {
            clusters.push((index, vec![index]));
        }
    }

    clusters
        .iter()
        .map(|(_, members)| {
            let mut canonical = labels[members[0]].as_str();
            for &member in &members[1..] {
                if labels[member].chars().count() < canonical.chars().count() {
                    canonical = labels[member].as_str();
                }
            }
            canonical.to_string()
        })
        .collect()
}

/// Map each topic vector to its nearest anchor, keeping anchors whose
/// best match clears the threshold. Returns hit anchor indices in anchor
/// order, deduplicated.
pub fn project_vectors(
    topic_vectors: &[Vec<f32>],
    anchor_vectors: &[Vec<f32>],
    threshold: f64,
) -> Vec<usize> {
    let mut hit = vec![false; anchor_vectors.len()];

    for vector in topic_vectors {
        let mut best: Option<(usize, f64)> = None;
        for (index, anchor) in anchor_vectors.iter().enumerate() {
            let similarity = cosine_similarity(vector, anchor);
            if best.map_or(true, |(_, top)| similarity > top) {
                best = Some((index, similarity));
            }
        }
        if let Some((index, similarity)) = best {
            if similarity >= threshold {
                hit[index] = true;
            }
        }
    }

    hit.iter()
        .enumerate()
        .filter(|(_, &was_hit)| was_hit)
        .map(|(index, _)| index)
        .collect()
}

/// Collapses near-duplicate topic strings into canonical representatives.
pub struct TopicNormalizer {
    embeddings: EmbeddingProvider,
    similarity_threshold: f64,
}

impl TopicNormalizer {
    pub fn new(embeddings: EmbeddingProvider, similarity_threshold: f64) -> Self {
        Self {
            embeddings,
            similarity_threshold,
        }
    }

    pub async fn normalize(&self, topics: &[String]) -> Result<Vec<String>> {
        if topics.is_empty() {
            return Ok(Vec::new());
        }

        let vectors = self.embeddings.embed(topics.to_vec()).await?;
        Ok(cluster_labels(topics, &vectors, self.similarity_threshold))
    }
}

/// Projects free-form topics onto the fixed anchor vocabulary.
pub struct DomainProjector {
    embeddings: EmbeddingProvider,
    anchor_threshold: f64,
}

impl DomainProjector {
    pub fn new(embeddings: EmbeddingProvider, anchor_threshold: f64) -> Self {
        Self {
            embeddings,
            anchor_threshold,
        }
    }

    /// Topics without a close-enough anchor are dropped rather than
    /// forced onto a bad match.
    pub async fn project(&self, topics: &[String]) -> Result<Vec<String>> {
        if topics.is_empty() {
            return Ok(Vec::new());
        }

        let anchors: Vec<String> = DOMAIN_ANCHORS.iter().map(|s| s.to_string()).collect();
        let anchor_vectors = self.embeddings.embed(anchors).await?;
        let topic_vectors = self.embeddings.embed(topics.to_vec()).await?;

        let hits = project_vectors(&topic_vectors, &anchor_vectors, self.anchor_threshold);
        Ok(hits
            .into_iter()
            .map(|index| DOMAIN_ANCHORS[index].to_string())
            .collect())
    }
}
