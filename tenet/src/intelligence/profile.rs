use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use serde::Deserialize;

use crate::config::AnalysisConfig;
use crate::db::GraphStore;
use crate::error::Result;
use crate::llm::{prompts, CompletionOptions, LlmProvider};
use crate::models::{AuthorProfile, BiasStats, PostAnalysis, ProfileBelief};

/// Topic frequency across an author's analyses: most frequent first,
/// first-seen order on ties.
pub fn aggregate_topics(analyses: &[PostAnalysis], limit: usize) -> Vec<String> {
    let mut counts: HashMap<&str, (usize, usize)> = HashMap::new();
    let mut order = 0usize;

    for analysis in analyses {
        for topic in &analysis.topics {
            let entry = counts.entry(topic.as_str()).or_insert_with(|| {
                order += 1;
                (0, order)
            });
            entry.0 += 1;
        }
    }

    let mut ranked: Vec<(&str, usize, usize)> = counts
        .into_iter()
        .map(|(topic, (count, first_seen))| (topic, count, first_seen))
        .collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.2.cmp(&b.2)));

    ranked
        .into_iter()
        .take(limit)
        .map(|(topic, _, _)| topic.to_string())
        .collect()
}

/// Mean bias score and mean analysis confidence. No bias scores at all
/// means no stats, not a zero mean.
pub fn bias_stats(analyses: &[PostAnalysis]) -> Option<BiasStats> {
    let scores: Vec<f64> = analyses.iter().filter_map(|a| a.bias_score).collect();
    if scores.is_empty() {
        return None;
    }
    let confidences: Vec<f64> = analyses.iter().filter_map(|a| a.confidence).collect();

    let mean = scores.iter().sum::<f64>() / scores.len() as f64;
    let confidence = if confidences.is_empty() {
        0.0
    } else {
        confidences.iter().sum::<f64>() / confidences.len() as f64
    };

    Some(BiasStats { mean, confidence })
}

#[derive(Debug, Deserialize)]
struct SummaryResponse {
    summary: String,
}

fn parse_summary(raw: &str) -> Option<String> {
    serde_json::from_str::<SummaryResponse>(raw.trim())
        .ok()
        .map(|response| response.summary)
}

fn fallback_summary(beliefs: &[String]) -> String {
    beliefs
        .first()
        .cloned()
        .unwrap_or_else(|| "No summary available".to_string())
}

/// Materializes the cached per-author profile: top beliefs, tensions,
/// topics, bias stats, and a worldview summary.
pub struct ProfileBuilder {
    store: Arc<dyn GraphStore>,
    llm: LlmProvider,
    belief_limit: usize,
    tension_limit: usize,
    topic_limit: usize,
}

impl ProfileBuilder {
    pub fn new(store: Arc<dyn GraphStore>, llm: LlmProvider, config: &AnalysisConfig) -> Self {
        Self {
            store,
            llm,
            belief_limit: config.profile_belief_limit,
            tension_limit: config.profile_tension_limit,
            topic_limit: config.profile_topic_limit,
        }
    }

    /// Recompute and overwrite the cached profile. An author with no
    /// consolidated beliefs has no profile to build yet.
    pub async fn build_for_author(&self, author_id: &str) -> Result<Option<AuthorProfile>> {
        let beliefs = self.store.get_author_beliefs(author_id).await?;
        if beliefs.is_empty() {
            tracing::debug!(author_id, "No beliefs yet, skipping profile");
            return Ok(None);
        }

        let analyses: Vec<PostAnalysis> = self
            .store
            .get_analyzed_posts(author_id)
            .await?
            .into_iter()
            .map(|(_, analysis)| analysis)
            .collect();

        let topics = aggregate_topics(&analyses, self.topic_limit);
        let bias = bias_stats(&analyses);

        let mut tensions = self.store.get_contradictions(author_id).await?;
        tensions.truncate(self.tension_limit);

        let top_beliefs: Vec<ProfileBelief> = beliefs
            .iter()
            .take(self.belief_limit)
            .map(|belief| ProfileBelief {
                text: belief.text.clone(),
                support_count: belief.support_count,
                avg_polarity: belief.avg_polarity,
            })
            .collect();
        let belief_texts: Vec<String> = top_beliefs.iter().map(|b| b.text.clone()).collect();

        let summary = self
            .worldview_summary(&belief_texts, &topics, bias.map(|b| b.mean))
            .await;

        let profile = AuthorProfile {
            author_id: author_id.to_string(),
            summary,
            beliefs: top_beliefs,
            tensions,
            topics,
            bias,
            computed_at: Utc::now(),
        };
        self.store.upsert_profile(&profile).await?;

        tracing::info!(
            author_id,
            beliefs = profile.beliefs.len(),
            tensions = profile.tensions.len(),
            "Author profile materialized"
        );
        Ok(Some(profile))
    }

    /// Short intellectual profile in prose. Every failure path lands on
    /// the top belief text, so the profile always carries a summary.
    async fn worldview_summary(
        &self,
        beliefs: &[String],
        topics: &[String],
        bias: Option<f64>,
    ) -> String {
        if !self.llm.is_available() {
            return fallback_summary(beliefs);
        }

        let prompt = prompts::worldview_summary_prompt(beliefs, topics, bias);
        let options = CompletionOptions {
            temperature: Some(0.2),
            max_tokens: None,
        };

        match self.llm.complete(&prompt, Some(&options)).await {
            Ok(raw) => parse_summary(&raw).unwrap_or_else(|| fallback_summary(beliefs)),
            Err(error) => {
                tracing::warn!(error = %error, "Worldview summary failed, using top belief");
                fallback_summary(beliefs)
            }
        }
    }
}
