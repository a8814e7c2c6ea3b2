//! Prompt templates for the LLM-backed pipeline stages
//!
//! Plain `format!()` templates; a missing variable is a compile error
//! rather than a malformed prompt at runtime.

/// Generate a prompt asking how an author uses a statement.
///
/// The answer decides whether the statement counts as the author's own
/// position (ADVANCED), a description of someone else's (DISCUSSED), or
/// commentary about the article itself (META).
///
/// # Example
/// ```
/// use tenet::llm::prompts::claim_type_prompt;
///
/// let prompt = claim_type_prompt("Markets are mostly efficient");
/// assert!(prompt.contains("Markets are mostly efficient"));
/// assert!(prompt.contains("ADVANCED"));
/// ```
pub fn claim_type_prompt(statement: &str) -> String {
    format!(
        r#"Determine how the author uses this statement.

ADVANCED = the author is proposing or arguing this idea (even tentatively)
DISCUSSED = the author describes others' beliefs or possibilities without endorsing
META = about the article, reactions, or writing process

Return JSON:
{{"type":"ADVANCED"|"DISCUSSED"|"META"}}

Statement:
{statement}"#
    )
}

/// Generate a prompt asking for the logical relationship between two of
/// one author's canonical beliefs.
///
/// # Example
/// ```
/// use tenet::llm::prompts::belief_relation_prompt;
///
/// let prompt = belief_relation_prompt("AI will reshape labor", "AI progress is overhyped");
/// assert!(prompt.contains("Belief A:"));
/// assert!(prompt.contains("CONTRADICTS"));
/// ```
pub fn belief_relation_prompt(belief_a: &str, belief_b: &str) -> String {
    format!(
        r#"Determine the logical relationship between two beliefs held by the same author.

SUPPORTS = belief A strengthens or explains belief B
CONTRADICTS = both cannot be true simultaneously
UNRELATED = no clear logical interaction

Return JSON:
{{"relation":"SUPPORTS"|"CONTRADICTS"|"UNRELATED","confidence":0-1}}

Belief A:
{belief_a}

Belief B:
{belief_b}"#
    )
}

/// Generate a prompt for a short intellectual profile of an author.
///
/// Takes the author's strongest beliefs, dominant topics, and mean bias
/// score. Inputs are truncated to keep the prompt bounded on prolific
/// authors.
pub fn worldview_summary_prompt(beliefs: &[String], topics: &[String], bias: Option<f64>) -> String {
    let belief_lines = beliefs
        .iter()
        .take(12)
        .map(|belief| format!("- {belief}"))
        .collect::<Vec<_>>()
        .join("\n");
    let topic_line = topics
        .iter()
        .take(12)
        .cloned()
        .collect::<Vec<_>>()
        .join(", ");
    let bias_line = match bias {
        Some(score) => format!("{score:.2}"),
        None => "unknown".to_string(),
    };

    format!(
        r#"You are summarizing a thinker's worldview.

Write a concise 3-5 sentence intellectual profile.

Focus on:
- what they believe about the world
- recurring reasoning patterns
- their general orientation (empirical, moral, pragmatic, skeptical, etc)

Beliefs:
{belief_lines}

Topics:
{topic_line}

Bias score:
{bias_line}

Return JSON:
{{"summary": "..."}}"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_claim_type_prompt_lists_all_labels() {
        let prompt = claim_type_prompt("X");
        for label in ["ADVANCED", "DISCUSSED", "META"] {
            assert!(prompt.contains(label));
        }
        assert!(prompt.trim_end().ends_with('X'));
    }

    #[test]
    fn test_worldview_prompt_truncates_inputs() {
        let beliefs: Vec<String> = (0..20).map(|i| format!("belief {i}")).collect();
        let topics: Vec<String> = (0..20).map(|i| format!("topic {i}")).collect();

        let prompt = worldview_summary_prompt(&beliefs, &topics, Some(0.25));

        assert!(prompt.contains("belief 11"));
        assert!(!prompt.contains("belief 12"));
        assert!(prompt.contains("topic 11"));
        assert!(!prompt.contains("topic 12"));
        assert!(prompt.contains("0.25"));
    }

    #[test]
    fn test_worldview_prompt_without_bias() {
        let prompt = worldview_summary_prompt(&["a".to_string()], &[], None);
        assert!(prompt.contains("unknown"));
    }
}
