use codemetry_core::{AiSummary, CodemetryError, WindowDigest};
use serde::Deserialize;

/// Most bullets ever kept from one response.
const MAX_BULLETS: usize = 5;

const SYSTEM_PROMPT: &str = "\
You are codemetry, an assistant that explains developer mood scores derived \
from git commit history.

You are given the scored facts for one day: the mood label, the numeric \
score, the extracted signals with their z-scores, and the ranked reasons.

Rules:
- Explain only what the provided facts support; never invent events
- Refer to concrete signals (fix rate, churn, late-night commits, ...)
- Plain language, no jargon, no numbers copied to more than one decimal
- 2 to 4 short bullets, each a single sentence
- This is a proxy metric about work patterns, not a diagnosis of a person

Respond with a JSON object:
{
  \"bullets\": [\"First observation\", \"Second observation\"]
}";

/// Build the system prompt for the explanation model.
///
/// # Examples
///
/// ```
/// use codemetry_ai::prompt::build_system_prompt;
///
/// let prompt = build_system_prompt();
/// assert!(prompt.contains("codemetry"));
/// assert!(prompt.contains("bullets"));
/// ```
pub fn build_system_prompt() -> String {
    SYSTEM_PROMPT.to_string()
}

/// Build the user prompt carrying one window's scored facts as JSON.
///
/// # Errors
///
/// Returns [`CodemetryError::Serialization`] if the digest cannot be
/// encoded.
///
/// # Examples
///
/// ```
/// use codemetry_core::{MoodLabel, WindowDigest};
/// use codemetry_ai::prompt::build_window_prompt;
///
/// let digest = WindowDigest {
///     window_label: "2024-01-15".into(),
///     mood_label: MoodLabel::Strained,
///     mood_score: 34.2,
///     signals: vec![],
///     reasons: vec![],
/// };
/// let prompt = build_window_prompt(&digest).unwrap();
/// assert!(prompt.contains("2024-01-15"));
/// ```
pub fn build_window_prompt(digest: &WindowDigest) -> Result<String, CodemetryError> {
    let facts = serde_json::to_string_pretty(digest)?;
    Ok(format!(
        "Explain the mood score for this day:\n\n```json\n{facts}\n```\n"
    ))
}

#[derive(Deserialize)]
struct ExplanationResponse {
    bullets: Vec<String>,
}

/// Parse the model's JSON response into an [`AiSummary`].
///
/// Handles markdown code fences around the JSON. Blank bullets are dropped
/// and at most five are kept.
///
/// # Errors
///
/// Returns [`CodemetryError::Ai`] when the response is not the expected
/// JSON shape or contains no usable bullets, so the caller can retry or
/// degrade.
///
/// # Examples
///
/// ```
/// use codemetry_ai::prompt::parse_explanation;
///
/// let summary = parse_explanation(r#"{"bullets":["Fix rate spiked"]}"#).unwrap();
/// assert_eq!(summary.explanation_bullets, vec!["Fix rate spiked".to_string()]);
/// assert!(parse_explanation("not json").is_err());
/// ```
pub fn parse_explanation(response: &str) -> Result<AiSummary, CodemetryError> {
    let cleaned = strip_code_fences(response);

    let parsed: ExplanationResponse = serde_json::from_str(cleaned)
        .map_err(|e| CodemetryError::Ai(format!("unparseable explanation: {e}")))?;

    let bullets: Vec<String> = parsed
        .bullets
        .into_iter()
        .map(|b| b.trim().to_string())
        .filter(|b| !b.is_empty())
        .take(MAX_BULLETS)
        .collect();

    if bullets.is_empty() {
        return Err(CodemetryError::Ai("explanation had no bullets".into()));
    }

    Ok(AiSummary {
        explanation_bullets: bullets,
    })
}

fn strip_code_fences(s: &str) -> &str {
    let trimmed = s.trim();
    if let Some(rest) = trimmed.strip_prefix("```json") {
        if let Some(inner) = rest.strip_suffix("```") {
            return inner.trim();
        }
    }
    if let Some(rest) = trimmed.strip_prefix("```") {
        if let Some(inner) = rest.strip_suffix("```") {
            return inner.trim();
        }
    }
    trimmed
}

#[cfg(test)]
mod tests {
    use super::*;
    use codemetry_core::{MoodLabel, Reason};

    fn digest() -> WindowDigest {
        WindowDigest {
            window_label: "2024-01-15".into(),
            mood_label: MoodLabel::Strained,
            mood_score: 34.2,
            signals: vec![],
            reasons: vec![Reason {
                summary: "sharply elevated fix-commit rate".into(),
                signal: "fix_rate".into(),
                contribution: -28.0,
            }],
        }
    }

    #[test]
    fn system_prompt_sets_the_contract() {
        let prompt = build_system_prompt();
        assert!(prompt.contains("proxy metric"));
        assert!(prompt.contains("never invent"));
        assert!(prompt.contains("\"bullets\""));
    }

    #[test]
    fn window_prompt_embeds_the_facts() {
        let prompt = build_window_prompt(&digest()).unwrap();
        assert!(prompt.contains("```json"));
        assert!(prompt.contains("fix_rate"));
        assert!(prompt.contains("strained"));
    }

    #[test]
    fn parse_plain_json() {
        let summary =
            parse_explanation(r#"{"bullets":["One thing", "Another thing"]}"#).unwrap();
        assert_eq!(summary.explanation_bullets.len(), 2);
    }

    #[test]
    fn parse_fenced_json() {
        let fenced = "```json\n{\"bullets\":[\"Fenced bullet\"]}\n```";
        let summary = parse_explanation(fenced).unwrap();
        assert_eq!(summary.explanation_bullets, vec!["Fenced bullet".to_string()]);
    }

    #[test]
    fn blank_bullets_are_dropped_and_capped() {
        let json = r#"{"bullets":["", "  ", "a", "b", "c", "d", "e", "f"]}"#;
        let summary = parse_explanation(json).unwrap();
        assert_eq!(summary.explanation_bullets.len(), 5);
        assert_eq!(summary.explanation_bullets[0], "a");
    }

    #[test]
    fn empty_bullets_are_an_error() {
        assert!(parse_explanation(r#"{"bullets":[]}"#).is_err());
        assert!(parse_explanation(r#"{"wrong":"shape"}"#).is_err());
        assert!(parse_explanation("total garbage").is_err());
    }
}
