//! AI writing assistant.
//!
//! A capability object built from config and stored in `AppState`. It is
//! disabled when no API key is configured (handlers answer 503); when
//! enabled, model failures degrade to deterministic fallback content so
//! the feature keeps working offline.

use rand::seq::SliceRandom;
use serde::Serialize;

use crate::config::Config;

#[derive(Debug, Clone, Serialize)]
pub struct ChatReply {
    pub reply: String,
    pub source: &'static str, // "claude" or "fallback"
}

pub struct Assistant {
    api_key: String,
    model: String,
}

const FALLBACK_REPLIES: [&str; 8] = [
    "That's a great question! While I'm getting set up, here are some writing prompts to inspire you: What made you smile today? What challenged you? What are you grateful for?",
    "I love helping with journaling! Try this approach: Start by describing your day, then reflect on one positive moment and one thing you learned.",
    "Journaling is such a powerful tool for self-reflection! Consider writing about: What emotions are you feeling right now? What would you tell your future self?",
    "I'm here to help with your writing journey! A good prompt to try: 'If I could go back and give advice to my younger self, what would I say?'",
    "Writing can be therapeutic! Try reflecting on: What surprised you today? What are you looking forward to? What challenged your perspective?",
    "Here's a helpful journaling technique: Write about three things you're grateful for, then explore why each one matters to you.",
    "Try this reflective prompt: What did you learn today that you didn't expect to learn?",
    "A creative writing idea: Imagine your perfect day and describe it in detail, then think about one small step to make it real.",
];

const GENERIC_PROMPTS: [&str; 3] = [
    "What made you smile today?",
    "What challenged you and what did you learn?",
    "What are you grateful for right now?",
];

const PARSE_RESCUE_PROMPTS: [&str; 3] = [
    "What made you smile today, and why?",
    "Reflect on a challenge you faced and what you learned from it.",
    "What are you grateful for in this moment?",
];

impl Assistant {
    pub fn from_config(config: &Config) -> Self {
        if config.claude_api_key.is_empty() {
            tracing::warn!("CLAUDE_API_KEY not set, assistant endpoints will answer 503");
        }
        Self {
            api_key: config.claude_api_key.clone(),
            model: config.claude_model.clone(),
        }
    }

    pub fn is_enabled(&self) -> bool {
        !self.api_key.is_empty()
    }

    /// Conversational reply to a journaling question. Falls back to a
    /// canned reply if the model call fails.
    pub async fn chat(&self, username: &str, message: &str) -> ChatReply {
        if !self.is_enabled() {
            return fallback_reply();
        }

        let prompt = format!(
            r#"You are an AI writing assistant for a personal diary application. The user is {}.
Help them with writing prompts, suggestions, or creative inspiration for their diary entries.

Common requests include:
- Writing prompts for different moods or situations
- Creative writing suggestions
- Reflection questions
- Journaling techniques
- Overcoming writer's block
- Daily gratitude prompts

Keep responses helpful, encouraging, and focused on personal growth and self-reflection.
Responses should be conversational and supportive.

User message: {}"#,
            username, message
        );

        match self.call_model(&prompt).await {
            Ok(text) => ChatReply {
                reply: text,
                source: "claude",
            },
            Err(e) => {
                tracing::warn!(error = %e, "assistant model call failed, using fallback reply");
                fallback_reply()
            }
        }
    }

    /// Three writing prompts tuned to a mood and category. Deterministic
    /// fallback tables cover the disabled and failed-call cases.
    pub async fn suggest_prompts(&self, mood: &str, category: &str) -> Vec<String> {
        if !self.is_enabled() {
            return fallback_prompts(mood);
        }

        let prompt = format!(
            r#"Generate 3 creative and thoughtful writing prompts for a diary entry.
Mood: {}
Category: {}

Make them personal, reflective, and encouraging for self-discovery.
Each prompt should be 1-2 sentences long and inspiring."#,
            mood, category
        );

        match self.call_model(&prompt).await {
            Ok(text) => {
                let mut prompts = parse_prompt_lines(&text);
                if prompts.len() < 3 {
                    prompts = PARSE_RESCUE_PROMPTS.iter().map(|p| p.to_string()).collect();
                }
                prompts.truncate(3);
                prompts
            }
            Err(e) => {
                tracing::warn!(error = %e, "prompt generation failed, using fallback prompts");
                fallback_prompts(mood)
            }
        }
    }

    async fn call_model(&self, prompt: &str) -> Result<String, anyhow::Error> {
        // 30-second timeout to prevent indefinite hangs
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()?;

        let response = client
            .post("https://api.anthropic.com/v1/messages")
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", "2023-06-01")
            .header("content-type", "application/json")
            .json(&serde_json::json!({
                "model": self.model,
                "max_tokens": 1024,
                "messages": [{
                    "role": "user",
                    "content": prompt
                }]
            }))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("model API error {}: {}", status, body);
        }

        let value: serde_json::Value = response.json().await?;
        let text = value["content"][0]["text"].as_str().unwrap_or("").trim();
        if text.is_empty() {
            anyhow::bail!("empty completion from model API");
        }
        Ok(text.to_string())
    }
}

fn fallback_reply() -> ChatReply {
    let reply = FALLBACK_REPLIES
        .choose(&mut rand::thread_rng())
        .copied()
        .unwrap_or(FALLBACK_REPLIES[0]);
    ChatReply {
        reply: reply.to_string(),
        source: "fallback",
    }
}

/// Canned prompt triples keyed by the mood query parameter.
fn fallback_prompts(mood: &str) -> Vec<String> {
    let prompts: [&str; 3] = match mood.to_lowercase().as_str() {
        "gratitude" => [
            "What three things are you most grateful for today?",
            "Who made a positive impact on your life recently?",
            "What simple pleasures brought you joy this week?",
        ],
        "reflection" => [
            "What did you learn about yourself today?",
            "How have you grown in the past month?",
            "What would you do differently if you could relive today?",
        ],
        "creativity" => [
            "If you could create anything right now, what would it be?",
            "What inspires your creativity the most?",
            "Describe your perfect creative day.",
        ],
        "mindfulness" => [
            "What are you feeling in this exact moment?",
            "How can you be more present today?",
            "What thoughts are occupying your mind?",
        ],
        "motivation" => [
            "What motivates you to keep going?",
            "What small step can you take toward your goals today?",
            "Who inspires you and why?",
        ],
        _ => GENERIC_PROMPTS,
    };
    prompts.iter().map(|p| p.to_string()).collect()
}

/// Split a model completion into prompt lines, dropping blanks and bare
/// list numbers.
fn parse_prompt_lines(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.chars().all(|c| c.is_ascii_digit()))
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn disabled_assistant() -> Assistant {
        Assistant {
            api_key: String::new(),
            model: "claude-sonnet-4-20250514".into(),
        }
    }

    #[test]
    fn fallback_prompts_cover_known_moods() {
        for mood in ["gratitude", "reflection", "creativity", "mindfulness", "motivation"] {
            let prompts = fallback_prompts(mood);
            assert_eq!(prompts.len(), 3, "mood {mood}");
            assert!(prompts.iter().all(|p| !p.is_empty()));
        }
    }

    #[test]
    fn fallback_prompts_unknown_mood_uses_generic_triple() {
        assert_eq!(fallback_prompts("ecstatic"), fallback_prompts("???"));
        assert_eq!(fallback_prompts("ecstatic").len(), 3);
    }

    #[test]
    fn fallback_prompt_lookup_is_case_insensitive() {
        assert_eq!(fallback_prompts("Gratitude"), fallback_prompts("gratitude"));
    }

    #[test]
    fn parse_prompt_lines_drops_blanks_and_bare_numbers() {
        let text = "1\nWhat made you smile?\n\n  2  \nWhere did you wander?\n3. A numbered line survives.";
        let prompts = parse_prompt_lines(text);
        assert_eq!(
            prompts,
            vec![
                "What made you smile?".to_string(),
                "Where did you wander?".to_string(),
                "3. A numbered line survives.".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn disabled_assistant_chats_from_the_fallback_table() {
        let assistant = disabled_assistant();
        assert!(!assistant.is_enabled());
        let reply = assistant.chat("ada", "help me start").await;
        assert_eq!(reply.source, "fallback");
        assert!(FALLBACK_REPLIES.contains(&reply.reply.as_str()));
    }

    #[tokio::test]
    async fn disabled_assistant_suggests_mood_prompts() {
        let assistant = disabled_assistant();
        let prompts = assistant.suggest_prompts("gratitude", "general").await;
        assert_eq!(prompts[0], "What three things are you most grateful for today?");
        assert_eq!(prompts.len(), 3);
    }
}
