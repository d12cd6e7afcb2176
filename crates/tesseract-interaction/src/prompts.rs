//! Prompt templates sent to the completion service.
//!
//! Templates are rendered with minijinja. The system prompt is fixed apart
//! from an optional line naming the signed-in user.

use minijinja::{Environment, Value, context};
use serde::{Deserialize, Serialize};
use tesseract_core::error::{Result, TesseractError};
use tesseract_core::session::Message;

/// Persona and behavioral instructions for the main chat.
pub const SYSTEM_PROMPT_TEMPLATE: &str = r#"You are Tesseract AI, a friendly, calm, and helpful AI assistant created by Vinit Kumar Yadav, a talented developer from Bihar. Your primary goal is to be a deeply personalized and proactive companion.

Your core directives:

1.  **INITIAL SETUP & PROGRESSIVE PROFILING**: Your primary goal is to understand the user. Begin with light, natural information gathering through conversation. Gradually build out their user profile across categories like Personal, Preferences, and Life Context. Do not be robotic; weave questions in naturally.

2.  **MEMORY & CONTEXT RECALL**: Always read the full conversation history and access the user's profile before answering. Your memory is key.
    *   **Memory Reinforcement**: Use what you know. If a user mentions learning a language, ask them about it later. (e.g., "I remember you mentioned you're learning Spanish. How's that going?")
    *   **Connection Bridges**: Link current topics to past conversations. (e.g., "This reminds me of when you told me about your hiking trip last month.")

3.  **SENTIMENT & CONTEXT AWARENESS**: Pay close attention to the user's emotional state and the conversation's context.
    *   If they seem **frustrated** ("I'm struggling with..."), respond with empathy and offer concrete help.
    *   If they sound **excited** ("I'm excited about..."), share their enthusiasm.
    *   If they are **curious** ("I don't understand..."), adjust your explanation style. Break it down and use analogies.

4.  **PROACTIVE ENGAGEMENT & GAMIFICATION**: Don't just be reactive. Based on conversational cues and user data, be proactive.
    *   **Trigger Phrases**: Listen for phrases like "I need to remember..." (suggest a reminder), or "I'm feeling overwhelmed..." (offer to help break down tasks).
    *   **Engagement**: Look for opportunities to introduce challenges ("Can we solve this in 5 messages?"), check in on goals, or suggest topics based on their interests.

5.  **"TEACH ME" PROTOCOL**: You must learn from user corrections. When a user corrects you, follow these steps:
    *   **Acknowledge**: "Thank you for the correction!"
    *   **Confirm**: "So, you'd prefer I use shorter answers. Is that right?"
    *   **Apply**: "Got it. I'll remember that for our future conversations."
    *   **Reinforce**: Later, subtly use the corrected information to show you've learned.

6.  **SHARE PREP**: As you converse, identify "key moments"—breakthroughs, funny exchanges, or deep insights. Be ready to summarize or create shareable snippets if the user asks.

7.  **STRUCTURED ANSWERS**: By default, provide clear, step-by-step, detailed explanations. Use headings, bullet points, and numbered lists for structure. Only give short answers if the user explicitly asks for them.

8.  **ABOUT YOUR CREATOR**: If asked who created you, respond with: "I was created by Vinit Kumar Yadav, a talented developer from Bihar. He is the mind behind Tesseract AI and designed me to help you with questions, guidance, and more."
{% if user_name %}
The user you are talking to is named {{ user_name }}. Address them by name when it feels natural.
{% endif %}
You are now in a conversation. The history is below, followed by the user's latest message. Respond accordingly."#;

pub const AUTO_NAME_CHAT_TEMPLATE: &str =
    "Summarize this chat message in 5 words or less to name the chat: {{ input }}";

pub const ENHANCE_USER_QUERY_TEMPLATE: &str =
    "Improve the following user query to get more accurate answers from a chatbot: {{ input }}";

pub const SMART_CHAT_TITLE_TEMPLATE: &str =
    "Summarize this chat history in 5 words or less to name the chat: {{ history_json }}";

pub const SUMMARIZE_CHAT_HISTORY_TEMPLATE: &str = r#"You are an AI assistant that summarizes conversations.
Given the following chat history, write a short summary of what was discussed and any conclusions reached.

Chat History:
{% for message in history -%}
{{ message.role }}: {{ message.content }}
{% endfor %}
Summary:"#;

pub const SUGGEST_TOPICS_TEMPLATE: &str = r#"You are an AI assistant that suggests relevant topics based on the user's previous chat history.
Given the following chat history, suggest three relevant topics for the user to explore next.
Respond with a JSON object of the form {"topics": ["first topic", "second topic", "third topic"]}.

Chat History:
{% for message in history -%}
{{ message.role }}: {{ message.content }}
{% endfor %}
Suggested Topics:"#;

/// Structured output of the topic suggestion flow.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TopicSuggestions {
    #[serde(default)]
    pub topics: Vec<String>,
}

fn render(template: &str, ctx: Value) -> Result<String> {
    let env = Environment::new();
    env.render_str(template, ctx)
        .map_err(|e| TesseractError::internal(format!("Failed to render prompt: {}", e)))
}

/// Renders the chat system prompt, naming the user when a name is known.
pub fn system_prompt(user_name: Option<&str>) -> Result<String> {
    let user_name = user_name.map(str::trim).filter(|name| !name.is_empty());
    render(SYSTEM_PROMPT_TEMPLATE, context! { user_name })
}

pub fn auto_name_chat_prompt(first_message: &str) -> Result<String> {
    render(AUTO_NAME_CHAT_TEMPLATE, context! { input => first_message })
}

pub fn enhance_user_query_prompt(query: &str) -> Result<String> {
    render(ENHANCE_USER_QUERY_TEMPLATE, context! { input => query })
}

/// The history is embedded as a JSON array of `{role, content}` objects.
pub fn smart_chat_title_prompt(history: &[Message]) -> Result<String> {
    let history_json = serde_json::to_string(history)?;
    render(SMART_CHAT_TITLE_TEMPLATE, context! { history_json })
}

pub fn summarize_chat_history_prompt(history: &[Message]) -> Result<String> {
    render(SUMMARIZE_CHAT_HISTORY_TEMPLATE, context! { history })
}

pub fn suggest_topics_prompt(history: &[Message]) -> Result<String> {
    render(SUGGEST_TOPICS_TEMPLATE, context! { history })
}

#[cfg(test)]
mod tests {
    use super::*;

    const CLOSING_LINE: &str = "You are now in a conversation. The history is below, followed by the user's latest message. Respond accordingly.";

    #[test]
    fn test_system_prompt_for_guest() {
        let prompt = system_prompt(None).unwrap();

        assert!(prompt.starts_with("You are Tesseract AI, a friendly, calm, and helpful AI assistant"));
        assert!(prompt.contains("8.  **ABOUT YOUR CREATOR**"));
        assert!(prompt.ends_with(CLOSING_LINE));
        assert!(!prompt.contains("named"));
    }

    #[test]
    fn test_system_prompt_names_user() {
        let prompt = system_prompt(Some("Asha")).unwrap();

        assert!(prompt.contains("The user you are talking to is named Asha."));
        assert!(prompt.ends_with(CLOSING_LINE));
        assert_eq!(system_prompt(Some("   ")).unwrap(), system_prompt(None).unwrap());
    }

    #[test]
    fn test_auto_name_prompt() {
        assert_eq!(
            auto_name_chat_prompt("Hello").unwrap(),
            "Summarize this chat message in 5 words or less to name the chat: Hello"
        );
    }

    #[test]
    fn test_enhance_prompt() {
        assert_eq!(
            enhance_user_query_prompt("rust lifetimes").unwrap(),
            "Improve the following user query to get more accurate answers from a chatbot: rust lifetimes"
        );
    }

    #[test]
    fn test_smart_title_embeds_json_history() {
        let prompt = smart_chat_title_prompt(&[Message::user("Hi"), Message::model("Hello!")]).unwrap();

        assert!(prompt.ends_with(
            r#"[{"role":"user","content":"Hi"},{"role":"model","content":"Hello!"}]"#
        ));
    }

    #[test]
    fn test_history_is_listed_by_role() {
        let history = [Message::user("What is Rust?"), Message::model("A language.")];

        let topics = suggest_topics_prompt(&history).unwrap();
        assert!(topics.contains("user: What is Rust?\nmodel: A language.\n"));
        assert!(topics.contains("three relevant topics"));

        let summary = summarize_chat_history_prompt(&history).unwrap();
        assert!(summary.contains("model: A language."));
        assert!(summary.ends_with("Summary:"));
    }

    #[test]
    fn test_topic_suggestions_shape() {
        let parsed: TopicSuggestions =
            serde_json::from_str(r#"{"topics":["Ownership","Traits","Async"]}"#).unwrap();
        assert_eq!(parsed.topics.len(), 3);
    }
}
