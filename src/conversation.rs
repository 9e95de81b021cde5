//! The scripted three-question recommendation chat.
//!
//! A round asks for a use case, a budget and a specificity level, then
//! answers with up to three catalog matches and starts over.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::catalog::{match_models, Catalog, ModelRecord};

pub const GREETING: &str = "🤖 Hi! I'm your AI assistant. Describe your project needs and I'll recommend the best models!\n🎯 Example: \"I need to generate product images\"";
pub const BUDGET_PROMPT: &str = "💰 What's your budget preference?";
pub const SPECIFICITY_PROMPT: &str = "🎯 How specific are your requirements?";
pub const RECOMMENDATION_HEADER: &str = "🚀 Recommended Models:\n";

const BUDGET_OPTIONS: &[&str] = &["Free Tier", "Paid", "Enterprise"];
const SPECIFICITY_OPTIONS: &[&str] = &["General", "Specific"];

/// Which question the conversation is waiting on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    #[default]
    AwaitingUseCase,
    AwaitingBudget,
    AwaitingSpecificity,
}

impl Step {
    pub fn index(self) -> u8 {
        match self {
            Step::AwaitingUseCase => 0,
            Step::AwaitingBudget => 1,
            Step::AwaitingSpecificity => 2,
        }
    }

    /// Canned answers offered alongside the question for this step.
    pub fn quick_replies(self) -> &'static [&'static str] {
        match self {
            Step::AwaitingUseCase => &[],
            Step::AwaitingBudget => BUDGET_OPTIONS,
            Step::AwaitingSpecificity => SPECIFICITY_OPTIONS,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ConversationState {
    pub step: Step,
    pub use_case: String,
    pub budget: String,
    pub specificity: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatMessage {
    pub id: Uuid,
    pub content: String,
    pub is_user: bool,
    /// Rendered with the step's quick replies instead of as plain text.
    pub is_button_message: bool,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(content, true, false)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(content, false, false)
    }

    pub fn question(content: impl Into<String>) -> Self {
        Self::new(content, false, true)
    }

    fn new(content: impl Into<String>, is_user: bool, is_button_message: bool) -> Self {
        Self {
            id: Uuid::new_v4(),
            content: content.into(),
            is_user,
            is_button_message,
        }
    }
}

/// Applies one user answer to `state` and returns the chat entries it
/// produces, in order. Blank input changes nothing and yields no entries.
pub fn submit_answer(
    state: &mut ConversationState,
    catalog: &Catalog,
    text: &str,
) -> Vec<ChatMessage> {
    if text.trim().is_empty() {
        return Vec::new();
    }

    let mut entries = vec![ChatMessage::user(text)];
    match state.step {
        Step::AwaitingUseCase => {
            state.use_case = text.to_string();
            state.step = Step::AwaitingBudget;
            entries.push(ChatMessage::question(BUDGET_PROMPT));
        }
        Step::AwaitingBudget => {
            state.budget = text.to_string();
            state.step = Step::AwaitingSpecificity;
            entries.push(ChatMessage::question(SPECIFICITY_PROMPT));
        }
        Step::AwaitingSpecificity => {
            state.specificity = text.to_string();
            let matches = match_models(catalog, &state.use_case, &state.budget, &state.specificity);
            entries.push(ChatMessage::assistant(recommendation_text(&matches)));
            *state = ConversationState::default();
        }
    }
    entries
}

pub fn recommendation_text(models: &[&ModelRecord]) -> String {
    let mut content = RECOMMENDATION_HEADER.to_string();
    for model in models {
        content.push_str(&format!(
            "\n{} ({}) ⭐ {}",
            model.name, model.provider, model.rating
        ));
    }
    content
}

/// A conversation plus its append-only chat log.
#[derive(Debug, Clone)]
pub struct ChatSession {
    state: ConversationState,
    log: Vec<ChatMessage>,
}

impl Default for ChatSession {
    fn default() -> Self {
        Self::new()
    }
}

impl ChatSession {
    pub fn new() -> Self {
        Self {
            state: ConversationState::default(),
            log: vec![ChatMessage::assistant(GREETING)],
        }
    }

    /// Submits an answer and returns only the entries it appended.
    pub fn submit(&mut self, catalog: &Catalog, text: &str) -> &[ChatMessage] {
        let start = self.log.len();
        let entries = submit_answer(&mut self.state, catalog, text);
        self.log.extend(entries);
        &self.log[start..]
    }

    pub fn state(&self) -> &ConversationState {
        &self.state
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.log
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::tests::BUNDLED;

    fn catalog() -> Catalog {
        Catalog::from_json_str(BUNDLED).unwrap()
    }

    #[test]
    fn blank_input_is_ignored() {
        let catalog = catalog();
        let mut state = ConversationState::default();
        assert!(submit_answer(&mut state, &catalog, "").is_empty());
        assert!(submit_answer(&mut state, &catalog, "   ").is_empty());
        assert_eq!(state, ConversationState::default());

        let mut session = ChatSession::new();
        assert!(session.submit(&catalog, "").is_empty());
        assert_eq!(session.messages().len(), 1);
    }

    #[test]
    fn first_answers_ask_follow_up_questions() {
        let catalog = catalog();
        let mut state = ConversationState::default();

        let entries = submit_answer(&mut state, &catalog, "Image Generation");
        assert_eq!(entries.len(), 2);
        assert!(entries[0].is_user);
        assert_eq!(entries[0].content, "Image Generation");
        assert_eq!(entries[1].content, BUDGET_PROMPT);
        assert!(entries[1].is_button_message);
        assert_eq!(state.step, Step::AwaitingBudget);
        assert_eq!(state.use_case, "Image Generation");
        assert_eq!(state.step.quick_replies(), &["Free Tier", "Paid", "Enterprise"]);

        let entries = submit_answer(&mut state, &catalog, "Paid");
        assert_eq!(entries[1].content, SPECIFICITY_PROMPT);
        assert!(entries[1].is_button_message);
        assert_eq!(state.step, Step::AwaitingSpecificity);
        assert_eq!(state.budget, "Paid");
        assert_eq!(state.step.quick_replies(), &["General", "Specific"]);
    }

    #[test]
    fn full_round_recommends_once_and_resets() {
        let catalog = catalog();
        let mut session = ChatSession::new();

        session.submit(&catalog, "Image Generation");
        session.submit(&catalog, "Paid");
        let last = session.submit(&catalog, "Specific").to_vec();

        assert_eq!(last.len(), 2);
        assert!(!last[1].is_user);
        assert!(!last[1].is_button_message);
        assert!(last[1].content.starts_with(RECOMMENDATION_HEADER));
        assert_eq!(session.state(), &ConversationState::default());
        assert_eq!(session.state().step.index(), 0);

        let recommendations = session
            .messages()
            .iter()
            .filter(|m| m.content.starts_with(RECOMMENDATION_HEADER))
            .count();
        assert_eq!(recommendations, 1);
        assert_eq!(session.messages().len(), 7);
    }

    #[test]
    fn recommendation_lists_matches() {
        let catalog = catalog();
        let mut state = ConversationState::default();
        submit_answer(&mut state, &catalog, "Art Creation");
        submit_answer(&mut state, &catalog, "Paid");
        let entries = submit_answer(&mut state, &catalog, "Specific");

        assert_eq!(
            entries[1].content,
            "🚀 Recommended Models:\n\nDALL-E 3 (OpenAI) ⭐ 4.9"
        );
    }

    #[test]
    fn empty_recommendation_keeps_header() {
        assert_eq!(recommendation_text(&[]), RECOMMENDATION_HEADER);
    }

    #[test]
    fn log_keeps_insertion_order() {
        let catalog = catalog();
        let mut session = ChatSession::new();
        session.submit(&catalog, "Chatbots");
        session.submit(&catalog, "Paid");

        let contents: Vec<&str> = session.messages().iter().map(|m| m.content.as_str()).collect();
        assert_eq!(
            contents,
            vec![GREETING, "Chatbots", BUDGET_PROMPT, "Paid", SPECIFICITY_PROMPT]
        );
    }
}
