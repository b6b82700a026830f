use std::sync::{Arc, LazyLock};
use std::time::Duration;

use regex::Regex;
use tracing::warn;

use crate::application::ports::generation_provider::{
    GenerationProvider, GenerationProviderError, GenerationRequest,
};
use crate::domain::entities::{ConversationTurn, Prompt, PromptTurn, TurnRole};

pub const DEFAULT_TITLE: &str = "New Conversation";
const MAX_TITLE_WORDS: usize = 6;
const MAX_TITLE_CHARS: usize = 80;

const CONTEXT_INSTRUCTION: &str = "You are a helpful assistant answering questions about the user's uploaded documents. \
Use the context below to answer the user's latest message. \
If the context does not contain the answer or is not relevant to the question, say so briefly and then answer from your general knowledge.";

const NO_CONTEXT_INSTRUCTION: &str = "You are a helpful assistant answering questions about the user's uploaded documents. \
No relevant context was found in the documents for this message. \
Tell the user that nothing relevant was found in their documents, then answer from your general knowledge.";

/// Everything except letters, digits, whitespace, apostrophes and hyphens.
static TITLE_PUNCTUATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[^\p{L}\p{N}\s'’-]").expect("title punctuation pattern is valid")
});

#[derive(Debug)]
pub enum ComposerError {
    ProviderUnavailable(String),
    ProviderRejected(String),
    EmptyResponse,
}

impl std::fmt::Display for ComposerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ComposerError::ProviderUnavailable(msg) => {
                write!(f, "Generation provider unavailable: {}", msg)
            }
            ComposerError::ProviderRejected(msg) => {
                write!(f, "Generation provider rejected request: {}", msg)
            }
            ComposerError::EmptyResponse => write!(f, "Generation provider returned no text"),
        }
    }
}

impl std::error::Error for ComposerError {}

impl From<GenerationProviderError> for ComposerError {
    fn from(error: GenerationProviderError) -> Self {
        if error.is_transient() {
            ComposerError::ProviderUnavailable(error.to_string())
        } else {
            ComposerError::ProviderRejected(error.to_string())
        }
    }
}

pub struct ConversationComposer {
    generation_provider: Arc<dyn GenerationProvider>,
    request_timeout: Duration,
}

impl ConversationComposer {
    pub fn new(generation_provider: Arc<dyn GenerationProvider>, request_timeout: Duration) -> Self {
        Self {
            generation_provider,
            request_timeout,
        }
    }

    /// Builds the prompt for the next answer: an instruction frame (which
    /// carries the context when there is any), the prior turns in order, and
    /// the new user message last.
    pub fn compose(user_message: &str, context: &str, history: &[ConversationTurn]) -> Prompt {
        let system_instruction = if context.trim().is_empty() {
            NO_CONTEXT_INSTRUCTION.to_string()
        } else {
            format!("{}\n\nContext:\n{}", CONTEXT_INSTRUCTION, context)
        };

        let mut turns: Vec<PromptTurn> = history
            .iter()
            .map(|turn| PromptTurn {
                role: turn.role(),
                text: turn.text().to_string(),
            })
            .collect();
        turns.push(PromptTurn {
            role: TurnRole::User,
            text: user_message.to_string(),
        });

        Prompt {
            system_instruction: Some(system_instruction),
            turns,
        }
    }

    pub async fn generate_answer(&self, prompt: Prompt) -> Result<String, ComposerError> {
        let text = self.generate(prompt).await?;
        if text.trim().is_empty() {
            return Err(ComposerError::EmptyResponse);
        }
        Ok(text)
    }

    /// A short title for a conversation opened with `seed`. Never fails: any
    /// provider error or unusable output falls back to the default title.
    pub async fn title_for(&self, seed: &str) -> String {
        if seed.trim().is_empty() {
            return DEFAULT_TITLE.to_string();
        }

        let prompt = Prompt::single_turn(format!(
            "You are naming a chat conversation based on the user's first message.\n\
             Return ONLY the title text, no quotes, no punctuation at the end, \
             maximum {} words, concise and descriptive.\n\
             User message: {}",
            MAX_TITLE_WORDS, seed
        ));

        match self.generate(prompt).await {
            Ok(raw) => sanitize_title(&raw),
            Err(e) => {
                warn!(error = %e, "Title generation failed, using default title");
                DEFAULT_TITLE.to_string()
            }
        }
    }

    async fn generate(&self, prompt: Prompt) -> Result<String, ComposerError> {
        let response = tokio::time::timeout(
            self.request_timeout,
            self.generation_provider.generate(GenerationRequest::new(prompt)),
        )
        .await
        .map_err(|_| {
            ComposerError::ProviderUnavailable(format!(
                "generation timed out after {:?}",
                self.request_timeout
            ))
        })??;

        Ok(response.text)
    }
}

/// Strips quotes and punctuation, keeps at most six words and 80 characters.
/// Apostrophes and hyphens survive only inside a word ("don't", "self-hosted").
pub fn sanitize_title(raw: &str) -> String {
    let first_line = raw.lines().find(|line| !line.trim().is_empty()).unwrap_or("");
    let cleaned = TITLE_PUNCTUATION.replace_all(first_line, " ");
    let words: Vec<&str> = cleaned
        .split_whitespace()
        .map(|word| word.trim_matches(is_word_joiner))
        .filter(|word| !word.is_empty())
        .take(MAX_TITLE_WORDS)
        .collect();
    let joined: String = words.join(" ").chars().take(MAX_TITLE_CHARS).collect();
    let title = joined
        .trim_end_matches(|c: char| is_word_joiner(c) || c.is_whitespace())
        .to_string();

    if title.is_empty() {
        DEFAULT_TITLE.to_string()
    } else {
        title
    }
}

fn is_word_joiner(c: char) -> bool {
    matches!(c, '\'' | '’' | '-')
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::FakeGenerationProvider;

    fn composer(provider: Arc<FakeGenerationProvider>) -> ConversationComposer {
        ConversationComposer::new(provider, Duration::from_secs(5))
    }

    #[test]
    fn test_compose_with_context() {
        let history = vec![
            ConversationTurn::user("What is in chapter one?"),
            ConversationTurn::assistant("Chapter one covers ownership."),
        ];

        let prompt = ConversationComposer::compose("And chapter two?", "Chapter two: borrowing.", &history);

        let instruction = prompt.system_instruction.as_deref().unwrap();
        assert!(instruction.contains("Chapter two: borrowing."));
        assert!(instruction.contains("general knowledge"));

        let roles: Vec<TurnRole> = prompt.turns.iter().map(|t| t.role).collect();
        assert_eq!(roles, vec![TurnRole::User, TurnRole::Assistant, TurnRole::User]);
        assert_eq!(prompt.turns[0].text, "What is in chapter one?");
        assert_eq!(prompt.last_turn().unwrap().text, "And chapter two?");
    }

    #[test]
    fn test_compose_without_context() {
        let prompt = ConversationComposer::compose("Hello", "   ", &[]);

        let instruction = prompt.system_instruction.as_deref().unwrap();
        assert!(instruction.contains("No relevant context"));
        assert!(instruction.contains("general knowledge"));
        assert_eq!(prompt.turns.len(), 1);
    }

    #[test]
    fn test_sanitize_title() {
        assert_eq!(sanitize_title("\"Rust Ownership Basics.\""), "Rust Ownership Basics");
        assert_eq!(
            sanitize_title("One two three four five six seven eight"),
            "One two three four five six"
        );
        assert_eq!(sanitize_title("  \n**Budget Review**!\nextra line"), "Budget Review");
        assert_eq!(
            sanitize_title("Rust: Ownership, Borrowing & Lifetimes!"),
            "Rust Ownership Borrowing Lifetimes"
        );
        assert_eq!(
            sanitize_title("Don't Panic: Self-Hosted RAG"),
            "Don't Panic Self-Hosted RAG"
        );
        assert_eq!(sanitize_title("'Quoted' -- title"), "Quoted title");
        assert_eq!(sanitize_title("\"\""), DEFAULT_TITLE);
        assert_eq!(sanitize_title(""), DEFAULT_TITLE);

        let long_word = "x".repeat(200);
        assert_eq!(sanitize_title(&long_word).chars().count(), 80);
    }

    #[tokio::test]
    async fn test_title_for_uses_provider_output() {
        let provider = Arc::new(FakeGenerationProvider::new().with_reply("\"Quarterly Sales Summary\""));
        let title = composer(provider.clone()).title_for("Summarize our Q3 sales deck").await;

        assert_eq!(title, "Quarterly Sales Summary");
        let prompts = provider.recorded_prompts();
        assert!(prompts[0].last_turn().unwrap().text.contains("Summarize our Q3 sales deck"));
    }

    #[tokio::test]
    async fn test_title_falls_back() {
        let provider = Arc::new(FakeGenerationProvider::new().with_reply("   "));
        assert_eq!(composer(provider).title_for("hello").await, DEFAULT_TITLE);

        let failing = Arc::new(FakeGenerationProvider::new().failing());
        assert_eq!(composer(failing).title_for("hello").await, DEFAULT_TITLE);

        let untouched = Arc::new(FakeGenerationProvider::new());
        assert_eq!(composer(untouched.clone()).title_for("  ").await, DEFAULT_TITLE);
        assert!(untouched.recorded_prompts().is_empty());
    }

    #[tokio::test]
    async fn test_generate_answer_errors() {
        let failing = Arc::new(FakeGenerationProvider::new().failing());
        let error = composer(failing)
            .generate_answer(Prompt::single_turn("hi"))
            .await
            .unwrap_err();
        assert!(matches!(error, ComposerError::ProviderUnavailable(_)));

        let empty = Arc::new(FakeGenerationProvider::new().with_reply(""));
        assert!(matches!(
            composer(empty).generate_answer(Prompt::single_turn("hi")).await,
            Err(ComposerError::EmptyResponse)
        ));
    }
}
