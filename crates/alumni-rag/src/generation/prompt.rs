//! Prompt templates for alumni question answering

use crate::index::ScoredDocument;
use crate::providers::llm::ChatMessage;
use crate::types::{ChatTurn, TurnType};

/// Fixed system instruction for every answer
pub const SYSTEM_INSTRUCTION: &str = "You are an AI assistant for an Alumni Management System. \
You help answer questions about alumni based on the available data.

Guidelines:
- Provide accurate information based only on the provided alumni data
- Be helpful and conversational
- If information is not available, clearly state that
- Format responses in a clear and readable manner
- When listing multiple alumni, organize the information clearly";

/// Prompt builder for alumni queries
pub struct PromptBuilder;

impl PromptBuilder {
    /// Join retrieved projections into the grounding block
    pub fn build_context(documents: &[ScoredDocument]) -> String {
        documents
            .iter()
            .map(|doc| doc.text.as_str())
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    /// Human message carrying the question and the grounding data
    pub fn build_question(question: &str, context: &str) -> String {
        format!(
            r#"Question: {question}

Alumni Data:
{context}

Please answer the question based on the alumni data provided above."#,
            question = question,
            context = context
        )
    }

    /// Full message list: system instruction, prior turns, then the grounded question
    pub fn build_messages(
        question: &str,
        documents: &[ScoredDocument],
        history: &[ChatTurn],
    ) -> Vec<ChatMessage> {
        let mut messages = Vec::with_capacity(history.len() + 2);
        messages.push(ChatMessage::system(SYSTEM_INSTRUCTION));

        for turn in history {
            messages.push(match turn.turn_type {
                TurnType::Human => ChatMessage::user(turn.content.clone()),
                TurnType::Ai => ChatMessage::assistant(turn.content.clone()),
            });
        }

        let context = Self::build_context(documents);
        messages.push(ChatMessage::user(Self::build_question(question, &context)));
        messages
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::llm::ChatRole;

    fn doc(text: &str) -> ScoredDocument {
        ScoredDocument {
            text: text.to_string(),
            score: 1.0,
        }
    }

    #[test]
    fn test_messages_include_history_in_order() {
        let history = vec![
            ChatTurn::human("Who works at Google?"),
            ChatTurn::ai("Arjun Sharma works at Google."),
        ];
        let docs = vec![doc("Name: Arjun Sharma, Company: Google")];

        let messages = PromptBuilder::build_messages("What are his skills?", &docs, &history);

        assert_eq!(messages.len(), 4);
        assert_eq!(messages[0].role, ChatRole::System);
        assert_eq!(messages[1].role, ChatRole::User);
        assert_eq!(messages[1].content, "Who works at Google?");
        assert_eq!(messages[2].role, ChatRole::Assistant);
        assert!(messages[3].content.starts_with("Question: What are his skills?"));
        assert!(messages[3].content.contains("Name: Arjun Sharma, Company: Google"));
    }

    #[test]
    fn test_context_separates_documents() {
        let context = PromptBuilder::build_context(&[doc("A"), doc("B")]);
        assert_eq!(context, "A\n\nB");
    }
}
