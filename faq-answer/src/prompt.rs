//! Prompt builder: persona, prior conversation, the FAQ pair, and the ask.

use ai_llm_service::chat_message::ChatMessage;

use crate::api_types::ConversationTurn;

/// Default persona for the COVID-19 FAQ deployment.
pub const DEFAULT_SYSTEM: &str =
    "You are an AI assistant providing concise and accurate COVID-19 information.";

/// Final instruction sent after the FAQ pair.
pub const IMPROVE_INSTRUCTION: &str =
    "Can you improve and summarize this response to directly address the question?";

/// Renders history as `Q: ..\nA: ..` blocks, oldest first.
///
/// With `limit = Some(n)` only the `n` most recent turns are kept.
pub fn render_history(history: &[ConversationTurn], limit: Option<usize>) -> String {
    let skip = limit.map_or(0, |n| history.len().saturating_sub(n));
    history
        .iter()
        .skip(skip)
        .map(|t| format!("Q: {}\nA: {}", t.question, t.answer))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Builds the ordered message list for one enhancement call.
///
/// The history message is left out when there is nothing to show.
pub fn build_messages(
    system: &str,
    question: &str,
    answer: &str,
    history: &[ConversationTurn],
    history_limit: Option<usize>,
) -> Vec<ChatMessage> {
    let mut msgs = Vec::with_capacity(4);
    msgs.push(ChatMessage::system(system));

    let rendered = render_history(history, history_limit);
    if !rendered.is_empty() {
        msgs.push(ChatMessage::user(format!("Previous Conversation:\n{rendered}")));
    }

    msgs.push(ChatMessage::user(format!(
        "New Question: {question}\nAnswer: {answer}"
    )));
    msgs.push(ChatMessage::user(IMPROVE_INSTRUCTION));
    msgs
}

#[cfg(test)]
mod tests {
    use ai_llm_service::chat_message::ChatRole;

    use super::*;

    fn turn(q: &str, a: &str) -> ConversationTurn {
        ConversationTurn {
            question: q.into(),
            answer: a.into(),
        }
    }

    #[test]
    fn four_messages_with_history() {
        let h = vec![turn("Hi?", "Hello."), turn("Masks?", "Yes.")];
        let msgs = build_messages(DEFAULT_SYSTEM, "What is COVID-19?", "A virus.", &h, None);
        assert_eq!(msgs.len(), 4);
        assert_eq!(msgs[0].role, ChatRole::System);
        assert_eq!(
            msgs[1].content,
            "Previous Conversation:\nQ: Hi?\nA: Hello.\nQ: Masks?\nA: Yes."
        );
        assert_eq!(msgs[2].content, "New Question: What is COVID-19?\nAnswer: A virus.");
        assert_eq!(msgs[3].content, IMPROVE_INSTRUCTION);
        assert!(msgs[1..].iter().all(|m| m.role == ChatRole::User));
    }

    #[test]
    fn empty_history_is_omitted() {
        let msgs = build_messages("sys", "q", "a", &[], None);
        assert_eq!(msgs.len(), 3);
        assert!(!msgs.iter().any(|m| m.content.starts_with("Previous Conversation")));
    }

    #[test]
    fn limit_keeps_most_recent_turns() {
        let h = vec![turn("1", "a"), turn("2", "b"), turn("3", "c")];
        assert_eq!(render_history(&h, Some(2)), "Q: 2\nA: b\nQ: 3\nA: c");
        assert_eq!(render_history(&h, Some(0)), "");
        assert_eq!(render_history(&h, Some(10)).lines().count(), 6);
    }
}
