use crate::error::ApiError;
use chatbot_shared::{ChatMessage, MessageRole};

const BAD_TAIL: &str = "Conversation must end with a user message.";

/// Splits an ordered conversation into (history, current user turn).
///
/// The history is every message except the final user turn; the current turn
/// is that final message's content. When the conversation ends in a non-user
/// message (e.g. the client echoed the assistant's last reply back), a single
/// corrective step recovers the user turn immediately before the echo.
/// That fallback may mask caller bugs but is kept for compatibility with
/// existing clients.
///
/// The input is never mutated; new structures are returned.
pub fn split_conversation(
    messages: &[ChatMessage],
) -> Result<(Vec<ChatMessage>, String), ApiError> {
    let Some(last) = messages.last() else {
        return Err(ApiError::Validation(BAD_TAIL.to_string()));
    };

    if last.role == MessageRole::User {
        let history = messages[..messages.len() - 1].to_vec();
        return Ok((history, last.content.clone()));
    }

    // Trailing non-user echo: reuse the user turn right before it, if any.
    let mut history = messages.to_vec();
    let n = history.len();
    if n >= 2 && history[n - 2].role == MessageRole::User {
        let turn = history.remove(n - 2);
        Ok((history, turn.content))
    } else {
        Err(ApiError::Validation(BAD_TAIL.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn msg(role: MessageRole, content: &str) -> ChatMessage {
        ChatMessage {
            role,
            content: content.to_string(),
        }
    }

    #[test]
    fn last_user_turn_becomes_current_turn() {
        let messages = vec![
            msg(MessageRole::User, "first"),
            msg(MessageRole::Assistant, "reply"),
            msg(MessageRole::User, "second"),
        ];
        let (history, turn) = split_conversation(&messages).unwrap();
        assert_eq!(turn, "second");
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].content, "first");
        assert_eq!(history[1].content, "reply");
    }

    #[test]
    fn single_user_message_has_empty_history() {
        let messages = vec![msg(MessageRole::User, "Hi")];
        let (history, turn) = split_conversation(&messages).unwrap();
        assert!(history.is_empty());
        assert_eq!(turn, "Hi");
    }

    #[test]
    fn empty_conversation_is_rejected() {
        let err = split_conversation(&[]).unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));
        assert!(err.detail().contains("must end with a user message"));
    }

    #[test]
    fn trailing_assistant_echo_recovers_previous_user_turn() {
        let messages = vec![
            msg(MessageRole::User, "question"),
            msg(MessageRole::Assistant, "echoed answer"),
        ];
        let (history, turn) = split_conversation(&messages).unwrap();
        assert_eq!(turn, "question");
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].role, MessageRole::Assistant);
    }

    #[test]
    fn unrecoverable_non_user_tail_is_rejected() {
        let only_assistant = vec![msg(MessageRole::Assistant, "hello")];
        assert!(split_conversation(&only_assistant).is_err());

        let two_assistants = vec![
            msg(MessageRole::Assistant, "a"),
            msg(MessageRole::Assistant, "b"),
        ];
        assert!(split_conversation(&two_assistants).is_err());

        let system_tail = vec![
            msg(MessageRole::Assistant, "a"),
            msg(MessageRole::System, "s"),
        ];
        assert!(split_conversation(&system_tail).is_err());
    }

    #[test]
    fn input_is_not_mutated() {
        let messages = vec![
            msg(MessageRole::User, "one"),
            msg(MessageRole::User, "two"),
        ];
        let _ = split_conversation(&messages).unwrap();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[1].content, "two");
    }
}
