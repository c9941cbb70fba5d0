// OpenAI messages → single Copilot prompt
use super::models::*;

use serde_json::Value;

pub const MESSAGE_SEPARATOR: &str = "\n\n---\n\n";

/// Flattens the conversation into `ROLE:\ncontent` blocks, in order.
pub fn messages_to_prompt(messages: &[ChatMessage]) -> String {
    messages
        .iter()
        .map(|m| format!("{}:\n{}", m.role().to_uppercase(), m.text()).trim().to_string())
        .collect::<Vec<_>>()
        .join(MESSAGE_SEPARATOR)
}

/// Same as `messages_to_prompt` over raw JSON; anything but an array gives `""`.
pub fn messages_value_to_prompt(messages: &Value) -> String {
    match messages {
        Value::Array(items) => {
            let parsed: Vec<ChatMessage> = items.iter().map(ChatMessage::from_value).collect();
            messages_to_prompt(&parsed)
        }
        _ => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_empty_input() {
        assert_eq!(messages_to_prompt(&[]), "");
        assert_eq!(messages_value_to_prompt(&json!([])), "");
        assert_eq!(messages_value_to_prompt(&json!(null)), "");
        assert_eq!(messages_value_to_prompt(&json!({"role": "user"})), "");
        assert_eq!(messages_value_to_prompt(&json!("hello")), "");
    }

    #[test]
    fn test_roles_are_uppercased_and_joined() {
        let prompt = messages_value_to_prompt(&json!([
            {"role": "system", "content": "Be terse."},
            {"role": "user", "content": "What is Rust?"},
            {"role": "assistant", "content": "A language."},
        ]));
        assert_eq!(
            prompt,
            "SYSTEM:\nBe terse.\n\n---\n\nUSER:\nWhat is Rust?\n\n---\n\nASSISTANT:\nA language."
        );
    }

    #[test]
    fn test_missing_role_defaults_to_user() {
        assert_eq!(messages_value_to_prompt(&json!([{"content": "hi"}])), "USER:\nhi");
    }

    #[test]
    fn test_each_block_is_trimmed() {
        let prompt = messages_value_to_prompt(&json!([
            {"role": "user", "content": "  padded  \n"},
            {"role": "assistant"},
        ]));
        assert_eq!(prompt, "USER:\n  padded\n\n---\n\nASSISTANT:");
    }

    #[test]
    fn test_non_string_role_keeps_content() {
        assert_eq!(
            messages_value_to_prompt(&json!([{"role": 5, "content": "keep me"}])),
            "5:\nkeep me"
        );
    }

    #[test]
    fn test_no_escaping() {
        let prompt = messages_value_to_prompt(&json!([{"role": "user", "content": "a\n\n---\n\nb"}]));
        assert_eq!(prompt, "USER:\na\n\n---\n\nb");
    }
}
