//! Email resolution for a conversation.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::Conversation;

/// Case-insensitive `local@domain.tld`; the domain needs at least one dot
/// and a final label of two or more letters.
#[expect(clippy::unwrap_used, reason = "the pattern is a fixed literal")]
static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)[a-z0-9._%+-]+@[a-z0-9.-]+\.[a-z]{2,}").unwrap());

/// Resolve the email to attribute a conversation to.
///
/// The explicit metadata email wins when present. Otherwise message
/// contents are scanned in order and the first match is taken; scanning
/// stops there. Returns `None` when neither path yields an address.
#[must_use]
pub fn resolve_email(conversation: &Conversation) -> Option<String> {
    if let Some(email) = &conversation.email {
        if !email.trim().is_empty() {
            return Some(email.clone());
        }
    }

    conversation
        .messages
        .iter()
        .filter_map(|message| message.content.as_deref())
        .find_map(|content| EMAIL_RE.find(content).map(|m| m.as_str().to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Message;

    fn conversation(email: Option<&str>, contents: &[Option<&str>]) -> Conversation {
        Conversation {
            id: "c1".to_string(),
            email: email.map(str::to_string),
            messages: contents
                .iter()
                .map(|content| Message {
                    content: content.map(str::to_string),
                })
                .collect(),
        }
    }

    #[test]
    fn metadata_email_wins_over_message_text() {
        let convo = conversation(Some("a@x.com"), &[Some("reach me at b@y.com")]);
        assert_eq!(resolve_email(&convo), Some("a@x.com".to_string()));
    }

    #[test]
    fn blank_metadata_email_falls_back_to_messages() {
        let convo = conversation(Some("  "), &[Some("reach me at b@y.com please")]);
        assert_eq!(resolve_email(&convo), Some("b@y.com".to_string()));
    }

    #[test]
    fn first_match_in_message_order_wins() {
        let convo = conversation(
            None,
            &[
                Some("no address here"),
                Some("write first@one.com or second@two.com"),
                Some("third@three.com"),
            ],
        );
        assert_eq!(resolve_email(&convo), Some("first@one.com".to_string()));
    }

    #[test]
    fn missing_content_is_tolerated() {
        let convo = conversation(None, &[None, Some("ping c@d.org")]);
        assert_eq!(resolve_email(&convo), Some("c@d.org".to_string()));
    }

    #[test]
    fn matching_is_case_insensitive_and_preserves_case() {
        let convo = conversation(None, &[Some("Mail Bob.Smith@Example.COM today")]);
        assert_eq!(
            resolve_email(&convo),
            Some("Bob.Smith@Example.COM".to_string())
        );
    }

    #[test]
    fn domain_needs_a_dot_and_real_final_label() {
        assert_eq!(resolve_email(&conversation(None, &[Some("x@localhost")])), None);
        assert_eq!(resolve_email(&conversation(None, &[Some("x@a.b")])), None);
        assert!(resolve_email(&conversation(None, &[Some("x@a.io")])).is_some());
    }

    #[test]
    fn none_when_no_email_anywhere() {
        let convo = conversation(None, &[Some("hello"), Some("bye")]);
        assert_eq!(resolve_email(&convo), None);
    }
}
