//! Bounded summaries of conversation content.

use crate::Message;

/// Upper bound on a stored summary, in characters.
pub const SUMMARY_MAX_CHARS: usize = 400;

/// Space-join the string contents of `messages` and truncate to
/// [`SUMMARY_MAX_CHARS`].
///
/// Non-string or absent content contributes nothing, not even a separator.
/// Truncation is not word-boundary aware.
#[must_use]
pub fn summarize(messages: &[Message]) -> String {
    let joined = messages
        .iter()
        .filter_map(|message| message.content.as_deref())
        .collect::<Vec<_>>()
        .join(" ");

    if joined.chars().count() <= SUMMARY_MAX_CHARS {
        joined
    } else {
        joined.chars().take(SUMMARY_MAX_CHARS).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn messages(contents: &[Option<&str>]) -> Vec<Message> {
        contents
            .iter()
            .map(|content| Message {
                content: content.map(str::to_string),
            })
            .collect()
    }

    #[test]
    fn joins_contents_with_single_space() {
        assert_eq!(summarize(&messages(&[Some("hi"), Some("bye")])), "hi bye");
    }

    #[test]
    fn missing_content_leaves_no_artifact() {
        assert_eq!(
            summarize(&messages(&[Some("hi"), None, Some("bye")])),
            "hi bye"
        );
    }

    #[test]
    fn empty_input_gives_empty_summary() {
        assert_eq!(summarize(&[]), "");
    }

    #[test]
    fn truncates_to_the_character_bound() {
        let long = "a".repeat(450);
        let summary = summarize(&messages(&[Some(&long)]));
        assert_eq!(summary.chars().count(), SUMMARY_MAX_CHARS);
    }

    #[test]
    fn truncation_counts_characters_not_bytes() {
        let long = "é".repeat(450);
        let summary = summarize(&messages(&[Some(&long)]));
        assert_eq!(summary.chars().count(), SUMMARY_MAX_CHARS);
        assert_eq!(summary, "é".repeat(SUMMARY_MAX_CHARS));
    }

    #[test]
    fn a_word_may_be_cut_mid_token() {
        let first = "x".repeat(398);
        let summary = summarize(&messages(&[Some(&first), Some("token")]));
        assert_eq!(summary.chars().count(), SUMMARY_MAX_CHARS);
        assert!(summary.ends_with("x t"));
    }
}
