//! Prompt context assembly.
//!
//! - `join_passages`: concatenates the leading retrieved passages
//! - `prompt`: locale-specific instruction templates

pub mod prompt;

pub use prompt::{build_prompt, not_found_sentinel};

pub const PASSAGE_SEPARATOR: &str = "\n\n";

/// Joins at most `limit` passages, in retrieval order, with a blank line between them.
pub fn join_passages<S: AsRef<str>>(passages: &[S], limit: usize) -> String {
    passages
        .iter()
        .take(limit)
        .map(AsRef::as_ref)
        .collect::<Vec<_>>()
        .join(PASSAGE_SEPARATOR)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn joins_only_leading_passages() {
        let passages = ["first", "second", "third"];
        assert_eq!(join_passages(&passages, 2), "first\n\nsecond");
    }

    #[test]
    fn single_passage_has_no_separator() {
        assert_eq!(join_passages(&["only"], 2), "only");
    }

    #[test]
    fn no_passages_yield_empty_context() {
        let passages: [&str; 0] = [];
        assert_eq!(join_passages(&passages, 2), "");
    }
}
