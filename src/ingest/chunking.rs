//! Recursive, overlap-aware text splitting.
//!
//! Text is split on the first separator (in priority order) that occurs in
//! it; pieces that are still too long are split again with the remaining
//! separators. Small pieces are then merged back into chunks of at most
//! `chunk_size` characters, carrying up to `chunk_overlap` characters of
//! trailing pieces into the next chunk. Separators stay attached to the
//! start of the piece that follows them. Lengths are counted in `char`s, so
//! Bengali text is never cut inside a code point.

/// Paragraph, line, Bengali danda, sentence punctuation, word, character.
pub const DEFAULT_SEPARATORS: [&str; 8] = ["\n\n", "\n", "।", ".", "?", "!", " ", ""];

#[derive(Debug, Clone)]
pub struct RecursiveTextSplitter {
    chunk_size: usize,
    chunk_overlap: usize,
    separators: Vec<String>,
}

impl RecursiveTextSplitter {
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Self {
        Self {
            chunk_size: chunk_size.max(1),
            chunk_overlap: chunk_overlap.min(chunk_size.saturating_sub(1)),
            separators: DEFAULT_SEPARATORS.iter().map(|s| s.to_string()).collect(),
        }
    }

    pub fn chunk_overlap(&self) -> usize {
        self.chunk_overlap
    }

    pub fn split_text(&self, text: &str) -> Vec<String> {
        self.split_recursive(text, &self.separators)
    }

    fn split_recursive(&self, text: &str, separators: &[String]) -> Vec<String> {
        let mut separator = separators.last().map(String::as_str).unwrap_or("");
        let mut remaining: &[String] = &[];
        for (i, candidate) in separators.iter().enumerate() {
            if candidate.is_empty() {
                separator = "";
                break;
            }
            if text.contains(candidate.as_str()) {
                separator = candidate;
                remaining = &separators[i + 1..];
                break;
            }
        }

        let mut chunks = Vec::new();
        let mut small: Vec<&str> = Vec::new();
        for piece in split_keeping_separator(text, separator) {
            if char_len(piece) < self.chunk_size {
                small.push(piece);
                continue;
            }
            if !small.is_empty() {
                chunks.extend(self.merge_pieces(&small));
                small.clear();
            }
            if remaining.is_empty() {
                chunks.push(piece.to_string());
            } else {
                chunks.extend(self.split_recursive(piece, remaining));
            }
        }
        if !small.is_empty() {
            chunks.extend(self.merge_pieces(&small));
        }
        chunks
    }

    /// Greedily packs pieces into chunks, keeping a tail of up to
    /// `chunk_overlap` characters as the head of the next chunk.
    fn merge_pieces(&self, pieces: &[&str]) -> Vec<String> {
        let mut chunks = Vec::new();
        let mut window: Vec<(&str, usize)> = Vec::new();
        let mut total = 0usize;

        for &piece in pieces {
            let len = char_len(piece);
            if total + len > self.chunk_size && !window.is_empty() {
                push_trimmed(&mut chunks, &window);
                while !window.is_empty()
                    && (total > self.chunk_overlap || total + len > self.chunk_size)
                {
                    let (_, first_len) = window.remove(0);
                    total -= first_len;
                }
            }
            window.push((piece, len));
            total += len;
        }
        push_trimmed(&mut chunks, &window);
        chunks
    }
}

impl Default for RecursiveTextSplitter {
    fn default() -> Self {
        Self::new(1000, 200)
    }
}

fn push_trimmed(chunks: &mut Vec<String>, window: &[(&str, usize)]) {
    let joined: String = window.iter().map(|(piece, _)| *piece).collect();
    let trimmed = joined.trim();
    if !trimmed.is_empty() {
        chunks.push(trimmed.to_string());
    }
}

fn char_len(text: &str) -> usize {
    text.chars().count()
}

/// Splits before every occurrence of `separator`; an empty separator splits into chars.
fn split_keeping_separator<'a>(text: &'a str, separator: &str) -> Vec<&'a str> {
    if separator.is_empty() {
        return text
            .char_indices()
            .map(|(i, c)| &text[i..i + c.len_utf8()])
            .collect();
    }

    let mut pieces = Vec::new();
    let mut start = 0;
    for (pos, _) in text.match_indices(separator) {
        if pos > start {
            pieces.push(&text[start..pos]);
        }
        start = pos;
    }
    if start < text.len() {
        pieces.push(&text[start..]);
    }
    pieces
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_text_has_no_chunks() {
        assert!(RecursiveTextSplitter::default().split_text("").is_empty());
        assert!(RecursiveTextSplitter::default().split_text("  \n\n ").is_empty());
    }

    #[test]
    fn short_text_is_one_chunk() {
        let chunks = RecursiveTextSplitter::new(100, 20).split_text("  A short paragraph.  ");
        assert_eq!(chunks, vec!["A short paragraph.".to_string()]);
    }

    #[test]
    fn separators_attach_to_following_piece() {
        assert_eq!(split_keeping_separator("a।b।c", "।"), vec!["a", "।b", "।c"]);
        assert_eq!(split_keeping_separator("।a", "।"), vec!["।a"]);
        assert_eq!(split_keeping_separator("অন", ""), vec!["অ", "ন"]);
    }

    #[test]
    fn chunks_never_exceed_size_in_chars() {
        let text = "অনুপমের বয়স সাতাশ বছর। তার মামা সংসারের কর্তা। ".repeat(60);
        let splitter = RecursiveTextSplitter::new(120, 30);
        let chunks = splitter.split_text(&text);

        assert!(chunks.len() > 1);
        for chunk in &chunks {
            assert!(chunk.chars().count() <= 120, "chunk too long: {}", chunk.chars().count());
        }
    }

    #[test]
    fn paragraphs_are_preferred_boundaries() {
        let first = "First paragraph sentence one. Sentence two.";
        let second = "Second paragraph is here. It also has two sentences.";
        let text = format!("{first}\n\n{second}");
        let chunks = RecursiveTextSplitter::new(60, 10).split_text(&text);

        assert_eq!(chunks, vec![first.to_string(), second.to_string()]);
    }

    #[test]
    fn consecutive_chunks_overlap() {
        let text = (0..40)
            .map(|i| format!("word{i:02}"))
            .collect::<Vec<_>>()
            .join(" ");
        let chunks = RecursiveTextSplitter::new(50, 20).split_text(&text);

        assert!(chunks.len() > 2);
        for pair in chunks.windows(2) {
            let last_word = pair[0].rsplit(' ').next().unwrap();
            assert!(
                pair[1].contains(last_word),
                "expected '{}' to reappear in '{}'",
                last_word,
                pair[1]
            );
        }
    }

    #[test]
    fn unbroken_text_falls_back_to_characters() {
        let text = "ক".repeat(25);
        let chunks = RecursiveTextSplitter::new(10, 0).split_text(&text);
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0].chars().count(), 10);
        assert_eq!(chunks[2].chars().count(), 5);
    }

    #[test]
    fn overlap_is_clamped_below_size() {
        let splitter = RecursiveTextSplitter::new(10, 50);
        assert_eq!(splitter.chunk_overlap(), 9);
    }
}
