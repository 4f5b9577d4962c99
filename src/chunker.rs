use std::sync::LazyLock;

use anyhow::{Result, bail};
use regex::Regex;

use crate::model::PageText;

static SENTENCE_BOUNDARY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[.!?]\s+").expect("sentence boundary regex compiles"));

#[derive(Debug, Clone, Copy)]
pub struct ChunkConfig {
    pub chunk_size: usize,
    pub chunk_overlap: usize,
}

impl ChunkConfig {
    pub fn validate(&self) -> Result<()> {
        if self.chunk_overlap >= self.chunk_size {
            bail!(
                "chunk overlap ({}) must be smaller than chunk size ({})",
                self.chunk_overlap,
                self.chunk_size
            );
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextChunk {
    pub text: String,
    pub page: i64,
    pub chunk_index: usize,
}

/// Splits page texts into bounded, overlapping segments. The chunk
/// index is document-local and increases contiguously across pages; the
/// accumulation buffer restarts on each page.
///
/// Splitting falls back through three tiers: paragraphs (blank-line
/// boundaries), then sentences for a paragraph larger than the chunk
/// size, then whitespace words for an oversized sentence. A single
/// token longer than the chunk size is kept whole rather than cut.
pub fn chunk_pages(pages: &[PageText], config: &ChunkConfig) -> Vec<TextChunk> {
    let mut chunks = Vec::new();
    let mut chunk_index = 0usize;

    for page_text in pages {
        chunk_page(
            &page_text.text,
            page_text.page,
            config,
            &mut chunk_index,
            &mut chunks,
        );
    }

    chunks
}

fn chunk_page(
    text: &str,
    page: i64,
    config: &ChunkConfig,
    chunk_index: &mut usize,
    chunks: &mut Vec<TextChunk>,
) {
    let mut current = String::new();

    for paragraph in text.split("\n\n") {
        let paragraph = paragraph.trim();
        if paragraph.is_empty() {
            continue;
        }

        if joined_len(&current, paragraph.len(), 2) > config.chunk_size {
            if current.is_empty() {
                // Oversized paragraph with nothing buffered: fall back
                // to sentence-level splitting.
                split_paragraph(paragraph, page, config, chunk_index, chunks);
            } else {
                push_chunk(chunks, &current, page, chunk_index);
                let overlap = overlap_tail(&current, config.chunk_overlap);
                current = format!("{overlap} {paragraph}");
            }
        } else {
            if !current.is_empty() {
                current.push_str("\n\n");
            }
            current.push_str(paragraph);
        }
    }

    if !current.trim().is_empty() {
        push_chunk(chunks, &current, page, chunk_index);
    }
}

/// Sentence-level fallback for one oversized paragraph.
fn split_paragraph(
    paragraph: &str,
    page: i64,
    config: &ChunkConfig,
    chunk_index: &mut usize,
    chunks: &mut Vec<TextChunk>,
) {
    let mut current = String::new();

    for sentence in split_sentences(paragraph) {
        if joined_len(&current, sentence.len(), 1) > config.chunk_size {
            if !current.is_empty() {
                push_chunk(chunks, &current, page, chunk_index);
            }
            if sentence.len() > config.chunk_size {
                current = split_words(sentence, page, config, chunk_index, chunks);
            } else {
                current = sentence.to_string();
            }
        } else {
            if !current.is_empty() {
                current.push(' ');
            }
            current.push_str(sentence);
        }
    }

    if !current.trim().is_empty() {
        push_chunk(chunks, &current, page, chunk_index);
    }
}

/// Word-level fallback for one oversized sentence. Returns the
/// unflushed tail so the caller can keep accumulating sentences into
/// it. A token longer than the chunk size ends up alone in its own
/// chunk, oversized, never split mid-token.
fn split_words(
    sentence: &str,
    page: i64,
    config: &ChunkConfig,
    chunk_index: &mut usize,
    chunks: &mut Vec<TextChunk>,
) -> String {
    let mut current = String::new();

    for word in sentence.split_whitespace() {
        if joined_len(&current, word.len(), 1) > config.chunk_size {
            if !current.is_empty() {
                push_chunk(chunks, &current, page, chunk_index);
            }
            current = word.to_string();
        } else {
            if !current.is_empty() {
                current.push(' ');
            }
            current.push_str(word);
        }
    }

    current
}

/// Length of the buffer after appending `addition` behind a separator.
/// Counting the separator keeps flushed chunks within the size bound.
fn joined_len(current: &str, addition: usize, separator: usize) -> usize {
    if current.is_empty() {
        addition
    } else {
        current.len() + separator + addition
    }
}

fn push_chunk(chunks: &mut Vec<TextChunk>, text: &str, page: i64, chunk_index: &mut usize) {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return;
    }

    chunks.push(TextChunk {
        text: trimmed.to_string(),
        page,
        chunk_index: *chunk_index,
    });
    *chunk_index += 1;
}

/// Tail of the just-flushed buffer carried into the next chunk. The
/// window is trimmed backward to the last sentence boundary inside it,
/// when one exists past position 0.
fn overlap_tail(text: &str, overlap: usize) -> String {
    if text.len() <= overlap {
        return text.to_string();
    }

    let mut start = text.len() - overlap;
    while !text.is_char_boundary(start) {
        start += 1;
    }
    let window = &text[start..];

    let boundary = [". ", "! ", "? "]
        .iter()
        .filter_map(|pattern| window.rfind(pattern))
        .max();

    match boundary {
        Some(pos) if pos > 0 => window[pos + 2..].to_string(),
        _ => window.to_string(),
    }
}

fn split_sentences(text: &str) -> Vec<&str> {
    let mut sentences = Vec::new();
    let mut start = 0usize;

    for found in SENTENCE_BOUNDARY.find_iter(text) {
        // Keep the punctuation character with its sentence.
        let end = found.start() + 1;
        let sentence = text[start..end].trim();
        if !sentence.is_empty() {
            sentences.push(sentence);
        }
        start = found.end();
    }

    let tail = text[start..].trim();
    if !tail.is_empty() {
        sentences.push(tail);
    }

    sentences
}
