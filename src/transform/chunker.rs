//! Content chunking for oversized pages
//!
//! Content longer than the configured threshold is cut into consecutive chunks.
//! Each cut is snapped back to the nearest sentence boundary within a short
//! lookback window so chunks tend to end on whole sentences. All sizes are
//! counted in characters, never bytes, so a cut can't split a code point.
//!
//! Chunks after the first are sent with the tail of the previous chunk's raw
//! text as read-only context (the overlap), see [`chunk_input`].

use crate::config::ChunkSettings;

/// Sentence-boundary markers, the cut lands right after one of these
const SENTENCE_MARKERS: &[&str] = &[". ", "! ", "? ", ".\n", "!\n", "?\n"];

pub const CONTEXT_START_MARKER: &str = "[PREVIOUS CONTEXT - DO NOT REPEAT IN OUTPUT]";
pub const CONTEXT_END_MARKER: &str = "[END PREVIOUS CONTEXT]";
pub const NEW_CONTENT_MARKER: &str = "[NEW CONTENT]";

/// A slice of the raw content
///
/// `start` and `end` are byte offsets into the source string and always fall
/// on character boundaries. Consecutive chunks share an edge: the `end` of one
/// is the `start` of the next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Chunk<'a> {
    pub index: usize,
    pub start: usize,
    pub end: usize,
    pub text: &'a str,
}

/// Splits content into ordered chunks of at most `threshold` characters
///
/// Content at or under the threshold comes back as a single chunk, which
/// includes empty content.
///
/// # Example
///
/// ```
/// use site_distiller::config::ChunkSettings;
/// use site_distiller::transform::split;
///
/// let settings = ChunkSettings { threshold: 20, lookback: 10, overlap: 5 };
/// let chunks = split("One sentence here. Another one follows it.", &settings);
/// assert_eq!(chunks[0].text, "One sentence here. ");
/// ```
pub fn split<'a>(content: &'a str, settings: &ChunkSettings) -> Vec<Chunk<'a>> {
    // Byte offset of every char, plus the end of the string
    let offsets: Vec<usize> = content
        .char_indices()
        .map(|(i, _)| i)
        .chain(std::iter::once(content.len()))
        .collect();
    let total_chars = offsets.len() - 1;
    let threshold = settings.threshold.max(1);

    let mut chunks = Vec::new();
    let mut cursor = 0;

    loop {
        let remaining = total_chars - cursor;
        if remaining <= threshold {
            chunks.push(make_chunk(content, &offsets, chunks.len(), cursor, total_chars));
            break;
        }

        let right = cursor + threshold;
        let cut = find_cut(content, &offsets, cursor, right, settings.lookback);
        chunks.push(make_chunk(content, &offsets, chunks.len(), cursor, cut));
        cursor = cut;
    }

    tracing::trace!(
        "Split {} chars into {} chunk(s)",
        total_chars,
        chunks.len()
    );

    chunks
}

/// Returns the char position to cut at for the window `[cursor, right)`
fn find_cut(content: &str, offsets: &[usize], cursor: usize, right: usize, lookback: usize) -> usize {
    let lookback_start = right.saturating_sub(lookback).max(cursor);
    let window = &content[offsets[lookback_start]..offsets[right]];

    let boundary = SENTENCE_MARKERS
        .iter()
        .filter_map(|marker| window.rfind(marker).map(|pos| pos + marker.len()))
        .max();

    match boundary {
        Some(end_byte) => lookback_start + window[..end_byte].chars().count(),
        None => right,
    }
}

fn make_chunk<'a>(
    content: &'a str,
    offsets: &[usize],
    index: usize,
    start_char: usize,
    end_char: usize,
) -> Chunk<'a> {
    let start = offsets[start_char];
    let end = offsets[end_char];
    Chunk {
        index,
        start,
        end,
        text: &content[start..end],
    }
}

/// Builds the transformation input for chunk `index`
///
/// The first chunk is sent as-is. Later chunks are prefixed with the last
/// `overlap` characters of the previous chunk's raw text, fenced by markers
/// that tell the service not to echo it.
pub fn chunk_input(chunks: &[Chunk<'_>], index: usize, overlap: usize) -> String {
    let chunk = &chunks[index];
    if index == 0 || overlap == 0 {
        return chunk.text.to_string();
    }

    let previous = tail_chars(chunks[index - 1].text, overlap);
    format!(
        "{}\n{}\n{}\n\n{}\n{}",
        CONTEXT_START_MARKER, previous, CONTEXT_END_MARKER, NEW_CONTENT_MARKER, chunk.text
    )
}

/// The last `n` characters of `text`
fn tail_chars(text: &str, n: usize) -> &str {
    let count = text.chars().count();
    if count <= n {
        return text;
    }
    match text.char_indices().nth(count - n) {
        Some((byte, _)) => &text[byte..],
        None => text,
    }
}
