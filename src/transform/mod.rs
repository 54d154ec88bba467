//! Transformation of page content into artifact documents
//!
//! A page's raw content is split into chunks, each chunk is sent to the
//! [`Transformer`] in order, and the results are assembled into one
//! [`TransformedDocument`]. Title and description come from the first chunk;
//! the bodies of all chunks are joined in order.

mod chunker;
mod client;

pub use chunker::{
    chunk_input, split, Chunk, CONTEXT_END_MARKER, CONTEXT_START_MARKER, NEW_CONTENT_MARKER,
};
pub use client::{
    ChatTransformer, TransformError, TransformErrorKind, TransformOutput, Transformer,
    instructions,
};

use crate::config::ChunkSettings;

/// Separator between the transformed bodies of consecutive chunks
pub const BODY_SEPARATOR: &str = "\n\n";

/// The assembled result for one page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransformedDocument {
    pub title: String,
    pub description: String,
    pub body: String,
}

/// Chunks `content`, transforms every chunk in order and assembles the result
///
/// `on_progress` is called with `(chunks_done, chunks_total)` before the first
/// call and after each completed chunk. The first failing chunk aborts the
/// document; earlier results are discarded.
pub async fn transform_document<F>(
    transformer: &dyn Transformer,
    content: &str,
    settings: &ChunkSettings,
    mut on_progress: F,
) -> Result<TransformedDocument, TransformError>
where
    F: FnMut(usize, usize),
{
    let chunks = split(content, settings);
    let total = chunks.len();
    on_progress(0, total);

    let mut title = String::new();
    let mut description = String::new();
    let mut bodies = Vec::with_capacity(total);

    for chunk in &chunks {
        let input = chunk_input(&chunks, chunk.index, settings.overlap);
        let output = transformer
            .transform(&input)
            .await
            .map_err(|e| e.in_chunk(chunk.index, total))?;

        if chunk.index == 0 {
            title = output.title.trim().to_string();
            description = output.description.trim().to_string();
        }
        bodies.push(output.transformed_content.trim().to_string());
        on_progress(chunk.index + 1, total);
    }

    Ok(TransformedDocument {
        title,
        description,
        body: bodies.join(BODY_SEPARATOR),
    })
}
