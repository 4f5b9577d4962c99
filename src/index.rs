use anyhow::{Context, Result};
use rusqlite::{Connection, params};

use crate::util::{now_utc_string, sha256_hex};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkMetadata {
    pub document_id: i64,
    pub fund_id: i64,
    pub page: i64,
    pub chunk_index: usize,
}

/// Indexing seam: accepts one chunk of content plus metadata and
/// reports success or failure for that call alone.
pub trait SemanticIndex {
    fn add_document(&mut self, content: &str, metadata: &ChunkMetadata) -> Result<()>;
}

pub struct SqliteIndex<'a> {
    connection: &'a Connection,
}

impl<'a> SqliteIndex<'a> {
    pub fn new(connection: &'a Connection) -> Self {
        Self { connection }
    }
}

impl SemanticIndex for SqliteIndex<'_> {
    fn add_document(&mut self, content: &str, metadata: &ChunkMetadata) -> Result<()> {
        let text_hash = sha256_hex(content);

        self.connection
            .execute(
                "
                INSERT INTO document_chunks(document_id, chunk_index, fund_id, page, content, text_hash, indexed_at)
                VALUES(?1, ?2, ?3, ?4, ?5, ?6, ?7)
                ON CONFLICT(document_id, chunk_index) DO UPDATE SET
                  fund_id=excluded.fund_id,
                  page=excluded.page,
                  content=excluded.content,
                  text_hash=excluded.text_hash,
                  indexed_at=excluded.indexed_at
                ",
                params![
                    metadata.document_id,
                    metadata.chunk_index as i64,
                    metadata.fund_id,
                    metadata.page,
                    content,
                    text_hash,
                    now_utc_string(),
                ],
            )
            .with_context(|| {
                format!(
                    "failed to index chunk {} of document {}",
                    metadata.chunk_index, metadata.document_id
                )
            })?;

        Ok(())
    }
}

/// In-memory index used by pipeline tests. `fail_on` injects a
/// submission failure for one chunk index.
#[cfg(test)]
#[derive(Debug, Default)]
pub struct MemoryIndex {
    pub entries: Vec<(String, ChunkMetadata)>,
    pub fail_on: Option<usize>,
}

#[cfg(test)]
impl SemanticIndex for MemoryIndex {
    fn add_document(&mut self, content: &str, metadata: &ChunkMetadata) -> Result<()> {
        if self.fail_on == Some(metadata.chunk_index) {
            anyhow::bail!("injected index failure");
        }
        self.entries.push((content.to_string(), metadata.clone()));
        Ok(())
    }
}
