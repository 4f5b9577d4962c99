use tracing::{info, warn};

use crate::chunker::{ChunkConfig, chunk_pages};
use crate::index::{ChunkMetadata, SemanticIndex};
use crate::model::{ExtractedDocument, ProcessingResult, ProcessingStats};
use crate::store::TransactionStore;
use crate::tables::parse_tables;

/// Runs table parsing and text chunking over one extracted document and
/// submits every chunk to the semantic index. Table parsing and
/// chunking write to disjoint outputs and share no state. A chunk whose
/// submission fails is logged and left out of the stored count; the
/// remaining submissions still run. This function reports failure
/// through the result, never through a panic or an `Err`.
pub fn process_document(
    document: &ExtractedDocument,
    store: &mut dyn TransactionStore,
    index: &mut dyn SemanticIndex,
    config: &ChunkConfig,
) -> ProcessingResult {
    if let Err(err) = config.validate() {
        return ProcessingResult::failed(format!("{err:#}"));
    }

    let table_stats = parse_tables(&document.tables, store, document.fund_id);

    let chunks = chunk_pages(&document.pages, config);
    let mut stored_chunks = 0usize;
    for chunk in &chunks {
        let metadata = ChunkMetadata {
            document_id: document.document_id,
            fund_id: document.fund_id,
            page: chunk.page,
            chunk_index: chunk.chunk_index,
        };

        match index.add_document(&chunk.text, &metadata) {
            Ok(()) => stored_chunks += 1,
            Err(err) => warn!(
                chunk_index = chunk.chunk_index,
                page = chunk.page,
                error = %err,
                "failed to index chunk"
            ),
        }
    }

    info!(
        document_id = document.document_id,
        fund_id = document.fund_id,
        capital_calls = table_stats.capital_calls,
        distributions = table_stats.distributions,
        adjustments = table_stats.adjustments,
        text_chunks = stored_chunks,
        table_errors = table_stats.errors.len(),
        "document processed"
    );

    ProcessingResult::completed(ProcessingStats {
        pages_processed: document.pages.len(),
        tables_found: document.tables.len(),
        capital_calls: table_stats.capital_calls,
        distributions: table_stats.distributions,
        adjustments: table_stats.adjustments,
        text_chunks: stored_chunks,
        errors: table_stats.errors,
    })
}

#[cfg(test)]
mod tests {
    use crate::index::MemoryIndex;
    use crate::model::{PageText, ProcessingStatus, TransactionRecord};
    use crate::store::MemoryStore;

    use super::*;

    const CONFIG: ChunkConfig = ChunkConfig {
        chunk_size: 1000,
        chunk_overlap: 200,
    };

    fn capital_call_table() -> Vec<Vec<String>> {
        vec![
            vec![
                "Call Date".to_string(),
                "Call Amount".to_string(),
                "Call Type".to_string(),
            ],
            vec![
                "2023-01-15".to_string(),
                "$100,000".to_string(),
                "Initial Drawdown".to_string(),
            ],
        ]
    }

    fn plain_text(total_words: usize) -> String {
        (0..total_words)
            .map(|index| format!("word{index}"))
            .collect::<Vec<String>>()
            .join(" ")
    }

    #[test]
    fn two_page_document_end_to_end() {
        // Page 1 carries one capital call table (its text is table-only,
        // so the extraction layer omitted it); page 2 carries ~2500
        // characters of plain text that splits into three chunks at the
        // default 1000/200 configuration.
        let document = ExtractedDocument {
            document_id: 1,
            fund_id: 7,
            source: None,
            tables: vec![capital_call_table()],
            pages: vec![PageText {
                page: 2,
                text: plain_text(330),
            }],
        };

        let mut store = MemoryStore::default();
        let mut index = MemoryIndex::default();
        let result = process_document(&document, &mut store, &mut index, &CONFIG);

        assert_eq!(result.status, ProcessingStatus::Completed);
        let stats = result.statistics.expect("statistics present");
        assert_eq!(stats.tables_found, 1);
        assert_eq!(stats.capital_calls, 1);
        assert_eq!(stats.distributions, 0);
        assert_eq!(stats.adjustments, 0);
        assert_eq!(stats.text_chunks, 3);
        assert!(stats.errors.is_empty());

        assert_eq!(store.commits, 1);
        match &store.committed[0] {
            TransactionRecord::CapitalCall {
                fund_id,
                amount,
                call_type,
                ..
            } => {
                assert_eq!(*fund_id, 7);
                assert_eq!(*amount, 100_000.0);
                assert_eq!(call_type, "Initial Drawdown");
            }
            other => panic!("unexpected record: {other:?}"),
        }

        for (expected, (_, metadata)) in index.entries.iter().enumerate() {
            assert_eq!(metadata.chunk_index, expected);
            assert_eq!(metadata.document_id, 1);
            assert_eq!(metadata.fund_id, 7);
            assert_eq!(metadata.page, 2);
        }
    }

    #[test]
    fn failed_chunk_submission_is_not_counted_and_does_not_stop_others() {
        let document = ExtractedDocument {
            document_id: 2,
            fund_id: 3,
            source: None,
            tables: Vec::new(),
            pages: vec![PageText {
                page: 1,
                text: plain_text(290),
            }],
        };

        let mut store = MemoryStore::default();
        let mut index = MemoryIndex {
            fail_on: Some(1),
            ..MemoryIndex::default()
        };
        let result = process_document(&document, &mut store, &mut index, &CONFIG);

        assert_eq!(result.status, ProcessingStatus::Completed);
        let stats = result.statistics.expect("statistics present");
        assert_eq!(stats.text_chunks, 2);
        assert_eq!(index.entries.len(), 2);
        assert!(stats.errors.is_empty());
    }

    #[test]
    fn invalid_chunk_config_yields_a_failed_result() {
        let document = ExtractedDocument {
            document_id: 3,
            fund_id: 1,
            source: None,
            tables: Vec::new(),
            pages: Vec::new(),
        };

        let config = ChunkConfig {
            chunk_size: 100,
            chunk_overlap: 300,
        };
        let mut store = MemoryStore::default();
        let mut index = MemoryIndex::default();
        let result = process_document(&document, &mut store, &mut index, &config);

        assert_eq!(result.status, ProcessingStatus::Failed);
        assert!(result.error.expect("error present").contains("overlap"));
        assert!(result.statistics.is_none());
    }

    #[test]
    fn empty_document_completes_with_zero_counts() {
        let document = ExtractedDocument {
            document_id: 4,
            fund_id: 1,
            source: None,
            tables: Vec::new(),
            pages: Vec::new(),
        };

        let mut store = MemoryStore::default();
        let mut index = MemoryIndex::default();
        let result = process_document(&document, &mut store, &mut index, &CONFIG);

        assert_eq!(result.status, ProcessingStatus::Completed);
        let stats = result.statistics.expect("statistics present");
        assert_eq!(stats.pages_processed, 0);
        assert_eq!(stats.tables_found, 0);
        assert_eq!(stats.text_chunks, 0);
        assert!(stats.errors.is_empty());
    }
}
