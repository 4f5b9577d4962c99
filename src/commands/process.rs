use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use tracing::{error, info};

use crate::chunker::ChunkConfig;
use crate::cli::ProcessArgs;
use crate::index::SqliteIndex;
use crate::model::{ExtractedDocument, ProcessingResult};
use crate::pipeline::process_document;
use crate::store::{self, SqliteStore};
use crate::util::write_json_pretty;

/// Processes one extracted document and reports the outcome through
/// the result manifest. Failures surface as a `failed` result, not as a
/// process error: a malformed document must not take the host down.
pub fn run(args: ProcessArgs) -> Result<()> {
    let result = match try_process(&args) {
        Ok(result) => result,
        Err(err) => {
            error!(error = %err, "document processing failed");
            ProcessingResult::failed(format!("{err:#}"))
        }
    };

    if let Some(result_path) = &args.result_path {
        write_json_pretty(result_path, &result)?;
        info!(path = %result_path.display(), "wrote result manifest");
    }

    match &result.statistics {
        Some(stats) => info!(
            status = result.status.as_str(),
            pages_processed = stats.pages_processed,
            tables_found = stats.tables_found,
            capital_calls = stats.capital_calls,
            distributions = stats.distributions,
            adjustments = stats.adjustments,
            text_chunks = stats.text_chunks,
            table_errors = stats.errors.len(),
            "processing finished"
        ),
        None => info!(
            status = result.status.as_str(),
            error = %result.error.as_deref().unwrap_or_default(),
            "processing finished"
        ),
    }

    Ok(())
}

fn try_process(args: &ProcessArgs) -> Result<ProcessingResult> {
    let config = ChunkConfig {
        chunk_size: args.chunk_size,
        chunk_overlap: args.chunk_overlap,
    };
    config.validate()?;

    let document = load_extracted_document(&args.extraction_path, args)?;
    info!(
        document_id = document.document_id,
        fund_id = document.fund_id,
        tables = document.tables.len(),
        pages = document.pages.len(),
        "loaded extraction output"
    );

    // The connection is the persistence session; it is dropped, and the
    // session released, on every path out of this function.
    let connection = store::open_connection(&args.db_path)?;

    let result = {
        let mut store = SqliteStore::new(&connection);
        let mut index = SqliteIndex::new(&connection);
        process_document(&document, &mut store, &mut index, &config)
    };

    store::record_document(
        &connection,
        document.document_id,
        document.fund_id,
        document.source.as_deref(),
        result.status.as_str(),
    )?;

    Ok(result)
}

fn load_extracted_document(path: &Path, args: &ProcessArgs) -> Result<ExtractedDocument> {
    let raw =
        fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    let mut document: ExtractedDocument = serde_json::from_slice(&raw)
        .with_context(|| format!("failed to parse {}", path.display()))?;

    if let Some(document_id) = args.document_id {
        document.document_id = document_id;
    }
    if let Some(fund_id) = args.fund_id {
        document.fund_id = fund_id;
    }

    Ok(document)
}
