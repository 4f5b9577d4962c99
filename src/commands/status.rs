use anyhow::{Context, Result};
use rusqlite::Connection;
use tracing::{info, warn};

use crate::cli::StatusArgs;

pub fn run(args: StatusArgs) -> Result<()> {
    if !args.db_path.exists() {
        warn!(path = %args.db_path.display(), "database file missing");
        return Ok(());
    }

    let connection = Connection::open(&args.db_path)
        .with_context(|| format!("failed to open {}", args.db_path.display()))?;

    let documents = query_count(&connection, "SELECT COUNT(*) FROM documents").unwrap_or(0);
    let capital_calls =
        query_count(&connection, "SELECT COUNT(*) FROM capital_calls").unwrap_or(0);
    let distributions =
        query_count(&connection, "SELECT COUNT(*) FROM distributions").unwrap_or(0);
    let adjustments = query_count(&connection, "SELECT COUNT(*) FROM adjustments").unwrap_or(0);
    let chunks = query_count(&connection, "SELECT COUNT(*) FROM document_chunks").unwrap_or(0);

    info!(
        path = %args.db_path.display(),
        documents = documents,
        capital_calls = capital_calls,
        distributions = distributions,
        adjustments = adjustments,
        chunks = chunks,
        "database status"
    );

    Ok(())
}

fn query_count(connection: &Connection, sql: &str) -> Result<i64> {
    let count = connection.query_row(sql, [], |row| row.get(0))?;
    Ok(count)
}
