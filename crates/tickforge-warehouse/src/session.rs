//! Single-session DuckDB access.
//!
//! One pipeline run owns one connection, used strictly sequentially, so
//! there is no pool here; the helpers only centralize open/configure.

use std::path::Path;

use duckdb::Connection;

/// Open and configure the run's database session.
pub(crate) fn open_session(path: &Path) -> Result<Connection, duckdb::Error> {
    let connection = Connection::open(path)?;
    configure_session(&connection)?;
    Ok(connection)
}

fn configure_session(connection: &Connection) -> Result<(), duckdb::Error> {
    connection.execute_batch("PRAGMA disable_progress_bar;")?;
    Ok(())
}
